//! Working-directory contexts.
//!
//! A [`DirStack`] models nested "cd into this directory" scopes. Frames are
//! pushed by a scope and popped when that scope ends, whatever its outcome;
//! see `Session::in_local_dir` and `Session::in_remote_dir`.

use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirStack {
    frames: Vec<String>,
}

impl DirStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, dir: impl Into<String>) {
        self.frames.push(dir.into());
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Drop every frame above `depth`.
    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    /// Effective directory: relative frames join onto the previous one, an
    /// absolute frame resets. `None` when no frame is active.
    pub fn current(&self) -> Option<String> {
        let mut resolved: Option<PathBuf> = None;
        for frame in &self.frames {
            let frame_path = Path::new(frame);
            resolved = Some(match resolved {
                Some(base) if frame_path.is_relative() => base.join(frame_path),
                _ => frame_path.to_path_buf(),
            });
        }
        resolved.map(|p| normalize(&p))
    }

    /// Resolve `path` against the current directory.
    pub fn resolve(&self, path: &str) -> String {
        if Path::new(path).is_absolute() {
            return normalize(Path::new(path));
        }
        match self.current() {
            Some(dir) => normalize(&Path::new(&dir).join(path)),
            None => normalize(Path::new(path)),
        }
    }
}

/// Lexical normalization: drops `.` and trailing slashes, folds `..`.
fn normalize(path: &Path) -> String {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    let rendered = out.to_string_lossy().to_string();
    if rendered.is_empty() {
        ".".to_string()
    } else {
        rendered
    }
}
