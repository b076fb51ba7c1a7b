#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};

use stagehand::config::Settings;
use stagehand::executor::{Executor, MISSING_DIR_EXIT};
use stagehand::prompt::Confirm;
use stagehand::session::{Session, StepRecord};
use stagehand::ssh::CommandOutput;
use stagehand::utils::command::CommandLine;
use stagehand::{Error, Result};

/// Records every step as a readable line and fails the ones it was told to.
///
/// Line formats:
/// - `local: <cmd>` / `local[<dir>]: <cmd>`
/// - `remote: <cmd>` / `remote[<dir>]: <cmd>`
/// - `sync: <src> -> <dst>`
/// - `put: <src> -> <dst>`
/// - `write: <path>` / `append: <path>`
#[derive(Default)]
pub struct RecordingExecutor {
    pub calls: Vec<String>,
    failing: HashSet<String>,
    missing_dirs: HashSet<String>,
    pub files: HashMap<String, String>,
    pub globs: HashMap<String, Vec<String>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the step recorded as `line` report failure.
    pub fn fail(mut self, line: &str) -> Self {
        self.failing.insert(line.to_string());
        self
    }

    /// Make the next step recorded as `line` fail as if its directory were
    /// absent. Later runs of the same line succeed.
    pub fn missing_dir(mut self, line: &str) -> Self {
        self.missing_dirs.insert(line.to_string());
        self
    }

    pub fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(path.to_string(), contents.to_string());
        self
    }

    pub fn with_glob(mut self, pattern: &str, matches: &[&str]) -> Self {
        self.globs.insert(
            pattern.to_string(),
            matches.iter().map(|m| m.to_string()).collect(),
        );
        self
    }

    fn outcome(&mut self, line: String) -> CommandOutput {
        let failed = self.failing.contains(&line);
        let missing = self.missing_dirs.remove(&line);
        self.calls.push(line);
        if missing {
            CommandOutput {
                stdout: String::new(),
                stderr: "sh: cd: can't cd to directory".to_string(),
                success: false,
                exit_code: MISSING_DIR_EXIT,
            }
        } else if failed {
            CommandOutput {
                stdout: String::new(),
                stderr: "scripted failure".to_string(),
                success: false,
                exit_code: 1,
            }
        } else {
            CommandOutput {
                stdout: String::new(),
                stderr: String::new(),
                success: true,
                exit_code: 0,
            }
        }
    }
}

fn scoped(kind: &str, dir: Option<&str>, command: &CommandLine) -> String {
    match dir {
        Some(dir) => format!("{}[{}]: {}", kind, dir, command.to_shell()),
        None => format!("{}: {}", kind, command.to_shell()),
    }
}

impl Executor for RecordingExecutor {
    fn run_local(&mut self, command: &CommandLine, dir: Option<&str>) -> Result<CommandOutput> {
        Ok(self.outcome(scoped("local", dir, command)))
    }

    fn run_remote(&mut self, command: &CommandLine, dir: Option<&str>) -> Result<CommandOutput> {
        Ok(self.outcome(scoped("remote", dir, command)))
    }

    fn sync_dir(&mut self, local_dir: &str, remote_dir: &str) -> Result<CommandOutput> {
        Ok(self.outcome(format!("sync: {} -> {}", local_dir, remote_dir)))
    }

    fn put_file(&mut self, local_path: &str, remote_path: &str) -> Result<CommandOutput> {
        Ok(self.outcome(format!("put: {} -> {}", local_path, remote_path)))
    }

    fn read_local(&mut self, path: &str) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::internal_io("no such file", Some(format!("read {}", path))))
    }

    fn write_local(&mut self, path: &str, contents: &str, append: bool) -> Result<()> {
        let kind = if append { "append" } else { "write" };
        self.calls.push(format!("{}: {}", kind, path));
        let entry = self.files.entry(path.to_string()).or_default();
        if !append {
            entry.clear();
        }
        entry.push_str(contents);
        Ok(())
    }

    fn glob_local(&mut self, pattern: &str) -> Result<Vec<String>> {
        Ok(self.globs.get(pattern).cloned().unwrap_or_default())
    }
}

/// Answers confirmations from a script; running out of answers is a test bug.
pub struct ScriptedConfirm {
    answers: VecDeque<bool>,
    pub asked: Vec<String>,
}

impl ScriptedConfirm {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            asked: Vec::new(),
        }
    }

    pub fn none() -> Self {
        Self::answering(&[])
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.asked.push(question.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| Error::internal_unexpected(format!("unexpected prompt: {}", question)))
    }
}

pub fn settings() -> Settings {
    Settings {
        host: "deploy@web1.example.org".to_string(),
        aws_access_key: "AKIA123".to_string(),
        aws_secret: "s3cr3t".to_string(),
        s3_bucket: "shop-assets".to_string(),
        local_dir: "/home/dev/shop".to_string(),
        remote_dir: "/srv/www/shop".to_string(),
        settings_file: "deploy/production_settings.py".to_string(),
        git_repo: "git@example.org:acme/shop.git".to_string(),
        app_name: "shop".to_string(),
        ..Settings::default()
    }
}

/// Run `body` in a session over the given fakes; returns its result and the
/// recorded step history.
pub fn run<T>(
    settings: &Settings,
    executor: &mut RecordingExecutor,
    confirm: &mut ScriptedConfirm,
    body: impl FnOnce(&mut Session) -> Result<T>,
) -> (Result<T>, Vec<StepRecord>) {
    let mut session = Session::new(settings, executor, confirm);
    let result = body(&mut session);
    (result, session.into_history())
}
