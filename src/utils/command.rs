//! Parameterized command lines.
//!
//! Steps are built as argv arrays, never as interpolated strings. Locally the
//! argv goes straight to `std::process::Command`; remotely each argument is
//! quoted on its own before the line is handed to the remote shell.

use serde::Serialize;
use std::fmt;
use std::process::Command;

use crate::utils::shell;

/// Replacement shown instead of a secret argument.
pub const REDACTED: &str = "********";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    /// Indexes into `args` that must never be logged or reported.
    #[serde(skip)]
    secret_args: Vec<usize>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            secret_args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add an argument that is passed through as-is but masked in
    /// [`CommandLine::redacted_shell`] and `Display`.
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret_args.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build from an argv slice; `None` when the slice is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, rest) = argv.split_first()?;
        Some(Self::new(program.clone()).args(rest.iter().cloned()))
    }

    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    /// Quoted form for a remote `sh -c`.
    pub fn to_shell(&self) -> String {
        shell::join_quoted(&self.argv())
    }

    /// Quoted form with secret arguments masked, for logs and reports.
    pub fn redacted_shell(&self) -> String {
        let argv: Vec<&str> = std::iter::once(self.program.as_str())
            .chain(self.args.iter().enumerate().map(|(i, arg)| {
                if self.secret_args.contains(&i) {
                    REDACTED
                } else {
                    arg.as_str()
                }
            }))
            .collect();
        shell::join_quoted(&argv)
    }

    pub fn to_process(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted_shell())
    }
}

/// Build a [`CommandLine`] from a program and literal arguments.
///
/// ```ignore
/// let pull = cmd!("git", "pull");
/// let clone = cmd!("git", "clone", "--recursive", &repo, ".");
/// ```
#[macro_export]
macro_rules! cmd {
    ($program:expr $(, $arg:expr)* $(,)?) => {
        $crate::utils::command::CommandLine::new($program)$(.arg($arg))*
    };
}

/// Extract error text from captured output. Prefers stderr, falls back to stdout.
pub fn error_text(stdout: &str, stderr: &str) -> String {
    if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        stdout.trim().to_string()
    }
}
