// Step execution - routes each step to the local machine or the configured host

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::process::Stdio;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::ssh::{CommandOutput, SshClient};
use crate::utils::command::CommandLine;
use crate::utils::shell;

/// Side-effecting primitives a command is built from.
///
/// Every method reports what happened; none of them decides whether a
/// failure is fatal. `Err` is reserved for the case where the step could not
/// be attempted at all (bad configuration, unreadable file).
pub trait Executor {
    /// Run a command on this machine, in `dir` when given.
    fn run_local(&mut self, command: &CommandLine, dir: Option<&str>) -> Result<CommandOutput>;

    /// Run a command on the configured host, in `dir` when given.
    fn run_remote(&mut self, command: &CommandLine, dir: Option<&str>) -> Result<CommandOutput>;

    /// Mirror the contents of a local directory into a remote directory.
    fn sync_dir(&mut self, local_dir: &str, remote_dir: &str) -> Result<CommandOutput>;

    /// Copy one local file to a remote path.
    fn put_file(&mut self, local_path: &str, remote_path: &str) -> Result<CommandOutput>;

    fn read_local(&mut self, path: &str) -> Result<String>;

    fn write_local(&mut self, path: &str, contents: &str, append: bool) -> Result<()>;

    /// Expand a glob relative to this machine's working directory.
    fn glob_local(&mut self, pattern: &str) -> Result<Vec<String>>;
}

/// Executor backed by real processes: local commands inherit the terminal,
/// remote ones go through ssh.
pub struct SystemExecutor {
    settings: Settings,
    client: Option<SshClient>,
}

impl SystemExecutor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            settings: settings.clone(),
            client: None,
        }
    }

    /// The ssh client is only built once a remote step needs it, so purely
    /// local commands never trip over host configuration.
    fn client(&mut self) -> Result<&SshClient> {
        if self.client.is_none() {
            self.client = Some(SshClient::from_settings(&self.settings)?);
        }
        self.client
            .as_ref()
            .ok_or_else(|| Error::internal_unexpected("ssh client unavailable"))
    }
}

impl Executor for SystemExecutor {
    fn run_local(&mut self, command: &CommandLine, dir: Option<&str>) -> Result<CommandOutput> {
        let mut cmd = command.to_process();
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }

        // Passthrough: `git add -p`, editors and manage.py prompts need the terminal.
        let status = cmd
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status();

        Ok(match status {
            Ok(status) => CommandOutput {
                stdout: String::new(),
                stderr: String::new(),
                success: status.success(),
                exit_code: status.code().unwrap_or(-1),
            },
            Err(e) => CommandOutput {
                stdout: String::new(),
                stderr: format!("Failed to start {}: {}", command.program, e),
                success: false,
                exit_code: -1,
            },
        })
    }

    fn run_remote(&mut self, command: &CommandLine, dir: Option<&str>) -> Result<CommandOutput> {
        let line = remote_line(command, dir);
        Ok(self.client()?.execute(&line))
    }

    fn sync_dir(&mut self, local_dir: &str, remote_dir: &str) -> Result<CommandOutput> {
        Ok(self.client()?.sync_directory(local_dir, remote_dir))
    }

    fn put_file(&mut self, local_path: &str, remote_path: &str) -> Result<CommandOutput> {
        if !Path::new(local_path).is_file() {
            return Err(Error::config_invalid_value(
                "settingsFile",
                Some(local_path.to_string()),
                "file to upload does not exist",
            ));
        }
        Ok(self.client()?.copy_file(local_path, remote_path))
    }

    fn read_local(&mut self, path: &str) -> Result<String> {
        fs::read_to_string(path)
            .map_err(|e| Error::internal_io(e.to_string(), Some(format!("read {}", path))))
    }

    fn write_local(&mut self, path: &str, contents: &str, append: bool) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .map_err(|e| Error::internal_io(e.to_string(), Some(format!("open {}", path))))?;

        file.write_all(contents.as_bytes())
            .map_err(|e| Error::internal_io(e.to_string(), Some(format!("write {}", path))))
    }

    fn glob_local(&mut self, pattern: &str) -> Result<Vec<String>> {
        let paths = glob::glob(pattern).map_err(|e| {
            Error::validation_invalid_argument("pattern", format!("{}: {}", pattern, e))
        })?;

        Ok(paths
            .filter_map(|entry| entry.ok())
            .map(|p| p.to_string_lossy().to_string())
            .collect())
    }
}

/// Exit status of a remote line whose directory context does not exist.
pub const MISSING_DIR_EXIT: i32 = 66;

/// Shell line sent to the host: every argument quoted, prefixed with a `cd`
/// when a directory context is active. A failed `cd` exits with
/// [`MISSING_DIR_EXIT`] and the command never runs.
pub fn remote_line(command: &CommandLine, dir: Option<&str>) -> String {
    match dir {
        Some(dir) => format!(
            "cd {} || exit {}; {}",
            shell::quote_path(dir),
            MISSING_DIR_EXIT,
            command.to_shell()
        ),
        None => command.to_shell(),
    }
}
