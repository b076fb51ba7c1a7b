//! Step sequencing for one command invocation.
//!
//! A [`Session`] owns the working-directory contexts and the step history,
//! and decides which failures are fatal. Operations in `assets`, `git`,
//! `deploy` and `setup` are written purely in terms of its methods.

use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};

use crate::config::Settings;
use crate::context::DirStack;
use crate::error::{CommandFailedDetails, Error, Result, TransferFailedDetails};
use crate::executor::{Executor, MISSING_DIR_EXIT};
use crate::prompt::Confirm;
use crate::ssh::CommandOutput;
use crate::utils::command::CommandLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Local,
    Remote,
    Sync,
    Put,
    Write,
    Confirm,
}

/// One executed step, as reported back to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub kind: StepKind,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub tolerant: bool,
}

#[derive(Clone, Copy)]
enum Side {
    Local,
    Remote,
}

pub struct Session<'a> {
    settings: &'a Settings,
    executor: &'a mut dyn Executor,
    confirm: &'a mut dyn Confirm,
    local_dirs: DirStack,
    remote_dirs: DirStack,
    history: Vec<StepRecord>,
}

impl<'a> Session<'a> {
    pub fn new(
        settings: &'a Settings,
        executor: &'a mut dyn Executor,
        confirm: &'a mut dyn Confirm,
    ) -> Self {
        Self {
            settings,
            executor,
            confirm,
            local_dirs: DirStack::new(),
            remote_dirs: DirStack::new(),
            history: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        self.settings
    }

    pub fn into_history(self) -> Vec<StepRecord> {
        self.history
    }

    // ------------------------------------------------------------------
    // Directory scopes
    // ------------------------------------------------------------------

    /// Run `body` with `dir` pushed onto the local directory stack. The
    /// stack is restored on success, error and panic alike.
    pub fn in_local_dir<T>(
        &mut self,
        dir: &str,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.in_dir(Side::Local, dir, body)
    }

    /// Remote counterpart of [`Session::in_local_dir`].
    pub fn in_remote_dir<T>(
        &mut self,
        dir: &str,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.in_dir(Side::Remote, dir, body)
    }

    fn in_dir<T>(
        &mut self,
        side: Side,
        dir: &str,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let depth = self.dirs(side).depth();
        self.dirs(side).push(dir);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(self)));
        self.dirs(side).truncate(depth);
        outcome.unwrap_or_else(|payload| panic::resume_unwind(payload))
    }

    fn dirs(&mut self, side: Side) -> &mut DirStack {
        match side {
            Side::Local => &mut self.local_dirs,
            Side::Remote => &mut self.remote_dirs,
        }
    }

    pub fn local_dir(&self) -> Option<String> {
        self.local_dirs.current()
    }

    pub fn remote_dir(&self) -> Option<String> {
        self.remote_dirs.current()
    }

    // ------------------------------------------------------------------
    // Local steps
    // ------------------------------------------------------------------

    /// Fatal local step.
    pub fn local(&mut self, command: CommandLine) -> Result<()> {
        let dir = self.local_dir();
        let output = self.exec_local(&command, dir.as_deref(), false)?;
        if output.success {
            return Ok(());
        }
        Err(Error::local_command_failed(CommandFailedDetails {
            command: command.redacted_shell(),
            dir,
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
            host: None,
        }))
    }

    /// Tolerant local step: failure is returned as `false`.
    pub fn local_tolerant(&mut self, command: CommandLine) -> Result<bool> {
        let dir = self.local_dir();
        let output = self.exec_local(&command, dir.as_deref(), true)?;
        Ok(output.success)
    }

    fn exec_local(
        &mut self,
        command: &CommandLine,
        dir: Option<&str>,
        tolerant: bool,
    ) -> Result<CommandOutput> {
        match dir {
            Some(d) => log_status!("local", "[{}] {}", d, command),
            None => log_status!("local", "{}", command),
        }
        let output = self.executor.run_local(command, dir)?;
        self.record(StepKind::Local, command.redacted_shell(), dir, &output, tolerant);
        Ok(output)
    }

    /// Append text to a local file (relative to the local directory scope).
    pub fn append_local(&mut self, path: &str, text: &str) -> Result<()> {
        let target = self.local_dirs.resolve(path);
        log_status!("local", "append to {}", target);
        self.executor.write_local(&target, text, true)?;
        self.record_ok(StepKind::Write, format!("append {}", target));
        Ok(())
    }

    /// Copy a local template to `dest`, applying literal replacements.
    pub fn render_template(
        &mut self,
        source: &str,
        dest: &str,
        replacements: &[(&str, &str)],
    ) -> Result<()> {
        let source = self.local_dirs.resolve(source);
        let dest = self.local_dirs.resolve(dest);
        log_status!("local", "render {} -> {}", source, dest);

        let mut content = self.executor.read_local(&source)?;
        for (from, to) in replacements {
            content = content.replace(from, to);
        }
        self.executor.write_local(&dest, &content, false)?;
        self.record_ok(StepKind::Write, format!("render {} -> {}", source, dest));
        Ok(())
    }

    /// Local paths matching `pattern`, relative to the local directory scope.
    pub fn glob_local(&mut self, pattern: &str) -> Result<Vec<String>> {
        let pattern = self.local_dirs.resolve(pattern);
        self.executor.glob_local(&pattern)
    }

    // ------------------------------------------------------------------
    // Remote steps
    // ------------------------------------------------------------------

    /// Fatal remote step. Returns the captured output.
    pub fn remote(&mut self, command: CommandLine) -> Result<CommandOutput> {
        let dir = self.remote_dir();
        let output = self.exec_remote(&command, dir.as_deref(), |_| false)?;
        if output.success {
            return Ok(output);
        }
        Err(Error::remote_command_failed(CommandFailedDetails {
            command: command.redacted_shell(),
            dir,
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
            host: Some(self.settings.host.clone()),
        }))
    }

    /// Tolerant remote step: failure is returned as `false`.
    pub fn remote_tolerant(&mut self, command: CommandLine) -> Result<bool> {
        let dir = self.remote_dir();
        let output = self.exec_remote(&command, dir.as_deref(), |_| true)?;
        Ok(output.success)
    }

    /// Remote step in the current remote directory that tolerates only that
    /// directory being absent: returns `false` when the `cd` into it failed,
    /// and fails like [`Session::remote`] for any other failure.
    pub fn remote_in_existing_dir(&mut self, command: CommandLine) -> Result<bool> {
        let dir = self.remote_dir();
        let output = self.exec_remote(&command, dir.as_deref(), |out| {
            dir.is_some() && out.exit_code == MISSING_DIR_EXIT
        })?;
        if output.success {
            return Ok(true);
        }
        if dir.is_some() && output.exit_code == MISSING_DIR_EXIT {
            return Ok(false);
        }
        Err(Error::remote_command_failed(CommandFailedDetails {
            command: command.redacted_shell(),
            dir,
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
            host: Some(self.settings.host.clone()),
        }))
    }

    fn exec_remote(
        &mut self,
        command: &CommandLine,
        dir: Option<&str>,
        tolerated: impl FnOnce(&CommandOutput) -> bool,
    ) -> Result<CommandOutput> {
        match dir {
            Some(d) => log_status!("remote", "[{}:{}] {}", self.settings.host, d, command),
            None => log_status!("remote", "[{}] {}", self.settings.host, command),
        }
        let output = self.executor.run_remote(command, dir)?;
        if !output.stdout.trim().is_empty() {
            log_status!("remote", "{}", output.stdout.trim_end());
        }
        let tolerant = tolerated(&output);
        self.record(StepKind::Remote, command.redacted_shell(), dir, &output, tolerant);
        Ok(output)
    }

    /// Sync a local directory tree into a remote directory. Both sides are
    /// resolved against their directory scopes; contents are copied, not
    /// the directory itself.
    pub fn sync_dir(&mut self, local_dir: &str, remote_dir: &str) -> Result<()> {
        let source = with_trailing_slash(self.local_dirs.resolve(local_dir));
        let destination = with_trailing_slash(self.remote_dirs.resolve(remote_dir));
        log_status!("sync", "{} -> {}:{}", source, self.settings.host, destination);

        let output = self.executor.sync_dir(&source, &destination)?;
        self.transfer_result(StepKind::Sync, source, destination, output)
    }

    /// Copy one local file to the host.
    pub fn put(&mut self, local_path: &str, remote_path: &str) -> Result<()> {
        let source = self.local_dirs.resolve(local_path);
        let destination = self.remote_dirs.resolve(remote_path);
        log_status!("put", "{} -> {}:{}", source, self.settings.host, destination);

        let output = self.executor.put_file(&source, &destination)?;
        self.transfer_result(StepKind::Put, source, destination, output)
    }

    fn transfer_result(
        &mut self,
        kind: StepKind,
        source: String,
        destination: String,
        output: CommandOutput,
    ) -> Result<()> {
        self.record(
            kind,
            format!("{} -> {}", source, destination),
            None,
            &output,
            false,
        );
        if output.success {
            return Ok(());
        }
        Err(Error::transfer_failed(TransferFailedDetails {
            source,
            destination,
            exit_code: output.exit_code,
            stderr: output.stderr,
        }))
    }

    // ------------------------------------------------------------------
    // Confirmation gates
    // ------------------------------------------------------------------

    /// Ask the operator; a "no" aborts the command.
    pub fn confirm_or_abort(&mut self, question: &str) -> Result<()> {
        let answer = self.confirm.confirm(question)?;
        self.history.push(StepRecord {
            kind: StepKind::Confirm,
            description: question.to_string(),
            dir: None,
            success: answer,
            exit_code: None,
            tolerant: false,
        });
        if answer {
            Ok(())
        } else {
            Err(Error::user_aborted(question))
        }
    }

    fn record(
        &mut self,
        kind: StepKind,
        description: String,
        dir: Option<&str>,
        output: &CommandOutput,
        tolerant: bool,
    ) {
        self.history.push(StepRecord {
            kind,
            description,
            dir: dir.map(str::to_string),
            success: output.success,
            exit_code: Some(output.exit_code),
            tolerant,
        });
    }

    fn record_ok(&mut self, kind: StepKind, description: String) {
        self.history.push(StepRecord {
            kind,
            description,
            dir: None,
            success: true,
            exit_code: None,
            tolerant: false,
        });
    }
}

fn with_trailing_slash(mut path: String) -> String {
    if !path.ends_with('/') {
        path.push('/');
    }
    path
}
