use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::utils::shell;

pub struct SshClient {
    pub host: String,
    pub user: Option<String>,
    pub port: u16,
    pub identity_file: Option<String>,
    /// When true, all commands run locally instead of over SSH.
    /// Set automatically when the host is localhost/127.0.0.1/::1.
    pub is_local: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl CommandOutput {
    fn spawn_error(context: &str, err: std::io::Error) -> Self {
        Self {
            stdout: String::new(),
            stderr: format!("{} error: {}", context, err),
            success: false,
            exit_code: -1,
        }
    }

    fn from_output(out: std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            success: out.status.success(),
            exit_code: out.status.code().unwrap_or(-1),
        }
    }
}

impl SshClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let identity_file = match &settings.identity_file {
            Some(path) if !path.is_empty() => {
                let expanded = shellexpand::tilde(path).to_string();
                if !Path::new(&expanded).exists() {
                    return Err(Error::config_invalid_value(
                        "identityFile",
                        Some(expanded),
                        "SSH identity file not found",
                    ));
                }
                Some(expanded)
            }
            _ => None,
        };

        let (user, host) = settings.ssh_target();
        let is_local = is_local_host(host);
        if is_local {
            log_status!("ssh", "Host '{}' is localhost, using local execution", host);
        }

        Ok(Self {
            host: host.to_string(),
            user: user.map(str::to_string),
            port: settings.port,
            identity_file,
            is_local,
        })
    }

    /// `user@host`, or just `host` when no user is configured.
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }

    fn connection_options(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(identity_file) = &self.identity_file {
            args.push("-i".to_string());
            args.push(identity_file.clone());
        }

        if self.port != 22 {
            args.push("-p".to_string());
            args.push(self.port.to_string());
        }

        // Fail fast instead of hanging on stalled connections or password prompts.
        args.extend([
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "ConnectTimeout=10".to_string(),
            "-o".to_string(),
            "ServerAliveInterval=15".to_string(),
            "-o".to_string(),
            "ServerAliveCountMax=3".to_string(),
        ]);

        args
    }

    /// Run a shell command line on the host. The caller is responsible for
    /// quoting; see `CommandLine::to_shell`.
    pub fn execute(&self, command: &str) -> CommandOutput {
        if self.is_local {
            return execute_local_shell(command);
        }

        let mut args = self.connection_options();
        args.push(self.destination());
        args.push(command.to_string());

        match Command::new("ssh").args(&args).output() {
            Ok(out) => CommandOutput::from_output(out),
            Err(e) => CommandOutput::spawn_error("SSH", e),
        }
    }

    /// Mirror a local directory into a remote one with rsync over ssh.
    /// Both paths are taken as-is, so trailing slashes keep rsync semantics.
    pub fn sync_directory(&self, local_dir: &str, remote_dir: &str) -> CommandOutput {
        let mut cmd = Command::new("rsync");
        cmd.args(self.rsync_args(local_dir, remote_dir));
        cmd.stdin(Stdio::null());

        match cmd.output() {
            Ok(out) => CommandOutput::from_output(out),
            Err(e) => CommandOutput::spawn_error("rsync", e),
        }
    }

    /// rsync argv (without the program). The remote path is passed raw:
    /// `--protect-args` keeps the remote shell from splitting it, so quoting
    /// it here would make the quotes part of the path.
    pub fn rsync_args(&self, local_dir: &str, remote_dir: &str) -> Vec<String> {
        let mut args = vec!["-pthrvz".to_string()];

        if self.is_local {
            args.push(local_dir.to_string());
            args.push(remote_dir.to_string());
            return args;
        }

        let rsh = std::iter::once("ssh".to_string())
            .chain(self.connection_options())
            .collect::<Vec<_>>();
        args.push("--protect-args".to_string());
        args.push("--rsh".to_string());
        args.push(shell::join_quoted(&rsh));
        args.push(local_dir.to_string());
        args.push(format!("{}:{}", self.destination(), remote_dir));
        args
    }

    /// Copy a single file to the host with scp.
    pub fn copy_file(&self, local_path: &str, remote_path: &str) -> CommandOutput {
        if self.is_local {
            return match std::fs::copy(local_path, remote_path) {
                Ok(_) => CommandOutput {
                    success: true,
                    ..CommandOutput::default()
                },
                Err(e) => CommandOutput::spawn_error("copy", e),
            };
        }

        let args = self.scp_args(local_path, remote_path);
        match Command::new("scp").args(&args).stdin(Stdio::null()).output() {
            Ok(out) => CommandOutput::from_output(out),
            Err(e) => CommandOutput::spawn_error("scp", e),
        }
    }

    /// scp argv (without the program). `-O` selects the legacy protocol,
    /// where the remote shell expands the target, so the path is quoted.
    pub fn scp_args(&self, local_path: &str, remote_path: &str) -> Vec<String> {
        let mut args = vec!["-O".to_string()];
        if let Some(identity_file) = &self.identity_file {
            args.extend(["-i".to_string(), identity_file.clone()]);
        }
        if self.port != 22 {
            args.extend(["-P".to_string(), self.port.to_string()]);
        }
        args.extend(["-o".to_string(), "BatchMode=yes".to_string()]);
        args.push(local_path.to_string());
        args.push(format!(
            "{}:{}",
            self.destination(),
            shell::quote_path(remote_path)
        ));
        args
    }
}

fn execute_local_shell(command: &str) -> CommandOutput {
    match Command::new("sh").args(["-c", command]).output() {
        Ok(out) => CommandOutput::from_output(out),
        Err(e) => CommandOutput::spawn_error("Command", e),
    }
}

/// Check if a host address refers to the local machine.
pub fn is_local_host(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(host: &str, port: u16) -> Settings {
        Settings {
            host: host.to_string(),
            port,
            ..Settings::default()
        }
    }

    #[test]
    fn destination_with_and_without_user() {
        let client = SshClient::from_settings(&settings("deploy@web1", 22)).unwrap();
        assert_eq!(client.destination(), "deploy@web1");
        assert!(!client.is_local);

        let client = SshClient::from_settings(&settings("web1", 22)).unwrap();
        assert_eq!(client.destination(), "web1");
    }

    #[test]
    fn non_default_port_is_passed() {
        let client = SshClient::from_settings(&settings("deploy@web1", 2222)).unwrap();
        let opts = client.connection_options();
        let pos = opts.iter().position(|a| a == "-p").unwrap();
        assert_eq!(opts[pos + 1], "2222");
        assert!(opts.contains(&"BatchMode=yes".to_string()));
    }

    #[test]
    fn missing_identity_file_is_rejected() {
        let mut s = settings("deploy@web1", 22);
        s.identity_file = Some("/nonexistent/stagehand/id_rsa".to_string());
        let err = SshClient::from_settings(&s).err().unwrap();
        assert_eq!(err.code.as_str(), "config.invalid_value");
    }

    #[test]
    fn localhost_runs_locally() {
        let client = SshClient::from_settings(&settings("me@localhost", 22)).unwrap();
        assert!(client.is_local);
        let out = client.execute("test -d /");
        assert!(out.success);
        let out = client.execute("test -d /nonexistent-stagehand-dir");
        assert!(!out.success);
    }

    #[test]
    fn rsync_target_is_raw_remote_path() {
        let client = SshClient::from_settings(&settings("deploy@web1", 22)).unwrap();
        let args = client.rsync_args("static/", "/srv/www/my shop/static_tmp/");
        assert_eq!(args[0], "-pthrvz");
        assert!(args.contains(&"--protect-args".to_string()));
        assert_eq!(args[args.len() - 2], "static/");
        assert_eq!(
            args[args.len() - 1],
            "deploy@web1:/srv/www/my shop/static_tmp/"
        );
    }

    #[test]
    fn rsync_rsh_carries_connection_options() {
        let client = SshClient::from_settings(&settings("deploy@web1", 2222)).unwrap();
        let args = client.rsync_args("static/", "/srv/app/static_tmp/");
        let pos = args.iter().position(|a| a == "--rsh").unwrap();
        let rsh = &args[pos + 1];
        assert!(rsh.starts_with("ssh -p 2222 -o BatchMode=yes"));
    }

    #[test]
    fn rsync_to_localhost_is_a_plain_copy() {
        let client = SshClient::from_settings(&settings("me@localhost", 22)).unwrap();
        assert_eq!(
            client.rsync_args("static/", "/srv/app/static_tmp/"),
            vec!["-pthrvz", "static/", "/srv/app/static_tmp/"]
        );
    }

    #[test]
    fn scp_uses_legacy_protocol_and_quoted_target() {
        let client = SshClient::from_settings(&settings("deploy@web1", 2222)).unwrap();
        let args = client.scp_args(
            "deploy/production_settings.py",
            "/srv/www/shop/app/shop/local_settings.py",
        );
        assert_eq!(
            args,
            vec![
                "-O",
                "-P",
                "2222",
                "-o",
                "BatchMode=yes",
                "deploy/production_settings.py",
                "deploy@web1:'/srv/www/shop/app/shop/local_settings.py'",
            ]
        );
    }

    #[test]
    fn scp_default_port_is_omitted() {
        let client = SshClient::from_settings(&settings("web1", 22)).unwrap();
        let args = client.scp_args("a.py", "/srv/a.py");
        assert!(!args.contains(&"-P".to_string()));
        assert_eq!(args.last().unwrap(), "web1:'/srv/a.py'");
    }

    #[test]
    fn local_host_detection() {
        assert!(is_local_host("127.0.0.1"));
        assert!(is_local_host("::1"));
        assert!(!is_local_host("example.com"));
    }
}
