use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Project-local override file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "stagehand.json";

/// Placeholder app name; `setup` replaces it with the scaffolded name.
pub const APP_TEMPLATE_NAME: &str = "APP_TEMPLATE_NAME";

/// Everything a command needs to know about the project and its deployment
/// target. Built once per invocation; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// SSH target in `user@host` form.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<String>,

    #[serde(default = "default_aws_access_key")]
    pub aws_access_key: String,

    #[serde(default = "default_aws_secret")]
    pub aws_secret: String,

    #[serde(default = "default_s3_bucket")]
    pub s3_bucket: String,

    /// Prefix stripped from uploaded object keys.
    #[serde(default = "default_local_dir")]
    pub local_dir: String,

    #[serde(default = "default_remote_dir")]
    pub remote_dir: String,

    /// Local file pushed to `app/<appName>/local_settings.py` on the host.
    #[serde(default = "default_settings_file")]
    pub settings_file: String,

    #[serde(default = "default_git_repo")]
    pub git_repo: String,

    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default = "default_reload_command")]
    pub reload_command: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            identity_file: None,
            aws_access_key: default_aws_access_key(),
            aws_secret: default_aws_secret(),
            s3_bucket: default_s3_bucket(),
            local_dir: default_local_dir(),
            remote_dir: default_remote_dir(),
            settings_file: default_settings_file(),
            git_repo: default_git_repo(),
            app_name: default_app_name(),
            reload_command: default_reload_command(),
        }
    }
}

impl Settings {
    /// Copy of these settings with the scaffolded application name recorded.
    pub fn with_app_name(&self, app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            ..self.clone()
        }
    }

    /// Split `host` into `(user, hostname)`. A bare hostname has no user.
    pub fn ssh_target(&self) -> (Option<&str>, &str) {
        match self.host.split_once('@') {
            Some((user, host)) => (Some(user), host),
            None => (None, self.host.as_str()),
        }
    }

    /// Same settings with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            aws_secret: mask(&self.aws_secret),
            ..self.clone()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::config_invalid_value(
                "host",
                None,
                "host must be a non-empty ssh target",
            ));
        }
        if self.remote_dir.trim().is_empty() || self.remote_dir.trim_end_matches('/').is_empty() {
            return Err(Error::config_invalid_value(
                "remoteDir",
                Some(self.remote_dir.clone()),
                "remoteDir must name a directory below /",
            ));
        }
        if self.reload_command.is_empty() {
            return Err(Error::config_invalid_value(
                "reloadCommand",
                None,
                "reloadCommand must contain at least the program name",
            ));
        }
        Ok(())
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_host() -> String {
    "user@example.com".to_string()
}

fn default_port() -> u16 {
    22
}

fn default_aws_access_key() -> String {
    "your_access_key".to_string()
}

fn default_aws_secret() -> String {
    "your_aws_secret".to_string()
}

fn default_s3_bucket() -> String {
    "your-bucketname".to_string()
}

fn default_local_dir() -> String {
    "/full/path/to/local/dir".to_string()
}

fn default_remote_dir() -> String {
    "/full/path/to/remote/dir".to_string()
}

fn default_settings_file() -> String {
    "relative/path/to/deployment/settings/file".to_string()
}

fn default_git_repo() -> String {
    "git@example.com:username/repo.git".to_string()
}

fn default_app_name() -> String {
    APP_TEMPLATE_NAME.to_string()
}

fn default_reload_command() -> Vec<String> {
    ["sudo", "service", "httpd", "reload"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// Loading functions
// =============================================================================

/// Resolve the override file path: explicit `--config` wins, then
/// `stagehand.json` in the working directory. `~` is expanded.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    match explicit {
        Some(path) => PathBuf::from(shellexpand::tilde(path).to_string()),
        None => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

/// Load settings: built-in defaults overlaid with the override file.
///
/// A missing file is not an error; it is logged and defaults are used.
/// A file that exists but cannot be parsed is an error.
pub fn load(path: &Path) -> Result<Settings> {
    if !path.exists() {
        log_status!(
            "config",
            "No local configuration exists at {}; using defaults",
            path.display()
        );
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    let settings = parse(&content, &path.display().to_string())?;
    log_status!("config", "Loaded {}", path.display());
    Ok(settings)
}

/// Parse an override document. Keys absent from it keep their defaults.
pub fn parse(content: &str, source: &str) -> Result<Settings> {
    let settings: Settings =
        serde_json::from_str(content).map_err(|e| Error::config_invalid_json(source, e))?;
    settings.validate()?;
    Ok(settings)
}

/// Write settings back to the override file, preserving any keys this
/// version does not know about.
pub fn save(path: &Path, settings: &Settings) -> Result<()> {
    let mut document = if path.exists() {
        let existing = fs::read_to_string(path).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
        })?;
        serde_json::from_str::<serde_json::Value>(&existing)
            .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))?
    } else {
        serde_json::Value::Object(serde_json::Map::new())
    };

    let updates = serde_json::to_value(settings)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize settings".to_string())))?;

    match (&mut document, updates) {
        (serde_json::Value::Object(doc), serde_json::Value::Object(fields)) => {
            for (key, value) in fields {
                doc.insert(key, value);
            }
        }
        _ => {
            return Err(Error::config_invalid_value(
                path.display().to_string(),
                None,
                "configuration file must contain a JSON object",
            ))
        }
    }

    let content = serde_json::to_string_pretty(&document)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize settings".to_string())))?;

    fs::write(path, content + "\n").map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("write {}", path.display())))
    })
}
