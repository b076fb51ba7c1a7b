use chrono::{DateTime, Local};
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::LazyLock;

use crate::assets;
use crate::cmd;
use crate::error::{Error, Result};
use crate::git;
use crate::session::Session;
use crate::utils::command::CommandLine;

pub const CLONE_QUESTION: &str = "The remote deployment doesn't exist, try to clone it?";

/// Remote directory layout, relative to `remoteDir`.
pub const REMOTE_STATIC: &str = "static";
pub const REMOTE_STATIC_TMP: &str = "static_tmp";
pub const REMOTE_STATIC_OLD: &str = "static_old";
pub const REMOTE_DB: &str = "db";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOptions {
    /// Do not probe for the remote deployment directory.
    pub skip_remote_check: bool,
    /// The caller knows the deployment directory is gone; clone before syncing.
    pub fresh_clone: bool,
}

/// Commit, push, then publish static assets.
pub fn prepare_deploy(session: &mut Session, message: Option<&str>) -> Result<()> {
    git::commit(session, message)?;
    git::push(session)?;
    assets::collect_and_publish_static_assets(session)
}

/// Bring the remote deployment up to date and reload the web server.
pub fn deploy(session: &mut Session, options: DeployOptions) -> Result<()> {
    let remote_dir = session.settings().remote_dir.clone();

    let mut needs_clone = options.fresh_clone;
    if !options.skip_remote_check {
        let remote_dir_exists = session.remote_tolerant(cmd!("test", "-d", remote_dir.as_str()))?;
        if !remote_dir_exists {
            session.confirm_or_abort(CLONE_QUESTION)?;
            needs_clone = true;
        }
    }

    if needs_clone {
        clone(session)?;
    }

    // With the check skipped, a missing deployment first shows up here.
    let pulled = session.in_remote_dir(&remote_dir, |s| {
        s.remote_in_existing_dir(cmd!("git", "pull"))
    })?;
    if !pulled {
        log_status!("deploy", "{} does not exist on the host, cloning", remote_dir);
        clone(session)?;
        session.in_remote_dir(&remote_dir, |s| s.remote(cmd!("git", "pull")).map(|_| ()))?;
    }

    session.in_remote_dir(&remote_dir, |s| {
        s.remote(cmd!("git", "submodule", "update"))?;
        s.remote(cmd!("mkdir", REMOTE_STATIC_TMP))?;
        s.sync_dir(assets::STATIC_DIR, REMOTE_STATIC_TMP)?;
        swap_static(s, &remote_dir)?;
        s.remote(cmd!("chmod", "-R", "777", REMOTE_DB))?;
        Ok(())
    })?;

    push_localsettings(session)?;

    let reload = CommandLine::from_argv(&session.settings().reload_command).ok_or_else(|| {
        Error::config_invalid_value("reloadCommand", None, "reloadCommand is empty")
    })?;
    session.remote(reload)?;
    Ok(())
}

/// Replace the live static tree with the freshly synced one. The backup only
/// exists while the swap is in flight, and not at all on a first deploy.
fn swap_static(session: &mut Session, remote_dir: &str) -> Result<()> {
    let live = format!("{}/{}", remote_dir.trim_end_matches('/'), REMOTE_STATIC);
    let static_dir_exists = session.remote_tolerant(cmd!("test", "-d", live))?;

    if static_dir_exists {
        session.remote(cmd!("mv", REMOTE_STATIC, REMOTE_STATIC_OLD))?;
    }
    session.remote(cmd!("mv", REMOTE_STATIC_TMP, REMOTE_STATIC))?;
    if static_dir_exists {
        session.remote(cmd!("rm", "-rf", REMOTE_STATIC_OLD))?;
    }
    Ok(())
}

/// Create the remote deployment from scratch: clone, database dir, settings,
/// schema.
pub fn clone(session: &mut Session) -> Result<()> {
    let remote_dir = session.settings().remote_dir.clone();
    let git_repo = session.settings().git_repo.clone();

    session.remote(cmd!("mkdir", remote_dir.as_str()))?;

    session.in_remote_dir(&remote_dir, |s| {
        s.remote(cmd!("git", "clone", "--recursive", git_repo, "."))?;
        s.remote(cmd!("mkdir", REMOTE_DB))?;
        s.remote(cmd!("chmod", "777", REMOTE_DB))?;
        push_localsettings(s)
    })?;

    session.in_remote_dir(&format!("{}/app/", remote_dir.trim_end_matches('/')), |s| {
        s.remote(cmd!("./manage.py", "syncdb")).map(|_| ())
    })?;

    session.in_remote_dir(&remote_dir, |s| {
        s.remote(cmd!("chmod", "-R", "777", REMOTE_DB)).map(|_| ())
    })
}

/// Move the current deployment aside under a timestamped name and deploy a
/// fresh clone in its place.
pub fn reclone(session: &mut Session) -> Result<String> {
    let remote_dir = session.settings().remote_dir.trim_end_matches('/').to_string();
    let path = Path::new(&remote_dir);
    let (parent, name) = match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => (
            parent.to_string_lossy().to_string(),
            name.to_string_lossy().to_string(),
        ),
        _ => {
            return Err(Error::config_invalid_value(
                "remoteDir",
                Some(remote_dir.clone()),
                "remoteDir must have a parent directory",
            ))
        }
    };
    let parent = if parent.is_empty() { ".".to_string() } else { parent };

    let backup = backup_dirname(&Local::now());
    session.in_remote_dir(&parent, |s| {
        s.remote(cmd!("mv", name, backup.as_str())).map(|_| ())
    })?;

    deploy(
        session,
        DeployOptions {
            skip_remote_check: true,
            fresh_clone: true,
        },
    )?;
    Ok(backup)
}

/// Upload the local settings file into the application package on the host.
pub fn push_localsettings(session: &mut Session) -> Result<()> {
    let settings = session.settings().clone();
    let remote_dir = settings.remote_dir.clone();
    session.in_remote_dir(&remote_dir, |s| {
        s.put(
            &settings.settings_file,
            &format!("app/{}/local_settings.py", settings.app_name),
        )
    })
}

// Path separators, shell/glob metacharacters, spaces and backslashes.
static UNSAFE_PATH_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/:()<>|?* \\]").unwrap());

/// Directory-safe rendering of a timestamp, used as the reclone backup name.
pub fn backup_dirname(now: &DateTime<Local>) -> String {
    let stamp = now.format("%Y-%m-%d %H:%M:%S%.6f").to_string();
    sanitize_dirname(&stamp)
}

/// Replace every character unsafe in a path component with `_`.
pub fn sanitize_dirname(raw: &str) -> String {
    UNSAFE_PATH_CHARS.replace_all(raw, "_").into_owned()
}
