//! First-time project scaffolding.
//!
//! `setup` turns the project template into a named Django application:
//! Foundation assets, a virtualenv, the Django project itself, and finally a
//! clean git repository. Every sub-step refuses to run without an app name.

use crate::cmd;
use crate::config::{Settings, APP_TEMPLATE_NAME};
use crate::error::{Error, Result};
use crate::session::Session;

pub const SETUP_QUESTION: &str =
    "You're about to run setup, which will trash any existing app. OK?";
pub const SETUP_COMPLETE_QUESTION: &str =
    "Setup is complete. We'll now wipe out the setup directories, and initialize an empty git repo. OK?";
pub const CLEAN_ALL_QUESTION: &str =
    "This will clean any work done by setup, and is potentially very dangerous. OK?";

/// Paths removed by `setup_clean_all`, besides compiled Python files.
pub const SCAFFOLD_PATHS: &[&str] = &["assets", "venv", "app", "templates/base.html"];

const VENV_BIN: &str = "venv/bin";

fn require_app_name<'n>(app_name: &'n str, step: &str) -> Result<&'n str> {
    let trimmed = app_name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation_missing_argument(
            vec!["app_name".to_string()],
            format!("stagehand {} <APP_NAME>", step),
        ));
    }
    if trimmed.contains(['/', '\\']) || trimmed.starts_with('.') {
        return Err(Error::validation_invalid_argument(
            "app_name",
            format!("'{}' is not a valid application directory name", trimmed),
        ));
    }
    Ok(trimmed)
}

/// Scaffold the whole project and return settings that record the new app
/// name. Persisting them is the caller's business.
pub fn setup(session: &mut Session, app_name: &str) -> Result<Settings> {
    let app_name = require_app_name(app_name, "setup")?;

    session.confirm_or_abort(SETUP_QUESTION)?;

    setup_assets(session, app_name)?;
    setup_virtualenv(session, app_name)?;
    setup_django(session, app_name)?;
    setup_complete(session)?;

    Ok(session.settings().with_app_name(app_name))
}

/// Create the Foundation asset skeleton with an app-specific stylesheet.
pub fn setup_assets(session: &mut Session, app_name: &str) -> Result<()> {
    let app_name = require_app_name(app_name, "setup-assets")?;

    session.local(cmd!(
        "compass",
        "create",
        "assets",
        "-r",
        "zurb-foundation",
        "--using",
        "foundation"
    ))?;

    session.in_local_dir("assets/", |s| {
        s.local(cmd!("rm", "index.html"))?;
        s.local(cmd!("touch", format!("sass/_{}.scss", app_name)))?;
        s.append_local("sass/app.scss", &format!("@import \"{}\";\n", app_name))
    })
}

/// Create the virtualenv and install requirements into it.
pub fn setup_virtualenv(session: &mut Session, app_name: &str) -> Result<()> {
    require_app_name(app_name, "setup-virtualenv")?;

    session.local(cmd!("virtualenv", "venv", "--distribute"))?;
    session.local(cmd!(
        format!("{}/pip", VENV_BIN),
        "install",
        "-r",
        "requirements.txt"
    ))
}

/// Start the Django project under `app/` and render the templates.
pub fn setup_django(session: &mut Session, app_name: &str) -> Result<()> {
    let app_name = require_app_name(app_name, "setup-django")?;

    session.local(cmd!(
        format!("{}/django-admin", VENV_BIN),
        "startproject",
        app_name
    ))?;
    session.local(cmd!("mv", app_name, "app"))?;

    let replacements = [(APP_TEMPLATE_NAME, app_name)];
    session.render_template("django/base.html", "templates/base.html", &replacements)?;
    session.render_template(
        "django/settings.py",
        &format!("app/{}/settings.py", app_name),
        &replacements,
    )?;

    setup_django_localsettings(session, app_name)
}

// TODO: generate real defaults (database, secret key) instead of an empty file.
pub fn setup_django_localsettings(session: &mut Session, app_name: &str) -> Result<()> {
    let app_name = require_app_name(app_name, "setup-django-localsettings")?;
    session.local(cmd!("touch", format!("app/{}/settings_local.py", app_name)))
}

/// Drop the template's leftovers and start a fresh repository.
pub fn setup_complete(session: &mut Session) -> Result<()> {
    session.confirm_or_abort(SETUP_COMPLETE_QUESTION)?;

    session.local(cmd!("rm", "-rf", "django", ".git"))?;
    session.local(cmd!("git", "init", "."))
}

/// Remove everything `setup` generated.
pub fn setup_clean_all(session: &mut Session) -> Result<()> {
    session.confirm_or_abort(CLEAN_ALL_QUESTION)?;

    let compiled = session.glob_local("*.pyc")?;
    session.local(
        cmd!("rm", "-rf")
            .args(SCAFFOLD_PATHS.iter().copied())
            .args(compiled),
    )
}
