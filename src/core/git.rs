use crate::cmd;
use crate::error::Result;
use crate::session::Session;

pub const STAGING_ERRORS_QUESTION: &str = "`git add` returned some errors. Commit anyway?";

/// Interactively stage hunks and commit them.
///
/// Staging is tolerant: if `git add -p` fails the operator decides whether
/// to commit anyway. With no message the commit opens the editor.
pub fn commit(session: &mut Session, message: Option<&str>) -> Result<()> {
    let staged = session.local_tolerant(cmd!("git", "add", "-p"))?;
    if !staged {
        session.confirm_or_abort(STAGING_ERRORS_QUESTION)?;
    }

    match message.filter(|m| !m.is_empty()) {
        Some(message) => session.local(cmd!("git", "commit", "-m", message)),
        None => session.local(cmd!("git", "commit")),
    }
}

/// Push the current branch to its upstream.
pub fn push(session: &mut Session) -> Result<()> {
    session.local(cmd!("git", "push"))
}
