use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use stagehand::config::Settings;
use stagehand::executor::SystemExecutor;
use stagehand::prompt::{AssumeYes, Confirm};
use stagehand::session::{Session, StepRecord};

use crate::tty::TtyConfirm;

pub type CmdResult<T> = stagehand::Result<(T, i32)>;

#[derive(Args, Debug, Default)]
pub(crate) struct GlobalArgs {
    /// Override file merged over the built-in defaults (default: ./stagehand.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Answer yes to every confirmation prompt
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

impl GlobalArgs {
    pub fn config_path(&self) -> PathBuf {
        stagehand::config::config_path(self.config.as_deref())
    }

    pub fn load_settings(&self) -> stagehand::Result<Settings> {
        stagehand::config::load(&self.config_path())
    }
}

/// Steps a command executed, in order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepsOutput {
    pub command: String,
    pub steps: Vec<StepRecord>,
}

/// Run `body` in a fresh session against real processes and the configured
/// confirmation source; returns its value with the recorded steps.
pub(crate) fn run_session<T>(
    global: &GlobalArgs,
    settings: &Settings,
    body: impl FnOnce(&mut Session) -> stagehand::Result<T>,
) -> stagehand::Result<(T, Vec<StepRecord>)> {
    let mut executor = SystemExecutor::new(settings);
    let mut assume_yes = AssumeYes;
    let mut tty = TtyConfirm;
    let confirm: &mut dyn Confirm = if global.yes {
        &mut assume_yes
    } else {
        &mut tty
    };

    let mut session = Session::new(settings, &mut executor, confirm);
    let value = body(&mut session)?;
    Ok((value, session.into_history()))
}

/// Load settings, run one operation, report its steps.
pub(crate) fn run_steps(
    global: &GlobalArgs,
    command: &str,
    body: impl FnOnce(&mut Session) -> stagehand::Result<()>,
) -> CmdResult<StepsOutput> {
    let settings = global.load_settings()?;
    let ((), steps) = run_session(global, &settings, body)?;
    Ok((
        StepsOutput {
            command: command.to_string(),
            steps,
        },
        0,
    ))
}

pub mod assets;
pub mod config;
pub mod deploy;
pub mod git;
pub mod setup;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($handler:expr) => {
        crate::output::map_cmd_result_to_json($handler)
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (stagehand::Result<serde_json::Value>, i32) {
    crate::tty::status("stagehand is working...");

    match command {
        crate::Commands::Static => dispatch!(assets::run(global)),
        crate::Commands::Commit(args) => dispatch!(git::commit(args, global)),
        crate::Commands::Push => dispatch!(git::push(global)),
        crate::Commands::PrepareDeploy(args) => dispatch!(deploy::prepare(args, global)),
        crate::Commands::Deploy(args) => dispatch!(deploy::run(args, global)),
        crate::Commands::Clone => dispatch!(deploy::clone(global)),
        crate::Commands::Reclone => dispatch!(deploy::reclone(global)),
        crate::Commands::PushLocalsettings => dispatch!(deploy::push_localsettings(global)),
        crate::Commands::Setup(args) => dispatch!(setup::run(args, global)),
        crate::Commands::SetupCleanAll => dispatch!(setup::clean_all(global)),
        crate::Commands::Config(args) => dispatch!(config::run(args, global)),
    }
}
