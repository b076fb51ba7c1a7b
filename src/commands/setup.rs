use clap::Args;
use serde::Serialize;

use stagehand::log_status;
use stagehand::session::StepRecord;
use stagehand::setup;

use super::{run_session, run_steps, CmdResult, GlobalArgs, StepsOutput};

#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Name of the Django application to create
    pub app_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupOutput {
    pub command: String,
    pub app_name: String,
    /// Override file the app name was recorded in.
    pub config_path: String,
    pub steps: Vec<StepRecord>,
}

pub fn run(args: SetupArgs, global: &GlobalArgs) -> CmdResult<SetupOutput> {
    let app_name = args.app_name.unwrap_or_default();
    let settings = global.load_settings()?;

    let (updated, steps) = run_session(global, &settings, |session| {
        setup::setup(session, &app_name)
    })?;

    let config_path = global.config_path();
    stagehand::config::save(&config_path, &updated)?;
    log_status!("setup", "Recorded app name '{}' in {}", updated.app_name, config_path.display());

    Ok((
        SetupOutput {
            command: "setup".to_string(),
            app_name: updated.app_name,
            config_path: config_path.display().to_string(),
            steps,
        },
        0,
    ))
}

pub fn clean_all(global: &GlobalArgs) -> CmdResult<StepsOutput> {
    run_steps(global, "setup-clean-all", setup::setup_clean_all)
}
