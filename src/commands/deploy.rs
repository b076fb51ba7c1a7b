use clap::Args;
use serde::Serialize;

use stagehand::deploy::{self, DeployOptions};
use stagehand::session::StepRecord;

use super::git::CommitArgs;
use super::{run_session, run_steps, CmdResult, GlobalArgs, StepsOutput};

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Skip the existence check; a missing deployment is still cloned
    #[arg(long)]
    pub skip_remote_check: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecloneOutput {
    pub command: String,
    /// Name the previous deployment was moved to, next to `remoteDir`.
    pub backup_dir: String,
    pub steps: Vec<StepRecord>,
}

pub fn prepare(args: CommitArgs, global: &GlobalArgs) -> CmdResult<StepsOutput> {
    run_steps(global, "prepare-deploy", |session| {
        deploy::prepare_deploy(session, args.message.as_deref())
    })
}

pub fn run(args: DeployArgs, global: &GlobalArgs) -> CmdResult<StepsOutput> {
    let options = DeployOptions {
        skip_remote_check: args.skip_remote_check,
        fresh_clone: false,
    };
    run_steps(global, "deploy", |session| deploy::deploy(session, options))
}

pub fn clone(global: &GlobalArgs) -> CmdResult<StepsOutput> {
    run_steps(global, "clone", deploy::clone)
}

pub fn reclone(global: &GlobalArgs) -> CmdResult<RecloneOutput> {
    let settings = global.load_settings()?;
    let (backup_dir, steps) = run_session(global, &settings, deploy::reclone)?;
    Ok((
        RecloneOutput {
            command: "reclone".to_string(),
            backup_dir,
            steps,
        },
        0,
    ))
}

pub fn push_localsettings(global: &GlobalArgs) -> CmdResult<StepsOutput> {
    run_steps(global, "push-localsettings", deploy::push_localsettings)
}
