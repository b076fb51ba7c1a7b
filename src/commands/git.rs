use clap::Args;

use stagehand::git;

use super::{run_steps, CmdResult, GlobalArgs, StepsOutput};

#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Commit message; opens the editor when omitted
    #[arg(short, long)]
    pub message: Option<String>,
}

pub fn commit(args: CommitArgs, global: &GlobalArgs) -> CmdResult<StepsOutput> {
    run_steps(global, "commit", |session| {
        git::commit(session, args.message.as_deref())
    })
}

pub fn push(global: &GlobalArgs) -> CmdResult<StepsOutput> {
    run_steps(global, "push", git::push)
}
