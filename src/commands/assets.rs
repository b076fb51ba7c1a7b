use stagehand::assets;

use super::{run_steps, CmdResult, GlobalArgs, StepsOutput};

pub fn run(global: &GlobalArgs) -> CmdResult<StepsOutput> {
    run_steps(global, "static", assets::collect_and_publish_static_assets)
}
