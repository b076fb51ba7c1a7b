use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{config, deploy, git, setup};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(version = VERSION)]
#[command(about = "Scaffold, commit and deploy a git-tracked Django application")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate favicons, collect static files and upload them to the bucket
    #[command(name = "static", visible_alias = "prepare-staticfiles")]
    Static,
    /// Interactively stage hunks and commit them
    Commit(git::CommitArgs),
    /// Push the current branch to its upstream
    Push,
    /// Commit, push and publish static files in one go
    PrepareDeploy(git::CommitArgs),
    /// Update the remote deployment and reload the web server
    Deploy(deploy::DeployArgs),
    /// Create the remote deployment from the git repository
    Clone,
    /// Move the remote deployment aside and deploy a fresh clone
    Reclone,
    /// Upload the local settings file to the remote application
    #[command(name = "push-localsettings")]
    PushLocalsettings,
    /// Scaffold a new application from the project template
    Setup(setup::SetupArgs),
    /// Remove everything setup generated
    SetupCleanAll,
    /// Inspect the effective configuration
    Config(config::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let (json_result, exit_code) = commands::run_json(cli.command, &cli.global);

    if output::print_json_result(json_result).is_err() {
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
