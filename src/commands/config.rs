use clap::{Args, Subcommand};
use serde::Serialize;

use stagehand::assets::{Favicon, FAVICONS};
use stagehand::config::Settings;

use super::{CmdResult, GlobalArgs};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Display the effective settings (defaults merged with the override file)
    Show {
        /// Show only built-in defaults (ignore the override file)
        #[arg(long)]
        builtin: bool,
    },
    /// Show the path of the override file and whether it exists
    Path,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOutput {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    settings: Option<Settings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    favicons: Option<&'static [Favicon]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exists: Option<bool>,
}

pub fn run(args: ConfigArgs, global: &GlobalArgs) -> CmdResult<ConfigOutput> {
    match args.command {
        ConfigCommand::Show { builtin } => show(builtin, global),
        ConfigCommand::Path => path(global),
    }
}

fn show(builtin: bool, global: &GlobalArgs) -> CmdResult<ConfigOutput> {
    let settings = if builtin {
        Settings::default()
    } else {
        global.load_settings()?
    };

    Ok((
        ConfigOutput {
            command: "config.show".to_string(),
            settings: Some(settings.redacted()),
            favicons: Some(FAVICONS),
            path: None,
            exists: None,
        },
        0,
    ))
}

fn path(global: &GlobalArgs) -> CmdResult<ConfigOutput> {
    let path = global.config_path();
    Ok((
        ConfigOutput {
            command: "config.path".to_string(),
            settings: None,
            favicons: None,
            exists: Some(path.exists()),
            path: Some(path.display().to_string()),
        },
        0,
    ))
}
