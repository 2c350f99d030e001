//! CLI 명령 파싱 모듈.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "mapdiffbot")]
#[command(about = "Render before/after images of changed map files and post them on the pull request")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Handle a single pull_request webhook payload (JSON file, `-` for stdin)
    Run {
        payload: PathBuf,
    },
    /// Read newline-delimited pull_request payloads from stdin and build them concurrently
    Listen,
    /// Show effective merged config and render tool availability
    Config,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CliAction {
    Run { payload: PathBuf },
    Listen,
    InspectConfig,
}

impl Cli {
    pub fn parse_action() -> CliAction {
        Self::parse().into_action()
    }

    fn into_action(self) -> CliAction {
        match self.command {
            Commands::Run { payload } => CliAction::Run { payload },
            Commands::Listen => CliAction::Listen,
            Commands::Config => CliAction::InspectConfig,
        }
    }
}
