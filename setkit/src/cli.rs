// setkit/src/cli.rs
//! Defines the command-line argument structure using clap.
use clap::{ArgAction, Parser, Subcommand};
use setkit_common::error::Result;
use setkit_common::{CancelToken, Config};

pub mod chooser;
pub mod install;
pub mod list;
pub mod run;
pub mod runner;
pub mod status;
pub mod update;

use crate::cli::install::InstallArgs;
use crate::cli::list::List;
use crate::cli::run::RunArgs;
use crate::cli::update::Update;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "setkit", bin_name = "setkit")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the applications and utilities in the catalog
    List(List),
    /// Install, patch and configure applications
    Install(InstallArgs),
    /// Run utilities
    Run(RunArgs),
    /// Replace the local catalog with the remote one if it changed
    Update(Update),
}

impl Command {
    pub async fn run(&self, config: &Config, cancel: CancelToken) -> Result<()> {
        match self {
            Self::List(command) => command.run(config).await,
            Self::Install(command) => command.run(config, cancel).await,
            Self::Run(command) => command.run(config, cancel).await,
            Self::Update(command) => command.run(config).await,
        }
    }
}
