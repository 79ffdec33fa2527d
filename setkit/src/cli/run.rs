// setkit/src/cli/run.rs
use clap::Args;
use setkit_common::error::{Result, SetkitError};
use setkit_common::{CancelToken, Config};
use setkit_core::{load_catalog, Selection};
use setkit_net::Downloader;

use crate::cli::runner::{execute_selection, RunFlags};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Utilities to run, by catalog name, in the given order
    #[arg(required = true)]
    names: Vec<String>,

    #[command(flatten)]
    flags: RunFlags,
}

impl RunArgs {
    pub async fn run(&self, config: &Config, cancel: CancelToken) -> Result<()> {
        let downloader = Downloader::new(config)?;
        let catalog = load_catalog(config, &downloader).await?;
        let selection = self
            .names
            .iter()
            .map(|name| {
                catalog.utility(name).map(Selection::Utility).ok_or_else(|| {
                    SetkitError::NotFound(format!("No utility named '{name}' in the catalog"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        execute_selection(config, downloader, &selection, &self.flags, None, cancel).await
    }
}
