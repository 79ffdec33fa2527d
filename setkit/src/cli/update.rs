//! Contains the logic for the `update` command.
use colored::Colorize;
use setkit_common::error::Result;
use setkit_common::Config;
use setkit_core::{refresh_catalog, RefreshOutcome};
use setkit_net::Downloader;

#[derive(clap::Args, Debug)]
pub struct Update;

impl Update {
    pub async fn run(&self, config: &Config) -> Result<()> {
        tracing::debug!("Refreshing catalog at {}", config.catalog_path().display());
        let downloader = Downloader::new(config)?;
        match refresh_catalog(config, &downloader).await? {
            RefreshOutcome::Updated => {
                println!("{} {}", "==>".bold().blue(), "Catalog updated".bold());
            }
            RefreshOutcome::UpToDate => {
                println!("{} Catalog is up-to-date", "==>".bold().blue());
            }
        }
        Ok(())
    }
}
