// setkit/src/cli/install.rs
use std::sync::Arc;

use clap::Args;
use setkit_common::error::{Result, SetkitError};
use setkit_common::{CancelToken, Config};
use setkit_core::{load_catalog, Selection, SourceChooser};
use setkit_net::Downloader;

use crate::cli::chooser::PromptChooser;
use crate::cli::runner::{execute_selection, RunFlags};

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Applications to install, by catalog name
    #[arg(required_unless_present = "all")]
    names: Vec<String>,

    /// Install every application in the catalog
    #[arg(long, conflicts_with = "names")]
    all: bool,

    /// Ask which download source to use when an application offers several
    #[arg(short, long)]
    interactive: bool,

    #[command(flatten)]
    flags: RunFlags,
}

impl InstallArgs {
    pub async fn run(&self, config: &Config, cancel: CancelToken) -> Result<()> {
        let downloader = Downloader::new(config)?;
        let catalog = load_catalog(config, &downloader).await?;

        let selection: Vec<Selection<'_>> = if self.all {
            catalog.applications.iter().map(Selection::Application).collect()
        } else {
            self.names
                .iter()
                .map(|name| {
                    catalog
                        .application(name)
                        .map(Selection::Application)
                        .ok_or_else(|| {
                            SetkitError::NotFound(format!("No application named '{name}' in the catalog"))
                        })
                })
                .collect::<Result<_>>()?
        };

        let chooser: Option<Arc<dyn SourceChooser>> = if self.interactive {
            Some(Arc::new(PromptChooser))
        } else {
            None
        };
        execute_selection(config, downloader, &selection, &self.flags, chooser, cancel).await
    }
}
