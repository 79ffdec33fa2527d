// setkit/src/cli/runner.rs
use std::sync::Arc;

use clap::Args;
use setkit_common::error::Result;
use setkit_common::{CancelToken, Config, MatchMode};
use setkit_core::{CleanupMode, Installer, Selection, SourceChooser, SystemPlatform};
use setkit_net::Downloader;
use tokio::sync::broadcast;
use tracing::debug;

use crate::cli::status;

/// Flags shared by `install` and `run`.
#[derive(Args, Debug, Clone, Default)]
pub struct RunFlags {
    /// Remove the files this run downloaded once it finishes
    #[arg(long)]
    pub cleanup: bool,

    /// Remove everything in the temp directory once the run finishes
    #[arg(long, conflicts_with = "cleanup")]
    pub cleanup_all: bool,

    /// Match the registry display name as a substring instead of exactly
    #[arg(long)]
    pub match_contains: bool,
}

impl RunFlags {
    pub fn cleanup_mode(&self) -> CleanupMode {
        if self.cleanup_all {
            CleanupMode::All
        } else if self.cleanup {
            CleanupMode::Tracked
        } else {
            CleanupMode::None
        }
    }
}

/// Processes `selection` with a status printer attached and prints a summary.
pub async fn execute_selection(
    config: &Config,
    downloader: Downloader,
    selection: &[Selection<'_>],
    flags: &RunFlags,
    chooser: Option<Arc<dyn SourceChooser>>,
    cancel: CancelToken,
) -> Result<()> {
    let (event_tx, event_rx) = broadcast::channel(256);
    let printer = tokio::spawn(status::print_events(event_rx));

    let mut installer = Installer::with_downloader(config, Arc::new(SystemPlatform::new()), downloader)
        .with_events(event_tx)
        .with_cancel(cancel);
    if flags.match_contains {
        installer = installer.with_match_mode(MatchMode::Contains);
    }
    if let Some(chooser) = chooser {
        installer = installer.with_chooser(chooser);
    }
    debug!("Temp directory: {}", installer.temp_dir().display());

    let reports = installer
        .process_selection(selection, flags.cleanup_mode())
        .await;

    // Dropping the installer closes the event channel and ends the printer.
    drop(installer);
    if let Err(e) = printer.await {
        debug!("Status printer task ended abnormally: {}", e);
    }
    status::print_summary(&reports, selection.len());
    Ok(())
}
