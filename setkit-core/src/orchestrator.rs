// setkit-core/src/orchestrator.rs
use std::path::{Path, PathBuf};
use std::sync::Arc;

use setkit_aio::{purge_dir_contents, remove_paths};
use setkit_common::context::INSTALL_DIR;
use setkit_common::error::Result;
use setkit_common::model::{Application, InstallAction, Utility};
use setkit_common::{
    CancelToken, Config, Context, InstallEvent, MatchMode, OwnerKind, Phase, RunReport,
};
use setkit_net::Downloader;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::chooser::{FirstAvailable, SourceChooser};
use crate::dispatch::{Dispatcher, ListScope, RunState};
use crate::platform::Platform;

/// What to remove from the temp directory once a run is finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CleanupMode {
    #[default]
    None,
    /// Only the files this run downloaded.
    Tracked,
    /// Everything in the temp directory.
    All,
}

/// One top-level item picked for processing.
#[derive(Debug, Clone, Copy)]
pub enum Selection<'a> {
    Application(&'a Application),
    Utility(&'a Utility),
}

impl Selection<'_> {
    pub fn name(&self) -> &str {
        match self {
            Selection::Application(app) => &app.name,
            Selection::Utility(util) => &util.name,
        }
    }
}

/// Sequences phases for applications and the single list of a utility.
#[derive(Debug, Clone)]
pub struct Installer {
    dispatcher: Dispatcher,
    temp_dir: PathBuf,
    match_mode: MatchMode,
}

impl Installer {
    pub fn new(config: &Config, platform: Arc<dyn Platform>) -> Result<Self> {
        let downloader = Downloader::new(config)?;
        Ok(Self::with_downloader(config, platform, downloader))
    }

    pub fn with_downloader(
        config: &Config,
        platform: Arc<dyn Platform>,
        downloader: Downloader,
    ) -> Self {
        let dispatcher = Dispatcher::new(
            Arc::new(downloader),
            platform,
            Arc::new(FirstAvailable),
            config.tools_dir().to_path_buf(),
        );
        Self {
            dispatcher,
            temp_dir: config.temp_dir().to_path_buf(),
            match_mode: config.registry_match,
        }
    }

    pub fn with_chooser(mut self, chooser: Arc<dyn SourceChooser>) -> Self {
        self.dispatcher.chooser = chooser;
        self
    }

    pub fn with_events(mut self, events: broadcast::Sender<InstallEvent>) -> Self {
        self.dispatcher = self.dispatcher.with_events(events);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.dispatcher = self.dispatcher.with_cancel(cancel);
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn cancel_token(&self) -> &CancelToken {
        self.dispatcher.cancel_token()
    }

    /// Processes `selection` one item at a time. Cancellation stops before the
    /// next item; the interrupted item still reports what it got through.
    pub async fn process_selection(
        &self,
        selection: &[Selection<'_>],
        cleanup: CleanupMode,
    ) -> Vec<RunReport> {
        let mut reports = Vec::with_capacity(selection.len());
        for (i, item) in selection.iter().enumerate() {
            if self.cancel_token().is_cancelled() {
                warn!(
                    "Cancelled; skipping {} remaining item(s) starting with {}",
                    selection.len() - i,
                    item.name()
                );
                break;
            }
            let report = match item {
                Selection::Application(app) => self.process_application(app, cleanup).await,
                Selection::Utility(util) => self.process_utility(util, cleanup).await,
            };
            reports.push(report);
        }
        reports
    }

    #[instrument(skip_all, fields(app = %app.name))]
    pub async fn process_application(&self, app: &Application, cleanup: CleanupMode) -> RunReport {
        let mut report = RunReport::new(&app.name, OwnerKind::Application);
        info!("----- Starting process for {} -----", app.name);
        self.dispatcher.emit(InstallEvent::RunStarted {
            owner: app.name.clone(),
            owner_kind: OwnerKind::Application,
        });

        if let Some(process) = app.process_name.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            self.terminate(&app.name, process).await;
        }

        let temp_dir = self.temp_dir.to_string_lossy().into_owned();
        let mut state = RunState::new(Context::for_application(&temp_dir, app.version.as_deref()));

        let mut cancelled = self
            .run_phase(&mut report, app, Phase::Install, &app.install_steps, &mut state)
            .await;

        // Install-location discovery happens exactly once, between phases 1 and 2.
        if !cancelled {
            report.install_dir = self.detect_install_dir(app).await;
            if let Some(dir) = &report.install_dir {
                state.context.set(INSTALL_DIR, dir.to_string_lossy().into_owned());
            }
        }
        for (phase, actions) in [(Phase::Patch, &app.patch), (Phase::PostInstall, &app.post_install)] {
            if cancelled {
                break;
            }
            cancelled = self
                .run_phase(&mut report, app, phase, actions, &mut state)
                .await;
        }
        report.cancelled = cancelled;

        self.cleanup(&app.name, cleanup, &state.artifacts).await;
        self.finish(&mut report, state.context);
        info!("----- Finished process for {} -----", app.name);
        report
    }

    #[instrument(skip_all, fields(utility = %utility.name))]
    pub async fn process_utility(&self, utility: &Utility, cleanup: CleanupMode) -> RunReport {
        let mut report = RunReport::new(&utility.name, OwnerKind::Utility);
        info!("----- Running utility {} -----", utility.name);
        self.dispatcher.emit(InstallEvent::RunStarted {
            owner: utility.name.clone(),
            owner_kind: OwnerKind::Utility,
        });

        let mut state = RunState::default();
        let scope = ListScope {
            owner: &utility.name,
            phase: Phase::Actions,
            application: None,
        };
        self.dispatcher.emit(InstallEvent::PhaseStarted {
            owner: utility.name.clone(),
            phase: Phase::Actions,
        });
        let list = self
            .dispatcher
            .run_list(scope, &utility.actions, &mut state)
            .await;
        report.cancelled = list.cancelled;
        report.phases.push((Phase::Actions, list));

        self.cleanup(&utility.name, cleanup, &state.artifacts).await;
        self.finish(&mut report, state.context);
        info!("----- Finished utility {} -----", utility.name);
        report
    }

    /// Runs one application phase. Returns `true` when cancellation stopped it
    /// (or it was never started because of an earlier cancellation).
    async fn run_phase(
        &self,
        report: &mut RunReport,
        app: &Application,
        phase: Phase,
        actions: &[InstallAction],
        state: &mut RunState,
    ) -> bool {
        if self.cancel_token().is_cancelled() {
            return true;
        }
        info!(
            "[Phase {}/3] Running {} for {}...",
            phase.ordinal().unwrap_or_default(),
            phase.label(),
            app.name
        );
        self.dispatcher.emit(InstallEvent::PhaseStarted {
            owner: app.name.clone(),
            phase,
        });
        let scope = ListScope {
            owner: &app.name,
            phase,
            application: Some(app),
        };
        let list = self.dispatcher.run_list(scope, actions, state).await;
        report.phases.push((phase, list));
        list.cancelled
    }

    async fn terminate(&self, owner: &str, process: &str) {
        let platform = Arc::clone(&self.dispatcher.platform);
        let name = process.to_string();
        let outcome = tokio::task::spawn_blocking(move || platform.terminate_processes(&name)).await;
        match outcome {
            Ok(Ok(0)) => debug!("[{}] No running '{}' to terminate", owner, process),
            Ok(Ok(count)) => {
                info!("Terminated {} running instance(s) of {}", count, process);
                self.dispatcher.emit(InstallEvent::ProcessTerminated {
                    owner: owner.to_string(),
                    process: process.to_string(),
                    count,
                });
            }
            Ok(Err(e)) => warn!("Failed to kill process {}: {}", process, e),
            Err(e) => warn!("Process termination task for {} failed: {}", process, e),
        }
    }

    async fn detect_install_dir(&self, app: &Application) -> Option<PathBuf> {
        let display_name = app
            .registry_display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let found = match display_name {
            Some(name) => {
                let platform = Arc::clone(&self.dispatcher.platform);
                let name = name.to_string();
                let mode = self.match_mode;
                tokio::task::spawn_blocking(move || platform.install_location(&name, mode))
                    .await
                    .unwrap_or_else(|e| {
                        warn!("Install-location lookup task failed: {}", e);
                        None
                    })
            }
            None => None,
        };
        match &found {
            Some(dir) => {
                info!("Detected install directory: {}", dir.display());
                self.dispatcher.emit(InstallEvent::InstallDirDetected {
                    owner: app.name.clone(),
                    path: dir.clone(),
                });
            }
            None => {
                warn!("Could not automatically detect install directory. Some actions may fail.");
                self.dispatcher.emit(InstallEvent::InstallDirMissing {
                    owner: app.name.clone(),
                });
            }
        }
        found
    }

    async fn cleanup(&self, owner: &str, mode: CleanupMode, artifacts: &[PathBuf]) {
        let removed = match mode {
            CleanupMode::None => return,
            CleanupMode::Tracked => {
                debug!("Removing {} file(s) downloaded by {}", artifacts.len(), owner);
                remove_paths(artifacts).await
            }
            CleanupMode::All => {
                info!("Cleaning up temporary directory...");
                match purge_dir_contents(&self.temp_dir).await {
                    Ok(n) => n,
                    Err(e) => {
                        warn!("Failed during cleanup: {}", e);
                        0
                    }
                }
            }
        };
        info!("Cleanup complete, {} item(s) removed.", removed);
        self.dispatcher.emit(InstallEvent::CleanupFinished {
            owner: owner.to_string(),
            removed,
        });
    }

    fn finish(&self, report: &mut RunReport, context: Context) {
        report.context = context;
        let totals = report.totals();
        if totals.failed > 0 {
            warn!(
                "{}: {} of {} action(s) failed; see log above",
                report.owner, totals.failed, totals.attempted
            );
        }
        self.dispatcher.emit(InstallEvent::RunFinished {
            owner: report.owner.clone(),
            totals,
            cancelled: report.cancelled,
        });
    }
}
