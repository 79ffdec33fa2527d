// setkit-core/src/dispatch/mod.rs
//! Runs one ordered action list against one mutable context.
//!
//! Every action is resolved against the context as it stands when the action is
//! reached, so values published by action N are visible to N+1 and later. A
//! failing action is logged and counted; the loop always moves on to the next
//! one. The only thing that stops a list early is the cancel token.

mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use setkit_common::error::SetkitError;
use setkit_common::model::{Application, InstallAction};
use setkit_common::{CancelToken, Context, InstallEvent, ListReport, Phase};
use setkit_net::Downloader;
use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use crate::chooser::SourceChooser;
use crate::platform::Platform;

/// Result of a handler that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    /// Policy or missing-field skip; not a failure.
    Skipped(String),
}

/// Who an action list belongs to and which slot it fills.
#[derive(Debug, Clone, Copy)]
pub struct ListScope<'a> {
    pub owner: &'a str,
    pub phase: Phase,
    /// Present for application phases; `DownloadAndRun` needs its sources.
    pub application: Option<&'a Application>,
}

/// Mutable state shared by all lists of one run.
#[derive(Debug, Default)]
pub struct RunState {
    pub context: Context,
    /// Files this run downloaded, for tracked cleanup.
    pub artifacts: Vec<PathBuf>,
}

impl RunState {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            artifacts: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    pub(crate) downloader: Arc<Downloader>,
    pub(crate) platform: Arc<dyn Platform>,
    pub(crate) chooser: Arc<dyn SourceChooser>,
    pub(crate) tools_dir: PathBuf,
    pub(crate) events: Option<broadcast::Sender<InstallEvent>>,
    pub(crate) cancel: CancelToken,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("download_dir", &self.downloader.download_dir())
            .field("tools_dir", &self.tools_dir)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl Dispatcher {
    pub fn new(
        downloader: Arc<Downloader>,
        platform: Arc<dyn Platform>,
        chooser: Arc<dyn SourceChooser>,
        tools_dir: PathBuf,
    ) -> Self {
        Self {
            downloader,
            platform,
            chooser,
            tools_dir,
            events: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_events(mut self, events: broadcast::Sender<InstallEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub(crate) fn emit(&self, event: InstallEvent) {
        if let Some(tx) = &self.events {
            // No subscribers is fine.
            let _ = tx.send(event);
        }
    }

    /// Runs `actions` in order and returns the per-list counters.
    pub async fn run_list(
        &self,
        scope: ListScope<'_>,
        actions: &[InstallAction],
        state: &mut RunState,
    ) -> ListReport {
        let mut report = ListReport::default();
        for (index, action) in actions.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!(
                    "[{}] Cancelled; {} remaining action(s) in {} not run",
                    scope.owner,
                    actions.len() - index,
                    scope.phase.label()
                );
                report.cancelled = true;
                break;
            }
            report.attempted += 1;

            let resolved = action.resolve(&state.context);
            let kind = resolved.kind_name();
            debug!("[{}] Action {} resolved to {:?}", scope.owner, index, resolved.kind);

            if resolved.requires_admin && !self.platform.is_elevated() {
                let reason = "requires administrator rights".to_string();
                warn!(
                    "Action '{}' requires Admin rights. Please restart as Administrator. Skipping.",
                    kind
                );
                report.skipped += 1;
                self.emit(InstallEvent::ActionSkipped {
                    owner: scope.owner.to_string(),
                    phase: scope.phase,
                    index,
                    kind: kind.to_string(),
                    reason,
                });
                continue;
            }

            self.emit(InstallEvent::ActionStarted {
                owner: scope.owner.to_string(),
                phase: scope.phase,
                index,
                kind: kind.to_string(),
            });

            match handlers::execute(self, scope, &resolved.kind, state).await {
                Ok(ActionOutcome::Completed) => {
                    report.completed += 1;
                    self.emit(InstallEvent::ActionCompleted {
                        owner: scope.owner.to_string(),
                        phase: scope.phase,
                        index,
                        kind: kind.to_string(),
                    });
                }
                Ok(ActionOutcome::Skipped(reason)) => {
                    warn!("[{}] {} skipped: {}", scope.owner, kind, reason);
                    report.skipped += 1;
                    self.emit(InstallEvent::ActionSkipped {
                        owner: scope.owner.to_string(),
                        phase: scope.phase,
                        index,
                        kind: kind.to_string(),
                        reason,
                    });
                }
                Err(SetkitError::Cancelled) => {
                    warn!("[{}] {} interrupted by cancellation", scope.owner, kind);
                    report.failed += 1;
                    report.cancelled = true;
                    self.emit(InstallEvent::ActionFailed {
                        owner: scope.owner.to_string(),
                        phase: scope.phase,
                        index,
                        kind: kind.to_string(),
                        error: SetkitError::Cancelled.to_string(),
                    });
                    break;
                }
                Err(e) => {
                    error!("ERROR executing action {} for {}: {}", kind, scope.owner, e);
                    report.failed += 1;
                    self.emit(InstallEvent::ActionFailed {
                        owner: scope.owner.to_string(),
                        phase: scope.phase,
                        index,
                        kind: kind.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }
}
