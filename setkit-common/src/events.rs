// setkit-common/src/events.rs
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::context::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnerKind {
    Application,
    Utility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Install,
    Patch,
    PostInstall,
    /// The single action list of a utility.
    Actions,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Install => "Install Steps",
            Phase::Patch => "Patch Steps",
            Phase::PostInstall => "Post-Install Steps",
            Phase::Actions => "Actions",
        }
    }

    /// Position within the three application phases, e.g. `[Phase 2/3]`.
    pub fn ordinal(&self) -> Option<usize> {
        match self {
            Phase::Install => Some(1),
            Phase::Patch => Some(2),
            Phase::PostInstall => Some(3),
            Phase::Actions => None,
        }
    }
}

/// Counters for one pass over an action list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListReport {
    pub attempted: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl ListReport {
    pub fn absorb(&mut self, other: &ListReport) {
        self.attempted += other.attempted;
        self.completed += other.completed;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.cancelled |= other.cancelled;
    }
}

/// Result of processing one application or utility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub owner: String,
    pub owner_kind: OwnerKind,
    pub phases: Vec<(Phase, ListReport)>,
    pub install_dir: Option<PathBuf>,
    pub cancelled: bool,
    /// Context as it stood when the run ended.
    #[serde(skip)]
    pub context: Context,
}

impl RunReport {
    pub fn new(owner: &str, owner_kind: OwnerKind) -> Self {
        Self {
            owner: owner.to_string(),
            owner_kind,
            phases: Vec::new(),
            install_dir: None,
            cancelled: false,
            context: Context::new(),
        }
    }

    pub fn totals(&self) -> ListReport {
        let mut total = ListReport::default();
        for (_, report) in &self.phases {
            total.absorb(report);
        }
        total.cancelled |= self.cancelled;
        total
    }

    pub fn phase(&self, phase: Phase) -> Option<&ListReport> {
        self.phases.iter().find(|(p, _)| *p == phase).map(|(_, r)| r)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InstallEvent {
    RunStarted {
        owner: String,
        owner_kind: OwnerKind,
    },
    ProcessTerminated {
        owner: String,
        process: String,
        count: usize,
    },
    PhaseStarted {
        owner: String,
        phase: Phase,
    },
    ActionStarted {
        owner: String,
        phase: Phase,
        index: usize,
        kind: String,
    },
    ActionCompleted {
        owner: String,
        phase: Phase,
        index: usize,
        kind: String,
    },
    ActionSkipped {
        owner: String,
        phase: Phase,
        index: usize,
        kind: String,
        reason: String,
    },
    ActionFailed {
        owner: String,
        phase: Phase,
        index: usize,
        kind: String,
        error: String,
    },
    InstallDirDetected {
        owner: String,
        path: PathBuf,
    },
    InstallDirMissing {
        owner: String,
    },
    CleanupFinished {
        owner: String,
        removed: usize,
    },
    RunFinished {
        owner: String,
        totals: ListReport,
        cancelled: bool,
    },
}

impl InstallEvent {
    pub fn owner(&self) -> &str {
        match self {
            InstallEvent::RunStarted { owner, .. }
            | InstallEvent::ProcessTerminated { owner, .. }
            | InstallEvent::PhaseStarted { owner, .. }
            | InstallEvent::ActionStarted { owner, .. }
            | InstallEvent::ActionCompleted { owner, .. }
            | InstallEvent::ActionSkipped { owner, .. }
            | InstallEvent::ActionFailed { owner, .. }
            | InstallEvent::InstallDirDetected { owner, .. }
            | InstallEvent::InstallDirMissing { owner }
            | InstallEvent::CleanupFinished { owner, .. }
            | InstallEvent::RunFinished { owner, .. } => owner,
        }
    }
}
