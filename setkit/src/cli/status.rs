// setkit/src/cli/status.rs
use std::time::Instant;

use colored::*;
use setkit_common::{InstallEvent, OwnerKind, Phase, RunReport};
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepStatus {
    Running,
    Done,
    Skipped,
    Failed,
}

impl StepStatus {
    fn indicator(&self) -> ColoredString {
        match self {
            StepStatus::Running => " ⚙".blue(),
            StepStatus::Done => " ✓".green(),
            StepStatus::Skipped => " ·".yellow(),
            StepStatus::Failed => " ✗".red().bold(),
        }
    }
}

fn phase_heading(phase: Phase) -> String {
    match phase.ordinal() {
        Some(n) => format!("[Phase {n}/3] {}", phase.label()),
        None => phase.label().to_string(),
    }
}

fn step_line(status: StepStatus, index: usize, kind: &str, detail: Option<&str>) {
    let base = format!("{}   {:>2}. {}", status.indicator(), index + 1, kind);
    match detail {
        Some(detail) => println!("{} {}", base, format!("({detail})").dimmed()),
        None => println!("{base}"),
    }
}

/// Prints one line per run event until the channel closes.
pub async fn print_events(mut rx: broadcast::Receiver<InstallEvent>) {
    let mut started: Option<Instant> = None;
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                debug!("Status printer lagged, {} event(s) dropped", n);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };
        match event {
            InstallEvent::RunStarted { owner, owner_kind } => {
                started = Some(Instant::now());
                let what = match owner_kind {
                    OwnerKind::Application => "Installing",
                    OwnerKind::Utility => "Running",
                };
                println!("{}{} {}", "==> ".bold().blue(), what.bold(), owner.cyan().bold());
            }
            InstallEvent::ProcessTerminated { process, count, .. } => {
                println!("  {} stopped {} running {}", "!".yellow(), count, process);
            }
            InstallEvent::PhaseStarted { phase, .. } => {
                println!("  {}", phase_heading(phase).cyan());
            }
            InstallEvent::ActionStarted { index, kind, .. } => {
                debug!("Step {} ({}) started", index + 1, kind);
                if kind == "DownloadAndRun" || kind == "Download" {
                    step_line(StepStatus::Running, index, &kind, Some("downloading"));
                }
            }
            InstallEvent::ActionCompleted { index, kind, .. } => {
                step_line(StepStatus::Done, index, &kind, None);
            }
            InstallEvent::ActionSkipped {
                index, kind, reason, ..
            } => {
                step_line(StepStatus::Skipped, index, &kind, Some(&reason));
            }
            InstallEvent::ActionFailed {
                index, kind, error, ..
            } => {
                step_line(StepStatus::Failed, index, &kind, Some(&error));
            }
            InstallEvent::InstallDirDetected { path, .. } => {
                println!("  {} {}", "install dir:".dimmed(), path.display());
            }
            InstallEvent::InstallDirMissing { .. } => {
                println!("  {}", "install dir not detected".yellow());
            }
            InstallEvent::CleanupFinished { removed, .. } => {
                println!("  {}", format!("cleaned up {removed} item(s)").dimmed());
            }
            InstallEvent::RunFinished {
                owner, cancelled, ..
            } => {
                let elapsed = started
                    .take()
                    .map(|s| format!(" in {:.1}s", s.elapsed().as_secs_f64()))
                    .unwrap_or_default();
                if cancelled {
                    println!("{}{} {}", "==> ".bold().yellow(), owner.bold(), "cancelled".yellow());
                } else {
                    println!("{}{} finished{}", "==> ".bold().blue(), owner.bold(), elapsed);
                }
            }
        }
    }
}

pub fn print_summary(reports: &[RunReport], requested: usize) {
    if reports.is_empty() {
        println!("{}", "Nothing was processed".yellow());
        return;
    }
    println!();
    for report in reports {
        let totals = report.totals();
        let counts = format!(
            "{} done, {} skipped, {} failed",
            totals.completed, totals.skipped, totals.failed
        );
        let line = if totals.failed > 0 {
            counts.red()
        } else if totals.skipped > 0 || report.cancelled {
            counts.yellow()
        } else {
            counts.green()
        };
        println!("{:<24} {}", report.owner.bold(), line);
    }
    if reports.len() < requested {
        println!(
            "{}",
            format!(
                "{} of {} item(s) not started (cancelled)",
                requested - reports.len(),
                requested
            )
            .yellow()
        );
    }
}
