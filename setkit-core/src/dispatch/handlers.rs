// setkit-core/src/dispatch/handlers.rs
use std::path::{Path, PathBuf};

use setkit_aio::{run_process, split_command, ArchiveTool, ProcessOutcome, ProcessRequest};
use setkit_common::context::DOWNLOADED_FILE_PATH;
use setkit_common::error::{Result, SetkitError};
use setkit_common::model::{ActionKind, Arch};
use tracing::{info, warn};

use super::{ActionOutcome, Dispatcher, ListScope, RunState};
use crate::shortcut;

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn skipped(reason: impl Into<String>) -> Result<ActionOutcome> {
    Ok(ActionOutcome::Skipped(reason.into()))
}

fn report_exit(program: &str, outcome: &ProcessOutcome) {
    if !outcome.success() {
        warn!(
            "\"{}\" finished with exit code {}",
            program,
            outcome
                .code()
                .map_or_else(|| "unknown".to_string(), |c| c.to_string())
        );
    }
}

pub(super) async fn execute(
    d: &Dispatcher,
    scope: ListScope<'_>,
    kind: &ActionKind,
    state: &mut RunState,
) -> Result<ActionOutcome> {
    match kind {
        ActionKind::DownloadAndRun { args } => {
            download_and_run(d, scope, args.as_deref(), state).await
        }
        ActionKind::Download { url, file_name } => {
            let Some(url) = non_empty(url) else {
                return skipped("Download action has no URL");
            };
            download(d, url, non_empty(file_name), state).await
        }
        ActionKind::Extract {
            archive,
            destination,
            args,
        } => {
            let Some(archive) = non_empty(archive) else {
                return skipped("no archive specified");
            };
            extract(d, archive, non_empty(destination), args.as_deref()).await
        }
        ActionKind::RunCommand { command } => {
            let Some(command) = non_empty(command) else {
                return skipped("RunCommand action has no command");
            };
            run_command(d, command).await
        }
        ActionKind::RunScript { path, args } => {
            let Some(path) = non_empty(path) else {
                return skipped("RunScript action has no Path specified");
            };
            run_script(d, path, args.as_deref()).await
        }
        ActionKind::OpenFile { path } => {
            let Some(path) = non_empty(path) else {
                return skipped("OpenFile action has no Path specified");
            };
            open_file(d, path).await
        }
        ActionKind::CreateShortcut {
            target,
            shortcut_name,
        } => {
            let (Some(target), Some(name)) = (non_empty(target), non_empty(shortcut_name)) else {
                return skipped("CreateShortcut needs both target and shortcutName");
            };
            create_shortcut(d, target, name).await
        }
        ActionKind::Unknown { type_name } => {
            skipped(format!("Unknown action type '{type_name}'"))
        }
    }
}

fn publish_download(state: &mut RunState, path: &Path) {
    state
        .context
        .set(DOWNLOADED_FILE_PATH, path.to_string_lossy().into_owned());
    state.artifacts.push(path.to_path_buf());
}

async fn download_and_run(
    d: &Dispatcher,
    scope: ListScope<'_>,
    args: Option<&str>,
    state: &mut RunState,
) -> Result<ActionOutcome> {
    let Some(app) = scope.application else {
        return skipped("DownloadAndRun is only valid for applications");
    };
    let arch = Arch::from_is_64bit(d.platform.is_64bit());
    let Some(url) = d.chooser.choose(&app.name, &app.download_links, arch) else {
        return skipped(format!("no {arch} download URL available"));
    };

    let installer = d.downloader.download(&app.name, &url, None, &d.cancel).await?;
    publish_download(state, &installer);
    mark_executable(&installer).await;

    let request = ProcessRequest::new(installer.to_string_lossy()).args(args.unwrap_or_default());
    let outcome = run_process(&request, &d.cancel).await?;
    report_exit(&request.program, &outcome);
    Ok(ActionOutcome::Completed)
}

async fn download(
    d: &Dispatcher,
    url: &str,
    file_name: Option<&str>,
    state: &mut RunState,
) -> Result<ActionOutcome> {
    let label = file_name.unwrap_or("file");
    let path = d.downloader.download(label, url, file_name, &d.cancel).await?;
    publish_download(state, &path);
    Ok(ActionOutcome::Completed)
}

async fn extract(
    d: &Dispatcher,
    archive: &str,
    destination: Option<&str>,
    args: Option<&str>,
) -> Result<ActionOutcome> {
    let tool = ArchiveTool::locate(&d.tools_dir, d.platform.is_64bit())?;
    let archive = PathBuf::from(archive);
    let destination = match destination {
        Some(dest) => PathBuf::from(dest),
        None => archive
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    tool.extract(&archive, &destination, args, &d.cancel).await?;
    Ok(ActionOutcome::Completed)
}

async fn run_command(d: &Dispatcher, command: &str) -> Result<ActionOutcome> {
    let (program, args) = split_command(command);
    let request = ProcessRequest::new(program).args(args);
    let outcome = run_process(&request, &d.cancel).await?;
    report_exit(&request.program, &outcome);
    Ok(ActionOutcome::Completed)
}

async fn run_script(d: &Dispatcher, path: &str, args: Option<&str>) -> Result<ActionOutcome> {
    let request = ProcessRequest::new(path)
        .args(args.unwrap_or_default())
        .shell_execute();
    let outcome = run_process(&request, &d.cancel).await?;
    report_exit(path, &outcome);
    Ok(ActionOutcome::Completed)
}

async fn open_file(d: &Dispatcher, path: &str) -> Result<ActionOutcome> {
    info!("Opening: {}", path);
    let request = ProcessRequest::new(path).shell_execute().wait(false);
    run_process(&request, &d.cancel).await?;
    Ok(ActionOutcome::Completed)
}

async fn create_shortcut(d: &Dispatcher, target: &str, name: &str) -> Result<ActionOutcome> {
    let desktop = d.platform.desktop_dir().ok_or_else(|| {
        SetkitError::ShortcutError("Could not determine the desktop directory".to_string())
    })?;
    shortcut::create_shortcut(&desktop, name, target, &d.cancel).await?;
    Ok(ActionOutcome::Completed)
}

#[cfg(unix)]
async fn mark_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    match tokio::fs::metadata(path).await {
        Ok(meta) => {
            let mut perms = meta.permissions();
            perms.set_mode(perms.mode() | 0o755);
            if let Err(e) = tokio::fs::set_permissions(path, perms).await {
                warn!("Could not mark {} executable: {}", path.display(), e);
            }
        }
        Err(e) => warn!("Could not stat {}: {}", path.display(), e),
    }
}

#[cfg(not(unix))]
async fn mark_executable(_path: &Path) {}
