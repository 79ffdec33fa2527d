// setkit-core/src/shortcut.rs
use std::path::{Path, PathBuf};

use setkit_common::error::{Result, SetkitError};
use setkit_common::CancelToken;
use setkit_net::sanitize_file_name;
use tracing::{debug, info};

#[cfg(windows)]
const SHORTCUT_EXT: &str = ".lnk";
#[cfg(not(windows))]
const SHORTCUT_EXT: &str = "";

/// Where a shortcut called `name` lands inside `desktop`.
pub fn shortcut_path(desktop: &Path, name: &str) -> PathBuf {
    desktop.join(format!("{}{}", sanitize_file_name(name), SHORTCUT_EXT))
}

/// Quotes a value for a single-quoted PowerShell string.
pub fn ps_single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn wscript_shortcut_script(link: &Path, target: &str) -> String {
    format!(
        "$WshShell = New-Object -ComObject WScript.Shell; \
         $Shortcut = $WshShell.CreateShortcut({}); \
         $Shortcut.TargetPath = {}; \
         $Shortcut.Save()",
        ps_single_quote(&link.to_string_lossy()),
        ps_single_quote(target)
    )
}

/// Creates a desktop shortcut pointing at `target` and returns its path.
pub async fn create_shortcut(
    desktop: &Path,
    name: &str,
    target: &str,
    cancel: &CancelToken,
) -> Result<PathBuf> {
    if sanitize_file_name(name).is_empty() {
        return Err(SetkitError::ShortcutError(format!(
            "Invalid shortcut name '{name}'"
        )));
    }
    let link = shortcut_path(desktop, name);
    info!("Creating shortcut: {} -> {}", link.display(), target);
    write_shortcut(&link, target, cancel).await?;
    debug!("Shortcut written to {}", link.display());
    Ok(link)
}

#[cfg(windows)]
async fn write_shortcut(link: &Path, target: &str, cancel: &CancelToken) -> Result<()> {
    use setkit_aio::{run_process, ProcessRequest};

    let script = wscript_shortcut_script(link, target);
    let request = ProcessRequest::new("powershell.exe").args(format!(
        "-NoProfile -NonInteractive -Command \"{}\"",
        script.replace('"', "\\\"")
    ));
    let outcome = run_process(&request, cancel).await?;
    if !outcome.success() {
        return Err(SetkitError::ShortcutError(format!(
            "powershell exited with code {:?}: {}",
            outcome.code(),
            outcome.stderr
        )));
    }
    Ok(())
}

#[cfg(unix)]
async fn write_shortcut(link: &Path, target: &str, _cancel: &CancelToken) -> Result<()> {
    if let Ok(meta) = tokio::fs::symlink_metadata(link).await {
        if meta.file_type().is_symlink() {
            tokio::fs::remove_file(link).await?;
        } else {
            return Err(SetkitError::ShortcutError(format!(
                "{} exists and is not a shortcut",
                link.display()
            )));
        }
    }
    tokio::fs::symlink(target, link).await.map_err(|e| {
        SetkitError::ShortcutError(format!("Failed to create {}: {}", link.display(), e))
    })
}

#[cfg(not(any(windows, unix)))]
async fn write_shortcut(link: &Path, _target: &str, _cancel: &CancelToken) -> Result<()> {
    Err(SetkitError::ShortcutError(format!(
        "Shortcuts are not supported on this platform ({})",
        link.display()
    )))
}
