// setkit-aio/src/fs.rs
// Best-effort removal helpers for the managed temp directory.

use std::io;
use std::path::{Path, PathBuf};

use setkit_common::error::Result;
use tokio::fs;
use tracing::{debug, warn};

async fn remove_path(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path).await?;
    if meta.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    }
}

/// Deletes every file and subdirectory inside `dir`, keeping `dir` itself.
///
/// Individual failures are logged and skipped. Returns the number of entries
/// removed; a missing directory counts as already clean.
pub async fn purge_dir_contents(dir: &Path) -> Result<usize> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Nothing to purge, {} does not exist", dir.display());
            return Ok(0);
        }
        Err(e) => return Err(e.into()),
    };
    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        match remove_path(&path).await {
            Ok(()) => {
                debug!("Removed {}", path.display());
                removed += 1;
            }
            Err(e) => warn!("Failed to delete {}: {}", path.display(), e),
        }
    }
    Ok(removed)
}

/// Removes each path in `paths`; missing paths are ignored.
pub async fn remove_paths(paths: &[PathBuf]) -> usize {
    let mut removed = 0;
    for path in paths {
        match remove_path(path).await {
            Ok(()) => {
                debug!("Removed {}", path.display());
                removed += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete {}: {}", path.display(), e),
        }
    }
    removed
}
