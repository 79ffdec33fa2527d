// setkit-core/src/catalog.rs
//! Finding a usable catalog: the user's copy, then the copy shipped next to
//! the executable, then the remote one. Whatever source succeeds beyond the
//! first is persisted as the user's copy.

use std::path::Path;

use setkit_common::error::{Result, SetkitError};
use setkit_common::{Catalog, Config};
use setkit_net::Downloader;
use tokio::fs;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated,
    UpToDate,
}

async fn read_catalog_file(path: &Path) -> Option<Catalog> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No catalog at {}", path.display());
            return None;
        }
        Err(e) => {
            warn!("Failed to read catalog {}: {}", path.display(), e);
            return None;
        }
    };
    match Catalog::from_yaml(&content) {
        Ok(catalog) => Some(catalog),
        Err(e) => {
            warn!("Ignoring unusable catalog {}: {}", path.display(), e);
            None
        }
    }
}

async fn persist(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, content).await?;
    Ok(())
}

fn loaded(catalog: Catalog) -> Catalog {
    info!(
        "Successfully parsed {} applications and {} utilities.",
        catalog.applications.len(),
        catalog.utilities.len()
    );
    catalog
}

/// Loads the catalog, falling back through user, bundled and remote copies.
///
/// Returns `SetkitError::Catalog` when no source yields a parseable document.
pub async fn load_catalog(config: &Config, downloader: &Downloader) -> Result<Catalog> {
    let user_path = config.catalog_path();
    info!("Attempting to load local catalog from {}...", user_path.display());
    if let Some(catalog) = read_catalog_file(&user_path).await {
        return Ok(loaded(catalog));
    }

    let bundled_path = config.bundled_catalog_path();
    if bundled_path != user_path {
        if let Some(catalog) = read_catalog_file(&bundled_path).await {
            info!("Using bundled catalog {}", bundled_path.display());
            let copied = match fs::read_to_string(&bundled_path).await {
                Ok(content) => persist(&user_path, &content).await,
                Err(e) => Err(e.into()),
            };
            if let Err(e) = copied {
                warn!(
                    "Could not copy bundled catalog to {}: {}",
                    user_path.display(),
                    e
                );
            }
            return Ok(loaded(catalog));
        }
    }

    if let Some(url) = &config.catalog_url {
        info!("No local catalog found or it failed to load. Downloading from {}...", url);
        match downloader.fetch_text(url).await {
            Ok(content) => match Catalog::from_yaml(&content) {
                Ok(catalog) => {
                    match persist(&user_path, &content).await {
                        Ok(()) => info!("Downloaded and saved new local catalog."),
                        Err(e) => warn!("Failed to save downloaded catalog: {}", e),
                    }
                    return Ok(loaded(catalog));
                }
                Err(e) => warn!("Remote catalog from {} is unusable: {}", url, e),
            },
            Err(e) => warn!("Failed to download catalog: {}", e),
        }
    }

    Err(SetkitError::Catalog(format!(
        "Failed to load or download any catalog (checked {} and {}{})",
        user_path.display(),
        bundled_path.display(),
        if config.catalog_url.is_some() {
            " and the remote URL"
        } else {
            ""
        }
    )))
}

/// Replaces the user's catalog with the remote one when their text differs.
pub async fn refresh_catalog(config: &Config, downloader: &Downloader) -> Result<RefreshOutcome> {
    let url = config.catalog_url.as_deref().ok_or_else(|| {
        SetkitError::Config("SETKIT_CATALOG_URL is not set; nothing to refresh from".to_string())
    })?;
    info!("Checking for catalog updates...");
    let remote = downloader.fetch_text(url).await?;
    let user_path = config.catalog_path();
    let local = match fs::read_to_string(&user_path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    if remote.trim() == local.trim() {
        info!("Catalog is up-to-date.");
        return Ok(RefreshOutcome::UpToDate);
    }

    info!("A new version of the catalog is available.");
    Catalog::from_yaml(&remote)?;
    persist(&user_path, &remote).await?;
    info!("Catalog updated successfully.");
    Ok(RefreshOutcome::Updated)
}
