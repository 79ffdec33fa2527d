// setkit-aio/src/extract.rs
// Archive extraction through a bundled 7-Zip style command-line tool.

use std::path::{Path, PathBuf};

use setkit_common::error::{Result, SetkitError};
use setkit_common::CancelToken;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::process::{run_process, ProcessRequest};

#[cfg(windows)]
const TOOL_FILE: &str = "7z.exe";
#[cfg(not(windows))]
const TOOL_FILE: &str = "7z";

/// Names tried on PATH when no bundled binary is present.
const PATH_FALLBACKS: &[&str] = &["7z", "7za"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveTool {
    exe: PathBuf,
}

impl ArchiveTool {
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        Self { exe: exe.into() }
    }

    pub fn exe(&self) -> &Path {
        &self.exe
    }

    /// Fixed bundled location: `7z/` for 64-bit hosts, `7z32/` otherwise.
    pub fn candidate_path(base_dir: &Path, is_64bit: bool) -> PathBuf {
        let sub = if is_64bit { "7z" } else { "7z32" };
        base_dir.join(sub).join(TOOL_FILE)
    }

    /// Finds the extraction tool under `base_dir`, then on PATH.
    pub fn locate(base_dir: &Path, is_64bit: bool) -> Result<Self> {
        let candidate = Self::candidate_path(base_dir, is_64bit);
        if candidate.is_file() {
            debug!("Using bundled archive tool at {}", candidate.display());
            return Ok(Self::new(candidate));
        }
        for name in PATH_FALLBACKS {
            if let Ok(found) = which::which(name) {
                debug!(
                    "Bundled archive tool missing at {}, using {} from PATH",
                    candidate.display(),
                    found.display()
                );
                return Ok(Self::new(found));
            }
        }
        Err(SetkitError::ToolMissing(format!(
            "Archive extraction tool not found at {}",
            candidate.display()
        )))
    }

    /// Argument string for "extract `archive` to `destination`" plus passthrough args.
    pub fn extraction_args(archive: &Path, destination: &Path, extra: Option<&str>) -> String {
        let mut args = format!(
            "x \"{}\" -o\"{}\"",
            archive.display(),
            destination.display()
        );
        if let Some(extra) = extra.map(str::trim).filter(|e| !e.is_empty()) {
            args.push(' ');
            args.push_str(extra);
        }
        args
    }

    /// Extracts `archive` into `destination`, creating the destination first.
    pub async fn extract(
        &self,
        archive: &Path,
        destination: &Path,
        extra_args: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<()> {
        if !fs::try_exists(archive).await.unwrap_or(false) {
            return Err(SetkitError::NotFound(format!(
                "Archive not found: {}",
                archive.display()
            )));
        }
        if let Err(e) = fs::create_dir_all(destination).await {
            warn!(
                "Could not create extraction destination {}: {}",
                destination.display(),
                e
            );
        }

        info!(
            "Extracting {} to {}",
            archive.display(),
            destination.display()
        );
        let request = ProcessRequest::new(self.exe.to_string_lossy())
            .args(Self::extraction_args(archive, destination, extra_args));
        let outcome = run_process(&request, cancel).await?;
        if !outcome.success() {
            let code = outcome.code();
            let detail = if outcome.stderr.is_empty() {
                outcome.stdout
            } else {
                outcome.stderr
            };
            return Err(SetkitError::ExtractionError(format!(
                "'{}' exited with code {:?} while extracting {}: {}",
                self.exe.display(),
                code,
                archive.display(),
                detail
            )));
        }
        info!("Extraction complete: {}", destination.display());
        Ok(())
    }
}
