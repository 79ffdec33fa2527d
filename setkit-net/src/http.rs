// setkit-net/src/http.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use setkit_common::config::Config;
use setkit_common::error::{Result, SetkitError};
use setkit_common::CancelToken;
use tokio::fs::{self, File as TokioFile};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::validation::{file_name_from_url, sanitize_file_name, validate_url};

const MAX_REDIRECTS: usize = 10;

/// Streams HTTP resources into a managed directory.
///
/// The client is built once and owned here; callers needing a differently
/// configured client (tests, proxies) pass their own through `with_client`.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    download_dir: PathBuf,
}

impl Downloader {
    pub fn new(config: &Config) -> Result<Self> {
        let client = build_http_client(
            &config.user_agent,
            config.download_timeout,
            config.connect_timeout,
        )?;
        Ok(Self::with_client(client, config.temp_dir().to_path_buf()))
    }

    pub fn with_client(client: Client, download_dir: PathBuf) -> Self {
        Self {
            client,
            download_dir,
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Downloads `url` into the managed directory and returns the final path.
    ///
    /// The file is named `file_name` when given, otherwise after the last URL
    /// segment. `label` is only used for log lines and as a last-resort name.
    pub async fn download(
        &self,
        label: &str,
        url: &str,
        file_name: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<PathBuf> {
        let parsed = validate_url(url)?;
        let name = file_name
            .map(sanitize_file_name)
            .filter(|n| !n.is_empty())
            .or_else(|| file_name_from_url(&parsed))
            .unwrap_or_else(|| {
                debug!("URL has no filename component, using fallback name based on label.");
                format!("{}-download", sanitize_file_name(label))
            });

        fs::create_dir_all(&self.download_dir).await.map_err(|e| {
            SetkitError::IoError(format!(
                "Failed to create download directory {}: {}",
                self.download_dir.display(),
                e
            ))
        })?;
        let final_path = self.download_dir.join(&name);
        let temp_path = self.download_dir.join(format!(".{name}.download"));

        info!("Downloading {} from {}...", label, url);
        let outcome = tokio::select! {
            res = stream_to_file(&self.client, parsed.as_str(), &temp_path) => res,
            _ = cancel.cancelled() => Err(SetkitError::Cancelled),
        };

        let size = match outcome {
            Ok(size) => size,
            Err(e) => {
                if let Err(remove_err) = fs::remove_file(&temp_path).await {
                    debug!(
                        "No partial download to remove at {}: {}",
                        temp_path.display(),
                        remove_err
                    );
                }
                error!("Download failed for {}: {}", label, e);
                return Err(match e {
                    SetkitError::Cancelled | SetkitError::DownloadError(..) => e,
                    other => SetkitError::DownloadError(
                        label.to_string(),
                        url.to_string(),
                        other.to_string(),
                    ),
                });
            }
        };

        fs::rename(&temp_path, &final_path).await.map_err(|e| {
            SetkitError::IoError(format!(
                "Failed to move temp file {} to {}: {}",
                temp_path.display(),
                final_path.display(),
                e
            ))
        })?;
        info!(
            "Download successful: {} ({} bytes)",
            final_path.display(),
            size
        );
        Ok(final_path)
    }

    /// Fetches a small text resource such as a remote catalog.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let parsed = validate_url(url)?;
        debug!("Fetching text from {}", parsed);
        let response = self.client.get(parsed.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SetkitError::HttpError(format!(
                "HTTP error {status} for URL {parsed}"
            )));
        }
        Ok(response.text().await?)
    }
}

pub fn build_http_client(
    user_agent: &str,
    timeout: Duration,
    connect_timeout: Duration,
) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(|e| SetkitError::HttpError(format!("Failed to build HTTP client: {e}")))
}

async fn stream_to_file(client: &Client, url: &str, temp_path: &Path) -> Result<u64> {
    if fs::try_exists(temp_path).await.unwrap_or(false) {
        if let Err(e) = fs::remove_file(temp_path).await {
            warn!(
                "Could not remove existing temporary file {}: {}",
                temp_path.display(),
                e
            );
        }
    }

    let response = client.get(url).send().await.map_err(|e| {
        debug!("HTTP request failed for {url}: {e}");
        SetkitError::HttpError(format!("HTTP request failed for {url}: {e}"))
    })?;
    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);

    if !status.is_success() {
        let target = temp_path
            .file_name()
            .map(|s| s.to_string_lossy().trim_start_matches('.').to_string())
            .unwrap_or_default();
        let reason = match status {
            StatusCode::NOT_FOUND => "Resource not found (404)".to_string(),
            StatusCode::FORBIDDEN => "Access forbidden (403)".to_string(),
            other => format!("HTTP status {other}"),
        };
        return Err(SetkitError::DownloadError(target, url.to_string(), reason));
    }

    let mut file = TokioFile::create(temp_path).await.map_err(|e| {
        SetkitError::IoError(format!(
            "Failed to create temp file {}: {}",
            temp_path.display(),
            e
        ))
    })?;
    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|e| SetkitError::HttpError(format!("Failed to read response body: {e}")))?;
        file.write_all(&chunk).await.map_err(|e| {
            SetkitError::IoError(format!(
                "Failed to write download stream to {}: {}",
                temp_path.display(),
                e
            ))
        })?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);
    debug!("Finished writing {} bytes to temp file.", written);
    Ok(written)
}
