use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SetkitError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("YAML Parsing Error: {0}")]
    Yaml(#[from] Arc<serde_yaml::Error>),

    #[error("JSON Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Catalog Error: {0}")]
    Catalog(String),

    #[error("DownloadError: Failed to download '{0}' from '{1}': {2}")]
    DownloadError(String, String, String),

    #[error("HttpError: {0}")]
    HttpError(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error("Resource Not Found: {0}")]
    NotFound(String),

    #[error("IoError: {0}")]
    IoError(String),

    #[error("Failed to execute command: {0}")]
    CommandExecError(String),

    #[error("Extraction Error: {0}")]
    ExtractionError(String),

    #[error("Required tool not available: {0}")]
    ToolMissing(String),

    #[error("Shortcut Error: {0}")]
    ShortcutError(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl From<std::io::Error> for SetkitError {
    fn from(err: std::io::Error) -> Self {
        SetkitError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for SetkitError {
    fn from(err: reqwest::Error) -> Self {
        SetkitError::Http(Arc::new(err))
    }
}

impl From<serde_yaml::Error> for SetkitError {
    fn from(err: serde_yaml::Error) -> Self {
        SetkitError::Yaml(Arc::new(err))
    }
}

impl From<serde_json::Error> for SetkitError {
    fn from(err: serde_json::Error) -> Self {
        SetkitError::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, SetkitError>;
