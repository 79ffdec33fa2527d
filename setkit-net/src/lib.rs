// setkit-net/src/lib.rs
pub mod http;
pub mod validation;

pub use http::{build_http_client, Downloader};
pub use validation::{file_name_from_url, sanitize_file_name, validate_url};
