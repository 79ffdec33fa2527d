// setkit-net/src/validation.rs
use setkit_common::error::{Result, SetkitError};
use url::Url;

/// Parses a URL and ensures it uses an HTTP(S) scheme.
pub fn validate_url(url_str: &str) -> Result<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| {
        SetkitError::ValidationError(format!("Failed to parse URL '{url_str}': {e}"))
    })?;
    match url.scheme() {
        "https" | "http" => Ok(url),
        other => Err(SetkitError::ValidationError(format!(
            "Invalid URL scheme for '{url_str}': must be http or https, but got '{other}'"
        ))),
    }
}

/// Last non-empty path segment of the URL, made safe as a file name.
pub fn file_name_from_url(url: &Url) -> Option<String> {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(sanitize_file_name)
        .filter(|s| !s.is_empty())
}

/// Strips path separators and characters Windows refuses in file names.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https_only() {
        assert!(validate_url("https://example.com/a.exe").is_ok());
        assert!(validate_url("http://127.0.0.1:8080/a.exe").is_ok());
        assert!(matches!(
            validate_url("ftp://example.com/a.exe"),
            Err(SetkitError::ValidationError(_))
        ));
        assert!(validate_url("not a url").is_err());
    }

    #[test]
    fn derives_file_name_from_last_segment() {
        let url = validate_url("https://www.7-zip.org/a/7z2301-x64.exe?dl=1").unwrap();
        assert_eq!(file_name_from_url(&url).as_deref(), Some("7z2301-x64.exe"));

        let nested = validate_url("https://example.com/files/v2/setup.msi").unwrap();
        assert_eq!(file_name_from_url(&nested).as_deref(), Some("setup.msi"));

        let bare = validate_url("https://example.com/").unwrap();
        assert_eq!(file_name_from_url(&bare), None);
    }

    #[test]
    fn sanitizes_reserved_characters() {
        assert_eq!(sanitize_file_name("..\\evil/name?.zip"), "_evil_name_.zip");
        assert_eq!(sanitize_file_name("  ..  "), "");
    }
}
