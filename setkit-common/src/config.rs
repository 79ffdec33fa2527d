// setkit-common/src/config.rs
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use tracing::debug;

use super::error::{Result, SetkitError};

const CATALOG_FILENAME: &str = "apps.yaml";
const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// How a registry display name is compared against the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Exact,
    Contains,
}

impl MatchMode {
    pub fn matches(&self, candidate: &str, wanted: &str) -> bool {
        match self {
            MatchMode::Exact => candidate == wanted,
            MatchMode::Contains => candidate.contains(wanted),
        }
    }
}

impl std::str::FromStr for MatchMode {
    type Err = SetkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(MatchMode::Exact),
            "contains" | "substring" => Ok(MatchMode::Contains),
            other => Err(SetkitError::Config(format!(
                "Unknown registry match mode '{other}' (expected 'exact' or 'contains')"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub temp_dir: PathBuf,
    pub tools_dir: PathBuf,
    pub catalog_url: Option<String>,
    pub user_agent: String,
    pub download_timeout: Duration,
    pub connect_timeout: Duration,
    pub registry_match: MatchMode,
}

impl Config {
    pub fn load() -> Result<Self> {
        debug!("Loading setkit configuration");

        let root = match non_empty_var("SETKIT_ROOT") {
            Some(dir) => PathBuf::from(dir),
            None => ProjectDirs::from("", "", "setkit")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or_else(|| {
                    SetkitError::Config(
                        "Could not determine a data directory; set SETKIT_ROOT".to_string(),
                    )
                })?,
        };
        debug!("Effective SETKIT_ROOT set to: {}", root.display());

        let temp_dir = non_empty_var("SETKIT_TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("setkit"));

        let tools_dir = match non_empty_var("SETKIT_TOOLS_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
                .unwrap_or_else(|| PathBuf::from(".")),
        };

        let download_timeout = duration_var("SETKIT_DOWNLOAD_TIMEOUT", DEFAULT_DOWNLOAD_TIMEOUT)?;
        let connect_timeout = duration_var("SETKIT_CONNECT_TIMEOUT", DEFAULT_CONNECT_TIMEOUT)?;

        let registry_match = match non_empty_var("SETKIT_REGISTRY_MATCH") {
            Some(mode) => mode.parse()?,
            None => MatchMode::default(),
        };

        let user_agent = non_empty_var("SETKIT_USER_AGENT")
            .unwrap_or_else(|| format!("setkit/{}", env!("CARGO_PKG_VERSION")));

        debug!("Configuration loaded successfully.");
        Ok(Self {
            root,
            temp_dir,
            tools_dir,
            catalog_url: non_empty_var("SETKIT_CATALOG_URL"),
            user_agent,
            download_timeout,
            connect_timeout,
            registry_match,
        })
    }

    /// A configuration rooted entirely under `root`, used by tests and embedders.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            temp_dir: root.join("tmp"),
            tools_dir: root.join("tools"),
            catalog_url: None,
            user_agent: format!("setkit/{}", env!("CARGO_PKG_VERSION")),
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            registry_match: MatchMode::Exact,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.root.join(CATALOG_FILENAME)
    }

    pub fn bundled_catalog_path(&self) -> PathBuf {
        self.tools_dir.join(CATALOG_FILENAME)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn tools_dir(&self) -> &Path {
        &self.tools_dir
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn duration_var(name: &str, default: Duration) -> Result<Duration> {
    match non_empty_var(name) {
        Some(raw) => humantime::parse_duration(raw.trim()).map_err(|e| {
            SetkitError::Config(format!("Invalid duration '{raw}' in {name}: {e}"))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_mode_parses_both_spellings() {
        assert_eq!("exact".parse::<MatchMode>().unwrap(), MatchMode::Exact);
        assert_eq!("Contains".parse::<MatchMode>().unwrap(), MatchMode::Contains);
        assert_eq!("substring".parse::<MatchMode>().unwrap(), MatchMode::Contains);
        assert!("fuzzy".parse::<MatchMode>().is_err());
    }

    #[test]
    fn exact_and_contains_differ_on_partial_names() {
        assert!(MatchMode::Exact.matches("7-Zip 23.01 (x64)", "7-Zip 23.01 (x64)"));
        assert!(!MatchMode::Exact.matches("7-Zip 23.01 (x64)", "7-Zip"));
        assert!(MatchMode::Contains.matches("7-Zip 23.01 (x64)", "7-Zip"));
    }

    #[test]
    fn rooted_config_derives_paths_under_root() {
        let cfg = Config::rooted_at(Path::new("/srv/setkit"));
        assert_eq!(cfg.catalog_path(), PathBuf::from("/srv/setkit/apps.yaml"));
        assert_eq!(cfg.logs_dir(), PathBuf::from("/srv/setkit/logs"));
        assert_eq!(
            cfg.bundled_catalog_path(),
            PathBuf::from("/srv/setkit/tools/apps.yaml")
        );
    }
}
