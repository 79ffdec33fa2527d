// setkit-core/src/platform/mod.rs
//! OS collaborators the engine consults but never mutates through the catalog:
//! privilege level, bitness, installed-software lookup, process termination
//! and the desktop location.

pub mod registry;

use std::path::PathBuf;
use std::process::Command;

use once_cell::sync::OnceCell;
use setkit_common::error::{Result, SetkitError};
use setkit_common::MatchMode;
use tracing::{debug, warn};

pub trait Platform: Send + Sync {
    fn is_elevated(&self) -> bool;

    fn is_64bit(&self) -> bool;

    /// Directory recorded for the installed program named `display_name`.
    /// Lookup failures are reported as `None`.
    fn install_location(&self, display_name: &str, mode: MatchMode) -> Option<PathBuf>;

    /// Terminates every running process named `name`. Returns how many were
    /// stopped; no matching process is `Ok(0)`.
    fn terminate_processes(&self, name: &str) -> Result<usize>;

    fn desktop_dir(&self) -> Option<PathBuf>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPlatform;

static ELEVATED: OnceCell<bool> = OnceCell::new();

impl SystemPlatform {
    pub fn new() -> Self {
        Self
    }
}

/// `setup.exe` and `Setup` both name the `setup` process.
pub fn process_stem(name: &str) -> &str {
    let trimmed = name.trim();
    match trimmed.len().checked_sub(4) {
        Some(cut) if trimmed.is_char_boundary(cut) && trimmed[cut..].eq_ignore_ascii_case(".exe") => {
            &trimmed[..cut]
        }
        _ => trimmed,
    }
}

#[cfg(windows)]
fn detect_elevation() -> bool {
    // `net session` only succeeds for members of the Administrators group
    // running with an elevated token.
    Command::new("net")
        .arg("session")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(unix)]
fn detect_elevation() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(any(windows, unix)))]
fn detect_elevation() -> bool {
    false
}

impl Platform for SystemPlatform {
    fn is_elevated(&self) -> bool {
        *ELEVATED.get_or_init(|| {
            let elevated = detect_elevation();
            debug!("Elevated privileges: {}", elevated);
            elevated
        })
    }

    fn is_64bit(&self) -> bool {
        cfg!(target_pointer_width = "64") || std::env::var_os("PROCESSOR_ARCHITEW6432").is_some()
    }

    #[cfg(windows)]
    fn install_location(&self, display_name: &str, mode: MatchMode) -> Option<PathBuf> {
        for root in registry::UNINSTALL_ROOTS {
            let output = match Command::new("reg").args(["query", root, "/s"]).output() {
                Ok(output) => output,
                Err(e) => {
                    warn!("Failed to query registry root {}: {}", root, e);
                    continue;
                }
            };
            if !output.status.success() {
                debug!("Registry root {} not readable, skipping", root);
                continue;
            }
            let text = String::from_utf8_lossy(&output.stdout);
            let entries = registry::parse_reg_query(&text);
            if let Some(found) = registry::find_install_location(&entries, display_name, mode) {
                return Some(found);
            }
        }
        None
    }

    #[cfg(not(windows))]
    fn install_location(&self, display_name: &str, _mode: MatchMode) -> Option<PathBuf> {
        debug!(
            "No installed-software registry on this platform; '{}' not looked up",
            display_name
        );
        None
    }

    #[cfg(windows)]
    fn terminate_processes(&self, name: &str) -> Result<usize> {
        let image = format!("{}.exe", process_stem(name));
        let output = Command::new("taskkill")
            .args(["/F", "/IM", &image])
            .output()
            .map_err(|e| SetkitError::CommandExecError(format!("Failed to run taskkill: {e}")))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let killed = stdout
            .lines()
            .filter(|l| l.trim_start().starts_with("SUCCESS"))
            .count();
        if !output.status.success() && killed == 0 {
            debug!("No running process matched {}", image);
        }
        Ok(killed)
    }

    #[cfg(unix)]
    fn terminate_processes(&self, name: &str) -> Result<usize> {
        let stem = process_stem(name);
        if stem.is_empty() {
            return Ok(0);
        }
        let listed = match Command::new("pgrep").args(["-x", stem]).output() {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("pgrep is not available; cannot stop {}", stem);
                return Ok(0);
            }
            Err(e) => {
                return Err(SetkitError::CommandExecError(format!(
                    "Failed to run pgrep: {e}"
                )))
            }
        };
        let count = String::from_utf8_lossy(&listed.stdout)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .count();
        if count == 0 {
            debug!("No running process matched {}", stem);
            return Ok(0);
        }
        let status = Command::new("pkill")
            .args(["-x", stem])
            .status()
            .map_err(|e| SetkitError::CommandExecError(format!("Failed to run pkill: {e}")))?;
        if !status.success() {
            warn!("pkill -x {} exited with {}", stem, status);
        }
        Ok(count)
    }

    #[cfg(not(any(windows, unix)))]
    fn terminate_processes(&self, _name: &str) -> Result<usize> {
        Ok(0)
    }

    fn desktop_dir(&self) -> Option<PathBuf> {
        dirs::desktop_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_stem_strips_exe_suffix_case_insensitively() {
        assert_eq!(process_stem("7zFM.exe"), "7zFM");
        assert_eq!(process_stem("SETUP.EXE"), "SETUP");
        assert_eq!(process_stem(" notepad++ "), "notepad++");
        assert_eq!(process_stem(".exe"), "");
        assert_eq!(process_stem("é"), "é");
    }

    #[test]
    fn elevation_is_cached() {
        let platform = SystemPlatform::new();
        assert_eq!(platform.is_elevated(), platform.is_elevated());
    }

    #[cfg(unix)]
    #[test]
    fn terminating_an_absent_process_is_not_an_error() {
        let platform = SystemPlatform::new();
        let killed = platform
            .terminate_processes("setkit-no-such-process-xyz")
            .unwrap();
        assert_eq!(killed, 0);
    }
}
