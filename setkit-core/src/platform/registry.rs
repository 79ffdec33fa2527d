// setkit-core/src/platform/registry.rs
// Parser for `reg query <root> /s` output over the Uninstall keys.

use std::path::PathBuf;

use setkit_common::MatchMode;

pub const UNINSTALL_ROOTS: &[&str] = &[
    r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall",
    r"HKLM\SOFTWARE\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallEntry {
    pub key: String,
    pub display_name: Option<String>,
    pub install_location: Option<String>,
}

fn parse_value_line(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    let idx = trimmed.find("    REG_")?;
    let name = trimmed[..idx].trim();
    let rest = &trimmed[idx + 4..];
    let value = rest.split_once("    ").map(|(_, v)| v.trim()).unwrap_or("");
    Some((name, value))
}

/// Splits `reg query /s` output into one entry per subkey.
pub fn parse_reg_query(output: &str) -> Vec<UninstallEntry> {
    let mut entries = Vec::new();
    let mut current: Option<UninstallEntry> = None;
    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with("HKEY_") {
            if let Some(done) = current.take() {
                entries.push(done);
            }
            current = Some(UninstallEntry {
                key: line.trim().to_string(),
                ..Default::default()
            });
            continue;
        }
        let Some(entry) = current.as_mut() else {
            continue;
        };
        if let Some((name, value)) = parse_value_line(line) {
            if name.eq_ignore_ascii_case("DisplayName") {
                entry.display_name = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("InstallLocation") {
                entry.install_location = Some(value.to_string());
            }
        }
    }
    if let Some(done) = current {
        entries.push(done);
    }
    entries
}

/// Install location of the first entry whose display name matches and whose
/// location is non-empty.
///
/// A matching entry with a blank location does not end the search: the same
/// product is often registered under both Uninstall roots and only one of them
/// carries `InstallLocation`.
pub fn find_install_location(
    entries: &[UninstallEntry],
    display_name: &str,
    mode: MatchMode,
) -> Option<PathBuf> {
    entries.iter().find_map(|entry| {
        let name = entry.display_name.as_deref()?;
        if !mode.matches(name, display_name) {
            return None;
        }
        entry
            .install_location
            .as_deref()
            .map(str::trim)
            .filter(|loc| !loc.is_empty())
            .map(PathBuf::from)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\r
HKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\7-Zip\r
    DisplayName    REG_SZ    7-Zip 23.01 (x64)\r
    DisplayVersion    REG_SZ    23.01\r
    InstallLocation    REG_SZ    C:\\Program Files\\7-Zip\\\r
\r
HKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\Notepad++\r
    DisplayName    REG_SZ    Notepad++\r
    InstallLocation    REG_SZ    \r
\r
HKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\VLC\r
    DisplayName    REG_SZ    VLC media player\r
    Install Source    REG_SZ    D:\\setup\r
    InstallLocation    REG_EXPAND_SZ    C:\\Program Files\\VideoLAN\\VLC\r
";

    #[test]
    fn parses_entries_and_values() {
        let entries = parse_reg_query(SAMPLE);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].display_name.as_deref(), Some("7-Zip 23.01 (x64)"));
        assert_eq!(
            entries[0].install_location.as_deref(),
            Some("C:\\Program Files\\7-Zip\\")
        );
        assert_eq!(entries[1].install_location.as_deref(), Some(""));
        assert!(entries[2].key.ends_with("\\VLC"));
    }

    #[test]
    fn exact_match_requires_equal_names() {
        let entries = parse_reg_query(SAMPLE);
        assert_eq!(
            find_install_location(&entries, "VLC media player", MatchMode::Exact),
            Some(PathBuf::from("C:\\Program Files\\VideoLAN\\VLC"))
        );
        assert_eq!(find_install_location(&entries, "7-Zip", MatchMode::Exact), None);
    }

    #[test]
    fn contains_match_is_opt_in() {
        let entries = parse_reg_query(SAMPLE);
        assert_eq!(
            find_install_location(&entries, "7-Zip", MatchMode::Contains),
            Some(PathBuf::from("C:\\Program Files\\7-Zip\\"))
        );
    }

    #[test]
    fn blank_location_does_not_count_as_found() {
        let entries = parse_reg_query(SAMPLE);
        assert_eq!(find_install_location(&entries, "Notepad++", MatchMode::Exact), None);
        assert!(parse_reg_query("").is_empty());
    }

    #[test]
    fn later_registration_answers_when_first_is_blank() {
        let output = "\
HKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\Tool
    DisplayName    REG_SZ    Tool
    InstallLocation    REG_SZ    

HKEY_LOCAL_MACHINE\\SOFTWARE\\WOW6432Node\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\Tool
    DisplayName    REG_SZ    Tool
    InstallLocation    REG_SZ    C:\\Tools\\Tool
";
        let entries = parse_reg_query(output);
        assert_eq!(entries.len(), 2);
        assert_eq!(
            find_install_location(&entries, "Tool", MatchMode::Exact),
            Some(PathBuf::from("C:\\Tools\\Tool"))
        );
    }
}
