// setkit-common/src/model/application.rs
use serde::{Deserialize, Serialize};

use super::action::InstallAction;
use super::null_as_empty;

/// Processor architecture used to pick a download URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arch {
    X64,
    X86,
}

impl Arch {
    pub fn from_is_64bit(is_64bit: bool) -> Self {
        if is_64bit {
            Arch::X64
        } else {
            Arch::X86
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arch::X64 => f.write_str("x64"),
            Arch::X86 => f.write_str("x86"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub download_links: Vec<DownloadSource>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub install_steps: Vec<InstallAction>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub patch: Vec<InstallAction>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub post_install: Vec<InstallAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadSource {
    pub name: String,
    #[serde(default)]
    pub convert_direct_link: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub targets: Vec<DownloadTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTarget {
    /// Informational only; selection branches on architecture alone.
    #[serde(rename = "osVersion", alias = "oSVersion", default = "default_os_version")]
    pub os_version: String,
    #[serde(default, alias = "Url_x64", skip_serializing_if = "Option::is_none")]
    pub url_x64: Option<String>,
    #[serde(default, alias = "Url_x86", skip_serializing_if = "Option::is_none")]
    pub url_x86: Option<String>,
}

fn default_os_version() -> String {
    "Default".to_string()
}

impl DownloadTarget {
    /// The non-empty URL for `arch`, if any.
    pub fn url_for(&self, arch: Arch) -> Option<&str> {
        let url = match arch {
            Arch::X64 => self.url_x64.as_deref(),
            Arch::X86 => self.url_x86.as_deref(),
        };
        url.map(str::trim).filter(|u| !u.is_empty())
    }
}

impl DownloadSource {
    pub fn first_url_for(&self, arch: Arch) -> Option<&str> {
        self.targets.iter().find_map(|t| t.url_for(arch))
    }
}

impl Application {
    pub fn total_steps(&self) -> usize {
        self.install_steps.len() + self.patch.len() + self.post_install.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_url_for_skips_blank_entries() {
        let target = DownloadTarget {
            os_version: "Default".into(),
            url_x64: Some("https://example.com/x64.exe".into()),
            url_x86: Some("   ".into()),
        };
        assert_eq!(target.url_for(Arch::X64), Some("https://example.com/x64.exe"));
        assert_eq!(target.url_for(Arch::X86), None);
    }

    #[test]
    fn source_picks_first_target_with_matching_arch() {
        let source = DownloadSource {
            name: "Official".into(),
            convert_direct_link: false,
            targets: vec![
                DownloadTarget {
                    os_version: "Win7".into(),
                    url_x64: None,
                    url_x86: Some("https://example.com/win7-x86.exe".into()),
                },
                DownloadTarget {
                    os_version: "Default".into(),
                    url_x64: Some("https://example.com/x64.exe".into()),
                    url_x86: Some("https://example.com/x86.exe".into()),
                },
            ],
        };
        assert_eq!(source.first_url_for(Arch::X64), Some("https://example.com/x64.exe"));
        assert_eq!(
            source.first_url_for(Arch::X86),
            Some("https://example.com/win7-x86.exe")
        );
    }

    #[test]
    fn legacy_key_spellings_are_accepted() {
        let yaml = "oSVersion: Win10\nUrl_x64: https://a/x64.exe\nUrl_x86: https://a/x86.exe\n";
        let target: DownloadTarget = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(target.os_version, "Win10");
        assert_eq!(target.url_for(Arch::X86), Some("https://a/x86.exe"));
    }
}
