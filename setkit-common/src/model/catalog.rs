// setkit-common/src/model/catalog.rs
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::application::Application;
use super::null_as_empty;
use super::utility::Utility;
use crate::error::{Result, SetkitError};

/// Root of a catalog document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub applications: Vec<Application>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub utilities: Vec<Utility>,
}

impl Catalog {
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Err(SetkitError::Catalog(
                "Catalog document is empty".to_string(),
            ));
        }
        let catalog: Catalog = serde_yaml::from_str(content)
            .map_err(|e| SetkitError::Catalog(format!("Failed to parse catalog: {e}")))?;
        debug!(
            "Parsed catalog with {} applications and {} utilities",
            catalog.applications.len(),
            catalog.utilities.len()
        );
        Ok(catalog)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn application(&self, name: &str) -> Option<&Application> {
        self.applications
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn utility(&self, name: &str) -> Option<&Utility> {
        self.utilities
            .iter()
            .find(|u| u.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::action::ActionKind;

    const SAMPLE: &str = r#"
applications:
  - name: 7-Zip
    processName: 7zFM.exe
    registryDisplayName: "7-Zip 23.01 (x64)"
    version: "23.01"
    futureField: ignored
    downloadLinks:
      - name: Official
        targets:
          - osVersion: Default
            url_x64: https://www.7-zip.org/a/7z2301-x64.exe
            url_x86: https://www.7-zip.org/a/7z2301.exe
    installSteps:
      - Type: DownloadAndRun
        args: /S
    patch:
      - Type: Download
        url: https://example.com/lang.zip
        fileName: lang.zip
      - Type: Extract
        archive: "{downloaded_file_path}"
        destination: "{install_dir}\\Lang"
        args: -y
        requiresAdmin: true
    postInstall:
      - Type: CreateShortcut
        target: "{install_dir}\\7zFM.exe"
        shortcutName: 7-Zip
utilities:
  - name: Flush DNS
    description: Clears the resolver cache
    actions:
      - Type: RunCommand
        command: ipconfig /flushdns
        requiresAdmin: true
"#;

    #[test]
    fn parses_sample_catalog() {
        let catalog = Catalog::from_yaml(SAMPLE).unwrap();
        assert_eq!(catalog.applications.len(), 1);
        assert_eq!(catalog.utilities.len(), 1);

        let app = catalog.application("7-zip").unwrap();
        assert_eq!(app.version.as_deref(), Some("23.01"));
        assert_eq!(app.download_links[0].targets[0].os_version, "Default");
        assert_eq!(app.total_steps(), 4);
        assert!(app.patch[1].requires_admin);
        assert_eq!(
            app.install_steps[0].kind,
            ActionKind::DownloadAndRun {
                args: Some("/S".into())
            }
        );

        let util = catalog.utility("Flush DNS").unwrap();
        assert_eq!(util.actions.len(), 1);
        assert!(util.actions[0].requires_admin);
    }

    #[test]
    fn missing_and_null_sequences_become_empty() {
        let catalog = Catalog::from_yaml("applications:\n").unwrap();
        assert!(catalog.applications.is_empty());
        assert!(catalog.utilities.is_empty());

        let bare = Catalog::from_yaml("applications:\n  - name: Bare\n    patch: ~\n").unwrap();
        assert!(bare.applications[0].patch.is_empty());
        assert!(bare.applications[0].download_links.is_empty());
    }

    #[test]
    fn empty_or_malformed_documents_are_catalog_errors() {
        assert!(matches!(
            Catalog::from_yaml("   \n"),
            Err(SetkitError::Catalog(_))
        ));
        assert!(matches!(
            Catalog::from_yaml("applications: [unterminated"),
            Err(SetkitError::Catalog(_))
        ));
    }

    #[test]
    fn phases_survive_a_yaml_round_trip() {
        let catalog = Catalog::from_yaml(SAMPLE).unwrap();
        let reparsed = Catalog::from_yaml(&catalog.to_yaml().unwrap()).unwrap();
        let before = &catalog.applications[0];
        let after = &reparsed.applications[0];
        assert_eq!(before.install_steps, after.install_steps);
        assert_eq!(before.patch, after.patch);
        assert_eq!(before.post_install, after.post_install);
        assert_eq!(catalog, reparsed);
    }
}
