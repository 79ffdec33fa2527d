// setkit/src/cli/chooser.rs
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use setkit_common::model::{Arch, DownloadSource};
use setkit_core::{FirstAvailable, SourceChooser};
use tracing::warn;

/// Prompts on the terminal when an application offers more than one usable
/// source; otherwise behaves like `FirstAvailable`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptChooser;

impl SourceChooser for PromptChooser {
    fn choose(&self, app_name: &str, sources: &[DownloadSource], arch: Arch) -> Option<String> {
        let options: Vec<(String, &str)> = sources
            .iter()
            .filter_map(|s| s.first_url_for(arch).map(|url| (s.name.clone(), url)))
            .collect();
        if options.len() <= 1 {
            return FirstAvailable.choose(app_name, sources, arch);
        }

        let items: Vec<String> = options
            .iter()
            .map(|(name, url)| format!("{name}  ({url})"))
            .collect();
        // The prompt blocks; keep the runtime's other tasks moving meanwhile.
        let picked = tokio::task::block_in_place(|| {
            Select::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("Choose a download source for {app_name}"))
                .items(&items)
                .default(0)
                .interact_opt()
        });
        match picked {
            Ok(Some(index)) => options.get(index).map(|(_, url)| url.to_string()),
            Ok(None) => {
                warn!("No download source chosen for {}; skipping.", app_name);
                None
            }
            Err(e) => {
                warn!("Source prompt failed ({}); using the first available source.", e);
                FirstAvailable.choose(app_name, sources, arch)
            }
        }
    }
}
