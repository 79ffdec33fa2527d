// setkit-core/src/chooser.rs
use setkit_common::model::{Arch, DownloadSource};
use tracing::debug;

/// Picks the URL a `DownloadAndRun` step downloads.
///
/// Implementations may prompt the user; returning `None` skips the step.
pub trait SourceChooser: Send + Sync {
    fn choose(&self, app_name: &str, sources: &[DownloadSource], arch: Arch) -> Option<String>;
}

/// Non-interactive default: the first target, in catalog order, carrying a URL
/// for the host architecture.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstAvailable;

impl SourceChooser for FirstAvailable {
    fn choose(&self, app_name: &str, sources: &[DownloadSource], arch: Arch) -> Option<String> {
        let picked = sources.iter().find_map(|source| {
            source
                .first_url_for(arch)
                .map(|url| (source.name.as_str(), url.to_string()))
        });
        match &picked {
            Some((name, url)) => debug!("[{}] Using source '{}' ({}): {}", app_name, name, arch, url),
            None => debug!("[{}] No {} download URL in {} source(s)", app_name, arch, sources.len()),
        }
        picked.map(|(_, url)| url)
    }
}

impl<F> SourceChooser for F
where
    F: Fn(&str, &[DownloadSource], Arch) -> Option<String> + Send + Sync,
{
    fn choose(&self, app_name: &str, sources: &[DownloadSource], arch: Arch) -> Option<String> {
        self(app_name, sources, arch)
    }
}
