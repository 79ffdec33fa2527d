// setkit-core/src/lib.rs

pub mod catalog;
pub mod chooser;
pub mod dispatch;
pub mod orchestrator;
pub mod platform;
pub mod shortcut;

// Re-export key types for easier use by the CLI crate
pub use catalog::{load_catalog, refresh_catalog, RefreshOutcome};
pub use chooser::{FirstAvailable, SourceChooser};
pub use dispatch::{ActionOutcome, Dispatcher, ListScope, RunState};
pub use orchestrator::{CleanupMode, Installer, Selection};
pub use platform::{Platform, SystemPlatform};
