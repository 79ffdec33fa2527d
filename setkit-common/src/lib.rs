// setkit-common/src/lib.rs
pub mod cancel;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod model;

// Re-export key types
pub use cancel::CancelToken;
pub use config::{Config, MatchMode};
pub use context::Context;
pub use error::{Result, SetkitError};
pub use events::{InstallEvent, ListReport, OwnerKind, Phase, RunReport};
pub use model::{ActionKind, Application, Arch, Catalog, InstallAction, Utility};
