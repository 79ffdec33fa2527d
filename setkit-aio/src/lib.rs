// setkit-aio/src/lib.rs
//! Async process, archive and temp-directory operations for setkit.

pub mod extract;
pub mod fs;
pub mod process;

pub use extract::ArchiveTool;
pub use fs::{purge_dir_contents, remove_paths};
pub use process::{run_process, split_args, split_command, LaunchMode, ProcessOutcome, ProcessRequest};
