//! Core library for `savekeep`.
//!
//! Change detection and safe relocation for game save backups:
//! - fingerprint files and directory trees (order independent, screenshot excluded)
//! - decide whether a save location differs from its last backup
//! - read files a running game may hold locked
//! - copy trees with an explicit report of what made it across
//! - move a backup root with copy, verify, delete
//!
//! Everything hangs off [`Engine`]; every operation is total and reports
//! failure through its return value and `tracing`.

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs_ops;
pub mod output;
pub mod platform;
pub mod shutdown;

pub use config::{Config, LogLevel};
pub use engine::{DEFAULT_SCREENSHOT_NAME, Engine, EngineOptions, UnreadablePolicy};
pub use errors::SaveKeepError;
pub use fs_ops::{
    AttemptState, Backoff, CopyFailure, CopyOptions, CopyReport, Fingerprint, PathEntity,
    ReadPolicy, RelocationAttempt, RelocationReport, Sleeper, ThreadSleeper, resolve_link_target,
};
pub use shutdown::CancelToken;
