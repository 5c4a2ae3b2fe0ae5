//! Filesystem operations behind the `Engine`.
//!
//! Leaves first: `entity` and `walk` classify and list paths, `hash` builds
//! fingerprints, `detect` compares, `read` retries whole-file reads,
//! `replicate` copies trees and `relocate` composes them into copy, verify, delete.

mod detect;
mod entity;
mod hash;
mod helpers;
mod io_copy;
mod read;
mod relocate;
mod replicate;
pub(crate) mod retry;
mod space;
mod walk;

pub use entity::{PathEntity, resolve_link_target};
pub use hash::Fingerprint;
pub use helpers::io_error_with_help;
pub use relocate::{AttemptState, RelocationAttempt, RelocationReport};
pub use replicate::{CopyFailure, CopyOptions, CopyReport};
pub use retry::{Backoff, ReadPolicy, Sleeper, ThreadSleeper};
