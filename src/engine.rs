//! The engine: shared context for fingerprinting, change detection,
//! resilient reads, directory replication and backup relocation.
//!
//! The operations themselves live in `fs_ops` as `impl Engine` blocks:
//! - `fingerprint`  (fs_ops::hash)
//! - `has_changed`  (fs_ops::detect)
//! - `read_all`     (fs_ops::read)
//! - `copy_dir`     (fs_ops::replicate)
//! - `relocate`     (fs_ops::relocate)
//!
//! Every public operation is total: failures are logged through `tracing`
//! and surface as `None`, `true` ("assume changed") or a failed report.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::fs_ops::retry::{Backoff, ReadPolicy, Sleeper, ThreadSleeper};
use crate::shutdown::CancelToken;

/// Rotating screenshot stored next to each backup; never part of a fingerprint.
pub const DEFAULT_SCREENSHOT_NAME: &str = "Scum_Bag_Screenshot.jpg";

/// What a directory fingerprint does with a file it cannot read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnreadablePolicy {
    /// Log and leave the file out of the digest.
    #[default]
    Skip,
    /// The whole directory fingerprint becomes unavailable.
    Fail,
}

impl UnreadablePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" | "tolerate" => Some(UnreadablePolicy::Skip),
            "fail" | "strict" => Some(UnreadablePolicy::Fail),
            _ => None,
        }
    }
}

impl fmt::Display for UnreadablePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnreadablePolicy::Skip => "skip",
            UnreadablePolicy::Fail => "fail",
        })
    }
}

impl FromStr for UnreadablePolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid unreadable-file policy: '{s}'"))
    }
}

/// Tunables consumed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// File name excluded from hashing and counting.
    pub screenshot_name: String,
    /// Per-file retry schedule used while hashing.
    pub hash_retry: Backoff,
    /// Retry schedule for whole-file reads.
    pub read_retry: ReadPolicy,
    /// Directory fingerprint behavior for unreadable files.
    pub unreadable: UnreadablePolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            screenshot_name: DEFAULT_SCREENSHOT_NAME.to_string(),
            hash_retry: Backoff::default(),
            read_retry: ReadPolicy::default(),
            unreadable: UnreadablePolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Engine {
    pub(crate) options: EngineOptions,
    pub(crate) sleeper: Arc<dyn Sleeper>,
    pub(crate) cancel: CancelToken,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            sleeper: Arc::new(ThreadSleeper),
            cancel: CancelToken::new(),
        }
    }

    /// Replace the sleeper used between retry attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Share an externally owned cancel token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub(crate) fn screenshot_name(&self) -> &str {
        &self.options.screenshot_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_policy_parse() {
        assert_eq!(UnreadablePolicy::parse("SKIP"), Some(UnreadablePolicy::Skip));
        assert_eq!(UnreadablePolicy::parse(" strict "), Some(UnreadablePolicy::Fail));
        assert!("maybe".parse::<UnreadablePolicy>().is_err());
        assert_eq!(UnreadablePolicy::Fail.to_string(), "fail");
    }

    #[test]
    fn default_options() {
        let opts = EngineOptions::default();
        assert_eq!(opts.screenshot_name, DEFAULT_SCREENSHOT_NAME);
        assert_eq!(opts.hash_retry.max_attempts, 4);
        assert_eq!(opts.read_retry.max_attempts, 5);
        assert_eq!(opts.unreadable, UnreadablePolicy::Skip);
    }

    #[test]
    fn cancel_token_is_shared() {
        let token = CancelToken::new();
        let engine = Engine::default().with_cancel_token(token.clone());
        token.cancel();
        assert!(engine.cancel_token().is_cancelled());
    }
}
