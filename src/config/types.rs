//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::engine::{DEFAULT_SCREENSHOT_NAME, EngineOptions, UnreadablePolicy};

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for the CLI and the engine it builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Current backup root; default source for `relocate`.
    pub backups_directory: Option<PathBuf>,
    /// Rotating screenshot left out of fingerprints and counts.
    pub screenshot_name: String,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Attempt budget for whole-file reads.
    pub read_attempts: u32,
    /// Attempt budget per file while hashing.
    pub hash_attempts: u32,
    /// Directory fingerprint behavior for unreadable files.
    pub unreadable_files: UnreadablePolicy,
}

impl Default for Config {
    fn default() -> Self {
        let engine = EngineOptions::default();
        Self {
            backups_directory: None,
            screenshot_name: DEFAULT_SCREENSHOT_NAME.to_string(),
            log_level: LogLevel::Normal,
            log_file: None,
            read_attempts: engine.read_retry.max_attempts,
            hash_attempts: engine.hash_retry.max_attempts,
            unreadable_files: engine.unreadable,
        }
    }
}

impl Config {
    /// Engine tunables; backoff curves keep their defaults, only budgets change.
    pub fn engine_options(&self) -> EngineOptions {
        let mut opts = EngineOptions {
            screenshot_name: self.screenshot_name.clone(),
            unreadable: self.unreadable_files,
            ..EngineOptions::default()
        };
        opts.read_retry.max_attempts = self.read_attempts;
        opts.hash_retry.max_attempts = self.hash_attempts;
        opts
    }
}
