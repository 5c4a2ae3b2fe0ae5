//! Typed error definitions for savekeep.
//! Provides a small set of well-known failure modes for better logs and tests.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SaveKeepError {
    #[error("Source path not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Content unavailable for {0}")]
    Unavailable(PathBuf),

    #[error("Relocation refused: {0}")]
    RelocationRefused(String),

    #[error("Verification failed: {from} does not match {to}")]
    VerificationFailed { from: PathBuf, to: PathBuf },

    #[error("Failed to delete {path} after verified copy: {reason}")]
    DeleteFailed { path: PathBuf, reason: String },

    #[error("Insufficient disk space for destination {dest}: need {required} bytes, have {available} bytes")]
    InsufficientSpace {
        required: u64,
        available: u64,
        dest: PathBuf,
    },

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl SaveKeepError {
    /// Stable numeric code for structured logs.
    pub fn code(&self) -> i32 {
        match self {
            SaveKeepError::SourceNotFound(_) => 2,
            SaveKeepError::Unavailable(_) => 3,
            SaveKeepError::RelocationRefused(_) => 4,
            SaveKeepError::VerificationFailed { .. } => 5,
            SaveKeepError::DeleteFailed { .. } => 6,
            SaveKeepError::InsufficientSpace { .. } => 7,
            SaveKeepError::Interrupted => 130,
        }
    }

    /// Short machine-friendly kind label.
    pub fn kind(&self) -> &'static str {
        match self {
            SaveKeepError::SourceNotFound(_) => "source_not_found",
            SaveKeepError::Unavailable(_) => "unavailable",
            SaveKeepError::RelocationRefused(_) => "relocation_refused",
            SaveKeepError::VerificationFailed { .. } => "verification_failed",
            SaveKeepError::DeleteFailed { .. } => "delete_failed",
            SaveKeepError::InsufficientSpace { .. } => "insufficient_space",
            SaveKeepError::Interrupted => "interrupted",
        }
    }
}
