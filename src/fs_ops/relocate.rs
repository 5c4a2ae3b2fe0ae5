//! Move a whole backup root with copy, verify, delete.
//!
//! Each top-level subdirectory of the old root is handled on its own:
//!
//! ```text
//! Pending -> Copied -> Verified -> Deleted
//!    |          |          \-> DeleteFailed
//!    |          \-> VerifyFailed
//!    \-> CopySkipped
//! ```
//!
//! An original is removed only after both trees fingerprint identically with
//! unreadable files treated as fatal. One failed subdirectory never stops its
//! siblings. Re-running after a partial relocation is safe: copies overwrite,
//! and already moved subdirectories are no longer enumerated.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::engine::{Engine, UnreadablePolicy};
use crate::errors::SaveKeepError;

use super::entity::{PathEntity, resolve_lenient, resolve_link_target};
use super::helpers::build_message;
use super::replicate::{CopyOptions, CopyReport};
use super::space::ensure_space;
use super::walk::{collect_files, total_len};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Pending,
    Copied,
    Verified,
    Deleted,
    /// Not copied at all (space check or listing failed).
    CopySkipped,
    VerifyFailed,
    /// Verified copy exists but the original could not be removed.
    DeleteFailed,
}

#[derive(Debug, Clone)]
pub struct RelocationAttempt {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub copy: CopyReport,
    pub state: AttemptState,
    pub failure: Option<SaveKeepError>,
}

impl RelocationAttempt {
    fn new(source: PathBuf, destination: PathBuf) -> Self {
        Self {
            source,
            destination,
            copy: CopyReport::default(),
            state: AttemptState::Pending,
            failure: None,
        }
    }

    pub fn verified(&self) -> bool {
        matches!(
            self.state,
            AttemptState::Verified | AttemptState::Deleted | AttemptState::DeleteFailed
        )
    }

    pub fn deleted(&self) -> bool {
        self.state == AttemptState::Deleted
    }

    fn finish(mut self, state: AttemptState, failure: Option<SaveKeepError>) -> Self {
        self.state = state;
        self.failure = failure;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelocationReport {
    pub attempts: Vec<RelocationAttempt>,
    /// Set when the run was refused or stopped before any subdirectory was handled.
    pub aborted: Option<SaveKeepError>,
    pub interrupted: bool,
    /// Plain files at the top of the old root; never moved.
    pub skipped_files: Vec<PathBuf>,
    /// Entries of the old root that could not be read while listing it.
    pub listing_errors: Vec<String>,
}

impl RelocationReport {
    /// True only when every subdirectory reached `Deleted`.
    pub fn success(&self) -> bool {
        self.aborted.is_none()
            && !self.interrupted
            && self.listing_errors.is_empty()
            && self.attempts.iter().all(RelocationAttempt::deleted)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RelocationAttempt> {
        self.attempts.iter().filter(|a| !a.deleted())
    }

    fn abort(mut self, err: SaveKeepError) -> Self {
        error!(code = err.code(), kind = err.kind(), error = %err, "Relocation aborted");
        self.aborted = Some(err);
        self
    }
}

fn refused(reason: impl Into<String>) -> SaveKeepError {
    SaveKeepError::RelocationRefused(reason.into())
}

impl Engine {
    /// Move every subdirectory of `old_root` under `new_root`.
    pub fn relocate(&self, old_root: &Path, new_root: &Path) -> RelocationReport {
        let mut report = RelocationReport::default();

        if new_root.as_os_str().is_empty() {
            return report.abort(refused("new backup location is empty"));
        }
        match PathEntity::classify(old_root) {
            PathEntity::Directory => {}
            PathEntity::File => {
                return report.abort(refused(format!(
                    "old backup location '{}' is not a directory",
                    old_root.display()
                )));
            }
            PathEntity::Absent | PathEntity::Symlink => {
                info!(old = %old_root.display(), "Old backup location does not exist; nothing to relocate");
                return report;
            }
            PathEntity::Inaccessible => {
                return report.abort(SaveKeepError::Unavailable(old_root.to_path_buf()));
            }
        }

        let old_real = resolve_link_target(old_root);
        let new_real = resolve_lenient(new_root);
        if old_real == new_real {
            return report.abort(refused("old and new backup locations are the same directory"));
        }
        if new_real.starts_with(&old_real) {
            return report.abort(refused(format!(
                "new backup location '{}' lies inside '{}'",
                new_root.display(),
                old_root.display()
            )));
        }

        if let Err(e) = fs::create_dir_all(new_root) {
            return report.abort(refused(build_message("create backup location", new_root, &e)));
        }

        let rd = match fs::read_dir(old_root) {
            Ok(rd) => rd,
            Err(e) => {
                error!(error = %build_message("list", old_root, &e), "Cannot enumerate old backup location");
                return report.abort(SaveKeepError::Unavailable(old_root.to_path_buf()));
            }
        };
        let mut entries = Vec::new();
        for entry in rd {
            match entry {
                Ok(entry) => entries.push(entry.path()),
                Err(e) => report.listing_errors.push(build_message("list", old_root, &e)),
            }
        }
        entries.sort();

        info!(
            old = %old_root.display(),
            new = %new_root.display(),
            entries = entries.len(),
            "Relocating backups"
        );
        self.relocate_entries(entries, new_root, report)
    }

    fn relocate_entries(
        &self,
        entries: Vec<PathBuf>,
        new_root: &Path,
        mut report: RelocationReport,
    ) -> RelocationReport {
        for reason in &report.listing_errors {
            error!(error = %reason, "Old backup location entry could not be read");
        }
        for path in entries {
            if self.cancel.is_cancelled() {
                warn!("Relocation interrupted; remaining subdirectories left in place");
                report.interrupted = true;
                break;
            }
            let Some(name) = path.file_name() else { continue };
            if !path.is_dir() {
                info!(path = %path.display(), "Leaving top-level file in old backup location");
                report.skipped_files.push(path);
                continue;
            }
            let destination = new_root.join(name);
            let attempt = self.relocate_one(RelocationAttempt::new(path, destination));
            if let Some(err) = &attempt.failure {
                error!(
                    source = %attempt.source.display(),
                    state = ?attempt.state,
                    code = err.code(),
                    error = %err,
                    "Subdirectory not relocated"
                );
            }
            if attempt.copy.interrupted {
                report.interrupted = true;
            }
            report.attempts.push(attempt);
        }

        let moved = report.attempts.iter().filter(|a| a.deleted()).count();
        info!(
            moved,
            failed = report.attempts.len() - moved,
            unlisted = report.listing_errors.len(),
            skipped_files = report.skipped_files.len(),
            "Relocation finished"
        );
        report
    }

    fn relocate_one(&self, mut attempt: RelocationAttempt) -> RelocationAttempt {
        let required = match collect_files(&attempt.source, "", &self.cancel) {
            Ok(files) => total_len(&files),
            Err(e) => {
                warn!(path = %attempt.source.display(), error = %format!("{e:#}"), "Cannot size subdirectory");
                let err = e
                    .downcast_ref::<SaveKeepError>()
                    .cloned()
                    .unwrap_or_else(|| SaveKeepError::Unavailable(attempt.source.clone()));
                return attempt.finish(AttemptState::CopySkipped, Some(err));
            }
        };
        if let Some(parent) = attempt.destination.parent() {
            if let Err(e) = ensure_space(parent, required) {
                return attempt.finish(AttemptState::CopySkipped, Some(e));
            }
        }

        let opts = CopyOptions {
            recursive: true,
            overwrite: true,
        };
        attempt.copy = self.copy_dir(&attempt.source, &attempt.destination, opts);
        attempt.state = AttemptState::Copied;
        if attempt.copy.interrupted {
            return attempt.finish(AttemptState::Copied, Some(SaveKeepError::Interrupted));
        }

        let mismatch = SaveKeepError::VerificationFailed {
            from: attempt.source.clone(),
            to: attempt.destination.clone(),
        };
        if !attempt.copy.is_complete() {
            warn!(
                source = %attempt.source.display(),
                failed = attempt.copy.failed.len(),
                "Copy incomplete; original kept"
            );
            return attempt.finish(AttemptState::VerifyFailed, Some(mismatch));
        }
        let original = self.fingerprint_with(&attempt.source, UnreadablePolicy::Fail);
        let copy = self.fingerprint_with(&attempt.destination, UnreadablePolicy::Fail);
        match (original, copy) {
            (Some(a), Some(b)) if a == b => {
                info!(source = %attempt.source.display(), fingerprint = %a, "Copy verified");
                attempt.state = AttemptState::Verified;
            }
            (a, b) => {
                warn!(
                    source = %attempt.source.display(),
                    original = %a.map(|f| f.to_string()).unwrap_or_default(),
                    copy = %b.map(|f| f.to_string()).unwrap_or_default(),
                    "Fingerprints do not match; original kept"
                );
                return attempt.finish(AttemptState::VerifyFailed, Some(mismatch));
            }
        }

        match fs::remove_dir_all(&attempt.source) {
            Ok(()) => {
                info!(source = %attempt.source.display(), dest = %attempt.destination.display(), "Relocated");
                attempt.finish(AttemptState::Deleted, None)
            }
            Err(e) => {
                let reason = build_message("remove", &attempt.source, &e);
                let path = attempt.source.clone();
                attempt.finish(AttemptState::DeleteFailed, Some(SaveKeepError::DeleteFailed { path, reason }))
            }
        }
    }
}
