//! Change detection between a live save location and its last backup.
//!
//! Rules, first match wins:
//! 1. Both paths resolve to the same existing target -> unchanged.
//! 2. Source missing -> unchanged (nothing to back up).
//! 3. Target missing -> changed.
//! 4. Two files: size, then digest.
//! 5. Two directories: file count, total size, then tree fingerprint.
//! 6. File vs directory -> changed.
//!
//! Any failure along the way means "changed": an extra backup is cheap, a
//! missed one is not.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::engine::Engine;

use super::entity::{PathEntity, resolve_link_target};
use super::walk::{collect_files, sort_ordinal, total_len};

impl Engine {
    /// True when `source` differs from `target`. Never fails; errors count as a change.
    pub fn has_changed(&self, source: &Path, target: &Path) -> bool {
        match self.compare(source, target) {
            Ok(changed) => changed,
            Err(e) => {
                warn!(
                    source = %source.display(),
                    target = %target.display(),
                    error = %format!("{e:#}"),
                    "Comparison failed; assuming changed"
                );
                true
            }
        }
    }

    fn compare(&self, source: &Path, target: &Path) -> Result<bool> {
        let resolved_source = resolve_link_target(source);
        let resolved_target = resolve_link_target(target);
        if resolved_source == resolved_target && PathEntity::classify(&resolved_source).exists() {
            debug!(path = %resolved_source.display(), "Source and target resolve to the same path");
            return Ok(false);
        }

        let source_kind = PathEntity::classify(source);
        let target_kind = PathEntity::classify(target);
        match (source_kind, target_kind) {
            (PathEntity::Inaccessible, _) | (_, PathEntity::Inaccessible) => {
                warn!(
                    source = %source.display(),
                    target = %target.display(),
                    "Cannot inspect source or target; assuming changed"
                );
                Ok(true)
            }
            (s, _) if !s.exists() => {
                debug!(source = %source.display(), "Source does not exist; nothing to compare");
                Ok(false)
            }
            (_, t) if !t.exists() => {
                debug!(target = %target.display(), "Target does not exist");
                Ok(true)
            }
            (PathEntity::File, PathEntity::File) => self.compare_files(source, target),
            (PathEntity::Directory, PathEntity::Directory) => self.compare_dirs(source, target),
            (s, t) => {
                debug!(source_kind = ?s, target_kind = ?t, "Type mismatch");
                Ok(true)
            }
        }
    }

    fn compare_files(&self, source: &Path, target: &Path) -> Result<bool> {
        let source_len = fs::metadata(source)
            .with_context(|| format!("stat '{}'", source.display()))?
            .len();
        let target_len = fs::metadata(target)
            .with_context(|| format!("stat '{}'", target.display()))?
            .len();
        if source_len != target_len {
            debug!(source_len, target_len, "File sizes differ");
            return Ok(true);
        }

        match (self.file_digest(source), self.file_digest(target)) {
            (Some(a), Some(b)) => Ok(a != b),
            _ => {
                warn!(source = %source.display(), target = %target.display(), "Hash unavailable; assuming changed");
                Ok(true)
            }
        }
    }

    fn compare_dirs(&self, source: &Path, target: &Path) -> Result<bool> {
        let exclude = self.screenshot_name();
        let mut source_files = collect_files(source, exclude, &self.cancel)?;
        let mut target_files = collect_files(target, exclude, &self.cancel)?;

        if source_files.len() != target_files.len() {
            debug!(source_count = source_files.len(), target_count = target_files.len(), "File counts differ");
            return Ok(true);
        }
        let (source_len, target_len) = (total_len(&source_files), total_len(&target_files));
        if source_len != target_len {
            debug!(source_len, target_len, "Directory sizes differ");
            return Ok(true);
        }

        sort_ordinal(&mut source_files);
        sort_ordinal(&mut target_files);
        let policy = self.options.unreadable;
        match (
            self.digest_listing(source, &source_files, policy),
            self.digest_listing(target, &target_files, policy),
        ) {
            (Some(a), Some(b)) => Ok(a != b),
            _ => {
                warn!(source = %source.display(), target = %target.display(), "Fingerprint unavailable; assuming changed");
                Ok(true)
            }
        }
    }
}
