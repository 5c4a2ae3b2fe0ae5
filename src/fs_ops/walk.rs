//! File listings for hashing and counting.
//!
//! Traversal uses walkdir's iterator (its own stack, no recursion here) and
//! follows links so a symlinked save folder is read through. Any walk error
//! fails the whole listing: a partial listing would compare as "different" or,
//! worse, as "equal" for the wrong reasons.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::SaveKeepError;
use crate::shutdown::CancelToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FileEntry {
    pub path: PathBuf,
    pub len: u64,
}

/// Every regular file under `root` (recursive), minus files named `exclude`.
pub(crate) fn collect_files(root: &Path, exclude: &str, cancel: &CancelToken) -> Result<Vec<FileEntry>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).min_depth(1) {
        if cancel.is_cancelled() {
            return Err(SaveKeepError::Interrupted.into());
        }
        let entry = entry.with_context(|| format!("walk '{}'", root.display()))?;
        if !entry.file_type().is_file() || entry.file_name() == exclude {
            continue;
        }
        let len = entry
            .metadata()
            .with_context(|| format!("stat '{}'", entry.path().display()))?
            .len();
        files.push(FileEntry {
            path: entry.into_path(),
            len,
        });
    }
    Ok(files)
}

/// Sort by full path using byte-ordinal comparison (no locale, no
/// component-wise `Path` ordering).
pub(crate) fn sort_ordinal(files: &mut [FileEntry]) {
    files.sort_by(|a, b| {
        a.path
            .as_os_str()
            .as_encoded_bytes()
            .cmp(b.path.as_os_str().as_encoded_bytes())
    });
}

/// Total byte size of the listing.
pub(crate) fn total_len(files: &[FileEntry]) -> u64 {
    files.iter().map(|f| f.len).sum()
}
