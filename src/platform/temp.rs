//! Shared temporary name helpers.
//! Provides unique hidden sibling filenames for write-then-rename operations
//! (config templates and replicated save files).
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Prefix of every temporary name created by savekeep.
pub const TEMP_PREFIX: &str = ".savekeep.";

/// Unique hidden temp path inside `dir`.
/// Pattern: .savekeep.<tag>.<pid>.<nanos>.<seq>.tmp
pub fn unique_temp_in(dir: &Path, tag: &str) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    dir.join(format!("{TEMP_PREFIX}{tag}.{pid}.{nanos}.{seq}.tmp"))
}

/// Unique hidden temp path next to `target`.
pub fn tmp_sibling_name(target: &Path, tag: &str) -> PathBuf {
    unique_temp_in(target.parent().unwrap_or_else(|| Path::new(".")), tag)
}
