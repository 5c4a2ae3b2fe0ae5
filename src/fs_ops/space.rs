//! Free-space pre-check before copying a backup subtree.

use std::path::Path;
use tracing::{debug, warn};

use crate::errors::SaveKeepError;

/// Headroom kept free beyond the payload itself.
const CUSHION: u64 = 4 * 1024 * 1024;

pub(crate) fn format_bytes(n: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let f = n as f64;
    if f >= GB {
        format!("{:.1} GiB", f / GB)
    } else if f >= MB {
        format!("{:.1} MiB", f / MB)
    } else if f >= KB {
        format!("{:.1} KiB", f / KB)
    } else {
        format!("{n} B")
    }
}

/// Fail with `InsufficientSpace` when the volume holding `dest` cannot take
/// `required` bytes. If free space cannot be queried the copy is allowed;
/// the copy itself will report ENOSPC per file.
pub(crate) fn ensure_space(dest: &Path, required: u64) -> Result<(), SaveKeepError> {
    let probe = dest
        .ancestors()
        .find(|p| p.exists())
        .unwrap_or(dest);
    let available = match fs2::available_space(probe) {
        Ok(n) => n,
        Err(e) => {
            warn!(path = %probe.display(), error = %e, "Could not query free space; continuing");
            return Ok(());
        }
    };
    debug!(
        dest = %dest.display(),
        required = %format_bytes(required),
        available = %format_bytes(available),
        "Free space check"
    );
    if available < required.saturating_add(CUSHION) {
        return Err(SaveKeepError::InsufficientSpace {
            required,
            available,
            dest: dest.to_path_buf(),
        });
    }
    Ok(())
}
