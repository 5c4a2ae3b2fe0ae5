//! I/O error helpers.
//!
//! Enriches io::Error with the operation, the path and a platform-aware hint,
//! usable with map_err in anyhow::Result code paths.
//!
//! Usage:
//!   fs::create_dir_all(dir).map_err(io_error_with_help("create directory", dir))?;

use anyhow::anyhow;
use std::io;
use std::path::Path;

use crate::platform::is_sharing_violation;

fn hint_for(e: &io::Error) -> Option<&'static str> {
    if is_sharing_violation(e) {
        return Some("file is in use by another process; retry once the game finishes writing");
    }

    #[cfg(unix)]
    {
        if let Some(code) = e.raw_os_error() {
            let hint = match code {
                libc::EACCES | libc::EPERM => Some("permission denied; check ownership and permissions"),
                libc::ENOENT => Some("path not found; it may have been removed concurrently"),
                libc::EEXIST => Some("already exists; enable overwrite or remove the target"),
                libc::ENOSPC => Some("insufficient space on device"),
                libc::EROFS => Some("read-only filesystem; cannot write here"),
                libc::ELOOP => Some("too many symbolic link levels; possible symlink cycle"),
                libc::ENAMETOOLONG => Some("filename or path too long"),
                libc::EMFILE | libc::ENFILE => Some("too many open files"),
                _ => None,
            };
            if hint.is_some() {
                return hint;
            }
        }
    }

    #[cfg(windows)]
    {
        if let Some(code) = e.raw_os_error() {
            let hint = match code {
                5 => Some("access denied; check permissions"),
                2 | 3 => Some("path not found; it may have been removed concurrently"),
                80 | 183 => Some("already exists; enable overwrite or remove the target"),
                112 => Some("insufficient disk space"),
                206 => Some("filename or path too long"),
                _ => None,
            };
            if hint.is_some() {
                return hint;
            }
        }
    }

    match e.kind() {
        io::ErrorKind::PermissionDenied => Some("permission denied; check ownership and permissions"),
        io::ErrorKind::NotFound => Some("path not found; it may have been removed concurrently"),
        io::ErrorKind::AlreadyExists => Some("already exists; enable overwrite or remove the target"),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            Some("busy/timed out; retry after the current write finishes")
        }
        _ => None,
    }
}

/// Format "<op> '<path>': <error> (<hint>) [os code: N]".
pub(crate) fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    if let Some(hint) = hint_for(e) {
        msg.push_str(" (");
        msg.push_str(hint);
        msg.push(')');
    }
    if let Some(code) = e.raw_os_error() {
        msg.push_str(&format!(" [os code: {code}]"));
    }
    msg
}

/// Adapter for anyhow::Result code.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(build_message(op, path, &e))
}
