//! Windows implementations of platform helpers.
//!
//! Notes:
//! - Save files are opened with full share modes so the game keeps writing while we read.
//! - ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION mean another process holds
//!   an incompatible handle; callers back off longer for those.
//! - No ACL management; config writes are temp + rename.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::windows::fs::OpenOptionsExt;
use std::path::Path;

use windows_sys::Win32::Foundation::{ERROR_LOCK_VIOLATION, ERROR_SHARING_VIOLATION};
use windows_sys::Win32::Storage::FileSystem::{
    FILE_SHARE_DELETE, FILE_SHARE_READ, FILE_SHARE_WRITE,
};

use super::temp::tmp_sibling_name;

/// Raw OS code treated as "file is locked by another process".
pub const SHARING_VIOLATION_CODE: i32 = ERROR_SHARING_VIOLATION as i32;

/// Open `path` for reading while allowing other processes to read, write or delete it.
pub fn open_shared_read(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE)
        .open(path)
}

/// True when `e` is the lock-contention condition rather than a generic I/O failure.
pub fn is_sharing_violation(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(code) if code == ERROR_SHARING_VIOLATION as i32 || code == ERROR_LOCK_VIOLATION as i32
    )
}

/// Open log file for appending (no symlink defense available via std on Windows).
pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Write a new config file via temp + rename. Fails if `path` exists.
pub fn write_config_secure_new(path: &Path, contents: &[u8]) -> io::Result<()> {
    if path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("config file already exists: {}", path.display()),
        ));
    }
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "config path has no parent"))?;
    fs::create_dir_all(parent)?;

    let tmp = tmp_sibling_name(path, "config");
    let mut f = OpenOptions::new().write(true).create_new(true).open(&tmp)?;
    f.write_all(contents)?;
    f.sync_all()?;
    drop(f);
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}
