//! Unix implementations of platform helpers.
//!
//! POSIX has no share modes: a plain read-only open never blocks the game
//! while it writes. "Locked by another process" surfaces as EBUSY/ETXTBSY.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::Path;

use super::temp::tmp_sibling_name;

/// Raw OS code treated as "file is locked by another process".
pub const SHARING_VIOLATION_CODE: i32 = libc::EBUSY;

/// Open `path` for reading without excluding concurrent writers.
pub fn open_shared_read(path: &Path) -> io::Result<File> {
    File::open(path)
}

/// True when `e` is the lock-contention condition rather than a generic I/O failure.
pub fn is_sharing_violation(e: &io::Error) -> bool {
    matches!(e.raw_os_error(), Some(code) if code == libc::EBUSY || code == libc::ETXTBSY)
}

/// Open log file for appending; set 0600 only when creating a new file.
/// If the file already exists, keep its permissions.
pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let existed = path.exists();
    let f = OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o600)
        .custom_flags(libc::O_NOFOLLOW)
        .open(path)?;
    if !existed {
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(f)
}

/// Write a new config file (0600) via temp + fsync + rename. Fails if `path` exists.
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
    let _ = fs::set_permissions(parent, fs::Permissions::from_mode(0o700));

    let tmp = tmp_sibling_name(path, "config");
    let mut f = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .custom_flags(libc::O_NOFOLLOW)
        .open(&tmp)?;
    f.write_all(contents)?;
    f.sync_all()?;
    drop(f);

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    File::open(parent)?.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn preserve_existing_log_file_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, b"hello").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
        let _f = open_log_file_secure_append(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640, "existing permissions should be preserved");
    }

    #[test]
    fn new_config_gets_0600_and_no_temp_leftover() {
        let dir = tempdir().unwrap();
        let cfg = dir.path().join("config.xml");
        write_config_secure_new(&cfg, b"<config/>").unwrap();
        assert_eq!(fs::read(&cfg).unwrap(), b"<config/>");
        let mode = fs::metadata(&cfg).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        for entry in fs::read_dir(dir.path()).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().into_owned();
            assert!(!name.starts_with(".savekeep."), "leftover temp file: {name}");
        }
        let err = write_config_secure_new(&cfg, b"<x/>").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn busy_codes_classify_as_sharing_violation() {
        assert!(is_sharing_violation(&io::Error::from_raw_os_error(libc::EBUSY)));
        assert!(is_sharing_violation(&io::Error::from_raw_os_error(libc::ETXTBSY)));
        assert!(!is_sharing_violation(&io::Error::from_raw_os_error(libc::EACCES)));
        assert!(!is_sharing_violation(&io::Error::from(io::ErrorKind::NotFound)));
    }
}
