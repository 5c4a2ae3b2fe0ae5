//! Path classification and best-effort link resolution.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What a path currently names on disk. Symlinks to existing targets classify
/// as their target; only dangling links report `Symlink`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathEntity {
    File,
    Directory,
    Absent,
    Symlink,
    /// Something may be there but it could not be inspected (permission
    /// denied, I/O error). Never treated as absent.
    Inaccessible,
}

impl PathEntity {
    pub fn classify(path: &Path) -> Self {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => PathEntity::Directory,
            Ok(_) => PathEntity::File,
            Err(e) if is_missing(&e) => match fs::symlink_metadata(path) {
                Ok(meta) if meta.file_type().is_symlink() => PathEntity::Symlink,
                _ => PathEntity::Absent,
            },
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Cannot inspect path");
                PathEntity::Inaccessible
            }
        }
    }

    /// File or directory (a dangling link does not exist for comparison purposes).
    pub fn exists(self) -> bool {
        matches!(self, PathEntity::File | PathEntity::Directory)
    }
}

fn is_missing(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory)
}

/// Follow links to the final target. Falls back to the literal path when
/// resolution fails (missing path, dangling link, permission error).
pub fn resolve_link_target(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Like `resolve_link_target`, but for paths that may not exist yet: resolve
/// the parent and re-attach the final component.
pub(crate) fn resolve_lenient(path: &Path) -> PathBuf {
    if let Ok(real) = dunce::canonicalize(path) {
        return real;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            resolve_lenient(parent).join(name)
        }
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn classify_file_dir_absent() {
        let td = tempdir().unwrap();
        let f = td.path().join("slot1.sav");
        fs::write(&f, b"x").unwrap();
        assert_eq!(PathEntity::classify(&f), PathEntity::File);
        assert_eq!(PathEntity::classify(td.path()), PathEntity::Directory);
        assert_eq!(PathEntity::classify(&td.path().join("nope")), PathEntity::Absent);
        assert!(!PathEntity::Absent.exists());
        assert!(!PathEntity::Symlink.exists());
        assert!(!PathEntity::Inaccessible.exists());
    }

    #[test]
    fn child_of_a_file_is_absent() {
        let td = tempdir().unwrap();
        let f = td.path().join("slot1.sav");
        fs::write(&f, b"x").unwrap();
        assert_eq!(PathEntity::classify(&f.join("inner")), PathEntity::Absent);
    }

    #[cfg(unix)]
    #[test]
    fn unsearchable_parent_is_inaccessible() {
        use std::os::unix::fs::PermissionsExt;
        if unsafe { libc::geteuid() } == 0 {
            return;
        }
        let td = tempdir().unwrap();
        let locked = td.path().join("live");
        fs::create_dir_all(locked.join("game")).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        let kind = PathEntity::classify(&locked.join("game"));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(kind, PathEntity::Inaccessible);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_link_is_symlink_and_resolves_literally() {
        let td = tempdir().unwrap();
        let link = td.path().join("dangling");
        std::os::unix::fs::symlink(td.path().join("missing"), &link).unwrap();
        assert_eq!(PathEntity::classify(&link), PathEntity::Symlink);
        assert_eq!(resolve_link_target(&link), link);
    }

    #[cfg(unix)]
    #[test]
    fn link_resolves_to_target() {
        let td = tempdir().unwrap();
        let real = td.path().join("real");
        fs::create_dir(&real).unwrap();
        let link = td.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        assert_eq!(PathEntity::classify(&link), PathEntity::Directory);
        assert_eq!(resolve_link_target(&link), resolve_link_target(&real));
    }

    #[test]
    fn lenient_resolution_of_missing_child() {
        let td = tempdir().unwrap();
        let missing = td.path().join("a").join("b");
        let resolved = resolve_lenient(&missing);
        assert!(resolved.ends_with("a/b") || resolved.ends_with("a\\b"));
        assert!(resolved.starts_with(resolve_link_target(td.path())));
    }
}
