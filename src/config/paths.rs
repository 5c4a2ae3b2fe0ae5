//! Default path helpers and symlink checks.
//! Determines OS-appropriate config/log paths and detects symlinked ancestors for safety.

use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SAVEKEEP_CONFIG";

/// OS-appropriate default config path.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(mut base) = config_dir() {
        base.push("savekeep");
        base.push("config.xml");
        Some(base)
    } else {
        env::var("HOME").ok().map(|h| {
            PathBuf::from(h)
                .join(".config")
                .join("savekeep")
                .join("config.xml")
        })
    }
}

/// Config file in effect: explicit path, then `$SAVEKEEP_CONFIG`, then the default.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    match env::var_os(CONFIG_ENV) {
        Some(p) if !p.is_empty() => Some(PathBuf::from(p)),
        _ => default_config_path(),
    }
}

/// OS-appropriate default log file path (data dir). Nothing is created here.
pub fn default_log_path() -> Option<PathBuf> {
    if let Some(mut base) = data_dir() {
        base.push("savekeep");
        base.push("savekeep.log");
        Some(base)
    } else {
        env::var("HOME").ok().map(|h| {
            PathBuf::from(h)
                .join(".local")
                .join("share")
                .join("savekeep")
                .join("savekeep.log")
        })
    }
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.as_os_str().is_empty() {
            break;
        }
        match fs::symlink_metadata(anc) {
            Ok(meta) if meta.file_type().is_symlink() => return Ok(true),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        p = anc.parent();
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn explicit_path_wins() {
        let p = Path::new("/tmp/elsewhere.xml");
        assert_eq!(config_path(Some(p)), Some(p.to_path_buf()));
    }

    #[test]
    fn default_paths_are_namespaced() {
        if let Some(p) = default_config_path() {
            assert!(p.ends_with("savekeep/config.xml"));
        }
        if let Some(p) = default_log_path() {
            assert!(p.ends_with("savekeep/savekeep.log"));
        }
    }

    #[test]
    fn plain_ancestors_are_not_symlinks() {
        let td = tempdir().unwrap();
        let root = dunce::canonicalize(td.path()).unwrap();
        let log = root.join("a/b/savekeep.log");
        assert!(!path_has_symlink_ancestor(&log).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_ancestor_detected() {
        let td = tempdir().unwrap();
        let real = td.path().join("real");
        fs::create_dir(&real).unwrap();
        std::os::unix::fs::symlink(&real, td.path().join("link")).unwrap();
        assert!(path_has_symlink_ancestor(&td.path().join("link/logs/savekeep.log")).unwrap());
    }
}
