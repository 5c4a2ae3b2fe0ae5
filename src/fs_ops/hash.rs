//! Content fingerprints.
//!
//! - File: MD5 of its bytes, read through a shared handle, retried per
//!   `EngineOptions::hash_retry`.
//! - Directory: one streaming MD5 over every file (recursive, screenshot
//!   excluded) in byte-ordinal path order; each file contributes its path
//!   relative to the root (UTF-8) followed by its own 16-byte digest.
//! - Anything else: unavailable.
//!
//! MD5 is used for change detection only, never for security.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use tracing::{debug, error, warn};

use crate::engine::{Engine, UnreadablePolicy};
use crate::platform::open_shared_read;

use super::entity::PathEntity;
use super::helpers::build_message;
use super::retry::retry;
use super::walk::{FileEntry, collect_files, sort_ordinal};

const BUF_SIZE: usize = 64 * 1024;

/// Lower-case hex digest of a file or directory tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    fn from_digest(digest: md5::Digest) -> Self {
        Fingerprint(format!("{digest:x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn digest_reader(file: File) -> io::Result<md5::Digest> {
    let mut reader = BufReader::with_capacity(BUF_SIZE, file);
    let mut ctx = md5::Context::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => ctx.consume(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(ctx.compute())
}

impl Engine {
    /// Fingerprint of a file or directory; `None` when unavailable.
    pub fn fingerprint(&self, path: &Path) -> Option<Fingerprint> {
        self.fingerprint_with(path, self.options.unreadable)
    }

    pub(crate) fn fingerprint_with(&self, path: &Path, policy: UnreadablePolicy) -> Option<Fingerprint> {
        match PathEntity::classify(path) {
            PathEntity::Directory => {
                let mut files = match collect_files(path, self.screenshot_name(), &self.cancel) {
                    Ok(files) => files,
                    Err(e) => {
                        error!(path = %path.display(), error = %format!("{e:#}"), "Failed to list directory for hashing");
                        return None;
                    }
                };
                sort_ordinal(&mut files);
                self.digest_listing(path, &files, policy)
            }
            PathEntity::File => self.file_digest(path).map(Fingerprint::from_digest),
            PathEntity::Absent | PathEntity::Symlink => {
                debug!(path = %path.display(), "Nothing to fingerprint");
                None
            }
            PathEntity::Inaccessible => {
                error!(path = %path.display(), "Cannot inspect path for hashing");
                None
            }
        }
    }

    /// Digest an already sorted listing rooted at `root`.
    pub(crate) fn digest_listing(
        &self,
        root: &Path,
        files: &[FileEntry],
        policy: UnreadablePolicy,
    ) -> Option<Fingerprint> {
        let mut ctx = md5::Context::new();
        for file in files {
            if self.cancel.is_cancelled() {
                warn!(path = %root.display(), "Fingerprint interrupted");
                return None;
            }
            let Some(digest) = self.file_digest(&file.path) else {
                match policy {
                    UnreadablePolicy::Skip => {
                        warn!(path = %file.path.display(), "Leaving unreadable file out of directory fingerprint");
                        continue;
                    }
                    UnreadablePolicy::Fail => {
                        error!(path = %file.path.display(), root = %root.display(), "Directory fingerprint unavailable: unreadable file");
                        return None;
                    }
                }
            };
            let rel = file.path.strip_prefix(root).unwrap_or(&file.path);
            ctx.consume(rel.to_string_lossy().as_bytes());
            ctx.consume(digest.0);
        }
        Some(Fingerprint::from_digest(ctx.compute()))
    }

    /// MD5 of one file's bytes, or `None` after the retry budget is spent.
    pub(crate) fn file_digest(&self, path: &Path) -> Option<md5::Digest> {
        debug!(path = %path.display(), "Hashing file");
        let policy = &self.options.hash_retry;
        let result = retry(
            policy.max_attempts,
            self.sleeper.as_ref(),
            &self.cancel,
            |failed, _| policy.delay_after(failed),
            || open_shared_read(path).and_then(digest_reader),
        );
        match result {
            Ok(digest) => Some(digest),
            Err(e) => {
                error!(error = %build_message("hash file", path, &e), "Failed to hash file");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;
    use crate::fs_ops::retry::testing::RecordingSleeper;
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn known_file_digest() {
        let td = tempdir().unwrap();
        let f = td.path().join("hello.txt");
        fs::write(&f, b"hello").unwrap();
        let fp = Engine::default().fingerprint(&f).unwrap();
        assert_eq!(fp.as_str(), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn empty_directory_has_digest_of_nothing() {
        let td = tempdir().unwrap();
        let fp = Engine::default().fingerprint(td.path()).unwrap();
        assert_eq!(fp.to_string(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn digest_input_is_relative_path_then_file_digest() {
        let td = tempdir().unwrap();
        fs::write(td.path().join("a.txt"), b"1").unwrap();

        let mut expected = md5::Context::new();
        expected.consume(b"a.txt");
        expected.consume(md5::compute(b"1").0);
        let expected = format!("{:x}", expected.compute());

        let fp = Engine::default().fingerprint(td.path()).unwrap();
        assert_eq!(fp.as_str(), expected);
    }

    #[test]
    fn missing_path_is_unavailable_without_retries() {
        let td = tempdir().unwrap();
        let sleeper = Arc::new(RecordingSleeper::default());
        let engine = Engine::new(EngineOptions::default()).with_sleeper(sleeper.clone());
        assert!(engine.fingerprint(&td.path().join("missing")).is_none());
        assert!(sleeper.delays_ms().is_empty());
    }

    #[test]
    fn vanished_file_retries_with_hash_backoff() {
        let td = tempdir().unwrap();
        let sleeper = Arc::new(RecordingSleeper::default());
        let engine = Engine::new(EngineOptions::default()).with_sleeper(sleeper.clone());
        assert!(engine.file_digest(&td.path().join("gone.sav")).is_none());
        assert_eq!(sleeper.delays_ms(), vec![50, 100, 200]);
    }

    #[test]
    fn unreadable_policy_decides_directory_outcome() {
        let td = tempdir().unwrap();
        let root = td.path();
        fs::write(root.join("ok.sav"), b"ok").unwrap();
        let files = vec![
            FileEntry { path: root.join("ok.sav"), len: 2 },
            FileEntry { path: root.join("vanished.sav"), len: 4 },
        ];
        let engine = Engine::default().with_sleeper(Arc::new(RecordingSleeper::default()));

        let skipped = engine.digest_listing(root, &files, UnreadablePolicy::Skip).unwrap();
        let only_ok = engine.digest_listing(root, &files[..1], UnreadablePolicy::Skip).unwrap();
        assert_eq!(skipped, only_ok);

        assert!(engine.digest_listing(root, &files, UnreadablePolicy::Fail).is_none());
    }
}
