//! Directory tree replication with explicit partial-copy state.
//!
//! The walk never stops on a single failure: each file or subdirectory that
//! cannot be copied is recorded in the `CopyReport` and the rest of the tree
//! is still attempted. Callers decide what a partial copy means.
//!
//! Each file is streamed into a temporary sibling, given the source's mtime,
//! then renamed over the destination, so readers never see a half-written file.

use anyhow::{Context, Result, anyhow};
use filetime::FileTime;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::engine::Engine;
use crate::platform::temp::unique_temp_in;

use super::entity::{PathEntity, resolve_lenient, resolve_link_target};
use super::helpers::io_error_with_help;
use super::io_copy::copy_streaming;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOptions {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Replace existing destination files. When false, a collision fails that file only.
    pub overwrite: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            overwrite: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of `Engine::copy_dir`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    /// Destination paths of files written.
    pub copied: Vec<PathBuf>,
    pub failed: Vec<CopyFailure>,
    pub bytes: u64,
    pub source_missing: bool,
    pub interrupted: bool,
}

impl CopyReport {
    /// Every file under the source made it across.
    pub fn is_complete(&self) -> bool {
        !self.source_missing && !self.interrupted && self.failed.is_empty()
    }

    fn fail(&mut self, path: &Path, err: anyhow::Error) {
        let error = format!("{err:#}");
        warn!(path = %path.display(), error = %error, "Copy failed for entry");
        self.failed.push(CopyFailure {
            path: path.to_path_buf(),
            error,
        });
    }
}

impl Engine {
    /// Copy the contents of `source` into `destination`, creating it if needed.
    pub fn copy_dir(&self, source: &Path, destination: &Path, opts: CopyOptions) -> CopyReport {
        let mut report = CopyReport::default();

        match PathEntity::classify(source) {
            PathEntity::Directory => {}
            PathEntity::File => {
                report.fail(source, anyhow!("source is a file, not a directory"));
                return report;
            }
            PathEntity::Absent | PathEntity::Symlink => {
                error!(path = %source.display(), "Copy source does not exist");
                report.source_missing = true;
                return report;
            }
            PathEntity::Inaccessible => {
                report.fail(source, anyhow!("cannot inspect copy source"));
                return report;
            }
        }

        if opts.recursive {
            let real_source = resolve_link_target(source);
            if resolve_lenient(destination).starts_with(&real_source) {
                report.fail(
                    destination,
                    anyhow!("destination lies inside source '{}'", source.display()),
                );
                return report;
            }
        }

        if let Err(e) = fs::create_dir_all(destination)
            .map_err(io_error_with_help("create destination directory", destination))
        {
            report.fail(destination, e);
            return report;
        }

        let max_depth = if opts.recursive { usize::MAX } else { 1 };
        let mut walker = WalkDir::new(source)
            .follow_links(true)
            .min_depth(1)
            .max_depth(max_depth)
            .into_iter();

        while let Some(entry) = walker.next() {
            if self.cancel.is_cancelled() {
                warn!(source = %source.display(), "Copy interrupted");
                report.interrupted = true;
                break;
            }
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(source).to_path_buf();
                    report.fail(&path, anyhow::Error::new(e).context("walk source tree"));
                    continue;
                }
            };
            let rel = entry.path().strip_prefix(source).unwrap_or(entry.path());
            let target = destination.join(rel);
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if !opts.recursive {
                    debug!(path = %entry.path().display(), "Skipping subdirectory (non-recursive copy)");
                    continue;
                }
                if let Err(e) = fs::create_dir_all(&target)
                    .map_err(io_error_with_help("create directory", &target))
                {
                    report.fail(&target, e);
                    walker.skip_current_dir();
                }
            } else if file_type.is_file() {
                match copy_file(entry.path(), &target, opts.overwrite) {
                    Ok(bytes) => {
                        debug!(src = %entry.path().display(), dest = %target.display(), bytes, "Copied file");
                        report.bytes += bytes;
                        report.copied.push(target);
                    }
                    Err(e) => report.fail(entry.path(), e),
                }
            } else {
                debug!(path = %entry.path().display(), "Skipping special file");
            }
        }

        info!(
            source = %source.display(),
            dest = %destination.display(),
            copied = report.copied.len(),
            failed = report.failed.len(),
            bytes = report.bytes,
            "Directory copy finished"
        );
        report
    }
}

/// Copy one file via temp sibling + rename. Returns bytes written.
fn copy_file(src: &Path, dst: &Path, overwrite: bool) -> Result<u64> {
    let existing = fs::symlink_metadata(dst).ok();
    match existing {
        Some(meta) if meta.is_dir() => {
            return Err(anyhow!("destination '{}' is a directory", dst.display()));
        }
        Some(_) if !overwrite => {
            return Err(io_error_with_help("copy", dst)(io::Error::from(
                io::ErrorKind::AlreadyExists,
            )));
        }
        _ => {}
    }

    let parent = dst
        .parent()
        .ok_or_else(|| anyhow!("destination has no parent: {}", dst.display()))?;
    let tmp = unique_temp_in(parent, "copy");

    let bytes = match copy_streaming(src, &tmp) {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            return Err(io_error_with_help("copy", src)(e));
        }
    };
    preserve_mtime(src, &tmp);

    if let Err(e) = fs::rename(&tmp, dst) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| {
            format!("rename '{}' -> '{}'", tmp.display(), dst.display())
        });
    }

    #[cfg(unix)]
    {
        let _ = fs::File::open(parent).and_then(|d| d.sync_all());
    }
    Ok(bytes)
}

/// Best effort: a copy with a fresh mtime is still a correct copy.
fn preserve_mtime(src: &Path, dst: &Path) {
    let mtime = match fs::metadata(src) {
        Ok(meta) => FileTime::from_last_modification_time(&meta),
        Err(_) => return,
    };
    if let Err(e) = filetime::set_file_mtime(dst, mtime) {
        debug!(path = %dst.display(), error = %e, "Could not preserve modification time");
    }
}
