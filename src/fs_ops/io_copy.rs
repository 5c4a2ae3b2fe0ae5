//! Streaming file copy into a freshly created destination.
//!
//! - The destination is opened with `create_new`, so an existing file is never
//!   clobbered here; replacing is the caller's rename.
//! - The source is opened through the shared-read helper so a running game
//!   can keep writing.
//! - Data is fsynced before returning; the caller syncs the parent after rename.
//!
//! Snapshot semantics: the source is read once to EOF. Bytes appended while
//! the copy runs are not included.

use std::fs::OpenOptions;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use crate::platform::open_shared_read;

const BUF_SIZE: usize = 1024 * 1024;

/// Copy `src` -> `dst` and return the number of bytes written.
pub(super) fn copy_streaming(src: &Path, dst: &Path) -> io::Result<u64> {
    let src_f = open_shared_read(src)?;
    let dst_f = OpenOptions::new().write(true).create_new(true).open(dst)?;

    let mut reader = BufReader::with_capacity(BUF_SIZE, src_f);
    let mut writer = BufWriter::with_capacity(BUF_SIZE, dst_f);
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(bytes)
}
