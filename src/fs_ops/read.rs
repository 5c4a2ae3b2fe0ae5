//! Whole-file reads that tolerate a game holding the file open.
//!
//! A sharing violation ("locked by another process") backs off on the slow
//! curve of `ReadPolicy`; every other error on the fast one. Both share a
//! single attempt budget. A missing file is not retried.

use std::io::{self, Read};
use std::path::Path;

use tracing::{debug, error, warn};

use crate::engine::Engine;
use crate::platform::{is_sharing_violation, open_shared_read};

use super::helpers::build_message;
use super::retry::retry;

fn read_shared(path: &Path) -> io::Result<Vec<u8>> {
    let mut file = open_shared_read(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

impl Engine {
    /// Entire contents of `path`, or `None` when it is missing or stays unreadable.
    pub fn read_all(&self, path: &Path) -> Option<Vec<u8>> {
        self.read_all_with(path, read_shared)
    }

    pub(crate) fn read_all_with(
        &self,
        path: &Path,
        mut open: impl FnMut(&Path) -> io::Result<Vec<u8>>,
    ) -> Option<Vec<u8>> {
        if !path.is_file() {
            debug!(path = %path.display(), "Nothing to read");
            return None;
        }
        let policy = &self.options.read_retry;
        let result = retry(
            policy.max_attempts,
            self.sleeper.as_ref(),
            &self.cancel,
            |failed, e| {
                let locked = is_sharing_violation(e);
                let delay = policy.delay_after(failed, locked);
                warn!(
                    path = %path.display(),
                    attempt = failed,
                    locked,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Read failed; retrying"
                );
                delay
            },
            || open(path),
        );
        match result {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!(error = %build_message("read", path, &e), "Giving up on file read");
                None
            }
        }
    }
}
