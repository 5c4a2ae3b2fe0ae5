//! Bounded retry with backoff.
//!
//! Schedules are plain data (`Backoff`, `ReadPolicy`) carried in `EngineOptions`.
//! Waiting goes through the `Sleeper` seam so tests can record delays instead of
//! blocking. Retries stop early when the cancel token trips.

use std::fmt;
use std::io;
use std::time::Duration;

use crate::shutdown::CancelToken;

/// Blocks the calling thread between attempts.
pub trait Sleeper: Send + Sync + fmt::Debug {
    fn sleep(&self, delay: Duration);
}

/// Default sleeper: `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Delay after the `failed`-th failure (1-based); the last entry repeats.
fn scheduled(delays: &[Duration], failed: u32) -> Duration {
    let idx = (failed.saturating_sub(1) as usize).min(delays.len().saturating_sub(1));
    delays.get(idx).copied().unwrap_or_default()
}

fn millis(ms: &[u64]) -> Vec<Duration> {
    ms.iter().copied().map(Duration::from_millis).collect()
}

/// Single-class retry schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    pub max_attempts: u32,
    pub delays: Vec<Duration>,
}

impl Backoff {
    pub fn new(max_attempts: u32, delays_ms: &[u64]) -> Self {
        Self {
            max_attempts,
            delays: millis(delays_ms),
        }
    }

    pub fn delay_after(&self, failed: u32) -> Duration {
        scheduled(&self.delays, failed)
    }
}

impl Default for Backoff {
    /// Per-file hashing: first try plus 3 retries, 50/100/200ms apart.
    fn default() -> Self {
        Self::new(4, &[50, 100, 200])
    }
}

/// Whole-file read schedule: one attempt budget, two backoff curves.
/// Lock contention clears slowly, everything else is assumed to be a blip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPolicy {
    pub max_attempts: u32,
    pub locked_delays: Vec<Duration>,
    pub other_delays: Vec<Duration>,
}

impl ReadPolicy {
    pub fn delay_after(&self, failed: u32, locked: bool) -> Duration {
        if locked {
            scheduled(&self.locked_delays, failed)
        } else {
            scheduled(&self.other_delays, failed)
        }
    }
}

impl Default for ReadPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            locked_delays: millis(&[200, 400, 800, 1600]),
            other_delays: millis(&[50, 100, 200, 400]),
        }
    }
}

/// Run `op` up to `max_attempts` times. After each failure except the last,
/// sleep for `delay(failures_so_far, &error)`. Returns the last error on exhaustion,
/// or `ErrorKind::Interrupted` if `cancel` trips before an attempt.
pub(crate) fn retry<T>(
    max_attempts: u32,
    sleeper: &dyn Sleeper,
    cancel: &CancelToken,
    mut delay: impl FnMut(u32, &io::Error) -> Duration,
    mut op: impl FnMut() -> io::Result<T>,
) -> io::Result<T> {
    let max_attempts = max_attempts.max(1);
    let mut failed = 0u32;
    loop {
        if cancel.is_cancelled() {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "cancelled"));
        }
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => {
                failed += 1;
                if failed >= max_attempts {
                    return Err(e);
                }
                sleeper.sleep(delay(failed, &e));
            }
        }
    }
}
