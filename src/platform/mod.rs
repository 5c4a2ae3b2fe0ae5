//! Platform-specific helpers.
//! This module hides OS differences (Unix/Windows) behind a uniform API so
//! the rest of the codebase can remain platform-agnostic.

pub mod temp;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::{
    SHARING_VIOLATION_CODE, is_sharing_violation, open_log_file_secure_append, open_shared_read,
    write_config_secure_new,
};

#[cfg(windows)]
pub use windows::{
    SHARING_VIOLATION_CODE, is_sharing_violation, open_log_file_secure_append, open_shared_read,
    write_config_secure_new,
};
