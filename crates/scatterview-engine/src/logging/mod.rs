//! Logging utilities.
//!
//! Logger initialization for binaries and tests. Library code only talks to
//! the `log` facade; GPU worker faults and skipped frames are reported there.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
