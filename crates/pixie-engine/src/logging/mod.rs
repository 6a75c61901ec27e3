//! Logging setup.
//!
//! The engine only talks to the `log` facade. `init_logging` installs an
//! `env_logger` backend for binaries and tests that want console output.

mod init;

pub use init::{init_logging, LoggingConfig};
