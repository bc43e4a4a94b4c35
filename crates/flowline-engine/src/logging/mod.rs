//! Logging utilities.
//!
//! The crate logs through the `log` facade only (job life cycle at debug,
//! dropped responses at warn). Applications that have no logger of their own
//! can install `env_logger` through `init_logging`.

mod init;

pub use init::{init_logging, LoggingConfig};