//! Logging utilities.
//!
//! Centralizes logger initialization. Library code logs through the `log` facade
//! only; `env_logger` is installed by [`init_logging`].

mod init;

pub use init::{LoggingConfig, init_logging};
