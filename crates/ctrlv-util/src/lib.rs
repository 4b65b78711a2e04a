//! Shared utilities for ctrlv.
//!
//! Currently this is the logging setup shared by the CLI and the tests.

pub mod log;

pub use log::{LogConfig, LogLevel};
