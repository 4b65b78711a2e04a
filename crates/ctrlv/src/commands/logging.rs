//! Logging initialization.

use ctrlv_util::log::{default_log_path, LogConfig, LogLevel, LogTarget};
use std::path::PathBuf;

/// Initialize logging from the command line flags and the configured level.
///
/// Logs go to stderr unless `to_file` is set. Returns the log file path when
/// logging to a file.
pub fn init_logging(
    verbose: bool,
    to_file: bool,
    configured: Option<ctrlv_core::config::LogLevel>,
) -> Option<PathBuf> {
    let level = if verbose {
        LogLevel::Debug
    } else {
        configured
            .and_then(|level| LogLevel::parse(level.as_str()))
            .unwrap_or_default()
    };

    let target = if to_file {
        default_log_path().map(LogTarget::File).unwrap_or_default()
    } else {
        LogTarget::Stderr
    };

    ctrlv_util::log::init(LogConfig {
        level,
        target,
        include_location: verbose,
    })
}
