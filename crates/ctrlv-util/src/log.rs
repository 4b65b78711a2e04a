//! Logging setup using tracing.
//!
//! Logs go to stderr so they never interleave with snippet content on stdout,
//! or to an append-only file under the platform state directory.

use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose targets are enabled by the default filter.
const CRATE_TARGETS: &[&str] = &["ctrlv", "ctrlv_core", "ctrlv_client"];

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parse a log level from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogTarget {
    /// Human-readable lines on stderr.
    #[default]
    Stderr,
    /// Append to a file, creating parent directories as needed.
    File(PathBuf),
}

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Log level for the ctrlv crates.
    pub level: LogLevel,
    /// Output destination.
    pub target: LogTarget,
    /// Whether to include file/line info in logs.
    pub include_location: bool,
}

impl LogConfig {
    /// Build the default filter directive, e.g. `ctrlv=debug,ctrlv_core=debug`.
    pub fn filter_directive(&self) -> String {
        CRATE_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, self.level.as_str()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Initialize logging with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once is harmless; only the first subscriber is installed.
///
/// Returns the log file path when logging to a file.
pub fn init(config: LogConfig) -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directive()));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    match config.target {
        LogTarget::Stderr => {
            let _ = builder.with_writer(std::io::stderr).try_init();
            None
        }
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    eprintln!("Warning: Could not create log directory: {e}");
                    return None;
                }
            }
            let file = match std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
            {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not open log file: {e}");
                    return None;
                }
            };
            let _ = builder
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .try_init();
            Some(path)
        }
    }
}

/// Get the default log file path.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|p| p.join("ctrlv").join("logs").join("ctrlv.log"))
}
