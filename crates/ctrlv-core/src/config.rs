//! Configuration management for ctrlv.
//!
//! Configuration is loaded from multiple sources and merged:
//! 1. Global config: `~/.config/ctrlv/config.json` (or `config.jsonc`)
//! 2. Environment variable: `CTRLV_CONFIG_CONTENT`
//! 3. Project config: `ctrlv.json` or `ctrlv.jsonc` in the working directory
//! 4. Environment overrides: `CTRLV_API_URL`, `CTRLV_ORIGIN`,
//!    `CTRLV_TIMEOUT_SECS`, `CTRLV_LOG_LEVEL`
//!
//! Files may contain `//` and `/* */` comments.

use crate::error::{ConfigError, CoreResult};
use ctrlv_client::{DEFAULT_API_PREFIX, DEFAULT_API_URL, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default origin used to build share links.
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Snippet service address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Path prefix in front of every endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_prefix: Option<String>,

    /// Origin of the web front end; share links point here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    /// Request timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

/// Log level as written in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Returns the merged config and the files that contributed to it.
    pub async fn load(project_dir: Option<&Path>) -> CoreResult<(Self, Vec<PathBuf>)> {
        let mut config = Config::default();
        let mut sources = Vec::new();

        // 1. Global config
        if let Some(global_dir) = Self::global_config_dir() {
            if let Some(path) = first_existing(&global_dir, &["config.json", "config.jsonc"]) {
                config = config.merge(Self::load_file(&path).await?);
                sources.push(path);
            }
        }

        // 2. Inline content
        if let Ok(content) = std::env::var("CTRLV_CONFIG_CONTENT") {
            config = config.merge(Self::parse_jsonc(&content, "<env>")?);
        }

        // 3. Project config
        if let Some(dir) = project_dir {
            if let Some(path) = first_existing(dir, &["ctrlv.jsonc", "ctrlv.json"]) {
                config = config.merge(Self::load_file(&path).await?);
                sources.push(path);
            }
        }

        // 4. Single-value overrides
        let config = config.apply_overrides(|name| std::env::var(name).ok())?;

        tracing::debug!(sources = sources.len(), "configuration loaded");
        Ok((config, sources))
    }

    /// Get the global config directory.
    ///
    /// On Unix, `~/.config/ctrlv` wins when it exists.
    pub fn global_config_dir() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            if let Some(home) = dirs::home_dir() {
                let xdg_config = home.join(".config").join("ctrlv");
                if xdg_config.exists() {
                    return Some(xdg_config);
                }
            }
        }

        dirs::config_dir().map(|d| d.join("ctrlv"))
    }

    /// Load configuration from a file.
    pub async fn load_file(path: &Path) -> CoreResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse_jsonc(&content, &path.display().to_string())
    }

    /// Parse JSONC (JSON with comments).
    pub fn parse_jsonc(content: &str, source: &str) -> CoreResult<Self> {
        let stripped = strip_comments(content);
        serde_json::from_str(&stripped).map_err(|e| {
            ConfigError::InvalidJson {
                path: source.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Apply `CTRLV_*` overrides read through `lookup`.
    pub fn apply_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> CoreResult<Self> {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup("CTRLV_API_URL") {
            self.api_url = Some(url);
        }
        if let Some(origin) = lookup("CTRLV_ORIGIN") {
            self.origin = Some(origin);
        }
        if let Some(secs) = lookup("CTRLV_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|_| ConfigError::Validation {
                message: format!("CTRLV_TIMEOUT_SECS must be a number of seconds, got {:?}", secs),
            })?;
            self.timeout_secs = Some(secs);
        }
        if let Some(level) = lookup("CTRLV_LOG_LEVEL") {
            let parsed = LogLevel::parse(&level).ok_or_else(|| ConfigError::Validation {
                message: format!("unknown log level {:?}", level),
            })?;
            self.log_level = Some(parsed);
        }
        Ok(self)
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(self, other: Self) -> Self {
        Self {
            api_url: merge_option(self.api_url, other.api_url),
            api_prefix: merge_option(self.api_prefix, other.api_prefix),
            origin: merge_option(self.origin, other.origin),
            timeout_secs: merge_option(self.timeout_secs, other.timeout_secs),
            log_level: merge_option(self.log_level, other.log_level),
        }
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn api_prefix(&self) -> &str {
        self.api_prefix.as_deref().unwrap_or(DEFAULT_API_PREFIX)
    }

    /// Share-link origin without a trailing slash.
    pub fn origin(&self) -> &str {
        self.origin
            .as_deref()
            .unwrap_or(DEFAULT_ORIGIN)
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }
}

fn first_existing(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names.iter().map(|name| dir.join(name)).find(|p| p.exists())
}

fn merge_option<T>(base: Option<T>, other: Option<T>) -> Option<T> {
    other.or(base)
}

#[derive(Clone, Copy, PartialEq)]
enum Scan {
    Code,
    Str,
    StrEscape,
    Slash,
    Line,
    Block,
    BlockStar,
}

/// Remove `//` and `/* */` comments outside of string literals.
fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut scan = Scan::Code;

    for c in input.chars() {
        scan = match (scan, c) {
            (Scan::Code, '"') => {
                out.push(c);
                Scan::Str
            }
            (Scan::Code, '/') => Scan::Slash,
            (Scan::Code, _) => {
                out.push(c);
                Scan::Code
            }
            (Scan::Str, '\\') => {
                out.push(c);
                Scan::StrEscape
            }
            (Scan::Str, '"') => {
                out.push(c);
                Scan::Code
            }
            (Scan::Str, _) | (Scan::StrEscape, _) => {
                out.push(c);
                Scan::Str
            }
            (Scan::Slash, '/') => Scan::Line,
            (Scan::Slash, '*') => Scan::Block,
            (Scan::Slash, _) => {
                out.push('/');
                out.push(c);
                if c == '"' {
                    Scan::Str
                } else {
                    Scan::Code
                }
            }
            (Scan::Line, '\n') => {
                out.push('\n');
                Scan::Code
            }
            (Scan::Line, _) => Scan::Line,
            (Scan::Block, '*') | (Scan::BlockStar, '*') => Scan::BlockStar,
            (Scan::BlockStar, '/') => Scan::Code,
            (Scan::Block, _) | (Scan::BlockStar, _) => Scan::Block,
        };
    }

    if scan == Scan::Slash {
        out.push('/');
    }
    out
}
