//! Error types for the core crate.

use ctrlv_client::ClientError;
use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Snippet service error.
    #[error("service error: {0}")]
    Client(#[from] ClientError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid JSON/JSONC syntax.
    #[error("invalid config at {path}: {message}")]
    InvalidJson { path: String, message: String },

    /// A value was present but unusable.
    #[error("config validation failed: {message}")]
    Validation { message: String },

    /// Invalid path (e.g., could not determine config directory).
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// How a failed snippet operation is presented.
///
/// Every service failure lands in exactly one of these; the access controller
/// and the share composer pick their states and messages from it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnippetError {
    /// Rejected before anything was sent.
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid token, or a wrong password. Retrying may help.
    #[error("{0}")]
    Access(String),

    /// The snippet is gone.
    #[error("Snippet not found or has expired")]
    NotFoundOrExpired,

    /// Network, timeout, server failure or an unreadable reply.
    #[error("{0}")]
    Transport(String),
}

impl SnippetError {
    /// Classify a service error.
    pub fn classify(err: &ClientError) -> Self {
        let message = || {
            err.error_message()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string())
        };

        if err.is_transport() {
            return SnippetError::Transport(err.to_string());
        }
        match err.status() {
            Some(404) | Some(410) => SnippetError::NotFoundOrExpired,
            Some(401) | Some(403) => SnippetError::Access(message()),
            Some(400) | Some(422) => SnippetError::Validation(message()),
            Some(_) => SnippetError::Transport(message()),
            // Parse and URL errors carry no status.
            None => SnippetError::Transport(err.to_string()),
        }
    }

    /// Whether the user can do anything about it by trying again.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SnippetError::Access(_) | SnippetError::Validation(_))
    }
}

impl From<&ClientError> for SnippetError {
    fn from(err: &ClientError) -> Self {
        SnippetError::classify(err)
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
