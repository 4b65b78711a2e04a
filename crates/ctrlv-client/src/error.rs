//! Client error types.

use thiserror::Error;

/// Result type for snippet service calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the snippet service.
///
/// Every variant is cheap to clone so scripted test doubles can replay them.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    Network(String),

    /// The transport gave up waiting for a response.
    #[error("Request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        /// Parsed JSON error body, when the service sent one.
        body: Option<serde_json::Value>,
    },

    /// The response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configured base URL could not be used.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// Create an API error from a status and raw body text.
    ///
    /// The body is kept as JSON when it parses; `message` prefers the
    /// service's `error`/`detail` field over the raw text.
    pub fn api(status: u16, raw_body: &str) -> Self {
        let body = serde_json::from_str::<serde_json::Value>(raw_body).ok();
        let message = body
            .as_ref()
            .and_then(extract_message)
            .unwrap_or_else(|| raw_body.trim().to_string());
        Self::Api {
            status,
            message,
            body,
        }
    }

    /// The HTTP status, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a transport-level failure: no response, a timeout, or a 5xx.
    pub fn is_transport(&self) -> bool {
        match self {
            ClientError::Network(_) | ClientError::Timeout => true,
            ClientError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the error body flags the snippet as password protected.
    ///
    /// The service signals an access gate either as a 200 body flag or as a
    /// 403 whose body carries the same flag; this detects the latter.
    pub fn requires_password(&self) -> bool {
        match self {
            ClientError::Api {
                body: Some(body), ..
            } => body
                .get("requires_password")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false),
            _ => false,
        }
    }

    /// The service's own error message, if it sent one.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ClientError::Api { message, .. } if !message.is_empty() => Some(message.as_str()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Parse(err.to_string())
    }
}

fn extract_message(body: &serde_json::Value) -> Option<String> {
    ["error", "detail", "message"]
        .iter()
        .find_map(|key| body.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_prefers_error_field() {
        let err = ClientError::api(400, r#"{"error": "Invalid password"}"#);
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.error_message(), Some("Invalid password"));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_api_error_falls_back_to_raw_text() {
        let err = ClientError::api(502, "  Bad Gateway\n");
        assert_eq!(err.error_message(), Some("Bad Gateway"));
        assert!(err.is_transport());
    }

    #[test]
    fn test_requires_password_detects_403_body() {
        let err = ClientError::api(403, r#"{"requires_password": true}"#);
        assert!(err.requires_password());

        let plain = ClientError::api(403, r#"{"detail": "Forbidden"}"#);
        assert!(!plain.requires_password());
        assert!(!ClientError::Timeout.requires_password());
    }

    #[test]
    fn test_transport_classification() {
        assert!(ClientError::Timeout.is_transport());
        assert!(ClientError::Network("refused".into()).is_transport());
        assert!(!ClientError::Parse("eof".into()).is_transport());
        assert!(!ClientError::api(404, "").is_transport());
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::api(404, r#"{"detail": "Not found."}"#);
        assert_eq!(err.to_string(), "API error (404): Not found.");
        assert_eq!(ClientError::Timeout.to_string(), "Request timed out");
    }
}
