//! Routes of the front end and share links.
//!
//! A share link is `{origin}/s/{id}?token={token}`. The id and token are
//! inserted as they are; the service only hands out URL-safe values.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::error::SnippetError;

/// Where the user can be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Route {
    /// The page for writing a new snippet.
    Create,
    /// One snippet, opened with its token.
    Snippet { id: String, token: String },
}

impl Route {
    pub fn snippet(id: impl Into<String>, token: impl Into<String>) -> Self {
        Route::Snippet {
            id: id.into(),
            token: token.into(),
        }
    }

    /// Path and query relative to the origin.
    pub fn path(&self) -> String {
        match self {
            Route::Create => "/".to_string(),
            Route::Snippet { id, token } => format!("/s/{}?token={}", id, token),
        }
    }

    /// Absolute link under `origin`.
    pub fn url(&self, origin: &str) -> String {
        format!("{}{}", origin.trim_end_matches('/'), self.path())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Build the link a new snippet is shared with.
pub fn share_link(origin: &str, id: &str, token: &str) -> String {
    Route::snippet(id, token).url(origin)
}

/// A snippet named on the command line: a bare id or a full share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetRef {
    pub id: String,
    pub token: Option<String>,
}

impl SnippetRef {
    /// Parse `abc`, `/s/abc?token=t` style paths, or `https://host/s/abc?token=t`.
    pub fn parse(input: &str) -> Result<Self, SnippetError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SnippetError::Validation("Missing snippet id".to_string()));
        }

        let url = if input.contains("://") {
            Some(Url::parse(input))
        } else if input.starts_with('/') {
            Some(Url::parse("http://localhost").and_then(|base| base.join(input)))
        } else {
            None
        };

        let Some(url) = url else {
            if input.contains(['/', '?', '#']) {
                return Err(SnippetError::Validation(format!(
                    "Not a snippet id or link: {}",
                    input
                )));
            }
            return Ok(Self {
                id: input.to_string(),
                token: None,
            });
        };

        let url = url.map_err(|e| SnippetError::Validation(format!("Invalid link: {}", e)))?;
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let id = match segments.as_slice() {
            ["s", id] => id.to_string(),
            _ => {
                return Err(SnippetError::Validation(format!(
                    "Not a snippet link: {}",
                    input
                )))
            }
        };
        let token = url
            .query_pairs()
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
            .filter(|token| !token.is_empty());

        Ok(Self { id, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Create.path(), "/");
        assert_eq!(Route::snippet("v2", "t1").path(), "/s/v2?token=t1");
        assert_eq!(
            Route::snippet("v2", "t1").url("http://localhost:3000/"),
            "http://localhost:3000/s/v2?token=t1"
        );
    }

    #[test]
    fn test_share_link_is_not_encoded() {
        assert_eq!(
            share_link("https://ctrlv.example", "abc", "a+b="),
            "https://ctrlv.example/s/abc?token=a+b="
        );
    }

    #[test]
    fn test_parse_bare_id() {
        let parsed = SnippetRef::parse(" abc ").unwrap();
        assert_eq!(parsed.id, "abc");
        assert_eq!(parsed.token, None);
    }

    #[test]
    fn test_parse_full_link() {
        let parsed = SnippetRef::parse("http://localhost:3000/s/abc?token=t1").unwrap();
        assert_eq!(
            parsed,
            SnippetRef {
                id: "abc".into(),
                token: Some("t1".into())
            }
        );
    }

    #[test]
    fn test_parse_path_and_empty_token() {
        let parsed = SnippetRef::parse("/s/abc?token=").unwrap();
        assert_eq!(parsed.id, "abc");
        assert_eq!(parsed.token, None);
    }

    #[test]
    fn test_parse_rejects_other_links() {
        assert!(SnippetRef::parse("http://localhost:3000/about").is_err());
        assert!(SnippetRef::parse("a/b").is_err());
        assert!(SnippetRef::parse("").is_err());
    }
}
