//! Builder patterns for constructing test objects.
//!
//! All timestamps are fixed so that fixtures compare equal across runs.

use chrono::{DateTime, Duration, TimeZone, Utc};
use ctrlv_client::{CreateSnippetResponse, DiffResponse, Snippet, SnippetVersion};

/// The creation time used by every fixture.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 6, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Builder for [`Snippet`] values.
///
/// # Example
///
/// ```rust
/// use ctrlv_test_utils::builders::{version, SnippetBuilder};
///
/// let snippet = SnippetBuilder::new("v2")
///     .content("fn main() {}")
///     .language("rust")
///     .version(2)
///     .versions(vec![version("v1", 1), version("v2", 2)])
///     .build();
///
/// assert!(snippet.has_versions());
/// ```
#[derive(Debug, Clone)]
pub struct SnippetBuilder {
    snippet: Snippet,
}

impl SnippetBuilder {
    /// Start a plain python snippet with empty content.
    pub fn new(id: impl Into<String>) -> Self {
        let created_at = fixed_time();
        Self {
            snippet: Snippet {
                id: id.into(),
                content: String::new(),
                language: "python".to_string(),
                created_at,
                expires_at: created_at + Duration::hours(24),
                view_count: 0,
                one_time_view: false,
                is_encrypted: false,
                version: 1,
                versions: None,
            },
        }
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.snippet.content = content.into();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.snippet.language = language.into();
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.snippet.version = version;
        self
    }

    /// Embed a lineage.
    pub fn versions(mut self, versions: Vec<SnippetVersion>) -> Self {
        self.snippet.versions = Some(versions);
        self
    }

    pub fn encrypted(mut self, encrypted: bool) -> Self {
        self.snippet.is_encrypted = encrypted;
        self
    }

    pub fn one_time_view(mut self, one_time_view: bool) -> Self {
        self.snippet.one_time_view = one_time_view;
        self
    }

    pub fn view_count(mut self, view_count: u64) -> Self {
        self.snippet.view_count = view_count;
        self
    }

    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.snippet.expires_at = expires_at;
        self
    }

    pub fn build(self) -> Snippet {
        self.snippet
    }
}

/// A lineage entry whose creation time follows its ordinal.
pub fn version(id: &str, ordinal: u32) -> SnippetVersion {
    SnippetVersion {
        id: id.to_string(),
        version: ordinal,
        created_at: fixed_time() + Duration::hours(i64::from(ordinal)),
        language: "python".to_string(),
    }
}

/// A lineage `ids[0]` = version 1, `ids[1]` = version 2, and so on.
pub fn lineage(ids: &[&str]) -> Vec<SnippetVersion> {
    ids.iter()
        .zip(1..)
        .map(|(id, ordinal)| version(id, ordinal))
        .collect()
}

pub fn create_response(id: &str, token: &str) -> CreateSnippetResponse {
    CreateSnippetResponse {
        id: id.to_string(),
        access_token: token.to_string(),
        sharing_url: format!("http://127.0.0.1:8000/s/{}", id),
        expires_at: fixed_time() + Duration::hours(24),
        version: 1,
    }
}

pub fn diff_response(source: &str, target: &str, diff_content: &str) -> DiffResponse {
    DiffResponse {
        id: format!("diff-{}-{}", source, target),
        source_snippet: source.to_string(),
        target_snippet: target.to_string(),
        diff_content: diff_content.to_string(),
        created_at: fixed_time(),
    }
}
