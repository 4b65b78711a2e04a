//! The snippet service seam.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ClientResult;
use crate::types::{
    CreateSnippetPayload, CreateSnippetResponse, DiffResponse, FetchOutcome,
    PasswordVerificationPayload, SnippetVersion, VerificationOutcome,
};

/// Operations offered by the remote snippet service.
///
/// Each call issues exactly one request and never retries.
#[async_trait]
pub trait SnippetService: Send + Sync {
    /// Create a new lineage.
    async fn create(&self, payload: &CreateSnippetPayload) -> ClientResult<CreateSnippetResponse>;

    /// Read a snippet with its capability token.
    ///
    /// A 403 carrying `requires_password` comes back as an API error; callers
    /// decide how to treat it (see [`crate::ClientError::requires_password`]).
    async fn get_by_id(&self, id: &str, token: &str) -> ClientResult<FetchOutcome>;

    /// Check an access password or decrypt content.
    ///
    /// A wrong password is an `Ok` outcome; only transport failures and
    /// unreadable replies are errors.
    async fn verify_password(
        &self,
        id: &str,
        payload: &PasswordVerificationPayload,
    ) -> ClientResult<VerificationOutcome>;

    /// Add a version to the lineage rooted at `parent_id`.
    async fn create_version(
        &self,
        parent_id: &str,
        payload: &CreateSnippetPayload,
    ) -> ClientResult<CreateSnippetResponse>;

    /// List a lineage, ordered by version ordinal.
    async fn get_versions(&self, id: &str) -> ClientResult<Vec<SnippetVersion>>;

    /// Fetch a freshly computed diff between two snippets.
    async fn get_diff(&self, source_id: &str, target_id: &str) -> ClientResult<DiffResponse>;

    /// Service-wide statistics. The shape is owned by the service.
    async fn get_stats(&self) -> ClientResult<serde_json::Value>;
}

/// A shared snippet service for dynamic dispatch.
pub type SharedSnippetService = Arc<dyn SnippetService>;
