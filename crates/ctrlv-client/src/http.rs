//! HTTP implementation of [`SnippetService`] on top of reqwest.

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::service::SnippetService;
use crate::types::{
    CreateSnippetPayload, CreateSnippetResponse, DiffResponse, FetchOutcome,
    PasswordVerificationPayload, SnippetVersion, VerificationOutcome,
};

/// Default service address.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Default path prefix in front of every endpoint.
pub const DEFAULT_API_PREFIX: &str = "/api/v1";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Snippet service client.
#[derive(Debug, Clone)]
pub struct SnippetClient {
    client: reqwest::Client,
    base_url: String,
}

impl SnippetClient {
    /// Create a client for `api_url` with endpoints under `api_prefix`.
    pub fn new(api_url: &str, api_prefix: &str, timeout: Duration) -> ClientResult<Self> {
        let parsed = Url::parse(api_url)?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("ctrlv/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: join_base(api_url, api_prefix),
        })
    }

    /// Create a client with the default prefix and timeout.
    pub fn with_defaults(api_url: &str) -> ClientResult<Self> {
        Self::new(api_url, DEFAULT_API_PREFIX, DEFAULT_TIMEOUT)
    }

    /// The URL every endpoint path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_json(&self, request: RequestBuilder, label: &str) -> ClientResult<Value> {
        let response = request.send().await.map_err(|e| {
            warn!("{} failed: {}", label, e);
            ClientError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("{} returned {}", label, status);
            return Err(ClientError::api(status.as_u16(), &body));
        }

        Ok(response.json::<Value>().await?)
    }
}

impl Default for SnippetClient {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: join_base(DEFAULT_API_URL, DEFAULT_API_PREFIX),
        }
    }
}

#[async_trait]
impl SnippetService for SnippetClient {
    async fn create(&self, payload: &CreateSnippetPayload) -> ClientResult<CreateSnippetResponse> {
        debug!(language = %payload.language, "creating snippet");
        let request = self.client.post(self.url("/snippets/")).json(payload);
        let body = self.send_json(request, "create snippet").await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn get_by_id(&self, id: &str, token: &str) -> ClientResult<FetchOutcome> {
        debug!(id, "fetching snippet");
        let request = self
            .client
            .get(self.url(&format!("/snippets/{}/", id)))
            .query(&[("token", token)]);
        let body = self.send_json(request, "fetch snippet").await?;
        FetchOutcome::from_value(body)
    }

    async fn verify_password(
        &self,
        id: &str,
        payload: &PasswordVerificationPayload,
    ) -> ClientResult<VerificationOutcome> {
        debug!(id, action = payload.action.as_str(), "verifying password");
        let response = self
            .client
            .post(self.url(&format!("/snippets/{}/", id)))
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return VerificationOutcome::from_value(serde_json::from_str(&text)?);
        }

        // Wrong passwords come back as 4xx with an outcome body.
        if status.is_client_error() && status != StatusCode::NOT_FOUND {
            if let Ok(body) = serde_json::from_str::<Value>(&text) {
                if body.get("error").is_some() || body.get("verified").is_some() {
                    return VerificationOutcome::from_value(body);
                }
            }
        }

        debug!("verify password returned {}", status);
        Err(ClientError::api(status.as_u16(), &text))
    }

    async fn create_version(
        &self,
        parent_id: &str,
        payload: &CreateSnippetPayload,
    ) -> ClientResult<CreateSnippetResponse> {
        debug!(parent_id, "creating snippet version");
        let request = self
            .client
            .post(self.url(&format!("/snippets/{}/versions/", parent_id)))
            .json(payload);
        let body = self.send_json(request, "create version").await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn get_versions(&self, id: &str) -> ClientResult<Vec<SnippetVersion>> {
        let request = self
            .client
            .get(self.url(&format!("/snippets/{}/versions/", id)));
        let body = self.send_json(request, "list versions").await?;
        let mut versions: Vec<SnippetVersion> = serde_json::from_value(body)?;
        versions.sort_by_key(|v| v.version);
        Ok(versions)
    }

    async fn get_diff(&self, source_id: &str, target_id: &str) -> ClientResult<DiffResponse> {
        debug!(source_id, target_id, "fetching diff");
        let request = self.client.get(self.url(&format!(
            "/snippets/diff/{}/{}/",
            source_id, target_id
        )));
        let body = self.send_json(request, "fetch diff").await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn get_stats(&self) -> ClientResult<Value> {
        let request = self.client.get(self.url("/snippets/stats/"));
        self.send_json(request, "fetch stats").await
    }
}

fn join_base(api_url: &str, api_prefix: &str) -> String {
    let prefix = api_prefix.trim_matches('/');
    let base = api_url.trim_end_matches('/');
    if prefix.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, prefix)
    }
}
