//! A stateful in-memory snippet service.
//!
//! Behaves like the real backend closely enough for end-to-end flows:
//! - a password without encryption is an access gate (403 until checked)
//! - encryption with a password is a decrypt gate (metadata only until decrypted)
//! - one-time snippets disappear after their first full read
//! - versions share a lineage rooted at the first snippet
//! - diffs are unified line diffs computed on request

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ctrlv_client::{
    ClientError, ClientResult, CreateSnippetPayload, CreateSnippetResponse, DiffResponse,
    FetchOutcome, PasswordAction, PasswordVerificationPayload, Snippet, SnippetService,
    SnippetVersion, VerificationOutcome,
};
use serde_json::{json, Value};
use similar::TextDiff;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

const DEFAULT_EXPIRATION_MINUTES: u32 = 1440;

#[derive(Debug, Clone)]
struct Record {
    id: String,
    token: String,
    root: String,
    content: String,
    language: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    view_count: u64,
    one_time_view: bool,
    encrypted: bool,
    password: Option<String>,
    version: u32,
}

#[derive(Default)]
struct Store {
    next_id: u64,
    records: HashMap<String, Record>,
    unlocked: HashSet<String>,
    requests: usize,
}

impl Store {
    fn lineage(&self, root: &str) -> Vec<SnippetVersion> {
        let mut versions: Vec<SnippetVersion> = self
            .records
            .values()
            .filter(|r| r.root == root)
            .map(|r| SnippetVersion {
                id: r.id.clone(),
                version: r.version,
                created_at: r.created_at,
                language: r.language.clone(),
            })
            .collect();
        versions.sort_by_key(|v| v.version);
        versions
    }

    fn snippet(&self, record: &Record, content: String) -> Snippet {
        Snippet {
            id: record.id.clone(),
            content,
            language: record.language.clone(),
            created_at: record.created_at,
            expires_at: record.expires_at,
            view_count: record.view_count,
            one_time_view: record.one_time_view,
            is_encrypted: record.encrypted,
            version: record.version,
            versions: Some(self.lineage(&record.root)),
        }
    }

    fn insert(
        &mut self,
        payload: &CreateSnippetPayload,
        parent: Option<&Record>,
    ) -> ClientResult<Record> {
        if payload.content.trim().is_empty() {
            return Err(bad_request(json!({"content": ["This field may not be blank."]})));
        }
        let password = payload.password.clone().filter(|p| !p.is_empty());
        if payload.encrypt_content && password.is_none() {
            return Err(bad_request(json!({"error": "Password required for encryption"})));
        }

        self.next_id += 1;
        let id = format!("snp{}", self.next_id);
        let created_at = Utc::now();
        let minutes = payload.expiration_minutes.unwrap_or(DEFAULT_EXPIRATION_MINUTES);
        let (root, version) = match parent {
            Some(parent) => {
                let latest = self
                    .lineage(&parent.root)
                    .last()
                    .map(|v| v.version)
                    .unwrap_or(parent.version);
                (parent.root.clone(), latest + 1)
            }
            None => (id.clone(), 1),
        };

        let record = Record {
            token: format!("tok{}", self.next_id),
            id: id.clone(),
            root,
            content: payload.content.clone(),
            language: payload.language.clone(),
            created_at,
            expires_at: created_at + Duration::minutes(i64::from(minutes)),
            view_count: 0,
            one_time_view: payload.one_time_view,
            encrypted: payload.encrypt_content,
            password,
            version,
        };
        self.records.insert(id, record.clone());
        Ok(record)
    }

    fn record(&self, id: &str) -> ClientResult<&Record> {
        self.records.get(id).ok_or_else(not_found)
    }

    /// Count a full read, dropping one-time snippets afterwards.
    fn consume(&mut self, id: &str) -> ClientResult<Snippet> {
        let record = self.records.get_mut(id).ok_or_else(not_found)?;
        record.view_count += 1;
        let record = record.clone();
        let snippet = self.snippet(&record, record.content.clone());
        if record.one_time_view {
            self.records.remove(id);
            self.unlocked.remove(id);
        }
        Ok(snippet)
    }
}

fn not_found() -> ClientError {
    ClientError::api(404, r#"{"detail": "Not found."}"#)
}

fn bad_request(body: Value) -> ClientError {
    ClientError::api(400, &body.to_string())
}

fn created(record: &Record) -> CreateSnippetResponse {
    CreateSnippetResponse {
        id: record.id.clone(),
        access_token: record.token.clone(),
        sharing_url: format!("http://127.0.0.1:8000/s/{}", record.id),
        expires_at: record.expires_at,
        version: record.version,
    }
}

/// An in-memory snippet backend.
///
/// # Example
///
/// ```rust,ignore
/// let service = InMemorySnippetService::new();
/// let created = service.create(&payload).await?;
/// let outcome = service.get_by_id(&created.id, &created.access_token).await?;
/// ```
#[derive(Clone, Default)]
pub struct InMemorySnippetService {
    store: Arc<Mutex<Store>>,
}

impl InMemorySnippetService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a snippet as if it had expired.
    pub fn expire(&self, id: &str) {
        let mut store = self.store.lock().unwrap();
        store.records.remove(id);
        store.unlocked.remove(id);
    }

    /// Number of stored snippets.
    pub fn len(&self) -> usize {
        self.store.lock().unwrap().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of requests served, failed ones included.
    pub fn request_count(&self) -> usize {
        self.store.lock().unwrap().requests
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Store> {
        let mut store = self.store.lock().unwrap();
        store.requests += 1;
        store
    }
}

#[async_trait]
impl SnippetService for InMemorySnippetService {
    async fn create(&self, payload: &CreateSnippetPayload) -> ClientResult<CreateSnippetResponse> {
        let mut store = self.lock();
        let record = store.insert(payload, None)?;
        Ok(created(&record))
    }

    async fn get_by_id(&self, id: &str, token: &str) -> ClientResult<FetchOutcome> {
        let mut store = self.lock();
        let record = store.record(id)?;
        if record.token != token {
            return Err(ClientError::api(403, r#"{"error": "Invalid access token"}"#));
        }

        if record.encrypted {
            let partial = store.snippet(record, String::new());
            return Ok(FetchOutcome::DecryptChallenge(partial));
        }
        if record.password.is_some() && !store.unlocked.contains(id) {
            return Err(ClientError::api(403, r#"{"requires_password": true}"#));
        }

        Ok(FetchOutcome::Content(store.consume(id)?))
    }

    async fn verify_password(
        &self,
        id: &str,
        payload: &PasswordVerificationPayload,
    ) -> ClientResult<VerificationOutcome> {
        let mut store = self.lock();
        let record = store.record(id)?;
        let matches = record.password.as_deref() == Some(payload.password.as_str());
        let encrypted = record.encrypted;

        match payload.action {
            PasswordAction::CheckPassword => {
                if matches {
                    store.unlocked.insert(id.to_string());
                    Ok(VerificationOutcome::Verified(true))
                } else {
                    Ok(VerificationOutcome::Verified(false))
                }
            }
            PasswordAction::Decrypt if !encrypted => Ok(VerificationOutcome::Rejected {
                error: "Snippet is not encrypted".to_string(),
            }),
            PasswordAction::Decrypt if matches => {
                Ok(VerificationOutcome::Resolved(store.consume(id)?))
            }
            PasswordAction::Decrypt => Ok(VerificationOutcome::Rejected {
                error: "Invalid password".to_string(),
            }),
        }
    }

    async fn create_version(
        &self,
        parent_id: &str,
        payload: &CreateSnippetPayload,
    ) -> ClientResult<CreateSnippetResponse> {
        let mut store = self.lock();
        let parent = store.record(parent_id)?.clone();
        let record = store.insert(payload, Some(&parent))?;
        Ok(created(&record))
    }

    async fn get_versions(&self, id: &str) -> ClientResult<Vec<SnippetVersion>> {
        let store = self.lock();
        let root = store.record(id)?.root.clone();
        Ok(store.lineage(&root))
    }

    async fn get_diff(&self, source_id: &str, target_id: &str) -> ClientResult<DiffResponse> {
        let store = self.lock();
        let source = store.record(source_id)?;
        let target = store.record(target_id)?;
        let diff_content = TextDiff::from_lines(&source.content, &target.content)
            .unified_diff()
            .header(source_id, target_id)
            .to_string();

        Ok(DiffResponse {
            id: format!("diff-{}-{}", source_id, target_id),
            source_snippet: source_id.to_string(),
            target_snippet: target_id.to_string(),
            diff_content,
            created_at: Utc::now(),
        })
    }

    async fn get_stats(&self) -> ClientResult<Value> {
        let store = self.lock();
        let total_views: u64 = store.records.values().map(|r| r.view_count).sum();
        Ok(json!({
            "total_snippets": store.records.len(),
            "total_views": total_views,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(content: &str) -> CreateSnippetPayload {
        CreateSnippetPayload {
            content: content.to_string(),
            language: "python".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_access_gate_opens_after_check() {
        let service = InMemorySnippetService::new();
        let created = service
            .create(&CreateSnippetPayload {
                password: Some("pw".into()),
                ..payload("print(1)")
            })
            .await
            .unwrap();

        let err = service
            .get_by_id(&created.id, &created.access_token)
            .await
            .unwrap_err();
        assert!(err.requires_password());

        let check = PasswordVerificationPayload::new(PasswordAction::CheckPassword, "pw");
        assert_eq!(
            service.verify_password(&created.id, &check).await.unwrap(),
            VerificationOutcome::Verified(true)
        );
        let outcome = service
            .get_by_id(&created.id, &created.access_token)
            .await
            .unwrap();
        assert!(matches!(outcome, FetchOutcome::Content(s) if s.content == "print(1)"));
    }

    #[tokio::test]
    async fn test_encrypt_without_password_is_rejected() {
        let service = InMemorySnippetService::new();
        let err = service
            .create(&CreateSnippetPayload {
                encrypt_content: true,
                ..payload("x")
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(service.is_empty());
    }

    #[tokio::test]
    async fn test_one_time_view_disappears() {
        let service = InMemorySnippetService::new();
        let created = service
            .create(&CreateSnippetPayload {
                one_time_view: true,
                ..payload("once")
            })
            .await
            .unwrap();

        assert!(service.get_by_id(&created.id, &created.access_token).await.is_ok());
        let err = service
            .get_by_id(&created.id, &created.access_token)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_versions_and_diff() {
        let service = InMemorySnippetService::new();
        let first = service.create(&payload("a\nb\n")).await.unwrap();
        let second = service
            .create_version(&first.id, &payload("a\nc\n"))
            .await
            .unwrap();
        assert_eq!(second.version, 2);

        let versions = service.get_versions(&second.id).await.unwrap();
        let ids: Vec<&str> = versions.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec![first.id.as_str(), second.id.as_str()]);

        let diff = service.get_diff(&first.id, &second.id).await.unwrap();
        assert!(diff.diff_content.contains("-b"));
        assert!(diff.diff_content.contains("+c"));
    }
}
