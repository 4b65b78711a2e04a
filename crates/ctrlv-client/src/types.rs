//! Wire types for the snippet service.
//!
//! The fetch and verify endpoints answer with several shapes on the same
//! route. Those replies are classified here into [`FetchOutcome`] and
//! [`VerificationOutcome`] so that a [`Snippet`] value always means
//! "content the caller may show".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::ClientResult;

fn first_version() -> u32 {
    1
}

/// A missing key and an explicit `null` both read as an empty string.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A snippet as returned by the service.
///
/// For a decrypt challenge `content` holds whatever placeholder the service
/// sent (usually empty) while the metadata is real.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub language: String,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    #[serde(default)]
    pub view_count: u64,

    #[serde(default)]
    pub one_time_view: bool,

    #[serde(default)]
    pub is_encrypted: bool,

    #[serde(default = "first_version")]
    pub version: u32,

    /// Every version of this snippet's lineage, in insertion order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<Vec<SnippetVersion>>,
}

impl Snippet {
    /// Whether the lineage has more than one version to navigate between.
    pub fn has_versions(&self) -> bool {
        self.versions.as_ref().is_some_and(|v| v.len() > 1)
    }

    /// The lineage ordered by version ordinal.
    pub fn lineage(&self) -> Vec<SnippetVersion> {
        let mut versions = self.versions.clone().unwrap_or_default();
        versions.sort_by_key(|v| v.version);
        versions
    }
}

/// One entry of a snippet lineage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetVersion {
    pub id: String,
    /// Ordinal within the lineage, starting at 1. Authoritative for ordering.
    pub version: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub language: String,
}

/// Result of reading a snippet by id and token.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Full content is available.
    Content(Snippet),
    /// An access password must be checked before anything is sent.
    AccessChallenge,
    /// Metadata is visible but the content needs a decryption password.
    DecryptChallenge(Snippet),
}

impl FetchOutcome {
    /// Classify a fetch reply body.
    pub fn from_value(value: Value) -> ClientResult<Self> {
        if flag(&value, "requires_password") {
            return Ok(FetchOutcome::AccessChallenge);
        }
        let needs_decryption = flag(&value, "needs_decryption");
        let snippet: Snippet = serde_json::from_value(value)?;
        if needs_decryption {
            Ok(FetchOutcome::DecryptChallenge(snippet))
        } else {
            Ok(FetchOutcome::Content(snippet))
        }
    }
}

/// Which password gate a verification request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordAction {
    /// Access gate: the content is withheld entirely.
    CheckPassword,
    /// Decrypt gate: the content is encrypted at rest.
    Decrypt,
}

impl PasswordAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PasswordAction::CheckPassword => "check_password",
            PasswordAction::Decrypt => "decrypt",
        }
    }
}

/// Body of a password verification request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordVerificationPayload {
    pub action: PasswordAction,
    pub password: String,
}

impl PasswordVerificationPayload {
    pub fn new(action: PasswordAction, password: impl Into<String>) -> Self {
        Self {
            action,
            password: password.into(),
        }
    }
}

impl fmt::Debug for PasswordVerificationPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordVerificationPayload")
            .field("action", &self.action)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Result of a password verification.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    /// Access gate answer.
    Verified(bool),
    /// Decrypt gate success: the content is now plaintext.
    Resolved(Snippet),
    /// The service refused the attempt (wrong password, expired token, ...).
    Rejected { error: String },
}

impl VerificationOutcome {
    /// Classify a verification reply body.
    ///
    /// A snippet that still carries a challenge marker means the password was
    /// not accepted.
    pub fn from_value(value: Value) -> ClientResult<Self> {
        if let Some(error) = value.get("error").and_then(Value::as_str) {
            return Ok(VerificationOutcome::Rejected {
                error: error.to_string(),
            });
        }
        if value.get("content").is_none() {
            if let Some(verified) = value.get("verified").and_then(Value::as_bool) {
                return Ok(VerificationOutcome::Verified(verified));
            }
        }
        match FetchOutcome::from_value(value)? {
            FetchOutcome::Content(snippet) => Ok(VerificationOutcome::Resolved(snippet)),
            FetchOutcome::AccessChallenge | FetchOutcome::DecryptChallenge(_) => {
                Ok(VerificationOutcome::Verified(false))
            }
        }
    }
}

/// Body of a create-snippet or create-version request.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSnippetPayload {
    pub content: String,
    pub language: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_minutes: Option<u32>,

    #[serde(default)]
    pub one_time_view: bool,

    #[serde(default)]
    pub encrypt_content: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Set when the request creates a new version of an existing lineage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl fmt::Debug for CreateSnippetPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateSnippetPayload")
            .field("content_len", &self.content.len())
            .field("language", &self.language)
            .field("expiration_minutes", &self.expiration_minutes)
            .field("one_time_view", &self.one_time_view)
            .field("encrypt_content", &self.encrypt_content)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("parent_id", &self.parent_id)
            .finish()
    }
}

/// Reply to a create-snippet or create-version request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSnippetResponse {
    pub id: String,
    pub access_token: String,
    /// Server-side link; clients rebuild it against their own origin.
    #[serde(default)]
    pub sharing_url: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default = "first_version")]
    pub version: u32,
}

/// A server-computed diff between two snippets of one lineage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResponse {
    #[serde(default)]
    pub id: String,
    pub source_snippet: String,
    pub target_snippet: String,
    pub diff_content: String,
    pub created_at: DateTime<Utc>,
}

fn flag(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snippet_json() -> Value {
        json!({
            "id": "abc",
            "content": "print(1)",
            "language": "python",
            "created_at": "2025-03-06T00:00:00Z",
            "expires_at": "2025-03-07T00:00:00Z",
            "view_count": 3,
            "one_time_view": false,
            "is_encrypted": false,
            "version": 2,
            "versions": [
                {"id": "v2", "version": 2, "created_at": "2025-03-06T00:00:00Z", "language": "python"},
                {"id": "v1", "version": 1, "created_at": "2025-03-05T00:00:00Z", "language": "python"}
            ]
        })
    }

    #[test]
    fn test_fetch_outcome_content() {
        let outcome = FetchOutcome::from_value(snippet_json()).unwrap();
        let FetchOutcome::Content(snippet) = outcome else {
            panic!("expected content");
        };
        assert_eq!(snippet.content, "print(1)");
        assert_eq!(snippet.view_count, 3);
        assert!(snippet.has_versions());
    }

    #[test]
    fn test_fetch_outcome_decrypt_challenge_with_null_content() {
        let mut body = snippet_json();
        body["content"] = Value::Null;
        body["language"] = Value::Null;
        body["is_encrypted"] = json!(true);
        body["needs_decryption"] = json!(true);

        let outcome = FetchOutcome::from_value(body).unwrap();
        let FetchOutcome::DecryptChallenge(snippet) = outcome else {
            panic!("expected decrypt challenge, got {:?}", outcome);
        };
        assert_eq!(snippet.content, "");
        assert_eq!(snippet.language, "");
        assert_eq!(snippet.version, 2);
        assert!(snippet.is_encrypted);
    }

    #[test]
    fn test_fetch_outcome_access_challenge_needs_no_metadata() {
        let outcome = FetchOutcome::from_value(json!({"requires_password": true})).unwrap();
        assert_eq!(outcome, FetchOutcome::AccessChallenge);
    }

    #[test]
    fn test_fetch_outcome_false_flags_are_content() {
        let mut body = snippet_json();
        body["requires_password"] = json!(false);
        body["needs_decryption"] = json!(false);
        assert!(matches!(
            FetchOutcome::from_value(body).unwrap(),
            FetchOutcome::Content(_)
        ));
    }

    #[test]
    fn test_fetch_outcome_decrypt_challenge_keeps_metadata() {
        let mut body = snippet_json();
        body["needs_decryption"] = json!(true);
        body["is_encrypted"] = json!(true);
        body.as_object_mut().unwrap().remove("content");

        let FetchOutcome::DecryptChallenge(snippet) = FetchOutcome::from_value(body).unwrap()
        else {
            panic!("expected decrypt challenge");
        };
        assert!(snippet.content.is_empty());
        assert!(snippet.is_encrypted);
        assert_eq!(snippet.version, 2);
    }

    #[test]
    fn test_fetch_outcome_rejects_garbage() {
        assert!(FetchOutcome::from_value(json!({"foo": 1})).is_err());
    }

    #[test]
    fn test_lineage_is_ordered_by_ordinal() {
        let FetchOutcome::Content(snippet) = FetchOutcome::from_value(snippet_json()).unwrap()
        else {
            panic!("expected content");
        };
        let ordinals: Vec<u32> = snippet.lineage().iter().map(|v| v.version).collect();
        assert_eq!(ordinals, vec![1, 2]);
    }

    #[test]
    fn test_verification_outcome_shapes() {
        assert_eq!(
            VerificationOutcome::from_value(json!({"verified": true})).unwrap(),
            VerificationOutcome::Verified(true)
        );
        assert_eq!(
            VerificationOutcome::from_value(json!({"verified": false})).unwrap(),
            VerificationOutcome::Verified(false)
        );
        assert_eq!(
            VerificationOutcome::from_value(json!({"error": "Invalid password"})).unwrap(),
            VerificationOutcome::Rejected {
                error: "Invalid password".to_string()
            }
        );
        assert!(matches!(
            VerificationOutcome::from_value(snippet_json()).unwrap(),
            VerificationOutcome::Resolved(_)
        ));
    }

    #[test]
    fn test_verification_still_gated_is_not_verified() {
        let mut body = snippet_json();
        body["needs_decryption"] = json!(true);
        assert_eq!(
            VerificationOutcome::from_value(body).unwrap(),
            VerificationOutcome::Verified(false)
        );
    }

    #[test]
    fn test_password_action_wire_names() {
        let payload = PasswordVerificationPayload::new(PasswordAction::CheckPassword, "pw");
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"action": "check_password", "password": "pw"})
        );
        assert_eq!(PasswordAction::Decrypt.as_str(), "decrypt");
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let payload = PasswordVerificationPayload::new(PasswordAction::Decrypt, "hunter2");
        assert!(!format!("{:?}", payload).contains("hunter2"));

        let create = CreateSnippetPayload {
            content: "x".into(),
            language: "rust".into(),
            password: Some("hunter2".into()),
            ..Default::default()
        };
        assert!(!format!("{:?}", create).contains("hunter2"));
    }

    #[test]
    fn test_create_payload_skips_unset_options() {
        let payload = CreateSnippetPayload {
            content: "x".into(),
            language: "rust".into(),
            expiration_minutes: Some(60),
            ..Default::default()
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["expiration_minutes"], 60);
        assert!(value.get("password").is_none());
        assert!(value.get("parent_id").is_none());
    }
}
