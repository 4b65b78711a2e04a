//! Creating snippets and new versions.

use chrono::{DateTime, Utc};
use ctrlv_client::{ClientError, CreateSnippetPayload, SharedSnippetService};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bus::{Bus, Notification, SnippetShared};
use crate::route::share_link;

/// How long a shared snippet lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Expiration {
    OneHour,
    #[default]
    OneDay,
    OneWeek,
    Minutes(u32),
}

impl Expiration {
    pub fn minutes(&self) -> u32 {
        match self {
            Expiration::OneHour => 60,
            Expiration::OneDay => 1440,
            Expiration::OneWeek => 10080,
            Expiration::Minutes(minutes) => *minutes,
        }
    }
}

impl fmt::Display for Expiration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expiration::OneHour => f.write_str("1h"),
            Expiration::OneDay => f.write_str("24h"),
            Expiration::OneWeek => f.write_str("7d"),
            Expiration::Minutes(minutes) => write!(f, "{}m", minutes),
        }
    }
}

impl FromStr for Expiration {
    type Err = ShareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "1h" => Ok(Expiration::OneHour),
            "24h" | "1d" => Ok(Expiration::OneDay),
            "7d" | "1w" => Ok(Expiration::OneWeek),
            other => other
                .trim_end_matches('m')
                .parse::<u32>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .map(Expiration::Minutes)
                .ok_or_else(|| {
                    ShareError::Validation(format!(
                        "Unknown expiration {:?}, use 1h, 24h, 7d or a number of minutes",
                        s
                    ))
                }),
        }
    }
}

/// Everything the share dialog collects.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ShareOptions {
    pub content: String,
    pub language: String,
    pub expiration: Expiration,
    pub one_time_view: bool,
    pub encrypt: bool,
    pub password: Option<String>,
    /// Lineage to extend when `is_new_version` is set.
    pub parent_id: Option<String>,
    pub is_new_version: bool,
}

impl fmt::Debug for ShareOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareOptions")
            .field("content_len", &self.content.len())
            .field("language", &self.language)
            .field("expiration", &self.expiration)
            .field("one_time_view", &self.one_time_view)
            .field("encrypt", &self.encrypt)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("parent_id", &self.parent_id)
            .field("is_new_version", &self.is_new_version)
            .finish()
    }
}

/// A snippet that was just created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedSnippet {
    pub id: String,
    pub access_token: String,
    /// Link to hand out: `{origin}/s/{id}?token={access_token}`.
    pub url: String,
    pub expires_at: DateTime<Utc>,
    pub version: u32,
}

#[derive(Debug, Clone, Error)]
pub enum ShareError {
    /// Rejected before anything was sent.
    #[error("{0}")]
    Validation(String),

    #[error("Failed to share: {0}")]
    Failed(#[source] ClientError),
}

/// Builds create requests and sends them.
pub struct ShareComposer {
    service: SharedSnippetService,
    bus: Bus,
    origin: String,
}

impl ShareComposer {
    pub fn new(service: SharedSnippetService, bus: Bus, origin: impl Into<String>) -> Self {
        Self {
            service,
            bus,
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }

    /// Validate `options` and turn them into a request body.
    pub fn compose(options: &ShareOptions) -> Result<CreateSnippetPayload, ShareError> {
        if options.content.trim().is_empty() {
            return Err(ShareError::Validation("Enter some code first".to_string()));
        }

        let password = options.password.clone().filter(|p| !p.is_empty());
        if options.encrypt && password.is_none() {
            return Err(ShareError::Validation(
                "A password is required to encrypt a snippet".to_string(),
            ));
        }

        let parent_id = match (&options.parent_id, options.is_new_version) {
            (Some(parent), true) => Some(parent.clone()),
            _ => None,
        };

        Ok(CreateSnippetPayload {
            content: options.content.clone(),
            language: options.language.clone(),
            expiration_minutes: Some(options.expiration.minutes()),
            one_time_view: options.one_time_view,
            encrypt_content: options.encrypt,
            password,
            parent_id,
        })
    }

    /// Create the snippet, or a new version of `parent_id`.
    ///
    /// Validation failures never reach the service. Service failures publish
    /// a notification and return [`ShareError::Failed`].
    pub async fn share(&self, options: &ShareOptions) -> Result<SharedSnippet, ShareError> {
        let payload = Self::compose(options)?;

        let created = match &payload.parent_id {
            Some(parent_id) => {
                debug!(parent_id = %parent_id, "sharing new version");
                self.service.create_version(parent_id, &payload).await
            }
            None => {
                debug!(language = %payload.language, "sharing new snippet");
                self.service.create(&payload).await
            }
        };

        let created = match created {
            Ok(created) => created,
            Err(err) => {
                warn!("share failed: {}", err);
                self.bus
                    .publish(Notification::error(
                        "Failed to share",
                        Some("Please try again later."),
                    ))
                    .await;
                return Err(ShareError::Failed(err));
            }
        };

        let url = share_link(&self.origin, &created.id, &created.access_token);
        info!(id = %created.id, version = created.version, "snippet shared");
        self.bus
            .publish(SnippetShared {
                id: created.id.clone(),
                url: url.clone(),
                version: created.version,
            })
            .await;

        Ok(SharedSnippet {
            id: created.id,
            access_token: created.access_token,
            url,
            expires_at: created.expires_at,
            version: created.version,
        })
    }
}
