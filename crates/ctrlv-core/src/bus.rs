//! Event bus for notifications and navigation requests.
//!
//! Controllers never talk to the terminal or a router directly. They publish
//! typed events here and whatever front end is attached decides how to show
//! them.
//!
//! # Example
//!
//! ```ignore
//! let bus = Bus::new();
//!
//! let mut rx = bus.subscribe::<Notification>().await;
//! tokio::spawn(async move {
//!     while let Ok(note) = rx.recv().await {
//!         eprintln!("{}", note.title);
//!     }
//! });
//!
//! bus.publish(Notification::info("Access granted", None)).await;
//! ```

use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::RwLock;
use tracing::trace;

use crate::route::Route;

/// Default channel capacity.
const DEFAULT_CAPACITY: usize = 256;

/// Trait for events that can be published on the bus.
pub trait Event: Clone + Send + Sync + 'static {
    /// Event type name for logging.
    fn event_type() -> &'static str;
}

/// The event bus for pub/sub communication.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<BusInner>,
}

struct BusInner {
    /// Typed channels by TypeId.
    channels: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                channels: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Publish an event to the subscribers of its type.
    pub async fn publish<E: Event>(&self, event: E) {
        let type_id = TypeId::of::<E>();

        let channels = self.inner.channels.read().await;
        let Some(tx) = channels
            .get(&type_id)
            .and_then(|sender| sender.downcast_ref::<broadcast::Sender<E>>())
        else {
            trace!(event = E::event_type(), "no subscribers");
            return;
        };
        // No receivers is fine.
        let receivers = tx.send(event).unwrap_or(0);
        trace!(event = E::event_type(), receivers, "published");
    }

    /// Subscribe to events of type E.
    pub async fn subscribe<E: Event>(&self) -> broadcast::Receiver<E> {
        let type_id = TypeId::of::<E>();

        {
            let channels = self.inner.channels.read().await;
            if let Some(sender) = channels.get(&type_id) {
                if let Some(tx) = sender.downcast_ref::<broadcast::Sender<E>>() {
                    return tx.subscribe();
                }
            }
        }

        let mut channels = self.inner.channels.write().await;
        // Another subscriber may have raced us here.
        if let Some(tx) = channels
            .get(&type_id)
            .and_then(|sender| sender.downcast_ref::<broadcast::Sender<E>>())
        {
            return tx.subscribe();
        }
        let (tx, rx) = broadcast::channel::<E>(DEFAULT_CAPACITY);
        channels.insert(type_id, Box::new(tx));
        rx
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Event Types
// ============================================================================

/// How prominently a notification should be shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    #[default]
    Default,
    /// Something went wrong.
    Destructive,
}

/// A short user-facing message (a toast in a graphical front end).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub variant: NotificationVariant,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            title: title.into(),
            description: description.map(str::to_string),
            variant: NotificationVariant::Default,
        }
    }

    pub fn error(title: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            title: title.into(),
            description: description.map(str::to_string),
            variant: NotificationVariant::Destructive,
        }
    }

    pub fn is_error(&self) -> bool {
        self.variant == NotificationVariant::Destructive
    }
}

impl Event for Notification {
    fn event_type() -> &'static str {
        "notification"
    }
}

/// A request to move the user to another route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationRequested {
    pub route: Route,
}

impl Event for NavigationRequested {
    fn event_type() -> &'static str {
        "navigation.requested"
    }
}

/// A snippet or version was created and is ready to share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetShared {
    pub id: String,
    pub url: String,
    pub version: u32,
}

impl Event for SnippetShared {
    fn event_type() -> &'static str {
        "snippet.shared"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = Bus::new();
        let mut rx = bus.subscribe::<Notification>().await;

        bus.publish(Notification::info("Access granted", None)).await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.title, "Access granted");
        assert!(!event.is_error());
    }

    #[tokio::test]
    async fn test_events_are_routed_by_type() {
        let bus = Bus::new();
        let mut notes = bus.subscribe::<Notification>().await;
        let mut navigation = bus.subscribe::<NavigationRequested>().await;

        bus.publish(NavigationRequested {
            route: Route::Create,
        })
        .await;

        assert_eq!(navigation.recv().await.unwrap().route, Route::Create);
        assert!(matches!(
            notes.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = Bus::new();
        let mut rx1 = bus.subscribe::<Notification>().await;
        let mut rx2 = bus.subscribe::<Notification>().await;

        bus.publish(Notification::error("Failed to share", Some("Please try again later.")))
            .await;

        assert!(rx1.recv().await.unwrap().is_error());
        assert_eq!(
            rx2.recv().await.unwrap().description.as_deref(),
            Some("Please try again later.")
        );
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = Bus::new();
        bus.publish(SnippetShared {
            id: "a".into(),
            url: "http://x/s/a?token=t".into(),
            version: 1,
        })
        .await;
    }
}
