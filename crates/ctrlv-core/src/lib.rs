//! Core logic for ctrlv.
//!
//! This crate contains the snippet workflows that sit between the service
//! client and a front end:
//! - Snippet access resolution with password and decryption gates
//! - Sharing new snippets and new versions
//! - Version navigation and diffs
//! - Configuration and the notification bus

pub mod access;
pub mod bus;
pub mod config;
pub mod error;
pub mod route;
pub mod share;
pub mod versions;

pub use access::{AccessController, AccessError, AccessState, FailureReason, PasswordPrompt};
pub use bus::{
    Bus, Event, NavigationRequested, Notification, NotificationVariant, SnippetShared,
};
pub use config::Config;
pub use error::{ConfigError, CoreError, CoreResult, SnippetError};
pub use route::{share_link, Route, SnippetRef};
pub use share::{Expiration, ShareComposer, ShareError, ShareOptions, SharedSnippet};
pub use versions::{DiffState, DiffView, NavigatorError, VersionNavigator};
