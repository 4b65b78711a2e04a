//! Client for the ctrlv snippet service.
//!
//! This crate is a typed wrapper around the service's HTTP contract:
//! - Wire types and reply classification (`types`)
//! - The [`SnippetService`] trait other crates program against
//! - [`SnippetClient`], the reqwest implementation
//!
//! It holds no state beyond the HTTP connection pool and never retries.

pub mod error;
pub mod http;
pub mod service;
pub mod types;

pub use error::{ClientError, ClientResult};
pub use http::{SnippetClient, DEFAULT_API_PREFIX, DEFAULT_API_URL, DEFAULT_TIMEOUT};
pub use service::{SharedSnippetService, SnippetService};
pub use types::{
    CreateSnippetPayload, CreateSnippetResponse, DiffResponse, FetchOutcome, PasswordAction,
    PasswordVerificationPayload, Snippet, SnippetVersion, VerificationOutcome,
};
