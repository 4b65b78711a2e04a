//! Testing utilities, fixtures, and mocks for ctrlv.
//!
//! - **Mocks**: [`MockSnippetService`], a scripted service that records every
//!   call and can hold fetch replies back to exercise racing loads
//! - **Fake**: [`InMemorySnippetService`], a small stateful service with real
//!   password gates, lineages and diffs
//! - **Builders**: fixed-time snippet fixtures
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use ctrlv_client::FetchOutcome;
//! use ctrlv_test_utils::{builders::SnippetBuilder, MockSnippetService};
//!
//! #[tokio::test]
//! async fn test_resolves() {
//!     let service = MockSnippetService::new().with_fetch(
//!         "abc",
//!         Ok(FetchOutcome::Content(SnippetBuilder::new("abc").content("print(1)").build())),
//!     );
//!     // Hand `Arc::new(service.clone())` to the code under test.
//!     assert_eq!(service.fetch_count(), 0);
//! }
//! ```

pub mod builders;
pub mod fake;
pub mod mocks;

// Re-export commonly used items
pub use builders::SnippetBuilder;
pub use fake::InMemorySnippetService;
pub use mocks::{FetchGate, MockCall, MockSnippetService};
