//! Testing utilities and store doubles for folio.
//!
//! - **Builders**: fluent construction of snapshots
//! - **Mocks**: version stores with failure injection, gating and call recording
//! - **Assertions**: helpers for checking diff output
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use folio_test_utils::{BlogPostBuilder, MockVersionStore};
//!
//! #[tokio::test]
//! async fn test_autosave_retries() {
//!     let store = Arc::new(MockVersionStore::new().failing(1));
//!     let snapshot = BlogPostBuilder::new().title("Draft").tag("news").build();
//!     // Drive an auto-saver against `store`...
//!     assert_eq!(store.create_calls().len(), 2);
//! }
//! ```

pub mod assertions;
pub mod builders;
pub mod mocks;

// Re-export commonly used items
pub use assertions::assert_changes;
pub use builders::{BlogPostBuilder, RoadmapItemBuilder};
pub use mocks::MockVersionStore;
