//! Content snapshots and version records for folio.
//!
//! This crate provides the data model shared by every other folio crate:
//! - Typed snapshots of editable content (blog posts, portfolio items, roadmap items)
//! - Version records as persisted by a version store
//! - A field-level diff engine between two snapshots or versions
//!
//! # Example
//!
//! ```
//! use folio_snapshot::{diff_snapshots, BlogPost, ChangeType, ContentSnapshot};
//!
//! let before = ContentSnapshot::Blog(BlogPost {
//!     title: "Hello".to_string(),
//!     ..Default::default()
//! });
//! let after = ContentSnapshot::Blog(BlogPost {
//!     title: "Hello, world".to_string(),
//!     ..Default::default()
//! });
//!
//! let changes = diff_snapshots(&before, &after);
//! assert_eq!(changes.len(), 1);
//! assert_eq!(changes[0].field, "title");
//! assert_eq!(changes[0].change_type, ChangeType::Modified);
//! ```

mod diff;
mod error;
mod snapshot;
mod version;

pub use diff::{diff_fields, diff_snapshots, diff_versions, ChangeType, VersionChange, VersionDiff};
pub use error::{SnapshotError, SnapshotResult};
pub use snapshot::{
    BlogPost, ContentKey, ContentSnapshot, ContentType, PortfolioItem, PublishStatus,
    RoadmapItem, RoadmapStatus, SeoMetadata,
};
pub use version::{ContentVersion, NewVersion};
