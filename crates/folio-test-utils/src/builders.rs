//! Builder patterns for constructing test snapshots.

use chrono::{DateTime, Utc};
use folio_snapshot::{BlogPost, ContentSnapshot, PublishStatus, RoadmapItem, RoadmapStatus};

/// Builder for blog post snapshots.
///
/// # Example
///
/// ```rust
/// use folio_test_utils::builders::BlogPostBuilder;
///
/// let snapshot = BlogPostBuilder::new()
///     .title("Release notes")
///     .tag("changelog")
///     .build();
///
/// assert_eq!(snapshot.title(), "Release notes");
/// ```
#[derive(Default)]
pub struct BlogPostBuilder {
    post: BlogPost,
}

impl BlogPostBuilder {
    /// Create a builder for an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title and derive the slug from it.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.post.title = title.into();
        self.post.slug = self
            .post
            .title
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");
        self
    }

    pub fn excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.post.excerpt = excerpt.into();
        self
    }

    pub fn body(mut self, html: impl Into<String>) -> Self {
        self.post.content = html.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.post.category = Some(category.into());
        self
    }

    /// Add a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.post.tags.push(tag.into());
        self
    }

    pub fn meta_title(mut self, meta_title: impl Into<String>) -> Self {
        self.post.seo.meta_title = meta_title.into();
        self
    }

    /// Mark as published at the given time.
    pub fn published_at(mut self, at: DateTime<Utc>) -> Self {
        self.post.status = PublishStatus::Published;
        self.post.published_at = Some(at);
        self
    }

    /// Build the typed post.
    pub fn build_post(self) -> BlogPost {
        self.post
    }

    /// Build the snapshot.
    pub fn build(self) -> ContentSnapshot {
        ContentSnapshot::Blog(self.post)
    }
}

/// Builder for roadmap item snapshots.
#[derive(Default)]
pub struct RoadmapItemBuilder {
    item: RoadmapItem,
}

impl RoadmapItemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.item.title = title.into();
        self
    }

    pub fn quarter(mut self, quarter: impl Into<String>) -> Self {
        self.item.quarter = Some(quarter.into());
        self
    }

    pub fn status(mut self, status: RoadmapStatus) -> Self {
        self.item.status = status;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.item.priority = priority;
        self
    }

    pub fn build(self) -> ContentSnapshot {
        ContentSnapshot::Roadmap(self.item)
    }
}
