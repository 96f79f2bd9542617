//! Snapshot data structures.

use crate::{SnapshotError, SnapshotResult};
use chrono::{DateTime, Utc};
use folio_util::{IdPrefix, Identifier};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Discriminator identifying which schema a snapshot follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Blog,
    Portfolio,
    Roadmap,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Blog => "blog",
            ContentType::Portfolio => "portfolio",
            ContentType::Roadmap => "roadmap",
        }
    }

    /// Identifier prefix used for entities of this type.
    pub fn id_prefix(&self) -> IdPrefix {
        match self {
            ContentType::Blog => IdPrefix::Blog,
            ContentType::Portfolio => IdPrefix::Portfolio,
            ContentType::Roadmap => IdPrefix::Roadmap,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blog" => Ok(ContentType::Blog),
            "portfolio" => Ok(ContentType::Portfolio),
            "roadmap" => Ok(ContentType::Roadmap),
            _ => Err(SnapshotError::UnknownContentType(s.to_string())),
        }
    }
}

/// Identifies a version partition: one editable entity of one content type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentKey {
    pub content_type: ContentType,
    pub content_id: String,
}

impl ContentKey {
    pub fn new(content_type: ContentType, content_id: impl Into<String>) -> Self {
        Self {
            content_type,
            content_id: content_id.into(),
        }
    }

    /// Allocate a key with a fresh entity identifier.
    pub fn generate(content_type: ContentType) -> Self {
        Self::new(content_type, Identifier::ascending(content_type.id_prefix()))
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.content_type, self.content_id)
    }
}

/// Publication state shared by blog posts and portfolio items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// Search metadata attached to a blog post.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoMetadata {
    pub meta_title: String,
    pub meta_description: String,
    pub keywords: Vec<String>,
}

/// Editable fields of a blog post.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogPost {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    /// Rich text body as produced by the editor (HTML).
    pub content: String,
    pub featured_image: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub status: PublishStatus,
    pub seo: SeoMetadata,
    pub published_at: Option<DateTime<Utc>>,
}

/// Editable fields of a portfolio entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioItem {
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub description: String,
    pub cover_image: Option<String>,
    pub gallery: Vec<String>,
    pub technologies: Vec<String>,
    pub project_url: Option<String>,
    pub repository_url: Option<String>,
    pub featured: bool,
    pub status: PublishStatus,
}

/// Progress of a roadmap item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadmapStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
}

/// Editable fields of a roadmap item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadmapItem {
    pub title: String,
    pub description: String,
    /// Target quarter, e.g. `2025-Q3`.
    pub quarter: Option<String>,
    pub status: RoadmapStatus,
    pub priority: i32,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

/// A full-field copy of an editable entity, tagged by content type.
///
/// Serialized as `{"content_type": "...", "content_snapshot": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "content_type",
    content = "content_snapshot",
    rename_all = "lowercase"
)]
pub enum ContentSnapshot {
    Blog(BlogPost),
    Portfolio(PortfolioItem),
    Roadmap(RoadmapItem),
}

impl ContentSnapshot {
    /// A snapshot with every field at its empty default.
    pub fn empty(content_type: ContentType) -> Self {
        match content_type {
            ContentType::Blog => ContentSnapshot::Blog(BlogPost::default()),
            ContentType::Portfolio => ContentSnapshot::Portfolio(PortfolioItem::default()),
            ContentType::Roadmap => ContentSnapshot::Roadmap(RoadmapItem::default()),
        }
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            ContentSnapshot::Blog(_) => ContentType::Blog,
            ContentSnapshot::Portfolio(_) => ContentType::Portfolio,
            ContentSnapshot::Roadmap(_) => ContentType::Roadmap,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ContentSnapshot::Blog(post) => &post.title,
            ContentSnapshot::Portfolio(item) => &item.title,
            ContentSnapshot::Roadmap(item) => &item.title,
        }
    }

    /// Flatten into a field map in schema order.
    pub fn fields(&self) -> Map<String, Value> {
        let value = match self {
            ContentSnapshot::Blog(post) => serde_json::to_value(post),
            ContentSnapshot::Portfolio(item) => serde_json::to_value(item),
            ContentSnapshot::Roadmap(item) => serde_json::to_value(item),
        };

        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Decode and validate a raw field map for the given content type.
    ///
    /// Absent fields take their empty default. Non-object payloads and
    /// fields of the wrong shape are rejected.
    pub fn from_fields(content_type: ContentType, fields: &Value) -> SnapshotResult<Self> {
        if !fields.is_object() {
            return Err(SnapshotError::invalid(
                content_type,
                "snapshot payload must be a JSON object",
            ));
        }

        let decoded = match content_type {
            ContentType::Blog => serde_json::from_value(fields.clone()).map(ContentSnapshot::Blog),
            ContentType::Portfolio => {
                serde_json::from_value(fields.clone()).map(ContentSnapshot::Portfolio)
            }
            ContentType::Roadmap => {
                serde_json::from_value(fields.clone()).map(ContentSnapshot::Roadmap)
            }
        };

        decoded.map_err(|e| SnapshotError::invalid(content_type, e.to_string()))
    }
}
