//! Persisted version records.

use crate::{ContentKey, ContentSnapshot, ContentType, SnapshotError, SnapshotResult};
use chrono::{DateTime, Utc};
use folio_util::Identifier;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One persisted snapshot of an editable entity.
///
/// Versions are immutable once created. `version_number` is assigned by the
/// store and strictly increases within a `(content_type, content_id)` partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentVersion {
    pub id: String,
    pub content_type: ContentType,
    pub content_id: String,
    pub version_number: u32,
    /// Full field set of the entity at this point in time.
    pub content_snapshot: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_summary: Option<String>,
    pub is_auto_save: bool,
    pub created_at: DateTime<Utc>,
    /// Identifier or email of the actor that produced the version.
    pub created_by: String,
}

impl ContentVersion {
    /// The partition this version belongs to.
    pub fn key(&self) -> ContentKey {
        ContentKey::new(self.content_type, self.content_id.clone())
    }

    /// Decode the stored payload into a typed snapshot.
    pub fn snapshot(&self) -> SnapshotResult<ContentSnapshot> {
        ContentSnapshot::from_fields(self.content_type, &self.content_snapshot)
    }

    /// Raw field map. A malformed payload yields no fields.
    pub fn fields(&self) -> Map<String, Value> {
        match &self.content_snapshot {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        }
    }

    /// Short label used in history listings, e.g. `v4 (auto-save)`.
    pub fn label(&self) -> String {
        if self.is_auto_save {
            format!("v{} (auto-save)", self.version_number)
        } else {
            format!("v{}", self.version_number)
        }
    }
}

/// Request to create a version; the store assigns number, id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVersion {
    pub key: ContentKey,
    pub snapshot: ContentSnapshot,
    pub change_summary: Option<String>,
    pub is_auto_save: bool,
    pub created_by: String,
}

impl NewVersion {
    /// A manually triggered version.
    pub fn manual(
        key: ContentKey,
        snapshot: ContentSnapshot,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            key,
            snapshot,
            change_summary: None,
            is_auto_save: false,
            created_by: created_by.into(),
        }
    }

    /// An automatically captured draft.
    pub fn auto_save(
        key: ContentKey,
        snapshot: ContentSnapshot,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            is_auto_save: true,
            ..Self::manual(key, snapshot, created_by)
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        let summary = summary.into();
        self.change_summary = (!summary.trim().is_empty()).then_some(summary);
        self
    }

    /// Check that the snapshot follows the schema of its partition.
    pub fn validate(&self) -> SnapshotResult<()> {
        let actual = self.snapshot.content_type();
        if actual != self.key.content_type {
            return Err(SnapshotError::TypeMismatch {
                expected: self.key.content_type,
                actual,
            });
        }
        Ok(())
    }

    /// Materialize the record with the number assigned by the store.
    pub fn into_version(self, version_number: u32) -> ContentVersion {
        let content_snapshot = Value::Object(self.snapshot.fields());
        ContentVersion {
            id: Identifier::version(),
            content_type: self.key.content_type,
            content_id: self.key.content_id,
            version_number,
            content_snapshot,
            change_summary: self.change_summary,
            is_auto_save: self.is_auto_save,
            created_at: Utc::now(),
            created_by: self.created_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlogPost, RoadmapItem};
    use serde_json::json;

    fn blog_key() -> ContentKey {
        ContentKey::new(ContentType::Blog, "blg_1")
    }

    fn blog(title: &str) -> ContentSnapshot {
        ContentSnapshot::Blog(BlogPost {
            title: title.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_into_version_assigns_metadata() {
        let version = NewVersion::auto_save(blog_key(), blog("Draft"), "editor@example.com")
            .into_version(3);

        assert!(version.id.starts_with("ver_"));
        assert_eq!(version.version_number, 3);
        assert!(version.is_auto_save);
        assert_eq!(version.content_snapshot["title"], "Draft");
        assert_eq!(version.key(), blog_key());
        assert_eq!(version.snapshot().unwrap(), blog("Draft"));
        assert_eq!(version.label(), "v3 (auto-save)");
    }

    #[test]
    fn test_validate_rejects_type_mismatch() {
        let request = NewVersion::manual(
            blog_key(),
            ContentSnapshot::Roadmap(RoadmapItem::default()),
            "editor",
        );
        assert!(matches!(
            request.validate(),
            Err(SnapshotError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_blank_summary_is_dropped() {
        let request = NewVersion::manual(blog_key(), blog("A"), "editor").with_summary("   ");
        assert_eq!(request.change_summary, None);

        let request = NewVersion::manual(blog_key(), blog("A"), "editor").with_summary("Fix typo");
        assert_eq!(request.change_summary.as_deref(), Some("Fix typo"));
    }

    #[test]
    fn test_malformed_payload_has_no_fields() {
        let mut version = NewVersion::manual(blog_key(), blog("A"), "editor").into_version(1);
        version.content_snapshot = json!(null);
        assert!(version.fields().is_empty());
        assert!(version.snapshot().is_err());
    }

    #[test]
    fn test_record_wire_shape() {
        let version = NewVersion::manual(blog_key(), blog("A"), "editor").into_version(1);
        let value = serde_json::to_value(&version).unwrap();
        for field in [
            "id",
            "content_type",
            "content_id",
            "version_number",
            "content_snapshot",
            "is_auto_save",
            "created_at",
            "created_by",
        ] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
        assert!(value.get("change_summary").is_none());
    }
}
