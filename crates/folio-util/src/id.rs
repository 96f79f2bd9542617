//! ULID-based identifier generation with prefixes.
//!
//! Identifiers in folio follow the pattern `prefix_ulid`, for example
//! `ver_01hqxyz...` for a content version or `blg_01hqxyz...` for a blog post.

use ulid::Ulid;

/// Known identifier prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPrefix {
    Version,
    Blog,
    Portfolio,
    Roadmap,
}

impl IdPrefix {
    /// Get the string prefix for this identifier type.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdPrefix::Version => "ver",
            IdPrefix::Blog => "blg",
            IdPrefix::Portfolio => "pfl",
            IdPrefix::Roadmap => "rdm",
        }
    }
}

/// Identifier generation.
pub struct Identifier;

impl Identifier {
    /// Generate a new identifier. Later identifiers sort after earlier ones.
    pub fn ascending(prefix: IdPrefix) -> String {
        format!("{}_{}", prefix.as_str(), Ulid::new().to_string().to_lowercase())
    }

    /// Generate a content version ID.
    pub fn version() -> String {
        Self::ascending(IdPrefix::Version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_id_shape() {
        let id = Identifier::version();
        assert!(id.starts_with("ver_"));
        assert_eq!(id.len(), 30); // "ver_" (4) + ULID (26)
    }

    #[test]
    fn test_ascending_order() {
        let id1 = Identifier::ascending(IdPrefix::Blog);
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = Identifier::ascending(IdPrefix::Blog);
        assert!(id1 < id2, "IDs should increase over time");
    }

    #[test]
    fn test_prefixes_are_distinct() {
        let prefixes = [
            IdPrefix::Version,
            IdPrefix::Blog,
            IdPrefix::Portfolio,
            IdPrefix::Roadmap,
        ];
        for (i, a) in prefixes.iter().enumerate() {
            for b in &prefixes[i + 1..] {
                assert_ne!(a.as_str(), b.as_str());
            }
        }
    }

    #[test]
    fn test_identifier_body_is_lowercase_ulid() {
        let id = Identifier::ascending(IdPrefix::Blog);
        let (prefix, body) = id.split_once('_').unwrap();
        assert_eq!(prefix, "blg");
        assert_eq!(body, body.to_lowercase());
        assert!(Ulid::from_string(body).is_ok());
    }
}
