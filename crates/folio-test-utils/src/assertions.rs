//! Assertion helpers for diff output.

use folio_snapshot::{ChangeType, VersionChange};

/// Assert that `changes` lists exactly these fields, in order, with these kinds.
///
/// # Example
///
/// ```rust
/// use folio_snapshot::{diff_snapshots, ChangeType};
/// use folio_test_utils::{assert_changes, BlogPostBuilder};
///
/// let before = BlogPostBuilder::new().title("A").build();
/// let after = BlogPostBuilder::new().title("A").tag("x").build();
///
/// assert_changes(&diff_snapshots(&before, &after), &[("tags", ChangeType::Modified)]);
/// ```
pub fn assert_changes(changes: &[VersionChange], expected: &[(&str, ChangeType)]) {
    let actual: Vec<(&str, ChangeType)> = changes
        .iter()
        .map(|c| (c.field.as_str(), c.change_type))
        .collect();

    assert_eq!(
        actual, expected,
        "Unexpected changes.\nExpected: {:?}\nActual: {:#?}",
        expected, changes
    );
}
