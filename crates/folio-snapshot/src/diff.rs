//! Field-level diffing between snapshots.
//!
//! A diff is a sparse change set: unchanged fields never appear. `null`, an
//! absent field and `""` are all treated as the same empty state, so optional
//! fields that round-trip through serialization do not produce noise. Nested
//! arrays and objects are compared as whole values.

use crate::{ContentSnapshot, ContentVersion};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use similar::{ChangeTag, TextDiff};

/// Kind of change recorded for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Removed => "removed",
            ChangeType::Modified => "modified",
        }
    }
}

/// One differing field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionChange {
    pub field: String,
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl VersionChange {
    fn added(field: &str, new_value: &Value) -> Self {
        Self {
            field: field.to_string(),
            change_type: ChangeType::Added,
            old_value: None,
            new_value: Some(new_value.clone()),
        }
    }

    fn removed(field: &str, old_value: &Value) -> Self {
        Self {
            field: field.to_string(),
            change_type: ChangeType::Removed,
            old_value: Some(old_value.clone()),
            new_value: None,
        }
    }

    fn modified(field: &str, old_value: &Value, new_value: &Value) -> Self {
        Self {
            field: field.to_string(),
            change_type: ChangeType::Modified,
            old_value: Some(old_value.clone()),
            new_value: Some(new_value.clone()),
        }
    }

    /// The old value as display text.
    pub fn render_old(&self) -> String {
        self.old_value.as_ref().map(render_value).unwrap_or_default()
    }

    /// The new value as display text.
    pub fn render_new(&self) -> String {
        self.new_value.as_ref().map(render_value).unwrap_or_default()
    }

    /// Unified line diff for a modified text field.
    ///
    /// Returns `None` unless both sides are strings.
    pub fn text_diff(&self) -> Option<String> {
        let old = self.old_value.as_ref()?.as_str()?;
        let new = self.new_value.as_ref()?.as_str()?;
        Some(unified_diff(old, new, &self.field))
    }
}

/// Changes between two numbered versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionDiff {
    pub from_version: u32,
    pub to_version: u32,
    pub changes: Vec<VersionChange>,
}

impl VersionDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Names of the changed fields, in diff order.
    pub fn changed_fields(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.field.as_str()).collect()
    }
}

/// Compare two raw field maps.
///
/// Fields are visited in order of first appearance: every field of `from`,
/// then the fields that only exist in `to`.
pub fn diff_fields(from: &Map<String, Value>, to: &Map<String, Value>) -> Vec<VersionChange> {
    let names = from
        .keys()
        .chain(to.keys().filter(|name| !from.contains_key(*name)));

    let mut changes = Vec::new();
    for name in names {
        let old = from.get(name).filter(|v| !is_empty(v));
        let new = to.get(name).filter(|v| !is_empty(v));

        match (old, new) {
            (None, None) => {}
            (None, Some(new)) => changes.push(VersionChange::added(name, new)),
            (Some(old), None) => changes.push(VersionChange::removed(name, old)),
            (Some(old), Some(new)) => {
                if !values_equal(old, new) {
                    changes.push(VersionChange::modified(name, old, new));
                }
            }
        }
    }

    changes
}

/// Compare two typed snapshots field by field.
pub fn diff_snapshots(from: &ContentSnapshot, to: &ContentSnapshot) -> Vec<VersionChange> {
    diff_fields(&from.fields(), &to.fields())
}

/// Compare the stored payloads of two versions.
pub fn diff_versions(from: &ContentVersion, to: &ContentVersion) -> VersionDiff {
    VersionDiff {
        from_version: from.version_number,
        to_version: to.version_number,
        changes: diff_fields(&from.fields(), &to.fields()),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Structural equality where numbers compare by value (`1` equals `1.0`).
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Integers compare exactly; only floats fall back to `f64`.
fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
        return x == y;
    }
    if x.is_f64() || y.is_f64() {
        return x.as_f64() == y.as_f64();
    }
    false
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn unified_diff(old: &str, new: &str, field: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut output = format!("--- a/{field}\n+++ b/{field}\n");

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            output.push_str("...\n");
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                    ChangeTag::Equal => ' ',
                };
                output.push(sign);
                output.push_str(change.value());
                if !change.value().ends_with('\n') {
                    output.push('\n');
                }
            }
        }
    }

    output
}
