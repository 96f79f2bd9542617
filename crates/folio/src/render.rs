//! Terminal output for versions and changes.

use folio_snapshot::{ChangeType, ContentVersion, VersionChange};

const SUMMARY_WIDTH: usize = 40;

/// One history row per version.
pub fn history_table(versions: &[ContentVersion]) -> String {
    let mut out = format!(
        "{:<20} {:<20} {:<24} {}\n{}\n",
        "VERSION",
        "CREATED",
        "BY",
        "SUMMARY",
        "-".repeat(90)
    );
    for version in versions {
        out.push_str(&format!(
            "{:<20} {:<20} {:<24} {}\n",
            version.label(),
            version.created_at.format("%Y-%m-%d %H:%M:%S"),
            version.created_by,
            truncate(version.change_summary.as_deref().unwrap_or(""), SUMMARY_WIDTH)
        ));
    }
    out
}

/// Field-by-field listing of changes.
///
/// String fields that span several lines are shown as a unified diff.
pub fn changes(changes: &[VersionChange]) -> String {
    if changes.is_empty() {
        return "No differences.\n".to_string();
    }

    let mut out = String::new();
    for change in changes {
        let marker = match change.change_type {
            ChangeType::Added => '+',
            ChangeType::Removed => '-',
            ChangeType::Modified => '~',
        };
        out.push_str(&format!(
            "{marker} {} ({})\n",
            change.field,
            change.change_type.as_str()
        ));

        let multiline = change
            .old_value
            .iter()
            .chain(change.new_value.iter())
            .any(|v| v.as_str().is_some_and(|s| s.contains('\n')));
        match change.text_diff() {
            Some(diff) if multiline => {
                for line in diff.lines() {
                    out.push_str(&format!("    {line}\n"));
                }
            }
            _ => {
                if change.change_type != ChangeType::Added {
                    out.push_str(&format!("    - {}\n", change.render_old()));
                }
                if change.change_type != ChangeType::Removed {
                    out.push_str(&format!("    + {}\n", change.render_new()));
                }
            }
        }
    }
    out
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
