//! Path utilities.

use std::path::{Path, PathBuf};

/// Get the folio configuration directory.
///
/// Prefers `~/.config/folio` on Unix when it exists, otherwise the
/// platform configuration directory.
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(unix)]
    {
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("folio");
            if xdg.exists() {
                return Some(xdg);
            }
        }
    }

    dirs::config_dir().map(|p| p.join("folio"))
}

/// Get the folio data directory (`~/.local/share/folio` on Linux).
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("folio"))
}

/// Get the project-local folio directory.
pub fn project_data_dir(project_root: &Path) -> PathBuf {
    project_root.join(".folio")
}

/// Check that a single storage key component cannot escape its directory.
pub fn is_safe_component(component: &str) -> bool {
    !(component.is_empty()
        || component.contains('/')
        || component.contains('\\')
        || component == "."
        || component == "..")
}
