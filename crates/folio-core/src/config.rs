//! Configuration management for folio.
//!
//! Configuration is loaded from multiple sources and deep-merged, later
//! sources overriding earlier ones:
//! 1. Global config: `~/.config/folio/folio.json` (or `.jsonc`)
//! 2. Environment variable: `FOLIO_CONFIG_CONTENT`
//! 3. Project config: `folio.json` or `folio.jsonc` in the project directory
//!
//! Files may contain `//` and `/* */` comments, and `{env:VAR_NAME}`
//! placeholders which are replaced by the named environment variable.

use crate::error::{ConfigError, CoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable holding inline configuration.
pub const CONFIG_ENV_VAR: &str = "FOLIO_CONFIG_CONTENT";

const CONFIG_FILE_NAMES: [&str; 2] = ["folio.jsonc", "folio.json"];

static ENV_REGEX: OnceLock<regex::Regex> = OnceLock::new();

fn env_regex() -> &'static regex::Regex {
    ENV_REGEX.get_or_init(|| {
        regex::Regex::new(r"\{env:([^}]+)\}")
            .expect("Invalid regex pattern - this is a compile-time constant")
    })
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level name (`trace` .. `error`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Recorded as the creator of versions made in this session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    pub autosave: AutoSaveConfig,

    pub history: HistoryConfig,

    pub storage: StorageConfig,
}

/// Auto-save timing and retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSaveConfig {
    pub enabled: bool,
    /// Minimum time between two successful auto-saves.
    pub interval_ms: u64,
    /// Quiet period after the last edit before a save becomes eligible.
    pub debounce_ms: u64,
    /// Auto-save versions retained per entity; manual versions don't count.
    pub max_auto_saves: usize,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 30_000,
            debounce_ms: 2_000,
            max_auto_saves: 10,
        }
    }
}

impl AutoSaveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::validation("autosave.interval_ms must be positive"));
        }
        if self.max_auto_saves == 0 {
            return Err(ConfigError::validation(
                "autosave.max_auto_saves must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Version history listing defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub page_size: u32,
    pub include_auto_saves: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            page_size: folio_store::DEFAULT_PAGE_SIZE,
            include_auto_saves: true,
        }
    }
}

/// Where the JSON stores keep their files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Returns the merged config and the files it was read from.
    pub async fn load(project_dir: Option<&Path>) -> CoreResult<(Self, Vec<PathBuf>)> {
        let mut merged = Value::Object(Default::default());
        let mut sources = Vec::new();

        if let Some(global_dir) = folio_util::path::config_dir() {
            if let Some(path) = Self::find_file(&global_dir) {
                merge_values(&mut merged, Self::read_layer(&path).await?);
                sources.push(path);
            }
        }

        if let Ok(content) = std::env::var(CONFIG_ENV_VAR) {
            merge_values(&mut merged, Self::parse_layer(&content, "<env>")?);
        }

        if let Some(dir) = project_dir {
            if let Some(path) = Self::find_file(dir) {
                merge_values(&mut merged, Self::read_layer(&path).await?);
                sources.push(path);
            }
        }

        let config = Self::from_value(merged, "<merged>")?;
        Ok((config, sources))
    }

    /// Parse a single JSONC document.
    pub fn parse(content: &str) -> CoreResult<Self> {
        let value = Self::parse_layer(content, "<inline>")?;
        Self::from_value(value, "<inline>")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.autosave.validate()?;
        if self.history.page_size == 0 {
            return Err(ConfigError::validation("history.page_size must be positive"));
        }
        Ok(())
    }

    /// Directory for the JSON stores.
    ///
    /// Uses `storage.data_dir` if set, then `<project>/.folio`, then the
    /// user data directory.
    pub fn data_dir(&self, project_dir: Option<&Path>) -> Option<PathBuf> {
        self.storage
            .data_dir
            .clone()
            .or_else(|| project_dir.map(folio_util::path::project_data_dir))
            .or_else(folio_util::path::data_dir)
    }

    /// Name recorded on versions created by this user.
    pub fn author(&self) -> String {
        self.author
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn find_file(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    async fn read_layer(path: &Path) -> CoreResult<Value> {
        let content = tokio::fs::read_to_string(path).await?;
        let content = substitute_env(&content)?;
        Self::parse_layer(&content, &path.display().to_string())
    }

    fn parse_layer(content: &str, source: &str) -> CoreResult<Value> {
        let stripped = strip_comments(content);
        let value: Value =
            serde_json::from_str(&stripped).map_err(|e| ConfigError::InvalidJson {
                path: source.to_string(),
                message: e.to_string(),
            })?;

        if !value.is_object() {
            return Err(ConfigError::InvalidJson {
                path: source.to_string(),
                message: "top-level value must be an object".to_string(),
            }
            .into());
        }
        Ok(value)
    }

    fn from_value(value: Value, source: &str) -> CoreResult<Self> {
        let config: Config =
            serde_json::from_value(value).map_err(|e| ConfigError::InvalidJson {
                path: source.to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }
}

/// Recursively merge `overlay` into `base`; objects merge, everything else replaces.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Remove `//` and `/* */` comments outside of string literals.
fn strip_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                result.push(c);
            }
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = ' ';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    // Keep line numbers stable for error messages
                    if c == '\n' {
                        result.push('\n');
                    }
                    prev = c;
                }
            }
            _ => result.push(c),
        }
    }

    result
}

fn substitute_env(content: &str) -> Result<String, ConfigError> {
    let mut missing = None;
    let replaced = env_regex().replace_all(content, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match std::env::var(name) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(ConfigError::EnvVarNotFound { name }),
        None => Ok(replaced.into_owned()),
    }
}
