//! Per-vault settings for GraphMap.

use crate::CoreError;
use graphmap_indexer::SyncConfig;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Hidden folder inside the vault holding settings and the PID file.
pub const SETTINGS_DIR: &str = ".graphmap";

/// Settings file name inside [`SETTINGS_DIR`].
pub const SETTINGS_FILE: &str = "config.yaml";

/// PID file name inside [`SETTINGS_DIR`].
pub const PID_FILE: &str = "daemon.pid";

/// Persisted settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Folder holding generated index files
    #[serde(default = "default_index_container")]
    pub index_container: String,

    /// Prefix of generated index file names
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Resynchronize automatically when the vault changes
    #[serde(default = "default_auto_sync")]
    pub auto_sync: bool,

    /// Quiet period before a burst of changes triggers a pass
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Remove orphaned index files after every clean pass
    #[serde(default)]
    pub prune_orphans: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_index_container() -> String {
    SyncConfig::default().index_container
}

fn default_file_prefix() -> String {
    SyncConfig::default().file_prefix
}

fn default_auto_sync() -> bool {
    SyncConfig::default().auto_sync
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_container: default_index_container(),
            file_prefix: default_file_prefix(),
            auto_sync: default_auto_sync(),
            debounce_ms: default_debounce_ms(),
            prune_orphans: false,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Names accepted by [`Settings::set`] and [`Settings::get`].
    pub const KEYS: &'static [&'static str] = &[
        "index_container",
        "file_prefix",
        "auto_sync",
        "debounce_ms",
        "prune_orphans",
        "log_level",
    ];

    /// Settings directory of a vault.
    pub fn settings_dir(vault: &Path) -> PathBuf {
        vault.join(SETTINGS_DIR)
    }

    /// Settings file of a vault.
    pub fn settings_path(vault: &Path) -> PathBuf {
        Self::settings_dir(vault).join(SETTINGS_FILE)
    }

    /// PID file of a vault's daemon.
    pub fn pid_path(vault: &Path) -> PathBuf {
        Self::settings_dir(vault).join(PID_FILE)
    }

    /// Load a vault's settings, falling back to defaults
    pub fn load(vault: &Path) -> Self {
        let path = Self::settings_path(vault);

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => return Self::from_yaml(&content),
                Err(e) => {
                    tracing::warn!("Failed to read settings file: {}", e);
                }
            }
        }

        Self::default()
    }

    /// Parse settings, replacing every unreadable field with its default.
    pub fn from_yaml(content: &str) -> Self {
        let mut settings = Self::default();

        let mapping = match serde_yaml::from_str::<Value>(content) {
            Ok(Value::Mapping(mapping)) => mapping,
            Ok(Value::Null) => return settings,
            Ok(_) => {
                tracing::warn!("Settings file is not a mapping, using defaults");
                return settings;
            }
            Err(e) => {
                tracing::warn!("Failed to parse settings file: {}", e);
                return settings;
            }
        };

        for (key, value) in mapping {
            let Some(key) = key.as_str() else {
                continue;
            };
            if let Err(e) = settings.apply_value(key, value) {
                tracing::warn!("Ignoring setting: {}", e);
            }
        }

        settings
    }

    /// Load settings from a specific path, failing on any error
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Persist settings into the vault
    pub fn save(&self, vault: &Path) -> Result<(), CoreError> {
        std::fs::create_dir_all(Self::settings_dir(vault))?;
        let content = serde_yaml::to_string(self)?;
        std::fs::write(Self::settings_path(vault), content)?;
        Ok(())
    }

    /// Set a field from its textual form, as typed on the command line.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        match key {
            "index_container" => self.index_container = validate_container(value)?,
            "file_prefix" => self.file_prefix = validate_prefix(value)?,
            "auto_sync" => self.auto_sync = parse_text(key, value)?,
            "debounce_ms" => self.debounce_ms = parse_text(key, value)?,
            "prune_orphans" => self.prune_orphans = parse_text(key, value)?,
            "log_level" => self.log_level = validate_log_level(value)?,
            _ => return Err(CoreError::UnknownSetting(key.to_string())),
        }
        Ok(())
    }

    /// Textual form of a field.
    pub fn get(&self, key: &str) -> Result<String, CoreError> {
        Ok(match key {
            "index_container" => self.index_container.clone(),
            "file_prefix" => self.file_prefix.clone(),
            "auto_sync" => self.auto_sync.to_string(),
            "debounce_ms" => self.debounce_ms.to_string(),
            "prune_orphans" => self.prune_orphans.to_string(),
            "log_level" => self.log_level.clone(),
            _ => return Err(CoreError::UnknownSetting(key.to_string())),
        })
    }

    /// The part of the settings a synchronization pass reads.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            index_container: self.index_container.clone(),
            file_prefix: self.file_prefix.clone(),
            auto_sync: self.auto_sync,
        }
    }

    /// Debounce window as a duration.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    fn apply_value(&mut self, key: &str, value: Value) -> Result<(), CoreError> {
        match key {
            "index_container" => {
                self.index_container = validate_container(&parse_value::<String>(key, value)?)?
            }
            "file_prefix" => self.file_prefix = validate_prefix(&parse_value::<String>(key, value)?)?,
            "auto_sync" => self.auto_sync = parse_value(key, value)?,
            "debounce_ms" => self.debounce_ms = parse_value(key, value)?,
            "prune_orphans" => self.prune_orphans = parse_value(key, value)?,
            "log_level" => {
                self.log_level = validate_log_level(&parse_value::<String>(key, value)?)?
            }
            _ => return Err(CoreError::UnknownSetting(key.to_string())),
        }
        Ok(())
    }
}

fn invalid(key: &str, message: impl Into<String>) -> CoreError {
    CoreError::InvalidSetting {
        key: key.to_string(),
        message: message.into(),
    }
}

fn parse_value<T: serde::de::DeserializeOwned>(key: &str, value: Value) -> Result<T, CoreError> {
    serde_yaml::from_value(value).map_err(|e| invalid(key, e.to_string()))
}

fn parse_text<T>(key: &str, value: &str) -> Result<T, CoreError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| invalid(key, e.to_string()))
}

fn validate_container(value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim().trim_matches(|c| c == '/' || c == '\\');
    if trimmed.is_empty() {
        return Err(invalid("index_container", "must not be empty"));
    }
    if trimmed
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == ".." || segment.starts_with('.'))
    {
        return Err(invalid(
            "index_container",
            "must be a plain vault-relative folder path",
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_prefix(value: &str) -> Result<String, CoreError> {
    if value.contains(['/', '\\']) {
        return Err(invalid("file_prefix", "must not contain path separators"));
    }
    Ok(value.to_string())
}

fn validate_log_level(value: &str) -> Result<String, CoreError> {
    let level = value.trim().to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(invalid(
            "log_level",
            format!("expected one of {}", LOG_LEVELS.join(", ")),
        ));
    }
    Ok(level)
}
