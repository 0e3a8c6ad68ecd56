// src/settings.rs
//! Persisted property selections.
//!
//! Two names survive restarts: the date property that receives the session
//! times and the relation property that links a session to its project.

use crate::constants::{STATE_DIR_NAME, STATE_FILE_NAME};
use crate::error::AppError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_property_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_property_name: Option<String>,
}

impl Settings {
    /// Blank names count as unset.
    pub fn new(project_property: Option<&str>, time_property: Option<&str>) -> Self {
        fn selected(name: Option<&str>) -> Option<String> {
            name.map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        }
        Self {
            time_property_name: selected(time_property),
            project_property_name: selected(project_property),
        }
    }
}

/// Key-value store the settings live in.
#[async_trait::async_trait]
pub trait SettingsStore: Send + Sync {
    /// Loads the stored settings; an unreadable store yields defaults.
    async fn load(&self) -> Settings;
    async fn save(&self, settings: &Settings) -> Result<(), AppError>;
    async fn clear(&self) -> Result<(), AppError>;
}

/// Settings kept in a small JSON file.
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$XDG_CONFIG_HOME/codetrack/state.json` (or `~/.config/codetrack/state.json`).
    pub fn default_path() -> PathBuf {
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".config")
            })
            .join(STATE_DIR_NAME)
            .join(STATE_FILE_NAME)
    }
}

#[async_trait::async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> Settings {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) => {
                log::debug!("No settings at {} ({})", self.path.display(), err);
                return Settings::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|err| {
            log::warn!(
                "Ignoring unreadable settings file {}: {}",
                self.path.display(),
                err
            );
            Settings::default()
        })
    }

    async fn save(&self, settings: &Settings) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&self.path, json).await?;
        log::debug!("Saved settings to {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Settings that live only as long as the process.
#[derive(Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Settings>,
}

impl MemorySettingsStore {
    pub fn with(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

#[async_trait::async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Settings {
        self.settings.lock().clone()
    }

    async fn save(&self, settings: &Settings) -> Result<(), AppError> {
        *self.settings.lock() = settings.clone();
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        *self.settings.lock() = Settings::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("codetrack_test_{}_{}", name, uuid::Uuid::new_v4().simple()))
            .join(STATE_FILE_NAME)
    }

    #[test]
    fn blank_names_are_unset() {
        let settings = Settings::new(Some("  "), Some("Time"));
        assert_eq!(settings.project_property_name, None);
        assert_eq!(settings.time_property_name.as_deref(), Some("Time"));
    }

    #[test]
    fn serialized_keys_are_camel_case() {
        let json = serde_json::to_value(Settings::new(Some("Project"), Some("Time"))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "timePropertyName": "Time", "projectPropertyName": "Project" })
        );
    }

    #[tokio::test]
    async fn file_store_round_trips_and_clears() {
        let path = scratch_path("roundtrip");
        let store = FileSettingsStore::new(&path);
        assert_eq!(store.load().await, Settings::default());

        let settings = Settings::new(Some("Project"), Some("Time"));
        store.save(&settings).await.unwrap();
        assert_eq!(FileSettingsStore::new(&path).load().await, settings);

        store.clear().await.unwrap();
        assert_eq!(store.load().await, Settings::default());
        store.clear().await.unwrap();

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[tokio::test]
    async fn corrupt_file_loads_defaults() {
        let path = scratch_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(FileSettingsStore::new(&path).load().await, Settings::default());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
