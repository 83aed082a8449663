use crate::settings::{error::SettingsError, validated::ValidatedSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub mod error;
pub mod validated;

pub const DEFAULT_PAGE_SIZE: usize = 1;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Reader configuration as written in a settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderSettings {
    pub query: String,
    pub database: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub work_group: Option<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl ReaderSettings {
    pub fn new(query: impl Into<String>, database: impl Into<String>) -> Self {
        ReaderSettings {
            query: query.into(),
            database: database.into(),
            page_size: DEFAULT_PAGE_SIZE,
            work_group: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        info!("Loaded reader settings from {}", path.display());
        Self::from_json(&content)
    }

    pub fn validate(self) -> Result<ValidatedSettings, SettingsError> {
        if self.query.trim().is_empty() {
            return Err(SettingsError::Missing("query"));
        }
        if self.database.trim().is_empty() {
            return Err(SettingsError::Missing("database"));
        }
        if self.page_size == 0 {
            return Err(SettingsError::Invalid {
                name: "page_size",
                reason: "must be a positive integer".into(),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(SettingsError::Invalid {
                name: "poll_interval_ms",
                reason: "must be a positive number of milliseconds".into(),
            });
        }
        if let Some(work_group) = &self.work_group
            && work_group.trim().is_empty()
        {
            return Err(SettingsError::Invalid {
                name: "work_group",
                reason: "must not be blank when set".into(),
            });
        }

        Ok(ValidatedSettings::from_settings(self))
    }
}
