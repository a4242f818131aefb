//! List behaviour settings
//!
//! Loaded from JSON (bundled config or LocalStorage); every field has a
//! default so partial documents are fine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::stores::errors::SyncError;
use crate::stores::pagination::WindowConfig;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_INITIAL_COUNT: usize = 10;

/// Spinner pacing for purely local load-more
pub const DEFAULT_PACING_MS: u64 = 300;

pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

/// How many settled mutations the coordinator keeps for notifications
pub const DEFAULT_SETTLED_HISTORY: usize = 32;

#[cfg(target_arch = "wasm32")]
const STORAGE_KEY_SETTINGS: &str = "feed_sync_list_settings";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListSettings {
    /// Items added per load-more
    pub page_size: usize,
    /// Items shown on first paint, independent of page_size
    pub initial_count: usize,
    /// Artificial load-more delay; 0 disables pacing
    pub pacing_ms: u64,
    pub search_debounce_ms: u64,
    pub settled_history: usize,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            initial_count: DEFAULT_INITIAL_COUNT,
            pacing_ms: DEFAULT_PACING_MS,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            settled_history: DEFAULT_SETTLED_HISTORY,
        }
    }
}

impl ListSettings {
    /// Parse and validate settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        let settings: ListSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if self.page_size == 0 {
            return Err(SyncError::InvalidConfig {
                field: "page_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.search_debounce_ms == 0 {
            return Err(SyncError::InvalidConfig {
                field: "search_debounce_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn window_config(&self) -> Result<WindowConfig, SyncError> {
        WindowConfig::new(self.page_size, self.initial_count)
    }

    pub fn pacing(&self) -> Option<Duration> {
        (self.pacing_ms > 0).then(|| Duration::from_millis(self.pacing_ms))
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Load settings saved in LocalStorage, falling back to defaults
    #[cfg(target_arch = "wasm32")]
    pub fn load_local() -> Self {
        use gloo_storage::{LocalStorage, Storage};

        match LocalStorage::get::<ListSettings>(STORAGE_KEY_SETTINGS) {
            Ok(settings) if settings.validate().is_ok() => settings,
            Ok(_) => {
                log::warn!("Stored list settings are invalid, using defaults");
                Self::default()
            }
            Err(_) => Self::default(),
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn save_local(&self) -> Result<(), SyncError> {
        use gloo_storage::{LocalStorage, Storage};

        self.validate()?;
        LocalStorage::set(STORAGE_KEY_SETTINGS, self)
            .map_err(|e| SyncError::Settings(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = ListSettings::from_json(r#"{"page_size": 5}"#).unwrap();
        assert_eq!(settings.page_size, 5);
        assert_eq!(settings.initial_count, DEFAULT_INITIAL_COUNT);
        assert_eq!(settings.pacing(), Some(Duration::from_millis(300)));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = ListSettings::from_json(r#"{"page_size": 0}"#).unwrap_err();
        assert!(matches!(err, SyncError::InvalidConfig { field: "page_size", .. }));
    }

    #[test]
    fn test_zero_debounce_rejected() {
        let settings = ListSettings {
            search_debounce_ms: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_pacing_disables_delay() {
        let settings = ListSettings {
            pacing_ms: 0,
            ..Default::default()
        };
        assert_eq!(settings.pacing(), None);
    }

    #[test]
    fn test_malformed_json() {
        let err = ListSettings::from_json("{not json").unwrap_err();
        assert!(matches!(err, SyncError::Settings(_)));
    }
}
