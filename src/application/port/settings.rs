// SPDX-License-Identifier: MPL-2.0
//! Settings store port definition.
//!
//! Three durable keys survive restarts: `debug`, `enabled` and
//! `selectedModelId`. Absent keys fall back to installation defaults.

use crate::domain::model::DEFAULT_MODEL_ID;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Persisted user settings. `None` means the key was never written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_model_id: Option<String>,
}

impl Settings {
    /// Settings written on first install.
    #[must_use]
    pub fn installation_defaults() -> Self {
        Self {
            debug: Some(true),
            enabled: Some(true),
            selected_model_id: Some(DEFAULT_MODEL_ID.to_string()),
        }
    }

    #[must_use]
    pub fn debug_or_default(&self) -> bool {
        self.debug.unwrap_or(true)
    }

    #[must_use]
    pub fn enabled_or_default(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    #[must_use]
    pub fn model_id_or_default(&self) -> &str {
        self.selected_model_id.as_deref().unwrap_or(DEFAULT_MODEL_ID)
    }

    /// Fills every absent key with its installation default.
    ///
    /// Returns true if anything was filled.
    pub fn fill_defaults(&mut self) -> bool {
        let defaults = Self::installation_defaults();
        let mut changed = false;
        if self.debug.is_none() {
            self.debug = defaults.debug;
            changed = true;
        }
        if self.enabled.is_none() {
            self.enabled = defaults.enabled;
            changed = true;
        }
        if self.selected_model_id.is_none() {
            self.selected_model_id = defaults.selected_model_id;
            changed = true;
        }
        changed
    }
}

/// Port for the durable key/value store.
pub trait SettingsStore: Send {
    /// Reads the stored settings. Unreadable storage yields empty settings.
    fn load(&self) -> Settings;

    /// Writes all settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&mut self, settings: &Settings) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_keys_use_installation_defaults() {
        let settings = Settings::default();
        assert!(settings.debug_or_default());
        assert!(settings.enabled_or_default());
        assert_eq!(settings.model_id_or_default(), DEFAULT_MODEL_ID);
    }

    #[test]
    fn fill_defaults_keeps_existing_values() {
        let mut settings = Settings {
            enabled: Some(false),
            ..Settings::default()
        };
        assert!(settings.fill_defaults());
        assert_eq!(settings.enabled, Some(false));
        assert_eq!(settings.debug, Some(true));
        assert!(!settings.fill_defaults());
    }

    #[test]
    fn serializes_with_storage_key_names() {
        let settings = Settings::installation_defaults();
        let json = serde_json::to_value(&settings).expect("serialize");
        assert_eq!(json["selectedModelId"], DEFAULT_MODEL_ID);
        assert_eq!(json["debug"], true);
    }
}
