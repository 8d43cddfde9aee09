// SPDX-License-Identifier: MPL-2.0
//! Detector tuning configuration, loaded from `config.toml`.
//!
//! Every field is optional in the file; missing fields take the values in
//! [`defaults`]. A missing or unparsable file yields the default
//! configuration.
//!
//! # Examples
//!
//! ```no_run
//! use ad_lens::config::{self, DetectorConfig};
//! use std::path::PathBuf;
//!
//! let mut config = config::load().unwrap_or_default();
//! config.tick_interval_ms = Some(500);
//!
//! let path = PathBuf::from("./temp_config_dir/config.toml");
//! config::save_to_path(&config, &path).expect("Failed to save config");
//! let loaded = config::load_from_path(&path).expect("Failed to load config");
//! assert_eq!(loaded.tick_interval_ms, Some(500));
//! ```

pub mod defaults;

use crate::error::Result;
use crate::paths;
use defaults::{
    DEFAULT_CAPTURE_DELAY_MS, DEFAULT_LOCATE_RETRY_MS, DEFAULT_REQUEST_TIMEOUT_MS,
    DEFAULT_TICK_INTERVAL_MS, MAX_CAPTURE_DELAY_MS, MIN_REQUEST_TIMEOUT_MS, MIN_TICK_INTERVAL_MS,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default)]
    pub tick_interval_ms: Option<u64>,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    #[serde(default)]
    pub capture_delay_ms: Option<u64>,
    #[serde(default)]
    pub locate_retry_ms: Option<u64>,
    /// Clear the probability history when the active model changes.
    #[serde(default)]
    pub reset_history_on_model_change: Option<bool>,
    /// Directory holding the ONNX model files.
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: Some(DEFAULT_TICK_INTERVAL_MS),
            request_timeout_ms: Some(DEFAULT_REQUEST_TIMEOUT_MS),
            capture_delay_ms: Some(DEFAULT_CAPTURE_DELAY_MS),
            locate_retry_ms: Some(DEFAULT_LOCATE_RETRY_MS),
            reset_history_on_model_change: Some(false),
            model_dir: None,
        }
    }
}

impl DetectorConfig {
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        let ms = self.tick_interval_ms.unwrap_or(DEFAULT_TICK_INTERVAL_MS);
        Duration::from_millis(ms.max(MIN_TICK_INTERVAL_MS))
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        let ms = self.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
        Duration::from_millis(ms.max(MIN_REQUEST_TIMEOUT_MS))
    }

    #[must_use]
    pub fn capture_delay(&self) -> Duration {
        let ms = self.capture_delay_ms.unwrap_or(DEFAULT_CAPTURE_DELAY_MS);
        Duration::from_millis(ms.min(MAX_CAPTURE_DELAY_MS))
    }

    #[must_use]
    pub fn locate_retry(&self) -> Duration {
        Duration::from_millis(self.locate_retry_ms.unwrap_or(DEFAULT_LOCATE_RETRY_MS))
    }

    #[must_use]
    pub fn reset_history_on_model_change(&self) -> bool {
        self.reset_history_on_model_change.unwrap_or(false)
    }

    #[must_use]
    pub fn model_dir(&self) -> Option<&Path> {
        self.model_dir.as_deref()
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    paths::get_app_config_dir().map(|mut path| {
        path.push(CONFIG_FILE);
        path
    })
}

pub fn load() -> Result<DetectorConfig> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(DetectorConfig::default())
}

pub fn save(config: &DetectorConfig) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

pub fn load_from_path(path: &Path) -> Result<DetectorConfig> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content).unwrap_or_else(|err| {
        log::warn!("Ignoring invalid config {}: {err}", path.display());
        DetectorConfig::default()
    }))
}

pub fn save_to_path(config: &DetectorConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
