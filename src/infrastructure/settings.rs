// SPDX-License-Identifier: MPL-2.0
//! Settings persistence.
//!
//! [`FileSettingsStore`] keeps the user settings as CBOR in the application
//! data directory. They are machine-written (by the control surface), so they
//! live apart from the hand-edited `config.toml`.
//!
//! # Path Resolution
//!
//! 1. Explicit base directory passed to [`FileSettingsStore::in_dir`]
//! 2. `AD_LENS_DATA_DIR` environment variable (if set)
//! 3. Platform-specific data directory

use crate::application::port::{Settings, SettingsStore};
use crate::error::{Error, Result};
use crate::paths;
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Settings file name within the app data directory.
const SETTINGS_FILE: &str = "settings.cbor";

/// CBOR-backed settings store.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    /// Store in the default data directory. Returns `None` when no data
    /// directory can be determined.
    #[must_use]
    pub fn new() -> Option<Self> {
        Self::in_dir(None)
    }

    /// Store under `base_dir`, or the default data directory when `None`.
    #[must_use]
    pub fn in_dir(base_dir: Option<PathBuf>) -> Option<Self> {
        paths::get_app_data_dir_with_override(base_dir).map(|mut path| {
            path.push(SETTINGS_FILE);
            Self { path }
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes installation defaults for every absent key.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn install_defaults(&mut self) -> Result<Settings> {
        let mut settings = self.load();
        if settings.fill_defaults() {
            self.save(&settings)?;
        }
        Ok(settings)
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Settings {
        if !self.path.exists() {
            return Settings::default();
        }
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) => {
                log::warn!("Cannot read settings {}: {err}", self.path.display());
                return Settings::default();
            }
        };
        ciborium::from_reader(BufReader::new(file)).unwrap_or_else(|err| {
            log::warn!("Ignoring corrupt settings {}: {err}", self.path.display());
            Settings::default()
        })
    }

    fn save(&mut self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(fs::File::create(&self.path)?);
        ciborium::into_writer(settings, writer).map_err(|e| Error::Settings(e.to_string()))
    }
}

/// In-memory store. Clones share the same settings.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    settings: Arc<Mutex<Settings>>,
}

impl MemorySettingsStore {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(Mutex::new(settings)),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Settings {
        self.settings
            .lock()
            .map(|settings| settings.clone())
            .unwrap_or_default()
    }

    fn save(&mut self, settings: &Settings) -> Result<()> {
        let mut stored = self
            .settings
            .lock()
            .map_err(|_| Error::Settings("Lock poisoned".to_string()))?;
        *stored = settings.clone();
        Ok(())
    }
}
