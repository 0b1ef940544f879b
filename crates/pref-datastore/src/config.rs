use std::path::{Path, PathBuf};
use std::sync::Arc;

use pref_storage::{FileStorage, FileStorageConfig};
use serde::{Deserialize, Serialize};

use crate::error::{DataStoreError, Result};
use crate::strategy::{LoadStrategy, PersistStrategy};

/// File-backed datastore setup.
///
/// ```toml
/// load_on_init = true
/// persist_on_write = true
///
/// [file]
/// path = "/var/lib/app/settings.prefs"
/// sync_on_write = true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataStoreConfig {
    /// The backing file.
    pub file: FileStorageConfig,
    /// Read the file during `init`.
    pub load_on_init: bool,
    /// Rewrite the file after every change.
    pub persist_on_write: bool,
}

impl Default for DataStoreConfig {
    fn default() -> Self {
        Self {
            file: FileStorageConfig::default(),
            load_on_init: true,
            persist_on_write: true,
        }
    }
}

impl DataStoreConfig {
    /// Default settings for the file at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            file: FileStorageConfig::at(path),
            ..Default::default()
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DataStoreError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DataStoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// The load and persist strategies this config describes.
    ///
    /// Both share one [`FileStorage`].
    pub fn strategies(&self) -> (LoadStrategy, PersistStrategy) {
        let storage = Arc::new(FileStorage::with_config(self.file.clone()));
        let load = if self.load_on_init {
            LoadStrategy::UseReader(storage.clone())
        } else {
            LoadStrategy::Skip
        };
        let persist = if self.persist_on_write {
            PersistStrategy::UseWriter(storage)
        } else {
            PersistStrategy::Skip
        };
        (load, persist)
    }
}
