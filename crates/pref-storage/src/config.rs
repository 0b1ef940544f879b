use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for a [`FileStorage`](crate::FileStorage) backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// Location of the datastore file.
    pub path: PathBuf,
    /// `fsync` the staged file before renaming it into place.
    pub sync_on_write: bool,
    /// Create missing parent directories on write.
    pub create_dirs: bool,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("preferences.prefs"),
            sync_on_write: true,
            create_dirs: true,
        }
    }
}

impl FileStorageConfig {
    /// Default settings for the file at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = FileStorageConfig::default();
        assert_eq!(c.path, PathBuf::from("preferences.prefs"));
        assert!(c.sync_on_write);
        assert!(c.create_dirs);
    }

    #[test]
    fn at_keeps_defaults() {
        let c = FileStorageConfig::at("/tmp/app/settings.prefs");
        assert_eq!(c.path, PathBuf::from("/tmp/app/settings.prefs"));
        assert!(c.sync_on_write);
    }
}
