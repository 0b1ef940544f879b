//! File-backed storage with atomic replacement.
//!
//! Every write stages the full document in a temporary file next to the
//! target and renames it over the target. A rename within one directory is
//! atomic, so readers see either the old document or the new one, never a
//! mix. Only one writer per file is assumed.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::config::FileStorageConfig;
use crate::error::{Result, StorageError};
use crate::traits::{StorageReader, StorageWriter};

/// A datastore document stored in a single file.
#[derive(Clone, Debug)]
pub struct FileStorage {
    config: FileStorageConfig,
}

impl FileStorage {
    /// File storage at `path` with default settings.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_config(FileStorageConfig::at(path))
    }

    pub fn with_config(config: FileStorageConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn config(&self) -> &FileStorageConfig {
        &self.config
    }

    /// Read the document on the calling thread.
    ///
    /// A missing file reads as an empty document.
    pub fn read_blocking(&self) -> Result<String> {
        let path = &self.config.path;
        match fs::read_to_string(path) {
            Ok(content) => {
                debug!(path = %path.display(), len = content.len(), "datastore file read");
                Ok(content)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "datastore file missing; reading as empty");
                Ok(String::new())
            }
            Err(source) => Err(StorageError::Io {
                operation: "read",
                path: path.clone(),
                source,
            }),
        }
    }

    /// Atomically replace the document on the calling thread.
    pub fn write_blocking(&self, content: &str) -> Result<()> {
        write_atomic(
            &self.config.path,
            content,
            self.config.sync_on_write,
            self.config.create_dirs,
        )
    }
}

#[async_trait]
impl StorageReader for FileStorage {
    async fn read(&self) -> Result<String> {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || storage.read_blocking())
            .await
            .map_err(|e| StorageError::Join(e.to_string()))?
    }
}

#[async_trait]
impl StorageWriter for FileStorage {
    async fn write(&self, content: &str) -> Result<()> {
        let storage = self.clone();
        let content = content.to_string();
        tokio::task::spawn_blocking(move || storage.write_blocking(&content))
            .await
            .map_err(|e| StorageError::Join(e.to_string()))?
    }
}

/// Replace the file at `path` with `content` via temp file and rename.
///
/// The temporary file lives in the target's directory so the final rename
/// never crosses a filesystem boundary. If anything fails before the rename
/// the temporary file is removed and the target is untouched.
pub fn write_atomic(path: &Path, content: &str, sync: bool, create_dirs: bool) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    if create_dirs {
        fs::create_dir_all(parent).map_err(|source| StorageError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut staged = tempfile::Builder::new()
        .prefix(".prefstore-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|source| StorageError::Io {
            operation: "create temporary file in",
            path: parent.to_path_buf(),
            source,
        })?;

    staged
        .write_all(content.as_bytes())
        .map_err(|source| StorageError::Io {
            operation: "write",
            path: staged.path().to_path_buf(),
            source,
        })?;

    if sync {
        staged.as_file().sync_all().map_err(|source| StorageError::Io {
            operation: "sync",
            path: staged.path().to_path_buf(),
            source,
        })?;
    }

    let temp_path = staged.path().to_path_buf();
    staged
        .persist(path)
        .map_err(|e| StorageError::AtomicWriteFailed {
            temp_path,
            target_path: path.to_path_buf(),
            source: e.error,
        })?;

    debug!(path = %path.display(), len = content.len(), "datastore file replaced");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("absent.prefs"));
        assert_eq!(storage.read_blocking().unwrap(), "");
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("prefs.prefs"));

        storage.write_blocking("i;integer;46\n").unwrap();
        assert_eq!(storage.read_blocking().unwrap(), "i;integer;46\n");

        storage.write_blocking("s;string;\"x\"\n").unwrap();
        assert_eq!(storage.read_blocking().unwrap(), "s;string;\"x\"\n");
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("prefs.prefs");
        let storage = FileStorage::new(&path);

        storage.write_blocking("b;flag;true\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "b;flag;true\n");
    }

    #[test]
    fn no_directory_creation_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let config = FileStorageConfig {
            path: dir.path().join("missing").join("prefs.prefs"),
            create_dirs: false,
            ..Default::default()
        };
        let storage = FileStorage::with_config(config);

        let err = storage.write_blocking("b;flag;true\n").unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }

    #[test]
    fn no_temporary_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("prefs.prefs"));

        for i in 0..5 {
            storage.write_blocking(&format!("i;n;{i}\n")).unwrap();
        }

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["prefs.prefs".to_string()]);
    }

    #[test]
    fn failed_write_keeps_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.prefs");
        let storage = FileStorage::new(&path);
        storage.write_blocking("i;n;1\n").unwrap();

        // A directory squatting on the target path makes the rename fail.
        let blocked = FileStorage::new(dir.path());
        assert!(blocked.write_blocking("i;n;2\n").is_err());

        assert_eq!(storage.read_blocking().unwrap(), "i;n;1\n");
    }

    #[test]
    fn read_of_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(matches!(
            storage.read_blocking(),
            Err(StorageError::Io { operation: "read", .. })
        ));
    }

    #[tokio::test]
    async fn async_port_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("prefs.prefs"));

        StorageWriter::write(&storage, "l;big;3000000000\n").await.unwrap();
        let content = StorageReader::read(&storage).await.unwrap();
        assert_eq!(content, "l;big;3000000000\n");
    }
}
