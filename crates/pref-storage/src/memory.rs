//! In-memory storage for tests, exports and ephemeral use.
//!
//! [`InMemoryStorage`] keeps the document in a `String` behind a `RwLock`.
//! It can be switched into a failing mode to exercise the I/O fault paths
//! of its callers.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Result, StorageError};
use crate::traits::{StorageReader, StorageWriter};

/// An in-memory implementation of the storage port.
///
/// Data is lost when the storage is dropped.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    content: RwLock<Option<String>>,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage that already holds `content`.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: RwLock::new(Some(content.into())),
            ..Default::default()
        }
    }

    /// The stored document, or `None` if nothing was ever written.
    pub fn content(&self) -> Option<String> {
        self.content
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Make every subsequent read and write fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("in-memory storage set to fail".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageReader for InMemoryStorage {
    async fn read(&self) -> Result<String> {
        self.check_available()?;
        Ok(self.content().unwrap_or_default())
    }
}

#[async_trait]
impl StorageWriter for InMemoryStorage {
    async fn write(&self, content: &str) -> Result<()> {
        self.check_available()?;
        // The slot is replaced whole, so a poisoned lock never guards a torn
        // value.
        *self
            .content
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(content.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_storage_reads_empty() {
        let storage = InMemoryStorage::new();
        assert_eq!(storage.read().await.unwrap(), "");
        assert!(storage.content().is_none());
    }

    #[tokio::test]
    async fn write_replaces_content() {
        let storage = InMemoryStorage::with_content("i;a;1\n");
        storage.write("i;a;2\n").await.unwrap();
        assert_eq!(storage.read().await.unwrap(), "i;a;2\n");
        assert_eq!(storage.write_count(), 1);
    }

    #[tokio::test]
    async fn failing_mode() {
        let storage = InMemoryStorage::with_content("i;a;1\n");
        storage.set_failing(true);

        assert!(matches!(storage.read().await, Err(StorageError::Unavailable(_))));
        assert!(storage.write("i;a;2\n").await.is_err());
        assert_eq!(storage.write_count(), 0);

        storage.set_failing(false);
        assert_eq!(storage.read().await.unwrap(), "i;a;1\n");
    }

    #[tokio::test]
    async fn poisoned_lock_still_serves_content() {
        let storage = std::sync::Arc::new(InMemoryStorage::with_content("i;a;1\n"));
        let held = storage.clone();
        let _ = std::thread::spawn(move || {
            let _guard = held.content.write().unwrap();
            panic!("writer panicked while holding the lock");
        })
        .join();
        assert!(storage.content.is_poisoned());

        assert_eq!(storage.content().as_deref(), Some("i;a;1\n"));
        assert_eq!(storage.read().await.unwrap(), "i;a;1\n");
        storage.write("i;a;2\n").await.unwrap();
        assert_eq!(storage.content().as_deref(), Some("i;a;2\n"));
    }
}
