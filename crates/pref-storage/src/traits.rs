//! The storage port: whole-document read and write.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Source of a datastore document.
#[async_trait]
pub trait StorageReader: Send + Sync {
    /// Read the complete document.
    ///
    /// Returns an empty string if nothing has been stored yet.
    /// Returns `Err` on I/O or permission failure.
    async fn read(&self) -> Result<String>;
}

/// Sink for a datastore document.
#[async_trait]
pub trait StorageWriter: Send + Sync {
    /// Replace the stored document with `content`.
    ///
    /// Implementations must never leave a partially written document
    /// visible to a later `read`.
    async fn write(&self, content: &str) -> Result<()>;
}

/// A backend that can both read and write.
pub trait Storage: StorageReader + StorageWriter {}

impl<T: StorageReader + StorageWriter + ?Sized> Storage for T {}

#[async_trait]
impl<T: StorageReader + ?Sized> StorageReader for Arc<T> {
    async fn read(&self) -> Result<String> {
        (**self).read().await
    }
}

#[async_trait]
impl<T: StorageWriter + ?Sized> StorageWriter for Arc<T> {
    async fn write(&self, content: &str) -> Result<()> {
        (**self).write(content).await
    }
}
