//! Where a datastore loads from and persists to.

use std::fmt;
use std::sync::Arc;

use pref_storage::{StorageReader, StorageWriter};

/// Source of the initial snapshot.
#[derive(Clone, Default)]
pub enum LoadStrategy {
    /// Start from an empty snapshot; every preference uses its default.
    #[default]
    Skip,
    /// Read and parse the document from this reader.
    UseReader(Arc<dyn StorageReader>),
}

impl LoadStrategy {
    pub fn reader<R: StorageReader + 'static>(reader: R) -> Self {
        Self::UseReader(Arc::new(reader))
    }
}

/// Destination of snapshot rewrites.
#[derive(Clone, Default)]
pub enum PersistStrategy {
    /// Keep changes in memory only.
    #[default]
    Skip,
    /// Rewrite the whole document through this writer after every change.
    UseWriter(Arc<dyn StorageWriter>),
}

impl PersistStrategy {
    pub fn writer<W: StorageWriter + 'static>(writer: W) -> Self {
        Self::UseWriter(Arc::new(writer))
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::UseWriter(_))
    }
}

impl fmt::Debug for LoadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => f.write_str("Skip"),
            Self::UseReader(_) => f.write_str("UseReader(..)"),
        }
    }
}

impl fmt::Debug for PersistStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => f.write_str("Skip"),
            Self::UseWriter(_) => f.write_str("UseWriter(..)"),
        }
    }
}
