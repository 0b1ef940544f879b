//! Storage port for prefstore.
//!
//! The datastore never touches the filesystem directly. It reads and writes
//! whole documents through the [`StorageReader`] and [`StorageWriter`]
//! traits, so the backing medium can be swapped without touching the
//! runtime.
//!
//! # Storage Backends
//!
//! - [`FileStorage`] -- single file, replaced atomically on every write
//! - [`InMemoryStorage`] -- `RwLock`-backed string for tests and exports
//!
//! # Design Rules
//!
//! 1. A write replaces the whole document; there are no partial updates.
//! 2. A crash mid-write never leaves a half-written file behind.
//! 3. A missing file reads as an empty document, not as an error.
//! 4. All other I/O errors are propagated, never silently ignored.

pub mod config;
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use config::FileStorageConfig;
pub use error::{Result, StorageError};
pub use file::{write_atomic, FileStorage};
pub use memory::InMemoryStorage;
pub use traits::{Storage, StorageReader, StorageWriter};
