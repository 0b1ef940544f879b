//! Typed preference cells and the models that declare them.
//!
//! A [`PreferenceModel`] is the fixed set of preferences an application
//! exposes. Each entry is a [`PreferenceData<V>`] cell: a named, typed slot
//! with a default, a cached value, and a [`PersistHook`] through which every
//! mutation is forwarded to the datastore that owns the model.
//!
//! # Architecture
//!
//! - **Cells** cache their value locally so reads never wait. Writes update
//!   the cache, notify subscribers, then wait on the persist hook.
//! - **Serializers** turn values into the raw text stored on disk. String
//!   wire values are additionally escaped by the string codec.
//! - **Models** are validated once at construction: no key may be owned by
//!   more than one cell.
//! - **Migrations** see every stored line at load time and may keep, drop or
//!   rewrite it.
//!
//! # Modules
//!
//! - [`cell`] -- [`PreferenceData`] and the type-erased [`Preference`] trait
//! - [`model`] -- [`PreferenceModel`] and its builder
//! - [`serializer`] -- [`ValueSerializer`] and the provided implementations
//! - [`migration`] -- [`MigrationEntry`] and the [`Migration`] hook
//! - [`hook`] -- [`PersistHook`], the seam to the datastore
//! - [`error`] -- Error types for model operations

pub mod cell;
pub mod error;
pub mod hook;
pub mod migration;
pub mod model;
pub mod serializer;

pub use cell::{LoadOutcome, Preference, PreferenceData};
pub use error::{ModelError, Result};
pub use hook::{HookError, PersistHook};
pub use migration::{KeepAsIs, Migration, MigrationAction, MigrationEntry};
pub use model::{ModelBuilder, PreferenceModel};
pub use serializer::{
    CustomSerializer, FromStrSerializer, PrimitiveSerializer, PrimitiveValue, ValueSerializer,
};
