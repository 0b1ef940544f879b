//! The prefstore datastore runtime.
//!
//! A [`DataStore`] owns a [`PreferenceModel`](pref_model::PreferenceModel)
//! and a background actor that is the only writer of its file. Every
//! operation that touches the authoritative snapshot (init, cell mutations,
//! import, export and reload) is an event on one FIFO queue, processed
//! strictly one at a time. Callers wait on a single-shot reply.
//!
//! ```no_run
//! use std::sync::Arc;
//! use pref_datastore::{DataStore, DataStoreConfig};
//! use pref_model::{PreferenceData, PreferenceModel};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let volume = Arc::new(PreferenceData::primitive("volume", 50i32)?);
//! let model = PreferenceModel::builder("settings").entry(&volume).build()?;
//!
//! let store = DataStore::new(model);
//! store.init_with_config(&DataStoreConfig::at("settings.prefs")).await?;
//!
//! volume.set(80).await?;
//! assert_eq!(volume.get(), 80);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`datastore`] -- [`DataStore`], the handle applications hold
//! - [`strategy`] -- [`LoadStrategy`] and [`PersistStrategy`]
//! - [`config`] -- [`DataStoreConfig`], file-backed setup from TOML
//! - [`error`] -- [`DataStoreError`]

mod actor;
pub mod config;
pub mod datastore;
pub mod error;
mod event;
mod snapshot;
pub mod strategy;

pub use config::DataStoreConfig;
pub use datastore::DataStore;
pub use error::{DataStoreError, Result};
pub use strategy::{LoadStrategy, PersistStrategy};
