use std::sync::Arc;

use pref_model::PreferenceModel;
use pref_storage::{StorageReader, StorageWriter};
use tokio::sync::{mpsc, oneshot};

use crate::actor::DataStoreActor;
use crate::config::DataStoreConfig;
use crate::error::{DataStoreError, Result};
use crate::event::{Event, Responder};
use crate::strategy::{LoadStrategy, PersistStrategy};

/// Handle to a model's datastore actor.
///
/// Cloning the handle is cheap; every clone talks to the same actor. The
/// actor stops once the last handle is dropped, after which cell mutations
/// fail with [`DataStoreError::Shutdown`].
#[derive(Clone)]
pub struct DataStore {
    model: Arc<PreferenceModel>,
    events: mpsc::UnboundedSender<Event>,
}

impl DataStore {
    /// Take ownership of `model` and spawn its actor.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(model: PreferenceModel) -> Self {
        let model = Arc::new(model);
        let (events, rx) = mpsc::unbounded_channel();
        let actor = DataStoreActor::new(model.clone(), &events, rx);
        tokio::spawn(actor.run());
        Self { model, events }
    }

    pub fn model(&self) -> &PreferenceModel {
        &self.model
    }

    /// Load the initial snapshot and bind every declared cell.
    ///
    /// A failed read still binds every cell to its default and leaves the
    /// datastore usable in memory; the read error is returned.
    pub async fn init(&self, load: LoadStrategy, persist: PersistStrategy) -> Result<()> {
        self.request(|responder| Event::Init {
            load,
            persist,
            responder,
        })
        .await
    }

    /// [`init`](Self::init) with the file strategies of `config`.
    pub async fn init_with_config(&self, config: &DataStoreConfig) -> Result<()> {
        let (load, persist) = config.strategies();
        self.init(load, persist).await
    }

    /// Replace the whole snapshot with the document read from `reader`.
    ///
    /// Entries missing from the document return to their defaults. Every
    /// cell is reloaded and the result is persisted if a writer is
    /// configured. A failed read leaves the snapshot unchanged.
    pub async fn import<R: StorageReader + 'static>(&self, reader: R) -> Result<()> {
        let reader: Arc<dyn StorageReader> = Arc::new(reader);
        self.request(|responder| Event::Import { reader, responder })
            .await
    }

    /// Write the current snapshot to `writer`.
    pub async fn export<W: StorageWriter + 'static>(&self, writer: W) -> Result<()> {
        let writer: Arc<dyn StorageWriter> = Arc::new(writer);
        self.request(|responder| Event::Export { writer, responder })
            .await
    }

    /// Re-read the load source given to `init`.
    ///
    /// Picks up changes made to the file behind the datastore's back. Does
    /// nothing when `init` used [`LoadStrategy::Skip`].
    pub async fn reload(&self) -> Result<()> {
        self.request(|responder| Event::Reload { responder }).await
    }

    async fn request(&self, event: impl FnOnce(Responder) -> Event) -> Result<()> {
        let (responder, reply) = oneshot::channel();
        self.events
            .send(event(responder))
            .map_err(|_| DataStoreError::Shutdown)?;
        reply.await.map_err(|_| DataStoreError::Shutdown)?
    }
}

impl std::fmt::Debug for DataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStore")
            .field("model", &self.model.name())
            .finish_non_exhaustive()
    }
}
