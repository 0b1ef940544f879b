//! The single-writer actor behind every [`DataStore`](crate::DataStore).
//!
//! The actor drains an unbounded FIFO queue and handles one event at a time.
//! Whatever an event's outcome, its reply is sent and the actor moves on to
//! the next one; a failed event never stops the loop or undoes state
//! committed by earlier events.

use std::sync::Arc;

use async_trait::async_trait;
use pref_model::{HookError, LoadOutcome, PersistHook, PreferenceModel};
use pref_storage::{StorageReader, StorageWriter};
use pref_types::TypedKey;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::error::{DataStoreError, Result};
use crate::event::Event;
use crate::snapshot::{load_raw_values, render, RawValues, Snapshot};
use crate::strategy::{LoadStrategy, PersistStrategy};

enum State {
    Uninitialized,
    Ready(Snapshot),
}

pub(crate) struct DataStoreActor {
    model: Arc<PreferenceModel>,
    events: mpsc::UnboundedReceiver<Event>,
    hook: Arc<dyn PersistHook>,
    state: State,
}

impl DataStoreActor {
    /// Create the actor and the hook its cells will write through.
    ///
    /// The hook only holds a weak sender, so the queue closes (and the actor
    /// exits) once every `DataStore` handle is gone, even though the model's
    /// cells still reference the hook.
    pub(crate) fn new(
        model: Arc<PreferenceModel>,
        events_tx: &mpsc::UnboundedSender<Event>,
        events: mpsc::UnboundedReceiver<Event>,
    ) -> Self {
        let hook = Arc::new(ActorHook {
            events: events_tx.downgrade(),
        });
        Self {
            model,
            events,
            hook,
            state: State::Uninitialized,
        }
    }

    /// Run the event loop until every sender is dropped.
    pub(crate) async fn run(mut self) {
        info!(model = self.model.name(), entries = self.model.len(), "datastore actor started");

        while let Some(event) = self.events.recv().await {
            debug!(model = self.model.name(), event = event.kind(), "processing event");
            self.handle_event(event).await;
        }

        info!(model = self.model.name(), "datastore actor stopped");
    }

    async fn handle_event(&mut self, event: Event) {
        // A dropped responder means the caller stopped waiting; the work is
        // still done.
        match event {
            Event::Init {
                load,
                persist,
                responder,
            } => {
                let _ = responder.send(self.on_init(load, persist).await);
            }
            Event::SetValueAndTryPersist {
                key,
                raw,
                responder,
            } => {
                let _ = responder.send(self.on_set(key, raw).await);
            }
            Event::Import { reader, responder } => {
                let _ = responder.send(self.on_import(reader).await);
            }
            Event::Export { writer, responder } => {
                let _ = responder.send(self.on_export(writer).await);
            }
            Event::Reload { responder } => {
                let _ = responder.send(self.on_reload().await);
            }
        }
    }

    async fn on_init(&mut self, load: LoadStrategy, persist: PersistStrategy) -> Result<()> {
        if matches!(self.state, State::Ready(_)) {
            error!(model = self.model.name(), "datastore initialized twice");
            return Err(DataStoreError::AlreadyInitialized);
        }

        let mut read_error = None;
        let content = match &load {
            LoadStrategy::Skip => String::new(),
            LoadStrategy::UseReader(reader) => match reader.read().await {
                Ok(content) => content,
                Err(e) => {
                    warn!(
                        model = self.model.name(),
                        error = %e,
                        "datastore read failed; continuing with defaults"
                    );
                    read_error = Some(e);
                    String::new()
                }
            },
        };

        let mut raw_values = load_raw_values(&self.model, &content);

        // Every declared cell gets bound, even after a failed read.
        let mut model_error = None;
        let mut bound = Vec::with_capacity(raw_values.len());
        for (slot, cell) in raw_values.iter_mut().zip(self.model.entries()) {
            match cell.init(slot.as_deref(), self.hook.clone()) {
                Ok(outcome) => {
                    if outcome == LoadOutcome::Rejected {
                        *slot = None;
                    }
                    bound.push(true);
                }
                Err(e) => {
                    error!(model = self.model.name(), error = %e, "preference refused to bind");
                    model_error.get_or_insert(e);
                    bound.push(false);
                }
            }
        }

        let loaded = raw_values.iter().filter(|raw| raw.is_some()).count();
        self.state = State::Ready(Snapshot {
            load,
            persist,
            raw_values,
            bound,
        });
        info!(model = self.model.name(), loaded, "datastore initialized");

        if let Some(e) = read_error {
            return Err(e.into());
        }
        if let Some(e) = model_error {
            return Err(e.into());
        }
        Ok(())
    }

    async fn on_set(&mut self, key: TypedKey, raw: Option<String>) -> Result<()> {
        let State::Ready(snapshot) = &mut self.state else {
            return Err(DataStoreError::NotInitialized);
        };
        let Some(pos) = self.model.position(&key) else {
            error!(model = self.model.name(), key = %key, "mutation of undeclared preference");
            return Err(DataStoreError::UndeclaredKey {
                key,
                model: self.model.name().to_string(),
            });
        };

        // An import may have reloaded this cell after it cached the value now
        // being committed; realign it with the queue order.
        let cell = &self.model.entries()[pos];
        if snapshot.bound[pos] && cell.raw_value() != raw {
            cell.reload(raw.as_deref());
        }

        snapshot.raw_values[pos] = raw;
        snapshot.persist(&self.model).await
    }

    async fn on_import(&mut self, reader: Arc<dyn StorageReader>) -> Result<()> {
        let State::Ready(snapshot) = &mut self.state else {
            return Err(DataStoreError::NotInitialized);
        };

        let content = reader.read().await.map_err(|e| {
            warn!(model = self.model.name(), error = %e, "import read failed; snapshot unchanged");
            e
        })?;

        let raw_values = reload_cells(
            &self.model,
            load_raw_values(&self.model, &content),
            &snapshot.bound,
        );
        let loaded = raw_values.iter().filter(|raw| raw.is_some()).count();
        snapshot.raw_values = raw_values;
        info!(model = self.model.name(), loaded, "datastore imported");

        snapshot.persist(&self.model).await
    }

    async fn on_export(&self, writer: Arc<dyn StorageWriter>) -> Result<()> {
        let State::Ready(snapshot) = &self.state else {
            return Err(DataStoreError::NotInitialized);
        };
        let content = render(&self.model, &snapshot.raw_values);
        writer.write(&content).await?;
        debug!(model = self.model.name(), len = content.len(), "datastore exported");
        Ok(())
    }

    async fn on_reload(&mut self) -> Result<()> {
        let reader = match &self.state {
            State::Uninitialized => return Err(DataStoreError::NotInitialized),
            State::Ready(Snapshot {
                load: LoadStrategy::UseReader(reader),
                ..
            }) => reader.clone(),
            State::Ready(_) => {
                debug!(model = self.model.name(), "no reader configured; nothing to reload");
                return Ok(());
            }
        };
        self.on_import(reader).await
    }
}

/// Push a freshly loaded snapshot into every cell this datastore bound.
///
/// Slots whose value a cell rejects are cleared. Cells bound elsewhere keep
/// their cached value.
fn reload_cells(model: &PreferenceModel, mut raw_values: RawValues, bound: &[bool]) -> RawValues {
    let cells = model.entries().iter().zip(bound);
    for (slot, (cell, &bound)) in raw_values.iter_mut().zip(cells) {
        if bound && cell.reload(slot.as_deref()) == LoadOutcome::Rejected {
            *slot = None;
        }
    }
    raw_values
}

/// Persist hook installed in every cell of the model.
struct ActorHook {
    events: mpsc::WeakUnboundedSender<Event>,
}

impl ActorHook {
    async fn submit(&self, key: &TypedKey, raw: Option<String>) -> Result<()> {
        let events = self.events.upgrade().ok_or(DataStoreError::Shutdown)?;
        let (responder, reply) = oneshot::channel();
        events
            .send(Event::SetValueAndTryPersist {
                key: key.clone(),
                raw,
                responder,
            })
            .map_err(|_| DataStoreError::Shutdown)?;
        drop(events);
        reply.await.map_err(|_| DataStoreError::Shutdown)?
    }
}

#[async_trait]
impl PersistHook for ActorHook {
    async fn persist(
        &self,
        key: &TypedKey,
        raw: Option<String>,
    ) -> std::result::Result<(), HookError> {
        self.submit(key, raw).await.map_err(HookError::from)
    }
}
