//! Commands processed by the datastore actor.

use std::sync::Arc;

use pref_storage::{StorageReader, StorageWriter};
use pref_types::TypedKey;
use tokio::sync::oneshot;

use crate::error::Result;
use crate::strategy::{LoadStrategy, PersistStrategy};

pub(crate) type Responder = oneshot::Sender<Result<()>>;

/// A unit of work for the actor, answered exactly once through `responder`.
pub(crate) enum Event {
    Init {
        load: LoadStrategy,
        persist: PersistStrategy,
        responder: Responder,
    },
    SetValueAndTryPersist {
        key: TypedKey,
        raw: Option<String>,
        responder: Responder,
    },
    Import {
        reader: Arc<dyn StorageReader>,
        responder: Responder,
    },
    Export {
        writer: Arc<dyn StorageWriter>,
        responder: Responder,
    },
    Reload {
        responder: Responder,
    },
}

impl Event {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Event::Init { .. } => "init",
            Event::SetValueAndTryPersist { .. } => "set",
            Event::Import { .. } => "import",
            Event::Export { .. } => "export",
            Event::Reload { .. } => "reload",
        }
    }
}
