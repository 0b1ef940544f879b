use pref_model::ModelError;
use pref_storage::StorageError;
use pref_types::TypedKey;
use thiserror::Error;

/// Errors returned by datastore operations.
#[derive(Debug, Error)]
pub enum DataStoreError {
    /// Reading or writing the backing storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// `init` was called on a datastore that is already initialized.
    #[error("datastore is already initialized")]
    AlreadyInitialized,

    /// The operation needs a completed `init`.
    #[error("datastore is not initialized")]
    NotInitialized,

    /// A cell outside the model tried to write through this datastore.
    #[error("preference {key} is not declared by model {model:?}")]
    UndeclaredKey { key: TypedKey, model: String },

    /// A declared cell refused to bind during `init`.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// The actor is gone; every handle to the datastore was dropped.
    #[error("datastore has shut down")]
    Shutdown,

    /// The datastore configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

/// Result alias for datastore operations.
pub type Result<T> = std::result::Result<T, DataStoreError>;
