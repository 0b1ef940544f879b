use std::collections::BTreeMap;

use pref_types::{TypeError, TypeTag, TypedKey};
use thiserror::Error;

use crate::hook::HookError;

/// Errors that can occur while building models or mutating cells.
#[derive(Debug, Error)]
pub enum ModelError {
    /// One or more keys are owned by more than one cell.
    #[error("model {model:?} declares duplicate keys: {}", describe_conflicts(.conflicts))]
    DuplicateKeys {
        model: String,
        /// Every conflicting key with the wire types of all its owners.
        conflicts: BTreeMap<String, Vec<TypeTag>>,
    },

    /// A cell was declared with an unusable key.
    #[error(transparent)]
    InvalidKey(#[from] TypeError),

    /// The cell was already bound to a datastore.
    #[error("preference {key} is already initialized")]
    AlreadyInitialized { key: TypedKey },

    /// The cell was mutated before its datastore finished `init`.
    #[error("preference {key} is not initialized")]
    NotInitialized { key: TypedKey },

    /// The value is cached but the datastore did not confirm it.
    #[error("failed to persist preference {key}: {source}")]
    Persist {
        key: TypedKey,
        #[source]
        source: HookError,
    },
}

fn describe_conflicts(conflicts: &BTreeMap<String, Vec<TypeTag>>) -> String {
    conflicts
        .iter()
        .map(|(key, tags)| {
            let tags: Vec<String> = tags.iter().map(|t| t.as_char().to_string()).collect();
            format!("{key} [{}]", tags.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
