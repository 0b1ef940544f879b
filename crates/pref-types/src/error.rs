use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    /// The key string cannot be used as a preference key.
    #[error("invalid preference key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// The wire tag does not name a known type.
    #[error("unknown type tag: {0:?}")]
    UnknownTypeTag(String),

    /// A raw value could not be parsed as the given wire type.
    #[error("invalid {} value {raw:?}: {reason}", .tag.name())]
    InvalidValue {
        tag: crate::TypeTag,
        raw: String,
        reason: String,
    },
}

/// Convenience type alias for type operations.
pub type Result<T> = std::result::Result<T, TypeError>;
