//! Foundation types for prefstore.
//!
//! Every other prefstore crate depends on `pref-types`. It defines how a
//! preference entry is identified on disk and in memory.
//!
//! # Key Types
//!
//! - [`TypeTag`] -- One-character wire tag naming the primitive kind of a value
//! - [`PreferenceKey`] -- Validated key string (non-empty, no delimiters)
//! - [`TypedKey`] -- Identity of an entry: wire tag plus key

pub mod error;
pub mod key;
pub mod tag;

pub use error::{Result, TypeError};
pub use key::{validate_key, PreferenceKey, TypedKey, DELIMITER};
pub use tag::TypeTag;
