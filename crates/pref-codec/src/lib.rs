//! On-disk encoding for prefstore.
//!
//! A datastore file is UTF-8 text with one record per line:
//!
//! ```text
//! i;integer;-567
//! s;string;"the grass is not greener on the moon"
//! ```
//!
//! The first field is the wire [`TypeTag`](pref_types::TypeTag), the second
//! the key, and everything after the second `;` is the raw value. String
//! values are quoted and escaped by the [`string`] codec so they can hold
//! delimiters and line breaks; all other kinds use their canonical text.
//!
//! # Modules
//!
//! - [`string`] -- Reversible quoting/escaping of string values
//! - [`line`] -- Parsing and rendering of records and whole documents
//! - [`error`] -- Error types for both

pub mod error;
pub mod line;
pub mod string;

pub use error::{CodecError, Result};
pub use line::{parse_document, parse_line, render_document, ParsedDocument, Record, SkippedLine};
