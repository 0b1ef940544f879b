use pref_types::TypeError;
use thiserror::Error;

/// Errors produced while decoding string tokens or parsing lines.
///
/// None of these are fatal to a load: the loader skips the offending line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// A string token does not start with a double quote.
    #[error("string value is not quoted")]
    Unquoted,

    /// A string token ends before its closing quote.
    #[error("string value is not terminated")]
    Unterminated,

    /// Characters follow the closing quote of a string token.
    #[error("unexpected content after closing quote at offset {offset}")]
    TrailingContent { offset: usize },

    /// A backslash is followed by a character with no defined escape.
    #[error("invalid escape sequence \\{ch} at offset {offset}")]
    InvalidEscape { ch: char, offset: usize },

    /// A raw line break appears inside a string token.
    #[error("unescaped {ch:?} at offset {offset}")]
    UnescapedControl { ch: char, offset: usize },

    /// A line does not have the `tag;key;value` shape.
    #[error("malformed line: {0}")]
    MalformedLine(String),

    /// The tag or key of a line is invalid.
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Convenience type alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
