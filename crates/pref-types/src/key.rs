//! Preference key validation and typed identities.
//!
//! Valid keys:
//! - Must be non-empty
//! - Must not contain the field delimiter `;`
//! - Must not contain line breaks or any other control character

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TypeError};
use crate::tag::TypeTag;

/// Field delimiter of the on-disk line format.
pub const DELIMITER: char = ';';

/// Validate a key string, returning `Ok(())` if it can be stored.
///
/// # Examples
///
/// ```
/// use pref_types::validate_key;
///
/// assert!(validate_key("theme").is_ok());
/// assert!(validate_key("window.width").is_ok());
/// assert!(validate_key("").is_err());
/// assert!(validate_key("a;b").is_err());
/// ```
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(TypeError::InvalidKey {
            key: key.to_string(),
            reason: "key must not be empty".into(),
        });
    }

    if key.contains(DELIMITER) {
        return Err(TypeError::InvalidKey {
            key: key.to_string(),
            reason: format!("contains delimiter {DELIMITER:?}"),
        });
    }

    if let Some(ch) = key.chars().find(|c| c.is_control()) {
        return Err(TypeError::InvalidKey {
            key: key.to_string(),
            reason: format!("contains control character {ch:?}"),
        });
    }

    Ok(())
}

/// A key string that passed [`validate_key`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PreferenceKey(String);

impl PreferenceKey {
    /// Validate and wrap a key.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PreferenceKey {
    type Error = TypeError;

    fn try_from(key: String) -> Result<Self> {
        Self::new(key)
    }
}

impl From<PreferenceKey> for String {
    fn from(key: PreferenceKey) -> Self {
        key.0
    }
}

impl AsRef<str> for PreferenceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PreferenceKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a preference entry.
///
/// Two entries are the same entry iff both the wire tag and the key match.
/// Displays in the same `tag;key` form that prefixes its line on disk.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypedKey {
    pub tag: TypeTag,
    pub key: PreferenceKey,
}

impl TypedKey {
    pub fn new(tag: TypeTag, key: PreferenceKey) -> Self {
        Self { tag, key }
    }

    /// Validate `key` and pair it with `tag`.
    pub fn parse(tag: TypeTag, key: &str) -> Result<Self> {
        Ok(Self::new(tag, PreferenceKey::new(key)?))
    }
}

impl fmt::Display for TypedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{DELIMITER}{}", self.tag, self.key)
    }
}
