//! The fixed registry of wire types.
//!
//! Each primitive kind a preference can hold on disk is identified by a
//! single character written as the first field of its line:
//!
//! | Tag | Kind    | Rust type |
//! |-----|---------|-----------|
//! | `b` | boolean | `bool`    |
//! | `d` | double  | `f64`     |
//! | `f` | float   | `f32`     |
//! | `i` | int32   | `i32`     |
//! | `l` | int64   | `i64`     |
//! | `s` | string  | `String`  |
//!
//! Custom value types ride on one of these tags through their serializer,
//! usually [`TypeTag::String`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TypeError};

/// Wire type of a stored preference value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    #[serde(rename = "b")]
    Boolean,
    #[serde(rename = "d")]
    Double,
    #[serde(rename = "f")]
    Float,
    #[serde(rename = "i")]
    Int,
    #[serde(rename = "l")]
    Long,
    #[serde(rename = "s")]
    String,
}

impl TypeTag {
    /// All known tags, in wire-character order.
    pub const ALL: [TypeTag; 6] = [
        TypeTag::Boolean,
        TypeTag::Double,
        TypeTag::Float,
        TypeTag::Int,
        TypeTag::Long,
        TypeTag::String,
    ];

    /// The single character written to disk for this tag.
    pub const fn as_char(self) -> char {
        match self {
            TypeTag::Boolean => 'b',
            TypeTag::Double => 'd',
            TypeTag::Float => 'f',
            TypeTag::Int => 'i',
            TypeTag::Long => 'l',
            TypeTag::String => 's',
        }
    }

    /// Human-readable name of the kind.
    pub const fn name(self) -> &'static str {
        match self {
            TypeTag::Boolean => "boolean",
            TypeTag::Double => "double",
            TypeTag::Float => "float",
            TypeTag::Int => "int",
            TypeTag::Long => "long",
            TypeTag::String => "string",
        }
    }

    /// Look up a tag by its wire character.
    pub fn from_char(c: char) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_char() == c)
            .ok_or_else(|| TypeError::UnknownTypeTag(c.to_string()))
    }

    /// Whether values of this kind go through the string codec on disk.
    pub const fn is_string(self) -> bool {
        matches!(self, TypeTag::String)
    }

    /// Check that `raw` is valid canonical text for this kind.
    ///
    /// String values are always valid here; their escaping is the codec's
    /// concern, not the registry's.
    pub fn check_value(self, raw: &str) -> Result<()> {
        let parsed = match self {
            TypeTag::Boolean => match raw {
                "true" | "false" => Ok(()),
                _ => Err("expected `true` or `false`".to_string()),
            },
            TypeTag::Double => raw.parse::<f64>().map(drop).map_err(|e| e.to_string()),
            TypeTag::Float => raw.parse::<f32>().map(drop).map_err(|e| e.to_string()),
            TypeTag::Int => raw.parse::<i32>().map(drop).map_err(|e| e.to_string()),
            TypeTag::Long => raw.parse::<i64>().map(drop).map_err(|e| e.to_string()),
            TypeTag::String => Ok(()),
        };
        parsed.map_err(|reason| TypeError::InvalidValue {
            tag: self,
            raw: raw.to_string(),
            reason,
        })
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for TypeTag {
    type Err = TypeError;

    /// Parse a tag from its wire form. Exactly one character is accepted.
    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => Err(TypeError::UnknownTypeTag(s.to_string())),
        }
    }
}
