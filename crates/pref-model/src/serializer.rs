//! Conversion between typed values and stored text.
//!
//! A serializer produces the *unescaped* text of a value. When its wire type
//! is [`TypeTag::String`] the cell runs that text through the string codec
//! before handing it to the datastore, so serializers never deal with
//! quoting themselves.

use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use pref_types::{TypeError, TypeTag};

/// Converts values of `V` to and from their stored text.
pub trait ValueSerializer<V>: Send + Sync {
    /// The wire type this serializer stores values under.
    fn wire_type(&self) -> TypeTag;

    fn serialize(&self, value: &V) -> String;

    fn deserialize(&self, raw: &str) -> Result<V, TypeError>;
}

/// A value with a built-in wire type.
pub trait PrimitiveValue: Clone + Send + Sync + 'static {
    const TAG: TypeTag;

    fn to_raw(&self) -> String;

    fn from_raw(raw: &str) -> Result<Self, TypeError>;
}

fn invalid(tag: TypeTag, raw: &str, reason: impl Display) -> TypeError {
    TypeError::InvalidValue {
        tag,
        raw: raw.to_string(),
        reason: reason.to_string(),
    }
}

impl PrimitiveValue for bool {
    const TAG: TypeTag = TypeTag::Boolean;

    fn to_raw(&self) -> String {
        self.to_string()
    }

    fn from_raw(raw: &str) -> Result<Self, TypeError> {
        raw.parse().map_err(|e| invalid(Self::TAG, raw, e))
    }
}

macro_rules! numeric_primitive {
    ($ty:ty, $tag:expr) => {
        impl PrimitiveValue for $ty {
            const TAG: TypeTag = $tag;

            fn to_raw(&self) -> String {
                self.to_string()
            }

            fn from_raw(raw: &str) -> Result<Self, TypeError> {
                raw.parse().map_err(|e| invalid(Self::TAG, raw, e))
            }
        }
    };
}

numeric_primitive!(i32, TypeTag::Int);
numeric_primitive!(i64, TypeTag::Long);
numeric_primitive!(f32, TypeTag::Float);
numeric_primitive!(f64, TypeTag::Double);

impl PrimitiveValue for String {
    const TAG: TypeTag = TypeTag::String;

    fn to_raw(&self) -> String {
        self.clone()
    }

    fn from_raw(raw: &str) -> Result<Self, TypeError> {
        Ok(raw.to_string())
    }
}

/// Serializer for the built-in kinds.
pub struct PrimitiveSerializer<V>(PhantomData<fn() -> V>);

impl<V> PrimitiveSerializer<V> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<V> Default for PrimitiveSerializer<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: PrimitiveValue> ValueSerializer<V> for PrimitiveSerializer<V> {
    fn wire_type(&self) -> TypeTag {
        V::TAG
    }

    fn serialize(&self, value: &V) -> String {
        value.to_raw()
    }

    fn deserialize(&self, raw: &str) -> Result<V, TypeError> {
        V::from_raw(raw)
    }
}

/// Stores any `Display + FromStr` type as a string.
///
/// Suited to enums and newtypes whose textual form is stable across
/// releases.
pub struct FromStrSerializer<V>(PhantomData<fn() -> V>);

impl<V> FromStrSerializer<V> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<V> Default for FromStrSerializer<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ValueSerializer<V> for FromStrSerializer<V>
where
    V: Display + FromStr,
    V::Err: Display,
{
    fn wire_type(&self) -> TypeTag {
        TypeTag::String
    }

    fn serialize(&self, value: &V) -> String {
        value.to_string()
    }

    fn deserialize(&self, raw: &str) -> Result<V, TypeError> {
        raw.parse().map_err(|e| invalid(TypeTag::String, raw, e))
    }
}

type SerializeFn<V> = Box<dyn Fn(&V) -> String + Send + Sync>;
type DeserializeFn<V> = Box<dyn Fn(&str) -> Result<V, String> + Send + Sync>;

/// Serializer assembled from a pair of closures.
pub struct CustomSerializer<V> {
    wire_type: TypeTag,
    serialize: SerializeFn<V>,
    deserialize: DeserializeFn<V>,
}

impl<V> CustomSerializer<V> {
    /// Build a serializer storing values under `wire_type`.
    ///
    /// The produced text must be valid for `wire_type`; for numeric wire
    /// types that means the canonical decimal form.
    pub fn new<S, D>(wire_type: TypeTag, serialize: S, deserialize: D) -> Self
    where
        S: Fn(&V) -> String + Send + Sync + 'static,
        D: Fn(&str) -> Result<V, String> + Send + Sync + 'static,
    {
        Self {
            wire_type,
            serialize: Box::new(serialize),
            deserialize: Box::new(deserialize),
        }
    }
}

impl<V> ValueSerializer<V> for CustomSerializer<V> {
    fn wire_type(&self) -> TypeTag {
        self.wire_type
    }

    fn serialize(&self, value: &V) -> String {
        (self.serialize)(value)
    }

    fn deserialize(&self, raw: &str) -> Result<V, TypeError> {
        (self.deserialize)(raw).map_err(|reason| invalid(self.wire_type, raw, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_tags() {
        assert_eq!(PrimitiveSerializer::<bool>::new().wire_type(), TypeTag::Boolean);
        assert_eq!(PrimitiveSerializer::<f64>::new().wire_type(), TypeTag::Double);
        assert_eq!(PrimitiveSerializer::<f32>::new().wire_type(), TypeTag::Float);
        assert_eq!(PrimitiveSerializer::<i32>::new().wire_type(), TypeTag::Int);
        assert_eq!(PrimitiveSerializer::<i64>::new().wire_type(), TypeTag::Long);
        assert_eq!(PrimitiveSerializer::<String>::new().wire_type(), TypeTag::String);
    }

    #[test]
    fn canonical_text() {
        assert_eq!(true.to_raw(), "true");
        assert_eq!((-567i32).to_raw(), "-567");
        assert_eq!(3_000_000_000i64.to_raw(), "3000000000");
        assert_eq!(1.5f32.to_raw(), "1.5");
        assert_eq!(0.1f64.to_raw(), "0.1");
    }

    #[test]
    fn parse_canonical_text() {
        assert_eq!(i32::from_raw("46").unwrap(), 46);
        assert!(!bool::from_raw("false").unwrap());
        assert_eq!(f64::from_raw("2.25").unwrap(), 2.25);
    }

    #[test]
    fn empty_numeric_is_invalid() {
        assert!(matches!(
            i32::from_raw(""),
            Err(TypeError::InvalidValue { tag: TypeTag::Int, .. })
        ));
        assert!(f32::from_raw("").is_err());
        assert!(bool::from_raw("").is_err());
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Theme {
        Light,
        Dark,
    }

    impl std::fmt::Display for Theme {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(match self {
                Theme::Light => "light",
                Theme::Dark => "dark",
            })
        }
    }

    impl FromStr for Theme {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "light" => Ok(Theme::Light),
                "dark" => Ok(Theme::Dark),
                other => Err(format!("unknown theme {other}")),
            }
        }
    }

    #[test]
    fn from_str_serializer() {
        let ser = FromStrSerializer::<Theme>::new();
        assert_eq!(ser.wire_type(), TypeTag::String);
        assert_eq!(ser.serialize(&Theme::Dark), "dark");
        assert_eq!(ser.deserialize("light").unwrap(), Theme::Light);
        assert!(ser.deserialize("sepia").is_err());
    }

    #[test]
    fn custom_serializer_over_long() {
        let ser = CustomSerializer::new(
            TypeTag::Long,
            |d: &std::time::Duration| d.as_millis().to_string(),
            |raw| {
                raw.parse::<u64>()
                    .map(std::time::Duration::from_millis)
                    .map_err(|e| e.to_string())
            },
        );
        let d = std::time::Duration::from_millis(1500);
        assert_eq!(ser.wire_type(), TypeTag::Long);
        assert_eq!(ser.serialize(&d), "1500");
        assert_eq!(ser.deserialize("1500").unwrap(), d);
        assert!(ser.deserialize("soon").is_err());
    }
}
