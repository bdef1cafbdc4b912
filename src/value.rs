//! Dynamic value representation.
//!
//! [`Value`] holds any tree the engine can write when the shape is not known at
//! compile time. It is what [`to_value`](crate::to_value) produces from a
//! `Serialize` type, and it implements [`JsonWrite`] itself, so a large dynamic
//! document is written with the same bounded-buffer guarantees as a typed one.
//!
//! ```rust
//! use chunked_json::{to_string, value, Value};
//!
//! let doc = value!({
//!     "name": "Alice",
//!     "tags": ["rust", "json"]
//! });
//! assert!(doc.is_object());
//! assert_eq!(to_string(&doc).unwrap(), r#"{"name":"Alice","tags":["rust","json"]}"#);
//! ```

use crate::chunked::{write_binary, write_text};
use crate::composite::{write_array, write_object};
use crate::map::Map;
use crate::{JsonWrite, Result, WriterState};
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Any value the engine can write.
///
/// Besides the JSON types it carries the scalar kinds that have a dedicated wire
/// form: binary data (base64), UTC instants (ISO-8601), big integers and GUIDs.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Object(Map),
    Date(DateTime<Utc>),
    BigInt(BigInt),
    Guid(Uuid),
}

/// A JSON number.
///
/// ```rust
/// use chunked_json::Number;
///
/// assert_eq!(Number::Integer(-3).as_i64(), Some(-3));
/// assert_eq!(Number::Unsigned(u64::MAX).as_i64(), None);
/// assert_eq!(Number::Float(2.0).as_i64(), Some(2));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Unsigned(u64),
    Float(f64),
}

impl Number {
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_) | Number::Unsigned(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Converts to `i64` when the value is a whole number in range.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Number::Integer(i) => Some(i),
            Number::Unsigned(u) => i64::try_from(u).ok(),
            Number::Float(f) => {
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    Some(f as i64)
                } else {
                    None
                }
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Integer(i) => i as f64,
            Number::Unsigned(u) => u as f64,
            Number::Float(f) => f,
        }
    }
}

impl JsonWrite for Number {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        match self {
            Number::Integer(i) => i.write_json(state),
            Number::Unsigned(u) => u.write_json(state),
            Number::Float(f) => f.write_json(state),
        }
    }
}

macro_rules! number_from {
    ($variant:ident as $target:ty: $($ty:ty),*) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Number::$variant(value as $target)
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(Number::from(value))
                }
            }
        )*
    };
}

number_from!(Integer as i64: i8, i16, i32, i64, isize);
number_from!(Unsigned as u64: u8, u16, u32, u64, usize);
number_from!(Float as f64: f32, f64);

impl Value {
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

/// Each variant delegates to the writer of the type it holds.
impl JsonWrite for Value {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        match self {
            Value::Null => ().write_json(state),
            Value::Bool(b) => b.write_json(state),
            Value::Number(n) => n.write_json(state),
            Value::String(s) => write_text(s, state),
            Value::Bytes(b) => write_binary(b, state),
            Value::Array(items) => write_array(items, state),
            Value::Object(map) => write_object(map, state),
            Value::Date(instant) => instant.write_json(state),
            Value::BigInt(big) => big.write_json(state),
            Value::Guid(id) => id.write_json(state),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Integer(i)) => serializer.serialize_i64(*i),
            Value::Number(Number::Unsigned(u)) => serializer.serialize_u64(*u),
            Value::Number(Number::Float(f)) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for element in arr {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (k, v) in obj.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Date(instant) => instant.serialize(serializer),
            Value::BigInt(big) => serializer.collect_str(big),
            Value::Guid(id) => serializer.collect_str(&id.hyphenated()),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| crate::Error::custom(format!("expected integer, found {:?}", value)))
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            _ => Err(crate::Error::custom(format!(
                "expected string, found {:?}",
                value
            ))),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Object(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Guid(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{to_string, write_to_completion, BufferSink, WriterOptions};
    use chrono::TimeZone;

    #[test]
    fn test_from_primitives() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42i32), Value::Number(Number::Integer(42)));
        assert_eq!(Value::from(42u64), Value::Number(Number::Unsigned(42)));
        assert_eq!(Value::from(3.5f64), Value::Number(Number::Float(3.5)));
        assert_eq!(Value::from("test"), Value::String("test".to_string()));
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn test_tryfrom() {
        assert_eq!(i64::try_from(Value::from(7u8)).unwrap(), 7);
        assert!(i64::try_from(Value::from("x")).is_err());
        assert_eq!(String::try_from(Value::from("x")).unwrap(), "x");
        assert!(String::try_from(Value::Null).is_err());
    }

    #[test]
    fn test_write_every_variant() {
        let mut map = Map::new();
        map.insert("k".to_string(), Value::Null);
        let instant = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        let doc = Value::Array(vec![
            Value::Null,
            Value::Bool(false),
            Value::from(-1i64),
            Value::from(u64::MAX),
            Value::from(0.5f64),
            Value::from("s"),
            Value::Bytes(vec![1, 2, 3]),
            Value::Object(map),
            Value::Date(instant),
            Value::BigInt(BigInt::from(10).pow(20)),
            Value::Guid(Uuid::nil()),
        ]);
        assert_eq!(
            to_string(&doc).unwrap(),
            concat!(
                r#"[null,false,-1,18446744073709551615,0.5,"s","AQID",{"k":null},"#,
                r#""2024-02-29T12:00:00Z",100000000000000000000,"00000000-0000-0000-0000-000000000000"]"#
            )
        );
    }

    #[test]
    fn test_large_value_with_small_sink() {
        let doc = Value::Array(
            (0..200)
                .map(|i| Value::String(format!("item \"{}\"", i)))
                .collect(),
        );
        let expected = to_string(&doc).unwrap();

        let mut sink = BufferSink::with_capacity(Vec::new(), 7);
        let mut state = WriterState::new(&mut sink, WriterOptions::new());
        let completion = write_to_completion(&doc, &mut state).unwrap();
        assert!(completion.calls >= 200);
        state.flush().unwrap();
        drop(state);
        assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), expected);
    }

    #[test]
    fn test_serialize_matches_writer() {
        let mut map = Map::new();
        map.insert("n".to_string(), Value::from(1i32));
        map.insert("list".to_string(), Value::from(vec![Value::from("a")]));
        let doc = Value::Object(map);
        assert_eq!(
            serde_json::to_string(&doc).unwrap(),
            to_string(&doc).unwrap()
        );
    }
}
