//! Runtime writer lookup for values whose type is only known at runtime.
//!
//! Statically typed values dispatch through their [`JsonWrite`] impl. A `&dyn Any`
//! has no such impl, so a [`Registry`] maps its concrete [`TypeId`] to the writer
//! registered for that type. [`Dynamic`] pairs a registry with a value and is
//! itself a [`JsonWrite`], so dynamic values nest inside typed ones.

use crate::chunked::Bytes;
use crate::{Error, JsonWrite, Map, Result, Value, WriterState};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use num_bigint::BigInt;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

type ErasedWrite = fn(&dyn Any, &mut WriterState<'_>) -> Result<bool>;

fn write_erased<T: JsonWrite + Any>(value: &dyn Any, state: &mut WriterState<'_>) -> Result<bool> {
    match value.downcast_ref::<T>() {
        Some(value) => value.write_json(state),
        None => Err(Error::unsupported_type(type_name::<T>())),
    }
}

#[derive(Clone, Copy)]
struct Entry {
    name: &'static str,
    write: ErasedWrite,
}

/// Maps concrete types to their writers.
///
/// # Examples
///
/// ```rust
/// use chunked_json::{to_string, Dynamic, Registry};
/// use std::any::Any;
///
/// let registry = Registry::with_defaults();
/// let values: Vec<Box<dyn Any>> = vec![Box::new(1u8), Box::new("two".to_string())];
/// let items: Vec<Dynamic<'_>> = values
///     .iter()
///     .map(|value| Dynamic::new(&registry, &**value))
///     .collect();
/// assert_eq!(to_string(&items).unwrap(), r#"[1,"two"]"#);
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    writers: HashMap<TypeId, Entry>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Registry {
            writers: HashMap::new(),
        }
    }

    /// Creates a registry that knows every built-in scalar, text and value type.
    pub fn with_defaults() -> Self {
        let mut registry = Registry::new();
        registry
            .register::<bool>()
            .register::<()>()
            .register::<i8>()
            .register::<i16>()
            .register::<i32>()
            .register::<i64>()
            .register::<i128>()
            .register::<isize>()
            .register::<u8>()
            .register::<u16>()
            .register::<u32>()
            .register::<u64>()
            .register::<u128>()
            .register::<usize>()
            .register::<f32>()
            .register::<f64>()
            .register::<char>()
            .register::<String>()
            .register::<&'static str>()
            .register::<Bytes<Vec<u8>>>()
            .register::<DateTime<Utc>>()
            .register::<NaiveDate>()
            .register::<NaiveDateTime>()
            .register::<Uuid>()
            .register::<BigInt>()
            .register::<Value>()
            .register::<Vec<Value>>()
            .register::<Map>();
        registry
    }

    /// Registers `T`'s writer, replacing any earlier registration for `T`.
    pub fn register<T: JsonWrite + Any>(&mut self) -> &mut Self {
        self.writers.insert(
            TypeId::of::<T>(),
            Entry {
                name: type_name::<T>(),
                write: write_erased::<T>,
            },
        );
        self
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.writers.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }

    /// Writes `value` with the writer registered for its concrete type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] if nothing is registered for the type.
    pub fn write(&self, value: &dyn Any, state: &mut WriterState<'_>) -> Result<bool> {
        match self.writers.get(&value.type_id()) {
            Some(entry) => (entry.write)(value, state),
            None => Err(Error::unsupported_type("no writer registered for this type")),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.writers.values().map(|entry| entry.name).collect();
        names.sort_unstable();
        f.debug_struct("Registry").field("types", &names).finish()
    }
}

/// A type-erased value written through a [`Registry`].
#[derive(Clone, Copy)]
pub struct Dynamic<'a> {
    registry: &'a Registry,
    value: &'a dyn Any,
}

impl<'a> Dynamic<'a> {
    pub fn new(registry: &'a Registry, value: &'a dyn Any) -> Self {
        Dynamic { registry, value }
    }
}

impl fmt::Debug for Dynamic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dynamic")
            .field("type_id", &self.value.type_id())
            .finish()
    }
}

impl JsonWrite for Dynamic<'_> {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        self.registry.write(self.value, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{to_string, write_to_completion, BufferSink, WriterOptions};

    struct Celsius(f64);

    impl JsonWrite for Celsius {
        fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
            self.0.write_json(state)
        }
    }

    #[test]
    fn test_unregistered_type_is_rejected() {
        let registry = Registry::with_defaults();
        let value = Celsius(21.5);
        let err = to_string(&Dynamic::new(&registry, &value)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
    }

    #[test]
    fn test_register_custom_type() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());
        registry.register::<Celsius>();
        assert!(registry.contains::<Celsius>());
        assert!(!registry.contains::<i32>());

        let value = Celsius(21.5);
        assert_eq!(to_string(&Dynamic::new(&registry, &value)).unwrap(), "21.5");
    }

    #[test]
    fn test_dynamic_text_resumes_across_calls() {
        let registry = Registry::with_defaults();
        let text = "\"quoted\" ".repeat(100);
        let dynamic = Dynamic::new(&registry, &text);

        let mut sink = BufferSink::with_capacity(Vec::new(), 16);
        let mut state = WriterState::new(&mut sink, WriterOptions::new());
        let completion = write_to_completion(&dynamic, &mut state).unwrap();
        assert!(completion.calls > 1);
        state.flush().unwrap();
        drop(state);
        assert_eq!(
            String::from_utf8(sink.into_inner()).unwrap(),
            to_string(&text).unwrap()
        );
    }

    #[test]
    fn test_defaults_cover_value_types() {
        let registry = Registry::with_defaults();
        assert!(registry.contains::<Value>());
        assert!(registry.contains::<Bytes<Vec<u8>>>());
        let bytes = Bytes(vec![0xffu8, 0xfe]);
        assert_eq!(to_string(&Dynamic::new(&registry, &bytes)).unwrap(), "\"//4=\"");
    }
}
