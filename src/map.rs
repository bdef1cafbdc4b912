//! Ordered map backing [`Value::Object`](crate::Value::Object).
//!
//! Members are written in insertion order. Being index-addressable is what lets a
//! suspended object write resume at the member it stopped in.
//!
//! ```rust
//! use chunked_json::{Map, Value};
//!
//! let mut map = Map::new();
//! map.insert("name".to_string(), Value::from("Alice"));
//! map.insert("age".to_string(), Value::from(30));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use crate::composite::{write_object, JsonObject};
use crate::{JsonWrite, Result, Value, WriterState};
use indexmap::IndexMap;

/// An insertion-ordered map of member names to values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Map(IndexMap<String, Value>);

impl Map {
    #[must_use]
    pub fn new() -> Self {
        Map(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Map(IndexMap::with_capacity(capacity))
    }

    /// Inserts a member, returning the previous value under that name.
    ///
    /// A replaced member keeps its original position.
    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.0.keys()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl JsonObject for Map {
    fn member_count(&self) -> usize {
        self.0.len()
    }

    fn member(&self, index: usize) -> Option<(&str, &dyn JsonWrite)> {
        self.0
            .get_index(index)
            .map(|(name, value)| (name.as_str(), value as &dyn JsonWrite))
    }
}

impl JsonWrite for Map {
    fn write_json(&self, state: &mut WriterState<'_>) -> Result<bool> {
        write_object(self, state)
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Map {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for Map {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Map(IndexMap::from_iter(iter))
    }
}
