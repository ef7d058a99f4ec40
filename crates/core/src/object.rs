//! Object type for plain model data.
//!
//! Exports, imports and query documents are objects. Keys are kept sorted so
//! that lookups are `O(log n)` and iteration order is stable for a given key
//! set regardless of insertion order.

use crate::value::Value;
use alloc::string::String;
use alloc::vec::Vec;

/// A string-keyed map of values with keys sorted for efficient lookup.
#[derive(Clone, Debug, Default)]
pub struct Object {
    /// Entries stored sorted by key for binary search
    entries: Vec<(String, Value)>,
}

impl Object {
    /// Creates a new empty Object.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates an Object with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the object is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Result<usize, usize> {
        self.entries.binary_search_by(|(k, _)| k.as_str().cmp(key))
    }

    /// Gets a value by key using binary search. O(log n)
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.position(key).ok().map(|idx| &self.entries[idx].1)
    }

    /// Gets a mutable value by key using binary search. O(log n)
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.position(key).ok().map(|idx| &mut self.entries[idx].1)
    }

    /// Inserts a key-value pair, maintaining sorted order.
    ///
    /// Returns the previous value stored under `key`, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.position(&key) {
            Ok(idx) => Some(core::mem::replace(&mut self.entries[idx].1, value)),
            Err(idx) => {
                self.entries.insert(idx, (key, value));
                None
            }
        }
    }

    /// Removes a key and returns its value if present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.position(key).ok().map(|idx| self.entries.remove(idx).1)
    }

    /// Returns true if the object contains the given key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_ok()
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Returns an iterator over key-value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        self.entries
            .iter()
            .zip(other.entries.iter())
            .all(|((k1, v1), (k2, v2))| k1 == k2 && v1 == v2)
    }
}

impl<K, V> FromIterator<(K, V)> for Object
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut obj = Object::new();
        for (k, v) in iter {
            obj.insert(k, v.into());
        }
        obj
    }
}

impl IntoIterator for Object {
    type Item = (String, Value);
    type IntoIter = alloc::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
