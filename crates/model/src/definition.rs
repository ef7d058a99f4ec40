//! Model definitions.
//!
//! A `Definition` is the ordered schema a model type is built from. Each
//! entry maps a field name to a default value, a nested model or collection
//! type, or a function. Classification into properties, computed fields,
//! methods and relations happens later, in [`crate::interpret`].

use crate::collection::CollectionType;
use crate::model::{Model, ModelType};
use knockup_core::{naming, Object, Value};
use std::fmt;
use std::rc::Rc;

/// A function stored in a definition.
///
/// Readers are invoked with no arguments, writers with the written value as
/// the single argument, and methods with whatever the caller passes.
pub type Callable = Rc<dyn Fn(&Model, &[Value]) -> Value>;

/// The value side of a definition entry.
#[derive(Clone)]
pub enum DefinitionValue {
    /// A default value; lists become observable lists.
    Value(Value),
    /// A nested model type, instantiated once per owner.
    Model(ModelType),
    /// A nested collection type, instantiated once per owner.
    Collection(CollectionType),
    /// A function classified by its key: `read<Name>` and `write<Name>` keys
    /// declare computed fields, anything else is a method.
    Function(Callable),
    /// A function that is always a method, whatever its key looks like.
    Method(Callable),
}

impl DefinitionValue {
    /// Returns true for nested model and collection types.
    #[inline]
    pub fn is_relation(&self) -> bool {
        matches!(self, DefinitionValue::Model(_) | DefinitionValue::Collection(_))
    }

    /// Returns true for functions and methods.
    #[inline]
    pub fn is_callable(&self) -> bool {
        matches!(self, DefinitionValue::Function(_) | DefinitionValue::Method(_))
    }
}

impl fmt::Debug for DefinitionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            DefinitionValue::Model(_) => f.write_str("Model(..)"),
            DefinitionValue::Collection(_) => f.write_str("Collection(..)"),
            DefinitionValue::Function(_) => f.write_str("Function(..)"),
            DefinitionValue::Method(_) => f.write_str("Method(..)"),
        }
    }
}

impl From<Value> for DefinitionValue {
    fn from(value: Value) -> Self {
        DefinitionValue::Value(value)
    }
}

impl From<ModelType> for DefinitionValue {
    fn from(model: ModelType) -> Self {
        DefinitionValue::Model(model)
    }
}

impl From<CollectionType> for DefinitionValue {
    fn from(collection: CollectionType) -> Self {
        DefinitionValue::Collection(collection)
    }
}

/// An ordered schema of named entries.
///
/// # Example
///
/// ```
/// use knockup_model::{Definition, ModelType};
/// use knockup_core::Value;
///
/// let person = ModelType::new(
///     Definition::new()
///         .property("forename", "")
///         .property("surname", "")
///         .reader("name", |m| {
///             format!("{} {}", m.get("forename"), m.get("surname")).into()
///         }),
/// );
///
/// let ann = person.create(knockup_core::object! { "forename" => "Ann", "surname" => "Lee" });
/// assert_eq!(ann.get("name"), Value::from("Ann Lee"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Definition {
    entries: Vec<(String, DefinitionValue)>,
}

impl Definition {
    /// Creates an empty definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Gets an entry by key.
    pub fn get(&self, key: &str) -> Option<&DefinitionValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns true if `key` is defined.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Returns the keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Returns the entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DefinitionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Sets an entry. An existing key keeps its position.
    ///
    /// Returns the previous value, if any.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<DefinitionValue>,
    ) -> Option<DefinitionValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Removes an entry by key.
    pub fn remove(&mut self, key: &str) -> Option<DefinitionValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Copies every entry of `other` whose key is not defined here.
    ///
    /// Returns the number of entries copied.
    pub fn merge_missing(&mut self, other: &Definition) -> usize {
        let mut added = 0;
        for (key, value) in &other.entries {
            if !self.contains_key(key) {
                self.entries.push((key.clone(), value.clone()));
                added += 1;
            }
        }
        added
    }

    // ==================== Builder ====================

    /// Adds a property with a default value.
    pub fn property(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.insert(name, DefinitionValue::Value(default.into()));
        self
    }

    /// Adds a nested model or collection type.
    pub fn relation(mut self, name: impl Into<String>, kind: impl Into<DefinitionValue>) -> Self {
        self.insert(name, kind);
        self
    }

    /// Adds a function entry, classified by its key.
    pub fn function<F>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Model, &[Value]) -> Value + 'static,
    {
        self.insert(key, DefinitionValue::Function(Rc::new(f)));
        self
    }

    /// Adds a method. The key is never treated as an accessor.
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Model, &[Value]) -> Value + 'static,
    {
        self.insert(name, DefinitionValue::Method(Rc::new(f)));
        self
    }

    /// Adds the read side of the computed field `name`.
    pub fn reader<R>(mut self, name: &str, read: R) -> Self
    where
        R: Fn(&Model) -> Value + 'static,
    {
        let read: Callable = Rc::new(move |model, _| read(model));
        self.insert(naming::to_reader(name), DefinitionValue::Function(read));
        self
    }

    /// Adds the write side of the computed field `name`.
    pub fn writer<W>(mut self, name: &str, write: W) -> Self
    where
        W: Fn(&Model, Value) + 'static,
    {
        let write: Callable = Rc::new(move |model, args| {
            write(model, args.first().cloned().unwrap_or_default());
            Value::Null
        });
        self.insert(naming::to_writer(name), DefinitionValue::Function(write));
        self
    }

    /// Adds both sides of the computed field `name`.
    pub fn computed<R, W>(self, name: &str, read: R, write: W) -> Self
    where
        R: Fn(&Model) -> Value + 'static,
        W: Fn(&Model, Value) + 'static,
    {
        self.reader(name, read).writer(name, write)
    }
}

impl From<Object> for Definition {
    /// Every entry of a plain object becomes a property default.
    fn from(object: Object) -> Self {
        object
            .into_iter()
            .map(|(k, v)| (k, DefinitionValue::Value(v)))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, DefinitionValue)> for Definition {
    fn from_iter<I: IntoIterator<Item = (K, DefinitionValue)>>(iter: I) -> Self {
        let mut definition = Definition::new();
        for (key, value) in iter {
            definition.insert(key, value);
        }
        definition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_preserves_order() {
        let def = Definition::new()
            .property("b", 1)
            .property("a", 2)
            .method("c", |_, _| Value::Null);

        let keys: Vec<_> = def.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(def.len(), 3);
    }

    #[test]
    fn test_definition_insert_replaces_in_place() {
        let mut def = Definition::new().property("a", 1).property("b", 2);
        let old = def.insert("a", Value::from(3));

        assert!(matches!(old, Some(DefinitionValue::Value(Value::Int64(1)))));
        assert_eq!(def.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(matches!(def.get("a"), Some(DefinitionValue::Value(Value::Int64(3)))));
    }

    #[test]
    fn test_definition_accessor_keys() {
        let def = Definition::new()
            .computed("fullName", |_| Value::Null, |_, _| {})
            .reader("greeting", |_| Value::Null);

        assert!(def.contains_key("readFullName"));
        assert!(def.contains_key("writeFullName"));
        assert!(def.contains_key("readGreeting"));
        assert!(def.get("readGreeting").is_some_and(DefinitionValue::is_callable));
    }

    #[test]
    fn test_definition_merge_missing() {
        let mut target = Definition::new().property("a", 1);
        let source = Definition::new().property("a", 2).property("b", 3);

        assert_eq!(target.merge_missing(&source), 1);
        assert!(matches!(target.get("a"), Some(DefinitionValue::Value(Value::Int64(1)))));
        assert!(matches!(target.get("b"), Some(DefinitionValue::Value(Value::Int64(3)))));
    }

    #[test]
    fn test_definition_from_object() {
        let def = Definition::from(knockup_core::object! { "name" => "", "tags" => Vec::<Value>::new() });
        assert_eq!(def.len(), 2);
        assert!(def.get("tags").is_some_and(|v| !v.is_relation()));
    }

    #[test]
    fn test_definition_remove() {
        let mut def = Definition::new().property("a", 1);
        assert!(def.remove("a").is_some());
        assert!(def.remove("a").is_none());
        assert!(def.is_empty());
    }
}
