//! Definition interpreter.
//!
//! Walks a [`Definition`] in declaration order and sorts every entry into
//! one of four tables:
//!
//! 1. nested model and collection types become relations;
//! 2. functions keyed `read<Name>` / `write<Name>` become the read or write
//!    side of the computed field `name`;
//! 3. any other function becomes a method;
//! 4. everything else becomes a property whose value is the default.
//!
//! Interpretation never fails. A reader without a writer is a read-only
//! computed field, a writer without a reader is write-only.

use crate::collection::CollectionType;
use crate::definition::{Callable, Definition, DefinitionValue};
use crate::model::ModelType;
use knockup_core::naming::{self, Accessor};
use knockup_core::Value;

/// The two sides of a computed field.
#[derive(Clone, Default)]
pub struct ComputedEntry {
    pub read: Option<Callable>,
    pub write: Option<Callable>,
}

impl ComputedEntry {
    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.write.is_none()
    }
}

/// A nested type declared by a relation entry.
#[derive(Clone)]
pub enum RelationType {
    Model(ModelType),
    Collection(CollectionType),
}

/// Which table a field name landed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Property,
    Computed,
    Method,
    Relation,
}

/// The classified entries of a definition, each table in declaration order.
#[derive(Clone, Default)]
pub struct Tables {
    pub properties: Vec<(String, Value)>,
    pub computed: Vec<(String, ComputedEntry)>,
    pub methods: Vec<(String, Callable)>,
    pub relations: Vec<(String, RelationType)>,
}

impl Tables {
    /// Returns the total number of fields.
    pub fn len(&self) -> usize {
        self.properties.len() + self.computed.len() + self.methods.len() + self.relations.len()
    }

    /// Returns true if no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the default value of a property.
    pub fn property(&self, name: &str) -> Option<&Value> {
        lookup(&self.properties, name)
    }

    /// Returns a computed entry.
    pub fn computed(&self, name: &str) -> Option<&ComputedEntry> {
        lookup(&self.computed, name)
    }

    /// Returns a method.
    pub fn method(&self, name: &str) -> Option<&Callable> {
        lookup(&self.methods, name)
    }

    /// Returns a relation type.
    pub fn relation(&self, name: &str) -> Option<&RelationType> {
        lookup(&self.relations, name)
    }

    /// Returns the tables `name` appears in. A property and a computed
    /// field may share a name; the computed field then shadows the property
    /// on instances.
    pub fn kinds(&self, name: &str) -> Vec<FieldKind> {
        let mut kinds = Vec::new();
        if self.property(name).is_some() {
            kinds.push(FieldKind::Property);
        }
        if self.computed(name).is_some() {
            kinds.push(FieldKind::Computed);
        }
        if self.method(name).is_some() {
            kinds.push(FieldKind::Method);
        }
        if self.relation(name).is_some() {
            kinds.push(FieldKind::Relation);
        }
        kinds
    }

    /// Returns the names that appear in an export: properties, computed
    /// fields and relations, without duplicates.
    pub fn exported_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.len());
        let candidates = self
            .properties
            .iter()
            .map(|(k, _)| k.as_str())
            .chain(self.computed.iter().map(|(k, _)| k.as_str()))
            .chain(self.relations.iter().map(|(k, _)| k.as_str()));
        for name in candidates {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

fn lookup<'a, T>(table: &'a [(String, T)], name: &str) -> Option<&'a T> {
    table.iter().find(|(k, _)| k == name).map(|(_, v)| v)
}

/// Classifies every entry of `definition`.
pub fn interpret(definition: &Definition) -> Tables {
    let mut tables = Tables::default();

    for (key, value) in definition.iter() {
        match value {
            DefinitionValue::Model(model) => {
                tables.relations.push((key.to_string(), RelationType::Model(model.clone())));
            }
            DefinitionValue::Collection(collection) => {
                tables
                    .relations
                    .push((key.to_string(), RelationType::Collection(collection.clone())));
            }
            DefinitionValue::Function(f) => match naming::classify(key) {
                Some((side, canonical)) => {
                    let index = match tables.computed.iter().position(|(k, _)| *k == canonical) {
                        Some(index) => index,
                        None => {
                            tables.computed.push((canonical, ComputedEntry::default()));
                            tables.computed.len() - 1
                        }
                    };
                    let entry = &mut tables.computed[index].1;
                    match side {
                        Accessor::Read => entry.read = Some(f.clone()),
                        Accessor::Write => entry.write = Some(f.clone()),
                    }
                }
                None => tables.methods.push((key.to_string(), f.clone())),
            },
            DefinitionValue::Method(f) => tables.methods.push((key.to_string(), f.clone())),
            DefinitionValue::Value(v) => tables.properties.push((key.to_string(), v.clone())),
        }
    }

    tracing::trace!(
        properties = tables.properties.len(),
        computed = tables.computed.len(),
        methods = tables.methods.len(),
        relations = tables.relations.len(),
        "interpreted definition"
    );
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelType;

    fn noop() -> impl Fn(&crate::Model, &[Value]) -> Value {
        |_, _| Value::Null
    }

    #[test]
    fn test_interpret_classifies_each_kind() {
        let child = ModelType::new(Definition::new().property("x", 0));
        let def = Definition::new()
            .property("name", "")
            .property("tags", Vec::<Value>::new())
            .relation("child", child.clone())
            .relation("children", child.collection())
            .function("readGreeting", noop())
            .function("shout", noop());

        let tables = interpret(&def);

        assert_eq!(tables.properties.len(), 2);
        assert_eq!(tables.relations.len(), 2);
        assert_eq!(tables.methods.len(), 1);
        assert_eq!(tables.computed.len(), 1);
        assert_eq!(tables.kinds("greeting"), vec![FieldKind::Computed]);
        assert_eq!(tables.kinds("shout"), vec![FieldKind::Method]);
        assert!(tables.property("tags").is_some_and(Value::is_list));
    }

    #[test]
    fn test_interpret_pairs_reader_and_writer() {
        let def = Definition::new()
            .function("readName", noop())
            .property("forename", "")
            .function("writeName", noop())
            .function("readAge", noop());

        let tables = interpret(&def);

        assert_eq!(tables.computed.len(), 2);
        assert!(!tables.computed("name").is_some_and(ComputedEntry::is_read_only));
        assert!(tables.computed("age").is_some_and(ComputedEntry::is_read_only));
    }

    #[test]
    fn test_interpret_write_only_computed() {
        let def = Definition::new().function("writeName", noop());
        let tables = interpret(&def);
        let entry = tables.computed("name");

        assert!(entry.is_some_and(|e| e.read.is_none() && e.write.is_some()));
    }

    #[test]
    fn test_interpret_prefix_needs_uppercase() {
        let def = Definition::new()
            .function("ready", noop())
            .function("writer", noop());

        let tables = interpret(&def);

        assert!(tables.computed.is_empty());
        assert_eq!(tables.methods.len(), 2);
    }

    #[test]
    fn test_interpret_explicit_method_keeps_accessor_name() {
        let def = Definition::new().method("readAll", noop());
        let tables = interpret(&def);

        assert!(tables.computed.is_empty());
        assert!(tables.method("readAll").is_some());
    }

    #[test]
    fn test_exported_names_deduplicates() {
        let def = Definition::new()
            .property("name", "")
            .function("readName", noop())
            .function("hello", noop());

        let tables = interpret(&def);

        assert_eq!(tables.exported_names(), vec!["name"]);
        assert_eq!(tables.len(), 3);
    }
}
