//! Queries for [`Collection::find`](crate::Collection::find).

use crate::model::Model;
use knockup_core::Object;
use std::fmt;
use std::rc::Rc;

/// Selects models from a collection.
#[derive(Clone)]
pub enum Query {
    /// Accepts a model when the predicate returns true. The second argument
    /// is the model's index in the collection being searched.
    Predicate(Rc<dyn Fn(&Model, usize) -> bool>),
    /// Accepts a model when every named field exists and equals the given
    /// value.
    Fields(Object),
}

impl Query {
    /// Creates a predicate query.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Model, usize) -> bool + 'static,
    {
        Query::Predicate(Rc::new(f))
    }

    /// Returns true if `model`, found at `index`, satisfies the query.
    pub fn matches(&self, model: &Model, index: usize) -> bool {
        match self {
            Query::Predicate(f) => f(model, index),
            Query::Fields(fields) => fields
                .iter()
                .all(|(name, expected)| model.value(name).is_some_and(|actual| actual == *expected)),
        }
    }
}

impl From<Object> for Query {
    fn from(fields: Object) -> Self {
        Query::Fields(fields)
    }
}

/// A model query matches on the model's exported fields.
impl From<&Model> for Query {
    fn from(model: &Model) -> Self {
        Query::Fields(model.export())
    }
}

impl From<Model> for Query {
    fn from(model: Model) -> Self {
        Query::from(&model)
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Predicate(_) => f.write_str("Predicate(..)"),
            Query::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Definition, ModelType};
    use knockup_core::{object, Value};

    fn task() -> ModelType {
        ModelType::new(
            Definition::new()
                .property("status", "open")
                .property("title", "")
                .reader("label", |m| format!("[{}] {}", m.get("status"), m.get("title")).into()),
        )
    }

    #[test]
    fn test_fields_query_exact_match() {
        let model = task().create(object! { "title" => "a" });

        assert!(Query::from(object! { "status" => "open" }).matches(&model, 0));
        assert!(!Query::from(object! { "status" => "closed" }).matches(&model, 0));
        assert!(Query::from(object! { "label" => "[open] a" }).matches(&model, 0));
    }

    #[test]
    fn test_fields_query_absent_field_excludes() {
        let model = task().create(Value::Null);
        assert!(!Query::from(object! { "owner" => Value::Null }).matches(&model, 0));
    }

    #[test]
    fn test_empty_fields_query_matches_all() {
        let model = task().create(Value::Null);
        assert!(Query::from(object! {}).matches(&model, 3));
    }

    #[test]
    fn test_predicate_query_gets_index() {
        let model = task().create(Value::Null);
        let odd = Query::predicate(|_, i| i % 2 == 1);

        assert!(!odd.matches(&model, 0));
        assert!(odd.matches(&model, 1));
    }

    #[test]
    fn test_model_query_uses_export() {
        let t = task();
        let probe = t.create(object! { "title" => "x" });
        let same = t.create(object! { "title" => "x" });
        let other = t.create(object! { "title" => "y" });

        let query = Query::from(&probe);
        assert!(query.matches(&same, 0));
        assert!(!query.matches(&other, 0));
    }
}
