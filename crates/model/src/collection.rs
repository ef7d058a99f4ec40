//! Collection types and instances.
//!
//! A `Collection` is an observable, ordered list of models of one type.
//! Raw data inserted into it is turned into models of that type, and every
//! inserted model takes the collection's parent as its own. Each mutation
//! fires exactly one [`Splice`] notification.
//!
//! Out-of-range reads return `None`, out-of-range replaces and removes do
//! nothing and inserts past the end append.

use crate::model::{Model, ModelInner, ModelType};
use crate::query::Query;
use knockup_core::Value;
use knockup_reactive::{ObservableList, Splice, SubscriptionId};
use std::cell::RefCell;
use std::fmt;
use std::ops::ControlFlow;
use std::rc::{Rc, Weak};

/// A collection type, bound to one model type.
#[derive(Clone)]
pub struct CollectionType {
    model_type: ModelType,
}

impl CollectionType {
    /// Creates the collection type for `model_type`.
    pub fn new(model_type: ModelType) -> Self {
        Self { model_type }
    }

    /// Returns the bound model type.
    #[inline]
    pub fn model_type(&self) -> &ModelType {
        &self.model_type
    }

    /// Returns true if both handles are bound to the same model type.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.model_type.ptr_eq(&other.model_type)
    }

    /// Returns true if `collection` was created by this type.
    pub fn is_instance(&self, collection: &Collection) -> bool {
        self.ptr_eq(&collection.inner.collection_type)
    }

    /// Builds a collection and imports `data` into it.
    ///
    /// `data` is a list of items, another collection (by reference), or
    /// `Value::Null` for an empty collection.
    pub fn create(&self, data: impl Into<Value>) -> Collection {
        let collection = Collection {
            inner: Rc::new(CollectionInner {
                collection_type: self.clone(),
                items: ObservableList::default(),
                parent: RefCell::new(Weak::new()),
            }),
        };
        let data = data.into();
        if !data.is_null() {
            collection.import(data);
        }
        collection
    }
}

impl fmt::Debug for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CollectionType").field(&self.model_type).finish()
    }
}

/// Something that can be stored in a collection.
pub enum Item {
    /// A live model. Models of another type are re-created from their export.
    Model(Model),
    /// Plain data, turned into a model of the bound type.
    Data(Value),
}

impl From<Model> for Item {
    fn from(model: Model) -> Self {
        Item::Model(model)
    }
}

impl From<&Model> for Item {
    fn from(model: &Model) -> Self {
        Item::Model(model.clone())
    }
}

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        Item::Data(value)
    }
}

impl From<knockup_core::Object> for Item {
    fn from(object: knockup_core::Object) -> Self {
        Item::Data(Value::Object(object))
    }
}

/// Identifies an element to remove: by index, or by identity.
#[derive(Clone, Copy)]
pub enum Position<'a> {
    Index(usize),
    Item(&'a Model),
}

impl From<usize> for Position<'_> {
    fn from(index: usize) -> Self {
        Position::Index(index)
    }
}

impl<'a> From<&'a Model> for Position<'a> {
    fn from(model: &'a Model) -> Self {
        Position::Item(model)
    }
}

struct CollectionInner {
    collection_type: CollectionType,
    items: ObservableList<Model>,
    parent: RefCell<Weak<ModelInner>>,
}

/// A live collection instance.
///
/// `Clone` copies the handle; both handles refer to the same collection.
#[derive(Clone)]
pub struct Collection {
    inner: Rc<CollectionInner>,
}

impl Collection {
    /// Returns the type this collection was created from.
    #[inline]
    pub fn collection_type(&self) -> &CollectionType {
        &self.inner.collection_type
    }

    /// Returns the model type of the elements.
    #[inline]
    pub fn model_type(&self) -> &ModelType {
        self.inner.collection_type.model_type()
    }

    /// Returns true if this collection was created from `collection_type`.
    pub fn is_instance_of(&self, collection_type: &CollectionType) -> bool {
        collection_type.is_instance(self)
    }

    /// Returns true if both handles refer to the same collection.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the owning model, if it is still alive.
    pub fn parent(&self) -> Option<Model> {
        Model::upgrade(&self.inner.parent.borrow())
    }

    /// Sets the owning model of the collection and of every element.
    pub fn set_parent(&self, parent: Option<&Model>) {
        *self.inner.parent.borrow_mut() = parent.map(Model::downgrade).unwrap_or_default();
        for item in self.inner.items.peek() {
            item.set_parent(parent);
        }
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.inner.items.len()
    }

    /// Returns true if the collection has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the element at `index`.
    pub fn at(&self, index: usize) -> Option<Model> {
        self.inner.items.at(index)
    }

    /// Returns the first element.
    pub fn first(&self) -> Option<Model> {
        self.at(0)
    }

    /// Returns the last element.
    pub fn last(&self) -> Option<Model> {
        self.len().checked_sub(1).and_then(|index| self.at(index))
    }

    /// Returns true if `index` is in range.
    pub fn has(&self, index: usize) -> bool {
        index < self.len()
    }

    /// Returns a snapshot of the elements.
    pub fn items(&self) -> Vec<Model> {
        self.inner.items.get()
    }

    /// Returns the index of `model`, compared by identity.
    pub fn index(&self, model: &Model) -> Option<usize> {
        self.inner
            .items
            .with(|items| items.iter().position(|item| item.ptr_eq(model)))
    }

    fn coerce(&self, item: Item) -> Model {
        let model_type = self.model_type();
        let model = match item {
            Item::Model(model) if model.is_instance_of(model_type) => model,
            Item::Model(other) => model_type.create(other.export()),
            Item::Data(data) => model_type.create(data),
        };
        model.set_parent(self.parent().as_ref());
        model
    }

    /// Inserts an item at `at`, shifting later elements up. `at` past the
    /// end appends.
    pub fn insert(&self, at: usize, item: impl Into<Item>) -> &Self {
        let model = self.coerce(item.into());
        self.inner.items.insert(at, model);
        self
    }

    /// Inserts an item before the first element.
    pub fn prepend(&self, item: impl Into<Item>) -> &Self {
        self.insert(0, item)
    }

    /// Inserts an item after the last element.
    pub fn append(&self, item: impl Into<Item>) -> &Self {
        let at = self.len();
        self.insert(at, item)
    }

    /// Replaces the element at `at`. Does nothing when `at` is out of range.
    pub fn replace(&self, at: usize, item: impl Into<Item>) -> &Self {
        if self.has(at) {
            let model = self.coerce(item.into());
            self.inner.items.replace(at, model);
        }
        self
    }

    /// Removes one element, by index or by identity.
    ///
    /// Returns the removed element, or None when there was nothing to
    /// remove.
    pub fn remove<'a>(&self, target: impl Into<Position<'a>>) -> Option<Model> {
        let index = match target.into() {
            Position::Index(index) => index,
            Position::Item(model) => self.index(model)?,
        };
        self.inner.items.remove(index)
    }

    /// Removes every element with one notification.
    pub fn empty(&self) -> &Self {
        self.inner.items.clear();
        self
    }

    /// Calls `f` for every element in order until it breaks.
    ///
    /// Iterates a snapshot, so `f` may mutate the collection.
    pub fn each<F>(&self, mut f: F) -> &Self
    where
        F: FnMut(usize, &Model) -> ControlFlow<()>,
    {
        for (index, model) in self.items().iter().enumerate() {
            if f(index, model).is_break() {
                break;
            }
        }
        self
    }

    /// Replaces the contents with `data` in one notification.
    ///
    /// `data` is a list of items or another collection (by reference).
    /// Importing the same data twice leaves the same contents.
    pub fn import(&self, data: impl Into<Value>) -> &Self {
        match data.into() {
            Value::List(items) => {
                let models: Vec<Model> = items
                    .into_iter()
                    .map(|item| self.coerce(Item::Data(item)))
                    .collect();
                self.inner.items.set(models);
            }
            Value::Null => {
                self.inner.items.clear();
            }
            other => {
                tracing::debug!(kind = ?other.kind(), "ignored non-list collection import");
            }
        }
        self
    }

    /// Returns the export of every element, in order.
    pub fn export(&self) -> Vec<Value> {
        self.items().iter().map(Value::from).collect()
    }

    /// Returns a new collection, with the same type and parent, holding the
    /// matching elements in their original order.
    ///
    /// With both `limit` and `page`, the first `limit * (page - 1)` matches
    /// are skipped. With `limit`, at most `limit` matches are kept. A limit
    /// or page of zero counts as absent. The source is not modified.
    pub fn find(
        &self,
        query: impl Into<Query>,
        limit: Option<usize>,
        page: Option<usize>,
    ) -> Collection {
        let query = query.into();
        let limit = limit.filter(|l| *l > 0);
        let skip = match (limit, page.filter(|p| *p > 0)) {
            (Some(limit), Some(page)) => limit.saturating_mul(page - 1),
            _ => 0,
        };

        let mut skipped = 0;
        let mut found = Vec::new();
        self.each(|index, model| {
            if !query.matches(model, index) {
                return ControlFlow::Continue(());
            }
            if skipped < skip {
                skipped += 1;
                return ControlFlow::Continue(());
            }
            found.push(model.clone());
            match limit {
                Some(limit) if found.len() >= limit => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            }
        });

        let result = self.inner.collection_type.create(Value::Null);
        *result.inner.parent.borrow_mut() = self.inner.parent.borrow().clone();
        result.inner.items.set(found);
        tracing::trace!(matches = result.len(), skip, "find");
        result
    }

    /// Returns the first match.
    pub fn find_one(&self, query: impl Into<Query>) -> Option<Model> {
        self.find(query, Some(1), None).first()
    }

    /// Joins field values per element.
    ///
    /// For each element, the display strings of the named fields that exist
    /// on it are joined with `joiner`; methods are called with no arguments.
    /// Without `fields`, `joiner` is the single field name and the values
    /// are joined with the empty string.
    pub fn aggregate(&self, joiner: &str, fields: Option<&[&str]>) -> Vec<String> {
        let (joiner, fields): (&str, Vec<&str>) = match fields {
            Some(fields) => (joiner, fields.to_vec()),
            None => ("", vec![joiner]),
        };

        self.items()
            .iter()
            .map(|model| {
                fields
                    .iter()
                    .filter_map(|field| model.value(field).or_else(|| model.call(field, &[])))
                    .map(|value| value.to_display_string())
                    .collect::<Vec<_>>()
                    .join(joiner)
            })
            .collect()
    }

    /// Subscribes to splices.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Splice<Model>) + 'static,
    {
        self.inner.items.subscribe(callback)
    }

    /// Unsubscribes by ID.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.items.unsubscribe(id)
    }

    /// Notifies subscribers with an empty splice.
    pub fn notify_subscribers(&self) {
        self.inner.items.notify_subscribers();
    }

    /// Returns the underlying observable list.
    pub fn observable(&self) -> &ObservableList<Model> {
        &self.inner.items
    }
}

impl From<&Collection> for Value {
    fn from(collection: &Collection) -> Self {
        Value::List(collection.export())
    }
}

impl From<Collection> for Value {
    fn from(collection: Collection) -> Self {
        Value::from(&collection)
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.items.peek()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Definition;
    use knockup_core::object;
    use std::cell::Cell;

    fn animals() -> CollectionType {
        ModelType::new(Definition::new().property("name", "")).collection()
    }

    fn names(collection: &Collection) -> Vec<Value> {
        collection.items().iter().map(|m| m.get("name")).collect()
    }

    #[test]
    fn test_insert_and_remove() {
        let pets = animals().create(Value::Null);
        pets.insert(0, object! { "name" => "Cat" });
        pets.insert(1, object! { "name" => "Dog" });
        pets.remove(0);

        assert_eq!(pets.len(), 1);
        assert_eq!(pets.at(0).map(|m| m.get("name")), Some(Value::from("Dog")));
    }

    #[test]
    fn test_out_of_range_access() {
        let pets = animals().create(Value::Null);
        assert!(pets.at(0).is_none());
        assert!(pets.first().is_none());
        assert!(pets.last().is_none());
        assert!(!pets.has(0));
        assert!(pets.remove(3).is_none());

        pets.replace(2, object! { "name" => "Cat" });
        assert!(pets.is_empty());
    }

    #[test]
    fn test_insert_clamps_and_orders() {
        let pets = animals().create(Value::Null);
        pets.append(object! { "name" => "b" })
            .prepend(object! { "name" => "a" })
            .insert(99, object! { "name" => "c" });

        assert_eq!(names(&pets), vec![Value::from("a"), Value::from("b"), Value::from("c")]);
        assert_eq!(pets.last().map(|m| m.get("name")), Some(Value::from("c")));
    }

    #[test]
    fn test_remove_by_identity() {
        let pets = animals().create(vec![object! { "name" => "a" }, object! { "name" => "b" }]);
        let b = pets.at(1).unwrap();

        assert!(pets.remove(&b).is_some_and(|m| m.ptr_eq(&b)));
        assert_eq!(pets.index(&b), None);
        assert!(pets.remove(&b).is_none());
        assert_eq!(pets.len(), 1);
    }

    #[test]
    fn test_replace() {
        let pets = animals().create(vec![object! { "name" => "a" }]);
        pets.replace(0, object! { "name" => "z" });
        assert_eq!(names(&pets), vec![Value::from("z")]);
    }

    #[test]
    fn test_one_notification_per_mutation() {
        let pets = animals().create(vec![object! { "name" => "a" }, object! { "name" => "b" }]);
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        pets.subscribe(move |_| count_clone.set(count_clone.get() + 1));

        pets.empty();
        assert_eq!(count.get(), 1);
        pets.import(vec![object! { "name" => "x" }, object! { "name" => "y" }]);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_import_is_idempotent() {
        let pets = animals().create(Value::Null);
        let data = vec![object! { "name" => "a" }, object! { "name" => "b" }];

        pets.import(data.clone());
        pets.import(data.clone());

        assert_eq!(pets.len(), 2);
        assert_eq!(Value::from(&pets), Value::from(data));
    }

    #[test]
    fn test_create_from_collection() {
        let t = animals();
        let source = t.create(vec![object! { "name" => "a" }]);
        let copy = t.create(&source);

        assert_eq!(copy.export(), source.export());
        assert!(!copy.at(0).unwrap().ptr_eq(&source.at(0).unwrap()));
    }

    #[test]
    fn test_foreign_model_is_recreated() {
        let pets = animals().create(Value::Null);
        let other = ModelType::new(Definition::new().property("name", "").property("legs", 4));
        let spider = other.create(object! { "name" => "spider" });

        pets.append(&spider);

        let stored = pets.first().unwrap();
        assert!(stored.is_instance_of(pets.model_type()));
        assert_eq!(stored.get("name"), Value::from("spider"));
        assert!(!stored.has("legs"));
    }

    #[test]
    fn test_each_stops_early() {
        let pets = animals().create(vec![
            object! { "name" => "a" },
            object! { "name" => "b" },
            object! { "name" => "c" },
        ]);
        let mut visited = Vec::new();
        pets.each(|i, _| {
            visited.push(i);
            if i == 1 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        assert_eq!(visited, vec![0, 1]);
    }

    #[test]
    fn test_find_pages_over_matches() {
        let tasks = ModelType::new(Definition::new().property("status", "").property("n", 0)).collection();
        let all = tasks.create(vec![
            object! { "status" => "open", "n" => 0 },
            object! { "status" => "closed", "n" => 1 },
            object! { "status" => "open", "n" => 2 },
            object! { "status" => "closed", "n" => 3 },
            object! { "status" => "open", "n" => 4 },
        ]);
        let n = |c: &Collection| c.items().iter().map(|m| m.get("n")).collect::<Vec<_>>();

        let page1 = all.find(object! { "status" => "open" }, Some(2), Some(1));
        assert_eq!(n(&page1), vec![Value::from(0), Value::from(2)]);

        let page2 = all.find(object! { "status" => "open" }, Some(2), Some(2));
        assert_eq!(n(&page2), vec![Value::from(4)]);

        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_find_keeps_identity_and_parent() {
        let pets = animals().create(vec![object! { "name" => "a" }]);
        let found = pets.find(Query::predicate(|_, _| true), None, None);

        assert!(found.first().unwrap().ptr_eq(&pets.first().unwrap()));
        assert!(found.is_instance_of(pets.collection_type()));
        assert!(found.parent().is_none());
    }

    #[test]
    fn test_find_one() {
        let pets = animals().create(vec![object! { "name" => "a" }, object! { "name" => "b" }]);

        let b = pets.find_one(object! { "name" => "b" });
        assert!(b.is_some_and(|m| m.ptr_eq(&pets.at(1).unwrap())));
        assert!(pets.find_one(object! { "name" => "zzz" }).is_none());
    }

    #[test]
    fn test_aggregate() {
        let people = ModelType::new(
            Definition::new()
                .property("forename", "")
                .property("surname", "")
                .method("initial", |m, _| {
                    Value::from(m.get("forename").to_display_string().chars().take(1).collect::<String>())
                }),
        )
        .collection();
        let roster = people.create(vec![
            object! { "forename" => "Ann", "surname" => "Lee" },
            object! { "forename" => "Bob", "surname" => "Ray" },
        ]);

        assert_eq!(
            roster.aggregate(" ", Some(&["forename", "surname", "missing"])),
            vec!["Ann Lee", "Bob Ray"]
        );
        assert_eq!(roster.aggregate("forename", None), vec!["Ann", "Bob"]);
        assert_eq!(roster.aggregate(".", Some(&["initial", "surname"])), vec!["A.Lee", "B.Ray"]);
    }
}
