//! Model types and instances.
//!
//! A `ModelType` owns a [`Definition`] and builds live [`Model`] instances
//! from it. Every instance gets its own observables: properties start from
//! the definition defaults, computed fields are wired to the instance and
//! evaluated on first read, and each relation holds one child created for
//! this instance alone. Children point back at their owner through a weak
//! parent link.

use crate::collection::{Collection, CollectionType};
use crate::definition::{Callable, Definition};
use crate::interpret::{self, RelationType, Tables};
use hashbrown::HashMap;
use knockup_core::{Object, Value};
use knockup_reactive::{tracking, Computed, Notifier, Observable, ObservableList, Source, SubscriptionId};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

// ==================== Model type ====================

struct ModelTypeInner {
    definition: RefCell<Definition>,
    tables: RefCell<Option<Rc<Tables>>>,
}

/// A model type: a definition plus the memoized result of interpreting it.
///
/// Handles are cheap to clone; clones are the same type.
#[derive(Clone)]
pub struct ModelType {
    inner: Rc<ModelTypeInner>,
}

impl ModelType {
    /// Creates a model type from a definition.
    pub fn new(definition: Definition) -> Self {
        Self {
            inner: Rc::new(ModelTypeInner {
                definition: RefCell::new(definition),
                tables: RefCell::new(None),
            }),
        }
    }

    /// Returns a copy of the definition.
    pub fn definition(&self) -> Definition {
        self.inner.definition.borrow().clone()
    }

    /// Returns the classified definition, interpreting it on first use.
    pub fn tables(&self) -> Rc<Tables> {
        if let Some(tables) = self.inner.tables.borrow().as_ref() {
            return tables.clone();
        }
        let tables = Rc::new(interpret::interpret(&self.inner.definition.borrow()));
        *self.inner.tables.borrow_mut() = Some(tables.clone());
        tables
    }

    /// Returns the collection type bound to this model type.
    pub fn collection(&self) -> CollectionType {
        CollectionType::new(self.clone())
    }

    /// Returns true if both handles are the same type.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns true if `model` was created by this type.
    pub fn is_instance(&self, model: &Model) -> bool {
        self.ptr_eq(&model.inner.model_type)
    }

    /// Copies this type's entries into `other` where `other` does not define
    /// them already, and returns `other`.
    pub fn extend(&self, other: impl Into<ModelType>) -> ModelType {
        let other = other.into();
        if !self.ptr_eq(&other) {
            let source = self.definition();
            other.merge_missing(&source);
        }
        other
    }

    /// Copies the entries of `other` into this type where this type does not
    /// define them already, and returns this type.
    pub fn inherit(&self, other: impl Into<ModelType>) -> ModelType {
        let other = other.into();
        if !self.ptr_eq(&other) {
            let source = other.definition();
            self.merge_missing(&source);
        }
        self.clone()
    }

    fn merge_missing(&self, source: &Definition) {
        let added = self.inner.definition.borrow_mut().merge_missing(source);
        if added > 0 {
            *self.inner.tables.borrow_mut() = None;
        }
        tracing::debug!(added, "merged definition entries");
    }

    /// Builds an instance and imports `data` into it.
    ///
    /// Pass `Value::Null` for an instance holding only defaults. If the
    /// definition has an `init` method it runs once, after the import.
    pub fn create(&self, data: impl Into<Value>) -> Model {
        let tables = self.tables();
        let model = Model {
            inner: Rc::new(ModelInner {
                model_type: self.clone(),
                tables: tables.clone(),
                fields: RefCell::new(HashMap::with_capacity(tables.len())),
                parent: RefCell::new(Weak::new()),
                observer: Notifier::new(),
            }),
        };

        let weak = Rc::downgrade(&model.inner);
        let mut fields = HashMap::with_capacity(tables.len());

        for (name, default) in &tables.properties {
            let field = match default {
                Value::List(items) => Field::List(ObservableList::new(items.clone())),
                other => Field::Property(Observable::new(other.clone())),
            };
            fields.insert(name.clone(), field);
        }

        for (name, relation) in &tables.relations {
            let child = match relation {
                RelationType::Model(model_type) => {
                    let child = model_type.create(Value::Null);
                    child.set_parent(Some(&model));
                    Relation::One(child)
                }
                RelationType::Collection(collection_type) => {
                    let child = collection_type.create(Value::Null);
                    child.set_parent(Some(&model));
                    Relation::Many(child)
                }
            };
            fields.insert(name.clone(), Field::Relation(child));
        }

        for (name, method) in &tables.methods {
            fields.insert(name.clone(), Field::Method(method.clone()));
        }

        for (name, entry) in &tables.computed {
            let read = {
                let weak = weak.clone();
                let read = entry.read.clone();
                move || match (Model::upgrade(&weak), &read) {
                    (Some(model), Some(read)) => read(&model, &[]),
                    _ => Value::Null,
                }
            };
            let write = entry.write.clone().map(|write| {
                let weak = weak.clone();
                move |value: Value| {
                    if let Some(model) = Model::upgrade(&weak) {
                        write(&model, &[value]);
                    }
                }
            });
            fields.insert(name.clone(), Field::Computed(Computed::new(read, write)));
        }

        *model.inner.fields.borrow_mut() = fields;
        model.import(data);

        if let Some(init) = tables.method("init") {
            init(&model, &[]);
        }

        tracing::trace!(fields = tables.len(), "created model");
        model
    }
}

impl From<Definition> for ModelType {
    fn from(definition: Definition) -> Self {
        ModelType::new(definition)
    }
}

impl From<&ModelType> for ModelType {
    fn from(model_type: &ModelType) -> Self {
        model_type.clone()
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("keys", &self.inner.definition.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}

// ==================== Fields ====================

/// A nested instance owned by a model field.
#[derive(Clone)]
pub enum Relation {
    One(Model),
    Many(Collection),
}

impl Relation {
    /// Returns the plain data of the child.
    pub fn export(&self) -> Value {
        match self {
            Relation::One(model) => Value::Object(model.export()),
            Relation::Many(collection) => Value::List(collection.export()),
        }
    }

    fn import(&self, data: Value) {
        match self {
            Relation::One(model) => {
                model.import(data);
            }
            Relation::Many(collection) => {
                collection.import(data);
            }
        }
    }
}

#[derive(Clone)]
enum Field {
    Property(Observable<Value>),
    List(ObservableList<Value>),
    Computed(Computed<Value>),
    Relation(Relation),
    Method(Callable),
}

// ==================== Model ====================

pub(crate) struct ModelInner {
    model_type: ModelType,
    tables: Rc<Tables>,
    fields: RefCell<HashMap<String, Field>>,
    parent: RefCell<Weak<ModelInner>>,
    observer: Notifier<()>,
}

/// A live model instance.
///
/// `Clone` copies the handle; both handles refer to the same instance. Use
/// [`Model::duplicate`] for an independent copy.
///
/// Field access never fails: unknown names read as `Value::Null` and writes
/// to them are ignored.
#[derive(Clone)]
pub struct Model {
    inner: Rc<ModelInner>,
}

impl Model {
    pub(crate) fn upgrade(weak: &Weak<ModelInner>) -> Option<Model> {
        weak.upgrade().map(|inner| Model { inner })
    }

    pub(crate) fn downgrade(&self) -> Weak<ModelInner> {
        Rc::downgrade(&self.inner)
    }

    fn field(&self, name: &str) -> Option<Field> {
        self.inner.fields.borrow().get(name).cloned()
    }

    /// Returns the type this instance was created from.
    #[inline]
    pub fn model_type(&self) -> &ModelType {
        &self.inner.model_type
    }

    /// Returns true if this instance was created from `model_type`.
    pub fn is_instance_of(&self, model_type: &ModelType) -> bool {
        model_type.is_instance(self)
    }

    /// Returns true if both handles refer to the same instance.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the owning model, if it is still alive.
    pub fn parent(&self) -> Option<Model> {
        Model::upgrade(&self.inner.parent.borrow())
    }

    /// Sets or clears the owning model.
    pub fn set_parent(&self, parent: Option<&Model>) {
        *self.inner.parent.borrow_mut() = parent.map(Model::downgrade).unwrap_or_default();
    }

    /// Returns true if `name` is a field of this instance.
    pub fn has(&self, name: &str) -> bool {
        self.inner.fields.borrow().contains_key(name)
    }

    /// Returns true if `name` is an observable field: a property, list,
    /// computed field or relation.
    pub fn is_observable(&self, name: &str) -> bool {
        matches!(
            self.field(name),
            Some(Field::Property(_) | Field::List(_) | Field::Computed(_) | Field::Relation(_))
        )
    }

    /// Reads a field, recording the read for computed fields that depend on
    /// it. Relations read as their export; methods and unknown names read
    /// as `Value::Null`.
    pub fn get(&self, name: &str) -> Value {
        self.value(name).unwrap_or_default()
    }

    /// Reads a field without recording the read.
    pub fn peek(&self, name: &str) -> Value {
        tracking::untracked(|| self.get(name))
    }

    /// Reads a field, returning None for methods and unknown names.
    pub fn value(&self, name: &str) -> Option<Value> {
        match self.field(name)? {
            Field::Property(observable) => Some(observable.get()),
            Field::List(list) => Some(Value::List(list.get())),
            Field::Computed(computed) => Some(computed.get()),
            Field::Relation(relation) => Some(relation.export()),
            Field::Method(_) => None,
        }
    }

    /// Writes a field.
    ///
    /// Properties store the value; list properties only accept lists;
    /// computed fields pass it to their writer; relations import it into the
    /// child. Returns false when nothing could be written.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        match self.field(name) {
            Some(Field::Property(observable)) => {
                store(&observable, value);
                true
            }
            Some(Field::List(list)) => match value {
                Value::List(items) => {
                    list.set(items);
                    true
                }
                other => {
                    tracing::debug!(field = name, kind = ?other.kind(), "ignored non-list value for list field");
                    false
                }
            },
            Some(Field::Computed(computed)) => computed.set(value),
            Some(Field::Relation(relation)) => {
                relation.import(value);
                true
            }
            Some(Field::Method(_)) | None => {
                tracing::trace!(field = name, "ignored write to non-settable field");
                false
            }
        }
    }

    /// Invokes a method with this instance as context.
    ///
    /// Returns None if `name` is not a method.
    pub fn call(&self, name: &str, args: &[Value]) -> Option<Value> {
        match self.field(name)? {
            Field::Method(method) => Some(method(self, args)),
            _ => None,
        }
    }

    /// Returns the relation stored under `name`.
    pub fn relation(&self, name: &str) -> Option<Relation> {
        match self.field(name)? {
            Field::Relation(relation) => Some(relation),
            _ => None,
        }
    }

    /// Returns the live child model of a relation.
    pub fn child(&self, name: &str) -> Option<Model> {
        match self.relation(name)? {
            Relation::One(model) => Some(model),
            Relation::Many(_) => None,
        }
    }

    /// Returns the live child collection of a relation.
    pub fn children(&self, name: &str) -> Option<Collection> {
        match self.relation(name)? {
            Relation::Many(collection) => Some(collection),
            Relation::One(_) => None,
        }
    }

    /// Returns the observable behind a scalar property.
    pub fn observable(&self, name: &str) -> Option<Observable<Value>> {
        match self.field(name)? {
            Field::Property(observable) => Some(observable),
            _ => None,
        }
    }

    /// Returns the observable list behind a list property.
    pub fn list(&self, name: &str) -> Option<ObservableList<Value>> {
        match self.field(name)? {
            Field::List(list) => Some(list),
            _ => None,
        }
    }

    /// Returns the computed value behind a computed field.
    pub fn computed(&self, name: &str) -> Option<Computed<Value>> {
        match self.field(name)? {
            Field::Computed(computed) => Some(computed),
            _ => None,
        }
    }

    /// Returns the aggregate observer of this instance.
    pub fn observer(&self) -> Observer {
        Observer {
            model: self.downgrade(),
            notifier: self.inner.observer.clone(),
        }
    }

    /// Subscribes to bulk imports.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Model) + 'static,
    {
        let weak = self.downgrade();
        self.inner.observer.subscribe(move |_| {
            if let Some(model) = Model::upgrade(&weak) {
                callback(&model);
            }
        })
    }

    /// Unsubscribes by ID.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.observer.unsubscribe(id)
    }

    /// Fires the aggregate notification.
    pub fn notify_subscribers(&self) {
        self.inner.observer.notify(&());
    }

    /// Writes every settable field named in `data`, then fires the aggregate
    /// notification once.
    ///
    /// `data` is usually an object; a model passed by reference is exported
    /// first. Unknown keys and methods are skipped. Anything other than an
    /// object or null is ignored.
    pub fn import(&self, data: impl Into<Value>) -> &Self {
        match data.into() {
            Value::Object(object) => {
                for (name, value) in object {
                    if !self.set(&name, value) {
                        tracing::trace!(field = %name, "skipped import key");
                    }
                }
            }
            Value::Null => {}
            other => {
                tracing::debug!(kind = ?other.kind(), "ignored non-object model import");
            }
        }
        self.notify_subscribers();
        self
    }

    /// Returns the plain data of every property, computed field and relation.
    pub fn export(&self) -> Object {
        self.inner
            .tables
            .exported_names()
            .into_iter()
            .map(|name| (name, self.get(name)))
            .collect()
    }

    /// Restores every property to its default. Computed fields and relations
    /// are left alone.
    pub fn reset(&self) -> &Self {
        for (name, default) in &self.inner.tables.properties {
            match (self.field(name), default) {
                (Some(Field::Property(observable)), _) => {
                    store(&observable, default.clone());
                }
                (Some(Field::List(list)), Value::List(items)) => {
                    list.set(items.clone());
                }
                _ => tracing::trace!(field = %name, "reset skipped shadowed property"),
            }
        }
        self
    }

    /// Creates a new instance of the same type from this instance's export,
    /// with the same parent.
    pub fn duplicate(&self) -> Model {
        let copy = self.inner.model_type.create(self.export());
        copy.set_parent(self.parent().as_ref());
        copy
    }
}

// Value's equality treats 1 and 1.0 as equal; the stored kind must follow the write.
fn store(observable: &Observable<Value>, value: Value) {
    if !observable.peek().is_identical(&value) {
        observable.update(|current| *current = value);
    }
}

impl From<&Model> for Value {
    fn from(model: &Model) -> Self {
        Value::Object(model.export())
    }
}

impl From<Model> for Value {
    fn from(model: Model) -> Self {
        Value::from(&model)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = tracking::untracked(|| self.export());
        f.debug_tuple("Model").field(&data).finish()
    }
}

// ==================== Observer ====================

/// The whole-instance view of a model.
///
/// Reading yields the instance itself; writing imports the written data.
/// Subscribers are told about every import.
#[derive(Clone)]
pub struct Observer {
    model: Weak<ModelInner>,
    notifier: Notifier<()>,
}

impl Observer {
    /// Returns the instance and records the read.
    pub fn get(&self) -> Option<Model> {
        self.notifier.track();
        Model::upgrade(&self.model)
    }

    /// Imports `data` into the instance.
    pub fn set(&self, data: impl Into<Value>) {
        if let Some(model) = Model::upgrade(&self.model) {
            model.import(data);
        }
    }

    /// Subscribes to imports.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn() + 'static,
    {
        self.notifier.subscribe(move |_| callback())
    }

    /// Unsubscribes by ID.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Fires the notification without importing anything.
    pub fn notify_subscribers(&self) {
        self.notifier.notify(&());
    }
}

impl Source for Observer {
    fn watch(&self, callback: Rc<dyn Fn()>) -> SubscriptionId {
        self.notifier.watch(callback)
    }

    fn unwatch(&self, id: SubscriptionId) {
        self.notifier.unwatch(id);
    }

    fn source_id(&self) -> usize {
        self.notifier.source_id()
    }
}
