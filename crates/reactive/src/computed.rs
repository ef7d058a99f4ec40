//! Computed values.
//!
//! A `Computed` derives its value from a read closure over other observable
//! state, with an optional write closure that fans a written value back out
//! into that state. Evaluation is deferred until the first read or
//! subscription: the read closure usually refers to sibling fields that do
//! not exist yet when the computed value is declared.
//!
//! The dependencies are whatever observables the read closure touched during
//! its last evaluation. When one of them changes, the cached value is marked
//! stale and, if anyone subscribed, re-evaluated and broadcast.

use crate::notify::Notifier;
use crate::subscription::SubscriptionId;
use crate::tracking::{self, Source};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type Reader<T> = Box<dyn Fn() -> T>;
type Writer<T> = Box<dyn Fn(T)>;

struct ComputedInner<T: 'static> {
    read: Reader<T>,
    write: Option<Writer<T>>,
    cache: RefCell<Option<T>>,
    stale: Cell<bool>,
    evaluating: Cell<bool>,
    dependencies: RefCell<Vec<(Rc<dyn Source>, SubscriptionId)>>,
    notifier: Notifier<T>,
}

impl<T: 'static> ComputedInner<T> {
    fn release_dependencies(&self) {
        for (source, id) in self.dependencies.borrow_mut().drain(..) {
            source.unwatch(id);
        }
    }
}

impl<T: 'static> Drop for ComputedInner<T> {
    fn drop(&mut self) {
        self.release_dependencies();
    }
}

/// A derived observable value.
///
/// # Example
///
/// ```
/// use knockup_reactive::{Computed, Observable};
///
/// let first = Observable::new(String::from("Ann"));
/// let source = first.clone();
/// let greeting = Computed::read_only(move || format!("Hi {}", source.get()));
///
/// assert_eq!(greeting.get(), "Hi Ann");
/// first.set(String::from("Bob"));
/// assert_eq!(greeting.get(), "Hi Bob");
/// ```
pub struct Computed<T: 'static> {
    inner: Rc<ComputedInner<T>>,
}

impl<T: 'static> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Default + 'static> Computed<T> {
    /// Creates a computed value from a read closure and an optional write
    /// closure. Nothing is evaluated until the first read.
    pub fn new<R, W>(read: R, write: Option<W>) -> Self
    where
        R: Fn() -> T + 'static,
        W: Fn(T) + 'static,
    {
        Self {
            inner: Rc::new(ComputedInner {
                read: Box::new(read),
                write: write.map(|w| Box::new(w) as Writer<T>),
                cache: RefCell::new(None),
                stale: Cell::new(true),
                evaluating: Cell::new(false),
                dependencies: RefCell::new(Vec::new()),
                notifier: Notifier::new(),
            }),
        }
    }

    /// Creates a computed value without a write side.
    pub fn read_only<R>(read: R) -> Self
    where
        R: Fn() -> T + 'static,
    {
        Self::new(read, None::<fn(T)>)
    }

    /// Returns the current value, evaluating it if stale, and records the read.
    pub fn get(&self) -> T {
        self.inner.notifier.track();
        self.peek()
    }

    /// Returns the current value, evaluating it if stale, without recording
    /// the read.
    pub fn peek(&self) -> T {
        if self.inner.evaluating.get() {
            // Reading itself while evaluating; answer with the last value.
            return self.inner.cache.borrow().clone().unwrap_or_default();
        }
        let cached = if self.inner.stale.get() {
            None
        } else {
            self.inner.cache.borrow().clone()
        };
        match cached {
            Some(value) => value,
            None => self.evaluate(),
        }
    }

    /// Returns true once the read closure has run at least once.
    pub fn is_evaluated(&self) -> bool {
        self.inner.cache.borrow().is_some()
    }

    /// Returns true if a write closure was supplied.
    #[inline]
    pub fn is_writable(&self) -> bool {
        self.inner.write.is_some()
    }

    /// Passes `value` to the write closure.
    ///
    /// Returns false, and does nothing, for a read-only computed value.
    pub fn set(&self, value: T) -> bool {
        match &self.inner.write {
            Some(write) => {
                write(value);
                true
            }
            None => {
                tracing::trace!("ignored write to read-only computed value");
                false
            }
        }
    }

    /// Notifies subscribers with the current value.
    pub fn notify_subscribers(&self) {
        let current = self.peek();
        self.inner.notifier.notify(&current);
    }

    /// Subscribes to changes with the given callback.
    ///
    /// A stale or unevaluated value is evaluated first, so the dependencies
    /// the callback hears about are the current ones.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + 'static,
    {
        let id = self.inner.notifier.subscribe(callback);
        if self.inner.stale.get() && !self.inner.evaluating.get() {
            self.evaluate();
        }
        id
    }

    /// Unsubscribes by ID.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.notifier.unsubscribe(id)
    }

    /// Returns the number of sources read during the last evaluation.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.borrow().len()
    }

    fn evaluate(&self) -> T {
        let inner = &self.inner;
        inner.release_dependencies();
        inner.evaluating.set(true);
        let (value, sources) = tracking::capture(|| (inner.read)());
        inner.evaluating.set(false);

        let weak = Rc::downgrade(inner);
        let mut dependencies = Vec::with_capacity(sources.len());
        for source in sources {
            let weak = weak.clone();
            let id = source.watch(Rc::new(move || Self::invalidate(&weak)));
            dependencies.push((source, id));
        }
        *inner.dependencies.borrow_mut() = dependencies;
        *inner.cache.borrow_mut() = Some(value.clone());
        inner.stale.set(false);
        value
    }

    fn invalidate(weak: &Weak<ComputedInner<T>>) {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        if inner.stale.replace(true) && inner.cache.borrow().is_some() {
            // Already stale; subscribers were told.
            return;
        }
        if !inner.notifier.is_empty() {
            let computed = Computed { inner };
            let value = computed.peek();
            computed.inner.notifier.notify(&value);
        }
    }
}

impl<T: 'static> Source for Computed<T> {
    fn watch(&self, callback: Rc<dyn Fn()>) -> SubscriptionId {
        self.inner.notifier.watch(callback)
    }

    fn unwatch(&self, id: SubscriptionId) {
        self.inner.notifier.unwatch(id);
    }

    fn source_id(&self) -> usize {
        self.inner.notifier.source_id()
    }
}
