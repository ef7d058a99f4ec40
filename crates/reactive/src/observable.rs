//! Observable values and lists.
//!
//! `Observable` holds a single value and notifies subscribers with the new
//! value whenever it changes. `ObservableList` holds an ordered list and
//! notifies subscribers with a `Splice` for every mutation. Both are cheap
//! handles; clones share state.
//!
//! Reads through `get` are recorded by the dependency tracker so computed
//! values re-evaluate when the value changes. `peek` reads without tracking.

use crate::notify::Notifier;
use crate::splice::Splice;
use crate::subscription::SubscriptionId;
use crate::tracking::Source;
use std::cell::RefCell;
use std::rc::Rc;

struct ObservableInner<T: 'static> {
    value: RefCell<T>,
    notifier: Notifier<T>,
}

/// An observable scalar value.
///
/// # Example
///
/// ```
/// use knockup_reactive::Observable;
///
/// let name = Observable::new(String::from("Ann"));
/// name.subscribe(|v| println!("name is now {}", v));
/// name.set(String::from("Bob"));
/// assert_eq!(name.get(), "Bob");
/// ```
pub struct Observable<T: 'static> {
    inner: Rc<ObservableInner<T>>,
}

impl<T: 'static> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Creates an observable holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                notifier: Notifier::new(),
            }),
        }
    }

    /// Returns the current value and records the read for dependency tracking.
    pub fn get(&self) -> T {
        self.inner.notifier.track();
        self.peek()
    }

    /// Returns the current value without recording the read.
    #[inline]
    pub fn peek(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Stores `value`, notifying subscribers if it differs from the current one.
    ///
    /// Returns true if the value changed.
    pub fn set(&self, value: T) -> bool {
        let changed = *self.inner.value.borrow() != value;
        if changed {
            *self.inner.value.borrow_mut() = value;
            self.notify_subscribers();
        }
        changed
    }

    /// Mutates the value in place and notifies subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.notify_subscribers();
    }

    /// Notifies subscribers with the current value, changed or not.
    pub fn notify_subscribers(&self) {
        let current = self.peek();
        self.inner.notifier.notify(&current);
    }

    /// Subscribes to changes with the given callback.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + 'static,
    {
        self.inner.notifier.subscribe(callback)
    }

    /// Unsubscribes by ID.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.notifier.unsubscribe(id)
    }

    /// Returns the number of active subscriptions.
    #[inline]
    pub fn subscription_count(&self) -> usize {
        self.inner.notifier.subscription_count()
    }

    /// Returns true if both handles point at the same observable.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: 'static> Source for Observable<T> {
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

impl<T: Clone + PartialEq + core::fmt::Debug + 'static> core::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Observable").field(&self.peek()).finish()
    }
}

struct ListInner<T: 'static> {
    items: RefCell<Vec<T>>,
    notifier: Notifier<Splice<T>>,
}

/// An observable ordered list.
///
/// Every mutation fires exactly one `Splice` notification, including bulk
/// operations such as `clear` and `set`. Out-of-range positions never panic:
/// inserts clamp to the end and removals return `None`.
pub struct ObservableList<T: 'static> {
    inner: Rc<ListInner<T>>,
}

impl<T: 'static> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Clone + 'static> ObservableList<T> {
    /// Creates a list holding `items`.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            inner: Rc::new(ListInner {
                items: RefCell::new(items),
                notifier: Notifier::new(),
            }),
        }
    }

    /// Returns a copy of the items and records the read.
    pub fn get(&self) -> Vec<T> {
        self.inner.notifier.track();
        self.peek()
    }

    /// Returns a copy of the items without recording the read.
    pub fn peek(&self) -> Vec<T> {
        self.inner.items.borrow().clone()
    }

    /// Runs `f` over the items without copying them and records the read.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        self.inner.notifier.track();
        f(&self.inner.items.borrow())
    }

    /// Returns the item at `index`, or None when out of range.
    pub fn at(&self, index: usize) -> Option<T> {
        self.with(|items| items.get(index).cloned())
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.with(|items| items.len())
    }

    /// Returns true if the list has no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends an item.
    pub fn push(&self, item: T) {
        let at = self.inner.items.borrow().len();
        self.splice(at, 0, vec![item]);
    }

    /// Inserts an item at `at`, shifting later items up. `at` past the end
    /// appends.
    pub fn insert(&self, at: usize, item: T) {
        self.splice(at, 0, vec![item]);
    }

    /// Removes and returns the item at `at`, or None when out of range.
    pub fn remove(&self, at: usize) -> Option<T> {
        if at >= self.inner.items.borrow().len() {
            return None;
        }
        self.splice(at, 1, Vec::new()).into_iter().next()
    }

    /// Replaces the item at `at`, returning the previous one, or None (and no
    /// change) when out of range.
    pub fn replace(&self, at: usize, item: T) -> Option<T> {
        if at >= self.inner.items.borrow().len() {
            return None;
        }
        self.splice(at, 1, vec![item]).into_iter().next()
    }

    /// Removes every item with a single notification.
    pub fn clear(&self) -> Vec<T> {
        let len = self.inner.items.borrow().len();
        self.splice(0, len, Vec::new())
    }

    /// Replaces every item with a single notification.
    pub fn set(&self, items: Vec<T>) -> Vec<T> {
        let len = self.inner.items.borrow().len();
        self.splice(0, len, items)
    }

    /// Removes `delete_count` items starting at `index` and inserts `items`
    /// there, firing one notification. Both bounds clamp to the list length.
    ///
    /// Returns the removed items.
    pub fn splice(&self, index: usize, delete_count: usize, items: Vec<T>) -> Vec<T> {
        let splice = {
            let mut list = self.inner.items.borrow_mut();
            let index = index.min(list.len());
            let end = index.saturating_add(delete_count).min(list.len());
            let removed: Vec<T> = list.splice(index..end, items.iter().cloned()).collect();
            Splice {
                index,
                removed,
                inserted: items,
            }
        };
        self.inner.notifier.notify(&splice);
        splice.removed
    }

    /// Notifies subscribers with an empty splice.
    pub fn notify_subscribers(&self) {
        self.inner.notifier.notify(&Splice::new(0));
    }

    /// Subscribes to mutations with the given callback.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Splice<T>) + 'static,
    {
        self.inner.notifier.subscribe(callback)
    }

    /// Unsubscribes by ID.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.notifier.unsubscribe(id)
    }

    /// Returns true if both handles point at the same list.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: 'static> Source for ObservableList<T> {
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

impl<T: Clone + core::fmt::Debug + 'static> core::fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.inner.items.borrow().iter()).finish()
    }
}
