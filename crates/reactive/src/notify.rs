//! Shared change notifier.
//!
//! This module provides `Notifier`, a cloneable handle around a
//! `SubscriptionManager`. Every observable owns one; models and collections
//! use a bare `Notifier<()>` as their aggregate "something changed" signal.

use crate::subscription::{ChangeCallback, SubscriptionId, SubscriptionManager};
use crate::tracking::{self, Source};
use std::cell::RefCell;
use std::rc::Rc;

/// A cloneable handle to a set of subscriptions.
///
/// Clones share the same subscriptions. Notification takes a snapshot of the
/// callbacks first, so a callback may subscribe or unsubscribe on the same
/// notifier while it runs.
pub struct Notifier<E: 'static> {
    inner: Rc<RefCell<SubscriptionManager<E>>>,
}

impl<E: 'static> Clone for Notifier<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: 'static> Default for Notifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> Notifier<E> {
    /// Creates a notifier with no subscriptions.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SubscriptionManager::new())),
        }
    }

    /// Subscribes to notifications with the given callback.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&E) + 'static,
    {
        self.inner.borrow_mut().subscribe(callback)
    }

    /// Unsubscribes by ID.
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.borrow_mut().unsubscribe(id)
    }

    /// Notifies every subscriber, in subscription order.
    pub fn notify(&self, event: &E) {
        let callbacks: Vec<ChangeCallback<E>> = self.inner.borrow().callbacks();
        for callback in callbacks {
            callback(event);
        }
    }

    /// Returns the number of active subscriptions.
    #[inline]
    pub fn subscription_count(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Returns true if nobody is subscribed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Removes every subscription.
    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
    }

    /// Records a read of this notifier in the current tracking frame.
    pub fn track(&self) {
        if tracking::is_tracking() {
            tracking::track(Rc::new(self.clone()));
        }
    }

    /// Returns true if both handles share the same subscriptions.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<E: 'static> Source for Notifier<E> {
    fn watch(&self, callback: Rc<dyn Fn()>) -> SubscriptionId {
        self.subscribe(move |_| callback())
    }

    fn unwatch(&self, id: SubscriptionId) {
        self.unsubscribe(id);
    }

    fn source_id(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }
}
