//! Subscription management for observables.
//!
//! This module provides subscription IDs and a manager for tracking the
//! callbacks registered on an observable value, list or computed value.

use hashbrown::HashMap;
use std::rc::Rc;

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback type for change notifications.
pub type ChangeCallback<E> = Rc<dyn Fn(&E)>;

/// A subscription to changes.
pub struct Subscription<E> {
    /// Unique identifier
    id: SubscriptionId,
    /// Callback to invoke on changes
    callback: ChangeCallback<E>,
    /// Whether this subscription is active
    active: bool,
}

impl<E> Subscription<E> {
    /// Creates a new subscription.
    pub fn new<F>(id: SubscriptionId, callback: F) -> Self
    where
        F: Fn(&E) + 'static,
    {
        Self {
            id,
            callback: Rc::new(callback),
            active: true,
        }
    }

    /// Returns the subscription ID.
    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns whether this subscription is active.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Deactivates this subscription.
    #[inline]
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Notifies this subscription of changes.
    pub fn notify(&self, changes: &E) {
        if self.active {
            (self.callback)(changes);
        }
    }
}

/// Manages subscriptions for a single observable.
pub struct SubscriptionManager<E> {
    /// Active subscriptions
    subscriptions: HashMap<SubscriptionId, Subscription<E>>,
    /// Next subscription ID to assign
    next_id: SubscriptionId,
}

impl<E> Default for SubscriptionManager<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> SubscriptionManager<E> {
    /// Creates a new subscription manager.
    pub fn new() -> Self {
        Self {
            subscriptions: HashMap::new(),
            next_id: 1,
        }
    }

    /// Subscribes to changes with the given callback.
    ///
    /// Returns the subscription ID that can be used to unsubscribe.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&E) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;

        let subscription = Subscription::new(id, callback);
        self.subscriptions.insert(id, subscription);

        id
    }

    /// Unsubscribes by ID.
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Notifies a specific subscription of changes.
    pub fn notify(&self, id: SubscriptionId, changes: &E) {
        if let Some(sub) = self.subscriptions.get(&id) {
            sub.notify(changes);
        }
    }

    /// Notifies all active subscriptions of changes, in subscription order.
    pub fn notify_all(&self, changes: &E) {
        for callback in self.callbacks() {
            callback(changes);
        }
    }

    /// Returns the callbacks of all active subscriptions in subscription order.
    ///
    /// Callers that notify while other code may subscribe or unsubscribe take
    /// this snapshot first and release their borrow of the manager.
    pub fn callbacks(&self) -> Vec<ChangeCallback<E>> {
        let mut active: Vec<&Subscription<E>> =
            self.subscriptions.values().filter(|s| s.is_active()).collect();
        active.sort_by_key(|s| s.id);
        active.into_iter().map(|s| s.callback.clone()).collect()
    }

    /// Returns the number of active subscriptions.
    #[inline]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns true if there are no subscriptions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Returns all subscription IDs, in subscription order.
    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        let mut ids: Vec<_> = self.subscriptions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Clears all subscriptions.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}
