//! In-memory navigation state.

use hashbrown::HashMap;
use knockup_core::Value;
use knockup_reactive::{Notifier, SubscriptionId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Default)]
struct StateInner {
    current: RefCell<String>,
    previous: RefCell<Option<String>>,
    states: RefCell<HashMap<String, Value>>,
    changes: Notifier<String>,
}

/// The current URI, the last dispatched URI and data pushed with each URI.
///
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct State {
    inner: Rc<StateInner>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `uri` current, remembers `data` for it and notifies
    /// subscribers.
    pub fn push(&self, uri: impl Into<String>, data: impl Into<Value>) -> &Self {
        let uri = uri.into();
        tracing::trace!(%uri, "state push");

        *self.inner.current.borrow_mut() = uri.clone();
        self.inner.states.borrow_mut().insert(uri.clone(), data.into());
        self.inner.changes.notify(&uri);
        self
    }

    /// Returns the current URI.
    pub fn get(&self) -> String {
        self.inner.current.borrow().clone()
    }

    /// Returns the data pushed with `uri`, or with the current URI when
    /// `uri` is `None`. Unknown URIs give null.
    pub fn data(&self, uri: Option<&str>) -> Value {
        let states = self.inner.states.borrow();
        let found = match uri {
            Some(uri) => states.get(uri),
            None => states.get(self.inner.current.borrow().as_str()),
        };
        found.cloned().unwrap_or_default()
    }

    /// Returns the last URI a router dispatched.
    pub fn previous(&self) -> Option<String> {
        self.inner.previous.borrow().clone()
    }

    pub(crate) fn set_previous(&self, uri: &str) {
        *self.inner.previous.borrow_mut() = Some(uri.to_string());
    }

    /// Subscribes to pushes. The callback receives the new URI.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&String) + 'static,
    {
        self.inner.changes.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.changes.unsubscribe(id)
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("current", &self.get())
            .field("previous", &self.previous())
            .finish()
    }
}
