//! Named event handlers.
//!
//! Routers and the HTTP client announce lifecycle points (`start`, `stop`,
//! `enter.users`, ...) through an `Events` registry. A handler returning
//! false vetoes the event: the remaining handlers are skipped and `trigger`
//! reports the veto to the caller.

use hashbrown::HashMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Identifier returned by [`Events::on`].
pub type HandlerId = u64;

type Handler<A> = Rc<dyn Fn(&A) -> bool>;

/// A registry of handlers keyed by event name.
pub struct Events<A: 'static> {
    handlers: RefCell<HashMap<String, Vec<(HandlerId, Handler<A>)>>>,
    next_id: Cell<HandlerId>,
}

impl<A: 'static> Default for Events<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> Events<A> {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
        }
    }

    /// Registers a handler for `name`.
    pub fn on<F>(&self, name: &str, handler: F) -> HandlerId
    where
        F: Fn(&A) -> bool + 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.handlers
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .push((id, Rc::new(handler)));
        id
    }

    /// Removes one handler, or every handler for `name` when `id` is None.
    ///
    /// Returns the number of handlers removed.
    pub fn off(&self, name: &str, id: Option<HandlerId>) -> usize {
        let mut handlers = self.handlers.borrow_mut();
        match id {
            None => handlers.remove(name).map(|list| list.len()).unwrap_or(0),
            Some(id) => {
                let Some(list) = handlers.get_mut(name) else {
                    return 0;
                };
                let before = list.len();
                list.retain(|(handler_id, _)| *handler_id != id);
                let removed = before - list.len();
                if list.is_empty() {
                    handlers.remove(name);
                }
                removed
            }
        }
    }

    /// Removes every handler.
    pub fn clear(&self) {
        self.handlers.borrow_mut().clear();
    }

    /// Runs the handlers for `name` in registration order.
    ///
    /// Returns false, skipping the remaining handlers, as soon as one
    /// handler returns false.
    pub fn trigger(&self, name: &str, args: &A) -> bool {
        let snapshot: Vec<Handler<A>> = match self.handlers.borrow().get(name) {
            Some(list) => list.iter().map(|(_, h)| h.clone()).collect(),
            None => return true,
        };
        tracing::trace!(event = name, handlers = snapshot.len(), "trigger");

        snapshot.into_iter().all(|handler| handler(args))
    }

    /// Returns the number of handlers registered for `name`.
    pub fn count(&self, name: &str) -> usize {
        self.handlers.borrow().get(name).map_or(0, Vec::len)
    }
}
