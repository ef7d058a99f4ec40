//! Dependency tracking for computed values.
//!
//! While a computed value evaluates, every observable it reads reports itself
//! through [`track`]. The reads are collected into the innermost frame of a
//! thread-local stack; [`capture`] pushes a frame, runs the evaluation and
//! returns the collected sources so the computed value can watch them.

use crate::subscription::SubscriptionId;
use std::cell::RefCell;
use std::rc::Rc;

/// Something a computed value can depend on.
///
/// Observable values, observable lists, computed values and notifiers all
/// implement this; it is the "is observable" capability.
pub trait Source {
    /// Registers `callback` to run whenever this source changes.
    fn watch(&self, callback: Rc<dyn Fn()>) -> SubscriptionId;

    /// Removes a callback registered with [`Source::watch`].
    fn unwatch(&self, id: SubscriptionId);

    /// Identity of the underlying source, used to de-duplicate reads.
    fn source_id(&self) -> usize;
}

// None marks an untracked section
type Frame = Option<Vec<Rc<dyn Source>>>;

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Records a read of `source` in the current tracking frame, if any.
pub fn track(source: Rc<dyn Source>) {
    FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        if let Some(Some(frame)) = frames.last_mut() {
            let id = source.source_id();
            if !frame.iter().any(|s| s.source_id() == id) {
                frame.push(source);
            }
        }
    });
}

/// Returns true if reads are currently being tracked.
pub fn is_tracking() -> bool {
    FRAMES.with(|frames| matches!(frames.borrow().last(), Some(Some(_))))
}

/// Runs `f` in a fresh frame and returns its result with the sources it read.
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<Rc<dyn Source>>) {
    let guard = FrameGuard::push(Some(Vec::new()));
    let result = f();
    let sources = guard.pop().unwrap_or_default();
    (result, sources)
}

/// Runs `f` without recording any reads.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let guard = FrameGuard::push(None);
    let result = f();
    guard.pop();
    result
}

/// Pops its frame even if the evaluation unwinds.
struct FrameGuard {
    popped: bool,
}

impl FrameGuard {
    fn push(frame: Frame) -> Self {
        FRAMES.with(|frames| frames.borrow_mut().push(frame));
        Self { popped: false }
    }

    fn pop(mut self) -> Frame {
        self.popped = true;
        FRAMES.with(|frames| frames.borrow_mut().pop()).flatten()
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        if !self.popped {
            FRAMES.with(|frames| {
                frames.borrow_mut().pop();
            });
        }
    }
}
