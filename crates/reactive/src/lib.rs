//! Knockup Reactive - observable primitives for the knockup model layer.
//!
//! This crate provides the change-notification building blocks that models
//! and collections are made of. Everything is single-threaded and uses
//! shared ownership (`Rc`) with interior mutability; handles are cheap to
//! clone and clones observe the same state.
//!
//! # Core Concepts
//!
//! - `Observable`: a single value that notifies subscribers when it changes
//! - `ObservableList`: an ordered list that notifies with a `Splice` per mutation
//! - `Computed`: a value derived from other observables, optionally writable
//! - `Notifier`: a bare subscription list, used as an aggregate change signal
//! - `Events`: named handlers with veto semantics
//!
//! Computed values discover their dependencies automatically: every read of
//! an observable inside the read closure is recorded by the [`tracking`]
//! module and watched until the next evaluation.
//!
//! # Example
//!
//! ```
//! use knockup_reactive::{Computed, Observable, ObservableList};
//!
//! let items = ObservableList::new(vec![1i64, 2, 3]);
//! let source = items.clone();
//! let total = Computed::read_only(move || source.get().iter().sum::<i64>());
//!
//! assert_eq!(total.get(), 6);
//! items.push(4);
//! assert_eq!(total.get(), 10);
//!
//! let name = Observable::new("knockup");
//! name.subscribe(|value| println!("renamed to {value}"));
//! name.set("knockout");
//! ```

pub mod computed;
pub mod events;
pub mod notify;
pub mod observable;
pub mod splice;
pub mod subscription;
pub mod tracking;

pub use computed::Computed;
pub use events::{Events, HandlerId};
pub use notify::Notifier;
pub use observable::{Observable, ObservableList};
pub use splice::Splice;
pub use subscription::{ChangeCallback, Subscription, SubscriptionId, SubscriptionManager};
pub use tracking::Source;
