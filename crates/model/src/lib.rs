//! Knockup Model - declarative reactive models and collections.
//!
//! A [`Definition`] lists a model's fields. [`ModelType::new`] interprets it
//! once and [`ModelType::create`] builds live [`Model`] instances:
//!
//! - plain values become observable properties (lists become observable lists)
//! - `read<Name>` / `write<Name>` functions become the computed field `name`
//! - other functions become methods called with the instance as context
//! - nested model and collection types become owned relations
//!
//! Instances import and export plain [`Value`] data, reset to their defaults
//! and duplicate themselves. A [`Collection`] holds models of one type and
//! supports ordered mutation, queries and bulk import/export.
//!
//! # Example
//!
//! ```
//! use knockup_core::{object, Value};
//! use knockup_model::{Definition, ModelType};
//!
//! let task = ModelType::new(
//!     Definition::new()
//!         .property("title", "")
//!         .property("status", "open"),
//! );
//!
//! let tasks = task.collection().create(vec![
//!     object! { "title" => "write docs" },
//!     object! { "title" => "ship", "status" => "done" },
//! ]);
//!
//! let open = tasks.find(object! { "status" => "open" }, None, None);
//! assert_eq!(open.len(), 1);
//! assert_eq!(open.first().map(|t| t.get("title")), Some(Value::from("write docs")));
//! ```

mod collection;
mod definition;
pub mod interpret;
mod model;
mod query;

pub use collection::{Collection, CollectionType, Item, Position};
pub use definition::{Callable, Definition, DefinitionValue};
pub use interpret::{interpret, Tables};
pub use model::{Model, ModelType, Observer, Relation};
pub use query::Query;

pub use knockup_core::Value;
