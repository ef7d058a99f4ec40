//! Knockup Core - Core types shared by the knockup model layer.
//!
//! This crate provides the foundational types used by every other crate in
//! the workspace:
//!
//! - `Value`: Plain data (defaults, imports, exports, HTTP payloads)
//! - `Object`: A string-keyed map of values with sorted keys
//! - `ValueKind`: The kind of a `Value`
//! - `naming`: The `read<Name>` / `write<Name>` accessor naming convention
//! - `Error`: Error types for wiring failures (routes, bindings, views)
//!
//! # Example
//!
//! ```rust
//! use knockup_core::{object, Value};
//!
//! let user = object! {
//!     "name" => "Ann",
//!     "age" => 31,
//! };
//!
//! assert_eq!(user.get("name"), Some(&Value::from("Ann")));
//! assert_eq!(Value::Object(user).get("age").and_then(Value::as_i64), Some(31));
//! ```

#![no_std]

extern crate alloc;

mod error;
pub mod naming;
mod object;
mod types;
mod value;

pub use error::{Error, Result};
pub use object::Object;
pub use types::ValueKind;
pub use value::Value;

/// Builds an [`Object`] from `key => value` pairs.
///
/// Values go through `Into<Value>`, so literals can be used directly.
#[macro_export]
macro_rules! object {
    () => {
        $crate::Object::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut obj = $crate::Object::new();
        $(
            obj.insert($key, $crate::Value::from($value));
        )+
        obj
    }};
}
