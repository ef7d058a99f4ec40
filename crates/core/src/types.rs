//! Value kinds.
//!
//! This module defines the kinds of plain data a model field can hold.

/// The kind of a [`Value`](crate::Value).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Absent / null
    Null,
    /// Boolean (true/false)
    Boolean,
    /// 64-bit signed integer
    Int64,
    /// 64-bit floating point number
    Float64,
    /// UTF-8 string
    String,
    /// Ordered list of values
    List,
    /// String-keyed object
    Object,
}
