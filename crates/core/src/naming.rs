//! Accessor naming convention for computed fields.
//!
//! A definition key of the form `read<Name>` declares the read side of the
//! computed field `name`, and `write<Name>` its write side. `<Name>` must
//! start with an uppercase ASCII letter; the canonical field name lowercases
//! that letter.
//!
//! A bare prefix followed by lowercase text is not an accessor: `ready`,
//! `readonly` and `writer` stay ordinary method keys instead of declaring
//! computed fields `y`, `only` and `r`.
//!
//! ```
//! use knockup_core::naming;
//!
//! assert_eq!(naming::from_reader("readFullName"), Some("fullName".into()));
//! assert_eq!(naming::from_writer("writeName"), Some("name".into()));
//! assert_eq!(naming::from_reader("ready"), None);
//! assert_eq!(naming::to_reader("name"), "readName");
//! ```

use alloc::string::String;

/// Prefix marking the read side of a computed field.
pub const READER_PREFIX: &str = "read";

/// Prefix marking the write side of a computed field.
pub const WRITER_PREFIX: &str = "write";

/// Which side of a computed field an accessor key declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accessor {
    Read,
    Write,
}

/// Returns true if `name` declares the read side of a computed field.
pub fn is_reader(name: &str) -> bool {
    strip(name, READER_PREFIX).is_some()
}

/// Returns true if `name` declares the write side of a computed field.
pub fn is_writer(name: &str) -> bool {
    strip(name, WRITER_PREFIX).is_some()
}

/// Returns the canonical field name for a reader key.
pub fn from_reader(name: &str) -> Option<String> {
    strip(name, READER_PREFIX).map(lcfirst)
}

/// Returns the canonical field name for a writer key.
pub fn from_writer(name: &str) -> Option<String> {
    strip(name, WRITER_PREFIX).map(lcfirst)
}

/// Returns the reader key for a canonical field name.
pub fn to_reader(name: &str) -> String {
    let mut out = String::from(READER_PREFIX);
    out.push_str(&ucfirst(name));
    out
}

/// Returns the writer key for a canonical field name.
pub fn to_writer(name: &str) -> String {
    let mut out = String::from(WRITER_PREFIX);
    out.push_str(&ucfirst(name));
    out
}

/// Classifies an accessor key, returning its side and canonical name.
pub fn classify(name: &str) -> Option<(Accessor, String)> {
    if let Some(canonical) = from_reader(name) {
        return Some((Accessor::Read, canonical));
    }
    from_writer(name).map(|canonical| (Accessor::Write, canonical))
}

fn strip<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = name.strip_prefix(prefix)?;
    match rest.chars().next() {
        Some(first) if first.is_ascii_uppercase() => Some(rest),
        _ => None,
    }
}

fn lcfirst(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(name.len());
            out.push(first.to_ascii_lowercase());
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}

fn ucfirst(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(name.len());
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}
