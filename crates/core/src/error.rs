//! Error types for knockup.
//!
//! Model and collection operations never fail; they ignore unknown fields and
//! return `None` for out-of-range access. The errors below are wiring
//! failures: a route that was never registered, a binding that names a
//! missing registry entry, a view rendered without a target.

use alloc::string::String;
use thiserror::Error;

/// Result type alias for knockup operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for knockup wiring operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A named route was looked up but never registered.
    #[error("Route \"{name}\" does not exist.")]
    RouteNotFound { name: String },
    /// An attribute binding names a registry entry that is missing or has the
    /// wrong kind.
    #[error("Cannot bind {binding} \"{key}\": {message}\n{markup}")]
    MissingDependency {
        binding: String,
        key: String,
        message: String,
        markup: String,
    },
    /// A view was rendered without a target element.
    #[error("Cannot render view because no target was specified.")]
    NoRenderTarget,
    /// A response body could not be parsed by its declared parser.
    #[error("Error parsing response \"{body}\" with message \"{message}\".")]
    Parse { body: String, message: String },
    /// The transport could not complete a request.
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },
    /// A route matcher pattern is not a valid regular expression.
    #[error("Invalid route pattern {pattern}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl Error {
    /// Creates a route not found error.
    pub fn route_not_found(name: impl Into<String>) -> Self {
        Error::RouteNotFound { name: name.into() }
    }

    /// Creates a missing dependency error.
    pub fn missing_dependency(
        binding: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
        markup: impl Into<String>,
    ) -> Self {
        Error::MissingDependency {
            binding: binding.into(),
            key: key.into(),
            message: message.into(),
            markup: markup.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(body: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Parse {
            body: body.into(),
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}
