//! Typed settings for the HTTP client, views and attribute bindings.
//!
//! Every struct has a `Default` and deserializes from JSON with missing
//! fields falling back to those defaults:
//!
//! ```
//! use knockup_web::config::ViewConfig;
//!
//! let config: ViewConfig = serde_json::from_str(r#"{"prefix": "templates/"}"#).unwrap();
//! assert_eq!(config.prefix, "templates/");
//! assert_eq!(config.suffix, ".html");
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;

/// Settings for [`crate::Http`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Prepended to every request URL.
    pub prefix: String,
    /// Appended to every request URL.
    pub suffix: String,
    /// Sent as the `Accept` header; also picks the fallback response parser.
    pub accept: String,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            accept: crate::http::JSON.to_string(),
            headers: BTreeMap::new(),
        }
    }
}

/// Settings for [`crate::View`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Prepended to template names when fetching them.
    pub prefix: String,
    /// Appended to template names when fetching them.
    pub suffix: String,
    pub accept: String,
    /// Prepended to template names to form the id of an inline template.
    pub id_prefix: String,
    pub id_suffix: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            prefix: "views/".to_string(),
            suffix: ".html".to_string(),
            accept: "text/html".to_string(),
            id_prefix: "ku-view-".to_string(),
            id_suffix: String::new(),
        }
    }
}

impl ViewConfig {
    /// Returns the HTTP settings used to fetch templates.
    pub fn http(&self) -> HttpConfig {
        HttpConfig {
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
            accept: self.accept.clone(),
            headers: BTreeMap::new(),
        }
    }
}

/// Settings for [`crate::Context`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Attribute prefix that marks a binding, e.g. `data-ku-model`.
    pub prefix: String,
    /// Settings for views the context creates.
    pub view: ViewConfig,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            prefix: "data-ku-".to_string(),
            view: ViewConfig::default(),
        }
    }
}
