//! A single named route.

use knockup_core::{Error, Object, Result};
use knockup_model::Model;
use regex::Regex;
use std::fmt;
use std::rc::Rc;

/// Called with the capture groups of the matched request.
pub type Controller = Rc<dyn Fn(&[String]) -> ControllerResult>;

/// What a controller hands back to the router.
#[derive(Debug)]
pub enum ControllerResult {
    /// Render the route's view bound to this model.
    Model(Model),
    /// Render the route's view bound to a model built from this data.
    Data(Object),
    /// Render the route's view without a model.
    Empty,
    /// Do not render.
    Skip,
}

impl From<Model> for ControllerResult {
    fn from(model: Model) -> Self {
        ControllerResult::Model(model)
    }
}

impl From<Object> for ControllerResult {
    fn from(data: Object) -> Self {
        ControllerResult::Data(data)
    }
}

impl From<()> for ControllerResult {
    fn from(_: ()) -> Self {
        ControllerResult::Empty
    }
}

/// Decides whether a request belongs to a route.
#[derive(Clone, Debug)]
pub enum Matcher {
    /// A regular expression; its capture groups become controller params.
    Pattern(Regex),
    /// The request must equal the string. There are no params.
    Exact(String),
}

/// A matcher, a URI format and the controller that handles matches.
#[derive(Clone)]
pub struct Route {
    matcher: Matcher,
    format: String,
    view: Option<String>,
    controller: Controller,
}

impl Route {
    /// Creates a route from a regular expression and a URI format.
    ///
    /// The format uses `:name` placeholders, filled in by [`Route::generate`].
    pub fn new<F, R>(pattern: &str, format: &str, controller: F) -> Result<Self>
    where
        F: Fn(&[String]) -> R + 'static,
        R: Into<ControllerResult>,
    {
        let matcher = Regex::new(pattern).map_err(|e| Error::invalid_pattern(pattern, e.to_string()))?;
        Ok(Self {
            matcher: Matcher::Pattern(matcher),
            format: format.to_string(),
            view: None,
            controller: Rc::new(move |params: &[String]| -> ControllerResult { controller(params).into() }),
        })
    }

    /// Creates a route that matches exactly `name` and generates `name`.
    pub fn exact<F, R>(name: &str, controller: F) -> Self
    where
        F: Fn(&[String]) -> R + 'static,
        R: Into<ControllerResult>,
    {
        Self {
            matcher: Matcher::Exact(name.to_string()),
            format: name.to_string(),
            view: None,
            controller: Rc::new(move |params: &[String]| -> ControllerResult { controller(params).into() }),
        }
    }

    /// Sets the name of the view rendered on match.
    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    #[inline]
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    #[inline]
    pub fn format(&self) -> &str {
        &self.format
    }

    #[inline]
    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    #[inline]
    pub(crate) fn controller(&self) -> Controller {
        Rc::clone(&self.controller)
    }

    pub(crate) fn set_default_view(&mut self, name: &str) {
        if self.view.is_none() {
            self.view = Some(name.to_string());
        }
    }

    /// Matches `request` and returns the capture groups, without the full
    /// match. Groups that did not participate are empty strings.
    pub fn query(&self, request: &str) -> Option<Vec<String>> {
        let regex = match &self.matcher {
            Matcher::Pattern(regex) => regex,
            Matcher::Exact(literal) => return (literal == request).then(Vec::new),
        };
        let captures = regex.captures(request)?;
        Some(
            captures
                .iter()
                .skip(1)
                .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
                .collect(),
        )
    }

    /// Replaces every `:name` placeholder in the format with its parameter.
    ///
    /// Longer names are substituted first so `:id` does not clobber `:idx`.
    pub fn generate(&self, params: &Object) -> String {
        let mut names: Vec<(&str, String)> = params
            .iter()
            .map(|(name, value)| (name, value.to_display_string()))
            .collect();
        names.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        names.into_iter().fold(self.format.clone(), |uri, (name, value)| {
            uri.replace(&format!(":{}", name), &value)
        })
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("matcher", &self.matcher)
            .field("format", &self.format)
            .field("view", &self.view)
            .finish()
    }
}
