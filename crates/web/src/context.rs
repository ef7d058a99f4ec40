//! Named registry and attribute bindings.
//!
//! A `Context` maps names to models, routers and views. Running it over an
//! element tree reads binding attributes (`data-ku-<handler>` by default)
//! and wires the named entries to the elements carrying them:
//!
//! | attribute          | effect                                                       |
//! |--------------------|--------------------------------------------------------------|
//! | `data-ku-model`    | binds the named model to the element                         |
//! | `data-ku-router`   | makes the element the target of the router's view, binds it  |
//! | `data-ku-view`     | renders a template into the element                          |
//!
//! A `data-ku-view` element renders the template named by its value with a
//! fresh view, honoring `data-ku-prefix` and `data-ku-suffix`. With a
//! `data-ku-path` attribute the value instead names a registered view that
//! renders the template at that path. `data-ku-model` on a view element
//! names the model the template is bound to.
//!
//! Wiring that names a missing entry fails with
//! [`Error::MissingDependency`], carrying the element's markup.

use crate::config::ContextConfig;
use crate::element::ElementRef;
use crate::router::Router;
use crate::transport::{MemoryTransport, Transport};
use crate::view::View;
use hashbrown::HashMap;
use knockup_core::{Error, Result, Value};
use knockup_model::Model;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// A registry entry.
#[derive(Clone, Debug)]
pub enum Entry {
    Model(Model),
    Router(Router),
    View(View),
    Value(Value),
}

impl Entry {
    /// Returns a short name for the kind of entry.
    pub fn kind(&self) -> &'static str {
        match self {
            Entry::Model(_) => "model",
            Entry::Router(_) => "router",
            Entry::View(_) => "view",
            Entry::Value(_) => "value",
        }
    }
}

impl From<Model> for Entry {
    fn from(model: Model) -> Self {
        Entry::Model(model)
    }
}

impl From<&Model> for Entry {
    fn from(model: &Model) -> Self {
        Entry::Model(model.clone())
    }
}

impl From<Router> for Entry {
    fn from(router: Router) -> Self {
        Entry::Router(router)
    }
}

impl From<View> for Entry {
    fn from(view: View) -> Self {
        Entry::View(view)
    }
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        Entry::Value(value)
    }
}

struct ContextInner {
    entries: RefCell<HashMap<String, Entry>>,
    config: ContextConfig,
    transport: Rc<dyn Transport>,
}

/// A registry of named entries plus the binding handlers that read it.
#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextInner>,
}

/// A non-owning handle to a [`Context`].
#[derive(Clone)]
pub(crate) struct WeakContext(Weak<ContextInner>);

impl WeakContext {
    pub(crate) fn upgrade(&self) -> Option<Context> {
        self.0.upgrade().map(|inner| Context { inner })
    }
}

thread_local! {
    static GLOBAL: RefCell<Option<Context>> = const { RefCell::new(None) };
}

/// A context with default settings whose views cannot fetch anything:
/// templates must be cached or inline.
impl Default for Context {
    fn default() -> Self {
        Self::new(ContextConfig::default(), Rc::new(MemoryTransport::new()))
    }
}

impl Context {
    /// Creates an empty context. Views it creates fetch templates through
    /// `transport`.
    pub fn new(config: ContextConfig, transport: Rc<dyn Transport>) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                entries: RefCell::new(HashMap::new()),
                config,
                transport,
            }),
        }
    }

    /// Returns this thread's global context, creating a default one on
    /// first use.
    pub fn global() -> Context {
        GLOBAL.with(|global| global.borrow_mut().get_or_insert_with(Context::default).clone())
    }

    /// Makes this context the thread's global context.
    pub fn install(&self) {
        GLOBAL.with(|global| *global.borrow_mut() = Some(self.clone()));
    }

    #[inline]
    pub fn config(&self) -> &ContextConfig {
        &self.inner.config
    }

    #[inline]
    pub fn transport(&self) -> Rc<dyn Transport> {
        Rc::clone(&self.inner.transport)
    }

    pub(crate) fn downgrade(&self) -> WeakContext {
        WeakContext(Rc::downgrade(&self.inner))
    }

    /// Returns true if both handles share the same registry.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ==================== Registry ====================

    /// Registers `entry` under `name`, replacing any previous entry.
    pub fn set(&self, name: impl Into<String>, entry: impl Into<Entry>) -> &Self {
        self.inner.entries.borrow_mut().insert(name.into(), entry.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<Entry> {
        self.inner.entries.borrow().get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.inner.entries.borrow().contains_key(name)
    }

    pub fn remove(&self, name: &str) -> Option<Entry> {
        self.inner.entries.borrow_mut().remove(name)
    }

    /// Removes every entry.
    pub fn reset(&self) -> &Self {
        self.inner.entries.borrow_mut().clear();
        self
    }

    /// Returns the model registered under `name`.
    pub fn model(&self, name: &str) -> Option<Model> {
        match self.get(name)? {
            Entry::Model(model) => Some(model),
            _ => None,
        }
    }

    /// Returns the router registered under `name`.
    pub fn router(&self, name: &str) -> Option<Router> {
        match self.get(name)? {
            Entry::Router(router) => Some(router),
            _ => None,
        }
    }

    /// Returns the view registered under `name`.
    pub fn view(&self, name: &str) -> Option<View> {
        match self.get(name)? {
            Entry::View(view) => Some(view),
            _ => None,
        }
    }

    /// Creates a view with the configured settings whose rendered markup is
    /// bound by this context.
    pub fn create_view(&self) -> View {
        let view = View::new(&self.inner.config.view, self.transport());
        view.set_context(self);
        view
    }

    /// Creates a router rendering through [`Context::create_view`].
    pub fn create_router(&self) -> Router {
        Router::new(self.create_view())
    }

    // ==================== Bindings ====================

    /// Reads the binding attribute `name` (without the prefix).
    pub fn attr(&self, element: &ElementRef, name: &str) -> Option<String> {
        element.attribute(&format!("{}{}", self.inner.config.prefix, name))
    }

    /// Sets the binding attribute `name`, or removes it when `value` is
    /// `None` or empty.
    pub fn set_attr(&self, element: &ElementRef, name: &str, value: Option<&str>) -> &Self {
        let attribute = format!("{}{}", self.inner.config.prefix, name);
        match value.filter(|v| !v.is_empty()) {
            Some(value) => element.set_attribute(&attribute, value),
            None => {
                element.remove_attribute(&attribute);
            }
        }
        self
    }

    /// Binds `element` and then its descendants.
    ///
    /// Descendants of an element bound to a router or a view are left to
    /// the render, which binds the markup it produces.
    pub fn run(&self, element: &ElementRef) -> Result<()> {
        if !self.bind_one(element)? {
            self.bind_descendants(element)?;
        }
        Ok(())
    }

    /// Runs every binding handler named by the element's attributes.
    ///
    /// Returns true when a handler took over the element's content.
    pub fn bind_one(&self, element: &ElementRef) -> Result<bool> {
        let prefix = &self.inner.config.prefix;
        let mut renders = false;

        for attribute in element.attribute_names() {
            let Some(handler) = attribute.strip_prefix(prefix.as_str()) else {
                continue;
            };
            let Some(value) = element.attribute(&attribute) else {
                continue;
            };

            match handler {
                "model" => self.bind_model(element, &value)?,
                "router" => {
                    self.bind_router(element, &value)?;
                    renders = true;
                }
                "view" => {
                    self.bind_view(element, &value)?;
                    renders = true;
                }
                _ => {}
            }
        }

        Ok(renders)
    }

    /// Runs the bindings of every descendant of `element`.
    pub fn bind_descendants(&self, element: &ElementRef) -> Result<()> {
        for child in element.children() {
            self.run(&child)?;
        }
        Ok(())
    }

    fn bind_model(&self, element: &ElementRef, key: &str) -> Result<()> {
        // The view handler binds the model of view elements.
        if self.attr(element, "view").is_some() {
            return Ok(());
        }

        let model = self.model(key).ok_or_else(|| self.missing(element, "model", key))?;
        tracing::trace!(model = key, "bind model");
        element.bind_model(Some(&model));
        Ok(())
    }

    fn bind_router(&self, element: &ElementRef, key: &str) -> Result<()> {
        let router = self.router(key).ok_or_else(|| self.missing(element, "router", key))?;
        tracing::debug!(router = key, "bind router");

        router.view().set_target(Some(element.clone()));
        router.bind()?;
        Ok(())
    }

    fn bind_view(&self, element: &ElementRef, key: &str) -> Result<()> {
        let model = match self.attr(element, "model") {
            Some(name) => Some(self.model(&name).ok_or_else(|| self.missing(element, "model", &name))?),
            None => None,
        };

        let (view, template) = match self.attr(element, "path") {
            Some(path) => {
                let view = self.view(key).ok_or_else(|| self.missing(element, "view", key))?;
                (view, path)
            }
            None => {
                let mut config = self.inner.config.view.clone();
                if let Some(prefix) = self.attr(element, "prefix") {
                    config.prefix = prefix;
                }
                if let Some(suffix) = self.attr(element, "suffix") {
                    config.suffix = suffix;
                }
                let view = View::new(&config, self.transport());
                view.set_context(self);
                (view, key.to_string())
            }
        };

        tracing::debug!(view = %template, "bind view");
        view.set_target(Some(element.clone()));
        view.render(&template, model.as_ref())
    }

    fn missing(&self, element: &ElementRef, binding: &str, key: &str) -> Error {
        let message = match self.get(key) {
            Some(entry) => format!("it is a {}, not a {}", entry.kind(), binding),
            None => "it does not exist".to_string(),
        };
        Error::missing_dependency(binding, key, message, element.outer_html())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.inner.entries.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("Context")
            .field("config", &self.inner.config)
            .field("entries", &names)
            .finish()
    }
}
