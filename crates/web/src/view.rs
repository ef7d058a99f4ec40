//! Template rendering.
//!
//! A view looks a template up by name, first in its cache, then as an
//! inline template element (`<script id="ku-view-home">` by default) in its
//! document, and finally over HTTP. The markup replaces the content of the
//! target element, attribute bindings run on the new descendants and the
//! model is bound to the target.

use crate::config::ViewConfig;
use crate::context::{Context, WeakContext};
use crate::element::ElementRef;
use crate::http::Http;
use crate::transport::Transport;
use hashbrown::HashMap;
use knockup_core::{Error, Result, Value};
use knockup_model::Model;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

struct ViewInner {
    cache: RefCell<HashMap<String, String>>,
    http: Http,
    id_prefix: String,
    id_suffix: String,
    target: RefCell<Option<ElementRef>>,
    document: RefCell<Option<ElementRef>>,
    context: RefCell<Option<WeakContext>>,
}

/// Renders named templates into a target element.
///
/// Clones share the cache and the target.
#[derive(Clone)]
pub struct View {
    inner: Rc<ViewInner>,
}

impl View {
    /// Creates a view that fetches templates through `transport`.
    pub fn new(config: &ViewConfig, transport: Rc<dyn Transport>) -> Self {
        Self {
            inner: Rc::new(ViewInner {
                cache: RefCell::new(HashMap::new()),
                http: Http::new(config.http(), transport),
                id_prefix: config.id_prefix.clone(),
                id_suffix: config.id_suffix.clone(),
                target: RefCell::new(None),
                document: RefCell::new(None),
                context: RefCell::new(None),
            }),
        }
    }

    /// Returns the client used to fetch templates.
    #[inline]
    pub fn http(&self) -> &Http {
        &self.inner.http
    }

    pub fn target(&self) -> Option<ElementRef> {
        self.inner.target.borrow().clone()
    }

    pub fn set_target(&self, target: Option<ElementRef>) -> &Self {
        *self.inner.target.borrow_mut() = target;
        self
    }

    /// Sets the element searched for inline templates. Without one the
    /// target is searched.
    pub fn set_document(&self, document: Option<ElementRef>) -> &Self {
        *self.inner.document.borrow_mut() = document;
        self
    }

    /// Sets the context whose bindings run on rendered markup. Without one
    /// the thread's global context is used.
    ///
    /// The view does not keep the context alive.
    pub fn set_context(&self, context: &Context) -> &Self {
        *self.inner.context.borrow_mut() = Some(context.downgrade());
        self
    }

    /// Returns the cached template for `name`.
    pub fn cached(&self, name: &str) -> Option<String> {
        self.inner.cache.borrow().get(name).cloned()
    }

    /// Stores a template so rendering `name` needs no lookup.
    pub fn cache(&self, name: impl Into<String>, markup: impl Into<String>) -> &Self {
        self.inner.cache.borrow_mut().insert(name.into(), markup.into());
        self
    }

    /// Renders the template `name` into the target.
    ///
    /// Fails with [`Error::NoRenderTarget`] when no target is set. When the
    /// template has to be fetched, rendering finishes once the response
    /// arrives and later failures are logged.
    pub fn render(&self, name: &str, model: Option<&Model>) -> Result<()> {
        let target = self.target().ok_or(Error::NoRenderTarget)?;

        if let Some(markup) = self.cached(name) {
            tracing::trace!(view = name, "render from cache");
            return self.apply(&markup, model);
        }

        let id = format!("{}{}{}", self.inner.id_prefix, name, self.inner.id_suffix);
        let scope = self.inner.document.borrow().clone().unwrap_or(target);
        if let Some(template) = scope.find_by_id(&id) {
            tracing::trace!(view = name, %id, "render inline template");
            let markup = template.inner_html();
            self.cache(name, markup.clone());
            return self.apply(&markup, model);
        }

        tracing::debug!(view = name, "fetching template");
        let view = self.clone();
        let key = name.to_string();
        let model = model.cloned();
        self.inner.http.get(name, Value::Null, move |data, _| {
            let markup = match data {
                Value::String(markup) => markup,
                other => other.to_display_string(),
            };
            view.cache(key.clone(), markup.clone());
            if let Err(error) = view.apply(&markup, model.as_ref()) {
                tracing::warn!(view = %key, %error, "render failed");
            }
        });
        Ok(())
    }

    /// Puts `markup` into the target, binds its descendants and binds
    /// `model` to the target.
    pub fn apply(&self, markup: &str, model: Option<&Model>) -> Result<()> {
        let target = self.target().ok_or(Error::NoRenderTarget)?;

        target.set_inner_html(markup);
        self.context().bind_descendants(&target)?;
        target.bind_model(model);
        Ok(())
    }

    fn context(&self) -> Context {
        self.inner
            .context
            .borrow()
            .as_ref()
            .and_then(WeakContext::upgrade)
            .unwrap_or_else(Context::global)
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("http", &self.inner.http)
            .field("cached", &self.inner.cache.borrow().len())
            .field("has_target", &self.inner.target.borrow().is_some())
            .finish()
    }
}
