//! Named routes dispatched against an in-memory navigation state.
//!
//! Routes are tried in registration order and the first whose matcher
//! accepts the request wins. Before its controller runs the router triggers
//! `exit`, `exit.<active route>` (when one is active), `enter` and
//! `enter.<route>`; a handler returning false abandons the dispatch. The
//! controller's result decides what the route's view renders.

mod route;
mod state;

pub use route::{Controller, ControllerResult, Matcher, Route};
pub use state::State;

use crate::view::View;
use knockup_core::{Error, Object, Result, Value};
use knockup_model::{Definition, ModelType};
use knockup_reactive::{Events, SubscriptionId};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Arguments passed to router event handlers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    /// The URI being dispatched.
    pub request: String,
    /// The route being entered.
    pub route: String,
    /// The route being left, if any.
    pub previous: Option<String>,
}

/// Outcome of [`Router::dispatch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// The named route matched and its controller ran.
    Entered(String),
    /// The named route matched but an event handler refused the transition.
    Vetoed(String),
    /// No route matched. The active route is cleared.
    Unmatched,
}

struct RouterInner {
    routes: RefCell<Vec<(String, Route)>>,
    events: Events<Transition>,
    state: State,
    view: View,
    route: RefCell<Option<String>>,
    binding: Cell<Option<SubscriptionId>>,
}

impl Drop for RouterInner {
    fn drop(&mut self) {
        if let Some(id) = self.binding.take() {
            self.state.unsubscribe(id);
        }
    }
}

/// A set of named routes rendering into one view.
///
/// Clones share routes, handlers and state.
#[derive(Clone)]
pub struct Router {
    inner: Rc<RouterInner>,
}

impl Router {
    /// Creates a router with its own state.
    pub fn new(view: View) -> Self {
        Self::with_state(view, State::new())
    }

    /// Creates a router over a shared state.
    pub fn with_state(view: View, state: State) -> Self {
        Self {
            inner: Rc::new(RouterInner {
                routes: RefCell::new(Vec::new()),
                events: Events::new(),
                state,
                view,
                route: RefCell::new(None),
                binding: Cell::new(None),
            }),
        }
    }

    #[inline]
    pub fn events(&self) -> &Events<Transition> {
        &self.inner.events
    }

    #[inline]
    pub fn state(&self) -> &State {
        &self.inner.state
    }

    #[inline]
    pub fn view(&self) -> &View {
        &self.inner.view
    }

    /// Returns the name of the active route.
    pub fn route(&self) -> Option<String> {
        self.inner.route.borrow().clone()
    }

    // ==================== Routes ====================

    /// Registers `route` under `name`. A route without a view renders the
    /// view named after it. Re-registering a name keeps its position.
    pub fn set(&self, name: &str, mut route: Route) -> &Self {
        route.set_default_view(name);

        let mut routes = self.inner.routes.borrow_mut();
        match routes.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = route,
            None => routes.push((name.to_string(), route)),
        }
        self
    }

    /// Registers a route that matches exactly `name`.
    pub fn controller<F, R>(&self, name: &str, controller: F) -> &Self
    where
        F: Fn(&[String]) -> R + 'static,
        R: Into<ControllerResult>,
    {
        self.set(name, Route::exact(name, controller))
    }

    pub fn get(&self, name: &str) -> Result<Route> {
        self.inner
            .routes
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, route)| route.clone())
            .ok_or_else(|| Error::route_not_found(name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.inner.routes.borrow().iter().any(|(n, _)| n == name)
    }

    /// Removes the route named `name`, returning true if it existed.
    pub fn remove(&self, name: &str) -> bool {
        let mut routes = self.inner.routes.borrow_mut();
        let before = routes.len();
        routes.retain(|(n, _)| n != name);
        routes.len() != before
    }

    /// Builds the URI of the route `name` from `params`.
    pub fn generate(&self, name: &str, params: &Object) -> Result<String> {
        Ok(self.get(name)?.generate(params))
    }

    // ==================== Dispatch ====================

    /// Dispatches `request`, or the current state when `None`.
    ///
    /// Fails only when the view cannot render.
    pub fn dispatch(&self, request: Option<&str>) -> Result<Dispatch> {
        let request = request.map_or_else(|| self.inner.state.get(), str::to_string);

        let matched = self.inner.routes.borrow().iter().find_map(|(name, route)| {
            route
                .query(&request)
                .map(|params| (name.clone(), route.clone(), params))
        });
        let Some((name, route, params)) = matched else {
            tracing::debug!(%request, "no route matched");
            *self.inner.route.borrow_mut() = None;
            return Ok(Dispatch::Unmatched);
        };

        let transition = Transition {
            request: request.clone(),
            route: name.clone(),
            previous: self.route(),
        };
        if !self.transition(&transition) {
            tracing::debug!(%request, route = %name, "dispatch vetoed");
            return Ok(Dispatch::Vetoed(name));
        }

        tracing::debug!(%request, route = %name, "dispatch");
        let view = route.view().unwrap_or(name.as_str());
        match (route.controller())(params.as_slice()) {
            ControllerResult::Model(model) => self.inner.view.render(view, Some(&model))?,
            ControllerResult::Data(data) => {
                let model = ModelType::new(Definition::from(data)).create(Value::Null);
                self.inner.view.render(view, Some(&model))?;
            }
            ControllerResult::Empty => self.inner.view.render(view, None)?,
            ControllerResult::Skip => {}
        }

        *self.inner.route.borrow_mut() = Some(name.clone());
        self.inner.state.set_previous(&request);
        Ok(Dispatch::Entered(name))
    }

    fn transition(&self, transition: &Transition) -> bool {
        let events = &self.inner.events;

        events.trigger("exit", transition)
            && transition
                .previous
                .as_ref()
                .map_or(true, |previous| events.trigger(&format!("exit.{}", previous), transition))
            && events.trigger("enter", transition)
            && events.trigger(&format!("enter.{}", transition.route), transition)
    }

    /// Dispatches on every state push from now on, then dispatches the
    /// current state. Failures of later dispatches are logged.
    pub fn bind(&self) -> Result<Dispatch> {
        if self.inner.binding.get().is_none() {
            let weak = Rc::downgrade(&self.inner);
            let id = self.inner.state.subscribe(move |uri| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if let Err(error) = (Router { inner }).dispatch(Some(uri)) {
                    tracing::warn!(%uri, %error, "dispatch failed");
                }
            });
            self.inner.binding.set(Some(id));
        }
        self.dispatch(None)
    }

    /// Stops dispatching on state pushes. Returns true if the router was
    /// bound.
    pub fn unbind(&self) -> bool {
        match self.inner.binding.take() {
            Some(id) => self.inner.state.unsubscribe(id),
            None => false,
        }
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.inner.binding.get().is_some()
    }

    /// Pushes the URI of route `name` to the state, with `data`, and
    /// dispatches it.
    ///
    /// A bound router dispatches from the push and only logs render
    /// failures; an unbound one returns them.
    pub fn go(&self, name: &str, params: &Object, data: impl Into<Value>) -> Result<()> {
        let uri = self.generate(name, params)?;
        self.inner.state.push(uri.clone(), data);

        if !self.is_bound() {
            self.dispatch(Some(&uri))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.inner.routes.borrow().iter().map(|(n, _)| n.clone()).collect();
        f.debug_struct("Router")
            .field("routes", &names)
            .field("route", &self.route())
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::element::{Element, Node};
    use crate::transport::MemoryTransport;
    use knockup_core::object;

    fn router() -> (Router, Rc<Node>) {
        let view = View::new(&ViewConfig::default(), Rc::new(MemoryTransport::new()));
        let target = Node::new("main");
        view.set_target(Some(target.clone()));
        view.cache("home", "<h1>home</h1>");
        view.cache("user", "<h1>user</h1>");
        (Router::new(view), target)
    }

    fn log(router: &Router, names: &[&'static str]) -> Rc<RefCell<Vec<String>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        for &name in names {
            let seen = seen.clone();
            router.events().on(name, move |t| {
                seen.borrow_mut().push(format!("{}:{}", name, t.route));
                true
            });
        }
        seen
    }

    #[test]
    fn test_registry() {
        let (router, _) = router();
        router.controller("home", |_| ());

        assert!(router.has("home"));
        assert_eq!(router.get("home").unwrap().view(), Some("home"));
        assert!(matches!(router.get("nope"), Err(Error::RouteNotFound { .. })));

        assert!(router.remove("home"));
        assert!(!router.remove("home"));
        assert!(!router.has("home"));
    }

    #[test]
    fn test_dispatch_renders_controller_data() {
        let (router, target) = router();
        let params = Rc::new(RefCell::new(Vec::new()));
        let sink = params.clone();
        router.set(
            "user",
            Route::new(r"^users/(\d+)$", "users/:id", move |p: &[String]| {
                *sink.borrow_mut() = p.to_vec();
                object! { "id" => p[0].clone() }
            })
            .unwrap(),
        );

        let outcome = router.dispatch(Some("users/9")).unwrap();

        assert_eq!(outcome, Dispatch::Entered("user".to_string()));
        assert_eq!(*params.borrow(), vec!["9".to_string()]);
        assert_eq!(target.inner_html(), "<h1>user</h1>");
        assert_eq!(target.model().map(|m| m.get("id")), Some(Value::from("9")));
        assert_eq!(router.route().as_deref(), Some("user"));
        assert_eq!(router.state().previous().as_deref(), Some("users/9"));
    }

    #[test]
    fn test_first_registered_route_wins() {
        let (router, _) = router();
        router
            .set("any", Route::new(".*", "", |_| ControllerResult::Skip).unwrap())
            .controller("home", |_| ());

        assert_eq!(router.dispatch(Some("home")).unwrap(), Dispatch::Entered("any".to_string()));
    }

    #[test]
    fn test_event_order_and_exit_of_previous() {
        let (router, _) = router();
        router.controller("home", |_| ()).controller("user", |_| ());
        let seen = log(&router, &["exit", "exit.home", "exit.user", "enter", "enter.home", "enter.user"]);

        router.dispatch(Some("home")).unwrap();
        router.dispatch(Some("user")).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                "exit:home",
                "enter:home",
                "enter.home:home",
                "exit:user",
                "exit.home:user",
                "enter:user",
                "enter.user:user",
            ]
        );
    }

    #[test]
    fn test_veto_keeps_route() {
        let (router, target) = router();
        router.controller("home", |_| ()).controller("user", |_| ());
        router.dispatch(Some("home")).unwrap();
        router.events().on("exit.home", |_| false);

        assert_eq!(router.dispatch(Some("user")).unwrap(), Dispatch::Vetoed("user".to_string()));
        assert_eq!(router.route().as_deref(), Some("home"));
        assert_eq!(target.inner_html(), "<h1>home</h1>");
    }

    #[test]
    fn test_skip_does_not_render() {
        let (router, target) = router();
        router.controller("home", |_| ControllerResult::Skip);

        router.dispatch(Some("home")).unwrap();

        assert_eq!(target.inner_html(), "");
        assert_eq!(router.route().as_deref(), Some("home"));
    }

    #[test]
    fn test_unmatched_clears_route() {
        let (router, _) = router();
        router.controller("home", |_| ());
        router.dispatch(Some("home")).unwrap();

        assert_eq!(router.dispatch(Some("elsewhere")).unwrap(), Dispatch::Unmatched);
        assert_eq!(router.route(), None);
    }

    #[test]
    fn test_render_without_target_fails() {
        let view = View::new(&ViewConfig::default(), Rc::new(MemoryTransport::new()));
        let router = Router::new(view);
        router.controller("home", |_| ());

        assert!(matches!(router.dispatch(Some("home")), Err(Error::NoRenderTarget)));
        assert_eq!(router.route(), None);
    }

    #[test]
    fn test_go_unbound_dispatches() {
        let (router, target) = router();
        router.set("user", Route::new(r"^users/(\d+)$", "users/:id", |_| ()).unwrap());

        router.go("user", &object! { "id" => 3 }, object! { "tab" => "info" }).unwrap();

        assert_eq!(router.state().get(), "users/3");
        assert_eq!(router.state().data(None), Value::from(object! { "tab" => "info" }));
        assert_eq!(target.inner_html(), "<h1>user</h1>");
        assert!(matches!(router.go("nope", &object! {}, Value::Null), Err(Error::RouteNotFound { .. })));
    }

    #[test]
    fn test_bound_router_follows_state() {
        let (router, target) = router();
        router.controller("home", |_| ()).controller("user", |_| ());
        router.state().push("home", Value::Null);

        assert_eq!(router.bind().unwrap(), Dispatch::Entered("home".to_string()));
        assert_eq!(target.inner_html(), "<h1>home</h1>");

        router.state().push("user", Value::Null);
        assert_eq!(router.route().as_deref(), Some("user"));

        assert!(router.unbind());
        router.state().push("home", Value::Null);
        assert_eq!(router.route().as_deref(), Some("user"));
    }

    #[test]
    fn test_bind_twice_subscribes_once() {
        let (router, _) = router();
        let count = Rc::new(Cell::new(0));
        let seen = count.clone();
        router.controller("home", move |_| {
            seen.set(seen.get() + 1);
            ControllerResult::Skip
        });

        router.bind().unwrap();
        router.bind().unwrap();
        count.set(0);
        router.state().push("home", Value::Null);

        assert_eq!(count.get(), 1);
    }
}
