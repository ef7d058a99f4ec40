//! Knockup Web - routing, views, HTTP and attribute bindings for knockup
//! models.
//!
//! This crate wires models from `knockup-model` to a document:
//!
//! - [`Http`]: form-encoding client with lifecycle events and pluggable
//!   response parsers, over a [`Transport`]
//! - [`Router`]: named routes matched against an in-memory [`State`],
//!   with enter/exit events and controllers that pick the model to render
//! - [`View`]: template lookup (cache, inline template, HTTP) and rendering
//!   into a target [`Element`]
//! - [`Context`]: named registry read by `data-ku-*` attribute bindings
//!
//! # Example
//!
//! ```
//! use knockup_core::{object, Value};
//! use knockup_web::{Context, Element, ElementRef, Node};
//!
//! let context = Context::default();
//! let router = context.create_router();
//! router.view().cache("home", "<h1>Home</h1>");
//! router.controller("home", |_| object! { "title" => "Welcome" });
//! router.state().push("home", Value::Null);
//! context.set("main", router);
//!
//! let page: ElementRef = Node::with_html("body", r#"<main data-ku-router="main"></main>"#);
//! context.run(&page).unwrap();
//!
//! let main = page.children()[0].clone();
//! assert_eq!(main.inner_html(), "<h1>Home</h1>");
//! assert_eq!(main.model().map(|m| m.get("title")), Some(Value::from("Welcome")));
//! ```

pub mod config;
mod context;
mod element;
pub mod http;
pub mod json;
pub mod router;
pub mod transport;
mod view;

pub use config::{ContextConfig, HttpConfig, ViewConfig};
pub use context::{Context, Entry};
pub use element::{Element, ElementRef, Node};
pub use http::{Http, HttpEvent, Parser};
pub use router::{Controller, ControllerResult, Dispatch, Route, Router, State, Transition};
pub use transport::{Method, MemoryTransport, Request, Response, Transport};
pub use view::View;

#[cfg(feature = "blocking")]
pub use transport::BlockingTransport;

pub use knockup_core::{Error, Result};
