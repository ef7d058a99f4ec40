//! End-to-end behavior of the HTTP client, router, views and bindings.

use knockup_core::{object, Value};
use knockup_model::{Collection, Definition, ModelType};
use knockup_web::{
    Context, ContextConfig, ControllerResult, Dispatch, Element, ElementRef, Error, Http, HttpConfig,
    HttpEvent, MemoryTransport, Node, Response, Route,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn test_not_found_fires_error_then_stop() {
    init_tracing();
    let transport = Rc::new(MemoryTransport::new());
    let http = Http::new(HttpConfig::default(), transport.clone());

    let events = Rc::new(RefCell::new(Vec::new()));
    for name in ["start", "success", "error", "stop"] {
        let events = events.clone();
        http.events().on(name, move |event| {
            let status = match event {
                HttpEvent::Error { response, .. } => response.as_ref().map(|r| r.status),
                HttpEvent::Stop { status, .. } => *status,
                _ => None,
            };
            events.borrow_mut().push((name, status));
            true
        });
    }

    let called = Rc::new(Cell::new(false));
    let flag = called.clone();
    http.get("/missing", Value::Null, move |_, _| flag.set(true));

    assert!(!called.get());
    assert_eq!(
        *events.borrow(),
        vec![("start", None), ("error", Some(404)), ("stop", Some(404))]
    );
}

#[test]
fn test_post_model_export_nested() {
    let address = ModelType::new(Definition::new().property("city", "").property("zip", ""));
    let person = ModelType::new(
        Definition::new()
            .property("name", "")
            .property("tags", Vec::<Value>::new())
            .relation("address", address),
    );
    let ann = person.create(object! {
        "name" => "Ann Lee",
        "tags" => vec!["a&b"],
        "address" => object! { "city" => "Oslo", "zip" => "0150" },
    });

    let transport = Rc::new(MemoryTransport::new());
    transport.respond("/people", Response::new(200, r#"{"id": 1}"#).with_header("Content-Type", "application/json"));
    let http = Http::new(HttpConfig::default(), transport.clone());

    let id = Rc::new(RefCell::new(Value::Null));
    let sink = id.clone();
    http.post("/people", &ann, move |data, _| {
        *sink.borrow_mut() = data.get("id").cloned().unwrap_or_default();
    });

    let sent = transport.requests();
    assert_eq!(
        sent[0].body.as_deref(),
        Some("address%5Bcity%5D=Oslo&address%5Bzip%5D=0150&name=Ann%20Lee&tags%5B0%5D=a%26b")
    );
    assert_eq!(sent[0].header("Content-Type"), Some("application/x-www-form-urlencoded"));
    assert_eq!(*id.borrow(), Value::from(1));
}

#[test]
fn test_fetched_collection_imports_response() {
    let task = ModelType::new(Definition::new().property("title", "").property("done", false));
    let tasks: Collection = task.collection().create(Value::Null);

    let transport = Rc::new(MemoryTransport::new());
    transport.respond(
        "/api/tasks",
        Response::new(200, r#"[{"title":"a"},{"title":"b","done":true}]"#),
    );
    let http = Http::new(
        HttpConfig {
            prefix: "/api".to_string(),
            ..HttpConfig::default()
        },
        transport,
    );

    let target = tasks.clone();
    http.get("/tasks", Value::Null, move |data, _| {
        target.import(data);
    });

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks.find(object! { "done" => true }, None, None).len(), 1);
}

#[test]
fn test_router_fetches_view_and_binds_markup() {
    init_tracing();
    let transport = Rc::new(MemoryTransport::new());
    transport.respond(
        "views/user.html",
        Response::new(200, r#"<h1>User</h1><aside data-ku-model="session"></aside>"#),
    );
    let context = Context::new(ContextConfig::default(), transport.clone());

    let session = ModelType::new(Definition::new().property("token", "t")).create(Value::Null);
    context.set("session", &session);

    let router = context.create_router();
    let user = ModelType::new(Definition::new().property("id", ""));
    router.set(
        "user",
        Route::new(r"^users/(\w+)$", "users/:id", move |params: &[String]| {
            user.create(object! { "id" => params[0].clone() })
        })
        .unwrap(),
    );
    context.set("main", router.clone());

    let page: ElementRef = Node::with_html("body", r#"<div id="app" data-ku-router="main"></div>"#);
    context.run(&page).unwrap();
    assert_eq!(router.route(), None);

    router.go("user", &object! { "id" => "ann" }, Value::Null).unwrap();

    let app = page.find_by_id("app").unwrap();
    assert_eq!(router.route().as_deref(), Some("user"));
    assert_eq!(app.model().map(|m| m.get("id")), Some(Value::from("ann")));
    let aside = app.children()[1].clone();
    assert!(aside.model().is_some_and(|m| m.ptr_eq(&session)));

    router.go("user", &object! { "id" => "bob" }, Value::Null).unwrap();
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(app.model().map(|m| m.get("id")), Some(Value::from("bob")));
}

#[test]
fn test_inline_templates_and_veto() {
    let context = Context::default();
    let document = Node::with_html(
        "body",
        concat!(
            r#"<template id="ku-view-list"><ul></ul></template>"#,
            r#"<template id="ku-view-edit"><form></form></template>"#,
            r#"<main></main>"#,
        ),
    );

    let router = context.create_router();
    router.view().set_document(Some(document.clone()));
    router.view().set_target(Some(document.children()[2].clone()));
    router
        .controller("list", |_| ())
        .set("edit", Route::new("^edit/(.+)$", "edit/:id", |_| ()).unwrap().with_view("edit"));

    let dirty = Rc::new(Cell::new(true));
    let guard = dirty.clone();
    router.events().on("exit.edit", move |_| !guard.get());

    assert_eq!(router.dispatch(Some("edit/1")).unwrap(), Dispatch::Entered("edit".to_string()));
    assert_eq!(document.children()[2].inner_html(), "<form></form>");

    assert_eq!(router.dispatch(Some("list")).unwrap(), Dispatch::Vetoed("list".to_string()));
    assert_eq!(document.children()[2].inner_html(), "<form></form>");

    dirty.set(false);
    assert_eq!(router.dispatch(Some("list")).unwrap(), Dispatch::Entered("list".to_string()));
    assert_eq!(document.children()[2].inner_html(), "<ul></ul>");
}

#[test]
fn test_state_data_and_previous() {
    let context = Context::default();
    let router = context.create_router();
    router.view().set_target(Some(Node::new("main")));
    router.view().cache("item", "");
    router.set(
        "item",
        Route::new(r"^items/(\d+)$", "items/:id", |_| ControllerResult::Empty).unwrap(),
    );

    router.go("item", &object! { "id" => 1 }, object! { "from" => "search" }).unwrap();
    router.go("item", &object! { "id" => 2 }, Value::Null).unwrap();

    let state = router.state();
    assert_eq!(state.get(), "items/2");
    assert_eq!(state.previous().as_deref(), Some("items/2"));
    assert_eq!(state.data(Some("items/1")), Value::from(object! { "from" => "search" }));
    assert_eq!(router.generate("item", &object! { "id" => 5 }).unwrap(), "items/5");
}

#[test]
fn test_router_binding_without_target_route_reports() {
    let context = Context::default();
    let page: ElementRef = Node::with_html("body", r#"<main data-ku-router="missing"></main>"#);

    let err = context.run(&page).unwrap_err();

    assert!(matches!(err, Error::MissingDependency { .. }));
    assert!(err.to_string().starts_with("Cannot bind router \"missing\": it does not exist"));
}
