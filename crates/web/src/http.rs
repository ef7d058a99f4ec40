//! HTTP client.
//!
//! `Http` turns model data into form-encoded requests, hands them to a
//! [`Transport`] and parses the responses back into [`Value`]s. Lifecycle
//! events are published through [`Http::events`]:
//!
//! - `start` before the request is sent
//! - `success` after the callback has run
//! - `error` on a status other than 200/304, a transport failure or a body
//!   the selected parser rejects
//! - `stop` last, in every case
//!
//! The callback only runs on success.

use crate::config::HttpConfig;
use crate::transport::{media_type, Method, Request, Response, Transport};
use hashbrown::HashMap;
use knockup_core::{Error, Result, Value};
use knockup_reactive::Events;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Content type of JSON documents.
pub const JSON: &str = "application/json";

/// Content type of form-encoded request bodies.
pub const FORM: &str = "application/x-www-form-urlencoded";

/// Turns a response body into a value.
pub type Parser = Rc<dyn Fn(&str) -> Result<Value>>;

/// Arguments passed to `Http` event handlers.
#[derive(Debug)]
pub enum HttpEvent {
    Start(Request),
    Success {
        request: Request,
        response: Response,
        data: Value,
    },
    Error {
        request: Request,
        response: Option<Response>,
        error: Error,
    },
    Stop {
        request: Request,
        status: Option<u16>,
    },
}

impl HttpEvent {
    /// Returns the request the event belongs to.
    pub fn request(&self) -> &Request {
        match self {
            HttpEvent::Start(request)
            | HttpEvent::Success { request, .. }
            | HttpEvent::Error { request, .. }
            | HttpEvent::Stop { request, .. } => request,
        }
    }
}

struct HttpInner {
    config: HttpConfig,
    parsers: RefCell<HashMap<String, Parser>>,
    events: Events<HttpEvent>,
    transport: Rc<dyn Transport>,
}

/// An HTTP client bound to a transport.
///
/// Cloning is cheap; clones share parsers and event handlers.
#[derive(Clone)]
pub struct Http {
    inner: Rc<HttpInner>,
}

impl Http {
    /// Creates a client with the built-in JSON parser.
    pub fn new(config: HttpConfig, transport: Rc<dyn Transport>) -> Self {
        let mut parsers: HashMap<String, Parser> = HashMap::new();
        parsers.insert(JSON.to_string(), Rc::new(crate::json::parse));

        Self {
            inner: Rc::new(HttpInner {
                config,
                parsers: RefCell::new(parsers),
                events: Events::new(),
                transport,
            }),
        }
    }

    /// Returns the client settings.
    #[inline]
    pub fn config(&self) -> &HttpConfig {
        &self.inner.config
    }

    /// Returns the lifecycle event registry.
    #[inline]
    pub fn events(&self) -> &Events<HttpEvent> {
        &self.inner.events
    }

    /// Registers a parser for responses of `content_type`, replacing any
    /// parser already registered for it.
    pub fn parser<F>(&self, content_type: &str, parser: F) -> &Self
    where
        F: Fn(&str) -> Result<Value> + 'static,
    {
        self.inner
            .parsers
            .borrow_mut()
            .insert(media_type(content_type), Rc::new(parser));
        self
    }

    pub fn get<F>(&self, url: &str, data: impl Into<Value>, callback: F)
    where
        F: FnOnce(Value, &Response) + 'static,
    {
        self.request(Method::Get, url, data, callback);
    }

    pub fn post<F>(&self, url: &str, data: impl Into<Value>, callback: F)
    where
        F: FnOnce(Value, &Response) + 'static,
    {
        self.request(Method::Post, url, data, callback);
    }

    pub fn put<F>(&self, url: &str, data: impl Into<Value>, callback: F)
    where
        F: FnOnce(Value, &Response) + 'static,
    {
        self.request(Method::Put, url, data, callback);
    }

    pub fn patch<F>(&self, url: &str, data: impl Into<Value>, callback: F)
    where
        F: FnOnce(Value, &Response) + 'static,
    {
        self.request(Method::Patch, url, data, callback);
    }

    pub fn delete<F>(&self, url: &str, data: impl Into<Value>, callback: F)
    where
        F: FnOnce(Value, &Response) + 'static,
    {
        self.request(Method::Delete, url, data, callback);
    }

    pub fn head<F>(&self, url: &str, data: impl Into<Value>, callback: F)
    where
        F: FnOnce(Value, &Response) + 'static,
    {
        self.request(Method::Head, url, data, callback);
    }

    pub fn options<F>(&self, url: &str, data: impl Into<Value>, callback: F)
    where
        F: FnOnce(Value, &Response) + 'static,
    {
        self.request(Method::Options, url, data, callback);
    }

    /// Sends a request.
    ///
    /// Objects are form-encoded, strings are sent as they are and null sends
    /// no body. Pass a model as `&model` to send its export.
    pub fn request<F>(&self, method: Method, url: &str, data: impl Into<Value>, callback: F)
    where
        F: FnOnce(Value, &Response) + 'static,
    {
        let request = self.build(method, url, data.into());
        tracing::debug!(method = %request.method, url = %request.url, "http request");

        self.inner.events.trigger("start", &HttpEvent::Start(request.clone()));

        let inner = Rc::clone(&self.inner);
        let sent = request.clone();
        self.inner.transport.send(
            request,
            Box::new(move |result| inner.complete(sent, result, callback)),
        );
    }

    fn build(&self, method: Method, url: &str, data: Value) -> Request {
        let config = &self.inner.config;

        let mut headers = vec![("Accept".to_string(), config.accept.clone())];
        headers.extend(config.headers.iter().map(|(k, v)| (k.clone(), v.clone())));

        let body = match &data {
            Value::Null => None,
            Value::Object(_) | Value::List(_) => Some(serialize(&data)),
            other => Some(other.to_display_string()),
        }
        .filter(|body| !body.is_empty());

        if body.is_some() {
            headers.push(("Content-Type".to_string(), FORM.to_string()));
        }

        Request {
            method,
            url: format!("{}{}{}", config.prefix, url, config.suffix),
            headers,
            body,
        }
    }
}

impl HttpInner {
    fn complete<F>(&self, request: Request, result: Result<Response>, callback: F)
    where
        F: FnOnce(Value, &Response),
    {
        let response = match result {
            Ok(response) => response,
            Err(error) => return self.fail(request, None, error),
        };

        if !response.is_ok() {
            let error = Error::transport(
                request.url.clone(),
                format!("unexpected status {}", response.status),
            );
            return self.fail(request, Some(response), error);
        }

        let data = match self.parse(&response) {
            Ok(data) => data,
            Err(error) => return self.fail(request, Some(response), error),
        };

        tracing::debug!(url = %request.url, status = response.status, "http success");
        callback(data.clone(), &response);

        let status = Some(response.status);
        self.events.trigger(
            "success",
            &HttpEvent::Success {
                request: request.clone(),
                response,
                data,
            },
        );
        self.events.trigger("stop", &HttpEvent::Stop { request, status });
    }

    fn fail(&self, request: Request, response: Option<Response>, error: Error) {
        tracing::warn!(url = %request.url, %error, "http request failed");

        let status = response.as_ref().map(|r| r.status);
        self.events.trigger(
            "error",
            &HttpEvent::Error {
                request: request.clone(),
                response,
                error,
            },
        );
        self.events.trigger("stop", &HttpEvent::Stop { request, status });
    }

    /// Picks the parser for the response content type, then the one for the
    /// configured accept type. Without either the body stays a string.
    fn parse(&self, response: &Response) -> Result<Value> {
        let parser = {
            let parsers = self.parsers.borrow();
            response
                .content_type()
                .and_then(|ct| parsers.get(&ct).cloned())
                .or_else(|| parsers.get(&media_type(&self.config.accept)).cloned())
        };

        match parser {
            Some(parse) => parse(&response.body),
            None => Ok(Value::String(response.body.clone())),
        }
    }
}

impl fmt::Debug for Http {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Http")
            .field("config", &self.inner.config)
            .field("parsers", &self.inner.parsers.borrow().len())
            .finish()
    }
}

/// Form-encodes `data`.
///
/// Nested objects use `parent[child]` keys and lists use `list[index]`.
/// Keys and values are percent-encoded; null fields are skipped.
///
/// ```
/// use knockup_core::{object, Value};
/// use knockup_web::http::serialize;
///
/// let form = serialize(&Value::from(object! { "q" => "a b", "page" => 2 }));
/// assert_eq!(form, "page=2&q=a%20b");
/// ```
pub fn serialize(data: &Value) -> String {
    let mut pairs = Vec::new();
    collect_pairs(data, None, &mut pairs);
    pairs.join("&")
}

fn collect_pairs(value: &Value, key: Option<&str>, out: &mut Vec<String>) {
    match value {
        Value::Object(object) => {
            for (name, child) in object.iter() {
                let nested = match key {
                    Some(parent) => format!("{}[{}]", parent, name),
                    None => name.to_string(),
                };
                collect_pairs(child, Some(&nested), out);
            }
        }
        Value::List(items) => {
            for (index, child) in items.iter().enumerate() {
                let nested = match key {
                    Some(parent) => format!("{}[{}]", parent, index),
                    None => index.to_string(),
                };
                collect_pairs(child, Some(&nested), out);
            }
        }
        Value::Null => {}
        scalar => {
            if let Some(key) = key {
                out.push(format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(&scalar.to_display_string())
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use knockup_core::object;
    use std::cell::Cell;

    fn client(transport: &Rc<MemoryTransport>) -> Http {
        let config = HttpConfig {
            prefix: "/api/".to_string(),
            suffix: ".json".to_string(),
            ..HttpConfig::default()
        };
        Http::new(config, transport.clone())
    }

    fn record(http: &Http) -> Rc<RefCell<Vec<&'static str>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        for name in ["start", "success", "error", "stop"] {
            let log = log.clone();
            http.events().on(name, move |_| {
                log.borrow_mut().push(name);
                true
            });
        }
        log
    }

    #[test]
    fn test_serialize_nested() {
        let data = Value::from(object! {
            "user" => object! { "name" => "Ann Lee", "roles" => vec!["a", "b"] },
            "skip" => Value::Null,
            "n" => 1,
        });

        assert_eq!(
            serialize(&data),
            "n=1&user%5Bname%5D=Ann%20Lee&user%5Broles%5D%5B0%5D=a&user%5Broles%5D%5B1%5D=b"
        );
    }

    #[test]
    fn test_serialize_empty() {
        assert_eq!(serialize(&Value::from(object! {})), "");
        assert_eq!(serialize(&Value::Null), "");
    }

    #[test]
    fn test_request_url_and_headers() {
        let transport = Rc::new(MemoryTransport::new());
        let http = client(&transport);

        http.post("users", object! { "name" => "Ann" }, |_, _| {});
        http.get("users", Value::Null, |_, _| {});

        let sent = transport.requests();
        assert_eq!(sent[0].url, "/api/users.json");
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].header("accept"), Some(JSON));
        assert_eq!(sent[0].header("content-type"), Some(FORM));
        assert_eq!(sent[0].body.as_deref(), Some("name=Ann"));
        assert_eq!(sent[1].header("content-type"), None);
        assert_eq!(sent[1].body, None);
    }

    #[test]
    fn test_custom_headers_follow_accept() {
        let transport = Rc::new(MemoryTransport::new());
        let mut config = HttpConfig::default();
        config.headers.insert("X-Token".to_string(), "t".to_string());
        let http = Http::new(config, transport.clone());

        http.get("/x", Value::Null, |_, _| {});

        let headers = &transport.requests()[0].headers;
        assert_eq!(headers[0].0, "Accept");
        assert_eq!(headers[1], ("X-Token".to_string(), "t".to_string()));
    }

    #[test]
    fn test_success_parses_json_by_content_type() {
        let transport = Rc::new(MemoryTransport::new());
        transport.respond(
            "/api/users.json",
            Response::new(200, r#"{"name":"Ann"}"#).with_header("Content-Type", "application/json; charset=utf-8"),
        );
        let http = client(&transport);
        let log = record(&http);

        let received = Rc::new(RefCell::new(Value::Null));
        let sink = received.clone();
        let events = log.clone();
        http.get("users", Value::Null, move |data, response| {
            assert_eq!(response.status, 200);
            events.borrow_mut().push("callback");
            *sink.borrow_mut() = data;
        });

        assert_eq!(*received.borrow(), Value::from(object! { "name" => "Ann" }));
        assert_eq!(*log.borrow(), vec!["start", "callback", "success", "stop"]);
    }

    #[test]
    fn test_accept_parser_fallback_and_raw_body() {
        let transport = Rc::new(MemoryTransport::new());
        transport.respond("/a", Response::new(200, "[1,2]"));
        transport.respond("/b", Response::new(304, "<p>hi</p>"));

        let json = Http::new(HttpConfig::default(), transport.clone());
        let got = Rc::new(RefCell::new(Vec::new()));
        let sink = got.clone();
        json.get("/a", Value::Null, move |data, _| sink.borrow_mut().push(data));

        let html = Http::new(
            HttpConfig {
                accept: "text/html".to_string(),
                ..HttpConfig::default()
            },
            transport.clone(),
        );
        let sink = got.clone();
        html.get("/b", Value::Null, move |data, _| sink.borrow_mut().push(data));

        assert_eq!(*got.borrow(), vec![Value::from(vec![1, 2]), Value::from("<p>hi</p>")]);
    }

    #[test]
    fn test_not_found_fires_error_and_stop_only() {
        let transport = Rc::new(MemoryTransport::new());
        let http = client(&transport);
        let log = record(&http);

        let called = Rc::new(Cell::new(false));
        let flag = called.clone();
        http.get("missing", Value::Null, move |_, _| flag.set(true));

        assert!(!called.get());
        assert_eq!(*log.borrow(), vec!["start", "error", "stop"]);
    }

    #[test]
    fn test_parse_failure_is_an_error() {
        let transport = Rc::new(MemoryTransport::new());
        transport.respond("/bad", Response::new(200, "{nope").with_header("Content-Type", JSON));
        let http = Http::new(HttpConfig::default(), transport.clone());

        let kind = Rc::new(RefCell::new(None));
        let sink = kind.clone();
        http.events().on("error", move |event| {
            if let HttpEvent::Error { error, response, .. } = event {
                *sink.borrow_mut() = Some((matches!(error, Error::Parse { .. }), response.is_some()));
            }
            true
        });

        let called = Rc::new(Cell::new(false));
        let flag = called.clone();
        http.get("/bad", Value::Null, move |_, _| flag.set(true));

        assert!(!called.get());
        assert_eq!(*kind.borrow(), Some((true, true)));
    }

    #[test]
    fn test_custom_parser() {
        let transport = Rc::new(MemoryTransport::new());
        transport.respond("/t", Response::new(200, "a,b").with_header("Content-Type", "text/csv"));
        let http = Http::new(HttpConfig::default(), transport.clone());
        http.parser("text/csv", |body| {
            Ok(Value::List(body.split(',').map(Value::from).collect()))
        });

        let got = Rc::new(RefCell::new(Value::Null));
        let sink = got.clone();
        http.get("/t", Value::Null, move |data, _| *sink.borrow_mut() = data);

        assert_eq!(*got.borrow(), Value::from(vec!["a", "b"]));
    }
}
