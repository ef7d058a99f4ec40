//! HTTP transports.
//!
//! [`crate::Http`] builds requests and interprets responses; a `Transport`
//! moves them. The completion callback may run before `send` returns or at
//! any later point.

use hashbrown::HashMap;
use knockup_core::Result;
use std::cell::RefCell;
use std::fmt;

/// Request method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    /// Returns the uppercase method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl Request {
    /// Returns the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A received response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Response {
    /// Creates a response with no headers.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Returns the media type of the body without parameters, lowercased.
    pub fn content_type(&self) -> Option<String> {
        self.header("Content-Type").map(media_type)
    }

    /// Returns true for the statuses treated as success: 200 and 304.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.status == 200 || self.status == 304
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Strips parameters such as `; charset=utf-8` from a content type.
pub(crate) fn media_type(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Called once with the outcome of a request.
pub type Completion = Box<dyn FnOnce(Result<Response>)>;

/// Moves requests to a server and responses back.
pub trait Transport {
    fn send(&self, request: Request, completion: Completion);
}

/// An in-memory transport serving canned responses by URL.
///
/// Unknown URLs answer 404. Every request is recorded. Completion runs
/// before `send` returns.
#[derive(Default)]
pub struct MemoryTransport {
    responses: RefCell<HashMap<String, Response>>,
    requests: RefCell<Vec<Request>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `response` for every request to `url`.
    pub fn respond(&self, url: impl Into<String>, response: Response) -> &Self {
        self.responses.borrow_mut().insert(url.into(), response);
        self
    }

    /// Returns the requests sent so far.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }
}

impl Transport for MemoryTransport {
    fn send(&self, request: Request, completion: Completion) {
        let response = self
            .responses
            .borrow()
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| Response::new(404, "Not Found"));
        tracing::trace!(method = %request.method, url = %request.url, status = response.status, "memory transport");
        self.requests.borrow_mut().push(request);
        completion(Ok(response));
    }
}

#[cfg(feature = "blocking")]
pub use blocking::BlockingTransport;

#[cfg(feature = "blocking")]
mod blocking {
    use super::{Completion, Method, Request, Response, Transport};
    use knockup_core::Error;

    /// Sends requests with reqwest's blocking client. Completion runs before
    /// `send` returns.
    pub struct BlockingTransport {
        client: reqwest::blocking::Client,
    }

    impl BlockingTransport {
        pub fn new(client: reqwest::blocking::Client) -> Self {
            Self { client }
        }

        fn execute(&self, request: &Request) -> Result<Response, reqwest::Error> {
            let method = match request.method {
                Method::Get => reqwest::Method::GET,
                Method::Post => reqwest::Method::POST,
                Method::Put => reqwest::Method::PUT,
                Method::Patch => reqwest::Method::PATCH,
                Method::Delete => reqwest::Method::DELETE,
                Method::Head => reqwest::Method::HEAD,
                Method::Options => reqwest::Method::OPTIONS,
            };
            let mut builder = self.client.request(method, &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }

            let response = builder.send()?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
                .collect();
            let body = response.text()?;
            Ok(Response { status, headers, body })
        }
    }

    impl Default for BlockingTransport {
        fn default() -> Self {
            Self::new(reqwest::blocking::Client::new())
        }
    }

    impl Transport for BlockingTransport {
        fn send(&self, request: Request, completion: Completion) {
            let result = self
                .execute(&request)
                .map_err(|e| Error::transport(request.url.clone(), e.to_string()));
            completion(result);
        }
    }
}
