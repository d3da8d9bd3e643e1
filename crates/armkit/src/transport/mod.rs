//! HTTP transport used by the Resource Manager client.
//!
//! [`ArmClient`](crate::ArmClient) never touches `ureq` directly. It sends
//! [`Request`]s through a [`Transport`] and reads back [`Reply`]s, so the
//! long-running-operation logic can be driven by [`MockTransport`] in tests.
//!
//! ```
//! use armkit::transport::{MockTransport, Reply, Request, Transport};
//!
//! let mock = MockTransport::new();
//! mock.push(Reply::new(200, serde_json::json!({"id": "/x"})));
//!
//! let reply = mock.send(&Request::get("https://example/x")).unwrap();
//! assert_eq!(reply.status, 200);
//! assert_eq!(mock.requests().len(), 1);
//! ```

pub mod http;

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub use http::UreqTransport;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// Request payload
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// No body
    Empty,
    /// JSON document
    Json(Value),
    /// `application/x-www-form-urlencoded` pairs
    Form(Vec<(String, String)>),
}

/// A single outgoing request
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    /// Bearer token for the `Authorization` header
    pub bearer: Option<String>,
    pub payload: Payload,
}

impl Request {
    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            bearer: None,
            payload: Payload::Empty,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn put(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, url).json(body)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    /// Attach a bearer token
    #[must_use]
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.payload = Payload::Json(body);
        self
    }

    #[must_use]
    pub fn form<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.payload = Payload::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }
}

/// A response, with the headers the client cares about already extracted
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    /// `Azure-AsyncOperation` header
    pub async_operation: Option<String>,
    /// `Location` header
    pub location: Option<String>,
    /// `Retry-After` header, in seconds
    pub retry_after: Option<Duration>,
    /// Parsed JSON body, `Null` when empty
    pub body: Value,
}

impl Reply {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            async_operation: None,
            location: None,
            retry_after: None,
            body,
        }
    }

    /// Reply with no body
    pub fn empty(status: u16) -> Self {
        Self::new(status, Value::Null)
    }

    #[must_use]
    pub fn with_async_operation(mut self, url: impl Into<String>) -> Self {
        self.async_operation = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, url: impl Into<String>) -> Self {
        self.location = Some(url.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx reply into a service error
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::from_body(self.status, &self.body))
        }
    }
}

/// Sends requests and returns replies.
///
/// Non-2xx statuses are replies, not errors; only failures to complete the
/// exchange are reported as `Err`.
pub trait Transport: Send + Sync {
    fn send(&self, request: &Request) -> Result<Reply>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &Request) -> Result<Reply> {
        (**self).send(request)
    }
}

/// Scripted transport for testing without network access.
///
/// Replies are returned in the order they were pushed, regardless of the
/// request. Every request is recorded.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<Result<Reply>>>>,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply
    pub fn push(&self, reply: Reply) {
        self.lock_replies().push_back(Ok(reply));
    }

    /// Queue a transport failure
    pub fn push_error(&self, error: Error) {
        self.lock_replies().push_back(Err(error));
    }

    /// Requests sent so far
    pub fn requests(&self) -> Vec<Request> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Replies not yet consumed
    pub fn pending(&self) -> usize {
        self.lock_replies().len()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<Reply>>> {
        self.replies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &Request) -> Result<Reply> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.lock_replies().pop_front().unwrap_or_else(|| {
            Err(Error::Transport(format!(
                "no mock reply for {} {}",
                request.method, request.url
            )))
        })
    }
}
