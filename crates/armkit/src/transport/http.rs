//! Blocking `ureq` transport.

use super::{Method, Payload, Reply, Request, Transport};
use crate::error::{Error, Result};
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!("azprov/", env!("CARGO_PKG_VERSION"));

/// Transport backed by a `ureq` agent
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Create a transport whose individual requests time out after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &Request) -> Result<Reply> {
        log::trace!("{} {}", request.method, request.url);

        let auth = request.bearer.as_ref().map(|t| format!("Bearer {t}"));
        let url = request.url.as_str();

        let response = match (request.method, &request.payload) {
            (Method::Get, _) => with_headers(self.agent.get(url), auth.as_deref()).call(),
            (Method::Delete, _) => with_headers(self.agent.delete(url), auth.as_deref()).call(),
            (Method::Put, Payload::Json(body)) => {
                with_headers(self.agent.put(url), auth.as_deref()).send_json(body)
            }
            (Method::Put, _) => with_headers(self.agent.put(url), auth.as_deref()).send_empty(),
            (Method::Post, Payload::Json(body)) => {
                with_headers(self.agent.post(url), auth.as_deref()).send_json(body)
            }
            (Method::Post, Payload::Form(pairs)) => {
                with_headers(self.agent.post(url), auth.as_deref())
                    .send_form(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            }
            (Method::Post, Payload::Empty) => {
                with_headers(self.agent.post(url), auth.as_deref()).send_empty()
            }
        };

        let mut response = response.map_err(Error::from)?;
        let status = response.status().as_u16();
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let async_operation = header("azure-asyncoperation");
        let location = header("location");
        let retry_after = header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let text = response.body_mut().read_to_string()?;
        log::trace!("{} {} -> {status}", request.method, request.url);

        Ok(Reply {
            status,
            async_operation,
            location,
            retry_after,
            body: parse_body(&text),
        })
    }
}

fn with_headers<B>(
    builder: ureq::RequestBuilder<B>,
    auth: Option<&str>,
) -> ureq::RequestBuilder<B> {
    let builder = builder
        .header("Accept", "application/json")
        .header("User-Agent", USER_AGENT);
    match auth {
        Some(value) => builder.header("Authorization", value),
        None => builder,
    }
}

/// Parse a body as JSON, keeping non-JSON text as a string value
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
