//! Executes `HttpRequest` values against the network.
//!
//! # Design
//! The client never performs I/O itself; it hands a fully composed request to
//! a `Transport`. `UreqTransport` is the blocking implementation used by hosts
//! and the integration tests. Tests of the auth rules use an in-memory fake.

use ureq::Agent;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

pub trait Transport: Send + Sync {
    /// Run one round-trip. 4xx/5xx responses are data, not errors; only a
    /// failure to get any response at all is `ApiError::Transport`.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport over `ureq`. No retries and no timeout beyond the
/// agent defaults.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, req: &HttpRequest) -> Result<HttpResponse, ApiError> {
        // ureq only allows a body on GET, HEAD and DELETE once forced.
        let result = match (req.method, &req.body) {
            (HttpMethod::Get, Some(_)) => {
                send_with_body(self.agent.get(&req.path).force_send_body(), req)
            }
            (HttpMethod::Head, Some(_)) => {
                send_with_body(self.agent.head(&req.path).force_send_body(), req)
            }
            (HttpMethod::Delete, Some(_)) => {
                send_with_body(self.agent.delete(&req.path).force_send_body(), req)
            }
            (HttpMethod::Get, None) => with_headers(self.agent.get(&req.path), &req.headers).call(),
            (HttpMethod::Head, None) => with_headers(self.agent.head(&req.path), &req.headers).call(),
            (HttpMethod::Delete, None) => {
                with_headers(self.agent.delete(&req.path), &req.headers).call()
            }
            (HttpMethod::Post, _) => send_with_body(self.agent.post(&req.path), req),
            (HttpMethod::Put, _) => send_with_body(self.agent.put(&req.path), req),
            (HttpMethod::Patch, _) => send_with_body(self.agent.patch(&req.path), req),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_with_body(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    req: &HttpRequest,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    let builder = with_headers(builder, &req.headers);
    match &req.body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}
