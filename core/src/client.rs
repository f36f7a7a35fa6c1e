//! The authenticated request client.
//!
//! # Design
//! Every call goes through `send`, which runs three steps in a fixed order:
//! `build` composes the request (path, headers, JSON body), the `Transport`
//! executes it, and `parse` interprets the response. `build` and `parse` are
//! public so hosts that do their own I/O can drive the two halves directly.
//!
//! A 401 is the one failure handled here: the session is cleared and the
//! navigator is sent to the login path before anything looks at the body.
//! The call then yields `Ok(None)`. Every other failure is returned.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::config::ClientConfig;
use crate::context::{normalize_path, RequestContext};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, APPLICATION_JSON, AUTHORIZATION, CONTENT_TYPE};
use crate::navigation::{LogNavigator, Navigator};
use crate::session::SessionStore;
use crate::transport::Transport;

const UNAUTHORIZED: u16 = 401;
const REDACTED: &str = "[REDACTED]";

/// A successfully decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// The response declared `application/json`.
    Json(Value),
    /// Any other content type, returned verbatim.
    Text(String),
}

impl Body {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            Body::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            Body::Json(_) => None,
        }
    }
}

/// Performs one HTTP call with the stored session token attached.
///
/// Holds the configuration plus the injected transport, session store and
/// navigator; it keeps no per-call state. Clones share all three.
#[derive(Clone)]
pub struct RequestClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl fmt::Debug for RequestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestClient")
            .field("config", &self.config)
            .field("authenticated", &self.session.token().is_some())
            .finish_non_exhaustive()
    }
}

impl RequestClient {
    /// Expiry redirects only log until `with_navigator` installs a real hook.
    pub fn new(
        config: ClientConfig,
        transport: impl Transport + 'static,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config: config.normalized(),
            transport: Arc::new(transport),
            session,
            navigator: Arc::new(LogNavigator),
        }
    }

    pub fn with_navigator(mut self, navigator: impl Navigator + 'static) -> Self {
        self.navigator = Arc::new(navigator);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Compose the outgoing request for `ctx`.
    ///
    /// Headers are layered: `Content-Type: application/json`, then the
    /// caller's headers, then `Authorization: Bearer <token>` if a token is
    /// stored. A later layer replaces an earlier header of the same name.
    pub fn build(&self, ctx: &RequestContext) -> Result<HttpRequest, ApiError> {
        let path = normalize_path(&ctx.path)?;

        let mut headers = vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())];
        for (name, value) in &ctx.headers {
            set_header(&mut headers, name, value);
        }
        if let Some(token) = self.session.token().filter(|t| !t.is_empty()) {
            set_header(&mut headers, AUTHORIZATION, &format!("Bearer {token}"));
        }

        let body = ctx
            .payload
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::Serialization(e.to_string()))?;

        let request = HttpRequest {
            method: ctx.method,
            path: format!("{}{path}", self.config.base_url),
            headers,
            body,
        };

        debug!(
            method = %request.method,
            path = %request.path,
            headers = ?self.loggable_headers(&request.headers),
            "sending request"
        );

        Ok(request)
    }

    /// Interpret a response.
    ///
    /// `Ok(None)` means the session expired: the token is gone and the
    /// navigator has been sent to the login path.
    pub fn parse(&self, response: HttpResponse) -> Result<Option<Body>, ApiError> {
        debug!(status = response.status, "response received");

        if response.status == UNAUTHORIZED {
            self.expire_session()?;
            return Ok(None);
        }

        if !response.is_success() {
            return Err(ApiError::HttpStatus {
                status: response.status,
            });
        }

        if self.config.log_bodies {
            trace!(body = %response.body, "response body");
        }

        if response.is_json() {
            let value = serde_json::from_str(&response.body)
                .map_err(|e| ApiError::Decode(e.to_string()))?;
            Ok(Some(Body::Json(value)))
        } else {
            Ok(Some(Body::Text(response.body)))
        }
    }

    /// Build, dispatch and parse one call.
    pub fn send(&self, ctx: &RequestContext) -> Result<Option<Body>, ApiError> {
        let request = self.build(ctx)?;
        let response = self.transport.execute(&request).inspect_err(|e| {
            warn!(method = %request.method, path = %request.path, error = %e, "request failed");
        })?;
        self.parse(response)
    }

    /// `send`, then deserialize the JSON body into `T`.
    ///
    /// An expired session becomes `ApiError::SessionExpired` here, since a
    /// typed result has no empty value. A text body is a `Decode` error.
    pub fn send_json<T: DeserializeOwned>(&self, ctx: &RequestContext) -> Result<T, ApiError> {
        match self.send(ctx)? {
            None => Err(ApiError::SessionExpired),
            Some(Body::Json(value)) => {
                serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
            }
            Some(Body::Text(text)) => Err(ApiError::Decode(format!(
                "expected a JSON body, got {} bytes of text",
                text.len()
            ))),
        }
    }

    /// The redirect happens even when the token could not be removed; the
    /// storage failure is then returned instead of `Ok(None)`.
    fn expire_session(&self) -> Result<(), ApiError> {
        warn!(login_path = %self.config.login_path, "unauthorized, clearing session");
        let cleared = self.session.clear();
        self.navigator.redirect(&self.config.login_path);
        cleared
    }

    fn loggable_headers(&self, headers: &[(String, String)]) -> Vec<(String, String)> {
        if self.config.redact_authorization {
            redact_headers(headers)
        } else {
            headers.to_vec()
        }
    }
}

/// Copy of `headers` with the authorization value masked.
pub fn redact_headers(headers: &[(String, String)]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            if name.eq_ignore_ascii_case(AUTHORIZATION) {
                (name.clone(), REDACTED.to_string())
            } else {
                (name.clone(), value.clone())
            }
        })
        .collect()
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
        Some(slot) => *slot = (name.to_string(), value.to_string()),
        None => headers.push((name.to_string(), value.to_string())),
    }
}
