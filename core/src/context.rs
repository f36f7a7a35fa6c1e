//! Parameters of a single outgoing call.

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpMethod;

/// The inputs of one `RequestClient::send` call. Lives no longer than the
/// call it describes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    pub path: String,
    pub method: HttpMethod,
    /// Serialized to JSON and sent as the body when present.
    pub payload: Option<Value>,
    /// Overlaid on the defaults. A name matching a default (ignoring case)
    /// replaces it.
    pub headers: Vec<(String, String)>,
}

impl RequestContext {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(path).with_method(HttpMethod::Post)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(path).with_method(HttpMethod::Put)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(path).with_method(HttpMethod::Delete)
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Attach any serializable value as the payload.
    pub fn with_json<T: Serialize + ?Sized>(self, payload: &T) -> Result<Self, ApiError> {
        let value =
            serde_json::to_value(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.with_payload(value))
    }
}

/// Ensure `path` starts with exactly the one `/` it needs.
///
/// Paths that already start with `/` are returned unchanged.
pub fn normalize_path(path: &str) -> Result<String, ApiError> {
    if path.is_empty() {
        return Err(ApiError::InvalidPath);
    }
    if path.starts_with('/') {
        Ok(path.to_string())
    } else {
        Ok(format!("/{path}"))
    }
}
