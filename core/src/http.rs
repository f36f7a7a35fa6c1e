//! HTTP wire types for the catalog request layer.
//!
//! # Design
//! Requests and responses are plain data. `RequestClient::build` produces an
//! `HttpRequest`, a `Transport` turns it into an `HttpResponse`, and
//! `RequestClient::parse` interprets the response. Keeping the I/O behind a
//! trait lets the auth and expiry rules be tested without a network.

use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const AUTHORIZATION: &str = "Authorization";
pub const APPLICATION_JSON: &str = "application/json";

/// HTTP method for a request. Defaults to `Get`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            other => Err(ApiError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// An outgoing request described as plain data.
///
/// `path` holds the full URL: the configured base URL joined with the
/// normalized resource path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A response described as plain data, as returned by a `Transport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// 2xx and 3xx count as success.
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }

    /// True when the declared content type names JSON.
    pub fn is_json(&self) -> bool {
        self.header(CONTENT_TYPE)
            .map(|ct| ct.to_ascii_lowercase().contains(APPLICATION_JSON))
            .unwrap_or(false)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
