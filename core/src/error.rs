//! Error types for the catalog request layer.
//!
//! # Design
//! `HttpStatus` carries only the numeric status: error bodies are never
//! parsed. `SessionExpired` is handled inside `RequestClient::parse` (token
//! cleared, redirect issued) and only surfaces from the typed helpers, which
//! cannot represent "no data" as a value.

use thiserror::Error;

/// Errors returned by `RequestClient` and the typed catalog API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The network call itself failed (connection refused, DNS, TLS, ...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status other than 401.
    #[error("HTTP error! status: {status}")]
    HttpStatus { status: u16 },

    /// The server answered 401; the session was cleared and the login
    /// redirect has been issued.
    #[error("session expired")]
    SessionExpired,

    /// A success response declared JSON but the body did not parse, or a
    /// typed caller received something other than the expected shape.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The session token could not be stored or removed.
    #[error("session storage failed: {0}")]
    Session(String),

    /// The request path was empty.
    #[error("request path must not be empty")]
    InvalidPath,

    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The backend processed the call but reported `success: false`.
    #[error("rejected by server: {0}")]
    Rejected(String),
}

impl ApiError {
    /// The HTTP status, when the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status } => Some(*status),
            ApiError::SessionExpired => Some(401),
            _ => None,
        }
    }
}
