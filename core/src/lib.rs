//! Authenticated request layer for the tool catalog admin front-end.
//!
//! # Overview
//! `RequestClient` performs one HTTP call with consistent auth, JSON
//! serialization and failure semantics: the session token is attached as a
//! bearer header, error statuses are never decoded, and a 401 clears the
//! session and sends the host to the login view. `CatalogApi` layers the
//! typed tool/post/auth operations on top.
//!
//! # Design
//! - Session storage (`SessionStore`), navigation (`Navigator`) and I/O
//!   (`Transport`) are injected, so the request rules run without a network.
//! - `build` / `parse` are public, letting a host execute requests itself.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod navigation;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use api::CatalogApi;
pub use client::{redact_headers, Body, RequestClient};
pub use config::ClientConfig;
pub use context::{normalize_path, RequestContext};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use navigation::{LogNavigator, Navigator, RecordingNavigator};
pub use session::{FileSession, MemorySession, SessionStore, SESSION_TOKEN_KEY};
pub use transport::{Transport, UreqTransport};
pub use types::{LoginData, NewPost, Post, Tool, ToolPost, UpdateTool, UserInfo};
