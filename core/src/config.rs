//! Client configuration.
//!
//! Values come from defaults, a deserialized document, or the environment
//! (`CATALOG_*` variables, with `.env` support).

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Scheme and authority the request paths are resolved against.
    pub base_url: String,

    /// Where the navigator is sent when the session expires.
    pub login_path: String,

    /// Replace the authorization header value in diagnostics.
    pub redact_authorization: bool,

    /// Log response bodies at trace level.
    pub log_bodies: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            redact_authorization: true,
            log_bodies: false,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
        .normalized()
    }

    /// Load configuration from environment variables.
    ///
    /// Recognised: `CATALOG_BASE_URL`, `CATALOG_LOGIN_PATH`,
    /// `CATALOG_LOG_BODIES`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("CATALOG_BASE_URL") {
            config.base_url = base_url;
        } else {
            info!("CATALOG_BASE_URL not set, using {DEFAULT_BASE_URL}");
        }

        if let Ok(login_path) = std::env::var("CATALOG_LOGIN_PATH") {
            config.login_path = login_path;
        }

        if let Ok(log_bodies) = std::env::var("CATALOG_LOG_BODIES") {
            match log_bodies.parse::<bool>() {
                Ok(flag) => config.log_bodies = flag,
                Err(_) => warn!("ignoring CATALOG_LOG_BODIES={log_bodies:?}, expected true or false"),
            }
        }

        config.normalized()
    }

    /// Trim the trailing slash off the base URL so joined paths never double up.
    pub fn normalized(mut self) -> Self {
        let trimmed = self.base_url.trim_end_matches('/').len();
        self.base_url.truncate(trimmed);
        self
    }
}
