//! Session token storage.
//!
//! # Design
//! The token is process-wide state with a fixed lifecycle: written on login,
//! read by every call, cleared on logout or when the server answers 401.
//! Rather than reaching for an ambient global, the client holds an
//! `Arc<dyn SessionStore>` supplied by the host, so tests can inject an
//! in-memory slot and inspect it afterwards.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::error::ApiError;

/// Storage key of the session token. Also the default `FileSession` name.
pub const SESSION_TOKEN_KEY: &str = "token";

/// A single slot holding the current session token.
///
/// Writes report failure as `ApiError::Session`: a token that was not
/// stored must not look like a successful login.
pub trait SessionStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn set_token(&self, token: String) -> Result<(), ApiError>;
    fn clear(&self) -> Result<(), ApiError>;
}

/// In-process token slot. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    slot: Arc<RwLock<Option<String>>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(token.into()))),
        }
    }
}

impl SessionStore for MemorySession {
    fn token(&self) -> Option<String> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_token(&self, token: String) -> Result<(), ApiError> {
        *self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token);
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        self.slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        Ok(())
    }
}

/// Token slot persisted to a file, so a session survives restarts.
///
/// A missing or blank file means no token. Read failures are logged and
/// treated as "no token"; write and remove failures are returned.
#[derive(Debug, Clone)]
pub struct FileSession {
    path: PathBuf,
}

impl FileSession {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A slot named after `SESSION_TOKEN_KEY` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SESSION_TOKEN_KEY))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSession {
    fn token(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read session token");
                None
            }
        }
    }

    fn set_token(&self, token: String) -> Result<(), ApiError> {
        fs::write(&self.path, token).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "failed to persist session token");
            ApiError::Session(format!("cannot write {}: {e}", self.path.display()))
        })
    }

    fn clear(&self) -> Result<(), ApiError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session token removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to remove session token");
                Err(ApiError::Session(format!(
                    "cannot remove {}: {e}",
                    self.path.display()
                )))
            }
        }
    }
}
