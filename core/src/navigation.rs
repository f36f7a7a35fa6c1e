//! Host hook invoked when the session expires.

use std::sync::{Arc, Mutex};

use tracing::warn;

/// Performs a full navigation to `path`. Supplied by the host application.
pub trait Navigator: Send + Sync {
    fn redirect(&self, path: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn redirect(&self, path: &str) {
        self(path)
    }
}

/// Default navigator for hosts without a view layer: only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, path: &str) {
        warn!(target_path = path, "session expired, login required");
    }
}

/// Records every redirect. Useful for hosts that poll instead of react.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    visited: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, path: &str) {
        self.visited
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.to_string());
    }
}
