//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{AdminClient, BackendError};
use crate::config::AdminConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    backend: AdminClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, BackendError> {
        let backend = AdminClient::new(&config.backend_url)?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, backend }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// The back-office REST client.
    #[must_use]
    pub fn backend(&self) -> &AdminClient {
        &self.inner.backend
    }
}
