//! REST backend client for the storefront.
//!
//! # Architecture
//!
//! - The backend is the source of truth; nothing is synced or stored locally
//! - Catalog and editorial reads are cached in memory via `moka`
//!   (TTL from `STOREFRONT_CACHE_TTL_SECS`)
//! - Concurrent misses for the same key share a single backend request
//! - Mutations are never cached and invalidate the entries they affect
//! - Every failure carries a user-facing message from
//!   [`knotwork_core::error_message`]
//!
//! # Example
//!
//! ```rust,ignore
//! use knotwork_storefront::backend::{BackendClient, ProductFilter};
//!
//! let client = BackendClient::new(&config.backend_url, config.cache_ttl)?;
//! let product = client.get_product("heriz-wool").await?;
//! let page = client.list_products(&ProductFilter::default()).await?;
//! ```

mod account;
mod cache;
mod catalog;
mod content;
mod inquiries;
mod orders;

pub use catalog::{ProductFilter, ReviewInput};
pub use inquiries::{BespokeInput, ContactInput, ImageUpload, MAX_REFERENCE_IMAGES};

use std::future::Future;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use knotwork_core::error_message::{RequestFailure, error_message, status_message};
use knotwork_core::models::unwrap_envelope;
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use cache::CacheValue;

/// Request timeout for backend calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors that can occur when talking to the backend.
///
/// `Clone` so a failed cache fill can be handed to every waiting caller.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl BackendError {
    /// Text to show the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => error_message(RequestFailure::Network),
            Self::Status { message, .. } => message.clone(),
            Self::Parse(_) => status_message(500).to_string(),
        }
    }

    /// A 404 raised locally, with the standard message.
    #[must_use]
    pub fn not_found() -> Self {
        Self::Status {
            status: 404,
            message: status_message(404).to_string(),
        }
    }

    /// HTTP status returned by the backend, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404))
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Percent-encode one path segment of a backend URL.
///
/// Dot segments would climb out of the resource path, so they are answered
/// as not found without a request.
fn segment(value: &str) -> Result<Cow<'_, str>, BackendError> {
    match value.trim() {
        "" | "." | ".." => Err(BackendError::not_found()),
        _ => Ok(urlencoding::encode(value)),
    }
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the REST backend.
///
/// Cheap to clone; all clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: &Url, cache_ttl: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("knotwork-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: base_url.as_str().trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    /// Build a request for a backend path, attaching the bearer token if given.
    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        let builder = self.inner.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and decode the JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = request.send().await?;
        let value = handle_response(response).await?;
        serde_json::from_value(unwrap_envelope(value))
            .map_err(|e| BackendError::Parse(e.to_string()))
    }

    /// Send a request whose response body is ignored.
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), BackendError> {
        let response = request.send().await?;
        handle_response(response).await.map(|_| ())
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, BackendError> {
        self.send(self.request(Method::GET, path, token)).await
    }

    /// Look up `key` in the cache, running `fetch` once on a miss.
    ///
    /// Failed fetches are not cached.
    async fn cached<F>(&self, key: String, fetch: F) -> Result<CacheValue, BackendError>
    where
        F: Future<Output = Result<CacheValue, BackendError>>,
    {
        if self.inner.cache.contains_key(&key) {
            debug!(cache_key = %key, "Cache hit");
        }
        self.inner
            .cache
            .try_get_with(key, fetch)
            .await
            .map_err(|e| e.as_ref().clone())
    }

    /// Drop a single cache entry.
    async fn invalidate(&self, key: &str) {
        self.inner.cache.invalidate(key).await;
    }

    /// True if the backend answered at all, whatever the status.
    pub async fn ping(&self) -> bool {
        match self.request(Method::GET, "/health", None).send().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Backend unreachable");
                false
            }
        }
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

/// Turn a non-success response into a [`BackendError`] carrying the message
/// the user should see.
async fn handle_response(response: Response) -> Result<Value, BackendError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let body = serde_json::from_str::<Value>(&text).ok();
        let message = error_message(RequestFailure::Status {
            status: status.as_u16(),
            body: body.as_ref(),
        });
        if status.is_server_error() {
            tracing::warn!(
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "Backend returned server error"
            );
        } else {
            debug!(status = %status, message = %message, "Backend rejected request");
        }
        return Err(BackendError::Status {
            status: status.as_u16(),
            message,
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %text.chars().take(500).collect::<String>(),
            "Failed to parse backend response"
        );
        BackendError::Parse(e.to_string())
    })
}

/// Value mismatch when a cache entry holds the wrong variant.
fn unexpected_cache_value(key: &str) -> BackendError {
    BackendError::Parse(format!("unexpected cache entry for {key}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_for_network_failure() {
        let err = BackendError::Network("connection refused".to_string());
        assert_eq!(
            err.user_message(),
            "Unable to reach the server. Please check your connection."
        );
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_user_message_for_status() {
        let err = BackendError::Status {
            status: 404,
            message: "Product not found".to_string(),
        };
        assert_eq!(err.user_message(), "Product not found");
        assert!(err.is_not_found());
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_parse_error_hides_details() {
        let err = BackendError::Parse("expected value at line 1".to_string());
        assert_eq!(err.user_message(), status_message(500));
    }

    #[test]
    fn test_path_segment_stays_inside_resource() {
        assert_eq!(segment("heriz wool").unwrap(), "heriz%20wool");
        assert!(segment("..").unwrap_err().is_not_found());
        assert!(segment(" ").unwrap_err().is_not_found());

        let url = Url::parse("http://localhost:5000/api").unwrap();
        let client = BackendClient::new(&url, Duration::from_secs(1)).unwrap();
        let path = format!("/products/{}", segment("../orders").unwrap());
        let request = client.request(Method::GET, &path, None).build().unwrap();
        assert_eq!(request.url().path(), "/api/products/..%2Forders");
    }

    #[test]
    fn test_base_url_joins_without_double_slash() {
        let url = Url::parse("http://localhost:5000/").unwrap();
        let client = BackendClient::new(&url, Duration::from_secs(1)).unwrap();
        let request = client
            .request(Method::GET, "/products", Some("tok"))
            .build()
            .unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:5000/products");
        assert_eq!(
            request.headers().get("authorization").and_then(|v| v.to_str().ok()),
            Some("Bearer tok")
        );
    }
}
