//! REST backend client for the back-office (HIGH PRIVILEGE).
//!
//! # Security
//!
//! Every call except [`AdminClient::login`] carries the signed-in admin's
//! bearer token. The client holds no credentials of its own; a token only
//! ever comes from the admin's session (or the CLI's environment).
//!
//! # Architecture
//!
//! - Direct REST calls, nothing cached: the back-office always sees the
//!   backend's current state
//! - JSON bodies for videos, status changes and login; `multipart/form-data`
//!   for every image-bearing resource and the spreadsheet import
//! - No automatic retries; a 401 is surfaced once and the caller signs out
//!
//! # Example
//!
//! ```rust,ignore
//! use knotwork_admin::backend::AdminClient;
//!
//! let client = AdminClient::new(&config.backend_url)?;
//! let session = client.login("ops@knotwork.rugs", &password).await?;
//! let stats = client.dashboard_stats(&session.token).await?;
//! ```

mod catalog;
mod content;
mod inquiries;
mod orders;

pub use catalog::{
    BulkRowError, BulkUploadResult, CollectionInput, ProductInput, ProductQuery, SizeInput,
    VariantInput,
};
pub use content::{BlogInput, PortfolioInput, VideoInput};
pub use orders::OrderQuery;

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use knotwork_core::error_message::{RequestFailure, error_message, status_message};
use knotwork_core::models::{AuthSession, unwrap_envelope};
use knotwork_core::validation::UploadMeta;
use reqwest::multipart::Part;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

/// Request timeout for backend calls. Generous for spreadsheet imports.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Rows per page on admin list screens.
pub const PAGE_SIZE: u32 = 20;

/// Errors that can occur when talking to the backend.
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
    /// Text to show the admin.
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
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401))
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404))
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

/// A file received from a form (image or spreadsheet), ready to forward to
/// the backend.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Metadata for validation.
    #[must_use]
    pub fn meta(&self) -> UploadMeta {
        UploadMeta {
            file_name: self.file_name.clone(),
            content_type: self.content_type.clone(),
            size: self.bytes.len(),
        }
    }

    fn into_part(self) -> Result<Part, BackendError> {
        file_part(self.bytes, self.file_name, self.content_type)
    }
}

fn file_part(
    bytes: Vec<u8>,
    file_name: String,
    content_type: Option<String>,
) -> Result<Part, BackendError> {
    let part = Part::bytes(bytes).file_name(file_name);
    match content_type {
        Some(content_type) => part.mime_str(&content_type).map_err(BackendError::from),
        None => Ok(part),
    }
}

// =============================================================================
// AdminClient
// =============================================================================

/// Client for the REST backend's back-office endpoints.
///
/// Cheap to clone; all clones share the HTTP connection pool.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl AdminClient {
    /// Create a new admin client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: &Url) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("knotwork-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminClientInner {
                client,
                base_url: base_url.as_str().trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Backend base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Build an authenticated request for a backend path.
    fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.unauthenticated(method, path).bearer_auth(token)
    }

    fn unauthenticated(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        self.inner.client.request(method, url)
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

    async fn get<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, BackendError> {
        self.send(self.request(Method::GET, path, token)).await
    }

    async fn delete(&self, path: &str, token: &str) -> Result<(), BackendError> {
        self.send_empty(self.request(Method::DELETE, path, token)).await
    }

    /// Sign in with a staff account.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let request = self
            .unauthenticated(Method::POST, "/auth/admin/login")
            .json(&serde_json::json!({ "email": email, "password": password }));
        self.send(request).await
    }

    /// True if the backend answered at all, whatever the status.
    pub async fn ping(&self) -> bool {
        match self.unauthenticated(Method::GET, "/health").send().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Backend unreachable");
                false
            }
        }
    }
}

/// Turn a non-success response into a [`BackendError`] carrying the message
/// the admin should see.
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_message() {
        let err = BackendError::Status {
            status: 401,
            message: status_message(401).to_string(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message(), "Your session has expired. Please log in again.");
    }

    #[test]
    fn test_network_message() {
        let err = BackendError::Network("connection refused".to_string());
        assert_eq!(err.status(), None);
        assert_eq!(
            err.user_message(),
            "Unable to reach the server. Please check your connection."
        );
    }

    #[test]
    fn test_requests_carry_bearer_token() {
        let client = AdminClient::new(&Url::parse("http://localhost:5000/api/").unwrap()).unwrap();
        let request = client
            .request(Method::DELETE, "/products/p1", "admin-token")
            .build()
            .unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:5000/api/products/p1");
        assert_eq!(
            request.headers().get("authorization").and_then(|v| v.to_str().ok()),
            Some("Bearer admin-token")
        );
    }

    #[test]
    fn test_ids_cannot_reach_other_endpoints() {
        let client = AdminClient::new(&Url::parse("http://localhost:5000/api/").unwrap()).unwrap();
        let path = format!("/orders/{}/status", segment("../../auth/admin/login").unwrap());
        let request = client.request(Method::PATCH, &path, "admin-token").build().unwrap();
        assert_eq!(
            request.url().path(),
            "/api/orders/..%2F..%2Fauth%2Fadmin%2Flogin/status"
        );
        assert!(segment(".").unwrap_err().is_not_found());
    }

    #[test]
    fn test_login_has_no_token() {
        let client = AdminClient::new(&Url::parse("http://localhost:5000").unwrap()).unwrap();
        let request = client
            .unauthenticated(Method::POST, "/auth/admin/login")
            .build()
            .unwrap();
        assert!(request.headers().get("authorization").is_none());
    }
}
