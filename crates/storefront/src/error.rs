//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::filters;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend API request failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Full-page error template.
#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    status: u16,
    title: &'static str,
    message: String,
}

impl AppError {
    /// Status code sent to the browser.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Backend(err) => match err.status() {
                Some(401) => StatusCode::UNAUTHORIZED,
                Some(404) => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Text shown to the shopper. Internal details never leave the server.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Backend(err) => err.user_message(),
            Self::Session(_) | Self::Internal(_) => {
                "Something went wrong on our end. Please try again later.".to_string()
            }
            Self::NotFound(_) => "We couldn't find the page you were looking for.".to_string(),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let page = ErrorTemplate {
            status: status.as_u16(),
            title: status.canonical_reason().unwrap_or("Error"),
            message: self.public_message(),
        };

        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(_) => (status, page.message).into_response(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after a customer signs in.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(status: u16) -> AppError {
        AppError::Backend(BackendError::Status {
            status,
            message: format!("status {status}"),
        })
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product heriz".to_string());
        assert_eq!(err.to_string(), "Not found: product heriz");
    }

    #[test]
    fn test_backend_status_mapping() {
        assert_eq!(backend(401).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(backend(404).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(backend(500).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(backend(422).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            AppError::Backend(BackendError::Network("refused".to_string())).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Internal("pool exhausted".to_string());
        assert!(!err.public_message().contains("pool"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_backend_message_passed_through() {
        assert_eq!(backend(404).public_message(), "status 404");
    }
}
