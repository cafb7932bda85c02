//! Unified error handling for admin.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::backend::BackendError;

/// Application-level error type for the back-office.
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
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // An expired token on a page load goes back to the login screen,
        // which drops the stale session.
        if matches!(&self, Self::Backend(err) if err.is_unauthorized()) {
            return Redirect::to("/login?expired=true").into_response();
        }

        let status = self.status_code();
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Backend(err) => err.user_message(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after an admin signs in.
pub fn set_sentry_user(admin_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
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
        let err = AppError::NotFound("order-123".to_string());
        assert_eq!(err.to_string(), "Not found: order-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(get_status(backend(404)), StatusCode::NOT_FOUND);
        assert_eq!(get_status(backend(500)), StatusCode::BAD_GATEWAY);
        assert_eq!(get_status(backend(422)), StatusCode::BAD_GATEWAY);
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_redirects_to_login() {
        assert_eq!(backend(401).status_code(), StatusCode::UNAUTHORIZED);
        let response = backend(401).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/login?expired=true")
        );
    }
}
