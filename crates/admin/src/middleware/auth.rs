//! Authentication middleware and extractors for admin.
//!
//! The backend issues the bearer token at login; the back-office keeps it in
//! the session and attaches it to every backend call.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};

/// Extractor that requires admin authentication.
///
/// Redirects to the login page when nobody is signed in.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when admin authentication is required but the user is not logged in.
pub enum AdminAuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// No session layer installed.
    Unauthorized,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// The signed-in admin, or `Err` when no session layer is installed.
async fn session_admin(parts: &Parts) -> Result<Option<CurrentAdmin>, AdminAuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AdminAuthRejection::Unauthorized)?;
    // An unreadable record counts as signed out.
    Ok(session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten())
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_admin(parts)
            .await?
            .map(Self)
            .ok_or(AdminAuthRejection::RedirectToLogin)
    }
}

/// Extractor that optionally gets the current admin; used by the login page
/// to skip the form when a session is already live.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_admin(parts).await.ok().flatten()))
    }
}

/// Helper to set the current admin in the session.
///
/// The session id is cycled to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to clear the current admin from the session (logout or expired token).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_redirects_to_login() {
        let response = AdminAuthRejection::RedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/login")
        );
        assert_eq!(
            AdminAuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
