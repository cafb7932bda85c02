//! Customer authentication extractors.
//!
//! The backend issues the bearer token; the storefront only keeps it in the
//! session next to the customer's name and email.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentCustomer, session_keys};

/// Extractor that requires a signed-in customer.
///
/// If nobody is signed in, redirects to the login page and remembers where
/// the visitor was going.
///
/// # Example
///
/// ```rust,ignore
/// async fn wishlist(RequireCustomer(customer): RequireCustomer) -> impl IntoResponse {
///     format!("Hello, {}!", customer.name)
/// }
/// ```
pub struct RequireCustomer(pub CurrentCustomer);

/// Rejection when a customer is required but nobody is signed in.
pub enum AuthRejection {
    /// Redirect to the login page (for page requests).
    RedirectToLogin(String),
    /// Unauthorized response (for HTMX fragment requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(next) => {
                Redirect::to(&login_url(&next, false)).into_response()
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let customer: Option<CurrentCustomer> = session
            .get(session_keys::CUSTOMER_TOKEN)
            .await
            .ok()
            .flatten();

        customer.map(Self).ok_or_else(|| {
            if parts.headers.contains_key("hx-request") {
                AuthRejection::Unauthorized
            } else {
                AuthRejection::RedirectToLogin(parts.uri.path().to_string())
            }
        })
    }
}

/// Extractor that optionally gets the current customer.
pub struct OptionalCustomer(pub Option<CurrentCustomer>);

impl<S> FromRequestParts<S> for OptionalCustomer
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentCustomer>(session_keys::CUSTOMER_TOKEN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(customer))
    }
}

/// Store the signed-in customer in the session.
///
/// The session id is cycled to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_customer(
    session: &Session,
    customer: &CurrentCustomer,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CUSTOMER_TOKEN, customer).await
}

/// Remove the customer from the session (logout). The cart is kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_customer(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentCustomer>(session_keys::CUSTOMER_TOKEN)
        .await?;
    Ok(())
}

/// Where a signed-in customer lands when no valid `next` was given.
const DEFAULT_NEXT: &str = "/account";

/// Only same-site paths are accepted as a post-login destination.
///
/// Browsers read `\` as `/`, so `/\host` is rejected like `//host`.
#[must_use]
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => DEFAULT_NEXT,
    }
}

/// Login page URL that returns the customer to `next` afterwards.
#[must_use]
pub fn login_url(next: &str, expired: bool) -> String {
    let next = urlencoding::encode(safe_next(Some(next)));
    if expired {
        format!("/account/login?expired=true&next={next}")
    } else {
        format!("/account/login?next={next}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_rejects_offsite() {
        assert_eq!(safe_next(Some("/account/wishlist")), "/account/wishlist");
        assert_eq!(safe_next(Some("//evil.example")), "/account");
        assert_eq!(safe_next(Some("https://evil.example")), "/account");
        assert_eq!(safe_next(None), "/account");
    }

    #[test]
    fn test_safe_next_rejects_backslash_hosts() {
        assert_eq!(safe_next(Some("/\\evil.example")), "/account");
        assert_eq!(safe_next(Some("/account\\..\\x")), "/account");
        assert_eq!(safe_next(Some("/\tevil.example")), "/account");
    }

    #[test]
    fn test_login_url_round_trips_next() {
        assert_eq!(
            login_url("/a%26b?x=1&y", false),
            "/account/login?next=%2Fa%2526b%3Fx%3D1%26y"
        );
        assert_eq!(
            login_url("/account/wishlist", true),
            "/account/login?expired=true&next=%2Faccount%2Fwishlist"
        );
        assert_eq!(login_url("//evil.example", false), "/account/login?next=%2Faccount");
    }

    #[test]
    fn test_rejection_redirects_with_next() {
        let response =
            AuthRejection::RedirectToLogin("/account/wishlist".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/account/login?next=%2Faccount%2Fwishlist")
        );
    }
}
