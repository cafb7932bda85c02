//! Newsletter subscription route handlers.
//!
//! The footer form posts here via HTMX and swaps in the returned fragment.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, http::StatusCode, response::IntoResponse};
use knotwork_core::validation::FieldErrors;
use serde::Deserialize;
use tracing::instrument;

use crate::state::AppState;

/// Newsletter subscription form data.
#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    pub email: String,
}

/// Success fragment template (replaces the form via HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/subscribe_success.html")]
pub struct SubscribeSuccessTemplate {
    pub email: String,
}

/// Error fragment template (replaces the form via HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/subscribe_error.html")]
pub struct SubscribeErrorTemplate {
    pub message: String,
    pub email: String,
}

/// True when the backend refused an address because it is already on the list.
fn already_subscribed(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("already subscribed") || message.contains("already exists")
}

/// Subscribe to the newsletter (HTMX).
///
/// An address that is already subscribed is reported as a success.
#[instrument(skip(state, form))]
pub async fn subscribe(
    State(state): State<AppState>,
    Form(form): Form<SubscribeForm>,
) -> impl IntoResponse {
    let email = form.email.trim().to_lowercase();

    let mut errors = FieldErrors::new();
    errors.email("email", &email);
    if let Some(message) = errors.get("email") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            SubscribeErrorTemplate {
                message: message.to_string(),
                email,
            },
        )
            .into_response();
    }

    match state.backend().subscribe_newsletter(&email).await {
        Ok(()) => {
            tracing::info!("Newsletter subscription successful");
            SubscribeSuccessTemplate { email }.into_response()
        }
        Err(e) if already_subscribed(&e.user_message()) => {
            SubscribeSuccessTemplate { email }.into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Newsletter subscription failed");
            SubscribeErrorTemplate {
                message: e.user_message(),
                email,
            }
            .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_subscribed_detection() {
        assert!(already_subscribed("Email already subscribed"));
        assert!(already_subscribed("Subscriber already exists"));
        assert!(!already_subscribed("The request was invalid. Please check your input."));
    }
}
