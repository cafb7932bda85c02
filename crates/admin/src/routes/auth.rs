//! Authentication route handlers for admin.
//!
//! Staff sign in with their backend account. The issued token is kept in the
//! session and never shown to the browser.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use knotwork_core::validation::FieldErrors;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Shown when a non-staff account signs in.
const NOT_STAFF_MESSAGE: &str = "This account does not have back-office access.";

/// Login page query parameters.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub expired: Option<bool>,
}

/// Login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: SecretString,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
}

/// Render the login page.
///
/// GET /login
///
/// Arriving with `expired=true` drops whatever is left of the old session.
#[instrument(skip(session, admin))]
pub async fn login_page(
    session: Session,
    OptionalAdminAuth(admin): OptionalAdminAuth,
    Query(query): Query<LoginQuery>,
) -> Result<Response> {
    if query.expired.unwrap_or(false) {
        clear_current_admin(&session).await?;
        clear_sentry_user();
        return Ok(LoginTemplate {
            email: String::new(),
            error: Some(knotwork_core::error_message::status_message(401).to_string()),
        }
        .into_response());
    }
    if admin.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(LoginTemplate {
        email: String::new(),
        error: None,
    }
    .into_response())
}

/// Sign in.
///
/// POST /login
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = form.email.trim().to_lowercase();
    let mut errors = FieldErrors::new();
    errors
        .email("email", &email)
        .require("password", "Password", form.password.expose_secret());
    if let Err(errors) = errors.into_result() {
        let page = LoginTemplate {
            email,
            error: errors.messages().next().map(String::from),
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    let auth = match state
        .backend()
        .login(&email, form.password.expose_secret())
        .await
    {
        Ok(auth) => auth,
        Err(e) => {
            tracing::info!(status = ?e.status(), "Admin login rejected");
            let page = LoginTemplate {
                email,
                error: Some(e.user_message()),
            };
            let status = if e.status().is_some_and(|s| s < 500) {
                StatusCode::UNAUTHORIZED
            } else {
                StatusCode::BAD_GATEWAY
            };
            return Ok((status, page).into_response());
        }
    };

    if auth.user.role.as_deref().is_some_and(|role| role != "admin") {
        tracing::warn!("Non-staff account attempted back-office login");
        let page = LoginTemplate {
            email,
            error: Some(NOT_STAFF_MESSAGE.to_string()),
        };
        return Ok((StatusCode::FORBIDDEN, page).into_response());
    }

    let admin = CurrentAdmin::from(auth);
    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.id, Some(&admin.email));
    tracing::info!(admin_id = %admin.id, "Admin signed in");

    Ok(Redirect::to("/").into_response())
}

/// Logout and clear session.
///
/// POST /logout
pub async fn logout(session: Session) -> impl IntoResponse {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::warn!(error = %e, "Failed to clear admin session");
    }
    clear_sentry_user();
    Redirect::to("/login")
}
