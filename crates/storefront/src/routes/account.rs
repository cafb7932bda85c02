//! Customer account route handlers.
//!
//! Sign-in and registration exchange credentials for a backend bearer token
//! kept in the session. A 401 from the backend means that token expired: the
//! customer is signed out and sent back to the login page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use knotwork_core::error_message::status_message;
use knotwork_core::models::{Order, WishlistItem};
use knotwork_core::types::ProductId;
use knotwork_core::validation::FieldErrors;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::BackendError;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    RequireCustomer, clear_current_customer, login_url, safe_next, set_current_customer,
};
use crate::models::CurrentCustomer;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    pub password: SecretString,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub password: SecretString,
    pub password_confirm: SecretString,
}

/// Wishlist add/remove form data.
#[derive(Debug, Deserialize)]
pub struct WishlistForm {
    pub product_id: String,
    pub next: Option<String>,
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
    pub expired: Option<bool>,
}

const MIN_PASSWORD_LENGTH: usize = 8;

impl RegisterForm {
    fn validate(&self) -> std::result::Result<(), FieldErrors> {
        let password = self.password.expose_secret();
        let mut errors = FieldErrors::new();
        errors
            .require("name", "Name", &self.name)
            .length("name", "Name", &self.name, 2, 100)
            .email("email", &self.email)
            .require("password", "Password", password)
            .length("password", "Password", password, MIN_PASSWORD_LENGTH, 128);
        if password != self.password_confirm.expose_secret() {
            errors.add("password_confirm", "Passwords do not match.");
        }
        errors.into_result()
    }
}

// =============================================================================
// Views & Templates
// =============================================================================

/// Order history row.
#[derive(Clone)]
pub struct OrderView {
    pub reference: String,
    pub date: String,
    pub status: String,
    pub status_class: String,
    pub item_count: u32,
    pub total: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            reference: order.reference().to_string(),
            date: order
                .created_at
                .map(|d| d.format("%b %-d, %Y").to_string())
                .unwrap_or_default(),
            status: order.status.label().to_string(),
            status_class: order.status.badge_class().to_string(),
            item_count: order.item_count(),
            total: order.total.display(),
        }
    }
}

/// Wishlist entry.
#[derive(Clone)]
pub struct WishlistView {
    pub product_id: String,
    pub handle: String,
    pub name: String,
    pub price: String,
    pub image: Option<String>,
}

impl From<&WishlistItem> for WishlistView {
    fn from(item: &WishlistItem) -> Self {
        let product = &item.product;
        Self {
            product_id: product.id.to_string(),
            handle: if product.slug.is_empty() {
                product.id.to_string()
            } else {
                product.slug.clone()
            },
            name: product.name.clone(),
            price: product.price.display(),
            image: product.images.first().map(|img| img.url.clone()),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "account/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub next: String,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "account/register.html")]
pub struct RegisterTemplate {
    pub name: String,
    pub email: String,
    pub errors: FieldErrors,
    pub alert: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub name: String,
    pub email: String,
    pub orders: Vec<OrderView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "account/wishlist.html")]
pub struct WishlistTemplate {
    pub items: Vec<WishlistView>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Sign the customer out after the backend rejected their token.
async fn expire_session(session: &Session, next: &str) -> Result<Response> {
    clear_current_customer(session).await?;
    clear_sentry_user();
    Ok(Redirect::to(&login_url(next, true)).into_response())
}

/// Map a backend failure on an account page: 401 signs out, anything else
/// propagates.
async fn handle_account_error(
    session: &Session,
    err: BackendError,
    next: &str,
) -> Result<Response> {
    if err.is_unauthorized() {
        expire_session(session, next).await
    } else {
        Err(AppError::Backend(err))
    }
}

async fn sign_in(session: &Session, customer: &CurrentCustomer) -> Result<()> {
    set_current_customer(session, customer).await?;
    set_sentry_user(&customer.id, Some(&customer.email));
    tracing::info!(customer_id = %customer.id, "Customer signed in");
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<LoginQuery>) -> impl IntoResponse {
    LoginTemplate {
        email: String::new(),
        next: safe_next(query.next.as_deref()).to_string(),
        error: query
            .expired
            .unwrap_or(false)
            .then(|| status_message(401).to_string()),
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref()).to_string();
    let email = form.email.trim().to_lowercase();

    let mut errors = FieldErrors::new();
    errors
        .email("email", &email)
        .require("password", "Password", form.password.expose_secret());
    if let Some(message) = errors.messages().next() {
        let page = LoginTemplate {
            email,
            next,
            error: Some(message.to_string()),
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    match state
        .backend()
        .login(&email, form.password.expose_secret())
        .await
    {
        Ok(auth) => {
            sign_in(&session, &CurrentCustomer::from(auth)).await?;
            Ok(Redirect::to(&next).into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            let status = if e.status().is_some_and(|s| (400..500).contains(&s)) {
                StatusCode::UNAUTHORIZED
            } else {
                StatusCode::BAD_GATEWAY
            };
            let page = LoginTemplate {
                email,
                next,
                error: Some(e.user_message()),
            };
            Ok((status, page).into_response())
        }
    }
}

/// Display the registration page.
pub async fn register_page() -> impl IntoResponse {
    RegisterTemplate {
        name: String::new(),
        email: String::new(),
        errors: FieldErrors::new(),
        alert: None,
    }
}

/// Handle registration form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let name = form.name.trim().to_string();
    let email = form.email.trim().to_lowercase();

    if let Err(errors) = form.validate() {
        let page = RegisterTemplate {
            name,
            email,
            errors,
            alert: None,
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    match state
        .backend()
        .register(&name, &email, form.password.expose_secret())
        .await
    {
        Ok(auth) => {
            sign_in(&session, &CurrentCustomer::from(auth)).await?;
            Ok(Redirect::to("/account").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            let page = RegisterTemplate {
                name,
                email,
                errors: FieldErrors::new(),
                alert: Some(e.user_message()),
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}

/// Handle logout. The cart survives.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_customer(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}

/// Display the account overview with order history.
#[instrument(skip(state, session, customer))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(customer): RequireCustomer,
) -> Result<Response> {
    match state.backend().my_orders(&customer.token).await {
        Ok(orders) => Ok(AccountIndexTemplate {
            name: customer.name,
            email: customer.email,
            orders: orders.iter().map(OrderView::from).collect(),
        }
        .into_response()),
        Err(e) => handle_account_error(&session, e, "/account").await,
    }
}

/// Display the wishlist.
#[instrument(skip(state, session, customer))]
pub async fn wishlist(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(customer): RequireCustomer,
) -> Result<Response> {
    match state.backend().wishlist(&customer.token).await {
        Ok(items) => Ok(WishlistTemplate {
            items: items.iter().map(WishlistView::from).collect(),
        }
        .into_response()),
        Err(e) => handle_account_error(&session, e, "/account/wishlist").await,
    }
}

/// Add a product to the wishlist, then return to where the form was.
#[instrument(skip(state, session, customer))]
pub async fn wishlist_add(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(customer): RequireCustomer,
    Form(form): Form<WishlistForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref()).to_string();
    let product_id = ProductId::new(form.product_id);
    match state
        .backend()
        .add_to_wishlist(&customer.token, &product_id)
        .await
    {
        Ok(()) => Ok(Redirect::to(&next).into_response()),
        Err(e) => handle_account_error(&session, e, &next).await,
    }
}

/// Remove a product from the wishlist.
#[instrument(skip(state, session, customer))]
pub async fn wishlist_remove(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(customer): RequireCustomer,
    Path(product_id): Path<String>,
) -> Result<Response> {
    let product_id = ProductId::new(product_id);
    match state
        .backend()
        .remove_from_wishlist(&customer.token, &product_id)
        .await
    {
        Ok(()) => Ok(Redirect::to("/account/wishlist").into_response()),
        Err(e) => handle_account_error(&session, e, "/account/wishlist").await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form(password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            name: "Ada Weaver".to_string(),
            email: "ada@example.com".to_string(),
            password: SecretString::from(password.to_string()),
            password_confirm: SecretString::from(confirm.to_string()),
        }
    }

    #[test]
    fn test_register_validation() {
        assert!(register_form("warp-and-weft", "warp-and-weft").validate().is_ok());

        let errors = register_form("short", "other").validate().err().unwrap_or_default();
        assert_eq!(errors.get("password"), Some("Password must be at least 8 characters."));
        assert_eq!(errors.get("password_confirm"), Some("Passwords do not match."));
    }

    #[test]
    fn test_login_form_debug_redacts_password() {
        let form = LoginForm {
            email: "ada@example.com".to_string(),
            password: SecretString::from("hunter22".to_string()),
            next: None,
        };
        assert!(!format!("{form:?}").contains("hunter22"));
    }
}
