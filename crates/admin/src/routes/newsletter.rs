//! Newsletter subscriber handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use knotwork_core::models::Subscriber;
use knotwork_core::types::SubscriberId;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::auth::RequireAdminAuth;
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::{action_failed, set_flash, take_flash};

/// Subscriber table row.
#[derive(Debug, Clone)]
pub struct SubscriberView {
    pub id: String,
    pub email: String,
    pub subscribed: bool,
    pub created_at: String,
}

impl From<&Subscriber> for SubscriberView {
    fn from(subscriber: &Subscriber) -> Self {
        Self {
            id: subscriber.id.to_string(),
            email: subscriber.email.clone(),
            subscribed: subscriber.subscribed,
            created_at: subscriber
                .created_at
                .map(|d| d.format("%b %-d, %Y").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Subscriber list template.
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/index.html")]
pub struct NewsletterTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub subscribers: Vec<SubscriberView>,
    pub active_count: usize,
}

/// GET /newsletter
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<NewsletterTemplate> {
    let subscribers = state.backend().list_subscribers(&admin.token).await?;
    Ok(NewsletterTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/newsletter".to_string(),
        flash: take_flash(&session).await,
        active_count: subscribers.iter().filter(|s| s.subscribed).count(),
        subscribers: subscribers.iter().map(SubscriberView::from).collect(),
    })
}

/// POST /newsletter/{id}/delete
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let id = SubscriberId::new(id);
    match state.backend().delete_subscriber(&admin.token, &id).await {
        Ok(()) => {
            tracing::info!(subscriber_id = %id, "Subscriber removed");
            set_flash(&session, "Subscriber removed.").await;
            Redirect::to("/newsletter").into_response()
        }
        Err(e) => action_failed(&admin, &session, &e, "/newsletter").await,
    }
}
