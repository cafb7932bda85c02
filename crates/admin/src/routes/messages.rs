//! Contact message inbox handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use knotwork_core::models::ContactMessage;
use knotwork_core::types::ContactId;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::auth::RequireAdminAuth;
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::{action_failed, set_flash, take_flash};

/// Inbox row.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub read: bool,
    pub created_at: String,
}

impl From<&ContactMessage> for MessageView {
    fn from(message: &ContactMessage) -> Self {
        Self {
            id: message.id.to_string(),
            name: message.name.clone(),
            email: message.email.clone(),
            subject: if message.subject.trim().is_empty() {
                "(no subject)".to_string()
            } else {
                message.subject.clone()
            },
            message: message.message.clone(),
            read: message.read,
            created_at: message
                .created_at
                .map(|d| d.format("%b %-d, %Y %H:%M").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Inbox template.
#[derive(Template, WebTemplate)]
#[template(path = "messages/index.html")]
pub struct MessagesTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub messages: Vec<MessageView>,
    pub unread_count: usize,
}

/// GET /messages
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<MessagesTemplate> {
    let mut messages = state.backend().list_contacts(&admin.token).await?;
    // Unread first, then newest.
    messages.sort_by(|a, b| a.read.cmp(&b.read).then_with(|| b.created_at.cmp(&a.created_at)));

    Ok(MessagesTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/messages".to_string(),
        flash: take_flash(&session).await,
        unread_count: messages.iter().filter(|m| !m.read).count(),
        messages: messages.iter().map(MessageView::from).collect(),
    })
}

/// POST /messages/{id}/read
#[instrument(skip(admin, state, session))]
pub async fn mark_read(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let id = ContactId::new(id);
    match state.backend().mark_contact_read(&admin.token, &id).await {
        Ok(()) => {
            tracing::info!(contact_id = %id, "Message marked read");
            Redirect::to("/messages").into_response()
        }
        Err(e) => action_failed(&admin, &session, &e, "/messages").await,
    }
}

/// POST /messages/{id}/delete
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let id = ContactId::new(id);
    match state.backend().delete_contact(&admin.token, &id).await {
        Ok(()) => {
            tracing::info!(contact_id = %id, "Message deleted");
            set_flash(&session, "Message deleted.").await;
            Redirect::to("/messages").into_response()
        }
        Err(e) => action_failed(&admin, &session, &e, "/messages").await,
    }
}
