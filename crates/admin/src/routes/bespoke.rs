//! Bespoke request handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use knotwork_core::models::BespokeRequest;
use knotwork_core::types::{BespokeId, BespokeStatus};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::auth::RequireAdminAuth;
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::{NoticeTemplate, OptionView, action_failed, set_flash, take_flash};

/// Bespoke request card.
#[derive(Debug, Clone)]
pub struct BespokeView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub dimensions: String,
    pub colors: String,
    pub budget: String,
    pub message: String,
    pub reference_images: Vec<String>,
    pub status: String,
    pub created_at: String,
    pub status_options: Vec<OptionView>,
}

impl From<&BespokeRequest> for BespokeView {
    fn from(request: &BespokeRequest) -> Self {
        let current = request.status.as_str();
        Self {
            id: request.id.to_string(),
            name: request.name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone().unwrap_or_default(),
            dimensions: request.dimensions.clone(),
            colors: request.colors.clone().unwrap_or_default(),
            budget: request.budget.clone().unwrap_or_default(),
            message: request.message.clone(),
            reference_images: request.reference_images.clone(),
            status: request.status.label().to_string(),
            created_at: request
                .created_at
                .map(|d| d.format("%b %-d, %Y").to_string())
                .unwrap_or_default(),
            status_options: BespokeStatus::ALL
                .iter()
                .map(|s| OptionView::new(s.as_str(), s.label(), current))
                .collect(),
        }
    }
}

/// Status filter for the request list.
#[derive(Debug, Default, Deserialize)]
pub struct BespokeParams {
    #[serde(default)]
    pub status: Option<String>,
}

/// Bespoke request list template.
#[derive(Template, WebTemplate)]
#[template(path = "bespoke/index.html")]
pub struct BespokeIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub requests: Vec<BespokeView>,
    pub filter_options: Vec<OptionView>,
}

/// Requests matching a status, newest first.
#[must_use]
pub fn filter_requests(
    mut requests: Vec<BespokeRequest>,
    status: Option<BespokeStatus>,
) -> Vec<BespokeRequest> {
    if let Some(status) = status {
        requests.retain(|r| r.status == status);
    }
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    requests
}

/// GET /bespoke
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<BespokeParams>,
) -> Result<BespokeIndexTemplate> {
    let status = params.status.as_deref().and_then(|s| s.parse::<BespokeStatus>().ok());
    let requests = state.backend().list_bespoke(&admin.token).await?;
    let current = status.map(|s| s.as_str()).unwrap_or_default();

    Ok(BespokeIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/bespoke".to_string(),
        flash: take_flash(&session).await,
        requests: filter_requests(requests, status)
            .iter()
            .map(BespokeView::from)
            .collect(),
        filter_options: std::iter::once(OptionView::new("", "All requests", current))
            .chain(
                BespokeStatus::ALL
                    .iter()
                    .map(|s| OptionView::new(s.as_str(), s.label(), current)),
            )
            .collect(),
    })
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// POST /bespoke/{id}/status
#[instrument(skip(admin, state, session, form))]
pub async fn update_status(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Response {
    let Ok(status) = form.status.parse::<BespokeStatus>() else {
        let page = NoticeTemplate {
            admin_user: AdminUserView::from(&admin),
            current_path: "/bespoke".to_string(),
            message: "Choose a valid request status.".to_string(),
            back_url: "/bespoke".to_string(),
            signed_out: false,
        };
        return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
    };

    let id = BespokeId::new(id);
    match state.backend().update_bespoke_status(&admin.token, &id, status).await {
        Ok(request) => {
            tracing::info!(
                bespoke_id = %id,
                status = request.status.as_str(),
                "Bespoke request status updated"
            );
            set_flash(&session, &format!("Request marked {}.", request.status.label())).await;
            Redirect::to("/bespoke").into_response()
        }
        Err(e) => action_failed(&admin, &session, &e, "/bespoke").await,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn request(id: &str, status: BespokeStatus, day: u32) -> BespokeRequest {
        BespokeRequest {
            id: BespokeId::new(id),
            status,
            created_at: Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).single(),
            ..BespokeRequest::default()
        }
    }

    #[test]
    fn test_filter_requests_newest_first() {
        let requests = vec![
            request("a", BespokeStatus::New, 1),
            request("b", BespokeStatus::Quoted, 2),
            request("c", BespokeStatus::New, 3),
        ];
        let ids: Vec<String> = filter_requests(requests.clone(), None)
            .iter()
            .map(|r| r.id.to_string())
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);

        let ids: Vec<String> = filter_requests(requests, Some(BespokeStatus::New))
            .iter()
            .map(|r| r.id.to_string())
            .collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn test_view_preselects_status() {
        let view = BespokeView::from(&request("a", BespokeStatus::InReview, 1));
        let selected: Vec<&str> = view
            .status_options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(selected, vec!["in_review"]);
        assert_eq!(view.status, "In review");
    }
}
