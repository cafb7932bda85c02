//! Video route handlers.
//!
//! Videos are links to hosted players, so the form is plain urlencoded and
//! the backend receives JSON.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use knotwork_core::models::Video;
use knotwork_core::types::VideoId;
use knotwork_core::validation::FieldErrors;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::VideoInput;
use crate::error::Result;
use crate::filters;
use crate::middleware::auth::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::{action_failed, failure_alert, failure_status, set_flash, take_flash};

/// Video form fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub position: String,
}

/// True for an absolute `http`/`https` URL with a host.
fn is_web_url(raw: &str) -> bool {
    url::Url::parse(raw.trim())
        .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
}

impl VideoForm {
    fn from_video(video: Video) -> Self {
        Self {
            title: video.title,
            description: video.description,
            video_url: video.video_url,
            thumbnail: video.thumbnail.unwrap_or_default(),
            position: video.position.to_string(),
        }
    }

    /// # Errors
    ///
    /// Returns every field that failed validation.
    pub fn validate(&self) -> std::result::Result<VideoInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        errors
            .require("title", "Title", &self.title)
            .length("title", "Title", &self.title, 2, 200)
            .length("description", "Description", &self.description, 0, 1000)
            .require("video_url", "Video URL", &self.video_url);

        if !self.video_url.trim().is_empty() && !is_web_url(&self.video_url) {
            errors.add("video_url", "Video URL must start with http:// or https://.");
        }
        if !self.thumbnail.trim().is_empty() && !is_web_url(&self.thumbnail) {
            errors.add("thumbnail", "Thumbnail must be a web address.");
        }
        let position = if self.position.trim().is_empty() {
            Some(0)
        } else {
            self.position.trim().parse::<i32>().ok()
        };
        if position.is_none() {
            errors.add("position", "Position must be a whole number.");
        }
        errors.range("position", "Position", position.map(i64::from), 0, 9999);

        errors.into_result()?;

        Ok(VideoInput {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            video_url: self.video_url.trim().to_string(),
            thumbnail: Some(self.thumbnail.trim().to_string()).filter(|t| !t.is_empty()),
            position: position.unwrap_or(0),
        })
    }
}

/// Video table row.
#[derive(Debug, Clone)]
pub struct VideoRowView {
    pub id: String,
    pub title: String,
    pub video_url: String,
    pub thumbnail: Option<String>,
    pub position: i32,
}

impl From<&Video> for VideoRowView {
    fn from(video: &Video) -> Self {
        Self {
            id: video.id.to_string(),
            title: video.title.clone(),
            video_url: video.video_url.clone(),
            thumbnail: video.thumbnail.clone(),
            position: video.position,
        }
    }
}

/// Video list template.
#[derive(Template, WebTemplate)]
#[template(path = "videos/index.html")]
pub struct VideosIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub videos: Vec<VideoRowView>,
}

/// Video create/edit template.
#[derive(Template, WebTemplate)]
#[template(path = "videos/form.html")]
pub struct VideoFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub heading: String,
    pub action: String,
    pub form: VideoForm,
    pub errors: FieldErrors,
    pub alert: Option<String>,
}

impl VideoFormTemplate {
    fn new(
        admin: &CurrentAdmin,
        id: Option<&VideoId>,
        form: VideoForm,
        errors: FieldErrors,
        alert: Option<String>,
    ) -> Self {
        let (heading, action) = match id {
            Some(id) => ("Edit video".to_string(), format!("/videos/{id}")),
            None => ("New video".to_string(), "/videos".to_string()),
        };
        Self {
            admin_user: AdminUserView::from(admin),
            current_path: "/videos".to_string(),
            heading,
            action,
            form,
            errors,
            alert,
        }
    }
}

/// GET /videos
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<VideosIndexTemplate> {
    let videos = state.backend().list_videos(&admin.token).await?;
    Ok(VideosIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/videos".to_string(),
        flash: take_flash(&session).await,
        videos: videos.iter().map(VideoRowView::from).collect(),
    })
}

/// GET /videos/new
pub async fn new(RequireAdminAuth(admin): RequireAdminAuth) -> VideoFormTemplate {
    let form = VideoForm {
        position: "0".to_string(),
        ..VideoForm::default()
    };
    VideoFormTemplate::new(&admin, None, form, FieldErrors::new(), None)
}

/// GET /videos/{id}/edit
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<VideoFormTemplate> {
    let id = VideoId::new(id);
    let video = state.backend().get_video(&admin.token, &id).await?;
    Ok(VideoFormTemplate::new(
        &admin,
        Some(&id),
        VideoForm::from_video(video),
        FieldErrors::new(),
        None,
    ))
}

/// POST /videos
#[instrument(skip(admin, state, session, form))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<VideoForm>,
) -> Response {
    save(&admin, &state, &session, None, form).await
}

/// POST /videos/{id}
#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<VideoForm>,
) -> Response {
    save(&admin, &state, &session, Some(VideoId::new(id)), form).await
}

async fn save(
    admin: &CurrentAdmin,
    state: &AppState,
    session: &Session,
    id: Option<VideoId>,
    form: VideoForm,
) -> Response {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let page = VideoFormTemplate::new(admin, id.as_ref(), form, errors, None);
            return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
        }
    };

    let backend = state.backend();
    let result = match &id {
        Some(id) => backend.update_video(&admin.token, id, &input).await,
        None => backend.create_video(&admin.token, &input).await,
    };

    match result {
        Ok(video) => {
            tracing::info!(video_id = %video.id, "Video saved");
            set_flash(session, &format!("{} saved.", video.title)).await;
            Redirect::to("/videos").into_response()
        }
        Err(e) => {
            let alert = failure_alert(session, &e).await;
            let page = VideoFormTemplate::new(
                admin,
                id.as_ref(),
                form,
                FieldErrors::new(),
                Some(alert),
            );
            (failure_status(&e), page).into_response()
        }
    }
}

/// POST /videos/{id}/delete
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let id = VideoId::new(id);
    match state.backend().delete_video(&admin.token, &id).await {
        Ok(()) => {
            tracing::info!(video_id = %id, "Video deleted");
            set_flash(&session, "Video deleted.").await;
            Redirect::to("/videos").into_response()
        }
        Err(e) => action_failed(&admin, &session, &e, "/videos").await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(url: &str, position: &str) -> VideoForm {
        VideoForm {
            title: "On the loom".to_string(),
            video_url: url.to_string(),
            position: position.to_string(),
            ..VideoForm::default()
        }
    }

    #[test]
    fn test_video_url_must_be_http() {
        let errors = form("ftp://example.com/v.mp4", "1").validate().unwrap_err();
        assert!(errors.has("video_url"));
        let errors = form("not a url", "1").validate().unwrap_err();
        assert!(errors.has("video_url"));
    }

    #[test]
    fn test_position_must_be_integer() {
        let errors = form("https://youtu.be/abc", "first").validate().unwrap_err();
        assert_eq!(errors.get("position"), Some("Position must be a whole number."));
    }

    #[test]
    fn test_valid_video() {
        let input = form("https://www.youtube.com/watch?v=abc", "").validate().unwrap();
        assert_eq!(input.position, 0);
        assert_eq!(input.thumbnail, None);
    }
}
