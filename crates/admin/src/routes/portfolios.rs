//! Portfolio route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use knotwork_core::models::PortfolioItem;
use knotwork_core::types::PortfolioId;
use knotwork_core::validation::FieldErrors;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{FileUpload, PortfolioInput};
use crate::error::Result;
use crate::filters;
use crate::middleware::auth::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::{
    MultipartForm, action_failed, failure_alert, failure_status, set_flash, take_flash,
};

/// Most images accepted per portfolio piece.
pub const MAX_PORTFOLIO_IMAGES: usize = 10;

/// Portfolio table row.
#[derive(Debug, Clone)]
pub struct PortfolioRowView {
    pub id: String,
    pub title: String,
    pub location: String,
    pub year: String,
    pub image_url: Option<String>,
    pub image_count: usize,
}

impl From<&PortfolioItem> for PortfolioRowView {
    fn from(item: &PortfolioItem) -> Self {
        Self {
            id: item.id.to_string(),
            title: item.title.clone(),
            location: item.location.clone().unwrap_or_default(),
            year: item.year.map(|y| y.to_string()).unwrap_or_default(),
            image_url: item.images.first().cloned(),
            image_count: item.images.len(),
        }
    }
}

/// Portfolio form fields.
#[derive(Debug, Clone, Default)]
pub struct PortfolioForm {
    pub title: String,
    pub description: String,
    pub location: String,
    pub year: String,
    pub existing_images: Vec<String>,
}

impl PortfolioForm {
    fn from_multipart(form: &MultipartForm) -> Self {
        Self {
            title: form.text("title"),
            description: form.text("description"),
            location: form.text("location"),
            year: form.text("year"),
            existing_images: form.texts("existing_image"),
        }
    }

    fn from_item(item: PortfolioItem) -> Self {
        Self {
            title: item.title,
            description: item.description,
            location: item.location.unwrap_or_default(),
            year: item.year.map(|y| y.to_string()).unwrap_or_default(),
            existing_images: item.images,
        }
    }

    /// New pieces need at least one image; edits may keep the current ones.
    ///
    /// # Errors
    ///
    /// Returns every field that failed validation.
    pub fn validate(
        &self,
        images: Vec<FileUpload>,
        creating: bool,
    ) -> std::result::Result<PortfolioInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        errors
            .require("title", "Title", &self.title)
            .length("title", "Title", &self.title, 2, 200)
            .length("description", "Description", &self.description, 0, 2000)
            .length("location", "Location", &self.location, 0, 100);

        let year = if self.year.trim().is_empty() {
            None
        } else {
            let parsed = self.year.trim().parse::<i32>().ok();
            if parsed.is_none() {
                errors.add("year", "Year must be a number.");
            }
            parsed
        };
        errors.range("year", "Year", year.map(i64::from), 1900, 2100);

        if creating && images.is_empty() {
            errors.add("images", "Please attach at least one image.");
        }
        if images.len() > MAX_PORTFOLIO_IMAGES {
            errors.add("images", format!("Please attach at most {MAX_PORTFOLIO_IMAGES} images."));
        }
        let metas: Vec<_> = images.iter().map(FileUpload::meta).collect();
        errors.images("images", &metas);

        errors.into_result()?;

        Ok(PortfolioInput {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            location: self.location.trim().to_string(),
            year,
            images,
        })
    }
}

/// Portfolio list template.
#[derive(Template, WebTemplate)]
#[template(path = "portfolios/index.html")]
pub struct PortfoliosIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub items: Vec<PortfolioRowView>,
}

/// Portfolio create/edit template.
#[derive(Template, WebTemplate)]
#[template(path = "portfolios/form.html")]
pub struct PortfolioFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub heading: String,
    pub action: String,
    pub form: PortfolioForm,
    pub errors: FieldErrors,
    pub alert: Option<String>,
    pub max_images: usize,
}

impl PortfolioFormTemplate {
    fn new(
        admin: &CurrentAdmin,
        id: Option<&PortfolioId>,
        form: PortfolioForm,
        errors: FieldErrors,
        alert: Option<String>,
    ) -> Self {
        let (heading, action) = match id {
            Some(id) => (format!("Edit {}", form.title), format!("/portfolios/{id}")),
            None => ("New portfolio piece".to_string(), "/portfolios".to_string()),
        };
        Self {
            admin_user: AdminUserView::from(admin),
            current_path: "/portfolios".to_string(),
            heading,
            action,
            form,
            errors,
            alert,
            max_images: MAX_PORTFOLIO_IMAGES,
        }
    }
}

/// GET /portfolios
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<PortfoliosIndexTemplate> {
    let items = state.backend().list_portfolios(&admin.token).await?;
    Ok(PortfoliosIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/portfolios".to_string(),
        flash: take_flash(&session).await,
        items: items.iter().map(PortfolioRowView::from).collect(),
    })
}

/// GET /portfolios/new
pub async fn new(RequireAdminAuth(admin): RequireAdminAuth) -> PortfolioFormTemplate {
    PortfolioFormTemplate::new(&admin, None, PortfolioForm::default(), FieldErrors::new(), None)
}

/// GET /portfolios/{id}/edit
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<PortfolioFormTemplate> {
    let id = PortfolioId::new(id);
    let item = state.backend().get_portfolio(&admin.token, &id).await?;
    Ok(PortfolioFormTemplate::new(
        &admin,
        Some(&id),
        PortfolioForm::from_item(item),
        FieldErrors::new(),
        None,
    ))
}

/// POST /portfolios
#[instrument(skip(admin, state, session, multipart))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    save(&admin, &state, &session, None, multipart).await
}

/// POST /portfolios/{id}
#[instrument(skip(admin, state, session, multipart))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    save(&admin, &state, &session, Some(PortfolioId::new(id)), multipart).await
}

async fn save(
    admin: &CurrentAdmin,
    state: &AppState,
    session: &Session,
    id: Option<PortfolioId>,
    multipart: Multipart,
) -> Result<Response> {
    let body = MultipartForm::read(multipart).await?;
    let form = PortfolioForm::from_multipart(&body);

    let input = match form.validate(body.files("images"), id.is_none()) {
        Ok(input) => input,
        Err(errors) => {
            let page = PortfolioFormTemplate::new(admin, id.as_ref(), form, errors, None);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let backend = state.backend();
    let result = match &id {
        Some(id) => backend.update_portfolio(&admin.token, id, input).await,
        None => backend.create_portfolio(&admin.token, input).await,
    };

    match result {
        Ok(item) => {
            tracing::info!(portfolio_id = %item.id, "Portfolio piece saved");
            set_flash(session, &format!("{} saved.", item.title)).await;
            Ok(Redirect::to("/portfolios").into_response())
        }
        Err(e) => {
            let alert = failure_alert(session, &e).await;
            let page = PortfolioFormTemplate::new(
                admin,
                id.as_ref(),
                form,
                FieldErrors::new(),
                Some(alert),
            );
            Ok((failure_status(&e), page).into_response())
        }
    }
}

/// POST /portfolios/{id}/delete
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let id = PortfolioId::new(id);
    match state.backend().delete_portfolio(&admin.token, &id).await {
        Ok(()) => {
            tracing::info!(portfolio_id = %id, "Portfolio piece deleted");
            set_flash(&session, "Portfolio piece deleted.").await;
            Redirect::to("/portfolios").into_response()
        }
        Err(e) => action_failed(&admin, &session, &e, "/portfolios").await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn jpeg() -> FileUpload {
        FileUpload {
            file_name: "villa.jpg".to_string(),
            content_type: Some("image/jpeg".to_string()),
            bytes: vec![0xFF, 0xD8, 0xFF],
        }
    }

    #[test]
    fn test_validate_empty_title() {
        let errors = PortfolioForm::default().validate(vec![jpeg()], true).unwrap_err();
        assert_eq!(errors.get("title"), Some("Title is required."));
    }

    #[test]
    fn test_create_requires_image() {
        let form = PortfolioForm {
            title: "Lake house".to_string(),
            ..PortfolioForm::default()
        };
        let errors = form.clone().validate(Vec::new(), true).unwrap_err();
        assert!(errors.has("images"));
        assert!(form.validate(Vec::new(), false).is_ok());
    }

    #[test]
    fn test_year_range() {
        let form = PortfolioForm {
            title: "Lake house".to_string(),
            year: "1850".to_string(),
            ..PortfolioForm::default()
        };
        let errors = form.validate(vec![jpeg()], true).unwrap_err();
        assert_eq!(errors.get("year"), Some("Year must be between 1900 and 2100."));

        let form = PortfolioForm {
            title: "Lake house".to_string(),
            year: "2023".to_string(),
            ..PortfolioForm::default()
        };
        assert_eq!(form.validate(vec![jpeg()], true).unwrap().year, Some(2023));
    }
}
