//! Collection route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use knotwork_core::models::Collection;
use knotwork_core::types::CollectionId;
use knotwork_core::validation::FieldErrors;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{CollectionInput, FileUpload};
use crate::error::Result;
use crate::filters;
use crate::middleware::auth::RequireAdminAuth;
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::{
    MultipartForm, action_failed, failure_alert, failure_status, set_flash, take_flash,
};

/// Collection table row.
#[derive(Debug, Clone)]
pub struct CollectionRowView {
    pub id: String,
    pub name: String,
    pub handle: String,
    pub description: String,
    pub image_url: Option<String>,
    pub product_count: u32,
}

impl From<&Collection> for CollectionRowView {
    fn from(collection: &Collection) -> Self {
        Self {
            id: collection.id.to_string(),
            name: collection.name.clone(),
            handle: collection.handle().to_string(),
            description: collection.description.clone(),
            image_url: collection.image.clone(),
            product_count: collection.product_count,
        }
    }
}

/// Collection form fields.
#[derive(Debug, Clone, Default)]
pub struct CollectionForm {
    pub name: String,
    pub description: String,
    pub current_image: Option<String>,
}

impl CollectionForm {
    fn from_multipart(form: &MultipartForm) -> Self {
        Self {
            name: form.text("name"),
            description: form.text("description"),
            current_image: Some(form.text("current_image")).filter(|s| !s.is_empty()),
        }
    }

    /// # Errors
    ///
    /// Returns every field that failed validation.
    pub fn validate(
        &self,
        image: Option<FileUpload>,
    ) -> std::result::Result<CollectionInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        errors
            .require("name", "Name", &self.name)
            .length("name", "Name", &self.name, 2, 100)
            .length("description", "Description", &self.description, 0, 1000);
        if let Some(image) = &image {
            errors.images("image", [&image.meta()]);
        }
        errors.into_result()?;

        Ok(CollectionInput {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            image,
        })
    }
}

/// Collections list template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/index.html")]
pub struct CollectionsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub collections: Vec<CollectionRowView>,
}

/// Collection create/edit template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/form.html")]
pub struct CollectionFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub heading: String,
    pub action: String,
    pub form: CollectionForm,
    pub errors: FieldErrors,
    pub alert: Option<String>,
}

impl CollectionFormTemplate {
    fn new(
        admin_user: AdminUserView,
        id: Option<&CollectionId>,
        form: CollectionForm,
        errors: FieldErrors,
        alert: Option<String>,
    ) -> Self {
        let (heading, action) = match id {
            Some(id) => (format!("Edit {}", form.name), format!("/collections/{id}")),
            None => ("New collection".to_string(), "/collections".to_string()),
        };
        Self {
            admin_user,
            current_path: "/collections".to_string(),
            heading,
            action,
            form,
            errors,
            alert,
        }
    }
}

/// GET /collections
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<CollectionsIndexTemplate> {
    let collections = state.backend().list_collections(&admin.token).await?;
    Ok(CollectionsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/collections".to_string(),
        flash: take_flash(&session).await,
        collections: collections.iter().map(CollectionRowView::from).collect(),
    })
}

/// GET /collections/new
pub async fn new(RequireAdminAuth(admin): RequireAdminAuth) -> CollectionFormTemplate {
    CollectionFormTemplate::new(
        AdminUserView::from(&admin),
        None,
        CollectionForm::default(),
        FieldErrors::new(),
        None,
    )
}

/// GET /collections/{id}/edit
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<CollectionFormTemplate> {
    let id = CollectionId::new(id);
    let collection = state.backend().get_collection(&admin.token, &id).await?;
    let form = CollectionForm {
        name: collection.name,
        description: collection.description,
        current_image: collection.image,
    };
    Ok(CollectionFormTemplate::new(
        AdminUserView::from(&admin),
        Some(&id),
        form,
        FieldErrors::new(),
        None,
    ))
}

/// POST /collections
#[instrument(skip(admin, state, session, multipart))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    let body = MultipartForm::read(multipart).await?;
    let form = CollectionForm::from_multipart(&body);
    let admin_user = AdminUserView::from(&admin);

    let input = match form.validate(body.file("image")) {
        Ok(input) => input,
        Err(errors) => {
            let page = CollectionFormTemplate::new(admin_user, None, form, errors, None);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match state.backend().create_collection(&admin.token, input).await {
        Ok(collection) => {
            tracing::info!(collection_id = %collection.id, "Collection created");
            set_flash(&session, &format!("{} created.", collection.name)).await;
            Ok(Redirect::to("/collections").into_response())
        }
        Err(e) => {
            let alert = failure_alert(&session, &e).await;
            let page = CollectionFormTemplate::new(
                admin_user,
                None,
                form,
                FieldErrors::new(),
                Some(alert),
            );
            Ok((failure_status(&e), page).into_response())
        }
    }
}

/// POST /collections/{id}
#[instrument(skip(admin, state, session, multipart))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    let id = CollectionId::new(id);
    let body = MultipartForm::read(multipart).await?;
    let form = CollectionForm::from_multipart(&body);
    let admin_user = AdminUserView::from(&admin);

    let input = match form.validate(body.file("image")) {
        Ok(input) => input,
        Err(errors) => {
            let page = CollectionFormTemplate::new(admin_user, Some(&id), form, errors, None);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match state.backend().update_collection(&admin.token, &id, input).await {
        Ok(collection) => {
            tracing::info!(collection_id = %id, "Collection updated");
            set_flash(&session, &format!("{} updated.", collection.name)).await;
            Ok(Redirect::to("/collections").into_response())
        }
        Err(e) => {
            let alert = failure_alert(&session, &e).await;
            let page = CollectionFormTemplate::new(
                admin_user,
                Some(&id),
                form,
                FieldErrors::new(),
                Some(alert),
            );
            Ok((failure_status(&e), page).into_response())
        }
    }
}

/// POST /collections/{id}/delete
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let id = CollectionId::new(id);
    match state.backend().delete_collection(&admin.token, &id).await {
        Ok(()) => {
            tracing::info!(collection_id = %id, "Collection deleted");
            set_flash(&session, "Collection deleted.").await;
            Redirect::to("/collections").into_response()
        }
        Err(e) => action_failed(&admin, &session, &e, "/collections").await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_name() {
        let errors = CollectionForm::default().validate(None).unwrap_err();
        assert_eq!(errors.get("name"), Some("Name is required."));
    }

    #[test]
    fn test_validate_rejects_non_image() {
        let form = CollectionForm {
            name: "Kilims".to_string(),
            ..CollectionForm::default()
        };
        let pdf = FileUpload {
            file_name: "lookbook.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            bytes: vec![1, 2, 3],
        };
        let errors = form.validate(Some(pdf)).unwrap_err();
        assert!(errors.has("image"));
    }
}
