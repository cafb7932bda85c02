//! Bespoke rug request handlers.
//!
//! The form is `multipart/form-data` so customers can attach up to
//! [`MAX_REFERENCE_IMAGES`] reference photos.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use knotwork_core::validation::FieldErrors;
use tracing::instrument;

use crate::backend::{BespokeInput, ImageUpload, MAX_REFERENCE_IMAGES};
use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;

/// Largest accepted request body: every image at its size limit plus the text fields.
pub const BODY_LIMIT: usize =
    (MAX_REFERENCE_IMAGES + 1) * knotwork_core::validation::MAX_IMAGE_BYTES;

/// Bespoke form fields echoed back into the template.
#[derive(Debug, Clone, Default)]
pub struct BespokeForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub dimensions: String,
    pub colors: String,
    pub budget: String,
    pub message: String,
}

impl BespokeForm {
    fn set(&mut self, field: &str, value: String) {
        match field {
            "name" => self.name = value,
            "email" => self.email = value,
            "phone" => self.phone = value,
            "dimensions" => self.dimensions = value,
            "colors" => self.colors = value,
            "budget" => self.budget = value,
            "message" => self.message = value,
            _ => {}
        }
    }

    fn validate(&self, images: &[ImageUpload]) -> std::result::Result<BespokeInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        errors
            .require("name", "Name", &self.name)
            .length("name", "Name", &self.name, 2, 100)
            .email("email", &self.email)
            .length("phone", "Phone", &self.phone, 7, 20)
            .require("dimensions", "Dimensions", &self.dimensions)
            .length("dimensions", "Dimensions", &self.dimensions, 2, 100)
            .length("colors", "Colors", &self.colors, 0, 200)
            .length("budget", "Budget", &self.budget, 0, 100)
            .require("message", "Description", &self.message)
            .length("message", "Description", &self.message, 10, 5000);
        if images.len() > MAX_REFERENCE_IMAGES {
            errors.add(
                "images",
                format!("Please attach at most {MAX_REFERENCE_IMAGES} images."),
            );
        }
        let metas: Vec<_> = images.iter().map(ImageUpload::meta).collect();
        errors.images("images", &metas);
        errors.into_result()?;

        Ok(BespokeInput {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: self.phone.trim().to_string(),
            dimensions: self.dimensions.trim().to_string(),
            colors: self.colors.trim().to_string(),
            budget: self.budget.trim().to_string(),
            message: self.message.trim().to_string(),
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "bespoke.html")]
pub struct BespokeTemplate {
    pub form: BespokeForm,
    pub errors: FieldErrors,
    pub alert: Option<String>,
    pub submitted: bool,
    pub max_images: usize,
}

impl BespokeTemplate {
    fn new(form: BespokeForm, errors: FieldErrors, alert: Option<String>) -> Self {
        Self {
            form,
            errors,
            alert,
            submitted: false,
            max_images: MAX_REFERENCE_IMAGES,
        }
    }
}

/// Read the multipart body into form fields and non-empty image parts.
async fn read_multipart(mut multipart: Multipart) -> Result<(BespokeForm, Vec<ImageUpload>)> {
    let mut form = BespokeForm::default();
    let mut images = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "images" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(String::from);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            // Browsers send an empty part when no file was chosen.
            if !file_name.is_empty() && !bytes.is_empty() {
                images.push(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            form.set(&name, value);
        }
    }

    Ok((form, images))
}

/// Display the bespoke request form.
pub async fn show() -> impl IntoResponse {
    BespokeTemplate::new(BespokeForm::default(), FieldErrors::new(), None)
}

/// Submit a bespoke request.
#[instrument(skip(state, multipart))]
pub async fn submit(State(state): State<AppState>, multipart: Multipart) -> Result<Response> {
    let (form, images) = read_multipart(multipart).await?;

    let input = match form.validate(&images) {
        Ok(input) => input,
        Err(errors) => {
            let page = BespokeTemplate::new(form, errors, None);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match state.backend().submit_bespoke(&input, images).await {
        Ok(request) => {
            tracing::info!(bespoke_id = %request.id, "Bespoke request submitted");
            let mut page = BespokeTemplate::new(BespokeForm::default(), FieldErrors::new(), None);
            page.submitted = true;
            Ok(page.into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Bespoke request rejected");
            let page = BespokeTemplate::new(form, FieldErrors::new(), Some(e.user_message()));
            Ok((StatusCode::BAD_GATEWAY, page).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> BespokeForm {
        BespokeForm {
            name: "Ada Weaver".to_string(),
            email: "ada@example.com".to_string(),
            dimensions: "8x10 ft".to_string(),
            message: "A runner in muted indigo for a long hallway.".to_string(),
            ..BespokeForm::default()
        }
    }

    fn image(name: &str, content_type: &str) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            content_type: Some(content_type.to_string()),
            bytes: vec![0; 16],
        }
    }

    #[test]
    fn test_valid_request() {
        let input = form().validate(&[image("room.jpg", "image/jpeg")]);
        assert!(input.is_ok());
    }

    #[test]
    fn test_rejects_non_image_attachment() {
        let errors = form()
            .validate(&[image("plan.pdf", "application/pdf")])
            .err()
            .unwrap_or_default();
        assert!(errors.has("images"));
    }

    #[test]
    fn test_rejects_too_many_images() {
        let images: Vec<_> = (0..=MAX_REFERENCE_IMAGES)
            .map(|i| image(&format!("{i}.png"), "image/png"))
            .collect();
        let errors = form().validate(&images).err().unwrap_or_default();
        assert_eq!(errors.get("images"), Some("Please attach at most 5 images."));
    }

    #[test]
    fn test_set_ignores_unknown_fields() {
        let mut form = BespokeForm::default();
        form.set("budget", "$2,000".to_string());
        form.set("csrf", "x".to_string());
        assert_eq!(form.budget, "$2,000");
    }
}
