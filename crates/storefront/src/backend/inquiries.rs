//! Bespoke requests, contact messages and newsletter sign-ups.

use knotwork_core::models::BespokeRequest;
use knotwork_core::validation::UploadMeta;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tracing::instrument;

use super::{BackendClient, BackendError};

/// Most reference images accepted with a bespoke request.
pub const MAX_REFERENCE_IMAGES: usize = 5;

/// An image received from a form, ready to forward to the backend.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Metadata for validation.
    #[must_use]
    pub fn meta(&self) -> UploadMeta {
        UploadMeta {
            file_name: self.file_name.clone(),
            content_type: self.content_type.clone(),
            size: self.bytes.len(),
        }
    }

    fn into_part(self) -> Result<Part, BackendError> {
        let part = Part::bytes(self.bytes).file_name(self.file_name);
        match self.content_type {
            Some(content_type) => part.mime_str(&content_type).map_err(BackendError::from),
            None => Ok(part),
        }
    }
}

/// Fields of the bespoke rug form.
#[derive(Debug, Clone, Default)]
pub struct BespokeInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub dimensions: String,
    pub colors: String,
    pub budget: String,
    pub message: String,
}

/// Fields of the contact form.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl BackendClient {
    /// Submit a bespoke request with its reference images.
    ///
    /// # Errors
    ///
    /// Returns an error if an image cannot be attached or the backend
    /// rejects the request.
    #[instrument(skip(self, input, images), fields(images = images.len()))]
    pub async fn submit_bespoke(
        &self,
        input: &BespokeInput,
        images: Vec<ImageUpload>,
    ) -> Result<BespokeRequest, BackendError> {
        let mut form = Form::new()
            .text("name", input.name.clone())
            .text("email", input.email.clone())
            .text("dimensions", input.dimensions.clone())
            .text("message", input.message.clone());
        for (field, value) in [
            ("phone", &input.phone),
            ("colors", &input.colors),
            ("budget", &input.budget),
        ] {
            if !value.trim().is_empty() {
                form = form.text(field, value.clone());
            }
        }
        for image in images.into_iter().take(MAX_REFERENCE_IMAGES) {
            form = form.part("images", image.into_part()?);
        }

        let request = self.request(Method::POST, "/bespoke", None).multipart(form);
        self.send(request).await
    }

    /// Send a contact message.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the message.
    #[instrument(skip(self, input))]
    pub async fn submit_contact(&self, input: &ContactInput) -> Result<(), BackendError> {
        let request = self.request(Method::POST, "/contact", None).json(input);
        self.send_empty(request).await
    }

    /// Subscribe an email address to the newsletter.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the address.
    #[instrument(skip(self))]
    pub async fn subscribe_newsletter(&self, email: &str) -> Result<(), BackendError> {
        let request = self
            .request(Method::POST, "/newsletter/subscribe", None)
            .json(&serde_json::json!({ "email": email }));
        self.send_empty(request).await
    }
}
