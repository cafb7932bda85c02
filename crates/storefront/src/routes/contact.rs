//! Contact form route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use knotwork_core::validation::FieldErrors;
use serde::Deserialize;
use tracing::instrument;

use crate::backend::ContactInput;
use crate::filters;
use crate::state::AppState;

/// Contact form data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    fn validate(&self) -> Result<ContactInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        errors
            .require("name", "Name", &self.name)
            .length("name", "Name", &self.name, 2, 100)
            .email("email", &self.email)
            .require("subject", "Subject", &self.subject)
            .length("subject", "Subject", &self.subject, 3, 150)
            .require("message", "Message", &self.message)
            .length("message", "Message", &self.message, 10, 5000);
        errors.into_result()?;

        Ok(ContactInput {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub form: ContactForm,
    pub errors: FieldErrors,
    pub alert: Option<String>,
    pub sent: bool,
}

/// Display the contact form.
pub async fn show() -> impl IntoResponse {
    ContactTemplate {
        form: ContactForm::default(),
        errors: FieldErrors::new(),
        alert: None,
        sent: false,
    }
}

/// Send a contact message.
#[instrument(skip(state, form))]
pub async fn submit(State(state): State<AppState>, Form(form): Form<ContactForm>) -> Response {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let page = ContactTemplate {
                form,
                errors,
                alert: None,
                sent: false,
            };
            return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
        }
    };

    match state.backend().submit_contact(&input).await {
        Ok(()) => {
            tracing::info!("Contact message sent");
            ContactTemplate {
                form: ContactForm::default(),
                errors: FieldErrors::new(),
                alert: None,
                sent: true,
            }
            .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Contact message rejected");
            let page = ContactTemplate {
                form,
                errors: FieldErrors::new(),
                alert: Some(e.user_message()),
                sent: false,
            };
            (StatusCode::BAD_GATEWAY, page).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_validation() {
        let form = ContactForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            subject: "Hi".to_string(),
            message: String::new(),
        };
        let errors = form.validate().err().unwrap_or_default();
        assert_eq!(errors.get("subject"), Some("Subject must be at least 3 characters."));
        assert_eq!(errors.get("message"), Some("Message is required."));
        assert!(!errors.has("email"));
    }
}
