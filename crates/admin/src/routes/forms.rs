//! Shared plumbing for back-office forms: multipart decoding, select
//! options, flash notices and backend-failure alerts.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tower_sessions::Session;

use crate::backend::{BackendError, FileUpload};
use crate::error::{AppError, clear_sentry_user};
use crate::filters;
use crate::middleware::clear_current_admin;
use crate::models::CurrentAdmin;

use super::dashboard::AdminUserView;

/// Session key for the one-shot notice shown after a redirect.
const FLASH_KEY: &str = "flash";

/// A decoded `multipart/form-data` body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<(String, FileUpload)>,
}

impl MultipartForm {
    /// Read every part. File inputs left empty by the browser are skipped.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the body is malformed or too large.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if let Some(file_name) = field.file_name().map(String::from) {
                let content_type = field.content_type().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    form.files.push((
                        name,
                        FileUpload {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        },
                    ));
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.fields.push((name, value));
            }
        }

        Ok(form)
    }

    /// First value of a text field, or `""`.
    #[must_use]
    pub fn text(&self, name: &str) -> String {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .unwrap_or_default()
    }

    /// Every value of a repeated text field.
    #[must_use]
    pub fn texts(&self, name: &str) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .collect()
    }

    /// True if a checkbox was ticked.
    #[must_use]
    pub fn checked(&self, name: &str) -> bool {
        self.fields.iter().any(|(key, _)| key == name)
    }

    /// Files uploaded under a field name.
    #[must_use]
    pub fn files(&self, name: &str) -> Vec<FileUpload> {
        self.files
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, file)| file.clone())
            .collect()
    }

    /// Take the first file uploaded under a field name.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<FileUpload> {
        self.files(name).into_iter().next()
    }
}

/// An `<option>` with its selection precomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl OptionView {
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>, current: &str) -> Self {
        let value = value.into();
        Self {
            selected: value == current,
            label: label.into(),
            value,
        }
    }
}

/// Alert text for a failed backend call.
///
/// A 401 means the admin's token is no longer valid: the session is cleared
/// so the next page load lands on the login screen. The call is not retried.
pub async fn failure_alert(session: &Session, err: &BackendError) -> String {
    if err.is_unauthorized() {
        if let Err(e) = clear_current_admin(session).await {
            tracing::warn!(error = %e, "Failed to clear expired admin session");
        }
        clear_sentry_user();
        tracing::info!("Admin token rejected by backend, session cleared");
    } else {
        tracing::warn!(error = %err, "Backend rejected admin change");
    }
    err.user_message()
}

/// Status for a form re-rendered after a backend failure.
#[must_use]
pub fn failure_status(err: &BackendError) -> StatusCode {
    match err.status() {
        Some(401) => StatusCode::UNAUTHORIZED,
        Some(status) if (400..500).contains(&status) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// Page shown when a one-click action (delete, status change) fails.
#[derive(Template, WebTemplate)]
#[template(path = "notice.html")]
pub struct NoticeTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub message: String,
    pub back_url: String,
    pub signed_out: bool,
}

/// Respond to a failed one-click action with the backend's message.
pub async fn action_failed(
    admin: &CurrentAdmin,
    session: &Session,
    err: &BackendError,
    back_url: &str,
) -> Response {
    let message = failure_alert(session, err).await;
    let page = NoticeTemplate {
        admin_user: AdminUserView::from(admin),
        current_path: back_url.to_string(),
        message,
        back_url: back_url.to_string(),
        signed_out: err.is_unauthorized(),
    };
    (failure_status(err), page).into_response()
}

/// Queue a notice for the next page.
pub async fn set_flash(session: &Session, message: &str) {
    if let Err(e) = session.insert(FLASH_KEY, message).await {
        tracing::warn!(error = %e, "Failed to store flash notice");
    }
}

/// Take the pending notice, if any.
pub async fn take_flash(session: &Session) -> Option<String> {
    session.remove::<String>(FLASH_KEY).await.ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_status() {
        let status = |status| {
            failure_status(&BackendError::Status {
                status,
                message: String::new(),
            })
        };
        assert_eq!(status(401), StatusCode::UNAUTHORIZED);
        assert_eq!(status(409), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status(503), StatusCode::BAD_GATEWAY);
        assert_eq!(
            failure_status(&BackendError::Network("down".to_string())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_form_accessors() {
        let form = MultipartForm {
            fields: vec![
                ("title".to_string(), "Loom notes".to_string()),
                ("tag".to_string(), "wool".to_string()),
                ("tag".to_string(), "dye".to_string()),
                ("published".to_string(), "on".to_string()),
            ],
            files: Vec::new(),
        };
        assert_eq!(form.text("title"), "Loom notes");
        assert_eq!(form.text("missing"), "");
        assert_eq!(form.texts("tag"), vec!["wool", "dye"]);
        assert!(form.checked("published"));
        assert!(form.file("image").is_none());
    }

    #[test]
    fn test_option_selected() {
        assert!(OptionView::new("draft", "Draft", "draft").selected);
        assert!(!OptionView::new("active", "Active", "draft").selected);
    }
}
