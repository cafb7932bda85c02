//! Form-level validation.
//!
//! These are the only checks this codebase performs: required fields, string
//! lengths, email shape, numeric ranges and file presence/type/size. The
//! backend remains the authority on everything else. A form with any
//! [`FieldErrors`] must be re-rendered and never sent to the backend.

use crate::types::Email;

/// Largest image accepted by upload forms (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Largest spreadsheet accepted by the bulk product upload (10 MiB).
pub const MAX_SPREADSHEET_BYTES: usize = 10 * 1024 * 1024;

/// Image types the backend accepts.
pub const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Spreadsheet type accepted by the bulk upload.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Metadata of an uploaded file, independent of the HTTP framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMeta {
    pub file_name: String,
    pub content_type: Option<String>,
    pub size: usize,
}

/// Validation failures keyed by form field name, in the order found.
///
/// Only the first failure per field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{} field(s) failed validation", .0.len())]
pub struct FieldErrors(Vec<(String, String)>);

impl FieldErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Record a failure unless the field already has one.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        if self.get(field).is_none() {
            self.0.push((field.to_string(), message.into()));
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for a field, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, message)| message.as_str())
    }

    /// True if the field failed.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// All messages, in the order found.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(_, message)| message.as_str())
    }

    /// `Ok(())` if nothing failed.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Value must be non-blank.
    pub fn require(&mut self, field: &str, label: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.add(field, format!("{label} is required."));
        }
        self
    }

    /// Character length (after trimming) must lie in `min..=max`.
    ///
    /// Blank values are left to [`FieldErrors::require`].
    pub fn length(
        &mut self,
        field: &str,
        label: &str,
        value: &str,
        min: usize,
        max: usize,
    ) -> &mut Self {
        let len = value.trim().chars().count();
        if len == 0 {
            return self;
        }
        if len < min {
            self.add(field, format!("{label} must be at least {min} characters."));
        } else if len > max {
            self.add(field, format!("{label} must be at most {max} characters."));
        }
        self
    }

    /// Value must be a deliverable-looking email address.
    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.add(field, "Email is required.");
        } else if Email::normalize(value).is_err() {
            self.add(field, "Please enter a valid email address.");
        }
        self
    }

    /// Optional numeric value must lie in `min..=max` when present.
    pub fn range(
        &mut self,
        field: &str,
        label: &str,
        value: Option<i64>,
        min: i64,
        max: i64,
    ) -> &mut Self {
        if let Some(v) = value
            && !(min..=max).contains(&v)
        {
            self.add(field, format!("{label} must be between {min} and {max}."));
        }
        self
    }

    /// A file must have been uploaded.
    pub fn require_file(
        &mut self,
        field: &str,
        label: &str,
        file: Option<&UploadMeta>,
    ) -> &mut Self {
        if file.is_none_or(|f| f.size == 0) {
            self.add(field, format!("{label} is required."));
        }
        self
    }

    /// Uploaded images must be an accepted type and size.
    pub fn images<'a>(
        &mut self,
        field: &str,
        files: impl IntoIterator<Item = &'a UploadMeta>,
    ) -> &mut Self {
        for file in files {
            let accepted = file
                .content_type
                .as_deref()
                .is_some_and(|ct| IMAGE_CONTENT_TYPES.contains(&ct));
            if !accepted {
                self.add(
                    field,
                    format!(
                        "{} is not a supported image (JPEG, PNG, WebP or GIF).",
                        file.file_name
                    ),
                );
            } else if file.size > MAX_IMAGE_BYTES {
                self.add(field, format!("{} is larger than 5 MB.", file.file_name));
            }
        }
        self
    }

    /// The bulk upload file must be an `.xlsx` spreadsheet within size.
    pub fn spreadsheet(&mut self, field: &str, file: Option<&UploadMeta>) -> &mut Self {
        let Some(file) = file.filter(|f| f.size > 0) else {
            self.add(field, "Please choose an Excel file to upload.");
            return self;
        };
        let is_xlsx = file.file_name.to_lowercase().ends_with(".xlsx")
            || file.content_type.as_deref() == Some(XLSX_CONTENT_TYPE);
        if !is_xlsx {
            self.add(field, "Only .xlsx spreadsheets are supported.");
        } else if file.size > MAX_SPREADSHEET_BYTES {
            self.add(field, "Spreadsheet is larger than 10 MB.");
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, content_type: &str, size: usize) -> UploadMeta {
        UploadMeta {
            file_name: name.to_string(),
            content_type: Some(content_type.to_string()),
            size,
        }
    }

    #[test]
    fn test_require_blank_title() {
        let mut errors = FieldErrors::new();
        errors.require("title", "Title", "   ");
        assert_eq!(errors.get("title"), Some("Title is required."));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_first_error_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors
            .require("name", "Name", "")
            .length("name", "Name", "", 3, 10)
            .add("name", "second");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("name"), Some("Name is required."));
    }

    #[test]
    fn test_length_bounds() {
        let mut errors = FieldErrors::new();
        errors.length("slug", "Slug", "ab", 3, 10);
        errors.length("title", "Title", &"x".repeat(11), 3, 10);
        errors.length("ok", "Ok", "hand-knotted", 3, 20);
        assert_eq!(errors.get("slug"), Some("Slug must be at least 3 characters."));
        assert_eq!(errors.get("title"), Some("Title must be at most 10 characters."));
        assert!(!errors.has("ok"));
    }

    #[test]
    fn test_email_checks() {
        let mut errors = FieldErrors::new();
        errors.email("a", "").email("b", "nope").email("c", "buyer@rugs.example");
        assert_eq!(errors.get("a"), Some("Email is required."));
        assert_eq!(errors.get("b"), Some("Please enter a valid email address."));
        assert!(!errors.has("c"));
    }

    #[test]
    fn test_range() {
        let mut errors = FieldErrors::new();
        errors.range("rating", "Rating", Some(6), 1, 5);
        errors.range("stock", "Stock", None, 0, 10);
        assert!(errors.has("rating"));
        assert!(!errors.has("stock"));
    }

    #[test]
    fn test_files() {
        let mut errors = FieldErrors::new();
        errors.require_file("cover", "Cover image", None);
        errors.images("gallery", [&upload("scan.pdf", "application/pdf", 10)]);
        errors.images("ok", [&upload("rug.jpg", "image/jpeg", 1024)]);
        errors.images("big", [&upload("rug.png", "image/png", MAX_IMAGE_BYTES + 1)]);
        assert_eq!(errors.get("cover"), Some("Cover image is required."));
        assert!(errors.has("gallery"));
        assert!(!errors.has("ok"));
        assert_eq!(errors.get("big"), Some("rug.png is larger than 5 MB."));
    }

    #[test]
    fn test_spreadsheet() {
        let mut errors = FieldErrors::new();
        errors.spreadsheet("missing", None);
        errors.spreadsheet("csv", Some(&upload("rugs.csv", "text/csv", 100)));
        errors.spreadsheet("xlsx", Some(&upload("Rugs.XLSX", "application/octet-stream", 100)));
        assert!(errors.has("missing"));
        assert_eq!(errors.get("csv"), Some("Only .xlsx spreadsheets are supported."));
        assert!(!errors.has("xlsx"));
    }
}
