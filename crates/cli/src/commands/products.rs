//! Spreadsheet product import.

use std::path::Path;

use knotwork_admin::backend::{AdminClient, BulkUploadResult, FileUpload};
use knotwork_core::validation::{FieldErrors, XLSX_CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};

use super::CliError;

/// Read a workbook from disk and check it the way the upload form does.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not an acceptable
/// spreadsheet.
pub async fn load_workbook(path: &Path) -> Result<FileUpload, CliError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let content_type = file_name
        .to_lowercase()
        .ends_with(".xlsx")
        .then(|| XLSX_CONTENT_TYPE.to_string());
    let file = FileUpload {
        file_name,
        content_type,
        bytes,
    };

    let mut errors = FieldErrors::new();
    let meta = file.meta();
    errors.spreadsheet("file", Some(&meta));
    if let Some(message) = errors.get("file") {
        return Err(CliError::InvalidFile(message.to_string()));
    }
    Ok(file)
}

/// Import products and log the backend's summary.
///
/// # Errors
///
/// Returns an error if the file is rejected, the upload fails, or any row
/// failed to import.
pub async fn import(
    client: &AdminClient,
    token: &SecretString,
    path: &Path,
) -> Result<(), CliError> {
    let file = load_workbook(path).await?;
    tracing::info!(file = %file.file_name, bytes = file.bytes.len(), "Uploading spreadsheet");

    let result = client.bulk_upload_products(token.expose_secret(), file).await?;
    report(&result);

    if result.failed > 0 {
        return Err(CliError::ImportIncomplete(result.failed));
    }
    Ok(())
}

fn report(result: &BulkUploadResult) {
    tracing::info!(
        created = result.created,
        updated = result.updated,
        failed = result.failed,
        "Import finished"
    );
    for error in &result.errors {
        tracing::warn!("{}", error.describe());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_non_xlsx() {
        let dir = std::env::temp_dir().join(format!("kw-cli-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("catalog.csv");
        tokio::fs::write(&path, b"name,price\n").await.unwrap();

        let result = load_workbook(&path).await;
        assert!(matches!(
            result,
            Err(CliError::InvalidFile(ref m)) if m == "Only .xlsx spreadsheets are supported."
        ));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = load_workbook(Path::new("/nonexistent/catalog.xlsx")).await;
        assert!(matches!(result, Err(CliError::Io { .. })));
    }
}
