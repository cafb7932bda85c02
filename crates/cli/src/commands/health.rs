//! Backend reachability check.

use knotwork_admin::backend::AdminClient;

use super::CliError;

/// Ping the backend.
///
/// # Errors
///
/// Returns [`CliError::Unreachable`] when the backend does not answer.
pub async fn check(client: &AdminClient) -> Result<(), CliError> {
    if client.ping().await {
        tracing::info!(backend = client.base_url(), "Backend is reachable");
        Ok(())
    } else {
        Err(CliError::Unreachable)
    }
}
