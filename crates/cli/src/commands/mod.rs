//! Command implementations and the plumbing they share.

pub mod health;
pub mod orders;
pub mod products;

use knotwork_admin::backend::{AdminClient, BackendError};
use knotwork_admin::config::{ConfigError, parse_backend_url};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("No credentials: set ADMIN_API_TOKEN, or pass --email with ADMIN_PASSWORD")]
    MissingCredentials,

    #[error("{0} does not have back-office access")]
    NotStaff(String),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("{0}")]
    InvalidFile(String),

    #[error("{0} row(s) failed to import")]
    ImportIncomplete(u32),

    #[error("Backend is not reachable")]
    Unreachable,
}

/// Build the backend client from `--backend-url` / `BACKEND_API_URL`.
///
/// # Errors
///
/// Returns an error if the URL is missing or invalid.
pub fn connect(backend_url: Option<&str>) -> Result<AdminClient, CliError> {
    let raw = backend_url.ok_or(CliError::MissingEnvVar("BACKEND_API_URL"))?;
    let url = parse_backend_url(raw)?;
    Ok(AdminClient::new(&url)?)
}

/// How the CLI proves it is staff.
pub struct Credentials {
    token: Option<SecretString>,
    email: Option<String>,
    password: Option<SecretString>,
}

impl Credentials {
    #[must_use]
    pub fn new(token: Option<String>, email: Option<String>, password: Option<String>) -> Self {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            token: non_blank(token).map(SecretString::from),
            email: non_blank(email),
            password: non_blank(password).map(SecretString::from),
        }
    }

    /// The token to send, signing in first when only a password is known.
    ///
    /// # Errors
    ///
    /// Returns an error if no credentials were given, the login fails, or the
    /// account is not staff.
    pub async fn bearer_token(self, client: &AdminClient) -> Result<SecretString, CliError> {
        if let Some(token) = self.token {
            return Ok(token);
        }
        let (Some(email), Some(password)) = (self.email, self.password) else {
            return Err(CliError::MissingCredentials);
        };

        let auth = client.login(&email, password.expose_secret()).await?;
        if auth.user.role.as_deref().is_some_and(|role| role != "admin") {
            return Err(CliError::NotStaff(email));
        }
        tracing::debug!(admin = %auth.user.email, "Signed in");
        Ok(SecretString::from(auth.token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_credentials() {
        let client = connect(Some("http://127.0.0.1:9")).unwrap_or_else(|e| panic!("{e}"));
        let credentials = Credentials::new(
            None,
            Some("staff@knotwork.rugs".to_string()),
            Some("  ".to_string()),
        );
        let result = credentials.bearer_token(&client).await;
        assert!(matches!(result, Err(CliError::MissingCredentials)));
    }

    #[tokio::test]
    async fn test_token_wins_without_network() {
        let client = connect(Some("http://127.0.0.1:9")).unwrap_or_else(|e| panic!("{e}"));
        let credentials = Credentials::new(Some("abc".to_string()), None, None);
        let token = credentials.bearer_token(&client).await.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(token.expose_secret(), "abc");
    }

    #[test]
    fn test_connect_requires_url() {
        assert!(matches!(connect(None), Err(CliError::MissingEnvVar("BACKEND_API_URL"))));
        assert!(matches!(connect(Some("ftp://x")), Err(CliError::Config(_))));
    }
}
