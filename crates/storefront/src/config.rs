//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `BACKEND_API_URL` - Base URL of the REST backend (e.g. `https://api.knotwork.rugs/api`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_CACHE_TTL_SECS` - Catalog cache lifetime (default: 60)
//! - `SHIPPING_FLAT_RATE` - Flat shipping charge in dollars (default: 0)
//! - `FREE_SHIPPING_THRESHOLD` - Subtotal at which shipping becomes free
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use knotwork_core::Price;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// REST backend base URL, without a trailing slash
    pub backend_url: Url,
    /// How long catalog reads stay cached
    pub cache_ttl: Duration,
    /// Shipping rules applied at checkout
    pub shipping: ShippingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. `production`, `staging`)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
    /// Emit JSON logs instead of human-readable text
    pub json_logs: bool,
}

/// Flat-rate shipping with an optional free-shipping threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShippingConfig {
    pub flat_rate: Price,
    pub free_threshold: Option<Price>,
}

impl ShippingConfig {
    /// Shipping charged for a cart subtotal.
    #[must_use]
    pub fn charge_for(&self, subtotal: Price) -> Price {
        if subtotal.is_zero() {
            return Price::ZERO;
        }
        match self.free_threshold {
            Some(threshold) if subtotal >= threshold => Price::ZERO,
            _ => self.flat_rate,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let backend_url = parse_backend_url(&get_required_env("BACKEND_API_URL")?)?;
        let cache_ttl = Duration::from_secs(parse_env("STOREFRONT_CACHE_TTL_SECS", "60")?);

        let shipping = ShippingConfig {
            flat_rate: parse_price(
                "SHIPPING_FLAT_RATE",
                &get_env_or_default("SHIPPING_FLAT_RATE", "0"),
            )?,
            free_threshold: get_optional_env("FREE_SHIPPING_THRESHOLD")
                .map(|v| parse_price("FREE_SHIPPING_THRESHOLD", &v))
                .transpose()?,
        };

        Ok(Self {
            host,
            port,
            base_url,
            backend_url,
            cache_ttl,
            shipping,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
            json_logs: get_env_or_default("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// True when cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_price(key: &str, value: &str) -> Result<Price, ConfigError> {
    Price::parse_input(value).ok_or_else(|| {
        ConfigError::InvalidEnvVar(key.to_string(), format!("'{value}' is not a price"))
    })
}

/// Parse the backend URL and strip any trailing slash so paths join cleanly.
pub(crate) fn parse_backend_url(value: &str) -> Result<Url, ConfigError> {
    let trimmed = value.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| ConfigError::InvalidEnvVar("BACKEND_API_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "BACKEND_API_URL".to_string(),
            "must be an http(s) URL".to_string(),
        ));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            backend_url: parse_backend_url("http://localhost:5000/api/").unwrap(),
            cache_ttl: Duration::from_secs(60),
            shipping: ShippingConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
            json_logs: false,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_backend_url_trailing_slash_removed() {
        assert_eq!(config().backend_url.as_str(), "http://localhost:5000/api");
    }

    #[test]
    fn test_backend_url_rejects_other_schemes() {
        assert!(parse_backend_url("ftp://files.example").is_err());
        assert!(parse_backend_url("not a url").is_err());
    }

    #[test]
    fn test_is_secure() {
        let mut config = config();
        assert!(!config.is_secure());
        config.base_url = "https://knotwork.rugs".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_shipping_charge() {
        let shipping = ShippingConfig {
            flat_rate: Price::from_cents(2_500),
            free_threshold: Some(Price::from_cents(50_000)),
        };
        assert_eq!(shipping.charge_for(Price::ZERO), Price::ZERO);
        assert_eq!(shipping.charge_for(Price::from_cents(10_000)), Price::from_cents(2_500));
        assert_eq!(shipping.charge_for(Price::from_cents(50_000)), Price::ZERO);

        let no_threshold = ShippingConfig {
            flat_rate: Price::from_cents(1_000),
            free_threshold: None,
        };
        assert_eq!(no_threshold.charge_for(Price::from_cents(900_000)), Price::from_cents(1_000));
    }
}
