//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHELFMARK_API_URL` - Base URL of the API gateway (e.g., `http://192.168.0.10:8765`)
//!
//! ## Optional
//! - `SHELFMARK_REVIEWS_URL` - Base URL of the review service (default: `SHELFMARK_API_URL`)
//! - `SHELFMARK_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 15)
//! - `SHELFMARK_CATALOG_CACHE_TTL_SECS` - Book detail / genre cache TTL (default: 300)
//! - `SHELFMARK_DEFAULT_CURRENCY` - Currency for users without a preference (default: BRL)
//! - `SHELFMARK_DATA_DIR` - Local storage directory (default: platform data dir)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use shelfmark_core::CurrencyCode;
use thiserror::Error;
use url::Url;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Could not determine a data directory; set SHELFMARK_DATA_DIR")]
    NoDataDir,
}

/// Shelfmark client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for auth, cart, inventory and catalog endpoints
    pub api_url: Url,
    /// Base URL for the review service
    pub reviews_url: Url,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
    /// TTL for cached book details and genre tags
    pub catalog_cache_ttl: Duration,
    /// Currency used when the signed-in user has no preference
    pub default_currency: CurrencyCode,
    /// Directory holding the local key/value storage
    pub data_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_base_url("SHELFMARK_API_URL", &get_required_env("SHELFMARK_API_URL")?)?;
        let reviews_url = match get_optional_env("SHELFMARK_REVIEWS_URL") {
            Some(raw) => parse_base_url("SHELFMARK_REVIEWS_URL", &raw)?,
            None => api_url.clone(),
        };

        let request_timeout = get_duration_secs(
            "SHELFMARK_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        if request_timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "SHELFMARK_REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let catalog_cache_ttl = get_duration_secs(
            "SHELFMARK_CATALOG_CACHE_TTL_SECS",
            DEFAULT_CATALOG_CACHE_TTL_SECS,
        )?;

        let default_currency =
            CurrencyCode::parse(&get_env_or_default("SHELFMARK_DEFAULT_CURRENCY", CurrencyCode::BRL))
                .map_err(|e| {
                    ConfigError::InvalidEnvVar("SHELFMARK_DEFAULT_CURRENCY".to_string(), e.to_string())
                })?;

        let data_dir = match get_optional_env("SHELFMARK_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        Ok(Self {
            api_url,
            reviews_url,
            request_timeout,
            catalog_cache_ttl,
            default_currency,
            data_dir,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Build a configuration for a given API URL with every optional value at
    /// its default. Useful for tools and tests that do not read the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an absolute
    /// http(s) URL.
    pub fn for_api_url(api_url: &str, data_dir: PathBuf) -> Result<Self, ConfigError> {
        let api_url = parse_base_url("SHELFMARK_API_URL", api_url)?;
        Ok(Self {
            reviews_url: api_url.clone(),
            api_url,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS),
            default_currency: CurrencyCode::fallback(),
            data_dir,
            sentry_dsn: None,
            sentry_environment: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get a whole number of seconds as a `Duration`.
fn get_duration_secs(key: &str, default: u64) -> Result<Duration, ConfigError> {
    match get_optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(Duration::from_secs(default)),
    }
}

/// Parse a base URL, requiring an http(s) scheme and normalizing the path to
/// end in `/` so relative joins keep any path prefix.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Platform data directory (e.g., `~/.local/share/shelfmark` on Linux).
fn default_data_dir() -> Result<PathBuf, ConfigError> {
    directories::ProjectDirs::from("com", "shelfmark", "shelfmark")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(ConfigError::NoDataDir)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("TEST", "http://localhost:8765/gateway").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8765/gateway/");
        assert_eq!(
            url.join("ws/cart").unwrap().as_str(),
            "http://localhost:8765/gateway/ws/cart"
        );
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        let err = parse_base_url("TEST", "ftp://example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_parse_base_url_rejects_relative() {
        assert!(parse_base_url("TEST", "/ws/cart").is_err());
    }

    #[test]
    fn test_for_api_url_defaults() {
        let config =
            ClientConfig::for_api_url("http://127.0.0.1:8765", PathBuf::from("/tmp/shelfmark"))
                .unwrap();
        assert_eq!(config.api_url, config.reviews_url);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.catalog_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.default_currency.as_str(), "BRL");
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_missing_env_var_message() {
        let err = ConfigError::MissingEnvVar("SHELFMARK_API_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: SHELFMARK_API_URL"
        );
    }
}
