//! Register configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CAJA_BASE_URL` - Base URL of the POS backend (default: <http://127.0.0.1:5000>)
//! - `CAJA_REQUEST_TIMEOUT_SECS` - Per-request timeout in seconds (default: none)
//! - `CAJA_CURRENCY` - ISO 4217 currency for totals (default: GTQ)

use std::time::Duration;

use caja_core::CurrencyCode;
use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Register configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterConfig {
    /// Base URL the `/api/...` endpoints are resolved against
    pub base_url: Url,
    /// Per-request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    /// Currency used to display prices and totals
    pub currency: CurrencyCode,
}

impl RegisterConfig {
    /// Build a configuration with no timeout and the default currency.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: None,
            currency: CurrencyCode::default(),
        }
    }

    /// Build a configuration pointing at the given backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse or is
    /// not an `http`/`https` URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(parse_base_url("base URL", base_url)?))
    }

    /// Replace the backend base URL (command-line override).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not a valid
    /// `http`/`https` URL; the current value is kept.
    pub fn set_base_url(&mut self, base_url: &str) -> Result<(), ConfigError> {
        self.base_url = parse_base_url("--base-url", base_url)?;
        Ok(())
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = parse_base_url(
            "CAJA_BASE_URL",
            &get_env_or_default("CAJA_BASE_URL", DEFAULT_BASE_URL),
        )?;
        let request_timeout = get_optional_env("CAJA_REQUEST_TIMEOUT_SECS")
            .map(|raw| parse_timeout_secs("CAJA_REQUEST_TIMEOUT_SECS", &raw))
            .transpose()?;
        let currency = get_optional_env("CAJA_CURRENCY")
            .map(|raw| {
                raw.parse::<CurrencyCode>().map_err(|e| {
                    ConfigError::InvalidEnvVar("CAJA_CURRENCY".to_string(), e.to_string())
                })
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            base_url,
            request_timeout,
            currency,
        })
    }
}

/// Parse and validate a backend base URL.
fn parse_base_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            name.to_string(),
            format!("expected an http(s) URL, got {raw}"),
        ));
    }
    Ok(url)
}

/// Parse a positive number of seconds.
fn parse_timeout_secs(name: &str, raw: &str) -> Result<Duration, ConfigError> {
    let secs = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            name.to_string(),
            "timeout must be at least 1 second".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

fn get_env_or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url_points_at_local_backend() {
        let config = RegisterConfig::with_base_url(DEFAULT_BASE_URL).expect("valid URL");
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:5000/");
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.currency, CurrencyCode::GTQ);
    }

    #[test]
    fn test_with_base_url_accepts_path_prefix() {
        let config = RegisterConfig::with_base_url("https://pos.example.com/tienda/")
            .expect("valid URL");
        assert_eq!(config.base_url.path(), "/tienda/");
    }

    #[test]
    fn test_base_url_rejects_non_http_schemes() {
        assert!(matches!(
            RegisterConfig::with_base_url("ftp://example.com"),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            RegisterConfig::with_base_url("mailto:caja@example.com"),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(RegisterConfig::with_base_url("not a url").is_err());
    }

    #[test]
    fn test_set_base_url_keeps_previous_value_on_error() {
        let mut config = RegisterConfig::with_base_url(DEFAULT_BASE_URL).expect("valid URL");
        assert!(config.set_base_url("ftp://elsewhere").is_err());
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:5000/");

        config.set_base_url("http://10.0.0.5:8080").expect("valid URL");
        assert_eq!(config.base_url.port(), Some(8080));
    }

    #[test]
    fn test_timeout_must_be_positive() {
        assert_eq!(
            parse_timeout_secs("T", "15").expect("valid"),
            Duration::from_secs(15)
        );
        assert!(parse_timeout_secs("T", "0").is_err());
        assert!(parse_timeout_secs("T", "-3").is_err());
        assert!(parse_timeout_secs("T", "soon").is_err());
    }
}
