//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LOYALTY_API_URL` - Base URL of the loyalty backend (e.g., `http://localhost:8000`)
//!
//! ## Optional
//! - `LOYALTY_SESSION_PATH` - Where the staff session is persisted
//!   (default: `$HOME/.honor-loyalty/session.json`)
//! - `LOYALTY_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `LOYALTY_SEARCH_DEBOUNCE_MS` - Quiet period before a search is sent (default: 300)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
const SESSION_DIR: &str = ".honor-loyalty";
const SESSION_FILE: &str = "session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Loyalty client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash
    pub api_url: String,
    /// File holding the persisted token and staff identity
    pub session_path: PathBuf,
    /// Per-request timeout
    pub timeout: Duration,
    /// Quiet period applied to search-driven customer queries
    pub search_debounce: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `LOYALTY_API_URL` is missing or any value fails
    /// to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build a configuration for a known backend URL with every other value
    /// defaulted. Used by tests and embedding applications.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse.
    pub fn for_api_url(api_url: &str, session_path: PathBuf) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: normalize_api_url(api_url)?,
            session_path,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
        })
    }

    fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = get("LOYALTY_API_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("LOYALTY_API_URL".to_string()))?;
        let api_url = normalize_api_url(&api_url)?;

        let session_path = match get("LOYALTY_SESSION_PATH") {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_session_path(get("HOME")),
        };

        let timeout = Duration::from_secs(parse_u64(
            "LOYALTY_HTTP_TIMEOUT_SECS",
            get("LOYALTY_HTTP_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?);
        let search_debounce = Duration::from_millis(parse_u64(
            "LOYALTY_SEARCH_DEBOUNCE_MS",
            get("LOYALTY_SEARCH_DEBOUNCE_MS"),
            DEFAULT_SEARCH_DEBOUNCE_MS,
        )?);

        Ok(Self {
            api_url,
            session_path,
            timeout,
            search_debounce,
        })
    }
}

fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar("LOYALTY_API_URL".to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "LOYALTY_API_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn default_session_path(home: Option<String>) -> PathBuf {
    home.map_or_else(|| PathBuf::from(SESSION_DIR), |h| PathBuf::from(h).join(SESSION_DIR))
        .join(SESSION_FILE)
}

fn parse_u64(key: &str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    value.map_or(Ok(default), |v| {
        v.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
