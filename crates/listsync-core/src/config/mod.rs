//! Runtime configuration for listsync clients.
//!
//! Values come from environment variables (the CLI loads `.env` first). Text
//! values are trimmed and empty values count as unset.

use std::time::Duration;

use crate::db::ReplicaConfig;
use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

pub const ENV_BACKEND_URL: &str = "LISTSYNC_BACKEND_URL";
pub const ENV_BACKEND_KEY: &str = "LISTSYNC_BACKEND_KEY";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "LISTSYNC_HTTP_TIMEOUT_SECS";
pub const ENV_STARTUP_DELAY_MS: &str = "LISTSYNC_STARTUP_DELAY_MS";
pub const ENV_TURSO_URL: &str = "TURSO_DATABASE_URL";
pub const ENV_TURSO_TOKEN: &str = "TURSO_AUTH_TOKEN";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STARTUP_DELAY_MS: u64 = 1500;

/// Backend connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Managed backend base URL (REST backend)
    pub backend_url: Option<String>,
    /// Managed backend API key (REST backend)
    pub backend_key: Option<String>,
    /// Per-request timeout for the REST backend
    pub http_timeout: Duration,
    /// Delay before the once-per-session startup sync
    pub startup_delay: Duration,
    /// Remote libSQL database URL for embedded replicas
    pub turso_url: Option<String>,
    /// Remote libSQL auth token for embedded replicas
    pub turso_token: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            backend_key: None,
            http_timeout: default_http_timeout(),
            startup_delay: default_startup_delay(),
            turso_url: None,
            turso_token: None,
        }
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "[REDACTED]");
        formatter
            .debug_struct("BackendConfig")
            .field("backend_url", &self.backend_url)
            .field("backend_key", &redact(&self.backend_key))
            .field("http_timeout", &self.http_timeout)
            .field("startup_delay", &self.startup_delay)
            .field("turso_url", &self.turso_url)
            .field("turso_token", &redact(&self.turso_token))
            .finish()
    }
}

impl BackendConfig {
    /// Resolve configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary key lookup.
    ///
    /// Public for testability: callers can exercise parsing without touching
    /// the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |key: &str| normalize_text_option(lookup(key));

        let http_timeout = match read(ENV_HTTP_TIMEOUT_SECS) {
            Some(raw) => Duration::from_secs(parse_number(ENV_HTTP_TIMEOUT_SECS, &raw)?),
            None => default_http_timeout(),
        };
        let startup_delay = match read(ENV_STARTUP_DELAY_MS) {
            Some(raw) => Duration::from_millis(parse_number(ENV_STARTUP_DELAY_MS, &raw)?),
            None => default_startup_delay(),
        };

        let config = Self {
            backend_url: read(ENV_BACKEND_URL),
            backend_key: read(ENV_BACKEND_KEY),
            http_timeout,
            startup_delay,
            turso_url: read(ENV_TURSO_URL),
            turso_token: read(ENV_TURSO_TOKEN),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.backend_url {
            if !is_http_url(url) {
                return Err(Error::Config(format!(
                    "{ENV_BACKEND_URL} must include http:// or https://"
                )));
            }
        }
        if self.http_timeout.is_zero() {
            return Err(Error::Config(format!(
                "{ENV_HTTP_TIMEOUT_SECS} must be greater than zero"
            )));
        }
        self.rest_credentials()?;
        self.replica()?;
        Ok(())
    }

    /// Backend URL and key, when the REST backend is configured.
    ///
    /// Setting only one of the two is an error.
    pub fn rest_credentials(&self) -> Result<Option<(String, String)>> {
        let url = normalize_text_option(self.backend_url.clone());
        let key = normalize_text_option(self.backend_key.clone());
        match (url, key) {
            (None, None) => Ok(None),
            (Some(url), Some(key)) => Ok(Some((url, key))),
            _ => Err(Error::Config(format!(
                "{ENV_BACKEND_URL} and {ENV_BACKEND_KEY} must be set together"
            ))),
        }
    }

    /// Embedded replica settings, when both Turso values are present.
    pub fn replica(&self) -> Result<Option<ReplicaConfig>> {
        let url = normalize_text_option(self.turso_url.clone());
        let token = normalize_text_option(self.turso_token.clone());
        match (url, token) {
            (None, None) => Ok(None),
            (Some(url), Some(token)) => Ok(Some(ReplicaConfig::new(url, token))),
            _ => Err(Error::Config(format!(
                "{ENV_TURSO_URL} and {ENV_TURSO_TOKEN} must be set together"
            ))),
        }
    }

    pub fn is_rest_configured(&self) -> bool {
        matches!(self.rest_credentials(), Ok(Some(_)))
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
}

const fn default_http_timeout() -> Duration {
    Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)
}

const fn default_startup_delay() -> Duration {
    Duration::from_millis(DEFAULT_STARTUP_DELAY_MS)
}
