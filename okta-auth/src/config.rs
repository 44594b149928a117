//! Identity provider configuration.
//!
//! Provides the provider address, SAML application path, request timeout and
//! push polling settings. Configuration is loaded from environment variables
//! with defaults matching the provider's recommended polling cadence.

use crate::error::{AuthError, AuthResult};
use crate::poll::PollConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Okta client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OktaConfig {
    /// Base URL of the Okta organization (e.g., "https://acme.okta.com").
    pub base_url: String,

    /// Path of the SAML application's SSO endpoint, relative to `base_url`.
    pub saml_path: Option<String>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Delay between push approval polls in seconds.
    pub poll_interval_secs: u64,

    /// Consecutive network failures tolerated while polling.
    pub poll_max_failures: u32,

    /// Overall limit on push polling in seconds, unbounded when unset.
    pub poll_timeout_secs: Option<u64>,
}

impl Default for OktaConfig {
    fn default() -> Self {
        let poll = PollConfig::default();
        Self {
            base_url: String::new(),
            saml_path: None,
            request_timeout_secs: 30,
            poll_interval_secs: poll.interval.as_secs(),
            poll_max_failures: poll.max_consecutive_failures,
            poll_timeout_secs: None,
        }
    }
}

impl OktaConfig {
    /// Create a configuration for the given organization.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the SAML application path.
    pub fn with_saml_path(mut self, saml_path: impl Into<String>) -> Self {
        self.saml_path = Some(saml_path.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `OKTA_BASE_URL`: Okta organization URL
    /// - `OKTA_SAML_PATH`: SAML application SSO path
    /// - `OKTA_REQUEST_TIMEOUT_SECS`: Request timeout in seconds (default: 30)
    /// - `OKTA_POLL_INTERVAL_SECS`: Push poll interval in seconds (default: 5)
    /// - `OKTA_POLL_MAX_FAILURES`: Consecutive poll failures tolerated (default: 6)
    /// - `OKTA_POLL_TIMEOUT_SECS`: Overall push poll limit in seconds (default: none)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            base_url: std::env::var("OKTA_BASE_URL").unwrap_or(default.base_url),
            saml_path: std::env::var("OKTA_SAML_PATH").ok(),
            request_timeout_secs: std::env::var("OKTA_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.request_timeout_secs),
            poll_interval_secs: std::env::var("OKTA_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.poll_interval_secs),
            poll_max_failures: std::env::var("OKTA_POLL_MAX_FAILURES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.poll_max_failures),
            poll_timeout_secs: std::env::var("OKTA_POLL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build the push polling configuration.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_consecutive_failures: self.poll_max_failures,
            timeout: self.poll_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Parse the base URL, which must be an absolute http(s) URL.
    pub fn base_url(&self) -> AuthResult<Url> {
        parse_base_url(&self.base_url)
    }

    /// Validate that the configuration can be used.
    pub fn validate(&self) -> AuthResult<()> {
        self.base_url()?;
        if self.poll_max_failures == 0 {
            return Err(AuthError::Config(
                "OKTA_POLL_MAX_FAILURES must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse an identity provider base address.
pub fn parse_base_url(raw: &str) -> AuthResult<Url> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(AuthError::Config(format!(
            "unsupported scheme '{}' in base URL",
            scheme
        ))),
    }
}
