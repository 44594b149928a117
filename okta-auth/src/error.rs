//! Error types for Okta authentication
//!
//! This module defines every failure that can occur while authenticating
//! against the identity provider, verifying a second factor, or exchanging
//! a session for a SAML assertion. Each error is classified into a
//! [`StatusCode`], independent of the HTTP status that caused it.

use crate::poll::PollError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Outcome classification shared by every authentication stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    /// Request succeeded and the response was understood
    Ok,
    /// Credentials or session rejected by the provider
    Unauthorized,
    /// Request could not be built locally (serialization, URL)
    MalformedRequestData,
    /// Transport error or unexpected HTTP status
    NetworkFailure,
    /// Response body unreadable or carrying an unrecognized status
    UnexpectedResponseShape,
}

impl StatusCode {
    /// Classify the result of any authentication stage.
    pub fn of<T>(result: &AuthResult<T>) -> Self {
        match result {
            Ok(_) => StatusCode::Ok,
            Err(err) => err.status_code(),
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Ok => "ok",
            StatusCode::Unauthorized => "unauthorized",
            StatusCode::MalformedRequestData => "malformed_request_data",
            StatusCode::NetworkFailure => "network_failure",
            StatusCode::UnexpectedResponseShape => "unexpected_response_shape",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A URL could not be parsed or resolved
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A request body could not be serialized
    #[error("Could not serialize request: {0}")]
    Serialization(String),

    /// The selected factor cannot be verified this way
    #[error("Factor mismatch: expected a {expected} factor, got {actual}")]
    FactorMismatch {
        /// Kind the operation requires
        expected: &'static str,
        /// Factor type tag that was supplied
        actual: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider rejected the credentials or session (HTTP 401/403)
    #[error("Unauthorized ({status})")]
    Unauthorized {
        /// HTTP status code
        status: u16,
    },

    /// Push approval was rejected or timed out on the user's device
    #[error("Push verification failed: {0}")]
    FactorRejected(String),

    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Provider answered with an unexpected HTTP status
    #[error("Network error ({status})")]
    HttpStatus {
        /// HTTP status code
        status: u16,
    },

    /// SAML endpoint answered with an unexpected HTTP status
    #[error("Could not get SAML payload ({status})")]
    SamlFetch {
        /// HTTP status code
        status: u16,
    },

    /// Push polling gave up after too many consecutive network errors
    #[error("Too many network errors while polling ({failures} consecutive), last: {last}")]
    PollExhausted {
        /// Number of consecutive failures observed
        failures: u32,
        /// Last error seen by the poll loop
        last: Box<AuthError>,
    },

    /// Push polling exceeded the configured wall-clock limit
    #[error("Gave up waiting for push approval after {0:?}")]
    PollTimedOut(Duration),

    /// Response body could not be read or decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider returned a status this flow does not handle
    #[error("Bad status from Okta API: {0}")]
    UnexpectedStatus(String),

    /// No `SAMLResponse` input in the SAML endpoint's HTML
    #[error("No SAML payload found in response from Okta")]
    NoSamlPayload,

    /// `SAMLResponse` value is not valid base64
    #[error("Invalid SAML payload encoding: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl From<PollError<AuthError>> for AuthError {
    fn from(err: PollError<AuthError>) -> Self {
        match err {
            PollError::Aborted(err) => err,
            PollError::Exhausted { failures, last } => AuthError::PollExhausted {
                failures,
                last: Box::new(last),
            },
            PollError::TimedOut(limit) => AuthError::PollTimedOut(limit),
        }
    }
}

impl AuthError {
    /// Classify this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidUrl(_)
            | AuthError::Serialization(_)
            | AuthError::FactorMismatch { .. }
            | AuthError::Config(_) => StatusCode::MalformedRequestData,

            AuthError::Unauthorized { .. } | AuthError::FactorRejected(_) => {
                StatusCode::Unauthorized
            }

            AuthError::Network(_)
            | AuthError::HttpStatus { .. }
            | AuthError::SamlFetch { .. }
            | AuthError::PollExhausted { .. }
            | AuthError::PollTimedOut(_) => StatusCode::NetworkFailure,

            AuthError::InvalidResponse(_)
            | AuthError::UnexpectedStatus(_)
            | AuthError::NoSamlPayload
            | AuthError::Base64(_) => StatusCode::UnexpectedResponseShape,
        }
    }

    /// Check if the push poll loop may try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Network(_) | AuthError::HttpStatus { .. })
    }

    /// Get error code for reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidUrl(_) => "INVALID_URL",
            AuthError::Serialization(_) => "SERIALIZATION_ERROR",
            AuthError::FactorMismatch { .. } => "FACTOR_MISMATCH",
            AuthError::Config(_) => "CONFIG_ERROR",
            AuthError::Unauthorized { .. } => "UNAUTHORIZED",
            AuthError::FactorRejected(_) => "FACTOR_REJECTED",
            AuthError::Network(_) => "NETWORK_ERROR",
            AuthError::HttpStatus { .. } => "HTTP_STATUS",
            AuthError::SamlFetch { .. } => "SAML_FETCH_FAILED",
            AuthError::PollExhausted { .. } => "POLL_EXHAUSTED",
            AuthError::PollTimedOut(_) => "POLL_TIMED_OUT",
            AuthError::InvalidResponse(_) => "INVALID_RESPONSE",
            AuthError::UnexpectedStatus(_) => "UNEXPECTED_STATUS",
            AuthError::NoSamlPayload => "NO_SAML_PAYLOAD",
            AuthError::Base64(_) => "INVALID_SAML_ENCODING",
        }
    }
}
