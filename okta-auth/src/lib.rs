//! # Okta Authentication
//!
//! This crate authenticates a user against Okta and exchanges the resulting
//! session for a SAML assertion, which downstream tooling trades for
//! temporary cloud credentials.
//!
//! ## Overview
//!
//! Authentication runs in three stages, strictly in order:
//! - **Primary**: username and password are posted to `/api/v1/authn`
//! - **Second factor**: a one-time code is verified, or a push challenge is
//!   started and polled until the user answers it
//! - **SAML exchange**: the session token is redeemed at the SAML
//!   application endpoint and the `SAMLResponse` form field is decoded
//!
//! A failure at any stage aborts the attempt.
//!
//! ## Sessions
//!
//! [`AuthSession`] has one variant per transaction state. Session tokens only
//! exist on [`AuthenticatedSession`], which is the only input the SAML
//! exchange accepts.
//!
//! ## Errors
//!
//! Every failure is an [`AuthError`]. [`AuthError::status_code`] classifies it
//! as a [`StatusCode`] (`Unauthorized`, `MalformedRequestData`,
//! `NetworkFailure`, `UnexpectedResponseShape`) independent of the HTTP
//! status that caused it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use okta_auth::{AuthSession, Credentials, FactorKind, OktaClient};
//! use std::time::Duration;
//!
//! async fn run() -> okta_auth::AuthResult<Vec<u8>> {
//!     let client = OktaClient::new("https://acme.okta.com", Duration::from_secs(30))?;
//!     let credentials = Credentials::new("jane@acme.com", "correct horse");
//!
//!     let authenticated = match client.authenticate(&credentials).await? {
//!         AuthSession::MfaRequired(session) => {
//!             let push = session
//!                 .factors_of_kind(&FactorKind::Push)
//!                 .next()
//!                 .cloned()
//!                 .expect("push factor enrolled");
//!             client.verify_push(&session, &push).await?
//!         }
//!         other => other.into_authenticated()?,
//!     };
//!
//!     let assertion = client
//!         .exchange_assertion("/app/amazon_aws/exk1/sso/saml", &authenticated)
//!         .await?;
//!     Ok(assertion.into_bytes())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod flow;
pub mod models;
pub mod poll;
pub mod saml;
pub mod session;
mod transport;

// Re-export main types
pub use client::{OktaClient, AUTHN_PATH};
pub use config::OktaConfig;
pub use error::{AuthError, AuthResult, StatusCode};
pub use flow::{supported_factors, Authenticator, FactorPrompt};
pub use models::Credentials;
pub use poll::{PollConfig, PollError, PollStatus};
pub use saml::{extract_saml_payload, saml_url, SamlAssertion};
pub use session::{
    AuthSession, AuthenticatedSession, ChallengeSession, Factor, FactorKind, FactorResult,
    IncompleteSession, MfaRequiredSession,
};
