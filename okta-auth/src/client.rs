//! Okta authentication client.
//!
//! HTTP client for the Okta authn API. Provides primary authentication,
//! one-time code and push verification, and the exchange of an
//! authenticated session for a SAML assertion.

use crate::config::{parse_base_url, OktaConfig};
use crate::error::{AuthError, AuthResult};
use crate::models::{AuthnResponse, Credentials, PassCodeRequest, StateTokenRequest};
use crate::poll::{poll_until, PollConfig, PollStatus};
use crate::saml::{extract_saml_payload, saml_url, SamlAssertion};
use crate::session::{
    AuthSession, AuthenticatedSession, Factor, FactorKind, FactorResult, MfaRequiredSession,
    STATUS_MFA_CHALLENGE, STATUS_SUCCESS,
};
use crate::transport::{decode_json, parse_link, post_json};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Path of the primary authentication endpoint.
pub const AUTHN_PATH: &str = "/api/v1/authn";

/// Okta authentication client.
///
/// Holds no state across authentication attempts besides its HTTP client.
#[derive(Debug, Clone)]
pub struct OktaClient {
    /// HTTP client instance.
    client: Client,

    /// Organization base URL.
    base_url: Url,

    /// Request timeout.
    timeout: Duration,

    /// Push polling behavior.
    poll: PollConfig,
}

impl OktaClient {
    /// Create a new client for the organization at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> AuthResult<Self> {
        let base_url = parse_base_url(base_url)?;
        let client = build_http_client(timeout, false)?;

        Ok(Self {
            client,
            base_url,
            timeout,
            poll: PollConfig::default(),
        })
    }

    /// Create a client from configuration.
    pub fn from_config(config: &OktaConfig) -> AuthResult<Self> {
        config.validate()?;
        Ok(Self::new(&config.base_url, config.timeout())?.with_poll_config(config.poll_config()))
    }

    /// Replace the push polling behavior.
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Organization base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Push polling behavior.
    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// Submit username and password.
    ///
    /// Any well-formed response is returned as a session, whether or not a
    /// second factor is still required.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn authenticate(&self, credentials: &Credentials) -> AuthResult<AuthSession> {
        debug!("Starting primary authentication");

        let url = self.base_url.join(AUTHN_PATH)?;
        let body = post_json(&self.client, &url, credentials).await?;
        let session = AuthSession::try_from(decode_json::<AuthnResponse>(&body)?)?;

        info!(status = session.status(), "Primary authentication answered");
        Ok(session)
    }

    /// Verify a one-time code factor.
    #[instrument(skip(self, session, factor, pass_code), fields(provider = %factor.provider))]
    pub async fn verify_code(
        &self,
        session: &MfaRequiredSession,
        factor: &Factor,
        pass_code: &str,
    ) -> AuthResult<AuthSession> {
        expect_kind(factor, FactorKind::Code, "code")?;
        debug!("Verifying one-time code");

        let url = parse_link(&factor.verify_href)?;
        let request = PassCodeRequest {
            state_token: &session.state_token,
            pass_code,
        };

        let body = post_json(&self.client, &url, &request).await?;
        let session = AuthSession::try_from(decode_json::<AuthnResponse>(&body)?)?;

        info!(status = session.status(), "Code verification answered");
        Ok(session)
    }

    /// Start a push challenge and poll until the user answers it.
    ///
    /// Polling waits `PollConfig::interval` between attempts. Network errors
    /// are tolerated up to `PollConfig::max_consecutive_failures` in a row;
    /// a rejected, timed out or unrecognized result ends polling at once.
    #[instrument(skip(self, session, factor), fields(provider = %factor.provider))]
    pub async fn verify_push(
        &self,
        session: &MfaRequiredSession,
        factor: &Factor,
    ) -> AuthResult<AuthenticatedSession> {
        expect_kind(factor, FactorKind::Push, "push")?;

        let url = parse_link(&factor.verify_href)?;
        let request = StateTokenRequest {
            state_token: &session.state_token,
        };

        let body = post_json(&self.client, &url, &request).await?;
        let challenge: AuthnResponse = decode_json(&body)?;

        if challenge.status() == STATUS_SUCCESS {
            return AuthSession::try_from(challenge)?.into_authenticated();
        }

        let poll_url = challenge
            .links
            .next
            .as_ref()
            .map(|link| link.href.as_str())
            .filter(|href| !href.is_empty())
            .ok_or_else(|| AuthError::InvalidResponse("missing push poll link".to_string()))?;
        let poll_url = parse_link(poll_url)?;

        info!("Waiting for push approval");

        let result = poll_until(
            &self.poll,
            || self.poll_push(&poll_url, &request),
            AuthError::is_retryable,
        )
        .await;

        match result {
            Ok(session) => {
                info!("Push approved");
                Ok(session)
            }
            Err(e) => {
                let e = AuthError::from(e);
                error!(error = %e, "Push verification failed");
                Err(e)
            }
        }
    }

    /// Exchange an authenticated session for a SAML assertion.
    ///
    /// Every call uses a fresh HTTP client with an empty cookie store.
    #[instrument(skip(self, session))]
    pub async fn exchange_assertion(
        &self,
        saml_path: &str,
        session: &AuthenticatedSession,
    ) -> AuthResult<SamlAssertion> {
        let url = saml_url(&self.base_url, saml_path, &session.session_token)?;
        let client = build_http_client(self.timeout, true)?;

        let response = client.get(url).send().await?;
        let status = response.status();

        if status.as_u16() >= 300 {
            warn!(status = status.as_u16(), "SAML endpoint refused the session");
            return Err(AuthError::SamlFetch {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        let encoded = extract_saml_payload(&body)?;
        let assertion = SamlAssertion::decode(encoded)?;

        info!(bytes = assertion.as_bytes().len(), "SAML assertion obtained");
        Ok(assertion)
    }

    async fn poll_push(
        &self,
        url: &Url,
        request: &StateTokenRequest<'_>,
    ) -> AuthResult<PollStatus<AuthenticatedSession>> {
        let body = post_json(&self.client, url, request).await?;
        let response: AuthnResponse = decode_json(&body)?;

        match response.status() {
            STATUS_MFA_CHALLENGE => match response.factor_result.as_deref() {
                Some(result) if FactorResult::parse(result).is_terminal_failure() => {
                    Err(AuthError::FactorRejected(result.to_string()))
                }
                _ => {
                    debug!("Push still pending");
                    Ok(PollStatus::Pending)
                }
            },
            STATUS_SUCCESS => Ok(PollStatus::Ready(
                AuthSession::try_from(response)?.into_authenticated()?,
            )),
            other => Err(AuthError::UnexpectedStatus(other.to_string())),
        }
    }
}

fn build_http_client(timeout: Duration, cookie_store: bool) -> AuthResult<Client> {
    Client::builder()
        .timeout(timeout)
        .cookie_store(cookie_store)
        .build()
        .map_err(|e| AuthError::Config(format!("failed to build HTTP client: {}", e)))
}

fn expect_kind(factor: &Factor, kind: FactorKind, expected: &'static str) -> AuthResult<()> {
    if factor.kind == kind {
        Ok(())
    } else {
        Err(AuthError::FactorMismatch {
            expected,
            actual: factor.factor_type.clone(),
        })
    }
}
