//! End-to-end login.
//!
//! Drives the three stages in order: primary authentication, second factor
//! verification when the provider asks for one, and the SAML exchange. Any
//! failure aborts the attempt; a new attempt starts again from the password.

use crate::client::OktaClient;
use crate::config::OktaConfig;
use crate::error::{AuthError, AuthResult};
use crate::models::Credentials;
use crate::saml::SamlAssertion;
use crate::session::{AuthSession, AuthenticatedSession, Factor, FactorKind, MfaRequiredSession};
use async_trait::async_trait;
use tracing::{info, instrument};

/// User interaction needed during a login.
#[async_trait]
pub trait FactorPrompt: Send + Sync {
    /// Choose the factor to verify among those this crate supports.
    async fn select_factor<'a>(&self, factors: &'a [Factor]) -> AuthResult<&'a Factor>;

    /// Ask the user for the current one-time code of `factor`.
    async fn one_time_code(&self, factor: &Factor) -> AuthResult<String>;
}

/// Runs complete logins against one SAML application.
#[derive(Debug, Clone)]
pub struct Authenticator {
    client: OktaClient,
    saml_path: String,
}

impl Authenticator {
    /// Create an authenticator for the SAML application at `saml_path`.
    pub fn new(client: OktaClient, saml_path: impl Into<String>) -> Self {
        Self {
            client,
            saml_path: saml_path.into(),
        }
    }

    /// Create an authenticator from configuration.
    pub fn from_config(config: &OktaConfig) -> AuthResult<Self> {
        let saml_path = config
            .saml_path
            .clone()
            .ok_or_else(|| AuthError::Config("OKTA_SAML_PATH is not set".to_string()))?;
        Ok(Self::new(OktaClient::from_config(config)?, saml_path))
    }

    /// Underlying client.
    pub fn client(&self) -> &OktaClient {
        &self.client
    }

    /// Authenticate and obtain a SAML assertion.
    #[instrument(skip(self, credentials, prompt), fields(username = %credentials.username))]
    pub async fn login(
        &self,
        credentials: &Credentials,
        prompt: &dyn FactorPrompt,
    ) -> AuthResult<SamlAssertion> {
        let session = self.client.authenticate(credentials).await?;
        let authenticated = self.second_factor(session, prompt).await?;

        info!("Authenticated, requesting SAML assertion");
        self.client
            .exchange_assertion(&self.saml_path, &authenticated)
            .await
    }

    async fn second_factor(
        &self,
        session: AuthSession,
        prompt: &dyn FactorPrompt,
    ) -> AuthResult<AuthenticatedSession> {
        match session {
            AuthSession::Authenticated(session) => Ok(session),
            AuthSession::MfaRequired(session) => self.verify_selected(&session, prompt).await,
            other => Err(AuthError::UnexpectedStatus(other.status().to_string())),
        }
    }

    async fn verify_selected(
        &self,
        session: &MfaRequiredSession,
        prompt: &dyn FactorPrompt,
    ) -> AuthResult<AuthenticatedSession> {
        let supported = supported_factors(&session.factors);
        if supported.is_empty() {
            return Err(AuthError::InvalidResponse(
                "no supported second factor offered".to_string(),
            ));
        }

        let factor = prompt.select_factor(&supported).await?;
        info!(factor = factor.display_name(), kind = factor.kind.as_str(), "Verifying second factor");

        match factor.kind {
            FactorKind::Push => self.client.verify_push(session, factor).await,
            FactorKind::Code => {
                let code = prompt.one_time_code(factor).await?;
                self.client
                    .verify_code(session, factor, code.trim())
                    .await?
                    .into_authenticated()
            }
            FactorKind::Unsupported(ref tag) => Err(AuthError::FactorMismatch {
                expected: "push or code",
                actual: tag.clone(),
            }),
        }
    }
}

/// Factors this crate can verify, in provider order.
pub fn supported_factors(factors: &[Factor]) -> Vec<Factor> {
    factors
        .iter()
        .filter(|factor| !matches!(factor.kind, FactorKind::Unsupported(_)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factor(factor_type: &str, provider: &str) -> Factor {
        Factor {
            kind: FactorKind::parse(factor_type),
            factor_type: factor_type.to_string(),
            provider: provider.to_string(),
            verify_href: String::new(),
        }
    }

    #[test]
    fn test_supported_factors() {
        let factors = vec![
            factor("sms", "OKTA"),
            factor("push", "OKTA"),
            factor("token:software:totp", "GOOGLE"),
            factor("question", "OKTA"),
        ];

        let supported = supported_factors(&factors);
        assert_eq!(supported.len(), 2);
        assert_eq!(supported[0].kind, FactorKind::Push);
        assert_eq!(supported[1].display_name(), "Google Authenticator");
    }

    #[test]
    fn test_from_config_requires_saml_path() {
        let config = OktaConfig::new("https://acme.okta.com");
        assert!(matches!(
            Authenticator::from_config(&config),
            Err(AuthError::Config(_))
        ));

        let config = config.with_saml_path("/app/amazon_aws/exk1/sso/saml");
        assert!(Authenticator::from_config(&config).is_ok());
    }
}
