//! Authentication session states
//!
//! An authentication transaction moves forward through distinct states.
//! Each state is its own type: a session token only exists on an
//! [`AuthenticatedSession`], and a state token only exists on sessions that
//! are still in progress.

use crate::error::{AuthError, AuthResult};
use crate::models::{AuthnResponse, WireFactor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub(crate) const STATUS_SUCCESS: &str = "SUCCESS";
pub(crate) const STATUS_MFA_REQUIRED: &str = "MFA_REQUIRED";
pub(crate) const STATUS_MFA_CHALLENGE: &str = "MFA_CHALLENGE";

/// How a second factor is verified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    /// One-time code typed by the user
    Code,
    /// Out-of-band approval on another device
    Push,
    /// Factor type this crate cannot verify
    Unsupported(String),
}

impl FactorKind {
    /// Parse an Okta factor type tag.
    pub fn parse(factor_type: &str) -> Self {
        match factor_type {
            "push" => FactorKind::Push,
            "token:software:totp" | "token:hardware" | "token" => FactorKind::Code,
            other => FactorKind::Unsupported(other.to_string()),
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &str {
        match self {
            FactorKind::Code => "code",
            FactorKind::Push => "push",
            FactorKind::Unsupported(tag) => tag,
        }
    }
}

/// A second factor offered by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    /// Verification style
    pub kind: FactorKind,

    /// Raw factor type tag
    pub factor_type: String,

    /// Provider label, display only
    pub provider: String,

    /// Endpoint that advances this factor
    pub verify_href: String,
}

impl Factor {
    /// Human readable name of the factor's provider.
    pub fn display_name(&self) -> &str {
        match self.provider.as_str() {
            "GOOGLE" => "Google Authenticator",
            "OKTA" => "Okta Verify",
            "RSA" => "RSA SecurID",
            other => other,
        }
    }
}

impl From<WireFactor> for Factor {
    fn from(factor: WireFactor) -> Self {
        Self {
            kind: FactorKind::parse(&factor.factor_type),
            factor_type: factor.factor_type,
            provider: factor.provider,
            verify_href: factor.links.verify.map(|link| link.href).unwrap_or_default(),
        }
    }
}

/// Result of an outstanding push challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactorResult {
    /// User has not answered yet
    Waiting,
    /// User approved
    Success,
    /// User denied
    Rejected,
    /// Challenge expired
    Timeout,
    /// Unrecognized result
    Other(String),
}

impl FactorResult {
    /// Parse an Okta factor result.
    pub fn parse(result: &str) -> Self {
        match result {
            "WAITING" => FactorResult::Waiting,
            "SUCCESS" => FactorResult::Success,
            "REJECTED" => FactorResult::Rejected,
            "TIMEOUT" => FactorResult::Timeout,
            other => FactorResult::Other(other.to_string()),
        }
    }

    /// Whether this result ends the challenge unsuccessfully.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, FactorResult::Rejected | FactorResult::Timeout)
    }
}

/// Fully authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSession {
    /// One-time token redeemable for a SAML assertion
    pub session_token: String,

    /// Expiry reported by the provider
    pub expires_at: Option<DateTime<Utc>>,
}

/// Primary factor passed, a second factor is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaRequiredSession {
    /// In-progress transaction identifier
    pub state_token: String,

    /// Expiry reported by the provider
    pub expires_at: Option<DateTime<Utc>>,

    /// Factors the user may verify with
    pub factors: Vec<Factor>,
}

impl MfaRequiredSession {
    /// Factors of the given kind, in provider order.
    pub fn factors_of_kind<'a>(&'a self, kind: &'a FactorKind) -> impl Iterator<Item = &'a Factor> {
        self.factors.iter().filter(move |factor| &factor.kind == kind)
    }
}

/// A second-factor challenge is outstanding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeSession {
    /// In-progress transaction identifier
    pub state_token: String,

    /// Expiry reported by the provider
    pub expires_at: Option<DateTime<Utc>>,

    /// Push result, when the provider reported one
    pub factor_result: Option<FactorResult>,

    /// Poll endpoint, when the provider reported one
    pub poll_href: Option<String>,
}

/// Any other transaction status (`LOCKED_OUT`, `PASSWORD_EXPIRED`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompleteSession {
    /// Raw status string
    pub status: String,

    /// Transaction identifier, if the provider issued one
    pub state_token: Option<String>,

    /// Expiry reported by the provider
    pub expires_at: Option<DateTime<Utc>>,
}

/// State of an authentication transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSession {
    /// `SUCCESS`
    Authenticated(AuthenticatedSession),
    /// `MFA_REQUIRED`
    MfaRequired(MfaRequiredSession),
    /// `MFA_CHALLENGE`
    MfaChallenge(ChallengeSession),
    /// Anything else
    Incomplete(IncompleteSession),
}

impl AuthSession {
    /// Raw provider status of this session.
    pub fn status(&self) -> &str {
        match self {
            AuthSession::Authenticated(_) => STATUS_SUCCESS,
            AuthSession::MfaRequired(_) => STATUS_MFA_REQUIRED,
            AuthSession::MfaChallenge(_) => STATUS_MFA_CHALLENGE,
            AuthSession::Incomplete(session) => &session.status,
        }
    }

    /// Require an authenticated session.
    pub fn into_authenticated(self) -> AuthResult<AuthenticatedSession> {
        match self {
            AuthSession::Authenticated(session) => Ok(session),
            other => Err(AuthError::UnexpectedStatus(other.status().to_string())),
        }
    }
}

impl TryFrom<AuthnResponse> for AuthSession {
    type Error = AuthError;

    fn try_from(response: AuthnResponse) -> AuthResult<Self> {
        let expires_at = response.expires_at.as_deref().and_then(parse_expiry);
        let status = response.status().to_string();

        let session = match status.as_str() {
            STATUS_SUCCESS => AuthSession::Authenticated(AuthenticatedSession {
                session_token: non_empty(response.session_token, "sessionToken")?,
                expires_at,
            }),
            STATUS_MFA_REQUIRED => AuthSession::MfaRequired(MfaRequiredSession {
                state_token: non_empty(response.state_token, "stateToken")?,
                expires_at,
                factors: response
                    .embedded
                    .factors
                    .into_iter()
                    .map(Factor::from)
                    .collect(),
            }),
            STATUS_MFA_CHALLENGE => AuthSession::MfaChallenge(ChallengeSession {
                state_token: non_empty(response.state_token, "stateToken")?,
                expires_at,
                factor_result: response.factor_result.as_deref().map(FactorResult::parse),
                poll_href: response.links.next.map(|link| link.href),
            }),
            _ => AuthSession::Incomplete(IncompleteSession {
                status,
                state_token: response.state_token.filter(|token| !token.is_empty()),
                expires_at,
            }),
        };

        Ok(session)
    }
}

fn non_empty(value: Option<String>, field: &str) -> AuthResult<String> {
    value
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AuthError::InvalidResponse(format!("missing {}", field)))
}

fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatusCode;
    use serde_json::json;

    fn response(value: serde_json::Value) -> AuthnResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_success_carries_session_token() {
        let session = AuthSession::try_from(response(json!({
            "status": "SUCCESS",
            "sessionToken": "sess",
            "expiresAt": "2024-01-01T00:05:00.000Z"
        })))
        .unwrap();

        let authenticated = session.into_authenticated().unwrap();
        assert_eq!(authenticated.session_token, "sess");
        assert!(authenticated.expires_at.is_some());
    }

    #[test]
    fn test_success_without_session_token_is_rejected() {
        let err = AuthSession::try_from(response(json!({"status": "SUCCESS"}))).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UnexpectedResponseShape);
    }

    #[test]
    fn test_mfa_required_lists_factors() {
        let session = AuthSession::try_from(response(json!({
            "status": "MFA_REQUIRED",
            "stateToken": "st",
            "_embedded": {"factors": [
                {"factorType": "token:software:totp", "provider": "GOOGLE",
                 "_links": {"verify": {"href": "https://okta.example.com/totp"}}},
                {"factorType": "push", "provider": "OKTA",
                 "_links": {"verify": {"href": "https://okta.example.com/push"}}},
                {"factorType": "sms", "provider": "OKTA"}
            ]}
        })))
        .unwrap();

        let AuthSession::MfaRequired(session) = session else {
            panic!("expected MFA_REQUIRED");
        };
        assert_eq!(session.state_token, "st");
        assert_eq!(session.factors[0].kind, FactorKind::Code);
        assert_eq!(session.factors[0].display_name(), "Google Authenticator");
        assert_eq!(session.factors[1].kind, FactorKind::Push);
        assert_eq!(session.factors[1].verify_href, "https://okta.example.com/push");
        assert_eq!(
            session.factors[2].kind,
            FactorKind::Unsupported("sms".to_string())
        );
        assert_eq!(session.factors[2].verify_href, "");
        assert_eq!(session.factors_of_kind(&FactorKind::Push).count(), 1);
    }

    #[test]
    fn test_mfa_required_without_state_token_is_rejected() {
        let err =
            AuthSession::try_from(response(json!({"status": "MFA_REQUIRED"}))).unwrap_err();
        assert!(matches!(err, AuthError::InvalidResponse(_)));
    }

    #[test]
    fn test_challenge_reports_factor_result_and_poll_link() {
        let session = AuthSession::try_from(response(json!({
            "status": "MFA_CHALLENGE",
            "stateToken": "st",
            "factorResult": "REJECTED",
            "_links": {"next": {"href": "https://okta.example.com/poll"}}
        })))
        .unwrap();

        let AuthSession::MfaChallenge(challenge) = session else {
            panic!("expected MFA_CHALLENGE");
        };
        assert_eq!(challenge.factor_result, Some(FactorResult::Rejected));
        assert!(challenge.factor_result.unwrap().is_terminal_failure());
        assert_eq!(challenge.poll_href.as_deref(), Some("https://okta.example.com/poll"));
    }

    #[test]
    fn test_other_status_is_incomplete() {
        let session = AuthSession::try_from(response(json!({"status": "LOCKED_OUT"}))).unwrap();
        assert_eq!(session.status(), "LOCKED_OUT");
        assert!(matches!(
            session.into_authenticated(),
            Err(AuthError::UnexpectedStatus(status)) if status == "LOCKED_OUT"
        ));
    }

    #[test]
    fn test_unparseable_expiry_is_dropped() {
        let session = AuthSession::try_from(response(json!({
            "status": "SUCCESS",
            "sessionToken": "sess",
            "expiresAt": "tomorrow"
        })))
        .unwrap();
        assert_eq!(session.into_authenticated().unwrap().expires_at, None);
    }

    #[test]
    fn test_display_name_falls_back_to_provider() {
        let factor = Factor {
            kind: FactorKind::Code,
            factor_type: "token".to_string(),
            provider: "SYMANTEC".to_string(),
            verify_href: String::new(),
        };
        assert_eq!(factor.display_name(), "SYMANTEC");
    }
}
