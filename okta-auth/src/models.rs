//! Wire types for the Okta authentication API
//!
//! Request bodies are serialized exactly as the provider expects them.
//! Response shapes mirror the subset of the authn transaction object this
//! crate consumes; every field is optional so that partial responses decode.

use secrecy::{ExposeSecret, SecretString};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Username and password for primary authentication.
#[derive(Debug)]
pub struct Credentials {
    /// Okta username (usually an email address)
    pub username: String,

    password: SecretString,
}

impl Credentials {
    /// Create credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

// The password is only exposed while building the authn request body.
impl Serialize for Credentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut body = serializer.serialize_struct("Credentials", 2)?;
        body.serialize_field("username", &self.username)?;
        body.serialize_field("password", self.password.expose_secret())?;
        body.end()
    }
}

/// Body for push verification and polling.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateTokenRequest<'a> {
    /// In-progress transaction identifier
    pub state_token: &'a str,
}

/// Body for one-time code verification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassCodeRequest<'a> {
    /// In-progress transaction identifier
    pub state_token: &'a str,

    /// User supplied one-time code
    pub pass_code: &'a str,
}

/// Authentication transaction returned by every authn endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthnResponse {
    /// Transaction identifier while authentication is in progress
    pub state_token: Option<String>,

    /// One-time session token, issued on `SUCCESS`
    pub session_token: Option<String>,

    /// Transaction expiry (RFC 3339)
    pub expires_at: Option<String>,

    /// Transaction status (`SUCCESS`, `MFA_REQUIRED`, `MFA_CHALLENGE`, ...)
    pub status: Option<String>,

    /// Push factor result while a challenge is outstanding
    pub factor_result: Option<String>,

    /// Embedded resources
    #[serde(default, rename = "_embedded", deserialize_with = "null_as_default")]
    pub embedded: Embedded,

    /// Transaction links
    #[serde(default, rename = "_links", deserialize_with = "null_as_default")]
    pub links: TransactionLinks,
}

impl AuthnResponse {
    /// Status string, empty when the provider omitted it.
    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or_default()
    }
}

/// Embedded resources of a transaction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Embedded {
    /// Factors the user may verify with
    #[serde(default, deserialize_with = "null_as_default")]
    pub factors: Vec<WireFactor>,
}

/// Factor as listed in `_embedded.factors`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFactor {
    /// Factor type tag, e.g. `push` or `token:software:totp`
    #[serde(default, deserialize_with = "null_as_default")]
    pub factor_type: String,

    /// Factor provider, e.g. `OKTA` or `GOOGLE`
    #[serde(default, deserialize_with = "null_as_default")]
    pub provider: String,

    /// Factor links
    #[serde(default, rename = "_links", deserialize_with = "null_as_default")]
    pub links: FactorLinks,
}

/// Links attached to a factor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FactorLinks {
    /// Endpoint that advances this factor
    pub verify: Option<Link>,
}

/// Links attached to a transaction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionLinks {
    /// Poll endpoint for an outstanding push challenge
    pub next: Option<Link>,
}

/// Hypermedia link.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Link {
    /// Absolute URL
    #[serde(default, deserialize_with = "null_as_default")]
    pub href: String,
}

// Okta sends `null` for absent values as often as it omits the key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credentials_body() {
        let credentials = Credentials::new("jane@example.com", "hunter2");
        let body = serde_json::to_value(&credentials).unwrap();
        assert_eq!(
            body,
            json!({"username": "jane@example.com", "password": "hunter2"})
        );
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("jane@example.com", "hunter2");
        assert!(!format!("{:?}", credentials).contains("hunter2"));
    }

    #[test]
    fn test_request_bodies() {
        let push = serde_json::to_value(StateTokenRequest { state_token: "st" }).unwrap();
        assert_eq!(push, json!({"stateToken": "st"}));

        let code = serde_json::to_value(PassCodeRequest {
            state_token: "st",
            pass_code: "123456",
        })
        .unwrap();
        assert_eq!(code, json!({"stateToken": "st", "passCode": "123456"}));
    }

    #[test]
    fn test_authn_response_decoding() {
        let response: AuthnResponse = serde_json::from_value(json!({
            "stateToken": "st",
            "expiresAt": "2024-01-01T00:05:00.000Z",
            "status": "MFA_REQUIRED",
            "_embedded": {
                "factors": [{
                    "factorType": "push",
                    "provider": "OKTA",
                    "_links": {"verify": {"href": "https://okta.example.com/verify"}}
                }]
            }
        }))
        .unwrap();

        assert_eq!(response.status(), "MFA_REQUIRED");
        assert_eq!(response.state_token.as_deref(), Some("st"));
        assert_eq!(response.embedded.factors.len(), 1);
        assert_eq!(
            response.embedded.factors[0].links.verify.as_ref().unwrap().href,
            "https://okta.example.com/verify"
        );
    }

    #[test]
    fn test_null_fields_decode_as_empty() {
        let response: AuthnResponse = serde_json::from_value(json!({
            "stateToken": "st",
            "status": "MFA_REQUIRED",
            "_links": null,
            "_embedded": {
                "factors": [
                    {
                        "factorType": "push",
                        "provider": null,
                        "_links": {"verify": {"href": "https://okta.example.com/verify"}}
                    },
                    {"factorType": null, "provider": "GOOGLE", "_links": null},
                    {"factorType": "sms", "_links": {"verify": {"href": null}}}
                ]
            }
        }))
        .unwrap();

        let factors = &response.embedded.factors;
        assert_eq!(factors.len(), 3);
        assert_eq!(factors[0].factor_type, "push");
        assert_eq!(factors[0].provider, "");
        assert_eq!(factors[1].factor_type, "");
        assert!(factors[1].links.verify.is_none());
        assert_eq!(factors[2].links.verify.as_ref().unwrap().href, "");
        assert!(response.links.next.is_none());
    }

    #[test]
    fn test_null_factor_list_decodes() {
        let response: AuthnResponse =
            serde_json::from_str(r#"{"status":"SUCCESS","_embedded":{"factors":null}}"#).unwrap();
        assert!(response.embedded.factors.is_empty());
    }

    #[test]
    fn test_empty_object_decodes() {
        let response: AuthnResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.status(), "");
        assert!(response.embedded.factors.is_empty());
        assert!(response.links.next.is_none());
    }
}
