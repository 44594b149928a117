//! JSON-over-HTTP transport shared by every authn call.
//!
//! Each protocol call is a POST with a JSON body. The raw HTTP outcome is
//! classified here so that callers only see [`AuthError`] variants.

use crate::error::{AuthError, AuthResult};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

const APPLICATION_JSON: &str = "application/json";

/// POST `body` as JSON to `url` and return the raw response body.
///
/// - 401 and 403 are [`AuthError::Unauthorized`]
/// - any other status of 300 or above is [`AuthError::HttpStatus`]
/// - a body that cannot be read is [`AuthError::InvalidResponse`]
pub(crate) async fn post_json<B>(client: &Client, url: &Url, body: &B) -> AuthResult<Vec<u8>>
where
    B: Serialize + ?Sized,
{
    let payload =
        serde_json::to_vec(body).map_err(|e| AuthError::Serialization(e.to_string()))?;

    let response = client
        .post(url.clone())
        .header(CONTENT_TYPE, APPLICATION_JSON)
        .header(ACCEPT, APPLICATION_JSON)
        .body(payload)
        .send()
        .await?;

    let status = response.status();
    debug!(url = %url, status = status.as_u16(), "Okta responded");

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        warn!(status = status.as_u16(), "Okta rejected the request");
        return Err(AuthError::Unauthorized {
            status: status.as_u16(),
        });
    }

    if status.as_u16() >= 300 {
        warn!(status = status.as_u16(), "Unexpected HTTP status from Okta");
        return Err(AuthError::HttpStatus {
            status: status.as_u16(),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

    Ok(bytes.to_vec())
}

/// Decode a response body into the expected shape.
pub(crate) fn decode_json<T: DeserializeOwned>(body: &[u8]) -> AuthResult<T> {
    serde_json::from_slice(body).map_err(|e| AuthError::InvalidResponse(e.to_string()))
}

/// Parse a provider-supplied link.
pub(crate) fn parse_link(href: &str) -> AuthResult<Url> {
    Ok(Url::parse(href)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthnResponse;

    #[test]
    fn test_decode_json() {
        let response: AuthnResponse = decode_json(br#"{"status":"SUCCESS"}"#).unwrap();
        assert_eq!(response.status(), "SUCCESS");
    }

    #[test]
    fn test_decode_json_rejects_garbage() {
        let err = decode_json::<AuthnResponse>(b"<html>").unwrap_err();
        assert!(matches!(err, AuthError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_link_requires_absolute_url() {
        assert!(parse_link("https://acme.okta.com/api/v1/authn/factors/f1/verify").is_ok());
        assert!(matches!(parse_link(""), Err(AuthError::InvalidUrl(_))));
    }
}
