//! SAML assertion extraction
//!
//! The SAML application endpoint answers with an auto-submitting HTML form.
//! The assertion travels base64-encoded in the form's `SAMLResponse` input.
//! This module locates that input with a single forward pass over the HTML
//! token stream and decodes it.

use crate::error::{AuthError, AuthResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
    TokenizerResult,
};
use std::borrow::Cow;
use std::fmt;
use url::Url;

/// Name of the form field carrying the assertion.
pub const SAML_RESPONSE_FIELD: &str = "SAMLResponse";

/// Query parameter carrying the session token on the SAML request.
pub const ONE_TIME_TOKEN_PARAM: &str = "onetimetoken";

/// A SAML assertion obtained from the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct SamlAssertion {
    encoded: String,
    decoded: Vec<u8>,
}

impl SamlAssertion {
    /// Decode a base64 (standard alphabet) assertion.
    pub fn decode(encoded: impl Into<String>) -> AuthResult<Self> {
        let encoded = encoded.into();
        let decoded = STANDARD.decode(encoded.as_bytes())?;
        Ok(Self { encoded, decoded })
    }

    /// The assertion exactly as it appeared in the form.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Decoded assertion bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.decoded
    }

    /// Consume the assertion, returning the decoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.decoded
    }

    /// Decoded assertion as text.
    pub fn to_xml_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.decoded)
    }
}

impl fmt::Debug for SamlAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamlAssertion")
            .field("len", &self.decoded.len())
            .finish()
    }
}

/// Build the SAML request URL for a session token.
///
/// `saml_path` is resolved against `base`; any query it carries is replaced
/// by the single `onetimetoken` parameter.
pub fn saml_url(base: &Url, saml_path: &str, session_token: &str) -> AuthResult<Url> {
    let mut url = base.join(saml_path)?;
    url.query_pairs_mut()
        .clear()
        .append_pair(ONE_TIME_TOKEN_PARAM, session_token);
    Ok(url)
}

/// Find the value of the first `<input name="SAMLResponse">` in a document.
///
/// Content of raw text elements (`<script>`, `<style>`, `<textarea>`, ...)
/// is never scanned for tags. The rest of the document is not tokenized once
/// a match is found.
pub fn extract_saml_payload(html: &str) -> AuthResult<String> {
    let mut tokenizer = Tokenizer::new(SamlInputSink::default(), TokenizerOpts::default());

    let mut input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));

    // The sink suspends the tokenizer with a script handle once it has a match.
    if let TokenizerResult::Done = tokenizer.feed(&mut input) {
        tokenizer.end();
    }

    tokenizer.sink.payload.ok_or(AuthError::NoSamlPayload)
}

/// Token sink that records the first `SAMLResponse` input value.
#[derive(Debug, Default)]
struct SamlInputSink {
    payload: Option<String>,
}

impl TokenSink for SamlInputSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let Token::TagToken(tag) = token else {
            return TokenSinkResult::Continue;
        };
        if tag.kind != TagKind::StartTag {
            return TokenSinkResult::Continue;
        }

        // Self-closing tags arrive as start tags.
        match &*tag.name {
            "input" => match saml_response_value(&tag) {
                Some(value) => {
                    self.payload = Some(value);
                    TokenSinkResult::Script(())
                }
                None => TokenSinkResult::Continue,
            },
            "script" => TokenSinkResult::RawData(RawKind::ScriptData),
            "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" => {
                TokenSinkResult::RawData(RawKind::Rawtext)
            }
            "textarea" | "title" => TokenSinkResult::RawData(RawKind::Rcdata),
            "plaintext" => TokenSinkResult::Plaintext,
            _ => TokenSinkResult::Continue,
        }
    }
}

fn saml_response_value(tag: &Tag) -> Option<String> {
    let mut name: Option<&str> = None;
    let mut value: Option<&str> = None;

    for attr in &tag.attrs {
        match &*attr.name.local {
            "name" => name = Some(&*attr.value),
            "value" => value = Some(&*attr.value),
            _ => {}
        }
    }

    if name == Some(SAML_RESPONSE_FIELD) {
        Some(value.unwrap_or_default().to_string())
    } else {
        None
    }
}
