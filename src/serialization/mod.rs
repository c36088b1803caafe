//! Serialization layer shared by JWS and JWE: compact, JSON general and
//! JSON flattened forms.

mod compact;
mod json;

use crate::error::JoseError;
use crate::jwe::JweToken;
use crate::jws::JwsToken;

/// Wire form of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Serialization {
    /// Dot-separated base64url segments
    #[default]
    Compact,
    /// JSON object with a `signatures` / `recipients` array
    General,
    /// JSON object with the single signature or recipient at the root
    Flattened,
}

/// A parsed token of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Signed(JwsToken),
    Encrypted(JweToken),
}

impl Token {
    /// Parse any supported form. See [`deserialize`].
    pub fn deserialize(input: &str) -> Result<Self, JoseError> {
        deserialize(input)
    }

    /// Render in the requested form.
    pub fn serialize(&self, form: Serialization) -> Result<String, JoseError> {
        match self {
            Token::Signed(token) => serialize_jws(token, form),
            Token::Encrypted(token) => serialize_jwe(token, form),
        }
    }

    #[must_use]
    pub fn is_signed(&self) -> bool {
        matches!(self, Token::Signed(_))
    }

    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Token::Encrypted(_))
    }
}

impl From<JwsToken> for Token {
    fn from(token: JwsToken) -> Self {
        Token::Signed(token)
    }
}

impl From<JweToken> for Token {
    fn from(token: JweToken) -> Self {
        Token::Encrypted(token)
    }
}

/// Render a JWS.
///
/// # Errors
///
/// `UnsupportedOperation` for compact form when the token carries an
/// unprotected header.
pub fn serialize_jws(token: &JwsToken, form: Serialization) -> Result<String, JoseError> {
    match form {
        Serialization::Compact => compact::encode_jws(token),
        Serialization::General => json::encode_jws_general(token),
        Serialization::Flattened => json::encode_jws_flattened(token),
    }
}

/// Render a JWE.
///
/// # Errors
///
/// `UnsupportedOperation` for compact form when the token carries an
/// unprotected header.
pub fn serialize_jwe(token: &JweToken, form: Serialization) -> Result<String, JoseError> {
    match form {
        Serialization::Compact => compact::encode_jwe(token),
        Serialization::General => json::encode_jwe_general(token),
        Serialization::Flattened => json::encode_jwe_flattened(token),
    }
}

/// Parse a token from compact or JSON form.
///
/// Input starting with `{` (after whitespace) is JSON; anything else is
/// compact.
///
/// # Errors
///
/// `MalformedToken` for a wrong segment count, missing members, invalid
/// base64url, or a protected header that is not a JSON object.
pub fn deserialize(input: &str) -> Result<Token, JoseError> {
    let trimmed = input.trim();
    if trimmed.starts_with('{') {
        json::decode(trimmed)
    } else {
        compact::decode(trimmed)
    }
}

impl JwsToken {
    /// Render in the requested form.
    pub fn serialize(&self, form: Serialization) -> Result<String, JoseError> {
        serialize_jws(self, form)
    }
}

impl JweToken {
    /// Render in the requested form.
    pub fn serialize(&self, form: Serialization) -> Result<String, JoseError> {
        serialize_jwe(self, form)
    }
}
