//! Compact serialization (RFC 7515 §7.1, RFC 7516 §7.1).

use super::Token;
use crate::codec::{b64url_decode, b64url_encode};
use crate::error::JoseError;
use crate::header::Header;
use crate::jwe::{JweParts, JweToken};
use crate::jws::JwsToken;

pub(crate) fn encode_jws(token: &JwsToken) -> Result<String, JoseError> {
    if token.unprotected_header().is_some() {
        return Err(JoseError::unsupported_operation(
            "compact serialization does not support unprotected headers",
        ));
    }
    Ok(format!(
        "{}.{}",
        token.signing_input(),
        b64url_encode(token.signature())
    ))
}

pub(crate) fn encode_jwe(token: &JweToken) -> Result<String, JoseError> {
    if token.unprotected_header().is_some() {
        return Err(JoseError::unsupported_operation(
            "compact serialization does not support unprotected headers",
        ));
    }
    Ok(format!(
        "{}.{}.{}.{}.{}",
        token.protected_segment(),
        b64url_encode(token.encrypted_key()),
        b64url_encode(token.iv()),
        b64url_encode(token.ciphertext()),
        b64url_encode(token.tag())
    ))
}

/// Split on `.`: three segments are a JWS, five a JWE.
pub(crate) fn decode(input: &str) -> Result<Token, JoseError> {
    let segments: Vec<&str> = input.split('.').collect();
    match segments.as_slice() {
        [header, payload, signature] => {
            let token = JwsToken::from_parts(
                Header::decode(header)?,
                (*header).to_string(),
                None,
                b64url_decode(payload)?,
                b64url_decode(signature)?,
            )?;
            Ok(Token::Signed(token))
        }
        [header, encrypted_key, iv, ciphertext, tag] => {
            let token = JweToken::from_parts(
                Header::decode(header)?,
                JweParts {
                    encoded_header: (*header).to_string(),
                    unprotected: None,
                    encrypted_key: b64url_decode(encrypted_key)?,
                    iv: b64url_decode(iv)?,
                    ciphertext: b64url_decode(ciphertext)?,
                    tag: b64url_decode(tag)?,
                },
            )?;
            Ok(Token::Encrypted(token))
        }
        other => Err(JoseError::malformed_token(format!(
            "compact serialization needs 3 or 5 segments, got {}",
            other.len()
        ))),
    }
}
