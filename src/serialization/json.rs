//! JSON serialization, general and flattened (RFC 7515 §7.2, RFC 7516 §7.2).
//!
//! Only single-signature and single-recipient documents are accepted.

use super::Token;
use crate::codec::{b64url_decode, b64url_encode};
use crate::error::JoseError;
use crate::header::Header;
use crate::jwe::{JweParts, JweToken};
use crate::jws::JwsToken;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct SignatureJson {
    protected: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    header: Option<Map<String, Value>>,
    signature: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct JwsGeneralJson {
    payload: String,
    signatures: Vec<SignatureJson>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct JwsFlattenedJson {
    payload: String,
    #[serde(flatten)]
    signature: SignatureJson,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
struct RecipientJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    header: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    encrypted_key: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct JweGeneralJson {
    protected: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unprotected: Option<Map<String, Value>>,
    recipients: Vec<RecipientJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aad: Option<String>,
    iv: String,
    ciphertext: String,
    tag: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct JweFlattenedJson {
    protected: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unprotected: Option<Map<String, Value>>,
    #[serde(flatten)]
    recipient: RecipientJson,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aad: Option<String>,
    iv: String,
    ciphertext: String,
    tag: String,
}

fn to_string<T: Serialize>(value: &T) -> Result<String, JoseError> {
    serde_json::to_string(value)
        .map_err(|e| JoseError::internal(format!("JSON encoding failed: {}", e)))
}

fn from_value<T: for<'de> Deserialize<'de>>(value: Value, form: &str) -> Result<T, JoseError> {
    serde_json::from_value(value)
        .map_err(|e| JoseError::malformed_token(format!("invalid {}: {}", form, e)))
}

fn signature_json(token: &JwsToken) -> SignatureJson {
    SignatureJson {
        protected: token.protected_segment().to_string(),
        header: token.unprotected_header().map(|h| h.as_map().clone()),
        signature: b64url_encode(token.signature()),
    }
}

pub(crate) fn encode_jws_general(token: &JwsToken) -> Result<String, JoseError> {
    to_string(&JwsGeneralJson {
        payload: b64url_encode(token.payload()),
        signatures: vec![signature_json(token)],
    })
}

pub(crate) fn encode_jws_flattened(token: &JwsToken) -> Result<String, JoseError> {
    to_string(&JwsFlattenedJson {
        payload: b64url_encode(token.payload()),
        signature: signature_json(token),
    })
}

fn recipient_json(token: &JweToken) -> RecipientJson {
    RecipientJson {
        header: None,
        encrypted_key: b64url_encode(token.encrypted_key()),
    }
}

pub(crate) fn encode_jwe_general(token: &JweToken) -> Result<String, JoseError> {
    to_string(&JweGeneralJson {
        protected: token.protected_segment().to_string(),
        unprotected: token.unprotected_header().map(|h| h.as_map().clone()),
        recipients: vec![recipient_json(token)],
        aad: None,
        iv: b64url_encode(token.iv()),
        ciphertext: b64url_encode(token.ciphertext()),
        tag: b64url_encode(token.tag()),
    })
}

pub(crate) fn encode_jwe_flattened(token: &JweToken) -> Result<String, JoseError> {
    to_string(&JweFlattenedJson {
        protected: token.protected_segment().to_string(),
        unprotected: token.unprotected_header().map(|h| h.as_map().clone()),
        recipient: recipient_json(token),
        aad: None,
        iv: b64url_encode(token.iv()),
        ciphertext: b64url_encode(token.ciphertext()),
        tag: b64url_encode(token.tag()),
    })
}

fn unprotected_header(map: Option<Map<String, Value>>) -> Result<Option<Header>, JoseError> {
    let Some(map) = map else {
        return Ok(None);
    };
    let header = Header::from_map(map);
    if header.contains("crit") {
        return Err(JoseError::malformed_token(
            "'crit' must be integrity protected",
        ));
    }
    Ok(Some(header))
}

fn decode_jws(payload: &str, signature: SignatureJson) -> Result<Token, JoseError> {
    let token = JwsToken::from_parts(
        Header::decode(&signature.protected)?,
        signature.protected,
        unprotected_header(signature.header)?,
        b64url_decode(payload)?,
        b64url_decode(&signature.signature)?,
    )?;
    Ok(Token::Signed(token))
}

/// Shared and per-recipient unprotected headers become one header.
fn merge_unprotected(
    shared: Option<Map<String, Value>>,
    recipient: Option<Map<String, Value>>,
) -> Result<Option<Header>, JoseError> {
    match (shared, recipient) {
        (None, None) => Ok(None),
        (Some(map), None) | (None, Some(map)) => unprotected_header(Some(map)),
        (Some(mut shared), Some(recipient)) => {
            for (name, value) in recipient {
                if shared.contains_key(&name) {
                    return Err(JoseError::malformed_token(format!(
                        "header parameter '{}' repeated in unprotected headers",
                        name
                    )));
                }
                shared.insert(name, value);
            }
            unprotected_header(Some(shared))
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn decode_jwe(
    protected: String,
    unprotected: Option<Map<String, Value>>,
    recipient: RecipientJson,
    aad: Option<String>,
    iv: &str,
    ciphertext: &str,
    tag: &str,
) -> Result<Token, JoseError> {
    if aad.is_some() {
        return Err(JoseError::malformed_token(
            "JWE 'aad' member is not supported",
        ));
    }
    let token = JweToken::from_parts(
        Header::decode(&protected)?,
        JweParts {
            encoded_header: protected,
            unprotected: merge_unprotected(unprotected, recipient.header)?,
            encrypted_key: b64url_decode(&recipient.encrypted_key)?,
            iv: b64url_decode(iv)?,
            ciphertext: b64url_decode(ciphertext)?,
            tag: b64url_decode(tag)?,
        },
    )?;
    Ok(Token::Encrypted(token))
}

/// Parse a JSON document, telling the four shapes apart by their members.
pub(crate) fn decode(input: &str) -> Result<Token, JoseError> {
    let value: Value = serde_json::from_str(input)
        .map_err(|e| JoseError::malformed_token(format!("invalid JSON serialization: {}", e)))?;
    let Value::Object(map) = &value else {
        return Err(JoseError::malformed_token("JSON serialization must be an object"));
    };

    if map.contains_key("signatures") {
        let general: JwsGeneralJson = from_value(value, "JWS general serialization")?;
        let mut signatures = general.signatures;
        if signatures.len() != 1 {
            return Err(JoseError::malformed_token(format!(
                "exactly one signature is supported, got {}",
                signatures.len()
            )));
        }
        let signature = signatures.remove(0);
        decode_jws(&general.payload, signature)
    } else if map.contains_key("recipients") {
        let general: JweGeneralJson = from_value(value, "JWE general serialization")?;
        let mut recipients = general.recipients;
        if recipients.len() != 1 {
            return Err(JoseError::malformed_token(format!(
                "exactly one recipient is supported, got {}",
                recipients.len()
            )));
        }
        let recipient = recipients.remove(0);
        decode_jwe(
            general.protected,
            general.unprotected,
            recipient,
            general.aad,
            &general.iv,
            &general.ciphertext,
            &general.tag,
        )
    } else if map.contains_key("ciphertext") {
        let flattened: JweFlattenedJson = from_value(value, "JWE flattened serialization")?;
        decode_jwe(
            flattened.protected,
            flattened.unprotected,
            flattened.recipient,
            flattened.aad,
            &flattened.iv,
            &flattened.ciphertext,
            &flattened.tag,
        )
    } else if map.contains_key("payload") {
        let flattened: JwsFlattenedJson = from_value(value, "JWS flattened serialization")?;
        decode_jws(&flattened.payload, flattened.signature)
    } else {
        Err(JoseError::malformed_token(
            "JSON serialization is neither a JWS nor a JWE",
        ))
    }
}
