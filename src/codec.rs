//! Base64url and JSON helpers shared by every JOSE component.
//!
//! Decoding is strict: padding, the standard alphabet, whitespace and
//! non-canonical trailing bits are all rejected.

use crate::error::JoseError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use std::collections::BTreeMap;

/// Encode bytes as unpadded base64url.
#[must_use]
pub fn b64url_encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded base64url.
///
/// # Errors
///
/// Returns `MalformedToken` on any non-canonical or invalid input.
pub fn b64url_decode(input: &str) -> Result<Vec<u8>, JoseError> {
    URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|e| JoseError::malformed_token(format!("invalid base64url: {}", e)))
}

/// Serialize a value to compact JSON bytes, preserving map insertion order.
pub fn json_encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, JoseError> {
    serde_json::to_vec(value).map_err(|e| JoseError::internal(format!("JSON encoding failed: {}", e)))
}

/// Canonical JSON of string members: keys in lexicographic order, no whitespace.
///
/// Only used for RFC 7638 thumbprints; everything else keeps insertion order.
#[must_use]
pub fn canonical_json(members: &BTreeMap<&str, &str>) -> String {
    // BTreeMap<&str, &str> serialization cannot fail
    serde_json::to_string(members).unwrap_or_default()
}

/// Draw `len` bytes from the operating system CSPRNG.
#[must_use]
pub(crate) fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_has_no_padding() {
        assert_eq!(b64url_encode(b"f"), "Zg");
        assert_eq!(b64url_encode(b"fo"), "Zm8");
        assert_eq!(b64url_encode(b"foo"), "Zm9v");
    }

    #[test]
    fn test_encode_uses_url_alphabet() {
        assert_eq!(b64url_encode([0xfb, 0xff]), "-_8");
    }

    #[test]
    fn test_decode_rejects_padding() {
        assert_eq!(b64url_decode("Zg").unwrap(), b"f");
        assert!(matches!(
            b64url_decode("Zg=="),
            Err(JoseError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_decode_rejects_standard_alphabet() {
        assert!(b64url_decode("-_8").is_ok());
        assert!(b64url_decode("+/8").is_err());
    }

    #[test]
    fn test_decode_rejects_whitespace_and_trailing_bits() {
        assert!(b64url_decode("Zm9v ").is_err());
        // "Zh" decodes to 'f' with non-zero trailing bits
        assert!(b64url_decode("Zh").is_err());
    }

    #[test]
    fn test_decode_empty() {
        assert!(b64url_decode("").unwrap().is_empty());
    }

    #[test]
    fn test_canonical_json_sorted() {
        let mut members = BTreeMap::new();
        members.insert("n", "modulus");
        members.insert("kty", "RSA");
        members.insert("e", "AQAB");
        assert_eq!(
            canonical_json(&members),
            r#"{"e":"AQAB","kty":"RSA","n":"modulus"}"#
        );
    }

    #[test]
    fn test_random_bytes_length_and_freshness() {
        let a = random_bytes(32);
        let b = random_bytes(32);
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
