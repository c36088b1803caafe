//! JWS engine (RFC 7515): HMAC-SHA2 and RSASSA-PKCS1-v1_5 signatures.

mod signer;
mod token;

pub use signer::{HmacSigner, JwsSigner, RsaSigner};
pub use token::JwsToken;

use crate::error::JoseError;
use crate::header::Header;
use crate::jwk::{Key, KeyOperation, KeyUse};
use crate::serialization::{self, Serialization, Token};
use signer::KeyedSigner;
use tracing::{debug, instrument, warn};

/// Stateless JWS sign/verify.
pub struct JwsEngine;

impl JwsEngine {
    /// Sign `payload` under `header` with `key`.
    ///
    /// Key kind, `use`, `key_ops` and `alg` are all checked before any
    /// cryptographic work.
    ///
    /// # Errors
    ///
    /// `UnsupportedAlgorithm` for an unknown `alg`, `AlgorithmMismatch` when
    /// the key cannot produce that algorithm, `UnsupportedOperation` when the
    /// key's usage constraints forbid signing.
    #[instrument(skip_all, fields(alg = header.alg().unwrap_or_default(), payload_len = payload.len()))]
    pub fn sign(payload: &[u8], key: &Key, header: Header) -> Result<JwsToken, JoseError> {
        header.ensure_no_crit()?;
        let alg = header.jws_algorithm()?;
        key.ensure_alg(alg.as_str())?;
        key.ensure_permits(KeyUse::Signature, &[KeyOperation::Sign])?;
        let signer = KeyedSigner::for_signing(alg, key)?;

        let encoded_header = header.encode()?;
        let input = token::signing_input(&encoded_header, payload);
        let signature = signer.sign(input.as_bytes())?;

        debug!(kid = header.kid().unwrap_or_default(), "JWS signed");
        JwsToken::from_parts(header, encoded_header, None, payload.to_vec(), signature)
    }

    /// Verify a token's signature and return its payload unchanged.
    ///
    /// # Errors
    ///
    /// `SignatureMismatch` if the signature does not verify under `key`, plus
    /// the algorithm and key checks of [`JwsEngine::sign`].
    #[instrument(skip_all, fields(alg = token.header().alg().unwrap_or_default()))]
    pub fn verify(token: &JwsToken, key: &Key) -> Result<Vec<u8>, JoseError> {
        let alg = token.header().jws_algorithm()?;
        key.ensure_alg(alg.as_str())?;
        key.ensure_permits(KeyUse::Signature, &[KeyOperation::Verify])?;
        let verifier = KeyedSigner::for_verification(alg, key)?;

        if let Err(e) = verifier.verify(token.signing_input().as_bytes(), token.signature()) {
            warn!("JWS signature rejected");
            return Err(e);
        }

        debug!("JWS verified");
        Ok(token.payload().to_vec())
    }
}

/// Sign and render in compact form.
pub fn sign_compact(payload: &[u8], key: &Key, header: Header) -> Result<String, JoseError> {
    let token = JwsEngine::sign(payload, key, header)?;
    serialization::serialize_jws(&token, Serialization::Compact)
}

/// Parse a compact or JSON JWS and verify it.
pub fn verify_serialized(input: &str, key: &Key) -> Result<Vec<u8>, JoseError> {
    match serialization::deserialize(input)? {
        Token::Signed(token) => JwsEngine::verify(&token, key),
        Token::Encrypted(_) => Err(JoseError::malformed_token("expected a JWS, found a JWE")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwa::JwsAlgorithm;
    use crate::jwk::KeyKind;

    fn hs256_key() -> Key {
        Key::generate(KeyKind::Symmetric { bits: 256 }).unwrap()
    }

    #[test]
    fn test_sign_verify_hs256() {
        let key = hs256_key();
        let token = JwsEngine::sign(
            b"Demo Integrity protected message",
            &key,
            Header::jws(JwsAlgorithm::HS256),
        )
        .unwrap();
        assert_eq!(token.signature().len(), 32);
        let payload = JwsEngine::verify(&token, &key).unwrap();
        assert_eq!(payload, b"Demo Integrity protected message");
    }

    #[test]
    fn test_signing_input_format() {
        let key = hs256_key();
        let token = JwsEngine::sign(b"abc", &key, Header::jws(JwsAlgorithm::HS256)).unwrap();
        assert_eq!(
            token.signing_input(),
            format!("{}.YWJj", token.protected_segment())
        );
    }

    #[test]
    fn test_rs256_with_symmetric_key_is_mismatch() {
        let key = hs256_key();
        let result = JwsEngine::sign(b"payload", &key, Header::jws(JwsAlgorithm::RS256));
        assert!(matches!(result, Err(JoseError::AlgorithmMismatch { .. })));
    }

    #[test]
    fn test_unknown_alg_is_unsupported() {
        let key = hs256_key();
        let header = Header::new().with("alg", "none").unwrap();
        assert!(matches!(
            JwsEngine::sign(b"payload", &key, header),
            Err(JoseError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_wrong_key_is_signature_mismatch() {
        let token = JwsEngine::sign(b"payload", &hs256_key(), Header::jws(JwsAlgorithm::HS256))
            .unwrap();
        assert!(matches!(
            JwsEngine::verify(&token, &hs256_key()),
            Err(JoseError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_encryption_only_key_cannot_sign() {
        let key = hs256_key().with_use(KeyUse::Encryption);
        assert!(matches!(
            JwsEngine::sign(b"payload", &key, Header::jws(JwsAlgorithm::HS256)),
            Err(JoseError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_verify_only_key() {
        let signing = hs256_key();
        let verifying = signing.clone().with_key_ops(vec![KeyOperation::Verify]);
        let token =
            JwsEngine::sign(b"payload", &signing, Header::jws(JwsAlgorithm::HS256)).unwrap();
        assert!(JwsEngine::verify(&token, &verifying).is_ok());
        assert!(matches!(
            JwsEngine::sign(b"payload", &verifying, Header::jws(JwsAlgorithm::HS256)),
            Err(JoseError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_unprotected_header_must_be_disjoint() {
        let key = hs256_key();
        let token = JwsEngine::sign(
            b"payload",
            &key,
            Header::jws(JwsAlgorithm::HS256).with_kid("k1"),
        )
        .unwrap();
        let clash = Header::new().with_kid("k2");
        assert!(token.clone().with_unprotected_header(clash).is_err());

        let token = token
            .with_unprotected_header(Header::new().with("x-trace", "abc").unwrap())
            .unwrap();
        // unprotected members are not signed
        assert!(JwsEngine::verify(&token, &key).is_ok());
    }

    #[test]
    fn test_compact_helpers() {
        let key = hs256_key();
        let compact =
            sign_compact(b"hello", &key, Header::jws(JwsAlgorithm::HS256)).unwrap();
        assert_eq!(compact.split('.').count(), 3);
        assert_eq!(verify_serialized(&compact, &key).unwrap(), b"hello");
    }
}
