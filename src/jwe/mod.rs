//! JWE engine (RFC 7516): RSA-OAEP, AES Key Wrap or direct key management
//! with AES-CBC-HMAC-SHA2 or AES-GCM content encryption.

mod content;
mod keywrap;
mod token;

pub use token::JweToken;
pub(crate) use token::JweParts;

use crate::codec::random_bytes;
use crate::error::JoseError;
use crate::header::Header;
use crate::jwa::{ContentEncryptionAlgorithm, KeyManagementAlgorithm};
use crate::jwk::{Key, KeyOperation, KeyUse};
use crate::serialization::{self, Serialization, Token};
use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;

/// Stateless JWE encrypt/decrypt.
pub struct JweEngine;

impl JweEngine {
    /// Encrypt `payload` for the recipient `key` under `header`.
    ///
    /// A fresh CEK and IV are drawn for every call.
    ///
    /// # Errors
    ///
    /// `UnsupportedAlgorithm` for unknown `alg`/`enc` or a `zip` member,
    /// `AlgorithmMismatch` when the key kind does not fit `alg`,
    /// `UnsupportedOperation` when the key's usage constraints forbid it.
    #[instrument(skip_all, fields(
        alg = header.alg().unwrap_or_default(),
        enc = header.enc().unwrap_or_default(),
        payload_len = payload.len(),
    ))]
    pub fn encrypt(payload: &[u8], key: &Key, header: Header) -> Result<JweToken, JoseError> {
        let (alg, enc) = Self::algorithms(&header)?;
        key.ensure_alg(alg.as_str())?;
        key.ensure_permits(KeyUse::Encryption, Self::wrap_ops(alg))?;

        let (cek, encrypted_key) = keywrap::wrap_new_cek(alg, enc, key)?;
        let iv = random_bytes(enc.iv_len());
        let encoded_header = header.encode()?;
        let (ciphertext, tag) = content::encrypt(enc, &cek, &iv, encoded_header.as_bytes(), payload)?;

        debug!(kid = header.kid().unwrap_or_default(), "JWE encrypted");
        JweToken::from_parts(
            header,
            JweParts {
                encoded_header,
                unprotected: None,
                encrypted_key,
                iv,
                ciphertext,
                tag,
            },
        )
    }

    /// Decrypt a token and return the plaintext.
    ///
    /// The CEK is unwrapped first, then the tag is verified, and only then is
    /// the ciphertext decrypted. When unwrapping fails the tag is still
    /// computed under a random CEK before `KeyUnwrapFailed` is returned.
    ///
    /// # Errors
    ///
    /// `KeyUnwrapFailed`, `AuthenticationFailed` or `PaddingError` for the
    /// respective failing step. Callers exposing results to untrusted parties
    /// should use [`JoseError::into_opaque`] or [`decrypt_serialized`].
    #[instrument(skip_all, fields(
        alg = token.header().alg().unwrap_or_default(),
        enc = token.header().enc().unwrap_or_default(),
    ))]
    pub fn decrypt(token: &JweToken, key: &Key) -> Result<Vec<u8>, JoseError> {
        let (alg, enc) = Self::algorithms(token.header())?;
        key.ensure_alg(alg.as_str())?;
        key.ensure_permits(KeyUse::Encryption, Self::unwrap_ops(alg))?;

        if token.iv().len() != enc.iv_len() {
            return Err(JoseError::malformed_token(format!(
                "{} requires a {}-byte IV",
                enc,
                enc.iv_len()
            )));
        }

        let result = match keywrap::unwrap_cek(alg, enc, key, token.encrypted_key()) {
            Ok(cek) => Self::open(enc, &cek, token),
            Err(JoseError::KeyUnwrapFailed) => {
                // tag check still runs, under a random CEK (RFC 7516 §11.5)
                let decoy = Zeroizing::new(random_bytes(enc.key_len()));
                let _ = Self::open(enc, &decoy, token);
                Err(JoseError::KeyUnwrapFailed)
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(plaintext) => {
                debug!("JWE decrypted");
                Ok(plaintext)
            }
            Err(e) => {
                warn!("JWE rejected");
                Err(e)
            }
        }
    }

    fn open(enc: ContentEncryptionAlgorithm, cek: &[u8], token: &JweToken) -> Result<Vec<u8>, JoseError> {
        content::decrypt(
            enc,
            cek,
            token.iv(),
            token.protected_segment().as_bytes(),
            token.ciphertext(),
            token.tag(),
        )
    }

    fn algorithms(
        header: &Header,
    ) -> Result<(KeyManagementAlgorithm, ContentEncryptionAlgorithm), JoseError> {
        header.ensure_no_crit()?;
        if let Some(zip) = header.get("zip") {
            return Err(JoseError::unsupported_algorithm(format!("zip={}", zip)));
        }
        Ok((
            header.key_management_algorithm()?,
            header.content_encryption_algorithm()?,
        ))
    }

    fn wrap_ops(alg: KeyManagementAlgorithm) -> &'static [KeyOperation] {
        match alg {
            KeyManagementAlgorithm::Direct => &[KeyOperation::Encrypt],
            _ => &[KeyOperation::WrapKey, KeyOperation::Encrypt],
        }
    }

    fn unwrap_ops(alg: KeyManagementAlgorithm) -> &'static [KeyOperation] {
        match alg {
            KeyManagementAlgorithm::Direct => &[KeyOperation::Decrypt],
            _ => &[KeyOperation::UnwrapKey, KeyOperation::Decrypt],
        }
    }
}

/// Encrypt and render in compact form.
pub fn encrypt_compact(payload: &[u8], key: &Key, header: Header) -> Result<String, JoseError> {
    let token = JweEngine::encrypt(payload, key, header)?;
    serialization::serialize_jwe(&token, Serialization::Compact)
}

/// Parse a compact or JSON JWE and decrypt it.
///
/// Key unwrap, authentication and padding failures are all reported as
/// `DecryptionFailed`.
pub fn decrypt_serialized(input: &str, key: &Key) -> Result<Vec<u8>, JoseError> {
    let token = match serialization::deserialize(input)? {
        Token::Encrypted(token) => token,
        Token::Signed(_) => return Err(JoseError::malformed_token("expected a JWE, found a JWS")),
    };
    JweEngine::decrypt(&token, key).map_err(JoseError::into_opaque)
}
