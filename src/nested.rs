//! Sign-then-encrypt of JSON values.
//!
//! The value is signed as a flattened JWS by the sender, and that JWS
//! document is encrypted as a flattened JWE for the recipient with
//! `cty: "JOSE+JSON"`.

use crate::codec::json_encode;
use crate::config::Profile;
use crate::error::JoseError;
use crate::header::Header;
use crate::jwa::KeyManagementAlgorithm;
use crate::jwe::JweEngine;
use crate::jwk::Key;
use crate::jws::JwsEngine;
use crate::serialization::{self, Serialization, Token};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{instrument, warn};

/// Content type of a JWE whose plaintext is a JWS in JSON serialization.
pub const NESTED_CONTENT_TYPE: &str = "JOSE+JSON";

/// Sign-then-encrypt using a [`Profile`]'s default algorithms.
#[derive(Debug, Clone, Default)]
pub struct SignAndEncrypt {
    profile: Profile,
}

impl SignAndEncrypt {
    #[must_use]
    pub fn new(profile: Profile) -> Self {
        Self { profile }
    }

    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    fn jwe_header(&self, recipient_key: &Key) -> Result<Header, JoseError> {
        let alg = match recipient_key.secret() {
            Some(secret) => KeyManagementAlgorithm::for_shared_key(secret.len())?,
            None => self.profile.key_management,
        };
        Ok(Header::jwe(alg, self.profile.content_encryption))
    }

    /// Serialize `value` to JSON, sign it with `sender_key`, then encrypt for
    /// `recipient_key`. Returns the flattened JWE JSON.
    ///
    /// Both headers carry `kid = sender_id`. A shared-secret recipient gets
    /// A128KW, A192KW or A256KW chosen by its key length, with a fresh CEK
    /// per message.
    #[instrument(skip_all, fields(sender_id = %sender_id))]
    pub fn write<T: Serialize + ?Sized>(
        &self,
        value: &T,
        sender_key: &Key,
        recipient_key: &Key,
        sender_id: &str,
    ) -> Result<String, JoseError> {
        let payload = json_encode(value)?;

        let alg = self.profile.signing_algorithm(sender_key.is_symmetric());
        let jws = JwsEngine::sign(&payload, sender_key, Header::jws(alg).with_kid(sender_id))?;
        let signed = jws.serialize(Serialization::Flattened)?;

        let header = self
            .jwe_header(recipient_key)?
            .with_cty(NESTED_CONTENT_TYPE)
            .with_kid(sender_id);
        let jwe = JweEngine::encrypt(signed.as_bytes(), recipient_key, header)?;
        jwe.serialize(Serialization::Flattened)
    }

    /// Decrypt with `recipient_key`, verify with `sender_key`, and
    /// deserialize the signed JSON.
    ///
    /// # Errors
    ///
    /// Every cryptographic failure, including a bad inner signature, is
    /// `DecryptionFailed`. Structural problems are `MalformedToken`.
    #[instrument(skip_all)]
    pub fn read<T: DeserializeOwned>(
        &self,
        json: &str,
        recipient_key: &Key,
        sender_key: &Key,
    ) -> Result<T, JoseError> {
        let Token::Encrypted(jwe) = serialization::deserialize(json)? else {
            return Err(JoseError::malformed_token("expected a JWE"));
        };
        if jwe.header().cty() != Some(NESTED_CONTENT_TYPE) {
            return Err(JoseError::malformed_token(format!(
                "expected cty '{}'",
                NESTED_CONTENT_TYPE
            )));
        }

        let signed = JweEngine::decrypt(&jwe, recipient_key).map_err(JoseError::into_opaque)?;
        let signed = std::str::from_utf8(&signed)
            .map_err(|_| JoseError::malformed_token("nested JWS is not UTF-8"))?;
        let Token::Signed(jws) = serialization::deserialize(signed)? else {
            return Err(JoseError::malformed_token("nested token is not a JWS"));
        };

        let payload = JwsEngine::verify(&jws, sender_key).map_err(|e| match e {
            JoseError::SignatureMismatch => {
                warn!("nested signature rejected");
                JoseError::DecryptionFailed
            }
            other => other,
        })?;

        serde_json::from_slice(&payload)
            .map_err(|e| JoseError::malformed_token(format!("payload does not match the requested type: {}", e)))
    }
}
