//! JWS signature schemes bound to key material.

use crate::error::JoseError;
use crate::jwa::JwsAlgorithm;
use crate::jwk::Key;
use rand::rngs::OsRng;
use ring::hmac;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};

/// A signature scheme ready to sign or verify with one key.
pub trait JwsSigner {
    /// Sign the JWS signing input.
    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>, JoseError>;

    /// Verify a signature over the JWS signing input.
    fn verify(&self, signing_input: &[u8], signature: &[u8]) -> Result<(), JoseError>;

    /// Get the algorithm name for the JWS header.
    fn algorithm(&self) -> JwsAlgorithm;
}

/// HMAC-SHA2 over a shared secret.
pub struct HmacSigner {
    alg: JwsAlgorithm,
    key: hmac::Key,
}

impl HmacSigner {
    /// Bind an HMAC algorithm to a secret.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if the secret is shorter than the hash output.
    pub fn new(alg: JwsAlgorithm, secret: &[u8]) -> Result<Self, JoseError> {
        let algorithm = alg
            .hmac_algorithm()
            .ok_or_else(|| JoseError::algorithm_mismatch(alg.as_str(), "RSA", "symmetric"))?;
        if secret.len() < alg.digest_len() {
            return Err(JoseError::invalid_parameter(format!(
                "{} requires a key of at least {} bits, got {}",
                alg,
                alg.digest_len() * 8,
                secret.len() * 8
            )));
        }
        Ok(Self {
            alg,
            key: hmac::Key::new(algorithm, secret),
        })
    }
}

impl JwsSigner for HmacSigner {
    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>, JoseError> {
        Ok(hmac::sign(&self.key, signing_input).as_ref().to_vec())
    }

    fn verify(&self, signing_input: &[u8], signature: &[u8]) -> Result<(), JoseError> {
        // constant-time comparison
        hmac::verify(&self.key, signing_input, signature).map_err(|_| JoseError::SignatureMismatch)
    }

    fn algorithm(&self) -> JwsAlgorithm {
        self.alg
    }
}

#[derive(Clone, Copy)]
enum RsaHash {
    Sha256,
    Sha384,
    Sha512,
}

impl RsaHash {
    fn for_algorithm(alg: JwsAlgorithm) -> Result<Self, JoseError> {
        match alg {
            JwsAlgorithm::RS256 => Ok(Self::Sha256),
            JwsAlgorithm::RS384 => Ok(Self::Sha384),
            JwsAlgorithm::RS512 => Ok(Self::Sha512),
            JwsAlgorithm::HS256 | JwsAlgorithm::HS384 | JwsAlgorithm::HS512 => Err(
                JoseError::algorithm_mismatch(alg.as_str(), "symmetric", "RSA"),
            ),
        }
    }
}

/// RSASSA-PKCS1-v1_5 with SHA-2.
pub struct RsaSigner<'k> {
    alg: JwsAlgorithm,
    hash: RsaHash,
    public: &'k RsaPublicKey,
    private: Option<&'k RsaPrivateKey>,
}

impl<'k> RsaSigner<'k> {
    /// Bind an RSA algorithm to a public key, for verification only.
    ///
    /// # Errors
    ///
    /// `AlgorithmMismatch` for HMAC algorithms.
    pub fn verifier(alg: JwsAlgorithm, public: &'k RsaPublicKey) -> Result<Self, JoseError> {
        Ok(Self {
            alg,
            hash: RsaHash::for_algorithm(alg)?,
            public,
            private: None,
        })
    }

    /// Bind an RSA algorithm to a private key.
    ///
    /// # Errors
    ///
    /// `AlgorithmMismatch` for HMAC algorithms.
    pub fn signer(alg: JwsAlgorithm, private: &'k RsaPrivateKey) -> Result<Self, JoseError> {
        Ok(Self {
            alg,
            hash: RsaHash::for_algorithm(alg)?,
            public: private.as_ref(),
            private: Some(private),
        })
    }

    fn scheme(&self, signing_input: &[u8]) -> (Pkcs1v15Sign, Vec<u8>) {
        match self.hash {
            RsaHash::Sha256 => (
                Pkcs1v15Sign::new::<Sha256>(),
                Sha256::digest(signing_input).to_vec(),
            ),
            RsaHash::Sha384 => (
                Pkcs1v15Sign::new::<Sha384>(),
                Sha384::digest(signing_input).to_vec(),
            ),
            RsaHash::Sha512 => (
                Pkcs1v15Sign::new::<Sha512>(),
                Sha512::digest(signing_input).to_vec(),
            ),
        }
    }
}

impl JwsSigner for RsaSigner<'_> {
    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>, JoseError> {
        let private = self
            .private
            .ok_or_else(|| JoseError::algorithm_mismatch(self.alg.as_str(), "RSA private", "RSA public"))?;
        let (scheme, hashed) = self.scheme(signing_input);
        private
            .sign_with_rng(&mut OsRng, scheme, &hashed)
            .map_err(|e| JoseError::internal(format!("RSA signing failed: {}", e)))
    }

    fn verify(&self, signing_input: &[u8], signature: &[u8]) -> Result<(), JoseError> {
        let (scheme, hashed) = self.scheme(signing_input);
        self.public
            .verify(scheme, &hashed, signature)
            .map_err(|_| JoseError::SignatureMismatch)
    }

    fn algorithm(&self) -> JwsAlgorithm {
        self.alg
    }
}

/// The signer chosen for an algorithm and key pair.
pub(crate) enum KeyedSigner<'k> {
    Hmac(HmacSigner),
    Rsa(RsaSigner<'k>),
}

impl<'k> KeyedSigner<'k> {
    /// Select a signer able to produce signatures with `key`.
    pub(crate) fn for_signing(alg: JwsAlgorithm, key: &'k Key) -> Result<Self, JoseError> {
        if alg.is_hmac() {
            return Self::hmac(alg, key);
        }
        match key.rsa_private_key() {
            Some(private) => Ok(KeyedSigner::Rsa(RsaSigner::signer(alg, private)?)),
            None => Err(JoseError::algorithm_mismatch(
                alg.as_str(),
                "RSA private",
                key.kind_name(),
            )),
        }
    }

    /// Select a signer able to check signatures with `key`.
    pub(crate) fn for_verification(alg: JwsAlgorithm, key: &'k Key) -> Result<Self, JoseError> {
        if alg.is_hmac() {
            return Self::hmac(alg, key);
        }
        match key.rsa_public_key() {
            Some(public) => Ok(KeyedSigner::Rsa(RsaSigner::verifier(alg, public)?)),
            None => Err(JoseError::algorithm_mismatch(alg.as_str(), "RSA", key.kind_name())),
        }
    }

    fn hmac(alg: JwsAlgorithm, key: &Key) -> Result<Self, JoseError> {
        match key.secret() {
            Some(secret) => Ok(KeyedSigner::Hmac(HmacSigner::new(alg, secret)?)),
            None => Err(JoseError::algorithm_mismatch(
                alg.as_str(),
                "symmetric",
                key.kind_name(),
            )),
        }
    }
}

impl JwsSigner for KeyedSigner<'_> {
    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>, JoseError> {
        match self {
            KeyedSigner::Hmac(signer) => signer.sign(signing_input),
            KeyedSigner::Rsa(signer) => signer.sign(signing_input),
        }
    }

    fn verify(&self, signing_input: &[u8], signature: &[u8]) -> Result<(), JoseError> {
        match self {
            KeyedSigner::Hmac(signer) => signer.verify(signing_input, signature),
            KeyedSigner::Rsa(signer) => signer.verify(signing_input, signature),
        }
    }

    fn algorithm(&self) -> JwsAlgorithm {
        match self {
            KeyedSigner::Hmac(signer) => signer.algorithm(),
            KeyedSigner::Rsa(signer) => signer.algorithm(),
        }
    }
}
