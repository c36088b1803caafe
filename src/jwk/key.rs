//! Typed key material: a closed union over symmetric and RSA keys.

use crate::codec::random_bytes;
use crate::error::JoseError;
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Smallest RSA modulus accepted for import.
pub const MIN_RSA_BITS: usize = 2048;

/// Modulus sizes accepted for generation.
pub const SUPPORTED_RSA_BITS: [usize; 3] = [2048, 3072, 4096];

/// Requested key kind and size for [`Key::generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Random shared secret of `bits` length
    Symmetric { bits: usize },
    /// RSA key pair with a `bits` modulus and e = 65537
    Rsa { bits: usize },
}

/// Intended use of a key (`use` member).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyUse {
    #[serde(rename = "sig")]
    Signature,
    #[serde(rename = "enc")]
    Encryption,
}

impl KeyUse {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Signature => "sig",
            Self::Encryption => "enc",
        }
    }
}

/// Permitted operation (`key_ops` member).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyOperation {
    Sign,
    Verify,
    Encrypt,
    Decrypt,
    WrapKey,
    UnwrapKey,
    DeriveKey,
    DeriveBits,
}

impl KeyOperation {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sign => "sign",
            Self::Verify => "verify",
            Self::Encrypt => "encrypt",
            Self::Decrypt => "decrypt",
            Self::WrapKey => "wrapKey",
            Self::UnwrapKey => "unwrapKey",
            Self::DeriveKey => "deriveKey",
            Self::DeriveBits => "deriveBits",
        }
    }
}

/// Optional JWK parameters that constrain how a key may be used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyParams {
    pub kid: Option<String>,
    pub key_use: Option<KeyUse>,
    pub key_ops: Option<Vec<KeyOperation>>,
    pub alg: Option<String>,
}

/// Shared secret. Zeroized on drop.
#[derive(Clone)]
pub struct SymmetricKey {
    secret: Zeroizing<Vec<u8>>,
    params: KeyParams,
}

impl SymmetricKey {
    pub(crate) fn new(secret: Vec<u8>, params: KeyParams) -> Result<Self, JoseError> {
        if secret.is_empty() {
            return Err(JoseError::invalid_parameter("symmetric key must not be empty"));
        }
        Ok(Self {
            secret: Zeroizing::new(secret),
            params,
        })
    }

    #[must_use]
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    #[must_use]
    pub fn bits(&self) -> usize {
        self.secret.len() * 8
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bits", &self.bits())
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// RSA public key with an optional private half.
#[derive(Clone)]
pub struct RsaKey {
    public: RsaPublicKey,
    private: Option<RsaPrivateKey>,
    params: KeyParams,
}

impl RsaKey {
    pub(crate) fn from_public(public: RsaPublicKey, params: KeyParams) -> Result<Self, JoseError> {
        let bits = public.n().bits();
        if bits < MIN_RSA_BITS {
            return Err(JoseError::malformed_key(format!(
                "RSA modulus must be at least {} bits, got {}",
                MIN_RSA_BITS, bits
            )));
        }
        Ok(Self {
            public,
            private: None,
            params,
        })
    }

    pub(crate) fn from_private(private: RsaPrivateKey, params: KeyParams) -> Result<Self, JoseError> {
        let mut key = Self::from_public(private.to_public_key(), params)?;
        key.private = Some(private);
        Ok(key)
    }

    #[must_use]
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    #[must_use]
    pub fn private_key(&self) -> Option<&RsaPrivateKey> {
        self.private.as_ref()
    }

    #[must_use]
    pub fn bits(&self) -> usize {
        self.public.n().bits()
    }
}

impl fmt::Debug for RsaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaKey")
            .field("bits", &self.bits())
            .field("private", &self.private.is_some())
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A JOSE key. Immutable once constructed.
#[derive(Debug, Clone)]
pub enum Key {
    Symmetric(SymmetricKey),
    Rsa(RsaKey),
}

impl Key {
    /// Generate fresh key material from the OS random source.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for a zero or non-byte-aligned symmetric size, or an
    /// RSA modulus size outside [`SUPPORTED_RSA_BITS`].
    pub fn generate(kind: KeyKind) -> Result<Self, JoseError> {
        match kind {
            KeyKind::Symmetric { bits } => {
                if bits == 0 || bits % 8 != 0 {
                    return Err(JoseError::invalid_parameter(format!(
                        "symmetric key size must be a positive multiple of 8 bits, got {}",
                        bits
                    )));
                }
                let key = SymmetricKey::new(random_bytes(bits / 8), KeyParams::default())?;
                Ok(Key::Symmetric(key))
            }
            KeyKind::Rsa { bits } => {
                if !SUPPORTED_RSA_BITS.contains(&bits) {
                    return Err(JoseError::invalid_parameter(format!(
                        "unsupported RSA modulus size {} (expected one of {:?})",
                        bits, SUPPORTED_RSA_BITS
                    )));
                }
                let private = RsaPrivateKey::new(&mut OsRng, bits)
                    .map_err(|e| JoseError::internal(format!("RSA key generation failed: {}", e)))?;
                Ok(Key::Rsa(RsaKey::from_private(private, KeyParams::default())?))
            }
        }
    }

    /// Wrap an existing shared secret.
    pub fn symmetric(secret: impl Into<Vec<u8>>) -> Result<Self, JoseError> {
        Ok(Key::Symmetric(SymmetricKey::new(
            secret.into(),
            KeyParams::default(),
        )?))
    }

    /// Wrap an existing RSA private key.
    pub fn rsa_private(private: RsaPrivateKey) -> Result<Self, JoseError> {
        Ok(Key::Rsa(RsaKey::from_private(private, KeyParams::default())?))
    }

    /// Wrap an existing RSA public key.
    pub fn rsa_public(public: RsaPublicKey) -> Result<Self, JoseError> {
        Ok(Key::Rsa(RsaKey::from_public(public, KeyParams::default())?))
    }

    /// Public projection of an RSA key.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` for symmetric keys.
    pub fn to_public(&self) -> Result<Key, JoseError> {
        match self {
            Key::Rsa(rsa) => Ok(Key::Rsa(RsaKey {
                public: rsa.public.clone(),
                private: None,
                params: rsa.params.clone(),
            })),
            Key::Symmetric(_) => Err(JoseError::unsupported_operation(
                "symmetric keys have no public projection",
            )),
        }
    }

    #[must_use]
    pub fn params(&self) -> &KeyParams {
        match self {
            Key::Symmetric(k) => &k.params,
            Key::Rsa(k) => &k.params,
        }
    }

    fn params_mut(&mut self) -> &mut KeyParams {
        match self {
            Key::Symmetric(k) => &mut k.params,
            Key::Rsa(k) => &mut k.params,
        }
    }

    #[must_use]
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.params_mut().kid = Some(kid.into());
        self
    }

    #[must_use]
    pub fn with_use(mut self, key_use: KeyUse) -> Self {
        self.params_mut().key_use = Some(key_use);
        self
    }

    #[must_use]
    pub fn with_key_ops(mut self, ops: Vec<KeyOperation>) -> Self {
        self.params_mut().key_ops = Some(ops);
        self
    }

    #[must_use]
    pub fn with_alg(mut self, alg: impl Into<String>) -> Self {
        self.params_mut().alg = Some(alg.into());
        self
    }

    #[must_use]
    pub fn kid(&self) -> Option<&str> {
        self.params().kid.as_deref()
    }

    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        matches!(self, Key::Symmetric(_))
    }

    #[must_use]
    pub fn has_private(&self) -> bool {
        match self {
            Key::Symmetric(_) => true,
            Key::Rsa(k) => k.private.is_some(),
        }
    }

    /// Key size in bits (modulus size for RSA).
    #[must_use]
    pub fn bits(&self) -> usize {
        match self {
            Key::Symmetric(k) => k.bits(),
            Key::Rsa(k) => k.bits(),
        }
    }

    /// Human-readable kind used in mismatch errors.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Key::Symmetric(_) => "symmetric",
            Key::Rsa(k) if k.private.is_some() => "RSA private",
            Key::Rsa(_) => "RSA public",
        }
    }

    pub(crate) fn secret(&self) -> Option<&[u8]> {
        match self {
            Key::Symmetric(k) => Some(k.secret()),
            Key::Rsa(_) => None,
        }
    }

    pub(crate) fn rsa_public_key(&self) -> Option<&RsaPublicKey> {
        match self {
            Key::Rsa(k) => Some(&k.public),
            Key::Symmetric(_) => None,
        }
    }

    pub(crate) fn rsa_private_key(&self) -> Option<&RsaPrivateKey> {
        match self {
            Key::Rsa(k) => k.private.as_ref(),
            Key::Symmetric(_) => None,
        }
    }

    /// Check `use` and `key_ops` against the requested purpose.
    ///
    /// `ops` lists the operations any one of which satisfies `key_ops`.
    pub(crate) fn ensure_permits(&self, purpose: KeyUse, ops: &[KeyOperation]) -> Result<(), JoseError> {
        let params = self.params();
        if let Some(declared) = params.key_use {
            if declared != purpose {
                return Err(JoseError::unsupported_operation(format!(
                    "key is restricted to use={}",
                    declared.as_str()
                )));
            }
        }
        if let Some(allowed) = &params.key_ops {
            if !ops.iter().any(|op| allowed.contains(op)) {
                let wanted: Vec<&str> = ops.iter().map(KeyOperation::as_str).collect();
                return Err(JoseError::unsupported_operation(format!(
                    "key_ops does not permit {}",
                    wanted.join("|")
                )));
            }
        }
        Ok(())
    }

    /// Check a declared `alg` against the one requested.
    pub(crate) fn ensure_alg(&self, alg: &str) -> Result<(), JoseError> {
        match self.params().alg.as_deref() {
            Some(declared) if declared != alg => Err(JoseError::algorithm_mismatch(
                alg,
                format!("alg={}", alg),
                format!("alg={}", declared),
            )),
            _ => Ok(()),
        }
    }
}
