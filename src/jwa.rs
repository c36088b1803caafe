//! JSON Web Algorithms (RFC 7518) supported by the engines.

use crate::error::JoseError;
use ring::hmac;
use std::fmt;
use std::str::FromStr;

/// JWS signature algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JwsAlgorithm {
    /// HMAC with SHA-256
    HS256,
    /// HMAC with SHA-384
    HS384,
    /// HMAC with SHA-512
    HS512,
    /// RSASSA-PKCS1-v1_5 with SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 with SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 with SHA-512
    RS512,
}

impl JwsAlgorithm {
    /// Get algorithm name for the JOSE header.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
        }
    }

    /// Whether the algorithm is keyed with a shared secret.
    #[must_use]
    pub const fn is_hmac(&self) -> bool {
        matches!(self, Self::HS256 | Self::HS384 | Self::HS512)
    }

    pub(crate) fn hmac_algorithm(&self) -> Option<hmac::Algorithm> {
        match self {
            Self::HS256 => Some(hmac::HMAC_SHA256),
            Self::HS384 => Some(hmac::HMAC_SHA384),
            Self::HS512 => Some(hmac::HMAC_SHA512),
            Self::RS256 | Self::RS384 | Self::RS512 => None,
        }
    }

    /// Hash output length in bytes, which is also the minimum HMAC key length.
    #[must_use]
    pub const fn digest_len(&self) -> usize {
        match self {
            Self::HS256 | Self::RS256 => 32,
            Self::HS384 | Self::RS384 => 48,
            Self::HS512 | Self::RS512 => 64,
        }
    }
}

impl FromStr for JwsAlgorithm {
    type Err = JoseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            "RS512" => Ok(Self::RS512),
            _ => Err(JoseError::unsupported_algorithm(s)),
        }
    }
}

impl fmt::Display for JwsAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWE key management algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyManagementAlgorithm {
    /// RSAES-OAEP with SHA-256 and MGF1-SHA-256
    RsaOaep256,
    /// RSAES-OAEP with SHA-1 and MGF1-SHA-1
    RsaOaep,
    /// AES Key Wrap (RFC 3394) with a 128-bit key
    A128Kw,
    /// AES Key Wrap with a 192-bit key
    A192Kw,
    /// AES Key Wrap with a 256-bit key
    A256Kw,
    /// Direct use of a shared symmetric key as the CEK
    Direct,
}

impl KeyManagementAlgorithm {
    /// Get algorithm name for the JOSE header.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RsaOaep256 => "RSA-OAEP-256",
            Self::RsaOaep => "RSA-OAEP",
            Self::A128Kw => "A128KW",
            Self::A192Kw => "A192KW",
            Self::A256Kw => "A256KW",
            Self::Direct => "dir",
        }
    }

    /// Whether the recipient key is an RSA key pair.
    #[must_use]
    pub const fn is_rsa(&self) -> bool {
        matches!(self, Self::RsaOaep256 | Self::RsaOaep)
    }

    /// Key-encryption key length in bytes for the AES Key Wrap family.
    #[must_use]
    pub const fn kek_len(&self) -> Option<usize> {
        match self {
            Self::A128Kw => Some(16),
            Self::A192Kw => Some(24),
            Self::A256Kw => Some(32),
            Self::RsaOaep256 | Self::RsaOaep | Self::Direct => None,
        }
    }

    /// Resolve the AES Key Wrap algorithm whose key length equals a shared
    /// secret.
    pub fn for_shared_key(secret_len: usize) -> Result<Self, JoseError> {
        match secret_len {
            16 => Ok(Self::A128Kw),
            24 => Ok(Self::A192Kw),
            32 => Ok(Self::A256Kw),
            other => Err(JoseError::invalid_parameter(format!(
                "shared key length {} bits is not 128/192/256",
                other * 8
            ))),
        }
    }
}

impl FromStr for KeyManagementAlgorithm {
    type Err = JoseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RSA-OAEP-256" => Ok(Self::RsaOaep256),
            "RSA-OAEP" => Ok(Self::RsaOaep),
            "A128KW" => Ok(Self::A128Kw),
            "A192KW" => Ok(Self::A192Kw),
            "A256KW" => Ok(Self::A256Kw),
            "dir" => Ok(Self::Direct),
            _ => Err(JoseError::unsupported_algorithm(s)),
        }
    }
}

impl fmt::Display for KeyManagementAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWE content encryption algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentEncryptionAlgorithm {
    /// AES-128-CBC with HMAC-SHA-256
    A128CbcHs256,
    /// AES-192-CBC with HMAC-SHA-384
    A192CbcHs384,
    /// AES-256-CBC with HMAC-SHA-512
    A256CbcHs512,
    /// AES-128-GCM
    A128Gcm,
    /// AES-192-GCM
    A192Gcm,
    /// AES-256-GCM
    A256Gcm,
}

impl ContentEncryptionAlgorithm {
    /// Get algorithm name for the JOSE header.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::A128CbcHs256 => "A128CBC-HS256",
            Self::A192CbcHs384 => "A192CBC-HS384",
            Self::A256CbcHs512 => "A256CBC-HS512",
            Self::A128Gcm => "A128GCM",
            Self::A192Gcm => "A192GCM",
            Self::A256Gcm => "A256GCM",
        }
    }

    /// Content encryption key length in bytes.
    ///
    /// For the CBC-HMAC family this is the MAC key plus the AES key.
    #[must_use]
    pub const fn key_len(&self) -> usize {
        match self {
            Self::A128CbcHs256 => 32,
            Self::A192CbcHs384 => 48,
            Self::A256CbcHs512 => 64,
            Self::A128Gcm => 16,
            Self::A192Gcm => 24,
            Self::A256Gcm => 32,
        }
    }

    /// Initialization vector length in bytes.
    #[must_use]
    pub const fn iv_len(&self) -> usize {
        if self.is_cbc_hmac() {
            16
        } else {
            12
        }
    }

    /// Authentication tag length in bytes.
    #[must_use]
    pub const fn tag_len(&self) -> usize {
        match self {
            Self::A128CbcHs256 => 16,
            Self::A192CbcHs384 => 24,
            Self::A256CbcHs512 => 32,
            Self::A128Gcm | Self::A192Gcm | Self::A256Gcm => 16,
        }
    }

    /// Whether this is an AES-CBC-HMAC-SHA2 composite algorithm.
    #[must_use]
    pub const fn is_cbc_hmac(&self) -> bool {
        matches!(
            self,
            Self::A128CbcHs256 | Self::A192CbcHs384 | Self::A256CbcHs512
        )
    }
}

impl FromStr for ContentEncryptionAlgorithm {
    type Err = JoseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A128CBC-HS256" => Ok(Self::A128CbcHs256),
            "A192CBC-HS384" => Ok(Self::A192CbcHs384),
            "A256CBC-HS512" => Ok(Self::A256CbcHs512),
            "A128GCM" => Ok(Self::A128Gcm),
            "A192GCM" => Ok(Self::A192Gcm),
            "A256GCM" => Ok(Self::A256Gcm),
            _ => Err(JoseError::unsupported_algorithm(s)),
        }
    }
}

impl fmt::Display for ContentEncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
