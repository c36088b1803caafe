//! Engine configuration.
//!
//! Loaded from environment variables (and an optional `.env` file) and
//! validated before use.

use crate::error::JoseError;
use crate::jwa::{ContentEncryptionAlgorithm, JwsAlgorithm, KeyManagementAlgorithm};
use crate::jwk::SUPPORTED_RSA_BITS;
use std::env;
use std::time::Duration;

/// Default algorithms used when a caller does not name one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    /// Signature algorithm for RSA keys
    pub asymmetric_signing: JwsAlgorithm,
    /// Signature algorithm for shared secrets
    pub symmetric_signing: JwsAlgorithm,
    /// Key management for RSA recipients
    pub key_management: KeyManagementAlgorithm,
    /// Content encryption for RSA recipients
    pub content_encryption: ContentEncryptionAlgorithm,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            asymmetric_signing: JwsAlgorithm::RS256,
            symmetric_signing: JwsAlgorithm::HS256,
            key_management: KeyManagementAlgorithm::RsaOaep256,
            content_encryption: ContentEncryptionAlgorithm::A256CbcHs512,
        }
    }
}

impl Profile {
    /// Check that each default fits its key family.
    pub fn validate(&self) -> Result<(), JoseError> {
        if !self.symmetric_signing.is_hmac() {
            return Err(JoseError::config(format!(
                "symmetric signing algorithm must be HMAC, got {}",
                self.symmetric_signing
            )));
        }
        if self.asymmetric_signing.is_hmac() {
            return Err(JoseError::config(format!(
                "asymmetric signing algorithm must be RSA, got {}",
                self.asymmetric_signing
            )));
        }
        if !self.key_management.is_rsa() {
            return Err(JoseError::config(format!(
                "asymmetric key management must be RSA-OAEP or RSA-OAEP-256, got {}",
                self.key_management
            )));
        }
        Ok(())
    }

    /// Signature algorithm for a key family.
    #[must_use]
    pub const fn signing_algorithm(&self, symmetric: bool) -> JwsAlgorithm {
        if symmetric {
            self.symmetric_signing
        } else {
            self.asymmetric_signing
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level filter
    pub log_level: String,
    /// Emit logs as JSON
    pub log_json: bool,
    /// Modulus size for generated RSA keys
    pub rsa_key_bits: usize,
    /// Size of generated shared secrets
    pub symmetric_key_bits: usize,
    /// Default algorithms
    pub profile: Profile,
    /// Allowed clock skew for JWT time claims
    pub clock_leeway: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            rsa_key_bits: 2048,
            symmetric_key_bits: 256,
            profile: Profile::default(),
            clock_leeway: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, JoseError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, JoseError> {
        let log_level = lookup("JOSE_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_json = parse_var(&lookup, "JOSE_LOG_JSON", false)?;
        let rsa_key_bits = parse_var(&lookup, "JOSE_RSA_KEY_BITS", 2048)?;
        let symmetric_key_bits = parse_var(&lookup, "JOSE_SYMMETRIC_KEY_BITS", 256)?;

        let profile = Profile {
            asymmetric_signing: parse_var(&lookup, "JOSE_JWS_ALG_ASYMMETRIC", JwsAlgorithm::RS256)?,
            symmetric_signing: parse_var(&lookup, "JOSE_JWS_ALG_SYMMETRIC", JwsAlgorithm::HS256)?,
            key_management: parse_var(
                &lookup,
                "JOSE_JWE_ALG",
                KeyManagementAlgorithm::RsaOaep256,
            )?,
            content_encryption: parse_var(
                &lookup,
                "JOSE_JWE_ENC",
                ContentEncryptionAlgorithm::A256CbcHs512,
            )?,
        };
        let clock_leeway = Duration::from_secs(parse_var(&lookup, "JOSE_CLOCK_LEEWAY", 60)?);

        let config = Self {
            log_level,
            log_json,
            rsa_key_bits,
            symmetric_key_bits,
            profile,
            clock_leeway,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate sizes and the algorithm profile.
    pub fn validate(&self) -> Result<(), JoseError> {
        if !SUPPORTED_RSA_BITS.contains(&self.rsa_key_bits) {
            return Err(JoseError::config(format!(
                "JOSE_RSA_KEY_BITS must be one of {:?}, got {}",
                SUPPORTED_RSA_BITS, self.rsa_key_bits
            )));
        }
        if self.symmetric_key_bits == 0 || self.symmetric_key_bits % 8 != 0 {
            return Err(JoseError::config(format!(
                "JOSE_SYMMETRIC_KEY_BITS must be a positive multiple of 8, got {}",
                self.symmetric_key_bits
            )));
        }
        self.profile.validate()?;

        let min_bits = self.profile.symmetric_signing.digest_len() * 8;
        if self.symmetric_key_bits < min_bits {
            return Err(JoseError::config(format!(
                "JOSE_SYMMETRIC_KEY_BITS must be at least {} for {}, got {}",
                min_bits, self.profile.symmetric_signing, self.symmetric_key_bits
            )));
        }
        Ok(())
    }
}

/// Parse a variable with a default value.
fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T, JoseError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|e| JoseError::config(format!("Invalid {}: {}", name, e))),
        None => Ok(default),
    }
}
