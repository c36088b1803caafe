//! Error types for JOSE operations.
//!
//! Engine-level calls return the detailed kinds so callers and tests can tell
//! failures apart. String-level entry points collapse the decryption family
//! into [`JoseError::DecryptionFailed`] via [`JoseError::into_opaque`].

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum JoseError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Malformed key: {0}")]
    MalformedKey(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Algorithm {alg} requires {expected} key, got {actual} key")]
    AlgorithmMismatch {
        alg: String,
        expected: String,
        actual: String,
    },

    #[error("Signature mismatch")]
    SignatureMismatch,

    #[error("Key unwrap failed")]
    KeyUnwrapFailed,

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Padding error")]
    PaddingError,

    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Invalid claims: {0}")]
    InvalidClaims(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl JoseError {
    /// Create an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        JoseError::InvalidParameter(msg.into())
    }

    /// Create a malformed key error.
    #[must_use]
    pub fn malformed_key(msg: impl Into<String>) -> Self {
        JoseError::MalformedKey(msg.into())
    }

    /// Create an unsupported operation error.
    #[must_use]
    pub fn unsupported_operation(msg: impl Into<String>) -> Self {
        JoseError::UnsupportedOperation(msg.into())
    }

    /// Create an unsupported algorithm error.
    #[must_use]
    pub fn unsupported_algorithm(alg: impl Into<String>) -> Self {
        JoseError::UnsupportedAlgorithm(alg.into())
    }

    /// Create an algorithm/key kind mismatch error.
    #[must_use]
    pub fn algorithm_mismatch(
        alg: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        JoseError::AlgorithmMismatch {
            alg: alg.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a malformed token error.
    #[must_use]
    pub fn malformed_token(msg: impl Into<String>) -> Self {
        JoseError::MalformedToken(msg.into())
    }

    /// Create an invalid claims error.
    #[must_use]
    pub fn invalid_claims(msg: impl Into<String>) -> Self {
        JoseError::InvalidClaims(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        JoseError::ConfigError(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        JoseError::Internal(msg.into())
    }

    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameter(_) => JOSE_INVALID_PARAMETER,
            Self::MalformedKey(_) => JOSE_MALFORMED_KEY,
            Self::UnsupportedOperation(_) => JOSE_UNSUPPORTED_OPERATION,
            Self::UnsupportedAlgorithm(_) => JOSE_UNSUPPORTED_ALGORITHM,
            Self::AlgorithmMismatch { .. } => JOSE_ALGORITHM_MISMATCH,
            Self::SignatureMismatch => JOSE_SIGNATURE_MISMATCH,
            Self::KeyUnwrapFailed => JOSE_KEY_UNWRAP_FAILED,
            Self::AuthenticationFailed => JOSE_AUTHENTICATION_FAILED,
            Self::PaddingError => JOSE_PADDING_ERROR,
            Self::DecryptionFailed => JOSE_DECRYPTION_FAILED,
            Self::MalformedToken(_) => JOSE_MALFORMED_TOKEN,
            Self::InvalidClaims(_) => JOSE_INVALID_CLAIMS,
            Self::ConfigError(_) => JOSE_CONFIG_ERROR,
            Self::Internal(_) => JOSE_INTERNAL,
        }
    }

    /// Check if this error is a cryptographic verification failure.
    #[must_use]
    pub const fn is_crypto_failure(&self) -> bool {
        matches!(
            self,
            Self::SignatureMismatch
                | Self::KeyUnwrapFailed
                | Self::AuthenticationFailed
                | Self::PaddingError
                | Self::DecryptionFailed
        )
    }

    /// Collapse decryption-path failures into a single generic error.
    ///
    /// Other kinds pass through unchanged.
    #[must_use]
    pub fn into_opaque(self) -> Self {
        match self {
            Self::KeyUnwrapFailed | Self::AuthenticationFailed | Self::PaddingError => {
                Self::DecryptionFailed
            }
            other => other,
        }
    }
}

// Error codes
pub const JOSE_INVALID_PARAMETER: &str = "JOSE_INVALID_PARAMETER";
pub const JOSE_MALFORMED_KEY: &str = "JOSE_MALFORMED_KEY";
pub const JOSE_UNSUPPORTED_OPERATION: &str = "JOSE_UNSUPPORTED_OPERATION";
pub const JOSE_UNSUPPORTED_ALGORITHM: &str = "JOSE_UNSUPPORTED_ALGORITHM";
pub const JOSE_ALGORITHM_MISMATCH: &str = "JOSE_ALGORITHM_MISMATCH";
pub const JOSE_SIGNATURE_MISMATCH: &str = "JOSE_SIGNATURE_MISMATCH";
pub const JOSE_KEY_UNWRAP_FAILED: &str = "JOSE_KEY_UNWRAP_FAILED";
pub const JOSE_AUTHENTICATION_FAILED: &str = "JOSE_AUTHENTICATION_FAILED";
pub const JOSE_PADDING_ERROR: &str = "JOSE_PADDING_ERROR";
pub const JOSE_DECRYPTION_FAILED: &str = "JOSE_DECRYPTION_FAILED";
pub const JOSE_MALFORMED_TOKEN: &str = "JOSE_MALFORMED_TOKEN";
pub const JOSE_INVALID_CLAIMS: &str = "JOSE_INVALID_CLAIMS";
pub const JOSE_CONFIG_ERROR: &str = "JOSE_CONFIG_ERROR";
pub const JOSE_INTERNAL: &str = "JOSE_INTERNAL";
