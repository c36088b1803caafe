//! JOSE engine.
//!
//! Provides JSON Web Keys with RFC 7638 thumbprints, JWS signing with HMAC
//! and RSA PKCS#1 v1.5, JWE encryption with RSA-OAEP, AES Key Wrap or
//! direct keys and
//! AES-CBC-HMAC-SHA2 / AES-GCM content encryption, compact and JSON
//! serializations, JWT claims, and nested sign-then-encrypt.

#![forbid(unsafe_code)]

pub mod codec;
pub mod config;
pub mod error;
pub mod header;
pub mod jwa;
pub mod jwe;
pub mod jwk;
pub mod jws;
pub mod jwt;
pub mod nested;
pub mod serialization;
pub mod telemetry;

// Re-exports for convenience
pub use config::{Config, Profile};
pub use error::JoseError;
pub use header::Header;
pub use jwa::{ContentEncryptionAlgorithm, JwsAlgorithm, KeyManagementAlgorithm};
pub use jwe::{JweEngine, JweToken};
pub use jwk::{Jwk, Key, KeyKind, KeyOperation, KeyThumbprint, KeyUse};
pub use jws::{JwsEngine, JwsToken};
pub use jwt::{Claims, Jwt, JwtBuilder, Validation};
pub use nested::SignAndEncrypt;
pub use serialization::{Serialization, Token};
