//! Key model: symmetric and RSA keys, JWK import/export and RFC 7638
//! thumbprints.

mod document;
mod key;
mod thumbprint;

pub use document::Jwk;
pub use key::{
    Key, KeyKind, KeyOperation, KeyParams, KeyUse, RsaKey, SymmetricKey, MIN_RSA_BITS,
    SUPPORTED_RSA_BITS,
};
pub use thumbprint::KeyThumbprint;
