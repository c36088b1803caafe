//! JWK Thumbprint calculation per RFC 7638.
//!
//! Uses constant-time comparison for verification.

use crate::codec::{b64url_encode, canonical_json};
use crate::jwk::key::Key;
use crate::jwk::Jwk;
use rsa::traits::PublicKeyParts;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use subtle::ConstantTimeEq;

/// Calculates the JWK thumbprint per RFC 7638.
pub struct KeyThumbprint;

impl KeyThumbprint {
    /// Computes the SHA-256 thumbprint of a key.
    ///
    /// Only the required members take part, so `kid`, `use` and private
    /// members never change the result.
    #[must_use]
    pub fn compute(key: &Key) -> String {
        let canonical = Self::canonical_json(key);
        b64url_encode(Sha256::digest(canonical.as_bytes()))
    }

    /// Computes the thumbprint of a JWK document without importing it.
    ///
    /// Returns `None` when a required member is missing or `kty` is unknown.
    #[must_use]
    pub fn compute_jwk(jwk: &Jwk) -> Option<String> {
        let mut members = BTreeMap::new();
        match jwk.kty.as_str() {
            "oct" => {
                members.insert("k", jwk.k.as_deref()?);
            }
            "RSA" => {
                members.insert("e", jwk.e.as_deref()?);
                members.insert("n", jwk.n.as_deref()?);
            }
            _ => return None,
        }
        members.insert("kty", jwk.kty.as_str());
        Some(b64url_encode(Sha256::digest(canonical_json(&members).as_bytes())))
    }

    /// Canonical JSON over the required members in lexicographic order.
    fn canonical_json(key: &Key) -> String {
        match key {
            // k, kty
            Key::Symmetric(sym) => {
                let k = b64url_encode(sym.secret());
                let mut members = BTreeMap::new();
                members.insert("k", k.as_str());
                members.insert("kty", "oct");
                canonical_json(&members)
            }
            // e, kty, n
            Key::Rsa(rsa) => {
                let e = b64url_encode(rsa.public_key().e().to_bytes_be());
                let n = b64url_encode(rsa.public_key().n().to_bytes_be());
                let mut members = BTreeMap::new();
                members.insert("e", e.as_str());
                members.insert("kty", "RSA");
                members.insert("n", n.as_str());
                canonical_json(&members)
            }
        }
    }

    /// Verifies that a thumbprint matches a key using constant-time comparison.
    #[must_use]
    pub fn verify(key: &Key, expected_thumbprint: &str) -> bool {
        let computed = Self::compute(key);
        let computed_bytes = computed.as_bytes();
        let expected_bytes = expected_thumbprint.as_bytes();

        // Length is not secret
        if computed_bytes.len() != expected_bytes.len() {
            return false;
        }

        computed_bytes.ct_eq(expected_bytes).into()
    }
}

impl Key {
    /// RFC 7638 SHA-256 thumbprint.
    #[must_use]
    pub fn thumbprint(&self) -> String {
        KeyThumbprint::compute(self)
    }
}
