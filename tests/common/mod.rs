//! Shared fixtures for integration tests.
//!
//! RSA generation is slow, so key pairs are generated once per test binary.

#![allow(dead_code)]

use jose_engine::codec::{b64url_decode, b64url_encode};
use jose_engine::{Key, KeyKind};
use once_cell::sync::Lazy;

pub static RSA_KEY: Lazy<Key> =
    Lazy::new(|| Key::generate(KeyKind::Rsa { bits: 2048 }).expect("RSA key generation"));

pub static OTHER_RSA_KEY: Lazy<Key> =
    Lazy::new(|| Key::generate(KeyKind::Rsa { bits: 2048 }).expect("RSA key generation"));

pub fn symmetric_key(bits: usize) -> Key {
    Key::generate(KeyKind::Symmetric { bits }).expect("symmetric key generation")
}

/// Flip one bit of the `segment`-th base64url segment of a compact token.
pub fn flip_bit(compact: &str, segment: usize, bit: usize) -> String {
    let mut segments: Vec<String> = compact.split('.').map(str::to_string).collect();
    let mut bytes = b64url_decode(&segments[segment]).expect("valid segment");
    let len = bytes.len();
    bytes[(bit / 8) % len] ^= 1 << (bit % 8);
    segments[segment] = b64url_encode(&bytes);
    segments.join(".")
}
