//! Property-based tests for the key model.
//!
//! Property 7: Thumbprint Determinism
//! Property 8: Public Export Never Leaks Private Members

mod common;

use common::{OTHER_RSA_KEY, RSA_KEY};
use jose_engine::{JoseError, Key, KeyKind, KeyThumbprint, KeyUse};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

const PRIVATE_MEMBERS: [&str; 7] = ["d", "p", "q", "dp", "dq", "qi", "k"];

fn as_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 7: the thumbprint of a shared secret survives a private
    /// export/import cycle and ignores optional members.
    #[test]
    fn prop_symmetric_thumbprint_stable(secret in prop::collection::vec(any::<u8>(), 1..128), kid in "[a-z0-9-]{1,16}") {
        let key = Key::symmetric(secret).unwrap();
        let labeled = key.clone().with_kid(kid).with_use(KeyUse::Signature);

        let reimported = Key::import(&labeled.export_private().unwrap()).unwrap();
        prop_assert_eq!(reimported.thumbprint(), key.thumbprint());
        prop_assert!(KeyThumbprint::verify(&reimported, &key.thumbprint()));
    }

    /// Property 7: distinct secrets have distinct thumbprints.
    #[test]
    fn prop_symmetric_thumbprints_differ(
        a in prop::collection::vec(any::<u8>(), 16..64),
        b in prop::collection::vec(any::<u8>(), 16..64),
    ) {
        prop_assume!(a != b);
        let ka = Key::symmetric(a).unwrap();
        let kb = Key::symmetric(b).unwrap();
        prop_assert_ne!(ka.thumbprint(), kb.thumbprint());
    }

    /// Unknown key types are rejected as malformed.
    #[test]
    fn prop_unknown_kty_rejected(kty in "[A-Z]{2,4}") {
        prop_assume!(kty != "RSA");
        let jwk = as_object(json!({ "kty": kty, "k": "AAAA" }));
        prop_assert!(matches!(Key::import(&jwk), Err(JoseError::MalformedKey(_))));
    }
}

#[test]
fn test_rsa_thumbprint_survives_public_export() {
    let exported = RSA_KEY.export_public().unwrap();
    let imported = Key::import(&exported).unwrap();

    assert!(!imported.has_private());
    assert_eq!(imported.thumbprint(), RSA_KEY.thumbprint());
    assert_ne!(imported.thumbprint(), OTHER_RSA_KEY.thumbprint());
}

#[test]
fn test_public_export_has_no_private_members() {
    let exported = RSA_KEY.export_public().unwrap();
    assert_eq!(exported.get("kty"), Some(&Value::from("RSA")));
    assert!(exported.contains_key("n"));
    assert!(exported.contains_key("e"));
    for member in PRIVATE_MEMBERS {
        assert!(!exported.contains_key(member), "leaked '{}'", member);
    }
}

#[test]
fn test_rsa_private_export_round_trip() {
    let exported = RSA_KEY.export_private().unwrap();
    for member in ["d", "p", "q", "dp", "dq", "qi"] {
        assert!(exported.contains_key(member), "missing '{}'", member);
    }

    let imported = Key::import(&exported).unwrap();
    assert!(imported.has_private());
    assert_eq!(imported.bits(), 2048);
    assert_eq!(imported.thumbprint(), RSA_KEY.thumbprint());
}

#[test]
fn test_mismatched_crt_parameter_is_malformed() {
    let mut exported = RSA_KEY.export_private().unwrap();
    let other = OTHER_RSA_KEY.export_private().unwrap();
    exported.insert("dp".to_string(), other["dp"].clone());

    assert!(matches!(
        Key::import(&exported),
        Err(JoseError::MalformedKey(_))
    ));
}

#[test]
fn test_private_members_without_d_are_malformed() {
    let mut exported = RSA_KEY.export_private().unwrap();
    exported.remove("d");
    assert!(matches!(
        Key::import(&exported),
        Err(JoseError::MalformedKey(_))
    ));
}

#[test]
fn test_symmetric_key_has_no_public_export() {
    let key = Key::generate(KeyKind::Symmetric { bits: 256 }).unwrap();
    assert!(matches!(
        key.export_public(),
        Err(JoseError::UnsupportedOperation(_))
    ));
}

#[test]
fn test_generate_rejects_bad_sizes() {
    assert!(matches!(
        Key::generate(KeyKind::Symmetric { bits: 0 }),
        Err(JoseError::InvalidParameter(_))
    ));
    assert!(matches!(
        Key::generate(KeyKind::Symmetric { bits: 12 }),
        Err(JoseError::InvalidParameter(_))
    ));
    assert!(matches!(
        Key::generate(KeyKind::Rsa { bits: 1024 }),
        Err(JoseError::InvalidParameter(_))
    ));
}

#[test]
fn test_key_params_round_trip_through_jwk() {
    let key = RSA_KEY
        .to_public()
        .unwrap()
        .with_kid("enc-1")
        .with_use(KeyUse::Encryption)
        .with_alg("RSA-OAEP-256");
    let exported = key.export_public().unwrap();
    assert_eq!(exported.get("use"), Some(&Value::from("enc")));
    assert_eq!(exported.get("kid"), Some(&Value::from("enc-1")));

    let imported = Key::import(&exported).unwrap();
    assert_eq!(imported.kid(), Some("enc-1"));
    assert_eq!(imported.params().key_use, Some(KeyUse::Encryption));
    assert_eq!(imported.params().alg.as_deref(), Some("RSA-OAEP-256"));
}
