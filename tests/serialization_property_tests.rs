//! Property-based tests for the serialization layer.
//!
//! Property 9: Form Round-Trip
//! Property 10: Structural Rejection of Malformed Input

use jose_engine::serialization::{self, Serialization, Token};
use jose_engine::{
    ContentEncryptionAlgorithm, Header, JoseError, JweEngine, JwsAlgorithm, JwsEngine, Key,
    KeyManagementAlgorithm,
};
use proptest::prelude::*;
use serde_json::json;

fn arb_form() -> impl Strategy<Value = Serialization> {
    prop_oneof![
        Just(Serialization::Compact),
        Just(Serialization::General),
        Just(Serialization::Flattened),
    ]
}

fn arb_kid() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9-]{1,32}"
}

fn hs_key() -> Key {
    Key::symmetric(vec![0x42; 32]).unwrap()
}

fn dir_key() -> Key {
    Key::symmetric(vec![0x24; 32]).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 9: any form parses back to the same JWS and still verifies.
    #[test]
    fn prop_jws_form_round_trip(
        payload in prop::collection::vec(any::<u8>(), 0..256),
        kid in arb_kid(),
        form in arb_form(),
    ) {
        let key = hs_key();
        let token = JwsEngine::sign(&payload, &key, Header::jws(JwsAlgorithm::HS256).with_kid(kid.clone())).unwrap();
        let serialized = token.serialize(form).unwrap();

        let Token::Signed(parsed) = serialization::deserialize(&serialized).unwrap() else {
            panic!("expected JWS");
        };
        prop_assert_eq!(parsed.header().kid(), Some(kid.as_str()));
        prop_assert_eq!(JwsEngine::verify(&parsed, &key).unwrap(), payload);
    }

    /// Property 9: any form parses back to the same JWE and still decrypts.
    #[test]
    fn prop_jwe_form_round_trip(
        payload in prop::collection::vec(any::<u8>(), 0..256),
        form in arb_form(),
    ) {
        let key = dir_key();
        let header = Header::jwe(KeyManagementAlgorithm::Direct, ContentEncryptionAlgorithm::A128CbcHs256);
        let token = JweEngine::encrypt(&payload, &key, header).unwrap();
        let serialized = token.serialize(form).unwrap();

        let parsed = serialization::deserialize(&serialized).unwrap();
        prop_assert_eq!(&parsed, &Token::Encrypted(token));
        let Token::Encrypted(parsed) = parsed else {
            panic!("expected JWE");
        };
        prop_assert_eq!(JweEngine::decrypt(&parsed, &key).unwrap(), payload);
    }

    /// Property 10: compact input with a segment count other than 3 or 5 is
    /// rejected.
    #[test]
    fn prop_wrong_segment_count_rejected(count in 1usize..8) {
        prop_assume!(count != 3 && count != 5);
        let input = vec!["e30"; count].join(".");
        prop_assert!(matches!(
            serialization::deserialize(&input),
            Err(JoseError::MalformedToken(_))
        ));
    }

    /// Property 10: segments outside the base64url alphabet are rejected.
    #[test]
    fn prop_invalid_base64_rejected(garbage in "[+/=]{1,8}") {
        let input = format!("{}.e30.e30", garbage);
        prop_assert!(matches!(
            serialization::deserialize(&input),
            Err(JoseError::MalformedToken(_))
        ));
    }
}

#[test]
fn test_protected_header_must_be_object() {
    let header = jose_engine::codec::b64url_encode(b"[1,2,3]");
    let input = format!("{}.e30.AAAA", header);
    assert!(matches!(
        serialization::deserialize(&input),
        Err(JoseError::MalformedToken(_))
    ));
}

#[test]
fn test_unprotected_header_survives_json_but_not_compact() {
    let key = hs_key();
    let token = JwsEngine::sign(b"payload", &key, Header::jws(JwsAlgorithm::HS256))
        .unwrap()
        .with_unprotected_header(Header::new().with_kid("outer"))
        .unwrap();

    assert!(matches!(
        token.serialize(Serialization::Compact),
        Err(JoseError::UnsupportedOperation(_))
    ));

    let json = token.serialize(Serialization::General).unwrap();
    let Token::Signed(parsed) = serialization::deserialize(&json).unwrap() else {
        panic!("expected JWS");
    };
    assert_eq!(
        parsed.unprotected_header().and_then(|h| h.kid()),
        Some("outer")
    );
    assert_eq!(JwsEngine::verify(&parsed, &key).unwrap(), b"payload");
}

#[test]
fn test_header_names_must_be_disjoint() {
    let token = JwsEngine::sign(
        b"payload",
        &hs_key(),
        Header::jws(JwsAlgorithm::HS256).with_kid("inner"),
    )
    .unwrap();
    assert!(token
        .with_unprotected_header(Header::new().with_kid("outer"))
        .is_err());
}

#[test]
fn test_multiple_signatures_rejected() {
    let token = JwsEngine::sign(b"payload", &hs_key(), Header::jws(JwsAlgorithm::HS256)).unwrap();
    let json = token.serialize(Serialization::General).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let signature = value["signatures"][0].clone();
    value["signatures"] = json!([signature.clone(), signature]);

    assert!(matches!(
        serialization::deserialize(&value.to_string()),
        Err(JoseError::MalformedToken(_))
    ));
}

#[test]
fn test_whitespace_around_input_is_ignored() {
    let token = JwsEngine::sign(b"payload", &hs_key(), Header::jws(JwsAlgorithm::HS256)).unwrap();
    let flattened = token.serialize(Serialization::Flattened).unwrap();
    assert!(serialization::deserialize(&format!("\n  {}\n", flattened)).is_ok());
}
