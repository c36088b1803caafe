use anyhow::{bail, Context};
use jose_engine::jwe::{self, JweEngine};
use jose_engine::jws;
use jose_engine::telemetry::{init_tracing, TracingConfig};
use jose_engine::{
    Config, Header, JwsAlgorithm, Jwt, JwtBuilder, Key, KeyKind, KeyUse, Serialization,
    SignAndEncrypt, Validation,
};
use serde_json::json;
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;
    init_tracing(&TracingConfig::from_config(&config).with_service_name("jose-demo"))
        .context("initializing tracing")?;

    info!("Starting JOSE demo");

    signed_message(&config)?;
    encrypted_message(&config)?;
    signed_jwt(&config)?;
    sign_and_encrypt(&config)?;

    info!("JOSE demo finished");
    Ok(())
}

/// HS256 over a shared secret in compact form.
fn signed_message(config: &Config) -> anyhow::Result<()> {
    let key = Key::generate(KeyKind::Symmetric {
        bits: config.symmetric_key_bits,
    })
    .context("generating shared secret")?
    .with_kid("demo-hmac");

    let alg = config.profile.signing_algorithm(true);
    let payload = b"Demo Integrity protected message";
    let compact = jws::sign_compact(payload, &key, Header::jws(alg).with_kid("demo-hmac"))
        .context("signing message")?;
    info!(token = %compact, "signed message");

    let verified = jws::verify_serialized(&compact, &key).context("verifying message")?;
    if verified != payload {
        bail!("verified payload differs from the signed one");
    }

    let mut tampered = compact.clone();
    tampered.push('A');
    match jws::verify_serialized(&tampered, &key) {
        Ok(_) => bail!("tampered signature verified"),
        Err(e) => info!(code = e.code(), "tampered signature rejected"),
    }
    Ok(())
}

/// RSA-OAEP with the profile's key management and content encryption.
fn encrypted_message(config: &Config) -> anyhow::Result<()> {
    let recipient = Key::generate(KeyKind::Rsa {
        bits: config.rsa_key_bits,
    })
    .context("generating RSA key")?
    .with_kid("demo-rsa")
    .with_use(KeyUse::Encryption);

    let public = recipient.to_public()?;
    let jwk = serde_json::to_string(&public.export_public()?)?;
    info!(jwk = %jwk, thumbprint = %recipient.thumbprint(), "recipient public key");

    let header = Header::jwe(config.profile.key_management, config.profile.content_encryption)
        .with_kid("demo-rsa");
    let token = JweEngine::encrypt(b"Demo Encrypted message", &public, header)
        .context("encrypting message")?;
    let general = token.serialize(Serialization::General)?;
    info!(token = %general, "encrypted message");

    let plaintext = jwe::decrypt_serialized(&general, &recipient).context("decrypting message")?;
    info!(plaintext = %String::from_utf8_lossy(&plaintext), "decrypted message");

    let stranger = Key::generate(KeyKind::Rsa {
        bits: config.rsa_key_bits,
    })?;
    match jwe::decrypt_serialized(&general, &stranger) {
        Ok(_) => bail!("decryption with an unrelated key succeeded"),
        Err(e) => warn!(code = e.code(), "decryption with an unrelated key rejected"),
    }
    Ok(())
}

fn signed_jwt(config: &Config) -> anyhow::Result<()> {
    let key = Key::generate(KeyKind::Rsa {
        bits: config.rsa_key_bits,
    })?
    .with_kid("demo-jwt");

    let claims = JwtBuilder::new("jose-demo")
        .subject("user-123")
        .audience(vec!["demo-api".to_string()])
        .custom_claim("scope", json!("read"))
        .build()?;
    let token = Jwt::sign(&claims, &key, JwsAlgorithm::RS256).context("signing JWT")?;
    info!(token = %token, "signed JWT");

    let validation = Validation::default()
        .with_leeway(config.clock_leeway)
        .with_issuer("jose-demo")
        .with_audience("demo-api");
    let verified = Jwt::verify(&token, &key.to_public()?, &validation).context("verifying JWT")?;
    info!(sub = verified.sub.as_deref().unwrap_or_default(), "JWT verified");
    Ok(())
}

/// Nested JWS-in-JWE between two parties, with shared and RSA recipient keys.
fn sign_and_encrypt(config: &Config) -> anyhow::Result<()> {
    let facade = SignAndEncrypt::new(config.profile);
    let message = json!({ "order": 42, "items": ["widget", "gadget"] });

    let sender = Key::generate(KeyKind::Symmetric {
        bits: config.symmetric_key_bits,
    })?;
    // A256KW
    let recipient = Key::generate(KeyKind::Symmetric { bits: 256 })?;
    let written = facade
        .write(&message, &sender, &recipient, "alice")
        .context("writing nested message with shared keys")?;
    let read: serde_json::Value = facade.read(&written, &recipient, &sender)?;
    info!(message = %read, "nested message read with shared keys");

    let sender = Key::generate(KeyKind::Rsa {
        bits: config.rsa_key_bits,
    })?;
    let recipient = Key::generate(KeyKind::Rsa {
        bits: config.rsa_key_bits,
    })?;
    let written = facade
        .write(&message, &sender, &recipient.to_public()?, "alice")
        .context("writing nested message with RSA keys")?;
    info!(token = %written, "nested message");
    let read: serde_json::Value = facade.read(&written, &recipient, &sender.to_public()?)?;
    info!(message = %read, "nested message read with RSA keys");
    Ok(())
}
