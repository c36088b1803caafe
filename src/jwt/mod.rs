//! JSON Web Tokens (RFC 7519) on top of the JWS and JWE engines.

pub mod builder;
pub mod claims;

pub use builder::JwtBuilder;
pub use claims::{Audience, Claims, RESERVED_CLAIMS};

use crate::error::JoseError;
use crate::header::Header;
use crate::jwa::{ContentEncryptionAlgorithm, JwsAlgorithm, KeyManagementAlgorithm};
use crate::jwe::JweEngine;
use crate::jwk::Key;
use crate::jws::JwsEngine;
use crate::serialization::{self, Serialization, Token};
use std::time::Duration;
use tracing::{debug, instrument};

/// Whether a compact JWT is signed or encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtKind {
    Signed,
    Encrypted,
}

impl JwtKind {
    /// Classify a compact token by its segment count.
    pub fn of(token: &str) -> Result<Self, JoseError> {
        match token.matches('.').count() {
            2 => Ok(JwtKind::Signed),
            4 => Ok(JwtKind::Encrypted),
            _ => Err(JoseError::malformed_token(
                "unable to parse JWT as JWS or JWE",
            )),
        }
    }
}

/// Claim checks applied after a JWT's signature or tag has been verified.
#[derive(Debug, Clone)]
pub struct Validation {
    /// Allowed clock skew
    pub leeway: Duration,
    /// Reject tokens past `exp`
    pub validate_exp: bool,
    /// Reject tokens before `nbf`
    pub validate_nbf: bool,
    /// Required `iss`
    pub issuer: Option<String>,
    /// Audience that must appear in `aud`
    pub audience: Option<String>,
}

impl Default for Validation {
    fn default() -> Self {
        Self {
            leeway: Duration::from_secs(60),
            validate_exp: true,
            validate_nbf: true,
            issuer: None,
            audience: None,
        }
    }
}

impl Validation {
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Skip time-based checks.
    #[must_use]
    pub fn without_time_checks(mut self) -> Self {
        self.validate_exp = false;
        self.validate_nbf = false;
        self
    }

    /// Check `claims` against the current time.
    pub fn validate(&self, claims: &Claims) -> Result<(), JoseError> {
        self.validate_at(claims, chrono::Utc::now().timestamp())
    }

    /// Check `claims` at the given Unix time.
    ///
    /// # Errors
    ///
    /// `InvalidClaims` naming the first failing check.
    pub fn validate_at(&self, claims: &Claims, now: i64) -> Result<(), JoseError> {
        let leeway = i64::try_from(self.leeway.as_secs()).unwrap_or(i64::MAX);

        if self.validate_exp && claims.is_expired_at(now.saturating_sub(leeway)) {
            return Err(JoseError::invalid_claims("token has expired"));
        }
        if self.validate_nbf {
            if let Some(nbf) = claims.nbf {
                if now.saturating_add(leeway) < nbf {
                    return Err(JoseError::invalid_claims("token is not yet valid"));
                }
            }
        }
        if let Some(issuer) = &self.issuer {
            if claims.iss.as_deref() != Some(issuer.as_str()) {
                return Err(JoseError::invalid_claims("issuer mismatch"));
            }
        }
        if let Some(audience) = &self.audience {
            if !claims.aud.as_ref().is_some_and(|aud| aud.contains(audience)) {
                return Err(JoseError::invalid_claims("audience mismatch"));
            }
        }
        Ok(())
    }
}

/// Sign, encrypt, verify and decrypt compact JWTs.
pub struct Jwt;

impl Jwt {
    fn header_for(key: &Key, header: Header) -> Header {
        let header = header.with_typ("JWT");
        match key.kid() {
            Some(kid) => header.with_kid(kid),
            None => header,
        }
    }

    /// Sign claims as a compact JWS with `typ: JWT`.
    #[instrument(skip_all, fields(alg = %alg))]
    pub fn sign(claims: &Claims, key: &Key, alg: JwsAlgorithm) -> Result<String, JoseError> {
        let header = Self::header_for(key, Header::jws(alg));
        let token = JwsEngine::sign(&claims.to_json()?, key, header)?;
        serialization::serialize_jws(&token, Serialization::Compact)
    }

    /// Encrypt claims as a compact JWE with `typ: JWT`.
    #[instrument(skip_all, fields(alg = %alg, enc = %enc))]
    pub fn encrypt(
        claims: &Claims,
        key: &Key,
        alg: KeyManagementAlgorithm,
        enc: ContentEncryptionAlgorithm,
    ) -> Result<String, JoseError> {
        let header = Self::header_for(key, Header::jwe(alg, enc));
        let token = JweEngine::encrypt(&claims.to_json()?, key, header)?;
        serialization::serialize_jwe(&token, Serialization::Compact)
    }

    /// Verify a signed JWT and validate its claims.
    #[instrument(skip_all)]
    pub fn verify(token: &str, key: &Key, validation: &Validation) -> Result<Claims, JoseError> {
        if JwtKind::of(token)? != JwtKind::Signed {
            return Err(JoseError::malformed_token("expected a signed JWT"));
        }
        let Token::Signed(jws) = serialization::deserialize(token)? else {
            return Err(JoseError::malformed_token("expected a signed JWT"));
        };
        let payload = JwsEngine::verify(&jws, key)?;
        let claims = Claims::from_json(&payload)?;
        validation.validate(&claims)?;
        debug!(sub = claims.sub.as_deref().unwrap_or_default(), "JWT accepted");
        Ok(claims)
    }

    /// Decrypt an encrypted JWT and validate its claims.
    ///
    /// Decryption failures are reported as `DecryptionFailed`.
    #[instrument(skip_all)]
    pub fn decrypt(token: &str, key: &Key, validation: &Validation) -> Result<Claims, JoseError> {
        if JwtKind::of(token)? != JwtKind::Encrypted {
            return Err(JoseError::malformed_token("expected an encrypted JWT"));
        }
        let Token::Encrypted(jwe) = serialization::deserialize(token)? else {
            return Err(JoseError::malformed_token("expected an encrypted JWT"));
        };
        let payload = JweEngine::decrypt(&jwe, key).map_err(JoseError::into_opaque)?;
        let claims = Claims::from_json(&payload)?;
        validation.validate(&claims)?;
        debug!(sub = claims.sub.as_deref().unwrap_or_default(), "JWT accepted");
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwk::KeyKind;

    fn claims() -> Claims {
        JwtBuilder::new("issuer")
            .subject("user-123")
            .audience(vec!["api".to_string()])
            .build()
            .unwrap()
    }

    #[test]
    fn test_kind_detection() {
        assert_eq!(JwtKind::of("a.b.c").unwrap(), JwtKind::Signed);
        assert_eq!(JwtKind::of("a.b.c.d.e").unwrap(), JwtKind::Encrypted);
        assert!(JwtKind::of("a.b").is_err());
    }

    #[test]
    fn test_sign_verify() {
        let key = Key::generate(KeyKind::Symmetric { bits: 256 })
            .unwrap()
            .with_kid("hmac-1");
        let token = Jwt::sign(&claims(), &key, JwsAlgorithm::HS256).unwrap();

        let Token::Signed(jws) = serialization::deserialize(&token).unwrap() else {
            panic!("expected JWS");
        };
        assert_eq!(jws.header().typ(), Some("JWT"));
        assert_eq!(jws.header().kid(), Some("hmac-1"));

        let validation = Validation::default()
            .with_issuer("issuer")
            .with_audience("api");
        let verified = Jwt::verify(&token, &key, &validation).unwrap();
        assert_eq!(verified.sub.as_deref(), Some("user-123"));
        assert!(verified.jti.is_some());
    }

    #[test]
    fn test_encrypt_decrypt_direct() {
        let key = Key::generate(KeyKind::Symmetric { bits: 512 }).unwrap();
        let token = Jwt::encrypt(
            &claims(),
            &key,
            KeyManagementAlgorithm::Direct,
            ContentEncryptionAlgorithm::A256CbcHs512,
        )
        .unwrap();
        let decrypted = Jwt::decrypt(&token, &key, &Validation::default()).unwrap();
        assert_eq!(decrypted.iss.as_deref(), Some("issuer"));

        let other = Key::generate(KeyKind::Symmetric { bits: 512 }).unwrap();
        assert!(matches!(
            Jwt::decrypt(&token, &other, &Validation::default()),
            Err(JoseError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let key = Key::generate(KeyKind::Symmetric { bits: 256 }).unwrap();
        let token = Jwt::sign(&claims(), &key, JwsAlgorithm::HS256).unwrap();
        assert!(matches!(
            Jwt::decrypt(&token, &key, &Validation::default()),
            Err(JoseError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_validation_rules() {
        let validation = Validation::default().with_leeway(Duration::from_secs(10));
        let expired = Claims::default().with_expiration(1_000);
        assert!(validation.validate_at(&expired, 1_005).is_ok());
        assert!(matches!(
            validation.validate_at(&expired, 1_011),
            Err(JoseError::InvalidClaims(_))
        ));

        let future = Claims::default().with_not_before(2_000);
        assert!(validation.validate_at(&future, 1_995).is_ok());
        assert!(validation.validate_at(&future, 1_980).is_err());
        assert!(Validation::default()
            .without_time_checks()
            .validate_at(&future, 0)
            .is_ok());

        let issued = Claims::default().with_issuer("a").with_audience("x");
        assert!(Validation::default().with_issuer("b").validate_at(&issued, 0).is_err());
        assert!(Validation::default().with_audience("y").validate_at(&issued, 0).is_err());
        assert!(Validation::default()
            .with_issuer("a")
            .with_audience("x")
            .validate_at(&issued, 0)
            .is_ok());
    }
}
