use crate::error::JoseError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Registered claim names; custom claims may not use them.
pub const RESERVED_CLAIMS: [&str; 7] = ["iss", "sub", "aud", "exp", "nbf", "iat", "jti"];

/// `aud`: one recipient or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    #[must_use]
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == audience,
            Audience::Multiple(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

impl From<&str> for Audience {
    fn from(aud: &str) -> Self {
        Audience::Single(aud.to_string())
    }
}

impl From<String> for Audience {
    fn from(aud: String) -> Self {
        Audience::Single(aud)
    }
}

impl From<Vec<String>> for Audience {
    fn from(auds: Vec<String>) -> Self {
        Audience::Multiple(auds)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    // Registered claims
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    // Custom claims
    #[serde(flatten)]
    custom: Map<String, Value>,
}

impl Claims {
    /// Claims issued now: `iat` and `nbf` set to the current time and a
    /// random `jti`.
    #[must_use]
    pub fn new() -> Self {
        let now = chrono::Utc::now().timestamp();
        Claims {
            iat: Some(now),
            nbf: Some(now),
            jti: Some(uuid::Uuid::new_v4().to_string()),
            ..Claims::default()
        }
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.sub = Some(subject.into());
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<Audience>) -> Self {
        self.aud = Some(audience.into());
        self
    }

    #[must_use]
    pub fn with_expiration(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Expire `ttl_seconds` after `iat` (or now, without `iat`).
    #[must_use]
    pub fn with_ttl(mut self, ttl_seconds: i64) -> Self {
        let base = self.iat.unwrap_or_else(|| chrono::Utc::now().timestamp());
        self.exp = Some(base + ttl_seconds);
        self
    }

    #[must_use]
    pub fn with_not_before(mut self, nbf: i64) -> Self {
        self.nbf = Some(nbf);
        self
    }

    #[must_use]
    pub fn with_issued_at(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    #[must_use]
    pub fn with_jwt_id(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }

    /// Add a custom claim.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for a registered claim name or a value that cannot
    /// be represented as JSON.
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Serialize) -> Result<Self, JoseError> {
        let name = name.into();
        if RESERVED_CLAIMS.contains(&name.as_str()) {
            return Err(JoseError::invalid_parameter(format!(
                "cannot use reserved claim name '{}'",
                name
            )));
        }
        let value = serde_json::to_value(value)
            .map_err(|e| JoseError::invalid_parameter(format!("claim '{}': {}", name, e)))?;
        self.custom.insert(name, value);
        Ok(self)
    }

    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.custom.get(name)
    }

    /// Custom claims in insertion order.
    #[must_use]
    pub fn custom_claims(&self) -> &Map<String, Value> {
        &self.custom
    }

    #[must_use]
    pub fn is_expired_at(&self, timestamp: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= timestamp)
    }

    #[must_use]
    pub fn is_valid_at(&self, timestamp: i64) -> bool {
        if let Some(nbf) = self.nbf {
            if timestamp < nbf {
                return false;
            }
        }
        !self.is_expired_at(timestamp)
    }

    pub(crate) fn to_json(&self) -> Result<Vec<u8>, JoseError> {
        crate::codec::json_encode(self)
    }

    pub(crate) fn from_json(bytes: &[u8]) -> Result<Self, JoseError> {
        serde_json::from_slice(bytes)
            .map_err(|e| JoseError::invalid_claims(format!("claims are not a valid JSON object: {}", e)))
    }
}
