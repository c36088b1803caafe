use crate::error::JoseError;
use crate::jwt::claims::Claims;
use serde_json::{Map, Value};

pub struct JwtBuilder {
    issuer: String,
    subject: Option<String>,
    audience: Vec<String>,
    ttl_seconds: i64,
    custom_claims: Map<String, Value>,
}

impl JwtBuilder {
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        JwtBuilder {
            issuer: issuer.into(),
            subject: None,
            audience: Vec::new(),
            ttl_seconds: 900, // 15 minutes default
            custom_claims: Map::new(),
        }
    }

    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn audience(mut self, audience: Vec<String>) -> Self {
        self.audience = audience;
        self
    }

    #[must_use]
    pub fn ttl_seconds(mut self, ttl: i64) -> Self {
        self.ttl_seconds = ttl;
        self
    }

    #[must_use]
    pub fn custom_claim(mut self, key: impl Into<String>, value: Value) -> Self {
        self.custom_claims.insert(key.into(), value);
        self
    }

    /// Build the claim set.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if the subject is missing, the TTL is not positive,
    /// or a custom claim uses a registered name.
    pub fn build(self) -> Result<Claims, JoseError> {
        let subject = self
            .subject
            .ok_or_else(|| JoseError::invalid_parameter("subject is required"))?;
        if self.ttl_seconds <= 0 {
            return Err(JoseError::invalid_parameter("ttl must be positive"));
        }

        let mut claims = Claims::new()
            .with_issuer(self.issuer)
            .with_subject(subject)
            .with_ttl(self.ttl_seconds);

        let mut audience = self.audience;
        claims = match audience.len() {
            0 => claims,
            1 => claims.with_audience(audience.remove(0)),
            _ => claims.with_audience(audience),
        };

        for (key, value) in self.custom_claims {
            claims = claims.with_claim(key, value)?;
        }

        Ok(claims)
    }
}
