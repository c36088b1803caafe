//! JOSE header: an insertion-ordered JSON object.
//!
//! Once a token is built, the header's encoded bytes are what gets
//! authenticated. Tokens keep that exact encoding next to the parsed map.

use crate::codec::{b64url_decode, b64url_encode, json_encode};
use crate::error::JoseError;
use crate::jwa::{ContentEncryptionAlgorithm, JwsAlgorithm, KeyManagementAlgorithm};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Header(Map<String, Value>);

impl Header {
    /// Create an empty header.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a JWS header carrying `alg`.
    #[must_use]
    pub fn jws(alg: JwsAlgorithm) -> Self {
        let mut map = Map::new();
        map.insert("alg".to_string(), Value::String(alg.as_str().to_string()));
        Self(map)
    }

    /// Create a JWE header carrying `alg` and `enc`.
    #[must_use]
    pub fn jwe(alg: KeyManagementAlgorithm, enc: ContentEncryptionAlgorithm) -> Self {
        let mut map = Map::new();
        map.insert("alg".to_string(), Value::String(alg.as_str().to_string()));
        map.insert("enc".to_string(), Value::String(enc.as_str().to_string()));
        Self(map)
    }

    /// Wrap an existing JSON object.
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Set the key ID.
    #[must_use]
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.0.insert("kid".to_string(), Value::String(kid.into()));
        self
    }

    /// Set the media type of the complete token.
    #[must_use]
    pub fn with_typ(mut self, typ: impl Into<String>) -> Self {
        self.0.insert("typ".to_string(), Value::String(typ.into()));
        self
    }

    /// Set the media type of the secured content.
    #[must_use]
    pub fn with_cty(mut self, cty: impl Into<String>) -> Self {
        self.0.insert("cty".to_string(), Value::String(cty.into()));
        self
    }

    /// Set an arbitrary parameter, replacing any existing value.
    pub fn with(mut self, name: impl Into<String>, value: impl Serialize) -> Result<Self, JoseError> {
        self.insert(name, value)?;
        Ok(self)
    }

    /// Set an arbitrary parameter, replacing any existing value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Serialize) -> Result<(), JoseError> {
        let value = serde_json::to_value(value)
            .map_err(|e| JoseError::invalid_parameter(format!("header value: {}", e)))?;
        self.0.insert(name.into(), value);
        Ok(())
    }

    /// Get a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Check whether a parameter is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    #[must_use]
    pub fn alg(&self) -> Option<&str> {
        self.get_str("alg")
    }

    #[must_use]
    pub fn enc(&self) -> Option<&str> {
        self.get_str("enc")
    }

    #[must_use]
    pub fn kid(&self) -> Option<&str> {
        self.get_str("kid")
    }

    #[must_use]
    pub fn typ(&self) -> Option<&str> {
        self.get_str("typ")
    }

    #[must_use]
    pub fn cty(&self) -> Option<&str> {
        self.get_str("cty")
    }

    /// Parameter names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check that no parameter name appears in both headers.
    pub(crate) fn ensure_disjoint(&self, other: &Header) -> Result<(), JoseError> {
        match self.names().find(|name| other.contains(name)) {
            Some(name) => Err(JoseError::invalid_parameter(format!(
                "header parameter '{}' appears in both protected and unprotected headers",
                name
            ))),
            None => Ok(()),
        }
    }

    /// Parse the JWS `alg` parameter.
    pub(crate) fn jws_algorithm(&self) -> Result<JwsAlgorithm, JoseError> {
        self.alg()
            .ok_or_else(|| JoseError::invalid_parameter("header is missing 'alg'"))?
            .parse()
    }

    /// Parse the JWE `alg` parameter.
    pub(crate) fn key_management_algorithm(&self) -> Result<KeyManagementAlgorithm, JoseError> {
        self.alg()
            .ok_or_else(|| JoseError::invalid_parameter("header is missing 'alg'"))?
            .parse()
    }

    /// Parse the JWE `enc` parameter.
    pub(crate) fn content_encryption_algorithm(
        &self,
    ) -> Result<ContentEncryptionAlgorithm, JoseError> {
        self.enc()
            .ok_or_else(|| JoseError::invalid_parameter("header is missing 'enc'"))?
            .parse()
    }

    /// Encode as base64url(JSON).
    pub(crate) fn encode(&self) -> Result<String, JoseError> {
        Ok(b64url_encode(json_encode(&self.0)?))
    }

    /// Decode a protected header segment.
    ///
    /// The segment must hold a JSON object. `crit` is refused because no
    /// extension parameters are understood.
    pub(crate) fn decode(segment: &str) -> Result<Self, JoseError> {
        let bytes = b64url_decode(segment)?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| JoseError::malformed_token(format!("header is not valid JSON: {}", e)))?;
        let header = match value {
            Value::Object(map) => Header(map),
            _ => return Err(JoseError::malformed_token("header is not a JSON object")),
        };
        header.ensure_no_crit()?;
        Ok(header)
    }

    pub(crate) fn ensure_no_crit(&self) -> Result<(), JoseError> {
        if self.contains("crit") {
            return Err(JoseError::malformed_token(
                "critical header parameters are not supported",
            ));
        }
        Ok(())
    }
}

impl From<JwsAlgorithm> for Header {
    fn from(alg: JwsAlgorithm) -> Self {
        Header::jws(alg)
    }
}
