//! JWK document (RFC 7517) and its conversion to and from [`Key`].

use crate::codec::{b64url_decode, b64url_encode};
use crate::error::JoseError;
use crate::jwk::key::{Key, KeyOperation, KeyParams, KeyUse, RsaKey, SymmetricKey};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON Web Key as it appears on the wire.
///
/// Members are all optional strings except `kty`; validation happens when
/// converting to a [`Key`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<KeyUse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<KeyOperation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oth: Option<Value>,
}

impl Jwk {
    fn params(&self) -> KeyParams {
        KeyParams {
            kid: self.kid.clone(),
            key_use: self.key_use,
            key_ops: self.key_ops.clone(),
            alg: self.alg.clone(),
        }
    }

    fn with_params(mut self, params: &KeyParams) -> Self {
        self.kid = params.kid.clone();
        self.key_use = params.key_use;
        self.key_ops = params.key_ops.clone();
        self.alg = params.alg.clone();
        self
    }

    /// Parse a JWK from a JSON object.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, JoseError> {
        serde_json::from_value(Value::Object(map.clone()))
            .map_err(|e| JoseError::malformed_key(format!("invalid JWK: {}", e)))
    }

    /// Render as a JSON object in member declaration order.
    pub fn to_map(&self) -> Result<Map<String, Value>, JoseError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(JoseError::internal("JWK did not serialize to an object")),
            Err(e) => Err(JoseError::internal(format!("JWK encoding failed: {}", e))),
        }
    }
}

fn required<'a>(member: &'a Option<String>, name: &str, kty: &str) -> Result<&'a str, JoseError> {
    member
        .as_deref()
        .ok_or_else(|| JoseError::malformed_key(format!("{} key is missing '{}'", kty, name)))
}

fn decode_bytes(value: &str, name: &str) -> Result<Vec<u8>, JoseError> {
    b64url_decode(value)
        .map_err(|_| JoseError::malformed_key(format!("'{}' is not valid base64url", name)))
}

fn decode_uint(value: &str, name: &str) -> Result<BigUint, JoseError> {
    let bytes = decode_bytes(value, name)?;
    if bytes.is_empty() {
        return Err(JoseError::malformed_key(format!("'{}' is empty", name)));
    }
    Ok(BigUint::from_bytes_be(&bytes))
}

fn encode_uint(value: &BigUint) -> String {
    b64url_encode(value.to_bytes_be())
}

fn import_symmetric(jwk: &Jwk) -> Result<Key, JoseError> {
    let secret = decode_bytes(required(&jwk.k, "k", "oct")?, "k")?;
    if secret.is_empty() {
        return Err(JoseError::malformed_key("'k' is empty"));
    }
    Ok(Key::Symmetric(SymmetricKey::new(secret, jwk.params())?))
}

fn import_rsa(jwk: &Jwk) -> Result<Key, JoseError> {
    if jwk.oth.is_some() {
        return Err(JoseError::malformed_key("multi-prime RSA keys are not supported"));
    }
    let n = decode_uint(required(&jwk.n, "n", "RSA")?, "n")?;
    let e = decode_uint(required(&jwk.e, "e", "RSA")?, "e")?;

    let Some(d) = jwk.d.as_deref() else {
        if jwk.p.is_some() || jwk.q.is_some() || jwk.dp.is_some() || jwk.dq.is_some() || jwk.qi.is_some() {
            return Err(JoseError::malformed_key("RSA private members present without 'd'"));
        }
        let public = RsaPublicKey::new(n, e)
            .map_err(|err| JoseError::malformed_key(format!("invalid RSA public key: {}", err)))?;
        return Ok(Key::Rsa(RsaKey::from_public(public, jwk.params())?));
    };

    let d = decode_uint(d, "d")?;
    let p = decode_uint(required(&jwk.p, "p", "RSA")?, "p")?;
    let q = decode_uint(required(&jwk.q, "q", "RSA")?, "q")?;
    let dp = decode_uint(required(&jwk.dp, "dp", "RSA")?, "dp")?;
    let dq = decode_uint(required(&jwk.dq, "dq", "RSA")?, "dq")?;
    let qi = decode_uint(required(&jwk.qi, "qi", "RSA")?, "qi")?;

    let mut private = RsaPrivateKey::from_components(n, e, d, vec![p, q])
        .map_err(|err| JoseError::malformed_key(format!("invalid RSA private key: {}", err)))?;
    private
        .validate()
        .map_err(|err| JoseError::malformed_key(format!("inconsistent RSA private key: {}", err)))?;
    private
        .precompute()
        .map_err(|err| JoseError::malformed_key(format!("invalid RSA private key: {}", err)))?;

    let crt_matches = private.dp() == Some(&dp)
        && private.dq() == Some(&dq)
        && private.crt_coefficient().as_ref() == Some(&qi);
    if !crt_matches {
        return Err(JoseError::malformed_key("RSA CRT parameters do not match the key"));
    }

    Ok(Key::Rsa(RsaKey::from_private(private, jwk.params())?))
}

impl TryFrom<&Jwk> for Key {
    type Error = JoseError;

    fn try_from(jwk: &Jwk) -> Result<Self, Self::Error> {
        match jwk.kty.as_str() {
            "oct" => import_symmetric(jwk),
            "RSA" => import_rsa(jwk),
            other => Err(JoseError::malformed_key(format!("unsupported kty '{}'", other))),
        }
    }
}

fn rsa_public_jwk(public: &RsaPublicKey) -> Jwk {
    Jwk {
        kty: "RSA".to_string(),
        n: Some(encode_uint(public.n())),
        e: Some(encode_uint(public.e())),
        ..Jwk::default()
    }
}

impl Key {
    /// Import a key from a JWK-shaped JSON object.
    ///
    /// # Errors
    ///
    /// `MalformedKey` when `kty` is unknown, a required member is missing, a
    /// member is not base64url, or the numbers do not form a valid key.
    pub fn import(fields: &Map<String, Value>) -> Result<Self, JoseError> {
        Key::try_from(&Jwk::from_map(fields)?)
    }

    /// Import a key from JWK JSON text.
    pub fn from_json(json: &str) -> Result<Self, JoseError> {
        let jwk: Jwk = serde_json::from_str(json)
            .map_err(|e| JoseError::malformed_key(format!("invalid JWK: {}", e)))?;
        Key::try_from(&jwk)
    }

    /// Public JWK of an RSA key, including `kid`, `use`, `key_ops` and `alg`.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` for symmetric keys.
    pub fn public_jwk(&self) -> Result<Jwk, JoseError> {
        match self {
            Key::Rsa(rsa) => Ok(rsa_public_jwk(rsa.public_key()).with_params(self.params())),
            Key::Symmetric(_) => Err(JoseError::unsupported_operation(
                "symmetric keys have no public projection",
            )),
        }
    }

    /// Full JWK including secret or private members.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` for an RSA key without its private half.
    pub fn private_jwk(&self) -> Result<Jwk, JoseError> {
        let jwk = match self {
            Key::Symmetric(sym) => Jwk {
                kty: "oct".to_string(),
                k: Some(b64url_encode(sym.secret())),
                ..Jwk::default()
            },
            Key::Rsa(rsa) => {
                let private = rsa.private_key().ok_or_else(|| {
                    JoseError::unsupported_operation("RSA key has no private half to export")
                })?;
                let primes = private.primes();
                let (Some(p), Some(q), Some(dp), Some(dq), Some(qi)) = (
                    primes.first(),
                    primes.get(1),
                    private.dp(),
                    private.dq(),
                    private.crt_coefficient(),
                ) else {
                    return Err(JoseError::internal("RSA private key lacks CRT parameters"));
                };
                Jwk {
                    d: Some(encode_uint(private.d())),
                    p: Some(encode_uint(p)),
                    q: Some(encode_uint(q)),
                    dp: Some(encode_uint(dp)),
                    dq: Some(encode_uint(dq)),
                    qi: Some(encode_uint(&qi)),
                    ..rsa_public_jwk(rsa.public_key())
                }
            }
        };
        Ok(jwk.with_params(self.params()))
    }

    /// Public projection as a JSON object.
    pub fn export_public(&self) -> Result<Map<String, Value>, JoseError> {
        self.public_jwk()?.to_map()
    }

    /// Full key material as a JSON object.
    pub fn export_private(&self) -> Result<Map<String, Value>, JoseError> {
        self.private_jwk()?.to_map()
    }
}
