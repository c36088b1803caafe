//! Signed token value.

use crate::codec::b64url_encode;
use crate::error::JoseError;
use crate::header::Header;

/// A JWS: protected header, payload and signature.
///
/// The protected header is kept in the exact encoding that was signed, so a
/// parsed token verifies against the bytes on the wire rather than a
/// re-serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct JwsToken {
    header: Header,
    encoded_header: String,
    unprotected: Option<Header>,
    payload: Vec<u8>,
    signature: Vec<u8>,
}

impl JwsToken {
    pub(crate) fn from_parts(
        header: Header,
        encoded_header: String,
        unprotected: Option<Header>,
        payload: Vec<u8>,
        signature: Vec<u8>,
    ) -> Result<Self, JoseError> {
        if header.alg().is_none() {
            return Err(JoseError::malformed_token("protected header is missing 'alg'"));
        }
        if let Some(unprotected) = &unprotected {
            header
                .ensure_disjoint(unprotected)
                .map_err(|e| JoseError::malformed_token(e.to_string()))?;
        }
        Ok(Self {
            header,
            encoded_header,
            unprotected,
            payload,
            signature,
        })
    }

    /// Attach an unprotected header. Its names must not repeat protected ones.
    pub fn with_unprotected_header(mut self, unprotected: Header) -> Result<Self, JoseError> {
        self.header.ensure_disjoint(&unprotected)?;
        unprotected.ensure_no_crit()?;
        self.unprotected = Some(unprotected);
        Ok(self)
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The base64url protected header segment exactly as signed.
    #[must_use]
    pub fn protected_segment(&self) -> &str {
        &self.encoded_header
    }

    #[must_use]
    pub fn unprotected_header(&self) -> Option<&Header> {
        self.unprotected.as_ref()
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// `b64url(header) || "." || b64url(payload)`
    #[must_use]
    pub fn signing_input(&self) -> String {
        signing_input(&self.encoded_header, &self.payload)
    }
}

pub(crate) fn signing_input(encoded_header: &str, payload: &[u8]) -> String {
    format!("{}.{}", encoded_header, b64url_encode(payload))
}
