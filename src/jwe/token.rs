//! Encrypted token value.

use crate::error::JoseError;
use crate::header::Header;

/// A JWE: protected header, encrypted key, IV, ciphertext and tag.
#[derive(Debug, Clone, PartialEq)]
pub struct JweToken {
    header: Header,
    encoded_header: String,
    unprotected: Option<Header>,
    encrypted_key: Vec<u8>,
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
    tag: Vec<u8>,
}

/// Raw JWE components as they appear on the wire.
pub(crate) struct JweParts {
    pub encoded_header: String,
    pub unprotected: Option<Header>,
    pub encrypted_key: Vec<u8>,
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

impl JweToken {
    pub(crate) fn from_parts(header: Header, parts: JweParts) -> Result<Self, JoseError> {
        if header.alg().is_none() || header.enc().is_none() {
            return Err(JoseError::malformed_token(
                "protected header must carry 'alg' and 'enc'",
            ));
        }
        if let Some(unprotected) = &parts.unprotected {
            header
                .ensure_disjoint(unprotected)
                .map_err(|e| JoseError::malformed_token(e.to_string()))?;
        }
        Ok(Self {
            header,
            encoded_header: parts.encoded_header,
            unprotected: parts.unprotected,
            encrypted_key: parts.encrypted_key,
            iv: parts.iv,
            ciphertext: parts.ciphertext,
            tag: parts.tag,
        })
    }

    /// Attach a shared unprotected header. Its names must not repeat
    /// protected ones.
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

    /// The base64url protected header segment; its ASCII bytes are the AAD.
    #[must_use]
    pub fn protected_segment(&self) -> &str {
        &self.encoded_header
    }

    #[must_use]
    pub fn unprotected_header(&self) -> Option<&Header> {
        self.unprotected.as_ref()
    }

    #[must_use]
    pub fn encrypted_key(&self) -> &[u8] {
        &self.encrypted_key
    }

    #[must_use]
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    #[must_use]
    pub fn tag(&self) -> &[u8] {
        &self.tag
    }
}
