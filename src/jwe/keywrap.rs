//! Key management: establishing the content encryption key for a recipient.

use crate::codec::random_bytes;
use crate::error::JoseError;
use crate::jwa::{ContentEncryptionAlgorithm, KeyManagementAlgorithm};
use crate::jwk::Key;
use aes::cipher::generic_array::GenericArray;
use aes::{Aes128, Aes192, Aes256};
use aes_kw::Kek;
use rand::rngs::OsRng;
use rsa::Oaep;
use sha1::Sha1;
use sha2::Sha256;
use zeroize::Zeroizing;

/// AES Key Wrap works on 64-bit semiblocks and prepends one to its output.
const SEMIBLOCK_LEN: usize = 8;

fn oaep(alg: KeyManagementAlgorithm) -> Oaep {
    match alg {
        KeyManagementAlgorithm::RsaOaep => Oaep::new::<Sha1>(),
        _ => Oaep::new::<Sha256>(),
    }
}

fn shared_kek<'k>(alg: KeyManagementAlgorithm, key: &'k Key) -> Result<&'k [u8], JoseError> {
    key.secret()
        .ok_or_else(|| JoseError::algorithm_mismatch(alg.as_str(), "symmetric", key.kind_name()))
}

fn aes_wrap(kek: &[u8], cek: &[u8]) -> Option<Vec<u8>> {
    let mut out = vec![0u8; cek.len() + SEMIBLOCK_LEN];
    let wrapped = match kek.len() {
        16 => Kek::<Aes128>::new(GenericArray::from_slice(kek)).wrap(cek, &mut out),
        24 => Kek::<Aes192>::new(GenericArray::from_slice(kek)).wrap(cek, &mut out),
        32 => Kek::<Aes256>::new(GenericArray::from_slice(kek)).wrap(cek, &mut out),
        _ => return None,
    };
    wrapped.ok().map(|()| out)
}

fn aes_unwrap(kek: &[u8], wrapped: &[u8]) -> Option<Zeroizing<Vec<u8>>> {
    if wrapped.len() < 3 * SEMIBLOCK_LEN || wrapped.len() % SEMIBLOCK_LEN != 0 {
        return None;
    }
    let mut out = Zeroizing::new(vec![0u8; wrapped.len() - SEMIBLOCK_LEN]);
    let unwrapped = match kek.len() {
        16 => Kek::<Aes128>::new(GenericArray::from_slice(kek)).unwrap(wrapped, &mut out),
        24 => Kek::<Aes192>::new(GenericArray::from_slice(kek)).unwrap(wrapped, &mut out),
        32 => Kek::<Aes256>::new(GenericArray::from_slice(kek)).unwrap(wrapped, &mut out),
        _ => return None,
    };
    unwrapped.ok().map(|()| out)
}

/// Produce a CEK for `enc` and its encrypted form for the recipient.
///
/// With `dir` the shared key is the CEK and the encrypted key is empty.
pub(crate) fn wrap_new_cek(
    alg: KeyManagementAlgorithm,
    enc: ContentEncryptionAlgorithm,
    key: &Key,
) -> Result<(Zeroizing<Vec<u8>>, Vec<u8>), JoseError> {
    match alg {
        KeyManagementAlgorithm::RsaOaep256 | KeyManagementAlgorithm::RsaOaep => {
            let public = key.rsa_public_key().ok_or_else(|| {
                JoseError::algorithm_mismatch(alg.as_str(), "RSA", key.kind_name())
            })?;
            let cek = Zeroizing::new(random_bytes(enc.key_len()));
            let encrypted_key = public
                .encrypt(&mut OsRng, oaep(alg), &cek)
                .map_err(|e| JoseError::internal(format!("{} key wrap failed: {}", alg, e)))?;
            Ok((cek, encrypted_key))
        }
        KeyManagementAlgorithm::A128Kw
        | KeyManagementAlgorithm::A192Kw
        | KeyManagementAlgorithm::A256Kw => {
            let kek = shared_kek(alg, key)?;
            if Some(kek.len()) != alg.kek_len() {
                return Err(JoseError::invalid_parameter(format!(
                    "{} requires a {}-bit key, got {}",
                    alg,
                    alg.kek_len().unwrap_or_default() * 8,
                    kek.len() * 8
                )));
            }
            let cek = Zeroizing::new(random_bytes(enc.key_len()));
            let encrypted_key = aes_wrap(kek, &cek)
                .ok_or_else(|| JoseError::internal(format!("{} key wrap failed", alg)))?;
            Ok((cek, encrypted_key))
        }
        KeyManagementAlgorithm::Direct => {
            let secret = shared_kek(alg, key)?;
            if secret.len() != enc.key_len() {
                return Err(JoseError::invalid_parameter(format!(
                    "{} with dir requires a {}-bit key, got {}",
                    enc,
                    enc.key_len() * 8,
                    secret.len() * 8
                )));
            }
            Ok((Zeroizing::new(secret.to_vec()), Vec::new()))
        }
    }
}

/// Recover the CEK from the encrypted key.
///
/// Every failure past the key-kind check is `KeyUnwrapFailed` with no
/// further detail.
pub(crate) fn unwrap_cek(
    alg: KeyManagementAlgorithm,
    enc: ContentEncryptionAlgorithm,
    key: &Key,
    encrypted_key: &[u8],
) -> Result<Zeroizing<Vec<u8>>, JoseError> {
    let cek = match alg {
        KeyManagementAlgorithm::RsaOaep256 | KeyManagementAlgorithm::RsaOaep => {
            let private = key.rsa_private_key().ok_or_else(|| {
                JoseError::algorithm_mismatch(alg.as_str(), "RSA private", key.kind_name())
            })?;
            private
                .decrypt_blinded(&mut OsRng, oaep(alg), encrypted_key)
                .map(Zeroizing::new)
                .map_err(|_| JoseError::KeyUnwrapFailed)?
        }
        KeyManagementAlgorithm::A128Kw
        | KeyManagementAlgorithm::A192Kw
        | KeyManagementAlgorithm::A256Kw => {
            let kek = shared_kek(alg, key)?;
            if Some(kek.len()) != alg.kek_len() {
                return Err(JoseError::KeyUnwrapFailed);
            }
            aes_unwrap(kek, encrypted_key).ok_or(JoseError::KeyUnwrapFailed)?
        }
        KeyManagementAlgorithm::Direct => {
            let secret = shared_kek(alg, key)?;
            if !encrypted_key.is_empty() {
                return Err(JoseError::KeyUnwrapFailed);
            }
            Zeroizing::new(secret.to_vec())
        }
    };
    if cek.len() != enc.key_len() {
        return Err(JoseError::KeyUnwrapFailed);
    }
    Ok(cek)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::b64url_decode;

    #[test]
    fn test_direct_uses_shared_key() {
        let key = Key::symmetric(vec![4u8; 64]).unwrap();
        let enc = ContentEncryptionAlgorithm::A256CbcHs512;
        let (cek, encrypted_key) =
            wrap_new_cek(KeyManagementAlgorithm::Direct, enc, &key).unwrap();
        assert_eq!(cek.as_slice(), &[4u8; 64][..]);
        assert!(encrypted_key.is_empty());

        let unwrapped =
            unwrap_cek(KeyManagementAlgorithm::Direct, enc, &key, &encrypted_key).unwrap();
        assert_eq!(unwrapped.as_slice(), cek.as_slice());
    }

    #[test]
    fn test_direct_rejects_wrong_key_length() {
        let key = Key::symmetric(vec![4u8; 32]).unwrap();
        let enc = ContentEncryptionAlgorithm::A256CbcHs512;
        assert!(matches!(
            wrap_new_cek(KeyManagementAlgorithm::Direct, enc, &key),
            Err(JoseError::InvalidParameter(_))
        ));
        assert!(matches!(
            unwrap_cek(KeyManagementAlgorithm::Direct, enc, &key, &[]),
            Err(JoseError::KeyUnwrapFailed)
        ));
    }

    #[test]
    fn test_direct_rejects_encrypted_key() {
        let key = Key::symmetric(vec![4u8; 32]).unwrap();
        let enc = ContentEncryptionAlgorithm::A128CbcHs256;
        assert!(matches!(
            unwrap_cek(KeyManagementAlgorithm::Direct, enc, &key, &[1, 2, 3]),
            Err(JoseError::KeyUnwrapFailed)
        ));
    }

    #[test]
    fn test_rsa_oaep_requires_rsa_key() {
        let key = Key::symmetric(vec![4u8; 64]).unwrap();
        for alg in [KeyManagementAlgorithm::RsaOaep256, KeyManagementAlgorithm::RsaOaep] {
            assert!(matches!(
                wrap_new_cek(alg, ContentEncryptionAlgorithm::A256CbcHs512, &key),
                Err(JoseError::AlgorithmMismatch { .. })
            ));
        }
    }

    /// RFC 7516 Appendix A.3: A128KW wrapping of the A128CBC-HS256 CEK.
    #[test]
    fn test_aes_key_wrap_known_answer() {
        let kek = b64url_decode("GawgguFyGrWKav7AX4VKUg").unwrap();
        let cek = [
            4u8, 211, 31, 197, 84, 157, 252, 254, 11, 100, 157, 250, 63, 170, 106, 206, 107, 124,
            212, 45, 111, 107, 9, 219, 200, 177, 0, 240, 143, 156, 44, 207,
        ];
        let expected = b64url_decode("6KB707dM9YTIgHtLvtgWQ8mKwboJW3of9locizkDTHzBC2IlrT1oOQ").unwrap();

        assert_eq!(aes_wrap(&kek, &cek).unwrap(), expected);
        assert_eq!(aes_unwrap(&kek, &expected).unwrap().as_slice(), &cek[..]);
    }

    #[test]
    fn test_aes_key_wrap_round_trip() {
        let enc = ContentEncryptionAlgorithm::A256CbcHs512;
        for (alg, len) in [
            (KeyManagementAlgorithm::A128Kw, 16),
            (KeyManagementAlgorithm::A192Kw, 24),
            (KeyManagementAlgorithm::A256Kw, 32),
        ] {
            let key = Key::symmetric(vec![5u8; len]).unwrap();
            let (cek, encrypted_key) = wrap_new_cek(alg, enc, &key).unwrap();
            assert_eq!(encrypted_key.len(), enc.key_len() + SEMIBLOCK_LEN);
            assert_ne!(encrypted_key.as_slice(), cek.as_slice());

            let unwrapped = unwrap_cek(alg, enc, &key, &encrypted_key).unwrap();
            assert_eq!(unwrapped.as_slice(), cek.as_slice());
        }
    }

    #[test]
    fn test_aes_key_wrap_fresh_cek_per_message() {
        let key = Key::symmetric(vec![5u8; 16]).unwrap();
        let enc = ContentEncryptionAlgorithm::A128CbcHs256;
        let (a, _) = wrap_new_cek(KeyManagementAlgorithm::A128Kw, enc, &key).unwrap();
        let (b, _) = wrap_new_cek(KeyManagementAlgorithm::A128Kw, enc, &key).unwrap();
        assert_ne!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn test_aes_key_wrap_integrity_check() {
        let key = Key::symmetric(vec![5u8; 32]).unwrap();
        let other = Key::symmetric(vec![6u8; 32]).unwrap();
        let enc = ContentEncryptionAlgorithm::A128CbcHs256;
        let (_, mut encrypted_key) = wrap_new_cek(KeyManagementAlgorithm::A256Kw, enc, &key).unwrap();

        assert!(matches!(
            unwrap_cek(KeyManagementAlgorithm::A256Kw, enc, &other, &encrypted_key),
            Err(JoseError::KeyUnwrapFailed)
        ));
        encrypted_key[3] ^= 1;
        assert!(matches!(
            unwrap_cek(KeyManagementAlgorithm::A256Kw, enc, &key, &encrypted_key),
            Err(JoseError::KeyUnwrapFailed)
        ));
        assert!(matches!(
            unwrap_cek(KeyManagementAlgorithm::A256Kw, enc, &key, &encrypted_key[..20]),
            Err(JoseError::KeyUnwrapFailed)
        ));
    }

    #[test]
    fn test_aes_key_wrap_key_length_must_match() {
        let key = Key::symmetric(vec![5u8; 32]).unwrap();
        assert!(matches!(
            wrap_new_cek(
                KeyManagementAlgorithm::A128Kw,
                ContentEncryptionAlgorithm::A128CbcHs256,
                &key
            ),
            Err(JoseError::InvalidParameter(_))
        ));
    }
}
