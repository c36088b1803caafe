//! Content encryption: AES-CBC-HMAC-SHA2 composites and AES-GCM.

use crate::error::JoseError;
use crate::jwa::ContentEncryptionAlgorithm;
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit, Nonce, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use ring::hmac;
use subtle::ConstantTimeEq;

type Aes192Gcm = AesGcm<aes::Aes192, U12>;

const GCM_TAG_LEN: usize = 16;

/// Encrypt `plaintext` and return `(ciphertext, tag)`.
///
/// `aad` is the ASCII protected header segment.
pub(crate) fn encrypt(
    enc: ContentEncryptionAlgorithm,
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), JoseError> {
    check_lengths(enc, cek, iv)?;
    match enc {
        ContentEncryptionAlgorithm::A128CbcHs256
        | ContentEncryptionAlgorithm::A192CbcHs384
        | ContentEncryptionAlgorithm::A256CbcHs512 => {
            let (mac_key, enc_key) = cek.split_at(cek.len() / 2);
            let ciphertext = cbc_encrypt(enc_key, iv, plaintext)?;
            let tag = cbc_hmac_tag(enc, mac_key, aad, iv, &ciphertext);
            Ok((ciphertext, tag))
        }
        ContentEncryptionAlgorithm::A128Gcm => gcm_seal::<Aes128Gcm>(cek, iv, aad, plaintext),
        ContentEncryptionAlgorithm::A192Gcm => gcm_seal::<Aes192Gcm>(cek, iv, aad, plaintext),
        ContentEncryptionAlgorithm::A256Gcm => gcm_seal::<Aes256Gcm>(cek, iv, aad, plaintext),
    }
}

/// Authenticate then decrypt.
///
/// The tag is checked before any ciphertext block is decrypted.
///
/// # Errors
///
/// `AuthenticationFailed` on tag mismatch, `PaddingError` when the
/// authenticated plaintext has invalid PKCS#7 padding.
pub(crate) fn decrypt(
    enc: ContentEncryptionAlgorithm,
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, JoseError> {
    check_lengths(enc, cek, iv)?;
    match enc {
        ContentEncryptionAlgorithm::A128CbcHs256
        | ContentEncryptionAlgorithm::A192CbcHs384
        | ContentEncryptionAlgorithm::A256CbcHs512 => {
            let (mac_key, enc_key) = cek.split_at(cek.len() / 2);
            let expected = cbc_hmac_tag(enc, mac_key, aad, iv, ciphertext);
            if !bool::from(expected.ct_eq(tag)) {
                return Err(JoseError::AuthenticationFailed);
            }
            cbc_decrypt(enc_key, iv, ciphertext)
        }
        ContentEncryptionAlgorithm::A128Gcm => gcm_open::<Aes128Gcm>(cek, iv, aad, ciphertext, tag),
        ContentEncryptionAlgorithm::A192Gcm => gcm_open::<Aes192Gcm>(cek, iv, aad, ciphertext, tag),
        ContentEncryptionAlgorithm::A256Gcm => gcm_open::<Aes256Gcm>(cek, iv, aad, ciphertext, tag),
    }
}

fn check_lengths(enc: ContentEncryptionAlgorithm, cek: &[u8], iv: &[u8]) -> Result<(), JoseError> {
    if cek.len() != enc.key_len() {
        return Err(JoseError::invalid_parameter(format!(
            "{} requires a {}-byte key, got {}",
            enc,
            enc.key_len(),
            cek.len()
        )));
    }
    if iv.len() != enc.iv_len() {
        return Err(JoseError::malformed_token(format!(
            "{} requires a {}-byte IV, got {}",
            enc,
            enc.iv_len(),
            iv.len()
        )));
    }
    Ok(())
}

/// HMAC over `AAD || IV || ciphertext || AL`, truncated to the tag length.
///
/// AL is the AAD length in bits as a 64-bit big-endian integer.
fn cbc_hmac_tag(
    enc: ContentEncryptionAlgorithm,
    mac_key: &[u8],
    aad: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Vec<u8> {
    let algorithm = match enc {
        ContentEncryptionAlgorithm::A128CbcHs256 => hmac::HMAC_SHA256,
        ContentEncryptionAlgorithm::A192CbcHs384 => hmac::HMAC_SHA384,
        _ => hmac::HMAC_SHA512,
    };
    let key = hmac::Key::new(algorithm, mac_key);
    let al = (aad.len() as u64).wrapping_mul(8).to_be_bytes();

    let mut ctx = hmac::Context::with_key(&key);
    ctx.update(aad);
    ctx.update(iv);
    ctx.update(ciphertext);
    ctx.update(&al);
    let full = ctx.sign();
    full.as_ref()[..enc.tag_len()].to_vec()
}

fn cbc_encrypt(enc_key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, JoseError> {
    let invalid =
        |e: cbc::cipher::InvalidLength| JoseError::internal(format!("AES-CBC setup failed: {}", e));
    let ciphertext = match enc_key.len() {
        16 => cbc::Encryptor::<aes::Aes128>::new_from_slices(enc_key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        24 => cbc::Encryptor::<aes::Aes192>::new_from_slices(enc_key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        32 => cbc::Encryptor::<aes::Aes256>::new_from_slices(enc_key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        other => {
            return Err(JoseError::internal(format!(
                "no AES variant for a {}-byte key",
                other
            )))
        }
    };
    Ok(ciphertext)
}

fn cbc_decrypt(enc_key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, JoseError> {
    let invalid =
        |e: cbc::cipher::InvalidLength| JoseError::internal(format!("AES-CBC setup failed: {}", e));
    let plaintext = match enc_key.len() {
        16 => cbc::Decryptor::<aes::Aes128>::new_from_slices(enc_key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        24 => cbc::Decryptor::<aes::Aes192>::new_from_slices(enc_key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        32 => cbc::Decryptor::<aes::Aes256>::new_from_slices(enc_key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        other => {
            return Err(JoseError::internal(format!(
                "no AES variant for a {}-byte key",
                other
            )))
        }
    };
    plaintext.map_err(|_| JoseError::PaddingError)
}

fn gcm_seal<C: Aead + KeyInit>(
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), JoseError> {
    let cipher = C::new_from_slice(cek)
        .map_err(|e| JoseError::internal(format!("AES-GCM setup failed: {}", e)))?;
    let mut sealed = cipher
        .encrypt(Nonce::<C>::from_slice(iv), Payload { msg: plaintext, aad })
        .map_err(|e| JoseError::internal(format!("AES-GCM encryption failed: {}", e)))?;
    // aes-gcm appends the tag to the ciphertext
    let tag = sealed.split_off(sealed.len() - GCM_TAG_LEN);
    Ok((sealed, tag))
}

fn gcm_open<C: Aead + KeyInit>(
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, JoseError> {
    if tag.len() != GCM_TAG_LEN {
        return Err(JoseError::AuthenticationFailed);
    }
    let cipher = C::new_from_slice(cek)
        .map_err(|e| JoseError::internal(format!("AES-GCM setup failed: {}", e)))?;
    let mut sealed = Vec::with_capacity(ciphertext.len() + tag.len());
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(tag);
    cipher
        .decrypt(Nonce::<C>::from_slice(iv), Payload { msg: &sealed, aad })
        .map_err(|_| JoseError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    // RFC 7518 Appendix B.1
    #[test]
    fn test_a128cbc_hs256_known_answer() {
        let cek = hex("000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f");
        let plaintext = hex(
            "41206369706865722073797374656d206d757374206e6f742062652072657175\
             6972656420746f206265207365637265742c20616e64206974206d7573742062\
             652061626c6520746f2066616c6c20696e746f207468652068616e6473206f66\
             2074686520656e656d7920776974686f757420696e636f6e76656e69656e6365",
        );
        let iv = hex("1af38c2dc2b96ffdd86694092341bc04");
        let aad = hex(
            "546865207365636f6e64207072696e6369706c65206f66204175677573746520\
             4b6572636b686f666673",
        );

        let (ciphertext, tag) = encrypt(
            ContentEncryptionAlgorithm::A128CbcHs256,
            &cek,
            &iv,
            &aad,
            &plaintext,
        )
        .unwrap();

        assert_eq!(
            ciphertext,
            hex("c80edfa32ddf39d5ef00c0b468834279a2e46a1b8049f792f76bfe54b903a9c9\
                 a94ac9b47ad2655c5f10f9aef71427e2fc6f9b3f399a221489f16362c7032336\
                 09d45ac69864e3321cf82935ac4096c86e133314c54019e8ca7980dfa4b9cf1b\
                 384c486f3a54c51078158ee5d79de59fbd34d848b3d69550a67646344427ade5\
                 4b8851ffb598f7f80074b9473c82e2db")
        );
        assert_eq!(tag, hex("652c3fa36b0a7c5b3219fab3a30bc1c4"));

        let decrypted = decrypt(
            ContentEncryptionAlgorithm::A128CbcHs256,
            &cek,
            &iv,
            &aad,
            &ciphertext,
            &tag,
        )
        .unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_tag_checked_before_decryption() {
        let enc = ContentEncryptionAlgorithm::A256CbcHs512;
        let cek = [3u8; 64];
        let iv = [9u8; 16];
        let (ciphertext, mut tag) = encrypt(enc, &cek, &iv, b"aad", b"payload").unwrap();
        assert_eq!(tag.len(), 32);

        tag[0] ^= 1;
        assert!(matches!(
            decrypt(enc, &cek, &iv, b"aad", &ciphertext, &tag),
            Err(JoseError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_aad_is_authenticated() {
        let enc = ContentEncryptionAlgorithm::A128Gcm;
        let cek = [5u8; 16];
        let iv = [1u8; 12];
        let (ciphertext, tag) = encrypt(enc, &cek, &iv, b"header-a", b"payload").unwrap();
        assert_eq!(tag.len(), 16);
        assert_eq!(
            decrypt(enc, &cek, &iv, b"header-a", &ciphertext, &tag).unwrap(),
            b"payload"
        );
        assert!(matches!(
            decrypt(enc, &cek, &iv, b"header-b", &ciphertext, &tag),
            Err(JoseError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_bad_padding_after_valid_tag() {
        let enc = ContentEncryptionAlgorithm::A256CbcHs512;
        let cek = [3u8; 64];
        let iv = [9u8; 16];
        let (mac_key, _) = cek.split_at(32);

        let (ciphertext, _) = encrypt(enc, &cek, &iv, b"aad", &[0u8; 15]).unwrap();
        // single block whose padding byte 0x01 decrypts to 0x00 under this IV
        let mut forged_iv = iv;
        forged_iv[15] ^= 0x01;
        let tag = cbc_hmac_tag(enc, mac_key, b"aad", &forged_iv, &ciphertext);

        assert!(matches!(
            decrypt(enc, &cek, &forged_iv, b"aad", &ciphertext, &tag),
            Err(JoseError::PaddingError)
        ));
    }

    #[test]
    fn test_wrong_iv_length() {
        let enc = ContentEncryptionAlgorithm::A256CbcHs512;
        assert!(matches!(
            encrypt(enc, &[0u8; 64], &[0u8; 12], b"", b"x"),
            Err(JoseError::MalformedToken(_))
        ));
    }
}
