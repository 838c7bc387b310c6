//! AES-GCM with a 96 bit IV and a 128 bit tag.

use aes::Aes192;
use aes_gcm::aead::consts::{U12, U16};
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use jose_core::JoseError;
use jose_core::algorithm::Sealed;

type Aes192Gcm = AesGcm<Aes192, U12>;

pub(crate) const IV_LEN: usize = 12;
pub(crate) const TAG_LEN: usize = 16;

/// Encrypt with a 128, 192 or 256 bit key, chosen by the length of `key`.
pub(crate) fn seal(key: &[u8], iv: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Sealed, JoseError> {
    if iv.len() != IV_LEN {
        return Err(JoseError::InvalidConfiguration("AES-GCM needs a 96 bit IV"));
    }
    match key.len() {
        16 => seal_with(&aead::<Aes128Gcm>(key)?, iv, aad, plaintext),
        24 => seal_with(&aead::<Aes192Gcm>(key)?, iv, aad, plaintext),
        32 => seal_with(&aead::<Aes256Gcm>(key)?, iv, aad, plaintext),
        _ => Err(JoseError::InvalidKey("invalid AES-GCM key size")),
    }
}

/// Check the tag and decrypt. Any failure is a [`JoseError::CryptoError`].
pub(crate) fn open(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, JoseError> {
    if iv.len() != IV_LEN || tag.len() != TAG_LEN {
        return Err(JoseError::CryptoError);
    }
    match key.len() {
        16 => open_with(&aead::<Aes128Gcm>(key)?, iv, aad, ciphertext, tag),
        24 => open_with(&aead::<Aes192Gcm>(key)?, iv, aad, ciphertext, tag),
        32 => open_with(&aead::<Aes256Gcm>(key)?, iv, aad, ciphertext, tag),
        _ => Err(JoseError::CryptoError),
    }
}

fn aead<A: KeyInit>(key: &[u8]) -> Result<A, JoseError> {
    A::new_from_slice(key).map_err(|_| JoseError::InvalidKey("invalid AES-GCM key size"))
}

fn seal_with<A>(aead: &A, iv: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Sealed, JoseError>
where
    A: AeadInPlace<NonceSize = U12>,
{
    let mut ciphertext = plaintext.to_vec();
    let tag = aead
        .encrypt_in_place_detached(GenericArray::from_slice(iv), aad, &mut ciphertext)
        .map_err(|_| JoseError::CryptoError)?;
    Ok(Sealed {
        ciphertext,
        tag: tag.to_vec(),
    })
}

fn open_with<A>(
    aead: &A,
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, JoseError>
where
    A: AeadInPlace<NonceSize = U12, TagSize = U16>,
{
    let mut plaintext = ciphertext.to_vec();
    aead.decrypt_in_place_detached(
        GenericArray::from_slice(iv),
        aad,
        &mut plaintext,
        GenericArray::from_slice(tag),
    )
    .map_err(|_| JoseError::CryptoError)?;
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting(len: u8) -> Vec<u8> {
        (0..len).collect()
    }

    #[test]
    fn known_answers() {
        for (key_len, ciphertext, tag) in [
            (16, "fb09cba2093b803b39be05", "57e296d5bf3b16a6e9e55ebab3934c9f"),
            (24, "8e9c4ef7f699be61a25fb8", "fd96cc6aee9c9614ed8618ae5917e419"),
        ] {
            let key = counting(key_len);
            let sealed = seal(&key, &counting(12), b"aad", b"hello world").unwrap();
            assert_eq!(hex::encode(&sealed.ciphertext), ciphertext);
            assert_eq!(hex::encode(&sealed.tag), tag);
            let opened = open(&key, &counting(12), b"aad", &sealed.ciphertext, &sealed.tag).unwrap();
            assert_eq!(opened, b"hello world");
        }
    }

    #[test]
    fn tampering_fails() {
        let key = counting(32);
        let iv = counting(12);
        let Sealed { ciphertext, tag } = seal(&key, &iv, b"aad", b"hello world").unwrap();

        let mut bad = ciphertext.clone();
        bad[0] ^= 1;
        assert!(open(&key, &iv, b"aad", &bad, &tag).is_err());
        assert!(open(&key, &iv, b"aae", &ciphertext, &tag).is_err());
        assert!(open(&key, &iv, b"aad", &ciphertext, &tag[..15]).is_err());
        assert!(open(&key, &iv[..8], b"aad", &ciphertext, &tag).is_err());
    }
}
