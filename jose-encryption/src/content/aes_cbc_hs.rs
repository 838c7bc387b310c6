//! AES-CBC with HMAC-SHA2 (RFC 7518 section 5.2).
//!
//! The CEK is split in half: the first half keys the MAC, the second half the cipher. The tag
//! is the first half of `HMAC(AAD ‖ IV ‖ ciphertext ‖ AL)`, with `AL` the bit length of the
//! AAD as a 64 bit big-endian integer.

use aes::{Aes128, Aes192, Aes256};
use cipher::block_padding::Pkcs7;
use cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit};
use hmac::{Hmac, Mac};
use jose_core::JoseError;
use jose_core::algorithm::Sealed;
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

pub(crate) const IV_LEN: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Variant {
    A128Hs256,
    A192Hs384,
    A256Hs512,
}

impl Variant {
    /// Half of the CEK, which is also the tag length.
    fn half(self) -> usize {
        match self {
            Variant::A128Hs256 => 16,
            Variant::A192Hs384 => 24,
            Variant::A256Hs512 => 32,
        }
    }

    pub(crate) fn cek_len(self) -> usize {
        2 * self.half()
    }

    fn split(self, cek: &[u8]) -> Result<(&[u8], &[u8]), JoseError> {
        if cek.len() != self.cek_len() {
            return Err(JoseError::InvalidKey(
                "the key size does not match the content encryption algorithm",
            ));
        }
        Ok(cek.split_at(self.half()))
    }

    fn tag(
        self,
        mac_key: &[u8],
        aad: &[u8],
        iv: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, JoseError> {
        let al = (aad.len() as u64 * 8).to_be_bytes();
        let parts: [&[u8]; 4] = [aad, iv, ciphertext, &al];
        let mut tag = match self {
            Variant::A128Hs256 => mac::<Hmac<Sha256>>(mac_key, &parts)?,
            Variant::A192Hs384 => mac::<Hmac<Sha384>>(mac_key, &parts)?,
            Variant::A256Hs512 => mac::<Hmac<Sha512>>(mac_key, &parts)?,
        };
        tag.truncate(self.half());
        Ok(tag)
    }
}

fn mac<M: Mac + KeyInit>(key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, JoseError> {
    let mut mac = <M as KeyInit>::new_from_slice(key)
        .map_err(|_| JoseError::InvalidKey("invalid HMAC key"))?;
    for part in parts {
        Mac::update(&mut mac, part);
    }
    Ok(mac.finalize().into_bytes().to_vec())
}

fn encrypt<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, JoseError>
where
    C: BlockCipher + BlockEncryptMut + KeyInit,
{
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| JoseError::InvalidConfiguration("AES-CBC needs a 128 bit IV"))?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn decrypt<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, JoseError>
where
    C: BlockCipher + BlockDecryptMut + KeyInit,
{
    let decryptor =
        cbc::Decryptor::<C>::new_from_slices(key, iv).map_err(|_| JoseError::CryptoError)?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| JoseError::CryptoError)
}

pub(crate) fn seal(
    variant: Variant,
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Sealed, JoseError> {
    let (mac_key, enc_key) = variant.split(cek)?;
    let ciphertext = match variant {
        Variant::A128Hs256 => encrypt::<Aes128>(enc_key, iv, plaintext)?,
        Variant::A192Hs384 => encrypt::<Aes192>(enc_key, iv, plaintext)?,
        Variant::A256Hs512 => encrypt::<Aes256>(enc_key, iv, plaintext)?,
    };
    let tag = variant.tag(mac_key, aad, iv, &ciphertext)?;
    Ok(Sealed { ciphertext, tag })
}

/// Check the tag, then decrypt. Any failure is a [`JoseError::CryptoError`].
pub(crate) fn open(
    variant: Variant,
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, JoseError> {
    let (mac_key, enc_key) = variant.split(cek).map_err(|_| JoseError::CryptoError)?;
    let expected = variant.tag(mac_key, aad, iv, ciphertext)?;
    if !bool::from(expected.ct_eq(tag)) {
        return Err(JoseError::CryptoError);
    }
    match variant {
        Variant::A128Hs256 => decrypt::<Aes128>(enc_key, iv, ciphertext),
        Variant::A192Hs384 => decrypt::<Aes192>(enc_key, iv, ciphertext),
        Variant::A256Hs512 => decrypt::<Aes256>(enc_key, iv, ciphertext),
    }
}
