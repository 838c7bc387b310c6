//! AES key wrap (RFC 3394).

use aes::{Aes128, Aes192, Aes256};
use cipher::consts::U16;
use cipher::generic_array::GenericArray;
use cipher::{BlockDecrypt, BlockEncrypt, BlockSizeUser, KeyInit};
use jose_core::JoseError;
use jose_core::jwk::Jwk;
use subtle::ConstantTimeEq;

use super::KwSize;

const IV: [u8; 8] = [0xa6; 8];

/// The `k` member, which must match the wrap size.
pub(crate) fn kek(size: KwSize, key: &Jwk) -> Result<Vec<u8>, JoseError> {
    let k = key.get_bytes("k")?;
    if k.len() != size.key_len() {
        return Err(JoseError::InvalidKey(
            "the key size does not match the key wrapping algorithm",
        ));
    }
    Ok(k)
}

/// Wrap `data` with a 128, 192 or 256 bit key, chosen by the length of `kek`.
pub(crate) fn wrap(kek: &[u8], data: &[u8]) -> Result<Vec<u8>, JoseError> {
    if data.len() < 16 || data.len() % 8 != 0 {
        return Err(JoseError::InvalidKey(
            "the wrapped key must be a multiple of 64 bits and at least 128 bits",
        ));
    }
    match kek.len() {
        16 => Ok(wrap_with(&block_cipher::<Aes128>(kek)?, data)),
        24 => Ok(wrap_with(&block_cipher::<Aes192>(kek)?, data)),
        32 => Ok(wrap_with(&block_cipher::<Aes256>(kek)?, data)),
        _ => Err(JoseError::InvalidKey("invalid AES key wrap key size")),
    }
}

/// Unwrap and check the integrity value. Any failure is a [`JoseError::CryptoError`].
pub(crate) fn unwrap(kek: &[u8], wrapped: &[u8]) -> Result<Vec<u8>, JoseError> {
    if wrapped.len() < 24 || wrapped.len() % 8 != 0 {
        return Err(JoseError::CryptoError);
    }
    match kek.len() {
        16 => unwrap_with(&block_cipher::<Aes128>(kek)?, wrapped),
        24 => unwrap_with(&block_cipher::<Aes192>(kek)?, wrapped),
        32 => unwrap_with(&block_cipher::<Aes256>(kek)?, wrapped),
        _ => Err(JoseError::InvalidKey("invalid AES key wrap key size")),
    }
}

fn block_cipher<C: KeyInit>(kek: &[u8]) -> Result<C, JoseError> {
    C::new_from_slice(kek).map_err(|_| JoseError::InvalidKey("invalid AES key wrap key size"))
}

fn wrap_with<C>(cipher: &C, data: &[u8]) -> Vec<u8>
where
    C: BlockEncrypt + BlockSizeUser<BlockSize = U16>,
{
    let n = data.len() / 8;
    let mut a = IV;
    let mut r: Vec<[u8; 8]> = data
        .chunks_exact(8)
        .map(|c| c.try_into().unwrap_or_default())
        .collect();

    let mut block = GenericArray::<u8, U16>::default();
    for j in 0..6 {
        for (i, ri) in r.iter_mut().enumerate() {
            block[..8].copy_from_slice(&a);
            block[8..].copy_from_slice(ri);
            cipher.encrypt_block(&mut block);

            let t = ((n * j + i + 1) as u64).to_be_bytes();
            for (x, (b, t)) in a.iter_mut().zip(block[..8].iter().zip(t)) {
                *x = b ^ t;
            }
            ri.copy_from_slice(&block[8..]);
        }
    }

    let mut out = Vec::with_capacity(data.len() + 8);
    out.extend_from_slice(&a);
    r.iter().for_each(|ri| out.extend_from_slice(ri));
    out
}

fn unwrap_with<C>(cipher: &C, wrapped: &[u8]) -> Result<Vec<u8>, JoseError>
where
    C: BlockDecrypt + BlockSizeUser<BlockSize = U16>,
{
    let n = wrapped.len() / 8 - 1;
    let (head, rest) = wrapped.split_at(8);
    let mut a: [u8; 8] = head.try_into().map_err(|_| JoseError::CryptoError)?;
    let mut r: Vec<[u8; 8]> = rest
        .chunks_exact(8)
        .map(|c| c.try_into().unwrap_or_default())
        .collect();

    let mut block = GenericArray::<u8, U16>::default();
    for j in (0..6).rev() {
        for (i, ri) in r.iter_mut().enumerate().rev() {
            let t = ((n * j + i + 1) as u64).to_be_bytes();
            for (b, (x, t)) in block[..8].iter_mut().zip(a.iter().zip(t)) {
                *b = x ^ t;
            }
            block[8..].copy_from_slice(ri);
            cipher.decrypt_block(&mut block);

            a.copy_from_slice(&block[..8]);
            ri.copy_from_slice(&block[8..]);
        }
    }

    if !bool::from(a.ct_eq(&IV)) {
        return Err(JoseError::CryptoError);
    }
    Ok(r.concat())
}
