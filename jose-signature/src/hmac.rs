//! HS256, HS384 and HS512.

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use jose_core::JoseError;
use jose_core::jwk::Jwk;
use sha2::{Sha256, Sha384, Sha512};

use crate::hash::Hash;

/// The `k` member, which must be at least as long as the hash output.
fn secret(hash: Hash, key: &Jwk) -> Result<Vec<u8>, JoseError> {
    let k = key.get_bytes("k")?;
    if k.len() < hash.output_len() {
        return Err(JoseError::InvalidKey(
            "the key must be at least as long as the hash output",
        ));
    }
    Ok(k)
}

fn mac<M: Mac + KeyInit>(key: &[u8], input: &[u8]) -> Result<M, JoseError> {
    let mut mac = <M as KeyInit>::new_from_slice(key)
        .map_err(|_| JoseError::InvalidKey("invalid HMAC key"))?;
    Mac::update(&mut mac, input);
    Ok(mac)
}

pub(crate) fn sign(hash: Hash, key: &Jwk, input: &[u8]) -> Result<Vec<u8>, JoseError> {
    let k = secret(hash, key)?;
    let tag = match hash {
        Hash::Sha256 => mac::<Hmac<Sha256>>(&k, input)?.finalize().into_bytes().to_vec(),
        Hash::Sha384 => mac::<Hmac<Sha384>>(&k, input)?.finalize().into_bytes().to_vec(),
        Hash::Sha512 => mac::<Hmac<Sha512>>(&k, input)?.finalize().into_bytes().to_vec(),
    };
    Ok(tag)
}

pub(crate) fn verify(
    hash: Hash,
    key: &Jwk,
    input: &[u8],
    signature: &[u8],
) -> Result<bool, JoseError> {
    let k = secret(hash, key)?;
    let valid = match hash {
        Hash::Sha256 => mac::<Hmac<Sha256>>(&k, input)?.verify_slice(signature),
        Hash::Sha384 => mac::<Hmac<Sha384>>(&k, input)?.verify_slice(signature),
        Hash::Sha512 => mac::<Hmac<Sha512>>(&k, input)?.verify_slice(signature),
    };
    Ok(valid.is_ok())
}
