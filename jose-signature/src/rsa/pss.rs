//! EMSA-PSS (RFC 8017 section 9.1) over raw RSA, with MGF1 and a salt as long as the hash.

use jose_core::JoseError;
use jose_core::algorithm::random_bytes;
use jose_core::jwk::Jwk;
use rsa::hazmat::{rsa_decrypt_and_check, rsa_encrypt};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::BigUint;
use subtle::ConstantTimeEq;

use crate::hash::Hash;

fn mgf1(hash: Hash, seed: &[u8], len: usize) -> Vec<u8> {
    let mut mask = Vec::with_capacity(len + hash.output_len());
    let mut counter = 0u32;
    while mask.len() < len {
        mask.extend_from_slice(&hash.digest(&[seed, &counter.to_be_bytes()]));
        counter += 1;
    }
    mask.truncate(len);
    mask
}

/// `H(0x00 * 8 ‖ mHash ‖ salt)`
fn salted_hash(hash: Hash, m_hash: &[u8], salt: &[u8]) -> Vec<u8> {
    hash.digest(&[&[0; 8], m_hash, salt])
}

fn encode(hash: Hash, message: &[u8], em_bits: usize) -> Result<Vec<u8>, JoseError> {
    let h_len = hash.output_len();
    let s_len = h_len;
    let em_len = em_bits.div_ceil(8);
    if em_len < h_len + s_len + 2 {
        return Err(JoseError::InvalidKey("the RSA modulus is too small"));
    }

    let m_hash = hash.digest(&[message]);
    let salt = random_bytes(s_len)?;
    let h = salted_hash(hash, &m_hash, &salt);

    let db_len = em_len - h_len - 1;
    let mut db = vec![0; db_len - s_len - 1];
    db.push(0x01);
    db.extend_from_slice(&salt);

    for (b, m) in db.iter_mut().zip(mgf1(hash, &h, db_len)) {
        *b ^= m;
    }
    db[0] &= 0xff >> (8 * em_len - em_bits);

    let mut em = db;
    em.extend_from_slice(&h);
    em.push(0xbc);
    Ok(em)
}

fn check(hash: Hash, message: &[u8], em: &[u8], em_bits: usize) -> bool {
    let h_len = hash.output_len();
    let s_len = h_len;
    let em_len = em.len();
    if em_len < h_len + s_len + 2 || em[em_len - 1] != 0xbc {
        return false;
    }

    let (masked_db, rest) = em.split_at(em_len - h_len - 1);
    let h = &rest[..h_len];
    let top = 0xff_u8 >> (8 * em_len - em_bits);
    if masked_db[0] & !top != 0 {
        return false;
    }

    let mut db: Vec<u8> = masked_db
        .iter()
        .zip(mgf1(hash, h, masked_db.len()))
        .map(|(b, m)| b ^ m)
        .collect();
    db[0] &= top;

    let ps_len = em_len - h_len - s_len - 2;
    if db[..ps_len].iter().any(|&b| b != 0) || db[ps_len] != 0x01 {
        return false;
    }
    let salt = &db[ps_len + 1..];

    let m_hash = hash.digest(&[message]);
    salted_hash(hash, &m_hash, salt).ct_eq(h).into()
}

pub(crate) fn sign(hash: Hash, key: &Jwk, input: &[u8]) -> Result<Vec<u8>, JoseError> {
    let private = super::private_key(key)?;
    let mod_bits = private.n().bits();
    let em = encode(hash, input, mod_bits - 1)?;

    let m = BigUint::from_bytes_be(&em);
    let s = rsa_decrypt_and_check(&private, Some(&mut OsRng), &m)
        .map_err(|_| JoseError::CryptoError)?;
    Ok(left_pad(&s.to_bytes_be(), private.size()))
}

pub(crate) fn verify(
    hash: Hash,
    key: &Jwk,
    input: &[u8],
    signature: &[u8],
) -> Result<bool, JoseError> {
    let public = super::public_key(key)?;
    if signature.len() != public.size() {
        return Ok(false);
    }
    let s = BigUint::from_bytes_be(signature);
    if &s >= public.n() {
        return Ok(false);
    }
    let Ok(m) = rsa_encrypt(&public, &s) else {
        return Ok(false);
    };

    let em_bits = public.n().bits() - 1;
    let em_len = em_bits.div_ceil(8);
    let m = m.to_bytes_be();
    if m.len() > em_len {
        return Ok(false);
    }
    Ok(check(hash, input, &left_pad(&m, em_len), em_bits))
}

fn left_pad(bytes: &[u8], len: usize) -> Vec<u8> {
    let mut out = vec![0; len.saturating_sub(bytes.len())];
    out.extend_from_slice(bytes);
    out
}
