//! The Concat KDF of NIST SP 800-56A with SHA-256, as profiled by RFC 7518 section 4.6.2.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

fn length_prefixed(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(data);
}

/// Derive `key_len` bytes from the shared secret `z`.
pub(crate) fn derive(
    z: &[u8],
    algorithm: &str,
    apu: &[u8],
    apv: &[u8],
    key_len: usize,
) -> Zeroizing<Vec<u8>> {
    let mut other_info = Vec::new();
    length_prefixed(&mut other_info, algorithm.as_bytes());
    length_prefixed(&mut other_info, apu);
    length_prefixed(&mut other_info, apv);
    other_info.extend_from_slice(&(key_len as u32 * 8).to_be_bytes());

    let mut key = Zeroizing::new(Vec::with_capacity(key_len.next_multiple_of(32)));
    let mut counter = 1u32;
    while key.len() < key_len {
        let mut hasher = Sha256::new();
        hasher.update(counter.to_be_bytes());
        hasher.update(z);
        hasher.update(&other_info);
        key.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    key.truncate(key_len);
    key
}
