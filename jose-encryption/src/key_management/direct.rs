use jose_core::JoseError;
use jose_core::jwk::Jwk;

/// `dir`: the shared symmetric key is the CEK.
pub(super) fn cek(key: &Jwk, cek_len: usize) -> Result<Vec<u8>, JoseError> {
    let k = key.get_bytes("k")?;
    if k.len() != cek_len {
        return Err(JoseError::InvalidKey(
            "the key size does not match the content encryption algorithm",
        ));
    }
    Ok(k)
}
