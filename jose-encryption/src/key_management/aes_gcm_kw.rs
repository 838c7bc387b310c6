//! AES-GCM key wrap: the CEK is encrypted with AES-GCM, `iv` and `tag` go in the header.

use jose_core::algorithm::{Sealed, random_bytes};
use jose_core::header::{self, Header};
use jose_core::jwk::Jwk;
use jose_core::{JoseError, base64};
use serde_json::Value;

use super::{KwSize, aes_kw};
use crate::content::aes_gcm;

pub(super) fn wrap(
    size: KwSize,
    key: &Jwk,
    cek: &[u8],
    additional_header: &mut Header,
) -> Result<Vec<u8>, JoseError> {
    let kek = aes_kw::kek(size, key)?;
    let iv = random_bytes(aes_gcm::IV_LEN)?;
    let Sealed { ciphertext, tag } = aes_gcm::seal(&kek, &iv, &[], cek)?;

    additional_header.insert("iv".into(), Value::String(base64::encode(&iv)));
    additional_header.insert("tag".into(), Value::String(base64::encode(&tag)));
    Ok(ciphertext)
}

pub(super) fn unwrap(
    size: KwSize,
    key: &Jwk,
    encrypted_key: &[u8],
    complete_header: &Header,
) -> Result<Vec<u8>, JoseError> {
    let kek = aes_kw::kek(size, key)?;
    let iv = header::require_bytes(complete_header, "iv")?;
    let tag = header::require_bytes(complete_header, "tag")?;
    aes_gcm::open(&kek, &iv, &[], encrypted_key, &tag)
}

#[cfg(test)]
mod tests {
    use jose_core::algorithm::KeyManagementAlgorithm;

    use super::*;
    use crate::KeyManagement;

    #[test]
    fn iv_and_tag_are_required() {
        let key = Jwk::from_json(r#"{"kty":"oct","k":"AAAAAAAAAAAAAAAAAAAAAA"}"#).unwrap();
        let mut additional = Header::new();
        let wrapped = KeyManagement::A128GcmKw
            .wrap_key(&key, None, &[1; 16], &Header::new(), &mut additional)
            .unwrap();
        assert_eq!(wrapped.len(), 16);
        assert_eq!(base64::decode(additional["iv"].as_str().unwrap()).unwrap().len(), 12);
        assert_eq!(base64::decode(additional["tag"].as_str().unwrap()).unwrap().len(), 16);

        for missing in ["iv", "tag"] {
            let mut header = additional.clone();
            header.remove(missing);
            let err = KeyManagement::A128GcmKw
                .unwrap_key(&key, None, &wrapped, 16, &header)
                .unwrap_err();
            assert!(matches!(err, JoseError::MissingHeaderParameter(p) if p == missing));
        }

        let mut header = additional.clone();
        header.insert("tag".into(), Value::String(base64::encode([0; 16])));
        assert!(matches!(
            KeyManagement::A128GcmKw.unwrap_key(&key, None, &wrapped, 16, &header),
            Err(JoseError::CryptoError)
        ));
    }
}
