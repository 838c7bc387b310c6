//! PBES2 (RFC 7518 section 4.8): a PBKDF2 derived key wraps the CEK with AES key wrap.

use jose_core::algorithm::random_bytes;
use jose_core::header::{self, Header};
use jose_core::jwk::Jwk;
use jose_core::{JoseError, base64};
use pbkdf2::pbkdf2_hmac;
use serde_json::Value;
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use super::aes_kw;

/// Parameters used when wrapping. Unwrapping takes the salt and count from the header and
/// only enforces `max_iterations`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pbes2Params {
    /// Size of the random `p2s` salt in bytes, at least 8.
    pub salt_size: usize,
    /// The `p2c` iteration count.
    pub iterations: u32,
    /// The largest `p2c` accepted when unwrapping.
    pub max_iterations: u32,
}

impl Default for Pbes2Params {
    fn default() -> Self {
        Self {
            salt_size: 64,
            iterations: 4096,
            max_iterations: 1_000_000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Hash {
    Sha256,
    Sha384,
    Sha512,
}

impl Hash {
    fn alg(self) -> &'static str {
        match self {
            Hash::Sha256 => "PBES2-HS256+A128KW",
            Hash::Sha384 => "PBES2-HS384+A192KW",
            Hash::Sha512 => "PBES2-HS512+A256KW",
        }
    }

    fn key_len(self) -> usize {
        match self {
            Hash::Sha256 => 16,
            Hash::Sha384 => 24,
            Hash::Sha512 => 32,
        }
    }

    fn derive(self, password: &[u8], p2s: &[u8], iterations: u32) -> Zeroizing<Vec<u8>> {
        let alg = self.alg();
        let mut salt = Vec::with_capacity(alg.len() + 1 + p2s.len());
        salt.extend_from_slice(alg.as_bytes());
        salt.push(0);
        salt.extend_from_slice(p2s);

        let mut key = Zeroizing::new(vec![0; self.key_len()]);
        match self {
            Hash::Sha256 => pbkdf2_hmac::<Sha256>(password, &salt, iterations, &mut key),
            Hash::Sha384 => pbkdf2_hmac::<Sha384>(password, &salt, iterations, &mut key),
            Hash::Sha512 => pbkdf2_hmac::<Sha512>(password, &salt, iterations, &mut key),
        }
        key
    }
}

pub(super) fn wrap(
    hash: Hash,
    params: Pbes2Params,
    key: &Jwk,
    cek: &[u8],
    additional_header: &mut Header,
) -> Result<Vec<u8>, JoseError> {
    if params.salt_size < 8 {
        return Err(JoseError::InvalidConfiguration(
            "the PBES2 salt must be at least 8 bytes",
        ));
    }
    if params.iterations == 0 || params.iterations > params.max_iterations {
        return Err(JoseError::InvalidConfiguration(
            "the PBES2 iteration count must be positive and at most the maximum",
        ));
    }

    let password = Zeroizing::new(key.get_bytes("k")?);
    let p2s = random_bytes(params.salt_size)?;
    let kek = hash.derive(&password, &p2s, params.iterations);
    let wrapped = aes_kw::wrap(&kek, cek)?;

    additional_header.insert("p2s".into(), Value::String(base64::encode(&p2s)));
    additional_header.insert("p2c".into(), Value::from(params.iterations));
    Ok(wrapped)
}

pub(super) fn unwrap(
    hash: Hash,
    params: Pbes2Params,
    key: &Jwk,
    encrypted_key: &[u8],
    complete_header: &Header,
) -> Result<Vec<u8>, JoseError> {
    let p2s = header::require_bytes(complete_header, "p2s")?;
    let p2c = match complete_header.get("p2c") {
        None => return Err(JoseError::MissingHeaderParameter("p2c".into())),
        Some(p2c) => p2c
            .as_u64()
            .and_then(|c| u32::try_from(c).ok())
            .filter(|&c| c > 0)
            .ok_or_else(|| {
                JoseError::InvalidHeader(
                    "the header parameter \"p2c\" must be a positive integer".into(),
                )
            })?,
    };
    if p2c > params.max_iterations {
        return Err(JoseError::InvalidHeader(format!(
            "the header parameter \"p2c\" exceeds {}",
            params.max_iterations
        )));
    }

    let password = Zeroizing::new(key.get_bytes("k")?);
    let kek = hash.derive(&password, &p2s, p2c);
    aes_kw::unwrap(&kek, encrypted_key)
}

#[cfg(test)]
mod tests {
    use jose_core::algorithm::KeyManagementAlgorithm;
    use serde_json::json;

    use super::*;
    use crate::KeyManagement;

    // RFC 7517 appendix C
    const PASSWORD: &str = "VGh1cyBmcm9tIG15IGxpcHMsIGJ5IHlvdXJzLCBteSBzaW4gaXMgcHVyZ2VkLg";
    const CEK: [u8; 32] = [
        111, 27, 25, 52, 66, 29, 20, 78, 92, 176, 56, 240, 65, 208, 82, 112, 161, 131, 36, 55,
        202, 236, 185, 172, 129, 23, 153, 194, 195, 48, 253, 182,
    ];
    const ENCRYPTED_KEY: &str = "TrqXOwuNUfDV9VPTNbyGvEJ9JMjefAVn-TR1uIxR9p6hsRQh9Tk7BA";

    fn password() -> Jwk {
        Jwk::from_json(&json!({"kty": "oct", "k": PASSWORD}).to_string()).unwrap()
    }

    fn header() -> Header {
        json!({
            "alg": "PBES2-HS256+A128KW",
            "p2s": "2WCTcJZ1Rvd_CJuJripQ1w",
            "p2c": 4096,
            "enc": "A128CBC-HS256",
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn rfc7517_appendix_c() {
        let alg = KeyManagement::Pbes2Hs256A128Kw(Pbes2Params::default());
        let encrypted_key = base64::decode(ENCRYPTED_KEY).unwrap();
        let cek = alg
            .unwrap_key(&password(), None, &encrypted_key, 32, &header())
            .unwrap();
        assert_eq!(cek, CEK);
    }

    #[test]
    fn wrapping_sets_salt_and_count() {
        let params = Pbes2Params {
            salt_size: 16,
            iterations: 1200,
            ..Pbes2Params::default()
        };
        let alg = KeyManagement::Pbes2Hs512A256Kw(params);
        let mut additional = Header::new();
        alg.wrap_key(&password(), None, &CEK, &Header::new(), &mut additional)
            .unwrap();
        assert_eq!(additional["p2c"], 1200);
        let p2s = base64::decode(additional["p2s"].as_str().unwrap()).unwrap();
        assert_eq!(p2s.len(), 16);
    }

    #[test]
    fn salt_and_count_are_required() {
        let alg = KeyManagement::Pbes2Hs256A128Kw(Pbes2Params::default());
        let encrypted_key = base64::decode(ENCRYPTED_KEY).unwrap();

        for missing in ["p2s", "p2c"] {
            let mut header = header();
            header.remove(missing);
            let err = alg
                .unwrap_key(&password(), None, &encrypted_key, 32, &header)
                .unwrap_err();
            assert!(matches!(err, JoseError::MissingHeaderParameter(p) if p == missing));
        }

        let mut header = header();
        header.insert("p2c".into(), json!(0));
        assert!(matches!(
            alg.unwrap_key(&password(), None, &encrypted_key, 32, &header),
            Err(JoseError::InvalidHeader(_))
        ));
    }

    #[test]
    fn weak_parameters_are_rejected() {
        for params in [
            Pbes2Params {
                salt_size: 4,
                ..Pbes2Params::default()
            },
            Pbes2Params {
                iterations: 2_000_000,
                ..Pbes2Params::default()
            },
        ] {
            let alg = KeyManagement::Pbes2Hs256A128Kw(params);
            let mut additional = Header::new();
            assert!(matches!(
                alg.wrap_key(&password(), None, &CEK, &Header::new(), &mut additional),
                Err(JoseError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn iteration_count_is_capped() {
        let alg = KeyManagement::Pbes2Hs256A128Kw(Pbes2Params {
            max_iterations: 4095,
            ..Pbes2Params::default()
        });
        let encrypted_key = base64::decode(ENCRYPTED_KEY).unwrap();
        assert!(matches!(
            alg.unwrap_key(&password(), None, &encrypted_key, 32, &header()),
            Err(JoseError::InvalidHeader(_))
        ));

        let mut header = header();
        header.insert("p2c".into(), json!(u32::MAX));
        let alg = KeyManagement::Pbes2Hs256A128Kw(Pbes2Params::default());
        assert!(matches!(
            alg.unwrap_key(&password(), None, &encrypted_key, 32, &header),
            Err(JoseError::InvalidHeader(_))
        ));
    }
}
