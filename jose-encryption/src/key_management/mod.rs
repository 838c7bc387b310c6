//! JWE key management algorithms (RFC 7518 section 4).

use jose_core::JoseError;
use jose_core::algorithm::{Algorithm, KeyManagementAlgorithm, KeyManagementMode};
use jose_core::header::Header;
use jose_core::jwk::Jwk;

pub(crate) mod aes_gcm_kw;
pub(crate) mod aes_kw;
pub(crate) mod concat_kdf;
mod direct;
pub(crate) mod ecdh;
mod pbes2;
mod rsa_oaep;

pub use pbes2::Pbes2Params;

/// Key size of an AES key wrap, in its own right or after a key derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum KwSize {
    A128,
    A192,
    A256,
}

impl KwSize {
    pub(crate) fn key_len(self) -> usize {
        match self {
            KwSize::A128 => 16,
            KwSize::A192 => 24,
            KwSize::A256 => 32,
        }
    }
}

/// The JWE `alg` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KeyManagement {
    Dir,
    A128Kw,
    A192Kw,
    A256Kw,
    A128GcmKw,
    A192GcmKw,
    A256GcmKw,
    RsaOaep,
    RsaOaep256,
    Pbes2Hs256A128Kw(Pbes2Params),
    Pbes2Hs384A192Kw(Pbes2Params),
    Pbes2Hs512A256Kw(Pbes2Params),
    EcdhEs,
    EcdhEsA128Kw,
    EcdhEsA192Kw,
    EcdhEsA256Kw,
    EcdhSs,
    EcdhSsA128Kw,
    EcdhSsA192Kw,
    EcdhSsA256Kw,
}

/// How each algorithm is carried out.
enum Kind {
    Dir,
    AesKw(KwSize),
    AesGcmKw(KwSize),
    RsaOaep(rsa_oaep::Hash),
    Pbes2(pbes2::Hash, Pbes2Params),
    Ecdh(ecdh::Agreement, Option<KwSize>),
}

impl KeyManagement {
    /// Every algorithm, with the given parameters for PBES2.
    pub fn all(pbes2: Pbes2Params) -> [KeyManagement; 20] {
        use KeyManagement::*;
        [
            Dir,
            A128Kw,
            A192Kw,
            A256Kw,
            A128GcmKw,
            A192GcmKw,
            A256GcmKw,
            RsaOaep,
            RsaOaep256,
            Pbes2Hs256A128Kw(pbes2),
            Pbes2Hs384A192Kw(pbes2),
            Pbes2Hs512A256Kw(pbes2),
            EcdhEs,
            EcdhEsA128Kw,
            EcdhEsA192Kw,
            EcdhEsA256Kw,
            EcdhSs,
            EcdhSsA128Kw,
            EcdhSsA192Kw,
            EcdhSsA256Kw,
        ]
    }

    fn kind(&self) -> Kind {
        use ecdh::Agreement::{EphemeralStatic as Es, StaticStatic as Ss};
        match *self {
            KeyManagement::Dir => Kind::Dir,
            KeyManagement::A128Kw => Kind::AesKw(KwSize::A128),
            KeyManagement::A192Kw => Kind::AesKw(KwSize::A192),
            KeyManagement::A256Kw => Kind::AesKw(KwSize::A256),
            KeyManagement::A128GcmKw => Kind::AesGcmKw(KwSize::A128),
            KeyManagement::A192GcmKw => Kind::AesGcmKw(KwSize::A192),
            KeyManagement::A256GcmKw => Kind::AesGcmKw(KwSize::A256),
            KeyManagement::RsaOaep => Kind::RsaOaep(rsa_oaep::Hash::Sha1),
            KeyManagement::RsaOaep256 => Kind::RsaOaep(rsa_oaep::Hash::Sha256),
            KeyManagement::Pbes2Hs256A128Kw(p) => Kind::Pbes2(pbes2::Hash::Sha256, p),
            KeyManagement::Pbes2Hs384A192Kw(p) => Kind::Pbes2(pbes2::Hash::Sha384, p),
            KeyManagement::Pbes2Hs512A256Kw(p) => Kind::Pbes2(pbes2::Hash::Sha512, p),
            KeyManagement::EcdhEs => Kind::Ecdh(Es, None),
            KeyManagement::EcdhEsA128Kw => Kind::Ecdh(Es, Some(KwSize::A128)),
            KeyManagement::EcdhEsA192Kw => Kind::Ecdh(Es, Some(KwSize::A192)),
            KeyManagement::EcdhEsA256Kw => Kind::Ecdh(Es, Some(KwSize::A256)),
            KeyManagement::EcdhSs => Kind::Ecdh(Ss, None),
            KeyManagement::EcdhSsA128Kw => Kind::Ecdh(Ss, Some(KwSize::A128)),
            KeyManagement::EcdhSsA192Kw => Kind::Ecdh(Ss, Some(KwSize::A192)),
            KeyManagement::EcdhSsA256Kw => Kind::Ecdh(Ss, Some(KwSize::A256)),
        }
    }
}

impl Algorithm for KeyManagement {
    fn name(&self) -> &'static str {
        match *self {
            KeyManagement::Dir => "dir",
            KeyManagement::A128Kw => "A128KW",
            KeyManagement::A192Kw => "A192KW",
            KeyManagement::A256Kw => "A256KW",
            KeyManagement::A128GcmKw => "A128GCMKW",
            KeyManagement::A192GcmKw => "A192GCMKW",
            KeyManagement::A256GcmKw => "A256GCMKW",
            KeyManagement::RsaOaep => "RSA-OAEP",
            KeyManagement::RsaOaep256 => "RSA-OAEP-256",
            KeyManagement::Pbes2Hs256A128Kw(_) => "PBES2-HS256+A128KW",
            KeyManagement::Pbes2Hs384A192Kw(_) => "PBES2-HS384+A192KW",
            KeyManagement::Pbes2Hs512A256Kw(_) => "PBES2-HS512+A256KW",
            KeyManagement::EcdhEs => "ECDH-ES",
            KeyManagement::EcdhEsA128Kw => "ECDH-ES+A128KW",
            KeyManagement::EcdhEsA192Kw => "ECDH-ES+A192KW",
            KeyManagement::EcdhEsA256Kw => "ECDH-ES+A256KW",
            KeyManagement::EcdhSs => "ECDH-SS",
            KeyManagement::EcdhSsA128Kw => "ECDH-SS+A128KW",
            KeyManagement::EcdhSsA192Kw => "ECDH-SS+A192KW",
            KeyManagement::EcdhSsA256Kw => "ECDH-SS+A256KW",
        }
    }

    fn allowed_key_types(&self) -> &'static [&'static str] {
        match self.kind() {
            Kind::Dir | Kind::AesKw(_) | Kind::AesGcmKw(_) | Kind::Pbes2(..) => &["oct"],
            Kind::RsaOaep(_) => &["RSA"],
            Kind::Ecdh(..) => &["EC", "OKP"],
        }
    }
}

impl KeyManagementAlgorithm for KeyManagement {
    fn mode(&self) -> KeyManagementMode {
        match self.kind() {
            Kind::Dir => KeyManagementMode::Direct,
            Kind::AesKw(_) | Kind::AesGcmKw(_) | Kind::Pbes2(..) => KeyManagementMode::KeyWrapping,
            Kind::RsaOaep(_) => KeyManagementMode::KeyEncryption,
            Kind::Ecdh(_, None) => KeyManagementMode::KeyAgreement,
            Kind::Ecdh(_, Some(_)) => KeyManagementMode::KeyAgreementWithKeyWrapping,
        }
    }

    fn agree_key(
        &self,
        key: &Jwk,
        sender_key: Option<&Jwk>,
        cek_len: usize,
        complete_header: &Header,
        additional_header: &mut Header,
    ) -> Result<Vec<u8>, JoseError> {
        match self.kind() {
            Kind::Dir => direct::cek(key, cek_len),
            Kind::Ecdh(agreement, None) => {
                let z = agreement.sender(key, sender_key, additional_header)?;
                ecdh::derive(&z, complete_header, None, cek_len).map(|cek| cek.to_vec())
            }
            _ => Err(JoseError::InvalidConfiguration(
                "this key management algorithm does not derive the content encryption key",
            )),
        }
    }

    fn wrap_key(
        &self,
        key: &Jwk,
        sender_key: Option<&Jwk>,
        cek: &[u8],
        complete_header: &Header,
        additional_header: &mut Header,
    ) -> Result<Vec<u8>, JoseError> {
        match self.kind() {
            Kind::AesKw(size) => aes_kw::wrap(&aes_kw::kek(size, key)?, cek),
            Kind::AesGcmKw(size) => aes_gcm_kw::wrap(size, key, cek, additional_header),
            Kind::RsaOaep(hash) => rsa_oaep::encrypt(hash, key, cek),
            Kind::Pbes2(hash, params) => pbes2::wrap(hash, params, key, cek, additional_header),
            Kind::Ecdh(agreement, Some(size)) => {
                let z = agreement.sender(key, sender_key, additional_header)?;
                let kek = ecdh::derive(&z, complete_header, Some(self.name()), size.key_len())?;
                aes_kw::wrap(&kek, cek)
            }
            _ => Err(JoseError::InvalidConfiguration(
                "this key management algorithm does not wrap the content encryption key",
            )),
        }
    }

    fn unwrap_key(
        &self,
        key: &Jwk,
        sender_key: Option<&Jwk>,
        encrypted_key: &[u8],
        cek_len: usize,
        complete_header: &Header,
    ) -> Result<Vec<u8>, JoseError> {
        if self.mode().derives_cek() && !encrypted_key.is_empty() {
            return Err(JoseError::CryptoError);
        }
        match self.kind() {
            Kind::Dir => direct::cek(key, cek_len),
            Kind::AesKw(size) => aes_kw::unwrap(&aes_kw::kek(size, key)?, encrypted_key),
            Kind::AesGcmKw(size) => aes_gcm_kw::unwrap(size, key, encrypted_key, complete_header),
            Kind::RsaOaep(hash) => rsa_oaep::decrypt(hash, key, encrypted_key),
            Kind::Pbes2(hash, params) => {
                pbes2::unwrap(hash, params, key, encrypted_key, complete_header)
            }
            Kind::Ecdh(agreement, None) => {
                let z = agreement.recipient(key, sender_key, complete_header)?;
                ecdh::derive(&z, complete_header, None, cek_len).map(|cek| cek.to_vec())
            }
            Kind::Ecdh(agreement, Some(size)) => {
                let z = agreement.recipient(key, sender_key, complete_header)?;
                let kek = ecdh::derive(&z, complete_header, Some(self.name()), size.key_len())?;
                aes_kw::unwrap(&kek, encrypted_key)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use jose_core::base64;
    use serde_json::json;

    use super::*;

    fn oct(len: usize) -> Jwk {
        let k: Vec<u8> = (0..len as u8).collect();
        Jwk::from_json(&json!({"kty": "oct", "k": base64::encode(&k)}).to_string()).unwrap()
    }

    fn header(alg: &KeyManagement) -> Header {
        let json = json!({"alg": alg.name(), "enc": "A128GCM"});
        json.as_object().unwrap().clone()
    }

    #[test]
    fn symmetric_wrapping_round_trips() {
        let cek = [7u8; 32];
        let params = Pbes2Params {
            salt_size: 16,
            iterations: 1000,
            ..Pbes2Params::default()
        };
        for (alg, key) in [
            (KeyManagement::A128Kw, oct(16)),
            (KeyManagement::A192Kw, oct(24)),
            (KeyManagement::A256Kw, oct(32)),
            (KeyManagement::A128GcmKw, oct(16)),
            (KeyManagement::A192GcmKw, oct(24)),
            (KeyManagement::A256GcmKw, oct(32)),
            (KeyManagement::Pbes2Hs256A128Kw(params), oct(10)),
            (KeyManagement::Pbes2Hs384A192Kw(params), oct(10)),
            (KeyManagement::Pbes2Hs512A256Kw(params), oct(10)),
        ] {
            assert_eq!(alg.mode(), KeyManagementMode::KeyWrapping);
            let mut additional = Header::new();
            let wrapped = alg
                .wrap_key(&key, None, &cek, &header(&alg), &mut additional)
                .unwrap();
            let mut complete = header(&alg);
            complete.extend(additional);
            let unwrapped = alg.unwrap_key(&key, None, &wrapped, 32, &complete).unwrap();
            assert_eq!(unwrapped, cek, "{}", alg.name());
        }
    }

    #[test]
    fn wrapping_keys_must_have_the_right_size() {
        let mut additional = Header::new();
        let err = KeyManagement::A256Kw
            .wrap_key(&oct(16), None, &[0; 16], &Header::new(), &mut additional)
            .unwrap_err();
        assert!(matches!(err, JoseError::InvalidKey(_)));
    }

    #[test]
    fn dir_uses_the_key() {
        let key = oct(32);
        let alg = KeyManagement::Dir;
        assert!(alg.mode().derives_cek());
        let mut additional = Header::new();
        let cek = alg
            .agree_key(&key, None, 32, &Header::new(), &mut additional)
            .unwrap();
        assert_eq!(cek, (0..32).collect::<Vec<u8>>());
        assert!(additional.is_empty());

        alg.agree_key(&key, None, 16, &Header::new(), &mut additional)
            .unwrap_err();
        assert!(matches!(
            alg.unwrap_key(&key, None, &[1], 32, &Header::new()),
            Err(JoseError::CryptoError)
        ));
    }

    #[test]
    fn modes_reject_the_other_operation() {
        let mut additional = Header::new();
        assert!(matches!(
            KeyManagement::A128Kw.agree_key(&oct(16), None, 16, &Header::new(), &mut additional),
            Err(JoseError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            KeyManagement::Dir.wrap_key(&oct(16), None, &[0; 16], &Header::new(), &mut additional),
            Err(JoseError::InvalidConfiguration(_))
        ));
    }
}
