//! Key generation.
//!
//! Every function takes `extra` members (`kid`, `use`, `alg`, ...) that are added to the
//! generated key. The key material members always take precedence over `extra`.

use curve25519_dalek::MontgomeryPoint;
use ed25519_dalek::SigningKey;
use jose_core::algorithm::random_bytes;
use jose_core::jwk::Jwk;
use jose_core::{JoseError, base64};
use rsa::RsaPrivateKey;
use rsa::rand_core::OsRng;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use serde_json::{Map, Value};
use zeroize::Zeroizing;

/// The smallest RSA modulus this module generates.
pub const MIN_RSA_BITS: usize = 2048;

fn build(extra: Map<String, Value>, members: &[(&str, String)]) -> Result<Jwk, JoseError> {
    let mut values = extra;
    for (name, value) in members {
        values.insert((*name).to_owned(), Value::String(value.clone()));
    }
    Jwk::new(values)
}

fn seed32() -> Result<Zeroizing<[u8; 32]>, JoseError> {
    let bytes = Zeroizing::new(random_bytes(32)?);
    let mut seed = Zeroizing::new([0; 32]);
    seed.copy_from_slice(&bytes);
    Ok(seed)
}

/// A random symmetric key of `bits` bits.
pub fn create_oct_key(bits: usize, extra: Map<String, Value>) -> Result<Jwk, JoseError> {
    if bits == 0 || bits % 8 != 0 {
        return Err(JoseError::InvalidConfiguration(
            "the key size must be a positive multiple of 8",
        ));
    }
    let k = Zeroizing::new(random_bytes(bits / 8)?);
    build(extra, &[("kty", "oct".into()), ("k", base64::encode(&*k))])
}

/// A new RSA key pair with a modulus of `bits` bits and the public exponent 65537.
pub fn create_rsa_key(bits: usize, extra: Map<String, Value>) -> Result<Jwk, JoseError> {
    if bits < MIN_RSA_BITS || bits % 8 != 0 {
        return Err(JoseError::InvalidConfiguration(
            "RSA keys must be at least 2048 bits and a multiple of 8",
        ));
    }
    let key = RsaPrivateKey::new(&mut OsRng, bits).map_err(|_| JoseError::CryptoError)?;

    let [p, q] = key.primes() else {
        return Err(JoseError::CryptoError);
    };
    let (Some(dp), Some(dq), Some(qi)) = (key.dp(), key.dq(), key.crt_coefficient()) else {
        return Err(JoseError::CryptoError);
    };

    let encode = |n: &rsa::BigUint| base64::encode(&*Zeroizing::new(n.to_bytes_be()));
    build(
        extra,
        &[
            ("kty", "RSA".into()),
            ("n", encode(key.n())),
            ("e", encode(key.e())),
            ("d", encode(key.d())),
            ("p", encode(p)),
            ("q", encode(q)),
            ("dp", encode(dp)),
            ("dq", encode(dq)),
            ("qi", encode(&qi)),
        ],
    )
}

/// A new key pair on `P-256`, `P-384` or `P-521`.
pub fn create_ec_key(curve: &str, extra: Map<String, Value>) -> Result<Jwk, JoseError> {
    let curve = jose_ecc::Curve::from_name(curve)
        .map_err(|e| JoseError::InvalidConfiguration(unsupported(&e)))?;
    let private = curve
        .create_private_key()
        .map_err(|_| JoseError::CryptoError)?;
    let public = curve
        .create_public_key(&private)
        .map_err(|_| JoseError::CryptoError)?;
    let d = Zeroizing::new(private.to_bytes(curve.field_size()));

    build(
        extra,
        &[
            ("kty", "EC".into()),
            ("crv", curve.name().into()),
            ("x", base64::encode(public.x_bytes())),
            ("y", base64::encode(public.y_bytes())),
            ("d", base64::encode(&*d)),
        ],
    )
}

fn unsupported(error: &jose_ecc::EcError) -> &'static str {
    match error {
        jose_ecc::EcError::UnsupportedCurve(_) => "unsupported curve",
        _ => "invalid curve",
    }
}

/// A new octet key pair, `Ed25519` for signatures or `X25519` for key agreement.
pub fn create_okp_key(curve: &str, extra: Map<String, Value>) -> Result<Jwk, JoseError> {
    let d = seed32()?;
    let x = match curve {
        "Ed25519" => SigningKey::from_bytes(&d).verifying_key().to_bytes(),
        "X25519" => MontgomeryPoint::mul_base_clamped(*d).to_bytes(),
        _ => return Err(JoseError::InvalidConfiguration("unsupported curve")),
    };

    build(
        extra,
        &[
            ("kty", "OKP".into()),
            ("crv", curve.into()),
            ("x", base64::encode(x)),
            ("d", base64::encode(&*d)),
        ],
    )
}

/// The key used with the `none` signature algorithm.
pub fn create_none_key() -> Result<Jwk, JoseError> {
    build(
        Map::new(),
        &[
            ("kty", "none".into()),
            ("alg", "none".into()),
            ("use", "sig".into()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use jose_core::algorithm::{KeyManagementAlgorithm, SignatureAlgorithm};
    use jose_core::header::Header;
    use serde_json::json;

    use super::*;
    use crate::{JwsAlgorithm, KeyManagement};

    fn extra() -> Map<String, Value> {
        json!({"kid": "generated", "kty": "ignored"})
            .as_object()
            .unwrap()
            .clone()
    }

    #[test]
    fn oct_keys() {
        let key = create_oct_key(256, extra()).unwrap();
        assert_eq!(key.kty(), "oct");
        assert_eq!(key.get_str("kid"), Some("generated"));
        assert_eq!(key.get_bytes("k").unwrap().len(), 32);

        create_oct_key(0, Map::new()).unwrap_err();
        create_oct_key(100, Map::new()).unwrap_err();
    }

    #[test]
    fn rsa_keys() {
        create_rsa_key(1024, Map::new()).unwrap_err();

        let key = create_rsa_key(2048, Map::new()).unwrap();
        assert_eq!(key.kty(), "RSA");
        assert_eq!(key.get_bytes("n").unwrap().len(), 256);
        assert_eq!(key.get_bytes("e").unwrap(), [1, 0, 1]);
        for member in ["d", "p", "q", "dp", "dq", "qi"] {
            assert!(key.has(member), "{member}");
        }

        let signature = JwsAlgorithm::Ps256.sign(&key, b"input").unwrap();
        assert!(
            JwsAlgorithm::Ps256
                .verify(&key.to_public(), b"input", &signature)
                .unwrap()
        );
    }

    #[test]
    fn ec_keys() {
        for (crv, alg, size) in [
            ("P-256", JwsAlgorithm::Es256, 32),
            ("P-384", JwsAlgorithm::Es384, 48),
            ("P-521", JwsAlgorithm::Es512, 66),
        ] {
            let key = create_ec_key(crv, Map::new()).unwrap();
            assert_eq!(key.get_str("crv"), Some(crv));
            assert_eq!(key.get_bytes("x").unwrap().len(), size);
            assert_eq!(key.get_bytes("d").unwrap().len(), size);

            let signature = alg.sign(&key, b"input").unwrap();
            assert!(alg.verify(&key.to_public(), b"input", &signature).unwrap());
        }

        create_ec_key("secp256k1", Map::new()).unwrap_err();
    }

    #[test]
    fn okp_keys() {
        let ed = create_okp_key("Ed25519", Map::new()).unwrap();
        let signature = JwsAlgorithm::EdDsa.sign(&ed, b"input").unwrap();
        assert!(
            JwsAlgorithm::EdDsa
                .verify(&ed.to_public(), b"input", &signature)
                .unwrap()
        );

        let x = create_okp_key("X25519", Map::new()).unwrap();
        let alg = KeyManagement::EcdhEs;
        let mut additional = Header::new();
        let header = json!({"alg": "ECDH-ES", "enc": "A128GCM"})
            .as_object()
            .unwrap()
            .clone();
        let cek = alg
            .agree_key(&x.to_public(), None, 16, &header, &mut additional)
            .unwrap();

        let mut complete = header;
        complete.extend(additional);
        let recovered = alg.unwrap_key(&x, None, &[], 16, &complete).unwrap();
        assert_eq!(cek, recovered);

        create_okp_key("Ed448", Map::new()).unwrap_err();
    }

    #[test]
    fn none_key() {
        let key = create_none_key().unwrap();
        assert_eq!(key.kty(), "none");
        assert_eq!(key.get_str("alg"), Some("none"));
    }
}
