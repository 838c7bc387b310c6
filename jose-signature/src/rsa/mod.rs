//! RSASSA-PKCS1-v1_5 and RSASSA-PSS.

use jose_core::JoseError;
use jose_core::jwk::Jwk;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};

pub(crate) mod pkcs1;
pub(crate) mod pss;

fn uint(key: &Jwk, name: &'static str) -> Result<BigUint, JoseError> {
    key.get_bytes(name).map(|b| BigUint::from_bytes_be(&b))
}

pub(crate) fn public_key(key: &Jwk) -> Result<RsaPublicKey, JoseError> {
    RsaPublicKey::new(uint(key, "n")?, uint(key, "e")?)
        .map_err(|_| JoseError::InvalidKey("invalid RSA public key"))
}

/// The private key from `n`, `e` and `d`, with the primes `p` and `q` when present.
pub(crate) fn private_key(key: &Jwk) -> Result<RsaPrivateKey, JoseError> {
    let primes = match (key.has("p"), key.has("q")) {
        (true, true) => vec![uint(key, "p")?, uint(key, "q")?],
        _ => Vec::new(),
    };
    let private = RsaPrivateKey::from_components(uint(key, "n")?, uint(key, "e")?, uint(key, "d")?, primes)
        .map_err(|_| JoseError::InvalidKey("invalid RSA private key"))?;
    private
        .validate()
        .map_err(|_| JoseError::InvalidKey("invalid RSA private key"))?;
    Ok(private)
}

#[cfg(test)]
pub(crate) mod tests {
    use jose_core::algorithm::SignatureAlgorithm;
    use jose_core::jwk::Jwk;

    use crate::JwsAlgorithm;

    /// The RSA key of RFC 7515 appendix A.2.
    pub(crate) fn key() -> Jwk {
        Jwk::from_json(
            r#"{"kty":"RSA",
            "n":"ofgWCuLjybRlzo0tZWJjNiuSfb4p4fAkd_wWJcyQoTbji9k0l8W26mPddxHmfHQp-Vaw-4qPCJrcS2mJPMEzP1Pt0Bm4d4QlL-yRT-SFd2lZS-pCgNMsD1W_YpRPEwOWvG6b32690r2jZ47soMZo9wGzjb_7OMg0LOL-bSf63kpaSHSXndS5z5rexMdbBYUsLA9e-KXBdQOS-UTo7WTBEMa2R2CapHg665xsmtdVMTBQY4uDZlxvb3qCo5ZwKh9kG4LT6_I5IhlJH7aGhyxXFvUK-DWNmoudF8NAco9_h9iaGNj8q2ethFkMLs91kzk2PAcDTW9gb54h4FRWyuXpoQ",
            "e":"AQAB",
            "d":"Eq5xpGnNCivDflJsRQBXHx1hdR1k6Ulwe2JZD50LpXyWPEAeP88vLNO97IjlA7_GQ5sLKMgvfTeXZx9SE-7YwVol2NXOoAJe46sui395IW_GO-pWJ1O0BkTGoVEn2bKVRUCgu-GjBVaYLU6f3l9kJfFNS3E0QbVdxzubSu3Mkqzjkn439X0M_V51gfpRLI9JYanrC4D4qAdGcopV_0ZHHzQlBjudU2QvXt4ehNYTCBr6XCLQUShb1juUO1ZdiYoFaFQT5Tw8bGUl_x_jTj3ccPDVZFD9pIuhLhBOneufuBiB4cS98l2SR_RQyGWSeWjnczT0QU91p1DhOVRuOopznQ",
            "p":"4BzEEOtIpmVdVEZNCqS7baC4crd0pqnRH_5IB3jw3bcxGn6QLvnEtfdUdiYrqBdss1l58BQ3KhooKeQTa9AB0Hw_Py5PJdTJNPY8cQn7ouZ2KKDcmnPGBY5t7yLc1QlQ5xHdwW1VhvKn-nXqhJTBgIPgtldC-KDV5z-y2XDwGUc",
            "q":"uQPEfgmVtjL0Uyyx88GZFF1fOunH3-7cepKmtH4pxhtCoHqpWmT8YAmZxaewHgHAjLYsp1ZSe7zFYHj7C6ul7TjeLQeZD_YwD66t62wDmpe_HlB-TnBA-njbglfIsRLtXlnDzQkv5dTltRJ11BKBBypeeF6689rjcJIDEz9RWdc",
            "dp":"BwKfV3Akq5_MFZDFZCnW-wzl-CCo83WoZvnLQwCTeDv8uzluRSnm71I3QCLdhrqE2e9YkxvuxdBfpT_PI7Yz-FOKnu1R6HsJeDCjn12Sk3vmAktV2zb34MCdy7cpdTh_YVr7tss2u6vneTwrA86rZtu5Mbr1C1XsmvkxHQAdYo0",
            "dq":"h_96-mK1R_7glhsum81dZxjTnYynPbZpHziZjeeHcXYsXaaMwkOlODsWa7I9xXDoRwbKgB719rrmI2oKr6N3Do9U0ajaHF-NKJnwgjMd2w9cjz3_-kyNlxAr2v4IKhGNpmM5iIgOS1VZnOZ68m6_pbLBSp3nssTdlqvd0tIiTHU",
            "qi":"IYd7DHOhrWvxkwPQsRM2tOgrjbcrfvtQJipd-DlcxyVuuM9sQLdgjVk2oy26F0EmpScGLq2MowX7fhd_QJQ3ydy5cY7YIBi87w93IKLEdfnbJtoOPLUW0ITrJReOgo1cq9SbsxYawBgfp_gh6A5603k2-ZQwVK0JKSHuLFkuQ3U"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn pkcs1_is_deterministic() {
        let key = key();
        let a = JwsAlgorithm::Rs256.sign(&key, b"payload").unwrap();
        let b = JwsAlgorithm::Rs256.sign(&key, b"payload").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 256);
        assert!(JwsAlgorithm::Rs256.verify(&key.to_public(), b"payload", &a).unwrap());
    }

    #[test]
    fn all_rsa_algorithms_round_trip() {
        let key = key();
        let public = key.to_public();
        for alg in [
            JwsAlgorithm::Rs256,
            JwsAlgorithm::Rs384,
            JwsAlgorithm::Rs512,
            JwsAlgorithm::Ps256,
            JwsAlgorithm::Ps384,
            JwsAlgorithm::Ps512,
        ] {
            let mut signature = alg.sign(&key, b"payload").unwrap();
            assert!(alg.verify(&public, b"payload", &signature).unwrap(), "{alg:?}");
            assert!(!alg.verify(&public, b"Payload", &signature).unwrap(), "{alg:?}");
            signature[17] ^= 0x40;
            assert!(!alg.verify(&public, b"payload", &signature).unwrap(), "{alg:?}");
        }
    }

    #[test]
    fn signing_needs_the_private_exponent() {
        let public = key().to_public();
        assert!(matches!(
            JwsAlgorithm::Ps256.sign(&public, b"payload"),
            Err(jose_core::JoseError::MissingKeyParameter("d"))
        ));
    }

    #[test]
    fn primes_are_optional() {
        let key = key();
        let without = key
            .without("p")
            .and_then(|k| k.without("q"))
            .and_then(|k| k.without("dp"))
            .and_then(|k| k.without("dq"))
            .and_then(|k| k.without("qi"))
            .unwrap();
        let signature = JwsAlgorithm::Rs256.sign(&without, b"payload").unwrap();
        assert_eq!(signature, JwsAlgorithm::Rs256.sign(&key, b"payload").unwrap());
    }
}
