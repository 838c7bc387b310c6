//! EdDSA over Ed25519 (RFC 8037).

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use jose_core::JoseError;
use jose_core::jwk::Jwk;

fn check_curve(key: &Jwk) -> Result<(), JoseError> {
    match key.get_str("crv") {
        Some("Ed25519") => Ok(()),
        Some(crv) => Err(JoseError::KeyUsage(format!(
            "curve \"{crv}\" cannot be used with EdDSA"
        ))),
        None => Err(JoseError::MissingKeyParameter("crv")),
    }
}

fn array<const N: usize>(bytes: Vec<u8>) -> Result<[u8; N], JoseError> {
    bytes
        .try_into()
        .map_err(|_| JoseError::InvalidKey("invalid Ed25519 key length"))
}

pub(crate) fn sign(key: &Jwk, input: &[u8]) -> Result<Vec<u8>, JoseError> {
    check_curve(key)?;
    let signing = SigningKey::from_bytes(&array(key.get_bytes("d")?)?);
    if let Some(x) = key.get_opt_bytes("x")?
        && x != signing.verifying_key().as_bytes()
    {
        return Err(JoseError::InvalidKey("the public key does not match the private key"));
    }
    Ok(signing.sign(input).to_bytes().to_vec())
}

pub(crate) fn verify(key: &Jwk, input: &[u8], signature: &[u8]) -> Result<bool, JoseError> {
    check_curve(key)?;
    let public = match key.get_opt_bytes("x")? {
        Some(x) => VerifyingKey::from_bytes(&array(x)?)
            .map_err(|_| JoseError::InvalidKey("invalid Ed25519 public key"))?,
        None => SigningKey::from_bytes(&array(key.get_bytes("d")?)?).verifying_key(),
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return Ok(false);
    };
    Ok(public.verify_strict(input, &signature).is_ok())
}

#[cfg(test)]
mod tests {
    use jose_core::algorithm::SignatureAlgorithm;
    use jose_core::base64;

    use super::*;
    use crate::JwsAlgorithm;

    // RFC 8037 appendix A
    const D: &str = "nWGxne_9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A";
    const X: &str = "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo";
    const INPUT: &str = "eyJhbGciOiJFZERTQSJ9.RXhhbXBsZSBvZiBFZDI1NTE5IHNpZ25pbmc";
    const SIGNATURE: &str = "hgyY0il_MGCjP0JzlnLWG1PPOt7-09PGcvMg3AIbQR6dWbhijcNR4ki4iylGjg5BhVsPt9g7sVvpAr_MuM0KAg";

    #[test]
    fn rfc8037_ed25519() {
        let key = Jwk::from_json(&format!(r#"{{"kty":"OKP","crv":"Ed25519","d":"{D}","x":"{X}"}}"#))
            .unwrap();
        let signature = JwsAlgorithm::EdDsa.sign(&key, INPUT.as_bytes()).unwrap();
        assert_eq!(base64::encode(&signature), SIGNATURE);
        assert!(
            JwsAlgorithm::EdDsa
                .verify(&key.to_public(), INPUT.as_bytes(), &signature)
                .unwrap()
        );
        assert!(!JwsAlgorithm::EdDsa.verify(&key, b"other", &signature).unwrap());
    }

    #[test]
    fn public_key_is_derived_when_absent() {
        let key = Jwk::from_json(&format!(r#"{{"kty":"OKP","crv":"Ed25519","d":"{D}"}}"#)).unwrap();
        let signature = base64::decode(SIGNATURE).unwrap();
        assert!(JwsAlgorithm::EdDsa.verify(&key, INPUT.as_bytes(), &signature).unwrap());
    }

    #[test]
    fn other_curves_are_rejected() {
        let key = Jwk::from_json(&format!(r#"{{"kty":"OKP","crv":"X25519","x":"{X}"}}"#)).unwrap();
        assert!(matches!(
            JwsAlgorithm::EdDsa.verify(&key, b"x", &[0; 64]),
            Err(JoseError::KeyUsage(_))
        ));
    }
}
