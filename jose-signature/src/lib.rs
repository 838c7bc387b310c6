//! JWS signature algorithms, built on the RustCrypto and dalek crates.
//!
//! Every algorithm registered by RFC 7518 (and `EdDSA` from RFC 8037) is a variant of
//! [`JwsAlgorithm`]. [`default_factory`] registers all of them under their names.
//!
//! ```
//! use jose_core::algorithm::SignatureAlgorithm;
//! use jose_core::jwk::Jwk;
//! use jose_signature::JwsAlgorithm;
//!
//! let key = Jwk::from_json(r#"{"kty":"oct","k":"AyM1SysPpbyDfgZld3umj1qzKObwVMkoqQ-EstJQLr_T-1qS0gZH75aKtMN3Yj0iPS4hcgUuTwjAzZr1Z9CAow"}"#).unwrap();
//! let signature = JwsAlgorithm::Hs256.sign(&key, b"hello").unwrap();
//! assert!(JwsAlgorithm::Hs256.verify(&key, b"hello", &signature).unwrap());
//! ```

use jose_core::JoseError;
use jose_core::algorithm::{Algorithm, SignatureAlgorithm};
use jose_core::jwk::Jwk;
use jose_core::manager::AlgorithmManagerFactory;

mod ecdsa;
mod eddsa;
mod hash;
mod hmac;
mod rsa;

pub use ecdsa::{DerSignature, FixedSignature};

use hash::Hash;

/// The JWS `alg` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum JwsAlgorithm {
    Hs256,
    Hs384,
    Hs512,
    Rs256,
    Rs384,
    Rs512,
    Ps256,
    Ps384,
    Ps512,
    Es256,
    Es384,
    Es512,
    EdDsa,
    /// Unsecured JWS. Only register it when unsigned tokens are expected.
    None,
}

impl JwsAlgorithm {
    pub const ALL: [JwsAlgorithm; 14] = [
        Self::Hs256,
        Self::Hs384,
        Self::Hs512,
        Self::Rs256,
        Self::Rs384,
        Self::Rs512,
        Self::Ps256,
        Self::Ps384,
        Self::Ps512,
        Self::Es256,
        Self::Es384,
        Self::Es512,
        Self::EdDsa,
        Self::None,
    ];
}

impl Algorithm for JwsAlgorithm {
    fn name(&self) -> &'static str {
        match self {
            Self::Hs256 => "HS256",
            Self::Hs384 => "HS384",
            Self::Hs512 => "HS512",
            Self::Rs256 => "RS256",
            Self::Rs384 => "RS384",
            Self::Rs512 => "RS512",
            Self::Ps256 => "PS256",
            Self::Ps384 => "PS384",
            Self::Ps512 => "PS512",
            Self::Es256 => "ES256",
            Self::Es384 => "ES384",
            Self::Es512 => "ES512",
            Self::EdDsa => "EdDSA",
            Self::None => "none",
        }
    }

    fn allowed_key_types(&self) -> &'static [&'static str] {
        match self {
            Self::Hs256 | Self::Hs384 | Self::Hs512 => &["oct"],
            Self::Rs256 | Self::Rs384 | Self::Rs512 => &["RSA"],
            Self::Ps256 | Self::Ps384 | Self::Ps512 => &["RSA"],
            Self::Es256 | Self::Es384 | Self::Es512 => &["EC"],
            Self::EdDsa => &["OKP"],
            Self::None => &["none"],
        }
    }
}

impl SignatureAlgorithm for JwsAlgorithm {
    fn sign(&self, key: &Jwk, input: &[u8]) -> Result<Vec<u8>, JoseError> {
        key.check_kty(self.allowed_key_types())?;
        match self {
            Self::Hs256 => hmac::sign(Hash::Sha256, key, input),
            Self::Hs384 => hmac::sign(Hash::Sha384, key, input),
            Self::Hs512 => hmac::sign(Hash::Sha512, key, input),
            Self::Rs256 => rsa::pkcs1::sign(Hash::Sha256, key, input),
            Self::Rs384 => rsa::pkcs1::sign(Hash::Sha384, key, input),
            Self::Rs512 => rsa::pkcs1::sign(Hash::Sha512, key, input),
            Self::Ps256 => rsa::pss::sign(Hash::Sha256, key, input),
            Self::Ps384 => rsa::pss::sign(Hash::Sha384, key, input),
            Self::Ps512 => rsa::pss::sign(Hash::Sha512, key, input),
            Self::Es256 => ecdsa::sign(ecdsa::Curve::P256, key, input),
            Self::Es384 => ecdsa::sign(ecdsa::Curve::P384, key, input),
            Self::Es512 => ecdsa::sign(ecdsa::Curve::P521, key, input),
            Self::EdDsa => eddsa::sign(key, input),
            Self::None => Ok(Vec::new()),
        }
    }

    fn verify(&self, key: &Jwk, input: &[u8], signature: &[u8]) -> Result<bool, JoseError> {
        key.check_kty(self.allowed_key_types())?;
        let valid = match self {
            Self::Hs256 => hmac::verify(Hash::Sha256, key, input, signature),
            Self::Hs384 => hmac::verify(Hash::Sha384, key, input, signature),
            Self::Hs512 => hmac::verify(Hash::Sha512, key, input, signature),
            Self::Rs256 => rsa::pkcs1::verify(Hash::Sha256, key, input, signature),
            Self::Rs384 => rsa::pkcs1::verify(Hash::Sha384, key, input, signature),
            Self::Rs512 => rsa::pkcs1::verify(Hash::Sha512, key, input, signature),
            Self::Ps256 => rsa::pss::verify(Hash::Sha256, key, input, signature),
            Self::Ps384 => rsa::pss::verify(Hash::Sha384, key, input, signature),
            Self::Ps512 => rsa::pss::verify(Hash::Sha512, key, input, signature),
            Self::Es256 => ecdsa::verify(ecdsa::Curve::P256, key, input, signature),
            Self::Es384 => ecdsa::verify(ecdsa::Curve::P384, key, input, signature),
            Self::Es512 => ecdsa::verify(ecdsa::Curve::P521, key, input, signature),
            Self::EdDsa => eddsa::verify(key, input, signature),
            Self::None => Ok(signature.is_empty()),
        }?;
        if !valid {
            tracing::trace!(alg = self.name(), "signature did not verify");
        }
        Ok(valid)
    }
}

/// A factory with every signature algorithm registered under its `alg` name.
pub fn default_factory() -> AlgorithmManagerFactory<JwsAlgorithm> {
    let mut factory = AlgorithmManagerFactory::new();
    for alg in JwsAlgorithm::ALL {
        factory.add(alg.name(), alg);
    }
    factory
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let factory = default_factory();
        let aliases: Vec<_> = factory.aliases().collect();
        assert_eq!(aliases.len(), JwsAlgorithm::ALL.len());
        let manager = factory.create(&["ES256", "EdDSA"]).unwrap();
        assert_eq!(manager.list().collect::<Vec<_>>(), ["ES256", "EdDSA"]);
        factory.create(&["ES256K"]).unwrap_err();
    }

    #[test]
    fn none_only_accepts_empty_signatures() {
        let key = Jwk::from_json(r#"{"kty":"none"}"#).unwrap();
        let alg = JwsAlgorithm::None;
        assert_eq!(alg.sign(&key, b"x").unwrap(), b"");
        assert!(alg.verify(&key, b"x", b"").unwrap());
        assert!(!alg.verify(&key, b"x", b"\0").unwrap());

        let oct = Jwk::from_json(r#"{"kty":"oct","k":"AA"}"#).unwrap();
        alg.sign(&oct, b"x").unwrap_err();
    }

    #[test]
    fn rejects_the_wrong_key_type() {
        let key = Jwk::from_json(r#"{"kty":"oct","k":"AA"}"#).unwrap();
        assert!(matches!(
            JwsAlgorithm::Es256.sign(&key, b"x"),
            Err(JoseError::KeyUsage(_))
        ));
    }
}
