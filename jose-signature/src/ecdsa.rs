//! ES256, ES384 and ES512.
//!
//! JWS carries ECDSA signatures as `R ‖ S`, each integer padded to the field size of the
//! curve. [`DerSignature`] and [`FixedSignature`] convert between that form and DER for
//! callers exchanging signatures with other ECDSA tooling.

use jose_core::JoseError;
use jose_core::jwk::Jwk;
use jose_ecc::EcError;

use crate::hash::Hash;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Curve {
    P256,
    P384,
    P521,
}

impl Curve {
    fn name(self) -> &'static str {
        match self {
            Curve::P256 => "P-256",
            Curve::P384 => "P-384",
            Curve::P521 => "P-521",
        }
    }

    fn hash(self) -> Hash {
        match self {
            Curve::P256 => Hash::Sha256,
            Curve::P384 => Hash::Sha384,
            Curve::P521 => Hash::Sha512,
        }
    }

    fn from_field_size(field_size: usize) -> Result<Self, JoseError> {
        match field_size {
            32 => Ok(Curve::P256),
            48 => Ok(Curve::P384),
            66 => Ok(Curve::P521),
            _ => Err(JoseError::CryptoError),
        }
    }
}

/// An ECDSA signature in its DER form, `SEQUENCE { r INTEGER, s INTEGER }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerSignature(Vec<u8>);

/// An ECDSA signature in its JWS form, `R ‖ S` with each integer padded to the field size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedSignature(Vec<u8>);

impl DerSignature {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to `R ‖ S` for a curve with `field_size` byte field elements.
    pub fn to_fixed(&self, field_size: usize) -> Result<FixedSignature, JoseError> {
        let fixed = match Curve::from_field_size(field_size)? {
            Curve::P256 => nist_p256::der_to_fixed(&self.0)?,
            Curve::P384 => nist_p384::der_to_fixed(&self.0)?,
            Curve::P521 => nist_p521::der_to_fixed(&self.0)?,
        };
        Ok(FixedSignature(fixed))
    }
}

impl FixedSignature {
    /// `bytes` must be two integers of equal length.
    pub fn new(bytes: Vec<u8>) -> Result<Self, JoseError> {
        if bytes.is_empty() || bytes.len() % 2 != 0 {
            return Err(JoseError::CryptoError);
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Fails when either integer is zero or not below the curve order.
    pub fn to_der(&self) -> Result<DerSignature, JoseError> {
        let der = match Curve::from_field_size(self.0.len() / 2)? {
            Curve::P256 => nist_p256::fixed_to_der(&self.0)?,
            Curve::P384 => nist_p384::fixed_to_der(&self.0)?,
            Curve::P521 => nist_p521::fixed_to_der(&self.0)?,
        };
        Ok(DerSignature(der))
    }
}

fn ec_error(_: EcError) -> JoseError {
    JoseError::InvalidKey("invalid EC key")
}

fn curve_of(curve: Curve, key: &Jwk) -> Result<&'static jose_ecc::Curve, JoseError> {
    let crv = key.get_str("crv").ok_or(JoseError::MissingKeyParameter("crv"))?;
    if crv != curve.name() {
        return Err(JoseError::KeyUsage(format!(
            "curve \"{crv}\" cannot be used with this algorithm"
        )));
    }
    jose_ecc::Curve::from_name(crv).map_err(ec_error)
}

macro_rules! backend {
    ($module:ident, $krate:ident) => {
        mod $module {
            use jose_core::JoseError;
            use $krate::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
            use $krate::ecdsa::{Signature, SigningKey, VerifyingKey};

            pub(super) fn sign(d: &[u8], prehash: &[u8]) -> Result<Vec<u8>, JoseError> {
                let key = SigningKey::from_slice(d)
                    .map_err(|_| JoseError::InvalidKey("invalid EC private key"))?;
                let signature: Signature = key
                    .sign_prehash(prehash)
                    .map_err(|_| JoseError::CryptoError)?;
                Ok(signature.to_bytes().to_vec())
            }

            pub(super) fn verify(
                sec1: &[u8],
                prehash: &[u8],
                fixed: &[u8],
            ) -> Result<bool, JoseError> {
                let key = VerifyingKey::from_sec1_bytes(sec1)
                    .map_err(|_| JoseError::InvalidKey("invalid EC public key"))?;
                let Ok(signature) = Signature::from_slice(fixed) else {
                    return Ok(false);
                };
                Ok(key.verify_prehash(prehash, &signature).is_ok())
            }

            pub(super) fn der_to_fixed(der: &[u8]) -> Result<Vec<u8>, JoseError> {
                let signature = Signature::from_der(der).map_err(|_| JoseError::CryptoError)?;
                Ok(signature.to_bytes().to_vec())
            }

            pub(super) fn fixed_to_der(fixed: &[u8]) -> Result<Vec<u8>, JoseError> {
                let signature =
                    Signature::from_slice(fixed).map_err(|_| JoseError::CryptoError)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
        }
    };
}

backend!(nist_p256, p256);
backend!(nist_p384, p384);
backend!(nist_p521, p521);

pub(crate) fn sign(curve: Curve, key: &Jwk, input: &[u8]) -> Result<Vec<u8>, JoseError> {
    let ec = curve_of(curve, key)?;
    let d = ec.private_key(&key.get_bytes("d")?).map_err(ec_error)?;
    let d = d.to_bytes(ec.field_size());

    let prehash = curve.hash().digest(&[input]);
    match curve {
        Curve::P256 => nist_p256::sign(&d, &prehash),
        Curve::P384 => nist_p384::sign(&d, &prehash),
        Curve::P521 => nist_p521::sign(&d, &prehash),
    }
}

pub(crate) fn verify(
    curve: Curve,
    key: &Jwk,
    input: &[u8],
    signature: &[u8],
) -> Result<bool, JoseError> {
    let ec = curve_of(curve, key)?;
    let public = ec
        .public_key(&key.get_bytes("x")?, &key.get_bytes("y")?)
        .map_err(ec_error)?;
    if signature.len() != 2 * ec.field_size() {
        return Ok(false);
    }

    let mut sec1 = vec![0x04];
    sec1.extend_from_slice(&public.x_bytes());
    sec1.extend_from_slice(&public.y_bytes());

    let prehash = curve.hash().digest(&[input]);
    match curve {
        Curve::P256 => nist_p256::verify(&sec1, &prehash, signature),
        Curve::P384 => nist_p384::verify(&sec1, &prehash, signature),
        Curve::P521 => nist_p521::verify(&sec1, &prehash, signature),
    }
}
