//! ECDH key agreement (RFC 7518 section 4.6) over the NIST curves and X25519.
//!
//! In the ephemeral-static form the sender generates a fresh key pair per message and
//! publishes its public part as `epk`. In the static-static form both parties use long term
//! keys: the sender supplies its private key, the recipient the sender's public key, and no
//! `epk` is emitted.

use curve25519_dalek::montgomery::MontgomeryPoint;
use jose_core::algorithm::random_bytes;
use jose_core::header::{self, Header};
use jose_core::jwk::Jwk;
use jose_core::{JoseError, base64};
use serde_json::{Map, Value};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::concat_kdf;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Agreement {
    EphemeralStatic,
    StaticStatic,
}

#[derive(Clone, Copy)]
pub(crate) enum Curve {
    Nist(&'static jose_ecc::Curve),
    X25519,
}

impl PartialEq for Curve {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

fn ec_error(_: jose_ecc::EcError) -> JoseError {
    JoseError::InvalidKey("invalid EC key")
}

fn array32(bytes: &[u8]) -> Result<[u8; 32], JoseError> {
    bytes
        .try_into()
        .map_err(|_| JoseError::InvalidKey("invalid X25519 key length"))
}

impl Curve {
    /// The curve of an `EC` or `OKP` key usable for key agreement.
    pub(crate) fn of(key: &Jwk) -> Result<Self, JoseError> {
        let crv = key.get_str("crv").ok_or(JoseError::MissingKeyParameter("crv"))?;
        match (key.kty(), crv) {
            ("EC", _) => jose_ecc::Curve::from_name(crv)
                .map(Curve::Nist)
                .map_err(|_| JoseError::KeyUsage(format!("unsupported curve \"{crv}\""))),
            ("OKP", "X25519") => Ok(Curve::X25519),
            _ => Err(JoseError::KeyUsage(format!(
                "curve \"{crv}\" cannot be used for key agreement"
            ))),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Curve::Nist(curve) => curve.name(),
            Curve::X25519 => "X25519",
        }
    }

    /// A fresh private key as a JWK.
    pub(crate) fn generate(&self) -> Result<Jwk, JoseError> {
        let mut values = Map::new();
        match self {
            Curve::Nist(curve) => {
                let private = curve.create_private_key().map_err(ec_error)?;
                let public = curve.create_public_key(&private).map_err(ec_error)?;
                values.insert("kty".into(), "EC".into());
                values.insert("crv".into(), curve.name().into());
                values.insert("x".into(), base64::encode(public.x_bytes()).into());
                values.insert("y".into(), base64::encode(public.y_bytes()).into());
                let d = Zeroizing::new(private.to_bytes(curve.field_size()));
                values.insert("d".into(), base64::encode(&*d).into());
            }
            Curve::X25519 => {
                let d = Zeroizing::new(array32(&random_bytes(32)?)?);
                let x = MontgomeryPoint::mul_base_clamped(*d);
                values.insert("kty".into(), "OKP".into());
                values.insert("crv".into(), "X25519".into());
                values.insert("x".into(), base64::encode(x.as_bytes()).into());
                values.insert("d".into(), base64::encode(&*d).into());
            }
        }
        Jwk::new(values)
    }

    /// The shared secret `Z` between the private part of `private` and the public part of
    /// `public`.
    pub(crate) fn agree(&self, private: &Jwk, public: &Jwk) -> Result<Zeroizing<Vec<u8>>, JoseError> {
        match self {
            Curve::Nist(curve) => {
                let d = Zeroizing::new(private.get_bytes("d")?);
                let private = curve.private_key(&d).map_err(ec_error)?;
                let public = curve
                    .public_key(&public.get_bytes("x")?, &public.get_bytes("y")?)
                    .map_err(ec_error)?;
                let z = curve.shared_secret(&private, &public).map_err(ec_error)?;
                Ok(Zeroizing::new(z))
            }
            Curve::X25519 => {
                let d = Zeroizing::new(array32(&private.get_bytes("d")?)?);
                let public = MontgomeryPoint(array32(&public.get_bytes("x")?)?);
                let z = Zeroizing::new(public.mul_clamped(*d).to_bytes());
                if bool::from(z[..].ct_eq(&[0; 32])) {
                    return Err(JoseError::InvalidKey("low order X25519 public key"));
                }
                Ok(Zeroizing::new(z.to_vec()))
            }
        }
    }
}

fn same_curve(key: &Jwk, other: &Jwk) -> Result<Curve, JoseError> {
    let curve = Curve::of(key)?;
    if Curve::of(other)? != curve {
        return Err(JoseError::KeyUsage(
            "the keys of the key agreement are on different curves".into(),
        ));
    }
    Ok(curve)
}

impl Agreement {
    /// Sender side: `key` is the recipient's public key.
    pub(crate) fn sender(
        self,
        key: &Jwk,
        sender_key: Option<&Jwk>,
        additional_header: &mut Header,
    ) -> Result<Zeroizing<Vec<u8>>, JoseError> {
        match self {
            Agreement::EphemeralStatic => {
                let curve = Curve::of(key)?;
                let ephemeral = curve.generate()?;
                let z = curve.agree(&ephemeral, key)?;
                additional_header.insert(
                    "epk".into(),
                    Value::Object(ephemeral.to_public().all().clone()),
                );
                Ok(z)
            }
            Agreement::StaticStatic => {
                let sender = sender_key.ok_or(JoseError::InvalidConfiguration(
                    "static-static key agreement needs the sender's private key",
                ))?;
                same_curve(key, sender)?.agree(sender, key)
            }
        }
    }

    /// Recipient side: `key` is the recipient's private key.
    pub(crate) fn recipient(
        self,
        key: &Jwk,
        sender_key: Option<&Jwk>,
        complete_header: &Header,
    ) -> Result<Zeroizing<Vec<u8>>, JoseError> {
        match self {
            Agreement::EphemeralStatic => {
                let epk = match complete_header.get("epk") {
                    None => return Err(JoseError::MissingHeaderParameter("epk".into())),
                    Some(Value::Object(epk)) => Jwk::new(epk.clone())?,
                    Some(_) => {
                        return Err(JoseError::InvalidHeader(
                            "the header parameter \"epk\" must be a JWK".into(),
                        ));
                    }
                };
                same_curve(key, &epk)?.agree(key, &epk)
            }
            Agreement::StaticStatic => {
                let sender = sender_key.ok_or(JoseError::InvalidConfiguration(
                    "static-static key agreement needs the sender's public key",
                ))?;
                same_curve(key, sender)?.agree(key, sender)
            }
        }
    }
}

/// Run the Concat KDF. The algorithm id is the `enc` value in direct mode, otherwise the
/// key wrapping `alg`.
pub(crate) fn derive(
    z: &[u8],
    complete_header: &Header,
    wrapping_alg: Option<&str>,
    key_len: usize,
) -> Result<Zeroizing<Vec<u8>>, JoseError> {
    let algorithm = match wrapping_alg {
        Some(alg) => alg,
        None => header::require_str(complete_header, "enc")?,
    };
    let party_info = |name| -> Result<Vec<u8>, JoseError> {
        Ok(header::get_str(complete_header, name)?
            .map(base64::decode)
            .transpose()?
            .unwrap_or_default())
    };
    let apu = party_info("apu")?;
    let apv = party_info("apv")?;
    Ok(concat_kdf::derive(z, algorithm, &apu, &apv, key_len))
}
