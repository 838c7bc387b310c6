//! RSAES-OAEP with SHA-1 (`RSA-OAEP`) or SHA-256 (`RSA-OAEP-256`), MGF1 using the same hash.

use jose_core::JoseError;
use jose_core::jwk::Jwk;
use rsa::rand_core::OsRng;
use rsa::{BigUint, Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Hash {
    Sha1,
    Sha256,
}

impl Hash {
    fn padding(self) -> Oaep {
        match self {
            Hash::Sha1 => Oaep::new::<Sha1>(),
            Hash::Sha256 => Oaep::new::<Sha256>(),
        }
    }
}

fn uint(key: &Jwk, name: &'static str) -> Result<BigUint, JoseError> {
    key.get_bytes(name).map(|b| BigUint::from_bytes_be(&b))
}

fn public_key(key: &Jwk) -> Result<RsaPublicKey, JoseError> {
    RsaPublicKey::new(uint(key, "n")?, uint(key, "e")?)
        .map_err(|_| JoseError::InvalidKey("invalid RSA public key"))
}

/// The private key from `n`, `e` and `d`, with the primes `p` and `q` when present.
///
/// The components must be consistent with each other.
fn private_key(key: &Jwk) -> Result<RsaPrivateKey, JoseError> {
    let primes = match (key.has("p"), key.has("q")) {
        (true, true) => vec![uint(key, "p")?, uint(key, "q")?],
        _ => Vec::new(),
    };
    let private =
        RsaPrivateKey::from_components(uint(key, "n")?, uint(key, "e")?, uint(key, "d")?, primes)
            .and_then(|private| private.validate().map(|()| private))
            .map_err(|err| {
                tracing::debug!(%err, "rejected RSA private key");
                JoseError::InvalidKey("invalid RSA private key")
            })?;
    Ok(private)
}

pub(super) fn encrypt(hash: Hash, key: &Jwk, cek: &[u8]) -> Result<Vec<u8>, JoseError> {
    public_key(key)?
        .encrypt(&mut OsRng, hash.padding(), cek)
        .map_err(|_| JoseError::CryptoError)
}

pub(super) fn decrypt(hash: Hash, key: &Jwk, encrypted_key: &[u8]) -> Result<Vec<u8>, JoseError> {
    private_key(key)?
        .decrypt_blinded(&mut OsRng, hash.padding(), encrypted_key)
        .map_err(|_| JoseError::CryptoError)
}
