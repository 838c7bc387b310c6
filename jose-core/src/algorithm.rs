//! The capability contracts implemented by every algorithm family.

use crate::JoseError;
use crate::header::Header;
use crate::jwk::Jwk;

/// An algorithm identified by its registered name.
pub trait Algorithm {
    /// The `alg`, `enc` or `zip` value identifying this algorithm.
    fn name(&self) -> &'static str;

    /// Key types (`kty`) the algorithm accepts.
    fn allowed_key_types(&self) -> &'static [&'static str];
}

/// A JWS signature algorithm.
pub trait SignatureAlgorithm: Algorithm {
    /// Sign the input. Fails if the key is unsuitable.
    fn sign(&self, key: &Jwk, input: &[u8]) -> Result<Vec<u8>, JoseError>;

    /// Verify the signature. An unsuitable key is an error, a bad signature is `Ok(false)`.
    fn verify(&self, key: &Jwk, input: &[u8], signature: &[u8]) -> Result<bool, JoseError>;
}

/// How a key management algorithm establishes the content encryption key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyManagementMode {
    /// The key is the CEK.
    Direct,
    /// The CEK is encrypted to the recipient's public key.
    KeyEncryption,
    /// The CEK is wrapped with a symmetric key.
    KeyWrapping,
    /// The CEK is the result of a key agreement.
    KeyAgreement,
    /// A key agreement produces the key used to wrap the CEK.
    KeyAgreementWithKeyWrapping,
}

impl KeyManagementMode {
    /// Whether the mode produces the CEK instead of transporting a random one.
    pub fn derives_cek(self) -> bool {
        matches!(self, Self::Direct | Self::KeyAgreement)
    }

    /// Whether recipients using these two modes can share a CEK.
    pub fn is_compatible_with(self, other: Self) -> bool {
        !self.derives_cek() && !other.derives_cek()
    }
}

/// A JWE key management algorithm.
///
/// Modes that derive the CEK implement [`agree_key`](Self::agree_key), the others
/// implement [`wrap_key`](Self::wrap_key). All of them recover the CEK with
/// [`unwrap_key`](Self::unwrap_key). Header parameters produced while establishing the
/// key (`epk`, `iv`, `tag`, `p2s`, `p2c`, ...) are written to `additional_header`.
pub trait KeyManagementAlgorithm: Algorithm {
    fn mode(&self) -> KeyManagementMode;

    /// Produce the CEK of `cek_len` bytes for the recipient.
    fn agree_key(
        &self,
        key: &Jwk,
        sender_key: Option<&Jwk>,
        cek_len: usize,
        complete_header: &Header,
        additional_header: &mut Header,
    ) -> Result<Vec<u8>, JoseError> {
        let _ = (key, sender_key, cek_len, complete_header, additional_header);
        Err(JoseError::InvalidConfiguration(
            "this key management algorithm does not derive the content encryption key",
        ))
    }

    /// Transport the CEK to the recipient, returning the encrypted key.
    fn wrap_key(
        &self,
        key: &Jwk,
        sender_key: Option<&Jwk>,
        cek: &[u8],
        complete_header: &Header,
        additional_header: &mut Header,
    ) -> Result<Vec<u8>, JoseError> {
        let _ = (key, sender_key, cek, complete_header, additional_header);
        Err(JoseError::InvalidConfiguration(
            "this key management algorithm does not wrap the content encryption key",
        ))
    }

    /// Recover the CEK of `cek_len` bytes from the encrypted key and the header.
    fn unwrap_key(
        &self,
        key: &Jwk,
        sender_key: Option<&Jwk>,
        encrypted_key: &[u8],
        cek_len: usize,
        complete_header: &Header,
    ) -> Result<Vec<u8>, JoseError>;
}

/// Ciphertext and authentication tag.
#[derive(Debug)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

/// A JWE content encryption algorithm.
pub trait ContentEncryptionAlgorithm: Algorithm {
    /// Size of the CEK in bytes.
    fn cek_len(&self) -> usize;

    /// Size of the initialization vector in bytes.
    fn iv_len(&self) -> usize;

    fn encrypt(
        &self,
        plaintext: &[u8],
        cek: &[u8],
        iv: &[u8],
        aad: &[u8],
    ) -> Result<Sealed, JoseError>;

    /// Authenticate then decrypt. Any failure is a [`JoseError::CryptoError`].
    fn decrypt(
        &self,
        ciphertext: &[u8],
        cek: &[u8],
        iv: &[u8],
        aad: &[u8],
        tag: &[u8],
    ) -> Result<Vec<u8>, JoseError>;
}

/// A JWE compression method, selected by the `zip` header parameter.
pub trait CompressionMethod: Algorithm {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, JoseError>;

    fn uncompress(&self, data: &[u8]) -> Result<Vec<u8>, JoseError>;
}

/// Fill a fresh buffer with random bytes, as needed for CEKs, IVs and salts.
pub fn random_bytes(len: usize) -> Result<Vec<u8>, JoseError> {
    let mut bytes = vec![0; len];
    getrandom::fill(&mut bytes).map_err(|_| JoseError::CryptoError)?;
    Ok(bytes)
}
