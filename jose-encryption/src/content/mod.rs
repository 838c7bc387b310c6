//! JWE content encryption algorithms (RFC 7518 section 5).

use jose_core::JoseError;
use jose_core::algorithm::{Algorithm, ContentEncryptionAlgorithm, Sealed};

mod aes_cbc_hs;
pub(crate) mod aes_gcm;

use aes_cbc_hs::Variant;

/// The JWE `enc` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ContentEncryption {
    A128Gcm,
    A192Gcm,
    A256Gcm,
    A128CbcHs256,
    A192CbcHs384,
    A256CbcHs512,
}

impl ContentEncryption {
    pub const ALL: [ContentEncryption; 6] = [
        Self::A128Gcm,
        Self::A192Gcm,
        Self::A256Gcm,
        Self::A128CbcHs256,
        Self::A192CbcHs384,
        Self::A256CbcHs512,
    ];

    fn cbc(self) -> Option<Variant> {
        match self {
            Self::A128CbcHs256 => Some(Variant::A128Hs256),
            Self::A192CbcHs384 => Some(Variant::A192Hs384),
            Self::A256CbcHs512 => Some(Variant::A256Hs512),
            Self::A128Gcm | Self::A192Gcm | Self::A256Gcm => None,
        }
    }

    fn check_cek(&self, cek: &[u8]) -> Result<(), JoseError> {
        if cek.len() != self.cek_len() {
            return Err(JoseError::InvalidKey(
                "the key size does not match the content encryption algorithm",
            ));
        }
        Ok(())
    }
}

impl Algorithm for ContentEncryption {
    fn name(&self) -> &'static str {
        match self {
            Self::A128Gcm => "A128GCM",
            Self::A192Gcm => "A192GCM",
            Self::A256Gcm => "A256GCM",
            Self::A128CbcHs256 => "A128CBC-HS256",
            Self::A192CbcHs384 => "A192CBC-HS384",
            Self::A256CbcHs512 => "A256CBC-HS512",
        }
    }

    fn allowed_key_types(&self) -> &'static [&'static str] {
        &[]
    }
}

impl ContentEncryptionAlgorithm for ContentEncryption {
    fn cek_len(&self) -> usize {
        match self {
            Self::A128Gcm => 16,
            Self::A192Gcm => 24,
            Self::A256Gcm => 32,
            Self::A128CbcHs256 => 32,
            Self::A192CbcHs384 => 48,
            Self::A256CbcHs512 => 64,
        }
    }

    fn iv_len(&self) -> usize {
        match self.cbc() {
            Some(_) => aes_cbc_hs::IV_LEN,
            None => aes_gcm::IV_LEN,
        }
    }

    fn encrypt(
        &self,
        plaintext: &[u8],
        cek: &[u8],
        iv: &[u8],
        aad: &[u8],
    ) -> Result<Sealed, JoseError> {
        self.check_cek(cek)?;
        match self.cbc() {
            Some(variant) => aes_cbc_hs::seal(variant, cek, iv, aad, plaintext),
            None => aes_gcm::seal(cek, iv, aad, plaintext),
        }
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        cek: &[u8],
        iv: &[u8],
        aad: &[u8],
        tag: &[u8],
    ) -> Result<Vec<u8>, JoseError> {
        self.check_cek(cek).map_err(|_| JoseError::CryptoError)?;
        let plaintext = match self.cbc() {
            Some(variant) => aes_cbc_hs::open(variant, cek, iv, aad, ciphertext, tag),
            None => aes_gcm::open(cek, iv, aad, ciphertext, tag),
        };
        if plaintext.is_err() {
            tracing::trace!(enc = self.name(), "content decryption failed");
        }
        plaintext
    }
}
