use zeroize::Zeroizing;

use super::builder::compression;
use super::{Jwe, Recipient, content_aad};
use crate::JoseError;
use crate::algorithm::{CompressionMethod, ContentEncryptionAlgorithm, KeyManagementAlgorithm};
use crate::header::{self, Header};
use crate::jwk::{Jwk, KeyUsage};
use crate::jwkset::JwkSet;
use crate::manager::AlgorithmManager;

/// A successfully decrypted token, with the key and recipient that decrypted it.
#[derive(Clone, Debug)]
pub struct DecryptedJwe {
    pub jwe: Jwe,
    pub key: Jwk,
    pub recipient: usize,
}

/// Decrypts a [`Jwe`] for one of its recipients.
///
/// Misuse (no keys, a missing recipient, missing or unknown algorithms) is an error.
/// Every failure to unwrap the key or to authenticate the content gives `None`, without
/// saying which step failed.
#[derive(Clone)]
pub struct JweDecrypter<K, C, Z> {
    key_management: AlgorithmManager<K>,
    content_encryption: AlgorithmManager<C>,
    compression: AlgorithmManager<Z>,
}

impl<K, C, Z> JweDecrypter<K, C, Z>
where
    K: KeyManagementAlgorithm,
    C: ContentEncryptionAlgorithm,
    Z: CompressionMethod,
{
    pub fn new(
        key_management: AlgorithmManager<K>,
        content_encryption: AlgorithmManager<C>,
        compression: AlgorithmManager<Z>,
    ) -> Self {
        Self {
            key_management,
            content_encryption,
            compression,
        }
    }

    pub fn decrypt_using_key(
        &self,
        jwe: &Jwe,
        key: &Jwk,
        recipient: usize,
        sender_key: Option<&Jwk>,
    ) -> Result<Option<Jwe>, JoseError> {
        let keys = JwkSet::new([key.clone()]);
        self.decrypt_using_key_set(jwe, &keys, recipient, sender_key)
            .map(|d| d.map(|d| d.jwe))
    }

    pub fn decrypt_using_key_set(
        &self,
        jwe: &Jwe,
        keys: &JwkSet,
        recipient: usize,
        sender_key: Option<&Jwk>,
    ) -> Result<Option<DecryptedJwe>, JoseError> {
        if keys.is_empty() {
            return Err(JoseError::InvalidConfiguration("there is no key in the key set"));
        }
        let r = jwe.recipient(recipient)?;

        let headers = [
            jwe.shared_protected_header(),
            jwe.shared_header(),
            r.header(),
        ];
        header::check_duplicates(&headers)?;
        let complete = header::merge(&headers);

        let alg = self
            .key_management
            .get(header::require_str(&complete, "alg")?)?;
        let enc = self
            .content_encryption
            .get(header::require_str(&complete, "enc")?)?;
        let zip = compression(
            &self.compression,
            jwe.shared_protected_header(),
            &[jwe.shared_header(), r.header()],
        )?;

        let attempt = Attempt {
            jwe,
            recipient: r,
            complete: &complete,
            sender_key,
            alg,
            enc,
            zip,
        };
        for key in keys {
            if let Ok(payload) = attempt.decrypt(key) {
                tracing::debug!(alg = alg.name(), enc = enc.name(), "decrypted JWE");
                return Ok(Some(DecryptedJwe {
                    jwe: jwe.clone().with_payload(payload),
                    key: key.clone(),
                    recipient,
                }));
            }
        }

        tracing::debug!(alg = alg.name(), enc = enc.name(), "could not decrypt JWE");
        Ok(None)
    }
}

struct Attempt<'a, K, C, Z> {
    jwe: &'a Jwe,
    recipient: &'a Recipient,
    complete: &'a Header,
    sender_key: Option<&'a Jwk>,
    alg: &'a K,
    enc: &'a C,
    zip: Option<&'a Z>,
}

impl<K, C, Z> Attempt<'_, K, C, Z>
where
    K: KeyManagementAlgorithm,
    C: ContentEncryptionAlgorithm,
    Z: CompressionMethod,
{
    fn decrypt(&self, key: &Jwk) -> Result<Vec<u8>, JoseError> {
        key.check_usage(KeyUsage::Decryption)?;
        key.check_algorithm(self.alg.name())?;
        key.check_kty(self.alg.allowed_key_types())?;

        let cek_len = self.enc.cek_len();
        let cek = Zeroizing::new(self.alg.unwrap_key(
            key,
            self.sender_key,
            self.recipient.encrypted_key().unwrap_or_default(),
            cek_len,
            self.complete,
        )?);
        if cek.len() != cek_len {
            return Err(JoseError::CryptoError);
        }

        let aad = content_aad(
            self.jwe.encoded_shared_protected_header(),
            self.jwe.aad(),
        );
        let payload = self.enc.decrypt(
            self.jwe.ciphertext(),
            &cek,
            self.jwe.iv(),
            &aad,
            self.jwe.tag(),
        )?;

        match self.zip {
            Some(zip) => zip.uncompress(&payload),
            None => Ok(payload),
        }
    }
}
