use zeroize::Zeroizing;

use super::{Jwe, Recipient, RecipientSpec, content_aad};
use crate::JoseError;
use crate::algorithm::{
    CompressionMethod, ContentEncryptionAlgorithm, KeyManagementAlgorithm, Sealed, random_bytes,
};
use crate::header::{self, Header};
use crate::jwk::{Jwk, KeyUsage};
use crate::manager::AlgorithmManager;

/// Builds a [`Jwe`] for one or more recipients.
///
/// The shared protected header must name the content encryption algorithm with `enc`, and
/// may request compression with `zip`. Each recipient names its key management
/// algorithm with `alg` in any of the headers.
#[derive(Clone)]
pub struct JweBuilder<K, C, Z> {
    key_management: AlgorithmManager<K>,
    content_encryption: AlgorithmManager<C>,
    compression: AlgorithmManager<Z>,
    payload: Option<Vec<u8>>,
    aad: Option<Vec<u8>>,
    shared_protected_header: Header,
    shared_header: Header,
    recipients: Vec<RecipientSpec>,
}

impl<K, C, Z> JweBuilder<K, C, Z>
where
    K: KeyManagementAlgorithm + Clone,
    C: ContentEncryptionAlgorithm + Clone,
    Z: CompressionMethod + Clone,
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
            payload: None,
            aad: None,
            shared_protected_header: Header::new(),
            shared_header: Header::new(),
            recipients: Vec::new(),
        }
    }

    /// A fresh builder sharing this builder's algorithms.
    pub fn create(&self) -> Self {
        Self::new(
            self.key_management.clone(),
            self.content_encryption.clone(),
            self.compression.clone(),
        )
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Additional authenticated data. Not representable in the compact serialization.
    pub fn with_aad(mut self, aad: impl Into<Vec<u8>>) -> Self {
        self.aad = Some(aad.into());
        self
    }

    pub fn with_shared_protected_header(mut self, header: Header) -> Self {
        self.shared_protected_header = header;
        self
    }

    pub fn with_shared_header(mut self, header: Header) -> Self {
        self.shared_header = header;
        self
    }

    /// Add a recipient. `sender_key` is only used by ECDH-SS key agreement.
    pub fn add_recipient(mut self, key: &Jwk, header: Header, sender_key: Option<&Jwk>) -> Self {
        self.recipients.push(RecipientSpec {
            key: key.clone(),
            header,
            sender_key: sender_key.cloned(),
        });
        self
    }

    pub fn build(&self) -> Result<Jwe, JoseError> {
        let payload = self
            .payload
            .as_ref()
            .ok_or(JoseError::InvalidConfiguration("the payload is not set"))?;
        if self.recipients.is_empty() {
            return Err(JoseError::InvalidConfiguration(
                "at least one recipient must be added",
            ));
        }

        header::check_duplicates(&[&self.shared_protected_header, &self.shared_header])?;
        let shared = header::merge(&[&self.shared_protected_header, &self.shared_header]);
        let enc = self
            .content_encryption
            .get(header::require_str(&shared, "enc")?)?;
        let zip = compression(
            &self.compression,
            &self.shared_protected_header,
            &[&self.shared_header],
        )?;

        let recipients = self
            .recipients
            .iter()
            .map(|r| self.resolve(r))
            .collect::<Result<Vec<_>, _>>()?;
        check_modes(&recipients)?;

        let mut shared_additional = Header::new();
        let cek = match &recipients[..] {
            [(r, alg, complete)] if alg.mode().derives_cek() => Zeroizing::new(alg.agree_key(
                &r.key,
                r.sender_key.as_ref(),
                enc.cek_len(),
                complete,
                &mut shared_additional,
            )?),
            _ => Zeroizing::new(random_bytes(enc.cek_len())?),
        };
        if cek.len() != enc.cek_len() {
            return Err(JoseError::InvalidKey(
                "the key size does not match the content encryption algorithm",
            ));
        }

        let single = recipients.len() == 1;
        let mut out = Vec::with_capacity(recipients.len());
        for (r, alg, complete) in &recipients {
            let mut additional = Header::new();
            let encrypted_key = if alg.mode().derives_cek() {
                None
            } else {
                Some(alg.wrap_key(
                    &r.key,
                    r.sender_key.as_ref(),
                    &cek,
                    complete,
                    &mut additional,
                )?)
            };

            let mut header = r.header.clone();
            if single {
                shared_additional.extend(additional);
            } else {
                header.extend(additional);
            }
            out.push(Recipient::new(header, encrypted_key));
        }

        let mut protected = self.shared_protected_header.clone();
        protected.extend(shared_additional);
        let encoded_protected = header::encode(&protected)?;

        let plaintext = match zip {
            Some(zip) => zip.compress(payload)?,
            None => payload.clone(),
        };
        let iv = random_bytes(enc.iv_len())?;
        let aad = content_aad(&encoded_protected, self.aad.as_deref());
        let Sealed { ciphertext, tag } = enc.encrypt(&plaintext, &cek, &iv, &aad)?;

        tracing::debug!(
            enc = enc.name(),
            recipients = out.len(),
            "built JWE"
        );
        Ok(Jwe::new(
            ciphertext,
            iv,
            tag,
            self.aad.clone(),
            protected,
            encoded_protected,
            self.shared_header.clone(),
            out,
        ))
    }

    fn resolve<'a>(
        &'a self,
        r: &'a RecipientSpec,
    ) -> Result<(&'a RecipientSpec, &'a K, Header), JoseError> {
        for name in ["enc", "zip"] {
            if r.header.contains_key(name) {
                return Err(JoseError::InvalidHeader(format!(
                    "the header parameter \"{name}\" must be shared by all recipients"
                )));
            }
        }
        let headers = [
            &self.shared_protected_header,
            &self.shared_header,
            &r.header,
        ];
        header::check_duplicates(&headers)?;
        let complete = header::merge(&headers);

        let alg = self
            .key_management
            .get(header::require_str(&complete, "alg")?)?;
        r.key.check_usage(KeyUsage::Encryption)?;
        r.key.check_algorithm(alg.name())?;
        r.key.check_kty(alg.allowed_key_types())?;

        Ok((r, alg, complete))
    }
}

fn check_modes<R, K: KeyManagementAlgorithm, H>(recipients: &[(R, &K, H)]) -> Result<(), JoseError> {
    if recipients.len() < 2 {
        return Ok(());
    }
    for (i, (_, a, _)) in recipients.iter().enumerate() {
        for (_, b, _) in &recipients[i + 1..] {
            if !a.mode().is_compatible_with(b.mode()) {
                return Err(JoseError::InvalidConfiguration(
                    "the key management modes of the recipients are not compatible",
                ));
            }
        }
    }
    Ok(())
}

/// The compression method named by `zip`, which must be protected.
pub(crate) fn compression<'a, Z: CompressionMethod>(
    manager: &'a AlgorithmManager<Z>,
    protected: &Header,
    unprotected: &[&Header],
) -> Result<Option<&'a Z>, JoseError> {
    if unprotected.iter().any(|h| h.contains_key("zip")) {
        return Err(JoseError::InvalidHeader(
            "the header parameter \"zip\" must be protected".into(),
        ));
    }
    header::get_str(protected, "zip")?
        .map(|zip| manager.get(zip))
        .transpose()
}
