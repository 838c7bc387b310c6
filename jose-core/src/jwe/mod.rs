//! JSON Web Encryption (RFC 7516).

mod builder;
mod decrypter;
mod loader;
pub mod serializer;

pub use builder::JweBuilder;
pub use decrypter::{DecryptedJwe, JweDecrypter};
pub use loader::JweLoader;

use serde_json::Value;

use crate::JoseError;
use crate::checker::TokenHeaders;
use crate::header::{self, Header};
use crate::jwk::Jwk;

/// An encrypted token.
///
/// The payload is encrypted once with a content encryption key (CEK), which is then made
/// available to each recipient. [`Jwe::payload`] is only set on a decrypted token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Jwe {
    ciphertext: Vec<u8>,
    iv: Vec<u8>,
    tag: Vec<u8>,
    aad: Option<Vec<u8>>,
    shared_protected_header: Header,
    encoded_shared_protected_header: String,
    shared_header: Header,
    recipients: Vec<Recipient>,
    payload: Option<Vec<u8>>,
}

impl Jwe {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        ciphertext: Vec<u8>,
        iv: Vec<u8>,
        tag: Vec<u8>,
        aad: Option<Vec<u8>>,
        shared_protected_header: Header,
        encoded_shared_protected_header: String,
        shared_header: Header,
        recipients: Vec<Recipient>,
    ) -> Self {
        Self {
            ciphertext,
            iv,
            tag,
            aad,
            shared_protected_header,
            encoded_shared_protected_header,
            shared_header,
            recipients,
            payload: None,
        }
    }

    pub(crate) fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = Some(payload);
        self
    }

    /// The decrypted payload.
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn tag(&self) -> &[u8] {
        &self.tag
    }

    /// Additional authenticated data supplied by the producer.
    pub fn aad(&self) -> Option<&[u8]> {
        self.aad.as_deref()
    }

    pub fn shared_protected_header(&self) -> &Header {
        &self.shared_protected_header
    }

    /// The shared protected header exactly as it was authenticated.
    pub fn encoded_shared_protected_header(&self) -> &str {
        &self.encoded_shared_protected_header
    }

    /// The shared unprotected header.
    pub fn shared_header(&self) -> &Header {
        &self.shared_header
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn recipient(&self, index: usize) -> Result<&Recipient, JoseError> {
        self.recipients
            .get(index)
            .ok_or(JoseError::InvalidConfiguration("the recipient does not exist"))
    }

    pub fn recipient_count(&self) -> usize {
        self.recipients.len()
    }

    /// A copy of this token for each recipient, holding only that recipient.
    pub fn split(&self) -> Vec<Jwe> {
        self.recipients
            .iter()
            .map(|r| Jwe {
                recipients: vec![r.clone()],
                ..self.clone()
            })
            .collect()
    }

    /// A header parameter visible to the recipient, protected first.
    pub fn header_parameter(&self, recipient: usize, name: &str) -> Option<&Value> {
        self.shared_protected_header
            .get(name)
            .or_else(|| self.shared_header.get(name))
            .or_else(|| self.recipients.get(recipient)?.header.get(name))
    }

    /// The headers of one recipient, for header checks.
    pub fn headers(&self, recipient: usize) -> Result<TokenHeaders, JoseError> {
        let r = self.recipient(recipient)?;
        header::check_duplicates(&[&self.shared_header, &r.header])?;
        Ok(TokenHeaders {
            protected: self.shared_protected_header.clone(),
            unprotected: header::merge(&[&self.shared_header, &r.header]),
        })
    }
}

/// A recipient of a [`Jwe`]: its header and the CEK encrypted for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recipient {
    header: Header,
    encrypted_key: Option<Vec<u8>>,
}

impl Recipient {
    pub(crate) fn new(header: Header, encrypted_key: Option<Vec<u8>>) -> Self {
        Self {
            header,
            encrypted_key,
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Absent for direct encryption and direct key agreement.
    pub fn encrypted_key(&self) -> Option<&[u8]> {
        self.encrypted_key.as_deref()
    }
}

/// A recipient to add to a [`JweBuilder`].
#[derive(Clone, Debug)]
pub struct RecipientSpec {
    pub key: Jwk,
    pub header: Header,
    /// The sender's static key for ECDH-SS key agreement.
    pub sender_key: Option<Jwk>,
}

/// The content AAD: the encoded protected header, then `"." BASE64URL(aad)` if present.
pub(crate) fn content_aad(encoded_protected: &str, aad: Option<&[u8]>) -> Vec<u8> {
    let mut out = encoded_protected.as_bytes().to_vec();
    if let Some(aad) = aad {
        out.push(b'.');
        out.extend_from_slice(crate::base64::encode(aad).as_bytes());
    }
    out
}
