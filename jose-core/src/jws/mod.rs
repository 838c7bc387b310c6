//! JSON Web Signature (RFC 7515), with unencoded payload support (RFC 7797).

mod builder;
mod loader;
pub mod serializer;
mod verifier;

pub use builder::JwsBuilder;
pub use loader::JwsLoader;
pub use verifier::JwsVerifier;

use serde_json::Value;

use crate::JoseError;
use crate::checker::TokenHeaders;
use crate::header::{self, Header};

/// A signed token: a payload and one or more signatures over it.
///
/// A detached JWS carries no payload. The payload must then be supplied when verifying.
/// A parsed token cannot tell a detached payload from an empty one, so it keeps an empty
/// payload, and a payload given to the verifier takes its place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Jws {
    payload: Option<Vec<u8>>,
    encoded_payload: Option<String>,
    detached: bool,
    signatures: Vec<Signature>,
}

impl Jws {
    pub(crate) fn new(
        payload: Option<Vec<u8>>,
        encoded_payload: Option<String>,
        detached: bool,
    ) -> Self {
        Self {
            payload,
            encoded_payload,
            detached,
            signatures: Vec::new(),
        }
    }

    pub(crate) fn with_signature(mut self, signature: Signature) -> Self {
        self.signatures.push(signature);
        self
    }

    /// The payload, unless it is detached.
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// The payload as it appears in the signing input.
    pub fn encoded_payload(&self) -> Option<&str> {
        self.encoded_payload.as_deref()
    }

    pub fn is_payload_detached(&self) -> bool {
        self.detached
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn signature(&self, index: usize) -> Result<&Signature, JoseError> {
        self.signatures
            .get(index)
            .ok_or(JoseError::InvalidConfiguration("the signature does not exist"))
    }

    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    /// The `b64` mode shared by all the signatures.
    pub fn is_payload_encoded(&self) -> Result<bool, JoseError> {
        let mut modes = self.signatures.iter().map(Signature::is_payload_encoded);
        let first = modes.next().transpose()?.unwrap_or(true);
        for mode in modes {
            if mode? != first {
                return Err(JoseError::ForeignPayloadEncoding);
            }
        }
        Ok(first)
    }
}

/// One signature of a [`Jws`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    protected: Header,
    encoded_protected: String,
    header: Header,
    signature: Vec<u8>,
}

impl Signature {
    pub(crate) fn new(
        protected: Header,
        encoded_protected: String,
        header: Header,
        signature: Vec<u8>,
    ) -> Self {
        Self {
            protected,
            encoded_protected,
            header,
            signature,
        }
    }

    pub fn protected_header(&self) -> &Header {
        &self.protected
    }

    /// The protected header exactly as it was signed.
    pub fn encoded_protected_header(&self) -> &str {
        &self.encoded_protected
    }

    /// The unprotected per-signature header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// A header parameter, protected first.
    pub fn header_parameter(&self, name: &str) -> Option<&Value> {
        self.protected.get(name).or_else(|| self.header.get(name))
    }

    pub fn is_payload_encoded(&self) -> Result<bool, JoseError> {
        header::is_payload_encoded(&self.protected)
    }

    pub fn headers(&self) -> TokenHeaders {
        TokenHeaders {
            protected: self.protected.clone(),
            unprotected: self.header.clone(),
        }
    }
}

/// The string that is signed: `protected "." payload`.
pub(crate) fn signing_input(encoded_protected: &str, encoded_payload: &str) -> Vec<u8> {
    let mut input = Vec::with_capacity(encoded_protected.len() + 1 + encoded_payload.len());
    input.extend_from_slice(encoded_protected.as_bytes());
    input.push(b'.');
    input.extend_from_slice(encoded_payload.as_bytes());
    input
}

/// The payload as it appears in the signing input for the given `b64` mode.
pub(crate) fn encode_payload(payload: &[u8], encoded: bool) -> Result<String, JoseError> {
    if encoded {
        Ok(crate::base64::encode(payload))
    } else {
        String::from_utf8(payload.to_vec()).map_err(|_| {
            JoseError::InvalidConfiguration("an unencoded payload must be valid UTF-8")
        })
    }
}
