//! Core types for JSON Object Signing and Encryption.
//!
//! This crate holds the key model ([`jwk::Jwk`], [`jwkset::JwkSet`]), the algorithm traits
//! and managers, the JWS and JWE value objects and the machinery that builds, verifies,
//! decrypts and serializes them. Concrete algorithms live in `jose-signature` and
//! `jose-encryption`.

pub mod algorithm;
pub mod base64;
pub mod checker;
pub mod header;
pub mod jwe;
pub mod jwk;
pub mod jwkset;
pub mod jws;
pub mod manager;
pub mod nested;
pub mod serializer;
pub mod validation;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// Error returned for all JOSE operations that can fail
pub enum JoseError {
    /// A value was not Base64 URL encoded correctly.
    #[error("the value could not be base64 decoded")]
    Base64DecodeError,
    /// No algorithm, serializer or compression method is registered under this name.
    #[error("unsupported algorithm \"{0}\"")]
    UnsupportedAlgorithm(String),
    /// No serializer is registered under this name.
    #[error("unsupported serializer \"{0}\"")]
    UnsupportedSerializer(String),
    /// A builder, manager or loader was used incorrectly.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
    /// The key cannot be used with the requested algorithm.
    #[error("invalid key: {0}")]
    InvalidKey(&'static str),
    /// The key does not contain a member required by the algorithm.
    #[error("the key parameter \"{0}\" is missing")]
    MissingKeyParameter(&'static str),
    /// The key is not allowed for this operation (`use`, `key_ops` or `alg` mismatch).
    #[error("key usage error: {0}")]
    KeyUsage(String),
    /// The input is not one of the supported token forms.
    #[error("unsupported input")]
    UnsupportedInput,
    /// A header is malformed or contains conflicting members.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    /// A header member required by the algorithm is absent.
    #[error("the header parameter \"{0}\" is missing")]
    MissingHeaderParameter(String),
    /// The signatures of a JWS do not agree on the `b64` payload encoding.
    #[error("foreign payload encoding")]
    ForeignPayloadEncoding,
    /// Could not sign, verify, encrypt or decrypt.
    #[error("cryptographic operation failed")]
    CryptoError,
    /// A header check rejected the token.
    #[error("header check failed: {0}")]
    HeaderCheck(String),
    /// Token claims failed validation.
    #[error("claims check failed: {0}")]
    ClaimsError(String),
    /// JSON could not be parsed or produced.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// There was an error compressing or decompressing the payload.
    #[error("there was an error with the payload compression: {0}")]
    Compression(#[source] std::io::Error),
}
