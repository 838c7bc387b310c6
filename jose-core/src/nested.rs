//! Nested tokens: a signed JWS carried as the payload of a JWE (sign then encrypt).

use serde_json::Value;

use crate::JoseError;
use crate::algorithm::{
    CompressionMethod, ContentEncryptionAlgorithm, KeyManagementAlgorithm, SignatureAlgorithm,
};
use crate::header::Header;
use crate::jwe::{Jwe, JweBuilder, JweLoader, RecipientSpec};
use crate::jwk::Jwk;
use crate::jwkset::JwkSet;
use crate::jws::{Jws, JwsBuilder, JwsLoader};
use crate::serializer::SerializerManager;

/// A signature to add to the inner JWS.
#[derive(Clone, Debug)]
pub struct SignatureSpec {
    pub key: Jwk,
    pub protected: Header,
    pub header: Header,
}

/// Where a nested token is serialized to.
#[derive(Clone, Copy, Debug)]
pub struct NestedSerialization<'a> {
    /// Serializer name for the inner JWS.
    pub jws: &'a str,
    /// Serializer name for the outer JWE.
    pub jwe: &'a str,
}

/// Signs a payload, then encrypts the serialized JWS.
pub struct NestedTokenBuilder<S, K, C, Z> {
    jws_builder: JwsBuilder<S>,
    jws_serializers: SerializerManager<Jws>,
    jwe_builder: JweBuilder<K, C, Z>,
    jwe_serializers: SerializerManager<Jwe>,
}

impl<S, K, C, Z> NestedTokenBuilder<S, K, C, Z>
where
    S: SignatureAlgorithm + Clone,
    K: KeyManagementAlgorithm + Clone,
    C: ContentEncryptionAlgorithm + Clone,
    Z: CompressionMethod + Clone,
{
    pub fn new(
        jws_builder: JwsBuilder<S>,
        jws_serializers: SerializerManager<Jws>,
        jwe_builder: JweBuilder<K, C, Z>,
        jwe_serializers: SerializerManager<Jwe>,
    ) -> Self {
        Self {
            jws_builder,
            jws_serializers,
            jwe_builder,
            jwe_serializers,
        }
    }

    /// Sign `payload` with every signature, then encrypt the result for every recipient.
    ///
    /// `cty` is set to `JWT` in the JWE protected header unless already present.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        payload: &[u8],
        signatures: &[SignatureSpec],
        serialization: NestedSerialization<'_>,
        jwe_protected: Header,
        jwe_unprotected: Header,
        recipients: &[RecipientSpec],
        aad: Option<&[u8]>,
    ) -> Result<String, JoseError> {
        let mut jws = self.jws_builder.create().with_payload(payload, false);
        for s in signatures {
            jws = jws.add_signature(&s.key, s.protected.clone(), s.header.clone())?;
        }
        let jws = self
            .jws_serializers
            .serialize(serialization.jws, &jws.build()?, None)?;

        let mut protected = jwe_protected;
        protected
            .entry("cty")
            .or_insert_with(|| Value::from("JWT"));

        let mut jwe = self
            .jwe_builder
            .create()
            .with_payload(jws)
            .with_shared_protected_header(protected)
            .with_shared_header(jwe_unprotected);
        if let Some(aad) = aad {
            jwe = jwe.with_aad(aad);
        }
        for r in recipients {
            jwe = jwe.add_recipient(&r.key, r.header.clone(), r.sender_key.as_ref());
        }

        self.jwe_serializers
            .serialize(serialization.jwe, &jwe.build()?, None)
    }
}

/// Decrypts a nested token and verifies the JWS inside it.
pub struct NestedTokenLoader<S, K, C, Z> {
    jwe_loader: JweLoader<K, C, Z>,
    jws_loader: JwsLoader<S>,
}

impl<S, K, C, Z> NestedTokenLoader<S, K, C, Z>
where
    S: SignatureAlgorithm,
    K: KeyManagementAlgorithm,
    C: ContentEncryptionAlgorithm,
    Z: CompressionMethod,
{
    pub fn new(jwe_loader: JweLoader<K, C, Z>, jws_loader: JwsLoader<S>) -> Self {
        Self {
            jwe_loader,
            jws_loader,
        }
    }

    /// Returns the verified JWS and the index of the signature that was verified.
    ///
    /// The JWE must declare `cty: "JWT"` for the recipient it was decrypted for.
    pub fn load(
        &self,
        token: &str,
        encryption_keys: &JwkSet,
        signature_keys: &JwkSet,
    ) -> Result<(Jws, usize), JoseError> {
        let (jwe, recipient) = self
            .jwe_loader
            .load_and_decrypt_with_key_set(token, encryption_keys)?;

        let cty = jwe
            .header_parameter(recipient, "cty")
            .and_then(Value::as_str)
            .ok_or_else(|| JoseError::MissingHeaderParameter("cty".into()))?;
        if !cty.eq_ignore_ascii_case("JWT") {
            return Err(JoseError::InvalidHeader(
                "the content type of a nested token must be \"JWT\"".into(),
            ));
        }

        let payload = jwe.payload().ok_or(JoseError::CryptoError)?;
        let inner = std::str::from_utf8(payload).map_err(|_| JoseError::UnsupportedInput)?;
        self.jws_loader
            .load_and_verify_with_key_set(inner, signature_keys, None)
    }
}
