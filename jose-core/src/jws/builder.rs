use serde_json::Value;

use super::{Jws, Signature, encode_payload, signing_input};
use crate::JoseError;
use crate::algorithm::SignatureAlgorithm;
use crate::header::{self, Header};
use crate::jwk::{Jwk, KeyUsage};
use crate::manager::AlgorithmManager;

/// Builds a [`Jws`] from a payload and one or more signing keys.
///
/// Each step returns a new builder, so a partially configured builder can be reused.
///
/// ```
/// # use jose_core::{jws::JwsBuilder, manager::AlgorithmManager, algorithm::*, jwk::Jwk, JoseError};
/// # #[derive(Clone)] struct Unsigned;
/// # impl Algorithm for Unsigned {
/// #     fn name(&self) -> &'static str { "none" }
/// #     fn allowed_key_types(&self) -> &'static [&'static str] { &["none"] }
/// # }
/// # impl SignatureAlgorithm for Unsigned {
/// #     fn sign(&self, _: &Jwk, _: &[u8]) -> Result<Vec<u8>, JoseError> { Ok(vec![]) }
/// #     fn verify(&self, _: &Jwk, _: &[u8], s: &[u8]) -> Result<bool, JoseError> { Ok(s.is_empty()) }
/// # }
/// let key = Jwk::from_json(r#"{"kty":"none"}"#).unwrap();
/// let protected = serde_json::json!({"alg": "none"}).as_object().unwrap().clone();
///
/// let jws = JwsBuilder::new(AlgorithmManager::new([Unsigned]))
///     .with_payload(b"hello".to_vec(), false)
///     .add_signature(&key, protected, Default::default())
///     .unwrap()
///     .build()
///     .unwrap();
/// assert_eq!(jws.signature_count(), 1);
/// ```
#[derive(Clone)]
pub struct JwsBuilder<S> {
    manager: AlgorithmManager<S>,
    payload: Option<Vec<u8>>,
    detached: bool,
    is_payload_encoded: Option<bool>,
    signatures: Vec<PendingSignature>,
}

#[derive(Clone)]
struct PendingSignature {
    key: Jwk,
    algorithm: &'static str,
    protected: Header,
    header: Header,
}

impl<S: SignatureAlgorithm + Clone> JwsBuilder<S> {
    pub fn new(manager: AlgorithmManager<S>) -> Self {
        Self {
            manager,
            payload: None,
            detached: false,
            is_payload_encoded: None,
            signatures: Vec::new(),
        }
    }

    /// A fresh builder sharing this builder's algorithms.
    pub fn create(&self) -> Self {
        Self::new(self.manager.clone())
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>, detached: bool) -> Self {
        self.payload = Some(payload.into());
        self.detached = detached;
        self
    }

    /// Add a signature made with `key`, using the algorithm named by `alg` in either header.
    pub fn add_signature(
        mut self,
        key: &Jwk,
        protected: Header,
        header: Header,
    ) -> Result<Self, JoseError> {
        let encoded = check_payload_encoding(&protected, &header)?;
        if self.is_payload_encoded.is_some_and(|e| e != encoded) {
            return Err(JoseError::ForeignPayloadEncoding);
        }

        header::check_duplicates(&[&protected, &header])?;
        let complete = header::merge(&[&protected, &header]);
        let alg = self.manager.get(header::require_str(&complete, "alg")?)?;

        key.check_usage(KeyUsage::Signature)?;
        key.check_algorithm(alg.name())?;
        key.check_kty(alg.allowed_key_types())?;

        self.is_payload_encoded = Some(encoded);
        self.signatures.push(PendingSignature {
            key: key.clone(),
            algorithm: alg.name(),
            protected,
            header,
        });
        Ok(self)
    }

    pub fn build(&self) -> Result<Jws, JoseError> {
        let payload = self
            .payload
            .as_ref()
            .ok_or(JoseError::InvalidConfiguration("the payload is not set"))?;
        if self.signatures.is_empty() {
            return Err(JoseError::InvalidConfiguration(
                "at least one signature must be added",
            ));
        }

        let encoded_payload = encode_payload(payload, self.is_payload_encoded.unwrap_or(true))?;
        let mut jws = Jws::new(
            Some(payload.clone()),
            Some(encoded_payload.clone()),
            self.detached,
        );

        for s in &self.signatures {
            let alg = self.manager.get(s.algorithm)?;
            let encoded_protected = header::encode(&s.protected)?;
            let input = signing_input(&encoded_protected, &encoded_payload);
            let signature = alg.sign(&s.key, &input)?;

            jws = jws.with_signature(Signature::new(
                s.protected.clone(),
                encoded_protected,
                s.header.clone(),
                signature,
            ));
        }

        tracing::debug!(signatures = jws.signature_count(), "built JWS");
        Ok(jws)
    }
}

/// `b64` must be protected and declared critical.
fn check_payload_encoding(protected: &Header, header: &Header) -> Result<bool, JoseError> {
    if header.contains_key("b64") {
        return Err(JoseError::InvalidHeader(
            "the header parameter \"b64\" must be protected".into(),
        ));
    }
    let encoded = header::is_payload_encoded(protected)?;
    if protected.contains_key("b64") {
        let critical = protected
            .get("crit")
            .and_then(Value::as_array)
            .is_some_and(|crit| crit.iter().any(|c| c.as_str() == Some("b64")));
        if !critical {
            return Err(JoseError::InvalidHeader(
                "the header parameter \"crit\" must contain \"b64\"".into(),
            ));
        }
    }
    Ok(encoded)
}
