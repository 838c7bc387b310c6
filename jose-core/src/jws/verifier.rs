use super::{Jws, Signature, encode_payload, signing_input};
use crate::JoseError;
use crate::algorithm::SignatureAlgorithm;
use crate::header;
use crate::jwk::{Jwk, KeyUsage};
use crate::jwkset::JwkSet;
use crate::manager::AlgorithmManager;

/// Verifies the signatures of a [`Jws`].
///
/// Misuse (no keys, a missing signature, an unknown algorithm, a missing or unexpected
/// detached payload) is an error. A signature that does not verify is not: the result
/// only says whether some key verified it.
#[derive(Clone)]
pub struct JwsVerifier<S> {
    manager: AlgorithmManager<S>,
}

impl<S: SignatureAlgorithm> JwsVerifier<S> {
    pub fn new(manager: AlgorithmManager<S>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &AlgorithmManager<S> {
        &self.manager
    }

    pub fn verify_with_key(
        &self,
        jws: &Jws,
        key: &Jwk,
        index: usize,
        detached_payload: Option<&[u8]>,
    ) -> Result<bool, JoseError> {
        let keys = JwkSet::new([key.clone()]);
        self.verify_with_key_set(jws, &keys, index, detached_payload)
            .map(|key| key.is_some())
    }

    /// Verify the signature at `index` against every key of the set.
    ///
    /// All candidate keys are tried even after one succeeds, and failures of individual
    /// keys are not reported. Returns the first key that verified the signature.
    pub fn verify_with_key_set(
        &self,
        jws: &Jws,
        keys: &JwkSet,
        index: usize,
        detached_payload: Option<&[u8]>,
    ) -> Result<Option<Jwk>, JoseError> {
        if keys.is_empty() {
            return Err(JoseError::InvalidConfiguration("there is no key in the key set"));
        }
        let signature = jws.signature(index)?;
        let input = self.input(jws, signature, detached_payload)?;

        header::check_duplicates(&[signature.protected_header(), signature.header()])?;
        let complete = header::merge(&[signature.protected_header(), signature.header()]);
        let alg = self.manager.get(header::require_str(&complete, "alg")?)?;

        let mut verified = None;
        for key in keys {
            let ok = check_key(key, alg)
                .and_then(|()| alg.verify(key, &input, signature.signature()))
                .unwrap_or(false);
            if ok && verified.is_none() {
                verified = Some(key);
            }
        }

        tracing::debug!(
            alg = alg.name(),
            verified = verified.is_some(),
            "verified JWS signature"
        );
        Ok(verified.cloned())
    }

    fn input(
        &self,
        jws: &Jws,
        signature: &Signature,
        detached_payload: Option<&[u8]>,
    ) -> Result<Vec<u8>, JoseError> {
        let encoded = signature.is_payload_encoded()?;
        let encoded_payload = match (jws.is_payload_detached(), detached_payload) {
            (true, Some(payload)) => encode_payload(payload, encoded)?,
            (true, None) => {
                return Err(JoseError::InvalidConfiguration(
                    "the payload is detached and must be provided",
                ));
            }
            // an empty payload segment is how compact and JSON tokens carry a detached payload
            (false, Some(payload)) if jws.encoded_payload().is_none_or(str::is_empty) => {
                encode_payload(payload, encoded)?
            }
            (false, Some(_)) => {
                return Err(JoseError::InvalidConfiguration(
                    "the payload is attached and must not be provided",
                ));
            }
            (false, None) => match jws.encoded_payload() {
                Some(p) => p.to_owned(),
                None => encode_payload(jws.payload().unwrap_or_default(), encoded)?,
            },
        };
        Ok(signing_input(
            signature.encoded_protected_header(),
            &encoded_payload,
        ))
    }
}

fn check_key<S: SignatureAlgorithm>(key: &Jwk, alg: &S) -> Result<(), JoseError> {
    key.check_usage(KeyUsage::Verification)?;
    key.check_algorithm(alg.name())?;
    key.check_kty(alg.allowed_key_types())
}
