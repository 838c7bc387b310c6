use super::{Jws, JwsVerifier};
use crate::JoseError;
use crate::algorithm::SignatureAlgorithm;
use crate::checker::TokenHeaders;
use crate::jwk::Jwk;
use crate::jwkset::JwkSet;
use crate::serializer::SerializerManager;
use crate::validation::Validate;

type HeaderChecker = Box<dyn Validate<Claims = TokenHeaders> + Send + Sync>;

/// Parses a token in any supported serialization, checks its headers and verifies it.
pub struct JwsLoader<S> {
    serializers: SerializerManager<Jws>,
    verifier: JwsVerifier<S>,
    header_checker: Option<HeaderChecker>,
}

impl<S: SignatureAlgorithm> JwsLoader<S> {
    pub fn new(serializers: SerializerManager<Jws>, verifier: JwsVerifier<S>) -> Self {
        Self {
            serializers,
            verifier,
            header_checker: None,
        }
    }

    /// Check the headers of a signature before verifying it.
    pub fn with_header_checker(
        mut self,
        checker: impl Validate<Claims = TokenHeaders> + Send + Sync + 'static,
    ) -> Self {
        self.header_checker = Some(Box::new(checker));
        self
    }

    pub fn verifier(&self) -> &JwsVerifier<S> {
        &self.verifier
    }

    pub fn load_and_verify_with_key(
        &self,
        token: &str,
        key: &Jwk,
        detached_payload: Option<&[u8]>,
    ) -> Result<(Jws, usize), JoseError> {
        self.load_and_verify_with_key_set(token, &JwkSet::new([key.clone()]), detached_payload)
    }

    /// Returns the token and the index of the first signature that was verified.
    pub fn load_and_verify_with_key_set(
        &self,
        token: &str,
        keys: &JwkSet,
        detached_payload: Option<&[u8]>,
    ) -> Result<(Jws, usize), JoseError> {
        let (jws, _) = self.serializers.unserialize(token)?;

        for (index, signature) in jws.signatures().iter().enumerate() {
            if let Some(checker) = &self.header_checker
                && checker.validate(&signature.headers()).is_err()
            {
                continue;
            }
            if let Ok(Some(_)) =
                self.verifier
                    .verify_with_key_set(&jws, keys, index, detached_payload)
            {
                return Ok((jws, index));
            }
        }

        Err(JoseError::CryptoError)
    }
}
