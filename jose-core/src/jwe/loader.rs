use super::{Jwe, JweDecrypter};
use crate::JoseError;
use crate::algorithm::{CompressionMethod, ContentEncryptionAlgorithm, KeyManagementAlgorithm};
use crate::checker::TokenHeaders;
use crate::jwk::Jwk;
use crate::jwkset::JwkSet;
use crate::serializer::SerializerManager;
use crate::validation::Validate;

type HeaderChecker = Box<dyn Validate<Claims = TokenHeaders> + Send + Sync>;

/// Parses a token in any supported serialization, checks its headers and decrypts it.
pub struct JweLoader<K, C, Z> {
    serializers: SerializerManager<Jwe>,
    decrypter: JweDecrypter<K, C, Z>,
    header_checker: Option<HeaderChecker>,
}

impl<K, C, Z> JweLoader<K, C, Z>
where
    K: KeyManagementAlgorithm,
    C: ContentEncryptionAlgorithm,
    Z: CompressionMethod,
{
    pub fn new(serializers: SerializerManager<Jwe>, decrypter: JweDecrypter<K, C, Z>) -> Self {
        Self {
            serializers,
            decrypter,
            header_checker: None,
        }
    }

    /// Check the headers of a recipient before decrypting for it.
    pub fn with_header_checker(
        mut self,
        checker: impl Validate<Claims = TokenHeaders> + Send + Sync + 'static,
    ) -> Self {
        self.header_checker = Some(Box::new(checker));
        self
    }

    pub fn decrypter(&self) -> &JweDecrypter<K, C, Z> {
        &self.decrypter
    }

    pub fn load_and_decrypt_with_key(
        &self,
        token: &str,
        key: &Jwk,
    ) -> Result<(Jwe, usize), JoseError> {
        self.load_and_decrypt_with_key_set(token, &JwkSet::new([key.clone()]))
    }

    /// Returns the decrypted token and the index of the recipient it was decrypted for.
    pub fn load_and_decrypt_with_key_set(
        &self,
        token: &str,
        keys: &JwkSet,
    ) -> Result<(Jwe, usize), JoseError> {
        let (jwe, _) = self.serializers.unserialize(token)?;

        for index in 0..jwe.recipient_count() {
            if let Some(checker) = &self.header_checker {
                let passed = jwe
                    .headers(index)
                    .and_then(|headers| checker.validate(&headers));
                if let Err(error) = passed {
                    tracing::debug!(recipient = index, %error, "header check failed");
                    continue;
                }
            }
            if let Ok(Some(decrypted)) =
                self.decrypter
                    .decrypt_using_key_set(&jwe, keys, index, None)
            {
                return Ok((decrypted.jwe, index));
            }
        }

        Err(JoseError::CryptoError)
    }
}
