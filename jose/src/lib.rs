//! JSON Object Signing and Encryption.
//!
//! This crate binds the generic machinery of `jose-core` to the algorithms of
//! `jose-signature` and `jose-encryption`. Managers only contain the algorithms that were
//! asked for, so a verifier built with `&["ES256"]` never accepts an `HS256` token.
//!
//! ```
//! use jose::{JoseError, factory, jws_builder, jws_loader, serializer};
//! use serde_json::{Map, json};
//!
//! let key = factory::create_ec_key("P-256", Map::new())?;
//! let protected = json!({"alg": "ES256", "typ": "JWT"}).as_object().unwrap().clone();
//!
//! let jws = jws_builder(&["ES256"])?
//!     .with_payload(br#"{"sub":"alice"}"#.to_vec(), false)
//!     .add_signature(&key, protected, Map::new())?
//!     .build()?;
//! let token = serializer::jws().serialize(jose::jws::COMPACT, &jws, None)?;
//!
//! let loader = jws_loader(&["ES256"])?;
//! let (jws, index) = loader.load_and_verify_with_key(&token, &key.to_public(), None)?;
//! assert_eq!(index, 0);
//! assert_eq!(jws.payload(), Some(&br#"{"sub":"alice"}"#[..]));
//! # Ok::<(), JoseError>(())
//! ```

pub mod factory;

pub use jose_core::jwe::{DecryptedJwe, Jwe, Recipient, RecipientSpec};
pub use jose_core::jwk::{Jwk, KeyUsage};
pub use jose_core::jwkset::JwkSet;
pub use jose_core::jws::{Jws, Signature};
pub use jose_core::nested::{NestedSerialization, SignatureSpec};
pub use jose_core::{JoseError, base64, checker, header, validation};
pub use jose_encryption::{Compression, ContentEncryption, KeyManagement, Pbes2Params};
pub use jose_signature::JwsAlgorithm;

use jose_core::manager::{AlgorithmManager, AlgorithmManagerFactory};

pub type JwsBuilder = jose_core::jws::JwsBuilder<JwsAlgorithm>;
pub type JwsVerifier = jose_core::jws::JwsVerifier<JwsAlgorithm>;
pub type JwsLoader = jose_core::jws::JwsLoader<JwsAlgorithm>;

pub type JweBuilder = jose_core::jwe::JweBuilder<KeyManagement, ContentEncryption, Compression>;
pub type JweDecrypter =
    jose_core::jwe::JweDecrypter<KeyManagement, ContentEncryption, Compression>;
pub type JweLoader = jose_core::jwe::JweLoader<KeyManagement, ContentEncryption, Compression>;

pub type NestedTokenBuilder =
    jose_core::nested::NestedTokenBuilder<JwsAlgorithm, KeyManagement, ContentEncryption, Compression>;
pub type NestedTokenLoader =
    jose_core::nested::NestedTokenLoader<JwsAlgorithm, KeyManagement, ContentEncryption, Compression>;

/// Serializer names and the default serializer managers.
pub mod serializer {
    use jose_core::jwe::Jwe;
    use jose_core::jws::Jws;
    pub use jose_core::serializer::{Serializer, SerializerManager};

    /// Compact, flattened JSON and general JSON, tried in that order.
    pub fn jws() -> SerializerManager<Jws> {
        SerializerManager::default()
    }

    /// Compact, flattened JSON and general JSON, tried in that order.
    pub fn jwe() -> SerializerManager<Jwe> {
        SerializerManager::default()
    }
}

/// Serializer names for JWS.
pub mod jws {
    pub use jose_core::jws::serializer::{COMPACT, JSON_FLATTENED, JSON_GENERAL};
}

/// Serializer names for JWE.
pub mod jwe {
    pub use jose_core::jwe::serializer::{COMPACT, JSON_FLATTENED, JSON_GENERAL};
}

/// Every signature algorithm, keyed by its `alg` name.
pub fn signature_algorithms() -> AlgorithmManagerFactory<JwsAlgorithm> {
    jose_signature::default_factory()
}

/// Every key management algorithm, keyed by its `alg` name. PBES2 uses `Pbes2Params::default()`.
pub fn key_management_algorithms() -> AlgorithmManagerFactory<KeyManagement> {
    jose_encryption::default_key_management_factory()
}

/// Every content encryption algorithm, keyed by its `enc` name.
pub fn content_encryption_algorithms() -> AlgorithmManagerFactory<ContentEncryption> {
    jose_encryption::default_content_encryption_factory()
}

/// Every enabled compression method, keyed by its `zip` name.
pub fn compression_methods() -> AlgorithmManagerFactory<Compression> {
    jose_encryption::default_compression_factory()
}

fn every_compression_method() -> AlgorithmManager<Compression> {
    let factory = compression_methods();
    AlgorithmManager::new(factory.all().copied())
}

/// A builder signing with the named algorithms.
pub fn jws_builder(algorithms: &[&str]) -> Result<JwsBuilder, JoseError> {
    Ok(JwsBuilder::new(signature_algorithms().create(algorithms)?))
}

/// A verifier accepting the named algorithms.
pub fn jws_verifier(algorithms: &[&str]) -> Result<JwsVerifier, JoseError> {
    Ok(JwsVerifier::new(signature_algorithms().create(algorithms)?))
}

/// A loader for every serialization, verifying with the named algorithms.
pub fn jws_loader(algorithms: &[&str]) -> Result<JwsLoader, JoseError> {
    Ok(JwsLoader::new(serializer::jws(), jws_verifier(algorithms)?))
}

/// A builder using the named algorithms. Every enabled compression method may be requested
/// with `zip`.
pub fn jwe_builder(
    key_management: &[&str],
    content_encryption: &[&str],
) -> Result<JweBuilder, JoseError> {
    Ok(JweBuilder::new(
        key_management_algorithms().create(key_management)?,
        content_encryption_algorithms().create(content_encryption)?,
        every_compression_method(),
    ))
}

/// A decrypter accepting the named algorithms and every enabled compression method.
pub fn jwe_decrypter(
    key_management: &[&str],
    content_encryption: &[&str],
) -> Result<JweDecrypter, JoseError> {
    Ok(JweDecrypter::new(
        key_management_algorithms().create(key_management)?,
        content_encryption_algorithms().create(content_encryption)?,
        every_compression_method(),
    ))
}

/// A loader for every serialization, decrypting with the named algorithms.
pub fn jwe_loader(
    key_management: &[&str],
    content_encryption: &[&str],
) -> Result<JweLoader, JoseError> {
    Ok(JweLoader::new(
        serializer::jwe(),
        jwe_decrypter(key_management, content_encryption)?,
    ))
}

/// Signs with `signature` algorithms, then encrypts with the named JWE algorithms.
pub fn nested_token_builder(
    signature: &[&str],
    key_management: &[&str],
    content_encryption: &[&str],
) -> Result<NestedTokenBuilder, JoseError> {
    Ok(NestedTokenBuilder::new(
        jws_builder(signature)?,
        serializer::jws(),
        jwe_builder(key_management, content_encryption)?,
        serializer::jwe(),
    ))
}

pub fn nested_token_loader(
    signature: &[&str],
    key_management: &[&str],
    content_encryption: &[&str],
) -> Result<NestedTokenLoader, JoseError> {
    Ok(NestedTokenLoader::new(
        jwe_loader(key_management, content_encryption)?,
        jws_loader(signature)?,
    ))
}
