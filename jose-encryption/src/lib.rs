//! JWE algorithms: key management, content encryption and compression.
//!
//! * [`KeyManagement`] covers `dir`, AES key wrap, AES-GCM key wrap, RSA-OAEP, PBES2 and
//!   ECDH key agreement (ephemeral-static and static-static).
//! * [`ContentEncryption`] covers AES-GCM and AES-CBC with HMAC-SHA2.
//! * [`Compression`] covers `DEF`, with the `deflate` feature.
//!
//! The `default_*_factory` functions register every algorithm under its registered name.

use jose_core::algorithm::Algorithm;
use jose_core::manager::AlgorithmManagerFactory;

mod compression;
pub mod content;
pub mod key_management;

pub use compression::Compression;
pub use content::ContentEncryption;
pub use key_management::{KeyManagement, Pbes2Params};

/// A factory with every key management algorithm, PBES2 using the default parameters.
pub fn default_key_management_factory() -> AlgorithmManagerFactory<KeyManagement> {
    factory(KeyManagement::all(Pbes2Params::default()))
}

/// A factory with every content encryption algorithm.
pub fn default_content_encryption_factory() -> AlgorithmManagerFactory<ContentEncryption> {
    factory(ContentEncryption::ALL)
}

/// A factory with every compression method enabled by cargo features.
pub fn default_compression_factory() -> AlgorithmManagerFactory<Compression> {
    factory(Compression::ALL.iter().copied())
}

fn factory<A: Algorithm + Clone>(algs: impl IntoIterator<Item = A>) -> AlgorithmManagerFactory<A> {
    let mut factory = AlgorithmManagerFactory::new();
    for alg in algs {
        factory.add(alg.name(), alg);
    }
    factory
}
