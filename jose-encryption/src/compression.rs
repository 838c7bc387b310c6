use jose_core::JoseError;
use jose_core::algorithm::{Algorithm, CompressionMethod};

/// The JWE `zip` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Compression {
    /// Raw DEFLATE (RFC 1951).
    #[cfg(feature = "deflate")]
    Deflate,
}

impl Compression {
    pub const ALL: &[Compression] = &[
        #[cfg(feature = "deflate")]
        Self::Deflate,
    ];
}

impl Algorithm for Compression {
    fn name(&self) -> &'static str {
        match *self {
            #[cfg(feature = "deflate")]
            Self::Deflate => "DEF",
        }
    }

    fn allowed_key_types(&self) -> &'static [&'static str] {
        &[]
    }
}

impl CompressionMethod for Compression {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, JoseError> {
        match *self {
            #[cfg(feature = "deflate")]
            Self::Deflate => deflate::compress(data),
        }
    }

    fn uncompress(&self, data: &[u8]) -> Result<Vec<u8>, JoseError> {
        match *self {
            #[cfg(feature = "deflate")]
            Self::Deflate => deflate::uncompress(data),
        }
    }
}

#[cfg(feature = "deflate")]
mod deflate {
    use std::io::{Read, Write};

    use flate2::Compression;
    use flate2::read::DeflateDecoder;
    use flate2::write::DeflateEncoder;
    use jose_core::JoseError;

    pub(super) fn compress(data: &[u8]) -> Result<Vec<u8>, JoseError> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).map_err(JoseError::Compression)?;
        encoder.finish().map_err(JoseError::Compression)
    }

    pub(super) fn uncompress(data: &[u8]) -> Result<Vec<u8>, JoseError> {
        let mut out = Vec::new();
        DeflateDecoder::new(data)
            .read_to_end(&mut out)
            .map_err(JoseError::Compression)?;
        Ok(out)
    }
}
