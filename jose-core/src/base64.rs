//! Unpadded base64url, as used by every JOSE serialization.
//!
//! <https://www.rfc-editor.org/rfc/rfc7515#section-2>

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::JoseError;

/// Encode the bytes as unpadded base64url.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded base64url.
///
/// Padding characters, the standard alphabet and non-canonical trailing bits are rejected.
pub fn decode(src: impl AsRef<[u8]>) -> Result<Vec<u8>, JoseError> {
    URL_SAFE_NO_PAD.decode(src).map_err(|err| {
        tracing::debug!(%err, "invalid base64url");
        JoseError::Base64DecodeError
    })
}

#[cfg(test)]
mod tests {
    use super::{decode, encode};

    #[test]
    fn encodes_without_padding() {
        assert_eq!(encode(b""), "");
        assert_eq!(encode(b"f"), "Zg");
        assert_eq!(encode(b"fo"), "Zm8");
        assert_eq!(encode(b"foo"), "Zm9v");
        assert_eq!(encode([0xfb, 0xff]), "-_8");
    }

    #[test]
    fn decodes_url_alphabet() {
        assert_eq!(decode("Zm9vYg").unwrap(), b"foob");
        assert_eq!(decode("-_8").unwrap(), [0xfb, 0xff]);
        assert_eq!(decode("").unwrap(), b"");
    }

    #[test]
    fn rejects_malformed_input() {
        decode("Zm9vYg==").unwrap_err();
        decode("+/8").unwrap_err();
        decode("Z").unwrap_err();
        decode("Zh").unwrap_err();
    }
}
