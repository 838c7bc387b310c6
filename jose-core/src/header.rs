//! JOSE headers.
//!
//! A header is a JSON object. Protected headers are kept alongside their exact encoded
//! form since that form, and not a re-serialization, is what is authenticated.

use serde_json::{Map, Value};

use crate::{JoseError, base64};

/// A JOSE header: a JSON object of header parameters.
pub type Header = Map<String, Value>;

/// Base64url encoding of the compact JSON form of the header.
///
/// An empty header encodes to the empty string.
pub fn encode(header: &Header) -> Result<String, JoseError> {
    if header.is_empty() {
        return Ok(String::new());
    }
    Ok(base64::encode(serde_json::to_vec(header)?))
}

/// Decode an encoded protected header. The empty string decodes to an empty header.
pub fn decode(encoded: &str) -> Result<Header, JoseError> {
    if encoded.is_empty() {
        return Ok(Header::new());
    }
    let bytes = base64::decode(encoded)?;
    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(header)) => Ok(header),
        Ok(_) => Err(JoseError::InvalidHeader("the header is not a JSON object".into())),
        Err(e) => Err(e.into()),
    }
}

/// Parse a JSON value that must be an object, as found in `header` and `unprotected`.
pub(crate) fn from_value(value: Value) -> Result<Header, JoseError> {
    match value {
        Value::Object(header) => Ok(header),
        _ => Err(JoseError::InvalidHeader("the header is not a JSON object".into())),
    }
}

/// Fails if a parameter appears in more than one of the headers.
pub fn check_duplicates(headers: &[&Header]) -> Result<(), JoseError> {
    for (i, a) in headers.iter().enumerate() {
        for b in &headers[i + 1..] {
            if let Some(k) = a.keys().find(|k| b.contains_key(*k)) {
                return Err(JoseError::InvalidHeader(format!(
                    "the header parameter \"{k}\" is duplicated"
                )));
            }
        }
    }
    Ok(())
}

/// Union of the headers. Callers check for duplicates first.
pub fn merge(headers: &[&Header]) -> Header {
    let mut out = Header::new();
    for h in headers {
        out.extend(h.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    out
}

/// String-valued header parameter.
pub fn get_str<'a>(header: &'a Header, name: &str) -> Result<Option<&'a str>, JoseError> {
    match header.get(name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(JoseError::InvalidHeader(format!(
            "the header parameter \"{name}\" must be a string"
        ))),
    }
}

/// String-valued header parameter that must be present.
pub fn require_str<'a>(header: &'a Header, name: &str) -> Result<&'a str, JoseError> {
    get_str(header, name)?.ok_or_else(|| JoseError::MissingHeaderParameter(name.to_owned()))
}

/// Base64url-valued header parameter that must be present, such as `p2s`, `iv` or `tag`.
pub fn require_bytes(header: &Header, name: &str) -> Result<Vec<u8>, JoseError> {
    base64::decode(require_str(header, name)?)
}

/// Whether the payload is base64url encoded, as governed by the `b64` member (RFC 7797).
pub fn is_payload_encoded(protected: &Header) -> Result<bool, JoseError> {
    match protected.get("b64") {
        None => Ok(true),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(JoseError::InvalidHeader(
            "the header parameter \"b64\" must be a boolean".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn header(v: Value) -> Header {
        from_value(v).unwrap()
    }

    #[test]
    fn empty_header_is_empty_segment() {
        assert_eq!(encode(&Header::new()).unwrap(), "");
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_non_objects() {
        let encoded = base64::encode(b"[1,2]");
        assert!(matches!(decode(&encoded), Err(JoseError::InvalidHeader(_))));
    }

    #[test]
    fn duplicates_are_detected() {
        let a = header(json!({"alg": "HS256"}));
        let b = header(json!({"kid": "1"}));
        let c = header(json!({"alg": "none"}));
        check_duplicates(&[&a, &b]).unwrap();
        check_duplicates(&[&a, &b, &c]).unwrap_err();
    }

    #[test]
    fn b64_defaults_to_encoded() {
        assert!(is_payload_encoded(&Header::new()).unwrap());
        assert!(!is_payload_encoded(&header(json!({"b64": false}))).unwrap());
        is_payload_encoded(&header(json!({"b64": "false"}))).unwrap_err();
    }
}
