//! JWS compact, flattened JSON and general JSON serializations.

use serde_json::{Map, Value};

use super::{Jws, Signature};
use crate::header::{self, Header};
use crate::serializer::{
    Serializer, SerializerManager, json_bytes, json_object, json_str, select, split_n,
};
use crate::{JoseError, base64};

pub const COMPACT: &str = "jws_compact";
pub const JSON_FLATTENED: &str = "jws_json_flattened";
pub const JSON_GENERAL: &str = "jws_json_general";

/// `protected.payload.signature`
pub struct CompactSerializer;

/// A JSON object with a single signature.
pub struct JsonFlattenedSerializer;

/// A JSON object with a list of signatures.
pub struct JsonGeneralSerializer;

impl Default for SerializerManager<Jws> {
    /// All the JWS serializations, compact first.
    fn default() -> Self {
        SerializerManager::new(vec![
            Box::new(CompactSerializer),
            Box::new(JsonFlattenedSerializer),
            Box::new(JsonGeneralSerializer),
        ])
    }
}

fn payload_segment(jws: &Jws) -> Result<Option<&str>, JoseError> {
    if jws.is_payload_detached() {
        return Ok(None);
    }
    jws.encoded_payload()
        .map(Some)
        .ok_or(JoseError::InvalidConfiguration("the payload is not set"))
}

/// Decode the payload member, given the `b64` mode of the signatures.
fn decode_payload(
    segment: Option<&str>,
    encoded: bool,
) -> Result<(Option<Vec<u8>>, Option<String>), JoseError> {
    match segment {
        None => Ok((None, None)),
        Some(s) if encoded => Ok((Some(base64::decode(s)?), Some(s.to_owned()))),
        Some(s) => Ok((Some(s.as_bytes().to_vec()), Some(s.to_owned()))),
    }
}

fn signature_from_json(object: &Map<String, Value>) -> Result<Signature, JoseError> {
    let signature = json_bytes(object, "signature")?.ok_or(JoseError::UnsupportedInput)?;
    let encoded_protected = json_str(object, "protected")?.unwrap_or_default();
    let protected = header::decode(encoded_protected)?;
    let header = match object.get("header") {
        Some(h) => header::from_value(h.clone())?,
        None => Header::new(),
    };
    Ok(Signature::new(
        protected,
        encoded_protected.to_owned(),
        header,
        signature,
    ))
}

fn signature_to_json(signature: &Signature, out: &mut Map<String, Value>) {
    if !signature.protected_header().is_empty() {
        out.insert(
            "protected".into(),
            signature.encoded_protected_header().into(),
        );
    }
    if !signature.header().is_empty() {
        out.insert("header".into(), signature.header().clone().into());
    }
    out.insert(
        "signature".into(),
        base64::encode(signature.signature()).into(),
    );
}

impl Serializer<Jws> for CompactSerializer {
    fn name(&self) -> &'static str {
        COMPACT
    }

    fn serialize(&self, jws: &Jws, index: Option<usize>) -> Result<String, JoseError> {
        let signature = select(jws.signatures(), index, "the signature does not exist")?;
        if !signature.header().is_empty() {
            return Err(JoseError::InvalidHeader(
                "the signature contains unprotected header parameters and cannot be converted into compact JSON".into(),
            ));
        }
        let payload = payload_segment(jws)?.unwrap_or_default();
        if !signature.is_payload_encoded()? && payload.contains('.') {
            return Err(JoseError::InvalidConfiguration(
                "an unencoded payload containing \".\" cannot be converted into compact JSON",
            ));
        }

        Ok(format!(
            "{}.{}.{}",
            signature.encoded_protected_header(),
            payload,
            base64::encode(signature.signature())
        ))
    }

    fn unserialize(&self, input: &str) -> Result<Jws, JoseError> {
        let [protected, payload, signature] = split_n(input)?;

        let encoded_protected = protected;
        let protected = header::decode(encoded_protected)?;
        let signature = base64::decode(signature)?;
        let encoded = header::is_payload_encoded(&protected)?;

        // an empty segment is a zero-length payload, or a detached one supplied to the verifier
        let (payload, encoded_payload) = decode_payload(Some(payload), encoded)?;

        Ok(Jws::new(payload, encoded_payload, false).with_signature(Signature::new(
            protected,
            encoded_protected.to_owned(),
            Header::new(),
            signature,
        )))
    }
}

impl Serializer<Jws> for JsonFlattenedSerializer {
    fn name(&self) -> &'static str {
        JSON_FLATTENED
    }

    fn serialize(&self, jws: &Jws, index: Option<usize>) -> Result<String, JoseError> {
        let signature = select(jws.signatures(), index, "the signature does not exist")?;
        let mut out = Map::new();
        if let Some(payload) = payload_segment(jws)? {
            out.insert("payload".into(), payload.into());
        }
        signature_to_json(signature, &mut out);
        Ok(Value::Object(out).to_string())
    }

    fn unserialize(&self, input: &str) -> Result<Jws, JoseError> {
        let object = json_object(input)?;
        if object.contains_key("signatures") {
            return Err(JoseError::UnsupportedInput);
        }
        let signature = signature_from_json(&object)?;
        let encoded = signature.is_payload_encoded()?;
        let segment = json_str(&object, "payload")?;
        let (payload, encoded_payload) = decode_payload(segment, encoded)?;

        Ok(Jws::new(payload, encoded_payload, segment.is_none()).with_signature(signature))
    }
}

impl Serializer<Jws> for JsonGeneralSerializer {
    fn name(&self) -> &'static str {
        JSON_GENERAL
    }

    fn serialize(&self, jws: &Jws, _index: Option<usize>) -> Result<String, JoseError> {
        if jws.signatures().is_empty() {
            return Err(JoseError::InvalidConfiguration("the JWS has no signature"));
        }
        jws.is_payload_encoded()?;

        let mut out = Map::new();
        if let Some(payload) = payload_segment(jws)? {
            out.insert("payload".into(), payload.into());
        }
        let signatures = jws
            .signatures()
            .iter()
            .map(|s| {
                let mut o = Map::new();
                signature_to_json(s, &mut o);
                Value::Object(o)
            })
            .collect();
        out.insert("signatures".into(), Value::Array(signatures));
        Ok(Value::Object(out).to_string())
    }

    fn unserialize(&self, input: &str) -> Result<Jws, JoseError> {
        let object = json_object(input)?;
        let Some(Value::Array(signatures)) = object.get("signatures") else {
            return Err(JoseError::UnsupportedInput);
        };
        if signatures.is_empty() {
            return Err(JoseError::UnsupportedInput);
        }

        let signatures = signatures
            .iter()
            .map(|s| match s {
                Value::Object(s) => signature_from_json(s),
                _ => Err(JoseError::UnsupportedInput),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let segment = json_str(&object, "payload")?;
        let mut jws = Jws::new(None, None, segment.is_none());
        for s in signatures {
            jws = jws.with_signature(s);
        }
        let encoded = jws.is_payload_encoded()?;
        let (payload, encoded_payload) = decode_payload(segment, encoded)?;
        jws.payload = payload;
        jws.encoded_payload = encoded_payload;
        Ok(jws)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn jws(header: Value) -> Jws {
        let protected = json!({"alg": "HS256"});
        let Value::Object(protected) = protected else { unreachable!() };
        let Value::Object(header) = header else { unreachable!() };
        Jws::new(Some(b"hello".to_vec()), Some(base64::encode(b"hello")), false).with_signature(
            Signature::new(
                protected.clone(),
                header::encode(&protected).unwrap(),
                header,
                vec![1, 2, 3],
            ),
        )
    }

    #[test]
    fn compact_rejects_unprotected_headers() {
        let token = jws(json!({"kid": "1"}));
        assert!(matches!(
            CompactSerializer.serialize(&token, None),
            Err(JoseError::InvalidHeader(_))
        ));
        JsonFlattenedSerializer.serialize(&token, None).unwrap();
    }

    #[test]
    fn compact_round_trip() {
        let token = jws(json!({}));
        let s = CompactSerializer.serialize(&token, None).unwrap();
        assert_eq!(s, "eyJhbGciOiJIUzI1NiJ9.aGVsbG8.AQID");
        assert_eq!(CompactSerializer.unserialize(&s).unwrap(), token);
    }

    #[test]
    fn compact_empty_payload_is_attached() {
        let jws = CompactSerializer.unserialize("eyJhbGciOiJIUzI1NiJ9..AQID").unwrap();
        assert!(!jws.is_payload_detached());
        assert_eq!(jws.payload(), Some(&b""[..]));
        assert_eq!(jws.encoded_payload(), Some(""));

        let json = JsonFlattenedSerializer.serialize(&jws, None).unwrap();
        assert!(json.contains(r#""payload":"""#));
        assert_eq!(JsonFlattenedSerializer.unserialize(&json).unwrap(), jws);
    }

    #[test]
    fn compact_rejects_wrong_segment_count() {
        CompactSerializer.unserialize("a.b").unwrap_err();
        CompactSerializer.unserialize("a.b.c.d").unwrap_err();
    }

    #[test]
    fn flattened_and_general_round_trip() {
        let token = jws(json!({"kid": "1"}));
        for s in [
            &JsonFlattenedSerializer as &dyn Serializer<Jws>,
            &JsonGeneralSerializer,
        ] {
            let out = s.serialize(&token, None).unwrap();
            assert_eq!(s.unserialize(&out).unwrap(), token);
        }
    }

    #[test]
    fn general_rejects_mixed_payload_encoding() {
        let input = json!({
            "payload": "aGVsbG8",
            "signatures": [
                {"protected": header::encode(json!({"alg": "HS256"}).as_object().unwrap()).unwrap(), "signature": "AQID"},
                {"protected": header::encode(json!({"alg": "HS256", "b64": false, "crit": ["b64"]}).as_object().unwrap()).unwrap(), "signature": "AQID"},
            ]
        });
        assert!(matches!(
            JsonGeneralSerializer.unserialize(&input.to_string()),
            Err(JoseError::ForeignPayloadEncoding)
        ));
    }

    #[test]
    fn manager_tries_every_serializer() {
        let manager = SerializerManager::<Jws>::default();
        let token = jws(json!({"kid": "1"}));
        let out = manager.serialize(JSON_GENERAL, &token, None).unwrap();
        let (parsed, name) = manager.unserialize(&out).unwrap();
        assert_eq!(name, JSON_GENERAL);
        assert_eq!(parsed, token);

        assert!(matches!(
            manager.unserialize("not a token"),
            Err(JoseError::UnsupportedInput)
        ));
        assert!(matches!(
            manager.serialize("jws_xml", &token, None),
            Err(JoseError::UnsupportedSerializer(_))
        ));
    }
}
