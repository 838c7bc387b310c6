//! JWE compact, flattened JSON and general JSON serializations.

use serde_json::{Map, Value};

use super::{Jwe, Recipient};
use crate::header::{self, Header};
use crate::serializer::{
    Serializer, SerializerManager, json_bytes, json_object, json_str, select, split_n,
};
use crate::{JoseError, base64};

pub const COMPACT: &str = "jwe_compact";
pub const JSON_FLATTENED: &str = "jwe_json_flattened";
pub const JSON_GENERAL: &str = "jwe_json_general";

/// `protected.encrypted_key.iv.ciphertext.tag`
pub struct CompactSerializer;

/// A JSON object with a single recipient.
pub struct JsonFlattenedSerializer;

/// A JSON object with a list of recipients.
pub struct JsonGeneralSerializer;

impl Default for SerializerManager<Jwe> {
    /// All the JWE serializations, compact first.
    fn default() -> Self {
        SerializerManager::new(vec![
            Box::new(CompactSerializer),
            Box::new(JsonFlattenedSerializer),
            Box::new(JsonGeneralSerializer),
        ])
    }
}

impl Serializer<Jwe> for CompactSerializer {
    fn name(&self) -> &'static str {
        COMPACT
    }

    fn serialize(&self, jwe: &Jwe, index: Option<usize>) -> Result<String, JoseError> {
        let recipient = select(jwe.recipients(), index, "the recipient does not exist")?;
        if !recipient.header().is_empty() || !jwe.shared_header().is_empty() {
            return Err(JoseError::InvalidHeader(
                "unprotected header parameters cannot be converted into compact JSON".into(),
            ));
        }
        if jwe.aad().is_some() {
            return Err(JoseError::InvalidConfiguration(
                "additional authenticated data cannot be converted into compact JSON",
            ));
        }
        if jwe.shared_protected_header().is_empty() {
            return Err(JoseError::InvalidConfiguration(
                "the shared protected header must not be empty",
            ));
        }

        Ok(format!(
            "{}.{}.{}.{}.{}",
            jwe.encoded_shared_protected_header(),
            base64::encode(recipient.encrypted_key().unwrap_or_default()),
            base64::encode(jwe.iv()),
            base64::encode(jwe.ciphertext()),
            base64::encode(jwe.tag()),
        ))
    }

    fn unserialize(&self, input: &str) -> Result<Jwe, JoseError> {
        let [protected, encrypted_key, iv, ciphertext, tag] = split_n(input)?;

        let shared_protected = header::decode(protected)?;
        let encrypted_key = base64::decode(encrypted_key)?;
        let encrypted_key = (!encrypted_key.is_empty()).then_some(encrypted_key);

        Ok(Jwe::new(
            base64::decode(ciphertext)?,
            base64::decode(iv)?,
            base64::decode(tag)?,
            None,
            shared_protected,
            protected.to_owned(),
            Header::new(),
            vec![Recipient::new(Header::new(), encrypted_key)],
        ))
    }
}

/// Members shared by both JSON serializations.
fn shared_to_json(jwe: &Jwe, out: &mut Map<String, Value>) {
    if !jwe.shared_protected_header().is_empty() {
        out.insert(
            "protected".into(),
            jwe.encoded_shared_protected_header().into(),
        );
    }
    if !jwe.shared_header().is_empty() {
        out.insert("unprotected".into(), jwe.shared_header().clone().into());
    }
    if !jwe.iv().is_empty() {
        out.insert("iv".into(), base64::encode(jwe.iv()).into());
    }
    out.insert("ciphertext".into(), base64::encode(jwe.ciphertext()).into());
    if !jwe.tag().is_empty() {
        out.insert("tag".into(), base64::encode(jwe.tag()).into());
    }
    if let Some(aad) = jwe.aad() {
        out.insert("aad".into(), base64::encode(aad).into());
    }
}

fn recipient_to_json(recipient: &Recipient, out: &mut Map<String, Value>) {
    if !recipient.header().is_empty() {
        out.insert("header".into(), recipient.header().clone().into());
    }
    if let Some(key) = recipient.encrypted_key() {
        out.insert("encrypted_key".into(), base64::encode(key).into());
    }
}

fn recipient_from_json(object: &Map<String, Value>) -> Result<Recipient, JoseError> {
    let header = match object.get("header") {
        Some(h) => header::from_value(h.clone())?,
        None => Header::new(),
    };
    Ok(Recipient::new(header, json_bytes(object, "encrypted_key")?))
}

fn shared_from_json(
    object: &Map<String, Value>,
    recipients: Vec<Recipient>,
) -> Result<Jwe, JoseError> {
    let ciphertext = json_bytes(object, "ciphertext")?.ok_or(JoseError::UnsupportedInput)?;
    let encoded_protected = json_str(object, "protected")?.unwrap_or_default();
    let shared_header = match object.get("unprotected") {
        Some(h) => header::from_value(h.clone())?,
        None => Header::new(),
    };

    Ok(Jwe::new(
        ciphertext,
        json_bytes(object, "iv")?.unwrap_or_default(),
        json_bytes(object, "tag")?.unwrap_or_default(),
        json_bytes(object, "aad")?,
        header::decode(encoded_protected)?,
        encoded_protected.to_owned(),
        shared_header,
        recipients,
    ))
}

impl Serializer<Jwe> for JsonFlattenedSerializer {
    fn name(&self) -> &'static str {
        JSON_FLATTENED
    }

    fn serialize(&self, jwe: &Jwe, index: Option<usize>) -> Result<String, JoseError> {
        let recipient = select(jwe.recipients(), index, "the recipient does not exist")?;
        let mut out = Map::new();
        shared_to_json(jwe, &mut out);
        recipient_to_json(recipient, &mut out);
        Ok(Value::Object(out).to_string())
    }

    fn unserialize(&self, input: &str) -> Result<Jwe, JoseError> {
        let object = json_object(input)?;
        if object.contains_key("recipients") {
            return Err(JoseError::UnsupportedInput);
        }
        let recipient = recipient_from_json(&object)?;
        shared_from_json(&object, vec![recipient])
    }
}

impl Serializer<Jwe> for JsonGeneralSerializer {
    fn name(&self) -> &'static str {
        JSON_GENERAL
    }

    fn serialize(&self, jwe: &Jwe, _index: Option<usize>) -> Result<String, JoseError> {
        if jwe.recipients().is_empty() {
            return Err(JoseError::InvalidConfiguration("the JWE has no recipient"));
        }
        let mut out = Map::new();
        shared_to_json(jwe, &mut out);
        let recipients = jwe
            .recipients()
            .iter()
            .map(|r| {
                let mut o = Map::new();
                recipient_to_json(r, &mut o);
                Value::Object(o)
            })
            .collect();
        out.insert("recipients".into(), Value::Array(recipients));
        Ok(Value::Object(out).to_string())
    }

    fn unserialize(&self, input: &str) -> Result<Jwe, JoseError> {
        let object = json_object(input)?;
        let Some(Value::Array(recipients)) = object.get("recipients") else {
            return Err(JoseError::UnsupportedInput);
        };
        if recipients.is_empty() {
            return Err(JoseError::UnsupportedInput);
        }
        let recipients = recipients
            .iter()
            .map(|r| match r {
                Value::Object(r) => recipient_from_json(r),
                _ => Err(JoseError::UnsupportedInput),
            })
            .collect::<Result<Vec<_>, _>>()?;
        shared_from_json(&object, recipients)
    }
}
