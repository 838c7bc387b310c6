//! Wire serializations and the serializer manager.

use crate::JoseError;

/// Converts a token to and from one of its wire forms.
pub trait Serializer<T> {
    /// The registered name, e.g. `jws_compact`.
    fn name(&self) -> &'static str;

    /// Serialize the token. `index` selects the signature or recipient for serializations
    /// that carry only one, defaulting to the first.
    fn serialize(&self, token: &T, index: Option<usize>) -> Result<String, JoseError>;

    fn unserialize(&self, input: &str) -> Result<T, JoseError>;
}

/// A set of serializers, selected by name or by trying each in turn.
pub struct SerializerManager<T> {
    serializers: Vec<Box<dyn Serializer<T> + Send + Sync>>,
}

impl<T> SerializerManager<T> {
    pub fn new(serializers: Vec<Box<dyn Serializer<T> + Send + Sync>>) -> Self {
        Self { serializers }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.serializers.iter().map(|s| s.name())
    }

    pub fn serialize(
        &self,
        name: &str,
        token: &T,
        index: Option<usize>,
    ) -> Result<String, JoseError> {
        self.serializers
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| JoseError::UnsupportedSerializer(name.to_owned()))?
            .serialize(token, index)
    }

    /// Try every serializer, returning the token and the name of the one that parsed it.
    pub fn unserialize(&self, input: &str) -> Result<(T, &'static str), JoseError> {
        for s in &self.serializers {
            match s.unserialize(input) {
                Ok(token) => return Ok((token, s.name())),
                Err(error) => {
                    tracing::trace!(serializer = s.name(), %error, "serializer rejected input");
                }
            }
        }
        Err(JoseError::UnsupportedInput)
    }
}

pub(crate) fn select<'a, U>(
    items: &'a [U],
    index: Option<usize>,
    what: &'static str,
) -> Result<&'a U, JoseError> {
    items
        .get(index.unwrap_or(0))
        .ok_or(JoseError::InvalidConfiguration(what))
}

/// Split a compact serialization into exactly `N` segments.
pub(crate) fn split_n<const N: usize>(input: &str) -> Result<[&str; N], JoseError> {
    let mut out = [""; N];
    let mut parts = input.split('.');
    for slot in &mut out {
        *slot = parts.next().ok_or(JoseError::UnsupportedInput)?;
    }
    match parts.next() {
        Some(_) => Err(JoseError::UnsupportedInput),
        None => Ok(out),
    }
}

/// Reads a base64url string member from a JSON object.
pub(crate) fn json_bytes(
    object: &serde_json::Map<String, serde_json::Value>,
    name: &str,
) -> Result<Option<Vec<u8>>, JoseError> {
    match object.get(name) {
        None => Ok(None),
        Some(serde_json::Value::String(s)) => crate::base64::decode(s).map(Some),
        Some(_) => Err(JoseError::UnsupportedInput),
    }
}

/// Reads a string member from a JSON object.
pub(crate) fn json_str<'a>(
    object: &'a serde_json::Map<String, serde_json::Value>,
    name: &str,
) -> Result<Option<&'a str>, JoseError> {
    match object.get(name) {
        None => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(JoseError::UnsupportedInput),
    }
}

/// Parse the input as a JSON object.
pub(crate) fn json_object(
    input: &str,
) -> Result<serde_json::Map<String, serde_json::Value>, JoseError> {
    match serde_json::from_str(input) {
        Ok(serde_json::Value::Object(o)) => Ok(o),
        _ => Err(JoseError::UnsupportedInput),
    }
}
