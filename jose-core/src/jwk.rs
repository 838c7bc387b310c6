//! JSON Web Keys (RFC 7517).

use std::collections::BTreeMap;
use std::fmt;

use digest::Digest;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{JoseError, base64};

/// Members holding private or symmetric key material.
const PRIVATE_MEMBERS: &[&str] = &["p", "d", "q", "dp", "dq", "qi", "oth", "k"];

/// A JSON Web Key.
///
/// The key is an immutable JSON object with a mandatory `kty` member. Operations such as
/// [`Jwk::to_public`] and [`Jwk::with`] return new keys.
#[derive(Clone, PartialEq, Eq)]
pub struct Jwk {
    values: Map<String, Value>,
}

impl Jwk {
    /// Create a key from its members. `kty` must be present and a string.
    pub fn new(values: Map<String, Value>) -> Result<Self, JoseError> {
        match values.get("kty") {
            Some(Value::String(_)) => Ok(Self { values }),
            Some(_) => Err(JoseError::InvalidKey("the parameter \"kty\" must be a string")),
            None => Err(JoseError::MissingKeyParameter("kty")),
        }
    }

    /// Parse a key from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, JoseError> {
        match serde_json::from_str(json)? {
            Value::Object(values) => Self::new(values),
            _ => Err(JoseError::InvalidKey("the key is not a JSON object")),
        }
    }

    /// The compact JSON form of this key.
    pub fn to_json(&self) -> String {
        Value::Object(self.values.clone()).to_string()
    }

    /// The key type.
    pub fn kty(&self) -> &str {
        self.values.get("kty").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// A string member. Non-string values are treated as absent.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// A base64url encoded member, decoded.
    pub fn get_bytes(&self, name: &'static str) -> Result<Vec<u8>, JoseError> {
        match self.values.get(name) {
            Some(Value::String(s)) => base64::decode(s),
            Some(_) => Err(JoseError::InvalidKey("key parameters must be base64url strings")),
            None => Err(JoseError::MissingKeyParameter(name)),
        }
    }

    /// A base64url encoded member, decoded, if present.
    pub fn get_opt_bytes(&self, name: &'static str) -> Result<Option<Vec<u8>>, JoseError> {
        if self.has(name) {
            self.get_bytes(name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// All members of the key.
    pub fn all(&self) -> &Map<String, Value> {
        &self.values
    }

    /// A copy of this key with the member set. `kty` cannot be removed this way.
    pub fn with(&self, name: impl Into<String>, value: impl Into<Value>) -> Result<Self, JoseError> {
        let mut values = self.values.clone();
        values.insert(name.into(), value.into());
        Self::new(values)
    }

    /// A copy of this key without the member.
    pub fn without(&self, name: &str) -> Result<Self, JoseError> {
        let mut values = self.values.clone();
        values.shift_remove(name);
        Self::new(values)
    }

    /// The public part of this key.
    ///
    /// Private members are removed. Symmetric keys have no public part and lose `k`.
    pub fn to_public(&self) -> Self {
        let mut values = self.values.clone();
        values.retain(|k, _| !PRIVATE_MEMBERS.contains(&k.as_str()));
        Self { values }
    }

    /// Whether the key holds private or secret material.
    pub fn is_private(&self) -> bool {
        PRIVATE_MEMBERS.iter().any(|m| self.has(m))
    }

    /// The RFC 7638 thumbprint: the digest of the required members in lexicographic order.
    pub fn thumbprint<D: Digest>(&self) -> Result<String, JoseError> {
        let members: &[&'static str] = match self.kty() {
            "EC" => &["crv", "kty", "x", "y"],
            "RSA" => &["e", "kty", "n"],
            "oct" => &["k", "kty"],
            "OKP" => &["crv", "kty", "x"],
            _ => return Err(JoseError::InvalidKey("unsupported key type for thumbprint")),
        };

        let mut canonical = BTreeMap::new();
        for &m in members {
            let v = self.values.get(m).ok_or(JoseError::MissingKeyParameter(m))?;
            canonical.insert(m, v);
        }
        let json = serde_json::to_vec(&canonical)?;
        Ok(base64::encode(D::digest(&json)))
    }

    /// Check that the key is of one of the allowed types.
    pub fn check_kty(&self, allowed: &[&str]) -> Result<(), JoseError> {
        if allowed.contains(&self.kty()) {
            Ok(())
        } else {
            Err(JoseError::KeyUsage(format!(
                "key type \"{}\" is not allowed for this algorithm",
                self.kty()
            )))
        }
    }

    /// Check the `use` and `key_ops` members allow the operation.
    pub fn check_usage(&self, usage: KeyUsage) -> Result<(), JoseError> {
        if let Some(u) = self.get("use") {
            let u = u
                .as_str()
                .ok_or_else(|| JoseError::KeyUsage("\"use\" must be a string".into()))?;
            if u != usage.public_key_use() {
                return Err(JoseError::KeyUsage(format!(
                    "key with use \"{u}\" cannot be used for {usage}"
                )));
            }
        }

        if let Some(ops) = self.get("key_ops") {
            let ops = ops
                .as_array()
                .ok_or_else(|| JoseError::KeyUsage("\"key_ops\" must be an array".into()))?;
            let allowed = usage.key_ops();
            if !ops.iter().filter_map(Value::as_str).any(|op| allowed.contains(&op)) {
                return Err(JoseError::KeyUsage(format!(
                    "key operations do not allow {usage}"
                )));
            }
        }

        Ok(())
    }

    /// Check that the key's `alg` member, if present, names this algorithm.
    pub fn check_algorithm(&self, algorithm: &str) -> Result<(), JoseError> {
        match self.get_str("alg") {
            Some(alg) if alg != algorithm => Err(JoseError::KeyUsage(format!(
                "key is only allowed for algorithm \"{alg}\""
            ))),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Jwk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // never print key material
        f.debug_struct("Jwk")
            .field("kty", &self.kty())
            .field("kid", &self.get_str("kid"))
            .field("alg", &self.get_str("alg"))
            .finish_non_exhaustive()
    }
}

impl Serialize for Jwk {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Jwk {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let values = Map::deserialize(d)?;
        Jwk::new(values).map_err(serde::de::Error::custom)
    }
}

/// The operation a key is about to be used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyUsage {
    Signature,
    Verification,
    Encryption,
    Decryption,
}

impl KeyUsage {
    /// The `use` value that permits this operation.
    pub fn public_key_use(self) -> &'static str {
        match self {
            KeyUsage::Signature | KeyUsage::Verification => "sig",
            KeyUsage::Encryption | KeyUsage::Decryption => "enc",
        }
    }

    fn key_ops(self) -> &'static [&'static str] {
        match self {
            KeyUsage::Signature => &["sign"],
            KeyUsage::Verification => &["verify"],
            KeyUsage::Encryption => &["encrypt", "wrapKey", "deriveKey", "deriveBits"],
            KeyUsage::Decryption => &["decrypt", "unwrapKey", "deriveKey", "deriveBits"],
        }
    }
}

impl fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyUsage::Signature => "signature",
            KeyUsage::Verification => "verification",
            KeyUsage::Encryption => "encryption",
            KeyUsage::Decryption => "decryption",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kty_is_mandatory() {
        assert!(matches!(
            Jwk::from_json(r#"{"k":"AA"}"#),
            Err(JoseError::MissingKeyParameter("kty"))
        ));
        Jwk::from_json(r#"{"kty":1}"#).unwrap_err();
    }

    #[test]
    fn ec_thumbprint() {
        let key = Jwk::from_json(
            r#"{"kty":"EC","crv":"P-256","x":"f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU","y":"x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0","use":"sig","kid":"whatever"}"#,
        )
        .unwrap();

        assert_eq!(
            key.thumbprint::<sha2::Sha256>().unwrap(),
            "oKIywvGUpTVTyxMQ3bwIIeQUudfr_CkLMjCE19ECD-U"
        );
    }

    #[test]
    fn okp_thumbprint() {
        let key = Jwk::from_json(
            r#"{"kty":"OKP","crv":"Ed25519","d":"nWGxne_9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A","x":"11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"}"#,
        )
        .unwrap();

        assert_eq!(
            key.thumbprint::<sha2::Sha256>().unwrap(),
            "kPrK_qmxVWaYVA9wwBF6Iuo3vVzz7TxHCTwXBygrS4k"
        );
    }

    #[test]
    fn to_public_strips_private_members() {
        let key = Jwk::from_json(r#"{"kty":"OKP","crv":"Ed25519","d":"AA","x":"AA"}"#).unwrap();
        let public = key.to_public();
        assert!(key.is_private());
        assert!(!public.is_private());
        assert!(public.has("x"));
        assert!(!public.has("d"));
    }

    #[test]
    fn usage_checks() {
        let key = Jwk::from_json(r#"{"kty":"oct","k":"AA","use":"sig"}"#).unwrap();
        key.check_usage(KeyUsage::Signature).unwrap();
        key.check_usage(KeyUsage::Encryption).unwrap_err();

        let key = Jwk::from_json(r#"{"kty":"oct","k":"AA","key_ops":["wrapKey"]}"#).unwrap();
        key.check_usage(KeyUsage::Encryption).unwrap();
        key.check_usage(KeyUsage::Verification).unwrap_err();

        let key = Jwk::from_json(r#"{"kty":"oct","k":"AA","alg":"HS256"}"#).unwrap();
        key.check_algorithm("HS256").unwrap();
        key.check_algorithm("HS512").unwrap_err();
    }

    #[test]
    fn debug_hides_key_material() {
        let key = Jwk::from_json(r#"{"kty":"oct","k":"c2VjcmV0","kid":"1"}"#).unwrap();
        let debug = format!("{key:?}");
        assert!(!debug.contains("c2VjcmV0"));
        assert!(debug.contains("oct"));
    }
}
