//! JSON Web Key Sets and key selection.
//!
//! <https://www.rfc-editor.org/rfc/rfc7517#section-5>

use core::hash::BuildHasher;

use hashbrown::{DefaultHashBuilder, HashTable};
use serde_json::{Map, Value};

use crate::JoseError;
use crate::algorithm::Algorithm;
use crate::jwk::{Jwk, KeyUsage};

/// An ordered set of [`Jwk`]s, deduplicated by `kid`.
///
/// A key whose `kid` is already present replaces the earlier key in place.
/// Keys without a `kid` are appended.
#[derive(Clone, Debug, Default)]
pub struct JwkSet {
    keys: Vec<Jwk>,
    /// positions into `keys`, by `kid`
    kids: HashTable<usize>,
    hasher: DefaultHashBuilder,
}

impl JwkSet {
    pub fn new(keys: impl IntoIterator<Item = Jwk>) -> Self {
        let mut set = Self::default();
        for key in keys {
            set.insert(key);
        }
        set
    }

    /// Parse the `{"keys":[...]}` form.
    pub fn from_json(json: &str) -> Result<Self, JoseError> {
        let mut value: Map<String, Value> = serde_json::from_str(json)?;
        let Some(Value::Array(keys)) = value.remove("keys") else {
            return Err(JoseError::InvalidKey("the key set has no \"keys\" array"));
        };
        keys.into_iter()
            .map(|key| match key {
                Value::Object(values) => Jwk::new(values),
                _ => Err(JoseError::InvalidKey("the key is not a JSON object")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// The `{"keys":[...]}` form.
    pub fn to_json(&self) -> String {
        serde_json::json!({ "keys": self.keys }).to_string()
    }

    fn insert(&mut self, key: Jwk) {
        let Some(kid) = key.get_str("kid").map(str::to_owned) else {
            self.keys.push(key);
            return;
        };

        let hash = self.hasher.hash_one(&kid);
        let keys = &self.keys;
        let hasher = &self.hasher;
        match self.kids.find(hash, |&i| keys[i].get_str("kid") == Some(&kid)) {
            Some(&i) => self.keys[i] = key,
            None => {
                self.kids.insert_unique(hash, self.keys.len(), |&i| {
                    hasher.hash_one(keys[i].get_str("kid").unwrap_or_default())
                });
                self.keys.push(key);
            }
        }
    }

    /// A copy of this set with the key added.
    pub fn with(&self, key: Jwk) -> Self {
        let mut set = self.clone();
        set.insert(key);
        set
    }

    /// A copy of this set without the key identified by `kid`.
    pub fn without(&self, kid: &str) -> Self {
        Self::new(
            self.keys
                .iter()
                .filter(|k| k.get_str("kid") != Some(kid))
                .cloned(),
        )
    }

    pub fn get(&self, kid: &str) -> Option<&Jwk> {
        let hash = self.hasher.hash_one(kid);
        self.kids
            .find(hash, |&i| self.keys[i].get_str("kid") == Some(kid))
            .map(|&i| &self.keys[i])
    }

    pub fn get_index(&self, index: usize) -> Option<&Jwk> {
        self.keys.get(index)
    }

    pub fn has(&self, kid: &str) -> bool {
        self.get(kid).is_some()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Jwk> {
        self.keys.iter()
    }

    /// Select the most suitable key for the operation.
    ///
    /// Every key is scored. A key declaring a matching `use` or `key_ops` scores 1, and
    /// a key declaring neither scores 0. With an algorithm, a key whose type is accepted
    /// scores 1 more, and 1 more again if it also declares that `alg`. Keys with a
    /// conflicting `use`, `key_ops`, `kty` or `alg` are excluded, as are keys not matching
    /// every restriction exactly. The first key with the highest score wins.
    pub fn select_key<A: Algorithm + ?Sized>(
        &self,
        usage: KeyUsage,
        algorithm: Option<&A>,
        restrictions: &[(&str, Value)],
    ) -> Result<Option<&Jwk>, JoseError> {
        let mut candidates = Vec::new();
        for key in &self.keys {
            let Some(use_score) = use_score(key, usage)? else {
                continue;
            };
            let Some(alg_score) = algorithm_score(key, algorithm) else {
                continue;
            };
            if !restrictions.iter().all(|(k, v)| key.get(k) == Some(v)) {
                continue;
            }
            candidates.push((use_score + alg_score, key));
        }

        // stable: ties keep their original order
        candidates.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(candidates.first().map(|(_, key)| *key))
    }
}

fn use_score(key: &Jwk, usage: KeyUsage) -> Result<Option<u32>, JoseError> {
    let wanted = usage.public_key_use();
    if let Some(u) = key.get_str("use") {
        return Ok((u == wanted).then_some(1));
    }
    if let Some(ops) = key.get("key_ops").and_then(Value::as_array) {
        for op in ops {
            let u = match op.as_str() {
                Some("sign" | "verify") => "sig",
                Some(
                    "encrypt" | "decrypt" | "wrapKey" | "unwrapKey" | "deriveKey" | "deriveBits",
                ) => "enc",
                _ => {
                    return Err(JoseError::KeyUsage(format!(
                        "unsupported key operation {op}"
                    )));
                }
            };
            if u == wanted {
                return Ok(Some(1));
            }
        }
        return Ok(None);
    }
    Ok(Some(0))
}

fn algorithm_score<A: Algorithm + ?Sized>(key: &Jwk, algorithm: Option<&A>) -> Option<u32> {
    let Some(algorithm) = algorithm else {
        return Some(0);
    };
    if !algorithm.allowed_key_types().contains(&key.kty()) {
        return None;
    }
    match key.get_str("alg") {
        Some(alg) if alg == algorithm.name() => Some(2),
        Some(_) => None,
        None => Some(1),
    }
}

impl<'a> IntoIterator for &'a JwkSet {
    type Item = &'a Jwk;
    type IntoIter = core::slice::Iter<'a, Jwk>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

impl FromIterator<Jwk> for JwkSet {
    fn from_iter<T: IntoIterator<Item = Jwk>>(iter: T) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Hs256;
    impl Algorithm for Hs256 {
        fn name(&self) -> &'static str {
            "HS256"
        }
        fn allowed_key_types(&self) -> &'static [&'static str] {
            &["oct"]
        }
    }

    fn key(v: Value) -> Jwk {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn dedup_by_kid() {
        let set = JwkSet::new([
            key(json!({"kty": "oct", "k": "AA", "kid": "1"})),
            key(json!({"kty": "oct", "k": "AQ"})),
            key(json!({"kty": "oct", "k": "Ag", "kid": "1"})),
        ]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.get("1").unwrap().get_str("k"), Some("Ag"));
        assert_eq!(set.get_index(0).unwrap().get_str("k"), Some("Ag"));
        assert_eq!(set.get_index(1).unwrap().get_str("k"), Some("AQ"));
    }

    #[test]
    fn with_and_without() {
        let set = JwkSet::default().with(key(json!({"kty": "oct", "k": "AA", "kid": "a"})));
        let set = set.with(key(json!({"kty": "oct", "k": "AQ", "kid": "b"})));
        assert!(set.has("a"));
        let set = set.without("a");
        assert!(!set.has("a"));
        assert!(set.has("b"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn json_round_trip() {
        let set = JwkSet::from_json(r#"{"keys":[{"kty":"oct","k":"AA","kid":"1"}]}"#).unwrap();
        let again = JwkSet::from_json(&set.to_json()).unwrap();
        assert_eq!(again.get("1"), set.get("1"));
        JwkSet::from_json(r#"{"keys":{}}"#).unwrap_err();
    }

    #[test]
    fn select_key_by_restriction() {
        let set = JwkSet::new([
            key(json!({"kty": "oct", "k": "AA", "kid": "1"})),
            key(json!({"kty": "oct", "k": "AA", "kid": "2"})),
        ]);

        let found = set
            .select_key(KeyUsage::Signature, Some(&Hs256), &[("kid", json!("2"))])
            .unwrap()
            .unwrap();
        assert_eq!(found.get_str("kid"), Some("2"));

        let none = set
            .select_key(KeyUsage::Signature, Some(&Hs256), &[("kid", json!("3"))])
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn select_key_prefers_declared_alg_and_use() {
        let set = JwkSet::new([
            key(json!({"kty": "oct", "k": "AA", "kid": "plain"})),
            key(json!({"kty": "oct", "k": "AA", "kid": "alg", "alg": "HS256"})),
            key(json!({"kty": "oct", "k": "AA", "kid": "both", "alg": "HS256", "use": "sig"})),
            key(json!({"kty": "oct", "k": "AA", "kid": "enc", "use": "enc"})),
            key(json!({"kty": "RSA", "n": "AA", "e": "AQAB", "kid": "rsa"})),
        ]);

        let found = set
            .select_key(KeyUsage::Signature, Some(&Hs256), &[])
            .unwrap()
            .unwrap();
        assert_eq!(found.get_str("kid"), Some("both"));

        let found = set
            .select_key(KeyUsage::Encryption, None::<&Hs256>, &[])
            .unwrap()
            .unwrap();
        assert_eq!(found.get_str("kid"), Some("enc"));
    }

    #[test]
    fn select_key_ties_keep_first() {
        let set = JwkSet::new([
            key(json!({"kty": "oct", "k": "AA", "kid": "first"})),
            key(json!({"kty": "oct", "k": "AA", "kid": "second"})),
        ]);
        let found = set
            .select_key(KeyUsage::Signature, Some(&Hs256), &[])
            .unwrap()
            .unwrap();
        assert_eq!(found.get_str("kid"), Some("first"));
    }
}
