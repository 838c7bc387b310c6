use jose_core::jwk::Jwk;
use jose_core::jwkset::JwkSet;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

pub fn read_test<Test: DeserializeOwned>(v: &str) -> TestFile<Test> {
    let path = format!("tests/vectors/{v}");
    let file = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&file).unwrap()
}

#[derive(Deserialize)]
pub struct TestFile<T> {
    pub tests: Vec<Test<T>>,
}

#[derive(Deserialize)]
pub struct Test<T> {
    pub name: String,
    #[serde(flatten)]
    pub test_data: T,
}

#[derive(Debug)]
pub struct Bool<const B: bool>;

impl<'a, const B: bool> Deserialize<'a> for Bool<B> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'a>,
    {
        struct BoolVisitor<const B: bool>;

        impl<'a, const B: bool> serde::de::Visitor<'a> for BoolVisitor<B> {
            type Value = Bool<B>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "{B}")
            }

            fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                (v == B)
                    .then_some(Bool)
                    .ok_or_else(|| E::custom(format!("expected {B}, got {v}")))
            }
        }

        deserializer.deserialize_bool(BoolVisitor)
    }
}

pub fn deserialize_jwk<'de, D>(deserializer: D) -> Result<Jwk, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Map::<String, Value>::deserialize(deserializer)?;
    Jwk::new(values).map_err(serde::de::Error::custom)
}

pub fn deserialize_jwkset<'de, D>(deserializer: D) -> Result<JwkSet, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    JwkSet::from_json(&value.to_string()).map_err(serde::de::Error::custom)
}

/// A header from a `json!` object literal.
pub fn header(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(header) => header,
        other => panic!("not a JSON object: {other}"),
    }
}
