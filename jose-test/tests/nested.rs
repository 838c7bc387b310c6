use std::time::Duration;

use jose::factory::{create_ec_key, create_oct_key, create_okp_key};
use jose::{
    JoseError, Jwk, JwkSet, NestedSerialization, RecipientSpec, SignatureSpec, serializer,
};
use jose_claims::{FromIssuer, RegisteredClaims, Time, Validate};
use jose_test::header;
use serde_json::{Map, json};

const SIGNATURES: &[&str] = &["ES256", "EdDSA"];
const KEY_MANAGEMENT: &[&str] = &["A256KW", "ECDH-ES+A128KW", "RSA-OAEP-256"];
const CONTENT_ENCRYPTION: &[&str] = &["A256GCM", "A128CBC-HS256"];

const COMPACT: NestedSerialization<'static> = NestedSerialization {
    jws: jose::jws::COMPACT,
    jwe: jose::jwe::COMPACT,
};

fn signature(key: &Jwk, alg: &str) -> SignatureSpec {
    SignatureSpec {
        key: key.clone(),
        protected: header(json!({ "alg": alg, "typ": "JWT" })),
        header: Map::new(),
    }
}

fn recipient(key: &Jwk, alg: &str) -> RecipientSpec {
    RecipientSpec {
        key: key.clone(),
        header: header(json!({ "alg": alg })),
        sender_key: None,
    }
}

fn create(
    payload: &[u8],
    signatures: &[SignatureSpec],
    serialization: NestedSerialization<'_>,
    recipients: &[RecipientSpec],
) -> Result<String, JoseError> {
    jose::nested_token_builder(SIGNATURES, KEY_MANAGEMENT, CONTENT_ENCRYPTION)?.create(
        payload,
        signatures,
        serialization,
        header(json!({ "enc": "A256GCM" })),
        Map::new(),
        recipients,
        None,
    )
}

fn load(
    token: &str,
    encryption_keys: &[Jwk],
    signature_keys: &[Jwk],
) -> Result<(jose::Jws, usize), JoseError> {
    jose::nested_token_loader(SIGNATURES, KEY_MANAGEMENT, CONTENT_ENCRYPTION)?.load(
        token,
        &JwkSet::new(encryption_keys.iter().cloned()),
        &JwkSet::new(signature_keys.iter().cloned()),
    )
}

#[test]
fn signed_then_encrypted_claims() {
    let signing = create_ec_key("P-256", Map::new()).unwrap();
    let encryption = create_oct_key(256, Map::new()).unwrap();

    let claims = RegisteredClaims::now(Duration::from_secs(300)).from_issuer("joe".into());
    let token = create(
        &claims.to_payload().unwrap(),
        &[signature(&signing, "ES256")],
        COMPACT,
        &[recipient(&encryption, "A256KW")],
    )
    .unwrap();
    assert_eq!(token.split('.').count(), 5);

    let (jws, index) = load(&token, &[encryption], &[signing.to_public()]).unwrap();
    assert_eq!(index, 0);

    let claims = RegisteredClaims::from_payload(jws.payload().unwrap()).unwrap();
    Time::valid_now()
        .and_then(FromIssuer("joe"))
        .validate(&claims)
        .unwrap();
}

#[test]
fn content_type_is_set() {
    let signing = create_okp_key("Ed25519", Map::new()).unwrap();
    let encryption = create_oct_key(256, Map::new()).unwrap();

    let token = create(
        b"{}",
        &[signature(&signing, "EdDSA")],
        COMPACT,
        &[recipient(&encryption, "A256KW")],
    )
    .unwrap();

    let (jwe, _) = serializer::jwe().unserialize(&token).unwrap();
    assert_eq!(jwe.shared_protected_header()["cty"], "JWT");
}

#[test]
fn content_type_is_required() {
    let signing = create_okp_key("Ed25519", Map::new()).unwrap();
    let encryption = create_oct_key(256, Map::new()).unwrap();

    let jws = jose::jws_builder(SIGNATURES)
        .unwrap()
        .with_payload(b"{}".to_vec(), false)
        .add_signature(&signing, header(json!({ "alg": "EdDSA" })), Map::new())
        .unwrap()
        .build()
        .unwrap();
    let jws = serializer::jws()
        .serialize(jose::jws::COMPACT, &jws, None)
        .unwrap();

    let encrypt = |cty: Option<&str>| {
        let mut protected = header(json!({ "enc": "A256GCM" }));
        if let Some(cty) = cty {
            protected.insert("cty".into(), cty.into());
        }
        let jwe = jose::jwe_builder(KEY_MANAGEMENT, CONTENT_ENCRYPTION)
            .unwrap()
            .with_payload(jws.clone())
            .with_shared_protected_header(protected)
            .add_recipient(&encryption, header(json!({ "alg": "A256KW" })), None)
            .build()
            .unwrap();
        serializer::jwe()
            .serialize(jose::jwe::COMPACT, &jwe, None)
            .unwrap()
    };

    let keys = [encryption.clone()];
    let signature_keys = [signing.to_public()];
    assert!(matches!(
        load(&encrypt(None), &keys, &signature_keys),
        Err(JoseError::MissingHeaderParameter(p)) if p == "cty"
    ));
    assert!(matches!(
        load(&encrypt(Some("json")), &keys, &signature_keys),
        Err(JoseError::InvalidHeader(_))
    ));
    load(&encrypt(Some("jwt")), &keys, &signature_keys).unwrap();
}

#[test]
fn signature_must_verify() {
    let signing = create_ec_key("P-256", Map::new()).unwrap();
    let other = create_ec_key("P-256", Map::new()).unwrap();
    let encryption = create_oct_key(256, Map::new()).unwrap();

    let token = create(
        b"{}",
        &[signature(&signing, "ES256")],
        COMPACT,
        &[recipient(&encryption, "A256KW")],
    )
    .unwrap();

    load(&token, &[encryption.clone()], &[other.to_public()]).unwrap_err();
    load(&token, &[create_oct_key(256, Map::new()).unwrap()], &[signing.to_public()])
        .unwrap_err();
}

#[test]
fn several_recipients_and_signatures() {
    let ec = create_ec_key("P-256", Map::new()).unwrap();
    let ed = create_okp_key("Ed25519", Map::new()).unwrap();
    let wrapping = create_oct_key(256, Map::new()).unwrap();
    let agreement = create_ec_key("P-384", Map::new()).unwrap();

    let token = create(
        b"{\"sub\":\"alice\"}",
        &[signature(&ec, "ES256"), signature(&ed, "EdDSA")],
        NestedSerialization {
            jws: jose::jws::JSON_GENERAL,
            jwe: jose::jwe::JSON_GENERAL,
        },
        &[
            recipient(&wrapping, "A256KW"),
            recipient(&agreement.to_public(), "ECDH-ES+A128KW"),
        ],
    )
    .unwrap();

    let (jws, index) = load(&token, &[agreement], &[ed.to_public()]).unwrap();
    assert_eq!(index, 1);
    assert_eq!(jws.signature_count(), 2);
    assert_eq!(jws.payload(), Some(&b"{\"sub\":\"alice\"}"[..]));

    let keys: JwkSet = [wrapping].into_iter().collect();
    let (jws, index) = jose::nested_token_loader(SIGNATURES, KEY_MANAGEMENT, CONTENT_ENCRYPTION)
        .unwrap()
        .load(&token, &keys, &JwkSet::new([ec.to_public()]))
        .unwrap();
    assert_eq!(index, 0);
    assert_eq!(jws.signature_count(), 2);
}
