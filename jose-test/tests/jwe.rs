use jose::{Jwk, JwkSet, serializer};
use jose_test::{Bool, Test, TestFile, read_test};
use libtest_mimic::{Arguments, Failed, Trial};
use serde::Deserialize;
use serde_json::{Value, json};

fn main() {
    let args = Arguments::from_args();

    let test_file: TestFile<JweTest> = read_test("jwe.json");
    let tests = test_file
        .tests
        .into_iter()
        .map(|Test { name, test_data }| Trial::test(name, move || test_data.test()))
        .collect();

    libtest_mimic::run(&args, tests).exit();
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct JweTest {
    algorithms: Vec<String>,
    encryption: Vec<String>,
    #[serde(deserialize_with = "jose_test::deserialize_jwk")]
    key: Jwk,
    token: String,
    #[serde(flatten)]
    result: TestResult,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TestResult {
    #[serde(rename_all = "kebab-case")]
    Success {
        #[expect(unused)]
        expect_fail: Bool<false>,
        payload: String,
        #[serde(default)]
        recipient: usize,
    },
    #[serde(rename_all = "kebab-case")]
    Failure {
        #[expect(unused)]
        expect_fail: Bool<true>,
        #[expect(unused)]
        payload: (),
    },
}

impl JweTest {
    fn test(self) -> Result<(), Failed> {
        let algorithms: Vec<&str> = self.algorithms.iter().map(String::as_str).collect();
        let encryption: Vec<&str> = self.encryption.iter().map(String::as_str).collect();
        let loader = jose::jwe_loader(&algorithms, &encryption)?;

        let TestResult::Success {
            payload,
            recipient,
            ..
        } = self.result
        else {
            return match loader.load_and_decrypt_with_key(&self.token, &self.key) {
                Ok(_) => Err("decrypting the token should fail".into()),
                Err(_) => Ok(()),
            };
        };

        let (jwe, index) = loader.load_and_decrypt_with_key(&self.token, &self.key)?;
        assert_eq!(index, recipient);
        assert_eq!(jwe.payload(), Some(payload.as_bytes()));

        // the decrypter reports which key of the set was used
        let decrypter = jose::jwe_decrypter(&algorithms, &encryption)?;
        let (parsed, _) = serializer::jwe().unserialize(&self.token)?;
        let decrypted = decrypter
            .decrypt_using_key_set(&parsed, &JwkSet::new([self.key.clone()]), index, None)?
            .ok_or("the key set did not decrypt the token")?;
        assert_eq!(decrypted.key, self.key);
        assert_eq!(decrypted.recipient, index);

        // a token produced again with the same algorithms decrypts with the same key
        let header = jwe.headers(index)?;
        let alg = header.get("alg").and_then(Value::as_str).ok_or("no alg")?;
        let enc = header.get("enc").and_then(Value::as_str).ok_or("no enc")?;
        let mut protected = jose_test::header(json!({ "enc": enc }));
        if let Some(zip) = header.get("zip") {
            protected.insert("zip".into(), zip.clone());
        }
        let recipient_key = match self.key.kty() {
            "oct" => self.key.clone(),
            _ => self.key.to_public(),
        };
        let again = jose::jwe_builder(&algorithms, &encryption)?
            .with_payload(payload.as_bytes())
            .with_shared_protected_header(protected)
            .add_recipient(
                &recipient_key,
                jose_test::header(json!({ "alg": alg })),
                None,
            )
            .build()?;
        let token = serializer::jwe().serialize(jose::jwe::JSON_FLATTENED, &again, None)?;
        let (jwe, _) = loader.load_and_decrypt_with_key(&token, &self.key)?;
        assert_eq!(jwe.payload(), Some(payload.as_bytes()));

        Ok(())
    }
}
