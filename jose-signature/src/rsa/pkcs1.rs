use jose_core::JoseError;
use jose_core::jwk::Jwk;
use rsa::Pkcs1v15Sign;
use rsa::rand_core::OsRng;
use sha2::{Sha256, Sha384, Sha512};

use crate::hash::Hash;

fn scheme(hash: Hash) -> Pkcs1v15Sign {
    match hash {
        Hash::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        Hash::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        Hash::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}

pub(crate) fn sign(hash: Hash, key: &Jwk, input: &[u8]) -> Result<Vec<u8>, JoseError> {
    let private = super::private_key(key)?;
    private
        .sign_with_rng(&mut OsRng, scheme(hash), &hash.digest(&[input]))
        .map_err(|_| JoseError::CryptoError)
}

pub(crate) fn verify(
    hash: Hash,
    key: &Jwk,
    input: &[u8],
    signature: &[u8],
) -> Result<bool, JoseError> {
    let public = super::public_key(key)?;
    Ok(public
        .verify(scheme(hash), &hash.digest(&[input]), signature)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use jose_core::algorithm::SignatureAlgorithm;

    use crate::JwsAlgorithm;

    #[test]
    fn rfc7515_rs256() {
        let input = "eyJhbGciOiJSUzI1NiJ9.eyJpc3MiOiJqb2UiLA0KICJleHAiOjEzMDA4MTkzODAsDQogImh0dHA6Ly9leGFtcGxlLmNvbS9pc19yb290Ijp0cnVlfQ";
        let expected = "cC4hiUPoj9Eetdgtv3hF80EGrhuB__dzERat0XF9g2VtQgr9PJbu3XOiZj5RZmh7AAuHIm4Bh-0Qc_lF5YKt_O8W2Fp5jujGbds9uJdbF9CUAr7t1dnZcAcQjbKBYNX4BAynRFdiuB--f_nZLgrnbyTyWzO75vRK5h6xBArLIARNPvkSjtQBMHlb1L07Qe7K0GarZRmB_eSN9383LcOLn6_dO--xi12jzDwusC-eOkHWEsqtFZESc6BfI7noOPqvhJ1phCnvWh6IeYI2w9QOYEUipUTI8np6LbgGY9Fs98rqVt5AXLIhWkWywlVmtVrBp0igcN_IoypGlUPQGe77Rw";

        let key = super::super::tests::key();
        let signature = JwsAlgorithm::Rs256.sign(&key, input.as_bytes()).unwrap();
        assert_eq!(jose_core::base64::encode(&signature), expected);
        assert!(
            JwsAlgorithm::Rs256
                .verify(&key.to_public(), input.as_bytes(), &signature)
                .unwrap()
        );
    }
}
