//! Header checks applied by the loaders before a token is verified or decrypted.

use serde_json::Value;

use crate::JoseError;
use crate::header::Header;
use crate::validation::Validate;

/// The headers of one signature or one recipient.
#[derive(Clone, Debug, Default)]
pub struct TokenHeaders {
    /// Integrity protected parameters.
    pub protected: Header,
    /// Unprotected parameters, shared and per-signature or per-recipient.
    pub unprotected: Header,
}

impl TokenHeaders {
    /// A parameter from either header, protected first.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.protected.get(name).or_else(|| self.unprotected.get(name))
    }
}

/// Only accept tokens whose `alg` is one of the listed algorithms.
pub struct AlgorithmChecker<T: AsRef<str>>(pub Vec<T>);

impl<T: AsRef<str>> Validate for AlgorithmChecker<T> {
    type Claims = TokenHeaders;

    fn validate(&self, headers: &TokenHeaders) -> Result<(), JoseError> {
        let alg = headers
            .get("alg")
            .and_then(Value::as_str)
            .ok_or_else(|| JoseError::MissingHeaderParameter("alg".into()))?;
        if self.0.iter().any(|a| a.as_ref() == alg) {
            Ok(())
        } else {
            Err(JoseError::HeaderCheck(format!("unsupported algorithm \"{alg}\"")))
        }
    }
}

/// Require a `typ` parameter with this value.
pub struct TypeChecker<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> Validate for TypeChecker<T> {
    type Claims = TokenHeaders;

    fn validate(&self, headers: &TokenHeaders) -> Result<(), JoseError> {
        match headers.get("typ").and_then(Value::as_str) {
            Some(typ) if typ == self.0.as_ref() => Ok(()),
            Some(typ) => Err(JoseError::HeaderCheck(format!("unexpected type \"{typ}\""))),
            None => Err(JoseError::MissingHeaderParameter("typ".into())),
        }
    }
}

/// Enforce the `crit` parameter (RFC 7515 section 4.1.11).
///
/// `crit` must be protected, list only the extensions this application understands, and
/// every listed extension must be present in the protected header.
pub struct CriticalChecker<T: AsRef<str>>(pub Vec<T>);

impl<T: AsRef<str>> Validate for CriticalChecker<T> {
    type Claims = TokenHeaders;

    fn validate(&self, headers: &TokenHeaders) -> Result<(), JoseError> {
        if headers.unprotected.contains_key("crit") {
            return Err(JoseError::HeaderCheck(
                "the header parameter \"crit\" must be protected".into(),
            ));
        }
        let Some(crit) = headers.protected.get("crit") else {
            return Ok(());
        };
        let crit = crit.as_array().filter(|c| !c.is_empty()).ok_or_else(|| {
            JoseError::HeaderCheck("\"crit\" must be a non-empty list of strings".into())
        })?;

        for ext in crit {
            let ext = ext.as_str().ok_or_else(|| {
                JoseError::HeaderCheck("\"crit\" must be a non-empty list of strings".into())
            })?;
            if !self.0.iter().any(|s| s.as_ref() == ext) {
                return Err(JoseError::HeaderCheck(format!(
                    "the critical extension \"{ext}\" is not supported"
                )));
            }
            if !headers.protected.contains_key(ext) {
                return Err(JoseError::HeaderCheck(format!(
                    "the critical extension \"{ext}\" is missing"
                )));
            }
        }
        Ok(())
    }
}
