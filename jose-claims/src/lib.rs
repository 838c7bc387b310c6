#![forbid(unsafe_code)]
//! JSON payloads and the registered JWT claims (RFC 7519 section 4.1).
//!
//! ```
//! use std::time::Duration;
//!
//! use jose_claims::{ForAudience, FromIssuer, RegisteredClaims, Time};
//! use jose_core::validation::Validate;
//!
//! let claims = RegisteredClaims::now(Duration::from_secs(3600))
//!     .from_issuer("https://issuer.example".to_owned())
//!     .for_audience("api".to_owned());
//! let payload = claims.to_payload().unwrap();
//!
//! let claims = RegisteredClaims::from_payload(&payload).unwrap();
//! Time::valid_now()
//!     .and_then(FromIssuer("https://issuer.example"))
//!     .and_then(ForAudience("api"))
//!     .validate(&claims)
//!     .unwrap();
//! ```

use std::time::Duration;

pub use jiff;
pub use jose_core::validation::Validate;
use jose_core::JoseError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// `Json` wraps any serde type used as a token payload.
///
/// Payloads are parsed with [`serde_json`], which limits nesting depth. Parse into a known
/// struct layout rather than arbitrary key-value maps.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct Json<T>(pub T);

impl<T: Serialize> Json<T> {
    pub fn to_payload(&self) -> Result<Vec<u8>, JoseError> {
        Ok(serde_json::to_vec(&self.0)?)
    }
}

impl<T: DeserializeOwned> Json<T> {
    pub fn from_payload(payload: &[u8]) -> Result<Self, JoseError> {
        Ok(Self(serde_json::from_slice(payload)?))
    }
}

/// The registered claims. Unknown claims are ignored when parsing.
#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegisteredClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// A single audience is written as a string, several as an array.
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "audience")]
    pub aud: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "numeric_date")]
    pub exp: Option<jiff::Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "numeric_date")]
    pub nbf: Option<jiff::Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "numeric_date")]
    pub iat: Option<jiff::Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl RegisteredClaims {
    /// Claims issued at `now`, valid from `now` and expiring `exp` later.
    pub fn new(now: jiff::Timestamp, exp: Duration) -> Self {
        Self {
            exp: Some(now + exp),
            nbf: Some(now),
            iat: Some(now),
            ..Self::default()
        }
    }

    pub fn now(exp: Duration) -> Self {
        Self::new(jiff::Timestamp::now(), exp)
    }

    pub fn from_issuer(mut self, iss: String) -> Self {
        self.iss = Some(iss);
        self
    }

    pub fn for_audience(mut self, aud: String) -> Self {
        self.aud.push(aud);
        self
    }

    pub fn for_subject(mut self, sub: String) -> Self {
        self.sub = Some(sub);
        self
    }

    pub fn with_token_id(mut self, jti: String) -> Self {
        self.jti = Some(jti);
        self
    }

    pub fn to_payload(&self) -> Result<Vec<u8>, JoseError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_payload(payload: &[u8]) -> Result<Self, JoseError> {
        Ok(serde_json::from_slice(payload)?)
    }
}

/// NumericDate: seconds since the epoch. Fractional seconds are truncated when parsing.
mod numeric_date {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        value: &Option<jiff::Timestamp>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => s.serialize_i64(t.as_second()),
            None => s.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<jiff::Timestamp>, D::Error> {
        let Some(seconds) = Option::<f64>::deserialize(d)? else {
            return Ok(None);
        };
        if !seconds.is_finite() {
            return Err(D::Error::custom("NumericDate must be a finite number"));
        }
        jiff::Timestamp::from_second(seconds.trunc() as i64)
            .map(Some)
            .map_err(D::Error::custom)
    }
}

/// `aud`: a string or an array of strings.
mod audience {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    pub(super) fn serialize<S: Serializer>(value: &[String], s: S) -> Result<S::Ok, S::Error> {
        match value {
            [one] => s.serialize_str(one),
            many => s.collect_seq(many),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Option::<OneOrMany>::deserialize(d)? {
            None => Vec::new(),
            Some(OneOrMany::One(one)) => vec![one],
            Some(OneOrMany::Many(many)) => many,
        })
    }
}

pub struct Time {
    now: jiff::Timestamp,
}

impl Time {
    pub fn valid_now() -> Self {
        Self {
            now: jiff::Timestamp::now(),
        }
    }

    pub fn valid_at(now: jiff::Timestamp) -> Self {
        Self { now }
    }

    pub fn with_leeway(self, leeway: Duration) -> TimeWithLeeway {
        TimeWithLeeway {
            now: self.now,
            leeway,
        }
    }

    fn with_leeway_of(&self, leeway: Duration, claims: &RegisteredClaims) -> Result<(), JoseError> {
        if let Some(exp) = claims.exp
            && exp < self.now - leeway
        {
            return Err(JoseError::ClaimsError("the token has expired".into()));
        }

        if let Some(nbf) = claims.nbf
            && self.now + leeway < nbf
        {
            return Err(JoseError::ClaimsError("the token is not yet valid".into()));
        }

        Ok(())
    }
}

impl Validate for Time {
    type Claims = RegisteredClaims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), JoseError> {
        self.with_leeway_of(Duration::ZERO, claims)
    }
}

pub struct TimeWithLeeway {
    now: jiff::Timestamp,
    leeway: Duration,
}

impl Validate for TimeWithLeeway {
    type Claims = RegisteredClaims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), JoseError> {
        Time { now: self.now }.with_leeway_of(self.leeway, claims)
    }
}

pub struct ForSubject<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> Validate for ForSubject<T> {
    type Claims = RegisteredClaims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), JoseError> {
        if claims.sub.as_deref() != Some(self.0.as_ref()) {
            return Err(JoseError::ClaimsError("unexpected subject".into()));
        }

        Ok(())
    }
}

pub struct FromIssuer<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> Validate for FromIssuer<T> {
    type Claims = RegisteredClaims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), JoseError> {
        if claims.iss.as_deref() != Some(self.0.as_ref()) {
            return Err(JoseError::ClaimsError("unexpected issuer".into()));
        }

        Ok(())
    }
}

/// The token must list this audience, possibly among others.
pub struct ForAudience<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> Validate for ForAudience<T> {
    type Claims = RegisteredClaims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), JoseError> {
        if !claims.aud.iter().any(|aud| aud == self.0.as_ref()) {
            return Err(JoseError::ClaimsError("unexpected audience".into()));
        }

        Ok(())
    }
}

pub struct HasExpiry;

impl Validate for HasExpiry {
    type Claims = RegisteredClaims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), JoseError> {
        if claims.exp.is_none() {
            return Err(JoseError::ClaimsError("the token has no expiry".into()));
        }
        Ok(())
    }
}
