//! Elliptic curve arithmetic over the NIST prime curves P-256, P-384 and P-521.
//!
//! Points are immutable affine coordinates. Scalar multiplication walks a fixed number of
//! bits and selects operands with [`point::cswap`], so the sequence of group operations does
//! not depend on the scalar.
//!
//! ```
//! use jose_ecc::Curve;
//!
//! let curve = Curve::from_name("P-256").unwrap();
//! let alice = curve.create_private_key().unwrap();
//! let bob = curve.create_private_key().unwrap();
//!
//! let a = curve.shared_secret(&alice, &curve.create_public_key(&bob).unwrap()).unwrap();
//! let b = curve.shared_secret(&bob, &curve.create_public_key(&alice).unwrap()).unwrap();
//! assert_eq!(a, b);
//! ```

mod curve;
mod keys;
mod math;
pub mod point;

pub use curve::Curve;
pub use keys::{PrivateKey, PublicKey};
pub use point::Point;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EcError {
    /// The curve name is not one of `P-256`, `P-384` or `P-521`.
    #[error("unsupported curve \"{0}\"")]
    UnsupportedCurve(String),
    /// The coordinates do not describe a point of the curve's prime order subgroup.
    #[error("invalid point: {0}")]
    InvalidPoint(&'static str),
    /// The private scalar is zero or not smaller than the curve order.
    #[error("invalid private key")]
    InvalidPrivateKey,
    /// The operating system random number generator failed.
    #[error("could not generate random bytes")]
    Random,
}
