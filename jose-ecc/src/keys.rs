use core::fmt;

use num_bigint_dig::BigUint;

use crate::Point;
use crate::math::to_fixed_bytes;

/// A private scalar in `[1, order)`.
#[derive(Clone)]
pub struct PrivateKey {
    secret: BigUint,
}

impl PrivateKey {
    pub(crate) fn new(secret: BigUint) -> Self {
        Self { secret }
    }

    pub(crate) fn secret(&self) -> &BigUint {
        &self.secret
    }

    /// Big-endian bytes padded to `size`, the JWK `d` form.
    pub fn to_bytes(&self, size: usize) -> Vec<u8> {
        to_fixed_bytes(&self.secret, size)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey")
    }
}

/// A validated point of the prime order subgroup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    point: Point,
    size: usize,
}

impl PublicKey {
    pub(crate) fn new(point: Point, size: usize) -> Self {
        Self { point, size }
    }

    pub fn point(&self) -> &Point {
        &self.point
    }

    /// The JWK `x` member.
    pub fn x_bytes(&self) -> Vec<u8> {
        to_fixed_bytes(self.point.x(), self.size)
    }

    /// The JWK `y` member.
    pub fn y_bytes(&self) -> Vec<u8> {
        to_fixed_bytes(self.point.y(), self.size)
    }
}
