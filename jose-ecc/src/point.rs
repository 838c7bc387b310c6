//! Affine points and the constant-time conditional swap.

use num_bigint_dig::BigUint;
use num_traits::Zero;
use subtle::{Choice, ConditionallySelectable};

use crate::math::to_fixed_bytes;

/// An affine point, or the point at infinity, tagged with the order of its curve's
/// generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Point {
    x: BigUint,
    y: BigUint,
    order: BigUint,
    infinity: bool,
}

impl Point {
    pub(crate) fn new(x: BigUint, y: BigUint, order: BigUint) -> Self {
        Self {
            x,
            y,
            order,
            infinity: false,
        }
    }

    pub(crate) fn infinity(order: BigUint) -> Self {
        Self {
            x: BigUint::zero(),
            y: BigUint::zero(),
            order,
            infinity: true,
        }
    }

    pub fn x(&self) -> &BigUint {
        &self.x
    }

    pub fn y(&self) -> &BigUint {
        &self.y
    }

    /// The order of the generator of the curve this point was computed on.
    pub fn order(&self) -> &BigUint {
        &self.order
    }

    pub fn is_infinity(&self) -> bool {
        self.infinity
    }

    /// `infinity ‖ x ‖ y`, each coordinate padded to `size` bytes.
    fn to_fixed(&self, size: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 2 * size);
        out.push(u8::from(self.infinity));
        out.extend_from_slice(&to_fixed_bytes(&self.x, size));
        out.extend_from_slice(&to_fixed_bytes(&self.y, size));
        out
    }

    fn from_fixed(bytes: &[u8], size: usize, order: &BigUint) -> Self {
        let (x, y) = bytes[1..].split_at(size);
        Self {
            x: BigUint::from_bytes_be(x),
            y: BigUint::from_bytes_be(y),
            order: order.clone(),
            infinity: bytes[0] != 0,
        }
    }
}

/// Returns `(a, b)` if `swap` is unset, `(b, a)` otherwise.
///
/// Both points are expanded to the same fixed width (coordinates of `size` bytes) and
/// swapped byte by byte under a mask. The points must belong to the same curve.
pub fn cswap(a: &Point, b: &Point, swap: Choice, size: usize) -> (Point, Point) {
    debug_assert_eq!(a.order, b.order);
    let mut a_bytes = a.to_fixed(size);
    let mut b_bytes = b.to_fixed(size);
    for (a, b) in a_bytes.iter_mut().zip(&mut b_bytes) {
        u8::conditional_swap(a, b, swap);
    }
    (
        Point::from_fixed(&a_bytes, size, &a.order),
        Point::from_fixed(&b_bytes, size, &a.order),
    )
}

/// `b` if `choice` is set, `a` otherwise, without branching on `choice`.
pub(crate) fn select(a: &Point, b: &Point, choice: Choice, size: usize) -> Point {
    cswap(a, b, choice, size).0
}
