use num_bigint_dig::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};

/// `a - b mod m`, for `a, b < m`.
pub(crate) fn sub_mod(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    if a >= b { a - b } else { m - (b - a) }
}

/// The inverse of `a` modulo `m`, by the extended Euclidean algorithm.
///
/// `None` if `a` and `m` are not coprime.
pub(crate) fn inverse_mod(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    let a = BigInt::from_biguint(Sign::Plus, a % m);
    let m = BigInt::from_biguint(Sign::Plus, m.clone());
    let (mut r0, mut r1) = (m.clone(), a);
    let (mut t0, mut t1) = (BigInt::zero(), BigInt::one());

    while !r1.is_zero() {
        let q = r0.div_floor(&r1);
        (r0, r1) = (r1.clone(), &r0 - &q * &r1);
        (t0, t1) = (t1.clone(), &t0 - &q * &t1);
    }

    if !r0.is_one() {
        return None;
    }
    t0.mod_floor(&m).to_biguint()
}

/// Big-endian bytes, left padded with zeros to `len`.
pub(crate) fn to_fixed_bytes(n: &BigUint, len: usize) -> Vec<u8> {
    let bytes = n.to_bytes_be();
    let mut out = vec![0; len.saturating_sub(bytes.len())];
    out.extend_from_slice(&bytes);
    out
}
