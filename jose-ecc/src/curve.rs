use std::sync::LazyLock;

use num_bigint_dig::BigUint;
use num_traits::Zero;
use subtle::{Choice, ConstantTimeEq};

use crate::math::{inverse_mod, sub_mod, to_fixed_bytes};
use crate::point::{Point, cswap, select};
use crate::{EcError, PrivateKey, PublicKey};

/// A short Weierstrass curve `y² = x³ + ax + b` over a prime field, with a generator of
/// prime order.
#[derive(Debug)]
pub struct Curve {
    name: &'static str,
    p: BigUint,
    a: BigUint,
    b: BigUint,
    generator: Point,
    order: BigUint,
    size: usize,
}

struct Params {
    name: &'static str,
    p: &'static str,
    b: &'static str,
    gx: &'static str,
    gy: &'static str,
    n: &'static str,
}

fn hex(s: &str) -> BigUint {
    BigUint::parse_bytes(s.as_bytes(), 16).expect("curve constants are valid hex")
}

impl From<Params> for Curve {
    fn from(params: Params) -> Self {
        let p = hex(params.p);
        // All three curves use a = -3.
        let a = &p - BigUint::from(3u8);
        let size = p.bits().div_ceil(8);
        let order = hex(params.n);
        Curve {
            name: params.name,
            a,
            b: hex(params.b),
            generator: Point::new(hex(params.gx), hex(params.gy), order.clone()),
            order,
            size,
            p,
        }
    }
}

static P256: LazyLock<Curve> = LazyLock::new(|| {
    Curve::from(Params {
        name: "P-256",
        p: "FFFFFFFF00000001000000000000000000000000FFFFFFFFFFFFFFFFFFFFFFFF",
        b: "5AC635D8AA3A93E7B3EBBD55769886BC651D06B0CC53B0F63BCE3C3E27D2604B",
        gx: "6B17D1F2E12C4247F8BCE6E563A440F277037D812DEB33A0F4A13945D898C296",
        gy: "4FE342E2FE1A7F9B8EE7EB4A7C0F9E162BCE33576B315ECECBB6406837BF51F5",
        n: "FFFFFFFF00000000FFFFFFFFFFFFFFFFBCE6FAADA7179E84F3B9CAC2FC632551",
    })
});

static P384: LazyLock<Curve> = LazyLock::new(|| {
    Curve::from(Params {
        name: "P-384",
        p: "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFFFF0000000000000000FFFFFFFF",
        b: "B3312FA7E23EE7E4988E056BE3F82D19181D9C6EFE8141120314088F5013875AC656398D8A2ED19D2A85C8EDD3EC2AEF",
        gx: "AA87CA22BE8B05378EB1C71EF320AD746E1D3B628BA79B9859F741E082542A385502F25DBF55296C3A545E3872760AB7",
        gy: "3617DE4A96262C6F5D9E98BF9292DC29F8F41DBD289A147CE9DA3113B5F0B8C00A60B1CE1D7E819D7A431D7C90EA0E5F",
        n: "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFC7634D81F4372DDF581A0DB248B0A77AECEC196ACCC52973",
    })
});

static P521: LazyLock<Curve> = LazyLock::new(|| {
    Curve::from(Params {
        name: "P-521",
        p: "01FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
        b: "0051953EB9618E1C9A1F929A21A0B68540EEA2DA725B99B315F3B8B489918EF109E156193951EC7E937B1652C0BD3BB1BF073573DF883D2C34F1EF451FD46B503F00",
        gx: "00C6858E06B70404E9CD9E3ECB662395B4429C648139053FB521F828AF606B4D3DBAA14B5E77EFE75928FE1DC127A2FFA8DE3348B3C1856A429BF97E7E31C2E5BD66",
        gy: "011839296A789A3BC0045C8A5FB42C7D1BD998F54449579B446817AFBD17273E662C97EE72995EF42640C550B9013FAD0761353C7086A272C24088BE94769FD16650",
        n: "01FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFA51868783BF2F966B7FCC0148F709A5D03BB5C9B8899C47AEBB6FB71E91386409",
    })
});

impl Curve {
    /// The curve registered under this JWK `crv` name.
    pub fn from_name(name: &str) -> Result<&'static Curve, EcError> {
        match name {
            "P-256" => Ok(&P256),
            "P-384" => Ok(&P384),
            "P-521" => Ok(&P521),
            _ => Err(EcError::UnsupportedCurve(name.to_owned())),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Size of a field element in bytes.
    pub fn field_size(&self) -> usize {
        self.size
    }

    pub fn order(&self) -> &BigUint {
        &self.order
    }

    pub fn generator(&self) -> &Point {
        &self.generator
    }

    /// Whether `(x, y)` satisfies the curve equation.
    pub fn contains(&self, x: &BigUint, y: &BigUint) -> bool {
        let p = &self.p;
        let lhs = (y * y) % p;
        let rhs = (x * x * x + &self.a * x + &self.b) % p;
        lhs == rhs
    }

    /// The point at infinity of this curve.
    pub fn identity(&self) -> Point {
        Point::infinity(self.order.clone())
    }

    fn affine(&self, x: BigUint, y: BigUint) -> Point {
        Point::new(x, y, self.order.clone())
    }

    fn same(&self, a: &BigUint, b: &BigUint) -> Choice {
        to_fixed_bytes(a, self.size).ct_eq(&to_fixed_bytes(b, self.size))
    }

    /// `lhs + rhs`.
    ///
    /// The chord, the tangent and the identity cases are all computed and the result is
    /// picked with [`select`], so the operations performed do not depend on the operands.
    pub fn add(&self, lhs: &Point, rhs: &Point) -> Point {
        let p = &self.p;
        let num = sub_mod(rhs.y(), lhs.y(), p);
        let den = sub_mod(rhs.x(), lhs.x(), p);
        let den = inverse_mod(&den, p).unwrap_or_else(BigUint::zero);
        let slope = (num * den) % p;
        let x = sub_mod(&((&slope * &slope) % p), &((lhs.x() + rhs.x()) % p), p);
        let y = sub_mod(&((&slope * sub_mod(lhs.x(), &x, p)) % p), lhs.y(), p);
        let chord = self.affine(x, y);

        // equal points double, opposite points cancel
        let tangent = self.double(lhs);
        let vertical = select(&self.identity(), &tangent, self.same(lhs.y(), rhs.y()), self.size);
        let sum = select(&chord, &vertical, self.same(lhs.x(), rhs.x()), self.size);
        let sum = select(&sum, lhs, Choice::from(u8::from(rhs.is_infinity())), self.size);
        select(&sum, rhs, Choice::from(u8::from(lhs.is_infinity())), self.size)
    }

    pub fn double(&self, point: &Point) -> Point {
        let p = &self.p;
        let (x, y) = (point.x(), point.y());

        let num = (BigUint::from(3u8) * x * x + &self.a) % p;
        let den = inverse_mod(&((BigUint::from(2u8) * y) % p), p);
        let den = den.unwrap_or_else(BigUint::zero);
        let slope = (num * den) % p;
        let x3 = sub_mod(&((&slope * &slope) % p), &((BigUint::from(2u8) * x) % p), p);
        let y3 = sub_mod(&((&slope * sub_mod(x, &x3, p)) % p), y, p);

        let vertical =
            Choice::from(u8::from(point.is_infinity())) | self.same(y, &BigUint::zero());
        select(&self.affine(x3, y3), &self.identity(), vertical, self.size)
    }

    /// `point · n` with a Montgomery ladder.
    ///
    /// The ladder runs over every bit of `n` padded to the width of the curve order.
    pub fn mul(&self, point: &Point, n: &BigUint) -> Result<Point, EcError> {
        let width = self.order.bits().div_ceil(8);
        let scalar = to_fixed_bytes(n, width);

        let mut r0 = self.identity();
        let mut r1 = point.clone();
        for byte in scalar {
            for shift in (0..8).rev() {
                let bit = Choice::from((byte >> shift) & 1);
                (r0, r1) = cswap(&r0, &r1, bit, self.size);
                r1 = self.add(&r0, &r1);
                r0 = self.double(&r0);
                (r0, r1) = cswap(&r0, &r1, bit, self.size);
            }
        }

        if !r0.is_infinity() && !self.contains(r0.x(), r0.y()) {
            return Err(EcError::InvalidPoint("the result is not on the curve"));
        }
        Ok(r0)
    }

    /// A point of the prime order subgroup.
    ///
    /// Rejects coordinates outside the field, points not on the curve and points whose
    /// order is not the curve order.
    pub fn point(&self, x: BigUint, y: BigUint) -> Result<Point, EcError> {
        if x >= self.p || y >= self.p {
            return Err(EcError::InvalidPoint("the coordinates are out of range"));
        }
        if !self.contains(&x, &y) {
            return Err(EcError::InvalidPoint("the point is not on the curve"));
        }
        let point = self.affine(x, y);
        if !self.mul(&point, &self.order)?.is_infinity() {
            return Err(EcError::InvalidPoint("the point is not in the subgroup"));
        }
        Ok(point)
    }

    /// A uniformly random scalar in `[1, order)`.
    pub fn create_private_key(&self) -> Result<PrivateKey, EcError> {
        let width = self.order.bits().div_ceil(8);
        let excess = width * 8 - self.order.bits();
        let mut bytes = vec![0; width];
        loop {
            getrandom::fill(&mut bytes).map_err(|_| EcError::Random)?;
            bytes[0] &= 0xff >> excess;
            let d = BigUint::from_bytes_be(&bytes);
            if !d.is_zero() && d < self.order {
                return Ok(PrivateKey::new(d));
            }
        }
    }

    /// Parse a big-endian private scalar.
    pub fn private_key(&self, bytes: &[u8]) -> Result<PrivateKey, EcError> {
        let d = BigUint::from_bytes_be(bytes);
        if d.is_zero() || d >= self.order {
            return Err(EcError::InvalidPrivateKey);
        }
        Ok(PrivateKey::new(d))
    }

    /// Parse big-endian affine coordinates into a validated public key.
    pub fn public_key(&self, x: &[u8], y: &[u8]) -> Result<PublicKey, EcError> {
        self.point(BigUint::from_bytes_be(x), BigUint::from_bytes_be(y))
            .map(|point| PublicKey::new(point, self.size))
    }

    pub fn create_public_key(&self, private_key: &PrivateKey) -> Result<PublicKey, EcError> {
        let point = self.mul(&self.generator, private_key.secret())?;
        if point.is_infinity() {
            return Err(EcError::InvalidPrivateKey);
        }
        Ok(PublicKey::new(point, self.size))
    }

    /// The ECDH shared secret: the x coordinate of `public · private`, padded to the field size.
    pub fn shared_secret(
        &self,
        private_key: &PrivateKey,
        public_key: &PublicKey,
    ) -> Result<Vec<u8>, EcError> {
        let point = self.mul(public_key.point(), private_key.secret())?;
        if point.is_infinity() {
            return Err(EcError::InvalidPoint("the shared point is at infinity"));
        }
        Ok(to_fixed_bytes(point.x(), self.size))
    }
}

#[cfg(test)]
mod tests {
    use num_traits::One;

    use super::*;

    fn unhex(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    #[test]
    fn generators_have_the_curve_order() {
        for name in ["P-256", "P-384", "P-521"] {
            let curve = Curve::from_name(name).unwrap();
            let g = curve.generator();
            assert!(curve.contains(g.x(), g.y()), "{name}");
            assert!(curve.mul(g, curve.order()).unwrap().is_infinity(), "{name}");
        }
        assert_eq!(Curve::from_name("P-256").unwrap().field_size(), 32);
        assert_eq!(Curve::from_name("P-384").unwrap().field_size(), 48);
        assert_eq!(Curve::from_name("P-521").unwrap().field_size(), 66);
        Curve::from_name("secp256k1").unwrap_err();
    }

    #[test]
    fn ladder_matches_repeated_addition() {
        let curve = Curve::from_name("P-256").unwrap();
        let g = curve.generator();
        let mut acc = curve.identity();
        for k in 0u32..8 {
            assert_eq!(curve.mul(g, &BigUint::from(k)).unwrap(), acc);
            acc = curve.add(&acc, g);
        }
        assert_eq!(curve.double(g), curve.add(g, g));
    }

    #[test]
    fn addition_special_cases() {
        for name in ["P-256", "P-384", "P-521"] {
            let curve = Curve::from_name(name).unwrap();
            let g = curve.generator();
            let o = curve.identity();
            let neg = curve.affine(g.x().clone(), &curve.p - g.y());
            let two_g = curve.mul(g, &BigUint::from(2u8)).unwrap();

            assert_eq!(&curve.add(&o, g), g, "{name}");
            assert_eq!(&curve.add(g, &o), g, "{name}");
            assert_eq!(curve.add(&o, &o), o, "{name}");
            assert_eq!(curve.add(g, &neg), o, "{name}");
            assert_eq!(curve.add(g, g), two_g, "{name}");
            assert_eq!(curve.double(&o), o, "{name}");
            assert_eq!(curve.add(&two_g, &neg), *g, "{name}");
            assert_eq!(g.order(), curve.order(), "{name}");
        }
    }

    #[test]
    fn public_key_from_private_key() {
        let curve = Curve::from_name("P-256").unwrap();
        // Alice's ephemeral key from RFC 7518 appendix C.
        let d = unhex("d3f3716913d4310a0026de741b3f18893afc8114f0c84682ba677e313a13988a");
        let x = unhex("808d060082c176eed3e776a4ac598cc8672c1779f974eecc9b03411ca5b9495d");
        let y = unhex("48b5bfc527dfce53d6ac7115237d031ccff87a0570b77350a9e503ee7305a69b");

        let private = curve.private_key(&d).unwrap();
        let public = curve.create_public_key(&private).unwrap();
        assert_eq!(public.x_bytes(), x);
        assert_eq!(public.y_bytes(), y);
        curve.public_key(&x, &y).unwrap();
    }

    #[test]
    fn rejects_invalid_points() {
        let curve = Curve::from_name("P-256").unwrap();
        let g = curve.generator();
        curve
            .point(g.x().clone(), g.y() + BigUint::one())
            .unwrap_err();
        curve
            .point(g.x() + &curve.p, g.y().clone())
            .unwrap_err();
        curve.point(g.x().clone(), g.y().clone()).unwrap();
    }

    #[test]
    fn rejects_invalid_private_keys() {
        let curve = Curve::from_name("P-384").unwrap();
        curve.private_key(&[0; 48]).unwrap_err();
        curve.private_key(&curve.order().to_bytes_be()).unwrap_err();
        curve.private_key(&[1]).unwrap();
    }

    #[test]
    fn shared_secret_is_symmetric() {
        for name in ["P-256", "P-384", "P-521"] {
            let curve = Curve::from_name(name).unwrap();
            let a = curve.create_private_key().unwrap();
            let b = curve.create_private_key().unwrap();
            let pa = curve.create_public_key(&a).unwrap();
            let pb = curve.create_public_key(&b).unwrap();

            let z1 = curve.shared_secret(&a, &pb).unwrap();
            let z2 = curve.shared_secret(&b, &pa).unwrap();
            assert_eq!(z1, z2);
            assert_eq!(z1.len(), curve.field_size());
        }
    }
}
