//! # Large integers
//!
//! [`LargeInteger`] is an immutable arbitrary-precision signed integer with
//! the byte-level conventions of the ByteTree format: values are written as
//! minimal big-endian two's complement byte strings.

pub mod batch;
pub mod number_theory;
pub mod primality;

use std::fmt;
use std::str::FromStr;

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{Num, One, Signed, ToPrimitive, Zero};
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::eio::{ByteTree, ByteTreeReader};
use crate::errors::ArithmError;

/// Default certainty used by primality tests.
pub const CERTAINTY: usize = 100;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LargeInteger(BigInt);

impl LargeInteger {
    pub fn zero() -> Self {
        LargeInteger(BigInt::zero())
    }

    pub fn one() -> Self {
        LargeInteger(BigInt::one())
    }

    pub fn two() -> Self {
        LargeInteger(BigInt::from(2))
    }

    pub fn as_big_int(&self) -> &BigInt {
        &self.0
    }

    pub fn into_big_int(self) -> BigInt {
        self.0
    }

    pub fn magnitude(&self) -> &BigUint {
        self.0.magnitude()
    }

    /// Parses a string in the given radix.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::Format` if the string is not an integer.
    ///
    /// # Example
    ///
    /// ```
    /// # use mixnet_arithm::arithm::LargeInteger;
    /// let x = LargeInteger::from_str_radix("ff", 16).unwrap();
    /// assert_eq!(x, LargeInteger::from(255));
    /// assert!(LargeInteger::from_str_radix("xyz", 10).is_err());
    /// ```
    pub fn from_str_radix(s: &str, radix: u32) -> Result<Self, ArithmError> {
        BigInt::from_str_radix(s, radix)
            .map(LargeInteger)
            .map_err(|_| ArithmError::format(format!("Not an integer: {}", s)))
    }

    /// Renders the integer in the given radix. Hexadecimal output is padded to
    /// an even number of digits.
    pub fn to_string_radix(&self, radix: u32) -> String {
        let digits = self.0.magnitude().to_str_radix(radix);
        let digits = if radix == 16 && digits.len() % 2 != 0 {
            format!("0{}", digits)
        } else {
            digits
        };
        if self.0.is_negative() {
            format!("-{}", digits)
        } else {
            digits
        }
    }

    /// Interprets `bytes` as a big-endian two's complement integer.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::Format` on an empty array.
    pub fn from_byte_array(bytes: &[u8]) -> Result<Self, ArithmError> {
        if bytes.is_empty() {
            return Err(ArithmError::format("Array of zero length!"));
        }
        Ok(LargeInteger(BigInt::from_signed_bytes_be(bytes)))
    }

    /// Minimal big-endian two's complement representation. Zero is `[0]`.
    pub fn to_byte_array(&self) -> Vec<u8> {
        let bytes = self.0.to_signed_bytes_be();
        if bytes.is_empty() { vec![0] } else { bytes }
    }

    /// Interprets `bytes` as an unsigned big-endian integer.
    pub fn to_positive(bytes: &[u8]) -> Self {
        LargeInteger(BigInt::from_bytes_be(Sign::Plus, bytes))
    }

    /// Uniformly random integer in `[0, 2^bit_length)`.
    ///
    /// # Panics
    ///
    /// Panics if `bit_length` is zero.
    pub fn random<R: RngCore + ?Sized>(bit_length: usize, rng: &mut R) -> Self {
        assert!(bit_length > 0, "Non-positive bit-length!");
        let len = bit_length.div_ceil(8);
        let mut bytes = vec![0u8; len];
        rng.fill_bytes(&mut bytes);
        if bit_length % 8 != 0 {
            bytes[0] &= 0xFF >> (8 - bit_length % 8);
        }
        Self::to_positive(&bytes)
    }

    /// Random integer in `[0, modulus)` with statistical distance at most
    /// `2^-stat_dist` from uniform.
    ///
    /// # Panics
    ///
    /// Panics if `modulus` is not positive.
    pub fn random_mod<R: RngCore + ?Sized>(modulus: &LargeInteger, stat_dist: usize, rng: &mut R) -> Self {
        Self::random(modulus.bit_length() + stat_dist, rng).modulo(modulus)
    }

    pub fn random_array<R: RngCore + ?Sized>(size: usize, bit_length: usize, rng: &mut R) -> Vec<Self> {
        (0..size).map(|_| Self::random(bit_length, rng)).collect()
    }

    pub fn random_mod_array<R: RngCore + ?Sized>(
        size: usize,
        modulus: &LargeInteger,
        stat_dist: usize,
        rng: &mut R,
    ) -> Vec<Self> {
        (0..size).map(|_| Self::random_mod(modulus, stat_dist, rng)).collect()
    }

    pub fn add(&self, other: &LargeInteger) -> Self {
        LargeInteger(&self.0 + &other.0)
    }

    pub fn sub(&self, other: &LargeInteger) -> Self {
        LargeInteger(&self.0 - &other.0)
    }

    pub fn mul(&self, other: &LargeInteger) -> Self {
        LargeInteger(&self.0 * &other.0)
    }

    pub fn neg(&self) -> Self {
        LargeInteger(-&self.0)
    }

    pub fn abs(&self) -> Self {
        LargeInteger(self.0.abs())
    }

    pub fn shift_left(&self, bits: usize) -> Self {
        LargeInteger(&self.0 << bits)
    }

    /// Arithmetic right shift (rounds towards negative infinity).
    pub fn shift_right(&self, bits: usize) -> Self {
        LargeInteger(&self.0 >> bits)
    }

    /// Quotient rounded towards zero.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::InvalidParameters` on a zero divisor.
    pub fn divide(&self, divisor: &LargeInteger) -> Result<Self, ArithmError> {
        if divisor.is_zero() {
            return Err(ArithmError::InvalidParameters("Division by zero!".to_string()));
        }
        Ok(LargeInteger(&self.0 / &divisor.0))
    }

    /// Canonical residue in `[0, modulus)`.
    ///
    /// # Panics
    ///
    /// Panics if `modulus` is not positive.
    ///
    /// # Example
    ///
    /// ```
    /// # use mixnet_arithm::arithm::LargeInteger;
    /// let m = LargeInteger::from(7);
    /// assert_eq!(LargeInteger::from(-3).modulo(&m), LargeInteger::from(4));
    /// assert_eq!(LargeInteger::from(10).modulo(&m), LargeInteger::from(3));
    /// ```
    pub fn modulo(&self, modulus: &LargeInteger) -> Self {
        assert!(modulus.0.is_positive(), "Non-positive modulus!");
        LargeInteger(self.0.mod_floor(&modulus.0))
    }

    pub fn mod_add(&self, other: &LargeInteger, modulus: &LargeInteger) -> Self {
        self.add(other).modulo(modulus)
    }

    pub fn mod_mul(&self, other: &LargeInteger, modulus: &LargeInteger) -> Self {
        self.mul(other).modulo(modulus)
    }

    /// Multiplicative inverse modulo `modulus`.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::InvalidModulus` if the modulus is not positive and
    /// `ArithmError::NoInverse` if the value is not invertible.
    pub fn mod_inv(&self, modulus: &LargeInteger) -> Result<Self, ArithmError> {
        if !modulus.0.is_positive() {
            return Err(ArithmError::InvalidModulus(format!(
                "Modulus must be positive, got {}",
                modulus
            )));
        }
        let reduced = self.0.mod_floor(&modulus.0);
        let egcd = reduced.extended_gcd(&modulus.0);
        if !egcd.gcd.is_one() {
            return Err(ArithmError::NoInverse(format!(
                "{} has no inverse modulo {} (gcd = {})",
                self, modulus, egcd.gcd
            )));
        }
        Ok(LargeInteger(egcd.x.mod_floor(&modulus.0)))
    }

    /// `self^exponent mod modulus`. A negative exponent inverts first.
    ///
    /// # Panics
    ///
    /// Panics if `modulus` is not positive, or if the exponent is negative and
    /// `self` is not invertible. [`LargeInteger::try_mod_pow`] reports the
    /// latter as an error.
    pub fn mod_pow(&self, exponent: &LargeInteger, modulus: &LargeInteger) -> Self {
        match self.try_mod_pow(exponent, modulus) {
            Ok(res) => res,
            Err(e) => panic!("Negative exponent of a non-invertible base: {}", e),
        }
    }

    /// Like [`LargeInteger::mod_pow`], but fails on a negative exponent of a
    /// non-invertible base.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::NoInverse` if the exponent is negative and `self`
    /// has no inverse modulo `modulus`.
    ///
    /// # Panics
    ///
    /// Panics if `modulus` is not positive.
    pub fn try_mod_pow(&self, exponent: &LargeInteger, modulus: &LargeInteger) -> Result<Self, ArithmError> {
        assert!(modulus.0.is_positive(), "Non-positive modulus!");
        if exponent.0.is_negative() {
            let inverse = self.mod_inv(modulus)?;
            return Ok(LargeInteger(inverse.0.modpow(&(-&exponent.0), &modulus.0)));
        }
        Ok(LargeInteger(self.0.modpow(&exponent.0, &modulus.0)))
    }

    /// Number of bits excluding the sign bit.
    pub fn bit_length(&self) -> usize {
        if self.0.is_negative() {
            (-&self.0 - BigInt::one()).bits() as usize
        } else {
            self.0.bits() as usize
        }
    }

    /// Tests a bit of the two's complement representation.
    pub fn test_bit(&self, index: usize) -> bool {
        self.0.bit(index as u64)
    }

    pub fn set_bit(&self, index: usize) -> Self {
        let mut value = self.0.clone();
        value.set_bit(index as u64, true);
        LargeInteger(value)
    }

    pub fn clear_bit(&self, index: usize) -> Self {
        let mut value = self.0.clone();
        value.set_bit(index as u64, false);
        LargeInteger(value)
    }

    pub fn signum(&self) -> i32 {
        match self.0.sign() {
            Sign::Minus => -1,
            Sign::NoSign => 0,
            Sign::Plus => 1,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_one(&self) -> bool {
        self.0.is_one()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn is_even(&self) -> bool {
        self.0.is_even()
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.0.to_u64()
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.0.to_i64()
    }

    pub fn to_byte_tree(&self) -> ByteTree {
        ByteTree::Leaf(self.to_byte_array())
    }

    /// Leaf of exactly `len` bytes.
    ///
    /// Shorter representations are padded with `0x00`, or `0xFF` for negative
    /// values. Longer representations keep their first `len` bytes.
    ///
    /// # Example
    ///
    /// ```
    /// # use mixnet_arithm::arithm::LargeInteger;
    /// # use mixnet_arithm::eio::ByteTree;
    /// let tree = LargeInteger::from(255).to_byte_tree_fixed(2);
    /// assert_eq!(tree, ByteTree::leaf(vec![0x00, 0xFF]));
    /// ```
    pub fn to_byte_tree_fixed(&self, len: usize) -> ByteTree {
        ByteTree::Leaf(self.to_fixed_bytes(len))
    }

    pub(crate) fn to_fixed_bytes(&self, len: usize) -> Vec<u8> {
        let tmp = self.to_byte_array();
        let fill = if self.0.is_negative() { 0xFF } else { 0x00 };
        let mut res = vec![fill; len];
        let n = len.min(tmp.len());
        res[len - n..].copy_from_slice(&tmp[..n]);
        res
    }

    /// Reads a leaf holding a two's complement integer of any length.
    pub fn from_reader(reader: &mut ByteTreeReader<'_>) -> Result<Self, ArithmError> {
        let bytes = reader.read_all()?;
        Self::from_byte_array(bytes)
    }

    /// Reads a leaf of at most `max_len` bytes.
    pub fn from_reader_max(max_len: usize, reader: &mut ByteTreeReader<'_>) -> Result<Self, ArithmError> {
        if reader.remaining() > max_len {
            return Err(ArithmError::format("Too small max length!"));
        }
        Self::from_reader(reader)
    }

    /// Reads a leaf of exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::Format` if the leaf has a different length.
    ///
    /// # Example
    ///
    /// ```
    /// # use mixnet_arithm::arithm::LargeInteger;
    /// let tree = LargeInteger::from(255).to_byte_tree_fixed(2);
    /// assert!(LargeInteger::from_reader_exact(2, &mut tree.reader()).is_ok());
    /// assert!(LargeInteger::from_reader_exact(1, &mut tree.reader()).is_err());
    /// ```
    pub fn from_reader_exact(len: usize, reader: &mut ByteTreeReader<'_>) -> Result<Self, ArithmError> {
        if reader.remaining() != len {
            return Err(ArithmError::format(format!(
                "Unexpected byte length ({} vs {})!",
                reader.remaining(),
                len
            )));
        }
        Self::from_reader(reader)
    }

    /// Permissive variant of [`LargeInteger::from_reader_exact`] that yields
    /// zero on any failure. Only for call sites that verify the surrounding
    /// structure independently.
    pub fn safe_from_reader(len: usize, reader: &mut ByteTreeReader<'_>) -> Self {
        Self::from_reader_exact(len, reader).unwrap_or_default()
    }

    /// Decodes a node of integers in `[lb, ub)`, each encoded with the byte
    /// length of `ub`. A `size` of zero accepts any number of children.
    pub fn decode_integers(
        size: usize,
        reader: &mut ByteTreeReader<'_>,
        lb: &LargeInteger,
        ub: &LargeInteger,
    ) -> Result<Vec<Self>, ArithmError> {
        let size = if size == 0 { reader.remaining() } else { size };
        if reader.is_leaf() || reader.remaining() != size {
            return Err(ArithmError::format("Unexpected number of integers!"));
        }
        let expected = ub.to_byte_array().len();
        let mut res = Vec::with_capacity(size);
        for _ in 0..size {
            let value = Self::from_reader_exact(expected, &mut reader.next_child()?)?;
            if value < *lb || value >= *ub {
                return Err(ArithmError::format("Integer is outside permitted interval!"));
            }
            res.push(value);
        }
        Ok(res)
    }

    pub fn to_byte_tree_all(values: &[LargeInteger]) -> ByteTree {
        ByteTree::Node(values.iter().map(LargeInteger::to_byte_tree).collect())
    }

    pub fn to_byte_tree_fixed_all(len: usize, values: &[LargeInteger]) -> ByteTree {
        ByteTree::Node(values.iter().map(|v| v.to_byte_tree_fixed(len)).collect())
    }
}

impl From<BigInt> for LargeInteger {
    fn from(value: BigInt) -> Self {
        LargeInteger(value)
    }
}

impl From<BigUint> for LargeInteger {
    fn from(value: BigUint) -> Self {
        LargeInteger(BigInt::from(value))
    }
}

macro_rules! from_primitive {
    ($($t:ty),*) => {
        $(impl From<$t> for LargeInteger {
            fn from(value: $t) -> Self {
                LargeInteger(BigInt::from(value))
            }
        })*
    };
}

from_primitive!(i32, i64, u32, u64, usize);

impl FromStr for LargeInteger {
    type Err = ArithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_radix(s, 10)
    }
}

impl fmt::Display for LargeInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_radix(16))
    }
}

impl Serialize for LargeInteger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_radix(16))
    }
}

impl<'de> Deserialize<'de> for LargeInteger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        LargeInteger::from_str_radix(&s, 16).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_byte_array_conventions() -> Result<(), ArithmError> {
        assert_eq!(LargeInteger::zero().to_byte_array(), vec![0]);
        assert_eq!(LargeInteger::from(255).to_byte_array(), vec![0x00, 0xFF]);
        assert_eq!(LargeInteger::from(-1).to_byte_array(), vec![0xFF]);
        assert_eq!(LargeInteger::from(-129).to_byte_array(), vec![0xFF, 0x7F]);
        assert_eq!(LargeInteger::from_byte_array(&[0xFF, 0x7F])?, LargeInteger::from(-129));
        assert!(LargeInteger::from_byte_array(&[]).is_err());
        assert_eq!(LargeInteger::to_positive(&[0xFF]), LargeInteger::from(255));
        Ok(())
    }

    #[test]
    fn test_fixed_length_encoding() {
        assert_eq!(LargeInteger::from(255).to_fixed_bytes(2), vec![0x00, 0xFF]);
        assert_eq!(LargeInteger::from(-2).to_fixed_bytes(3), vec![0xFF, 0xFF, 0xFE]);
        assert_eq!(LargeInteger::from(255).to_fixed_bytes(1), vec![0x00]);
        assert_eq!(LargeInteger::from(0x12_3456).to_fixed_bytes(2), vec![0x12, 0x34]);
    }

    #[test]
    fn test_fixed_length_decoding_checks_length() {
        let tree = LargeInteger::from(255).to_byte_tree_fixed(2);
        assert!(LargeInteger::from_reader_exact(1, &mut tree.reader()).is_err());
        assert!(LargeInteger::from_reader_max(1, &mut tree.reader()).is_err());
        assert_eq!(LargeInteger::safe_from_reader(1, &mut tree.reader()), LargeInteger::zero());
    }

    #[test]
    fn test_decode_integers_enforces_interval() -> Result<(), ArithmError> {
        let ub = LargeInteger::from(1000);
        let len = ub.to_byte_array().len();
        let ok = LargeInteger::to_byte_tree_fixed_all(len, &[1.into(), 999.into()]);
        let values = LargeInteger::decode_integers(0, &mut ok.reader(), &LargeInteger::one(), &ub)?;
        assert_eq!(values, vec![LargeInteger::from(1), LargeInteger::from(999)]);

        let bad = LargeInteger::to_byte_tree_fixed_all(len, &[1.into(), 1000.into()]);
        assert!(LargeInteger::decode_integers(2, &mut bad.reader(), &LargeInteger::one(), &ub).is_err());
        assert!(LargeInteger::decode_integers(3, &mut ok.reader(), &LargeInteger::one(), &ub).is_err());
        Ok(())
    }

    #[test]
    fn test_modular_operations() -> Result<(), ArithmError> {
        let m = LargeInteger::from(101);
        let x = LargeInteger::from(37);
        let inv = x.mod_inv(&m)?;
        assert_eq!(x.mod_mul(&inv, &m), LargeInteger::one());
        assert_eq!(x.mod_pow(&LargeInteger::from(-1), &m), inv);
        assert_eq!(x.mod_pow(&LargeInteger::from(100), &m), LargeInteger::one());
        assert_eq!(x.try_mod_pow(&LargeInteger::from(-1), &m)?, inv);
        assert!(matches!(
            LargeInteger::from(2).try_mod_pow(&LargeInteger::from(-1), &LargeInteger::from(4)),
            Err(ArithmError::NoInverse(_))
        ));

        assert!(LargeInteger::from(6).mod_inv(&LargeInteger::from(9)).is_err());
        assert!(x.mod_inv(&LargeInteger::zero()).is_err());
        assert!(x.divide(&LargeInteger::zero()).is_err());
        assert_eq!(LargeInteger::from(-7).divide(&LargeInteger::from(2))?, LargeInteger::from(-3));
        Ok(())
    }

    #[test]
    #[should_panic(expected = "Non-positive modulus!")]
    fn test_modulo_rejects_non_positive_modulus() {
        LargeInteger::one().modulo(&LargeInteger::zero());
    }

    #[test]
    fn test_random_respects_bit_length() {
        let mut rng = StdRng::seed_from_u64(1);
        for bits in [1usize, 7, 8, 9, 64, 129] {
            for _ in 0..20 {
                assert!(LargeInteger::random(bits, &mut rng).bit_length() <= bits);
            }
        }
        let m = LargeInteger::from(1_000_003);
        for _ in 0..20 {
            let r = LargeInteger::random_mod(&m, 50, &mut rng);
            assert!(!r.is_negative() && r < m);
        }
    }

    #[test]
    fn test_hex_rendering() {
        assert_eq!(LargeInteger::from(15).to_string(), "0f");
        assert_eq!(LargeInteger::from(256).to_string(), "0100");
        assert_eq!(LargeInteger::from(255).to_string_radix(10), "255");
    }

    #[test]
    fn test_bit_operations() {
        let x = LargeInteger::from(0b1010);
        assert!(x.test_bit(1) && !x.test_bit(0));
        assert_eq!(x.set_bit(0), LargeInteger::from(0b1011));
        assert_eq!(x.clear_bit(3), LargeInteger::from(0b10));
        assert_eq!(LargeInteger::from(-1).bit_length(), 0);
        assert_eq!(LargeInteger::from(-3).bit_length(), 2);
        assert_eq!(LargeInteger::from(255).bit_length(), 8);
    }

    quickcheck! {
        fn prop_byte_array_inverts(x: i64) -> bool {
            let li = LargeInteger::from(x);
            LargeInteger::from_byte_array(&li.to_byte_array()).ok() == Some(li)
        }

        fn prop_modulo_is_canonical(x: i64, m: u32) -> bool {
            let m = LargeInteger::from(u64::from(m) + 1);
            let r = LargeInteger::from(x).modulo(&m);
            !r.is_negative() && r < m
        }
    }
}
