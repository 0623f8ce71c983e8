//! Prime order fields.

use std::fmt;
use std::sync::Arc;

use rand::RngCore;

use crate::arithm::array::{Backing, LargeIntegerArray};
use crate::arithm::{LargeInteger, Permutation};
use crate::eio::{ByteTree, ByteTreeReader};
use crate::errors::ArithmError;
use crate::util::{EXP_THREAD_THRESHOLD, MUL_THREAD_THRESHOLD};

#[derive(Debug)]
struct FieldParams {
    order: LargeInteger,
    order_byte_length: usize,
}

/// The field of integers modulo a prime. Elements are canonical residues in
/// `[0, order)`, encoded as leaves of the byte length of the order.
#[derive(Debug, Clone)]
pub struct PField(Arc<FieldParams>);

impl PField {
    /// Field of the given order.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::InvalidModulus` if `order` is not positive, or
    /// not a probable prime at the given certainty.
    pub fn try_with<R: RngCore + ?Sized>(
        order: LargeInteger,
        rng: &mut R,
        certainty: usize,
    ) -> Result<Self, ArithmError> {
        if order.signum() <= 0 {
            return Err(ArithmError::InvalidModulus("Non-positive order!".to_string()));
        }
        if !order.is_probable_prime(rng, certainty) {
            return Err(ArithmError::InvalidModulus("Non-prime order!".to_string()));
        }
        Ok(Self::with_prime_order(order))
    }

    /// Field of an order already known to be prime.
    pub(crate) fn with_prime_order(order: LargeInteger) -> Self {
        let order_byte_length = order.to_byte_array().len();
        PField(Arc::new(FieldParams {
            order,
            order_byte_length,
        }))
    }

    /// Reads the order from a leaf and validates it.
    pub fn from_reader<R: RngCore + ?Sized>(
        reader: &mut ByteTreeReader<'_>,
        rng: &mut R,
        certainty: usize,
    ) -> Result<Self, ArithmError> {
        Self::try_with(LargeInteger::from_reader(reader)?, rng, certainty)
    }

    pub fn order(&self) -> &LargeInteger {
        &self.0.order
    }

    /// Length in bytes of the encoding of an element.
    pub fn byte_length(&self) -> usize {
        5 + self.0.order_byte_length
    }

    /// Number of bytes that can be encoded reversibly in an element.
    pub fn encode_length(&self) -> usize {
        (self.0.order.bit_length() - 1) / 8
    }

    pub(crate) fn order_byte_length(&self) -> usize {
        self.0.order_byte_length
    }

    pub fn zero(&self) -> PFieldElement {
        PFieldElement::new(self, LargeInteger::zero())
    }

    pub fn one(&self) -> PFieldElement {
        PFieldElement::new(self, LargeInteger::one().modulo(self.order()))
    }

    /// The residue of `value`.
    pub fn to_element(&self, value: &LargeInteger) -> PFieldElement {
        PFieldElement::new(self, value.modulo(self.order()))
    }

    /// The residue of `bytes` read as an unsigned integer.
    pub fn to_element_from_bytes(&self, bytes: &[u8]) -> PFieldElement {
        self.to_element(&LargeInteger::to_positive(bytes))
    }

    pub fn random_element<R: RngCore + ?Sized>(&self, rng: &mut R, stat_dist: usize) -> PFieldElement {
        PFieldElement::new(self, LargeInteger::random_mod(self.order(), stat_dist, rng))
    }

    /// Decodes an element from a leaf of exactly the byte length of the
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::Format` for a leaf of the wrong length or a value
    /// that is not a canonical residue.
    pub fn element_from_reader(&self, reader: &mut ByteTreeReader<'_>) -> Result<PFieldElement, ArithmError> {
        let value = LargeInteger::from_reader_exact(self.0.order_byte_length, reader)?;
        if value.signum() < 0 || value >= *self.order() {
            return Err(ArithmError::format("Non-canonical representative!"));
        }
        Ok(PFieldElement::new(self, value))
    }

    /// Reduces every integer of `values`.
    pub fn to_element_array(&self, values: &LargeIntegerArray) -> Result<PFieldElementArray, ArithmError> {
        Ok(PFieldElementArray::new(self, values.modulo(self.order())?))
    }

    /// Wraps integers already known to be canonical residues.
    pub(crate) fn unsafe_to_element_array(&self, values: LargeIntegerArray) -> PFieldElementArray {
        PFieldElementArray::new(self, values)
    }

    pub fn element_array_from(
        &self,
        backing: &Backing,
        elements: &[PFieldElement],
    ) -> Result<PFieldElementArray, ArithmError> {
        let values = elements
            .iter()
            .map(|el| {
                self.check(el.field());
                el.value.clone()
            })
            .collect();
        Ok(PFieldElementArray::new(self, LargeIntegerArray::from_vec(backing, values)?))
    }

    pub fn fill_element_array(
        &self,
        backing: &Backing,
        size: usize,
        element: &PFieldElement,
    ) -> Result<PFieldElementArray, ArithmError> {
        self.check(element.field());
        Ok(PFieldElementArray::new(
            self,
            LargeIntegerArray::fill(backing, size, &element.value)?,
        ))
    }

    pub fn random_element_array<R: RngCore + ?Sized>(
        &self,
        backing: &Backing,
        size: usize,
        rng: &mut R,
        stat_dist: usize,
    ) -> Result<PFieldElementArray, ArithmError> {
        let values = LargeIntegerArray::random_mod(backing, size, self.order(), stat_dist, rng)?;
        Ok(PFieldElementArray::new(self, values))
    }

    /// Decodes a node of `size` elements. A `size` of zero accepts any number
    /// of elements.
    pub fn element_array_from_reader(
        &self,
        backing: &Backing,
        size: usize,
        reader: &mut ByteTreeReader<'_>,
    ) -> Result<PFieldElementArray, ArithmError> {
        let values = LargeIntegerArray::from_reader(backing, size, reader, &LargeInteger::zero(), self.order())?;
        Ok(PFieldElementArray::new(self, values))
    }

    pub fn to_byte_tree(&self) -> ByteTree {
        self.0.order.to_byte_tree()
    }

    /// # Panics
    ///
    /// Panics if `other` is a different field.
    pub(crate) fn check(&self, other: &PField) {
        assert!(self == other, "Distinct fields!");
    }
}

impl PartialEq for PField {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.order == other.0.order
    }
}

impl Eq for PField {}

impl fmt::Display for PField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.order)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PFieldElement {
    field: PField,
    value: LargeInteger,
}

impl PFieldElement {
    fn new(field: &PField, value: LargeInteger) -> Self {
        PFieldElement {
            field: field.clone(),
            value,
        }
    }

    pub fn field(&self) -> &PField {
        &self.field
    }

    /// The canonical residue.
    pub fn value(&self) -> &LargeInteger {
        &self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_one(&self) -> bool {
        self.value.is_one()
    }

    pub fn add(&self, other: &PFieldElement) -> PFieldElement {
        self.field.check(&other.field);
        PFieldElement::new(&self.field, self.value.mod_add(&other.value, self.field.order()))
    }

    pub fn sub(&self, other: &PFieldElement) -> PFieldElement {
        self.add(&other.neg())
    }

    pub fn neg(&self) -> PFieldElement {
        PFieldElement::new(&self.field, self.value.neg().modulo(self.field.order()))
    }

    pub fn mul(&self, other: &PFieldElement) -> PFieldElement {
        self.field.check(&other.field);
        PFieldElement::new(&self.field, self.value.mod_mul(&other.value, self.field.order()))
    }

    /// # Errors
    ///
    /// Returns `ArithmError::NoInverse` for zero.
    pub fn inv(&self) -> Result<PFieldElement, ArithmError> {
        if self.value.is_zero() {
            return Err(ArithmError::NoInverse("Zero element is not invertible!".to_string()));
        }
        Ok(PFieldElement::new(&self.field, self.value.mod_inv(self.field.order())?))
    }

    pub fn div(&self, other: &PFieldElement) -> Result<PFieldElement, ArithmError> {
        Ok(self.mul(&other.inv()?))
    }

    /// Power to an integer. A negative exponent inverts first.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::NoInverse` for zero raised to a negative
    /// exponent.
    pub fn exp(&self, exponent: &LargeInteger) -> Result<PFieldElement, ArithmError> {
        Ok(PFieldElement::new(
            &self.field,
            self.value.try_mod_pow(exponent, self.field.order())?,
        ))
    }

    /// `self * scalar + term`.
    pub fn mul_add(&self, scalar: &PFieldElement, term: &PFieldElement) -> PFieldElement {
        self.mul(scalar).add(term)
    }

    pub fn to_byte_tree(&self) -> ByteTree {
        self.value.to_byte_tree_fixed(self.field.order_byte_length())
    }
}

impl fmt::Display for PFieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Elements of a field held as a [`LargeIntegerArray`] of canonical
/// residues.
#[derive(Debug, Clone)]
pub struct PFieldElementArray {
    field: PField,
    values: LargeIntegerArray,
}

impl PFieldElementArray {
    fn new(field: &PField, values: LargeIntegerArray) -> Self {
        PFieldElementArray {
            field: field.clone(),
            values,
        }
    }

    fn with(&self, values: LargeIntegerArray) -> Self {
        PFieldElementArray::new(&self.field, values)
    }

    pub fn field(&self) -> &PField {
        &self.field
    }

    pub fn values(&self) -> &LargeIntegerArray {
        &self.values
    }

    pub fn size(&self) -> usize {
        self.values.size()
    }

    pub fn backing(&self) -> Backing {
        self.values.backing()
    }

    fn order(&self) -> &LargeInteger {
        self.field.order()
    }

    fn check(&self, other: &PFieldElementArray) {
        self.field.check(&other.field);
    }

    pub fn get(&self, index: usize) -> Result<PFieldElement, ArithmError> {
        Ok(PFieldElement::new(&self.field, self.values.get(index)?))
    }

    pub fn elements(&self) -> Result<Vec<PFieldElement>, ArithmError> {
        Ok(self
            .values
            .integers()?
            .into_iter()
            .map(|value| PFieldElement::new(&self.field, value))
            .collect())
    }

    pub fn add(&self, other: &PFieldElementArray) -> Result<Self, ArithmError> {
        self.check(other);
        Ok(self.with(self.values.mod_add(&other.values, self.order())?))
    }

    pub fn add_scalar(&self, term: &PFieldElement) -> Result<Self, ArithmError> {
        self.field.check(term.field());
        Ok(self.with(self.values.mod_add_scalar(&term.value, self.order())?))
    }

    pub fn neg(&self) -> Result<Self, ArithmError> {
        Ok(self.with(self.values.mod_neg(self.order())?))
    }

    pub fn mul(&self, other: &PFieldElementArray) -> Result<Self, ArithmError> {
        self.check(other);
        Ok(self.with(self.values.mod_mul(&other.values, self.order(), MUL_THREAD_THRESHOLD)?))
    }

    pub fn mul_scalar(&self, factor: &PFieldElement) -> Result<Self, ArithmError> {
        self.field.check(factor.field());
        Ok(self.with(
            self.values
                .mod_mul_scalar(&factor.value, self.order(), MUL_THREAD_THRESHOLD)?,
        ))
    }

    /// Element-wise inverses.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::NoInverse` if some element is zero.
    pub fn inv(&self) -> Result<Self, ArithmError> {
        Ok(self.with(self.values.mod_inv(self.order(), EXP_THREAD_THRESHOLD)?))
    }

    pub fn exp(&self, exponent: &LargeInteger) -> Result<Self, ArithmError> {
        Ok(self.with(
            self.values
                .mod_pow_scalar(exponent, self.order(), EXP_THREAD_THRESHOLD)?,
        ))
    }

    pub fn inner_product(&self, other: &PFieldElementArray) -> Result<PFieldElement, ArithmError> {
        self.check(other);
        Ok(PFieldElement::new(&self.field, self.values.mod_inner(&other.values, self.order())?))
    }

    pub fn sum(&self) -> Result<PFieldElement, ArithmError> {
        Ok(PFieldElement::new(&self.field, self.values.mod_sum(self.order())?))
    }

    pub fn prod(&self) -> Result<PFieldElement, ArithmError> {
        Ok(PFieldElement::new(&self.field, self.values.mod_prod(self.order())?))
    }

    /// Running products.
    pub fn prods(&self) -> Result<Self, ArithmError> {
        Ok(self.with(self.values.mod_prods(self.order())?))
    }

    /// Linear recurrence `out[0] = self[0]`,
    /// `out[i] = out[i - 1] * scalars[i] + self[i]`, and its last element.
    pub fn rec_lin(&self, scalars: &PFieldElementArray) -> Result<(Self, PFieldElement), ArithmError> {
        self.check(scalars);
        let (res, last) = self.values.mod_rec_lin(&scalars.values, self.order())?;
        Ok((self.with(res), PFieldElement::new(&self.field, last)))
    }

    pub fn mul_add(&self, scalar: &PFieldElement, terms: &PFieldElementArray) -> Result<Self, ArithmError> {
        self.mul_scalar(scalar)?.add(terms)
    }

    pub fn mul_add_all(&self, scalars: &PFieldElementArray, terms: &PFieldElementArray) -> Result<Self, ArithmError> {
        self.mul(scalars)?.add(terms)
    }

    pub fn permute(&self, permutation: &Permutation) -> Result<Self, ArithmError> {
        Ok(self.with(self.values.permute(permutation)?))
    }

    pub fn copy_of_range(&self, start: usize, end: usize) -> Result<Self, ArithmError> {
        Ok(self.with(self.values.copy_of_range(start, end)?))
    }

    pub fn extract(&self, mask: &[bool]) -> Result<Self, ArithmError> {
        Ok(self.with(self.values.extract(mask)?))
    }

    pub fn shift_push(&self, element: &PFieldElement) -> Result<Self, ArithmError> {
        self.field.check(element.field());
        Ok(self.with(self.values.shift_push(&element.value)?))
    }

    /// Tests if every element is a square.
    pub fn quadratic_residues(&self) -> Result<bool, ArithmError> {
        self.values.quadratic_residues(self.order(), EXP_THREAD_THRESHOLD)
    }

    pub fn to_byte_tree(&self) -> Result<ByteTree, ArithmError> {
        self.values.to_byte_tree_fixed(self.field.order_byte_length())
    }

    pub fn equals(&self, other: &PFieldElementArray) -> Result<bool, ArithmError> {
        Ok(self.field == other.field && self.values.equals(&other.values)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn field() -> PField {
        PField::with_prime_order(LargeInteger::from(1_000_003))
    }

    #[test]
    fn test_rejects_invalid_orders() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(PField::try_with(LargeInteger::from(11), &mut rng, 40).is_ok());
        assert!(matches!(
            PField::try_with(LargeInteger::from(-11), &mut rng, 40),
            Err(ArithmError::InvalidModulus(_))
        ));
        assert!(matches!(
            PField::try_with(LargeInteger::from(15), &mut rng, 40),
            Err(ArithmError::InvalidModulus(_))
        ));
    }

    #[test]
    fn test_safe_prime_field() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(4);
        let order = LargeInteger::random_safe_prime(257, &mut rng, 100);
        let f = PField::try_with(order, &mut rng, 100)?;
        assert_eq!(f.order().bit_length(), 257);
        assert!(f.order().is_probable_prime(&mut rng, 100));
        assert!(f.order().sub(&LargeInteger::one()).shift_right(1).is_probable_prime(&mut rng, 100));
        Ok(())
    }

    #[test]
    fn test_lengths() {
        let f = field();
        assert_eq!(f.byte_length(), 5 + 3);
        assert_eq!(f.encode_length(), 2);
        assert_eq!(f.one().to_byte_tree().total_byte_size(), f.byte_length());
    }

    #[test]
    fn test_element_decoding() -> Result<(), ArithmError> {
        let f = field();
        let a = f.to_element(&LargeInteger::from(-5));
        assert_eq!(a.value(), &LargeInteger::from(999_998));
        assert_eq!(f.element_from_reader(&mut a.to_byte_tree().reader())?, a);

        let too_large = LargeInteger::from(1_000_003).to_byte_tree_fixed(3);
        assert!(f.element_from_reader(&mut too_large.reader()).is_err());
        let too_short = LargeInteger::from(7).to_byte_tree();
        assert!(f.element_from_reader(&mut too_short.reader()).is_err());
        Ok(())
    }

    #[test]
    fn test_field_axioms() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(2);
        let f = field();
        for _ in 0..20 {
            let a = f.random_element(&mut rng, 50);
            let b = f.random_element(&mut rng, 50);
            let c = f.random_element(&mut rng, 50);
            assert_eq!(a.add(&b), b.add(&a));
            assert_eq!(a.add(&b).add(&c), a.add(&b.add(&c)));
            assert_eq!(a.mul(&b.add(&c)), a.mul(&b).add(&a.mul(&c)));
            assert_eq!(a.add(&a.neg()), f.zero());
            if !a.is_zero() {
                assert_eq!(a.mul(&a.inv()?), f.one());
            }
        }
        assert!(matches!(f.zero().inv(), Err(ArithmError::NoInverse(_))));
        Ok(())
    }

    #[test]
    fn test_negative_powers() -> Result<(), ArithmError> {
        let f = field();
        let a = f.to_element(&LargeInteger::from(12));
        let minus_two = LargeInteger::from(-2);
        assert_eq!(a.exp(&minus_two)?.mul(&a.mul(&a)), f.one());
        assert!(matches!(f.zero().exp(&minus_two), Err(ArithmError::NoInverse(_))));
        assert_eq!(f.zero().exp(&LargeInteger::zero())?, f.one());

        let array = f.element_array_from(&Backing::Memory, &[a.clone(), f.zero()])?;
        assert!(matches!(array.exp(&minus_two), Err(ArithmError::NoInverse(_))));
        Ok(())
    }

    #[test]
    #[should_panic(expected = "Distinct fields!")]
    fn test_mixing_fields_panics() {
        let a = field().one();
        let b = PField::with_prime_order(LargeInteger::from(11)).one();
        let _ = a.add(&b);
    }

    #[test]
    fn test_arrays_agree_with_elements() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(3);
        let f = field();
        let backing = Backing::Memory;
        let a = f.random_element_array(&backing, 9, &mut rng, 50)?;
        let b = f.random_element_array(&backing, 9, &mut rng, 50)?;
        let s = f.random_element(&mut rng, 50);

        let xs = a.elements()?;
        let ys = b.elements()?;
        let sums = a.add(&b)?.elements()?;
        let prods = a.mul(&b)?.elements()?;
        let scaled = a.mul_scalar(&s)?.elements()?;
        for i in 0..9 {
            assert_eq!(sums[i], xs[i].add(&ys[i]));
            assert_eq!(prods[i], xs[i].mul(&ys[i]));
            assert_eq!(scaled[i], xs[i].mul(&s));
        }

        let inner = xs.iter().zip(&ys).fold(f.zero(), |acc, (x, y)| acc.add(&x.mul(y)));
        assert_eq!(a.inner_product(&b)?, inner);
        assert_eq!(a.sum()?, xs.iter().fold(f.zero(), |acc, x| acc.add(x)));
        assert_eq!(a.prod()?, xs.iter().fold(f.one(), |acc, x| acc.mul(x)));

        let decoded = f.element_array_from_reader(&backing, 9, &mut a.to_byte_tree()?.reader())?;
        assert!(decoded.equals(&a)?);
        Ok(())
    }

    #[test]
    fn test_rec_lin() -> Result<(), ArithmError> {
        let f = field();
        let backing = Backing::Memory;
        let el = |v: i64| f.to_element(&LargeInteger::from(v));
        let terms = f.element_array_from(&backing, &[el(1), el(2), el(3)])?;
        let scalars = f.element_array_from(&backing, &[el(9), el(10), el(100)])?;
        let (res, last) = terms.rec_lin(&scalars)?;
        assert_eq!(res.elements()?, vec![el(1), el(12), el(1203)]);
        assert_eq!(last, el(1203));
        Ok(())
    }
}
