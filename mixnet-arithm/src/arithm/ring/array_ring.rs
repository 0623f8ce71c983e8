//! Rings of fixed-size arrays viewed as single elements.

use std::sync::Arc;

use rand::RngCore;

use crate::arithm::Permutation;
use crate::arithm::array::Backing;
use crate::arithm::marshal;
use crate::eio::{ByteTree, ByteTreeReader};
use crate::errors::ArithmError;

use super::{PField, PFieldElementArray, PRing, PRingElement, PRingElementArray};

#[derive(Debug)]
struct ArrayParams {
    ring: PRing,
    size: usize,
    backing: Backing,
}

/// The ring whose elements are arrays of `size` elements of an underlying
/// ring, with element-wise operations. Elements are stored in the given
/// backing.
#[derive(Debug, Clone)]
pub struct APRing(Arc<ArrayParams>);

impl APRing {
    /// # Errors
    ///
    /// Returns `ArithmError::InvalidParameters` if `size` is zero.
    pub fn try_with(ring: PRing, size: usize, backing: Backing) -> Result<Self, ArithmError> {
        if size == 0 {
            return Err(ArithmError::InvalidParameters("Zero array size!".to_string()));
        }
        Ok(APRing(Arc::new(ArrayParams { ring, size, backing })))
    }

    /// Decodes the structure written by [`APRing::to_byte_tree`].
    pub fn from_reader<R: RngCore + ?Sized>(
        reader: &mut ByteTreeReader<'_>,
        backing: &Backing,
        rng: &mut R,
        certainty: usize,
    ) -> Result<Self, ArithmError> {
        if reader.is_leaf() || reader.remaining() != 2 {
            return Err(ArithmError::format("Malformed APRing!"));
        }
        let size = reader.next_child()?.read_int()?;
        let size = usize::try_from(size).map_err(|_| ArithmError::format("Negative array size!"))?;
        let ring = marshal::unmarshal_pring(&mut reader.next_child()?, backing, rng, certainty)?;
        Self::try_with(ring, size, backing.clone())
    }

    pub fn inner(&self) -> &PRing {
        &self.0.ring
    }

    pub fn size(&self) -> usize {
        self.0.size
    }

    pub fn backing(&self) -> &Backing {
        &self.0.backing
    }

    pub fn pfield(&self) -> &PField {
        self.0.ring.pfield()
    }

    pub fn byte_length(&self) -> usize {
        5 + self.0.size * self.0.ring.byte_length()
    }

    pub fn encode_length(&self) -> usize {
        self.0.ring.encode_length()
    }

    /// Wraps an array of the underlying ring.
    ///
    /// # Panics
    ///
    /// Panics if the array has the wrong ring or size.
    pub fn to_element(&self, values: PRingElementArray) -> APRingElement {
        assert!(values.ring() == self.0.ring, "Distinct rings!");
        assert_eq!(values.size(), self.0.size, "Wrong array size!");
        APRingElement {
            ring: self.clone(),
            values,
        }
    }

    fn fill(&self, element: &PRingElement) -> Result<APRingElement, ArithmError> {
        let values = self.0.ring.fill_element_array(&self.0.backing, self.0.size, element)?;
        Ok(self.to_element(values))
    }

    pub fn zero(&self) -> Result<APRingElement, ArithmError> {
        self.fill(&self.0.ring.zero()?)
    }

    pub fn one(&self) -> Result<APRingElement, ArithmError> {
        self.fill(&self.0.ring.one()?)
    }

    pub fn random_element<R: RngCore + ?Sized>(
        &self,
        rng: &mut R,
        stat_dist: usize,
    ) -> Result<APRingElement, ArithmError> {
        let values = self
            .0
            .ring
            .random_element_array(&self.0.backing, self.0.size, rng, stat_dist)?;
        Ok(self.to_element(values))
    }

    pub fn element_from_reader(&self, reader: &mut ByteTreeReader<'_>) -> Result<APRingElement, ArithmError> {
        let values = self
            .0
            .ring
            .element_array_from_reader(&self.0.backing, self.0.size, reader)?;
        Ok(self.to_element(values))
    }

    pub fn random_element_array<R: RngCore + ?Sized>(
        &self,
        size: usize,
        rng: &mut R,
        stat_dist: usize,
    ) -> Result<APRingElementArray, ArithmError> {
        let values = (0..size)
            .map(|_| self.random_element(rng, stat_dist))
            .collect::<Result<_, _>>()?;
        Ok(self.element_array_from(values))
    }

    /// Decodes a node of `size` elements. A `size` of zero accepts any number
    /// of elements.
    pub fn element_array_from_reader(
        &self,
        size: usize,
        reader: &mut ByteTreeReader<'_>,
    ) -> Result<APRingElementArray, ArithmError> {
        let size = if size == 0 { reader.remaining() } else { size };
        if reader.is_leaf() || reader.remaining() != size {
            return Err(ArithmError::format("Unexpected number of elements!"));
        }
        let values = (0..size)
            .map(|_| self.element_from_reader(&mut reader.next_child()?))
            .collect::<Result<_, _>>()?;
        Ok(self.element_array_from(values))
    }

    /// # Panics
    ///
    /// Panics if an element belongs to another ring.
    pub fn element_array_from(&self, values: Vec<APRingElement>) -> APRingElementArray {
        for el in &values {
            assert!(el.ring == *self, "Distinct rings!");
        }
        APRingElementArray {
            ring: self.clone(),
            values,
        }
    }

    /// `Node(size, inner)` with the tagged encoding of the underlying ring.
    pub fn to_byte_tree(&self) -> ByteTree {
        ByteTree::node(vec![
            ByteTree::from_int(self.0.size as i32),
            marshal::marshal_pring(&self.0.ring),
        ])
    }
}

impl PartialEq for APRing {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || (self.0.size == other.0.size && self.0.ring == other.0.ring)
    }
}

impl Eq for APRing {}

/// An array of elements of the underlying ring.
#[derive(Debug, Clone)]
pub struct APRingElement {
    ring: APRing,
    values: PRingElementArray,
}

impl APRingElement {
    pub fn ring(&self) -> &APRing {
        &self.ring
    }

    pub fn values(&self) -> &PRingElementArray {
        &self.values
    }

    fn with(&self, values: PRingElementArray) -> APRingElement {
        APRingElement {
            ring: self.ring.clone(),
            values,
        }
    }

    fn check(&self, other: &APRingElement) {
        assert!(self.ring == other.ring, "Distinct rings!");
    }

    pub fn add(&self, other: &APRingElement) -> Result<APRingElement, ArithmError> {
        self.check(other);
        Ok(self.with(self.values.add(&other.values)?))
    }

    pub fn neg(&self) -> Result<APRingElement, ArithmError> {
        Ok(self.with(self.values.neg()?))
    }

    /// Element-wise product with an element of this ring, or the product of
    /// every element with a scalar of another ring.
    pub fn mul(&self, other: &PRingElement) -> Result<APRingElement, ArithmError> {
        match other {
            PRingElement::Array(el) if el.ring == self.ring => Ok(self.with(self.values.mul(&el.values)?)),
            _ => Ok(self.with(self.values.mul_scalar(other)?)),
        }
    }

    pub fn inv(&self) -> Result<APRingElement, ArithmError> {
        Ok(self.with(self.values.inv()?))
    }

    pub fn to_byte_tree(&self) -> Result<ByteTree, ArithmError> {
        self.values.to_byte_tree()
    }

    pub fn equals(&self, other: &APRingElement) -> Result<bool, ArithmError> {
        Ok(self.ring == other.ring && self.values.equals(&other.values)?)
    }
}

impl PartialEq for APRingElement {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.equals(other), Ok(true))
    }
}

#[derive(Debug, Clone)]
pub struct APRingElementArray {
    ring: APRing,
    values: Vec<APRingElement>,
}

impl APRingElementArray {
    pub fn ring(&self) -> &APRing {
        &self.ring
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn elements(&self) -> &[APRingElement] {
        &self.values
    }

    fn with(&self, values: Vec<APRingElement>) -> APRingElementArray {
        APRingElementArray {
            ring: self.ring.clone(),
            values,
        }
    }

    fn check(&self, other: &APRingElementArray) -> Result<(), ArithmError> {
        assert!(self.ring == other.ring, "Distinct rings!");
        if self.size() != other.size() {
            return Err(ArithmError::mismatch("array ring elements", self.size(), other.size()));
        }
        Ok(())
    }

    fn zip_with<F>(&self, other: &APRingElementArray, mut f: F) -> Result<APRingElementArray, ArithmError>
    where
        F: FnMut(&APRingElement, &APRingElement) -> Result<APRingElement, ArithmError>,
    {
        self.check(other)?;
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| f(a, b))
            .collect::<Result<_, _>>()?;
        Ok(self.with(values))
    }

    fn map<F>(&self, f: F) -> Result<APRingElementArray, ArithmError>
    where
        F: FnMut(&APRingElement) -> Result<APRingElement, ArithmError>,
    {
        let values = self.values.iter().map(f).collect::<Result<_, _>>()?;
        Ok(self.with(values))
    }

    pub fn get(&self, index: usize) -> Result<APRingElement, ArithmError> {
        self.values.get(index).cloned().ok_or_else(|| {
            ArithmError::InvalidParameters(format!("Index {} out of bounds for size {}!", index, self.size()))
        })
    }

    pub fn add(&self, terms: &APRingElementArray) -> Result<APRingElementArray, ArithmError> {
        self.zip_with(terms, APRingElement::add)
    }

    pub fn neg(&self) -> Result<APRingElementArray, ArithmError> {
        self.map(APRingElement::neg)
    }

    pub fn mul(&self, factors: &APRingElementArray) -> Result<APRingElementArray, ArithmError> {
        self.zip_with(factors, |a, b| a.mul(&PRingElement::Array(b.clone())))
    }

    pub fn mul_scalar(&self, factor: &PRingElement) -> Result<APRingElementArray, ArithmError> {
        self.map(|el| el.mul(factor))
    }

    pub fn inv(&self) -> Result<APRingElementArray, ArithmError> {
        self.map(APRingElement::inv)
    }

    pub fn inner_product(&self, other: &APRingElementArray) -> Result<APRingElement, ArithmError> {
        self.check(other)?;
        let mut res = self.ring.zero()?;
        for (a, b) in self.values.iter().zip(&other.values) {
            res = res.add(&a.mul(&PRingElement::Array(b.clone()))?)?;
        }
        Ok(res)
    }

    pub fn sum(&self) -> Result<APRingElement, ArithmError> {
        let mut res = self.ring.zero()?;
        for el in &self.values {
            res = res.add(el)?;
        }
        Ok(res)
    }

    pub fn prod(&self) -> Result<APRingElement, ArithmError> {
        let mut res = self.ring.one()?;
        for el in &self.values {
            res = res.mul(&PRingElement::Array(el.clone()))?;
        }
        Ok(res)
    }

    pub fn prods(&self) -> Result<APRingElementArray, ArithmError> {
        let mut res: Vec<APRingElement> = Vec::with_capacity(self.values.len());
        for el in &self.values {
            let next = match res.last() {
                Some(prev) => prev.mul(&PRingElement::Array(el.clone()))?,
                None => el.clone(),
            };
            res.push(next);
        }
        Ok(self.with(res))
    }

    /// Linear recurrence `out[0] = self[0]`,
    /// `out[i] = out[i - 1] * scalars[i] + self[i]`, and its last element,
    /// which is zero for an empty array.
    pub fn rec_lin(&self, scalars: &PFieldElementArray) -> Result<(APRingElementArray, APRingElement), ArithmError> {
        if scalars.size() != self.size() {
            return Err(ArithmError::mismatch("recurrence", self.size(), scalars.size()));
        }
        let scalars = scalars.elements()?;
        let mut res: Vec<APRingElement> = Vec::with_capacity(self.values.len());
        for (el, scalar) in self.values.iter().zip(scalars) {
            let next = match res.last() {
                Some(prev) => prev.mul(&PRingElement::Field(scalar))?.add(el)?,
                None => el.clone(),
            };
            res.push(next);
        }
        let last = match res.last() {
            Some(last) => last.clone(),
            None => self.ring.zero()?,
        };
        Ok((self.with(res), last))
    }

    pub fn permute(&self, permutation: &Permutation) -> Result<APRingElementArray, ArithmError> {
        Ok(self.with(permutation.apply(&self.values)?))
    }

    pub fn copy_of_range(&self, start: usize, end: usize) -> Result<APRingElementArray, ArithmError> {
        match self.values.get(start..end) {
            Some(values) => Ok(self.with(values.to_vec())),
            None => Err(ArithmError::InvalidParameters(format!(
                "Illegal range {}..{} for size {}!",
                start,
                end,
                self.size()
            ))),
        }
    }

    pub fn extract(&self, mask: &[bool]) -> Result<APRingElementArray, ArithmError> {
        if mask.len() != self.size() {
            return Err(ArithmError::mismatch("extraction", self.size(), mask.len()));
        }
        let values = self
            .values
            .iter()
            .zip(mask)
            .filter(|&(_, &keep)| keep)
            .map(|(el, _)| el.clone())
            .collect();
        Ok(self.with(values))
    }

    pub fn to_byte_tree(&self) -> Result<ByteTree, ArithmError> {
        let children = self
            .values
            .iter()
            .map(APRingElement::to_byte_tree)
            .collect::<Result<_, _>>()?;
        Ok(ByteTree::node(children))
    }

    pub fn equals(&self, other: &APRingElementArray) -> Result<bool, ArithmError> {
        if self.ring != other.ring || self.size() != other.size() {
            return Ok(false);
        }
        for (a, b) in self.values.iter().zip(&other.values) {
            if !a.equals(b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
