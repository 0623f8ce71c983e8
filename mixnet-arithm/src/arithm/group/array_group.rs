//! Groups of fixed-size arrays viewed as single elements.

use std::cmp::Ordering;
use std::sync::Arc;

use rand::RngCore;

use crate::arithm::Permutation;
use crate::arithm::array::Backing;
use crate::arithm::marshal;
use crate::arithm::ring::{APRing, APRingElementArray, PField, PRingElement, PRingElementArray};
use crate::eio::{ByteTree, ByteTreeReader};
use crate::errors::ArithmError;

use super::{PGroup, PGroupElement, PGroupElementArray, distinct_groups};

#[derive(Debug)]
struct ArrayParams {
    group: PGroup,
    size: usize,
    backing: Backing,
    pring: APRing,
}

/// The group whose elements are arrays of `size` elements of an underlying
/// group, with element-wise operations. Its ring of exponents is the array
/// ring of the same size over the ring of the underlying group.
#[derive(Debug, Clone)]
pub struct APGroup(Arc<ArrayParams>);

impl APGroup {
    /// # Errors
    ///
    /// Returns `ArithmError::InvalidParameters` if `size` is zero.
    pub fn try_with(group: PGroup, size: usize, backing: Backing) -> Result<Self, ArithmError> {
        let pring = APRing::try_with(group.pring(), size, backing.clone())?;
        Ok(APGroup(Arc::new(ArrayParams {
            group,
            size,
            backing,
            pring,
        })))
    }

    /// Decodes the structure written by [`APGroup::to_byte_tree`].
    pub fn from_reader<R: RngCore + ?Sized>(
        reader: &mut ByteTreeReader<'_>,
        backing: &Backing,
        rng: &mut R,
        certainty: usize,
    ) -> Result<Self, ArithmError> {
        if reader.is_leaf() || reader.remaining() != 2 {
            return Err(ArithmError::format("Malformed APGroup!"));
        }
        let size = reader.next_child()?.read_int()?;
        let size = usize::try_from(size).map_err(|_| ArithmError::format("Negative array size!"))?;
        let group = marshal::unmarshal_pgroup(&mut reader.next_child()?, backing, rng, certainty)?;
        Self::try_with(group, size, backing.clone())
    }

    pub fn inner(&self) -> &PGroup {
        &self.0.group
    }

    pub fn size(&self) -> usize {
        self.0.size
    }

    pub fn backing(&self) -> &Backing {
        &self.0.backing
    }

    pub fn pring(&self) -> &APRing {
        &self.0.pring
    }

    pub fn pfield(&self) -> &PField {
        self.0.pring.pfield()
    }

    pub fn byte_length(&self) -> usize {
        5 + self.0.size * self.0.group.byte_length()
    }

    pub fn encode_length(&self) -> usize {
        self.0.group.encode_length()
    }

    /// Wraps an array of the underlying group.
    ///
    /// # Panics
    ///
    /// Panics if the array has the wrong group or size.
    pub fn to_element(&self, values: PGroupElementArray) -> APGroupElement {
        if values.group() != self.0.group {
            distinct_groups();
        }
        assert_eq!(values.size(), self.0.size, "Wrong array size!");
        APGroupElement {
            group: self.clone(),
            values,
        }
    }

    fn fill(&self, element: &PGroupElement) -> Result<APGroupElement, ArithmError> {
        let values = self
            .0
            .group
            .fill_element_array(&self.0.backing, self.0.size, element)?;
        Ok(self.to_element(values))
    }

    pub fn generator(&self) -> Result<APGroupElement, ArithmError> {
        self.fill(&self.0.group.generator()?)
    }

    pub fn one(&self) -> Result<APGroupElement, ArithmError> {
        self.fill(&self.0.group.one()?)
    }

    pub fn random_element<R: RngCore + ?Sized>(
        &self,
        rng: &mut R,
        stat_dist: usize,
    ) -> Result<APGroupElement, ArithmError> {
        let values = self
            .0
            .group
            .random_element_array(&self.0.backing, self.0.size, rng, stat_dist)?;
        Ok(self.to_element(values))
    }

    pub fn element_from_reader(&self, reader: &mut ByteTreeReader<'_>) -> Result<APGroupElement, ArithmError> {
        let values = self
            .0
            .group
            .element_array_from_reader(&self.0.backing, self.0.size, reader)?;
        Ok(self.to_element(values))
    }

    /// Every position holds the encoding of `bytes` in the underlying group.
    pub fn encode(&self, bytes: &[u8]) -> Result<APGroupElement, ArithmError> {
        self.fill(&self.0.group.encode_bytes(bytes)?)
    }

    pub fn random_element_array<R: RngCore + ?Sized>(
        &self,
        size: usize,
        rng: &mut R,
        stat_dist: usize,
    ) -> Result<APGroupElementArray, ArithmError> {
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
    ) -> Result<APGroupElementArray, ArithmError> {
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
    /// Panics if an element belongs to another group.
    pub fn element_array_from(&self, values: Vec<APGroupElement>) -> APGroupElementArray {
        for el in &values {
            if el.group != *self {
                distinct_groups();
            }
        }
        APGroupElementArray {
            group: self.clone(),
            values,
        }
    }

    /// `Node(size, inner)` with the tagged encoding of the underlying group.
    pub fn to_byte_tree(&self) -> ByteTree {
        ByteTree::node(vec![
            ByteTree::from_int(self.0.size as i32),
            marshal::marshal_pgroup(&self.0.group),
        ])
    }
}

impl PartialEq for APGroup {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || (self.0.size == other.0.size && self.0.group == other.0.group)
    }
}

impl Eq for APGroup {}

#[derive(Debug, Clone)]
pub struct APGroupElement {
    group: APGroup,
    values: PGroupElementArray,
}

impl APGroupElement {
    pub fn group(&self) -> &APGroup {
        &self.group
    }

    pub fn values(&self) -> &PGroupElementArray {
        &self.values
    }

    fn with(&self, values: PGroupElementArray) -> APGroupElement {
        APGroupElement {
            group: self.group.clone(),
            values,
        }
    }

    /// Element-wise product with an element of this group, or every
    /// position multiplied by an element of another group.
    pub fn mul(&self, other: &PGroupElement) -> Result<APGroupElement, ArithmError> {
        match other {
            PGroupElement::Array(el) if el.group == self.group => Ok(self.with(self.values.mul(&el.values)?)),
            _ => Ok(self.with(self.values.mul_scalar(other)?)),
        }
    }

    pub fn inv(&self) -> Result<APGroupElement, ArithmError> {
        Ok(self.with(self.values.inv()?))
    }

    /// Element-wise power to an element of the array ring, or every position
    /// raised to an exponent of another ring.
    pub fn exp(&self, exponent: &PRingElement) -> Result<APGroupElement, ArithmError> {
        match exponent {
            PRingElement::Array(e) if e.ring() == self.group.pring() => Ok(self.with(self.values.exp(e.values())?)),
            _ => Ok(self.with(self.values.exp_scalar(exponent)?)),
        }
    }

    /// This element raised to every exponent of `exponents`.
    pub fn exp_array(&self, exponents: &PRingElementArray) -> Result<APGroupElementArray, ArithmError> {
        let values = exponents
            .elements()?
            .iter()
            .map(|e| self.exp(e))
            .collect::<Result<_, _>>()?;
        Ok(self.group.element_array_from(values))
    }

    /// Bytes encoded in the first position.
    pub fn decode(&self) -> Result<Vec<u8>, ArithmError> {
        self.values.get(0)?.decode()
    }

    pub fn to_byte_tree(&self) -> Result<ByteTree, ArithmError> {
        self.values.to_byte_tree()
    }

    pub fn equals(&self, other: &APGroupElement) -> Result<bool, ArithmError> {
        Ok(self.group == other.group && self.values.equals(&other.values)?)
    }

    pub fn compare_to(&self, other: &APGroupElement) -> Result<Ordering, ArithmError> {
        if self.group != other.group {
            distinct_groups();
        }
        self.values.compare_to(&other.values)
    }
}

impl PartialEq for APGroupElement {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.equals(other), Ok(true))
    }
}

#[derive(Debug, Clone)]
pub struct APGroupElementArray {
    group: APGroup,
    values: Vec<APGroupElement>,
}

impl APGroupElementArray {
    pub fn group(&self) -> &APGroup {
        &self.group
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn elements(&self) -> &[APGroupElement] {
        &self.values
    }

    fn with(&self, values: Vec<APGroupElement>) -> APGroupElementArray {
        APGroupElementArray {
            group: self.group.clone(),
            values,
        }
    }

    fn check(&self, other: &APGroupElementArray) -> Result<(), ArithmError> {
        if self.group != other.group {
            distinct_groups();
        }
        if self.size() != other.size() {
            return Err(ArithmError::mismatch("array group elements", self.size(), other.size()));
        }
        Ok(())
    }

    fn map<F>(&self, f: F) -> Result<APGroupElementArray, ArithmError>
    where
        F: FnMut(&APGroupElement) -> Result<APGroupElement, ArithmError>,
    {
        let values = self.values.iter().map(f).collect::<Result<_, _>>()?;
        Ok(self.with(values))
    }

    pub fn get(&self, index: usize) -> Result<APGroupElement, ArithmError> {
        self.values.get(index).cloned().ok_or_else(|| {
            ArithmError::InvalidParameters(format!("Index {} out of bounds for size {}!", index, self.size()))
        })
    }

    pub fn mul(&self, factors: &APGroupElementArray) -> Result<APGroupElementArray, ArithmError> {
        self.check(factors)?;
        let values = self
            .values
            .iter()
            .zip(&factors.values)
            .map(|(a, b)| a.mul(&PGroupElement::Array(b.clone())))
            .collect::<Result<_, _>>()?;
        Ok(self.with(values))
    }

    pub fn mul_scalar(&self, factor: &PGroupElement) -> Result<APGroupElementArray, ArithmError> {
        self.map(|el| el.mul(factor))
    }

    pub fn inv(&self) -> Result<APGroupElementArray, ArithmError> {
        self.map(APGroupElement::inv)
    }

    pub fn exp(&self, exponents: &APRingElementArray) -> Result<APGroupElementArray, ArithmError> {
        if exponents.size() != self.size() {
            return Err(ArithmError::mismatch("powers", self.size(), exponents.size()));
        }
        let values = self
            .values
            .iter()
            .zip(exponents.elements())
            .map(|(el, e)| el.exp(&PRingElement::Array(e.clone())))
            .collect::<Result<_, _>>()?;
        Ok(self.with(values))
    }

    pub fn exp_scalar(&self, exponent: &PRingElement) -> Result<APGroupElementArray, ArithmError> {
        self.map(|el| el.exp(exponent))
    }

    /// Product of the elements raised to the given exponents, one position
    /// at a time.
    pub fn exp_prod(&self, exponents: &APRingElementArray) -> Result<APGroupElement, ArithmError> {
        self.exp(exponents)?.prod()
    }

    pub fn prod(&self) -> Result<APGroupElement, ArithmError> {
        let mut res = self.group.one()?;
        for el in &self.values {
            res = res.mul(&PGroupElement::Array(el.clone()))?;
        }
        Ok(res)
    }

    /// Lexicographic order of the arrays.
    pub fn compare_to(&self, other: &APGroupElementArray) -> Result<Ordering, ArithmError> {
        if self.group != other.group {
            distinct_groups();
        }
        for (a, b) in self.values.iter().zip(&other.values) {
            match a.compare_to(b)? {
                Ordering::Equal => {}
                ordering => return Ok(ordering),
            }
        }
        Ok(self.size().cmp(&other.size()))
    }

    pub fn equals_all(&self, other: &APGroupElementArray) -> Result<Vec<bool>, ArithmError> {
        self.check(other)?;
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a.equals(b))
            .collect()
    }

    pub fn equals(&self, other: &APGroupElementArray) -> Result<bool, ArithmError> {
        if self.group != other.group || self.size() != other.size() {
            return Ok(false);
        }
        for (a, b) in self.values.iter().zip(&other.values) {
            if !a.equals(b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn permute(&self, permutation: &Permutation) -> Result<APGroupElementArray, ArithmError> {
        Ok(self.with(permutation.apply(&self.values)?))
    }

    pub fn shift_push(&self, element: &APGroupElement) -> Result<APGroupElementArray, ArithmError> {
        if element.group != self.group {
            distinct_groups();
        }
        let mut values: Vec<APGroupElement> = self.values.iter().skip(1).cloned().collect();
        values.push(element.clone());
        Ok(self.with(values))
    }

    pub fn copy_of_range(&self, start: usize, end: usize) -> Result<APGroupElementArray, ArithmError> {
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

    pub fn extract(&self, mask: &[bool]) -> Result<APGroupElementArray, ArithmError> {
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
            .map(APGroupElement::to_byte_tree)
            .collect::<Result<_, _>>()?;
        Ok(ByteTree::node(children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arithm::group::ECPGroup;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn curve() -> Result<PGroup, ArithmError> {
        Ok(PGroup::Ec(ECPGroup::named("secp256k1")?))
    }

    #[test]
    fn test_generator_fills_the_array() -> Result<(), ArithmError> {
        let inner = curve()?;
        let group = APGroup::try_with(inner.clone(), 4, Backing::Memory)?;
        let g = group.generator()?;
        for el in g.values().elements()? {
            assert!(el.equals(&inner.generator()?)?);
        }
        assert_eq!(group.byte_length(), 5 + 4 * inner.byte_length());
        assert_eq!(g.to_byte_tree()?.total_byte_size(), group.byte_length());
        assert!(APGroup::try_with(inner, 0, Backing::Memory).is_err());
        Ok(())
    }

    #[test]
    fn test_element_wise_and_broadcast_operations() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(51);
        let inner = curve()?;
        let group = APGroup::try_with(inner.clone(), 3, Backing::Memory)?;
        let a = group.random_element(&mut rng, 20)?;

        let exponent = group.pring().random_element(&mut rng, 20)?;
        let powered = a.exp(&PRingElement::Array(exponent.clone()))?;
        let bases = a.values().elements()?;
        let exps = exponent.values().elements()?;
        for (i, el) in powered.values().elements()?.iter().enumerate() {
            assert!(el.equals(&bases[i].exp(&exps[i])?)?);
        }

        let scalar = inner.random_element(&mut rng, 20)?;
        let shifted = a.mul(&scalar)?;
        for (i, el) in shifted.values().elements()?.iter().enumerate() {
            assert!(el.equals(&bases[i].mul(&scalar)?)?);
        }

        let unit = a.mul(&PGroupElement::Array(a.inv()?))?;
        assert!(unit.equals(&group.one()?)?);
        Ok(())
    }

    #[test]
    fn test_encoding_uses_the_first_position() -> Result<(), ArithmError> {
        let group = APGroup::try_with(curve()?, 2, Backing::Memory)?;
        let data = b"array group";
        assert_eq!(group.encode(data)?.decode()?, data.to_vec());
        Ok(())
    }

    #[test]
    fn test_structure_and_arrays() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(52);
        let group = APGroup::try_with(curve()?, 2, Backing::Memory)?;
        let tree = group.to_byte_tree();
        let decoded = APGroup::from_reader(&mut tree.reader(), &Backing::Memory, &mut rng, 40)?;
        assert_eq!(decoded, group);

        let array = group.random_element_array(3, &mut rng, 20)?;
        let tree = array.to_byte_tree()?;
        let read = group.element_array_from_reader(3, &mut tree.reader())?;
        assert!(read.equals(&array)?);
        assert_eq!(read.equals_all(&array)?, vec![true; 3]);

        let exponents = group.pring().random_element_array(3, &mut rng, 20)?;
        let mut expected = group.one()?;
        for (el, e) in array.elements().iter().zip(exponents.elements()) {
            expected = expected.mul(&PGroupElement::Array(el.exp(&PRingElement::Array(e.clone()))?))?;
        }
        assert!(array.exp_prod(&exponents)?.equals(&expected)?);
        Ok(())
    }
}
