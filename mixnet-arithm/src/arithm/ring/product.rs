//! Direct products of rings.

use std::sync::Arc;

use rand::RngCore;

use crate::arithm::Permutation;
use crate::arithm::array::Backing;
use crate::arithm::marshal;
use crate::eio::{ByteTree, ByteTreeReader};
use crate::errors::ArithmError;

use super::{PField, PFieldElementArray, PRing, PRingElement, PRingElementArray};

#[derive(Debug)]
struct ProductParams {
    rings: Vec<PRing>,
    byte_length: usize,
}

/// Direct product of rings over a common field. Nested products keep their
/// structure, so `(F x F) x F` and `F x (F x F)` are distinct rings.
#[derive(Debug, Clone)]
pub struct PPRing(Arc<ProductParams>);

impl PPRing {
    /// # Errors
    ///
    /// Returns `ArithmError::InvalidParameters` if `rings` is empty or if the
    /// rings are defined over distinct fields.
    pub fn try_with(rings: Vec<PRing>) -> Result<Self, ArithmError> {
        let Some(first) = rings.first() else {
            return Err(ArithmError::InvalidParameters("Empty product!".to_string()));
        };
        if rings.iter().any(|ring| ring.pfield() != first.pfield()) {
            return Err(ArithmError::InvalidParameters(
                "Rings have distinct fields!".to_string(),
            ));
        }
        let byte_length = 5 + rings.iter().map(PRing::byte_length).sum::<usize>();
        Ok(PPRing(Arc::new(ProductParams { rings, byte_length })))
    }

    /// Product of `width` copies of `ring`.
    pub fn power(ring: &PRing, width: usize) -> Result<Self, ArithmError> {
        Self::try_with(vec![ring.clone(); width])
    }

    /// Decodes the structure written by [`PPRing::to_byte_tree`].
    pub fn from_reader<R: RngCore + ?Sized>(
        reader: &mut ByteTreeReader<'_>,
        backing: &Backing,
        rng: &mut R,
        certainty: usize,
    ) -> Result<Self, ArithmError> {
        if reader.is_leaf() || reader.remaining() != 2 {
            return Err(ArithmError::format("Malformed PPRing!"));
        }
        let field = PField::from_reader(&mut reader.next_child()?, rng, certainty)?;
        Self::from_inner(&mut reader.next_child()?, &field, backing, rng, certainty)
    }

    fn from_inner<R: RngCore + ?Sized>(
        reader: &mut ByteTreeReader<'_>,
        field: &PField,
        backing: &Backing,
        rng: &mut R,
        certainty: usize,
    ) -> Result<Self, ArithmError> {
        if reader.is_leaf() || reader.remaining() == 0 {
            return Err(ArithmError::format("Malformed PPRing!"));
        }
        let mut rings = Vec::with_capacity(reader.remaining());
        while reader.remaining() > 0 {
            let mut child = reader.next_child()?;
            let ring = if child.is_leaf() {
                let tree = ByteTree::from_bytes(child.read_all()?)?;
                marshal::unmarshal_pring(&mut tree.reader(), backing, rng, certainty)?
            } else if child.remaining() == 0 {
                PRing::Field(field.clone())
            } else {
                PRing::Product(Self::from_inner(&mut child, field, backing, rng, certainty)?)
            };
            rings.push(ring);
        }
        Self::try_with(rings)
    }

    pub fn width(&self) -> usize {
        self.0.rings.len()
    }

    pub fn factors(&self) -> &[PRing] {
        &self.0.rings
    }

    pub fn pfield(&self) -> &PField {
        self.0.rings[0].pfield()
    }

    pub fn byte_length(&self) -> usize {
        self.0.byte_length
    }

    pub fn encode_length(&self) -> usize {
        self.pfield().encode_length()
    }

    /// The component at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn project(&self, index: usize) -> PRing {
        self.0.rings[index].clone()
    }

    /// The product of the components selected by `mask`, or the component
    /// itself if exactly one is selected.
    ///
    /// # Panics
    ///
    /// Panics if `mask` has the wrong length or selects nothing.
    pub fn project_mask(&self, mask: &[bool]) -> PRing {
        assert_eq!(mask.len(), self.width(), "Wrong mask length!");
        let mut selected: Vec<PRing> = self
            .0
            .rings
            .iter()
            .zip(mask)
            .filter(|&(_, &keep)| keep)
            .map(|(ring, _)| ring.clone())
            .collect();
        match selected.len() {
            0 => panic!("Empty projection!"),
            1 => selected.remove(0),
            _ => PRing::Product(PPRing(Arc::new(ProductParams {
                byte_length: 5 + selected.iter().map(PRing::byte_length).sum::<usize>(),
                rings: selected,
            }))),
        }
    }

    /// The element with the given components.
    ///
    /// # Panics
    ///
    /// Panics if the components do not belong to the factors of the ring.
    pub fn product(&self, elements: Vec<PRingElement>) -> PPRingElement {
        assert_eq!(elements.len(), self.width(), "Wrong number of components!");
        for (ring, el) in self.0.rings.iter().zip(&elements) {
            assert!(ring.contains(el), "Distinct rings!");
        }
        PPRingElement {
            ring: self.clone(),
            values: elements,
        }
    }

    /// The element with `element` in every component.
    ///
    /// # Panics
    ///
    /// Panics unless every factor of the ring is the ring of `element`.
    pub fn product_of(&self, element: &PRingElement) -> PPRingElement {
        self.product(vec![element.clone(); self.width()])
    }

    /// The array with the given component arrays.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::DimensionMismatch` if the arrays have different
    /// sizes.
    ///
    /// # Panics
    ///
    /// Panics if the arrays do not belong to the factors of the ring.
    pub fn product_array(&self, arrays: Vec<PRingElementArray>) -> Result<PPRingElementArray, ArithmError> {
        assert_eq!(arrays.len(), self.width(), "Wrong number of components!");
        for (ring, array) in self.0.rings.iter().zip(&arrays) {
            assert!(array.ring() == *ring, "Distinct rings!");
            if array.size() != arrays[0].size() {
                return Err(ArithmError::mismatch("product array", arrays[0].size(), array.size()));
            }
        }
        Ok(PPRingElementArray {
            ring: self.clone(),
            values: arrays,
        })
    }

    fn map_factors<T, F>(&self, f: F) -> Result<Vec<T>, ArithmError>
    where
        F: FnMut(&PRing) -> Result<T, ArithmError>,
    {
        self.0.rings.iter().map(f).collect()
    }

    pub fn zero(&self) -> Result<PPRingElement, ArithmError> {
        let values = self.map_factors(PRing::zero)?;
        Ok(self.product(values))
    }

    pub fn one(&self) -> Result<PPRingElement, ArithmError> {
        let values = self.map_factors(PRing::one)?;
        Ok(self.product(values))
    }

    pub fn random_element<R: RngCore + ?Sized>(
        &self,
        rng: &mut R,
        stat_dist: usize,
    ) -> Result<PPRingElement, ArithmError> {
        let values = self.map_factors(|ring| ring.random_element(rng, stat_dist))?;
        Ok(self.product(values))
    }

    pub fn element_from_reader(&self, reader: &mut ByteTreeReader<'_>) -> Result<PPRingElement, ArithmError> {
        if reader.is_leaf() || reader.remaining() != self.width() {
            return Err(ArithmError::format("Wrong number of components!"));
        }
        let values = self.map_factors(|ring| ring.element_from_reader(&mut reader.next_child()?))?;
        Ok(self.product(values))
    }

    pub fn random_element_array<R: RngCore + ?Sized>(
        &self,
        backing: &Backing,
        size: usize,
        rng: &mut R,
        stat_dist: usize,
    ) -> Result<PPRingElementArray, ArithmError> {
        let arrays = self.map_factors(|ring| ring.random_element_array(backing, size, rng, stat_dist))?;
        self.product_array(arrays)
    }

    /// Decodes a node with one array per factor, each of `size` elements.
    pub fn element_array_from_reader(
        &self,
        backing: &Backing,
        size: usize,
        reader: &mut ByteTreeReader<'_>,
    ) -> Result<PPRingElementArray, ArithmError> {
        if reader.is_leaf() || reader.remaining() != self.width() {
            return Err(ArithmError::format("Wrong number of rings!"));
        }
        let arrays = self.map_factors(|ring| ring.element_array_from_reader(backing, size, &mut reader.next_child()?))?;
        self.product_array(arrays)
    }

    /// Splits the elements into one array per factor.
    pub fn element_array_from(
        &self,
        backing: &Backing,
        elements: &[PPRingElement],
    ) -> Result<PPRingElementArray, ArithmError> {
        let mut columns: Vec<Vec<PRingElement>> = vec![Vec::with_capacity(elements.len()); self.width()];
        for el in elements {
            assert!(el.ring == *self, "Distinct rings!");
            for (column, value) in columns.iter_mut().zip(&el.values) {
                column.push(value.clone());
            }
        }
        let arrays = self
            .0
            .rings
            .iter()
            .zip(&columns)
            .map(|(ring, column)| ring.element_array_from(backing, column))
            .collect::<Result<Vec<_>, _>>()?;
        self.product_array(arrays)
    }

    /// `Node(field, structure)`, where the structure of a field factor is
    /// an empty node, that of a product factor is the node of the
    /// structures of its factors, and that of any other factor is a leaf
    /// holding its marshalled encoding.
    pub fn to_byte_tree(&self) -> ByteTree {
        ByteTree::node(vec![self.pfield().to_byte_tree(), self.inner_tree()])
    }

    fn inner_tree(&self) -> ByteTree {
        ByteTree::node(
            self.0
                .rings
                .iter()
                .map(|ring| match ring {
                    PRing::Field(_) => ByteTree::node(Vec::new()),
                    PRing::Product(product) => product.inner_tree(),
                    PRing::Array(_) => ByteTree::leaf(marshal::marshal_pring(ring).to_bytes()),
                })
                .collect(),
        )
    }
}

impl PartialEq for PPRing {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.rings == other.0.rings
    }
}

impl Eq for PPRing {}

#[derive(Debug, Clone, PartialEq)]
pub struct PPRingElement {
    ring: PPRing,
    values: Vec<PRingElement>,
}

impl PPRingElement {
    pub fn ring(&self) -> &PPRing {
        &self.ring
    }

    pub fn factors(&self) -> &[PRingElement] {
        &self.values
    }

    pub fn project(&self, index: usize) -> PRingElement {
        self.values[index].clone()
    }

    /// The components selected by `mask`, in the ring
    /// [`PPRing::project_mask`].
    pub fn project_mask(&self, mask: &[bool]) -> PRingElement {
        let ring = self.ring.project_mask(mask);
        let mut selected: Vec<PRingElement> = self
            .values
            .iter()
            .zip(mask)
            .filter(|&(_, &keep)| keep)
            .map(|(el, _)| el.clone())
            .collect();
        match ring {
            PRing::Product(product) => PRingElement::Product(PPRingElement {
                ring: product,
                values: selected,
            }),
            _ => selected.remove(0),
        }
    }

    fn with(&self, values: Vec<PRingElement>) -> PPRingElement {
        PPRingElement {
            ring: self.ring.clone(),
            values,
        }
    }

    fn zip_with<F>(&self, other: &PPRingElement, mut f: F) -> Result<PPRingElement, ArithmError>
    where
        F: FnMut(&PRingElement, &PRingElement) -> Result<PRingElement, ArithmError>,
    {
        assert!(self.ring == other.ring, "Distinct rings!");
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| f(a, b))
            .collect::<Result<_, _>>()?;
        Ok(self.with(values))
    }

    fn map<F>(&self, f: F) -> Result<PPRingElement, ArithmError>
    where
        F: FnMut(&PRingElement) -> Result<PRingElement, ArithmError>,
    {
        let values = self.values.iter().map(f).collect::<Result<_, _>>()?;
        Ok(self.with(values))
    }

    /// Component-wise sum with an element of the same product.
    pub fn add_uniform(&self, other: &PPRingElement) -> Result<PPRingElement, ArithmError> {
        self.zip_with(other, PRingElement::add)
    }

    /// Adds `term` to every component.
    pub fn add_broadcast(&self, term: &PRingElement) -> Result<PPRingElement, ArithmError> {
        self.map(|el| el.add(term))
    }

    pub fn add(&self, other: &PRingElement) -> Result<PPRingElement, ArithmError> {
        match other {
            PRingElement::Product(el) if el.ring == self.ring => self.add_uniform(el),
            _ => self.add_broadcast(other),
        }
    }

    pub fn neg(&self) -> Result<PPRingElement, ArithmError> {
        self.map(PRingElement::neg)
    }

    pub fn mul_uniform(&self, other: &PPRingElement) -> Result<PPRingElement, ArithmError> {
        self.zip_with(other, PRingElement::mul)
    }

    /// Multiplies every component by `factor`.
    pub fn mul_broadcast(&self, factor: &PRingElement) -> Result<PPRingElement, ArithmError> {
        self.map(|el| el.mul(factor))
    }

    pub fn mul(&self, other: &PRingElement) -> Result<PPRingElement, ArithmError> {
        match other {
            PRingElement::Product(el) if el.ring == self.ring => self.mul_uniform(el),
            _ => self.mul_broadcast(other),
        }
    }

    pub fn inv(&self) -> Result<PPRingElement, ArithmError> {
        self.map(PRingElement::inv)
    }

    pub fn to_byte_tree(&self) -> Result<ByteTree, ArithmError> {
        let children = self
            .values
            .iter()
            .map(PRingElement::to_byte_tree)
            .collect::<Result<_, _>>()?;
        Ok(ByteTree::node(children))
    }

    pub fn equals(&self, other: &PPRingElement) -> Result<bool, ArithmError> {
        if self.ring != other.ring {
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

/// An array of product elements, held as one array per factor.
#[derive(Debug, Clone)]
pub struct PPRingElementArray {
    ring: PPRing,
    values: Vec<PRingElementArray>,
}

impl PPRingElementArray {
    pub fn ring(&self) -> &PPRing {
        &self.ring
    }

    pub fn factors(&self) -> &[PRingElementArray] {
        &self.values
    }

    pub fn project(&self, index: usize) -> PRingElementArray {
        self.values[index].clone()
    }

    pub fn size(&self) -> usize {
        self.values[0].size()
    }

    fn with(&self, values: Vec<PRingElementArray>) -> PPRingElementArray {
        PPRingElementArray {
            ring: self.ring.clone(),
            values,
        }
    }

    fn map<F>(&self, f: F) -> Result<PPRingElementArray, ArithmError>
    where
        F: FnMut(&PRingElementArray) -> Result<PRingElementArray, ArithmError>,
    {
        let values = self.values.iter().map(f).collect::<Result<_, _>>()?;
        Ok(self.with(values))
    }

    fn reduce<F>(&self, f: F) -> Result<PPRingElement, ArithmError>
    where
        F: FnMut(&PRingElementArray) -> Result<PRingElement, ArithmError>,
    {
        let values = self.values.iter().map(f).collect::<Result<_, _>>()?;
        Ok(PPRingElement {
            ring: self.ring.clone(),
            values,
        })
    }

    /// Runs `f` on matching components if `other` is an array of this
    /// product, and on every component with all of `other` otherwise.
    fn combine<F>(&self, other: &PRingElementArray, mut f: F) -> Result<PPRingElementArray, ArithmError>
    where
        F: FnMut(&PRingElementArray, &PRingElementArray) -> Result<PRingElementArray, ArithmError>,
    {
        match other {
            PRingElementArray::Product(array) if array.ring == self.ring => {
                let values = self
                    .values
                    .iter()
                    .zip(&array.values)
                    .map(|(a, b)| f(a, b))
                    .collect::<Result<_, _>>()?;
                Ok(self.with(values))
            }
            _ => self.map(|a| f(a, other)),
        }
    }

    pub fn get(&self, index: usize) -> Result<PPRingElement, ArithmError> {
        self.reduce(|array| array.get(index))
    }

    pub fn elements(&self) -> Result<Vec<PPRingElement>, ArithmError> {
        let columns = self
            .values
            .iter()
            .map(PRingElementArray::elements)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((0..self.size())
            .map(|i| PPRingElement {
                ring: self.ring.clone(),
                values: columns.iter().map(|column| column[i].clone()).collect(),
            })
            .collect())
    }

    pub fn add(&self, terms: &PRingElementArray) -> Result<PPRingElementArray, ArithmError> {
        self.combine(terms, PRingElementArray::add)
    }

    pub fn neg(&self) -> Result<PPRingElementArray, ArithmError> {
        self.map(PRingElementArray::neg)
    }

    pub fn mul(&self, factors: &PRingElementArray) -> Result<PPRingElementArray, ArithmError> {
        self.combine(factors, PRingElementArray::mul)
    }

    pub fn mul_scalar(&self, factor: &PRingElement) -> Result<PPRingElementArray, ArithmError> {
        match factor {
            PRingElement::Product(el) if el.ring == self.ring => {
                let values = self
                    .values
                    .iter()
                    .zip(&el.values)
                    .map(|(array, factor)| array.mul_scalar(factor))
                    .collect::<Result<_, _>>()?;
                Ok(self.with(values))
            }
            _ => self.map(|array| array.mul_scalar(factor)),
        }
    }

    pub fn inv(&self) -> Result<PPRingElementArray, ArithmError> {
        self.map(PRingElementArray::inv)
    }

    pub fn inner_product(&self, other: &PRingElementArray) -> Result<PPRingElement, ArithmError> {
        match other {
            PRingElementArray::Product(array) if array.ring == self.ring => {
                let values = self
                    .values
                    .iter()
                    .zip(&array.values)
                    .map(|(a, b)| a.inner_product(b))
                    .collect::<Result<_, _>>()?;
                Ok(PPRingElement {
                    ring: self.ring.clone(),
                    values,
                })
            }
            _ => self.reduce(|a| a.inner_product(other)),
        }
    }

    pub fn sum(&self) -> Result<PPRingElement, ArithmError> {
        self.reduce(PRingElementArray::sum)
    }

    pub fn prod(&self) -> Result<PPRingElement, ArithmError> {
        self.reduce(PRingElementArray::prod)
    }

    pub fn prods(&self) -> Result<PPRingElementArray, ArithmError> {
        self.map(PRingElementArray::prods)
    }

    pub fn rec_lin(&self, scalars: &PFieldElementArray) -> Result<(PPRingElementArray, PPRingElement), ArithmError> {
        let mut arrays = Vec::with_capacity(self.values.len());
        let mut lasts = Vec::with_capacity(self.values.len());
        for array in &self.values {
            let (res, last) = array.rec_lin(scalars)?;
            arrays.push(res);
            lasts.push(last);
        }
        Ok((
            self.with(arrays),
            PPRingElement {
                ring: self.ring.clone(),
                values: lasts,
            },
        ))
    }

    pub fn permute(&self, permutation: &Permutation) -> Result<PPRingElementArray, ArithmError> {
        self.map(|array| array.permute(permutation))
    }

    pub fn copy_of_range(&self, start: usize, end: usize) -> Result<PPRingElementArray, ArithmError> {
        self.map(|array| array.copy_of_range(start, end))
    }

    pub fn extract(&self, mask: &[bool]) -> Result<PPRingElementArray, ArithmError> {
        self.map(|array| array.extract(mask))
    }

    /// Node of the encodings of the component arrays.
    pub fn to_byte_tree(&self) -> Result<ByteTree, ArithmError> {
        let children = self
            .values
            .iter()
            .map(PRingElementArray::to_byte_tree)
            .collect::<Result<_, _>>()?;
        Ok(ByteTree::node(children))
    }

    pub fn equals(&self, other: &PPRingElementArray) -> Result<bool, ArithmError> {
        if self.ring != other.ring {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arithm::LargeInteger;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn field() -> PField {
        PField::with_prime_order(LargeInteger::from(7919))
    }

    fn nested() -> Result<PPRing, ArithmError> {
        let f = PRing::Field(field());
        let inner = PPRing::power(&f, 2)?;
        PPRing::try_with(vec![PRing::Product(inner), f])
    }

    #[test]
    fn test_projections() -> Result<(), ArithmError> {
        let ring = nested()?;
        let f = PRing::Field(field());
        let inner = PRing::Product(PPRing::power(&f, 2)?);

        assert_eq!(ring.project(0), inner);
        assert_eq!(ring.project(1), f);

        let outer = PPRing::power(&f, 3)?;
        assert_eq!(outer.project_mask(&[true, true, false]), inner);
        assert_eq!(outer.project_mask(&[false, false, true]), f);
        assert_ne!(outer.project_mask(&[true, true, false]), outer.project(2));
        Ok(())
    }

    #[test]
    #[should_panic(expected = "Empty projection!")]
    fn test_empty_projection_panics() {
        if let Ok(ring) = nested() {
            let _ = ring.project_mask(&[false, false]);
        }
    }

    #[test]
    fn test_rejects_empty_and_mixed_products() {
        assert!(PPRing::try_with(Vec::new()).is_err());
        let other = PRing::Field(PField::with_prime_order(LargeInteger::from(11)));
        assert!(PPRing::try_with(vec![PRing::Field(field()), other]).is_err());
    }

    #[test]
    fn test_lengths() -> Result<(), ArithmError> {
        let ring = nested()?;
        let f = field();
        assert_eq!(ring.byte_length(), 5 + (5 + 2 * f.byte_length()) + f.byte_length());
        assert_eq!(ring.encode_length(), f.encode_length());
        let el = ring.one()?.to_byte_tree()?;
        assert_eq!(el.total_byte_size(), ring.byte_length());
        Ok(())
    }

    #[test]
    fn test_broadcast_and_uniform_operations() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(5);
        let f = field();
        let ring = PPRing::power(&PRing::Field(f.clone()), 3)?;
        let a = ring.random_element(&mut rng, 50)?;
        let b = ring.random_element(&mut rng, 50)?;
        let s = PRingElement::Field(f.random_element(&mut rng, 50));

        let sum = a.add(&PRingElement::Product(b.clone()))?;
        let scaled = a.mul(&s)?;
        for i in 0..3 {
            assert_eq!(sum.project(i), a.project(i).add(&b.project(i))?);
            assert_eq!(scaled.project(i), a.project(i).mul(&s)?);
        }
        assert_eq!(a.add(&PRingElement::Product(a.neg()?))?, ring.zero()?);
        Ok(())
    }

    #[test]
    fn test_element_and_array_decoding() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(6);
        let ring = nested()?;
        let backing = Backing::Memory;

        let el = ring.random_element(&mut rng, 50)?;
        let tree = el.to_byte_tree()?;
        assert_eq!(ring.element_from_reader(&mut tree.reader())?, el);

        let array = ring.random_element_array(&backing, 4, &mut rng, 50)?;
        let tree = array.to_byte_tree()?;
        let decoded = ring.element_array_from_reader(&backing, 4, &mut tree.reader())?;
        assert!(decoded.equals(&array)?);

        let elements = array.elements()?;
        assert_eq!(elements.len(), 4);
        assert_eq!(elements[2], array.get(2)?);
        let rebuilt = ring.element_array_from(&backing, &elements)?;
        assert!(rebuilt.equals(&array)?);
        Ok(())
    }

    #[test]
    fn test_structure_round_trip() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(7);
        let ring = nested()?;
        let tree = ring.to_byte_tree();
        let decoded = PPRing::from_reader(&mut tree.reader(), &Backing::Memory, &mut rng, 40)?;
        assert_eq!(decoded, ring);
        Ok(())
    }
}
