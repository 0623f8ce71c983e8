//! # Rings
//!
//! Every ring is built from a prime order [`PField`] with two combinators:
//!
//! * [`PPRing`], the direct product of a list of rings over the same field.
//!   Operations act component-wise when both operands belong to the product,
//!   and broadcast the other operand into every component otherwise.
//! * [`APRing`], whose elements are fixed-size arrays of elements of an
//!   underlying ring, each array viewed as a single element.
//!
//! The closed enums [`PRing`], [`PRingElement`] and [`PRingElementArray`]
//! dispatch over the three cases. Combining elements of rings that neither
//! match nor broadcast is a programming error and panics with
//! `"Distinct rings!"`.
//!
//! Operations on elements of an [`APRing`] touch arrays that may live on
//! file, so every operation at the level of the enums returns a `Result`.

pub mod array_ring;
pub mod field;
pub mod product;

use rand::RngCore;

use crate::arithm::Permutation;
use crate::arithm::array::Backing;
use crate::eio::{ByteTree, ByteTreeReader};
use crate::errors::ArithmError;

pub use array_ring::{APRing, APRingElement, APRingElementArray};
pub use field::{PField, PFieldElement, PFieldElementArray};
pub use product::{PPRing, PPRingElement, PPRingElementArray};

fn distinct_rings() -> ! {
    panic!("Distinct rings!")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PRing {
    Field(PField),
    Product(PPRing),
    Array(APRing),
}

impl PRing {
    /// The field underlying the ring.
    pub fn pfield(&self) -> &PField {
        match self {
            PRing::Field(field) => field,
            PRing::Product(ring) => ring.pfield(),
            PRing::Array(ring) => ring.pfield(),
        }
    }

    /// Length in bytes of the encoding of every element.
    pub fn byte_length(&self) -> usize {
        match self {
            PRing::Field(field) => field.byte_length(),
            PRing::Product(ring) => ring.byte_length(),
            PRing::Array(ring) => ring.byte_length(),
        }
    }

    pub fn encode_length(&self) -> usize {
        match self {
            PRing::Field(field) => field.encode_length(),
            PRing::Product(ring) => ring.encode_length(),
            PRing::Array(ring) => ring.encode_length(),
        }
    }

    pub fn zero(&self) -> Result<PRingElement, ArithmError> {
        Ok(match self {
            PRing::Field(field) => PRingElement::Field(field.zero()),
            PRing::Product(ring) => PRingElement::Product(ring.zero()?),
            PRing::Array(ring) => PRingElement::Array(ring.zero()?),
        })
    }

    pub fn one(&self) -> Result<PRingElement, ArithmError> {
        Ok(match self {
            PRing::Field(field) => PRingElement::Field(field.one()),
            PRing::Product(ring) => PRingElement::Product(ring.one()?),
            PRing::Array(ring) => PRingElement::Array(ring.one()?),
        })
    }

    pub fn random_element<R: RngCore + ?Sized>(
        &self,
        rng: &mut R,
        stat_dist: usize,
    ) -> Result<PRingElement, ArithmError> {
        Ok(match self {
            PRing::Field(field) => PRingElement::Field(field.random_element(rng, stat_dist)),
            PRing::Product(ring) => PRingElement::Product(ring.random_element(rng, stat_dist)?),
            PRing::Array(ring) => PRingElement::Array(ring.random_element(rng, stat_dist)?),
        })
    }

    pub fn element_from_reader(&self, reader: &mut ByteTreeReader<'_>) -> Result<PRingElement, ArithmError> {
        Ok(match self {
            PRing::Field(field) => PRingElement::Field(field.element_from_reader(reader)?),
            PRing::Product(ring) => PRingElement::Product(ring.element_from_reader(reader)?),
            PRing::Array(ring) => PRingElement::Array(ring.element_from_reader(reader)?),
        })
    }

    pub fn random_element_array<R: RngCore + ?Sized>(
        &self,
        backing: &Backing,
        size: usize,
        rng: &mut R,
        stat_dist: usize,
    ) -> Result<PRingElementArray, ArithmError> {
        Ok(match self {
            PRing::Field(field) => {
                PRingElementArray::Field(field.random_element_array(backing, size, rng, stat_dist)?)
            }
            PRing::Product(ring) => {
                PRingElementArray::Product(ring.random_element_array(backing, size, rng, stat_dist)?)
            }
            PRing::Array(ring) => PRingElementArray::Array(ring.random_element_array(size, rng, stat_dist)?),
        })
    }

    /// Decodes a node of `size` elements. A `size` of zero accepts any number
    /// of elements.
    pub fn element_array_from_reader(
        &self,
        backing: &Backing,
        size: usize,
        reader: &mut ByteTreeReader<'_>,
    ) -> Result<PRingElementArray, ArithmError> {
        Ok(match self {
            PRing::Field(field) => PRingElementArray::Field(field.element_array_from_reader(backing, size, reader)?),
            PRing::Product(ring) => {
                PRingElementArray::Product(ring.element_array_from_reader(backing, size, reader)?)
            }
            PRing::Array(ring) => PRingElementArray::Array(ring.element_array_from_reader(size, reader)?),
        })
    }

    /// Array of the given elements.
    ///
    /// # Panics
    ///
    /// Panics if an element belongs to another ring.
    pub fn element_array_from(
        &self,
        backing: &Backing,
        elements: &[PRingElement],
    ) -> Result<PRingElementArray, ArithmError> {
        Ok(match self {
            PRing::Field(field) => {
                let elements: Vec<PFieldElement> = elements
                    .iter()
                    .map(|el| el.as_field().cloned().unwrap_or_else(|| distinct_rings()))
                    .collect();
                PRingElementArray::Field(field.element_array_from(backing, &elements)?)
            }
            PRing::Product(ring) => {
                let elements: Vec<PPRingElement> = elements
                    .iter()
                    .map(|el| el.as_product().cloned().unwrap_or_else(|| distinct_rings()))
                    .collect();
                PRingElementArray::Product(ring.element_array_from(backing, &elements)?)
            }
            PRing::Array(ring) => {
                let elements: Vec<APRingElement> = elements
                    .iter()
                    .map(|el| el.as_array().cloned().unwrap_or_else(|| distinct_rings()))
                    .collect();
                PRingElementArray::Array(ring.element_array_from(elements))
            }
        })
    }

    /// Array of `size` copies of `element`.
    pub fn fill_element_array(
        &self,
        backing: &Backing,
        size: usize,
        element: &PRingElement,
    ) -> Result<PRingElementArray, ArithmError> {
        self.element_array_from(backing, &vec![element.clone(); size])
    }

    /// Structure of the ring without a type tag, see
    /// [`crate::arithm::marshal`] for the tagged form.
    pub fn to_byte_tree(&self) -> ByteTree {
        match self {
            PRing::Field(field) => field.to_byte_tree(),
            PRing::Product(ring) => ring.to_byte_tree(),
            PRing::Array(ring) => ring.to_byte_tree(),
        }
    }

    pub fn contains(&self, element: &PRingElement) -> bool {
        element.ring() == *self
    }
}

impl From<PField> for PRing {
    fn from(field: PField) -> Self {
        PRing::Field(field)
    }
}

impl From<PPRing> for PRing {
    fn from(ring: PPRing) -> Self {
        PRing::Product(ring)
    }
}

impl From<APRing> for PRing {
    fn from(ring: APRing) -> Self {
        PRing::Array(ring)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PRingElement {
    Field(PFieldElement),
    Product(PPRingElement),
    Array(APRingElement),
}

impl PRingElement {
    pub fn ring(&self) -> PRing {
        match self {
            PRingElement::Field(el) => PRing::Field(el.field().clone()),
            PRingElement::Product(el) => PRing::Product(el.ring().clone()),
            PRingElement::Array(el) => PRing::Array(el.ring().clone()),
        }
    }

    pub fn as_field(&self) -> Option<&PFieldElement> {
        match self {
            PRingElement::Field(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_product(&self) -> Option<&PPRingElement> {
        match self {
            PRingElement::Product(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&APRingElement> {
        match self {
            PRingElement::Array(el) => Some(el),
            _ => None,
        }
    }

    /// Sum of the elements. A term of a foreign ring is broadcast into the
    /// components of a product element.
    ///
    /// # Panics
    ///
    /// Panics if the term neither belongs to the ring nor broadcasts into it.
    pub fn add(&self, other: &PRingElement) -> Result<PRingElement, ArithmError> {
        Ok(match (self, other) {
            (PRingElement::Field(a), PRingElement::Field(b)) => PRingElement::Field(a.add(b)),
            (PRingElement::Product(a), _) => PRingElement::Product(a.add(other)?),
            (PRingElement::Array(a), PRingElement::Array(b)) => PRingElement::Array(a.add(b)?),
            _ => distinct_rings(),
        })
    }

    pub fn sub(&self, other: &PRingElement) -> Result<PRingElement, ArithmError> {
        self.add(&other.neg()?)
    }

    pub fn neg(&self) -> Result<PRingElement, ArithmError> {
        Ok(match self {
            PRingElement::Field(el) => PRingElement::Field(el.neg()),
            PRingElement::Product(el) => PRingElement::Product(el.neg()?),
            PRingElement::Array(el) => PRingElement::Array(el.neg()?),
        })
    }

    /// Product of the elements. A factor of a foreign ring is broadcast into
    /// the components of a product or array element.
    ///
    /// # Panics
    ///
    /// Panics if the factor neither belongs to the ring nor broadcasts into
    /// it.
    pub fn mul(&self, other: &PRingElement) -> Result<PRingElement, ArithmError> {
        Ok(match (self, other) {
            (PRingElement::Field(a), PRingElement::Field(b)) => PRingElement::Field(a.mul(b)),
            (PRingElement::Product(a), _) => PRingElement::Product(a.mul(other)?),
            (PRingElement::Array(a), _) => PRingElement::Array(a.mul(other)?),
            _ => distinct_rings(),
        })
    }

    /// # Errors
    ///
    /// Returns `ArithmError::NoInverse` if some component is zero.
    pub fn inv(&self) -> Result<PRingElement, ArithmError> {
        Ok(match self {
            PRingElement::Field(el) => PRingElement::Field(el.inv()?),
            PRingElement::Product(el) => PRingElement::Product(el.inv()?),
            PRingElement::Array(el) => PRingElement::Array(el.inv()?),
        })
    }

    /// `self * scalar + term`.
    pub fn mul_add(&self, scalar: &PRingElement, term: &PRingElement) -> Result<PRingElement, ArithmError> {
        self.mul(scalar)?.add(term)
    }

    pub fn to_byte_tree(&self) -> Result<ByteTree, ArithmError> {
        match self {
            PRingElement::Field(el) => Ok(el.to_byte_tree()),
            PRingElement::Product(el) => el.to_byte_tree(),
            PRingElement::Array(el) => el.to_byte_tree(),
        }
    }

    /// Equality of value, reading array elements from their backing.
    pub fn equals(&self, other: &PRingElement) -> Result<bool, ArithmError> {
        match (self, other) {
            (PRingElement::Field(a), PRingElement::Field(b)) => Ok(a == b),
            (PRingElement::Product(a), PRingElement::Product(b)) => a.equals(b),
            (PRingElement::Array(a), PRingElement::Array(b)) => a.equals(b),
            _ => Ok(false),
        }
    }
}

impl From<PFieldElement> for PRingElement {
    fn from(el: PFieldElement) -> Self {
        PRingElement::Field(el)
    }
}

impl From<PPRingElement> for PRingElement {
    fn from(el: PPRingElement) -> Self {
        PRingElement::Product(el)
    }
}

impl From<APRingElement> for PRingElement {
    fn from(el: APRingElement) -> Self {
        PRingElement::Array(el)
    }
}

#[derive(Debug, Clone)]
pub enum PRingElementArray {
    Field(PFieldElementArray),
    Product(PPRingElementArray),
    Array(APRingElementArray),
}

impl PRingElementArray {
    pub fn ring(&self) -> PRing {
        match self {
            PRingElementArray::Field(array) => PRing::Field(array.field().clone()),
            PRingElementArray::Product(array) => PRing::Product(array.ring().clone()),
            PRingElementArray::Array(array) => PRing::Array(array.ring().clone()),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            PRingElementArray::Field(array) => array.size(),
            PRingElementArray::Product(array) => array.size(),
            PRingElementArray::Array(array) => array.size(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn as_field(&self) -> Option<&PFieldElementArray> {
        match self {
            PRingElementArray::Field(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_product(&self) -> Option<&PPRingElementArray> {
        match self {
            PRingElementArray::Product(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&APRingElementArray> {
        match self {
            PRingElementArray::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn get(&self, index: usize) -> Result<PRingElement, ArithmError> {
        Ok(match self {
            PRingElementArray::Field(array) => PRingElement::Field(array.get(index)?),
            PRingElementArray::Product(array) => PRingElement::Product(array.get(index)?),
            PRingElementArray::Array(array) => PRingElement::Array(array.get(index)?),
        })
    }

    pub fn elements(&self) -> Result<Vec<PRingElement>, ArithmError> {
        Ok(match self {
            PRingElementArray::Field(array) => array.elements()?.into_iter().map(PRingElement::Field).collect(),
            PRingElementArray::Product(array) => {
                array.elements()?.into_iter().map(PRingElement::Product).collect()
            }
            PRingElementArray::Array(array) => array.elements().iter().cloned().map(PRingElement::Array).collect(),
        })
    }

    /// Element-wise sums. Terms of a foreign ring are broadcast into the
    /// components of a product array.
    pub fn add(&self, terms: &PRingElementArray) -> Result<PRingElementArray, ArithmError> {
        Ok(match (self, terms) {
            (PRingElementArray::Field(a), PRingElementArray::Field(b)) => PRingElementArray::Field(a.add(b)?),
            (PRingElementArray::Product(a), _) => PRingElementArray::Product(a.add(terms)?),
            (PRingElementArray::Array(a), PRingElementArray::Array(b)) => PRingElementArray::Array(a.add(b)?),
            _ => distinct_rings(),
        })
    }

    pub fn neg(&self) -> Result<PRingElementArray, ArithmError> {
        Ok(match self {
            PRingElementArray::Field(array) => PRingElementArray::Field(array.neg()?),
            PRingElementArray::Product(array) => PRingElementArray::Product(array.neg()?),
            PRingElementArray::Array(array) => PRingElementArray::Array(array.neg()?),
        })
    }

    /// Element-wise products. Factors of a foreign ring are broadcast into
    /// the components of a product array.
    pub fn mul(&self, factors: &PRingElementArray) -> Result<PRingElementArray, ArithmError> {
        Ok(match (self, factors) {
            (PRingElementArray::Field(a), PRingElementArray::Field(b)) => PRingElementArray::Field(a.mul(b)?),
            (PRingElementArray::Product(a), _) => PRingElementArray::Product(a.mul(factors)?),
            (PRingElementArray::Array(a), PRingElementArray::Array(b)) => PRingElementArray::Array(a.mul(b)?),
            _ => distinct_rings(),
        })
    }

    /// Every element multiplied by `factor`.
    pub fn mul_scalar(&self, factor: &PRingElement) -> Result<PRingElementArray, ArithmError> {
        Ok(match (self, factor) {
            (PRingElementArray::Field(a), PRingElement::Field(b)) => PRingElementArray::Field(a.mul_scalar(b)?),
            (PRingElementArray::Product(a), _) => PRingElementArray::Product(a.mul_scalar(factor)?),
            (PRingElementArray::Array(a), _) => PRingElementArray::Array(a.mul_scalar(factor)?),
            _ => distinct_rings(),
        })
    }

    pub fn inv(&self) -> Result<PRingElementArray, ArithmError> {
        Ok(match self {
            PRingElementArray::Field(array) => PRingElementArray::Field(array.inv()?),
            PRingElementArray::Product(array) => PRingElementArray::Product(array.inv()?),
            PRingElementArray::Array(array) => PRingElementArray::Array(array.inv()?),
        })
    }

    /// `self * scalar + terms`, element-wise.
    pub fn mul_add(&self, scalar: &PRingElement, terms: &PRingElementArray) -> Result<PRingElementArray, ArithmError> {
        self.mul_scalar(scalar)?.add(terms)
    }

    /// `self * scalars + terms`, element-wise.
    pub fn mul_add_all(
        &self,
        scalars: &PRingElementArray,
        terms: &PRingElementArray,
    ) -> Result<PRingElementArray, ArithmError> {
        self.mul(scalars)?.add(terms)
    }

    pub fn inner_product(&self, other: &PRingElementArray) -> Result<PRingElement, ArithmError> {
        Ok(match (self, other) {
            (PRingElementArray::Field(a), PRingElementArray::Field(b)) => PRingElement::Field(a.inner_product(b)?),
            (PRingElementArray::Product(a), _) => PRingElement::Product(a.inner_product(other)?),
            (PRingElementArray::Array(a), PRingElementArray::Array(b)) => PRingElement::Array(a.inner_product(b)?),
            _ => distinct_rings(),
        })
    }

    pub fn sum(&self) -> Result<PRingElement, ArithmError> {
        Ok(match self {
            PRingElementArray::Field(array) => PRingElement::Field(array.sum()?),
            PRingElementArray::Product(array) => PRingElement::Product(array.sum()?),
            PRingElementArray::Array(array) => PRingElement::Array(array.sum()?),
        })
    }

    pub fn prod(&self) -> Result<PRingElement, ArithmError> {
        Ok(match self {
            PRingElementArray::Field(array) => PRingElement::Field(array.prod()?),
            PRingElementArray::Product(array) => PRingElement::Product(array.prod()?),
            PRingElementArray::Array(array) => PRingElement::Array(array.prod()?),
        })
    }

    /// Running products.
    pub fn prods(&self) -> Result<PRingElementArray, ArithmError> {
        Ok(match self {
            PRingElementArray::Field(array) => PRingElementArray::Field(array.prods()?),
            PRingElementArray::Product(array) => PRingElementArray::Product(array.prods()?),
            PRingElementArray::Array(array) => PRingElementArray::Array(array.prods()?),
        })
    }

    /// Linear recurrence `out[0] = self[0]`,
    /// `out[i] = out[i - 1] * scalars[i] + self[i]` over field scalars, and
    /// its last element.
    pub fn rec_lin(&self, scalars: &PFieldElementArray) -> Result<(PRingElementArray, PRingElement), ArithmError> {
        Ok(match self {
            PRingElementArray::Field(array) => {
                let (res, last) = array.rec_lin(scalars)?;
                (PRingElementArray::Field(res), PRingElement::Field(last))
            }
            PRingElementArray::Product(array) => {
                let (res, last) = array.rec_lin(scalars)?;
                (PRingElementArray::Product(res), PRingElement::Product(last))
            }
            PRingElementArray::Array(array) => {
                let (res, last) = array.rec_lin(scalars)?;
                (PRingElementArray::Array(res), PRingElement::Array(last))
            }
        })
    }

    pub fn permute(&self, permutation: &Permutation) -> Result<PRingElementArray, ArithmError> {
        Ok(match self {
            PRingElementArray::Field(array) => PRingElementArray::Field(array.permute(permutation)?),
            PRingElementArray::Product(array) => PRingElementArray::Product(array.permute(permutation)?),
            PRingElementArray::Array(array) => PRingElementArray::Array(array.permute(permutation)?),
        })
    }

    pub fn copy_of_range(&self, start: usize, end: usize) -> Result<PRingElementArray, ArithmError> {
        Ok(match self {
            PRingElementArray::Field(array) => PRingElementArray::Field(array.copy_of_range(start, end)?),
            PRingElementArray::Product(array) => PRingElementArray::Product(array.copy_of_range(start, end)?),
            PRingElementArray::Array(array) => PRingElementArray::Array(array.copy_of_range(start, end)?),
        })
    }

    pub fn extract(&self, mask: &[bool]) -> Result<PRingElementArray, ArithmError> {
        Ok(match self {
            PRingElementArray::Field(array) => PRingElementArray::Field(array.extract(mask)?),
            PRingElementArray::Product(array) => PRingElementArray::Product(array.extract(mask)?),
            PRingElementArray::Array(array) => PRingElementArray::Array(array.extract(mask)?),
        })
    }

    pub fn to_byte_tree(&self) -> Result<ByteTree, ArithmError> {
        match self {
            PRingElementArray::Field(array) => array.to_byte_tree(),
            PRingElementArray::Product(array) => array.to_byte_tree(),
            PRingElementArray::Array(array) => array.to_byte_tree(),
        }
    }

    pub fn equals(&self, other: &PRingElementArray) -> Result<bool, ArithmError> {
        match (self, other) {
            (PRingElementArray::Field(a), PRingElementArray::Field(b)) => a.equals(b),
            (PRingElementArray::Product(a), PRingElementArray::Product(b)) => a.equals(b),
            (PRingElementArray::Array(a), PRingElementArray::Array(b)) => a.equals(b),
            _ => Ok(false),
        }
    }
}

impl From<PFieldElementArray> for PRingElementArray {
    fn from(array: PFieldElementArray) -> Self {
        PRingElementArray::Field(array)
    }
}

impl From<PPRingElementArray> for PRingElementArray {
    fn from(array: PPRingElementArray) -> Self {
        PRingElementArray::Product(array)
    }
}

impl From<APRingElementArray> for PRingElementArray {
    fn from(array: APRingElementArray) -> Self {
        PRingElementArray::Array(array)
    }
}
