//! # Groups
//!
//! Groups of prime order with an associated ring of exponents. There are two
//! basic groups:
//!
//! * [`ModPGroup`], a subgroup of the multiplicative group modulo a prime.
//! * [`ECPGroup`], the points of an elliptic curve of prime order.
//!
//! and two combinators mirroring those of the rings:
//!
//! * [`PPGroup`], the direct product of groups of the same order, whose ring
//!   is the product of their rings.
//! * [`APGroup`], whose elements are fixed-size arrays of elements of an
//!   underlying group, with the array ring of its ring as exponents.
//!
//! The closed enums [`PGroup`], [`PGroupElement`] and [`PGroupElementArray`]
//! dispatch over the four cases. Mixing elements of groups that neither match
//! nor broadcast panics with `"Distinct groups!"`.

pub mod array_group;
pub mod curves;
pub mod ec;
pub mod modp;
pub mod product;

use std::cmp::Ordering;

use rand::RngCore;

use crate::arithm::array::Backing;
use crate::arithm::exp_tab::{Multiplier, sim_exp_prod};
use crate::arithm::ring::{PField, PRing, PRingElement, PRingElementArray};
use crate::arithm::{LargeInteger, Permutation};
use crate::eio::{ByteTree, ByteTreeReader};
use crate::errors::ArithmError;
use crate::util::ArrayWorker;

pub use array_group::{APGroup, APGroupElement, APGroupElementArray};
pub use ec::{ECPGroup, ECPGroupElement, ECPGroupElementArray};
pub use modp::{ModPEncoding, ModPGroup, ModPGroupElement, ModPGroupElementArray};
pub use product::{PPGroup, PPGroupElement, PPGroupElementArray};

fn distinct_groups() -> ! {
    panic!("Distinct groups!")
}

fn distinct_rings() -> ! {
    panic!("Distinct rings!")
}

/// Group multiplication as a [`Multiplier`] for simultaneous tables.
struct GroupMultiplier {
    one: PGroupElement,
}

impl Multiplier for GroupMultiplier {
    type Elem = PGroupElement;
    type Error = ArithmError;

    fn one(&self) -> PGroupElement {
        self.one.clone()
    }

    fn mul(&self, a: &PGroupElement, b: &PGroupElement) -> Result<PGroupElement, ArithmError> {
        a.mul(b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PGroup {
    ModP(ModPGroup),
    Ec(ECPGroup),
    Product(PPGroup),
    Array(APGroup),
}

impl PGroup {
    /// The ring of exponents.
    pub fn pring(&self) -> PRing {
        match self {
            PGroup::ModP(group) => PRing::Field(group.pfield().clone()),
            PGroup::Ec(group) => PRing::Field(group.pfield().clone()),
            PGroup::Product(group) => PRing::Product(group.pring().clone()),
            PGroup::Array(group) => PRing::Array(group.pring().clone()),
        }
    }

    pub fn pfield(&self) -> PField {
        self.pring().pfield().clone()
    }

    /// Order of every element except the identity.
    pub fn element_order(&self) -> LargeInteger {
        self.pfield().order().clone()
    }

    pub fn byte_length(&self) -> usize {
        match self {
            PGroup::ModP(group) => group.byte_length(),
            PGroup::Ec(group) => group.byte_length(),
            PGroup::Product(group) => group.byte_length(),
            PGroup::Array(group) => group.byte_length(),
        }
    }

    /// Number of bytes [`PGroup::encode_bytes`] stores in one element.
    pub fn encode_length(&self) -> usize {
        match self {
            PGroup::ModP(group) => group.encode_length(),
            PGroup::Ec(group) => group.encode_length(),
            PGroup::Product(group) => group.encode_length(),
            PGroup::Array(group) => group.encode_length(),
        }
    }

    pub fn exp_thread_threshold(&self) -> usize {
        match self {
            PGroup::ModP(group) => group.exp_thread_threshold(),
            PGroup::Ec(group) => group.exp_thread_threshold(),
            PGroup::Product(group) => group.factors()[0].exp_thread_threshold(),
            PGroup::Array(group) => group.inner().exp_thread_threshold(),
        }
    }

    pub fn mul_thread_threshold(&self) -> usize {
        match self {
            PGroup::ModP(group) => group.mul_thread_threshold(),
            PGroup::Ec(group) => group.mul_thread_threshold(),
            PGroup::Product(group) => group.factors()[0].mul_thread_threshold(),
            PGroup::Array(group) => group.inner().mul_thread_threshold(),
        }
    }

    /// Sets the threshold of exponentiation-class work of the group and of
    /// every group it is built from.
    pub fn set_exp_thread_threshold(&self, threshold: usize) {
        match self {
            PGroup::ModP(group) => group.set_exp_thread_threshold(threshold),
            PGroup::Ec(group) => group.set_exp_thread_threshold(threshold),
            PGroup::Product(group) => {
                for factor in group.factors() {
                    factor.set_exp_thread_threshold(threshold);
                }
            }
            PGroup::Array(group) => group.inner().set_exp_thread_threshold(threshold),
        }
    }

    pub fn set_mul_thread_threshold(&self, threshold: usize) {
        match self {
            PGroup::ModP(group) => group.set_mul_thread_threshold(threshold),
            PGroup::Ec(group) => group.set_mul_thread_threshold(threshold),
            PGroup::Product(group) => {
                for factor in group.factors() {
                    factor.set_mul_thread_threshold(threshold);
                }
            }
            PGroup::Array(group) => group.inner().set_mul_thread_threshold(threshold),
        }
    }

    pub fn generator(&self) -> Result<PGroupElement, ArithmError> {
        Ok(match self {
            PGroup::ModP(group) => PGroupElement::ModP(group.generator()),
            PGroup::Ec(group) => PGroupElement::Ec(group.generator()),
            PGroup::Product(group) => PGroupElement::Product(group.generator()?),
            PGroup::Array(group) => PGroupElement::Array(group.generator()?),
        })
    }

    pub fn one(&self) -> Result<PGroupElement, ArithmError> {
        Ok(match self {
            PGroup::ModP(group) => PGroupElement::ModP(group.one()),
            PGroup::Ec(group) => PGroupElement::Ec(group.identity()),
            PGroup::Product(group) => PGroupElement::Product(group.one()?),
            PGroup::Array(group) => PGroupElement::Array(group.one()?),
        })
    }

    pub fn random_element<R: RngCore + ?Sized>(
        &self,
        rng: &mut R,
        stat_dist: usize,
    ) -> Result<PGroupElement, ArithmError> {
        Ok(match self {
            PGroup::ModP(group) => PGroupElement::ModP(group.random_element(rng, stat_dist)),
            PGroup::Ec(group) => PGroupElement::Ec(group.random_element(rng, stat_dist)),
            PGroup::Product(group) => PGroupElement::Product(group.random_element(rng, stat_dist)?),
            PGroup::Array(group) => PGroupElement::Array(group.random_element(rng, stat_dist)?),
        })
    }

    pub fn element_from_reader(&self, reader: &mut ByteTreeReader<'_>) -> Result<PGroupElement, ArithmError> {
        Ok(match self {
            PGroup::ModP(group) => PGroupElement::ModP(group.element_from_reader(reader)?),
            PGroup::Ec(group) => PGroupElement::Ec(group.element_from_reader(reader)?),
            PGroup::Product(group) => PGroupElement::Product(group.element_from_reader(reader)?),
            PGroup::Array(group) => PGroupElement::Array(group.element_from_reader(reader)?),
        })
    }

    /// Encodes at most [`PGroup::encode_length`] bytes of `bytes` in one
    /// element.
    pub fn encode_bytes(&self, bytes: &[u8]) -> Result<PGroupElement, ArithmError> {
        Ok(match self {
            PGroup::ModP(group) => PGroupElement::ModP(group.encode(bytes)?),
            PGroup::Ec(group) => PGroupElement::Ec(group.encode(bytes)?),
            PGroup::Product(group) => PGroupElement::Product(group.encode(bytes)?),
            PGroup::Array(group) => PGroupElement::Array(group.encode(bytes)?),
        })
    }

    /// Encodes `bytes` in consecutive elements, each holding
    /// [`PGroup::encode_length`] bytes except possibly the last. Empty input
    /// gives a single element holding no bytes.
    pub fn encode(&self, bytes: &[u8]) -> Result<Vec<PGroupElement>, ArithmError> {
        let encode_length = self.encode_length();
        if encode_length == 0 {
            return Err(ArithmError::InvalidParameters("Group can not encode data!".to_string()));
        }
        if bytes.is_empty() {
            return Ok(vec![self.encode_bytes(bytes)?]);
        }
        bytes.chunks(encode_length).map(|chunk| self.encode_bytes(chunk)).collect()
    }

    /// Concatenation of the bytes decoded from `elements`.
    pub fn decode(&self, elements: &[PGroupElement]) -> Result<Vec<u8>, ArithmError> {
        let mut res = Vec::with_capacity(elements.len() * self.encode_length());
        for el in elements {
            res.extend(el.decode()?);
        }
        Ok(res)
    }

    /// Decodes a node of at most `max_size` elements.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::Format` if there are more elements or one of
    /// them does not decode.
    pub fn to_elements(
        &self,
        max_size: usize,
        reader: &mut ByteTreeReader<'_>,
    ) -> Result<Vec<PGroupElement>, ArithmError> {
        if reader.is_leaf() {
            return Err(ArithmError::format("Expected a node of elements!"));
        }
        if reader.remaining() > max_size {
            return Err(ArithmError::format("Too many elements!"));
        }
        let mut res = Vec::with_capacity(reader.remaining());
        while reader.remaining() > 0 {
            res.push(self.element_from_reader(&mut reader.next_child()?)?);
        }
        Ok(res)
    }

    /// Node of the encodings of `elements`.
    pub fn elements_to_byte_tree(&self, elements: &[PGroupElement]) -> Result<ByteTree, ArithmError> {
        let children = elements
            .iter()
            .map(PGroupElement::to_byte_tree)
            .collect::<Result<_, _>>()?;
        Ok(ByteTree::node(children))
    }

    fn check_lengths(what: &str, left: usize, right: usize) -> Result<(), ArithmError> {
        if left != right {
            return Err(ArithmError::mismatch(what, left, right));
        }
        Ok(())
    }

    /// Product of `bases[i]^exponents[i]`, one exponentiation at a time.
    pub fn naive_exp_prod(
        &self,
        bases: &[PGroupElement],
        exponents: &[PRingElement],
    ) -> Result<PGroupElement, ArithmError> {
        Self::check_lengths("power product", bases.len(), exponents.len())?;
        let one = self.one()?;
        let parts = ArrayWorker::new(bases.len(), self.exp_thread_threshold()).try_run(|range| {
            let mut part = one.clone();
            for i in range {
                part = part.mul(&bases[i].exp(&exponents[i])?)?;
            }
            Ok::<_, ArithmError>(part)
        })?;
        parts.iter().try_fold(one.clone(), |acc, part| acc.mul(part))
    }

    /// Product of `bases[i]^exponents[i]`. Exponents in the field of the
    /// group go through simultaneous tables of the optimal width, others
    /// are taken one at a time.
    pub fn exp_prod(
        &self,
        bases: &[PGroupElement],
        exponents: &[PRingElement],
    ) -> Result<PGroupElement, ArithmError> {
        Self::check_lengths("power product", bases.len(), exponents.len())?;
        let integers: Option<Vec<LargeInteger>> = exponents
            .iter()
            .map(|e| e.as_field().map(|el| el.value().clone()))
            .collect();
        match integers {
            Some(integers) => {
                let multiplier = GroupMultiplier { one: self.one()? };
                sim_exp_prod(&multiplier, bases, &integers, self.exp_thread_threshold())
            }
            None => self.naive_exp_prod(bases, exponents),
        }
    }

    /// Element-wise products.
    pub fn mul_all(&self, left: &[PGroupElement], right: &[PGroupElement]) -> Result<Vec<PGroupElement>, ArithmError> {
        Self::check_lengths("products", left.len(), right.len())?;
        ArrayWorker::new(left.len(), self.mul_thread_threshold()).try_map(|i| left[i].mul(&right[i]))
    }

    pub fn inv_all(&self, elements: &[PGroupElement]) -> Result<Vec<PGroupElement>, ArithmError> {
        ArrayWorker::new(elements.len(), self.mul_thread_threshold()).try_map(|i| elements[i].inv())
    }

    pub fn div_all(
        &self,
        numerators: &[PGroupElement],
        denominators: &[PGroupElement],
    ) -> Result<Vec<PGroupElement>, ArithmError> {
        Self::check_lengths("quotients", numerators.len(), denominators.len())?;
        ArrayWorker::new(numerators.len(), self.mul_thread_threshold()).try_map(|i| numerators[i].div(&denominators[i]))
    }

    /// Element-wise powers.
    pub fn exp_all(&self, bases: &[PGroupElement], exponents: &[PRingElement]) -> Result<Vec<PGroupElement>, ArithmError> {
        Self::check_lengths("powers", bases.len(), exponents.len())?;
        ArrayWorker::new(bases.len(), self.exp_thread_threshold()).try_map(|i| bases[i].exp(&exponents[i]))
    }

    /// Every base raised to the same exponent.
    pub fn exp_all_scalar(
        &self,
        bases: &[PGroupElement],
        exponent: &PRingElement,
    ) -> Result<Vec<PGroupElement>, ArithmError> {
        ArrayWorker::new(bases.len(), self.exp_thread_threshold()).try_map(|i| bases[i].exp(exponent))
    }

    pub fn prod(&self, elements: &[PGroupElement]) -> Result<PGroupElement, ArithmError> {
        let one = self.one()?;
        let parts = ArrayWorker::new(elements.len(), self.mul_thread_threshold()).try_run(|range| {
            elements[range].iter().try_fold(one.clone(), |acc, el| acc.mul(el))
        })?;
        parts.iter().try_fold(one.clone(), |acc, part| acc.mul(part))
    }

    pub fn element_array_from(
        &self,
        backing: &Backing,
        elements: &[PGroupElement],
    ) -> Result<PGroupElementArray, ArithmError> {
        Ok(match self {
            PGroup::ModP(group) => {
                let elements: Vec<ModPGroupElement> = elements
                    .iter()
                    .map(|el| el.as_modp().cloned().unwrap_or_else(|| distinct_groups()))
                    .collect();
                PGroupElementArray::ModP(group.element_array_from(backing, &elements)?)
            }
            PGroup::Ec(group) => {
                let elements: Vec<ECPGroupElement> = elements
                    .iter()
                    .map(|el| el.as_ec().cloned().unwrap_or_else(|| distinct_groups()))
                    .collect();
                PGroupElementArray::Ec(group.element_array_from(backing, &elements)?)
            }
            PGroup::Product(group) => {
                let elements: Vec<PPGroupElement> = elements
                    .iter()
                    .map(|el| el.as_product().cloned().unwrap_or_else(|| distinct_groups()))
                    .collect();
                PGroupElementArray::Product(group.element_array_from(backing, &elements)?)
            }
            PGroup::Array(group) => {
                let elements: Vec<APGroupElement> = elements
                    .iter()
                    .map(|el| el.as_array().cloned().unwrap_or_else(|| distinct_groups()))
                    .collect();
                PGroupElementArray::Array(group.element_array_from(elements))
            }
        })
    }

    pub fn fill_element_array(
        &self,
        backing: &Backing,
        size: usize,
        element: &PGroupElement,
    ) -> Result<PGroupElementArray, ArithmError> {
        Ok(match (self, element) {
            (PGroup::ModP(group), PGroupElement::ModP(el)) => {
                PGroupElementArray::ModP(group.fill_element_array(backing, size, el)?)
            }
            (PGroup::Ec(group), PGroupElement::Ec(el)) => {
                PGroupElementArray::Ec(group.fill_element_array(backing, size, el)?)
            }
            _ => self.element_array_from(backing, &vec![element.clone(); size])?,
        })
    }

    pub fn random_element_array<R: RngCore + ?Sized>(
        &self,
        backing: &Backing,
        size: usize,
        rng: &mut R,
        stat_dist: usize,
    ) -> Result<PGroupElementArray, ArithmError> {
        Ok(match self {
            PGroup::ModP(group) => {
                PGroupElementArray::ModP(group.random_element_array(backing, size, rng, stat_dist)?)
            }
            PGroup::Ec(group) => PGroupElementArray::Ec(group.random_element_array(backing, size, rng, stat_dist)?),
            PGroup::Product(group) => {
                PGroupElementArray::Product(group.random_element_array(backing, size, rng, stat_dist)?)
            }
            PGroup::Array(group) => PGroupElementArray::Array(group.random_element_array(size, rng, stat_dist)?),
        })
    }

    /// Decodes a node of `size` elements. A `size` of zero accepts any number
    /// of elements.
    pub fn element_array_from_reader(
        &self,
        backing: &Backing,
        size: usize,
        reader: &mut ByteTreeReader<'_>,
    ) -> Result<PGroupElementArray, ArithmError> {
        Ok(match self {
            PGroup::ModP(group) => PGroupElementArray::ModP(group.element_array_from_reader(backing, size, reader)?),
            PGroup::Ec(group) => PGroupElementArray::Ec(group.element_array_from_reader(backing, size, reader)?),
            PGroup::Product(group) => {
                PGroupElementArray::Product(group.element_array_from_reader(backing, size, reader)?)
            }
            PGroup::Array(group) => PGroupElementArray::Array(group.element_array_from_reader(size, reader)?),
        })
    }

    /// Structure of the group without a type tag, see
    /// [`crate::arithm::marshal`] for the tagged form.
    pub fn to_byte_tree(&self) -> ByteTree {
        match self {
            PGroup::ModP(group) => group.to_byte_tree(),
            PGroup::Ec(group) => group.to_byte_tree(),
            PGroup::Product(group) => group.to_byte_tree(),
            PGroup::Array(group) => group.to_byte_tree(),
        }
    }

    pub fn contains(&self, element: &PGroupElement) -> bool {
        element.group() == *self
    }
}

impl From<ModPGroup> for PGroup {
    fn from(group: ModPGroup) -> Self {
        PGroup::ModP(group)
    }
}

impl From<ECPGroup> for PGroup {
    fn from(group: ECPGroup) -> Self {
        PGroup::Ec(group)
    }
}

impl From<PPGroup> for PGroup {
    fn from(group: PPGroup) -> Self {
        PGroup::Product(group)
    }
}

impl From<APGroup> for PGroup {
    fn from(group: APGroup) -> Self {
        PGroup::Array(group)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PGroupElement {
    ModP(ModPGroupElement),
    Ec(ECPGroupElement),
    Product(PPGroupElement),
    Array(APGroupElement),
}

impl PGroupElement {
    pub fn group(&self) -> PGroup {
        match self {
            PGroupElement::ModP(el) => PGroup::ModP(el.group().clone()),
            PGroupElement::Ec(el) => PGroup::Ec(el.group().clone()),
            PGroupElement::Product(el) => PGroup::Product(el.group().clone()),
            PGroupElement::Array(el) => PGroup::Array(el.group().clone()),
        }
    }

    pub fn as_modp(&self) -> Option<&ModPGroupElement> {
        match self {
            PGroupElement::ModP(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_ec(&self) -> Option<&ECPGroupElement> {
        match self {
            PGroupElement::Ec(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_product(&self) -> Option<&PPGroupElement> {
        match self {
            PGroupElement::Product(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&APGroupElement> {
        match self {
            PGroupElement::Array(el) => Some(el),
            _ => None,
        }
    }

    /// Product of the elements. A factor of a foreign group is broadcast
    /// into the components of a product or array element.
    ///
    /// # Panics
    ///
    /// Panics if the factor neither belongs to the group nor broadcasts into
    /// it.
    pub fn mul(&self, other: &PGroupElement) -> Result<PGroupElement, ArithmError> {
        Ok(match (self, other) {
            (PGroupElement::ModP(a), PGroupElement::ModP(b)) => PGroupElement::ModP(a.mul(b)),
            (PGroupElement::Ec(a), PGroupElement::Ec(b)) => PGroupElement::Ec(a.mul(b)),
            (PGroupElement::Product(a), _) => PGroupElement::Product(a.mul(other)?),
            (PGroupElement::Array(a), _) => PGroupElement::Array(a.mul(other)?),
            _ => distinct_groups(),
        })
    }

    pub fn inv(&self) -> Result<PGroupElement, ArithmError> {
        Ok(match self {
            PGroupElement::ModP(el) => PGroupElement::ModP(el.inv()),
            PGroupElement::Ec(el) => PGroupElement::Ec(el.inv()),
            PGroupElement::Product(el) => PGroupElement::Product(el.inv()?),
            PGroupElement::Array(el) => PGroupElement::Array(el.inv()?),
        })
    }

    pub fn div(&self, other: &PGroupElement) -> Result<PGroupElement, ArithmError> {
        self.mul(&other.inv()?)
    }

    /// Power to an element of the ring of the group. Product and array
    /// elements take matching exponents component-wise and broadcast any
    /// other exponent.
    ///
    /// # Panics
    ///
    /// Panics if a basic group is raised to an exponent outside its field.
    pub fn exp(&self, exponent: &PRingElement) -> Result<PGroupElement, ArithmError> {
        Ok(match (self, exponent) {
            (PGroupElement::ModP(el), PRingElement::Field(e)) => PGroupElement::ModP(el.exp(e)),
            (PGroupElement::Ec(el), PRingElement::Field(e)) => PGroupElement::Ec(el.exp(e)),
            (PGroupElement::Product(el), _) => PGroupElement::Product(el.exp(exponent)?),
            (PGroupElement::Array(el), _) => PGroupElement::Array(el.exp(exponent)?),
            _ => distinct_rings(),
        })
    }

    /// This element raised to every exponent of `exponents`. Basic groups use
    /// a fixed-base table.
    pub fn exp_array(&self, exponents: &PRingElementArray) -> Result<PGroupElementArray, ArithmError> {
        Ok(match (self, exponents) {
            (PGroupElement::ModP(el), PRingElementArray::Field(e)) => PGroupElementArray::ModP(el.exp_array(e)?),
            (PGroupElement::Ec(el), PRingElementArray::Field(e)) => PGroupElementArray::Ec(el.exp_array(e)?),
            (PGroupElement::Product(el), _) => PGroupElementArray::Product(el.exp_array(exponents)?),
            (PGroupElement::Array(el), _) => PGroupElementArray::Array(el.exp_array(exponents)?),
            _ => distinct_rings(),
        })
    }

    /// Bytes encoded in the element by [`PGroup::encode_bytes`].
    pub fn decode(&self) -> Result<Vec<u8>, ArithmError> {
        match self {
            PGroupElement::ModP(el) => Ok(el.decode()),
            PGroupElement::Ec(el) => Ok(el.decode()),
            PGroupElement::Product(el) => el.decode(),
            PGroupElement::Array(el) => el.decode(),
        }
    }

    pub fn to_byte_tree(&self) -> Result<ByteTree, ArithmError> {
        match self {
            PGroupElement::ModP(el) => Ok(el.to_byte_tree()),
            PGroupElement::Ec(el) => Ok(el.to_byte_tree()),
            PGroupElement::Product(el) => el.to_byte_tree(),
            PGroupElement::Array(el) => el.to_byte_tree(),
        }
    }

    /// Equality of value, reading array elements from their backing.
    pub fn equals(&self, other: &PGroupElement) -> Result<bool, ArithmError> {
        match (self, other) {
            (PGroupElement::ModP(a), PGroupElement::ModP(b)) => Ok(a == b),
            (PGroupElement::Ec(a), PGroupElement::Ec(b)) => Ok(a == b),
            (PGroupElement::Product(a), PGroupElement::Product(b)) => a.equals(b),
            (PGroupElement::Array(a), PGroupElement::Array(b)) => a.equals(b),
            _ => Ok(false),
        }
    }

    /// A total order on the elements of a group.
    ///
    /// # Panics
    ///
    /// Panics if the elements belong to distinct groups.
    pub fn compare_to(&self, other: &PGroupElement) -> Result<Ordering, ArithmError> {
        match (self, other) {
            (PGroupElement::ModP(a), PGroupElement::ModP(b)) => Ok(a.compare_to(b)),
            (PGroupElement::Ec(a), PGroupElement::Ec(b)) => Ok(a.compare_to(b)),
            (PGroupElement::Product(a), PGroupElement::Product(b)) => a.compare_to(b),
            (PGroupElement::Array(a), PGroupElement::Array(b)) => a.compare_to(b),
            _ => distinct_groups(),
        }
    }
}

impl From<ModPGroupElement> for PGroupElement {
    fn from(el: ModPGroupElement) -> Self {
        PGroupElement::ModP(el)
    }
}

impl From<ECPGroupElement> for PGroupElement {
    fn from(el: ECPGroupElement) -> Self {
        PGroupElement::Ec(el)
    }
}

impl From<PPGroupElement> for PGroupElement {
    fn from(el: PPGroupElement) -> Self {
        PGroupElement::Product(el)
    }
}

impl From<APGroupElement> for PGroupElement {
    fn from(el: APGroupElement) -> Self {
        PGroupElement::Array(el)
    }
}

#[derive(Debug, Clone)]
pub enum PGroupElementArray {
    ModP(ModPGroupElementArray),
    Ec(ECPGroupElementArray),
    Product(PPGroupElementArray),
    Array(APGroupElementArray),
}

impl PGroupElementArray {
    pub fn group(&self) -> PGroup {
        match self {
            PGroupElementArray::ModP(array) => PGroup::ModP(array.group().clone()),
            PGroupElementArray::Ec(array) => PGroup::Ec(array.group().clone()),
            PGroupElementArray::Product(array) => PGroup::Product(array.group().clone()),
            PGroupElementArray::Array(array) => PGroup::Array(array.group().clone()),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            PGroupElementArray::ModP(array) => array.size(),
            PGroupElementArray::Ec(array) => array.size(),
            PGroupElementArray::Product(array) => array.size(),
            PGroupElementArray::Array(array) => array.size(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn as_modp(&self) -> Option<&ModPGroupElementArray> {
        match self {
            PGroupElementArray::ModP(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_product(&self) -> Option<&PPGroupElementArray> {
        match self {
            PGroupElementArray::Product(array) => Some(array),
            _ => None,
        }
    }

    pub fn get(&self, index: usize) -> Result<PGroupElement, ArithmError> {
        Ok(match self {
            PGroupElementArray::ModP(array) => PGroupElement::ModP(array.get(index)?),
            PGroupElementArray::Ec(array) => PGroupElement::Ec(array.get(index)?),
            PGroupElementArray::Product(array) => PGroupElement::Product(array.get(index)?),
            PGroupElementArray::Array(array) => PGroupElement::Array(array.get(index)?),
        })
    }

    pub fn elements(&self) -> Result<Vec<PGroupElement>, ArithmError> {
        Ok(match self {
            PGroupElementArray::ModP(array) => array.elements()?.into_iter().map(PGroupElement::ModP).collect(),
            PGroupElementArray::Ec(array) => array.elements()?.into_iter().map(PGroupElement::Ec).collect(),
            PGroupElementArray::Product(array) => {
                array.elements()?.into_iter().map(PGroupElement::Product).collect()
            }
            PGroupElementArray::Array(array) => array.elements().iter().cloned().map(PGroupElement::Array).collect(),
        })
    }

    /// Element-wise products. Factors of a foreign group are broadcast into
    /// the components of a product array.
    pub fn mul(&self, other: &PGroupElementArray) -> Result<PGroupElementArray, ArithmError> {
        Ok(match (self, other) {
            (PGroupElementArray::ModP(a), PGroupElementArray::ModP(b)) => PGroupElementArray::ModP(a.mul(b)?),
            (PGroupElementArray::Ec(a), PGroupElementArray::Ec(b)) => PGroupElementArray::Ec(a.mul(b)?),
            (PGroupElementArray::Product(a), _) => PGroupElementArray::Product(a.mul(other)?),
            (PGroupElementArray::Array(a), PGroupElementArray::Array(b)) => PGroupElementArray::Array(a.mul(b)?),
            _ => distinct_groups(),
        })
    }

    /// Every element multiplied by `factor`.
    pub fn mul_scalar(&self, factor: &PGroupElement) -> Result<PGroupElementArray, ArithmError> {
        Ok(match (self, factor) {
            (PGroupElementArray::ModP(a), PGroupElement::ModP(b)) => PGroupElementArray::ModP(a.mul_scalar(b)?),
            (PGroupElementArray::Ec(a), PGroupElement::Ec(b)) => PGroupElementArray::Ec(a.mul_scalar(b)?),
            (PGroupElementArray::Product(a), _) => PGroupElementArray::Product(a.mul_scalar(factor)?),
            (PGroupElementArray::Array(a), _) => PGroupElementArray::Array(a.mul_scalar(factor)?),
            _ => distinct_groups(),
        })
    }

    pub fn inv(&self) -> Result<PGroupElementArray, ArithmError> {
        Ok(match self {
            PGroupElementArray::ModP(array) => PGroupElementArray::ModP(array.inv()?),
            PGroupElementArray::Ec(array) => PGroupElementArray::Ec(array.inv()?),
            PGroupElementArray::Product(array) => PGroupElementArray::Product(array.inv()?),
            PGroupElementArray::Array(array) => PGroupElementArray::Array(array.inv()?),
        })
    }

    /// Element-wise powers. Exponent arrays of a foreign ring are broadcast
    /// into the components of a product array.
    pub fn exp(&self, exponents: &PRingElementArray) -> Result<PGroupElementArray, ArithmError> {
        Ok(match (self, exponents) {
            (PGroupElementArray::ModP(a), PRingElementArray::Field(e)) => PGroupElementArray::ModP(a.exp(e)?),
            (PGroupElementArray::Ec(a), PRingElementArray::Field(e)) => PGroupElementArray::Ec(a.exp(e)?),
            (PGroupElementArray::Product(a), _) => PGroupElementArray::Product(a.exp(exponents)?),
            (PGroupElementArray::Array(a), PRingElementArray::Array(e)) => PGroupElementArray::Array(a.exp(e)?),
            _ => distinct_rings(),
        })
    }

    /// Every element raised to `exponent`.
    pub fn exp_scalar(&self, exponent: &PRingElement) -> Result<PGroupElementArray, ArithmError> {
        Ok(match (self, exponent) {
            (PGroupElementArray::ModP(a), PRingElement::Field(e)) => PGroupElementArray::ModP(a.exp_scalar(e)?),
            (PGroupElementArray::Ec(a), PRingElement::Field(e)) => PGroupElementArray::Ec(a.exp_scalar(e)?),
            (PGroupElementArray::Product(a), _) => PGroupElementArray::Product(a.exp_scalar(exponent)?),
            (PGroupElementArray::Array(a), _) => PGroupElementArray::Array(a.exp_scalar(exponent)?),
            _ => distinct_rings(),
        })
    }

    /// Product of the elements raised to the given exponents.
    pub fn exp_prod(&self, exponents: &PRingElementArray) -> Result<PGroupElement, ArithmError> {
        Ok(match (self, exponents) {
            (PGroupElementArray::ModP(a), PRingElementArray::Field(e)) => PGroupElement::ModP(a.exp_prod(e)?),
            (PGroupElementArray::Ec(a), PRingElementArray::Field(e)) => PGroupElement::Ec(a.exp_prod(e)?),
            (PGroupElementArray::Product(a), _) => PGroupElement::Product(a.exp_prod(exponents)?),
            (PGroupElementArray::Array(a), PRingElementArray::Array(e)) => PGroupElement::Array(a.exp_prod(e)?),
            _ => distinct_rings(),
        })
    }

    pub fn prod(&self) -> Result<PGroupElement, ArithmError> {
        Ok(match self {
            PGroupElementArray::ModP(array) => PGroupElement::ModP(array.prod()?),
            PGroupElementArray::Ec(array) => PGroupElement::Ec(array.prod()?),
            PGroupElementArray::Product(array) => PGroupElement::Product(array.prod()?),
            PGroupElementArray::Array(array) => PGroupElement::Array(array.prod()?),
        })
    }

    /// Lexicographic order of the arrays.
    pub fn compare_to(&self, other: &PGroupElementArray) -> Result<Ordering, ArithmError> {
        match (self, other) {
            (PGroupElementArray::ModP(a), PGroupElementArray::ModP(b)) => a.compare_to(b),
            (PGroupElementArray::Ec(a), PGroupElementArray::Ec(b)) => a.compare_to(b),
            (PGroupElementArray::Product(a), PGroupElementArray::Product(b)) => a.compare_to(b),
            (PGroupElementArray::Array(a), PGroupElementArray::Array(b)) => a.compare_to(b),
            _ => distinct_groups(),
        }
    }

    /// Element-wise equality.
    pub fn equals_all(&self, other: &PGroupElementArray) -> Result<Vec<bool>, ArithmError> {
        match (self, other) {
            (PGroupElementArray::ModP(a), PGroupElementArray::ModP(b)) => a.equals_all(b),
            (PGroupElementArray::Ec(a), PGroupElementArray::Ec(b)) => a.equals_all(b),
            (PGroupElementArray::Product(a), PGroupElementArray::Product(b)) => a.equals_all(b),
            (PGroupElementArray::Array(a), PGroupElementArray::Array(b)) => a.equals_all(b),
            _ => distinct_groups(),
        }
    }

    pub fn equals(&self, other: &PGroupElementArray) -> Result<bool, ArithmError> {
        match (self, other) {
            (PGroupElementArray::ModP(a), PGroupElementArray::ModP(b)) => a.equals(b),
            (PGroupElementArray::Ec(a), PGroupElementArray::Ec(b)) => a.equals(b),
            (PGroupElementArray::Product(a), PGroupElementArray::Product(b)) => a.equals(b),
            (PGroupElementArray::Array(a), PGroupElementArray::Array(b)) => a.equals(b),
            _ => Ok(false),
        }
    }

    pub fn permute(&self, permutation: &Permutation) -> Result<PGroupElementArray, ArithmError> {
        Ok(match self {
            PGroupElementArray::ModP(array) => PGroupElementArray::ModP(array.permute(permutation)?),
            PGroupElementArray::Ec(array) => PGroupElementArray::Ec(array.permute(permutation)?),
            PGroupElementArray::Product(array) => PGroupElementArray::Product(array.permute(permutation)?),
            PGroupElementArray::Array(array) => PGroupElementArray::Array(array.permute(permutation)?),
        })
    }

    /// Drops the first element and appends `element`.
    pub fn shift_push(&self, element: &PGroupElement) -> Result<PGroupElementArray, ArithmError> {
        Ok(match (self, element) {
            (PGroupElementArray::ModP(a), PGroupElement::ModP(el)) => PGroupElementArray::ModP(a.shift_push(el)?),
            (PGroupElementArray::Ec(a), PGroupElement::Ec(el)) => PGroupElementArray::Ec(a.shift_push(el)?),
            (PGroupElementArray::Product(a), PGroupElement::Product(el)) => {
                PGroupElementArray::Product(a.shift_push(el)?)
            }
            (PGroupElementArray::Array(a), PGroupElement::Array(el)) => PGroupElementArray::Array(a.shift_push(el)?),
            _ => distinct_groups(),
        })
    }

    pub fn copy_of_range(&self, start: usize, end: usize) -> Result<PGroupElementArray, ArithmError> {
        Ok(match self {
            PGroupElementArray::ModP(array) => PGroupElementArray::ModP(array.copy_of_range(start, end)?),
            PGroupElementArray::Ec(array) => PGroupElementArray::Ec(array.copy_of_range(start, end)?),
            PGroupElementArray::Product(array) => PGroupElementArray::Product(array.copy_of_range(start, end)?),
            PGroupElementArray::Array(array) => PGroupElementArray::Array(array.copy_of_range(start, end)?),
        })
    }

    pub fn extract(&self, mask: &[bool]) -> Result<PGroupElementArray, ArithmError> {
        Ok(match self {
            PGroupElementArray::ModP(array) => PGroupElementArray::ModP(array.extract(mask)?),
            PGroupElementArray::Ec(array) => PGroupElementArray::Ec(array.extract(mask)?),
            PGroupElementArray::Product(array) => PGroupElementArray::Product(array.extract(mask)?),
            PGroupElementArray::Array(array) => PGroupElementArray::Array(array.extract(mask)?),
        })
    }

    pub fn to_byte_tree(&self) -> Result<ByteTree, ArithmError> {
        match self {
            PGroupElementArray::ModP(array) => array.to_byte_tree(),
            PGroupElementArray::Ec(array) => array.to_byte_tree(),
            PGroupElementArray::Product(array) => array.to_byte_tree(),
            PGroupElementArray::Array(array) => array.to_byte_tree(),
        }
    }
}

impl From<ModPGroupElementArray> for PGroupElementArray {
    fn from(array: ModPGroupElementArray) -> Self {
        PGroupElementArray::ModP(array)
    }
}

impl From<ECPGroupElementArray> for PGroupElementArray {
    fn from(array: ECPGroupElementArray) -> Self {
        PGroupElementArray::Ec(array)
    }
}

impl From<PPGroupElementArray> for PGroupElementArray {
    fn from(array: PPGroupElementArray) -> Self {
        PGroupElementArray::Product(array)
    }
}

impl From<APGroupElementArray> for PGroupElementArray {
    fn from(array: APGroupElementArray) -> Self {
        PGroupElementArray::Array(array)
    }
}
