//! Direct products of groups.

use std::cmp::Ordering;
use std::sync::Arc;

use rand::RngCore;

use crate::arithm::Permutation;
use crate::arithm::array::Backing;
use crate::arithm::marshal;
use crate::arithm::ring::{PField, PPRing, PRingElement, PRingElementArray};
use crate::eio::{ByteTree, ByteTreeReader};
use crate::errors::ArithmError;

use super::{PGroup, PGroupElement, PGroupElementArray, distinct_groups};

#[derive(Debug)]
struct ProductParams {
    groups: Vec<PGroup>,
    pring: PPRing,
    byte_length: usize,
    encode_length: usize,
}

/// Direct product of groups of a common order. The ring of exponents is the
/// product of the rings of the factors.
#[derive(Debug, Clone)]
pub struct PPGroup(Arc<ProductParams>);

impl PPGroup {
    /// # Errors
    ///
    /// Returns `ArithmError::InvalidParameters` if `groups` is empty or if
    /// the groups have distinct orders.
    pub fn try_with(groups: Vec<PGroup>) -> Result<Self, ArithmError> {
        let Some(first) = groups.first() else {
            return Err(ArithmError::InvalidParameters("Empty product!".to_string()));
        };
        let order = first.element_order();
        if groups.iter().any(|group| group.element_order() != order) {
            return Err(ArithmError::InvalidParameters(
                "Groups of different orders!".to_string(),
            ));
        }
        let pring = PPRing::try_with(groups.iter().map(PGroup::pring).collect())?;
        let byte_length = 5 + groups.iter().map(PGroup::byte_length).sum::<usize>();
        let encode_length = groups.iter().map(PGroup::encode_length).sum();
        Ok(PPGroup(Arc::new(ProductParams {
            groups,
            pring,
            byte_length,
            encode_length,
        })))
    }

    /// Product of `width` copies of `group`.
    pub fn power(group: &PGroup, width: usize) -> Result<Self, ArithmError> {
        Self::try_with(vec![group.clone(); width])
    }

    /// Decodes the structure written by [`PPGroup::to_byte_tree`].
    pub fn from_reader<R: RngCore + ?Sized>(
        reader: &mut ByteTreeReader<'_>,
        backing: &Backing,
        rng: &mut R,
        certainty: usize,
    ) -> Result<Self, ArithmError> {
        if reader.is_leaf() || reader.remaining() != 2 {
            return Err(ArithmError::format("Malformed PPGroup!"));
        }
        let mut basics_reader = reader.next_child()?;
        if basics_reader.is_leaf() || basics_reader.remaining() == 0 {
            return Err(ArithmError::format("Missing basic groups!"));
        }
        let mut basics = Vec::with_capacity(basics_reader.remaining());
        while basics_reader.remaining() > 0 {
            basics.push(marshal::unmarshal_pgroup(
                &mut basics_reader.next_child()?,
                backing,
                rng,
                certainty,
            )?);
        }
        let mut touched = vec![false; basics.len()];
        let group = Self::from_structure(&mut reader.next_child()?, &basics, &mut touched)?;
        if touched.iter().any(|&t| !t) {
            return Err(ArithmError::format("Untouched basic group!"));
        }
        Ok(group)
    }

    fn from_structure(
        reader: &mut ByteTreeReader<'_>,
        basics: &[PGroup],
        touched: &mut [bool],
    ) -> Result<Self, ArithmError> {
        if reader.is_leaf() || reader.remaining() == 0 {
            return Err(ArithmError::format("Malformed PPGroup structure!"));
        }
        let mut groups = Vec::with_capacity(reader.remaining());
        while reader.remaining() > 0 {
            let mut child = reader.next_child()?;
            if child.is_leaf() {
                let index = usize::try_from(child.read_int()?)
                    .ok()
                    .filter(|&i| i < basics.len())
                    .ok_or_else(|| ArithmError::format("Invalid index!"))?;
                touched[index] = true;
                groups.push(basics[index].clone());
            } else {
                groups.push(PGroup::Product(Self::from_structure(&mut child, basics, touched)?));
            }
        }
        Self::try_with(groups)
    }

    pub fn width(&self) -> usize {
        self.0.groups.len()
    }

    pub fn factors(&self) -> &[PGroup] {
        &self.0.groups
    }

    pub fn pring(&self) -> &PPRing {
        &self.0.pring
    }

    pub fn pfield(&self) -> &PField {
        self.0.pring.pfield()
    }

    pub fn byte_length(&self) -> usize {
        self.0.byte_length
    }

    /// Sum of the encode lengths of the factors.
    pub fn encode_length(&self) -> usize {
        self.0.encode_length
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn project(&self, index: usize) -> PGroup {
        self.0.groups[index].clone()
    }

    /// The product of the factors selected by `mask`, or the factor itself
    /// if exactly one is selected.
    ///
    /// # Panics
    ///
    /// Panics if `mask` has the wrong length or selects nothing.
    pub fn project_mask(&self, mask: &[bool]) -> PGroup {
        assert_eq!(mask.len(), self.width(), "Wrong mask length!");
        let mut selected: Vec<PGroup> = self
            .0
            .groups
            .iter()
            .zip(mask)
            .filter(|&(_, &keep)| keep)
            .map(|(group, _)| group.clone())
            .collect();
        match selected.len() {
            0 => panic!("Empty projection!"),
            1 => selected.remove(0),
            _ => match PPGroup::try_with(selected) {
                Ok(group) => PGroup::Product(group),
                Err(_) => unreachable!("factors of a product share their order"),
            },
        }
    }

    /// The element with the given components.
    ///
    /// # Panics
    ///
    /// Panics if the components do not belong to the factors.
    pub fn product(&self, elements: Vec<PGroupElement>) -> PPGroupElement {
        assert_eq!(elements.len(), self.width(), "Wrong number of components!");
        for (group, el) in self.0.groups.iter().zip(&elements) {
            if !group.contains(el) {
                distinct_groups();
            }
        }
        PPGroupElement {
            group: self.clone(),
            values: elements,
        }
    }

    /// The element with `element` in every component.
    pub fn product_of(&self, element: &PGroupElement) -> PPGroupElement {
        self.product(vec![element.clone(); self.width()])
    }

    /// # Errors
    ///
    /// Returns `ArithmError::DimensionMismatch` if the arrays have different
    /// sizes.
    pub fn product_array(&self, arrays: Vec<PGroupElementArray>) -> Result<PPGroupElementArray, ArithmError> {
        assert_eq!(arrays.len(), self.width(), "Wrong number of components!");
        for (group, array) in self.0.groups.iter().zip(&arrays) {
            if array.group() != *group {
                distinct_groups();
            }
            if array.size() != arrays[0].size() {
                return Err(ArithmError::mismatch("product array", arrays[0].size(), array.size()));
            }
        }
        Ok(PPGroupElementArray {
            group: self.clone(),
            values: arrays,
        })
    }

    fn map_factors<T, F>(&self, f: F) -> Result<Vec<T>, ArithmError>
    where
        F: FnMut(&PGroup) -> Result<T, ArithmError>,
    {
        self.0.groups.iter().map(f).collect()
    }

    pub fn generator(&self) -> Result<PPGroupElement, ArithmError> {
        let values = self.map_factors(PGroup::generator)?;
        Ok(self.product(values))
    }

    pub fn one(&self) -> Result<PPGroupElement, ArithmError> {
        let values = self.map_factors(PGroup::one)?;
        Ok(self.product(values))
    }

    pub fn random_element<R: RngCore + ?Sized>(
        &self,
        rng: &mut R,
        stat_dist: usize,
    ) -> Result<PPGroupElement, ArithmError> {
        let values = self.map_factors(|group| group.random_element(rng, stat_dist))?;
        Ok(self.product(values))
    }

    pub fn element_from_reader(&self, reader: &mut ByteTreeReader<'_>) -> Result<PPGroupElement, ArithmError> {
        if reader.is_leaf() || reader.remaining() != self.width() {
            return Err(ArithmError::format("Wrong number of components!"));
        }
        let values = self.map_factors(|group| group.element_from_reader(&mut reader.next_child()?))?;
        Ok(self.product(values))
    }

    /// Spreads `bytes` over the factors in order, each taking up to its own
    /// encode length.
    pub fn encode(&self, bytes: &[u8]) -> Result<PPGroupElement, ArithmError> {
        let mut rest = &bytes[..bytes.len().min(self.encode_length())];
        let values = self.map_factors(|group| {
            let (head, tail) = rest.split_at(rest.len().min(group.encode_length()));
            rest = tail;
            group.encode_bytes(head)
        })?;
        Ok(self.product(values))
    }

    pub fn random_element_array<R: RngCore + ?Sized>(
        &self,
        backing: &Backing,
        size: usize,
        rng: &mut R,
        stat_dist: usize,
    ) -> Result<PPGroupElementArray, ArithmError> {
        let arrays = self.map_factors(|group| group.random_element_array(backing, size, rng, stat_dist))?;
        self.product_array(arrays)
    }

    /// Decodes a node with one array per factor, each of `size` elements.
    pub fn element_array_from_reader(
        &self,
        backing: &Backing,
        size: usize,
        reader: &mut ByteTreeReader<'_>,
    ) -> Result<PPGroupElementArray, ArithmError> {
        if reader.is_leaf() || reader.remaining() != self.width() {
            return Err(ArithmError::format("Wrong number of groups!"));
        }
        let arrays =
            self.map_factors(|group| group.element_array_from_reader(backing, size, &mut reader.next_child()?))?;
        self.product_array(arrays)
    }

    /// Splits the elements into one array per factor.
    pub fn element_array_from(
        &self,
        backing: &Backing,
        elements: &[PPGroupElement],
    ) -> Result<PPGroupElementArray, ArithmError> {
        let mut columns: Vec<Vec<PGroupElement>> = vec![Vec::with_capacity(elements.len()); self.width()];
        for el in elements {
            if el.group != *self {
                distinct_groups();
            }
            for (column, value) in columns.iter_mut().zip(&el.values) {
                column.push(value.clone());
            }
        }
        let arrays = self
            .0
            .groups
            .iter()
            .zip(&columns)
            .map(|(group, column)| group.element_array_from(backing, column))
            .collect::<Result<Vec<_>, _>>()?;
        self.product_array(arrays)
    }

    fn collect_basics(&self, basics: &mut Vec<PGroup>) {
        for group in &self.0.groups {
            match group {
                PGroup::Product(product) => product.collect_basics(basics),
                _ => {
                    if !basics.contains(group) {
                        basics.push(group.clone());
                    }
                }
            }
        }
    }

    fn structure(&self, basics: &[PGroup]) -> ByteTree {
        ByteTree::node(
            self.0
                .groups
                .iter()
                .map(|group| match group {
                    PGroup::Product(product) => product.structure(basics),
                    _ => {
                        let index = basics.iter().position(|basic| basic == group).unwrap_or_default();
                        ByteTree::from_int(index as i32)
                    }
                })
                .collect(),
        )
    }

    /// `Node(basics, structure)`, where `basics` holds the marshalled
    /// distinct non-product groups and the structure refers to them by
    /// index, with a node for every nested product.
    pub fn to_byte_tree(&self) -> ByteTree {
        let mut basics = Vec::new();
        self.collect_basics(&mut basics);
        ByteTree::node(vec![
            ByteTree::node(basics.iter().map(marshal::marshal_pgroup).collect()),
            self.structure(&basics),
        ])
    }
}

impl PartialEq for PPGroup {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.groups == other.0.groups
    }
}

impl Eq for PPGroup {}

#[derive(Debug, Clone)]
pub struct PPGroupElement {
    group: PPGroup,
    values: Vec<PGroupElement>,
}

impl PPGroupElement {
    pub fn group(&self) -> &PPGroup {
        &self.group
    }

    pub fn factors(&self) -> &[PGroupElement] {
        &self.values
    }

    pub fn project(&self, index: usize) -> PGroupElement {
        self.values[index].clone()
    }

    /// The components selected by `mask`, in the group
    /// [`PPGroup::project_mask`].
    pub fn project_mask(&self, mask: &[bool]) -> PGroupElement {
        let group = self.group.project_mask(mask);
        let mut selected: Vec<PGroupElement> = self
            .values
            .iter()
            .zip(mask)
            .filter(|&(_, &keep)| keep)
            .map(|(el, _)| el.clone())
            .collect();
        match group {
            PGroup::Product(product) => PGroupElement::Product(PPGroupElement {
                group: product,
                values: selected,
            }),
            _ => selected.remove(0),
        }
    }

    fn with(&self, values: Vec<PGroupElement>) -> PPGroupElement {
        PPGroupElement {
            group: self.group.clone(),
            values,
        }
    }

    fn map<F>(&self, f: F) -> Result<PPGroupElement, ArithmError>
    where
        F: FnMut(&PGroupElement) -> Result<PGroupElement, ArithmError>,
    {
        let values = self.values.iter().map(f).collect::<Result<_, _>>()?;
        Ok(self.with(values))
    }

    /// Component-wise product with an element of this group, or the product
    /// of every component with `other`.
    pub fn mul(&self, other: &PGroupElement) -> Result<PPGroupElement, ArithmError> {
        match other {
            PGroupElement::Product(el) if el.group == self.group => {
                let values = self
                    .values
                    .iter()
                    .zip(&el.values)
                    .map(|(a, b)| a.mul(b))
                    .collect::<Result<_, _>>()?;
                Ok(self.with(values))
            }
            _ => self.map(|el| el.mul(other)),
        }
    }

    pub fn inv(&self) -> Result<PPGroupElement, ArithmError> {
        self.map(PGroupElement::inv)
    }

    /// Component-wise power to an element of the product ring, or every
    /// component raised to `exponent`.
    pub fn exp(&self, exponent: &PRingElement) -> Result<PPGroupElement, ArithmError> {
        match exponent {
            PRingElement::Product(e) if e.ring() == self.group.pring() => {
                let values = self
                    .values
                    .iter()
                    .zip(e.factors())
                    .map(|(a, b)| a.exp(b))
                    .collect::<Result<_, _>>()?;
                Ok(self.with(values))
            }
            _ => self.map(|el| el.exp(exponent)),
        }
    }

    pub fn exp_array(&self, exponents: &PRingElementArray) -> Result<PPGroupElementArray, ArithmError> {
        let values = match exponents {
            PRingElementArray::Product(e) if e.ring() == self.group.pring() => self
                .values
                .iter()
                .zip(e.factors())
                .map(|(a, b)| a.exp_array(b))
                .collect::<Result<_, _>>()?,
            _ => self
                .values
                .iter()
                .map(|el| el.exp_array(exponents))
                .collect::<Result<_, _>>()?,
        };
        Ok(PPGroupElementArray {
            group: self.group.clone(),
            values,
        })
    }

    /// Concatenation of the bytes decoded from the components.
    pub fn decode(&self) -> Result<Vec<u8>, ArithmError> {
        let mut res = Vec::new();
        for el in &self.values {
            res.extend(el.decode()?);
        }
        Ok(res)
    }

    pub fn to_byte_tree(&self) -> Result<ByteTree, ArithmError> {
        let children = self
            .values
            .iter()
            .map(PGroupElement::to_byte_tree)
            .collect::<Result<_, _>>()?;
        Ok(ByteTree::node(children))
    }

    pub fn equals(&self, other: &PPGroupElement) -> Result<bool, ArithmError> {
        if self.group != other.group {
            return Ok(false);
        }
        for (a, b) in self.values.iter().zip(&other.values) {
            if !a.equals(b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Lexicographic order of the components.
    pub fn compare_to(&self, other: &PPGroupElement) -> Result<Ordering, ArithmError> {
        if self.group != other.group {
            distinct_groups();
        }
        for (a, b) in self.values.iter().zip(&other.values) {
            match a.compare_to(b)? {
                Ordering::Equal => {}
                ordering => return Ok(ordering),
            }
        }
        Ok(Ordering::Equal)
    }
}

impl PartialEq for PPGroupElement {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.equals(other), Ok(true))
    }
}

/// An array of product elements, held as one array per factor.
#[derive(Debug, Clone)]
pub struct PPGroupElementArray {
    group: PPGroup,
    values: Vec<PGroupElementArray>,
}

impl PPGroupElementArray {
    pub fn group(&self) -> &PPGroup {
        &self.group
    }

    pub fn factors(&self) -> &[PGroupElementArray] {
        &self.values
    }

    pub fn project(&self, index: usize) -> PGroupElementArray {
        self.values[index].clone()
    }

    pub fn size(&self) -> usize {
        self.values[0].size()
    }

    fn with(&self, values: Vec<PGroupElementArray>) -> PPGroupElementArray {
        PPGroupElementArray {
            group: self.group.clone(),
            values,
        }
    }

    fn map<F>(&self, f: F) -> Result<PPGroupElementArray, ArithmError>
    where
        F: FnMut(&PGroupElementArray) -> Result<PGroupElementArray, ArithmError>,
    {
        let values = self.values.iter().map(f).collect::<Result<_, _>>()?;
        Ok(self.with(values))
    }

    fn reduce<F>(&self, f: F) -> Result<PPGroupElement, ArithmError>
    where
        F: FnMut(&PGroupElementArray) -> Result<PGroupElement, ArithmError>,
    {
        let values = self.values.iter().map(f).collect::<Result<_, _>>()?;
        Ok(PPGroupElement {
            group: self.group.clone(),
            values,
        })
    }

    fn check(&self, other: &PPGroupElementArray) {
        if self.group != other.group {
            distinct_groups();
        }
    }

    pub fn get(&self, index: usize) -> Result<PPGroupElement, ArithmError> {
        self.reduce(|array| array.get(index))
    }

    pub fn elements(&self) -> Result<Vec<PPGroupElement>, ArithmError> {
        let columns = self
            .values
            .iter()
            .map(PGroupElementArray::elements)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((0..self.size())
            .map(|i| PPGroupElement {
                group: self.group.clone(),
                values: columns.iter().map(|column| column[i].clone()).collect(),
            })
            .collect())
    }

    /// Component-wise products with an array of this group, or every
    /// component array multiplied by `other`.
    pub fn mul(&self, other: &PGroupElementArray) -> Result<PPGroupElementArray, ArithmError> {
        match other {
            PGroupElementArray::Product(array) if array.group == self.group => {
                let values = self
                    .values
                    .iter()
                    .zip(&array.values)
                    .map(|(a, b)| a.mul(b))
                    .collect::<Result<_, _>>()?;
                Ok(self.with(values))
            }
            _ => self.map(|a| a.mul(other)),
        }
    }

    pub fn mul_scalar(&self, factor: &PGroupElement) -> Result<PPGroupElementArray, ArithmError> {
        match factor {
            PGroupElement::Product(el) if el.group == self.group => {
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

    pub fn inv(&self) -> Result<PPGroupElementArray, ArithmError> {
        self.map(PGroupElementArray::inv)
    }

    pub fn exp(&self, exponents: &PRingElementArray) -> Result<PPGroupElementArray, ArithmError> {
        match exponents {
            PRingElementArray::Product(e) if e.ring() == self.group.pring() => {
                let values = self
                    .values
                    .iter()
                    .zip(e.factors())
                    .map(|(a, b)| a.exp(b))
                    .collect::<Result<_, _>>()?;
                Ok(self.with(values))
            }
            _ => self.map(|a| a.exp(exponents)),
        }
    }

    pub fn exp_scalar(&self, exponent: &PRingElement) -> Result<PPGroupElementArray, ArithmError> {
        match exponent {
            PRingElement::Product(e) if e.ring() == self.group.pring() => {
                let values = self
                    .values
                    .iter()
                    .zip(e.factors())
                    .map(|(a, b)| a.exp_scalar(b))
                    .collect::<Result<_, _>>()?;
                Ok(self.with(values))
            }
            _ => self.map(|a| a.exp_scalar(exponent)),
        }
    }

    pub fn exp_prod(&self, exponents: &PRingElementArray) -> Result<PPGroupElement, ArithmError> {
        match exponents {
            PRingElementArray::Product(e) if e.ring() == self.group.pring() => {
                let values = self
                    .values
                    .iter()
                    .zip(e.factors())
                    .map(|(a, b)| a.exp_prod(b))
                    .collect::<Result<_, _>>()?;
                Ok(PPGroupElement {
                    group: self.group.clone(),
                    values,
                })
            }
            _ => self.reduce(|a| a.exp_prod(exponents)),
        }
    }

    pub fn prod(&self) -> Result<PPGroupElement, ArithmError> {
        self.reduce(PGroupElementArray::prod)
    }

    /// Lexicographic order over the component arrays.
    pub fn compare_to(&self, other: &PPGroupElementArray) -> Result<Ordering, ArithmError> {
        self.check(other);
        for (a, b) in self.values.iter().zip(&other.values) {
            match a.compare_to(b)? {
                Ordering::Equal => {}
                ordering => return Ok(ordering),
            }
        }
        Ok(Ordering::Equal)
    }

    /// Element-wise equality, true where every component agrees.
    pub fn equals_all(&self, other: &PPGroupElementArray) -> Result<Vec<bool>, ArithmError> {
        self.check(other);
        if self.size() != other.size() {
            return Err(ArithmError::mismatch("comparison", self.size(), other.size()));
        }
        let mut res = vec![true; self.size()];
        for (a, b) in self.values.iter().zip(&other.values) {
            for (r, eq) in res.iter_mut().zip(a.equals_all(b)?) {
                *r &= eq;
            }
        }
        Ok(res)
    }

    pub fn equals(&self, other: &PPGroupElementArray) -> Result<bool, ArithmError> {
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

    pub fn permute(&self, permutation: &Permutation) -> Result<PPGroupElementArray, ArithmError> {
        self.map(|array| array.permute(permutation))
    }

    pub fn shift_push(&self, element: &PPGroupElement) -> Result<PPGroupElementArray, ArithmError> {
        if element.group != self.group {
            distinct_groups();
        }
        let values = self
            .values
            .iter()
            .zip(&element.values)
            .map(|(array, el)| array.shift_push(el))
            .collect::<Result<_, _>>()?;
        Ok(self.with(values))
    }

    pub fn copy_of_range(&self, start: usize, end: usize) -> Result<PPGroupElementArray, ArithmError> {
        self.map(|array| array.copy_of_range(start, end))
    }

    pub fn extract(&self, mask: &[bool]) -> Result<PPGroupElementArray, ArithmError> {
        self.map(|array| array.extract(mask))
    }

    /// Node of the encodings of the component arrays.
    pub fn to_byte_tree(&self) -> Result<ByteTree, ArithmError> {
        let children = self
            .values
            .iter()
            .map(PGroupElementArray::to_byte_tree)
            .collect::<Result<_, _>>()?;
        Ok(ByteTree::node(children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arithm::group::{ECPGroup, ModPGroup};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn modp() -> Result<PGroup, ArithmError> {
        let mut rng = StdRng::seed_from_u64(41);
        Ok(PGroup::ModP(ModPGroup::gen_safe_prime(96, &mut rng, 40)?))
    }

    fn nested() -> Result<PPGroup, ArithmError> {
        let g = modp()?;
        let inner = PPGroup::power(&g, 2)?;
        PPGroup::try_with(vec![PGroup::Product(inner), g])
    }

    #[test]
    fn test_rejects_distinct_orders() -> Result<(), ArithmError> {
        assert!(PPGroup::try_with(Vec::new()).is_err());
        let ec = PGroup::Ec(ECPGroup::named("P-256")?);
        assert!(PPGroup::try_with(vec![modp()?, ec]).is_err());
        Ok(())
    }

    #[test]
    fn test_lengths_and_ring() -> Result<(), ArithmError> {
        let g = modp()?;
        let group = nested()?;
        assert_eq!(group.byte_length(), 5 + (5 + 2 * g.byte_length()) + g.byte_length());
        assert_eq!(group.encode_length(), 3 * g.encode_length());
        assert_eq!(group.pring().width(), 2);
        assert_eq!(group.one()?.to_byte_tree()?.total_byte_size(), group.byte_length());
        Ok(())
    }

    #[test]
    fn test_component_wise_and_broadcast_exponentiation() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(42);
        let g = modp()?;
        let group = PPGroup::power(&g, 3)?;
        let el = group.random_element(&mut rng, 20)?;

        let exponent = PRingElement::Product(group.pring().random_element(&mut rng, 20)?);
        let powered = el.exp(&exponent)?;
        let scalar = g.pring().random_element(&mut rng, 20)?;
        let broadcast = el.exp(&scalar)?;
        for i in 0..3 {
            let e = exponent.as_product().map(|e| e.project(i));
            if let Some(e) = e {
                assert!(powered.project(i).equals(&el.project(i).exp(&e)?)?);
            }
            assert!(broadcast.project(i).equals(&el.project(i).exp(&scalar)?)?);
        }

        let product = el.mul(&PGroupElement::Product(el.inv()?))?;
        assert!(product.equals(&group.one()?)?);
        Ok(())
    }

    #[test]
    fn test_encoding_spreads_over_factors() -> Result<(), ArithmError> {
        let group = nested()?;
        let data: Vec<u8> = (0..group.encode_length() as u8).collect();
        assert_eq!(group.encode(&data)?.decode()?, data);
        assert_eq!(group.encode(&data[..3])?.decode()?, data[..3].to_vec());
        Ok(())
    }

    #[test]
    fn test_structure_round_trip() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(43);
        let group = nested()?;
        let tree = group.to_byte_tree();
        let decoded = PPGroup::from_reader(&mut tree.reader(), &Backing::Memory, &mut rng, 40)?;
        assert_eq!(decoded, group);
        Ok(())
    }

    #[test]
    fn test_structure_rejects_bad_indices() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(44);
        let g = modp()?;
        let basics = ByteTree::node(vec![marshal::marshal_pgroup(&g)]);

        let bad_index = ByteTree::node(vec![basics.clone(), ByteTree::node(vec![ByteTree::from_int(1)])]);
        assert!(PPGroup::from_reader(&mut bad_index.reader(), &Backing::Memory, &mut rng, 40).is_err());

        let two = ByteTree::node(vec![marshal::marshal_pgroup(&g), marshal::marshal_pgroup(&g)]);
        let untouched = ByteTree::node(vec![two, ByteTree::node(vec![ByteTree::from_int(0)])]);
        assert!(PPGroup::from_reader(&mut untouched.reader(), &Backing::Memory, &mut rng, 40).is_err());
        Ok(())
    }

    #[test]
    fn test_arrays() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(45);
        let group = nested()?;
        let backing = Backing::Memory;
        let array = group.random_element_array(&backing, 4, &mut rng, 20)?;
        let tree = array.to_byte_tree()?;
        let decoded = group.element_array_from_reader(&backing, 4, &mut tree.reader())?;
        assert!(decoded.equals(&array)?);

        let elements = array.elements()?;
        let rebuilt = group.element_array_from(&backing, &elements)?;
        assert!(rebuilt.equals(&array)?);
        assert_eq!(array.equals_all(&rebuilt)?, vec![true; 4]);

        let exponents = PRingElementArray::Product(group.pring().random_element_array(&backing, 4, &mut rng, 20)?);
        let fast = array.exp_prod(&exponents)?;
        let mut naive = group.one()?;
        for (i, el) in elements.iter().enumerate() {
            naive = naive.mul(&PGroupElement::Product(el.exp(&exponents.get(i)?)?))?;
        }
        assert!(fast.equals(&naive)?);
        Ok(())
    }
}
