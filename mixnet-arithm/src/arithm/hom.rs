//! # Maps
//!
//! Bilinear maps from a ring and a group into a group, and the
//! homomorphisms obtained by fixing one of their inputs. Proof protocols use
//! them to describe the relations they prove knowledge of.
//!
//! The fixed-base exponentiation homomorphism implements [`Batchable`]:
//! many evaluations of it collapse into a single exponentiation under a
//! random linear combination.

use rand::RngCore;

use crate::arithm::array::{Backing, LargeIntegerArray};
use crate::arithm::group::{APGroup, PGroup, PGroupElement, PPGroup};
use crate::arithm::ring::{APRing, PFieldElementArray, PPRing, PRing, PRingElement, PRingElementArray};
use crate::eio::ByteTree;
use crate::errors::ArithmError;

fn not_in_domain() -> ArithmError {
    ArithmError::InvalidParameters("Input not contained in domain!".to_string())
}

/// A map `R x G -> H` that is linear in each input.
#[derive(Debug, Clone)]
pub enum BiPRingPGroup {
    /// `(x, g) -> g^x` over a single group.
    Exp(PGroup),
    /// `((x_i), (g_i)) -> prod g_i^x_i` over a power of a group.
    ExpProd { group: PGroup, domain: PPGroup },
    /// `((x_i), g) -> (g^x_i)`, with the exponents in an array ring.
    FixedBaseExp { group: PGroup, pring: APRing, range: APGroup },
    /// `(x, g) -> g`.
    Identity(PGroup),
    /// `(x, (y, (u_i))) -> (y^x, (u_i^x))`, a public key and an array of
    /// elements raised to a common secret key.
    KeyedArrayExp { group: PGroup, domain: PPGroup },
}

impl BiPRingPGroup {
    pub fn exp(group: PGroup) -> Self {
        BiPRingPGroup::Exp(group)
    }

    pub fn exp_prod(group: PGroup, width: usize) -> Result<Self, ArithmError> {
        let domain = PPGroup::power(&group, width)?;
        Ok(BiPRingPGroup::ExpProd { group, domain })
    }

    pub fn fixed_base_exp(group: PGroup, size: usize, backing: Backing) -> Result<Self, ArithmError> {
        let pring = APRing::try_with(group.pring(), size, backing.clone())?;
        let range = APGroup::try_with(group.clone(), size, backing)?;
        Ok(BiPRingPGroup::FixedBaseExp { group, pring, range })
    }

    pub fn identity(group: PGroup) -> Self {
        BiPRingPGroup::Identity(group)
    }

    pub fn keyed_array_exp(group: PGroup, size: usize, backing: Backing) -> Result<Self, ArithmError> {
        let array = APGroup::try_with(group.clone(), size, backing)?;
        let domain = PPGroup::try_with(vec![group.clone(), PGroup::Array(array)])?;
        Ok(BiPRingPGroup::KeyedArrayExp { group, domain })
    }

    pub fn pring_domain(&self) -> PRing {
        match self {
            BiPRingPGroup::Exp(group) | BiPRingPGroup::Identity(group) => group.pring(),
            BiPRingPGroup::KeyedArrayExp { group, .. } => group.pring(),
            BiPRingPGroup::ExpProd { domain, .. } => PRing::Product(domain.pring().clone()),
            BiPRingPGroup::FixedBaseExp { pring, .. } => PRing::Array(pring.clone()),
        }
    }

    pub fn pgroup_domain(&self) -> PGroup {
        match self {
            BiPRingPGroup::Exp(group) | BiPRingPGroup::Identity(group) => group.clone(),
            BiPRingPGroup::FixedBaseExp { group, .. } => group.clone(),
            BiPRingPGroup::ExpProd { domain, .. } | BiPRingPGroup::KeyedArrayExp { domain, .. } => {
                PGroup::Product(domain.clone())
            }
        }
    }

    pub fn range(&self) -> PGroup {
        match self {
            BiPRingPGroup::Exp(group) | BiPRingPGroup::Identity(group) => group.clone(),
            BiPRingPGroup::ExpProd { group, .. } => group.clone(),
            BiPRingPGroup::FixedBaseExp { range, .. } => PGroup::Array(range.clone()),
            BiPRingPGroup::KeyedArrayExp { domain, .. } => PGroup::Product(domain.clone()),
        }
    }

    /// Evaluates the map.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::InvalidParameters` if an input is outside its
    /// domain.
    pub fn map(&self, ring_element: &PRingElement, group_element: &PGroupElement) -> Result<PGroupElement, ArithmError> {
        if !self.pring_domain().contains(ring_element) || !self.pgroup_domain().contains(group_element) {
            return Err(not_in_domain());
        }
        match self {
            BiPRingPGroup::Exp(_) => group_element.exp(ring_element),
            BiPRingPGroup::Identity(_) => Ok(group_element.clone()),
            BiPRingPGroup::ExpProd { group, .. } => {
                let (Some(exponents), Some(bases)) = (ring_element.as_product(), group_element.as_product()) else {
                    return Err(not_in_domain());
                };
                group.exp_prod(bases.factors(), exponents.factors())
            }
            BiPRingPGroup::FixedBaseExp { range, .. } => {
                let Some(exponents) = ring_element.as_array() else {
                    return Err(not_in_domain());
                };
                let powers = group_element.exp_array(exponents.values())?;
                Ok(PGroupElement::Array(range.to_element(powers)))
            }
            BiPRingPGroup::KeyedArrayExp { domain, .. } => {
                let Some(input) = group_element.as_product() else {
                    return Err(not_in_domain());
                };
                let key = input.project(0).exp(ring_element)?;
                let array = input.project(1).exp(ring_element)?;
                Ok(PGroupElement::Product(domain.product(vec![key, array])))
            }
        }
    }

    /// The homomorphism `x -> map(x, element)`.
    pub fn restrict_group(&self, element: PGroupElement) -> HomPRingPGroup {
        HomPRingPGroup::Restricted {
            bi: self.clone(),
            restriction: element,
        }
    }

    /// The homomorphism `g -> map(element, g)`.
    pub fn restrict_ring(&self, element: PRingElement) -> HomPGroupPGroup {
        HomPGroupPGroup {
            bi: self.clone(),
            restriction: element,
        }
    }
}

/// A homomorphism from a ring to a group.
#[derive(Debug, Clone)]
pub enum HomPRingPGroup {
    /// A bilinear map with its group input fixed.
    Restricted {
        bi: BiPRingPGroup,
        restriction: PGroupElement,
    },
    /// Component-wise evaluation of homomorphisms, from the product of their
    /// domains to the product of their ranges.
    Product {
        homs: Vec<HomPRingPGroup>,
        domain: PPRing,
        range: PPGroup,
    },
}

impl HomPRingPGroup {
    pub fn product(homs: Vec<HomPRingPGroup>) -> Result<Self, ArithmError> {
        let domain = PPRing::try_with(homs.iter().map(HomPRingPGroup::domain).collect())?;
        let range = PPGroup::try_with(homs.iter().map(HomPRingPGroup::range).collect())?;
        Ok(HomPRingPGroup::Product { homs, domain, range })
    }

    pub fn domain(&self) -> PRing {
        match self {
            HomPRingPGroup::Restricted { bi, .. } => bi.pring_domain(),
            HomPRingPGroup::Product { domain, .. } => PRing::Product(domain.clone()),
        }
    }

    pub fn range(&self) -> PGroup {
        match self {
            HomPRingPGroup::Restricted { bi, .. } => bi.range(),
            HomPRingPGroup::Product { range, .. } => PGroup::Product(range.clone()),
        }
    }

    /// The component homomorphisms of a product, or this map alone.
    pub fn factors(&self) -> Vec<HomPRingPGroup> {
        match self {
            HomPRingPGroup::Product { homs, .. } => homs.clone(),
            _ => vec![self.clone()],
        }
    }

    pub fn map(&self, element: &PRingElement) -> Result<PGroupElement, ArithmError> {
        match self {
            HomPRingPGroup::Restricted { bi, restriction } => bi.map(element, restriction),
            HomPRingPGroup::Product { homs, domain, range } => {
                let input = match element {
                    PRingElement::Product(el) if el.ring() == domain => el,
                    _ => return Err(not_in_domain()),
                };
                let images = homs
                    .iter()
                    .zip(input.factors())
                    .map(|(hom, x)| hom.map(x))
                    .collect::<Result<_, _>>()?;
                Ok(PGroupElement::Product(range.product(images)))
            }
        }
    }

    /// The fixed input of a restricted map, or the node of those of the
    /// components of a product.
    pub fn to_byte_tree(&self) -> Result<ByteTree, ArithmError> {
        match self {
            HomPRingPGroup::Restricted { restriction, .. } => restriction.to_byte_tree(),
            HomPRingPGroup::Product { homs, .. } => {
                let children = homs
                    .iter()
                    .map(HomPRingPGroup::to_byte_tree)
                    .collect::<Result<_, _>>()?;
                Ok(ByteTree::node(children))
            }
        }
    }
}

/// A bilinear map with its ring input fixed.
#[derive(Debug, Clone)]
pub struct HomPGroupPGroup {
    bi: BiPRingPGroup,
    restriction: PRingElement,
}

impl HomPGroupPGroup {
    pub fn domain(&self) -> PGroup {
        self.bi.pgroup_domain()
    }

    pub fn range(&self) -> PGroup {
        self.bi.range()
    }

    pub fn map(&self, element: &PGroupElement) -> Result<PGroupElement, ArithmError> {
        self.bi.map(&self.restriction, element)
    }
}

/// A homomorphism whose evaluations can be checked together.
///
/// After [`Batchable::init_batching`] draws a vector `e`, a preimage `x` and
/// its image `y` satisfy `batched_map().map(batched_preimage(x)) ==
/// batched_image(y)`.
pub trait Batchable {
    /// Draws a batching vector of `batch_bit_length`-bit components.
    fn init_batching<R: RngCore + ?Sized>(
        &mut self,
        rng: &mut R,
        batch_bit_length: usize,
    ) -> Result<PFieldElementArray, ArithmError>;

    fn batched_preimage(&self, preimage: &PRingElement) -> Result<PRingElement, ArithmError>;

    fn batched_image(&self, image: &PGroupElement) -> Result<PGroupElement, ArithmError>;

    fn batched_map(&self) -> HomPRingPGroup;
}

/// The homomorphism `(x_i) -> (g^x_i)` for a fixed base `g`.
#[derive(Debug, Clone)]
pub struct HomFixedBaseExp {
    bi: BiPRingPGroup,
    basis: PGroupElement,
    batching: Option<PFieldElementArray>,
}

impl HomFixedBaseExp {
    /// # Errors
    ///
    /// Returns `ArithmError::InvalidParameters` if `basis` is not in `group`
    /// or `size` is zero.
    pub fn try_with(group: PGroup, size: usize, backing: Backing, basis: PGroupElement) -> Result<Self, ArithmError> {
        if !group.contains(&basis) {
            return Err(not_in_domain());
        }
        Ok(HomFixedBaseExp {
            bi: BiPRingPGroup::fixed_base_exp(group, size, backing)?,
            basis,
            batching: None,
        })
    }

    pub fn basis(&self) -> &PGroupElement {
        &self.basis
    }

    pub fn hom(&self) -> HomPRingPGroup {
        self.bi.restrict_group(self.basis.clone())
    }

    pub fn domain(&self) -> PRing {
        self.bi.pring_domain()
    }

    pub fn range(&self) -> PGroup {
        self.bi.range()
    }

    pub fn map(&self, element: &PRingElement) -> Result<PGroupElement, ArithmError> {
        self.bi.map(element, &self.basis)
    }

    fn batching(&self) -> Result<&PFieldElementArray, ArithmError> {
        self.batching
            .as_ref()
            .ok_or_else(|| ArithmError::InvalidParameters("Batching not initialized!".to_string()))
    }
}

impl Batchable for HomFixedBaseExp {
    fn init_batching<R: RngCore + ?Sized>(
        &mut self,
        rng: &mut R,
        batch_bit_length: usize,
    ) -> Result<PFieldElementArray, ArithmError> {
        let BiPRingPGroup::FixedBaseExp { pring, .. } = &self.bi else {
            return Err(ArithmError::InternalError("Not a fixed-base map!".to_string()));
        };
        let field = pring.pfield();
        let integers = LargeIntegerArray::random(&Backing::Memory, pring.size(), batch_bit_length, rng)?;
        let batching = field.to_element_array(&integers)?;
        self.batching = Some(batching.clone());
        Ok(batching)
    }

    fn batched_preimage(&self, preimage: &PRingElement) -> Result<PRingElement, ArithmError> {
        let Some(preimage) = preimage.as_array() else {
            return Err(not_in_domain());
        };
        let batching = PRingElementArray::Field(self.batching()?.clone());
        preimage.values().inner_product(&batching)
    }

    fn batched_image(&self, image: &PGroupElement) -> Result<PGroupElement, ArithmError> {
        let Some(image) = image.as_array() else {
            return Err(not_in_domain());
        };
        let batching = PRingElementArray::Field(self.batching()?.clone());
        image.values().exp_prod(&batching)
    }

    fn batched_map(&self) -> HomPRingPGroup {
        BiPRingPGroup::exp(self.basis.group()).restrict_group(self.basis.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arithm::group::ModPGroup;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn group() -> Result<PGroup, ArithmError> {
        let mut rng = StdRng::seed_from_u64(71);
        Ok(PGroup::ModP(ModPGroup::gen_safe_prime(96, &mut rng, 40)?))
    }

    #[test]
    fn test_exp_and_identity() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(72);
        let group = group()?;
        let g = group.random_element(&mut rng, 20)?;
        let x = group.pring().random_element(&mut rng, 20)?;

        let exp = BiPRingPGroup::exp(group.clone());
        assert!(exp.map(&x, &g)?.equals(&g.exp(&x)?)?);
        assert!(exp.restrict_group(g.clone()).map(&x)?.equals(&g.exp(&x)?)?);
        assert!(exp.restrict_ring(x.clone()).map(&g)?.equals(&g.exp(&x)?)?);

        let identity = BiPRingPGroup::identity(group);
        assert!(identity.map(&x, &g)?.equals(&g)?);
        Ok(())
    }

    #[test]
    fn test_rejects_inputs_outside_domain() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(73);
        let group = group()?;
        let g = group.generator()?;
        let other = PRing::Field(crate::arithm::ring::PField::with_prime_order(crate::arithm::LargeInteger::from(7919)));
        let x = other.random_element(&mut rng, 20)?;
        assert!(BiPRingPGroup::exp(group).map(&x, &g).is_err());
        Ok(())
    }

    #[test]
    fn test_exp_prod() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(74);
        let group = group()?;
        let bi = BiPRingPGroup::exp_prod(group.clone(), 3)?;
        let bases = bi.pgroup_domain().random_element(&mut rng, 20)?;
        let exponents = bi.pring_domain().random_element(&mut rng, 20)?;

        let mut expected = group.one()?;
        if let (Some(b), Some(e)) = (bases.as_product(), exponents.as_product()) {
            for (base, exponent) in b.factors().iter().zip(e.factors()) {
                expected = expected.mul(&base.exp(exponent)?)?;
            }
        }
        assert!(bi.map(&exponents, &bases)?.equals(&expected)?);
        Ok(())
    }

    #[test]
    fn test_keyed_array_exp() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(75);
        let group = group()?;
        let bi = BiPRingPGroup::keyed_array_exp(group.clone(), 4, Backing::Memory)?;
        let input = bi.pgroup_domain().random_element(&mut rng, 20)?;
        let key = group.pring().random_element(&mut rng, 20)?;
        let image = bi.map(&key, &input)?;
        assert!(image.equals(&input.exp(&key)?)?);
        assert_eq!(bi.range(), bi.pgroup_domain());
        Ok(())
    }

    #[test]
    fn test_product_hom() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(76);
        let group = group()?;
        let g = group.random_element(&mut rng, 20)?;
        let h = group.random_element(&mut rng, 20)?;
        let exp = BiPRingPGroup::exp(group.clone());
        let hom = HomPRingPGroup::product(vec![exp.restrict_group(g.clone()), exp.restrict_group(h.clone())])?;
        assert_eq!(hom.factors().len(), 2);

        let x = hom.domain().random_element(&mut rng, 20)?;
        let image = hom.map(&x)?;
        if let (Some(x), Some(y)) = (x.as_product(), image.as_product()) {
            assert!(y.project(0).equals(&g.exp(&x.project(0))?)?);
            assert!(y.project(1).equals(&h.exp(&x.project(1))?)?);
        }
        assert_eq!(hom.to_byte_tree()?.count(), 2);
        Ok(())
    }

    #[test]
    fn test_batching() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(77);
        let group = group()?;
        let g = group.generator()?;
        let mut hom = HomFixedBaseExp::try_with(group.clone(), 6, Backing::Memory, g)?;
        let x = hom.domain().random_element(&mut rng, 20)?;
        let y = hom.map(&x)?;
        assert!(hom.batched_preimage(&x).is_err());

        let batching = hom.init_batching(&mut rng, 40)?;
        assert_eq!(batching.size(), 6);
        let lhs = hom.batched_map().map(&hom.batched_preimage(&x)?)?;
        let rhs = hom.batched_image(&y)?;
        assert!(lhs.equals(&rhs)?);

        let mut tampered = y.clone();
        if let PGroupElement::Array(el) = &y {
            let values = el.values().mul_scalar(&group.generator()?)?;
            if let PGroup::Array(range) = hom.range() {
                tampered = PGroupElement::Array(range.to_element(values));
            }
        }
        assert!(!hom.batched_image(&tampered)?.equals(&lhs)?);
        Ok(())
    }
}
