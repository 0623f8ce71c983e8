//! Prime order subgroups of the multiplicative group modulo a prime.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::arithm::array::{Backing, LargeIntegerArray};
use crate::arithm::ring::{PField, PFieldElement, PFieldElementArray};
use crate::arithm::{LargeInteger, Permutation};
use crate::eio::{ByteTree, ByteTreeReader};
use crate::errors::ArithmError;
use crate::util::{EXP_THREAD_THRESHOLD, MUL_THREAD_THRESHOLD};

/// Largest bit length difference between modulus and order for which the
/// subgroup encoding is accepted.
pub const MAXIMAL_COGROUP_BIT_LENGTH: usize = 10;

/// Largest accepted byte length of a decoded modulus.
const MAX_MODULUS_BYTE_LENGTH: usize = 10_000;

/// How bytes are mapped to group elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModPEncoding {
    /// A single byte is found by hashing consecutive powers of the generator.
    Ro,
    /// The modulus is a safe prime and bytes are mapped to `v` or `-v`.
    SafePrime,
    /// The co-order is small and bytes are shifted into the subgroup.
    Subgroup,
}

impl ModPEncoding {
    pub fn to_int(self) -> i32 {
        match self {
            ModPEncoding::Ro => 0,
            ModPEncoding::SafePrime => 1,
            ModPEncoding::Subgroup => 2,
        }
    }

    /// # Errors
    ///
    /// Returns `ArithmError::Format` for an unknown code.
    pub fn from_int(code: i32) -> Result<Self, ArithmError> {
        match code {
            0 => Ok(ModPEncoding::Ro),
            1 => Ok(ModPEncoding::SafePrime),
            2 => Ok(ModPEncoding::Subgroup),
            _ => Err(ArithmError::format("Unknown encoding!")),
        }
    }
}

#[derive(Debug)]
struct ModPParams {
    modulus: LargeInteger,
    modulus_byte_length: usize,
    co_order: LargeInteger,
    field: PField,
    generator: LargeInteger,
    encoding: ModPEncoding,
    encode_length: usize,
    add_num: LargeInteger,
    encoding_attempts: u64,
    exp_threshold: AtomicUsize,
    mul_threshold: AtomicUsize,
}

/// Subgroup of prime order `q` of the multiplicative group modulo a prime
/// `p = q * k + 1`. Elements are canonical residues encoded as leaves of the
/// byte length of the modulus.
#[derive(Debug, Clone)]
pub struct ModPGroup(Arc<ModPParams>);

impl ModPGroup {
    /// Group of order `order` modulo `modulus` generated by `generator`.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::InvalidModulus` if the modulus or the order is
    /// not a prime, or if they are incompatible, and
    /// `ArithmError::InvalidParameters` if the generator or the encoding does
    /// not fit the group.
    pub fn try_with<R: RngCore + ?Sized>(
        modulus: LargeInteger,
        order: LargeInteger,
        generator: LargeInteger,
        encoding: ModPEncoding,
        rng: &mut R,
        certainty: usize,
    ) -> Result<Self, ArithmError> {
        if modulus.signum() <= 0 {
            return Err(ArithmError::InvalidModulus("The modulus is not positive!".to_string()));
        }
        if !modulus.is_probable_prime(rng, certainty) {
            return Err(ArithmError::InvalidModulus("The modulus is not prime!".to_string()));
        }
        let co_order = modulus.sub(&LargeInteger::one()).divide(&order)?;
        if order.mul(&co_order).add(&LargeInteger::one()) != modulus {
            return Err(ArithmError::InvalidModulus("Incompatible module and order!".to_string()));
        }
        let field = PField::try_with(order, rng, certainty)?;

        if encoding == ModPEncoding::SafePrime && co_order != LargeInteger::two() {
            return Err(ArithmError::InvalidParameters(
                "Attempting to use safe prime encoding using a non-safe prime!".to_string(),
            ));
        }
        if encoding == ModPEncoding::Subgroup
            && modulus.bit_length() - field.order().bit_length() > MAXIMAL_COGROUP_BIT_LENGTH
        {
            return Err(ArithmError::InvalidParameters(
                "Co-group too large for the subgroup encoding!".to_string(),
            ));
        }
        if generator < LargeInteger::two() || generator >= modulus {
            return Err(ArithmError::InvalidParameters(
                "Generator is not reduced canonically!".to_string(),
            ));
        }
        match encoding {
            ModPEncoding::SafePrime => {
                if !matches!(generator.legendre(&modulus), Ok(1)) {
                    return Err(ArithmError::InvalidParameters("Generator is not a square!".to_string()));
                }
            }
            _ => {
                if !generator.mod_pow(field.order(), &modulus).is_one() {
                    return Err(ArithmError::InvalidParameters(
                        "Generator is not contained in group!".to_string(),
                    ));
                }
            }
        }
        Self::with_params(modulus, co_order, field, generator, encoding)
    }

    fn with_params(
        modulus: LargeInteger,
        co_order: LargeInteger,
        field: PField,
        generator: LargeInteger,
        encoding: ModPEncoding,
    ) -> Result<Self, ArithmError> {
        let bit_length = modulus.bit_length();
        let mut add_num = LargeInteger::zero();
        let mut encoding_attempts = 0;
        let encode_length = match encoding {
            ModPEncoding::Ro => 1,
            ModPEncoding::SafePrime => ((bit_length - 2) / 8)
                .checked_sub(4)
                .filter(|len| *len > 0)
                .ok_or_else(|| ArithmError::InvalidModulus("Too small modulus!".to_string()))?,
            ModPEncoding::Subgroup => {
                let padding = co_order.bit_length().div_ceil(8) + 1;
                let len = (bit_length / 8)
                    .checked_sub(padding + 4)
                    .filter(|len| *len > 0)
                    .ok_or_else(|| ArithmError::InvalidModulus("Too small modulus!".to_string()))?;
                add_num = LargeInteger::one().shift_left((len + 4) * 8);
                encoding_attempts = (1u64 << (8 * padding).min(63)) - 1;
                len
            }
        };
        let modulus_byte_length = modulus.to_byte_array().len();
        Ok(ModPGroup(Arc::new(ModPParams {
            modulus,
            modulus_byte_length,
            co_order,
            field,
            generator,
            encoding,
            encode_length,
            add_num,
            encoding_attempts,
            exp_threshold: AtomicUsize::new(EXP_THREAD_THRESHOLD),
            mul_threshold: AtomicUsize::new(MUL_THREAD_THRESHOLD),
        })))
    }

    /// Group of squares modulo a random safe prime of `bit_length` bits,
    /// with the safe prime encoding.
    pub fn gen_safe_prime<R: RngCore + ?Sized>(
        bit_length: usize,
        rng: &mut R,
        certainty: usize,
    ) -> Result<Self, ArithmError> {
        let modulus = LargeInteger::random_safe_prime(bit_length, rng, certainty);
        let order = modulus.shift_right(1);
        let generator = loop {
            let g = LargeInteger::random(2 * bit_length, rng).mod_pow(&LargeInteger::two(), &modulus);
            if g >= LargeInteger::two() {
                break g;
            }
        };
        debug!(bit_length, "generated safe prime group");
        let field = PField::with_prime_order(order);
        Self::with_params(modulus, LargeInteger::two(), field, generator, ModPEncoding::SafePrime)
    }

    /// Subgroup of random prime order of `order_bit_length` bits modulo a
    /// prime of `bit_length` bits.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::InvalidParameters` if the modulus is not longer
    /// than the order, if the safe prime encoding is requested, or if the
    /// subgroup encoding is requested with a too large co-group.
    pub fn gen_subgroup<R: RngCore + ?Sized>(
        bit_length: usize,
        order_bit_length: usize,
        encoding: ModPEncoding,
        rng: &mut R,
        certainty: usize,
    ) -> Result<Self, ArithmError> {
        if bit_length <= order_bit_length {
            return Err(ArithmError::InvalidParameters(
                "Bit length of modulus must be larger than bit length of order!".to_string(),
            ));
        }
        if encoding == ModPEncoding::SafePrime {
            return Err(ArithmError::InvalidParameters(
                "Safe prime encoding can not be used for non-safe primes!".to_string(),
            ));
        }
        let diff = bit_length - order_bit_length;
        if encoding == ModPEncoding::Subgroup && diff > MAXIMAL_COGROUP_BIT_LENGTH {
            return Err(ArithmError::InvalidParameters(
                "The order is too small compared to the modulus for the subgroup encoding!".to_string(),
            ));
        }

        let (order, modulus) = loop {
            let order = LargeInteger::random_prime_exact(order_bit_length, rng, certainty);
            let step = order.shift_left(1);
            let mut modulus = if diff > MAXIMAL_COGROUP_BIT_LENGTH {
                let co_order = LargeInteger::random(diff + 1, rng).clear_bit(0);
                order.mul(&co_order).add(&LargeInteger::one())
            } else {
                order.shift_left(diff).add(&LargeInteger::one())
            };
            let found = loop {
                if modulus.bit_length() > bit_length {
                    break false;
                }
                if modulus.is_probable_prime(rng, certainty) {
                    break true;
                }
                modulus = modulus.add(&step);
            };
            if found {
                break (order, modulus);
            }
        };

        let co_order = modulus.sub(&LargeInteger::one()).divide(&order)?;
        let generator = loop {
            let g = LargeInteger::random(2 * bit_length, rng).mod_pow(&co_order, &modulus);
            if g >= LargeInteger::two() {
                break g;
            }
        };
        debug!(bit_length, order_bit_length, "generated subgroup");
        let field = PField::with_prime_order(order);
        Self::with_params(modulus, co_order, field, generator, encoding)
    }

    /// Decodes the structure written by [`ModPGroup::to_byte_tree`].
    pub fn from_reader<R: RngCore + ?Sized>(
        reader: &mut ByteTreeReader<'_>,
        rng: &mut R,
        certainty: usize,
    ) -> Result<Self, ArithmError> {
        if reader.is_leaf() || reader.remaining() != 4 {
            return Err(ArithmError::format("Malformed ModPGroup!"));
        }
        let modulus = LargeInteger::from_reader_max(MAX_MODULUS_BYTE_LENGTH, &mut reader.next_child()?)?;
        let order = LargeInteger::from_reader_max(MAX_MODULUS_BYTE_LENGTH, &mut reader.next_child()?)?;
        let generator = LargeInteger::from_reader_max(MAX_MODULUS_BYTE_LENGTH, &mut reader.next_child()?)?;
        let encoding = ModPEncoding::from_int(reader.next_child()?.read_int()?)?;
        Self::try_with(modulus, order, generator, encoding, rng, certainty)
    }

    pub fn to_byte_tree(&self) -> ByteTree {
        ByteTree::node(vec![
            self.0.modulus.to_byte_tree(),
            self.order().to_byte_tree(),
            self.0.generator.to_byte_tree(),
            ByteTree::from_int(self.0.encoding.to_int()),
        ])
    }

    pub fn modulus(&self) -> &LargeInteger {
        &self.0.modulus
    }

    pub fn order(&self) -> &LargeInteger {
        self.0.field.order()
    }

    pub fn co_order(&self) -> &LargeInteger {
        &self.0.co_order
    }

    pub fn pfield(&self) -> &PField {
        &self.0.field
    }

    pub fn encoding(&self) -> ModPEncoding {
        self.0.encoding
    }

    pub fn byte_length(&self) -> usize {
        5 + self.0.modulus_byte_length
    }

    pub fn encode_length(&self) -> usize {
        self.0.encode_length
    }

    pub(crate) fn modulus_byte_length(&self) -> usize {
        self.0.modulus_byte_length
    }

    pub fn exp_thread_threshold(&self) -> usize {
        self.0.exp_threshold.load(AtomicOrdering::Relaxed)
    }

    pub fn set_exp_thread_threshold(&self, threshold: usize) {
        self.0.exp_threshold.store(threshold, AtomicOrdering::Relaxed);
    }

    pub fn mul_thread_threshold(&self) -> usize {
        self.0.mul_threshold.load(AtomicOrdering::Relaxed)
    }

    pub fn set_mul_thread_threshold(&self, threshold: usize) {
        self.0.mul_threshold.store(threshold, AtomicOrdering::Relaxed);
    }

    /// Tests if `value` is the canonical representative of an element.
    pub fn contains(&self, value: &LargeInteger) -> bool {
        if value.signum() <= 0 || *value >= self.0.modulus {
            return false;
        }
        match self.0.encoding {
            ModPEncoding::SafePrime => matches!(value.legendre(&self.0.modulus), Ok(1)),
            _ => value.mod_pow(self.order(), &self.0.modulus).is_one(),
        }
    }

    pub fn generator(&self) -> ModPGroupElement {
        ModPGroupElement::new(self, self.0.generator.clone())
    }

    pub fn one(&self) -> ModPGroupElement {
        ModPGroupElement::new(self, LargeInteger::one())
    }

    /// # Errors
    ///
    /// Returns `ArithmError::Format` if `value` is not in the group.
    pub fn to_element(&self, value: LargeInteger) -> Result<ModPGroupElement, ArithmError> {
        if !self.contains(&value) {
            return Err(ArithmError::format("Not a group element!"));
        }
        Ok(ModPGroupElement::new(self, value))
    }

    pub fn random_element<R: RngCore + ?Sized>(&self, rng: &mut R, stat_dist: usize) -> ModPGroupElement {
        loop {
            let value = LargeInteger::random_mod(&self.0.modulus, stat_dist, rng)
                .mod_pow(&self.0.co_order, &self.0.modulus);
            if !value.is_zero() {
                return ModPGroupElement::new(self, value);
            }
        }
    }

    pub fn element_from_reader(&self, reader: &mut ByteTreeReader<'_>) -> Result<ModPGroupElement, ArithmError> {
        let value = LargeInteger::from_reader_exact(self.0.modulus_byte_length, reader)
            .map_err(|_| ArithmError::format("Incorrect length of data!"))?;
        self.to_element(value)
    }

    /// Encodes at most [`ModPGroup::encode_length`] bytes of `bytes` as an
    /// element. Excess bytes are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::InternalError` if no element is found within the
    /// number of attempts of the encoding.
    pub fn encode(&self, bytes: &[u8]) -> Result<ModPGroupElement, ArithmError> {
        let len = bytes.len().min(self.0.encode_length);
        let data = &bytes[..len];
        let p = &self.0.modulus;

        if self.0.encoding == ModPEncoding::Ro {
            let g = self.generator();
            let mut el = g.clone();
            let mut power = LargeInteger::one();
            while power < *self.order() {
                let digest = el.digest();
                if usize::from(digest[0] & 3) == len && &digest[1..=len] == data {
                    return Ok(el);
                }
                el = el.mul(&g);
                power = power.add(&LargeInteger::one());
            }
            return Err(ArithmError::InternalError("Encoding failed!".to_string()));
        }

        let mut padded = vec![0u8; self.0.encode_length + 4];
        padded[..4].copy_from_slice(&(len as u32).to_be_bytes());
        padded[4..4 + len].copy_from_slice(data);
        if len == 0 {
            let last = padded.len() - 1;
            padded[last] = 1;
        }
        let mut value = LargeInteger::to_positive(&padded);

        if self.0.encoding == ModPEncoding::SafePrime {
            if !matches!(value.legendre(p), Ok(1)) {
                value = value.neg().modulo(p);
            }
            return Ok(ModPGroupElement::new(self, value));
        }

        for _ in 0..self.0.encoding_attempts {
            if self.contains(&value) {
                return Ok(ModPGroupElement::new(self, value));
            }
            value = value.add(&self.0.add_num);
        }
        Err(ArithmError::InternalError("Encoding failed!".to_string()))
    }

    pub fn element_array_from(
        &self,
        backing: &Backing,
        elements: &[ModPGroupElement],
    ) -> Result<ModPGroupElementArray, ArithmError> {
        let values = elements
            .iter()
            .map(|el| {
                self.check(&el.group);
                el.value.clone()
            })
            .collect();
        Ok(ModPGroupElementArray::new(self, LargeIntegerArray::from_vec(backing, values)?))
    }

    pub fn fill_element_array(
        &self,
        backing: &Backing,
        size: usize,
        element: &ModPGroupElement,
    ) -> Result<ModPGroupElementArray, ArithmError> {
        self.check(&element.group);
        Ok(ModPGroupElementArray::new(
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
    ) -> Result<ModPGroupElementArray, ArithmError> {
        let values = LargeIntegerArray::random_mod(backing, size, &self.0.modulus, stat_dist, rng)?
            .mod_pow_scalar(&self.0.co_order, &self.0.modulus, self.exp_thread_threshold())?;
        Ok(ModPGroupElementArray::new(self, values))
    }

    /// Decodes a node of `size` elements, or of any number of elements if
    /// `size` is zero.
    pub fn element_array_from_reader(
        &self,
        backing: &Backing,
        size: usize,
        reader: &mut ByteTreeReader<'_>,
    ) -> Result<ModPGroupElementArray, ArithmError> {
        let values = LargeIntegerArray::from_reader(backing, size, reader, &LargeInteger::one(), &self.0.modulus)?;
        let array = ModPGroupElementArray::new(self, values);
        if self.0.encoding == ModPEncoding::SafePrime {
            if !array.values.quadratic_residues(&self.0.modulus, self.exp_thread_threshold())? {
                return Err(ArithmError::format("Not a group element!"));
            }
        } else {
            let powers = array
                .values
                .mod_pow_scalar(self.order(), &self.0.modulus, self.exp_thread_threshold())?;
            let ones = LargeIntegerArray::fill(backing, powers.size(), &LargeInteger::one())?;
            if !powers.equals(&ones)? {
                return Err(ArithmError::format("Not a group element!"));
            }
        }
        Ok(array)
    }

    /// # Panics
    ///
    /// Panics if the groups are distinct.
    pub(crate) fn check(&self, other: &ModPGroup) {
        if self != other {
            super::distinct_groups();
        }
    }
}

impl PartialEq for ModPGroup {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.modulus == other.0.modulus
                && self.order() == other.order()
                && self.0.generator == other.0.generator
                && self.0.encoding == other.0.encoding)
    }
}

impl Eq for ModPGroup {}

impl fmt::Display for ModPGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModPGroup({} bits)", self.0.modulus.bit_length())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModPGroupElement {
    group: ModPGroup,
    value: LargeInteger,
}

impl ModPGroupElement {
    fn new(group: &ModPGroup, value: LargeInteger) -> Self {
        ModPGroupElement {
            group: group.clone(),
            value,
        }
    }

    pub fn group(&self) -> &ModPGroup {
        &self.group
    }

    pub fn value(&self) -> &LargeInteger {
        &self.value
    }

    pub fn is_one(&self) -> bool {
        self.value.is_one()
    }

    pub fn mul(&self, other: &ModPGroupElement) -> ModPGroupElement {
        self.group.check(&other.group);
        ModPGroupElement::new(&self.group, self.value.mod_mul(&other.value, self.group.modulus()))
    }

    /// Inverse through Fermat's little theorem.
    pub fn inv(&self) -> ModPGroupElement {
        let p = self.group.modulus();
        ModPGroupElement::new(&self.group, self.value.mod_pow(&p.sub(&LargeInteger::two()), p))
    }

    pub fn div(&self, other: &ModPGroupElement) -> ModPGroupElement {
        self.mul(&other.inv())
    }

    /// Power to an exponent of the field of the group order.
    pub fn exp(&self, exponent: &PFieldElement) -> ModPGroupElement {
        self.group.pfield().check(exponent.field());
        self.exp_int(exponent.value())
    }

    /// Power to an arbitrary integer. Negative exponents invert.
    pub fn exp_int(&self, exponent: &LargeInteger) -> ModPGroupElement {
        ModPGroupElement::new(&self.group, self.value.mod_pow(exponent, self.group.modulus()))
    }

    /// This element raised to every exponent of `exponents`, through a
    /// fixed-base table.
    pub fn exp_array(&self, exponents: &PFieldElementArray) -> Result<ModPGroupElementArray, ArithmError> {
        self.group.pfield().check(exponents.field());
        let values = exponents.values().mod_pow_variant(
            &self.value,
            self.group.modulus(),
            self.group.exp_thread_threshold(),
        )?;
        Ok(ModPGroupElementArray::new(&self.group, values))
    }

    /// Bytes encoded in this element by [`ModPGroup::encode`].
    pub fn decode(&self) -> Vec<u8> {
        let group = &self.group;
        let encode_length = group.encode_length();

        if group.encoding() == ModPEncoding::Ro {
            let digest = self.digest();
            let len = usize::from(digest[0] & 3).min(encode_length);
            return digest[1..=len].to_vec();
        }

        let value = if group.encoding() == ModPEncoding::SafePrime {
            let negated = group.modulus().sub(&self.value);
            if negated < self.value { negated } else { self.value.clone() }
        } else {
            self.value.clone()
        };

        let mut raw = value.to_byte_array();
        if raw.len() < encode_length + 4 {
            let mut padded = vec![0u8; encode_length + 4 - raw.len()];
            padded.extend_from_slice(&raw);
            raw = padded;
        }
        let offset = raw.len() - (encode_length + 4);
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&raw[offset..offset + 4]);
        let len = i32::from_be_bytes(len_bytes);
        if len < 0 || len as usize > encode_length {
            return Vec::new();
        }
        raw[offset + 4..offset + 4 + len as usize].to_vec()
    }

    fn digest(&self) -> [u8; 32] {
        Sha256::digest(self.to_byte_tree().to_bytes()).into()
    }

    pub fn to_byte_tree(&self) -> ByteTree {
        self.value.to_byte_tree_fixed(self.group.modulus_byte_length())
    }

    /// Order of the canonical representatives.
    pub fn compare_to(&self, other: &ModPGroupElement) -> Ordering {
        self.group.check(&other.group);
        self.value.cmp(&other.value)
    }
}

impl fmt::Display for ModPGroupElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Array of elements of a [`ModPGroup`] over a [`LargeIntegerArray`] of
/// representatives.
#[derive(Debug, Clone)]
pub struct ModPGroupElementArray {
    group: ModPGroup,
    values: LargeIntegerArray,
}

impl ModPGroupElementArray {
    fn new(group: &ModPGroup, values: LargeIntegerArray) -> Self {
        ModPGroupElementArray {
            group: group.clone(),
            values,
        }
    }

    fn with(&self, values: LargeIntegerArray) -> Self {
        ModPGroupElementArray::new(&self.group, values)
    }

    pub fn group(&self) -> &ModPGroup {
        &self.group
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

    fn modulus(&self) -> &LargeInteger {
        self.group.modulus()
    }

    pub fn get(&self, index: usize) -> Result<ModPGroupElement, ArithmError> {
        Ok(ModPGroupElement::new(&self.group, self.values.get(index)?))
    }

    pub fn elements(&self) -> Result<Vec<ModPGroupElement>, ArithmError> {
        Ok(self
            .values
            .integers()?
            .into_iter()
            .map(|value| ModPGroupElement::new(&self.group, value))
            .collect())
    }

    pub fn mul(&self, other: &ModPGroupElementArray) -> Result<Self, ArithmError> {
        self.group.check(&other.group);
        Ok(self.with(
            self.values
                .mod_mul(&other.values, self.modulus(), self.group.mul_thread_threshold())?,
        ))
    }

    pub fn mul_scalar(&self, factor: &ModPGroupElement) -> Result<Self, ArithmError> {
        self.group.check(&factor.group);
        Ok(self.with(
            self.values
                .mod_mul_scalar(&factor.value, self.modulus(), self.group.mul_thread_threshold())?,
        ))
    }

    pub fn inv(&self) -> Result<Self, ArithmError> {
        Ok(self.with(self.values.mod_inv(self.modulus(), self.group.exp_thread_threshold())?))
    }

    /// Element-wise powers.
    pub fn exp(&self, exponents: &PFieldElementArray) -> Result<Self, ArithmError> {
        self.group.pfield().check(exponents.field());
        Ok(self.with(self.values.mod_pow(
            exponents.values(),
            self.modulus(),
            self.group.exp_thread_threshold(),
        )?))
    }

    pub fn exp_scalar(&self, exponent: &PFieldElement) -> Result<Self, ArithmError> {
        self.group.pfield().check(exponent.field());
        Ok(self.with(self.values.mod_pow_scalar(
            exponent.value(),
            self.modulus(),
            self.group.exp_thread_threshold(),
        )?))
    }

    /// Product of the elements raised to the given exponents.
    pub fn exp_prod(&self, exponents: &PFieldElementArray) -> Result<ModPGroupElement, ArithmError> {
        self.group.pfield().check(exponents.field());
        let value = self.values.mod_pow_prod(
            exponents.values(),
            self.modulus(),
            self.group.exp_thread_threshold(),
        )?;
        Ok(ModPGroupElement::new(&self.group, value))
    }

    pub fn prod(&self) -> Result<ModPGroupElement, ArithmError> {
        Ok(ModPGroupElement::new(&self.group, self.values.mod_prod(self.modulus())?))
    }

    pub fn compare_to(&self, other: &ModPGroupElementArray) -> Result<Ordering, ArithmError> {
        self.group.check(&other.group);
        self.values.compare_to(&other.values)
    }

    pub fn equals_all(&self, other: &ModPGroupElementArray) -> Result<Vec<bool>, ArithmError> {
        self.group.check(&other.group);
        self.values.equals_all(&other.values)
    }

    pub fn equals(&self, other: &ModPGroupElementArray) -> Result<bool, ArithmError> {
        Ok(self.group == other.group && self.values.equals(&other.values)?)
    }

    pub fn permute(&self, permutation: &Permutation) -> Result<Self, ArithmError> {
        Ok(self.with(self.values.permute(permutation)?))
    }

    pub fn shift_push(&self, element: &ModPGroupElement) -> Result<Self, ArithmError> {
        self.group.check(&element.group);
        Ok(self.with(self.values.shift_push(&element.value)?))
    }

    pub fn copy_of_range(&self, start: usize, end: usize) -> Result<Self, ArithmError> {
        Ok(self.with(self.values.copy_of_range(start, end)?))
    }

    pub fn extract(&self, mask: &[bool]) -> Result<Self, ArithmError> {
        Ok(self.with(self.values.extract(mask)?))
    }

    pub fn to_byte_tree(&self) -> Result<ByteTree, ArithmError> {
        self.values.to_byte_tree_fixed(self.group.modulus_byte_length())
    }
}
