//! Prime order elliptic curve groups in short Weierstrass form.

use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use rand::RngCore;
use tracing::debug;

use crate::arithm::array::Backing;
use crate::arithm::exp_tab::{FixExpTab, Multiplier, infallible, sim_exp_prod};
use crate::arithm::ring::{PField, PFieldElement, PFieldElementArray};
use crate::arithm::{LargeInteger, Permutation};
use crate::eio::{ByteTree, ByteTreeReader};
use crate::errors::ArithmError;
use crate::util::{ArrayWorker, EXP_THREAD_THRESHOLD, MUL_THREAD_THRESHOLD};

use super::curves;

/// Number of candidate x-coordinates tried when encoding bytes.
const ENCODING_ATTEMPTS: u64 = 1 << 16;

#[derive(Debug)]
struct CurveData {
    name: Option<&'static str>,
    p: LargeInteger,
    a: LargeInteger,
    b: LargeInteger,
    gx: LargeInteger,
    gy: LargeInteger,
    field: PField,
    field_byte_length: usize,
    exp_threshold: AtomicUsize,
    mul_threshold: AtomicUsize,
}

/// Group of points of `y^2 = x^3 + a x + b` over the integers modulo a prime
/// `p`, of prime order `n` and cofactor one. Points are affine and the point
/// at infinity is represented as `(-1, -1)`.
#[derive(Debug, Clone)]
pub struct ECPGroup(Arc<CurveData>);

impl ECPGroup {
    /// The named curve `name`, see [`curves::names`].
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::InvalidParameters` for an unknown name.
    pub fn named(name: &str) -> Result<Self, ArithmError> {
        let params = curves::lookup(name)
            .ok_or_else(|| ArithmError::InvalidParameters(format!("Unknown curve: {}", name)))?;
        let parse = |s: &str| LargeInteger::from_str_radix(s, 16);
        let p = parse(params.p)?;
        let n = parse(params.n)?;
        let group = Self::with_params(
            Some(params.name),
            p,
            parse(params.a)?,
            parse(params.b)?,
            PField::with_prime_order(n),
            parse(params.gx)?,
            parse(params.gy)?,
        );
        debug!(curve = params.name, "instantiated named curve");
        Ok(group)
    }

    /// Curve with explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::InvalidModulus` if `p` or `n` is not prime, and
    /// `ArithmError::InvalidParameters` if the curve is singular, the
    /// coefficients or the generator are not canonical, the generator is not
    /// on the curve or not of order `n`, or the cofactor is not one.
    #[allow(clippy::too_many_arguments)]
    pub fn try_with<R: RngCore + ?Sized>(
        p: LargeInteger,
        a: LargeInteger,
        b: LargeInteger,
        n: LargeInteger,
        gx: LargeInteger,
        gy: LargeInteger,
        rng: &mut R,
        certainty: usize,
    ) -> Result<Self, ArithmError> {
        if p.signum() <= 0 || p.bit_length() < 3 || !p.is_probable_prime(rng, certainty) {
            return Err(ArithmError::InvalidModulus("The modulus is not an odd prime!".to_string()));
        }
        let field = PField::try_with(n, rng, certainty)?;
        let canonical = |v: &LargeInteger| v.signum() >= 0 && *v < p;
        if !canonical(&a) || !canonical(&b) || !canonical(&gx) || !canonical(&gy) {
            return Err(ArithmError::InvalidParameters("Non-canonical curve parameters!".to_string()));
        }

        let disc = LargeInteger::from(4)
            .mul(&a.mod_pow(&LargeInteger::from(3), &p))
            .add(&LargeInteger::from(27).mul(&b.mod_mul(&b, &p)))
            .modulo(&p);
        if disc.is_zero() {
            return Err(ArithmError::InvalidParameters("Singular curve!".to_string()));
        }

        // n > (p + 1 + 2 sqrt(p)) / 2 forces the cofactor to be one.
        let root = LargeInteger::from(p.magnitude().sqrt()).add(&LargeInteger::one());
        let hasse = p.add(&LargeInteger::one()).add(&root.shift_left(1));
        if field.order().shift_left(1) <= hasse {
            return Err(ArithmError::InvalidParameters("Cofactor is not one!".to_string()));
        }

        let group = Self::with_params(None, p, a, b, field, gx, gy);
        let g = group.generator();
        if !group.on_curve(&g.x, &g.y) {
            return Err(ArithmError::InvalidParameters("Generator is not on the curve!".to_string()));
        }
        if !g.mul_int(group.order()).is_identity() {
            return Err(ArithmError::InvalidParameters("Generator has wrong order!".to_string()));
        }
        Ok(group)
    }

    fn with_params(
        name: Option<&'static str>,
        p: LargeInteger,
        a: LargeInteger,
        b: LargeInteger,
        field: PField,
        gx: LargeInteger,
        gy: LargeInteger,
    ) -> Self {
        let field_byte_length = p.to_byte_array().len();
        ECPGroup(Arc::new(CurveData {
            name,
            p,
            a,
            b,
            gx,
            gy,
            field,
            field_byte_length,
            exp_threshold: AtomicUsize::new(EXP_THREAD_THRESHOLD),
            mul_threshold: AtomicUsize::new(MUL_THREAD_THRESHOLD),
        }))
    }

    /// Decodes the structure written by [`ECPGroup::to_byte_tree`].
    pub fn from_reader<R: RngCore + ?Sized>(
        reader: &mut ByteTreeReader<'_>,
        rng: &mut R,
        certainty: usize,
    ) -> Result<Self, ArithmError> {
        if reader.is_leaf() {
            return Self::named(&reader.read_string()?);
        }
        if reader.remaining() != 6 {
            return Err(ArithmError::format("Malformed ECPGroup!"));
        }
        let mut values = Vec::with_capacity(6);
        for _ in 0..6 {
            values.push(LargeInteger::from_reader(&mut reader.next_child()?)?);
        }
        let [p, a, b, n, gx, gy]: [LargeInteger; 6] = values
            .try_into()
            .map_err(|_| ArithmError::format("Malformed ECPGroup!"))?;
        Self::try_with(p, a, b, n, gx, gy, rng, certainty)
    }

    /// A named curve is written as its name. Other curves are written as the
    /// node of their parameters.
    pub fn to_byte_tree(&self) -> ByteTree {
        if let Some(name) = self.0.name {
            return ByteTree::from_string(name);
        }
        ByteTree::node(vec![
            self.0.p.to_byte_tree(),
            self.0.a.to_byte_tree(),
            self.0.b.to_byte_tree(),
            self.order().to_byte_tree(),
            self.0.gx.to_byte_tree(),
            self.0.gy.to_byte_tree(),
        ])
    }

    pub fn name(&self) -> Option<&'static str> {
        self.0.name
    }

    pub fn field_order(&self) -> &LargeInteger {
        &self.0.p
    }

    pub fn order(&self) -> &LargeInteger {
        self.0.field.order()
    }

    pub fn pfield(&self) -> &PField {
        &self.0.field
    }

    pub fn byte_length(&self) -> usize {
        5 + 2 * (5 + self.0.field_byte_length)
    }

    pub fn encode_length(&self) -> usize {
        ((self.0.p.bit_length() - 1) / 8).saturating_sub(6)
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

    fn rhs(&self, x: &LargeInteger) -> LargeInteger {
        let p = &self.0.p;
        x.mod_mul(x, p)
            .add(&self.0.a)
            .mod_mul(x, p)
            .add(&self.0.b)
            .modulo(p)
    }

    fn on_curve(&self, x: &LargeInteger, y: &LargeInteger) -> bool {
        y.mod_mul(y, &self.0.p) == self.rhs(x)
    }

    fn inv_mod_p(&self, value: &LargeInteger) -> LargeInteger {
        match value.mod_inv(&self.0.p) {
            Ok(inverse) => inverse,
            Err(e) => panic!("Zero denominator in point arithmetic: {}", e),
        }
    }

    pub fn identity(&self) -> ECPGroupElement {
        ECPGroupElement::new(self, LargeInteger::from(-1), LargeInteger::from(-1))
    }

    pub fn generator(&self) -> ECPGroupElement {
        ECPGroupElement::new(self, self.0.gx.clone(), self.0.gy.clone())
    }

    /// The point `(x, y)`, or the identity for `(-1, -1)`.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::Format` if the point is not on the curve.
    pub fn to_element(&self, x: LargeInteger, y: LargeInteger) -> Result<ECPGroupElement, ArithmError> {
        let minus_one = LargeInteger::from(-1);
        if x == minus_one && y == minus_one {
            return Ok(self.identity());
        }
        let p = &self.0.p;
        if x.signum() < 0 || x >= *p || y.signum() < 0 || y >= *p || !self.on_curve(&x, &y) {
            return Err(ArithmError::format("Not a group element!"));
        }
        Ok(ECPGroupElement::new(self, x, y))
    }

    pub fn random_element<R: RngCore + ?Sized>(&self, rng: &mut R, stat_dist: usize) -> ECPGroupElement {
        self.generator()
            .exp_int(&LargeInteger::random_mod(self.order(), stat_dist, rng))
    }

    /// Decodes a node of two coordinate leaves of the byte length of the
    /// field order.
    pub fn element_from_reader(&self, reader: &mut ByteTreeReader<'_>) -> Result<ECPGroupElement, ArithmError> {
        if reader.is_leaf() || reader.remaining() != 2 {
            return Err(ArithmError::format("Malformed point!"));
        }
        let len = self.0.field_byte_length;
        let x = LargeInteger::from_reader_exact(len, &mut reader.next_child()?)?;
        let y = LargeInteger::from_reader_exact(len, &mut reader.next_child()?)?;
        self.to_element(x, y)
    }

    /// Encodes at most [`ECPGroup::encode_length`] bytes in the x-coordinate
    /// of a point. The data and its length fill all but the 16 lowest bits,
    /// which are incremented until the x-coordinate lies on the curve.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::InternalError` if every candidate fails.
    pub fn encode(&self, bytes: &[u8]) -> Result<ECPGroupElement, ArithmError> {
        let len = bytes.len().min(self.encode_length());
        let data = LargeInteger::to_positive(&bytes[..len]);
        let base = data
            .shift_left(32)
            .add(&LargeInteger::from(len as u64))
            .shift_left(16);
        let p = &self.0.p;

        let mut x = base;
        for _ in 0..ENCODING_ATTEMPTS {
            let rhs = self.rhs(&x);
            if rhs.is_zero() {
                return Ok(ECPGroupElement::new(self, x, rhs));
            }
            if matches!(rhs.legendre(p), Ok(1)) {
                let y = rhs.mod_sqrt(p)?;
                let negated = p.sub(&y);
                let y = if negated < y { negated } else { y };
                return Ok(ECPGroupElement::new(self, x, y));
            }
            x = x.add(&LargeInteger::one());
        }
        Err(ArithmError::InternalError("Encoding failed!".to_string()))
    }

    pub fn element_array_from(
        &self,
        _backing: &Backing,
        elements: &[ECPGroupElement],
    ) -> Result<ECPGroupElementArray, ArithmError> {
        for el in elements {
            self.check(&el.group);
        }
        Ok(ECPGroupElementArray::new(self, elements.to_vec()))
    }

    pub fn fill_element_array(
        &self,
        _backing: &Backing,
        size: usize,
        element: &ECPGroupElement,
    ) -> Result<ECPGroupElementArray, ArithmError> {
        self.check(&element.group);
        Ok(ECPGroupElementArray::new(self, vec![element.clone(); size]))
    }

    pub fn random_element_array<R: RngCore + ?Sized>(
        &self,
        backing: &Backing,
        size: usize,
        rng: &mut R,
        stat_dist: usize,
    ) -> Result<ECPGroupElementArray, ArithmError> {
        let exponents = self.0.field.random_element_array(backing, size, rng, stat_dist)?;
        self.generator().exp_array(&exponents)
    }

    /// Decodes a node of `size` points, or of any number of points if `size`
    /// is zero.
    pub fn element_array_from_reader(
        &self,
        _backing: &Backing,
        size: usize,
        reader: &mut ByteTreeReader<'_>,
    ) -> Result<ECPGroupElementArray, ArithmError> {
        let size = if size == 0 { reader.remaining() } else { size };
        if reader.is_leaf() || reader.remaining() != size {
            return Err(ArithmError::format("Unexpected number of elements!"));
        }
        let mut values = Vec::with_capacity(size);
        for _ in 0..size {
            values.push(self.element_from_reader(&mut reader.next_child()?)?);
        }
        Ok(ECPGroupElementArray::new(self, values))
    }

    /// # Panics
    ///
    /// Panics if the groups are distinct.
    pub(crate) fn check(&self, other: &ECPGroup) {
        if self != other {
            super::distinct_groups();
        }
    }
}

impl Multiplier for ECPGroup {
    type Elem = ECPGroupElement;
    type Error = Infallible;

    fn one(&self) -> ECPGroupElement {
        self.identity()
    }

    fn mul(&self, a: &ECPGroupElement, b: &ECPGroupElement) -> Result<ECPGroupElement, Infallible> {
        Ok(a.mul(b))
    }

    fn square(&self, a: &ECPGroupElement) -> Result<ECPGroupElement, Infallible> {
        Ok(a.double())
    }
}

impl PartialEq for ECPGroup {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.p == other.0.p
                && self.0.a == other.0.a
                && self.0.b == other.0.b
                && self.order() == other.order()
                && self.0.gx == other.0.gx
                && self.0.gy == other.0.gy)
    }
}

impl Eq for ECPGroup {}

impl fmt::Display for ECPGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.name {
            Some(name) => write!(f, "ECPGroup({})", name),
            None => write!(f, "ECPGroup({} bits)", self.0.p.bit_length()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ECPGroupElement {
    group: ECPGroup,
    x: LargeInteger,
    y: LargeInteger,
}

impl ECPGroupElement {
    fn new(group: &ECPGroup, x: LargeInteger, y: LargeInteger) -> Self {
        ECPGroupElement {
            group: group.clone(),
            x,
            y,
        }
    }

    pub fn group(&self) -> &ECPGroup {
        &self.group
    }

    pub fn x(&self) -> &LargeInteger {
        &self.x
    }

    pub fn y(&self) -> &LargeInteger {
        &self.y
    }

    pub fn is_identity(&self) -> bool {
        self.x.signum() < 0
    }

    /// Point addition.
    pub fn mul(&self, other: &ECPGroupElement) -> ECPGroupElement {
        self.group.check(&other.group);
        if self.is_identity() {
            return other.clone();
        }
        if other.is_identity() {
            return self.clone();
        }
        let group = &self.group;
        let p = &group.0.p;
        if self.x == other.x {
            if self.y.add(&other.y).modulo(p).is_zero() {
                return group.identity();
            }
            return self.double();
        }
        let lambda = other
            .y
            .sub(&self.y)
            .mod_mul(&group.inv_mod_p(&other.x.sub(&self.x).modulo(p)), p);
        self.with_slope(&lambda, &other.x)
    }

    fn double(&self) -> ECPGroupElement {
        let group = &self.group;
        let p = &group.0.p;
        if self.is_identity() || self.y.is_zero() {
            return group.identity();
        }
        let numerator = LargeInteger::from(3)
            .mul(&self.x.mod_mul(&self.x, p))
            .add(&group.0.a);
        let lambda = numerator.mod_mul(&group.inv_mod_p(&self.y.shift_left(1).modulo(p)), p);
        self.with_slope(&lambda, &self.x)
    }

    fn with_slope(&self, lambda: &LargeInteger, other_x: &LargeInteger) -> ECPGroupElement {
        let p = &self.group.0.p;
        let x = lambda.mul(lambda).sub(&self.x).sub(other_x).modulo(p);
        let y = lambda.mul(&self.x.sub(&x)).sub(&self.y).modulo(p);
        ECPGroupElement::new(&self.group, x, y)
    }

    pub fn inv(&self) -> ECPGroupElement {
        if self.is_identity() {
            return self.clone();
        }
        let y = self.y.neg().modulo(&self.group.0.p);
        ECPGroupElement::new(&self.group, self.x.clone(), y)
    }

    pub fn div(&self, other: &ECPGroupElement) -> ECPGroupElement {
        self.mul(&other.inv())
    }

    pub fn exp(&self, exponent: &PFieldElement) -> ECPGroupElement {
        self.group.pfield().check(exponent.field());
        self.exp_int(exponent.value())
    }

    /// Scalar multiplication by the exponent reduced modulo the group order.
    pub fn exp_int(&self, exponent: &LargeInteger) -> ECPGroupElement {
        self.mul_int(&exponent.modulo(self.group.order()))
    }

    /// Double-and-add on a non-negative integer.
    fn mul_int(&self, k: &LargeInteger) -> ECPGroupElement {
        let mut res = self.group.identity();
        for i in (0..k.bit_length()).rev() {
            res = res.double();
            if k.test_bit(i) {
                res = res.mul(self);
            }
        }
        res
    }

    /// This point raised to every exponent of `exponents`, through a
    /// fixed-base table.
    pub fn exp_array(&self, exponents: &PFieldElementArray) -> Result<ECPGroupElementArray, ArithmError> {
        let group = &self.group;
        group.pfield().check(exponents.field());
        let exponents = exponents.values().integers()?;
        let bit_length = group.order().bit_length();
        let width = FixExpTab::<ECPGroup>::optimal_width(bit_length, exponents.len());
        let tab = infallible(FixExpTab::new(group, self, bit_length, width));
        let values = ArrayWorker::new(exponents.len(), group.exp_thread_threshold())
            .map(|i| infallible(tab.exp(&exponents[i])));
        Ok(ECPGroupElementArray::new(group, values))
    }

    /// Bytes encoded in this point by [`ECPGroup::encode`].
    pub fn decode(&self) -> Vec<u8> {
        if self.is_identity() {
            return Vec::new();
        }
        let v = self.x.shift_right(16);
        let data = v.shift_right(32);
        let len = v.sub(&data.shift_left(32)).to_u64().unwrap_or(u64::MAX);
        if len > self.group.encode_length() as u64 {
            return Vec::new();
        }
        let len = len as usize;
        let magnitude = data.magnitude().to_bytes_be();
        let mut res = vec![0u8; len];
        let n = len.min(magnitude.len());
        res[len - n..].copy_from_slice(&magnitude[magnitude.len() - n..]);
        res
    }

    pub fn to_byte_tree(&self) -> ByteTree {
        let len = self.group.0.field_byte_length;
        ByteTree::node(vec![self.x.to_byte_tree_fixed(len), self.y.to_byte_tree_fixed(len)])
    }

    /// Lexicographic order of the coordinates, the identity first.
    pub fn compare_to(&self, other: &ECPGroupElement) -> Ordering {
        self.group.check(&other.group);
        self.x.cmp(&other.x).then_with(|| self.y.cmp(&other.y))
    }
}

impl fmt::Display for ECPGroupElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_identity() {
            write!(f, "O")
        } else {
            write!(f, "({}, {})", self.x, self.y)
        }
    }
}

/// Array of points, held in memory whatever the requested backing.
#[derive(Debug, Clone)]
pub struct ECPGroupElementArray {
    group: ECPGroup,
    values: Arc<Vec<ECPGroupElement>>,
}

impl ECPGroupElementArray {
    fn new(group: &ECPGroup, values: Vec<ECPGroupElement>) -> Self {
        ECPGroupElementArray {
            group: group.clone(),
            values: Arc::new(values),
        }
    }

    fn with(&self, values: Vec<ECPGroupElement>) -> Self {
        ECPGroupElementArray::new(&self.group, values)
    }

    fn check_size(&self, size: usize, what: &str) -> Result<(), ArithmError> {
        if self.size() != size {
            return Err(ArithmError::mismatch(what, self.size(), size));
        }
        Ok(())
    }

    pub fn group(&self) -> &ECPGroup {
        &self.group
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, index: usize) -> Result<ECPGroupElement, ArithmError> {
        self.values
            .get(index)
            .cloned()
            .ok_or_else(|| ArithmError::InvalidParameters(format!("Index out of bounds: {}", index)))
    }

    pub fn elements(&self) -> Result<Vec<ECPGroupElement>, ArithmError> {
        Ok(self.values.to_vec())
    }

    pub fn mul(&self, other: &ECPGroupElementArray) -> Result<Self, ArithmError> {
        self.group.check(&other.group);
        self.check_size(other.size(), "point additions")?;
        let values = ArrayWorker::new(self.size(), self.group.mul_thread_threshold())
            .map(|i| self.values[i].mul(&other.values[i]));
        Ok(self.with(values))
    }

    pub fn mul_scalar(&self, factor: &ECPGroupElement) -> Result<Self, ArithmError> {
        self.group.check(&factor.group);
        let values = ArrayWorker::new(self.size(), self.group.mul_thread_threshold())
            .map(|i| self.values[i].mul(factor));
        Ok(self.with(values))
    }

    pub fn inv(&self) -> Result<Self, ArithmError> {
        Ok(self.with(self.values.iter().map(ECPGroupElement::inv).collect()))
    }

    pub fn exp(&self, exponents: &PFieldElementArray) -> Result<Self, ArithmError> {
        self.group.pfield().check(exponents.field());
        self.check_size(exponents.size(), "point multiplications")?;
        let exponents = exponents.values().integers()?;
        let values = ArrayWorker::new(self.size(), self.group.exp_thread_threshold())
            .map(|i| self.values[i].exp_int(&exponents[i]));
        Ok(self.with(values))
    }

    pub fn exp_scalar(&self, exponent: &PFieldElement) -> Result<Self, ArithmError> {
        self.group.pfield().check(exponent.field());
        let values = ArrayWorker::new(self.size(), self.group.exp_thread_threshold())
            .map(|i| self.values[i].exp_int(exponent.value()));
        Ok(self.with(values))
    }

    /// Product of the points raised to the given exponents, through
    /// simultaneous tables.
    pub fn exp_prod(&self, exponents: &PFieldElementArray) -> Result<ECPGroupElement, ArithmError> {
        self.group.pfield().check(exponents.field());
        self.check_size(exponents.size(), "power product")?;
        let exponents = exponents.values().integers()?;
        Ok(infallible(sim_exp_prod(
            &self.group,
            &self.values,
            &exponents,
            self.group.exp_thread_threshold(),
        )))
    }

    pub fn prod(&self) -> Result<ECPGroupElement, ArithmError> {
        Ok(self
            .values
            .iter()
            .fold(self.group.identity(), |acc, el| acc.mul(el)))
    }

    pub fn compare_to(&self, other: &ECPGroupElementArray) -> Result<Ordering, ArithmError> {
        self.group.check(&other.group);
        self.check_size(other.size(), "comparison")?;
        Ok(self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a.compare_to(b))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal))
    }

    pub fn equals_all(&self, other: &ECPGroupElementArray) -> Result<Vec<bool>, ArithmError> {
        self.group.check(&other.group);
        self.check_size(other.size(), "comparison")?;
        Ok(self.values.iter().zip(other.values.iter()).map(|(a, b)| a == b).collect())
    }

    pub fn equals(&self, other: &ECPGroupElementArray) -> Result<bool, ArithmError> {
        Ok(self.group == other.group && self.values == other.values)
    }

    pub fn permute(&self, permutation: &Permutation) -> Result<Self, ArithmError> {
        Ok(self.with(permutation.apply(&self.values)?))
    }

    pub fn shift_push(&self, element: &ECPGroupElement) -> Result<Self, ArithmError> {
        self.group.check(&element.group);
        if self.values.is_empty() {
            return Ok(self.clone());
        }
        let mut values = self.values[1..].to_vec();
        values.push(element.clone());
        Ok(self.with(values))
    }

    pub fn copy_of_range(&self, start: usize, end: usize) -> Result<Self, ArithmError> {
        if start > end || end > self.size() {
            return Err(ArithmError::InvalidParameters(format!(
                "Invalid range {}..{} of {} elements!",
                start,
                end,
                self.size()
            )));
        }
        Ok(self.with(self.values[start..end].to_vec()))
    }

    pub fn extract(&self, mask: &[bool]) -> Result<Self, ArithmError> {
        self.check_size(mask.len(), "mask")?;
        Ok(self.with(
            self.values
                .iter()
                .zip(mask)
                .filter(|(_, keep)| **keep)
                .map(|(el, _)| el.clone())
                .collect(),
        ))
    }

    pub fn to_byte_tree(&self) -> Result<ByteTree, ArithmError> {
        Ok(ByteTree::node(self.values.iter().map(ECPGroupElement::to_byte_tree).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    // y^2 = x^3 + 2x + 3 over F_97, only used for the point arithmetic.
    fn toy_curve() -> ECPGroup {
        ECPGroup::with_params(
            None,
            LargeInteger::from(97),
            LargeInteger::from(2),
            LargeInteger::from(3),
            PField::with_prime_order(LargeInteger::from(5)),
            LargeInteger::from(3),
            LargeInteger::from(6),
        )
    }

    #[test]
    fn test_point_arithmetic_on_toy_curve() {
        let group = toy_curve();
        let g = group.generator();
        assert!(group.on_curve(g.x(), g.y()));
        let doubled = g.double();
        assert_eq!((doubled.x(), doubled.y()), (&LargeInteger::from(80), &LargeInteger::from(10)));
        assert_eq!(g.mul(&g), doubled);
        assert!(g.mul(&g.inv()).is_identity());
        assert_eq!(g.mul(&group.identity()), g);
        let tripled = doubled.mul(&g);
        assert!(group.on_curve(tripled.x(), tripled.y()));
        assert_eq!(tripled.div(&g), doubled);
    }

    #[test]
    fn test_named_curves_have_generators_of_the_group_order() -> Result<(), ArithmError> {
        for name in ["P-256", "secp256k1"] {
            let group = ECPGroup::named(name)?;
            let g = group.generator();
            assert!(group.on_curve(g.x(), g.y()));
            assert!(g.mul_int(group.order()).is_identity());
            assert_eq!(g.exp_int(&group.order().sub(&LargeInteger::one())), g.inv());
            assert_eq!(group.encode_length(), 25);
        }
        assert_eq!(ECPGroup::named("prime256v1")?, ECPGroup::named("P-256")?);
        assert!(ECPGroup::named("P-1024").is_err());
        Ok(())
    }

    #[test]
    fn test_explicit_parameters_are_validated() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(9);
        let named = ECPGroup::named("secp256k1")?;
        let tree = ByteTree::node(vec![
            named.field_order().to_byte_tree(),
            LargeInteger::zero().to_byte_tree(),
            LargeInteger::from(7).to_byte_tree(),
            named.order().to_byte_tree(),
            named.generator().x().to_byte_tree(),
            named.generator().y().to_byte_tree(),
        ]);
        let explicit = ECPGroup::from_reader(&mut tree.reader(), &mut rng, 40)?;
        assert_eq!(explicit, named);
        assert!(explicit.name().is_none());

        let bad = ECPGroup::try_with(
            named.field_order().clone(),
            LargeInteger::zero(),
            LargeInteger::from(7),
            named.order().clone(),
            named.generator().x().clone(),
            named.generator().y().add(&LargeInteger::one()),
            &mut rng,
            40,
        );
        assert!(matches!(bad, Err(ArithmError::InvalidParameters(_))));
        Ok(())
    }

    #[test]
    fn test_group_laws() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(10);
        let group = ECPGroup::named("P-256")?;
        let field = group.pfield();
        let g = group.random_element(&mut rng, 50);
        let h = group.random_element(&mut rng, 50);
        let x = field.random_element(&mut rng, 50);
        let y = field.random_element(&mut rng, 50);
        assert_eq!(g.exp(&x).exp(&y), g.exp(&x.mul(&y)));
        assert_eq!(g.mul(&h).exp(&x), g.exp(&x).mul(&h.exp(&x)));
        assert!(g.exp(&field.zero()).is_identity());
        Ok(())
    }

    #[test]
    fn test_encoding_round_trips() -> Result<(), ArithmError> {
        let group = ECPGroup::named("secp256k1")?;
        for len in [0usize, 1, 7, 25] {
            let bytes: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(29)).collect();
            let el = group.encode(&bytes)?;
            assert!(group.on_curve(el.x(), el.y()));
            assert_eq!(el.decode(), bytes);
        }
        let long = vec![0xAB; 40];
        assert_eq!(group.encode(&long)?.decode(), vec![0xAB; 25]);
        Ok(())
    }

    #[test]
    fn test_element_decoding() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(11);
        let group = ECPGroup::named("P-256")?;
        let el = group.random_element(&mut rng, 50);
        assert_eq!(group.element_from_reader(&mut el.to_byte_tree().reader())?, el);
        let identity = group.identity();
        assert_eq!(group.element_from_reader(&mut identity.to_byte_tree().reader())?, identity);

        let off_curve = ByteTree::node(vec![
            el.x().to_byte_tree_fixed(33),
            el.y().add(&LargeInteger::one()).to_byte_tree_fixed(33),
        ]);
        assert!(group.element_from_reader(&mut off_curve.reader()).is_err());
        Ok(())
    }

    #[test]
    fn test_arrays_match_elements() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(12);
        let group = ECPGroup::named("secp256k1")?;
        let backing = Backing::Memory;
        let bases = group.random_element_array(&backing, 4, &mut rng, 50)?;
        let exponents = group.pfield().random_element_array(&backing, 4, &mut rng, 50)?;
        let expected: Vec<_> = bases
            .elements()?
            .iter()
            .zip(exponents.elements()?)
            .map(|(b, e)| b.exp(&e))
            .collect();
        assert_eq!(bases.exp(&exponents)?.elements()?, expected);

        let prod = expected.iter().fold(group.identity(), |acc, el| acc.mul(el));
        assert_eq!(bases.exp_prod(&exponents)?, prod);

        let tree = bases.to_byte_tree()?;
        let decoded = group.element_array_from_reader(&backing, 4, &mut tree.reader())?;
        assert!(decoded.equals(&bases)?);
        Ok(())
    }
}
