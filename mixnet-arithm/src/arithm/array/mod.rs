//! # Arrays of large integers
//!
//! [`LargeIntegerArray`] is an immutable, fixed-length sequence of
//! [`LargeInteger`]s kept either in memory or in a temporary file. Both
//! backings provide the same operations with identical results. A file array
//! is processed in batches, so the memory used by an operation is bounded by
//! the batch size of its [`FileStore`] and not by the size of the array.
//!
//! The backing is chosen through an explicit [`Backing`] value. Arrays derived
//! from an array by an operation inherit its backing.

mod batches;
pub mod file;
pub mod iterator;

use std::cmp::Ordering;
use std::io::{Read, Write};
use std::sync::Arc;

use rand::RngCore;

use crate::eio::{ByteTree, ByteTreeReader, ByteTreeStreamReader, ByteTreeWriter};
use crate::errors::ArithmError;

use super::large_integer::batch;
use super::{LargeInteger, Permutation};

use batches::{ArrayBuilder, Batches};

pub use file::{FileArray, FileStore};
pub use iterator::LargeIntegerIterator;

/// Number of integers per batch of a file backing.
pub const DEFAULT_BATCH_SIZE: usize = 100_000;
/// Number of records sorted in memory per run of an external sort.
pub const DEFAULT_SORT_THRESHOLD: usize = 100_000;

/// Where newly constructed arrays are stored.
#[derive(Debug, Clone, Default)]
pub enum Backing {
    #[default]
    Memory,
    File(Arc<FileStore>),
}

impl Backing {
    pub fn file(store: FileStore) -> Self {
        Backing::File(Arc::new(store))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Backing::File(_))
    }

    fn batch_size(&self) -> usize {
        match self {
            Backing::Memory => usize::MAX,
            Backing::File(store) => store.batch_size(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum LargeIntegerArray {
    Memory(Arc<Vec<LargeInteger>>),
    File(FileArray),
}

impl LargeIntegerArray {
    pub fn from_vec(backing: &Backing, values: Vec<LargeInteger>) -> Result<Self, ArithmError> {
        let mut builder = ArrayBuilder::new(backing, values.len())?;
        builder.extend(values)?;
        builder.finish()
    }

    /// Concatenation of the arrays, in order.
    pub fn from_arrays(backing: &Backing, arrays: &[LargeIntegerArray]) -> Result<Self, ArithmError> {
        let size = arrays.iter().map(LargeIntegerArray::size).sum();
        let mut builder = ArrayBuilder::new(backing, size)?;
        for array in arrays {
            for part in array.batches(backing.batch_size().min(array.batch_size()))? {
                builder.extend_from_slice(&part?)?;
            }
        }
        builder.finish()
    }

    /// Array of `size` copies of `value`.
    pub fn fill(backing: &Backing, size: usize, value: &LargeInteger) -> Result<Self, ArithmError> {
        let mut builder = ArrayBuilder::new(backing, size)?;
        for _ in 0..size {
            builder.push(value.clone())?;
        }
        builder.finish()
    }

    /// Array of uniformly random integers in `[0, 2^bit_length)`.
    pub fn random<R: RngCore + ?Sized>(
        backing: &Backing,
        size: usize,
        bit_length: usize,
        rng: &mut R,
    ) -> Result<Self, ArithmError> {
        Self::generate(backing, size, |n| LargeInteger::random_array(n, bit_length, rng))
    }

    /// Array of random integers in `[0, modulus)` with statistical distance at
    /// most `2^-stat_dist` from uniform.
    pub fn random_mod<R: RngCore + ?Sized>(
        backing: &Backing,
        size: usize,
        modulus: &LargeInteger,
        stat_dist: usize,
        rng: &mut R,
    ) -> Result<Self, ArithmError> {
        Self::generate(backing, size, |n| {
            LargeInteger::random_mod_array(n, modulus, stat_dist, rng)
        })
    }

    fn generate<F>(backing: &Backing, size: usize, mut next: F) -> Result<Self, ArithmError>
    where
        F: FnMut(usize) -> Vec<LargeInteger>,
    {
        let mut builder = ArrayBuilder::new(backing, size)?;
        let mut remaining = size;
        while remaining > 0 {
            let n = backing.batch_size().min(remaining);
            builder.extend(next(n))?;
            remaining -= n;
        }
        builder.finish()
    }

    /// Decodes a node of `size` integers in `[lb, ub)`, each with the byte
    /// length of `ub`. A `size` of zero accepts any number of integers.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::Format` on a wrong number of integers, a wrong
    /// byte length or an integer outside the interval.
    pub fn from_reader(
        backing: &Backing,
        size: usize,
        reader: &mut ByteTreeReader<'_>,
        lb: &LargeInteger,
        ub: &LargeInteger,
    ) -> Result<Self, ArithmError> {
        let values = LargeInteger::decode_integers(size, reader, lb, ub)?;
        Self::from_vec(backing, values)
    }

    /// Streaming variant of [`LargeIntegerArray::from_reader`] that reads an
    /// encoded node from `input` one integer at a time.
    pub fn read_from<R: Read>(
        backing: &Backing,
        size: usize,
        input: R,
        lb: &LargeInteger,
        ub: &LargeInteger,
    ) -> Result<Self, ArithmError> {
        let mut stream = ByteTreeStreamReader::new(input)?;
        let size = if size == 0 { stream.remaining() } else { size };
        if stream.remaining() != size {
            return Err(ArithmError::format("Unexpected number of integers!"));
        }
        let expected = ub.to_byte_array().len();
        let mut builder = ArrayBuilder::new(backing, size)?;
        for _ in 0..size {
            let bytes = stream.next_leaf()?;
            if bytes.len() != expected {
                return Err(ArithmError::format(format!(
                    "Unexpected byte length ({} vs {})!",
                    bytes.len(),
                    expected
                )));
            }
            let value = LargeInteger::from_byte_array(&bytes)?;
            if value < *lb || value >= *ub {
                return Err(ArithmError::format("Integer is outside permitted interval!"));
            }
            builder.push(value)?;
        }
        builder.finish()
    }

    pub fn size(&self) -> usize {
        match self {
            LargeIntegerArray::Memory(values) => values.len(),
            LargeIntegerArray::File(array) => array.size(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn backing(&self) -> Backing {
        match self {
            LargeIntegerArray::Memory(_) => Backing::Memory,
            LargeIntegerArray::File(array) => Backing::File(Arc::clone(array.store())),
        }
    }

    fn batch_size(&self) -> usize {
        match self {
            LargeIntegerArray::Memory(_) => usize::MAX,
            LargeIntegerArray::File(array) => array.store().batch_size(),
        }
    }

    pub(crate) fn batches(&self, batch_size: usize) -> Result<Batches<'_>, ArithmError> {
        let batch_size = batch_size.max(1);
        Ok(match self {
            LargeIntegerArray::Memory(values) => Batches::Memory {
                values: values.as_slice(),
                batch_size,
            },
            LargeIntegerArray::File(array) => Batches::File {
                stream: array.stream()?,
                batch_size,
            },
        })
    }

    /// Forward-only pass over the integers.
    pub fn iter(&self) -> Result<LargeIntegerIterator<'_>, ArithmError> {
        Ok(match self {
            LargeIntegerArray::Memory(values) => LargeIntegerIterator::Memory(values.iter()),
            LargeIntegerArray::File(array) => LargeIntegerIterator::File {
                stream: array.stream()?,
                failed: false,
            },
        })
    }

    /// Integer at `index`. This takes linear time for a file backing and must
    /// not be used to traverse an array, see [`LargeIntegerArray::iter`].
    pub fn get(&self, index: usize) -> Result<LargeInteger, ArithmError> {
        if index >= self.size() {
            return Err(ArithmError::InvalidParameters(format!(
                "Index {} out of bounds for size {}!",
                index,
                self.size()
            )));
        }
        match self {
            LargeIntegerArray::Memory(values) => Ok(values[index].clone()),
            LargeIntegerArray::File(_) => self
                .iter()?
                .nth(index)
                .unwrap_or_else(|| Err(ArithmError::InternalError("Array file is truncated!".to_string()))),
        }
    }

    /// All integers, in memory.
    pub fn integers(&self) -> Result<Vec<LargeInteger>, ArithmError> {
        match self {
            LargeIntegerArray::Memory(values) => Ok(values.as_ref().clone()),
            LargeIntegerArray::File(_) => self.iter()?.collect(),
        }
    }

    /// Copy of this array in another backing.
    pub fn to_backing(&self, backing: &Backing) -> Result<Self, ArithmError> {
        Self::from_arrays(backing, std::slice::from_ref(self))
    }

    fn check_size(&self, what: &str, other: &LargeIntegerArray) -> Result<(), ArithmError> {
        if self.size() != other.size() {
            return Err(ArithmError::mismatch(what, self.size(), other.size()));
        }
        Ok(())
    }

    fn map_batches<F>(&self, mut f: F) -> Result<Self, ArithmError>
    where
        F: FnMut(&[LargeInteger]) -> Result<Vec<LargeInteger>, ArithmError>,
    {
        let mut builder = ArrayBuilder::new(&self.backing(), self.size())?;
        for part in self.batches(self.batch_size())? {
            builder.extend(f(&part?)?)?;
        }
        builder.finish()
    }

    fn zip_batches<F>(&self, other: &LargeIntegerArray, what: &str, mut f: F) -> Result<Self, ArithmError>
    where
        F: FnMut(&[LargeInteger], &[LargeInteger]) -> Result<Vec<LargeInteger>, ArithmError>,
    {
        self.check_size(what, other)?;
        let batch_size = self.batch_size().min(other.batch_size());
        let mut builder = ArrayBuilder::new(&self.backing(), self.size())?;
        for (left, right) in self.batches(batch_size)?.zip(other.batches(batch_size)?) {
            builder.extend(f(&left?, &right?)?)?;
        }
        builder.finish()
    }

    fn fold_batches<T, F>(&self, init: T, mut f: F) -> Result<T, ArithmError>
    where
        F: FnMut(T, usize, &[LargeInteger]) -> Result<T, ArithmError>,
    {
        let mut acc = init;
        let mut offset = 0;
        for part in self.batches(self.batch_size())? {
            let part = part?;
            acc = f(acc, offset, &part)?;
            offset += part.len();
        }
        Ok(acc)
    }

    fn zip_fold<T, F>(&self, other: &LargeIntegerArray, what: &str, init: T, mut f: F) -> Result<T, ArithmError>
    where
        F: FnMut(T, &[LargeInteger], &[LargeInteger]) -> Result<T, ArithmError>,
    {
        self.check_size(what, other)?;
        let batch_size = self.batch_size().min(other.batch_size());
        let mut acc = init;
        for (left, right) in self.batches(batch_size)?.zip(other.batches(batch_size)?) {
            acc = f(acc, &left?, &right?)?;
        }
        Ok(acc)
    }

    /// Canonical residues modulo `modulus`.
    pub fn modulo(&self, modulus: &LargeInteger) -> Result<Self, ArithmError> {
        self.map_batches(|part| Ok(part.iter().map(|x| x.modulo(modulus)).collect()))
    }

    pub fn mod_add(&self, other: &LargeIntegerArray, modulus: &LargeInteger) -> Result<Self, ArithmError> {
        self.zip_batches(other, "modular sums", |a, b| batch::mod_add_all(a, b, modulus))
    }

    pub fn mod_add_scalar(&self, scalar: &LargeInteger, modulus: &LargeInteger) -> Result<Self, ArithmError> {
        self.map_batches(|part| Ok(batch::mod_add_scalar(part, scalar, modulus)))
    }

    pub fn mod_neg(&self, modulus: &LargeInteger) -> Result<Self, ArithmError> {
        self.map_batches(|part| Ok(batch::mod_neg_all(part, modulus)))
    }

    pub fn mod_mul(
        &self,
        other: &LargeIntegerArray,
        modulus: &LargeInteger,
        threshold: usize,
    ) -> Result<Self, ArithmError> {
        self.zip_batches(other, "modular products", |a, b| {
            batch::mod_mul_all(a, b, modulus, threshold)
        })
    }

    pub fn mod_mul_scalar(
        &self,
        scalar: &LargeInteger,
        modulus: &LargeInteger,
        threshold: usize,
    ) -> Result<Self, ArithmError> {
        self.map_batches(|part| Ok(batch::mod_mul_scalar(part, scalar, modulus, threshold)))
    }

    /// Element-wise powers to the exponents of `exponents`.
    pub fn mod_pow(
        &self,
        exponents: &LargeIntegerArray,
        modulus: &LargeInteger,
        threshold: usize,
    ) -> Result<Self, ArithmError> {
        self.zip_batches(exponents, "modular powers", |b, e| {
            batch::mod_pow_all(b, e, modulus, threshold)
        })
    }

    pub fn mod_pow_scalar(
        &self,
        exponent: &LargeInteger,
        modulus: &LargeInteger,
        threshold: usize,
    ) -> Result<Self, ArithmError> {
        self.map_batches(|part| batch::mod_pow_scalar(part, exponent, modulus, threshold))
    }

    /// `basis` raised to every integer of this array, through a fixed-base
    /// table.
    pub fn mod_pow_variant(
        &self,
        basis: &LargeInteger,
        modulus: &LargeInteger,
        threshold: usize,
    ) -> Result<Self, ArithmError> {
        self.map_batches(|part| batch::mod_pow_fixed(basis, part, modulus, threshold))
    }

    /// Element-wise inverses.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::NoInverse` if any integer is not invertible.
    pub fn mod_inv(&self, modulus: &LargeInteger, threshold: usize) -> Result<Self, ArithmError> {
        self.map_batches(|part| batch::mod_inv_all(part, modulus, threshold))
    }

    /// Product of this array's integers raised to the given exponents.
    pub fn mod_pow_prod(
        &self,
        exponents: &LargeIntegerArray,
        modulus: &LargeInteger,
        threshold: usize,
    ) -> Result<LargeInteger, ArithmError> {
        self.zip_fold(exponents, "power product", LargeInteger::one().modulo(modulus), |acc, b, e| {
            Ok(acc.mod_mul(&batch::mod_pow_prod(b, e, modulus, threshold)?, modulus))
        })
    }

    /// Running products: the integer at index `i` of the output is the
    /// product of the integers at indices `0..=i`.
    pub fn mod_prods(&self, modulus: &LargeInteger) -> Result<Self, ArithmError> {
        let mut agg = LargeInteger::one();
        self.map_batches(|part| {
            let res = batch::mod_prods(&agg, part, modulus);
            if let Some(last) = res.last() {
                agg = last.clone();
            }
            Ok(res)
        })
    }

    /// Linear recurrence with this array as terms:
    /// `out[0] = self[0]`, `out[i] = out[i - 1] * scalars[i] + self[i]`.
    /// Returns the output and its last integer, which is zero for an empty
    /// array.
    pub fn mod_rec_lin(
        &self,
        scalars: &LargeIntegerArray,
        modulus: &LargeInteger,
    ) -> Result<(Self, LargeInteger), ArithmError> {
        let mut carry: Option<LargeInteger> = None;
        let res = self.zip_batches(scalars, "recurrence", |terms, scalars| {
            let out = batch::mod_rec_lin(carry.as_ref(), scalars, terms, modulus)?;
            if let Some(last) = out.last() {
                carry = Some(last.clone());
            }
            Ok(out)
        })?;
        Ok((res, carry.unwrap_or_default()))
    }

    pub fn mod_sum(&self, modulus: &LargeInteger) -> Result<LargeInteger, ArithmError> {
        self.fold_batches(LargeInteger::zero(), |acc, _, part| {
            Ok(acc.add(&batch::mod_sum(part, modulus)).modulo(modulus))
        })
    }

    pub fn mod_prod(&self, modulus: &LargeInteger) -> Result<LargeInteger, ArithmError> {
        self.fold_batches(LargeInteger::one().modulo(modulus), |acc, _, part| {
            Ok(acc.mod_mul(&batch::mod_prod(part, modulus), modulus))
        })
    }

    pub fn mod_inner(&self, other: &LargeIntegerArray, modulus: &LargeInteger) -> Result<LargeInteger, ArithmError> {
        self.zip_fold(other, "inner product", LargeInteger::zero(), |acc, a, b| {
            Ok(acc.add(&batch::mod_inner(a, b, modulus)?).modulo(modulus))
        })
    }

    /// Tests if every integer is a quadratic residue modulo the odd prime.
    pub fn quadratic_residues(&self, prime: &LargeInteger, threshold: usize) -> Result<bool, ArithmError> {
        self.fold_batches(true, |acc, _, part| {
            Ok(acc && batch::quadratic_residues(part, prime, threshold)?)
        })
    }

    /// Lexicographic comparison of arrays of equal size.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::DimensionMismatch` for arrays of different sizes.
    pub fn compare_to(&self, other: &LargeIntegerArray) -> Result<Ordering, ArithmError> {
        self.zip_fold(other, "comparison", Ordering::Equal, |ord, a, b| {
            if ord != Ordering::Equal {
                return Ok(ord);
            }
            batch::compare_all(a, b)
        })
    }

    pub fn equals_all(&self, other: &LargeIntegerArray) -> Result<Vec<bool>, ArithmError> {
        self.zip_fold(other, "comparison", Vec::with_capacity(self.size()), |mut acc, a, b| {
            acc.extend(batch::equals_all(a, b)?);
            Ok(acc)
        })
    }

    /// Equality of content, regardless of backing.
    pub fn equals(&self, other: &LargeIntegerArray) -> Result<bool, ArithmError> {
        if self.size() != other.size() {
            return Ok(false);
        }
        Ok(self.compare_to(other)? == Ordering::Equal)
    }

    /// The integers at indices `start..end`.
    pub fn copy_of_range(&self, start: usize, end: usize) -> Result<Self, ArithmError> {
        if start > end || end > self.size() {
            return Err(ArithmError::InvalidParameters(format!(
                "Illegal range {}..{} for size {}!",
                start,
                end,
                self.size()
            )));
        }
        let mut builder = ArrayBuilder::new(&self.backing(), end - start)?;
        self.fold_batches((), |_, offset, part| {
            let from = start.clamp(offset, offset + part.len()) - offset;
            let to = end.clamp(offset, offset + part.len()) - offset;
            builder.extend_from_slice(&part[from..to])
        })?;
        builder.finish()
    }

    /// The integers at the indices where `mask` is set.
    pub fn extract(&self, mask: &[bool]) -> Result<Self, ArithmError> {
        if mask.len() != self.size() {
            return Err(ArithmError::mismatch("extraction", self.size(), mask.len()));
        }
        let count = mask.iter().filter(|&&b| b).count();
        let mut builder = ArrayBuilder::new(&self.backing(), count)?;
        self.fold_batches((), |_, offset, part| {
            for (value, &keep) in part.iter().zip(&mask[offset..]) {
                if keep {
                    builder.push(value.clone())?;
                }
            }
            Ok(())
        })?;
        builder.finish()
    }

    /// Moves the integer at index `i` to index `permutation.map(i)`. A file
    /// array is permuted by an external sort on the destination index.
    pub fn permute(&self, permutation: &Permutation) -> Result<Self, ArithmError> {
        match self {
            LargeIntegerArray::Memory(values) => {
                Ok(LargeIntegerArray::Memory(Arc::new(permutation.apply(values)?)))
            }
            LargeIntegerArray::File(array) => Ok(LargeIntegerArray::File(array.permute(permutation)?)),
        }
    }

    /// Shifts every integer one step to the right, dropping the last one, and
    /// puts `value` first.
    pub fn shift_push(&self, value: &LargeInteger) -> Result<Self, ArithmError> {
        let size = self.size();
        if size == 0 {
            return Ok(self.clone());
        }
        let mut builder = ArrayBuilder::new(&self.backing(), size)?;
        builder.push(value.clone())?;
        self.fold_batches((), |_, offset, part| {
            let keep = (size - 1).saturating_sub(offset).min(part.len());
            builder.extend_from_slice(&part[..keep])
        })?;
        builder.finish()
    }

    /// Node of leaves with minimal two's complement encodings. This loads
    /// the whole array into memory.
    pub fn to_byte_tree(&self) -> Result<ByteTree, ArithmError> {
        Ok(LargeInteger::to_byte_tree_all(&self.integers()?))
    }

    /// Node of leaves of exactly `len` bytes each.
    pub fn to_byte_tree_fixed(&self, len: usize) -> Result<ByteTree, ArithmError> {
        Ok(LargeInteger::to_byte_tree_fixed_all(len, &self.integers()?))
    }

    /// Streams the encoding of [`LargeIntegerArray::to_byte_tree`] to `out`.
    pub fn write_byte_tree<W: Write>(&self, out: W) -> Result<W, ArithmError> {
        self.write_leaves(out, LargeInteger::to_byte_array)
    }

    /// Streams the encoding of [`LargeIntegerArray::to_byte_tree_fixed`] to `out`.
    pub fn write_byte_tree_fixed<W: Write>(&self, len: usize, out: W) -> Result<W, ArithmError> {
        self.write_leaves(out, |value| value.to_fixed_bytes(len))
    }

    fn write_leaves<W, F>(&self, out: W, encode: F) -> Result<W, ArithmError>
    where
        W: Write,
        F: Fn(&LargeInteger) -> Vec<u8>,
    {
        let mut writer = ByteTreeWriter::new(out, self.size())?;
        for value in self.iter()? {
            writer.write_leaf(&encode(&value?))?;
        }
        Ok(writer.finish()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eio::StorageDir;
    use crate::util::{EXP_THREAD_THRESHOLD, MUL_THREAD_THRESHOLD};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn file_backing() -> Result<Backing, ArithmError> {
        let dir = StorageDir::create_in(std::env::temp_dir())?;
        Ok(Backing::file(FileStore::new(dir, 7, 5)))
    }

    fn pair(size: usize, seed: u64) -> Result<(LargeIntegerArray, LargeIntegerArray), ArithmError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let modulus = modulus();
        let memory = LargeIntegerArray::random_mod(&Backing::Memory, size, &modulus, 20, &mut rng)?;
        let file = memory.to_backing(&file_backing()?)?;
        Ok((memory, file))
    }

    fn modulus() -> LargeInteger {
        LargeInteger::from(1_000_000_007u64)
    }

    fn same(a: &LargeIntegerArray, b: &LargeIntegerArray) -> Result<bool, ArithmError> {
        Ok(a.to_byte_tree()? == b.to_byte_tree()?)
    }

    #[test]
    fn test_backings_agree_on_element_wise_operations() -> Result<(), ArithmError> {
        let m = modulus();
        let (a, fa) = pair(30, 1)?;
        let (b, fb) = pair(30, 2)?;
        assert!(fa.backing().is_file());

        assert!(same(&a.mod_add(&b, &m)?, &fa.mod_add(&fb, &m)?)?);
        assert!(same(&a.mod_neg(&m)?, &fa.mod_neg(&m)?)?);
        assert!(same(&a.mod_mul(&b, &m, 4)?, &fa.mod_mul(&fb, &m, 4)?)?);
        assert!(same(&a.mod_pow(&b, &m, 4)?, &fa.mod_pow(&fb, &m, 4)?)?);
        assert!(same(&a.mod_inv(&m, 4)?, &fa.mod_inv(&m, 4)?)?);
        assert!(same(&a.mod_prods(&m)?, &fa.mod_prods(&m)?)?);
        assert!(same(&a.mod_rec_lin(&b, &m)?.0, &fa.mod_rec_lin(&fb, &m)?.0)?);
        assert_eq!(a.mod_rec_lin(&b, &m)?.1, fa.mod_rec_lin(&fb, &m)?.1);
        assert!(same(
            &a.mod_pow_variant(&LargeInteger::from(3), &m, 4)?,
            &fa.mod_pow_variant(&LargeInteger::from(3), &m, 4)?
        )?);

        assert!(fa.mod_add(&fb, &m)?.backing().is_file());
        assert!(!a.mod_add(&fb, &m)?.backing().is_file());
        Ok(())
    }

    #[test]
    fn test_negative_powers_of_non_units_are_errors() -> Result<(), ArithmError> {
        let m = LargeInteger::from(4);
        let minus_one = LargeInteger::from(-1);
        for backing in [Backing::Memory, file_backing()?] {
            let bases = LargeIntegerArray::from_vec(&backing, vec![LargeInteger::from(3), LargeInteger::from(2)])?;
            assert!(matches!(
                bases.mod_pow_scalar(&minus_one, &m, 1),
                Err(ArithmError::NoInverse(_))
            ));
            let exponents = LargeIntegerArray::from_vec(&backing, vec![LargeInteger::one(), minus_one.clone()])?;
            assert!(matches!(bases.mod_pow(&exponents, &m, 1), Err(ArithmError::NoInverse(_))));
            assert!(matches!(
                exponents.mod_pow_variant(&LargeInteger::from(2), &m, 1),
                Err(ArithmError::NoInverse(_))
            ));
            let odd = LargeIntegerArray::from_vec(&backing, vec![LargeInteger::from(3)])?;
            assert_eq!(odd.mod_pow_scalar(&minus_one, &m, 1)?.integers()?, vec![LargeInteger::from(3)]);
        }
        Ok(())
    }

    #[test]
    fn test_operations_match_scalar_operations() -> Result<(), ArithmError> {
        let m = modulus();
        let (_, a) = pair(23, 3)?;
        let (_, b) = pair(23, 4)?;
        let x = a.integers()?;
        let y = b.integers()?;

        let products = a.mod_mul(&b, &m, MUL_THREAD_THRESHOLD)?.integers()?;
        let powers = a.mod_pow(&b, &m, EXP_THREAD_THRESHOLD)?.integers()?;
        let scaled = a.mod_mul_scalar(&y[0], &m, MUL_THREAD_THRESHOLD)?.integers()?;
        for i in 0..x.len() {
            assert_eq!(products[i], x[i].mod_mul(&y[i], &m));
            assert_eq!(powers[i], x[i].mod_pow(&y[i], &m));
            assert_eq!(scaled[i], x[i].mod_mul(&y[0], &m));
        }

        assert_eq!(a.mod_sum(&m)?, batch::mod_sum(&x, &m));
        assert_eq!(a.mod_prod(&m)?, batch::mod_prod(&x, &m));
        assert_eq!(a.mod_inner(&b, &m)?, batch::mod_inner(&x, &y, &m)?);
        assert_eq!(
            a.mod_pow_prod(&b, &m, EXP_THREAD_THRESHOLD)?,
            batch::naive_mod_pow_prod(&x, &y, &m, 0)?
        );
        Ok(())
    }

    #[test]
    fn test_structural_operations() -> Result<(), ArithmError> {
        let (a, fa) = pair(20, 5)?;
        let x = a.integers()?;

        for array in [&a, &fa] {
            assert_eq!(array.copy_of_range(5, 17)?.integers()?, x[5..17].to_vec());
            assert!(array.copy_of_range(3, 3)?.is_empty());
            assert!(array.copy_of_range(3, 21).is_err());

            let mask: Vec<bool> = (0..20).map(|i| i % 3 == 0).collect();
            let expected: Vec<LargeInteger> = x.iter().step_by(3).cloned().collect();
            assert_eq!(array.extract(&mask)?.integers()?, expected);

            let shifted = array.shift_push(&LargeInteger::from(9))?.integers()?;
            assert_eq!(shifted[0], LargeInteger::from(9));
            assert_eq!(shifted[1..].to_vec(), x[..19].to_vec());

            assert_eq!(array.get(13)?, x[13]);
            assert!(array.get(20).is_err());
        }

        let concatenated = LargeIntegerArray::from_arrays(&fa.backing(), &[a.clone(), fa.clone()])?;
        assert_eq!(concatenated.size(), 40);
        assert_eq!(concatenated.get(25)?, x[5]);
        Ok(())
    }

    #[test]
    fn test_permutation_agrees_across_backings() -> Result<(), ArithmError> {
        let (a, fa) = pair(50, 6)?;
        let p = Permutation::random(50, &mut StdRng::seed_from_u64(7), 20);
        let permuted = a.permute(&p)?;
        assert!(same(&permuted, &fa.permute(&p)?)?);
        assert!(same(&permuted.permute(&p.inverse())?, &a)?);
        assert!(fa.permute(&p)?.permute(&p.inverse())?.equals(&a)?);
        assert!(a.permute(&Permutation::identity(3)).is_err());
        Ok(())
    }

    #[test]
    fn test_comparison() -> Result<(), ArithmError> {
        let (a, fa) = pair(15, 8)?;
        assert_eq!(a.compare_to(&fa)?, Ordering::Equal);
        assert!(a.equals_all(&fa)?.into_iter().all(|b| b));

        let bumped = fa.shift_push(&LargeInteger::from(-1))?;
        assert!(!a.equals(&bumped)?);
        assert!(a.compare_to(&a.copy_of_range(0, 3)?).is_err());
        assert!(!a.equals(&a.copy_of_range(0, 3)?)?);
        Ok(())
    }

    #[test]
    fn test_fixed_length_encoding_round_trip() -> Result<(), ArithmError> {
        let m = modulus();
        let len = m.to_byte_array().len();
        let (a, fa) = pair(25, 9)?;
        let tree = fa.to_byte_tree_fixed(len)?;
        assert_eq!(tree, a.to_byte_tree_fixed(len)?);

        let decoded = LargeIntegerArray::from_reader(&fa.backing(), 25, &mut tree.reader(), &LargeInteger::zero(), &m)?;
        assert!(decoded.equals(&a)?);

        let bytes = fa.write_byte_tree_fixed(len, Vec::new())?;
        assert_eq!(bytes, tree.to_bytes());
        let streamed = LargeIntegerArray::read_from(&fa.backing(), 25, bytes.as_slice(), &LargeInteger::zero(), &m)?;
        assert!(streamed.equals(&a)?);
        assert!(LargeIntegerArray::read_from(&Backing::Memory, 24, bytes.as_slice(), &LargeInteger::zero(), &m).is_err());
        assert!(
            LargeIntegerArray::read_from(&Backing::Memory, 25, bytes.as_slice(), &LargeInteger::zero(), &LargeInteger::from(5))
                .is_err()
        );

        assert_eq!(fa.write_byte_tree(Vec::new())?, a.to_byte_tree()?.to_bytes());
        Ok(())
    }

    #[test]
    fn test_quadratic_residues() -> Result<(), ArithmError> {
        let p = LargeInteger::from(23);
        let squares: Vec<LargeInteger> = (1..15).map(|x| LargeInteger::from(x * x)).collect();
        let backing = file_backing()?;
        let array = LargeIntegerArray::from_vec(&backing, squares)?;
        assert!(array.quadratic_residues(&p, 0)?);
        assert!(!array.shift_push(&LargeInteger::from(5))?.quadratic_residues(&p, 0)?);
        Ok(())
    }
}
