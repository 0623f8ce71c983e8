//! Permutations of `{0, ..., n - 1}`.

use std::sync::Arc;

use rand::RngCore;

use crate::eio::{ByteTree, ByteTreeReader};
use crate::errors::ArithmError;
use crate::util::log2c;

use super::LargeInteger;

/// A verified lookup table mapping index `i` to `table[i]`.
///
/// Applying the permutation moves the element at index `i` to index
/// `table[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    table: Arc<Vec<usize>>,
}

impl Permutation {
    pub fn identity(size: usize) -> Self {
        Permutation {
            table: Arc::new((0..size).collect()),
        }
    }

    /// Builds a permutation from its table.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::InvalidPermutation` if an index is out of range
    /// or used twice.
    ///
    /// # Example
    ///
    /// ```
    /// # use mixnet_arithm::arithm::Permutation;
    /// assert!(Permutation::try_with(vec![2, 0, 1]).is_ok());
    /// assert!(Permutation::try_with(vec![2, 0, 2]).is_err());
    /// assert!(Permutation::try_with(vec![3, 0, 1]).is_err());
    /// ```
    pub fn try_with(table: Vec<usize>) -> Result<Self, ArithmError> {
        let mut seen = vec![false; table.len()];
        for &target in &table {
            if target >= table.len() {
                return Err(ArithmError::InvalidPermutation("Index outside interval!".to_string()));
            }
            if seen[target] {
                return Err(ArithmError::InvalidPermutation("Index is reused!".to_string()));
            }
            seen[target] = true;
        }
        Ok(Permutation {
            table: Arc::new(table),
        })
    }

    /// Uniformly random permutation, up to statistical distance
    /// `2^-stat_dist`.
    ///
    /// Every index is tagged with a random prefix and the indices are sorted
    /// by their prefixes.
    pub fn random<R: RngCore + ?Sized>(size: usize, rng: &mut R, stat_dist: usize) -> Self {
        let bits = stat_dist + 2 * log2c(size) + 1;
        let mut tagged: Vec<(LargeInteger, usize)> = (0..size)
            .map(|i| (LargeInteger::random(bits, rng), i))
            .collect();
        tagged.sort();
        Permutation {
            table: Arc::new(tagged.into_iter().map(|(_, i)| i).collect()),
        }
    }

    /// Reads a node of exactly `size` ints.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::Format` on malformed input and
    /// `ArithmError::InvalidPermutation` if the table is not a permutation.
    pub fn from_reader(size: usize, reader: &mut ByteTreeReader<'_>) -> Result<Self, ArithmError> {
        if reader.is_leaf() || reader.remaining() != size {
            return Err(ArithmError::format("Wrong number of indices!"));
        }
        let mut table = Vec::with_capacity(size);
        for _ in 0..size {
            let index = reader.next_child()?.read_int()?;
            let index = usize::try_from(index)
                .map_err(|_| ArithmError::InvalidPermutation("Index outside interval!".to_string()))?;
            table.push(index);
        }
        Self::try_with(table)
    }

    pub fn to_byte_tree(&self) -> ByteTree {
        ByteTree::node(self.table.iter().map(|&i| ByteTree::from_int(i as i32)).collect())
    }

    pub fn size(&self) -> usize {
        self.table.len()
    }

    /// Destination of index `index`.
    pub fn map(&self, index: usize) -> usize {
        self.table[index]
    }

    pub fn table(&self) -> &[usize] {
        &self.table
    }

    pub fn inverse(&self) -> Self {
        let mut inverse = vec![0; self.table.len()];
        for (i, &target) in self.table.iter().enumerate() {
            inverse[target] = i;
        }
        Permutation {
            table: Arc::new(inverse),
        }
    }

    /// Returns `permuted` with `permuted[table[i]] = values[i]`.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::DimensionMismatch` if the slice has a different
    /// length.
    pub fn apply<T: Clone>(&self, values: &[T]) -> Result<Vec<T>, ArithmError> {
        if values.len() != self.table.len() {
            return Err(ArithmError::mismatch("permutation", self.table.len(), values.len()));
        }
        let mut slots: Vec<Option<T>> = vec![None; values.len()];
        for (value, &target) in values.iter().zip(self.table.iter()) {
            slots[target] = Some(value.clone());
        }
        slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| ArithmError::InternalError("Unfilled slot!".to_string())))
            .collect()
    }

    /// Restriction to the first `size` indices, renumbered to keep their
    /// relative order of destinations.
    ///
    /// # Panics
    ///
    /// Panics if `size` exceeds the size of the permutation.
    pub fn shrink(&self, size: usize) -> Self {
        assert!(size <= self.table.len(), "Cannot grow a permutation!");
        let mut sources: Vec<Option<usize>> = vec![None; self.table.len()];
        for i in 0..size {
            sources[self.table[i]] = Some(i);
        }
        let mut table = vec![0; size];
        for (rank, source) in sources.into_iter().flatten().enumerate() {
            table[source] = rank;
        }
        Permutation {
            table: Arc::new(table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_apply_moves_to_destination() -> Result<(), ArithmError> {
        let p = Permutation::try_with(vec![2, 0, 1])?;
        assert_eq!(p.apply(&['a', 'b', 'c'])?, vec!['b', 'c', 'a']);
        assert!(p.apply(&['a']).is_err());
        Ok(())
    }

    #[test]
    fn test_decode_rejects_invalid_tables() -> Result<(), ArithmError> {
        let ok = ByteTree::from_ints(&[1, 0, 2]);
        assert_eq!(Permutation::from_reader(3, &mut ok.reader())?.table(), &[1, 0, 2]);
        assert!(Permutation::from_reader(2, &mut ok.reader()).is_err());

        for bad in [[1, 1, 2], [0, 1, 3], [0, -1, 2]] {
            let tree = ByteTree::from_ints(&bad);
            assert!(matches!(
                Permutation::from_reader(3, &mut tree.reader()),
                Err(ArithmError::InvalidPermutation(_))
            ));
        }
        Ok(())
    }

    #[test]
    fn test_shrink() -> Result<(), ArithmError> {
        let p = Permutation::try_with(vec![3, 0, 4, 1, 2])?;
        assert_eq!(p.shrink(3).table(), &[1, 0, 2]);
        assert_eq!(p.shrink(5), p);
        Ok(())
    }

    #[quickcheck]
    fn prop_inverse_undoes_apply(seed: u64, size: u8) -> bool {
        let mut rng = StdRng::seed_from_u64(seed);
        let p = Permutation::random(size as usize, &mut rng, 20);
        let values: Vec<usize> = (0..size as usize).collect();
        let back = p.apply(&values).and_then(|permuted| p.inverse().apply(&permuted));
        matches!(back, Ok(v) if v == values)
    }

    #[quickcheck]
    fn prop_random_is_valid(seed: u64, size: u8) -> bool {
        let mut rng = StdRng::seed_from_u64(seed);
        let p = Permutation::random(size as usize, &mut rng, 20);
        Permutation::try_with(p.table().to_vec()).is_ok()
    }
}
