//! Simultaneous exponentiation.
//!
//! A table for `w` bases holds the product of every subset of the bases,
//! indexed by the bit mask of the subset. A power product is then computed by
//! scanning the exponent bits from the most significant position, squaring
//! the accumulator and multiplying in the subset selected by the bits of all
//! exponents at that position.

use tracing::trace;

use crate::util::ArrayWorker;

use super::{LargeInteger, Multiplier};

/// Widths beyond this are never useful and would exhaust memory.
const MAX_WIDTH: usize = 24;

pub struct SimExpTab<'a, M: Multiplier> {
    multiplier: &'a M,
    width: usize,
    pre: Vec<M::Elem>,
}

impl<'a, M: Multiplier> SimExpTab<'a, M> {
    /// Table over all of `bases`, with width `bases.len()`.
    ///
    /// # Panics
    ///
    /// Panics if there are more than 24 bases.
    pub fn new(multiplier: &'a M, bases: &[M::Elem]) -> Result<Self, M::Error> {
        let width = bases.len();
        assert!(width <= MAX_WIDTH, "Too many bases for a simultaneous table!");

        let size = 1usize << width;
        let mut pre: Vec<M::Elem> = Vec::with_capacity(size);
        pre.push(multiplier.one());
        for mask in 1..size {
            let low = mask & mask.wrapping_neg();
            let rest = mask ^ low;
            let elem = if rest == 0 {
                bases[low.trailing_zeros() as usize].clone()
            } else {
                multiplier.mul(&pre[rest], &pre[low])?
            };
            pre.push(elem);
        }
        Ok(SimExpTab {
            multiplier,
            width,
            pre,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Product of the bases to the given non-negative exponents, reading
    /// `bit_length` bits of each exponent.
    ///
    /// # Panics
    ///
    /// Panics unless there is exactly one exponent per base.
    pub fn exp_prod(&self, exponents: &[LargeInteger], bit_length: usize) -> Result<M::Elem, M::Error> {
        assert_eq!(exponents.len(), self.width, "One exponent per base is needed!");
        self.exp_bits(bit_length, |row, column| exponents[column].test_bit(row))
    }

    /// Power product where the exponent bit of base `column` at position
    /// `row` is given by `bit(row, column)`.
    pub(crate) fn exp_bits<F>(&self, bit_length: usize, bit: F) -> Result<M::Elem, M::Error>
    where
        F: Fn(usize, usize) -> bool,
    {
        let mut res = self.multiplier.one();
        for row in (0..bit_length).rev() {
            res = self.multiplier.square(&res)?;
            let mask = (0..self.width)
                .filter(|&column| bit(row, column))
                .fold(0usize, |mask, column| mask | (1 << column));
            if mask != 0 {
                res = self.multiplier.mul(&res, &self.pre[mask])?;
            }
        }
        Ok(res)
    }

    /// Width minimizing the amortized cost of a power product of exponents
    /// of the given bit length.
    pub fn optimal_width(bit_length: usize) -> usize {
        let mut width = 1usize;
        let mut cost = 1.5 * bit_length as f64;
        loop {
            let old_cost = cost;
            width += 1;
            let width_exp = (1usize << width) as f64;
            cost = (width_exp + 2.0 * bit_length as f64) / width as f64;
            if cost >= old_cost || width >= MAX_WIDTH {
                break;
            }
        }
        (width - 1).max(1)
    }
}

/// Product of `bases[i]^exponents[i]` over all `i`.
///
/// The index range is split over the worker, and each chunk is consumed in
/// batches of the optimal width, each batch through its own table. The
/// per-chunk results are multiplied in chunk order.
///
/// # Panics
///
/// Panics if the slices have different lengths or an exponent is negative.
pub fn sim_exp_prod<M: Multiplier>(
    multiplier: &M,
    bases: &[M::Elem],
    exponents: &[LargeInteger],
    threshold: usize,
) -> Result<M::Elem, M::Error> {
    assert_eq!(bases.len(), exponents.len(), "Different lengths of inputs!");
    assert!(
        exponents.iter().all(|e| !e.is_negative()),
        "Negative exponent in power product!"
    );

    let bit_length = exponents.iter().map(LargeInteger::bit_length).max().unwrap_or(0);
    let max_width = SimExpTab::<M>::optimal_width(bit_length);
    trace!(size = bases.len(), bit_length, max_width, "simultaneous exponentiation");

    let parts = ArrayWorker::new(bases.len(), threshold).try_run(|range| {
        let mut part = multiplier.one();
        let mut offset = range.start;
        while offset < range.end {
            let width = max_width.min(range.end - offset);
            let tab = SimExpTab::new(multiplier, &bases[offset..offset + width])?;
            let batch = tab.exp_prod(&exponents[offset..offset + width], bit_length)?;
            part = multiplier.mul(&part, &batch)?;
            offset += width;
        }
        Ok(part)
    })?;

    parts
        .iter()
        .try_fold(multiplier.one(), |acc, part| multiplier.mul(&acc, part))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arithm::exp_tab::{ModMultiplier, infallible};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn naive(bases: &[LargeInteger], exponents: &[LargeInteger], modulus: &LargeInteger) -> LargeInteger {
        bases
            .iter()
            .zip(exponents)
            .fold(LargeInteger::one(), |acc, (b, e)| acc.mod_mul(&b.mod_pow(e, modulus), modulus))
    }

    #[test]
    fn test_table_matches_naive_power_product() {
        let mut rng = StdRng::seed_from_u64(21);
        let modulus = LargeInteger::from(1_000_000_007u64);
        let multiplier = ModMultiplier::new(&modulus);
        for width in 0..6 {
            let bases = LargeInteger::random_mod_array(width, &modulus, 20, &mut rng);
            let exponents = LargeInteger::random_array(width, 40, &mut rng);
            let tab = infallible(SimExpTab::new(&multiplier, &bases));
            let res = infallible(tab.exp_prod(&exponents, 40));
            assert_eq!(res, naive(&bases, &exponents, &modulus));
        }
    }

    #[test]
    fn test_threaded_power_product() {
        let mut rng = StdRng::seed_from_u64(22);
        let modulus = LargeInteger::from(2_147_483_647u64);
        let multiplier = ModMultiplier::new(&modulus);
        let bases = LargeInteger::random_mod_array(137, &modulus, 20, &mut rng);
        let exponents = LargeInteger::random_array(137, 64, &mut rng);
        for threshold in [0, 10, 1000] {
            let res = infallible(sim_exp_prod(&multiplier, &bases, &exponents, threshold));
            assert_eq!(res, naive(&bases, &exponents, &modulus));
        }
        assert_eq!(
            infallible(sim_exp_prod(&multiplier, &[], &[], 0)),
            LargeInteger::one()
        );
    }

    #[test]
    fn test_optimal_width_grows_with_bit_length() {
        let small = SimExpTab::<ModMultiplier>::optimal_width(16);
        let large = SimExpTab::<ModMultiplier>::optimal_width(4096);
        assert!(small >= 1);
        assert!(large > small);
    }
}
