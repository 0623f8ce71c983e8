//! Fixed-base exponentiation.
//!
//! An exponent of at most `bit_length` bits is cut into `width` slices of
//! `t = ceil(bit_length / width)` bits each. The table holds the basis raised
//! to `2^(j * t)` for every slice `j`, combined into a simultaneous table, so
//! one exponentiation costs `t` squarings and at most `t` multiplications.

use super::{LargeInteger, Multiplier, SimExpTab};

pub struct FixExpTab<'a, M: Multiplier> {
    tab: SimExpTab<'a, M>,
    bit_length: usize,
    slice: usize,
}

impl<'a, M: Multiplier> FixExpTab<'a, M> {
    /// # Panics
    ///
    /// Panics if `width` is zero or larger than 24.
    pub fn new(multiplier: &'a M, basis: &M::Elem, bit_length: usize, width: usize) -> Result<Self, M::Error> {
        assert!(width > 0, "Zero width!");
        let bit_length = bit_length.max(1);
        let slice = bit_length.div_ceil(width);

        let mut bases = Vec::with_capacity(width);
        let mut current = basis.clone();
        for j in 0..width {
            if j > 0 {
                for _ in 0..slice {
                    current = multiplier.square(&current)?;
                }
            }
            bases.push(current.clone());
        }
        Ok(FixExpTab {
            tab: SimExpTab::new(multiplier, &bases)?,
            bit_length,
            slice,
        })
    }

    /// Basis to the power `exponent`.
    ///
    /// # Panics
    ///
    /// Panics if the exponent is negative or longer than the bit length of
    /// the table.
    pub fn exp(&self, exponent: &LargeInteger) -> Result<M::Elem, M::Error> {
        assert!(
            !exponent.is_negative() && exponent.bit_length() <= self.bit_length,
            "Exponent outside the range of the table!"
        );
        let slice = self.slice;
        self.tab
            .exp_bits(slice, |row, column| exponent.test_bit(column * slice + row))
    }

    /// Width minimizing the total cost of `size` exponentiations, table
    /// construction included.
    pub fn optimal_width(bit_length: usize, size: usize) -> usize {
        let size = size.max(1);
        let mut width = 2usize;
        let mut cost = 1.5 * bit_length as f64;
        loop {
            let old_cost = cost;
            let t = (((1usize << width) - width + bit_length) / size) as f64;
            let m = (bit_length / width) as f64;
            cost = t + m;
            width += 1;
            if cost >= old_cost || width > 24 {
                break;
            }
        }
        width - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arithm::exp_tab::{ModMultiplier, infallible};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_fixed_base_matches_mod_pow() {
        let mut rng = StdRng::seed_from_u64(31);
        let modulus = LargeInteger::from(1_000_000_007u64);
        let multiplier = ModMultiplier::new(&modulus);
        let basis = LargeInteger::from(5);
        for width in 1..7 {
            let tab = infallible(FixExpTab::new(&multiplier, &basis, 61, width));
            for _ in 0..10 {
                let e = LargeInteger::random(61, &mut rng);
                assert_eq!(infallible(tab.exp(&e)), basis.mod_pow(&e, &modulus));
            }
            assert_eq!(infallible(tab.exp(&LargeInteger::zero())), LargeInteger::one());
        }
    }

    #[test]
    fn test_optimal_width() {
        assert_eq!(FixExpTab::<ModMultiplier>::optimal_width(2048, 1), 2);
        assert!(FixExpTab::<ModMultiplier>::optimal_width(2048, 100_000) > 4);
    }
}
