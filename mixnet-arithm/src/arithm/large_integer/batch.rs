//! Batch routines over slices of integers.
//!
//! Every routine takes a worker threshold. Exponentiation-class routines are
//! meant to be called with an exponentiation threshold and the others with a
//! multiplication threshold, see [`crate::util::ArrayWorker`].

use std::cmp::Ordering;

use crate::arithm::exp_tab::{FixExpTab, ModMultiplier, infallible, sim_exp_prod};
use crate::errors::ArithmError;
use crate::util::ArrayWorker;

use super::LargeInteger;

fn check_lengths(what: &str, left: &[LargeInteger], right: &[LargeInteger]) -> Result<(), ArithmError> {
    if left.len() != right.len() {
        return Err(ArithmError::mismatch(what, left.len(), right.len()));
    }
    Ok(())
}

/// Element-wise `bases[i]^exponents[i] mod modulus`.
pub fn mod_pow_all(
    bases: &[LargeInteger],
    exponents: &[LargeInteger],
    modulus: &LargeInteger,
    threshold: usize,
) -> Result<Vec<LargeInteger>, ArithmError> {
    check_lengths("modular powers", bases, exponents)?;
    ArrayWorker::new(bases.len(), threshold).try_map(|i| bases[i].try_mod_pow(&exponents[i], modulus))
}

/// Element-wise `bases[i]^exponent mod modulus`.
pub fn mod_pow_scalar(
    bases: &[LargeInteger],
    exponent: &LargeInteger,
    modulus: &LargeInteger,
    threshold: usize,
) -> Result<Vec<LargeInteger>, ArithmError> {
    ArrayWorker::new(bases.len(), threshold).try_map(|i| bases[i].try_mod_pow(exponent, modulus))
}

/// `basis^exponents[i] mod modulus` for every `i`, through a fixed-base table
/// shared by all threads.
pub fn mod_pow_fixed(
    basis: &LargeInteger,
    exponents: &[LargeInteger],
    modulus: &LargeInteger,
    threshold: usize,
) -> Result<Vec<LargeInteger>, ArithmError> {
    if exponents.is_empty() {
        return Ok(Vec::new());
    }
    let multiplier = ModMultiplier::new(modulus);
    let (reduced, negative): (Vec<_>, Vec<_>) = exponents
        .iter()
        .map(|e| (e.abs(), e.is_negative()))
        .unzip();
    let bit_length = reduced.iter().map(LargeInteger::bit_length).max().unwrap_or(1);
    let width = FixExpTab::<ModMultiplier>::optimal_width(bit_length, exponents.len());
    let tab = infallible(FixExpTab::new(&multiplier, &basis.modulo(modulus), bit_length, width));

    ArrayWorker::new(exponents.len(), threshold).try_map(|i| {
        let res = infallible(tab.exp(&reduced[i]));
        if negative[i] { res.mod_inv(modulus) } else { Ok(res) }
    })
}

/// Element-wise modular product.
pub fn mod_mul_all(
    left: &[LargeInteger],
    right: &[LargeInteger],
    modulus: &LargeInteger,
    threshold: usize,
) -> Result<Vec<LargeInteger>, ArithmError> {
    check_lengths("modular products", left, right)?;
    Ok(ArrayWorker::new(left.len(), threshold).map(|i| left[i].mod_mul(&right[i], modulus)))
}

pub fn mod_mul_scalar(
    values: &[LargeInteger],
    scalar: &LargeInteger,
    modulus: &LargeInteger,
    threshold: usize,
) -> Vec<LargeInteger> {
    ArrayWorker::new(values.len(), threshold).map(|i| values[i].mod_mul(scalar, modulus))
}

/// Element-wise modular sum.
pub fn mod_add_all(
    left: &[LargeInteger],
    right: &[LargeInteger],
    modulus: &LargeInteger,
) -> Result<Vec<LargeInteger>, ArithmError> {
    check_lengths("modular sums", left, right)?;
    Ok(left
        .iter()
        .zip(right)
        .map(|(a, b)| a.mod_add(b, modulus))
        .collect())
}

pub fn mod_add_scalar(values: &[LargeInteger], scalar: &LargeInteger, modulus: &LargeInteger) -> Vec<LargeInteger> {
    values.iter().map(|a| a.mod_add(scalar, modulus)).collect()
}

/// Element-wise canonical negation, so zero maps to zero.
pub fn mod_neg_all(values: &[LargeInteger], modulus: &LargeInteger) -> Vec<LargeInteger> {
    values.iter().map(|a| a.neg().modulo(modulus)).collect()
}

/// Element-wise modular inverse.
///
/// # Errors
///
/// Returns the error of the first chunk holding a non-invertible value. No
/// partial result is returned.
pub fn mod_inv_all(
    values: &[LargeInteger],
    modulus: &LargeInteger,
    threshold: usize,
) -> Result<Vec<LargeInteger>, ArithmError> {
    ArrayWorker::new(values.len(), threshold).try_map(|i| values[i].mod_inv(modulus))
}

pub fn mod_prod(factors: &[LargeInteger], modulus: &LargeInteger) -> LargeInteger {
    factors
        .iter()
        .fold(LargeInteger::one().modulo(modulus), |acc, f| acc.mod_mul(f, modulus))
}

/// Running products `agg * factors[0] * ... * factors[i]` for every `i`.
pub fn mod_prods(agg: &LargeInteger, factors: &[LargeInteger], modulus: &LargeInteger) -> Vec<LargeInteger> {
    factors
        .iter()
        .scan(agg.clone(), |acc, f| {
            *acc = acc.mod_mul(f, modulus);
            Some(acc.clone())
        })
        .collect()
}

pub fn mod_sum(terms: &[LargeInteger], modulus: &LargeInteger) -> LargeInteger {
    terms
        .iter()
        .fold(LargeInteger::zero(), |acc, t| acc.add(t))
        .modulo(modulus)
}

/// Modular inner product.
pub fn mod_inner(
    left: &[LargeInteger],
    right: &[LargeInteger],
    modulus: &LargeInteger,
) -> Result<LargeInteger, ArithmError> {
    check_lengths("inner product", left, right)?;
    Ok(left
        .iter()
        .zip(right)
        .fold(LargeInteger::zero(), |acc, (a, b)| acc.add(&a.mul(b)))
        .modulo(modulus))
}

/// Linear recurrence `out[i] = out[i - 1] * scalars[i] + terms[i] mod modulus`,
/// where `out[-1]` is `carry`, or zero when there is no carry. Without a carry
/// the first output is thus `terms[0]`.
pub fn mod_rec_lin(
    carry: Option<&LargeInteger>,
    scalars: &[LargeInteger],
    terms: &[LargeInteger],
    modulus: &LargeInteger,
) -> Result<Vec<LargeInteger>, ArithmError> {
    check_lengths("recurrence", scalars, terms)?;
    let mut prev = carry.cloned().unwrap_or_default();
    let mut res = Vec::with_capacity(terms.len());
    for (scalar, term) in scalars.iter().zip(terms) {
        prev = prev.mul(scalar).add(term).modulo(modulus);
        res.push(prev.clone());
    }
    Ok(res)
}

/// Product of `bases[i]^exponents[i] mod modulus` by simultaneous
/// exponentiation. Negative exponents are handled by inverting the base.
///
/// # Errors
///
/// Returns `ArithmError::DimensionMismatch` for slices of different length
/// and `ArithmError::NoInverse` if a base with a negative exponent is not
/// invertible.
pub fn mod_pow_prod(
    bases: &[LargeInteger],
    exponents: &[LargeInteger],
    modulus: &LargeInteger,
    threshold: usize,
) -> Result<LargeInteger, ArithmError> {
    check_lengths("power product", bases, exponents)?;
    let (bases, exponents) = normalize_signs(bases, exponents, modulus)?;
    let multiplier = ModMultiplier::new(modulus);
    Ok(infallible(sim_exp_prod(&multiplier, &bases, &exponents, threshold)))
}

fn normalize_signs(
    bases: &[LargeInteger],
    exponents: &[LargeInteger],
    modulus: &LargeInteger,
) -> Result<(Vec<LargeInteger>, Vec<LargeInteger>), ArithmError> {
    let mut out_bases = Vec::with_capacity(bases.len());
    let mut out_exponents = Vec::with_capacity(exponents.len());
    for (base, exponent) in bases.iter().zip(exponents) {
        if exponent.is_negative() {
            out_bases.push(base.mod_inv(modulus)?);
            out_exponents.push(exponent.neg());
        } else {
            out_bases.push(base.modulo(modulus));
            out_exponents.push(exponent.clone());
        }
    }
    Ok((out_bases, out_exponents))
}

/// Power product computed with one modular exponentiation per base.
pub fn naive_mod_pow_prod(
    bases: &[LargeInteger],
    exponents: &[LargeInteger],
    modulus: &LargeInteger,
    threshold: usize,
) -> Result<LargeInteger, ArithmError> {
    check_lengths("power product", bases, exponents)?;
    let parts = ArrayWorker::new(bases.len(), threshold).try_run(|mut range| {
        range.try_fold(LargeInteger::one(), |acc, i| {
            Ok::<_, ArithmError>(acc.mod_mul(&bases[i].try_mod_pow(&exponents[i], modulus)?, modulus))
        })
    })?;
    Ok(mod_prod(&parts, modulus))
}

/// Tests if every value is a quadratic residue modulo the odd prime.
pub fn quadratic_residues(
    values: &[LargeInteger],
    prime: &LargeInteger,
    threshold: usize,
) -> Result<bool, ArithmError> {
    let parts = ArrayWorker::new(values.len(), threshold).try_run(|range| {
        for i in range {
            if values[i].legendre(prime)? != 1 {
                return Ok(false);
            }
        }
        Ok::<bool, ArithmError>(true)
    })?;
    Ok(parts.into_iter().all(|part| part))
}

/// Lexicographic comparison of slices of equal length.
pub fn compare_all(left: &[LargeInteger], right: &[LargeInteger]) -> Result<Ordering, ArithmError> {
    check_lengths("comparison", left, right)?;
    Ok(left.cmp(right))
}

pub fn equals_all(left: &[LargeInteger], right: &[LargeInteger]) -> Result<Vec<bool>, ArithmError> {
    check_lengths("comparison", left, right)?;
    Ok(left.iter().zip(right).map(|(a, b)| a == b).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn setup(size: usize) -> (LargeInteger, Vec<LargeInteger>, Vec<LargeInteger>) {
        let mut rng = StdRng::seed_from_u64(41);
        let modulus = LargeInteger::from(4_294_967_291u64);
        let a = LargeInteger::random_mod_array(size, &modulus, 20, &mut rng);
        let b = LargeInteger::random_mod_array(size, &modulus, 20, &mut rng);
        (modulus, a, b)
    }

    #[test]
    fn test_element_wise_operations_match_scalar_ones() -> Result<(), ArithmError> {
        let (m, a, b) = setup(250);
        let pow = mod_pow_all(&a, &b, &m, 10)?;
        let mul = mod_mul_all(&a, &b, &m, 10)?;
        let add = mod_add_all(&a, &b, &m)?;
        let neg = mod_neg_all(&a, &m);
        for i in 0..a.len() {
            assert_eq!(pow[i], a[i].mod_pow(&b[i], &m));
            assert_eq!(mul[i], a[i].mod_mul(&b[i], &m));
            assert_eq!(add[i], a[i].mod_add(&b[i], &m));
            assert!(neg[i].mod_add(&a[i], &m).is_zero());
        }
        assert!(mod_mul_all(&a, &b[1..], &m, 10).is_err());
        Ok(())
    }

    #[test]
    fn test_inverse_reports_failure_for_whole_batch() -> Result<(), ArithmError> {
        let m = LargeInteger::from(35);
        let ok: Vec<LargeInteger> = [1, 2, 3, 4, 6].iter().map(|&x| LargeInteger::from(x)).collect();
        let inv = mod_inv_all(&ok, &m, 0)?;
        assert!(ok.iter().zip(&inv).all(|(x, y)| x.mod_mul(y, &m).is_one()));

        let bad: Vec<LargeInteger> = [1, 2, 5, 4, 7].iter().map(|&x| LargeInteger::from(x)).collect();
        assert!(matches!(mod_inv_all(&bad, &m, 0), Err(ArithmError::NoInverse(_))));
        Ok(())
    }

    #[test]
    fn test_power_products() -> Result<(), ArithmError> {
        let (m, a, b) = setup(77);
        let naive = naive_mod_pow_prod(&a, &b, &m, 5)?;
        assert_eq!(mod_pow_prod(&a, &b, &m, 5)?, naive);
        assert_eq!(mod_pow_prod(&a, &b, &m, 1000)?, naive);

        let negated: Vec<LargeInteger> = b.iter().map(LargeInteger::neg).collect();
        let inverse = mod_pow_prod(&a, &negated, &m, 5)?;
        assert!(inverse.mod_mul(&naive, &m).is_one());
        Ok(())
    }

    #[test]
    fn test_fixed_base_powers() -> Result<(), ArithmError> {
        let (m, _, b) = setup(40);
        let basis = LargeInteger::from(3);
        let res = mod_pow_fixed(&basis, &b, &m, 0)?;
        assert!(res.iter().zip(&b).all(|(r, e)| *r == basis.mod_pow(e, &m)));
        let negative = mod_pow_fixed(&basis, &[LargeInteger::from(-2)], &m, 0)?;
        assert_eq!(negative[0].mod_mul(&LargeInteger::from(9), &m), LargeInteger::one());
        Ok(())
    }

    #[test]
    fn test_negative_powers_of_non_units_fail() {
        let m = LargeInteger::from(4);
        let minus_one = LargeInteger::from(-1);
        let bases = [LargeInteger::from(3), LargeInteger::from(2)];
        assert!(matches!(
            mod_pow_scalar(&bases, &minus_one, &m, 1),
            Err(ArithmError::NoInverse(_))
        ));
        assert!(matches!(
            mod_pow_all(&bases, &[LargeInteger::from(2), minus_one.clone()], &m, 1),
            Err(ArithmError::NoInverse(_))
        ));
        assert!(matches!(
            mod_pow_fixed(&LargeInteger::from(2), &[LargeInteger::from(3), minus_one.clone()], &m, 1),
            Err(ArithmError::NoInverse(_))
        ));
        assert!(matches!(
            naive_mod_pow_prod(&bases, &[LargeInteger::one(), minus_one], &m, 1),
            Err(ArithmError::NoInverse(_))
        ));
    }

    #[test]
    fn test_aggregates() -> Result<(), ArithmError> {
        let m = LargeInteger::from(11);
        let xs: Vec<LargeInteger> = [2, 3, 4].iter().map(|&x| LargeInteger::from(x)).collect();
        assert_eq!(mod_prod(&xs, &m), LargeInteger::from(2));
        assert_eq!(mod_sum(&xs, &m), LargeInteger::from(9));
        assert_eq!(
            mod_prods(&LargeInteger::one(), &xs, &m),
            vec![LargeInteger::from(2), LargeInteger::from(6), LargeInteger::from(2)]
        );
        assert_eq!(mod_inner(&xs, &xs, &m)?, LargeInteger::from(29 % 11));
        // out = [2, 2*3+3, 9*4+4] mod 11
        let rec = mod_rec_lin(None, &xs, &xs, &m)?;
        assert_eq!(rec, vec![LargeInteger::from(2), LargeInteger::from(9), LargeInteger::from(7)]);
        // Continuing from the second output reproduces the tail.
        assert_eq!(mod_rec_lin(Some(&rec[1]), &xs[2..], &xs[2..], &m)?, rec[2..].to_vec());
        Ok(())
    }

    #[test]
    fn test_quadratic_residues_and_comparison() -> Result<(), ArithmError> {
        let p = LargeInteger::from(23);
        let squares: Vec<LargeInteger> = (1..20).map(|x| LargeInteger::from(x * x)).collect();
        assert!(quadratic_residues(&squares, &p, 4)?);
        assert!(!quadratic_residues(&[LargeInteger::from(5)], &p, 4)?);

        let xs = vec![LargeInteger::from(1), LargeInteger::from(5)];
        let ys = vec![LargeInteger::from(1), LargeInteger::from(7)];
        assert_eq!(compare_all(&xs, &ys)?, Ordering::Less);
        assert_eq!(equals_all(&xs, &ys)?, vec![true, false]);
        assert!(compare_all(&xs, &ys[..1]).is_err());
        Ok(())
    }
}
