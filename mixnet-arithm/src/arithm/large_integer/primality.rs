//! Primality testing and prime generation.
//!
//! Candidates are first trial divided by small primes and then subjected to
//! Miller-Rabin rounds with random bases. For safe primes the rounds for `n`
//! and `(n - 1) / 2` are interleaved so that most composites are rejected
//! after a single exponentiation.

use lazy_static::lazy_static;
use num_bigint::BigUint;
use num_traits::Zero;
use rand::RngCore;
use tracing::debug;

use crate::util::log2c;

use super::LargeInteger;

const SMALL_PRIME_BOUND: usize = 2000;

lazy_static! {
    static ref SMALL_PRIMES: Vec<u32> = sieve(SMALL_PRIME_BOUND);
}

fn sieve(bound: usize) -> Vec<u32> {
    let mut composite = vec![false; bound];
    let mut primes = Vec::new();
    for i in 2..bound {
        if !composite[i] {
            primes.push(i as u32);
            let mut j = i * i;
            while j < bound {
                composite[j] = true;
                j += i;
            }
        }
    }
    primes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trial {
    Prime,
    Composite,
    Candidate,
}

fn trial(n: &LargeInteger) -> Trial {
    if n.signum() <= 0 || n.is_one() {
        return Trial::Composite;
    }
    if let Some(small) = n.to_u64() {
        if small < SMALL_PRIME_BOUND as u64 {
            return if SMALL_PRIMES.binary_search(&(small as u32)).is_ok() {
                Trial::Prime
            } else {
                Trial::Composite
            };
        }
    }
    let magnitude = n.magnitude();
    if SMALL_PRIMES
        .iter()
        .any(|&p| (magnitude % BigUint::from(p)).is_zero())
    {
        return Trial::Composite;
    }
    Trial::Candidate
}

fn safe_trial(n: &LargeInteger) -> Trial {
    let m = n.sub(&LargeInteger::one()).shift_right(1);
    match (trial(n), trial(&m)) {
        (Trial::Composite, _) | (_, Trial::Composite) => Trial::Composite,
        (Trial::Prime, Trial::Prime) => Trial::Prime,
        _ => Trial::Candidate,
    }
}

/// One Miller-Rabin round of `n` to the given base.
fn once(base: &LargeInteger, n: &LargeInteger) -> bool {
    if *n == LargeInteger::from(3) {
        return true;
    }
    let one = LargeInteger::one();
    let n_minus_one = n.sub(&one);
    let k = n_minus_one.as_big_int().trailing_zeros().unwrap_or(0) as usize;
    let q = n_minus_one.shift_right(k);

    let mut y = base.mod_pow(&q, n);
    if y.is_one() || y == n_minus_one {
        return true;
    }
    for _ in 1..k {
        y = y.mod_mul(&y, n);
        if y.is_one() {
            return false;
        }
        if y == n_minus_one {
            return true;
        }
    }
    false
}

fn random_base<R: RngCore + ?Sized>(n: &LargeInteger, stat_dist: usize, rng: &mut R) -> LargeInteger {
    loop {
        let base = LargeInteger::random_mod(n, stat_dist, rng);
        if !base.is_zero() && !base.is_one() {
            return base;
        }
    }
}

impl LargeInteger {
    fn reps<R: RngCore + ?Sized>(&self, rng: &mut R, certainty: usize) -> bool {
        let reps = certainty.div_ceil(2).max(1);
        let stat_dist = log2c(reps) + certainty + 1;
        (0..reps).all(|_| once(&random_base(self, stat_dist, rng), self))
    }

    fn safe_reps<R: RngCore + ?Sized>(&self, rng: &mut R, certainty: usize) -> bool {
        let m = self.sub(&LargeInteger::one()).shift_right(1);
        let reps = certainty.div_ceil(2).max(1);
        let stat_dist = log2c(2 * reps) + certainty + 1;
        (0..reps).all(|_| {
            once(&random_base(self, stat_dist, rng), self) && once(&random_base(&m, stat_dist, rng), &m)
        })
    }

    /// Returns `false` for composites, and `true` for primes except with
    /// probability at most `2^-certainty`.
    ///
    /// # Example
    ///
    /// ```
    /// # use mixnet_arithm::arithm::LargeInteger;
    /// # use rand::SeedableRng;
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(3);
    /// assert!(LargeInteger::from(1_000_003).is_probable_prime(&mut rng, 40));
    /// assert!(!LargeInteger::from(1_000_001).is_probable_prime(&mut rng, 40));
    /// ```
    pub fn is_probable_prime<R: RngCore + ?Sized>(&self, rng: &mut R, certainty: usize) -> bool {
        match trial(self) {
            Trial::Prime => true,
            Trial::Composite => false,
            Trial::Candidate => self.reps(rng, certainty),
        }
    }

    /// Tests that both `self` and `(self - 1) / 2` are prime.
    pub fn is_safe_prime<R: RngCore + ?Sized>(&self, rng: &mut R, certainty: usize) -> bool {
        if self.is_even() {
            return false;
        }
        match safe_trial(self) {
            Trial::Prime => true,
            Trial::Composite => false,
            Trial::Candidate => self.safe_reps(rng, certainty),
        }
    }

    /// Smallest probable prime strictly greater than `self` when `self` is
    /// odd, or greater than or equal to `self + 1` when it is even.
    pub fn next_prime<R: RngCore + ?Sized>(&self, rng: &mut R, certainty: usize) -> LargeInteger {
        let two = LargeInteger::two();
        let mut candidate = if self.is_even() {
            self.add(&LargeInteger::one())
        } else {
            self.add(&two)
        };
        let certainty = certainty + 2 * log2c(candidate.bit_length());

        let mut tried = 0usize;
        loop {
            tried += 1;
            match trial(&candidate) {
                Trial::Prime => break,
                Trial::Candidate if candidate.reps(rng, certainty) => break,
                _ => candidate = candidate.add(&two),
            }
        }
        debug!(bits = candidate.bit_length(), tried, "found prime");
        candidate
    }

    /// Smallest probable safe prime above `self` among candidates congruent
    /// to 3 modulo 4.
    pub fn next_safe_prime<R: RngCore + ?Sized>(&self, rng: &mut R, certainty: usize) -> LargeInteger {
        let four = LargeInteger::from(4);
        let mut candidate = self.clone();
        let mut increased = false;
        if candidate.is_even() {
            candidate = candidate.add(&LargeInteger::one());
            increased = true;
        }
        if !candidate.test_bit(1) {
            candidate = candidate.add(&LargeInteger::two());
            increased = true;
        }
        if !increased {
            candidate = candidate.add(&four);
        }

        let mut tried = 0usize;
        loop {
            tried += 1;
            match safe_trial(&candidate) {
                Trial::Prime => break,
                Trial::Candidate if candidate.safe_reps(rng, certainty) => break,
                _ => candidate = candidate.add(&four),
            }
        }
        debug!(bits = candidate.bit_length(), tried, "found safe prime");
        candidate
    }

    /// Random safe prime of exactly `bit_length` bits.
    ///
    /// # Panics
    ///
    /// Panics if `bit_length < 3`.
    pub fn random_safe_prime<R: RngCore + ?Sized>(bit_length: usize, rng: &mut R, certainty: usize) -> LargeInteger {
        assert!(bit_length >= 3, "Safe primes need at least 3 bits!");
        loop {
            let start = LargeInteger::random(bit_length, rng).set_bit(bit_length - 1);
            let candidate = start.next_safe_prime(rng, certainty);
            if candidate.bit_length() <= bit_length {
                return candidate;
            }
        }
    }

    /// Random prime of exactly `bit_length` bits.
    ///
    /// # Panics
    ///
    /// Panics if `bit_length < 2`.
    pub fn random_prime_exact<R: RngCore + ?Sized>(bit_length: usize, rng: &mut R, certainty: usize) -> LargeInteger {
        assert!(bit_length >= 2, "Primes need at least 2 bits!");
        loop {
            let candidate = LargeInteger::random(bit_length, rng).set_bit(bit_length - 1);
            if candidate.is_probable_prime(rng, certainty) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_small_values() {
        let mut rng = StdRng::seed_from_u64(11);
        let primes: Vec<u64> = (0..60u64)
            .filter(|&n| LargeInteger::from(n).is_probable_prime(&mut rng, 20))
            .collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59]);
    }

    #[test]
    fn test_large_known_values() -> Result<(), crate::errors::ArithmError> {
        let mut rng = StdRng::seed_from_u64(12);
        // 2^127 - 1 is a Mersenne prime, 2^128 + 1 is composite.
        let mersenne = LargeInteger::one().shift_left(127).sub(&LargeInteger::one());
        assert!(mersenne.is_probable_prime(&mut rng, 50));
        let fermat = LargeInteger::one().shift_left(128).add(&LargeInteger::one());
        assert!(!fermat.is_probable_prime(&mut rng, 50));
        // Carmichael number.
        assert!(!LargeInteger::from(3_215_031_751u64).is_probable_prime(&mut rng, 50));
        Ok(())
    }

    #[test]
    fn test_next_prime() {
        let mut rng = StdRng::seed_from_u64(13);
        assert_eq!(LargeInteger::from(7).next_prime(&mut rng, 40), LargeInteger::from(11));
        assert_eq!(LargeInteger::from(14).next_prime(&mut rng, 40), LargeInteger::from(17));
        assert_eq!(LargeInteger::from(7918).next_prime(&mut rng, 40), LargeInteger::from(7919));
    }

    #[test]
    fn test_safe_primes() {
        let mut rng = StdRng::seed_from_u64(14);
        assert!(LargeInteger::from(23).is_safe_prime(&mut rng, 40));
        assert!(!LargeInteger::from(29).is_safe_prime(&mut rng, 40));
        assert_eq!(LargeInteger::from(24).next_safe_prime(&mut rng, 40), LargeInteger::from(47));
        assert_eq!(LargeInteger::from(2000).next_safe_prime(&mut rng, 40), LargeInteger::from(2027));

        let p = LargeInteger::random_safe_prime(64, &mut rng, 40);
        assert_eq!(p.bit_length(), 64);
        let q = p.sub(&LargeInteger::one()).shift_right(1);
        assert!(p.is_probable_prime(&mut rng, 40));
        assert!(q.is_probable_prime(&mut rng, 40));
    }

    #[test]
    fn test_random_prime_exact() {
        let mut rng = StdRng::seed_from_u64(15);
        let p = LargeInteger::random_prime_exact(80, &mut rng, 40);
        assert_eq!(p.bit_length(), 80);
        assert!(p.is_probable_prime(&mut rng, 40));
    }
}
