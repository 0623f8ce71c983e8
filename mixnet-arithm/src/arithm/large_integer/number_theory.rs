//! Jacobi and Legendre symbols and square roots modulo primes.

use crate::errors::ArithmError;

use super::LargeInteger;

/// `(2/n)` for odd `n`, indexed by `n mod 8`.
const TWO_SYMBOL: [i32; 8] = [0, 1, 0, -1, 0, -1, 0, 1];

impl LargeInteger {
    /// Jacobi symbol `(self/modulus)` for an odd positive modulus.
    ///
    /// Powers of two are stripped from the numerator using the sign of
    /// `(2/n)`, and quadratic reciprocity swaps numerator and denominator.
    /// The result is 0 exactly when `gcd(self, modulus) > 1`.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::InvalidModulus` if the modulus is even or not positive.
    ///
    /// # Example
    ///
    /// ```
    /// # use mixnet_arithm::arithm::LargeInteger;
    /// let n = LargeInteger::from(15);
    /// assert_eq!(LargeInteger::from(2).jacobi(&n).unwrap(), 1);
    /// assert_eq!(LargeInteger::from(7).jacobi(&n).unwrap(), -1);
    /// assert_eq!(LargeInteger::from(6).jacobi(&n).unwrap(), 0);
    /// ```
    pub fn jacobi(&self, modulus: &LargeInteger) -> Result<i32, ArithmError> {
        if modulus.signum() <= 0 || modulus.is_even() {
            return Err(ArithmError::InvalidModulus(format!(
                "Jacobi symbol requires an odd positive modulus, got {}",
                modulus
            )));
        }

        let mut a = self.modulo(modulus);
        let mut n = modulus.clone();
        let mut sign = 1;

        while !a.is_zero() {
            let zeros = a.as_big_int().trailing_zeros().unwrap_or(0) as usize;
            a = a.shift_right(zeros);
            let n_mod_8 = low_bits(&n, 8);
            if zeros % 2 == 1 {
                sign *= TWO_SYMBOL[n_mod_8];
            }
            if low_bits(&a, 4) == 3 && n_mod_8 % 4 == 3 {
                sign = -sign;
            }
            let next = n.modulo(&a);
            n = a;
            a = next;
        }

        Ok(if n.is_one() { sign } else { 0 })
    }

    /// Legendre symbol modulo an odd prime.
    pub fn legendre(&self, prime: &LargeInteger) -> Result<i32, ArithmError> {
        self.jacobi(prime)
    }

    /// Square root modulo an odd prime by Tonelli-Shanks.
    ///
    /// # Errors
    ///
    /// Returns `ArithmError::InvalidParameters` if `self` is not a quadratic residue.
    pub fn mod_sqrt(&self, prime: &LargeInteger) -> Result<LargeInteger, ArithmError> {
        let a = self.modulo(prime);
        if a.is_zero() {
            return Ok(a);
        }
        if *prime == LargeInteger::two() {
            return Ok(a);
        }
        if a.legendre(prime)? != 1 {
            return Err(ArithmError::InvalidParameters(format!(
                "{} is not a quadratic residue modulo {}",
                a, prime
            )));
        }

        let one = LargeInteger::one();
        let p_minus_one = prime.sub(&one);

        if low_bits(prime, 4) == 3 {
            let exponent = prime.add(&one).shift_right(2);
            return Ok(a.mod_pow(&exponent, prime));
        }

        let s = p_minus_one.as_big_int().trailing_zeros().unwrap_or(0) as usize;
        let q = p_minus_one.shift_right(s);

        let mut z = LargeInteger::two();
        while z.legendre(prime)? != -1 {
            z = z.add(&one);
        }

        let mut m = s;
        let mut c = z.mod_pow(&q, prime);
        let mut t = a.mod_pow(&q, prime);
        let mut r = a.mod_pow(&q.add(&one).shift_right(1), prime);

        while !t.is_one() {
            let mut i = 0;
            let mut t2 = t.clone();
            while !t2.is_one() {
                t2 = t2.mod_mul(&t2, prime);
                i += 1;
                if i == m {
                    return Err(ArithmError::InternalError("Square root did not converge".to_string()));
                }
            }
            let mut b = c.clone();
            for _ in 0..(m - i - 1) {
                b = b.mod_mul(&b, prime);
            }
            m = i;
            c = b.mod_mul(&b, prime);
            t = t.mod_mul(&c, prime);
            r = r.mod_mul(&b, prime);
        }
        Ok(r)
    }
}

/// `value mod 2^k` for small `k`, as an index.
fn low_bits(value: &LargeInteger, modulus: u32) -> usize {
    let digit = value.magnitude().iter_u32_digits().next().unwrap_or(0);
    (digit % modulus) as usize
}
