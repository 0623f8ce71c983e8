//! # Exponentiation tables
//!
//! Precomputed tables for simultaneous multi-exponentiation and fixed-base
//! exponentiation. The tables are generic over a [`Multiplier`], so the same
//! code serves residues modulo an integer and elements of any prime order
//! group.

pub mod fixed_base;
pub mod simultaneous;

use std::convert::Infallible;

use super::LargeInteger;

pub use fixed_base::FixExpTab;
pub use simultaneous::{SimExpTab, sim_exp_prod};

/// A multiplicative monoid in which tables are computed.
pub trait Multiplier: Sync {
    type Elem: Clone + Send + Sync;
    type Error: Send;

    fn one(&self) -> Self::Elem;

    fn mul(&self, a: &Self::Elem, b: &Self::Elem) -> Result<Self::Elem, Self::Error>;

    fn square(&self, a: &Self::Elem) -> Result<Self::Elem, Self::Error> {
        self.mul(a, a)
    }
}

/// Multiplication of residues modulo a positive integer.
#[derive(Debug, Clone, Copy)]
pub struct ModMultiplier<'a> {
    modulus: &'a LargeInteger,
}

impl<'a> ModMultiplier<'a> {
    /// # Panics
    ///
    /// Panics if `modulus` is not positive.
    pub fn new(modulus: &'a LargeInteger) -> Self {
        assert!(modulus.signum() > 0, "Non-positive modulus!");
        ModMultiplier { modulus }
    }
}

impl Multiplier for ModMultiplier<'_> {
    type Elem = LargeInteger;
    type Error = Infallible;

    fn one(&self) -> LargeInteger {
        LargeInteger::one().modulo(self.modulus)
    }

    fn mul(&self, a: &LargeInteger, b: &LargeInteger) -> Result<LargeInteger, Infallible> {
        Ok(a.mod_mul(b, self.modulus))
    }
}

pub(crate) fn infallible<T>(res: Result<T, Infallible>) -> T {
    match res {
        Ok(value) => value,
        Err(never) => match never {},
    }
}
