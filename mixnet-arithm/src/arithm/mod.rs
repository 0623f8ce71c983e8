//! # Arithmetic
//!
//! Integers, arrays of integers, prime order fields and rings, prime order
//! groups and maps between them.

pub mod array;
pub mod exp_tab;
pub mod group;
pub mod hom;
pub mod large_integer;
pub mod marshal;
pub mod permutation;
pub mod polynomial;
pub mod ring;

pub use array::{Backing, LargeIntegerArray};
pub use group::{PGroup, PGroupElement, PGroupElementArray};
pub use large_integer::LargeInteger;
pub use permutation::Permutation;
pub use polynomial::Polynomial;
pub use ring::{PField, PFieldElement, PRing, PRingElement, PRingElementArray};
