//! Polynomials with coefficients in a [`PRing`].

use itertools::{EitherOrBoth, Itertools};

use crate::arithm::LargeInteger;
use crate::arithm::ring::{PFieldElement, PRing, PRingElement};
use crate::eio::{ByteTree, ByteTreeReader};
use crate::errors::ArithmError;

/// A polynomial `c_0 + c_1 x + ... + c_d x^d`. The leading coefficient is
/// non-zero unless the polynomial is a constant.
#[derive(Debug, Clone)]
pub struct Polynomial {
    coefficients: Vec<PRingElement>,
}

impl Polynomial {
    /// # Errors
    ///
    /// Returns `ArithmError::InvalidParameters` if `coefficients` is empty.
    ///
    /// # Panics
    ///
    /// Panics if the coefficients belong to distinct rings.
    pub fn new(coefficients: Vec<PRingElement>) -> Result<Self, ArithmError> {
        let Some(first) = coefficients.first() else {
            return Err(ArithmError::InvalidParameters("No coefficients!".to_string()));
        };
        let ring = first.ring();
        assert!(coefficients.iter().all(|c| ring.contains(c)), "Distinct rings!");
        let mut poly = Polynomial { coefficients };
        poly.canonicalize()?;
        Ok(poly)
    }

    pub fn constant(value: PRingElement) -> Self {
        Polynomial {
            coefficients: vec![value],
        }
    }

    /// Decodes at most `max_degree + 1` coefficients in `ring`.
    pub fn from_reader(
        ring: &PRing,
        max_degree: usize,
        reader: &mut ByteTreeReader<'_>,
    ) -> Result<Self, ArithmError> {
        if reader.is_leaf() || reader.remaining() == 0 {
            return Err(ArithmError::format("Missing coefficients!"));
        }
        if reader.remaining() > max_degree + 1 {
            return Err(ArithmError::format("Degree too large!"));
        }
        let mut coefficients = Vec::with_capacity(reader.remaining());
        while reader.remaining() > 0 {
            coefficients.push(ring.element_from_reader(&mut reader.next_child()?)?);
        }
        Self::new(coefficients)
    }

    fn canonicalize(&mut self) -> Result<(), ArithmError> {
        let zero = self.pring().zero()?;
        while self.coefficients.len() > 1 {
            match self.coefficients.last() {
                Some(last) if last.equals(&zero)? => {
                    self.coefficients.pop();
                }
                _ => break,
            }
        }
        Ok(())
    }

    pub fn pring(&self) -> PRing {
        self.coefficients[0].ring()
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    pub fn coefficients(&self) -> &[PRingElement] {
        &self.coefficients
    }

    /// The coefficient of `x^index`, zero beyond the degree.
    pub fn coefficient(&self, index: usize) -> Result<PRingElement, ArithmError> {
        match self.coefficients.get(index) {
            Some(c) => Ok(c.clone()),
            None => self.pring().zero(),
        }
    }

    /// Splits a polynomial over a product ring into one polynomial per
    /// factor.
    pub fn factors(&self) -> Result<Vec<Polynomial>, ArithmError> {
        let PRing::Product(ring) = self.pring() else {
            return Err(ArithmError::InvalidParameters("Element is not a product!".to_string()));
        };
        let mut columns: Vec<Vec<PRingElement>> = vec![Vec::with_capacity(self.coefficients.len()); ring.width()];
        for c in &self.coefficients {
            let Some(c) = c.as_product() else {
                return Err(ArithmError::InvalidParameters("Element is not a product!".to_string()));
            };
            for (column, factor) in columns.iter_mut().zip(c.factors()) {
                column.push(factor.clone());
            }
        }
        columns.into_iter().map(Polynomial::new).collect()
    }

    /// Horner evaluation at a field element.
    ///
    /// # Panics
    ///
    /// Panics if `x` is not in the field of the ring of the polynomial.
    pub fn evaluate(&self, x: &PFieldElement) -> Result<PRingElement, ArithmError> {
        assert!(self.pring().pfield() == x.field(), "Distinct fields!");
        let x = PRingElement::Field(x.clone());
        let mut value = self.coefficients[self.degree()].clone();
        for c in self.coefficients.iter().rev().skip(1) {
            value = value.mul(&x)?.add(c)?;
        }
        Ok(value)
    }

    /// Evaluation at the field element `j`, as used for share indices.
    pub fn evaluate_at(&self, j: i64) -> Result<PRingElement, ArithmError> {
        let x = self.pring().pfield().to_element(&LargeInteger::from(j));
        self.evaluate(&x)
    }

    /// # Panics
    ///
    /// Panics if the polynomials are defined over distinct rings.
    pub fn add(&self, other: &Polynomial) -> Result<Polynomial, ArithmError> {
        assert!(self.pring() == other.pring(), "Distinct rings!");
        let coefficients = self
            .coefficients
            .iter()
            .zip_longest(&other.coefficients)
            .map(|pair| match pair {
                EitherOrBoth::Both(a, b) => a.add(b),
                EitherOrBoth::Left(c) | EitherOrBoth::Right(c) => Ok(c.clone()),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(coefficients)
    }

    pub fn to_byte_tree(&self) -> Result<ByteTree, ArithmError> {
        let children = self
            .coefficients
            .iter()
            .map(PRingElement::to_byte_tree)
            .collect::<Result<_, _>>()?;
        Ok(ByteTree::node(children))
    }

    pub fn equals(&self, other: &Polynomial) -> Result<bool, ArithmError> {
        if self.pring() != other.pring() || self.degree() != other.degree() {
            return Ok(false);
        }
        for (a, b) in self.coefficients.iter().zip(&other.coefficients) {
            if !a.equals(b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl PartialEq for Polynomial {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.equals(other), Ok(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arithm::ring::{PField, PPRing};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn field() -> PField {
        PField::with_prime_order(LargeInteger::from(1009))
    }

    fn constants(values: &[i64]) -> Vec<PRingElement> {
        let f = field();
        values
            .iter()
            .map(|&v| PRingElement::Field(f.to_element(&LargeInteger::from(v))))
            .collect()
    }

    #[test]
    fn test_trims_leading_zeros() -> Result<(), ArithmError> {
        let p = Polynomial::new(constants(&[3, 2, 0, 0]))?;
        assert_eq!(p.degree(), 1);
        assert_eq!(p.coefficient(5)?, p.pring().zero()?);
        let zero = Polynomial::new(constants(&[0, 0]))?;
        assert_eq!(zero.degree(), 0);
        assert!(Polynomial::new(Vec::new()).is_err());
        Ok(())
    }

    #[test]
    fn test_evaluation() -> Result<(), ArithmError> {
        // 3 + 2x + 5x^2 at x = 4 is 99.
        let p = Polynomial::new(constants(&[3, 2, 5]))?;
        assert_eq!(p.evaluate_at(4)?, constants(&[99])[0]);
        // At x = 20 the value is 2043 = 25 mod 1009.
        assert_eq!(p.evaluate_at(20)?, constants(&[25])[0]);
        Ok(())
    }

    #[test]
    fn test_addition_cancels_leading_terms() -> Result<(), ArithmError> {
        let p = Polynomial::new(constants(&[1, 2, 3]))?;
        let q = Polynomial::new(constants(&[4, 5, 1006]))?;
        let sum = p.add(&q)?;
        assert_eq!(sum.degree(), 1);
        assert_eq!(sum, Polynomial::new(constants(&[5, 7]))?);
        Ok(())
    }

    #[test]
    fn test_factors_and_encoding() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(81);
        let f = PRing::Field(field());
        let ring = PRing::Product(PPRing::power(&f, 2)?);
        let coefficients = (0..4)
            .map(|_| ring.random_element(&mut rng, 20))
            .collect::<Result<Vec<_>, _>>()?;
        let p = Polynomial::new(coefficients)?;

        let factors = p.factors()?;
        assert_eq!(factors.len(), 2);
        let x = field().to_element(&LargeInteger::from(17));
        let value = p.evaluate(&x)?;
        if let Some(value) = value.as_product() {
            for (i, factor) in factors.iter().enumerate() {
                assert_eq!(factor.evaluate(&x)?, value.project(i));
            }
        }

        let tree = p.to_byte_tree()?;
        assert_eq!(Polynomial::from_reader(&ring, 3, &mut tree.reader())?, p);
        assert!(Polynomial::from_reader(&ring, 2, &mut tree.reader()).is_err());
        assert!(Polynomial::new(constants(&[1])).and_then(|p| p.factors()).is_err());
        Ok(())
    }
}
