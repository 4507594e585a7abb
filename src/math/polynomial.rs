//! Monomial enumeration and analytic differentiation.
//!
//! ## Purpose
//!
//! This module enumerates the monomials of total degree at most N in up to
//! three variables, evaluates sparse polynomials built from them, and
//! differentiates them exactly.
//!
//! ## Design notes
//!
//! * **Fixed ordering**: Monomials are ordered by total degree, then by the
//!   lexicographic order of their variable multisets (`1, x, y, x², xy, y²`
//!   in 2D). The order never depends on the data.
//! * **Sparse terms**: A polynomial is a list of [`Term`]s with `f64`
//!   coefficients. Coefficients are small integers, so they are exact.
//!
//! ## Invariants
//!
//! * `monomial_exponents(n, d).len() == unisolvency_size(n, d)`.
//! * Exponents of variables beyond the evaluation dimension are zero.

use itertools::Itertools;
use num_traits::Float;

use crate::math::constant;

/// Largest supported number of variables.
pub const MAX_VARIABLES: usize = 3;

/// Per-variable exponents of one monomial.
pub type Exponent = [u8; MAX_VARIABLES];

/// Number of monomials of total degree at most `degree` in `dimension`
/// variables: `C(degree + dimension, dimension)`.
pub fn unisolvency_size(degree: usize, dimension: usize) -> usize {
    // Incremental product stays integral: C(n+i, i) = C(n+i-1, i-1) * (n+i) / i.
    (1..=dimension).fold(1, |acc, i| acc * (degree + i) / i)
}

/// Exponents of all monomials of total degree at most `degree`.
pub fn monomial_exponents(degree: usize, dimension: usize) -> Vec<Exponent> {
    let mut out = Vec::with_capacity(unisolvency_size(degree, dimension));
    out.push([0; MAX_VARIABLES]);
    for k in 1..=degree {
        for combo in (0..dimension).combinations_with_replacement(k) {
            let mut e = [0u8; MAX_VARIABLES];
            for v in combo {
                e[v] += 1;
            }
            out.push(e);
        }
    }
    out
}

/// Exponent of a single variable raised to one.
#[inline]
pub fn axis(i: usize) -> Exponent {
    let mut e = [0; MAX_VARIABLES];
    e[i] = 1;
    e
}

/// Total degree of an exponent.
#[inline]
pub fn degree_of(e: &Exponent) -> usize {
    e.iter().map(|&v| v as usize).sum()
}

/// Product of the factorials of the exponents (`α!`).
#[inline]
pub fn factorial_of(e: &Exponent) -> f64 {
    e.iter()
        .map(|&v| (1..=v as u32).product::<u32>() as f64)
        .product()
}

// ============================================================================
// Terms
// ============================================================================

/// One scaled monomial `coef · x^exponent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    /// Scalar coefficient.
    pub coef: f64,
    /// Per-variable exponents.
    pub exponent: Exponent,
}

impl Term {
    /// The monomial `x^exponent` with unit coefficient.
    #[inline]
    pub fn monomial(exponent: Exponent) -> Self {
        Self {
            coef: 1.0,
            exponent,
        }
    }

    /// Evaluate at `x` (only the first `x.len()` exponents are used).
    #[inline]
    pub fn evaluate<T: Float>(&self, x: &[T]) -> T {
        let mut v: T = constant(self.coef);
        for (xi, &e) in x.iter().zip(self.exponent.iter()) {
            if e > 0 {
                v = v * xi.powi(e as i32);
            }
        }
        v
    }

    /// Partial derivative `∂^alpha`, or `None` if it vanishes identically.
    pub fn derivative(&self, alpha: &Exponent) -> Option<Self> {
        let mut coef = self.coef;
        let mut exponent = self.exponent;
        for i in 0..MAX_VARIABLES {
            let (e, a) = (exponent[i], alpha[i]);
            if a > e {
                return None;
            }
            for k in 0..a {
                coef *= (e - k) as f64;
            }
            exponent[i] = e - a;
        }
        Some(Self { coef, exponent })
    }

    /// Value of `∂^alpha` of this term at the origin.
    #[inline]
    pub fn derivative_at_origin(&self, alpha: &Exponent) -> f64 {
        if self.exponent == *alpha {
            self.coef * factorial_of(alpha)
        } else {
            0.0
        }
    }
}

/// Evaluate a sparse polynomial at `x`.
#[inline]
pub fn evaluate_terms<T: Float>(terms: &[Term], x: &[T]) -> T {
    terms
        .iter()
        .fold(T::zero(), |acc, term| acc + term.evaluate(x))
}

/// Differentiate a sparse polynomial.
pub fn differentiate_terms(terms: &[Term], alpha: &Exponent) -> Vec<Term> {
    terms.iter().filter_map(|t| t.derivative(alpha)).collect()
}

/// Value of `∂^alpha` of a sparse polynomial at the origin.
#[inline]
pub fn derivative_terms_at_origin(terms: &[Term], alpha: &Exponent) -> f64 {
    terms.iter().map(|t| t.derivative_at_origin(alpha)).sum()
}
