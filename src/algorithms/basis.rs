//! Polynomial reconstruction spaces.
//!
//! ## Purpose
//!
//! This module builds the ordered basis used by the local least-squares fit
//! and evaluates it at scaled neighbor offsets.
//!
//! ## Design notes
//!
//! * **Uniform representation**: Every basis function is stored as a vector
//!   polynomial (one sparse term list per row component). Scalar monomials
//!   have a single component; divergence-free fields have `d`.
//! * **Divergence-free 2D**: curls `(∂y ψ, −∂x ψ)` of the monomials ψ of
//!   degree `1..=N+1`.
//! * **Divergence-free 3D**: curls of `m·e_i` for monomials m of degree
//!   `1..=N+1`, taken in a fixed order and kept when linearly independent of
//!   those already kept (incremental Gaussian elimination on exact integer
//!   coefficients).
//!
//! ## Key concepts
//!
//! * **Row components**: Scalar and component-wise vector spaces contribute
//!   one design-matrix row per neighbor; the divergence-free space
//!   contributes one row per neighbor and component.
//! * **Minimum support**: A target needs at least `ceil(size / rows)`
//!   neighbors for its system to be determined.
//!
//! ## Invariants
//!
//! * `PolynomialBasis::size()` is `NP(N, d)` for the scalar and vector
//!   spaces, `NP(N+1, 2) − 1` for divergence-free 2D and
//!   `3·NP(N, 3) − NP(N−1, 3)` for divergence-free 3D.

use num_traits::Float;

use crate::math::polynomial::{
    Exponent, Term, axis, derivative_terms_at_origin, differentiate_terms, evaluate_terms,
    monomial_exponents, unisolvency_size,
};

/// Function space of the local reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconstructionSpace {
    /// Scalar polynomials of total degree ≤ N.
    #[default]
    ScalarTaylorPolynomial,

    /// Each vector component reconstructed independently with the scalar basis.
    VectorTaylorPolynomial,

    /// Vector polynomials of degree ≤ N with zero divergence.
    DivergenceFreeVectorTaylorPolynomial,
}

impl ReconstructionSpace {
    /// Whether the sampled data is vector valued.
    #[inline]
    pub fn is_vector(&self) -> bool {
        !matches!(self, Self::ScalarTaylorPolynomial)
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScalarTaylorPolynomial => "ScalarTaylorPolynomial",
            Self::VectorTaylorPolynomial => "VectorTaylorPolynomial",
            Self::DivergenceFreeVectorTaylorPolynomial => "DivergenceFreeVectorTaylorPolynomial",
        }
    }
}

// ============================================================================
// Polynomial Basis
// ============================================================================

/// Ordered basis of a reconstruction space.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialBasis {
    space: ReconstructionSpace,
    degree: usize,
    variables: usize,
    components: usize,
    // functions[m][c] is the term list of component c of basis function m.
    functions: Vec<Vec<Vec<Term>>>,
}

impl PolynomialBasis {
    /// Build the basis of `space` with total degree `degree` in `variables`
    /// variables.
    pub fn new(space: ReconstructionSpace, degree: usize, variables: usize) -> Self {
        match space {
            ReconstructionSpace::DivergenceFreeVectorTaylorPolynomial if variables == 2 => {
                Self::divergence_free_2d(degree)
            }
            ReconstructionSpace::DivergenceFreeVectorTaylorPolynomial => {
                Self::divergence_free_3d(degree)
            }
            _ => {
                let functions = monomial_exponents(degree, variables)
                    .into_iter()
                    .map(|e| vec![vec![Term::monomial(e)]])
                    .collect();
                Self {
                    space,
                    degree,
                    variables,
                    components: 1,
                    functions,
                }
            }
        }
    }

    /// Scalar monomial basis.
    #[inline]
    pub fn scalar(degree: usize, variables: usize) -> Self {
        Self::new(ReconstructionSpace::ScalarTaylorPolynomial, degree, variables)
    }

    fn divergence_free_2d(degree: usize) -> Self {
        let functions = monomial_exponents(degree + 1, 2)
            .into_iter()
            .skip(1)
            .map(|e| {
                let psi = [Term::monomial(e)];
                let ux = differentiate_terms(&psi, &axis(1));
                let uy = negate(differentiate_terms(&psi, &axis(0)));
                vec![ux, uy]
            })
            .collect();
        Self {
            space: ReconstructionSpace::DivergenceFreeVectorTaylorPolynomial,
            degree,
            variables: 2,
            components: 2,
            functions,
        }
    }

    fn divergence_free_3d(degree: usize) -> Self {
        let target = 3 * unisolvency_size(degree, 3)
            - if degree == 0 {
                0
            } else {
                unisolvency_size(degree - 1, 3)
            };
        let monomials = monomial_exponents(degree, 3);
        let width = 3 * monomials.len();

        let mut pivots: Vec<(usize, Vec<f64>)> = Vec::with_capacity(target);
        let mut functions = Vec::with_capacity(target);

        'outer: for e in monomial_exponents(degree + 1, 3).into_iter().skip(1) {
            for i in 0..3 {
                let field = curl_of_axis_potential(e, i);

                let mut v = vec![0.0; width];
                for (c, terms) in field.iter().enumerate() {
                    for t in terms {
                        if let Some(p) = monomials.iter().position(|m| *m == t.exponent) {
                            v[c * monomials.len() + p] += t.coef;
                        }
                    }
                }
                for (p, row) in &pivots {
                    let f = v[*p];
                    if f != 0.0 {
                        for (x, r) in v.iter_mut().zip(row.iter()) {
                            *x -= f * r;
                        }
                    }
                }
                let (p, max) = v
                    .iter()
                    .enumerate()
                    .fold((0, 0.0f64), |(bi, bv), (i, &x)| {
                        if x.abs() > bv { (i, x.abs()) } else { (bi, bv) }
                    });
                if max < 1e-9 {
                    continue;
                }
                let scale = v[p];
                for x in v.iter_mut() {
                    *x /= scale;
                }
                pivots.push((p, v));
                functions.push(field);
                if functions.len() == target {
                    break 'outer;
                }
            }
        }

        Self {
            space: ReconstructionSpace::DivergenceFreeVectorTaylorPolynomial,
            degree,
            variables: 3,
            components: 3,
            functions,
        }
    }

    /// Reconstruction space of this basis.
    #[inline]
    pub fn space(&self) -> ReconstructionSpace {
        self.space
    }

    /// Total polynomial degree.
    #[inline]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of polynomial variables.
    #[inline]
    pub fn variables(&self) -> usize {
        self.variables
    }

    /// Number of basis functions.
    #[inline]
    pub fn size(&self) -> usize {
        self.functions.len()
    }

    /// Design-matrix rows contributed by each neighbor.
    #[inline]
    pub fn row_components(&self) -> usize {
        self.components
    }

    /// Fewest neighbors for which the fit can be determined.
    #[inline]
    pub fn min_neighbors(&self) -> usize {
        self.size().div_ceil(self.components)
    }

    /// Terms of component `c` of basis function `m`.
    #[inline]
    pub fn terms(&self, m: usize, c: usize) -> &[Term] {
        &self.functions[m][c]
    }

    /// Evaluate component `c` of every basis function at `x` into `out`.
    pub fn evaluate<T: Float>(&self, x: &[T], c: usize, out: &mut [T]) {
        for (o, f) in out.iter_mut().zip(self.functions.iter()) {
            *o = evaluate_terms(&f[c], x);
        }
    }

    /// `∂^alpha` of component `c` of basis function `m` at the origin.
    #[inline]
    pub fn derivative_at_origin(&self, m: usize, c: usize, alpha: &Exponent) -> f64 {
        derivative_terms_at_origin(&self.functions[m][c], alpha)
    }
}

fn negate(mut terms: Vec<Term>) -> Vec<Term> {
    for t in terms.iter_mut() {
        t.coef = -t.coef;
    }
    terms
}

/// `curl(x^e · e_i)` as three term lists.
fn curl_of_axis_potential(e: Exponent, i: usize) -> Vec<Vec<Term>> {
    let m = [Term::monomial(e)];
    let d = |k: usize| differentiate_terms(&m, &axis(k));
    match i {
        0 => vec![Vec::new(), d(2), negate(d(1))],
        1 => vec![negate(d(2)), Vec::new(), d(0)],
        _ => vec![d(1), negate(d(0)), Vec::new()],
    }
}
