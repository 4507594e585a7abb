//! Target operations and their images on the reconstruction basis.
//!
//! ## Purpose
//!
//! This module defines the closed set of linear functionals GMLS can
//! approximate at a target, checks each against the configured space,
//! dimension and geometry, and expresses each output component as a
//! combination of derivatives at the target (a [`Functional`]).
//!
//! ## Design notes
//!
//! * **Closed enum**: Operators are dispatched by exhaustive `match`.
//! * **Functional form**: Every output component is `Σ coef · ∂^α u_q(0)`.
//!   Euclidean coefficients are constants; manifold coefficients come from
//!   the local metric.
//! * **Basis images**: Applying a functional to each basis function (with the
//!   `1/h^|α|` scaling of the offsets) yields the vector `b` whose inner
//!   product with the fitted coefficients evaluates the operator.
//!
//! ## Invariants
//!
//! * Output and input component counts depend only on the ambient dimension.

use num_traits::Float;

use crate::algorithms::basis::{PolynomialBasis, ReconstructionSpace};
use crate::math::constant;
use crate::math::polynomial::{Exponent, MAX_VARIABLES, axis, degree_of};
use crate::primitives::errors::GmlsError;

/// Closed set of operators approximated by generated stencils.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetOperation {
    /// `f(x_t)`.
    ScalarPointEvaluation,
    /// `u(x_t)` for vector data.
    VectorPointEvaluation,
    /// `Δf(x_t)`, or Laplace–Beltrami on a manifold.
    LaplacianOfScalarPointEvaluation,
    /// `∇f(x_t)`, in ambient coordinates on a manifold.
    GradientOfScalarPointEvaluation,
    /// `∂f/∂x (x_t)`.
    PartialXOfScalarPointEvaluation,
    /// `∂f/∂y (x_t)`.
    PartialYOfScalarPointEvaluation,
    /// `∂f/∂z (x_t)`.
    PartialZOfScalarPointEvaluation,
    /// `∇·u (x_t)`.
    DivergenceOfVectorPointEvaluation,
    /// `∇×u (x_t)`; scalar in 2D.
    CurlOfVectorPointEvaluation,
    /// `∇×∇×u (x_t)`.
    CurlCurlOfVectorPointEvaluation,
}

/// One term `coef · ∂^alpha u_component (0)` of a functional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionalTerm<T> {
    /// Input component differentiated.
    pub component: usize,
    /// Multi-index of the derivative.
    pub alpha: Exponent,
    /// Scalar coefficient.
    pub coef: T,
}

/// Linear combination of derivatives at the target.
pub type Functional<T> = Vec<FunctionalTerm<T>>;

#[inline]
fn term<T: Float>(component: usize, alpha: Exponent, coef: f64) -> FunctionalTerm<T> {
    FunctionalTerm {
        component,
        alpha,
        coef: constant(coef),
    }
}

#[inline]
fn second(i: usize, j: usize) -> Exponent {
    let mut e = [0; MAX_VARIABLES];
    e[i] += 1;
    e[j] += 1;
    e
}

impl TargetOperation {
    /// Every operation, in declaration order.
    pub const ALL: [TargetOperation; 10] = [
        Self::ScalarPointEvaluation,
        Self::VectorPointEvaluation,
        Self::LaplacianOfScalarPointEvaluation,
        Self::GradientOfScalarPointEvaluation,
        Self::PartialXOfScalarPointEvaluation,
        Self::PartialYOfScalarPointEvaluation,
        Self::PartialZOfScalarPointEvaluation,
        Self::DivergenceOfVectorPointEvaluation,
        Self::CurlOfVectorPointEvaluation,
        Self::CurlCurlOfVectorPointEvaluation,
    ];

    /// Operator name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScalarPointEvaluation => "ScalarPointEvaluation",
            Self::VectorPointEvaluation => "VectorPointEvaluation",
            Self::LaplacianOfScalarPointEvaluation => "LaplacianOfScalarPointEvaluation",
            Self::GradientOfScalarPointEvaluation => "GradientOfScalarPointEvaluation",
            Self::PartialXOfScalarPointEvaluation => "PartialXOfScalarPointEvaluation",
            Self::PartialYOfScalarPointEvaluation => "PartialYOfScalarPointEvaluation",
            Self::PartialZOfScalarPointEvaluation => "PartialZOfScalarPointEvaluation",
            Self::DivergenceOfVectorPointEvaluation => "DivergenceOfVectorPointEvaluation",
            Self::CurlOfVectorPointEvaluation => "CurlOfVectorPointEvaluation",
            Self::CurlCurlOfVectorPointEvaluation => "CurlCurlOfVectorPointEvaluation",
        }
    }

    /// Whether the operator consumes vector-valued data.
    #[inline]
    pub fn takes_vector_input(&self) -> bool {
        matches!(
            self,
            Self::VectorPointEvaluation
                | Self::DivergenceOfVectorPointEvaluation
                | Self::CurlOfVectorPointEvaluation
                | Self::CurlCurlOfVectorPointEvaluation
        )
    }

    /// Number of data components consumed per source site.
    #[inline]
    pub fn input_components(&self, dimensions: usize) -> usize {
        if self.takes_vector_input() {
            dimensions
        } else {
            1
        }
    }

    /// Number of values produced per target.
    pub fn output_components(&self, dimensions: usize) -> usize {
        match self {
            Self::VectorPointEvaluation
            | Self::GradientOfScalarPointEvaluation
            | Self::CurlCurlOfVectorPointEvaluation => dimensions,
            Self::CurlOfVectorPointEvaluation if dimensions == 3 => 3,
            _ => 1,
        }
    }

    /// Highest derivative order appearing in the operator.
    pub fn order(&self) -> usize {
        match self {
            Self::ScalarPointEvaluation | Self::VectorPointEvaluation => 0,
            Self::GradientOfScalarPointEvaluation
            | Self::PartialXOfScalarPointEvaluation
            | Self::PartialYOfScalarPointEvaluation
            | Self::PartialZOfScalarPointEvaluation
            | Self::DivergenceOfVectorPointEvaluation
            | Self::CurlOfVectorPointEvaluation => 1,
            Self::LaplacianOfScalarPointEvaluation | Self::CurlCurlOfVectorPointEvaluation => 2,
        }
    }

    /// Check that the operator can be evaluated for this configuration.
    pub fn check_support(
        &self,
        space: ReconstructionSpace,
        degree: usize,
        dimensions: usize,
        manifold: bool,
    ) -> Result<(), GmlsError> {
        let unsupported = |reason| {
            Err(GmlsError::UnsupportedOperator {
                operator: self.name(),
                reason,
            })
        };

        if self.takes_vector_input() != space.is_vector() {
            return if space.is_vector() {
                unsupported("scalar operator requested on a vector reconstruction space")
            } else {
                unsupported("vector operator requested on a scalar reconstruction space")
            };
        }
        if degree < self.order() {
            return unsupported("polynomial degree is below the derivative order");
        }
        if manifold
            && !matches!(
                self,
                Self::ScalarPointEvaluation
                    | Self::GradientOfScalarPointEvaluation
                    | Self::LaplacianOfScalarPointEvaluation
            )
        {
            return unsupported("only point evaluation, gradient and Laplacian exist on manifolds");
        }
        match self {
            Self::PartialYOfScalarPointEvaluation if dimensions < 2 => {
                unsupported("requires at least 2 dimensions")
            }
            Self::PartialZOfScalarPointEvaluation if dimensions < 3 => {
                unsupported("requires 3 dimensions")
            }
            Self::CurlOfVectorPointEvaluation | Self::CurlCurlOfVectorPointEvaluation
                if dimensions < 2 =>
            {
                unsupported("requires at least 2 dimensions")
            }
            _ => Ok(()),
        }
    }

    /// Euclidean functional of output component `c` in `d` dimensions.
    pub fn euclidean_functional<T: Float>(&self, c: usize, d: usize) -> Functional<T> {
        match self {
            Self::ScalarPointEvaluation => vec![term(0, [0; MAX_VARIABLES], 1.0)],
            Self::VectorPointEvaluation => vec![term(c, [0; MAX_VARIABLES], 1.0)],
            Self::LaplacianOfScalarPointEvaluation => {
                (0..d).map(|i| term(0, second(i, i), 1.0)).collect()
            }
            Self::GradientOfScalarPointEvaluation => vec![term(0, axis(c), 1.0)],
            Self::PartialXOfScalarPointEvaluation => vec![term(0, axis(0), 1.0)],
            Self::PartialYOfScalarPointEvaluation => vec![term(0, axis(1), 1.0)],
            Self::PartialZOfScalarPointEvaluation => vec![term(0, axis(2), 1.0)],
            Self::DivergenceOfVectorPointEvaluation => {
                (0..d).map(|i| term(i, axis(i), 1.0)).collect()
            }
            Self::CurlOfVectorPointEvaluation => {
                if d == 2 {
                    vec![term(1, axis(0), 1.0), term(0, axis(1), -1.0)]
                } else {
                    let (j, k) = ((c + 1) % 3, (c + 2) % 3);
                    vec![term(k, axis(j), 1.0), term(j, axis(k), -1.0)]
                }
            }
            Self::CurlCurlOfVectorPointEvaluation => {
                // ∇×∇×u = ∇(∇·u) − Δu
                let mut f: Functional<T> = (0..d).map(|i| term(i, second(c, i), 1.0)).collect();
                f.extend((0..d).map(|i| term(c, second(i, i), -1.0)));
                f
            }
        }
    }
}

/// Apply `functional` to every basis function, with offsets scaled by `h`.
///
/// For component-wise spaces only terms acting on `input_component` are
/// kept; for the divergence-free space the term component selects the
/// basis component and `input_component` is ignored.
pub fn basis_image<T: Float>(
    basis: &PolynomialBasis,
    functional: &[FunctionalTerm<T>],
    input_component: usize,
    h: T,
    out: &mut [T],
) {
    let shared = basis.row_components() > 1;
    for (m, o) in out.iter_mut().enumerate().take(basis.size()) {
        let mut acc = T::zero();
        for t in functional {
            let component = if shared {
                t.component
            } else if t.component == input_component {
                0
            } else {
                continue;
            };
            let v = basis.derivative_at_origin(m, component, &t.alpha);
            if v != 0.0 {
                let scale = h.powi(degree_of(&t.alpha) as i32);
                acc = acc + t.coef * constant::<T>(v) / scale;
            }
        }
        *o = acc;
    }
}
