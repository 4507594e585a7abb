//! Local manifold geometry from a curvature fit.
//!
//! ## Purpose
//!
//! Around a manifold target the surface is written as a graph over its
//! tangent plane, `X(u) = x_t + Σ u_i t_i + η(u) n`. This module turns the
//! fitted height polynomial `η` into the metric quantities needed to express
//! the gradient and the Laplace–Beltrami operator in tangent coordinates.
//!
//! ## Key concepts
//!
//! * **Metric**: with `a = ∇η(0)` and `H = ∇²η(0)`:
//!   `g = I + a aᵀ`, `g⁻¹ = I − a aᵀ / (1 + |a|²)`,
//!   `∂_k g_ij = H_ik a_j + a_i H_jk`,
//!   `∂_k g^ij = −g^ia ∂_k g_ab g^bj`,
//!   `∂_i ln√g = ½ g^ab ∂_i g_ab`.
//! * **Gradient**: `∇_M f = Σ g^ij ∂_j f (t_i + a_i n)`, in ambient coordinates.
//! * **Laplace–Beltrami**:
//!   `Δ_M f = g^ij ∂_ij f + (∂_i g^ij + g^ij ∂_i ln√g) ∂_j f`.
//!
//! ## Invariants
//!
//! * At most two intrinsic dimensions (curves in 2D, surfaces in 3D).

use num_traits::Float;

use crate::algorithms::basis::PolynomialBasis;
use crate::algorithms::operators::{Functional, FunctionalTerm, TargetOperation};
use crate::math::constant;
use crate::math::eigen::TangentFrame;
use crate::math::polynomial::{Exponent, MAX_VARIABLES, axis};

/// Metric data of the surface at one target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManifoldGeometry<T> {
    frame: TangentFrame<T>,
    slope: [T; 2],
    hessian: [[T; 2]; 2],
    metric_inverse: [[T; 2]; 2],
    // metric_inverse_derivative[k][i][j] = ∂_k g^ij
    metric_inverse_derivative: [[[T; 2]; 2]; 2],
    // ∂_i ln√g
    log_volume_derivative: [T; 2],
}

impl<T: Float> ManifoldGeometry<T> {
    /// Geometry of the tangent plane itself (zero slope and curvature).
    pub fn flat(frame: TangentFrame<T>) -> Self {
        let z = T::zero();
        Self::new(frame, [z; 2], [[z; 2]; 2])
    }

    /// Geometry from the slope `∇η(0)` and Hessian `∇²η(0)` of the height.
    pub fn new(frame: TangentFrame<T>, slope: [T; 2], hessian: [[T; 2]; 2]) -> Self {
        let q = frame.dimensions() - 1;
        let z = T::zero();
        let one = T::one();

        let mut metric = [[z; 2]; 2];
        for (i, row) in metric.iter_mut().enumerate().take(q) {
            for (j, g) in row.iter_mut().enumerate().take(q) {
                *g = if i == j { one } else { z } + slope[i] * slope[j];
            }
        }

        let denom = one + (0..q).fold(z, |acc, i| acc + slope[i] * slope[i]);
        let mut metric_inverse = [[z; 2]; 2];
        for (i, row) in metric_inverse.iter_mut().enumerate().take(q) {
            for (j, g) in row.iter_mut().enumerate().take(q) {
                *g = if i == j { one } else { z } - slope[i] * slope[j] / denom;
            }
        }

        // ∂_k g_ij
        let mut metric_derivative = [[[z; 2]; 2]; 2];
        for (k, dk) in metric_derivative.iter_mut().enumerate().take(q) {
            for (i, row) in dk.iter_mut().enumerate().take(q) {
                for (j, v) in row.iter_mut().enumerate().take(q) {
                    *v = hessian[i][k] * slope[j] + slope[i] * hessian[j][k];
                }
            }
        }

        let mut metric_inverse_derivative = [[[z; 2]; 2]; 2];
        for k in 0..q {
            for i in 0..q {
                for j in 0..q {
                    let mut acc = z;
                    for a in 0..q {
                        for b in 0..q {
                            acc = acc
                                + metric_inverse[i][a]
                                    * metric_derivative[k][a][b]
                                    * metric_inverse[b][j];
                        }
                    }
                    metric_inverse_derivative[k][i][j] = -acc;
                }
            }
        }

        let half: T = constant(0.5);
        let mut log_volume_derivative = [z; 2];
        for (i, v) in log_volume_derivative.iter_mut().enumerate().take(q) {
            let mut acc = z;
            for a in 0..q {
                for b in 0..q {
                    acc = acc + metric_inverse[a][b] * metric_derivative[i][a][b];
                }
            }
            *v = half * acc;
        }

        Self {
            frame,
            slope,
            hessian,
            metric_inverse,
            metric_inverse_derivative,
            log_volume_derivative,
        }
    }

    /// Geometry from the fitted coefficients of the height polynomial over
    /// `curvature_basis` (offsets scaled by `h`).
    pub fn from_height_fit(
        frame: TangentFrame<T>,
        curvature_basis: &PolynomialBasis,
        coefficients: &[T],
        h: T,
    ) -> Self {
        let q = frame.dimensions() - 1;
        let z = T::zero();
        let derivative = |alpha: Exponent, order: i32| {
            let scale = h.powi(order);
            coefficients
                .iter()
                .enumerate()
                .fold(z, |acc, (m, &c)| {
                    acc + c * constant::<T>(curvature_basis.derivative_at_origin(m, 0, &alpha))
                })
                / scale
        };

        let mut slope = [z; 2];
        let mut hessian = [[z; 2]; 2];
        for i in 0..q {
            slope[i] = derivative(axis(i), 1);
            for j in 0..q {
                let mut e = [0; MAX_VARIABLES];
                e[i] += 1;
                e[j] += 1;
                hessian[i][j] = derivative(e, 2);
            }
        }
        Self::new(frame, slope, hessian)
    }

    /// Tangent frame at the target.
    #[inline]
    pub fn frame(&self) -> &TangentFrame<T> {
        &self.frame
    }

    /// Number of intrinsic (tangent) dimensions.
    #[inline]
    pub fn intrinsic_dimensions(&self) -> usize {
        self.frame.dimensions() - 1
    }

    /// `∇η(0)`.
    #[inline]
    pub fn slope(&self) -> [T; 2] {
        self.slope
    }

    /// `∇²η(0)`.
    #[inline]
    pub fn hessian(&self) -> [[T; 2]; 2] {
        self.hessian
    }

    /// `g^{-1}` at the target.
    #[inline]
    pub fn metric_inverse(&self) -> [[T; 2]; 2] {
        self.metric_inverse
    }

    /// Functional of output component `c` of `op`, in tangent coordinates.
    pub fn functional(&self, op: TargetOperation, c: usize) -> Functional<T> {
        let q = self.intrinsic_dimensions();
        let term = |alpha: Exponent, coef: T| FunctionalTerm {
            component: 0,
            alpha,
            coef,
        };
        match op {
            TargetOperation::GradientOfScalarPointEvaluation => {
                let normal = self.frame.normal()[c];
                (0..q)
                    .map(|j| {
                        let coef = (0..q).fold(T::zero(), |acc, i| {
                            let tangent = self.frame.tangent(i)[c];
                            acc + self.metric_inverse[i][j] * (tangent + self.slope[i] * normal)
                        });
                        term(axis(j), coef)
                    })
                    .collect()
            }
            TargetOperation::LaplacianOfScalarPointEvaluation => {
                let mut f = Vec::with_capacity(q * q + q);
                for i in 0..q {
                    for j in 0..q {
                        let mut e = [0; MAX_VARIABLES];
                        e[i] += 1;
                        e[j] += 1;
                        f.push(term(e, self.metric_inverse[i][j]));
                    }
                }
                for j in 0..q {
                    let coef = (0..q).fold(T::zero(), |acc, i| {
                        acc + self.metric_inverse_derivative[i][i][j]
                            + self.metric_inverse[i][j] * self.log_volume_derivative[i]
                    });
                    f.push(term(axis(j), coef));
                }
                f
            }
            _ => vec![term([0; MAX_VARIABLES], T::one())],
        }
    }
}
