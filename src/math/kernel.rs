//! Compactly supported weighting kernels.
//!
//! ## Purpose
//!
//! This module maps a normalized distance `r = ‖offset‖ / h` to a
//! non-negative weight. Kernels weight neighbors in the reconstruction
//! fit and, possibly with a different family or exponent, in the manifold
//! tangent and curvature estimation.
//!
//! ## Key concepts
//!
//! * **Compact support**: Every kernel is zero for `r >= 1`, so neighbors
//!   outside the window simply drop out of the fit.
//! * **Monotone**: Every kernel is non-increasing on `[0, 1)`.
//!
//! ## Invariants
//!
//! * `weight(r) >= 0` for all `r`.
//! * `weight(r) == 0` for `r >= 1` or non-finite `r`.

use num_traits::Float;

use crate::math::constant;

/// Distance-to-weight function family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightingFunction {
    /// `(1 - r)^p`.
    Power(u32),

    /// Cubic B-spline scaled to `[0, 1)`.
    CubicSpline,

    /// Wendland C2: `(1 - r)^4 (4r + 1)`.
    Wendland,

    /// Constant 1 inside the window.
    Uniform,
}

impl Default for WeightingFunction {
    fn default() -> Self {
        Self::Power(Self::DEFAULT_POWER)
    }
}

impl WeightingFunction {
    /// Default power exponent used when none is specified.
    pub const DEFAULT_POWER: u32 = 2;

    /// Human-readable kernel name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Power(_) => "Power",
            Self::CubicSpline => "CubicSpline",
            Self::Wendland => "Wendland",
            Self::Uniform => "Uniform",
        }
    }

    /// Weight at normalized distance `r`.
    #[inline]
    pub fn weight<T: Float>(&self, r: T) -> T {
        let one = T::one();
        let r = r.abs();
        if !r.is_finite() || r >= one {
            return T::zero();
        }
        match *self {
            Self::Power(p) => (one - r).powi(p as i32),
            Self::CubicSpline => {
                let half: T = constant(0.5);
                let q = r + r;
                if r < half {
                    let c: T = constant(6.0);
                    one - c * r * r * (one - r)
                } else {
                    let two = one + one;
                    let t = two - q;
                    t * t * t / (two * two)
                }
            }
            Self::Wendland => {
                let four: T = constant(4.0);
                let t = one - r;
                let t2 = t * t;
                t2 * t2 * (four * r + one)
            }
            Self::Uniform => one,
        }
    }

    /// Weight of the offset `offset` for window size `h`.
    #[inline]
    pub fn weight_of_offset<T: Float>(&self, offset: &[T], h: T) -> T {
        let r2 = offset.iter().fold(T::zero(), |acc, &v| acc + v * v);
        self.weight(r2.sqrt() / h)
    }
}
