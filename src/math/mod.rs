//! Layer 2: Math
//!
//! # Purpose
//!
//! This layer provides pure mathematical building blocks used throughout GMLS:
//! - Weighting kernels for distance-based weighting
//! - Monomial enumeration, evaluation and differentiation
//! - Dense least-squares solves bridged to nalgebra
//! - Small symmetric eigen-solvers for tangent-frame extraction
//!
//! These carry no GMLS-specific orchestration logic.
//!
//! # Architecture
//!
//! ```text
//! Layer 5: API
//!   ↓
//! Layer 4: Engine
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math ← You are here
//!   ↓
//! Layer 1: Primitives
//! ```

use num_traits::Float;

/// Kernel (weight) functions for distance-based weighting.
pub mod kernel;

/// Monomials and their derivatives.
pub mod polynomial;

/// Dense linear algebra bridge.
pub mod linalg;

/// Power iteration for 2x2 and 3x3 symmetric matrices.
pub mod eigen;

/// Convert an `f64` literal into the working float type.
#[inline]
pub(crate) fn constant<T: Float>(v: f64) -> T {
    T::from(v).unwrap_or_else(T::nan)
}
