//! # GMLS: Generalized Moving Least Squares for Rust
//!
//! Meshfree stencil generation for scattered point clouds and surfaces.
//!
//! ## What is GMLS?
//!
//! Generalized moving least squares approximates a linear functional of a
//! field (a point value, a derivative, a Laplacian, a curl, ...) at a target
//! location as a weighted sum of samples at nearby source sites:
//!
//! ```text
//! τ(u) ≈ Σ_k α_k u(x_k)
//! ```
//!
//! The weights `α` (the *stencil*, or *alphas*) are obtained by fitting a
//! local polynomial reconstruction with a compactly supported kernel and
//! applying the functional to that reconstruction. They depend only on the
//! geometry, so one set of alphas can be reused for any number of data sets.
//!
//! Key features:
//!
//! - **Operators**: point evaluation, partial derivatives, gradient,
//!   Laplacian, divergence, curl and curl-curl.
//! - **Reconstruction spaces**: scalar, componentwise vector and
//!   divergence-free vector polynomials.
//! - **Manifolds**: targets on a curve (2D) or surface (3D) with gradient and
//!   Laplace–Beltrami computed in estimated tangent coordinates.
//! - **Batched**: every target is independent; assembly, dense solves and
//!   alpha extraction run data-parallel on rayon.
//! - **Partial failure**: targets without enough support or with singular
//!   local systems are reported per target; the rest of the batch succeeds.
//!
//! ## Quick Start
//!
//! ```
//! use gmls_rs::prelude::*;
//!
//! // 5 × 5 grid on [-1, 1]², target at the origin.
//! let mut rows = Vec::new();
//! for i in 0..5 {
//!     for j in 0..5 {
//!         rows.push([-1.0 + 0.5 * i as f64, -1.0 + 0.5 * j as f64]);
//!     }
//! }
//! let sources = PointCloud::from_rows(&rows)?;
//! let targets = PointCloud::from_rows(&[[0.0, 0.0]])?;
//! let neighbors = NeighborLists::from_lists(&[(0..25).collect::<Vec<usize>>()]);
//!
//! let model = Gmls::<f64>::new()
//!     .dimensions(2)
//!     .degree(2)
//!     .operators(&[TargetOperation::LaplacianOfScalarPointEvaluation])
//!     .build()?;
//! let alphas = model.generate_alphas(&sources, &targets, &neighbors, &[1.5])?;
//!
//! // u = x² + y², Δu = 4.
//! let data: Vec<f64> = rows.iter().map(|p| p[0] * p[0] + p[1] * p[1]).collect();
//! let laplacian = alphas.apply(TargetOperation::LaplacianOfScalarPointEvaluation, &data)?;
//! assert!((laplacian.get(0, 0).unwrap() - 4.0).abs() < 1e-8);
//! # Result::<(), GmlsError>::Ok(())
//! ```
//!
//! ## Parameters
//!
//! | Parameter                      | Default            | Meaning                                   |
//! |--------------------------------|--------------------|-------------------------------------------|
//! | `dimensions`                   | required           | ambient dimension (1, 2 or 3)             |
//! | `operators`                    | required           | stencils to generate                      |
//! | `degree`                       | 2                  | reconstruction polynomial degree          |
//! | `reconstruction_space`         | scalar             | scalar, vector or divergence-free         |
//! | `manifold()`                   | off                | targets on a codimension-one manifold     |
//! | `curvature_degree`             | 2                  | degree of the manifold height fit         |
//! | `weighting_function`           | `Power(2)`         | reconstruction kernel                     |
//! | `curvature_weighting_function` | `Power(2)`         | tangent and curvature kernel              |
//! | `solver`                       | QR                 | dense factorization (QR or SVD)           |
//! | `svd_fallback`                 | false              | retry rank-deficient QR fits with SVD     |
//! | `svd_relative_tolerance`       | max(1e-12, 100 ε)  | relative rank cut-off                     |
//! | `eigen_tolerance`              | 1e-6               | power iteration tolerance                 |
//! | `eigen_max_iterations`         | 5000               | power iteration bound                     |
//! | `team_size`                    | 4                  | lanes of the moment-matrix reduction      |
//! | `max_neighbors`                | unbounded          | longest accepted neighbor list            |
//! | `verify_thread_safety`         | true               | run the dense-solver self-test once       |
//!
//! ## Failures
//!
//! Configuration and input errors are returned as [`GmlsError`](prelude::GmlsError).
//! Per-target numerical failures ([`TargetError`](prelude::TargetError)) are
//! recorded in the [`AlphaTable`](prelude::AlphaTable): their alphas read as
//! `None` and applied values as `None`/`NaN`.

#![deny(missing_docs)]

// ============================================================================
// Internal Modules
// ============================================================================

// Layer 1: Primitives - errors, point clouds, neighbor lists, scratch buffers.
mod primitives;

// Layer 2: Math - kernels, monomials, dense solves and small eigenproblems.
mod math;

// Layer 3: Algorithms - bases, operator functionals, moment matrices and
// manifold geometry.
mod algorithms;

// Layer 4: Engine - validation, phased execution, batched solves and the
// alpha table.
mod engine;

// Layer 5: High-level fluent API.
mod api;

// ============================================================================
// Prelude
// ============================================================================

/// Standard GMLS prelude.
///
/// ```
/// use gmls_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::api::{
        AlphaTable, DenseSolverType, EigenSettings, GmlsBuilder as Gmls, GmlsConfig, GmlsError,
        GmlsModel, NeighborLists, OperatorEstimate, PointCloud, ReconstructionSpace,
        SolverSettings, TangentFrame, TargetError, TargetOperation, WeightingFunction,
        unisolvency_size,
    };
}

// ============================================================================
// Testing re-exports
// ============================================================================

/// Internal modules for development and testing.
///
/// Only available with the `dev` feature enabled.
///
/// **Warning**: These are internal implementation details and may change without notice.
#[cfg(feature = "dev")]
pub mod internals {
    /// Internal primitive types and utilities.
    pub mod primitives {
        pub use crate::primitives::*;
    }
    /// Internal math functions.
    pub mod math {
        pub use crate::math::*;
    }
    /// Internal core algorithms.
    pub mod algorithms {
        pub use crate::algorithms::*;
    }
    /// Internal execution engine.
    pub mod engine {
        pub use crate::engine::*;
    }
    /// High-level API.
    pub mod api {
        pub use crate::api::*;
    }
}
