//! Layer 3: Algorithms
//!
//! # Purpose
//!
//! This layer holds the GMLS-specific building blocks:
//! - Reconstruction bases (scalar, vector, divergence-free)
//! - Target operators and their images on a basis
//! - Weighted moment-matrix assembly with lane-ordered reductions
//! - Local manifold geometry from a height fit
//!
//! # Architecture
//!
//! ```text
//! Layer 5: API
//!   ↓
//! Layer 4: Engine
//!   ↓
//! Layer 3: Algorithms ← You are here
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Polynomial reconstruction bases.
pub mod basis;

/// Target operators as linear functionals.
pub mod operators;

/// Weighted moment matrices.
pub mod moment;

/// Manifold metric and operators in tangent coordinates.
pub mod manifold;
