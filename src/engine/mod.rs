//! Layer 4: Engine
//!
//! # Purpose
//!
//! This layer drives a generation pass:
//! - Validation of configuration and inputs
//! - Phased, data-parallel assembly of local systems
//! - Batched dense solves and the solver self-test
//! - The alpha table and applied operator values
//!
//! # Architecture
//!
//! ```text
//! Layer 5: API
//!   ↓
//! Layer 4: Engine ← You are here
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Input validation.
pub mod validator;

/// Phased generation pass.
pub mod executor;

/// Batched least-squares solves.
pub mod solver;

/// Generated stencils and their application.
pub mod alphas;

/// Applied operator values.
pub mod output;

/// Per-thread scratch buffers.
pub mod workspace;
