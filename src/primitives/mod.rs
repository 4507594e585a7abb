//! Layer 1: Primitives
//!
//! # Purpose
//!
//! This layer provides the data containers shared by every other layer:
//! - Error types (batch-level and per-target)
//! - Point clouds and neighbor lists
//! - Reusable per-worker scratch buffers
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
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives ← You are here
//! ```

/// Error types.
pub mod errors;

/// Point clouds and neighbor lists.
pub mod neighbors;

/// Scratch buffers.
pub mod buffer;
