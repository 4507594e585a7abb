//! Error types for GMLS operations.
//!
//! ## Purpose
//!
//! This module defines the two error families of the crate:
//!
//! * [`GmlsError`]: batch-level failures (invalid configuration, malformed
//!   inputs, unsupported operators, a non-thread-safe solve backend). These
//!   are returned as `Err` and abort the call.
//! * [`TargetError`]: per-target numerical failures (insufficient support,
//!   singular systems, non-convergent tangent estimation). These never abort
//!   a batch; they are recorded next to the partial results.
//!
//! ## Design notes
//!
//! * **Contextual**: Errors include the offending values (target index,
//!   counts, ranks) so failures can be traced without re-running.
//! * **Deferred**: Builder misuse (duplicate parameters) is recorded during
//!   configuration and surfaced when `build()` is called.
//! * **Trait Implementation**: Implements `Display` and `std::error::Error`.
//!
//! ## Invariants
//!
//! * All variants provide sufficient context for diagnosis.
//! * Only [`GmlsError::ThreadSafetyViolation`] is fatal at process level.
//!
//! ## Non-goals
//!
//! * This module does not perform the validation logic itself.
//! * This module does not provide error recovery (see `svd_fallback`).

use std::error::Error;
use std::fmt::{Display, Formatter, Result};

// ============================================================================
// Batch-level Error Type
// ============================================================================

/// Error type for GMLS setup, generation and application.
#[derive(Debug, Clone, PartialEq)]
pub enum GmlsError {
    /// No source or target sites were provided.
    EmptyInput,

    /// Generic invalid input error with a descriptive message.
    InvalidInput(String),

    /// A flattened coordinate array does not divide into rows of `dimensions`.
    MismatchedDimensions {
        /// Name of the offending array.
        what: &'static str,
        /// Length of the flattened array.
        len: usize,
        /// Expected number of columns per row.
        dimensions: usize,
    },

    /// Two related inputs disagree on their length.
    MismatchedLengths {
        /// Name of the offending input.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// Input data contains NaN or infinite values.
    InvalidNumericValue(String),

    /// Ambient dimension must be 1, 2 or 3 (2 or 3 on a manifold).
    InvalidDimensions(usize),

    /// Polynomial degree is above the supported maximum.
    InvalidDegree {
        /// Requested degree.
        degree: usize,
        /// Maximum supported degree.
        max: usize,
    },

    /// A window size is not positive and finite.
    InvalidWindowSize {
        /// Target owning the window.
        target: usize,
        /// The offending value.
        value: f64,
    },

    /// A neighbor list references a source site that does not exist.
    NeighborIndexOutOfRange {
        /// Target owning the list.
        target: usize,
        /// The offending source index.
        index: usize,
        /// Number of source sites.
        n_sources: usize,
    },

    /// A neighbor list exceeds the configured maximum length.
    TooManyNeighbors {
        /// Target owning the list.
        target: usize,
        /// Number of neighbors listed.
        got: usize,
        /// Configured maximum.
        max: usize,
    },

    /// A tolerance must be positive and finite.
    InvalidTolerance(f64),

    /// Iteration bound must be at least 1.
    InvalidIterations(usize),

    /// Team size must be at least 1.
    InvalidTeamSize(usize),

    /// The operator cannot be evaluated for the current configuration.
    UnsupportedOperator {
        /// Name of the operator.
        operator: &'static str,
        /// Why it is unsupported.
        reason: &'static str,
    },

    /// No operator was requested.
    NoOperators,

    /// The operator was not part of the generated alpha table.
    OperatorNotGenerated(&'static str),

    /// A component index is out of range for the operator.
    InvalidComponent {
        /// Requested component.
        component: usize,
        /// Number of components available.
        components: usize,
    },

    /// A target index is out of range.
    InvalidTarget {
        /// Requested target.
        target: usize,
        /// Number of targets.
        n_targets: usize,
    },

    /// A required input was never supplied to the builder.
    MissingInput(&'static str),

    /// The dense solve backend returned wrong results under concurrent use.
    ThreadSafetyViolation {
        /// Number of solution entries that deviated from the known answer.
        wrong_entries: usize,
    },

    /// A single-target query hit a per-target numerical failure.
    TargetFailed {
        /// The failing target.
        target: usize,
        /// What went wrong.
        error: TargetError,
    },

    /// Parameter was set multiple times in the builder.
    DuplicateParameter {
        /// Name of the parameter that was set multiple times.
        parameter: &'static str,
    },
}

impl Display for GmlsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::EmptyInput => write!(f, "Input point sets are empty"),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::MismatchedDimensions {
                what,
                len,
                dimensions,
            } => write!(
                f,
                "Dimension mismatch: {what} has {len} values, not a multiple of {dimensions}"
            ),
            Self::MismatchedLengths {
                what,
                expected,
                got,
            } => write!(
                f,
                "Length mismatch: {what} has {got} entries, expected {expected}"
            ),
            Self::InvalidNumericValue(s) => write!(f, "Invalid numeric value: {s}"),
            Self::InvalidDimensions(d) => {
                write!(f, "Invalid dimensions: {d} (must be 1, 2 or 3)")
            }
            Self::InvalidDegree { degree, max } => {
                write!(f, "Invalid degree: {degree} (must be at most {max})")
            }
            Self::InvalidWindowSize { target, value } => write!(
                f,
                "Invalid window size for target {target}: {value} (must be > 0 and finite)"
            ),
            Self::NeighborIndexOutOfRange {
                target,
                index,
                n_sources,
            } => write!(
                f,
                "Neighbor index {index} of target {target} is out of range ({n_sources} sources)"
            ),
            Self::TooManyNeighbors { target, got, max } => write!(
                f,
                "Target {target} lists {got} neighbors (maximum is {max})"
            ),
            Self::InvalidTolerance(tol) => {
                write!(f, "Invalid tolerance: {tol} (must be > 0 and finite)")
            }
            Self::InvalidIterations(iter) => {
                write!(f, "Invalid iterations: {iter} (must be at least 1)")
            }
            Self::InvalidTeamSize(size) => {
                write!(f, "Invalid team size: {size} (must be at least 1)")
            }
            Self::UnsupportedOperator { operator, reason } => {
                write!(f, "Operator '{operator}' is not supported: {reason}")
            }
            Self::NoOperators => write!(f, "No target operations were requested"),
            Self::OperatorNotGenerated(op) => {
                write!(f, "Operator '{op}' has no generated alphas")
            }
            Self::InvalidComponent {
                component,
                components,
            } => write!(
                f,
                "Invalid component: {component} (operator has {components})"
            ),
            Self::InvalidTarget { target, n_targets } => {
                write!(f, "Invalid target: {target} (there are {n_targets})")
            }
            Self::MissingInput(what) => write!(f, "Missing input: {what}"),
            Self::ThreadSafetyViolation { wrong_entries } => write!(
                f,
                "Dense solver is not thread safe: {wrong_entries} entries were wrong under concurrent solves"
            ),
            Self::TargetFailed { target, error } => write!(f, "Target {target} failed: {error}"),
            Self::DuplicateParameter { parameter } => write!(
                f,
                "Parameter '{parameter}' was set multiple times. Each parameter can only be configured once."
            ),
        }
    }
}

impl Error for GmlsError {}

// ============================================================================
// Per-target Error Type
// ============================================================================

/// Numerical failure of a single target.
///
/// A target carrying one of these has no alphas; applying a stencil to it
/// yields `None` rather than a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetError {
    /// Fewer neighbors than the unisolvency count of the basis.
    InsufficientSupport {
        /// Neighbors available.
        neighbors: usize,
        /// Neighbors required.
        required: usize,
    },

    /// The weighted design matrix is rank deficient beyond what the solver accepts.
    SingularSystem {
        /// Numerical rank found.
        rank: usize,
        /// Number of basis columns.
        columns: usize,
    },

    /// Tangent-plane power iteration did not converge.
    NonConvergentEigenEstimate {
        /// Iterations performed before giving up.
        iterations: usize,
    },
}

impl Display for TargetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::InsufficientSupport {
                neighbors,
                required,
            } => write!(
                f,
                "Insufficient support: {neighbors} neighbors, need at least {required}"
            ),
            Self::SingularSystem { rank, columns } => {
                write!(f, "Singular system: rank {rank} of {columns} columns")
            }
            Self::NonConvergentEigenEstimate { iterations } => write!(
                f,
                "Tangent estimate did not converge after {iterations} iterations"
            ),
        }
    }
}

impl Error for TargetError {}
