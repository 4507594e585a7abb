//! Input validation for GMLS configuration and data.
//!
//! ## Purpose
//!
//! This module checks builder parameters and the geometric inputs of a
//! generation pass before any local system is assembled.
//!
//! ## Design notes
//!
//! * **Fail-Fast**: Validation stops at the first error encountered.
//! * **Efficiency**: Checks are ordered from cheap to expensive.
//! * **Generics**: Validation is generic over `Float` types.
//!
//! ## Key concepts
//!
//! * **Configuration errors** reject the whole pass; they are never reported
//!   per target.
//! * **Per-target feasibility** (enough neighbors, solvable systems) is not
//!   checked here; it is reported per target by the executor.
//!
//! ## Non-goals
//!
//! * This module does not correct invalid inputs.
//! * This module does not search for neighbors.

use num_traits::Float;

use crate::algorithms::basis::ReconstructionSpace;
use crate::algorithms::operators::TargetOperation;
use crate::primitives::errors::GmlsError;
use crate::primitives::neighbors::{NeighborLists, PointCloud};

/// Highest supported polynomial degree.
pub const MAX_DEGREE: usize = 10;

// ============================================================================
// Validator
// ============================================================================

/// Validation utility for GMLS configuration and input data.
///
/// All methods return `Result<(), GmlsError>` and fail fast on the first
/// violation.
pub struct Validator;

impl Validator {
    // ========================================================================
    // Parameter Validation
    // ========================================================================

    /// Validate the ambient dimension.
    pub fn validate_dimensions(dimensions: usize, manifold: bool) -> Result<(), GmlsError> {
        let lowest = if manifold { 2 } else { 1 };
        if !(lowest..=3).contains(&dimensions) {
            return Err(GmlsError::InvalidDimensions(dimensions));
        }
        Ok(())
    }

    /// Validate a polynomial degree.
    pub fn validate_degree(degree: usize) -> Result<(), GmlsError> {
        if degree > MAX_DEGREE {
            return Err(GmlsError::InvalidDegree {
                degree,
                max: MAX_DEGREE,
            });
        }
        Ok(())
    }

    /// Validate the reconstruction space against the geometry.
    pub fn validate_space(
        space: ReconstructionSpace,
        dimensions: usize,
        manifold: bool,
    ) -> Result<(), GmlsError> {
        if space == ReconstructionSpace::DivergenceFreeVectorTaylorPolynomial && dimensions < 2 {
            return Err(GmlsError::InvalidInput(
                "divergence-free reconstruction requires at least 2 dimensions".into(),
            ));
        }
        if manifold && space.is_vector() {
            return Err(GmlsError::InvalidInput(format!(
                "{} reconstruction is not available on manifolds",
                space.name()
            )));
        }
        Ok(())
    }

    /// Validate a strictly positive, finite tolerance.
    pub fn validate_tolerance<T: Float>(tol: T) -> Result<(), GmlsError> {
        if !tol.is_finite() || tol <= T::zero() {
            return Err(GmlsError::InvalidTolerance(tol.to_f64().unwrap_or(f64::NAN)));
        }
        Ok(())
    }

    /// Validate an iteration bound.
    pub fn validate_iterations(iterations: usize) -> Result<(), GmlsError> {
        if iterations == 0 {
            return Err(GmlsError::InvalidIterations(iterations));
        }
        Ok(())
    }

    /// Validate the number of reduction lanes.
    pub fn validate_team_size(team_size: usize) -> Result<(), GmlsError> {
        if team_size == 0 {
            return Err(GmlsError::InvalidTeamSize(team_size));
        }
        Ok(())
    }

    /// Validate the operator list against the configuration.
    pub fn validate_operations(
        operations: &[TargetOperation],
        space: ReconstructionSpace,
        degree: usize,
        dimensions: usize,
        manifold: bool,
    ) -> Result<(), GmlsError> {
        if operations.is_empty() {
            return Err(GmlsError::NoOperators);
        }
        for op in operations {
            op.check_support(space, degree, dimensions, manifold)?;
        }
        Ok(())
    }

    /// Validate that no parameter was set multiple times.
    pub fn validate_no_duplicates(duplicate_param: Option<&'static str>) -> Result<(), GmlsError> {
        if let Some(parameter) = duplicate_param {
            return Err(GmlsError::DuplicateParameter { parameter });
        }
        Ok(())
    }

    // ========================================================================
    // Input Validation
    // ========================================================================

    /// Validate a point cloud: non-empty, expected dimension, finite.
    pub fn validate_points<T: Float>(
        points: &PointCloud<T>,
        dimensions: usize,
        what: &'static str,
    ) -> Result<(), GmlsError> {
        if points.is_empty() {
            return Err(GmlsError::EmptyInput);
        }
        if points.dimensions() != dimensions {
            return Err(GmlsError::InvalidInput(format!(
                "{what} have {} coordinates per point, expected {dimensions}",
                points.dimensions()
            )));
        }
        if let Some((i, v)) = points
            .as_slice()
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
        {
            return Err(GmlsError::InvalidNumericValue(format!(
                "{what}[{}][{}]={}",
                i / dimensions,
                i % dimensions,
                v.to_f64().unwrap_or(f64::NAN)
            )));
        }
        Ok(())
    }

    /// Validate neighbor lists against the source and target sets.
    pub fn validate_neighbors(
        neighbors: &NeighborLists,
        n_sources: usize,
        n_targets: usize,
        max_neighbors: Option<usize>,
    ) -> Result<(), GmlsError> {
        if neighbors.n_targets() != n_targets {
            return Err(GmlsError::MismatchedLengths {
                what: "neighbor lists",
                expected: n_targets,
                got: neighbors.n_targets(),
            });
        }
        for t in 0..n_targets {
            let list = neighbors.neighbors(t);
            if let Some(max) = max_neighbors.filter(|&max| list.len() > max) {
                return Err(GmlsError::TooManyNeighbors {
                    target: t,
                    got: list.len(),
                    max,
                });
            }
            if let Some(&index) = list.iter().find(|&&s| s >= n_sources) {
                return Err(GmlsError::NeighborIndexOutOfRange {
                    target: t,
                    index,
                    n_sources,
                });
            }
        }
        Ok(())
    }

    /// Validate per-target window sizes.
    pub fn validate_windows<T: Float>(windows: &[T], n_targets: usize) -> Result<(), GmlsError> {
        if windows.len() != n_targets {
            return Err(GmlsError::MismatchedLengths {
                what: "window sizes",
                expected: n_targets,
                got: windows.len(),
            });
        }
        if let Some((target, h)) = windows
            .iter()
            .enumerate()
            .find(|(_, h)| !h.is_finite() || **h <= T::zero())
        {
            return Err(GmlsError::InvalidWindowSize {
                target,
                value: h.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok(())
    }
}
