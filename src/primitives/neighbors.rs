//! Point clouds and neighbor lists consumed by the GMLS engine.
//!
//! ## Purpose
//!
//! This module defines the two read-only input containers of a GMLS pass:
//! [`PointCloud`] (source or target sites) and [`NeighborLists`] (the
//! externally computed neighbor search result).
//!
//! ## Design notes
//!
//! * **Flattened storage**: Coordinates are row-major, one row per point,
//!   matching the layout most spatial search crates produce.
//! * **CSR lists**: Neighbor lists are stored as offsets + indices so each
//!   target's neighbors are one contiguous slice.
//! * **Several layouts**: Lists can be built from nested vectors, CSR arrays,
//!   or the compressed-row table where column 0 holds the count.
//!
//! ## Invariants
//!
//! * `coords.len() == n_points * dimensions`.
//! * `offsets` is non-decreasing and starts at 0.
//!
//! ## Non-goals
//!
//! * This module does not perform neighbor search.
//! * This module does not check that neighbors lie inside the window
//!   (neighbors outside receive zero weight).

use num_traits::Float;

use crate::primitives::errors::GmlsError;

// ============================================================================
// Point Cloud
// ============================================================================

/// Ordered set of d-dimensional points.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud<T> {
    coords: Vec<T>,
    dimensions: usize,
}

impl<T: Float> PointCloud<T> {
    /// Build a point cloud from a row-major flattened coordinate array.
    pub fn new(coords: Vec<T>, dimensions: usize) -> Result<Self, GmlsError> {
        if dimensions == 0 {
            return Err(GmlsError::InvalidDimensions(0));
        }
        if coords.len() % dimensions != 0 {
            return Err(GmlsError::MismatchedDimensions {
                what: "coordinates",
                len: coords.len(),
                dimensions,
            });
        }
        Ok(Self { coords, dimensions })
    }

    /// Build a point cloud from one fixed-size array per point.
    pub fn from_rows<const D: usize>(rows: &[[T; D]]) -> Result<Self, GmlsError> {
        let coords = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::new(coords, D)
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len() / self.dimensions
    }

    /// Returns true if the cloud has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Number of coordinates per point.
    #[inline]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Coordinates of point `i`.
    #[inline]
    pub fn point(&self, i: usize) -> &[T] {
        &self.coords[i * self.dimensions..(i + 1) * self.dimensions]
    }

    /// The flattened coordinate array.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.coords
    }
}

// ============================================================================
// Neighbor Lists
// ============================================================================

/// Per-target ordered lists of source indices in CSR layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborLists {
    offsets: Vec<usize>,
    indices: Vec<usize>,
    max_neighbors: usize,
}

impl NeighborLists {
    /// Build from one vector of source indices per target.
    pub fn from_lists(lists: &[Vec<usize>]) -> Self {
        let mut offsets = Vec::with_capacity(lists.len() + 1);
        let mut indices = Vec::with_capacity(lists.iter().map(Vec::len).sum());
        offsets.push(0);
        for list in lists {
            indices.extend_from_slice(list);
            offsets.push(indices.len());
        }
        let max_neighbors = lists.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            offsets,
            indices,
            max_neighbors,
        }
    }

    /// Build from CSR arrays (`offsets.len() == n_targets + 1`).
    pub fn from_csr(offsets: Vec<usize>, indices: Vec<usize>) -> Result<Self, GmlsError> {
        if offsets.first() != Some(&0) {
            return Err(GmlsError::InvalidInput(
                "neighbor offsets must start at 0".into(),
            ));
        }
        if offsets.windows(2).any(|w| w[1] < w[0]) {
            return Err(GmlsError::InvalidInput(
                "neighbor offsets must be non-decreasing".into(),
            ));
        }
        let last = offsets.last().copied().unwrap_or(0);
        if last != indices.len() {
            return Err(GmlsError::MismatchedLengths {
                what: "neighbor indices",
                expected: last,
                got: indices.len(),
            });
        }
        let max_neighbors = offsets.windows(2).map(|w| w[1] - w[0]).max().unwrap_or(0);
        Ok(Self {
            offsets,
            indices,
            max_neighbors,
        })
    }

    /// Build from a compressed-row table: `row[0]` is the neighbor count,
    /// `row[1..=count]` are the source indices. Every row has `width` columns.
    pub fn from_compressed_rows(table: &[usize], width: usize) -> Result<Self, GmlsError> {
        if width == 0 || table.len() % width != 0 {
            return Err(GmlsError::MismatchedDimensions {
                what: "neighbor table",
                len: table.len(),
                dimensions: width,
            });
        }
        let lists = table
            .chunks_exact(width)
            .enumerate()
            .map(|(target, row)| {
                let count = row[0];
                if count >= width {
                    return Err(GmlsError::TooManyNeighbors {
                        target,
                        got: count,
                        max: width - 1,
                    });
                }
                Ok(row[1..=count].to_vec())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_lists(&lists))
    }

    /// Number of targets.
    #[inline]
    pub fn n_targets(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Neighbors of target `t`.
    #[inline]
    pub fn neighbors(&self, t: usize) -> &[usize] {
        &self.indices[self.offsets[t]..self.offsets[t + 1]]
    }

    /// Number of neighbors of target `t`.
    #[inline]
    pub fn count(&self, t: usize) -> usize {
        self.offsets[t + 1] - self.offsets[t]
    }

    /// Length of the longest list.
    #[inline]
    pub fn max_neighbors(&self) -> usize {
        self.max_neighbors
    }

    /// Start of target `t`'s list in the flattened index array.
    #[inline]
    pub fn offset(&self, t: usize) -> usize {
        self.offsets[t]
    }

    /// Total number of (target, neighbor) pairs.
    #[inline]
    pub fn total(&self) -> usize {
        self.indices.len()
    }
}
