//! Generated stencils and their application.
//!
//! ## Purpose
//!
//! This module stores the alpha vectors produced for every
//! (operator, target, output component, input component) and applies them
//! to sampled data.
//!
//! ## Design notes
//!
//! * **Flat storage**: For each operator the alphas of all targets are
//!   stored contiguously, following the CSR layout of the neighbor lists:
//!   target `t` owns `out · in · K_t` entries starting at
//!   `offset(t) · out · in`, ordered by output component, input component,
//!   then neighbor.
//! * **No plausible garbage**: Failed targets hold `NaN` alphas and are
//!   reported as `None` by every accessor.
//! * **Pure application**: `apply` reads only the table and the data and is
//!   data-parallel over targets; repeated calls are bit-identical.
//!
//! ## Invariants
//!
//! * The table is immutable once built.
//! * `failures.len() == ranks.len() == n_targets`.

use rayon::prelude::*;

use crate::algorithms::operators::TargetOperation;
use crate::engine::output::OperatorEstimate;
use crate::math::linalg::FloatLinalg;
use crate::primitives::errors::{GmlsError, TargetError};
use crate::primitives::neighbors::NeighborLists;

/// Alphas of one target for every requested operator.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetAlphas<T> {
    /// One block per operator, `out · in · K` entries each.
    pub blocks: Vec<Vec<T>>,
    /// Numerical rank of the reconstruction fit.
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct OperatorAlphas<T> {
    operation: TargetOperation,
    output_components: usize,
    input_components: usize,
    values: Vec<T>,
}

/// Immutable table of generated stencils.
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaTable<T> {
    dimensions: usize,
    n_sources: usize,
    basis_size: usize,
    parallel: bool,
    neighbors: NeighborLists,
    operators: Vec<OperatorAlphas<T>>,
    failures: Vec<Option<TargetError>>,
    ranks: Vec<usize>,
}

impl<T: FloatLinalg> AlphaTable<T> {
    /// Assemble the table from per-target results.
    pub fn from_targets(
        dimensions: usize,
        n_sources: usize,
        basis_size: usize,
        parallel: bool,
        neighbors: &NeighborLists,
        operations: &[TargetOperation],
        targets: Vec<Result<TargetAlphas<T>, TargetError>>,
    ) -> Self {
        let mut operators: Vec<OperatorAlphas<T>> = operations
            .iter()
            .map(|&operation| {
                let output_components = operation.output_components(dimensions);
                let input_components = operation.input_components(dimensions);
                OperatorAlphas {
                    operation,
                    output_components,
                    input_components,
                    values: Vec::with_capacity(
                        neighbors.total() * output_components * input_components,
                    ),
                }
            })
            .collect();

        let mut failures = Vec::with_capacity(targets.len());
        let mut ranks = Vec::with_capacity(targets.len());
        for (t, result) in targets.into_iter().enumerate() {
            match result {
                Ok(alphas) => {
                    for (op, block) in operators.iter_mut().zip(alphas.blocks) {
                        op.values.extend(block);
                    }
                    failures.push(None);
                    ranks.push(alphas.rank);
                }
                Err(e) => {
                    for op in operators.iter_mut() {
                        let len = op.output_components * op.input_components * neighbors.count(t);
                        op.values.extend(std::iter::repeat_n(T::nan(), len));
                    }
                    failures.push(Some(e));
                    ranks.push(0);
                }
            }
        }

        Self {
            dimensions,
            n_sources,
            basis_size,
            parallel,
            neighbors: neighbors.clone(),
            operators,
            failures,
            ranks,
        }
    }

    /// Number of targets.
    #[inline]
    pub fn n_targets(&self) -> usize {
        self.failures.len()
    }

    /// Ambient dimension.
    #[inline]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of basis functions of the reconstruction.
    #[inline]
    pub fn basis_size(&self) -> usize {
        self.basis_size
    }

    /// Neighbor lists the alphas refer to.
    #[inline]
    pub fn neighbors(&self) -> &NeighborLists {
        &self.neighbors
    }

    /// Operators present in the table.
    pub fn operations(&self) -> Vec<TargetOperation> {
        self.operators.iter().map(|o| o.operation).collect()
    }

    /// Failure of target `t`, if any.
    #[inline]
    pub fn failure(&self, t: usize) -> Option<TargetError> {
        self.failures.get(t).copied().flatten()
    }

    /// All failed targets with their errors.
    pub fn failures(&self) -> Vec<(usize, TargetError)> {
        self.failures
            .iter()
            .enumerate()
            .filter_map(|(t, f)| f.map(|e| (t, e)))
            .collect()
    }

    /// Numerical rank of target `t`'s reconstruction fit (`None` if failed).
    #[inline]
    pub fn rank(&self, t: usize) -> Option<usize> {
        match self.failures.get(t) {
            Some(None) => Some(self.ranks[t]),
            _ => None,
        }
    }

    /// Targets whose fit succeeded with less than full column rank.
    pub fn rank_deficient_targets(&self) -> Vec<usize> {
        (0..self.n_targets())
            .filter(|&t| self.rank(t).is_some_and(|r| r < self.basis_size))
            .collect()
    }

    fn operator(&self, op: TargetOperation) -> Result<&OperatorAlphas<T>, GmlsError> {
        self.operators
            .iter()
            .find(|o| o.operation == op)
            .ok_or(GmlsError::OperatorNotGenerated(op.name()))
    }

    /// Alphas of `(op, t, out_component, in_component)`, one per neighbor.
    /// Returns `Ok(None)` if the target failed.
    pub fn alphas(
        &self,
        op: TargetOperation,
        t: usize,
        out_component: usize,
        in_component: usize,
    ) -> Result<Option<&[T]>, GmlsError> {
        let block = self.operator(op)?;
        if t >= self.n_targets() {
            return Err(GmlsError::InvalidTarget {
                target: t,
                n_targets: self.n_targets(),
            });
        }
        if out_component >= block.output_components {
            return Err(GmlsError::InvalidComponent {
                component: out_component,
                components: block.output_components,
            });
        }
        if in_component >= block.input_components {
            return Err(GmlsError::InvalidComponent {
                component: in_component,
                components: block.input_components,
            });
        }
        if self.failures[t].is_some() {
            return Ok(None);
        }
        let k = self.neighbors.count(t);
        let base = self.neighbors.offset(t) * block.output_components * block.input_components
            + (out_component * block.input_components + in_component) * k;
        Ok(Some(&block.values[base..base + k]))
    }

    /// Single alpha for neighbor position `neighbor` of target `t`.
    pub fn alpha(
        &self,
        op: TargetOperation,
        t: usize,
        out_component: usize,
        in_component: usize,
        neighbor: usize,
    ) -> Result<Option<T>, GmlsError> {
        let Some(alphas) = self.alphas(op, t, out_component, in_component)? else {
            return Ok(None);
        };
        alphas
            .get(neighbor)
            .copied()
            .map(Some)
            .ok_or_else(|| {
                GmlsError::InvalidInput(format!(
                    "neighbor position {neighbor} out of range for target {t} ({} neighbors)",
                    alphas.len()
                ))
            })
    }

    /// Apply `op`'s stencils to `data` (row-major, one row of input
    /// components per source site).
    pub fn apply(&self, op: TargetOperation, data: &[T]) -> Result<OperatorEstimate<T>, GmlsError> {
        let block = self.operator(op)?;
        let (out, inp) = (block.output_components, block.input_components);
        if data.len() != self.n_sources * inp {
            return Err(GmlsError::MismatchedLengths {
                what: "sampled data",
                expected: self.n_sources * inp,
                got: data.len(),
            });
        }

        let mut values = vec![T::nan(); self.n_targets() * out];
        let fill = |t: usize, row: &mut [T]| {
            if self.failures[t].is_some() {
                return;
            }
            let nbrs = self.neighbors.neighbors(t);
            let k = nbrs.len();
            let base = self.neighbors.offset(t) * out * inp;
            for (c, v) in row.iter_mut().enumerate() {
                let mut acc = T::zero();
                for j in 0..inp {
                    let alphas = &block.values[base + (c * inp + j) * k..][..k];
                    for (&a, &s) in alphas.iter().zip(nbrs.iter()) {
                        acc = acc + a * data[s * inp + j];
                    }
                }
                *v = acc;
            }
        };

        if self.parallel {
            values
                .par_chunks_mut(out)
                .enumerate()
                .for_each(|(t, row)| fill(t, row));
        } else {
            values
                .chunks_mut(out)
                .enumerate()
                .for_each(|(t, row)| fill(t, row));
        }

        let failed = self.failures.iter().map(Option::is_some).collect();
        Ok(OperatorEstimate::new(op, out, values, failed))
    }
}
