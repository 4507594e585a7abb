//! Output types for applied stencils.
//!
//! ## Purpose
//!
//! This module defines [`OperatorEstimate`], the per-target values produced
//! by applying one operator's stencils to sampled data.
//!
//! ## Design notes
//!
//! * **Flat storage**: Values are stored target-major,
//!   `values[t * components + c]`.
//! * **Failed targets**: Targets without stencils hold `NaN` and report
//!   `None` through the accessors.
//! * **Ergonomics**: Implements `Display` for a readable summary.
//!
//! ## Non-goals
//!
//! * This module does not compute anything; it only stores results.

use core::fmt::{Debug, Display, Formatter, Result};
use num_traits::Float;

use crate::algorithms::operators::TargetOperation;

/// Values of one operator at every target.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorEstimate<T> {
    operation: TargetOperation,
    components: usize,
    values: Vec<T>,
    failed: Vec<bool>,
}

impl<T: Float> OperatorEstimate<T> {
    pub(crate) fn new(
        operation: TargetOperation,
        components: usize,
        values: Vec<T>,
        failed: Vec<bool>,
    ) -> Self {
        Self {
            operation,
            components,
            values,
            failed,
        }
    }

    /// The operator that produced these values.
    #[inline]
    pub fn operation(&self) -> TargetOperation {
        self.operation
    }

    /// Values per target.
    #[inline]
    pub fn components(&self) -> usize {
        self.components
    }

    /// Number of targets.
    #[inline]
    pub fn n_targets(&self) -> usize {
        self.failed.len()
    }

    /// All values, target-major (`NaN` at failed targets).
    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Value of component `c` at target `t`, or `None` if the target failed.
    #[inline]
    pub fn get(&self, t: usize, c: usize) -> Option<T> {
        if c >= self.components {
            return None;
        }
        self.target(t).map(|v| v[c])
    }

    /// All components at target `t`, or `None` if the target failed.
    #[inline]
    pub fn target(&self, t: usize) -> Option<&[T]> {
        match self.failed.get(t) {
            Some(false) => Some(&self.values[t * self.components..(t + 1) * self.components]),
            _ => None,
        }
    }

    /// Number of targets without a value.
    pub fn failed_count(&self) -> usize {
        self.failed.iter().filter(|&&f| f).count()
    }
}

impl<T: Float + Display + Debug> Display for OperatorEstimate<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  Operator:    {}", self.operation.name())?;
        writeln!(f, "  Targets:     {}", self.n_targets())?;
        writeln!(f, "  Components:  {}", self.components)?;
        writeln!(f, "  Failed:      {}", self.failed_count())?;
        writeln!(f)?;

        writeln!(f, "Estimates:")?;
        write!(f, "{:>8}", "Target")?;
        for c in 0..self.components {
            write!(f, " {:>12}", format!("C{c}"))?;
        }
        writeln!(f)?;
        writeln!(f, "  {}", "-".repeat(6 + 13 * self.components))?;

        for t in 0..self.n_targets() {
            write!(f, "{t:>8}")?;
            match self.target(t) {
                Some(values) => {
                    for v in values {
                        write!(f, " {:>12.6}", v)?;
                    }
                }
                None => {
                    for _ in 0..self.components {
                        write!(f, " {:>12}", "-")?;
                    }
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
