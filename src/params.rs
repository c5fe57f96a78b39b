//! Sizes and tuning knobs for a dictionary-learning problem.
//!
//! [`Dimensions`] fixes the shapes of the three matrices for the lifetime of a
//! [`State`](crate::state::State). [`SolverOptions`] controls the numerical
//! tolerance and what happens to atoms that no sample uses.

use nalgebra::RealField;
use serde::{Deserialize, Serialize};

use crate::error::{KsvdError, Result};

/// The four sizes that define a problem.
///
/// - `target_sparsity`: maximum nonzeros per code column
/// - `dictionary_size`: number of atoms (K)
/// - `dimensionality`: length of each sample and atom (d)
/// - `sample_count`: number of samples (N)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub target_sparsity: usize,
    pub dictionary_size: usize,
    pub dimensionality: usize,
    pub sample_count: usize,
}

impl Dimensions {
    pub fn new(
        target_sparsity: usize,
        dictionary_size: usize,
        dimensionality: usize,
        sample_count: usize,
    ) -> Self {
        Self {
            target_sparsity,
            dictionary_size,
            dimensionality,
            sample_count,
        }
    }

    /// Reject any zero size.
    pub fn validate(&self) -> Result<()> {
        if self.target_sparsity == 0
            || self.dictionary_size == 0
            || self.dimensionality == 0
            || self.sample_count == 0
        {
            return Err(KsvdError::InvalidDimensions {
                target_sparsity: self.target_sparsity,
                dictionary_size: self.dictionary_size,
                dimensionality: self.dimensionality,
                sample_count: self.sample_count,
            });
        }
        Ok(())
    }

    /// Largest number of atoms a single code can actually select.
    pub fn max_selected(&self) -> usize {
        self.target_sparsity.min(self.dictionary_size)
    }
}

/// What an atom update does when no sample currently uses the atom.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyAtomPolicy {
    /// Leave the atom and its code row untouched and report
    /// [`KsvdError::DegenerateResidual`].
    #[default]
    Keep,
    /// Re-point the atom at the sample with the largest reconstruction error.
    /// Codes are left untouched; the next sparse-coding pass can pick it up.
    ReplaceWithWorstSample,
}

/// Solver tuning.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    pub empty_atom: EmptyAtomPolicy,
    /// Relative tolerance used for "numerically zero" decisions: residual
    /// correlation cut-off, Cholesky radicand floor and exact-fit detection.
    /// `None` selects `sqrt(epsilon)` of the scalar type.
    pub tolerance: Option<f64>,
}

impl SolverOptions {
    pub fn with_empty_atom(mut self, policy: EmptyAtomPolicy) -> Self {
        self.empty_atom = policy;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Resolve the tolerance for scalar type `T`.
    pub fn tolerance_for<T: RealField + Copy>(&self) -> T {
        match self.tolerance {
            Some(tol) => nalgebra::convert(tol),
            None => T::default_epsilon().sqrt(),
        }
    }
}
