//! Numerical state shared by the atom update and sparse coding steps.
//!
//! Three column-major matrices:
//!
//! - `Y` (samples): `dimensionality × sample_count`, column i is sample i
//! - `Dict` (dictionary): `dimensionality × dictionary_size`, column k is atom k
//! - `X` (codes): `dictionary_size × sample_count`, column i is the code of sample i
//!
//! Sample i is approximated by `Dict · X[:, i]`.
//!
//! Mutable access is only handed out as fixed-shape views, so the shapes
//! always agree with [`Dimensions`].

use nalgebra::{DMatrix, DMatrixViewMut};

use crate::error::{KsvdError, Result};
use crate::params::Dimensions;
use crate::Real;

/// Owned Y / Dict / X matrices plus the sizes they were allocated with.
#[derive(Clone, Debug, PartialEq)]
pub struct State<T: Real> {
    dims: Dimensions,
    pub(crate) samples: DMatrix<T>,
    pub(crate) dictionary: DMatrix<T>,
    pub(crate) codes: DMatrix<T>,
}

impl<T: Real> State<T> {
    /// Allocate all three matrices for `dims`.
    ///
    /// The matrices start zero-filled; callers still have to populate the
    /// samples and an initial dictionary and code guess before running either
    /// step.
    pub fn new(dims: Dimensions) -> Result<Self> {
        dims.validate()?;
        Ok(Self {
            dims,
            samples: DMatrix::zeros(dims.dimensionality, dims.sample_count),
            dictionary: DMatrix::zeros(dims.dimensionality, dims.dictionary_size),
            codes: DMatrix::zeros(dims.dictionary_size, dims.sample_count),
        })
    }

    /// Reallocate for new sizes, discarding every previous entry.
    ///
    /// On error the state is left as it was.
    pub fn init(&mut self, dims: Dimensions) -> Result<()> {
        *self = Self::new(dims)?;
        Ok(())
    }

    // --- Sizes ---

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn target_sparsity(&self) -> usize {
        self.dims.target_sparsity
    }

    pub fn dictionary_size(&self) -> usize {
        self.dims.dictionary_size
    }

    pub fn dimensionality(&self) -> usize {
        self.dims.dimensionality
    }

    pub fn sample_count(&self) -> usize {
        self.dims.sample_count
    }

    // --- Matrix access ---

    pub fn samples(&self) -> &DMatrix<T> {
        &self.samples
    }

    pub fn dictionary(&self) -> &DMatrix<T> {
        &self.dictionary
    }

    pub fn codes(&self) -> &DMatrix<T> {
        &self.codes
    }

    pub fn samples_mut(&mut self) -> DMatrixViewMut<'_, T> {
        let shape = self.samples.shape();
        self.samples.view_mut((0, 0), shape)
    }

    pub fn dictionary_mut(&mut self) -> DMatrixViewMut<'_, T> {
        let shape = self.dictionary.shape();
        self.dictionary.view_mut((0, 0), shape)
    }

    pub fn codes_mut(&mut self) -> DMatrixViewMut<'_, T> {
        let shape = self.codes.shape();
        self.codes.view_mut((0, 0), shape)
    }

    /// Overwrite sample `index` (a column of Y).
    pub fn set_sample(&mut self, index: usize, values: &[T]) -> Result<()> {
        self.check_sample(index)?;
        check_len(self.dims.dimensionality, values.len())?;
        self.samples.column_mut(index).copy_from_slice(values);
        Ok(())
    }

    /// Overwrite atom `index` (a column of Dict).
    pub fn set_atom(&mut self, index: usize, values: &[T]) -> Result<()> {
        self.check_atom(index)?;
        check_len(self.dims.dimensionality, values.len())?;
        self.dictionary.column_mut(index).copy_from_slice(values);
        Ok(())
    }

    /// Overwrite the code of sample `index` (a column of X).
    pub fn set_code(&mut self, index: usize, values: &[T]) -> Result<()> {
        self.check_sample(index)?;
        check_len(self.dims.dictionary_size, values.len())?;
        self.codes.column_mut(index).copy_from_slice(values);
        Ok(())
    }

    // --- Diagnostics ---

    /// `Dict · X`.
    pub fn reconstruction(&self) -> DMatrix<T> {
        &self.dictionary * &self.codes
    }

    /// Frobenius norm of `Y - Dict · X`.
    pub fn reconstruction_error(&self) -> T {
        (&self.samples - self.reconstruction()).norm()
    }

    /// Euclidean norm of `Y[:, index] - Dict · X[:, index]`.
    pub fn sample_error(&self, index: usize) -> Result<T> {
        self.check_sample(index)?;
        Ok(self.sample_error_unchecked(index))
    }

    /// Number of nonzero entries in the code of sample `index`.
    pub fn code_nonzeros(&self, index: usize) -> Result<usize> {
        self.check_sample(index)?;
        Ok(self
            .codes
            .column(index)
            .iter()
            .filter(|&&c| c != T::zero())
            .count())
    }

    // --- Crate helpers ---

    pub(crate) fn sample_error_unchecked(&self, index: usize) -> T {
        let approx = &self.dictionary * self.codes.column(index);
        (self.samples.column(index) - approx).norm()
    }

    pub(crate) fn check_atom(&self, index: usize) -> Result<()> {
        if index >= self.dims.dictionary_size {
            return Err(KsvdError::InvalidAtomIndex {
                index,
                dictionary_size: self.dims.dictionary_size,
            });
        }
        Ok(())
    }

    pub(crate) fn check_sample(&self, index: usize) -> Result<()> {
        if index >= self.dims.sample_count {
            return Err(KsvdError::InvalidSampleIndex {
                index,
                sample_count: self.dims.sample_count,
            });
        }
        Ok(())
    }
}

#[inline]
fn check_len(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(KsvdError::DimensionMismatch { expected, got });
    }
    Ok(())
}
