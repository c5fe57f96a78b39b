//! Error types for ksvd.

use thiserror::Error;

/// ksvd error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KsvdError {
    /// One of the four defining sizes was zero
    #[error(
        "Invalid dimensions: target_sparsity={target_sparsity}, dictionary_size={dictionary_size}, \
         dimensionality={dimensionality}, sample_count={sample_count} (all must be positive)"
    )]
    InvalidDimensions {
        target_sparsity: usize,
        dictionary_size: usize,
        dimensionality: usize,
        sample_count: usize,
    },

    /// Atom index outside the dictionary
    #[error("Atom index {index} out of range for dictionary of {dictionary_size} atoms")]
    InvalidAtomIndex { index: usize, dictionary_size: usize },

    /// Sample index outside the sample matrix
    #[error("Sample index {index} out of range for {sample_count} samples")]
    InvalidSampleIndex { index: usize, sample_count: usize },

    /// Vector length does not match the matrix it is written into
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// No sample currently uses the atom, so there is no residual to decompose
    #[error("Atom {atom} has no active samples")]
    DegenerateResidual { atom: usize },

    /// The singular value decomposition did not converge
    #[error("SVD of the restricted residual for atom {atom} did not converge")]
    DecompositionFailed { atom: usize },

    /// Candidate atom is (numerically) in the span of the atoms already selected
    #[error("Atom {atom} is linearly dependent on the {selected} atoms already selected")]
    RankDeficientUpdate { atom: usize, selected: usize },
}

/// Result type alias for ksvd operations.
pub type Result<T> = std::result::Result<T, KsvdError>;
