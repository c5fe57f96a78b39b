//! Solver facade over the numerical state and both learning steps.
//!
//! [`Solver`] owns a [`State`] and the [`SolverOptions`] and exposes the two
//! halves of K-SVD as methods. It does not run the alternation itself: the
//! caller decides how many sweeps to run and when to stop.

use tracing::{debug, warn};

use crate::atom_update::{self, AtomUpdate};
use crate::error::{KsvdError, Result};
use crate::omp::{self, EncodeReport, OrthogonalMatchingPursuit, SparseCode};
use crate::params::{Dimensions, SolverOptions};
use crate::state::State;
use crate::Real;

/// Outcome of one sequential sweep of atom updates.
#[derive(Clone, Debug, PartialEq)]
pub struct DictionaryReport<T: Real> {
    pub updated: Vec<AtomUpdate<T>>,
    /// Atoms left unchanged this sweep, with the reason.
    pub skipped: Vec<KsvdError>,
}

/// K-SVD dictionary learner.
///
/// # Example
///
/// ```rust
/// use ksvd::{Dimensions, Solver};
///
/// let mut solver = Solver::<f64>::new(Dimensions::new(1, 2, 2, 2))?;
/// solver.state_mut().set_sample(0, &[2.0, 0.1])?;
/// solver.state_mut().set_sample(1, &[0.1, -3.0])?;
/// solver.state_mut().set_atom(0, &[1.0, 0.0])?;
/// solver.state_mut().set_atom(1, &[0.0, 1.0])?;
///
/// solver.encode_all();
/// let report = solver.update_dictionary();
/// assert!(report.skipped.is_empty());
/// assert!(solver.state().reconstruction_error() < 1e-12);
/// # Ok::<(), ksvd::KsvdError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Solver<T: Real = f64> {
    state: State<T>,
    options: SolverOptions,
}

impl<T: Real> Solver<T> {
    /// Create a solver with default options.
    pub fn new(dims: Dimensions) -> Result<Self> {
        Self::with_options(dims, SolverOptions::default())
    }

    pub fn with_options(dims: Dimensions, options: SolverOptions) -> Result<Self> {
        Ok(Self {
            state: State::new(dims)?,
            options,
        })
    }

    /// Reallocate for new sizes; all matrix contents are discarded.
    pub fn init(&mut self, dims: Dimensions) -> Result<()> {
        self.state.init(dims)
    }

    pub fn state(&self) -> &State<T> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State<T> {
        &mut self.state
    }

    pub fn into_state(self) -> State<T> {
        self.state
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: SolverOptions) {
        self.options = options;
    }

    pub fn dimensions(&self) -> Dimensions {
        self.state.dimensions()
    }

    // =========================================================================
    // Dictionary update
    // =========================================================================

    /// Refit atom `kth` from the samples currently using it.
    pub fn update_atom(&mut self, kth: usize) -> Result<AtomUpdate<T>> {
        atom_update::update_atom(&mut self.state, kth, &self.options)
    }

    /// Update every atom once, in index order.
    ///
    /// Each update sees the atoms refit before it. An atom that cannot be
    /// updated is skipped and the sweep carries on.
    pub fn update_dictionary(&mut self) -> DictionaryReport<T> {
        let k = self.state.dictionary_size();
        let mut report = DictionaryReport {
            updated: Vec::with_capacity(k),
            skipped: Vec::new(),
        };

        for kth in 0..k {
            match self.update_atom(kth) {
                Ok(update) => report.updated.push(update),
                Err(e) => {
                    warn!(atom = kth, error = %e, "atom skipped");
                    report.skipped.push(e);
                }
            }
        }

        debug!(
            updated = report.updated.len(),
            skipped = report.skipped.len(),
            "dictionary sweep complete"
        );
        report
    }

    // =========================================================================
    // Sparse coding
    // =========================================================================

    /// Recompute the code of every sample.
    pub fn encode_all(&mut self) -> EncodeReport {
        omp::encode_all(&mut self.state, &self.options)
    }

    /// Code an arbitrary signal against the current dictionary.
    ///
    /// Leaves the state untouched.
    pub fn encode(&self, signal: &[T]) -> Result<SparseCode<T>> {
        let dims = self.state.dimensions();
        if signal.len() != dims.dimensionality {
            return Err(KsvdError::DimensionMismatch {
                expected: dims.dimensionality,
                got: signal.len(),
            });
        }

        let signal = nalgebra::DVector::from_column_slice(signal);
        let mut omp = OrthogonalMatchingPursuit::new(
            dims.target_sparsity,
            dims.dictionary_size,
            self.options.tolerance_for(),
        );
        Ok(omp.encode(self.state.dictionary(), signal.column(0)))
    }
}
