//! Sparse coding by Orthogonal Matching Pursuit.
//!
//! Each sample is coded independently against a fixed dictionary:
//!
//! 1. Pick the unselected atom with the largest `|⟨r, d_k⟩|` (lowest index on ties).
//! 2. Extend the Cholesky factor of the selected atoms' Gram matrix by one row.
//! 3. Solve `L Lᵀ c = D_Iᵀ y` and recompute the residual `r = y - D_I c`.
//!
//! The loop stops at the sparsity target, when no atom correlates with the
//! residual any more, when every atom is selected, or when the next atom is
//! numerically dependent on the selected ones. In the last case the previous
//! selection and coefficients are kept, so every sample still gets a valid
//! (shorter) code.
//!
//! # Example
//!
//! ```rust
//! use ksvd::omp::{OrthogonalMatchingPursuit, StopReason};
//! use nalgebra::{DMatrix, DVector};
//!
//! let dict = DMatrix::<f64>::identity(3, 3);
//! let signal = DVector::from_column_slice(&[0.0, 2.0, -1.0]);
//!
//! let mut omp = OrthogonalMatchingPursuit::new(2, 3, 1e-8);
//! let code = omp.encode(&dict, signal.column(0));
//! assert_eq!(code.atoms, vec![1, 2]);
//! assert_eq!(code.stop, StopReason::SparsityReached);
//! ```

use nalgebra::{DMatrix, DVector, DVectorView};
use tracing::{debug, trace};

use crate::cholesky::IncrementalCholesky;
use crate::params::SolverOptions;
use crate::state::State;
use crate::Real;

/// Why the greedy loop for one sample ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// `target_sparsity` atoms were selected.
    SparsityReached,
    /// No unselected atom correlates with the residual.
    ResidualExhausted,
    /// Every atom in the dictionary is already selected.
    DictionaryExhausted,
    /// The best remaining atom lies in the span of the selected ones.
    RankDeficient,
}

/// Sparse code of one signal.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseCode<T: Real> {
    /// Selected atoms, in selection order.
    pub atoms: Vec<usize>,
    /// Coefficient of `atoms[j]` at position j.
    pub coefficients: Vec<T>,
    /// ‖y - D_I c‖ for the final coefficients.
    pub residual_norm: T,
    pub stop: StopReason,
}

impl<T: Real> SparseCode<T> {
    /// Dense coefficient vector of length `dictionary_size`.
    pub fn to_dense(&self, dictionary_size: usize) -> DVector<T> {
        let mut dense = DVector::zeros(dictionary_size);
        for (&atom, &c) in self.atoms.iter().zip(self.coefficients.iter()) {
            dense[atom] = c;
        }
        dense
    }

    pub fn nnz(&self) -> usize {
        self.atoms.len()
    }
}

/// Totals for one sparse-coding pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeReport {
    pub samples: usize,
    /// Nonzero entries written across all code columns.
    pub nonzeros: usize,
    /// Samples stopped by a dependent atom.
    pub rank_deficient: usize,
    /// Samples stopped early for any other reason.
    pub exhausted: usize,
}

/// Reusable OMP encoder.
///
/// Holds the Cholesky buffer and selection workspace so that coding many
/// samples against the same dictionary does not reallocate per sample.
#[derive(Clone, Debug)]
pub struct OrthogonalMatchingPursuit<T: Real> {
    target_sparsity: usize,
    tolerance: T,
    cholesky: IncrementalCholesky<T>,
    selected: Vec<bool>,
    cross: Vec<T>,
    rhs: Vec<T>,
}

impl<T: Real> OrthogonalMatchingPursuit<T> {
    /// Encoder for dictionaries of `dictionary_size` atoms.
    ///
    /// `tolerance` is relative: atoms whose residual correlation is not above
    /// `tolerance * ‖y‖` are treated as uncorrelated, and a Cholesky pivot not
    /// above `tolerance * ‖d‖²` marks a dependent atom.
    pub fn new(target_sparsity: usize, dictionary_size: usize, tolerance: T) -> Self {
        let capacity = target_sparsity.min(dictionary_size);
        Self {
            target_sparsity,
            tolerance,
            cholesky: IncrementalCholesky::new(capacity),
            selected: vec![false; dictionary_size],
            cross: Vec::with_capacity(capacity),
            rhs: Vec::with_capacity(capacity),
        }
    }

    pub fn target_sparsity(&self) -> usize {
        self.target_sparsity
    }

    /// Code `signal` against the columns of `dict`.
    ///
    /// # Panics
    /// Panics if `dict` has a different number of atoms or rows than the
    /// encoder and signal expect.
    pub fn encode(&mut self, dict: &DMatrix<T>, signal: DVectorView<'_, T>) -> SparseCode<T> {
        assert_eq!(dict.ncols(), self.selected.len(), "dictionary size changed");
        assert_eq!(dict.nrows(), signal.len(), "signal length must match atom length");

        let capacity = self.cholesky.capacity();
        self.cholesky.clear();
        self.selected.fill(false);

        // Dᵀ y, reused for every right-hand side
        let projections = dict.tr_mul(&signal);
        let floor = self.tolerance * signal.norm();

        let mut atoms: Vec<usize> = Vec::with_capacity(capacity);
        let mut coefficients: Vec<T> = Vec::with_capacity(capacity);
        let mut residual: DVector<T> = signal.clone_owned();

        let stop = loop {
            if atoms.len() == self.target_sparsity {
                break StopReason::SparsityReached;
            }
            if atoms.len() == self.selected.len() {
                break StopReason::DictionaryExhausted;
            }

            let Some(best) = self.most_correlated(dict, &residual, floor) else {
                break StopReason::ResidualExhausted;
            };

            let candidate = dict.column(best);
            self.cross.clear();
            self.cross
                .extend(atoms.iter().map(|&a| dict.column(a).dot(&candidate)));
            let diag = candidate.norm_squared();

            if let Err(e) = self.cholesky.push(best, &self.cross, diag, self.tolerance) {
                debug!(error = %e, "stopping early on dependent atom");
                break StopReason::RankDeficient;
            }
            atoms.push(best);
            self.selected[best] = true;
            trace!(atom = best, selected = atoms.len(), "atom selected");

            self.rhs.clear();
            self.rhs.extend(atoms.iter().map(|&a| projections[a]));
            coefficients.resize(atoms.len(), T::zero());
            self.cholesky.solve(&self.rhs, &mut coefficients);

            residual.copy_from(&signal);
            for (&a, &c) in atoms.iter().zip(coefficients.iter()) {
                residual.axpy(-c, &dict.column(a), T::one());
            }
        };

        SparseCode {
            atoms,
            coefficients,
            residual_norm: residual.norm(),
            stop,
        }
    }

    /// Lowest-index unselected atom with the largest `|⟨r, d_k⟩|` above `floor`.
    fn most_correlated(&self, dict: &DMatrix<T>, residual: &DVector<T>, floor: T) -> Option<usize> {
        let mut best = None;
        let mut best_value = floor;
        for (k, atom) in dict.column_iter().enumerate() {
            if self.selected[k] {
                continue;
            }
            let value = atom.dot(residual).abs();
            if value > best_value {
                best_value = value;
                best = Some(k);
            }
        }
        best
    }
}

/// Recompute every code column of `state` against its current dictionary.
pub fn encode_all<T: Real>(state: &mut State<T>, options: &SolverOptions) -> EncodeReport {
    let dims = state.dimensions();
    let mut omp = OrthogonalMatchingPursuit::new(
        dims.target_sparsity,
        dims.dictionary_size,
        options.tolerance_for(),
    );

    let mut report = EncodeReport::default();
    for i in 0..dims.sample_count {
        let code = omp.encode(&state.dictionary, state.samples.column(i));

        let mut column = state.codes.column_mut(i);
        column.fill(T::zero());
        for (&atom, &c) in code.atoms.iter().zip(code.coefficients.iter()) {
            column[atom] = c;
        }

        report.samples += 1;
        report.nonzeros += code.nnz();
        match code.stop {
            StopReason::SparsityReached => {}
            StopReason::RankDeficient => report.rank_deficient += 1,
            StopReason::ResidualExhausted | StopReason::DictionaryExhausted => {
                report.exhausted += 1
            }
        }
    }

    debug!(
        samples = report.samples,
        nonzeros = report.nonzeros,
        rank_deficient = report.rank_deficient,
        exhausted = report.exhausted,
        "sparse coding pass complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::params::Dimensions;

    const TOL: f64 = 1e-8;

    fn orthonormal_dictionary() -> DMatrix<f64> {
        // Columns: e0, e1, e2, (e0 + e1)/√2
        let h = std::f64::consts::FRAC_1_SQRT_2;
        DMatrix::from_column_slice(3, 4, &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, h, h, 0.0])
    }

    #[test]
    fn test_exact_recovery_orthonormal() {
        let dict = DMatrix::<f64>::identity(5, 5);
        let y = DVector::from_column_slice(&[0.0, 3.0, 0.0, -2.0, 0.0]);

        let mut omp = OrthogonalMatchingPursuit::new(3, 5, TOL);
        let code = omp.encode(&dict, y.column(0));

        assert_eq!(code.atoms, vec![1, 3]);
        assert!((code.coefficients[0] - 3.0).abs() < 1e-12);
        assert!((code.coefficients[1] + 2.0).abs() < 1e-12);
        assert!(code.residual_norm < 1e-12);
        assert_eq!(code.stop, StopReason::ResidualExhausted);
    }

    #[test]
    fn test_exact_recovery_near_orthogonal() {
        // d_k ∝ e_k + 0.1 e_{k+1}: coherence ≈ 0.1, well inside OMP's recovery bound
        let n = 32;
        let mut dict = DMatrix::<f64>::zeros(n, n);
        for k in 0..n {
            dict[(k, k)] = 1.0;
            dict[((k + 1) % n, k)] = 0.1;
        }
        for mut col in dict.column_iter_mut() {
            col.normalize_mut();
        }

        let mut truth = DVector::zeros(n);
        truth[4] = 1.5;
        truth[19] = -0.8;
        truth[27] = 1.1;
        let y = &dict * &truth;

        let mut omp = OrthogonalMatchingPursuit::new(3, n, TOL);
        let code = omp.encode(&dict, y.column(0));

        let mut atoms = code.atoms.clone();
        atoms.sort_unstable();
        assert_eq!(atoms, vec![4, 19, 27]);
        assert!((code.to_dense(n) - truth).norm() < 1e-9);
        assert!(code.residual_norm < 1e-9);
    }

    #[test]
    fn test_ties_resolve_to_lowest_index() {
        let dict = orthonormal_dictionary();
        let y = DVector::from_column_slice(&[1.0, 1.0, 0.0]);

        let mut omp = OrthogonalMatchingPursuit::new(1, 4, TOL);
        let code = omp.encode(&dict, y.column(0));
        // (e0 + e1)/√2 has correlation √2 > 1, so it wins outright
        assert_eq!(code.atoms, vec![3]);

        // Without it, y is equally correlated with e0 and e1
        let dict = DMatrix::<f64>::identity(3, 3).insert_column(3, 0.0);
        let code = omp.encode(&dict, y.column(0));
        assert_eq!(code.atoms, vec![0]);
    }

    #[test]
    fn test_dependent_atom_stops_early() {
        // Atom 1 duplicates atom 0, atom 2 is orthogonal
        let dict = DMatrix::from_column_slice(2, 3, &[1.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        let y = DVector::from_column_slice(&[2.0, 0.0]);

        let mut omp = OrthogonalMatchingPursuit::new(2, 3, TOL);
        let code = omp.encode(&dict, y.column(0));
        // Residual is zero after atom 0, so atom 1 is never tried
        assert_eq!(code.atoms, vec![0]);
        assert_eq!(code.stop, StopReason::ResidualExhausted);

        // Zero tolerance lets the duplicate's roundoff correlation through
        let mut omp = OrthogonalMatchingPursuit::<f64>::new(2, 2, 0.0);
        let dict = DMatrix::from_column_slice(2, 2, &[1.0, 0.0, 1.0, 1e-20]);
        let y = DVector::from_column_slice(&[1.0, 1.0]);
        let code = omp.encode(&dict, y.column(0));
        assert_eq!(code.atoms.len(), 1);
        assert_eq!(code.stop, StopReason::RankDeficient);
        assert!((code.residual_norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_dictionary_exhausted() {
        let dict = DMatrix::<f64>::identity(3, 2);
        let y = DVector::from_column_slice(&[1.0, 1.0, 1.0]);

        let mut omp = OrthogonalMatchingPursuit::new(5, 2, TOL);
        let code = omp.encode(&dict, y.column(0));
        assert_eq!(code.atoms, vec![0, 1]);
        assert_eq!(code.stop, StopReason::DictionaryExhausted);
        assert!((code.residual_norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_least_squares_on_correlated_atoms() {
        let dict = orthonormal_dictionary();
        let y = DVector::from_column_slice(&[2.0, 0.5, 0.0]);

        let mut omp = OrthogonalMatchingPursuit::new(2, 4, TOL);
        let code = omp.encode(&dict, y.column(0));

        // Two atoms spanning the e0/e1 plane reconstruct y exactly
        assert_eq!(code.atoms.len(), 2);
        let approx = &dict * code.to_dense(4);
        assert!((approx - &y).norm() < 1e-12);
    }

    #[test]
    fn test_encode_all_respects_sparsity() {
        let dims = Dimensions::new(3, 12, 10, 80);
        let mut state = fixtures::random_problem::<f64>(23, dims);
        // Fill every code entry so the pass has to clear them
        state.codes_mut().fill(1.0);

        let report = encode_all(&mut state, &SolverOptions::default());
        assert_eq!(report.samples, 80);
        for i in 0..80 {
            assert!(state.code_nonzeros(i).unwrap() <= 3);
        }
        let total: usize = (0..80).map(|i| state.code_nonzeros(i).unwrap()).sum();
        assert_eq!(total, report.nonzeros);
    }

    #[test]
    fn test_encode_all_is_a_fixed_point() {
        let mut state = fixtures::random_problem::<f64>(29, Dimensions::new(2, 8, 6, 40));
        let options = SolverOptions::default();

        encode_all(&mut state, &options);
        let once = state.clone();
        encode_all(&mut state, &options);
        assert_eq!(state, once);
    }

    #[test]
    fn test_encode_all_counts_rank_deficient_stop() {
        let mut state = State::<f64>::new(Dimensions::new(2, 2, 2, 1)).unwrap();
        state.set_atom(0, &[1.0, 0.0]).unwrap();
        state.set_atom(1, &[1.0, 1e-20]).unwrap();
        state.set_sample(0, &[1.0, 1.0]).unwrap();

        let options = SolverOptions::default().with_tolerance(0.0);
        let report = encode_all(&mut state, &options);
        assert_eq!(
            report,
            EncodeReport {
                samples: 1,
                nonzeros: 1,
                rank_deficient: 1,
                exhausted: 0,
            }
        );
        // The coefficient found before the rejected atom is kept
        assert_eq!(state.codes().column(0).as_slice(), &[1.0, 0.0]);
    }

    #[test]
    fn test_encode_all_deterministic_f32() {
        let dims = Dimensions::new(2, 6, 5, 20);
        let mut a = fixtures::random_problem::<f32>(31, dims);
        let mut b = a.clone();
        let options = SolverOptions::default();

        encode_all(&mut a, &options);
        encode_all(&mut b, &options);
        assert_eq!(a.codes(), b.codes());
        for i in 0..20 {
            assert!(a.code_nonzeros(i).unwrap() <= 2);
        }
    }
}
