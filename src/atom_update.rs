//! K-SVD atom update: refit one dictionary column with a rank-1 SVD.
//!
//! For atom k, only the samples whose code currently uses k take part. Their
//! residual with atom k's own contribution removed,
//!
//! ```text
//! E_r = Y_r - Dict · X_r     (row k of X_r zeroed)
//! ```
//!
//! is approximated by its best rank-1 factor `σ u vᵀ`. The atom becomes `u`
//! and the participating code entries become `σ v`. Every other atom and every
//! other code entry is left untouched, so no new nonzeros appear in X.

use nalgebra::{DMatrix, DVector, SVD};
use tracing::debug;

use crate::error::{KsvdError, Result};
use crate::params::{EmptyAtomPolicy, SolverOptions};
use crate::state::State;
use crate::Real;

/// Iteration cap for the bidiagonal SVD sweep.
const SVD_MAX_ITERATIONS: usize = 10_000;

/// How an atom was changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AtomOutcome {
    /// Refit from the SVD of its restricted residual.
    Refined,
    /// Had no active samples and was re-pointed at the worst-represented sample.
    Replaced { sample: usize },
}

/// Summary of one atom update.
#[derive(Clone, Debug, PartialEq)]
pub struct AtomUpdate<T: Real> {
    pub atom: usize,
    pub outcome: AtomOutcome,
    /// Samples using the atom before the update, ascending.
    pub active_samples: Vec<usize>,
    /// Leading singular value of the restricted residual.
    pub singular_value: T,
    /// ‖Y_r - Dict · X_r‖_F before the update.
    pub residual_before: T,
    /// ‖Y_r - Dict · X_r‖_F after the update.
    pub residual_after: T,
}

/// Ascending indices of the samples whose code uses `atom`.
pub fn active_samples<T: Real>(codes: &DMatrix<T>, atom: usize) -> Vec<usize> {
    let row = codes.row(atom);
    let mut active = Vec::with_capacity(codes.ncols());
    active.extend(
        row.iter()
            .enumerate()
            .filter(|(_, &c)| c != T::zero())
            .map(|(i, _)| i),
    );
    active
}

/// Refit atom `kth` and the code entries of the samples that use it.
pub fn update_atom<T: Real>(
    state: &mut State<T>,
    kth: usize,
    options: &SolverOptions,
) -> Result<AtomUpdate<T>> {
    state.check_atom(kth)?;

    let active = active_samples(&state.codes, kth);
    if active.is_empty() {
        return handle_empty(state, kth, options);
    }

    let k = active.len();
    let yr = state.samples.select_columns(active.iter());
    let mut xr = state.codes.select_columns(active.iter());
    let xrk_old: DVector<T> = xr.row(kth).transpose();
    xr.row_mut(kth).fill(T::zero());

    // Residual with atom kth's own contribution removed
    let er = yr - &state.dictionary * &xr;

    let residual_before = (&er - state.dictionary.column(kth) * xrk_old.transpose()).norm();

    let svd = SVD::try_new(er.clone(), true, true, T::default_epsilon(), SVD_MAX_ITERATIONS)
        .ok_or(KsvdError::DecompositionFailed { atom: kth })?;
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => return Err(KsvdError::DecompositionFailed { atom: kth }),
    };

    let lead = leading_index(svd.singular_values.as_slice());
    let sigma = svd.singular_values[lead];
    let mut d_new: DVector<T> = u.column(lead).into_owned();
    let mut v_new: DVector<T> = v_t.row(lead).transpose();
    canonicalize_sign(&mut d_new, &mut v_new);

    let xrk_new = v_new * sigma;
    let residual_after = (&er - &d_new * xrk_new.transpose()).norm();

    state.dictionary.set_column(kth, &d_new);
    for (j, &sample) in active.iter().enumerate() {
        state.codes[(kth, sample)] = xrk_new[j];
    }

    debug!(
        atom = kth,
        active = k,
        sigma = ?sigma,
        residual_before = ?residual_before,
        residual_after = ?residual_after,
        "atom refined"
    );

    Ok(AtomUpdate {
        atom: kth,
        outcome: AtomOutcome::Refined,
        active_samples: active,
        singular_value: sigma,
        residual_before,
        residual_after,
    })
}

fn handle_empty<T: Real>(
    state: &mut State<T>,
    kth: usize,
    options: &SolverOptions,
) -> Result<AtomUpdate<T>> {
    match options.empty_atom {
        EmptyAtomPolicy::Keep => Err(KsvdError::DegenerateResidual { atom: kth }),
        EmptyAtomPolicy::ReplaceWithWorstSample => {
            let tolerance: T = options.tolerance_for();
            // Zero samples cannot be normalized into an atom
            let worst = (0..state.sample_count())
                .filter(|&i| state.samples.column(i).norm() > T::zero())
                .map(|i| (i, state.sample_error_unchecked(i)))
                .fold(None, |best: Option<(usize, T)>, cur| match best {
                    Some(b) if b.1 >= cur.1 => Some(b),
                    _ => Some(cur),
                });
            let Some((worst, error)) = worst else {
                return Err(KsvdError::DegenerateResidual { atom: kth });
            };

            let sample = state.samples.column(worst);
            let norm = sample.norm();
            if error <= tolerance * norm {
                return Err(KsvdError::DegenerateResidual { atom: kth });
            }

            let atom = sample / norm;
            state.dictionary.set_column(kth, &atom);
            debug!(atom = kth, sample = worst, error = ?error, "unused atom replaced");

            Ok(AtomUpdate {
                atom: kth,
                outcome: AtomOutcome::Replaced { sample: worst },
                active_samples: Vec::new(),
                singular_value: T::zero(),
                residual_before: T::zero(),
                residual_after: T::zero(),
            })
        }
    }
}

/// Index of the largest singular value; first one wins ties.
fn leading_index<T: Real>(values: &[T]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Make the largest-magnitude entry of `u` positive, flipping `v` with it.
///
/// The SVD only fixes the singular vector pair up to a joint sign.
fn canonicalize_sign<T: Real>(u: &mut DVector<T>, v: &mut DVector<T>) {
    if u.is_empty() {
        return;
    }
    let mut pivot = 0;
    for i in 1..u.len() {
        if u[i].abs() > u[pivot].abs() {
            pivot = i;
        }
    }
    if u[pivot] < T::zero() {
        u.neg_mut();
        v.neg_mut();
    }
}
