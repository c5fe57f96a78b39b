//! # ksvd: Sparse Dictionary Learning
//!
//! Learns a small dictionary of unit-norm atoms and, for every sample, a
//! sparse code that reconstructs the sample from a few atoms:
//!
//! ```text
//! Y  ≈  Dict · X        Y: d × N,  Dict: d × K,  X: K × N
//! ```
//!
//! The crate provides the two alternating halves of K-SVD:
//!
//! - **Atom update** ([`Solver::update_atom`]): refit one atom, and the code
//!   entries of the samples using it, from a rank-1 SVD of their residual.
//! - **Sparse coding** ([`Solver::encode_all`]): recompute every code with
//!   Orthogonal Matching Pursuit, re-solving the least-squares problem through
//!   an incrementally grown Cholesky factor.
//!
//! The outer loop (how many passes, when to stop) is left to the caller.
//!
//! ## Quick Start
//!
//! ```rust
//! use ksvd::{Dimensions, Solver};
//!
//! let dims = Dimensions::new(1, 2, 2, 4);
//! let mut solver = Solver::<f64>::new(dims)?;
//!
//! let state = solver.state_mut();
//! state.set_sample(0, &[1.0, 1.1])?;
//! state.set_sample(1, &[2.0, 1.9])?;
//! state.set_sample(2, &[-1.0, 1.0])?;
//! state.set_sample(3, &[-2.1, 2.0])?;
//! state.set_atom(0, &[1.0, 0.0])?;
//! state.set_atom(1, &[0.0, 1.0])?;
//!
//! for _ in 0..5 {
//!     solver.encode_all();
//!     solver.update_dictionary();
//! }
//! println!("error: {:.4}", solver.state().reconstruction_error());
//! # Ok::<(), ksvd::KsvdError>(())
//! ```
//!
//! ## Core Concepts
//!
//! - **Atom**: a dictionary column, kept at unit norm by the atom update
//! - **Code**: a column of X with at most `target_sparsity` nonzeros
//! - **Active samples**: the samples whose code uses a given atom; only they
//!   take part in that atom's update
//! - **Scalar type**: any `nalgebra::RealField + Copy` (`f32`, `f64`)

use nalgebra::RealField;

pub mod atom_update;
pub mod cholesky;
pub mod error;
pub mod omp;
pub mod params;
pub mod solver;
pub mod state;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-exports for convenience
pub use atom_update::{AtomOutcome, AtomUpdate};
pub use cholesky::IncrementalCholesky;
pub use error::{KsvdError, Result};
pub use omp::{EncodeReport, OrthogonalMatchingPursuit, SparseCode, StopReason};
pub use params::{Dimensions, EmptyAtomPolicy, SolverOptions};
pub use solver::{DictionaryReport, Solver};
pub use state::State;

/// Scalar types the solver works in.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}
