//! Sparse Recovery: learn a hidden dictionary from synthetic sparse mixtures.
//!
//! A random unit-norm dictionary generates samples as 3-sparse combinations
//! plus a little noise. Starting from a dictionary made of random samples, the
//! demo alternates sparse coding and atom-update sweeps and reports how many
//! hidden atoms have been found (|cos| > 0.99 with some learned atom).
//!
//! The outer loop, the stopping rule and the initial dictionary all live
//! here, on the caller's side.
//!
//! Run: cargo run --example sparse_recovery --release

use ksvd::{Dimensions, EmptyAtomPolicy, Solver, SolverOptions};
use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

const DIM: usize = 20;
const ATOMS: usize = 30;
const SAMPLES: usize = 1500;
const SPARSITY: usize = 3;
const PASSES: usize = 30;

fn random_dictionary(rng: &mut ChaCha8Rng) -> DMatrix<f64> {
    let mut dict = DMatrix::from_fn(DIM, ATOMS, |_, _| rng.gen_range(-1.0..1.0));
    for mut col in dict.column_iter_mut() {
        col.normalize_mut();
    }
    dict
}

fn sparse_mixture(rng: &mut ChaCha8Rng, dict: &DMatrix<f64>) -> DVector<f64> {
    let support: Vec<usize> = (0..ATOMS).choose_multiple(rng, SPARSITY);
    let mut sample = DVector::zeros(DIM);
    for k in support {
        let weight: f64 = rng.gen_range(0.5..2.0) * if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        sample.axpy(weight, &dict.column(k), 1.0);
    }
    sample.iter_mut().for_each(|v| *v += rng.gen_range(-0.01..0.01));
    sample
}

/// Hidden atoms matched by some learned atom with |cos| above `threshold`.
fn recovered(hidden: &DMatrix<f64>, learned: &DMatrix<f64>, threshold: f64) -> usize {
    hidden
        .column_iter()
        .filter(|h| learned.column_iter().any(|l| l.dot(h).abs() > threshold))
        .count()
}

fn main() -> ksvd::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let hidden = random_dictionary(&mut rng);

    let options = SolverOptions::default().with_empty_atom(EmptyAtomPolicy::ReplaceWithWorstSample);
    let mut solver =
        Solver::<f64>::with_options(Dimensions::new(SPARSITY, ATOMS, DIM, SAMPLES), options)?;

    let state = solver.state_mut();
    for i in 0..SAMPLES {
        let sample = sparse_mixture(&mut rng, &hidden);
        state.set_sample(i, sample.as_slice())?;
    }
    // Initial dictionary: random distinct samples, normalized
    for (k, i) in (0..SAMPLES).choose_multiple(&mut rng, ATOMS).into_iter().enumerate() {
        let atom = state.samples().column(i).normalize();
        state.set_atom(k, atom.as_slice())?;
    }

    println!("  pass | coding error | after sweep | skipped | recovered");
    println!("  -----+--------------+-------------+---------+----------");
    for pass in 0..PASSES {
        solver.encode_all();
        let coded = solver.state().reconstruction_error();

        let report = solver.update_dictionary();
        let swept = solver.state().reconstruction_error();

        println!(
            "  {:>4} | {:>12.6} | {:>11.6} | {:>7} | {:>3}/{}",
            pass,
            coded,
            swept,
            report.skipped.len(),
            recovered(&hidden, solver.state().dictionary(), 0.99),
            ATOMS
        );
    }
    Ok(())
}
