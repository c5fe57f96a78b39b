//! Quadrant Clusters: one K-SVD sweep on a toy 2-D problem.
//!
//! 16 samples sit in 4 clusters of 4 around (±0.5, ±0.5). The dictionary
//! starts on the four diagonal directions and every sample is coded with a
//! single atom, the one for its own quadrant.
//!
//! 1. One atom-update sweep pulls each atom onto its cluster's axis
//! 2. One sparse-coding pass recodes every sample with a single atom
//! 3. Dict · X is compared against the samples
//!
//! Run: RUST_LOG=ksvd=debug cargo run --example quadrant_clusters

use ksvd::{Dimensions, Solver};
use tracing_subscriber::EnvFilter;

// =============================================================================
// Helpers
// =============================================================================

fn print_header(title: &str) {
    println!();
    println!("{}", "=".repeat(70));
    println!("  {}", title);
    println!("{}", "=".repeat(70));
}

fn seed(solver: &mut Solver<f64>) -> ksvd::Result<()> {
    let state = solver.state_mut();

    for group in 0..4 {
        let cx = -0.5 + (group % 2) as f64;
        let cy = -0.5 + (group / 2) as f64;
        for sub in 0..4 {
            let x = cx - 0.1 + 0.2 * (sub % 2) as f64;
            let y = cy - 0.1 + 0.2 * (sub / 2) as f64;
            state.set_sample(4 * group + sub, &[x, y])?;
        }
    }

    let h = std::f64::consts::FRAC_1_SQRT_2;
    state.set_atom(0, &[-h, -h])?;
    state.set_atom(1, &[h, -h])?;
    state.set_atom(2, &[-h, h])?;
    state.set_atom(3, &[h, h])?;

    let mut codes = state.codes_mut();
    codes.fill(0.0);
    for i in 0..16 {
        codes[(i / 4, i)] = 1.0;
    }
    Ok(())
}

fn main() -> ksvd::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut solver = Solver::<f64>::new(Dimensions::new(1, 4, 2, 16))?;
    seed(&mut solver)?;

    print_header("INITIAL STATE");
    println!("  Y:{}", solver.state().samples());
    println!("  Dict:{}", solver.state().dictionary());
    println!("  X:{}", solver.state().codes());
    println!(
        "  reconstruction error: {:.6}",
        solver.state().reconstruction_error()
    );

    print_header("ATOM UPDATE SWEEP");
    for kth in 0..solver.dimensions().dictionary_size {
        match solver.update_atom(kth) {
            Ok(update) => println!(
                "  atom {}: {} active samples, sigma {:.4}, residual {:.4} -> {:.4}",
                kth,
                update.active_samples.len(),
                update.singular_value,
                update.residual_before,
                update.residual_after
            ),
            Err(e) => println!("  atom {}: skipped ({})", kth, e),
        }
    }
    println!("  Dict:{}", solver.state().dictionary());
    println!("  X:{}", solver.state().codes());

    print_header("SPARSE CODING PASS");
    let report = solver.encode_all();
    println!(
        "  {} samples, {} nonzeros, {} rank-deficient, {} exhausted",
        report.samples, report.nonzeros, report.rank_deficient, report.exhausted
    );

    print_header("RESULT");
    println!("  Dict * X:{}", solver.state().reconstruction());
    println!(
        "  reconstruction error: {:.6}",
        solver.state().reconstruction_error()
    );
    Ok(())
}
