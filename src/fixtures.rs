//! Deterministic problems shared by the unit tests.

use nalgebra::DMatrix;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::params::Dimensions;
use crate::state::State;
use crate::Real;

/// 16 two-dimensional samples in 4 clusters of 4 around (±0.5, ±0.5).
///
/// Each cluster is a 2×2 grid jittered by ±0.1. Atom g starts on the diagonal
/// direction of cluster g and every sample in cluster g is coded with weight 1
/// on atom g. Sparsity target is 1.
pub(crate) fn quadrant_clusters<T: Real>() -> State<T> {
    let mut state = State::new(Dimensions::new(1, 4, 2, 16)).unwrap();
    for group in 0..4 {
        let cx = -0.5 + (group % 2) as f64;
        let cy = -0.5 + (group / 2) as f64;
        for sub in 0..4 {
            let x = cx - 0.1 + 0.2 * (sub % 2) as f64;
            let y = cy - 0.1 + 0.2 * (sub / 2) as f64;
            state
                .set_sample(4 * group + sub, &[nalgebra::convert(x), nalgebra::convert(y)])
                .unwrap();
        }
    }

    let h = std::f64::consts::FRAC_1_SQRT_2;
    let atoms = [[-h, -h], [h, -h], [-h, h], [h, h]];
    for (k, atom) in atoms.iter().enumerate() {
        state
            .set_atom(k, &[nalgebra::convert(atom[0]), nalgebra::convert(atom[1])])
            .unwrap();
    }

    for i in 0..16 {
        state.codes_mut()[(i / 4, i)] = T::one();
    }
    state
}

/// Random unit-norm dictionary, `dimensionality × atoms`.
pub(crate) fn random_dictionary(rng: &mut ChaCha8Rng, dimensionality: usize, atoms: usize) -> DMatrix<f64> {
    let mut dict = DMatrix::from_fn(dimensionality, atoms, |_, _| rng.gen_range(-1.0..1.0));
    for mut col in dict.column_iter_mut() {
        col.normalize_mut();
    }
    dict
}

/// Random sparse code: atom `i % K` plus `sparsity - 1` other distinct atoms.
pub(crate) fn random_code(rng: &mut ChaCha8Rng, i: usize, atoms: usize, sparsity: usize) -> Vec<f64> {
    let mut code = vec![0.0; atoms];
    let mut support = vec![i % atoms];
    while support.len() < sparsity.min(atoms) {
        let k = rng.gen_range(0..atoms);
        if !support.contains(&k) {
            support.push(k);
        }
    }
    for k in support {
        let magnitude = rng.gen_range(0.5..1.5);
        code[k] = if rng.gen_bool(0.5) { magnitude } else { -magnitude };
    }
    code
}

/// A noisy K-SVD problem with a perturbed starting dictionary.
///
/// Samples are generated from a hidden dictionary and sparse codes plus small
/// noise. The state's dictionary is the hidden one with added noise and
/// renormalized; the state's codes are the hidden codes, so every atom has at
/// least one active sample when `sample_count >= dictionary_size`.
pub(crate) fn random_problem<T: Real>(seed: u64, dims: Dimensions) -> State<T> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let truth = random_dictionary(&mut rng, dims.dimensionality, dims.dictionary_size);

    let mut state = State::new(dims).unwrap();
    for i in 0..dims.sample_count {
        let code = random_code(&mut rng, i, dims.dictionary_size, dims.target_sparsity);
        let clean = &truth * nalgebra::DVector::from_column_slice(&code);
        let sample: Vec<T> = clean
            .iter()
            .map(|&v| nalgebra::convert(v + rng.gen_range(-0.01..0.01)))
            .collect();
        state.set_sample(i, &sample).unwrap();
        let code: Vec<T> = code.into_iter().map(nalgebra::convert).collect();
        state.set_code(i, &code).unwrap();
    }

    for k in 0..dims.dictionary_size {
        let mut atom: nalgebra::DVector<f64> = truth.column(k).into_owned();
        atom.iter_mut().for_each(|v| *v += rng.gen_range(-0.1..0.1));
        atom.normalize_mut();
        let atom: Vec<T> = atom.iter().map(|&v| nalgebra::convert(v)).collect();
        state.set_atom(k, &atom).unwrap();
    }
    state
}
