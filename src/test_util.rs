//! Deterministic test signals.

use alloc::vec::Vec;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform white noise in `[-amplitude, amplitude)`, mean power `amplitude²/3`.
pub fn white_noise(len: usize, amplitude: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-amplitude..amplitude)).collect()
}

/// Causal FIR convolution with zero initial history.
pub fn fir(input: &[f64], taps: &[f64]) -> Vec<f64> {
    (0..input.len())
        .map(|n| {
            taps.iter()
                .enumerate()
                .filter(|(k, _)| *k <= n)
                .map(|(k, h)| h * input[n - k])
                .sum()
        })
        .collect()
}

pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| libm::fabs(x - y))
        .fold(0.0, f64::max)
}
