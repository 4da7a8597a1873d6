//! RLS (Recursive Least Squares) update law.
//!
//! RLS converges faster than the LMS family at O(N²) cost per sample by
//! propagating `P`, an estimate of the inverse input correlation matrix.
//!
//! # Algorithm
//!
//! ```text
//! k(n) = P(n-1)·x(n) / (λ + x(n)ᵗ·P(n-1)·x(n))
//! w(n) = (1-γ)·w(n-1) + k(n)·e(n)
//! P(n) = (1/λ)·(P(n-1) − k(n)·(x(n)ᵗ·P(n-1)))
//! ```
//!
//! with `P(0) = I/δ`. λ ∈ (0, 1] sets the memory: λ near 1 remembers long and
//! tracks slowly, smaller λ tracks fast and is more noise sensitive.
//!
//! # Conditioning
//!
//! Rounding makes `P` drift away from symmetry, and the recursion does not
//! remove that drift: under weak excitation it grows by 1/λ per update.
//! Every `symmetrize_interval` committed updates the
//! proposed `P` is replaced by `(P + Pᵗ)/2`. An interval of 0 disables this.
//! A non-positive denominator means `P` has already lost definiteness; the
//! update is rejected.

use alloc::vec;
use alloc::vec::Vec;

use crate::config::Precision;
use crate::error::Quantity;
use crate::filter::Proposal;
use crate::state::{dot, FilterState};

/// RLS update with optional re-symmetrization of `P`.
#[derive(Debug, Clone)]
pub struct RlsUpdate {
    lambda: f64,
    symmetrize_interval: usize,
    leak: f64,
    precision: Precision,
    /// Committed updates since construction or reset.
    updates: u64,
    /// P·x
    px: Vec<f64>,
    /// xᵗ·P
    xp: Vec<f64>,
}

impl RlsUpdate {
    pub fn new(
        lambda: f64,
        symmetrize_interval: usize,
        leakage: f64,
        precision: Precision,
    ) -> Self {
        Self {
            lambda,
            symmetrize_interval,
            leak: 1.0 - leakage,
            precision,
            updates: 0,
            px: Vec::new(),
            xp: Vec::new(),
        }
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn symmetrize_interval(&self) -> usize {
        self.symmetrize_interval
    }

    /// Whether the update being proposed now gets re-symmetrized.
    fn symmetrize_due(&self) -> bool {
        self.symmetrize_interval > 0 && (self.updates + 1) % self.symmetrize_interval as u64 == 0
    }

    pub(crate) fn update(
        &mut self,
        state: &FilterState,
        error: f64,
        next: &mut Proposal,
    ) -> Result<(), Quantity> {
        let symmetrize = self.symmetrize_due();
        let (Some(p), Some(next_p)) = (
            state.inverse_correlation.as_ref(),
            next.inverse_correlation.as_mut(),
        ) else {
            return Err(Quantity::InverseCorrelation);
        };
        let n = p.dim();
        let x = state.delay_line.as_slice();

        if self.px.len() != n {
            self.px = vec![0.0; n];
            self.xp = vec![0.0; n];
        }
        let (px, xp) = (&mut self.px, &mut self.xp);

        p.mul_vec_into(x, px);
        p.vec_mul_into(x, xp);

        let denom = self.lambda + dot(x, px);
        if !(denom > 0.0) || !denom.is_finite() {
            return Err(Quantity::InverseCorrelation);
        }
        let inv_denom = 1.0 / denom;

        // w' = (1-γ)·w + k·e with k = P·x / denom
        for ((out, &w), &pxi) in next.coefficients.iter_mut().zip(&state.coefficients).zip(px.iter()) {
            *out = self.precision.store(self.leak * w + pxi * inv_denom * error);
        }

        // P' = (P − k·(xᵗP)) / λ
        let inv_lambda = 1.0 / self.lambda;
        let src = p.as_slice();
        let dst = next_p.as_mut_slice();
        for i in 0..n {
            let ki = px[i] * inv_denom;
            for j in 0..n {
                dst[i * n + j] = inv_lambda * (src[i * n + j] - ki * xp[j]);
            }
        }

        if symmetrize {
            next_p.symmetrize();
        }
        if self.precision == Precision::Single {
            for v in next_p.as_mut_slice() {
                *v = self.precision.store(*v);
            }
        }
        Ok(())
    }

    pub(crate) fn committed(&mut self) {
        self.updates += 1;
    }

    pub(crate) fn reset(&mut self) {
        self.updates = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdaptationConfig;
    use crate::linalg::SquareMatrix;

    fn pushed(config: &AdaptationConfig, inputs: &[f64]) -> FilterState {
        let mut state = FilterState::initial(config);
        for &x in inputs {
            state.delay_line.push(x);
        }
        state
    }

    #[test]
    fn test_single_tap_first_step() {
        // N = 1, P = 1/δ = 100, λ = 1: k = 100x/(1 + 100x²)
        let config = AdaptationConfig::rls(1, 1.0);
        let state = pushed(&config, &[2.0]);
        let mut law = RlsUpdate::new(1.0, 1, 0.0, Precision::Double);
        let mut next = Proposal::for_config(&config);
        law.update(&state, 4.0, &mut next).unwrap();

        let k = 200.0 / 401.0;
        assert!((next.coefficients()[0] - 4.0 * k).abs() < 1e-12);
        let p = next.inverse_correlation().unwrap();
        assert!((p.get(0, 0) - (100.0 - k * 200.0)).abs() < 1e-9);
    }

    #[test]
    fn test_matches_reference_recursion() {
        let config = AdaptationConfig::rls(2, 0.95);
        let state = pushed(&config, &[0.5, -1.0]);
        let mut law = RlsUpdate::new(0.95, 0, 0.0, Precision::Double);
        let mut next = Proposal::for_config(&config);
        law.update(&state, 0.3, &mut next).unwrap();

        // P = 100·I, x = [-1, 0.5]
        let x = [-1.0, 0.5];
        let denom = 0.95 + 100.0 * (1.0 + 0.25);
        let k = [100.0 * x[0] / denom, 100.0 * x[1] / denom];
        assert!((next.coefficients()[0] - 0.3 * k[0]).abs() < 1e-12);
        assert!((next.coefficients()[1] - 0.3 * k[1]).abs() < 1e-12);

        let p = next.inverse_correlation().unwrap();
        for i in 0..2 {
            for j in 0..2 {
                let eye = if i == j { 100.0 } else { 0.0 };
                let expected = (eye - k[i] * 100.0 * x[j]) / 0.95;
                assert!((p.get(i, j) - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_symmetrize_schedule() {
        let mut law = RlsUpdate::new(0.99, 3, 0.0, Precision::Double);
        let mut due = [false; 6];
        for slot in due.iter_mut() {
            *slot = law.symmetrize_due();
            law.committed();
        }
        assert_eq!(due, [false, false, true, false, false, true]);

        let off = RlsUpdate::new(0.99, 0, 0.0, Precision::Double);
        assert!(!off.symmetrize_due());
    }

    #[test]
    fn test_indefinite_matrix_rejected() {
        let config = AdaptationConfig::rls(2, 0.99);
        let mut state = pushed(&config, &[1.0, 1.0]);
        state.inverse_correlation =
            Some(SquareMatrix::from_row_major(2, alloc::vec![-5.0, 0.0, 0.0, -5.0]).unwrap());
        let mut law = RlsUpdate::new(0.99, 1, 0.0, Precision::Double);
        let mut next = Proposal::for_config(&config);
        assert_eq!(
            law.update(&state, 1.0, &mut next),
            Err(Quantity::InverseCorrelation)
        );
    }
}
