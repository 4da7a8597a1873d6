//! LMS (Least Mean Squares) update law.
//!
//! # Algorithm
//!
//! ```text
//! y(n) = w^T(n-1) * x(n)                    // Filter output
//! e(n) = d(n) - y(n)                         // Error signal
//! w(n) = (1-γ) * w(n-1) + μ * e(n) * x(n)   // Weight update
//! ```
//!
//! where:
//! - `w(n)` = filter weights at time n
//! - `x(n)` = delay line, newest sample first
//! - `d(n)` = desired signal
//! - `μ` = step size
//! - `γ` = leakage (0 disables it)
//!
//! # Step Size (μ) Selection
//!
//! - **Range**: 0 < μ < 2/(N·σx²), where σx² is the mean squared input
//! - **Small μ**: Slower convergence, lower steady-state error
//! - **Large μ**: Faster convergence, higher misadjustment
//!
//! A step size above the bound is accepted; the filter is then expected to
//! diverge and the runner halts at the first non-finite update.

use crate::config::Precision;
use crate::error::Quantity;
use crate::filter::{leaky_step, Proposal};
use crate::state::FilterState;

/// LMS update: `w' = (1−γ)·w + μ·e·x`.
#[derive(Debug, Clone, PartialEq)]
pub struct LmsUpdate {
    mu: f64,
    /// 1 − γ
    leak: f64,
    precision: Precision,
}

impl LmsUpdate {
    pub fn new(mu: f64, leakage: f64, precision: Precision) -> Self {
        Self {
            mu,
            leak: 1.0 - leakage,
            precision,
        }
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub(crate) fn update(
        &self,
        state: &FilterState,
        error: f64,
        next: &mut Proposal,
    ) -> Result<(), Quantity> {
        let x = state.delay_line.as_slice();
        leaky_step(
            &state.coefficients,
            self.leak,
            self.mu * error,
            x.iter().copied(),
            self.precision,
            &mut next.coefficients,
        );
        Ok(())
    }
}

/// Largest LMS step size that keeps the mean update stable for an input of
/// mean power `input_power`: `2 / (N·σx²)`.
///
/// ```
/// use adaptfilt::filter::lms_step_bound;
///
/// assert_eq!(lms_step_bound(4, 0.5), 1.0);
/// ```
pub fn lms_step_bound(order: usize, input_power: f64) -> f64 {
    2.0 / (order as f64 * input_power)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdaptationConfig;
    use alloc::vec;

    fn state_with(config: &AdaptationConfig, inputs: &[f64]) -> FilterState {
        let mut state = FilterState::initial(config);
        for &x in inputs {
            state.delay_line.push(x);
        }
        state
    }

    #[test]
    fn test_lms_update_step() {
        // (μ, e, x) -> μ·e·x starting from zero weights
        let cases = [
            (0.5, 2.0, [1.0, -1.0], [1.0, -1.0]),
            (1.0, 1.0, [5.0, 2.0], [5.0, 2.0]),
            (0.25, -4.0, [0.5, 0.25], [-0.5, -0.25]),
        ];
        for (mu, e, x, expected) in cases {
            let config = AdaptationConfig::lms(2, mu);
            // Delay line is newest first: push oldest first.
            let state = state_with(&config, &[x[1], x[0]]);
            let law = LmsUpdate::new(mu, 0.0, Precision::Double);
            let mut next = Proposal::for_config(&config);
            law.update(&state, e, &mut next).unwrap();
            assert_eq!(next.coefficients(), &expected);
        }
    }

    #[test]
    fn test_lms_leakage_decays_without_excitation() {
        let config = AdaptationConfig::lms(2, 0.1).with_initial_coefficients(vec![1.0, -2.0]);
        let state = FilterState::initial(&config);
        let law = LmsUpdate::new(0.1, 0.1, Precision::Double);
        let mut next = Proposal::for_config(&config);
        // Zero input: only the leak acts.
        law.update(&state, 3.0, &mut next).unwrap();
        assert!((next.coefficients()[0] - 0.9).abs() < 1e-15);
        assert!((next.coefficients()[1] + 1.8).abs() < 1e-15);
    }

    #[test]
    fn test_lms_zero_error_keeps_weights() {
        let config = AdaptationConfig::lms(3, 0.05).with_initial_coefficients(vec![0.5, 1.0, 0.5]);
        let state = state_with(&config, &[0.3, -0.2, 0.9]);
        let law = LmsUpdate::new(0.05, 0.0, Precision::Double);
        let mut next = Proposal::for_config(&config);
        law.update(&state, 0.0, &mut next).unwrap();
        assert_eq!(next.coefficients(), state.coefficients());
    }

    #[test]
    fn test_lms_step_bound() {
        assert_eq!(lms_step_bound(2, 1.0), 1.0);
        assert!((lms_step_bound(4, 1.0 / 3.0) - 1.5).abs() < 1e-12);
    }
}
