//! NLMS (Normalized Least Mean Squares) update law.
//!
//! NLMS normalizes the step size by the energy of the delay line, which makes
//! stability independent of the input power.
//!
//! # Algorithm
//!
//! ```text
//! y(n) = w^T(n-1) * x(n)
//! e(n) = d(n) - y(n)
//! w(n) = (1-γ) * w(n-1) + [μ/(ε + ||x(n)||²)] * e(n) * x(n)
//! ```
//!
//! where:
//! - `||x(n)||²` = input energy (sum of squared samples in delay line)
//! - `ε` = regularization, keeps the step bounded when `||x||²` is near zero
//! - `μ` = normalized step size, stable for μ ∈ (0, 2)

use crate::config::Precision;
use crate::error::Quantity;
use crate::filter::{leaky_step, Proposal};
use crate::state::FilterState;

/// NLMS update: `w' = (1−γ)·w + μ/(ε + ‖x‖²)·e·x`.
#[derive(Debug, Clone, PartialEq)]
pub struct NlmsUpdate {
    mu: f64,
    epsilon: f64,
    leak: f64,
    precision: Precision,
}

impl NlmsUpdate {
    pub fn new(mu: f64, epsilon: f64, leakage: f64, precision: Precision) -> Self {
        Self {
            mu,
            epsilon,
            leak: 1.0 - leakage,
            precision,
        }
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub(crate) fn update(
        &self,
        state: &FilterState,
        error: f64,
        next: &mut Proposal,
    ) -> Result<(), Quantity> {
        let x = state.delay_line.as_slice();
        let norm_mu = self.mu / (self.epsilon + state.delay_line.energy());
        leaky_step(
            &state.coefficients,
            self.leak,
            norm_mu * error,
            x.iter().copied(),
            self.precision,
            &mut next.coefficients,
        );
        Ok(())
    }
}
