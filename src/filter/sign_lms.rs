//! Sign-LMS update laws.
//!
//! Replacing the error, the data, or both by their sign trades convergence
//! speed for robustness against outliers and cheaper arithmetic. `sgn(0) = 0`,
//! so a zero error or a zero tap never moves a weight.

use crate::config::{Precision, SignMode};
use crate::error::Quantity;
use crate::filter::{leaky_step, Proposal};
use crate::state::FilterState;

#[inline]
fn sgn(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Sign-LMS update with the configured [`SignMode`].
#[derive(Debug, Clone, PartialEq)]
pub struct SignLmsUpdate {
    mu: f64,
    mode: SignMode,
    leak: f64,
    precision: Precision,
}

impl SignLmsUpdate {
    pub fn new(mu: f64, mode: SignMode, leakage: f64, precision: Precision) -> Self {
        Self {
            mu,
            mode,
            leak: 1.0 - leakage,
            precision,
        }
    }

    pub fn mode(&self) -> SignMode {
        self.mode
    }

    pub(crate) fn update(
        &self,
        state: &FilterState,
        error: f64,
        next: &mut Proposal,
    ) -> Result<(), Quantity> {
        let x = state.delay_line.as_slice();
        let w = &state.coefficients;
        let out = &mut next.coefficients;
        match self.mode {
            SignMode::SignError => leaky_step(
                w,
                self.leak,
                self.mu * sgn(error),
                x.iter().copied(),
                self.precision,
                out,
            ),
            SignMode::SignData => leaky_step(
                w,
                self.leak,
                self.mu * error,
                x.iter().map(|&v| sgn(v)),
                self.precision,
                out,
            ),
            SignMode::SignSign => leaky_step(
                w,
                self.leak,
                self.mu * sgn(error),
                x.iter().map(|&v| sgn(v)),
                self.precision,
                out,
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdaptationConfig;

    fn run(mode: SignMode, error: f64) -> [f64; 3] {
        let config = AdaptationConfig::sign_lms(3, 0.1, mode);
        let mut state = FilterState::initial(&config);
        // Newest first: [2.0, 0.0, -0.5]
        for x in [-0.5, 0.0, 2.0] {
            state.delay_line.push(x);
        }
        let law = SignLmsUpdate::new(0.1, mode, 0.0, Precision::Double);
        let mut next = Proposal::for_config(&config);
        law.update(&state, error, &mut next).unwrap();
        [next.coefficients[0], next.coefficients[1], next.coefficients[2]]
    }

    #[test]
    fn test_sign_error() {
        let w = run(SignMode::SignError, -8.0);
        assert_eq!(w, [-0.2, 0.0, 0.05]);
    }

    #[test]
    fn test_sign_data() {
        let w = run(SignMode::SignData, 3.0);
        assert!((w[0] - 0.3).abs() < 1e-15);
        assert_eq!(w[1], 0.0);
        assert!((w[2] + 0.3).abs() < 1e-15);
    }

    #[test]
    fn test_sign_sign() {
        let w = run(SignMode::SignSign, 1e6);
        assert_eq!(w, [0.1, 0.0, -0.1]);
    }

    #[test]
    fn test_outlier_step_is_bounded() {
        // A huge error moves sign-error weights by μ·|x| only.
        let w = run(SignMode::SignError, 1e12);
        assert_eq!(w, [0.2, 0.0, -0.05]);
    }
}
