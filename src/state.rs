//! Filter state: coefficients, delay line and the RLS inverse correlation.

use alloc::vec::Vec;

use crate::config::{AdaptationConfig, Variant};
use crate::delay_line::DelayLine;
use crate::linalg::SquareMatrix;

/// Live state of one filter instance.
///
/// `coefficients.len() == delay_line.len() == N` for the whole lifetime.
/// The inverse correlation matrix is present exactly when the variant is RLS.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub(crate) coefficients: Vec<f64>,
    pub(crate) delay_line: DelayLine,
    pub(crate) inverse_correlation: Option<SquareMatrix>,
}

impl FilterState {
    /// Initial state for a validated configuration.
    pub(crate) fn initial(config: &AdaptationConfig) -> Self {
        let precision = config.numeric_precision;
        let coefficients = config
            .initial_coefficients()
            .into_iter()
            .map(|w| precision.store(w))
            .collect();
        Self {
            coefficients,
            delay_line: DelayLine::new(config.order),
            inverse_correlation: initial_inverse_correlation(config),
        }
    }

    /// Coefficients, tap `i` weighting the sample `i` steps old.
    #[inline]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    #[inline]
    pub fn delay_line(&self) -> &DelayLine {
        &self.delay_line
    }

    #[inline]
    pub fn inverse_correlation(&self) -> Option<&SquareMatrix> {
        self.inverse_correlation.as_ref()
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.coefficients.len()
    }

    /// y = wᵗx over the current delay line. Pure read.
    #[inline]
    pub fn predict(&self) -> f64 {
        dot(&self.coefficients, self.delay_line.as_slice())
    }

    /// Independent copy of the adaptive state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            coefficients: self.coefficients.clone(),
            inverse_correlation: self.inverse_correlation.clone(),
        }
    }
}

/// `P(0) = I/δ` for RLS, nothing otherwise.
pub(crate) fn initial_inverse_correlation(config: &AdaptationConfig) -> Option<SquareMatrix> {
    match config.variant {
        Variant::Rls => Some(SquareMatrix::scaled_identity(
            config.order,
            config.numeric_precision.store(1.0 / config.regularization()),
        )),
        _ => None,
    }
}

#[inline]
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(a, b)| a * b).sum()
}

/// Immutable copy of coefficients (and `P` for RLS) taken at one instant.
///
/// A snapshot shares nothing with the filter it came from; further
/// processing never changes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    coefficients: Vec<f64>,
    inverse_correlation: Option<SquareMatrix>,
}

impl Snapshot {
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn inverse_correlation(&self) -> Option<&SquareMatrix> {
        self.inverse_correlation.as_ref()
    }

    pub fn order(&self) -> usize {
        self.coefficients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Precision;
    use alloc::vec;

    #[test]
    fn test_initial_zero_state() {
        let state = FilterState::initial(&AdaptationConfig::lms(4, 0.01));
        assert_eq!(state.coefficients(), &[0.0; 4]);
        assert_eq!(state.delay_line().as_slice(), &[0.0; 4]);
        assert!(state.inverse_correlation().is_none());
        assert_eq!(state.predict(), 0.0);
    }

    #[test]
    fn test_initial_rls_matrix() {
        let config = AdaptationConfig::rls(3, 0.99).with_regularization(0.5);
        let state = FilterState::initial(&config);
        let p = state.inverse_correlation().unwrap();
        assert_eq!(p.dim(), 3);
        assert_eq!(p.get(0, 0), 2.0);
        assert_eq!(p.get(1, 2), 0.0);
    }

    #[test]
    fn test_initial_coefficients_rounded_in_single_precision() {
        let config = AdaptationConfig::lms(2, 0.01)
            .with_initial_coefficients(vec![0.1, 0.2])
            .with_precision(Precision::Single);
        let state = FilterState::initial(&config);
        assert_eq!(state.coefficients(), &[0.1f32 as f64, 0.2f32 as f64]);
    }

    #[test]
    fn test_predict_tap_alignment() {
        let config = AdaptationConfig::lms(3, 0.01).with_initial_coefficients(vec![1.0, 10.0, 100.0]);
        let mut state = FilterState::initial(&config);
        state.delay_line.push(1.0);
        state.delay_line.push(2.0);
        state.delay_line.push(3.0);
        // Newest sample (3) meets tap 0, oldest (1) meets tap 2.
        assert_eq!(state.predict(), 3.0 + 20.0 + 100.0);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let config = AdaptationConfig::rls(2, 0.99);
        let mut state = FilterState::initial(&config);
        let snap = state.snapshot();
        state.coefficients[0] = 5.0;
        if let Some(p) = state.inverse_correlation.as_mut() {
            p.set(0, 0, -1.0);
        }
        assert_eq!(snap.coefficients(), &[0.0, 0.0]);
        assert_eq!(snap.inverse_correlation().unwrap().get(0, 0), 100.0);
        assert_eq!(snap.order(), 2);
    }
}
