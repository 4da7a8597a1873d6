//! Error types for adaptive filter construction and streaming.
//!
//! Configuration and length errors are detected before any state is touched.
//! Numerical failures are reported at the exact stream index where they occur
//! and leave the last valid state in place.

use core::fmt;

use thiserror::Error;

use crate::config::Variant;

/// Result type for adaptive filter operations.
pub type Result<T> = core::result::Result<T, FilterError>;

/// Errors raised by [`AdaptiveFilter`](crate::AdaptiveFilter) and its collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Invalid construction or reconfiguration parameters.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Batch called with input and desired sequences of different lengths.
    #[error("length mismatch: {inputs} input samples, {desired} desired samples")]
    LengthMismatch { inputs: usize, desired: usize },

    /// An update produced a non-finite value. The update was discarded.
    #[error("numerical instability at sample {index}: non-finite {quantity}")]
    NumericalInstability { index: u64, quantity: Quantity },

    /// The filter is halted and rejects processing until reset.
    #[error("filter halted at sample {index}; reset() is required")]
    Halted { index: u64 },

    /// A non-finite input or desired sample was supplied.
    #[error("non-finite sample at index {index}")]
    NonFiniteSample { index: u64 },

    /// Sustained error growth with abort-on-divergence enabled.
    #[error("divergence at sample {index}: |e| = {magnitude}")]
    Diverged { index: u64, magnitude: f64 },

    /// A checkpoint could not be decoded or does not match this filter.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

/// The piece of state that became non-finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Prediction,
    Coefficients,
    InverseCorrelation,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quantity::Prediction => "prediction",
            Quantity::Coefficients => "coefficient",
            Quantity::InverseCorrelation => "inverse correlation entry",
        };
        f.write_str(name)
    }
}

/// Rejected configuration values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("filter order must be at least 1")]
    ZeroOrder,

    #[error("filter order {order} exceeds the {variant:?} limit of {max}")]
    OrderTooLarge {
        variant: Variant,
        order: usize,
        max: usize,
    },

    #[error("order cannot change from {current} to {requested} after construction")]
    OrderChanged { current: usize, requested: usize },

    #[error("step size {value} outside {range} for {variant:?}")]
    StepSize {
        variant: Variant,
        value: f64,
        range: &'static str,
    },

    #[error("forgetting factor {0} outside (0, 1]")]
    ForgettingFactor(f64),

    #[error("regularization {value} outside {range} for {variant:?}")]
    Regularization {
        variant: Variant,
        value: f64,
        range: &'static str,
    },

    #[error("leakage {0} outside [0, 1)")]
    Leakage(f64),

    #[error("{expected} initial coefficients required, got {actual}")]
    InitialLength { expected: usize, actual: usize },

    #[error("initial coefficient {index} is not finite")]
    InitialNotFinite { index: usize },

    #[error("monitor {field} = {value} outside {range}")]
    Monitor {
        field: &'static str,
        value: f64,
        range: &'static str,
    },

    #[error("could not parse configuration: {0}")]
    Parse(alloc::string::String),
}

/// Checkpoint decoding and compatibility failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckpointError {
    #[error("not a checkpoint (bad magic)")]
    BadMagic,

    #[error("unknown byte order marker {0:#04x}")]
    ByteOrder(u8),

    #[error("unsupported checkpoint version {0}")]
    Version(u8),

    #[error("unknown variant tag {0}")]
    UnknownVariant(u8),

    #[error("unsupported element width {0}")]
    ElementWidth(u8),

    #[error("checkpoint holds {found:?} state, filter runs {expected:?}")]
    VariantMismatch { expected: Variant, found: Variant },

    #[error("checkpoint order {found} does not match filter order {expected}")]
    OrderMismatch { expected: usize, found: usize },

    #[error("checkpoint element width {found} does not match configured {expected}")]
    WidthMismatch { expected: u8, found: u8 },

    #[error("checkpoint payload is {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },

    #[error("checkpoint contains a non-finite value")]
    NonFinite,

    #[error("order {0} does not fit the 32-bit checkpoint header")]
    OrderTooLarge(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_instability_message_names_index() {
        let err = FilterError::NumericalInstability {
            index: 42,
            quantity: Quantity::InverseCorrelation,
        };
        let msg = err.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("inverse correlation"));
    }

    #[test]
    fn test_config_error_converts() {
        let err: FilterError = ConfigError::Leakage(1.5).into();
        assert_eq!(err, FilterError::Config(ConfigError::Leakage(1.5)));
        assert_eq!(err.to_string(), "leakage 1.5 outside [0, 1)");
    }
}
