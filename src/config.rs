//! Adaptation and monitor configuration.
//!
//! A filter is built from one [`AdaptationConfig`]. Every parameter is
//! validated once, at construction or reconfiguration, and is never adjusted
//! afterwards. There are no process-wide defaults: the values below are the
//! documented defaults of the constructors.
//!
//! | Parameter | Default | Valid range |
//! |---|---|---|
//! | `step_size` (LMS, Sign-LMS) | 0.01 | (0, ∞) |
//! | `step_size` (NLMS) | 0.01 | (0, 2) |
//! | `forgetting_factor` (RLS) | 0.99 | (0, 1] |
//! | `regularization` (NLMS ε) | 1e-6 | (0, ∞) |
//! | `regularization` (RLS δ, `P(0) = I/δ`) | 1e-2 | (0, ∞) |
//! | `leakage` | 0 | [0, 1) |
//! | `symmetrize_interval` (RLS) | 1 | 0 disables |
//! | `order` | none | [1, 65536]; RLS [1, 4096] |
//! | `monitor.dwell`, `monitor.history` | 100, 256 | [1, 2^20] |
//!
//! # Example
//!
//! ```
//! use adaptfilt::{AdaptationConfig, Variant};
//!
//! let config = AdaptationConfig::nlms(16, 0.5)
//!     .with_regularization(1e-4)
//!     .with_leakage(1e-5);
//! assert_eq!(config.variant, Variant::Nlms);
//! assert!(config.validate().is_ok());
//! ```

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_STEP_SIZE: f64 = 0.01;
pub const DEFAULT_FORGETTING_FACTOR: f64 = 0.99;
pub const DEFAULT_NLMS_REGULARIZATION: f64 = 1e-6;
pub const DEFAULT_RLS_REGULARIZATION: f64 = 1e-2;

/// Largest accepted order for the LMS family.
pub const MAX_ORDER: usize = 1 << 16;
/// Largest accepted RLS order. `P` holds `N²` entries.
pub const MAX_RLS_ORDER: usize = 1 << 12;
/// Largest accepted `dwell` or `history` window.
pub const MAX_MONITOR_WINDOW: usize = 1 << 20;

/// Update law selected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Lms,
    Nlms,
    #[serde(rename = "sign_lms")]
    SignLms,
    Rls,
}

impl Variant {
    /// Tag used in the checkpoint header.
    pub fn tag(self) -> u8 {
        match self {
            Variant::Lms => 0,
            Variant::Nlms => 1,
            Variant::SignLms => 2,
            Variant::Rls => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Variant::Lms),
            1 => Some(Variant::Nlms),
            2 => Some(Variant::SignLms),
            3 => Some(Variant::Rls),
            _ => None,
        }
    }
}

/// Which factors of the LMS update term are replaced by their sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignMode {
    /// `w' = w + μ·sgn(e)·x`
    #[default]
    SignError,
    /// `w' = w + μ·e·sgn(x)`
    SignData,
    /// `w' = w + μ·sgn(e)·sgn(x)`
    SignSign,
}

/// Storage precision of coefficients and `P`.
///
/// Arithmetic always accumulates in `f64`. `Single` rounds the committed
/// state to `f32` after each update and checkpoints 4-byte elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Single,
    #[default]
    Double,
}

impl Precision {
    /// Element width in bytes.
    pub fn width(self) -> u8 {
        match self {
            Precision::Single => 4,
            Precision::Double => 8,
        }
    }

    #[inline]
    pub(crate) fn store(self, value: f64) -> f64 {
        match self {
            Precision::Single => value as f32 as f64,
            Precision::Double => value,
        }
    }
}

/// Divergence detection evaluated on every sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DivergenceConfig {
    /// Error magnitude that counts as excessive.
    pub bound: f64,
    /// Run length of excessive errors that raises a warning.
    pub consecutive: usize,
    /// Halt the filter with [`FilterError::Diverged`](crate::FilterError::Diverged).
    #[serde(default)]
    pub abort: bool,
}

/// Convergence monitor parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Exponential smoothing factor α of the running MSE.
    pub smoothing: f64,
    /// Number of samples the running MSE must stay below a threshold.
    pub dwell: usize,
    /// Number of recent |e| values retained for divergence queries.
    pub history: usize,
    pub divergence: Option<DivergenceConfig>,
    /// Track ‖w(t) − w(t−1)‖₂.
    pub track_coefficient_delta: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.01,
            dwell: 100,
            history: 256,
            divergence: None,
            track_coefficient_delta: false,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(ConfigError::Monitor {
                field: "smoothing",
                value: self.smoothing,
                range: "(0, 1]",
            });
        }
        for (field, window) in [("dwell", self.dwell), ("history", self.history)] {
            if window == 0 || window > MAX_MONITOR_WINDOW {
                return Err(ConfigError::Monitor {
                    field,
                    value: window as f64,
                    range: "[1, 2^20]",
                });
            }
        }
        if let Some(div) = &self.divergence {
            if !(div.bound.is_finite() && div.bound > 0.0) {
                return Err(ConfigError::Monitor {
                    field: "divergence.bound",
                    value: div.bound,
                    range: "(0, ∞)",
                });
            }
            if div.consecutive == 0 {
                return Err(ConfigError::Monitor {
                    field: "divergence.consecutive",
                    value: 0.0,
                    range: "[1, ∞)",
                });
            }
        }
        Ok(())
    }
}

/// Complete configuration of one filter instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationConfig {
    /// Number of taps N. Fixed for the lifetime of the filter.
    pub order: usize,
    pub variant: Variant,
    /// μ for the LMS family.
    #[serde(default = "default_step_size")]
    pub step_size: f64,
    /// λ for RLS.
    #[serde(default = "default_forgetting_factor")]
    pub forgetting_factor: f64,
    /// NLMS ε or RLS δ. `None` selects the variant default.
    #[serde(default)]
    pub regularization: Option<f64>,
    /// γ, applied as `w ← (1−γ)·w` before each additive update.
    #[serde(default)]
    pub leakage: f64,
    #[serde(default)]
    pub sign_mode: SignMode,
    /// Initial coefficients. Empty means all zero.
    #[serde(default)]
    pub initial_coefficients: Vec<f64>,
    #[serde(default)]
    pub numeric_precision: Precision,
    /// Re-symmetrize `P` every K RLS updates. 0 disables the safeguard.
    #[serde(default = "default_symmetrize_interval")]
    pub symmetrize_interval: usize,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

fn default_step_size() -> f64 {
    DEFAULT_STEP_SIZE
}

fn default_forgetting_factor() -> f64 {
    DEFAULT_FORGETTING_FACTOR
}

fn default_symmetrize_interval() -> usize {
    1
}

impl AdaptationConfig {
    fn base(order: usize, variant: Variant) -> Self {
        Self {
            order,
            variant,
            step_size: DEFAULT_STEP_SIZE,
            forgetting_factor: DEFAULT_FORGETTING_FACTOR,
            regularization: None,
            leakage: 0.0,
            sign_mode: SignMode::default(),
            initial_coefficients: Vec::new(),
            numeric_precision: Precision::default(),
            symmetrize_interval: 1,
            monitor: MonitorConfig::default(),
        }
    }

    pub fn lms(order: usize, step_size: f64) -> Self {
        Self {
            step_size,
            ..Self::base(order, Variant::Lms)
        }
    }

    pub fn nlms(order: usize, step_size: f64) -> Self {
        Self {
            step_size,
            ..Self::base(order, Variant::Nlms)
        }
    }

    pub fn sign_lms(order: usize, step_size: f64, mode: SignMode) -> Self {
        Self {
            step_size,
            sign_mode: mode,
            ..Self::base(order, Variant::SignLms)
        }
    }

    pub fn rls(order: usize, forgetting_factor: f64) -> Self {
        Self {
            forgetting_factor,
            ..Self::base(order, Variant::Rls)
        }
    }

    pub fn with_regularization(mut self, regularization: f64) -> Self {
        self.regularization = Some(regularization);
        self
    }

    pub fn with_leakage(mut self, leakage: f64) -> Self {
        self.leakage = leakage;
        self
    }

    pub fn with_initial_coefficients(mut self, coefficients: Vec<f64>) -> Self {
        self.initial_coefficients = coefficients;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.numeric_precision = precision;
        self
    }

    pub fn with_symmetrize_interval(mut self, interval: usize) -> Self {
        self.symmetrize_interval = interval;
        self
    }

    pub fn with_monitor(mut self, monitor: MonitorConfig) -> Self {
        self.monitor = monitor;
        self
    }

    /// Effective ε (NLMS) or δ (RLS); 0 for variants that do not use it.
    pub fn regularization(&self) -> f64 {
        match (self.regularization, self.variant) {
            (Some(value), _) => value,
            (None, Variant::Nlms) => DEFAULT_NLMS_REGULARIZATION,
            (None, Variant::Rls) => DEFAULT_RLS_REGULARIZATION,
            (None, _) => 0.0,
        }
    }

    /// Initial coefficient vector, zero-filled when none were given.
    pub fn initial_coefficients(&self) -> Vec<f64> {
        if self.initial_coefficients.is_empty() {
            alloc::vec![0.0; self.order]
        } else {
            self.initial_coefficients.clone()
        }
    }

    /// Check every parameter against its documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.order == 0 {
            return Err(ConfigError::ZeroOrder);
        }
        let max = match self.variant {
            Variant::Rls => MAX_RLS_ORDER,
            _ => MAX_ORDER,
        };
        if self.order > max {
            return Err(ConfigError::OrderTooLarge {
                variant: self.variant,
                order: self.order,
                max,
            });
        }

        let mu = self.step_size;
        match self.variant {
            Variant::Lms | Variant::SignLms => {
                if !(mu.is_finite() && mu > 0.0) {
                    return Err(ConfigError::StepSize {
                        variant: self.variant,
                        value: mu,
                        range: "(0, ∞)",
                    });
                }
            }
            Variant::Nlms => {
                if !(mu > 0.0 && mu < 2.0) {
                    return Err(ConfigError::StepSize {
                        variant: self.variant,
                        value: mu,
                        range: "(0, 2)",
                    });
                }
            }
            Variant::Rls => {
                let lambda = self.forgetting_factor;
                if !(lambda > 0.0 && lambda <= 1.0) {
                    return Err(ConfigError::ForgettingFactor(lambda));
                }
            }
        }

        let reg = self.regularization();
        let reg_ok = match self.variant {
            Variant::Nlms | Variant::Rls => reg.is_finite() && reg > 0.0,
            Variant::Lms | Variant::SignLms => reg.is_finite() && reg >= 0.0,
        };
        if !reg_ok {
            let range = match self.variant {
                Variant::Nlms | Variant::Rls => "(0, ∞)",
                _ => "[0, ∞)",
            };
            return Err(ConfigError::Regularization {
                variant: self.variant,
                value: reg,
                range,
            });
        }

        if !(self.leakage >= 0.0 && self.leakage < 1.0) {
            return Err(ConfigError::Leakage(self.leakage));
        }

        if !self.initial_coefficients.is_empty() {
            if self.initial_coefficients.len() != self.order {
                return Err(ConfigError::InitialLength {
                    expected: self.order,
                    actual: self.initial_coefficients.len(),
                });
            }
            if let Some(index) = self.initial_coefficients.iter().position(|w| !w.is_finite()) {
                return Err(ConfigError::InitialNotFinite { index });
            }
        }

        self.monitor.validate()
    }

    /// Parse and validate a TOML document.
    ///
    /// ```
    /// use adaptfilt::{AdaptationConfig, Variant};
    ///
    /// let config = AdaptationConfig::from_toml_str(r#"
    ///     order = 8
    ///     variant = "rls"
    ///     forgetting_factor = 0.995
    ///     regularization = 0.01
    ///
    ///     [monitor]
    ///     dwell = 50
    /// "#).unwrap();
    /// assert_eq!(config.variant, Variant::Rls);
    /// assert_eq!(config.monitor.dwell, 50);
    /// ```
    #[cfg(feature = "std")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        use alloc::string::ToString;

        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
