//! Convergence and divergence monitoring.
//!
//! [`ConvergenceMonitor`] only observes: it is fed `(index, error, Δw)` after
//! every committed update and never touches the filter state. It keeps an
//! exponentially weighted running MSE,
//!
//! ```text
//! m(0) = e(0)²
//! m(n) = (1 − α)·m(n−1) + α·e(n)²
//! ```
//!
//! plus short histories of `m` and `|e|` that back the convergence and
//! divergence queries.
//!
//! # Example
//!
//! ```
//! use adaptfilt::config::MonitorConfig;
//! use adaptfilt::monitor::ConvergenceMonitor;
//!
//! let mut monitor = ConvergenceMonitor::new(MonitorConfig {
//!     dwell: 3,
//!     ..MonitorConfig::default()
//! });
//! for n in 0..3 {
//!     monitor.observe(n, 1e-4, None);
//! }
//! assert!(monitor.has_converged(1e-3));
//! assert_eq!(monitor.is_diverging(0.5, 2), Some(false));
//! ```

use alloc::vec;
use alloc::vec::Vec;

use crate::config::MonitorConfig;

/// Sustained, still finite, error growth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DivergenceWarning {
    /// Sample index at which the excessive run reached its configured length.
    pub index: u64,
    /// |e| at that sample.
    pub magnitude: f64,
}

/// Fixed-capacity history of the most recent values, newest last.
#[derive(Debug, Clone, PartialEq)]
struct History {
    buffer: Vec<f64>,
    head: usize,
    len: usize,
}

impl History {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            head: 0,
            len: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.buffer.len()
    }

    fn push(&mut self, value: f64) {
        self.buffer[self.head] = value;
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
    }

    /// The `count` newest values, newest first. `None` if fewer are retained.
    fn recent(&self, count: usize) -> Option<impl Iterator<Item = f64> + '_> {
        if count > self.len {
            return None;
        }
        let cap = self.capacity();
        Some((1..=count).map(move |k| self.buffer[(self.head + cap - k) % cap]))
    }

    fn latest(&self) -> Option<f64> {
        self.recent(1).and_then(|mut it| it.next())
    }

    fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

/// Running-MSE and error-magnitude observer for one filter instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceMonitor {
    config: MonitorConfig,
    running_mse: f64,
    /// Running MSE of the last `dwell` samples.
    mse_history: History,
    /// |e| of the last `history` samples.
    magnitudes: History,
    observed: u64,
    /// Length of the current run above the configured divergence bound.
    excess_run: usize,
    /// A warning was raised for the current excessive run.
    latched: bool,
    warning: Option<DivergenceWarning>,
    warnings: u64,
    coefficient_delta: Option<f64>,
}

impl ConvergenceMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            mse_history: History::new(config.dwell),
            magnitudes: History::new(config.history),
            config,
            running_mse: 0.0,
            observed: 0,
            excess_run: 0,
            latched: false,
            warning: None,
            warnings: 0,
            coefficient_delta: None,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Records one committed sample.
    ///
    /// Returns a warning the first time the configured divergence check
    /// trips within an episode of consecutive excessive errors.
    pub fn observe(
        &mut self,
        index: u64,
        error: f64,
        coefficient_delta: Option<f64>,
    ) -> Option<DivergenceWarning> {
        let squared = error * error;
        self.running_mse = if self.observed == 0 {
            squared
        } else {
            let alpha = self.config.smoothing;
            (1.0 - alpha) * self.running_mse + alpha * squared
        };
        self.observed += 1;
        self.mse_history.push(self.running_mse);

        let magnitude = libm::fabs(error);
        self.magnitudes.push(magnitude);

        if self.config.track_coefficient_delta {
            self.coefficient_delta = coefficient_delta;
        }

        let divergence = self.config.divergence?;
        if magnitude <= divergence.bound {
            self.excess_run = 0;
            self.latched = false;
            return None;
        }
        self.excess_run += 1;
        if self.latched || self.excess_run < divergence.consecutive {
            return None;
        }

        self.latched = true;
        self.warnings += 1;
        let warning = DivergenceWarning { index, magnitude };
        self.warning = Some(warning);
        tracing::warn!(
            index,
            magnitude,
            bound = divergence.bound,
            consecutive = divergence.consecutive,
            "adaptive filter error diverging"
        );
        Some(warning)
    }

    /// Exponentially weighted mean-square error; 0 before the first sample.
    #[inline]
    pub fn running_mse(&self) -> f64 {
        self.running_mse
    }

    /// True once the running MSE has stayed below `threshold` for the
    /// configured dwell count.
    pub fn has_converged(&self, threshold: f64) -> bool {
        match self.mse_history.recent(self.config.dwell) {
            Some(mut window) => window.all(|m| m < threshold),
            None => false,
        }
    }

    /// Whether each of the last `consecutive` error magnitudes exceeds
    /// `bound`.
    ///
    /// `Some(false)` for `consecutive == 0` or while fewer than `consecutive`
    /// samples have been observed. `None` when `consecutive` is longer than
    /// the retained `history`, since that window cannot be answered.
    pub fn is_diverging(&self, bound: f64, consecutive: usize) -> Option<bool> {
        if consecutive > self.magnitudes.capacity() {
            return None;
        }
        if consecutive == 0 {
            return Some(false);
        }
        Some(match self.magnitudes.recent(consecutive) {
            Some(mut window) => window.all(|m| m > bound),
            None => false,
        })
    }

    /// Most recent warning raised by the configured divergence check.
    pub fn divergence_warning(&self) -> Option<DivergenceWarning> {
        self.warning
    }

    /// Number of divergence episodes detected.
    pub fn warning_count(&self) -> u64 {
        self.warnings
    }

    /// ‖w(t) − w(t−1)‖₂ of the latest update, when tracking is enabled.
    pub fn coefficient_delta(&self) -> Option<f64> {
        self.coefficient_delta
    }

    /// |e| of the latest sample.
    pub fn last_error_magnitude(&self) -> Option<f64> {
        self.magnitudes.latest()
    }

    pub fn samples_observed(&self) -> u64 {
        self.observed
    }

    pub fn reset(&mut self) {
        self.running_mse = 0.0;
        self.mse_history.clear();
        self.magnitudes.clear();
        self.observed = 0;
        self.excess_run = 0;
        self.latched = false;
        self.warning = None;
        self.warnings = 0;
        self.coefficient_delta = None;
    }
}
