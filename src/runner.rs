//! Streaming runner: the public processing API of one filter instance.
//!
//! Per sample the runner pushes the input into the delay line, predicts with
//! the pre-update coefficients, forms `e = d − y`, asks the adaptation engine
//! for the next state, commits it and feeds the monitor. A failed step is
//! rolled back completely, including the delay-line push, so the state seen
//! afterwards is exactly the last valid one.
//!
//! # Example
//!
//! ```
//! use adaptfilt::{AdaptationConfig, AdaptiveFilter};
//!
//! let mut filter = AdaptiveFilter::new(AdaptationConfig::nlms(2, 0.5)).unwrap();
//! let out = filter.process_one(1.0, 0.5).unwrap();
//! assert_eq!(out.prediction, 0.0);
//! assert_eq!(out.error, 0.5);
//! ```

use alloc::vec::Vec;

use crate::checkpoint::{ByteOrder, Checkpoint};
use crate::config::{AdaptationConfig, Variant};
use crate::error::{CheckpointError, ConfigError, FilterError, Quantity, Result};
use crate::filter::{AdaptationEngine, Proposal};
use crate::linalg::SquareMatrix;
use crate::monitor::ConvergenceMonitor;
use crate::state::{initial_inverse_correlation, FilterState, Snapshot};

/// Output of a single adaptive filter step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveOutput {
    /// Prediction from the pre-update coefficients.
    pub prediction: f64,
    /// `desired − prediction`
    pub error: f64,
}

/// Outputs of [`AdaptiveFilter::process_batch`], in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutput {
    pub predictions: Vec<f64>,
    pub errors: Vec<f64>,
}

impl BatchOutput {
    fn with_capacity(len: usize) -> Self {
        Self {
            predictions: Vec::with_capacity(len),
            errors: Vec::with_capacity(len),
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Lifecycle of a filter instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStatus {
    /// Built, reset or restored; nothing processed since.
    Constructed,
    Running,
    /// Stopped by a numerical instability or an aborting divergence check.
    Halted,
}

/// One adaptive filter instance.
///
/// Instances own all of their state and share nothing, so independent
/// channels can run on independent threads. Access to a single instance
/// must be serialized by the caller.
#[derive(Debug, Clone)]
pub struct AdaptiveFilter {
    config: AdaptationConfig,
    state: FilterState,
    engine: AdaptationEngine,
    proposal: Proposal,
    monitor: ConvergenceMonitor,
    status: FilterStatus,
    /// Samples committed since construction, reset or restore.
    samples: u64,
    /// Index of the sample that halted the filter.
    halted_at: Option<u64>,
}

impl AdaptiveFilter {
    /// Builds a filter from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Config`] if any parameter is out of range.
    pub fn new(config: AdaptationConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            order = config.order,
            variant = ?config.variant,
            precision = ?config.numeric_precision,
            "adaptive filter constructed"
        );
        Ok(Self {
            state: FilterState::initial(&config),
            engine: AdaptationEngine::from_config(&config),
            proposal: Proposal::for_config(&config),
            monitor: ConvergenceMonitor::new(config.monitor.clone()),
            config,
            status: FilterStatus::Constructed,
            samples: 0,
            halted_at: None,
        })
    }

    /// Processes one `(input, desired)` pair.
    ///
    /// # Errors
    ///
    /// - [`FilterError::Halted`] if the filter is halted; nothing is done.
    /// - [`FilterError::NonFiniteSample`] for a NaN or infinite sample; the
    ///   sample is ignored and the filter keeps running.
    /// - [`FilterError::NumericalInstability`] if the update would produce a
    ///   non-finite value; the update is discarded and the filter halts.
    /// - [`FilterError::Diverged`] if the configured divergence check trips
    ///   with `abort` set; the update is kept and the filter halts.
    pub fn process_one(&mut self, input: f64, desired: f64) -> Result<AdaptiveOutput> {
        self.ensure_not_halted()?;
        let index = self.samples;
        if !input.is_finite() || !desired.is_finite() {
            return Err(FilterError::NonFiniteSample { index });
        }
        self.status = FilterStatus::Running;

        let evicted = self.state.delay_line.push(input);
        let prediction = self.state.predict();
        let error = desired - prediction;
        if !prediction.is_finite() || !error.is_finite() {
            self.state.delay_line.undo_push(evicted);
            return Err(self.halt_unstable(index, Quantity::Prediction));
        }

        if let Err(quantity) = self.engine.update(&self.state, error, &mut self.proposal) {
            self.state.delay_line.undo_push(evicted);
            return Err(self.halt_unstable(index, quantity));
        }

        let delta = self
            .config
            .monitor
            .track_coefficient_delta
            .then(|| self.proposal_delta());
        self.commit();
        self.samples += 1;

        if let Some(warning) = self.monitor.observe(index, error, delta) {
            if self.config.monitor.divergence.is_some_and(|d| d.abort) {
                self.status = FilterStatus::Halted;
                self.halted_at = Some(index);
                tracing::error!(index, magnitude = warning.magnitude, "adaptive filter aborted on divergence");
                return Err(FilterError::Diverged {
                    index,
                    magnitude: warning.magnitude,
                });
            }
        }

        Ok(AdaptiveOutput { prediction, error })
    }

    /// Processes equal-length sequences in order.
    ///
    /// Results are identical to calling [`process_one`](Self::process_one)
    /// on each pair in turn. Lengths are checked before any sample is
    /// touched. If a sample fails, the samples before it stay committed and
    /// the error names the failing index.
    pub fn process_batch(&mut self, inputs: &[f64], desired: &[f64]) -> Result<BatchOutput> {
        if inputs.len() != desired.len() {
            return Err(FilterError::LengthMismatch {
                inputs: inputs.len(),
                desired: desired.len(),
            });
        }
        self.ensure_not_halted()?;

        let mut out = BatchOutput::with_capacity(inputs.len());
        for (&x, &d) in inputs.iter().zip(desired) {
            let step = self.process_one(x, d)?;
            out.predictions.push(step.prediction);
            out.errors.push(step.error);
        }
        Ok(out)
    }

    /// Prediction for a hypothetical next `input`, without adapting or
    /// touching the delay line.
    pub fn predict(&self, input: f64) -> f64 {
        let w = &self.state.coefficients;
        let x = self.state.delay_line.as_slice();
        // Same summation order as the prediction the next step makes.
        w.iter()
            .zip(core::iter::once(&input).chain(&x[..w.len() - 1]))
            .map(|(w, x)| w * x)
            .sum()
    }

    /// Independent copy of the coefficients (and `P` for RLS).
    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// Restores the initial state of the current configuration and clears
    /// the halt.
    pub fn reset(&mut self) {
        self.state = FilterState::initial(&self.config);
        self.engine.reset();
        self.monitor.reset();
        self.status = FilterStatus::Constructed;
        self.samples = 0;
        self.halted_at = None;
        tracing::debug!(order = self.config.order, "adaptive filter reset");
    }

    /// Swaps in a new configuration, effective from the next sample.
    ///
    /// The order cannot change. Coefficients and the delay line are kept; a
    /// change of variant re-initialises `P`. A changed monitor configuration
    /// restarts the monitor. The halt status is not affected.
    ///
    /// # Errors
    ///
    /// [`FilterError::Config`] if the configuration is invalid or changes
    /// the order. The filter is unchanged in that case.
    pub fn reconfigure(&mut self, config: AdaptationConfig) -> Result<()> {
        config.validate()?;
        if config.order != self.config.order {
            return Err(ConfigError::OrderChanged {
                current: self.config.order,
                requested: config.order,
            }
            .into());
        }

        let precision = config.numeric_precision;
        if config.variant != self.config.variant {
            self.state.inverse_correlation = initial_inverse_correlation(&config);
            self.proposal = Proposal::for_config(&config);
        }
        for w in self.state.coefficients.iter_mut() {
            *w = precision.store(*w);
        }
        if let Some(p) = self.state.inverse_correlation.as_mut() {
            for v in p.as_mut_slice() {
                *v = precision.store(*v);
            }
        }
        self.engine = AdaptationEngine::from_config(&config);
        if config.monitor != self.config.monitor {
            self.monitor = ConvergenceMonitor::new(config.monitor.clone());
        }

        tracing::debug!(
            from = ?self.config.variant,
            to = ?config.variant,
            "adaptive filter reconfigured"
        );
        self.config = config;
        Ok(())
    }

    /// Serializes coefficients (and `P`) in the checkpoint format.
    ///
    /// # Errors
    ///
    /// [`FilterError::Checkpoint`] if the order does not fit the header.
    pub fn checkpoint(&self, byte_order: ByteOrder) -> Result<Vec<u8>> {
        let checkpoint = Checkpoint {
            variant: self.config.variant,
            precision: self.config.numeric_precision,
            coefficients: self.state.coefficients.clone(),
            inverse_correlation: self
                .state
                .inverse_correlation
                .as_ref()
                .map(|p| p.as_slice().to_vec()),
        };
        Ok(checkpoint.to_bytes(byte_order)?)
    }

    /// Loads a checkpoint written by a filter with the same variant, order
    /// and precision.
    ///
    /// The delay line and monitor are cleared and the filter returns to
    /// [`FilterStatus::Constructed`].
    ///
    /// # Errors
    ///
    /// [`FilterError::Checkpoint`] if the bytes are malformed or
    /// incompatible. The filter is unchanged in that case.
    pub fn restore(&mut self, bytes: &[u8]) -> Result<()> {
        let checkpoint = Checkpoint::from_bytes(bytes)?;
        if checkpoint.variant != self.config.variant {
            return Err(CheckpointError::VariantMismatch {
                expected: self.config.variant,
                found: checkpoint.variant,
            }
            .into());
        }
        let n = self.config.order;
        if checkpoint.order() != n {
            return Err(CheckpointError::OrderMismatch {
                expected: n,
                found: checkpoint.order(),
            }
            .into());
        }
        let width = self.config.numeric_precision.width();
        if checkpoint.precision.width() != width {
            return Err(CheckpointError::WidthMismatch {
                expected: width,
                found: checkpoint.precision.width(),
            }
            .into());
        }

        let inverse_correlation = match (self.config.variant, checkpoint.inverse_correlation) {
            (Variant::Rls, Some(data)) => {
                let actual = data.len();
                let p = SquareMatrix::from_row_major(n, data).map_err(|_| CheckpointError::Length {
                    expected: n * n,
                    actual,
                })?;
                Some(p)
            }
            _ => None,
        };

        self.state.coefficients = checkpoint.coefficients;
        self.state.inverse_correlation = inverse_correlation;
        self.state.delay_line.clear();
        self.engine.reset();
        self.monitor.reset();
        self.status = FilterStatus::Constructed;
        self.samples = 0;
        self.halted_at = None;
        tracing::debug!(order = n, variant = ?self.config.variant, "adaptive filter restored");
        Ok(())
    }

    pub fn config(&self) -> &AdaptationConfig {
        &self.config
    }

    pub fn order(&self) -> usize {
        self.config.order
    }

    pub fn status(&self) -> FilterStatus {
        self.status
    }

    /// Samples committed since construction, reset or restore.
    pub fn samples_processed(&self) -> u64 {
        self.samples
    }

    pub fn coefficients(&self) -> &[f64] {
        self.state.coefficients()
    }

    pub fn inverse_correlation(&self) -> Option<&SquareMatrix> {
        self.state.inverse_correlation()
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn monitor(&self) -> &ConvergenceMonitor {
        &self.monitor
    }

    fn ensure_not_halted(&self) -> Result<()> {
        match (self.status, self.halted_at) {
            (FilterStatus::Halted, Some(index)) => Err(FilterError::Halted { index }),
            (FilterStatus::Halted, None) => Err(FilterError::Halted { index: self.samples }),
            _ => Ok(()),
        }
    }

    fn halt_unstable(&mut self, index: u64, quantity: Quantity) -> FilterError {
        self.status = FilterStatus::Halted;
        self.halted_at = Some(index);
        tracing::error!(index, %quantity, variant = ?self.config.variant, "numerical instability, filter halted");
        FilterError::NumericalInstability { index, quantity }
    }

    /// ‖w' − w‖₂ of the pending proposal.
    fn proposal_delta(&self) -> f64 {
        let sum: f64 = self
            .proposal
            .coefficients
            .iter()
            .zip(&self.state.coefficients)
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        libm::sqrt(sum)
    }

    fn commit(&mut self) {
        core::mem::swap(&mut self.state.coefficients, &mut self.proposal.coefficients);
        if let (Some(p), Some(next)) = (
            self.state.inverse_correlation.as_mut(),
            self.proposal.inverse_correlation.as_mut(),
        ) {
            core::mem::swap(p, next);
        }
        self.engine.committed();
    }
}
