//! Streaming adaptive FIR filters: LMS, NLMS, Sign-LMS and RLS.
//!
//! An [`AdaptiveFilter`] consumes `(input, desired)` sample pairs and adapts
//! N coefficients so that the filtered input tracks the desired signal. Use
//! cases are echo and noise cancellation, channel equalization and system
//! identification.
//!
//! Each step is strictly causal: the prediction uses the coefficients as
//! they were before the step's own update. Updates are atomic; if an update
//! would produce a non-finite coefficient (or RLS matrix entry) it is
//! discarded, the error names the sample index, and the filter halts until
//! [`AdaptiveFilter::reset`].
//!
//! # Example
//!
//! ```
//! use adaptfilt::{AdaptationConfig, AdaptiveFilter};
//!
//! // Identify a 2-tap system.
//! let plant = [0.6, -0.2];
//! let mut filter = AdaptiveFilter::new(AdaptationConfig::rls(2, 0.99)).unwrap();
//! let mut prev = 0.0;
//! for n in 0..200 {
//!     let x = ((n * 7919) % 101) as f64 / 50.0 - 1.0;
//!     let d = plant[0] * x + plant[1] * prev;
//!     filter.process_one(x, d).unwrap();
//!     prev = x;
//! }
//! let w = filter.coefficients();
//! assert!((w[0] - 0.6).abs() < 1e-3 && (w[1] + 0.2).abs() < 1e-3);
//! ```
//!
//! # Features
//!
//! - `std` (default): TOML configuration loading. Without it the crate is
//!   `no_std` and needs only `alloc`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod checkpoint;
pub mod config;
pub mod delay_line;
pub mod error;
pub mod filter;
pub mod linalg;
pub mod metrics;
pub mod monitor;
mod runner;
pub mod state;

#[cfg(test)]
mod test_util;

pub use checkpoint::{ByteOrder, Checkpoint};
pub use config::{AdaptationConfig, DivergenceConfig, MonitorConfig, Precision, SignMode, Variant};
pub use error::{CheckpointError, ConfigError, FilterError, Quantity, Result};
pub use filter::AdaptationEngine;
pub use monitor::{ConvergenceMonitor, DivergenceWarning};
pub use runner::{AdaptiveFilter, AdaptiveOutput, BatchOutput, FilterStatus};
pub use state::{FilterState, Snapshot};
