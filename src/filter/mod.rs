//! Adaptation engine: one update law per [`Variant`].
//!
//! Every law follows the same contract. Given the current [`FilterState`]
//! (whose delay line already holds the newest input) and the a-priori error,
//! it writes the next coefficients, and for RLS the next `P`, into a
//! [`Proposal`]. Nothing in the live state is touched; the caller commits the
//! proposal only after it has been checked to be finite, so a failed update
//! is discarded as a whole.
//!
//! The law is picked once, in [`AdaptationEngine::from_config`]; the
//! per-sample `match` in [`AdaptationEngine::update`] is the single dispatch
//! point.

mod lms;
mod nlms;
mod rls;
mod sign_lms;

pub use lms::{lms_step_bound, LmsUpdate};
pub use nlms::NlmsUpdate;
pub use rls::RlsUpdate;
pub use sign_lms::SignLmsUpdate;

use alloc::vec;
use alloc::vec::Vec;

use crate::config::{AdaptationConfig, Precision, Variant};
use crate::error::Quantity;
use crate::linalg::SquareMatrix;
use crate::state::FilterState;

/// Candidate next state produced by an update law.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub(crate) coefficients: Vec<f64>,
    pub(crate) inverse_correlation: Option<SquareMatrix>,
}

impl Proposal {
    pub(crate) fn for_config(config: &AdaptationConfig) -> Self {
        Self {
            coefficients: vec![0.0; config.order],
            inverse_correlation: match config.variant {
                Variant::Rls => Some(SquareMatrix::zeros(config.order)),
                _ => None,
            },
        }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn inverse_correlation(&self) -> Option<&SquareMatrix> {
        self.inverse_correlation.as_ref()
    }

    /// First non-finite quantity, if any.
    pub(crate) fn check_finite(&self) -> Result<(), Quantity> {
        if !self.coefficients.iter().all(|w| w.is_finite()) {
            return Err(Quantity::Coefficients);
        }
        match &self.inverse_correlation {
            Some(p) if !p.is_finite() => Err(Quantity::InverseCorrelation),
            _ => Ok(()),
        }
    }
}

/// The configured update law.
#[derive(Debug, Clone)]
pub enum AdaptationEngine {
    Lms(LmsUpdate),
    Nlms(NlmsUpdate),
    SignLms(SignLmsUpdate),
    Rls(RlsUpdate),
}

impl AdaptationEngine {
    /// Builds the law for an already validated configuration.
    pub fn from_config(config: &AdaptationConfig) -> Self {
        let leakage = config.leakage;
        let precision = config.numeric_precision;
        match config.variant {
            Variant::Lms => Self::Lms(LmsUpdate::new(config.step_size, leakage, precision)),
            Variant::Nlms => Self::Nlms(NlmsUpdate::new(
                config.step_size,
                config.regularization(),
                leakage,
                precision,
            )),
            Variant::SignLms => Self::SignLms(SignLmsUpdate::new(
                config.step_size,
                config.sign_mode,
                leakage,
                precision,
            )),
            Variant::Rls => Self::Rls(RlsUpdate::new(
                config.forgetting_factor,
                config.symmetrize_interval,
                leakage,
                precision,
            )),
        }
    }

    pub fn variant(&self) -> Variant {
        match self {
            Self::Lms(_) => Variant::Lms,
            Self::Nlms(_) => Variant::Nlms,
            Self::SignLms(_) => Variant::SignLms,
            Self::Rls(_) => Variant::Rls,
        }
    }

    /// Writes the next state into `next` without mutating `state`.
    ///
    /// # Errors
    ///
    /// Returns the quantity that would become non-finite (or, for RLS, lose
    /// positive definiteness). `next` is then unspecified and must not be
    /// committed.
    pub fn update(
        &mut self,
        state: &FilterState,
        error: f64,
        next: &mut Proposal,
    ) -> Result<(), Quantity> {
        match self {
            Self::Lms(law) => law.update(state, error, next),
            Self::Nlms(law) => law.update(state, error, next),
            Self::SignLms(law) => law.update(state, error, next),
            Self::Rls(law) => law.update(state, error, next),
        }?;
        next.check_finite()
    }

    /// Called after a proposal has been committed.
    pub fn committed(&mut self) {
        if let Self::Rls(law) = self {
            law.committed();
        }
    }

    /// Forgets per-run bookkeeping.
    pub fn reset(&mut self) {
        if let Self::Rls(law) = self {
            law.reset();
        }
    }
}

/// `next[i] = store((1−γ)·w[i] + scale·dir[i])` for the LMS family.
#[inline]
pub(crate) fn leaky_step(
    current: &[f64],
    leak: f64,
    scale: f64,
    direction: impl Iterator<Item = f64>,
    precision: Precision,
    next: &mut [f64],
) {
    for ((out, &w), d) in next.iter_mut().zip(current).zip(direction) {
        *out = precision.store(leak * w + scale * d);
    }
}
