//! Offline evaluation metrics for filter runs.
//!
//! These operate on complete recorded sequences (for example the `errors` of
//! a [`BatchOutput`](crate::BatchOutput)) and are independent of any filter
//! instance.

use alloc::vec::Vec;

use crate::error::{FilterError, Result};

/// Floor added to powers so silent signals give finite decibels.
pub const POWER_FLOOR: f64 = 1e-10;

fn check_lengths(a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        return Err(FilterError::LengthMismatch {
            inputs: a.len(),
            desired: b.len(),
        });
    }
    Ok(())
}

/// Mean power `Σx²/n`; 0 for an empty slice.
pub fn mean_power(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    signal.iter().map(|x| x * x).sum::<f64>() / signal.len() as f64
}

/// Mean squared error between two equal-length sequences.
///
/// ```
/// use adaptfilt::metrics::mse;
///
/// assert_eq!(mse(&[1.0, 2.0], &[1.0, 0.0]).unwrap(), 2.0);
/// ```
pub fn mse(reference: &[f64], estimate: &[f64]) -> Result<f64> {
    check_lengths(reference, estimate)?;
    if reference.is_empty() {
        return Ok(0.0);
    }
    let sum: f64 = reference
        .iter()
        .zip(estimate)
        .map(|(r, e)| (r - e) * (r - e))
        .sum();
    Ok(sum / reference.len() as f64)
}

/// `10·log10(Ps/(Pn + 1e-10) + 1e-10)` in dB.
pub fn snr_db(signal: &[f64], noise: &[f64]) -> f64 {
    let ratio = mean_power(signal) / (mean_power(noise) + POWER_FLOOR);
    10.0 * libm::log10(ratio + POWER_FLOOR)
}

/// SNR improvement of `filtered` over `unfiltered`, both measured against
/// `clean`.
pub fn delta_snr_db(clean: &[f64], unfiltered: &[f64], filtered: &[f64]) -> Result<f64> {
    check_lengths(clean, unfiltered)?;
    check_lengths(clean, filtered)?;
    Ok(snr_db(clean, filtered) - snr_db(clean, unfiltered))
}

/// Reference for an adaptive line enhancer: `signal` delayed by `delay`
/// samples, zero-filled at the start and truncated to the same length.
///
/// Feeding this as the input and `signal` as the desired sequence makes the
/// filter predict the correlated (periodic) part of `signal` from its past,
/// leaving broadband noise in the error.
///
/// ```
/// use adaptfilt::metrics::delayed_reference;
///
/// assert_eq!(delayed_reference(&[1.0, 2.0, 3.0], 1), vec![0.0, 1.0, 2.0]);
/// ```
pub fn delayed_reference(signal: &[f64], delay: usize) -> Vec<f64> {
    let lead = delay.min(signal.len());
    let mut reference = Vec::with_capacity(signal.len());
    reference.resize(lead, 0.0);
    reference.extend_from_slice(&signal[..signal.len() - lead]);
    reference
}

/// Index of the first sample from which `|e|` stays within
/// `(1 + r_tol)·steady` for `consecutive` samples in a row, where `steady`
/// is the mean `|e|` over the last `samples_steady` samples.
///
/// Returns `None` for an empty error sequence, `samples_steady == 0`, or if
/// no such run exists.
///
/// ```
/// use adaptfilt::metrics::convergence_time;
///
/// let mut error = vec![4.0, 3.0, 2.0];
/// error.extend(std::iter::repeat(0.1).take(20));
/// assert_eq!(convergence_time(&error, 10, 0.05, 5), Some(3));
/// ```
pub fn convergence_time(
    error: &[f64],
    samples_steady: usize,
    r_tol: f64,
    consecutive: usize,
) -> Option<usize> {
    if error.is_empty() || samples_steady == 0 {
        return None;
    }
    let tail = &error[error.len().saturating_sub(samples_steady)..];
    let steady = tail.iter().map(|e| libm::fabs(*e)).sum::<f64>() / tail.len() as f64;
    let limit = (1.0 + r_tol) * steady;
    let needed = consecutive.max(1);

    let mut run = 0;
    for (i, e) in error.iter().enumerate() {
        if libm::fabs(*e) <= limit {
            run += 1;
            if run == needed {
                return Some(i + 1 - needed);
            }
        } else {
            run = 0;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_mse() {
        assert_eq!(mse(&[], &[]).unwrap(), 0.0);
        assert_eq!(mse(&[1.0, -1.0, 3.0], &[1.0, 1.0, 0.0]).unwrap(), 13.0 / 3.0);
        assert_eq!(
            mse(&[1.0], &[1.0, 2.0]),
            Err(FilterError::LengthMismatch {
                inputs: 1,
                desired: 2
            })
        );
    }

    #[test]
    fn test_snr_db() {
        // Power ratio 100 -> 20 dB.
        let signal = [10.0, -10.0, 10.0, -10.0];
        let noise = [1.0, -1.0, 1.0, -1.0];
        assert!((snr_db(&signal, &noise) - 20.0).abs() < 1e-6);

        // Silent noise is floored, not infinite.
        let snr = snr_db(&signal, &[0.0; 4]);
        assert!(snr.is_finite());
        assert!((snr - 120.0).abs() < 1e-6);
    }

    #[test]
    fn test_delta_snr() {
        let clean = [1.0, -1.0, 1.0, -1.0];
        let noisy = [2.0, -2.0, 2.0, -2.0];
        let filtered = [0.1, -0.1, 0.1, -0.1];
        let delta = delta_snr_db(&clean, &noisy, &filtered).unwrap();
        // 20 dB after, -6.02 dB before.
        assert!((delta - (20.0 + 6.0206)).abs() < 1e-3);
        assert!(delta_snr_db(&clean, &noisy[..3], &filtered).is_err());
    }

    #[test]
    fn test_delayed_reference() {
        let signal = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(delayed_reference(&signal, 0), signal.to_vec());
        assert_eq!(delayed_reference(&signal, 2), vec![0.0, 0.0, 1.0, 2.0]);
        assert_eq!(delayed_reference(&signal, 9), vec![0.0; 4]);
        assert!(delayed_reference(&[], 3).is_empty());
    }

    #[test]
    fn test_convergence_time() {
        let mut error = [1.0; 40];
        for (i, e) in error.iter_mut().enumerate().skip(12) {
            *e = if i % 2 == 0 { 0.01 } else { -0.01 };
        }
        // A lucky early dip shorter than the run length is ignored.
        error[5] = 0.0;
        assert_eq!(convergence_time(&error, 10, 0.05, 5), Some(12));
        assert_eq!(convergence_time(&error, 10, 0.05, 1), Some(5));
    }

    #[test]
    fn test_convergence_time_degenerate() {
        assert_eq!(convergence_time(&[], 10, 0.05, 5), None);
        assert_eq!(convergence_time(&[1.0, 2.0], 0, 0.05, 5), None);
        // Run longer than the sequence.
        assert_eq!(convergence_time(&[1.0, 1.0], 2, 0.05, 5), None);
    }
}
