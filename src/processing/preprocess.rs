// src/processing/preprocess.rs
//! Raw series preprocessing: baseline/zero correction, outlier rejection,
//! smoothing
//!
//! Each step is optional via [`PreprocessOptions`] and the enabled steps run
//! in a fixed order. Output channels are always finite and equal length;
//! only outlier rejection may shorten the series.

use tracing::{debug, warn};

use crate::config::PreprocessOptions;
use crate::error::{HysteresisError, Result};

/// Fraction of samples rejected beyond which outlier rejection aborts.
const MAX_REJECTED_FRACTION: f64 = 0.2;

/// Fraction of leading samples averaged for zero correction.
const ZERO_WINDOW_FRACTION: f64 = 0.1;

/// Result of a preprocessing run.
#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    /// Corrected displacement channel
    pub displacement: Vec<f64>,
    /// Corrected force channel
    pub force: Vec<f64>,
    /// Human-readable notes about steps that behaved non-trivially
    pub warnings: Vec<String>,
}

/// Apply the configured preprocessing steps to a raw channel pair.
///
/// Non-finite samples are replaced with 0.0 before any step runs.
pub fn preprocess(
    displacement: &[f64],
    force: &[f64],
    options: &PreprocessOptions,
) -> Result<PreprocessOutput> {
    if displacement.len() != force.len() {
        return Err(HysteresisError::LengthMismatch {
            displacement: displacement.len(),
            force: force.len(),
        });
    }
    if displacement.is_empty() {
        return Err(HysteresisError::EmptySeries);
    }

    let sanitize = |channel: &[f64]| -> Vec<f64> {
        channel
            .iter()
            .map(|&x| if x.is_finite() { x } else { 0.0 })
            .collect()
    };
    let mut disp = sanitize(displacement);
    let mut force = sanitize(force);
    let mut warnings = Vec::new();

    if options.baseline_correction {
        remove_linear_trend(&mut disp);
        remove_linear_trend(&mut force);
        debug!(len = disp.len(), "baseline correction applied");
    }

    if options.zero_correction {
        let window = ((disp.len() as f64 * ZERO_WINDOW_FRACTION) as usize).max(1);
        subtract_leading_mean(&mut disp, window);
        subtract_leading_mean(&mut force, window);
        debug!(window, "zero correction applied");
    }

    if options.outlier_rejection {
        match reject_outliers(&disp, &force, options.outlier_sigma) {
            Some(keep) => {
                let rejected = disp.len() - keep.len();
                if rejected > 0 {
                    debug!(rejected, sigma = options.outlier_sigma, "outliers rejected");
                    warnings.push(format!("outlier rejection removed {rejected} sample(s)"));
                    disp = keep.iter().map(|&i| disp[i]).collect();
                    force = keep.iter().map(|&i| force[i]).collect();
                }
            }
            None => {
                warn!(
                    sigma = options.outlier_sigma,
                    "outlier rejection would discard more than 20% of samples, skipped"
                );
                warnings.push(
                    "outlier rejection skipped: more than 20% of samples flagged".to_string(),
                );
            }
        }
    }

    if options.smoothing {
        if disp.len() >= options.smooth_window && options.smooth_window > 1 {
            disp = moving_average(&disp, options.smooth_window);
            force = moving_average(&force, options.smooth_window);
            debug!(window = options.smooth_window, "smoothing applied");
        } else if options.smooth_window > 1 {
            warnings.push(format!(
                "smoothing skipped: series shorter than window {}",
                options.smooth_window
            ));
        }
    }

    Ok(PreprocessOutput {
        displacement: disp,
        force,
        warnings,
    })
}

/// Subtract the least-squares linear trend over the sample index.
fn remove_linear_trend(channel: &mut [f64]) {
    let xs: Vec<f64> = (0..channel.len()).map(|i| i as f64).collect();
    if let Some((slope, intercept)) = super::least_squares_line(&xs, channel) {
        for (i, value) in channel.iter_mut().enumerate() {
            *value -= slope * i as f64 + intercept;
        }
    }
}

/// Subtract the mean of the first `window` samples from the whole channel.
fn subtract_leading_mean(channel: &mut [f64], window: usize) {
    let window = window.min(channel.len()).max(1);
    let mean = channel[..window].iter().sum::<f64>() / window as f64;
    for value in channel.iter_mut() {
        *value -= mean;
    }
}

/// Indices to keep after sigma-based rejection on both channels, or `None`
/// when rejection would discard more than [`MAX_REJECTED_FRACTION`].
fn reject_outliers(disp: &[f64], force: &[f64], sigma: f64) -> Option<Vec<usize>> {
    let (disp_mean, disp_std) = mean_and_std(disp);
    let (force_mean, force_std) = mean_and_std(force);

    let keep: Vec<usize> = (0..disp.len())
        .filter(|&i| {
            (disp[i] - disp_mean).abs() <= sigma * disp_std
                && (force[i] - force_mean).abs() <= sigma * force_std
        })
        .collect();

    let rejected = disp.len() - keep.len();
    if (rejected as f64) > MAX_REJECTED_FRACTION * disp.len() as f64 {
        None
    } else {
        Some(keep)
    }
}

fn mean_and_std(data: &[f64]) -> (f64, f64) {
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Centered moving average of width `window` (clamped at the edges).
fn moving_average(data: &[f64], window: usize) -> Vec<f64> {
    let half = window / 2;
    let n = data.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(n);
            data[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options_none() -> PreprocessOptions {
        PreprocessOptions {
            baseline_correction: false,
            zero_correction: false,
            outlier_rejection: false,
            smoothing: false,
            ..PreprocessOptions::default()
        }
    }

    #[test]
    fn sanitizes_non_finite_even_with_all_steps_off() {
        let out = preprocess(&[1.0, f64::NAN], &[f64::NEG_INFINITY, 2.0], &options_none())
            .unwrap();
        assert_eq!(out.displacement, vec![1.0, 0.0]);
        assert_eq!(out.force, vec![0.0, 2.0]);
    }

    #[test]
    fn baseline_correction_removes_linear_drift() {
        let disp: Vec<f64> = (0..100).map(|i| 0.3 * i as f64 + 5.0).collect();
        let force = vec![0.0; 100];
        let options = PreprocessOptions {
            baseline_correction: true,
            ..options_none()
        };
        let out = preprocess(&disp, &force, &options).unwrap();
        for value in &out.displacement {
            assert!(value.abs() < 1e-9, "residual drift {value}");
        }
    }

    #[test]
    fn zero_correction_shifts_start_to_origin() {
        let disp = vec![2.0; 50];
        let force = vec![-3.0; 50];
        let options = PreprocessOptions {
            zero_correction: true,
            ..options_none()
        };
        let out = preprocess(&disp, &force, &options).unwrap();
        assert!(out.displacement.iter().all(|&x| x.abs() < 1e-12));
        assert!(out.force.iter().all(|&x| x.abs() < 1e-12));
    }

    #[test]
    fn outlier_rejection_drops_spikes() {
        let mut disp: Vec<f64> = (0..100).map(|i| (i as f64 * 0.1).sin()).collect();
        let force = disp.clone();
        disp[50] = 1000.0;
        let options = PreprocessOptions {
            outlier_rejection: true,
            ..options_none()
        };
        let out = preprocess(&disp, &force, &options).unwrap();
        assert_eq!(out.displacement.len(), 99);
        assert_eq!(out.force.len(), 99);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn outlier_rejection_aborts_when_too_aggressive() {
        // Tight sigma flags far more than 20% of a bimodal series.
        let disp: Vec<f64> = (0..100)
            .map(|i| if i % 2 == 0 { 10.0 } else { -10.0 })
            .collect();
        let force = disp.clone();
        let options = PreprocessOptions {
            outlier_rejection: true,
            outlier_sigma: 0.1,
            ..options_none()
        };
        let out = preprocess(&disp, &force, &options).unwrap();
        assert_eq!(out.displacement.len(), 100);
        assert!(out.warnings.iter().any(|w| w.contains("skipped")));
    }

    #[test]
    fn smoothing_is_noop_for_short_series() {
        let options = PreprocessOptions {
            smoothing: true,
            smooth_window: 11,
            ..options_none()
        };
        let out = preprocess(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], &options).unwrap();
        assert_eq!(out.displacement, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn smoothing_attenuates_noise() {
        let disp: Vec<f64> = (0..200)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let force = disp.clone();
        let options = PreprocessOptions {
            smoothing: true,
            smooth_window: 5,
            ..options_none()
        };
        let out = preprocess(&disp, &force, &options).unwrap();
        let max_abs = out
            .displacement
            .iter()
            .fold(0.0_f64, |acc, &x| acc.max(x.abs()));
        assert!(max_abs < 1.0);
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let err = preprocess(&[1.0], &[1.0, 2.0], &options_none()).unwrap_err();
        assert!(matches!(err, HysteresisError::LengthMismatch { .. }));
    }
}
