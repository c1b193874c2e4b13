// src/processing/extrema.rs
//! Adaptive peak/valley detection on the dual-normalized combined signal
//!
//! Displacement and force are normalized to [0,1] independently and summed so
//! that neither channel dominates detection. Candidate extrema are strict
//! local maxima filtered by a prominence threshold expressed as a fraction of
//! the combined signal's dynamic range; prominence is measured by walking
//! from each peak to the nearest higher sample on both sides.

use tracing::{debug, warn};

use crate::config::DetectionConfig;
use crate::error::{Channel, HysteresisError, Result};

/// Bounded adaptive retry budget: halve the prominence fraction once.
const PROMINENCE_RETRIES: usize = 1;

/// Chronologically ordered peak and valley indices selected for pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedExtrema {
    /// Indices of selected peaks, ascending
    pub peaks: Vec<usize>,
    /// Indices of selected valleys, ascending
    pub valleys: Vec<usize>,
}

/// Indices of strict local maxima of `data`.
fn local_maxima(data: &[f64]) -> Vec<usize> {
    let mut maxima = Vec::new();
    for i in 1..data.len().saturating_sub(1) {
        if data[i] > data[i - 1] && data[i] > data[i + 1] {
            maxima.push(i);
        }
    }
    maxima
}

/// Prominence of each peak: height above the higher of the two lowest points
/// reached before a taller sample on either side.
fn peak_prominences(data: &[f64], peaks: &[usize]) -> Vec<f64> {
    let n = data.len();
    let mut prominences = Vec::with_capacity(peaks.len());

    for &peak in peaks {
        let peak_height = data[peak];

        let mut left_min = peak_height;
        for i in (0..peak).rev() {
            if data[i] > peak_height {
                break;
            }
            left_min = left_min.min(data[i]);
        }

        let mut right_min = peak_height;
        for i in peak + 1..n {
            if data[i] > peak_height {
                break;
            }
            right_min = right_min.min(data[i]);
        }

        let base = left_min.max(right_min);
        prominences.push(peak_height - base);
    }

    prominences
}

/// Local maxima of `data` with prominence of at least `min_prominence`.
pub fn find_peaks(data: &[f64], min_prominence: f64) -> Vec<usize> {
    let candidates = local_maxima(data);
    let prominences = peak_prominences(data, &candidates);
    candidates
        .into_iter()
        .zip(prominences)
        .filter(|&(_, p)| p >= min_prominence)
        .map(|(i, _)| i)
        .collect()
}

/// Local minima of `data`, detected as peaks of the negated signal.
pub fn find_valleys(data: &[f64], min_prominence: f64) -> Vec<usize> {
    let negated: Vec<f64> = data.iter().map(|&x| -x).collect();
    find_peaks(&negated, min_prominence)
}

/// Normalize a channel to [0,1] by its own min/max.
///
/// Fails with a degenerate-signal error when the channel has no dynamic
/// range.
fn normalize(data: &[f64], channel: Channel) -> Result<Vec<f64>> {
    let min = data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max = data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let range = max - min;
    if range <= 0.0 {
        return Err(HysteresisError::DegenerateSignal { channel });
    }
    Ok(data.iter().map(|&x| (x - min) / range).collect())
}

fn dynamic_range(data: &[f64]) -> f64 {
    let min = data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max = data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    max - min
}

/// Detect and select the peak/valley indices used for cycle pairing.
///
/// Runs prominence-based detection on the combined signal, filters extrema
/// inside the near-origin start band, retries once with halved prominence
/// when fewer extrema than `cycle_count` survive, then keeps the top
/// `cycle_count` of each kind by deviation score.
pub fn detect_extrema(
    displacement: &[f64],
    force: &[f64],
    config: &DetectionConfig,
) -> Result<SelectedExtrema> {
    let disp_norm = normalize(displacement, Channel::Displacement)?;
    let force_norm = normalize(force, Channel::Force)?;

    let combined: Vec<f64> = disp_norm
        .iter()
        .zip(&force_norm)
        .map(|(&d, &f)| d + f)
        .collect();
    let combined_range = dynamic_range(&combined);
    if combined_range <= 0.0 {
        return Err(HysteresisError::DegenerateSignal {
            channel: Channel::Combined,
        });
    }

    let disp_max = displacement.iter().fold(0.0_f64, |a, &b| a.max(b.abs()));
    let start_band = config.start_threshold * disp_max;

    let mut peaks = Vec::new();
    let mut valleys = Vec::new();
    let mut fraction = config.prominence;

    for attempt in 0..=PROMINENCE_RETRIES {
        let min_prominence = fraction * combined_range;
        peaks = find_peaks(&combined, min_prominence);
        valleys = find_valleys(&combined, min_prominence);
        debug!(
            attempt,
            raw_peaks = peaks.len(),
            raw_valleys = valleys.len(),
            min_prominence,
            "combined-signal extrema detected"
        );

        // Discard near-origin ripples before the main excursions.
        peaks.retain(|&i| displacement[i].abs() > start_band);
        valleys.retain(|&i| displacement[i].abs() > start_band);
        debug!(
            attempt,
            peaks = peaks.len(),
            valleys = valleys.len(),
            "extrema after start-threshold filter"
        );

        if peaks.len() >= config.cycle_count && valleys.len() >= config.cycle_count {
            break;
        }
        if attempt < PROMINENCE_RETRIES {
            fraction *= 0.5;
            warn!(
                fraction,
                "fewer extrema than target cycle count, retrying with halved prominence"
            );
        }
    }

    let peaks = select_by_score(&peaks, displacement, force, config);
    let valleys = select_by_score(&valleys, displacement, force, config);
    debug!(
        peaks = peaks.len(),
        valleys = valleys.len(),
        "extrema selected by score"
    );

    if peaks.is_empty() || valleys.is_empty() {
        return Err(HysteresisError::InsufficientExtrema {
            peaks: peaks.len(),
            valleys: valleys.len(),
        });
    }

    Ok(SelectedExtrema { peaks, valleys })
}

/// Score extrema by weighted normalized deviation from the channel means and
/// keep the top `cycle_count`, re-sorted chronologically.
fn select_by_score(
    indices: &[usize],
    displacement: &[f64],
    force: &[f64],
    config: &DetectionConfig,
) -> Vec<usize> {
    if indices.is_empty() {
        return Vec::new();
    }

    let disp_mean = displacement.iter().sum::<f64>() / displacement.len() as f64;
    let force_mean = force.iter().sum::<f64>() / force.len() as f64;
    let disp_range = dynamic_range(displacement);
    let force_range = dynamic_range(force);

    let mut scored: Vec<(usize, f64)> = indices
        .iter()
        .map(|&i| {
            let disp_dev = if disp_range > 0.0 {
                (displacement[i] - disp_mean).abs() / disp_range
            } else {
                0.0
            };
            let force_dev = if force_range > 0.0 {
                (force[i] - force_mean).abs() / force_range
            } else {
                0.0
            };
            let score =
                config.disp_score_weight * disp_dev + config.force_score_weight * force_dev;
            (i, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(config.cycle_count);

    let mut selected: Vec<usize> = scored.into_iter().map(|(i, _)| i).collect();
    selected.sort_unstable();
    selected
}
