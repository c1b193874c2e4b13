// src/processing/segmentation.rs
//! Cycle segmentation strategies
//!
//! Three independent algorithms share the common [`Cycle`]/[`CycleFeature`]
//! output shape:
//! - [`detect_cycles`]: direction/score-based pairing of extrema detected on
//!   the combined signal, aimed at a target cycle count;
//! - [`identify_loading_cycles`]: amplitude-threshold pairing of adjacent
//!   extrema detected directly on the raw displacement;
//! - [`partition_cycles`]: equal-length partitioning, the last resort when
//!   both detectors come up empty on a long-enough series.

use tracing::{debug, warn};

use crate::config::DetectionConfig;
use crate::error::{Channel, HysteresisError, Result};
use crate::processing::extrema::{detect_extrema, find_peaks, find_valleys};
use crate::processing::features::CycleFeature;
use crate::types::{Cycle, Point, SampleSeries, MIN_SERIES_LEN};

/// Outcome of the amplitude-threshold detector, including the raw extremum
/// indices for display layers.
#[derive(Debug, Clone)]
pub struct LoadingCycles {
    /// Accepted cycles, chronological order
    pub cycles: Vec<Cycle>,
    /// Slice-extremum features, index-aligned with `cycles`
    pub features: Vec<CycleFeature>,
    /// Displacement peak indices found by the prominence pass
    pub peak_indices: Vec<usize>,
    /// Displacement valley indices found by the prominence pass
    pub valley_indices: Vec<usize>,
}

fn validate(series: &SampleSeries) -> Result<()> {
    series.require_len(MIN_SERIES_LEN)
}

/// Half-open end of a cycle whose later extremum sits at `last`, inclusive of
/// that extremum when the following sample index is still in range.
fn inclusive_end(last: usize, len: usize) -> usize {
    if last + 1 < len {
        last + 1
    } else {
        last
    }
}

/// Direction/score-based segmentation toward a target cycle count.
///
/// The i-th selected peak is paired with the i-th selected valley
/// (truncating to the shorter list). Whichever of the pair occurs first
/// chronologically takes the `positive_peak` role. Pairs spanning fewer than
/// `min_points` samples, or overlapping the previously accepted cycle, are
/// discarded.
pub fn detect_cycles(
    series: &SampleSeries,
    config: &DetectionConfig,
) -> Result<(Vec<Cycle>, Vec<CycleFeature>)> {
    validate(series)?;
    let displacement = &series.displacement;
    let force = &series.force;

    let extrema = detect_extrema(displacement, force, config)?;
    let pair_count = extrema.peaks.len().min(extrema.valleys.len());

    let mut cycles = Vec::new();
    let mut features = Vec::new();
    let mut last_end = 0usize;

    for i in 0..pair_count {
        let peak_idx = extrema.peaks[i];
        let valley_idx = extrema.valleys[i];

        let start = peak_idx.min(valley_idx);
        let end = inclusive_end(peak_idx.max(valley_idx), series.len());
        if end <= start {
            continue;
        }
        if end - start < config.min_points {
            debug!(start, end, "pair discarded: span below minimum point count");
            continue;
        }
        if !cycles.is_empty() && start < last_end {
            warn!(
                start,
                last_end, "pair discarded: would overlap the previous cycle"
            );
            continue;
        }

        let number = cycles.len() + 1;
        let cycle = Cycle::new(number, start, end);
        let (cycle_disp, cycle_force) = cycle.slices(series);

        // The chronologically earlier extremum takes the positive role.
        let peak_point = Point::new(displacement[peak_idx], force[peak_idx]);
        let valley_point = Point::new(displacement[valley_idx], force[valley_idx]);
        let (positive, negative) = if peak_idx < valley_idx {
            (peak_point, valley_point)
        } else {
            (valley_point, peak_point)
        };

        features.push(
            CycleFeature::from_slices(number, cycle_disp, cycle_force).with_peaks(
                positive,
                negative,
                peak_idx,
                valley_idx,
            ),
        );
        last_end = end;
        cycles.push(cycle);
    }

    if cycles.is_empty() {
        return Err(HysteresisError::InsufficientCycles);
    }

    debug!(count = cycles.len(), "direction-based segmentation complete");
    Ok((cycles, features))
}

/// Amplitude-threshold segmentation on the raw displacement channel.
///
/// A single prominence pass finds peaks and valleys of the displacement;
/// every chronologically adjacent pair of extrema spanning at least
/// `min_points` samples becomes a cycle. Unlike [`detect_cycles`] this path
/// is independent of a target count and leaves the peak coordinates unset,
/// so stiffness later falls back to slice extrema.
pub fn identify_loading_cycles(
    series: &SampleSeries,
    prominence: f64,
    min_points: usize,
) -> Result<LoadingCycles> {
    validate(series)?;
    let displacement = &series.displacement;

    let min = displacement.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max = displacement.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let range = max - min;
    if range <= 0.0 {
        return Err(HysteresisError::DegenerateSignal {
            channel: Channel::Displacement,
        });
    }

    let min_prominence = prominence * range;
    let peak_indices = find_peaks(displacement, min_prominence);
    let valley_indices = find_valleys(displacement, min_prominence);
    debug!(
        peaks = peak_indices.len(),
        valleys = valley_indices.len(),
        "displacement extrema detected"
    );

    let mut extrema: Vec<usize> = peak_indices
        .iter()
        .chain(valley_indices.iter())
        .copied()
        .collect();
    extrema.sort_unstable();
    extrema.dedup();

    let mut cycles = Vec::new();
    let mut features = Vec::new();

    for (i, pair) in extrema.windows(2).enumerate() {
        let start = pair[0];
        // Adjacent cycles share their boundary extremum; only the final pair
        // may extend past it to keep the ranges disjoint.
        let end = if i + 2 == extrema.len() {
            inclusive_end(pair[1], series.len())
        } else {
            pair[1]
        };
        if end - start < min_points {
            continue;
        }
        let number = cycles.len() + 1;
        let cycle = Cycle::new(number, start, end);
        let (cycle_disp, cycle_force) = cycle.slices(series);
        features.push(CycleFeature::from_slices(number, cycle_disp, cycle_force));
        cycles.push(cycle);
    }

    debug!(count = cycles.len(), "amplitude-threshold segmentation complete");
    Ok(LoadingCycles {
        cycles,
        features,
        peak_indices,
        valley_indices,
    })
}

/// Last-resort segmentation: partition the series into `cycle_count`
/// equal-length contiguous segments.
pub fn partition_cycles(
    series: &SampleSeries,
    cycle_count: usize,
    min_points: usize,
) -> Result<(Vec<Cycle>, Vec<CycleFeature>)> {
    if cycle_count == 0 {
        return Err(HysteresisError::InsufficientCycles);
    }
    let required = cycle_count * min_points.max(1);
    series.require_len(required.max(MIN_SERIES_LEN))?;

    let len = series.len();
    let segment = len / cycle_count;
    let mut cycles = Vec::with_capacity(cycle_count);
    let mut features = Vec::with_capacity(cycle_count);

    for i in 0..cycle_count {
        let start = i * segment;
        let end = if i + 1 == cycle_count {
            len
        } else {
            (i + 1) * segment
        };
        let number = i + 1;
        let cycle = Cycle::new(number, start, end);
        let (cycle_disp, cycle_force) = cycle.slices(series);
        features.push(CycleFeature::from_slices(number, cycle_disp, cycle_force));
        cycles.push(cycle);
    }

    warn!(
        cycle_count,
        "equal-length partition fallback used for segmentation"
    );
    Ok((cycles, features))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_series(cycles: f64, amplitude: f64, samples: usize, stiffness: f64) -> SampleSeries {
        let displacement: Vec<f64> = (0..samples)
            .map(|i| {
                let t = i as f64 / samples as f64;
                amplitude * (2.0 * std::f64::consts::PI * cycles * t).sin()
            })
            .collect();
        let force: Vec<f64> = displacement.iter().map(|&d| stiffness * d).collect();
        SampleSeries::new(displacement, force).unwrap()
    }

    fn assert_disjoint_increasing(cycles: &[Cycle]) {
        for pair in cycles.windows(2) {
            assert!(pair[0].start < pair[1].start, "starts not increasing");
            assert!(pair[0].end <= pair[1].start, "spans overlap");
        }
        for cycle in cycles {
            assert!(cycle.end > cycle.start);
        }
    }

    #[test]
    fn direction_strategy_finds_target_cycles() {
        let series = sine_series(3.0, 10.0, 500, 2.0);
        let (cycles, features) = detect_cycles(&series, &DetectionConfig::default()).unwrap();
        assert_eq!(cycles.len(), 3);
        assert_eq!(features.len(), 3);
        assert_disjoint_increasing(&cycles);
        for (i, cycle) in cycles.iter().enumerate() {
            assert_eq!(cycle.number, i + 1);
        }
        for feature in &features {
            assert!(feature.positive_peak.is_some());
            assert!(feature.negative_peak.is_some());
        }
    }

    #[test]
    fn positive_role_follows_chronological_order() {
        // Sine starts positive, so every peak precedes its paired valley and
        // keeps the positive role.
        let series = sine_series(3.0, 10.0, 500, 2.0);
        let (_, features) = detect_cycles(&series, &DetectionConfig::default()).unwrap();
        for feature in &features {
            let positive = feature.positive_peak.unwrap();
            let negative = feature.negative_peak.unwrap();
            assert!(positive.displacement > 0.0);
            assert!(negative.displacement < 0.0);
        }
    }

    #[test]
    fn too_short_series_is_rejected() {
        let series = SampleSeries::new(vec![1.0; 5], vec![1.0; 5]).unwrap();
        let err = detect_cycles(&series, &DetectionConfig::default()).unwrap_err();
        assert!(matches!(err, HysteresisError::TooFewSamples { .. }));
    }

    #[test]
    fn amplitude_strategy_pairs_adjacent_extrema() {
        let series = sine_series(3.0, 10.0, 600, 1.0);
        let result = identify_loading_cycles(&series, 0.1, 6).unwrap();
        assert!(!result.cycles.is_empty());
        assert_eq!(result.peak_indices.len(), 3);
        assert_eq!(result.valley_indices.len(), 3);
        assert_disjoint_increasing(&result.cycles);
        // Amplitude-threshold features carry no explicit peak coordinates.
        for feature in &result.features {
            assert!(feature.positive_peak.is_none());
        }
    }

    #[test]
    fn amplitude_strategy_reports_degenerate_displacement() {
        let series = SampleSeries::new(vec![1.0; 50], vec![1.0; 50]).unwrap();
        let err = identify_loading_cycles(&series, 0.1, 6).unwrap_err();
        assert!(matches!(err, HysteresisError::DegenerateSignal { .. }));
    }

    #[test]
    fn partition_fallback_covers_series() {
        let series = sine_series(1.0, 1.0, 90, 1.0);
        let (cycles, features) = partition_cycles(&series, 3, 6).unwrap();
        assert_eq!(cycles.len(), 3);
        assert_eq!(features.len(), 3);
        assert_eq!(cycles[0].start, 0);
        assert_eq!(cycles[2].end, 90);
        assert_disjoint_increasing(&cycles);
    }

    #[test]
    fn partition_fallback_requires_enough_samples() {
        let series = sine_series(1.0, 1.0, 12, 1.0);
        let err = partition_cycles(&series, 3, 6).unwrap_err();
        assert!(matches!(err, HysteresisError::TooFewSamples { .. }));
    }

    #[test]
    fn detect_cycles_is_idempotent() {
        let series = sine_series(3.0, 10.0, 500, 2.0);
        let config = DetectionConfig::default();
        let first = detect_cycles(&series, &config).unwrap();
        let second = detect_cycles(&series, &config).unwrap();
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }
}
