// src/processing/features.rs
//! Per-cycle feature extraction

use serde::{Deserialize, Serialize};

use crate::types::{Cycle, Point, SampleSeries};

/// Features derived from one loading cycle.
///
/// Computed once per cycle and immutable thereafter; reprocessing discards
/// and recomputes the whole set. When the direction-based segmenter supplied
/// explicit peak coordinates they are retained verbatim and are the
/// authoritative locations for stiffness computation; otherwise they are
/// absent and stiffness falls back to the slice extrema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleFeature {
    /// 1-based cycle ordinal this feature belongs to
    pub cycle_number: usize,
    /// Positive-excursion peak coordinate, when explicitly detected
    pub positive_peak: Option<Point>,
    /// Negative-excursion peak coordinate, when explicitly detected
    pub negative_peak: Option<Point>,
    /// Sample index of the detected peak, when explicitly detected
    pub peak_index: Option<usize>,
    /// Sample index of the detected valley, when explicitly detected
    pub valley_index: Option<usize>,
    /// Maximum displacement over the cycle slice
    pub max_disp: f64,
    /// Minimum displacement over the cycle slice
    pub min_disp: f64,
    /// Maximum force over the cycle slice
    pub max_force: f64,
    /// Minimum force over the cycle slice
    pub min_force: f64,
    /// Displacement range of the slice
    pub disp_range: f64,
    /// Force range of the slice
    pub force_range: f64,
    /// Caller-settable anomaly flag; excludes the cycle from averages and
    /// skeleton synthesis
    pub anomaly: bool,
}

impl CycleFeature {
    /// Compute the bounding statistics of a cycle slice.
    pub fn from_slices(cycle_number: usize, displacement: &[f64], force: &[f64]) -> Self {
        let fold_min = |data: &[f64]| data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let fold_max = |data: &[f64]| data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

        let max_disp = fold_max(displacement);
        let min_disp = fold_min(displacement);
        let max_force = fold_max(force);
        let min_force = fold_min(force);

        Self {
            cycle_number,
            positive_peak: None,
            negative_peak: None,
            peak_index: None,
            valley_index: None,
            max_disp,
            min_disp,
            max_force,
            min_force,
            disp_range: max_disp - min_disp,
            force_range: max_force - min_force,
            anomaly: false,
        }
    }

    /// Attach the explicit peak coordinates found by the direction-based
    /// segmenter.
    pub fn with_peaks(
        mut self,
        positive: Point,
        negative: Point,
        peak_index: usize,
        valley_index: usize,
    ) -> Self {
        self.positive_peak = Some(positive);
        self.negative_peak = Some(negative);
        self.peak_index = Some(peak_index);
        self.valley_index = Some(valley_index);
        self
    }
}

/// Compute features for every cycle of a series.
pub fn extract_features(series: &SampleSeries, cycles: &[Cycle]) -> Vec<CycleFeature> {
    cycles
        .iter()
        .map(|cycle| {
            let (disp, force) = cycle.slices(series);
            CycleFeature::from_slices(cycle.number, disp, force)
        })
        .collect()
}
