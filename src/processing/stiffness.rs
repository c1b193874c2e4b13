// src/processing/stiffness.rs
//! Secant stiffness and dissipated-energy computation
//!
//! Secant stiffness is the slope of the line connecting a cycle's positive
//! and negative peak responses. Dissipated energy is the area enclosed by
//! the hysteresis loop, computed with the shoelace formula over the ordered
//! sample polygon; self-intersecting loops are accepted and may simply show
//! a reduced net area.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::processing::features::CycleFeature;
use crate::types::{Cycle, Point, SampleSeries};

/// Displacement span below which the secant is numerically meaningless and a
/// regression slope is substituted.
const SECANT_SPAN_EPS: f64 = 1e-10;

/// Stiffness and energy of a single cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StiffnessEnergy {
    /// Equivalent (secant) stiffness
    pub stiffness: f64,
    /// Energy dissipated by the loop
    pub energy: f64,
    /// True when a least-squares slope replaced the secant because the
    /// displacement span was near zero. A fallback, not a failure.
    pub regression_fallback: bool,
}

/// Per-cycle stiffness/energy with the peak coordinates the secant used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleStiffness {
    /// 1-based cycle ordinal
    pub cycle_number: usize,
    /// Positive peak the secant was drawn through
    pub positive: Point,
    /// Negative peak the secant was drawn through
    pub negative: Point,
    /// Stiffness/energy values
    pub values: StiffnessEnergy,
}

/// Results over a whole cycle set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StiffnessResults {
    /// Per-cycle results, chronological order
    pub per_cycle: Vec<CycleStiffness>,
    /// Mean equivalent stiffness over non-anomalous, non-zero cycles;
    /// 0.0 when no cycle qualifies
    pub average_stiffness: f64,
}

/// Signed shoelace area of the closed polygon traced by the samples, with
/// the last sample implicitly joined back to the first.
fn shoelace_area(displacement: &[f64], force: &[f64]) -> f64 {
    let n = displacement.len().min(force.len());
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += displacement[i] * force[j] - displacement[j] * force[i];
    }
    twice_area / 2.0
}

/// Least-squares slope of force against displacement, 0.0 when the
/// displacement carries no spread.
fn regression_slope(displacement: &[f64], force: &[f64]) -> f64 {
    super::least_squares_line(displacement, force)
        .map(|(slope, _)| slope)
        .unwrap_or(0.0)
}

/// Stiffness and dissipated energy of one cycle slice.
///
/// Without explicit peak coordinates the secant runs through the samples at
/// maximum and minimum displacement.
pub fn compute_stiffness_and_energy(displacement: &[f64], force: &[f64]) -> StiffnessEnergy {
    if displacement.is_empty() || force.is_empty() {
        return StiffnessEnergy {
            stiffness: 0.0,
            energy: 0.0,
            regression_fallback: false,
        };
    }

    let mut max_i = 0;
    let mut min_i = 0;
    for (i, &d) in displacement.iter().enumerate() {
        if d > displacement[max_i] {
            max_i = i;
        }
        if d < displacement[min_i] {
            min_i = i;
        }
    }
    let positive = Point::new(displacement[max_i], force[max_i]);
    let negative = Point::new(displacement[min_i], force[min_i]);

    secant_or_regression(positive, negative, displacement, force)
}

fn secant_or_regression(
    positive: Point,
    negative: Point,
    displacement: &[f64],
    force: &[f64],
) -> StiffnessEnergy {
    let span = positive.displacement - negative.displacement;
    let energy = shoelace_area(displacement, force).abs();

    if span.abs() < SECANT_SPAN_EPS {
        let slope = regression_slope(displacement, force);
        debug!(slope, "near-zero displacement span, regression slope substituted");
        StiffnessEnergy {
            stiffness: slope,
            energy,
            regression_fallback: true,
        }
    } else {
        StiffnessEnergy {
            stiffness: (positive.force - negative.force) / span,
            energy,
            regression_fallback: false,
        }
    }
}

/// Stiffness and energy of one cycle, preferring the feature's explicit
/// peak coordinates over the slice extrema.
pub fn compute_cycle_stiffness(
    series: &SampleSeries,
    cycle: &Cycle,
    feature: &CycleFeature,
) -> CycleStiffness {
    let (disp, force) = cycle.slices(series);

    let values = match (feature.positive_peak, feature.negative_peak) {
        (Some(positive), Some(negative)) => {
            let values = secant_or_regression(positive, negative, disp, force);
            return CycleStiffness {
                cycle_number: cycle.number,
                positive,
                negative,
                values,
            };
        }
        _ => compute_stiffness_and_energy(disp, force),
    };

    CycleStiffness {
        cycle_number: cycle.number,
        positive: Point::new(feature.max_disp, feature.max_force),
        negative: Point::new(feature.min_disp, feature.min_force),
        values,
    }
}

/// Per-cycle stiffness/energy plus the average over non-anomalous,
/// non-zero-stiffness cycles. An empty cycle set yields an average of 0.0,
/// not an error.
pub fn compute_results(
    series: &SampleSeries,
    cycles: &[Cycle],
    features: &[CycleFeature],
) -> StiffnessResults {
    let per_cycle: Vec<CycleStiffness> = cycles
        .iter()
        .zip(features)
        .map(|(cycle, feature)| compute_cycle_stiffness(series, cycle, feature))
        .collect();

    let qualifying: Vec<f64> = per_cycle
        .iter()
        .zip(features)
        .filter(|(result, feature)| !feature.anomaly && result.values.stiffness != 0.0)
        .map(|(result, _)| result.values.stiffness)
        .collect();

    let average_stiffness = if qualifying.is_empty() {
        0.0
    } else {
        qualifying.iter().sum::<f64>() / qualifying.len() as f64
    };

    StiffnessResults {
        per_cycle,
        average_stiffness,
    }
}
