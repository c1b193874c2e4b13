// src/processing/skeleton.rs
//! Skeleton (backbone) curve synthesis
//!
//! Two deliberately distinct builders. The single-case builder merges one
//! cycle set's peak coordinates and suppresses near-duplicates by rounding
//! both coordinates; the multi-case builder aggregates peak points across
//! stored workcases and deduplicates greedily by absolute displacement
//! proximity only. Callers rely on each behavior independently, so they are
//! never unified.

use tracing::{debug, warn};

use crate::config::SkeletonConfig;
use crate::error::{HysteresisError, Result};
use crate::processing::features::CycleFeature;
use crate::types::{Point, Workcase};

/// Minimum number of points a skeleton curve must contain.
const MIN_SKELETON_POINTS: usize = 2;

fn sort_by_displacement(points: &mut [Point]) {
    points.sort_by(|a, b| {
        a.displacement
            .partial_cmp(&b.displacement)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

fn rounded(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Build the skeleton curve for a single cycle set.
///
/// Non-anomalous positive and negative peak coordinates are collected into
/// separate lists, each sorted by displacement; the curve starts at the
/// origin, absorbs negatives then positives while skipping candidates that
/// match an accepted point after rounding both coordinates, and is finally
/// re-sorted by displacement.
pub fn build_skeleton(features: &[CycleFeature], config: &SkeletonConfig) -> Result<Vec<Point>> {
    let mut positives = Vec::new();
    let mut negatives = Vec::new();
    for feature in features.iter().filter(|f| !f.anomaly) {
        if let Some(point) = feature.positive_peak {
            positives.push(point);
        }
        if let Some(point) = feature.negative_peak {
            negatives.push(point);
        }
    }
    sort_by_displacement(&mut positives);
    sort_by_displacement(&mut negatives);

    let decimals = config.round_decimals;
    let mut skeleton = vec![Point::origin()];
    for candidate in negatives.into_iter().chain(positives) {
        let duplicate = skeleton.iter().any(|existing| {
            rounded(existing.displacement, decimals) == rounded(candidate.displacement, decimals)
                && rounded(existing.force, decimals) == rounded(candidate.force, decimals)
        });
        if duplicate {
            debug!(
                displacement = candidate.displacement,
                force = candidate.force,
                "near-duplicate skeleton point suppressed"
            );
        } else {
            skeleton.push(candidate);
        }
    }
    sort_by_displacement(&mut skeleton);

    if skeleton.len() < MIN_SKELETON_POINTS {
        return Err(HysteresisError::InsufficientSkeletonPoints {
            found: skeleton.len(),
            required: MIN_SKELETON_POINTS,
        });
    }
    debug!(points = skeleton.len(), "single-case skeleton built");
    Ok(skeleton)
}

/// Build a combined skeleton curve across stored workcases.
///
/// Requires at least two workcases. Peak points are collected per workcase
/// in store order (a workcase without feature data is skipped with a
/// warning), globally sorted by displacement, then filtered greedily left to
/// right: a candidate is dropped when its displacement lies within
/// `displacement_threshold` of any already-accepted point. Force plays no
/// part in the proximity test.
pub fn build_multi_case_skeleton(
    workcases: &[Workcase],
    displacement_threshold: f64,
) -> Result<Vec<Point>> {
    if workcases.len() < 2 {
        return Err(HysteresisError::TooFewWorkcases {
            stored: workcases.len(),
        });
    }

    let mut points = vec![Point::origin()];
    for workcase in workcases {
        if workcase.features.is_empty() {
            warn!(name = %workcase.name, "workcase has no feature data, skipped");
            continue;
        }
        let mut collected = 0usize;
        for feature in workcase.features.iter().filter(|f| !f.anomaly) {
            if let Some(point) = feature.positive_peak {
                points.push(point);
                collected += 1;
            }
            if let Some(point) = feature.negative_peak {
                points.push(point);
                collected += 1;
            }
        }
        debug!(name = %workcase.name, collected, "workcase peak points collected");
    }

    sort_by_displacement(&mut points);

    let mut filtered: Vec<Point> = Vec::with_capacity(points.len());
    for candidate in points {
        let is_close = filtered
            .iter()
            .any(|accepted| (candidate.displacement - accepted.displacement).abs()
                < displacement_threshold);
        if is_close {
            debug!(
                displacement = candidate.displacement,
                "point within displacement threshold of an accepted point, dropped"
            );
        } else {
            filtered.push(candidate);
        }
    }

    if filtered.len() < MIN_SKELETON_POINTS {
        return Err(HysteresisError::InsufficientSkeletonPoints {
            found: filtered.len(),
            required: MIN_SKELETON_POINTS,
        });
    }
    debug!(points = filtered.len(), "multi-case skeleton built");
    Ok(filtered)
}
