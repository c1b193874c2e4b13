// src/types.rs
//! Core data types shared across the analysis pipeline

use serde::{Deserialize, Serialize};

use crate::error::{HysteresisError, Result};

/// Minimum number of samples required before any segmentation attempt.
pub const MIN_SERIES_LEN: usize = 10;

/// A displacement/force coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Displacement value (caller's units, typically mm)
    pub displacement: f64,
    /// Force value (caller's units, typically kN)
    pub force: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(displacement: f64, force: f64) -> Self {
        Self {
            displacement,
            force,
        }
    }

    /// The origin `(0, 0)`, used to anchor skeleton curves.
    pub fn origin() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Metadata identifying the channels a series was built from.
///
/// The ingestion layer (out of scope here) selects the channels; the core
/// only carries the names along so stored workcases remain traceable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Name of the displacement channel
    pub displacement: String,
    /// Name of the primary force channel
    pub force: String,
    /// Name of the optional second force channel (summed by the caller)
    pub force2: Option<String>,
}

/// Index-aligned displacement/force sample pair sequence.
///
/// Construction sanitizes non-finite values to 0.0 and rejects mismatched
/// lengths, so downstream stages can assume finite, equal-length channels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSeries {
    /// Displacement samples
    pub displacement: Vec<f64>,
    /// Force samples
    pub force: Vec<f64>,
}

impl SampleSeries {
    /// Build a series from raw channel arrays.
    ///
    /// NaN and ±∞ entries are replaced with 0.0.
    pub fn new(displacement: Vec<f64>, force: Vec<f64>) -> Result<Self> {
        if displacement.len() != force.len() {
            return Err(HysteresisError::LengthMismatch {
                displacement: displacement.len(),
                force: force.len(),
            });
        }
        if displacement.is_empty() {
            return Err(HysteresisError::EmptySeries);
        }
        let sanitize = |v: Vec<f64>| -> Vec<f64> {
            v.into_iter()
                .map(|x| if x.is_finite() { x } else { 0.0 })
                .collect()
        };
        Ok(Self {
            displacement: sanitize(displacement),
            force: sanitize(force),
        })
    }

    /// Number of samples per channel.
    pub fn len(&self) -> usize {
        self.displacement.len()
    }

    /// Whether the series holds no samples.
    pub fn is_empty(&self) -> bool {
        self.displacement.is_empty()
    }

    /// Error unless the series holds at least `required` samples.
    pub fn require_len(&self, required: usize) -> Result<()> {
        if self.len() < required {
            return Err(HysteresisError::TooFewSamples {
                required,
                actual: self.len(),
            });
        }
        Ok(())
    }
}

/// One loading cycle: a contiguous half-open index range into a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    /// 1-based ordinal, insertion order == chronological order
    pub number: usize,
    /// First sample index of the cycle
    pub start: usize,
    /// One past the last sample index
    pub end: usize,
}

impl Cycle {
    /// Create a cycle covering `[start, end)`.
    pub fn new(number: usize, start: usize, end: usize) -> Self {
        debug_assert!(end > start, "cycle range must be non-empty");
        Self { number, start, end }
    }

    /// Number of samples the cycle spans.
    pub fn span(&self) -> usize {
        self.end - self.start
    }

    /// The displacement/force slices of this cycle within `series`.
    pub fn slices<'a>(&self, series: &'a SampleSeries) -> (&'a [f64], &'a [f64]) {
        (
            &series.displacement[self.start..self.end],
            &series.force[self.start..self.end],
        )
    }
}

/// A named, immutable snapshot of a fully processed test record.
///
/// Workcases own independent clones of their series, cycles and features so
/// that later reprocessing of the live session never alters a stored case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workcase {
    /// Display name, e.g. derived from the source file
    pub name: String,
    /// Opaque source identity supplied by the ingestion layer
    pub source: Option<String>,
    /// Channel names the series was extracted from
    pub channels: ChannelInfo,
    /// The processed sample series
    pub series: SampleSeries,
    /// Identified cycles, chronological order
    pub cycles: Vec<Cycle>,
    /// Per-cycle features, index-aligned with `cycles`
    pub features: Vec<crate::processing::CycleFeature>,
    /// The single-case skeleton, when one was generated before snapshotting
    pub skeleton: Option<Vec<Point>>,
    /// Analysis parameters in effect when the snapshot was taken
    pub parameters: Option<crate::config::DetectionConfig>,
}

impl Workcase {
    /// Pure construction of a workcase snapshot from already-computed parts.
    ///
    /// No I/O and no validation beyond what the parts already guarantee;
    /// the caller owns the clone-on-insert decision.
    pub fn new(
        name: impl Into<String>,
        series: SampleSeries,
        cycles: Vec<Cycle>,
        features: Vec<crate::processing::CycleFeature>,
    ) -> Self {
        Self {
            name: name.into(),
            source: None,
            channels: ChannelInfo::default(),
            series,
            cycles,
            features,
            skeleton: None,
            parameters: None,
        }
    }
}
