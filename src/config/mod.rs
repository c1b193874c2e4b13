// src/config/mod.rs
//! Analysis parameter configuration
//!
//! All empirically chosen constants of the pipeline (scoring weights, start
//! threshold, dedup tolerances) live here as configurable defaults rather
//! than hardcoded assumptions.

pub mod loader;

pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};

/// Complete analysis configuration.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AnalysisConfig {
    /// Preprocessing stage options
    #[serde(default)]
    pub preprocess: PreprocessOptions,
    /// Cycle detection options
    #[serde(default)]
    pub detection: DetectionConfig,
    /// Skeleton curve options
    #[serde(default)]
    pub skeleton: SkeletonConfig,
}

/// Options for the preprocessing stage; each step can be toggled
/// independently and runs in the fixed order baseline → zero → outlier →
/// smoothing.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PreprocessOptions {
    /// Subtract a per-channel least-squares linear trend
    #[serde(default = "defaults::enabled")]
    pub baseline_correction: bool,

    /// Subtract the mean of the first 10% of samples from each channel
    #[serde(default = "defaults::enabled")]
    pub zero_correction: bool,

    /// Drop samples deviating more than `outlier_sigma` standard deviations
    #[serde(default = "defaults::disabled")]
    pub outlier_rejection: bool,

    /// Standard-deviation multiple for outlier rejection
    #[serde(default = "defaults::outlier_sigma")]
    pub outlier_sigma: f64,

    /// Apply a centered moving average
    #[serde(default = "defaults::disabled")]
    pub smoothing: bool,

    /// Moving-average window width in samples
    #[serde(default = "defaults::smooth_window")]
    pub smooth_window: usize,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            baseline_correction: true,
            zero_correction: true,
            outlier_rejection: false,
            outlier_sigma: defaults::outlier_sigma(),
            smoothing: false,
            smooth_window: defaults::smooth_window(),
        }
    }
}

/// Options for extremum detection and cycle segmentation.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Target number of loading cycles to identify
    #[serde(default = "defaults::cycle_count")]
    pub cycle_count: usize,

    /// Prominence threshold as a fraction of the signal dynamic range, 0–1
    #[serde(default = "defaults::prominence")]
    pub prominence: f64,

    /// Extrema whose displacement magnitude is below this fraction of the
    /// maximum displacement magnitude are discarded as near-origin ripples
    #[serde(default = "defaults::start_threshold")]
    pub start_threshold: f64,

    /// Minimum number of samples a cycle must span
    #[serde(default = "defaults::min_points")]
    pub min_points: usize,

    /// Weight of the displacement deviation in the extremum score
    #[serde(default = "defaults::disp_score_weight")]
    pub disp_score_weight: f64,

    /// Weight of the force deviation in the extremum score
    #[serde(default = "defaults::force_score_weight")]
    pub force_score_weight: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            cycle_count: defaults::cycle_count(),
            prominence: defaults::prominence(),
            start_threshold: defaults::start_threshold(),
            min_points: defaults::min_points(),
            disp_score_weight: defaults::disp_score_weight(),
            force_score_weight: defaults::force_score_weight(),
        }
    }
}

/// Options for skeleton curve synthesis.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SkeletonConfig {
    /// Decimal places used for near-duplicate suppression in the
    /// single-case builder
    #[serde(default = "defaults::round_decimals")]
    pub round_decimals: u32,

    /// Absolute displacement distance below which two points collapse in
    /// the multi-case builder
    #[serde(default = "defaults::displacement_threshold")]
    pub displacement_threshold: f64,
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        Self {
            round_decimals: defaults::round_decimals(),
            displacement_threshold: defaults::displacement_threshold(),
        }
    }
}

/// Default value providers for serde.
mod defaults {
    pub fn enabled() -> bool {
        true
    }

    pub fn disabled() -> bool {
        false
    }

    pub fn outlier_sigma() -> f64 {
        3.0
    }

    pub fn smooth_window() -> usize {
        5
    }

    pub fn cycle_count() -> usize {
        3
    }

    pub fn prominence() -> f64 {
        0.1
    }

    pub fn start_threshold() -> f64 {
        0.05
    }

    pub fn min_points() -> usize {
        6
    }

    pub fn disp_score_weight() -> f64 {
        0.6
    }

    pub fn force_score_weight() -> f64 {
        0.4
    }

    pub fn round_decimals() -> u32 {
        3
    }

    pub fn displacement_threshold() -> f64 {
        0.001
    }
}
