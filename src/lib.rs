//! hysteresis-core: cyclic-loading test record analysis
//!
//! This library extracts structural-engineering metrics from quasi-static
//! cyclic-loading test records. Given paired displacement/force sample
//! series it provides:
//!
//! - Signal preprocessing (baseline/zero correction, outlier rejection,
//!   smoothing)
//! - Adaptive peak/valley detection on a dual-normalized combined signal
//! - Cycle segmentation via direction-based pairing, amplitude-threshold
//!   pairing, or an equal-partition fallback
//! - Per-cycle equivalent (secant) stiffness and dissipated-energy
//!   computation
//! - Skeleton (backbone) curve synthesis for a single record or across
//!   stored workcases
//!
//! # Quick Start
//!
//! ```rust
//! use hysteresis_core::config::AnalysisConfig;
//! use hysteresis_core::session::AnalysisSession;
//! use hysteresis_core::types::ChannelInfo;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Three sine cycles with a linear-elastic force response.
//!     let displacement: Vec<f64> = (0..500)
//!         .map(|i| 10.0 * (2.0 * std::f64::consts::PI * 3.0 * i as f64 / 500.0).sin())
//!         .collect();
//!     let force: Vec<f64> = displacement.iter().map(|&d| 2.0 * d).collect();
//!
//!     let mut session = AnalysisSession::new(AnalysisConfig::default());
//!     session.set_raw_series(None, ChannelInfo::default(), displacement, force)?;
//!     let cycles = session.process()?;
//!     println!("identified {} cycles", cycles);
//!
//!     let results = session.stiffness_results()?;
//!     println!("average stiffness: {:.3}", results.average_stiffness);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod error;
pub mod processing;
pub mod session;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{AnalysisConfig, DetectionConfig, PreprocessOptions, SkeletonConfig};
pub use error::{Channel, HysteresisError, Result};
pub use processing::{
    build_multi_case_skeleton, build_skeleton, compute_stiffness_and_energy, detect_cycles,
    extract_features, identify_loading_cycles, preprocess, CycleFeature, LoadingCycles,
    PreprocessOutput, StiffnessEnergy, StiffnessResults,
};
pub use session::AnalysisSession;
pub use types::{ChannelInfo, Cycle, Point, SampleSeries, Workcase};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!(!VERSION.is_empty());
        assert!(!NAME.is_empty());
    }
}
