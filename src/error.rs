// src/error.rs
//! Unified error handling for the analysis core
//!
//! Every operation in this crate reports failure through [`HysteresisError`]
//! rather than panicking or letting NaN/Inf propagate silently. All variants
//! are recoverable: callers are expected to retry with adjusted parameters
//! (lower prominence, different channel, different cycle count).

use serde::{Deserialize, Serialize};

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HysteresisError>;

/// Which input channel a degenerate-signal failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    /// Displacement channel
    Displacement,
    /// Force channel
    Force,
    /// The combined (normalized displacement + normalized force) signal
    Combined,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Displacement => write!(f, "displacement"),
            Channel::Force => write!(f, "force"),
            Channel::Combined => write!(f, "combined"),
        }
    }
}

/// Unified error type for the analysis core.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HysteresisError {
    /// Displacement and force series have different lengths.
    #[error("series length mismatch: displacement has {displacement} samples, force has {force}")]
    LengthMismatch {
        /// Length of the displacement series
        displacement: usize,
        /// Length of the force series
        force: usize,
    },

    /// A series was empty where data was required.
    #[error("empty sample series")]
    EmptySeries,

    /// The series is too short for the requested operation.
    #[error("too few samples: need at least {required}, got {actual}")]
    TooFewSamples {
        /// Minimum number of samples required
        required: usize,
        /// Number of samples actually supplied
        actual: usize,
    },

    /// A channel has zero dynamic range and cannot be normalized.
    #[error("degenerate signal: zero dynamic range in {channel} channel")]
    DegenerateSignal {
        /// The offending channel
        channel: Channel,
    },

    /// Peak/valley detection found too few extrema even after the adaptive
    /// prominence retry. The counts guide caller-side parameter adjustment.
    #[error(
        "insufficient extrema for cycle pairing: found {peaks} peak(s) and {valleys} valley(s)"
    )]
    InsufficientExtrema {
        /// Surviving peak count
        peaks: usize,
        /// Surviving valley count
        valleys: usize,
    },

    /// No valid cycle could be formed from the detected extrema.
    #[error("no valid loading cycle could be identified")]
    InsufficientCycles,

    /// Too few points remained to emit a skeleton curve.
    #[error("insufficient skeleton points: {found} found, {required} required")]
    InsufficientSkeletonPoints {
        /// Points available after deduplication
        found: usize,
        /// Minimum points required
        required: usize,
    },

    /// An operation needed processed data that the session does not hold yet.
    #[error("no processed data: {operation} requires a prior successful process step")]
    NoProcessedData {
        /// The operation that was attempted
        operation: &'static str,
    },

    /// A cycle number did not refer to any known cycle.
    #[error("unknown cycle number {number}")]
    UnknownCycle {
        /// The 1-based cycle ordinal that was requested
        number: usize,
    },

    /// Multi-case aggregation needs at least two stored workcases.
    #[error("multi-case skeleton requires at least 2 workcases, store holds {stored}")]
    TooFewWorkcases {
        /// Number of workcases currently stored
        stored: usize,
    },

    /// Configuration file could not be read or parsed.
    #[error("configuration error: {reason}")]
    Config {
        /// Human-readable failure description
        reason: String,
    },
}

impl From<std::io::Error> for HysteresisError {
    fn from(err: std::io::Error) -> Self {
        HysteresisError::Config {
            reason: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for HysteresisError {
    fn from(err: toml::de::Error) -> Self {
        HysteresisError::Config {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for HysteresisError {
    fn from(err: serde_json::Error) -> Self {
        HysteresisError::Config {
            reason: err.to_string(),
        }
    }
}
