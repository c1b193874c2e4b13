// src/session.rs
//! Analysis session: live working state and the workcase store
//!
//! A session owns one test record's working state end to end: the raw and
//! processed series, identified cycles and features, the current skeleton,
//! and the ordered collection of stored workcases. All computation is
//! synchronous and single-threaded; a stored workcase is a deep, independent
//! snapshot, so later reprocessing of the live state never alters it.

use tracing::{debug, info};

use crate::config::{AnalysisConfig, DetectionConfig};
use crate::error::{HysteresisError, Result};
use crate::processing::{
    build_multi_case_skeleton, build_skeleton, compute_results, detect_cycles,
    identify_loading_cycles, preprocess, CycleFeature, LoadingCycles, StiffnessResults,
};
use crate::types::{ChannelInfo, Cycle, Point, SampleSeries, Workcase};

/// Stateful analysis driver for one session.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    config: AnalysisConfig,
    source: Option<String>,
    channels: ChannelInfo,
    raw: Option<SampleSeries>,
    processed: Option<SampleSeries>,
    warnings: Vec<String>,
    cycles: Vec<Cycle>,
    features: Vec<CycleFeature>,
    skeleton: Option<Vec<Point>>,
    parameters: Option<DetectionConfig>,
    workcases: Vec<Workcase>,
}

impl AnalysisSession {
    /// Create a session with the given configuration.
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replace the raw series and reset all downstream state.
    ///
    /// `source` is an opaque identity (typically a file name) carried into
    /// stored workcases. Non-finite samples are sanitized at this boundary.
    pub fn set_raw_series(
        &mut self,
        source: Option<String>,
        channels: ChannelInfo,
        displacement: Vec<f64>,
        force: Vec<f64>,
    ) -> Result<()> {
        let series = SampleSeries::new(displacement, force)?;
        info!(
            source = source.as_deref().unwrap_or("<unnamed>"),
            samples = series.len(),
            "raw series loaded"
        );
        self.source = source;
        self.channels = channels;
        self.raw = Some(series);
        self.reset_derived();
        Ok(())
    }

    /// Drop everything computed from the current raw series.
    fn reset_derived(&mut self) {
        self.processed = None;
        self.warnings.clear();
        self.cycles.clear();
        self.features.clear();
        self.skeleton = None;
        self.parameters = None;
    }

    /// Preprocess the raw series and run direction-based cycle detection.
    ///
    /// On success the session holds the processed series, the cycles and
    /// their features, and records the detection parameters used. The
    /// processed series and preprocessing warnings are retained even when
    /// detection fails, so [`Self::identify_loading_cycles`] can still run
    /// as the fallback detector; the cycle set is left empty in that case.
    pub fn process(&mut self) -> Result<usize> {
        let raw = self.raw.as_ref().ok_or(HysteresisError::NoProcessedData {
            operation: "process",
        })?;

        let output = preprocess(&raw.displacement, &raw.force, &self.config.preprocess)?;
        let processed = SampleSeries::new(output.displacement, output.force)?;

        let detection = self.config.detection.clone();
        let detected = detect_cycles(&processed, &detection);

        self.warnings = output.warnings;
        self.processed = Some(processed);
        self.cycles.clear();
        self.features.clear();
        self.skeleton = None;
        self.parameters = None;

        let (cycles, features) = detected?;
        let count = cycles.len();
        info!(cycles = count, "processing complete");

        self.cycles = cycles;
        self.features = features;
        self.parameters = Some(detection);
        Ok(count)
    }

    /// Run the amplitude-threshold detector on the processed series.
    ///
    /// This replaces the session's cycle set with the detector's output and
    /// records the detection parameters it consulted.
    pub fn identify_loading_cycles(&mut self) -> Result<LoadingCycles> {
        let processed = self
            .processed
            .as_ref()
            .ok_or(HysteresisError::NoProcessedData {
                operation: "identify_loading_cycles",
            })?;
        let detection = self.config.detection.clone();
        let result = identify_loading_cycles(processed, detection.prominence, detection.min_points)?;
        self.cycles = result.cycles.clone();
        self.features = result.features.clone();
        self.skeleton = None;
        self.parameters = Some(detection);
        Ok(result)
    }

    /// Flag a cycle as anomalous, excluding it from averages and skeletons.
    pub fn mark_anomalous(&mut self, cycle_number: usize) -> Result<()> {
        let feature = self
            .features
            .iter_mut()
            .find(|f| f.cycle_number == cycle_number)
            .ok_or(HysteresisError::UnknownCycle {
                number: cycle_number,
            })?;
        feature.anomaly = true;
        debug!(cycle_number, "cycle marked anomalous");
        Ok(())
    }

    /// Per-cycle stiffness and dissipated energy plus the average stiffness.
    pub fn stiffness_results(&self) -> Result<StiffnessResults> {
        let processed = self
            .processed
            .as_ref()
            .ok_or(HysteresisError::NoProcessedData {
                operation: "stiffness_results",
            })?;
        if self.cycles.is_empty() {
            return Err(HysteresisError::InsufficientCycles);
        }
        Ok(compute_results(processed, &self.cycles, &self.features))
    }

    /// Build and store the single-case skeleton curve from the live state.
    pub fn generate_skeleton(&mut self) -> Result<&[Point]> {
        if self.cycles.is_empty() {
            return Err(HysteresisError::InsufficientCycles);
        }
        let skeleton = build_skeleton(&self.features, &self.config.skeleton)?;
        self.skeleton = Some(skeleton);
        Ok(self.skeleton.as_deref().unwrap_or(&[]))
    }

    /// Snapshot the live state as a named workcase.
    ///
    /// The snapshot deep-copies the processed series, cycles and features so
    /// it stays valid when the session is reprocessed. Unnamed cases get
    /// `workcase N`, suffixed with the source identity when one is known.
    pub fn add_workcase(&mut self, name: Option<String>) -> Result<&Workcase> {
        let processed = self
            .processed
            .as_ref()
            .ok_or(HysteresisError::NoProcessedData {
                operation: "add_workcase",
            })?;
        if self.cycles.is_empty() {
            return Err(HysteresisError::InsufficientCycles);
        }

        let name = name.unwrap_or_else(|| {
            let base = format!("workcase {}", self.workcases.len() + 1);
            match &self.source {
                Some(source) => format!("{base} ({source})"),
                None => base,
            }
        });

        let workcase = Workcase {
            name,
            source: self.source.clone(),
            channels: self.channels.clone(),
            series: processed.clone(),
            cycles: self.cycles.clone(),
            features: self.features.clone(),
            skeleton: self.skeleton.clone(),
            parameters: self.parameters.clone(),
        };
        info!(name = %workcase.name, total = self.workcases.len() + 1, "workcase added");
        let index = self.workcases.len();
        self.workcases.push(workcase);
        Ok(&self.workcases[index])
    }

    /// Stored workcases in insertion order.
    pub fn workcases(&self) -> &[Workcase] {
        &self.workcases
    }

    /// Remove all stored workcases.
    pub fn clear_workcases(&mut self) {
        debug!(removed = self.workcases.len(), "workcase store cleared");
        self.workcases.clear();
    }

    /// Combined skeleton curve across all stored workcases.
    ///
    /// `threshold` overrides the configured displacement dedup threshold
    /// when given.
    pub fn multi_case_skeleton(&self, threshold: Option<f64>) -> Result<Vec<Point>> {
        let threshold = threshold.unwrap_or(self.config.skeleton.displacement_threshold);
        build_multi_case_skeleton(&self.workcases, threshold)
    }

    /// The processed series, when processing has run.
    pub fn processed(&self) -> Option<&SampleSeries> {
        self.processed.as_ref()
    }

    /// Warnings accumulated by the last preprocessing run.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// The live cycle set.
    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    /// The live feature set, index-aligned with [`Self::cycles`].
    pub fn features(&self) -> &[CycleFeature] {
        &self.features
    }

    /// The most recently generated single-case skeleton.
    pub fn skeleton(&self) -> Option<&[Point]> {
        self.skeleton.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_session(amplitude: f64, stiffness: f64) -> AnalysisSession {
        let displacement: Vec<f64> = (0..500)
            .map(|i| {
                let t = i as f64 / 500.0;
                amplitude * (2.0 * std::f64::consts::PI * 3.0 * t).sin()
            })
            .collect();
        let force: Vec<f64> = displacement.iter().map(|&d| stiffness * d).collect();
        let mut session = AnalysisSession::new(AnalysisConfig::default());
        session
            .set_raw_series(Some("test.xlsx".to_string()), ChannelInfo::default(), displacement, force)
            .unwrap();
        session
    }

    #[test]
    fn process_before_load_fails() {
        let mut session = AnalysisSession::new(AnalysisConfig::default());
        assert!(matches!(
            session.process(),
            Err(HysteresisError::NoProcessedData { .. })
        ));
    }

    #[test]
    fn full_session_flow() {
        let mut session = sine_session(10.0, 2.0);
        let count = session.process().unwrap();
        assert_eq!(count, 3);
        assert_eq!(session.cycles().len(), 3);

        let results = session.stiffness_results().unwrap();
        assert!((results.average_stiffness - 2.0).abs() < 0.05);

        let skeleton = session.generate_skeleton().unwrap();
        assert!(skeleton.len() >= 2);
    }

    #[test]
    fn reload_resets_derived_state() {
        let mut session = sine_session(10.0, 2.0);
        session.process().unwrap();
        assert!(!session.cycles().is_empty());

        session
            .set_raw_series(None, ChannelInfo::default(), vec![0.0; 20], vec![0.0; 20])
            .unwrap();
        assert!(session.cycles().is_empty());
        assert!(session.processed().is_none());
        assert!(session.skeleton().is_none());
    }

    /// Sine displacement against a constant-zero force channel: the
    /// combined-signal detector cannot normalize the force and fails, but
    /// the displacement alone still carries three clean cycles.
    fn flat_force_session(config: AnalysisConfig) -> AnalysisSession {
        let displacement: Vec<f64> = (0..500)
            .map(|i| {
                let t = i as f64 / 500.0;
                10.0 * (2.0 * std::f64::consts::PI * 3.0 * t).sin()
            })
            .collect();
        let force = vec![0.0; 500];
        let mut session = AnalysisSession::new(config);
        session
            .set_raw_series(None, ChannelInfo::default(), displacement, force)
            .unwrap();
        session
    }

    #[test]
    fn amplitude_detector_runs_after_failed_process() {
        let mut session = flat_force_session(AnalysisConfig::default());
        let err = session.process().unwrap_err();
        assert!(matches!(err, HysteresisError::DegenerateSignal { .. }));
        // The processed series survives the detection failure; only the
        // cycle state is left empty.
        assert!(session.processed().is_some());
        assert!(session.cycles().is_empty());
        assert!(session.features().is_empty());

        let result = session.identify_loading_cycles().unwrap();
        assert!(!result.cycles.is_empty());
        assert_eq!(session.cycles().len(), result.cycles.len());
    }

    #[test]
    fn amplitude_detector_records_parameters() {
        let mut session = flat_force_session(AnalysisConfig {
            detection: DetectionConfig {
                prominence: 0.17,
                min_points: 8,
                ..DetectionConfig::default()
            },
            ..AnalysisConfig::default()
        });
        session.process().unwrap_err();
        session.identify_loading_cycles().unwrap();

        let workcase = session.add_workcase(None).unwrap();
        let parameters = workcase.parameters.as_ref().unwrap();
        assert_eq!(parameters.prominence, 0.17);
        assert_eq!(parameters.min_points, 8);
    }

    #[test]
    fn workcase_snapshot_survives_reprocessing() {
        let mut session = sine_session(10.0, 2.0);
        session.process().unwrap();
        session.add_workcase(Some("case-a".to_string())).unwrap();
        let stored_features = session.workcases()[0].features.clone();

        // Mutate the live state; the snapshot must be unaffected.
        let first = session.cycles()[0].number;
        session.mark_anomalous(first).unwrap();
        assert!(session.features()[0].anomaly);
        assert_eq!(session.workcases()[0].features, stored_features);
        assert!(!session.workcases()[0].features[0].anomaly);
    }

    #[test]
    fn auto_names_include_source() {
        let mut session = sine_session(10.0, 2.0);
        session.process().unwrap();
        let name = session.add_workcase(None).unwrap().name.clone();
        assert_eq!(name, "workcase 1 (test.xlsx)");
    }

    #[test]
    fn multi_case_skeleton_over_two_amplitudes() {
        let mut session = sine_session(10.0, 2.0);
        session.process().unwrap();
        session.add_workcase(Some("a".to_string())).unwrap();

        // Second case at a different amplitude to spread the peak points.
        let displacement: Vec<f64> = (0..500)
            .map(|i| {
                let t = i as f64 / 500.0;
                20.0 * (2.0 * std::f64::consts::PI * 3.0 * t).sin()
            })
            .collect();
        let force: Vec<f64> = displacement.iter().map(|&d| 2.0 * d).collect();
        session
            .set_raw_series(None, ChannelInfo::default(), displacement, force)
            .unwrap();
        session.process().unwrap();
        session.add_workcase(Some("b".to_string())).unwrap();

        let skeleton = session.multi_case_skeleton(None).unwrap();
        assert!(skeleton.len() >= 4);
        assert!(skeleton
            .windows(2)
            .all(|w| w[0].displacement <= w[1].displacement));
    }

    #[test]
    fn mark_anomalous_unknown_cycle_fails() {
        let mut session = sine_session(10.0, 2.0);
        session.process().unwrap();
        assert!(matches!(
            session.mark_anomalous(99),
            Err(HysteresisError::UnknownCycle { number: 99 })
        ));
    }

    #[test]
    fn clear_workcases_empties_store() {
        let mut session = sine_session(10.0, 2.0);
        session.process().unwrap();
        session.add_workcase(None).unwrap();
        session.clear_workcases();
        assert!(session.workcases().is_empty());
        assert!(matches!(
            session.multi_case_skeleton(None),
            Err(HysteresisError::TooFewWorkcases { stored: 0 })
        ));
    }
}
