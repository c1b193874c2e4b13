// src/config/loader.rs
//! Configuration loading from TOML and JSON files

use std::path::Path;

use crate::config::AnalysisConfig;
use crate::error::Result;

/// Loads [`AnalysisConfig`] values from TOML or JSON sources.
///
/// Missing keys fall back to the crate defaults, so a partial file that only
/// overrides a handful of parameters is valid.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Parse a configuration from a TOML string.
    pub fn load_from_str(source: &str) -> Result<AnalysisConfig> {
        let config: AnalysisConfig = toml::from_str(source)?;
        Ok(config)
    }

    /// Parse a configuration from a JSON string.
    pub fn load_from_json(source: &str) -> Result<AnalysisConfig> {
        let config: AnalysisConfig = serde_json::from_str(source)?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    ///
    /// Files with a `.json` extension are parsed as JSON, everything else
    /// as TOML.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<AnalysisConfig> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::load_from_json(&contents)
        } else {
            Self::load_from_str(&contents)
        }
    }
}
