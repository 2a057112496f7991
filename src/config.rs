//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the tide-chain.toml file.
//! It provides a centralized way to configure window spacing, legacy top-N
//! selection and input interpretation.

use crate::anchor::DEFAULT_NUMERIC_TOLERANCE;
use crate::ingest::{self, IngestError, IngestOptions};
use crate::top_n::{DEFAULT_COUNT, DEFAULT_MIN_GAP_HOURS};
use crate::window::WindowParams;
use crate::ChainError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "tide-chain.toml";

/// Application configuration loaded from tide-chain.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Chain-building parameters
    pub analysis: AnalysisConfig,
    /// Legacy top-N selection parameters
    pub legacy: LegacyConfig,
    /// How input files are read and filtered
    pub input: InputConfig,
}

/// Chain-building configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Expected spacing between a high and the next low, in hours
    pub gap_hours: f64,
    /// Slack around `gap_hours` on either side, in hours
    pub tolerance_hours: f64,
    /// Absolute tolerance when matching a forward low against the series minimum
    pub numeric_tolerance: f64,
}

/// Legacy top-N configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LegacyConfig {
    /// Extrema picked per kind
    pub count: usize,
    /// Minimum spacing between picked extrema, in hours
    pub min_gap_hours: f64,
}

/// Input interpretation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    /// Reference level; stored values become `datum_constant - raw`
    pub datum_constant: f64,
    /// chrono format string of the timestamp column
    pub timestamp_format: String,
    /// Zero-based column holding the raw level
    pub value_column: usize,
    /// Forward moving-average width in samples (0 disables)
    pub smoothing_window: usize,
    /// Inclusive first date, mm/dd/yyyy
    pub start_date: Option<String>,
    /// Inclusive last date, mm/dd/yyyy
    pub end_date: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let window = WindowParams::default();
        AnalysisConfig {
            gap_hours: window.gap_hours,
            tolerance_hours: window.tolerance_hours,
            numeric_tolerance: DEFAULT_NUMERIC_TOLERANCE,
        }
    }
}

impl Default for LegacyConfig {
    fn default() -> Self {
        LegacyConfig {
            count: DEFAULT_COUNT,
            min_gap_hours: DEFAULT_MIN_GAP_HOURS,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            datum_constant: 0.0,
            timestamp_format: ingest::DEFAULT_TIMESTAMP_FORMAT.to_string(),
            value_column: 2,
            smoothing_window: 0,
            start_date: None,
            end_date: None,
        }
    }
}

impl AnalysisConfig {
    /// Validated window parameters for chain building
    pub fn window(&self) -> Result<WindowParams, ChainError> {
        WindowParams::new(self.gap_hours, self.tolerance_hours)
    }
}

impl InputConfig {
    /// Ingestion options with the date strings parsed
    pub fn ingest_options(&self) -> Result<IngestOptions, IngestError> {
        Ok(IngestOptions {
            timestamp_format: self.timestamp_format.clone(),
            value_column: self.value_column,
            datum_constant: self.datum_constant,
            start_date: self.start_date.as_deref().map(ingest::parse_date).transpose()?,
            end_date: self.end_date.as_deref().map(ingest::parse_date).transpose()?,
            smoothing_window: self.smoothing_window,
        })
    }
}

impl Config {
    /// Load configuration from tide-chain.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.as_ref().display());
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format: {}", e);
                    warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found, using default configuration");
                Self::default()
            }
        }
    }

    /// Save current configuration to the given path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}
