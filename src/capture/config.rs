//! Capture and pipeline configuration.
//!
//! Sampling rate is assumed to be approximately fixed; the estimator
//! measures the actual rate from sample timestamps rather than trusting
//! the configured value.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analysis::{FeedbackConfig, GateConfig};
use crate::estimator::EstimatorConfig;

/// Configuration for the frame source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Camera device index or identifier.
    pub device_id: u32,
    /// Target samples per second.
    pub fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { device_id: 0, fps: 60 }
    }
}

impl CaptureConfig {
    /// Creates a configuration with the specified sampling rate.
    pub fn with_fps(fps: u32) -> Self {
        Self {
            fps,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 || self.fps > 120 {
            return Err(ConfigError::InvalidFrameRate);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid frame rate (must be 1-120 fps)")]
    InvalidFrameRate,
    #[error("invalid estimator window (need at least 2 samples)")]
    InvalidWindow,
    #[error("invalid BPM range (min must be below max)")]
    InvalidBpmRange,
    #[error("invalid confidence floor (must be within 0.0-1.0)")]
    InvalidConfidence,
    #[error("invalid gate threshold (must be at least 1 frame)")]
    InvalidGateThreshold,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub estimator: EstimatorConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON record file.
    pub record_path: String,
    /// Run continuously (true) or process a fixed number of frames (false).
    pub continuous: bool,
    /// Number of frames to process if not continuous.
    pub frame_count: u32,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            record_path: "pulse_records.json".to_string(),
            continuous: false,
            frame_count: 600,
            metrics_port: 9090,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        self.gate.validate()?;
        self.estimator.validate()?;
        Ok(())
    }
}
