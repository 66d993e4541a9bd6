//! Frame source abstraction for sample ingestion.
//!
//! This module provides a trait-based abstraction over the producer of
//! optical samples, allowing both real capture backends and synthetic
//! implementations for testing and demonstration.

use super::{CaptureConfig, Sample};
use std::f64::consts::TAU;
use thiserror::Error;

/// Errors that can occur while producing samples.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("frame source not found: {0}")]
    DeviceNotFound(String),
    #[error("failed to open frame source: {0}")]
    OpenFailed(String),
    #[error("failed to configure frame source: {0}")]
    ConfigFailed(String),
    #[error("failed to produce sample: {0}")]
    SampleFailed(String),
    #[error("frame source not initialized")]
    NotInitialized,
}

/// Trait for sample producers.
///
/// Implementations supply samples in increasing timestamp order at an
/// approximately fixed rate. The pipeline makes no assumption about the
/// exact rate beyond elapsed-time comparisons on the timestamps themselves.
pub trait FrameSource {
    /// Opens and initializes the source with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), SourceError>;

    /// Produces the next sample.
    fn next_sample(&mut self) -> Result<Sample, SourceError>;

    /// Checks if the source is currently open.
    fn is_open(&self) -> bool;

    /// Closes the source and releases resources.
    fn close(&mut self);
}

/// Uptime offset applied by the synthetic source, standing in for a device
/// that has been up a while before the stream starts.
const SYNTHETIC_UPTIME_BASE: f64 = 1000.0;

/// Synthetic frame source generating a pulsatile waveform.
///
/// Produces a deterministic photoplethysmographic signal at a configurable
/// simulated heart rate. The coverage state can be toggled to exercise the
/// intelligent-start gate and the quality signals.
#[derive(Debug, Default)]
pub struct SyntheticSource {
    config: Option<CaptureConfig>,
    frame_index: u64,
    simulated_bpm: f64,
    covered: bool,
    wall_clock_start: Option<chrono::DateTime<chrono::Utc>>,
}

impl SyntheticSource {
    /// Creates a synthetic source pulsing at 72 BPM, lens covered.
    pub fn new() -> Self {
        Self {
            simulated_bpm: 72.0,
            covered: true,
            ..Self::default()
        }
    }

    /// Creates a synthetic source with a specific simulated heart rate.
    pub fn with_bpm(bpm: f64) -> Self {
        Self {
            simulated_bpm: bpm,
            ..Self::new()
        }
    }

    /// Sets whether subsequent samples report the lens as covered.
    pub fn set_covered(&mut self, covered: bool) {
        self.covered = covered;
    }

    /// Returns the simulated heart rate in BPM.
    pub fn simulated_bpm(&self) -> f64 {
        self.simulated_bpm
    }
}

impl FrameSource for SyntheticSource {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), SourceError> {
        config
            .validate()
            .map_err(|e| SourceError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.frame_index = 0;
        self.wall_clock_start = Some(chrono::Utc::now());
        tracing::info!(bpm = self.simulated_bpm, "SyntheticSource opened");
        Ok(())
    }

    fn next_sample(&mut self) -> Result<Sample, SourceError> {
        let config = self.config.as_ref().ok_or(SourceError::NotInitialized)?;

        let dt = 1.0 / config.fps as f64;
        let t = self.frame_index as f64 * dt;

        // Fundamental plus a second harmonic approximates the asymmetric
        // systolic upstroke of a real PPG waveform.
        let phase = TAU * (self.simulated_bpm / 60.0) * t;
        let pulse = phase.sin() + 0.3 * (2.0 * phase).sin();

        let sample = if self.covered {
            // Finger over the lens: red floods the sensor, the pulse rides
            // mostly on the green channel.
            let red = 0.92 + 0.02 * pulse;
            let green = 0.45 + 0.05 * pulse;
            let blue = 0.08 + 0.01 * pulse;
            Sample::new(t, SYNTHETIC_UPTIME_BASE + t, red, green, blue, 2.5)
        } else {
            // Ambient scene: mid-intensity channels, no dominant red.
            let red = 0.30 + 0.01 * pulse;
            let green = 0.35;
            let blue = 0.40;
            Sample::new(t, SYNTHETIC_UPTIME_BASE + t, red, green, blue, 1.0)
        };

        let sample = match self.wall_clock_start {
            Some(start) => {
                let offset = chrono::Duration::microseconds((t * 1e6) as i64);
                sample.with_wall_clock(start + offset)
            }
            None => sample,
        };

        self.frame_index += 1;
        Ok(sample)
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("SyntheticSource closed");
    }
}
