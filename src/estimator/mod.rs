//! BPM estimation from buffered optical samples.
//!
//! This module buffers the pulse channel of incoming samples and, once
//! the window is full and enough time has elapsed, searches it for the
//! dominant beat frequency. Estimates carry a confidence score; weak or
//! implausible results are suppressed rather than reported.

mod autocorrelation;
mod window;

pub use autocorrelation::{PulseAnalyzer, PulsePeak};
pub use window::{SampleWindow, WindowPoint};

use crate::capture::Sample;
use serde::{Deserialize, Serialize};

/// A BPM estimate with its confidence score.
///
/// The two values travel together by construction: a sample either has a
/// full reading or none at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BpmReading {
    /// Beats per minute.
    pub bpm: u16,
    /// Estimate confidence in [0, 1].
    pub confidence: f32,
}

impl BpmReading {
    /// Creates a reading, clamping confidence into [0, 1].
    pub fn new(bpm: u16, confidence: f32) -> Self {
        Self {
            bpm,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Estimator tuning parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Window capacity in samples.
    pub window_len: usize,
    /// Minimum time the window must span before estimating, in seconds.
    pub min_window_seconds: f64,
    /// Samples between successive estimates.
    pub estimate_interval: u32,
    /// Lowest BPM accepted as a valid estimate.
    pub min_bpm: u16,
    /// Highest BPM accepted as a valid estimate.
    pub max_bpm: u16,
    /// Normalized correlation an estimate must reach to be reported.
    pub min_confidence: f32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            window_len: 256,
            min_window_seconds: 3.0,
            estimate_interval: 30,
            min_bpm: 40,
            max_bpm: 200,
            min_confidence: 0.25,
        }
    }
}

impl EstimatorConfig {
    /// Validates the tuning parameters.
    pub fn validate(&self) -> Result<(), crate::capture::ConfigError> {
        use crate::capture::ConfigError;

        if self.window_len < 2 {
            return Err(ConfigError::InvalidWindow);
        }
        if self.min_bpm == 0 || self.min_bpm >= self.max_bpm {
            return Err(ConfigError::InvalidBpmRange);
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::InvalidConfidence);
        }
        Ok(())
    }
}

/// Stateful BPM estimator over a sliding sample window.
///
/// Created once per recording session; there is no reset operation, a new
/// session gets a new estimator.
pub struct BpmEstimator {
    window: SampleWindow,
    analyzer: PulseAnalyzer,
    config: EstimatorConfig,
    since_last_estimate: u32,
}

impl BpmEstimator {
    /// Creates an estimator with the given tuning.
    pub fn new(config: EstimatorConfig) -> Self {
        let analyzer = PulseAnalyzer::new(
            config.min_bpm as f64,
            config.max_bpm as f64,
            config.min_confidence as f64,
        );
        Self {
            window: SampleWindow::new(config.window_len),
            analyzer,
            // First estimate fires as soon as the window qualifies.
            since_last_estimate: config.estimate_interval,
            config,
        }
    }

    /// Buffers the sample's pulse channel. Never fails, never blocks.
    ///
    /// Non-finite channel values are dropped from the estimation window;
    /// the sample itself still flows to persistence and the gate.
    pub fn add_sample(&mut self, sample: &Sample) {
        if self.window.push(sample.timestamp(), sample.green()) {
            self.since_last_estimate = self.since_last_estimate.saturating_add(1);
        }
    }

    /// Returns true once enough samples and elapsed time are buffered to
    /// produce a statistically meaningful estimate.
    pub fn is_ready_to_process(&self) -> bool {
        self.window.is_full()
            && self.window.elapsed_seconds() >= self.config.min_window_seconds
            && self.since_last_estimate >= self.config.estimate_interval
    }

    /// Computes a BPM estimate from the current window.
    ///
    /// Returns `None` when the window holds no trustworthy periodicity;
    /// garbage is never reported. Resets the estimate interval either way.
    pub fn process_samples(&mut self) -> Option<BpmReading> {
        self.since_last_estimate = 0;

        let rate = self.window.sample_rate()?;
        let peak = self.analyzer.analyze(&self.window.values(), rate)?;

        let reading = BpmReading::new(peak.bpm.round() as u16, peak.confidence as f32);
        tracing::debug!(
            bpm = reading.bpm,
            confidence = reading.confidence,
            rate,
            "BPM estimate"
        );
        Some(reading)
    }

    /// Returns the number of buffered window points.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn pulse_sample(i: usize, rate: f64, bpm: f64) -> Sample {
        let t = i as f64 / rate;
        let green = 0.45 + 0.05 * (TAU * bpm / 60.0 * t).sin();
        Sample::new(t, 1000.0 + t, 0.92, green, 0.08, 2.5)
    }

    #[test]
    fn test_not_ready_until_window_full() {
        let mut estimator = BpmEstimator::new(EstimatorConfig::default());

        for i in 0..100 {
            estimator.add_sample(&pulse_sample(i, 60.0, 72.0));
            assert!(!estimator.is_ready_to_process());
        }
    }

    #[test]
    fn test_estimates_simulated_pulse() {
        let mut estimator = BpmEstimator::new(EstimatorConfig::default());

        let mut reading = None;
        for i in 0..400 {
            estimator.add_sample(&pulse_sample(i, 60.0, 72.0));
            if estimator.is_ready_to_process() {
                reading = estimator.process_samples();
                if reading.is_some() {
                    break;
                }
            }
        }

        let reading = reading.expect("no estimate produced");
        assert!(
            (reading.bpm as i32 - 72).abs() <= 3,
            "got {} bpm",
            reading.bpm
        );
        assert!((0.0..=1.0).contains(&reading.confidence));
    }

    #[test]
    fn test_constant_signal_suppressed() {
        let mut estimator = BpmEstimator::new(EstimatorConfig::default());

        let mut produced = 0;
        for i in 0..400 {
            let t = i as f64 / 60.0;
            let sample = Sample::new(t, 1000.0 + t, 0.9, 0.5, 0.1, 2.5);
            estimator.add_sample(&sample);
            if estimator.is_ready_to_process() && estimator.process_samples().is_some() {
                produced += 1;
            }
        }

        assert_eq!(produced, 0, "constant signal must not produce a BPM");
    }

    #[test]
    fn test_nan_samples_ignored() {
        let mut estimator = BpmEstimator::new(EstimatorConfig::default());

        for i in 0..300 {
            estimator.add_sample(&pulse_sample(i, 60.0, 72.0));
            // Interleave malformed frames; they must not stall or poison
            // the estimate.
            let t = i as f64 / 60.0;
            let bad = Sample::new(t, 1000.0 + t, f64::NAN, f64::NAN, 0.1, 2.5);
            estimator.add_sample(&bad);
        }

        assert!(estimator.is_ready_to_process());
        let reading = estimator.process_samples().expect("no estimate produced");
        assert!((reading.bpm as i32 - 72).abs() <= 3);
    }

    #[test]
    fn test_estimate_interval_respected() {
        let config = EstimatorConfig {
            estimate_interval: 30,
            ..EstimatorConfig::default()
        };
        let mut estimator = BpmEstimator::new(config);

        // Fill and take the first estimate.
        let mut i = 0;
        while !estimator.is_ready_to_process() {
            estimator.add_sample(&pulse_sample(i, 60.0, 72.0));
            i += 1;
        }
        estimator.process_samples();

        // The next 29 samples must not re-arm the estimator.
        for _ in 0..29 {
            estimator.add_sample(&pulse_sample(i, 60.0, 72.0));
            i += 1;
            assert!(!estimator.is_ready_to_process());
        }

        estimator.add_sample(&pulse_sample(i, 60.0, 72.0));
        assert!(estimator.is_ready_to_process());
    }
}
