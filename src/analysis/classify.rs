//! Raw per-sample classifiers.
//!
//! Producers attach abnormal/declining/pressure flags to each sample
//! before it enters the pipeline. This classifier derives those flags
//! from the channel data and a short history window: the instantaneous
//! pulse rate comes from interpolated rising zero crossings of the
//! demeaned green channel, and pressure from a saturated red channel
//! with a collapsed pulse swing.

use crate::capture::{Sample, SampleFlags};
use std::collections::VecDeque;

/// Seconds of green-channel history kept for rate measurement.
const HISTORY_SECONDS: f64 = 4.0;
/// Seconds of measured-rate history kept for trend detection.
const RATE_RETENTION_SECONDS: f64 = 8.0;
/// Minimum history span before any flag is derived.
const MIN_EVAL_SECONDS: f64 = 2.0;
/// Minimum green peak-to-peak swing for the rate to be measurable.
const MIN_SWING: f64 = 0.005;
/// Plausible instantaneous rate band, in BPM.
const ABNORMAL_LOW_BPM: f64 = 40.0;
const ABNORMAL_HIGH_BPM: f64 = 180.0;
/// Rate drop against the lookback rate that counts as declining, in BPM.
const DECLINE_DROP_BPM: f64 = 8.0;
/// How far back the declining comparison looks, in seconds.
const DECLINE_LOOKBACK_SECONDS: f64 = 2.0;
/// Red level at which contact pressure is suspected.
const PRESSURE_RED_FLOOR: f64 = 0.97;
/// Green swing below which the pulse counts as suppressed.
const PRESSURE_SWING_CEILING: f64 = 0.01;

/// Derives raw classifier flags from channel data and recent history.
pub struct SampleClassifier {
    /// Recent (timestamp, green) points.
    history: VecDeque<(f64, f64)>,
    /// Recent (timestamp, measured BPM) evaluations.
    rates: VecDeque<(f64, f64)>,
}

impl SampleClassifier {
    /// Creates an empty classifier.
    pub fn new() -> Self {
        Self {
            history: VecDeque::new(),
            rates: VecDeque::new(),
        }
    }

    /// Classifies one sample, updating the history.
    ///
    /// Until the history spans enough time, all flags stay clear.
    pub fn classify(&mut self, sample: &Sample) -> SampleFlags {
        let t = sample.timestamp();
        if t.is_finite() && sample.green().is_finite() {
            self.history.push_back((t, sample.green()));
        }
        while let Some(&(front_t, _)) = self.history.front() {
            if t - front_t > HISTORY_SECONDS {
                self.history.pop_front();
            } else {
                break;
            }
        }

        let mut flags = SampleFlags::default();

        let elapsed = match self.history.front() {
            Some(&(front_t, _)) => t - front_t,
            None => 0.0,
        };
        if elapsed < MIN_EVAL_SECONDS {
            return flags;
        }

        let greens: Vec<f64> = self.history.iter().map(|&(_, g)| g).collect();
        let min = greens.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = greens.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let swing = max - min;

        flags.pressure_excessive =
            sample.red() >= PRESSURE_RED_FLOOR && swing < PRESSURE_SWING_CEILING;

        if swing < MIN_SWING {
            // No measurable pulse swing; rate-based flags stay clear.
            return flags;
        }

        let rate = self.measure_rate();
        match rate {
            Some(bpm) => {
                flags.abnormal_hr = bpm < ABNORMAL_LOW_BPM || bpm > ABNORMAL_HIGH_BPM;

                flags.declining_hr = self
                    .lookback_rate(t)
                    .map(|earlier| earlier - bpm > DECLINE_DROP_BPM)
                    .unwrap_or(false);

                self.rates.push_back((t, bpm));
                while let Some(&(front_t, _)) = self.rates.front() {
                    if t - front_t > RATE_RETENTION_SECONDS {
                        self.rates.pop_front();
                    } else {
                        break;
                    }
                }
            }
            None => {
                // Swing present but under one full cycle observed:
                // slower than anything plausible.
                flags.abnormal_hr = true;
            }
        }

        flags
    }

    /// Measures the instantaneous pulse rate from rising zero crossings.
    ///
    /// Crossing times are linearly interpolated between samples; the rate
    /// is cycles-per-second over the first-to-last crossing span, which is
    /// stable against the window boundary sliding across a cycle.
    fn measure_rate(&self) -> Option<f64> {
        let n = self.history.len();
        if n < 4 {
            return None;
        }
        let mean: f64 = self.history.iter().map(|&(_, g)| g).sum::<f64>() / n as f64;

        let mut crossings: Vec<f64> = Vec::new();
        let mut prev: Option<(f64, f64)> = None;
        for &(t, g) in &self.history {
            let v = g - mean;
            if let Some((pt, pv)) = prev {
                if pv <= 0.0 && v > 0.0 {
                    let frac = if (v - pv).abs() > f64::EPSILON {
                        -pv / (v - pv)
                    } else {
                        0.0
                    };
                    crossings.push(pt + frac * (t - pt));
                }
            }
            prev = Some((t, v));
        }

        if crossings.len() < 2 {
            return None;
        }
        let span = crossings[crossings.len() - 1] - crossings[0];
        if span <= 0.0 {
            return None;
        }
        Some((crossings.len() - 1) as f64 / span * 60.0)
    }

    /// Returns the most recent measured rate at least the lookback
    /// interval older than `now`.
    fn lookback_rate(&self, now: f64) -> Option<f64> {
        self.rates
            .iter()
            .rev()
            .find(|&&(t, _)| now - t >= DECLINE_LOOKBACK_SECONDS)
            .map(|&(_, bpm)| bpm)
    }
}

impl Default for SampleClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn pulse_sample(t: f64, bpm: f64) -> Sample {
        let green = 0.45 + 0.05 * (TAU * bpm / 60.0 * t).sin();
        Sample::new(t, 1000.0 + t, 0.92, green, 0.08, 2.5)
    }

    fn run_pulse(classifier: &mut SampleClassifier, bpm: f64, from: f64, until: f64) -> SampleFlags {
        let mut flags = SampleFlags::default();
        let mut t = from;
        while t < until {
            flags = classifier.classify(&pulse_sample(t, bpm));
            t += 1.0 / 60.0;
        }
        flags
    }

    #[test]
    fn test_normal_pulse_all_clear() {
        let mut classifier = SampleClassifier::new();
        let flags = run_pulse(&mut classifier, 72.0, 0.0, 10.0);

        assert!(!flags.abnormal_hr);
        assert!(!flags.declining_hr);
        assert!(!flags.pressure_excessive);
    }

    #[test]
    fn test_slow_pulse_flagged_abnormal() {
        let mut classifier = SampleClassifier::new();
        let flags = run_pulse(&mut classifier, 30.0, 0.0, 10.0);

        assert!(flags.abnormal_hr);
    }

    #[test]
    fn test_fast_pulse_flagged_abnormal() {
        let mut classifier = SampleClassifier::new();
        let flags = run_pulse(&mut classifier, 190.0, 0.0, 10.0);

        assert!(flags.abnormal_hr);
    }

    #[test]
    fn test_rate_drop_flagged_declining() {
        let mut classifier = SampleClassifier::new();
        run_pulse(&mut classifier, 100.0, 0.0, 6.0);

        // After the rate drops sharply, some sample in the transition
        // window must report a decline.
        let mut saw_decline = false;
        let mut t = 6.0;
        while t < 12.0 {
            let flags = classifier.classify(&pulse_sample(t, 70.0));
            saw_decline |= flags.declining_hr;
            t += 1.0 / 60.0;
        }
        assert!(saw_decline);
    }

    #[test]
    fn test_steady_rate_not_declining() {
        let mut classifier = SampleClassifier::new();
        let mut t = 0.0;
        while t < 15.0 {
            let flags = classifier.classify(&pulse_sample(t, 72.0));
            assert!(!flags.declining_hr, "false decline at t={}", t);
            t += 1.0 / 60.0;
        }
    }

    #[test]
    fn test_saturated_flat_signal_flags_pressure() {
        let mut classifier = SampleClassifier::new();
        let mut flags = SampleFlags::default();
        let mut t = 0.0;
        while t < 5.0 {
            let sample = Sample::new(t, 1000.0 + t, 0.98, 0.5, 0.05, 2.8);
            flags = classifier.classify(&sample);
            t += 1.0 / 60.0;
        }

        assert!(flags.pressure_excessive);
        // Rate-based flags need a measurable swing and stay clear here.
        assert!(!flags.declining_hr);
    }

    #[test]
    fn test_warmup_period_all_clear() {
        let mut classifier = SampleClassifier::new();
        // Under the evaluation span nothing is classified yet.
        let flags = run_pulse(&mut classifier, 30.0, 0.0, 1.5);

        assert!(!flags.abnormal_hr);
        assert!(!flags.pressure_excessive);
    }
}
