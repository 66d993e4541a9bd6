//! Pulse frequency search via autocorrelation.
//!
//! The blood-volume pulse shows up as a periodic swing on the green
//! channel. Autocorrelation of the detrended window peaks at the lag of
//! the beat period; the normalized peak height doubles as a confidence
//! measure.

/// Searches the physiologically plausible lag range for the beat period.
#[derive(Debug, Clone)]
pub struct PulseAnalyzer {
    /// Lowest BPM considered a valid pulse.
    min_bpm: f64,
    /// Highest BPM considered a valid pulse.
    max_bpm: f64,
    /// Normalized correlation a peak must reach to be trusted.
    min_confidence: f64,
}

/// A detected pulse periodicity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulsePeak {
    /// Beats per minute at the best lag.
    pub bpm: f64,
    /// Normalized autocorrelation at the best lag, in [0, 1].
    pub confidence: f64,
}

impl PulseAnalyzer {
    /// Creates an analyzer bounded to the given BPM range.
    pub fn new(min_bpm: f64, max_bpm: f64, min_confidence: f64) -> Self {
        Self {
            min_bpm,
            max_bpm,
            min_confidence,
        }
    }

    /// Searches for a dominant periodicity in the window.
    ///
    /// Returns `None` when the signal carries no variation, the lag range
    /// is out of reach for the window length, or the best peak is too weak
    /// to trust. Deterministic for a given input.
    pub fn analyze(&self, values: &[f64], sample_rate: f64) -> Option<PulsePeak> {
        if values.len() < 4 || sample_rate <= 0.0 {
            return None;
        }

        let smoothed = smooth3(values);

        let n = smoothed.len() as f64;
        let mean: f64 = smoothed.iter().sum::<f64>() / n;
        let variance: f64 = smoothed.iter().map(|v| (v - mean).powi(2)).sum();

        if variance <= f64::EPSILON {
            // Flat signal: no pulse to find.
            return None;
        }

        // Beat period bounds expressed in sample lags.
        let lag_min = ((sample_rate * 60.0 / self.max_bpm).floor() as usize).max(1);
        let lag_max = ((sample_rate * 60.0 / self.min_bpm).ceil() as usize).min(smoothed.len() - 1);
        if lag_min >= lag_max {
            return None;
        }

        let mut best_lag = 0usize;
        let mut best_corr = f64::NEG_INFINITY;

        for lag in lag_min..=lag_max {
            let covariance: f64 = smoothed[..smoothed.len() - lag]
                .iter()
                .zip(&smoothed[lag..])
                .map(|(a, b)| (a - mean) * (b - mean))
                .sum();
            let corr = covariance / variance;

            if corr > best_corr {
                best_corr = corr;
                best_lag = lag;
            }
        }

        let confidence = best_corr.clamp(0.0, 1.0);
        if confidence < self.min_confidence {
            tracing::debug!(confidence, "Autocorrelation peak below confidence floor");
            return None;
        }

        let bpm = 60.0 * sample_rate / best_lag as f64;
        if bpm < self.min_bpm || bpm > self.max_bpm {
            return None;
        }

        Some(PulsePeak { bpm, confidence })
    }
}

/// Three-point moving average, trimming nothing at the edges.
fn smooth3(values: &[f64]) -> Vec<f64> {
    if values.len() < 3 {
        return values.to_vec();
    }
    let mut out = Vec::with_capacity(values.len());
    out.push(values[0]);
    for w in values.windows(3) {
        out.push((w[0] + w[1] + w[2]) / 3.0);
    }
    out.push(values[values.len() - 1]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn sine_window(bpm: f64, rate: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let t = i as f64 / rate;
                0.45 + 0.05 * (TAU * bpm / 60.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_finds_72_bpm_tone() {
        let analyzer = PulseAnalyzer::new(40.0, 200.0, 0.25);
        let values = sine_window(72.0, 60.0, 256);

        let peak = analyzer.analyze(&values, 60.0).unwrap();
        assert!((peak.bpm - 72.0).abs() < 3.0, "got {} bpm", peak.bpm);
        assert!(peak.confidence > 0.5);
    }

    #[test]
    fn test_finds_slow_pulse() {
        let analyzer = PulseAnalyzer::new(40.0, 200.0, 0.25);
        let values = sine_window(48.0, 60.0, 256);

        let peak = analyzer.analyze(&values, 60.0).unwrap();
        assert!((peak.bpm - 48.0).abs() < 3.0, "got {} bpm", peak.bpm);
    }

    #[test]
    fn test_constant_signal_yields_nothing() {
        let analyzer = PulseAnalyzer::new(40.0, 200.0, 0.25);
        let values = vec![0.5; 256];

        assert!(analyzer.analyze(&values, 60.0).is_none());
    }

    #[test]
    fn test_short_window_yields_nothing() {
        let analyzer = PulseAnalyzer::new(40.0, 200.0, 0.25);
        assert!(analyzer.analyze(&[0.1, 0.2], 60.0).is_none());
    }

    #[test]
    fn test_confidence_within_unit_interval() {
        let analyzer = PulseAnalyzer::new(40.0, 200.0, 0.0);
        let values = sine_window(100.0, 60.0, 256);

        let peak = analyzer.analyze(&values, 60.0).unwrap();
        assert!((0.0..=1.0).contains(&peak.confidence));
    }
}
