//! Signal-quality feedback derivation.
//!
//! Folds one sample's coverage state and raw classifier flags into the
//! set of quality signals actually reported to listeners. The whole tier
//! can be switched off at construction to reduce consumer-side noise.

use crate::capture::Sample;
use serde::{Deserialize, Serialize};

/// Feedback policy, fixed at pipeline construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Whether quality signals are computed and delivered at all.
    pub enabled: bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// The checks that only run while the lens is covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoveredChecks {
    /// Heart rate outside the plausible band.
    pub abnormal_hr: bool,
    /// Heart rate trending downward.
    pub declining_hr: bool,
    /// Contact pressure excessive. A declining heart rate takes
    /// precedence: a real decline is an expected pressure side effect,
    /// not an error to flag.
    pub pressure_excessive: bool,
}

/// Quality signals derived from one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualitySignals {
    /// Coverage state, reported on every sample.
    pub camera_covered: bool,
    /// Present only on covered samples.
    pub checks: Option<CoveredChecks>,
}

/// Derives per-sample quality signals under the feedback policy.
pub struct QualitySignalAggregator {
    enabled: bool,
}

impl QualitySignalAggregator {
    /// Creates an aggregator with the given feedback policy.
    pub fn new(config: &FeedbackConfig) -> Self {
        Self {
            enabled: config.enabled,
        }
    }

    /// Derives the quality signals for one sample.
    ///
    /// Returns `None` when feedback is disabled: nothing is computed and
    /// nothing is delivered. Otherwise the coverage signal is always
    /// present, and the three covered-branch checks only when the sample
    /// reports the lens covered.
    pub fn derive(&self, sample: &Sample) -> Option<QualitySignals> {
        if !self.enabled {
            return None;
        }

        if sample.is_covering_lens() {
            Some(QualitySignals {
                camera_covered: true,
                checks: Some(CoveredChecks {
                    abnormal_hr: sample.abnormal_hr(),
                    declining_hr: sample.declining_hr(),
                    pressure_excessive: sample.is_pressure_excessive() && !sample.declining_hr(),
                }),
            })
        } else {
            Some(QualitySignals {
                camera_covered: false,
                checks: None,
            })
        }
    }
}
