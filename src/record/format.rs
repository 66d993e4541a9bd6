//! Persisted record shape.
//!
//! One record per processed sample, field names and ordering matching the
//! historical file format consumers already parse: `bpm_camera` is present
//! only on samples that carried a BPM reading, never null, and
//! `timestampDate` is omitted when no wall-clock time was captured.

use crate::capture::Sample;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

/// JSON record written for one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// ISO-8601 wall-clock capture time, omitted when unavailable.
    #[serde(rename = "timestampDate", skip_serializing_if = "Option::is_none", default)]
    pub timestamp_date: Option<String>,
    /// Monotonic seconds since stream start.
    pub timestamp: f64,
    /// Device-uptime seconds.
    pub uptime: f64,
    /// Red channel intensity.
    pub red: f64,
    /// Green channel intensity.
    pub green: f64,
    /// Blue channel intensity.
    pub blue: f64,
    /// Derived red intensity factor.
    #[serde(rename = "redLevel")]
    pub red_level: f64,
    /// BPM computed for this sample, omitted entirely when absent.
    #[serde(rename = "bpm_camera", skip_serializing_if = "Option::is_none", default)]
    pub bpm_camera: Option<u16>,
}

impl From<&Sample> for SampleRecord {
    fn from(sample: &Sample) -> Self {
        Self {
            timestamp_date: sample
                .timestamp_date()
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            timestamp: sample.timestamp(),
            uptime: sample.uptime(),
            red: sample.red(),
            green: sample.green(),
            blue: sample.blue(),
            red_level: sample.red_level(),
            bpm_camera: sample.reading().map(|r| r.bpm),
        }
    }
}
