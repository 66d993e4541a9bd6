//! Sample type representing one optical measurement with metadata.

use crate::estimator::BpmReading;
use chrono::{DateTime, Utc};

/// Red intensity factor above which the lens counts as covered.
const RED_INTENSITY_FACTOR_THRESHOLD: f64 = 2.0;

/// Raw per-sample classifier flags attached by the producer.
///
/// These are the unqualified classifications computed from channel data
/// and recent history; the quality aggregator decides which of them are
/// actually reported downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleFlags {
    /// Instantaneous heart rate outside the plausible band.
    pub abnormal_hr: bool,
    /// Heart rate trending downward across the recent window.
    pub declining_hr: bool,
    /// Contact pressure high enough to suppress the pulse waveform.
    pub pressure_excessive: bool,
}

/// A single optical sample derived from one camera frame.
///
/// Contains channel intensities and clock readings along with the raw
/// classifier flags. Immutable after creation, except that the BPM reading
/// computed for this sample's window may be attached once.
#[derive(Clone)]
pub struct Sample {
    /// Wall-clock capture time, when available.
    timestamp_date: Option<DateTime<Utc>>,
    /// Monotonic seconds since stream start.
    timestamp: f64,
    /// Device-uptime seconds, independent clock.
    uptime: f64,
    /// Normalized red channel intensity.
    red: f64,
    /// Normalized green channel intensity.
    green: f64,
    /// Normalized blue channel intensity.
    blue: f64,
    /// Derived red intensity factor used for lens-coverage detection.
    red_level: f64,
    /// BPM reading attached once the estimator produces one for this sample.
    reading: Option<BpmReading>,
    /// Raw classifier flags.
    flags: SampleFlags,
}

impl Sample {
    /// Creates a new sample from channel intensities and clock readings.
    pub fn new(timestamp: f64, uptime: f64, red: f64, green: f64, blue: f64, red_level: f64) -> Self {
        Self {
            timestamp_date: None,
            timestamp,
            uptime,
            red,
            green,
            blue,
            red_level,
            reading: None,
            flags: SampleFlags::default(),
        }
    }

    /// Attaches a wall-clock capture time.
    pub fn with_wall_clock(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp_date = Some(at);
        self
    }

    /// Attaches raw classifier flags.
    pub fn with_flags(mut self, flags: SampleFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Attaches the BPM reading computed for this sample's window.
    ///
    /// This is the only mutation a sample undergoes after creation.
    pub fn attach_reading(&mut self, reading: BpmReading) {
        self.reading = Some(reading);
    }

    /// Returns the wall-clock capture time, if available.
    #[inline]
    pub fn timestamp_date(&self) -> Option<DateTime<Utc>> {
        self.timestamp_date
    }

    /// Returns monotonic seconds since stream start.
    #[inline]
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Returns device-uptime seconds.
    #[inline]
    pub fn uptime(&self) -> f64 {
        self.uptime
    }

    /// Returns the red channel intensity.
    #[inline]
    pub fn red(&self) -> f64 {
        self.red
    }

    /// Returns the green channel intensity.
    #[inline]
    pub fn green(&self) -> f64 {
        self.green
    }

    /// Returns the blue channel intensity.
    #[inline]
    pub fn blue(&self) -> f64 {
        self.blue
    }

    /// Returns the derived red intensity factor.
    #[inline]
    pub fn red_level(&self) -> f64 {
        self.red_level
    }

    /// Returns the attached BPM reading, if one was computed.
    #[inline]
    pub fn reading(&self) -> Option<BpmReading> {
        self.reading
    }

    /// Returns the raw classifier flags.
    #[inline]
    pub fn flags(&self) -> SampleFlags {
        self.flags
    }

    /// Returns true if the optical sensor is adequately occluded.
    ///
    /// A finger over the lens floods the sensor with red; the derived
    /// red factor crossing the threshold is the coverage classification.
    #[inline]
    pub fn is_covering_lens(&self) -> bool {
        self.red_level >= RED_INTENSITY_FACTOR_THRESHOLD
    }

    /// Returns true if the instantaneous heart rate is classified abnormal.
    #[inline]
    pub fn abnormal_hr(&self) -> bool {
        self.flags.abnormal_hr
    }

    /// Returns true if the heart rate is classified as declining.
    #[inline]
    pub fn declining_hr(&self) -> bool {
        self.flags.declining_hr
    }

    /// Returns true if contact pressure is classified excessive.
    #[inline]
    pub fn is_pressure_excessive(&self) -> bool {
        self.flags.pressure_excessive
    }
}

impl std::fmt::Debug for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sample")
            .field("timestamp", &self.timestamp)
            .field("red", &self.red)
            .field("green", &self.green)
            .field("blue", &self.blue)
            .field("red_level", &self.red_level)
            .field("reading", &self.reading)
            .finish()
    }
}
