//! Optical Pulse Library
//!
//! A camera-based photoplethysmography (PPG) pipeline: a finger placed
//! over a phone camera and flash modulates the reflected light with each
//! heartbeat, and this library turns that optical sample stream into a
//! heart-rate estimate with real-time signal-quality feedback.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! capture → estimator → record (persistence)
//!     ↓         ↓
//!  analysis (gate + quality) → pipeline → consumer events
//! ```
//!
//! # Design Principles
//!
//! - **Gate before trusting**: recording officially starts only after the
//!   lens has been covered for a sustained run of frames
//! - **No garbage estimates**: weak or implausible BPM results are
//!   suppressed, never reported
//! - **Producer-confined state**: all mutable pipeline state lives on the
//!   producer context; listeners are reached only through one ordered
//!   event channel drained by a single consumer
//! - **Records never diverge**: every sample is persisted before its
//!   events are queued, so files and callbacks describe the same stream
//!
//! # Example
//!
//! ```no_run
//! use optical_pulse::{
//!     analysis::SampleClassifier,
//!     capture::{CaptureConfig, FrameSource, SyntheticSource},
//!     pipeline::{EventConsumer, PipelineConfig, PipelineDispatcher, PipelineListener},
//!     record::MemorySink,
//! };
//!
//! struct Display;
//! impl PipelineListener for Display {
//!     fn on_bpm_update(&mut self, bpm: u16, _timestamp: i64) {
//!         println!("heart rate: {} bpm", bpm);
//!     }
//! }
//!
//! // Initialize components
//! let mut source = SyntheticSource::new();
//! source.open(&CaptureConfig::default()).unwrap();
//!
//! let mut classifier = SampleClassifier::new();
//! let (mut dispatcher, events) =
//!     PipelineDispatcher::new(PipelineConfig::default(), MemorySink::new());
//! let consumer = EventConsumer::spawn(events, Box::new(Display)).unwrap();
//!
//! // Feed samples through the pipeline
//! dispatcher.start();
//! for _ in 0..600 {
//!     let sample = source.next_sample().unwrap();
//!     let flags = classifier.classify(&sample);
//!     dispatcher.on_sample(sample.with_flags(flags));
//! }
//! dispatcher.stop();
//!
//! // Disconnect the channel and let the consumer drain
//! drop(dispatcher);
//! consumer.join();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod capture;
pub mod estimator;
pub mod metrics;
pub mod pipeline;
pub mod record;

// Re-export commonly used types at crate root
pub use analysis::{GateEvent, IntelligentStartGate, QualitySignalAggregator, QualitySignals};
pub use capture::{CaptureConfig, FileConfig, FrameSource, Sample, SyntheticSource};
pub use estimator::{BpmEstimator, BpmReading};
pub use pipeline::{EventConsumer, PipelineDispatcher, PipelineEvent, PipelineListener};
pub use record::{JsonRecordWriter, RecordSink, SampleRecord};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
