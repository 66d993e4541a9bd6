//! Sample ingestion and configuration.
//!
//! This module provides the optical sample value type, a trait-based
//! abstraction over the sample producer, and pipeline configuration.
//! The producer is treated as a source of channel intensities; everything
//! pulse-related is derived downstream.

mod config;
mod sample;
mod source;

pub use config::{CaptureConfig, ConfigError, FileConfig, OutputConfig};
pub use sample::{Sample, SampleFlags};
pub use source::{FrameSource, SourceError, SyntheticSource};
