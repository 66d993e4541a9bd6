//! Prometheus metrics exporter for pipeline monitoring.
//!
//! This module provides observability into the pulse pipeline by
//! exposing metrics in Prometheus format via an HTTP endpoint.
//!
//! # Metrics Exposed
//!
//! ## Gate Metrics
//! - `optical_pulse_gate_passed` - Intelligent-start state (1=ready, 0=searching)
//! - `optical_pulse_gate_progress` - Progress toward ready (0.0 to 1.0)
//! - `optical_pulse_gate_covered_streak` - Consecutive lens-covered samples
//!
//! ## Pipeline Metrics
//! - `optical_pulse_samples_total` - Samples processed
//! - `optical_pulse_records_written_total` - Records successfully persisted
//! - `optical_pulse_sink_errors_total` - Record sink write failures
//!
//! ## Estimator Metrics
//! - `optical_pulse_bpm` - Most recent heart rate estimate
//! - `optical_pulse_confidence` - Confidence of the most recent estimate
//! - `optical_pulse_window_fill` - Points buffered in the estimator window
//!
//! # Example
//!
//! ```no_run
//! use optical_pulse::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! // Create a metrics registry
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! // Update metrics from pipeline state
//! let snapshot = MetricsSnapshot {
//!     gate_passed: true,
//!     gate_progress: 1.0,
//!     covered_streak: 80,
//!     samples_total: 600,
//!     records_written: 600,
//!     sink_errors: 0,
//!     bpm: Some(72),
//!     confidence: Some(0.8),
//!     window_fill: 256,
//! };
//!
//! registry.update(&snapshot);
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
