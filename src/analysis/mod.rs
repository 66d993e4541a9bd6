//! Signal gating and quality feedback.
//!
//! This module decides when the optical stream is trustworthy enough to
//! begin an official recording, derives the per-sample quality signals
//! reported to listeners, and classifies raw per-sample flags from the
//! channel history.

mod classify;
mod gate;
mod quality;

pub use classify::SampleClassifier;
pub use gate::{GateConfig, GateEvent, IntelligentStartGate};
pub use quality::{CoveredChecks, FeedbackConfig, QualitySignalAggregator, QualitySignals};
