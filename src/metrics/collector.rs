//! Metrics collection and registry.

use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of pipeline state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Whether intelligent start has passed.
    pub gate_passed: bool,
    /// Current gate progress in [0, 1].
    pub gate_progress: f32,
    /// Current consecutive covered count.
    pub covered_streak: u32,
    /// Total samples processed.
    pub samples_total: u64,
    /// Records successfully written.
    pub records_written: u64,
    /// Sink write failures.
    pub sink_errors: u64,
    /// Most recent BPM estimate.
    pub bpm: Option<u16>,
    /// Confidence of the most recent estimate.
    pub confidence: Option<f32>,
    /// Points buffered in the estimator window.
    pub window_fill: usize,
}

impl MetricsSnapshot {
    /// Creates a snapshot from the current state of the dispatcher.
    pub fn from_pipeline<S: crate::record::RecordSink>(
        dispatcher: &crate::pipeline::PipelineDispatcher<S>,
    ) -> Self {
        let gate = dispatcher.gate();
        let (bpm, confidence) = dispatcher
            .latest_reading()
            .map(|r| (Some(r.bpm), Some(r.confidence)))
            .unwrap_or((None, None));

        Self {
            gate_passed: gate.passed(),
            gate_progress: gate.progress(),
            covered_streak: gate.consecutive_covered(),
            samples_total: dispatcher.samples_processed(),
            records_written: dispatcher.records_written(),
            sink_errors: dispatcher.sink_errors(),
            bpm,
            confidence,
            window_fill: dispatcher.estimator_window_len(),
        }
    }
}

/// Prometheus metrics registry for pulse pipeline monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    // Gate metrics
    gate_passed: IntGauge,
    gate_progress: Gauge,
    covered_streak: IntGauge,

    // Pipeline metrics
    samples_total: IntCounter,
    records_written_total: IntCounter,
    sink_errors_total: IntCounter,

    // Estimator metrics
    bpm: IntGauge,
    confidence: Gauge,
    window_fill: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all pipeline metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        // Gate metrics
        let gate_passed = IntGauge::new(
            "optical_pulse_gate_passed",
            "Intelligent-start state (1=ready, 0=searching)",
        )?;
        let gate_progress = Gauge::new(
            "optical_pulse_gate_progress",
            "Progress toward intelligent-start ready (0.0 to 1.0)",
        )?;
        let covered_streak = IntGauge::new(
            "optical_pulse_gate_covered_streak",
            "Current consecutive lens-covered sample count",
        )?;

        // Pipeline metrics
        let samples_total = IntCounter::new(
            "optical_pulse_samples_total",
            "Total number of samples processed",
        )?;
        let records_written_total = IntCounter::new(
            "optical_pulse_records_written_total",
            "Total number of records successfully persisted",
        )?;
        let sink_errors_total = IntCounter::new(
            "optical_pulse_sink_errors_total",
            "Total number of record sink write failures",
        )?;

        // Estimator metrics
        let bpm = IntGauge::new(
            "optical_pulse_bpm",
            "Most recent heart rate estimate in beats per minute",
        )?;
        let confidence = Gauge::new(
            "optical_pulse_confidence",
            "Confidence of the most recent BPM estimate (0.0 to 1.0)",
        )?;
        let window_fill = IntGauge::new(
            "optical_pulse_window_fill",
            "Points currently buffered in the estimator window",
        )?;

        // Register all metrics
        registry.register(Box::new(gate_passed.clone()))?;
        registry.register(Box::new(gate_progress.clone()))?;
        registry.register(Box::new(covered_streak.clone()))?;
        registry.register(Box::new(samples_total.clone()))?;
        registry.register(Box::new(records_written_total.clone()))?;
        registry.register(Box::new(sink_errors_total.clone()))?;
        registry.register(Box::new(bpm.clone()))?;
        registry.register(Box::new(confidence.clone()))?;
        registry.register(Box::new(window_fill.clone()))?;

        Ok(Self {
            registry,
            gate_passed,
            gate_progress,
            covered_streak,
            samples_total,
            records_written_total,
            sink_errors_total,
            bpm,
            confidence,
            window_fill,
        })
    }

    /// Updates all metrics from a snapshot of pipeline state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        // Gate metrics
        self.gate_passed.set(if snapshot.gate_passed { 1 } else { 0 });
        self.gate_progress.set(snapshot.gate_progress as f64);
        self.covered_streak.set(snapshot.covered_streak as i64);

        // For counters, increment by the difference
        let current_samples = self.samples_total.get();
        if snapshot.samples_total > current_samples {
            self.samples_total.inc_by(snapshot.samples_total - current_samples);
        }

        let current_records = self.records_written_total.get();
        if snapshot.records_written > current_records {
            self.records_written_total.inc_by(snapshot.records_written - current_records);
        }

        let current_errors = self.sink_errors_total.get();
        if snapshot.sink_errors > current_errors {
            self.sink_errors_total.inc_by(snapshot.sink_errors - current_errors);
        }

        // Estimator metrics (only update if present)
        if let Some(bpm) = snapshot.bpm {
            self.bpm.set(bpm as i64);
        }
        if let Some(confidence) = snapshot.confidence {
            self.confidence.set(confidence as f64);
        }
        self.window_fill.set(snapshot.window_fill as i64);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
