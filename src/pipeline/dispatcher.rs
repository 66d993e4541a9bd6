//! Per-sample orchestration and event scheduling.

use super::PipelineEvent;
use crate::analysis::{FeedbackConfig, GateConfig, IntelligentStartGate, QualitySignalAggregator};
use crate::capture::{FileConfig, Sample};
use crate::estimator::{BpmEstimator, BpmReading, EstimatorConfig};
use crate::record::RecordSink;
use crossbeam_channel::{Receiver, Sender};

/// Pipeline construction parameters.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Intelligent-start gating.
    pub gate: GateConfig,
    /// BPM estimation tuning.
    pub estimator: EstimatorConfig,
    /// Quality feedback policy.
    pub feedback: FeedbackConfig,
}

impl From<&FileConfig> for PipelineConfig {
    fn from(file: &FileConfig) -> Self {
        Self {
            gate: file.gate.clone(),
            estimator: file.estimator.clone(),
            feedback: file.feedback.clone(),
        }
    }
}

/// Drives the estimator, gate and quality aggregator for each incoming
/// sample, persists the sample, and queues listener events onto the
/// consumer channel.
///
/// All mutable state is confined to the producer context: `on_sample` is
/// expected to be called from one producer thread, and everything it
/// touches runs synchronously within that call. The only crossing point
/// is the event channel, drained by a single consumer. With that
/// confinement honored, no locking is needed anywhere in the pipeline.
pub struct PipelineDispatcher<S: RecordSink> {
    estimator: BpmEstimator,
    gate: IntelligentStartGate,
    gate_enabled: bool,
    aggregator: QualitySignalAggregator,
    sink: S,
    events: Sender<PipelineEvent>,
    started: bool,
    samples_processed: u64,
    records_written: u64,
    sink_errors: u64,
    latest_reading: Option<BpmReading>,
    // Sampling-rate diagnostic, one debug line per second of stream time.
    rate_reference: Option<f64>,
    rate_count: u32,
}

impl<S: RecordSink> PipelineDispatcher<S> {
    /// Creates a dispatcher writing to `sink`, returning the receiving
    /// end of the event channel for an `EventConsumer`.
    ///
    /// The sink is expected to arrive open; `stop` closes it.
    pub fn new(config: PipelineConfig, sink: S) -> (Self, Receiver<PipelineEvent>) {
        let (events, receiver) = crossbeam_channel::unbounded();
        let dispatcher = Self {
            estimator: BpmEstimator::new(config.estimator),
            gate: IntelligentStartGate::new(config.gate.frames_to_pass),
            gate_enabled: config.gate.enabled,
            aggregator: QualitySignalAggregator::new(&config.feedback),
            sink,
            events,
            started: false,
            samples_processed: 0,
            records_written: 0,
            sink_errors: 0,
            latest_reading: None,
            rate_reference: None,
            rate_count: 0,
        };
        (dispatcher, receiver)
    }

    /// Begins a recording session: resets the gate and counters.
    pub fn start(&mut self) {
        self.gate.reset();
        self.rate_reference = None;
        self.rate_count = 0;
        self.started = true;
        tracing::info!(gate_enabled = self.gate_enabled, "Pipeline started");
    }

    /// Ends the recording session and closes the sink.
    ///
    /// Idempotent: a second call is a no-op. Events already queued for
    /// processed samples may still reach the listener afterwards.
    pub fn stop(&mut self) {
        if !self.started {
            return;
        }
        self.started = false;
        if let Err(e) = self.sink.close() {
            tracing::warn!(error = %e, "Record sink close failed");
        }
        tracing::info!(
            samples = self.samples_processed,
            records = self.records_written,
            "Pipeline stopped"
        );
    }

    /// Processes one sample on the producer context.
    ///
    /// Never fails from the producer's perspective: sink errors are
    /// logged and counted without touching estimator or gate state.
    pub fn on_sample(&mut self, mut sample: Sample) {
        if !self.started {
            tracing::trace!("Sample dropped: pipeline not started");
            return;
        }

        // Estimate first so the reading lands on the triggering sample,
        // in both the persisted record and the delivered event.
        self.estimator.add_sample(&sample);
        if self.estimator.is_ready_to_process() {
            if let Some(reading) = self.estimator.process_samples() {
                sample.attach_reading(reading);
                self.latest_reading = Some(reading);
            }
        }

        self.trace_sample_rate(sample.timestamp());

        // Persist before queueing anything, so records and callbacks are
        // always derived from the same sample set.
        match self.sink.write(&sample) {
            Ok(()) => self.records_written += 1,
            Err(e) => {
                self.sink_errors += 1;
                tracing::warn!(error = %e, "Record sink write failed");
            }
        }

        if let Some(reading) = sample.reading() {
            self.send(PipelineEvent::BpmUpdate {
                bpm: reading.bpm,
                timestamp: sample.timestamp() as i64,
            });
        }

        if self.gate_enabled && !self.gate.passed() {
            let event = self.gate.update(&sample);
            self.send(PipelineEvent::GateProgress {
                progress: event.progress,
                ready: self.gate.passed(),
            });
        }

        // Quality signals follow the sample's own coverage branch,
        // independent of whether the gate has already passed.
        if let Some(signals) = self.aggregator.derive(&sample) {
            self.send(PipelineEvent::CameraCovered(signals.camera_covered));
            if let Some(checks) = signals.checks {
                self.send(PipelineEvent::AbnormalHeartRate(checks.abnormal_hr));
                self.send(PipelineEvent::DecliningHeartRate(checks.declining_hr));
                self.send(PipelineEvent::PressureExcessive(checks.pressure_excessive));
            }
        }

        self.samples_processed += 1;
    }

    /// Returns the number of samples processed since construction.
    pub fn samples_processed(&self) -> u64 {
        self.samples_processed
    }

    /// Returns the number of records successfully written.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Returns the number of sink write failures.
    pub fn sink_errors(&self) -> u64 {
        self.sink_errors
    }

    /// Returns the most recent BPM reading, if any was produced.
    pub fn latest_reading(&self) -> Option<BpmReading> {
        self.latest_reading
    }

    /// Returns the intelligent-start gate.
    pub fn gate(&self) -> &IntelligentStartGate {
        &self.gate
    }

    /// Returns the number of points buffered in the estimator window.
    pub fn estimator_window_len(&self) -> usize {
        self.estimator.window_len()
    }

    /// Returns the record sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn send(&self, event: PipelineEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("Event consumer disconnected");
        }
    }

    fn trace_sample_rate(&mut self, timestamp: f64) {
        match self.rate_reference {
            None => self.rate_reference = Some(timestamp),
            Some(reference) if timestamp - reference >= 1.0 => {
                tracing::debug!(samples = self.rate_count, "Preprocessed sample count");
                self.rate_reference = Some(timestamp);
                self.rate_count = 0;
            }
            Some(_) => self.rate_count += 1,
        }
    }
}
