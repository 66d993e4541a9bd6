//! Consumer-side event delivery.
//!
//! Listener callbacks never run on the producer thread. Events are
//! marshaled through a channel to one dedicated consumer thread, which
//! invokes the listener serially, so callbacks never run concurrently
//! with each other for the same pipeline.

use super::PipelineEvent;
use crossbeam_channel::Receiver;
use std::thread::JoinHandle;

/// Consumer-context callbacks.
///
/// Every method has a no-op default, so implementations subscribe to any
/// subset of signals; unimplemented callbacks simply receive no calls.
pub trait PipelineListener: Send {
    /// A new BPM estimate was produced.
    fn on_bpm_update(&mut self, _bpm: u16, _timestamp: i64) {}

    /// Intelligent-start progress changed.
    fn on_intelligent_start_progress(&mut self, _progress: f32, _ready: bool) {}

    /// Coverage state for the current sample.
    fn on_camera_covered(&mut self, _covered: bool) {}

    /// Abnormal heart rate check result.
    fn on_abnormal_heart_rate(&mut self, _is_abnormal: bool) {}

    /// Declining heart rate check result.
    fn on_declining_heart_rate(&mut self, _is_declining: bool) {}

    /// Excessive pressure check result.
    fn on_pressure_excessive(&mut self, _is_excessive: bool) {}
}

/// Dedicated consumer thread draining the event channel into a listener.
///
/// The thread runs until the producing side of the channel disconnects
/// (the dispatcher is dropped), then drains whatever is still queued.
/// Events for already-processed samples may therefore arrive after the
/// pipeline has stopped; listeners must tolerate them.
pub struct EventConsumer {
    handle: Option<JoinHandle<()>>,
}

impl EventConsumer {
    /// Spawns the consumer thread.
    pub fn spawn(
        receiver: Receiver<PipelineEvent>,
        mut listener: Box<dyn PipelineListener>,
    ) -> std::io::Result<Self> {
        let handle = std::thread::Builder::new()
            .name("pulse-events".to_string())
            .spawn(move || {
                for event in receiver {
                    deliver(listener.as_mut(), event);
                }
                tracing::debug!("Event consumer drained");
            })?;
        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Waits for the consumer thread to drain and exit.
    ///
    /// Call after dropping the dispatcher (which disconnects the channel);
    /// joining while the producing side is still alive blocks until it
    /// goes away.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Event consumer thread panicked");
            }
        }
    }
}

fn deliver(listener: &mut dyn PipelineListener, event: PipelineEvent) {
    match event {
        PipelineEvent::BpmUpdate { bpm, timestamp } => listener.on_bpm_update(bpm, timestamp),
        PipelineEvent::GateProgress { progress, ready } => {
            listener.on_intelligent_start_progress(progress, ready)
        }
        PipelineEvent::CameraCovered(covered) => listener.on_camera_covered(covered),
        PipelineEvent::AbnormalHeartRate(abnormal) => listener.on_abnormal_heart_rate(abnormal),
        PipelineEvent::DecliningHeartRate(declining) => {
            listener.on_declining_heart_rate(declining)
        }
        PipelineEvent::PressureExcessive(excessive) => listener.on_pressure_excessive(excessive),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recording {
        events: Vec<PipelineEvent>,
        thread: Option<std::thread::ThreadId>,
    }

    struct RecordingListener(Arc<Mutex<Recording>>);

    impl PipelineListener for RecordingListener {
        fn on_bpm_update(&mut self, bpm: u16, timestamp: i64) {
            self.push(PipelineEvent::BpmUpdate { bpm, timestamp });
        }
        fn on_intelligent_start_progress(&mut self, progress: f32, ready: bool) {
            self.push(PipelineEvent::GateProgress { progress, ready });
        }
        fn on_camera_covered(&mut self, covered: bool) {
            self.push(PipelineEvent::CameraCovered(covered));
        }
    }

    impl RecordingListener {
        fn push(&mut self, event: PipelineEvent) {
            let mut recording = self.0.lock().unwrap();
            recording.events.push(event);
            recording.thread = Some(std::thread::current().id());
        }
    }

    #[test]
    fn test_events_delivered_in_order_off_producer_thread() {
        let recording = Arc::new(Mutex::new(Recording::default()));
        let (tx, rx) = crossbeam_channel::unbounded();
        let consumer =
            EventConsumer::spawn(rx, Box::new(RecordingListener(recording.clone()))).unwrap();

        let sent = vec![
            PipelineEvent::GateProgress {
                progress: 0.5,
                ready: false,
            },
            PipelineEvent::CameraCovered(true),
            PipelineEvent::BpmUpdate {
                bpm: 70,
                timestamp: 3,
            },
        ];
        for event in &sent {
            tx.send(*event).unwrap();
        }
        drop(tx);
        consumer.join();

        let recording = recording.lock().unwrap();
        assert_eq!(recording.events, sent);
        assert_ne!(recording.thread.unwrap(), std::thread::current().id());
    }

    #[test]
    fn test_unsubscribed_callbacks_are_noop() {
        // A listener with all defaults must accept every event kind.
        struct Silent;
        impl PipelineListener for Silent {}

        let (tx, rx) = crossbeam_channel::unbounded();
        let consumer = EventConsumer::spawn(rx, Box::new(Silent)).unwrap();

        tx.send(PipelineEvent::AbnormalHeartRate(true)).unwrap();
        tx.send(PipelineEvent::DecliningHeartRate(false)).unwrap();
        tx.send(PipelineEvent::PressureExcessive(true)).unwrap();
        drop(tx);
        consumer.join();
    }
}
