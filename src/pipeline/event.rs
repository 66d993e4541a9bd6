//! Events delivered to the consumer context.

/// One listener-facing result, delivered in order through the event
/// channel.
///
/// A single sum type through a single ordered channel is what makes the
/// per-sample ordering guarantee trivial: events are enqueued in
/// processing order and the consumer drains them serially.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PipelineEvent {
    /// A new BPM estimate, with the triggering sample's timestamp in
    /// whole seconds.
    BpmUpdate {
        /// Beats per minute.
        bpm: u16,
        /// Triggering sample timestamp, whole seconds since stream start.
        timestamp: i64,
    },
    /// Intelligent-start progress, reported while the gate is searching.
    GateProgress {
        /// Fraction of the required covered run achieved, in [0, 1].
        progress: f32,
        /// True once the gate has opened.
        ready: bool,
    },
    /// Coverage state, reported on every sample while feedback is enabled.
    CameraCovered(bool),
    /// Abnormal heart rate check, covered samples only.
    AbnormalHeartRate(bool),
    /// Declining heart rate check, covered samples only.
    DecliningHeartRate(bool),
    /// Excessive pressure check, covered samples only.
    PressureExcessive(bool),
}
