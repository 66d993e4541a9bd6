//! Intelligent-start gating.
//!
//! Recording should not officially begin until the optical signal is
//! trustworthy. The gate watches per-sample lens coverage and opens once
//! coverage has held for a full consecutive run of frames; any gap
//! restarts the run.

use crate::capture::{ConfigError, Sample};
use serde::{Deserialize, Serialize};

/// Gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Whether intelligent start is active at all.
    pub enabled: bool,
    /// Consecutive covered frames required to open the gate.
    pub frames_to_pass: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frames_to_pass: 60,
        }
    }
}

impl GateConfig {
    /// Validates the gate parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frames_to_pass == 0 {
            return Err(ConfigError::InvalidGateThreshold);
        }
        Ok(())
    }
}

/// Per-call gate observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateEvent {
    /// Fraction of the required covered run achieved, in [0, 1].
    pub progress: f32,
    /// True exactly on the call that opened the gate.
    pub became_ready: bool,
}

/// State machine deciding when the signal stream is reliable enough to
/// begin the official recording.
///
/// Two states: Searching (initial) and Ready (terminal). Once Ready the
/// gate never reverts, regardless of later coverage loss; the coverage
/// streak is still tracked for observability.
pub struct IntelligentStartGate {
    frames_to_pass: u32,
    consecutive_covered: u32,
    passed: bool,
}

impl IntelligentStartGate {
    /// Creates a gate requiring the given consecutive covered run.
    pub fn new(frames_to_pass: u32) -> Self {
        Self {
            frames_to_pass: frames_to_pass.max(1),
            consecutive_covered: 0,
            passed: false,
        }
    }

    /// Consumes one sample's coverage observation.
    ///
    /// Progress and readiness are reported on every call so a continuous
    /// progress indicator can be driven directly from the return value.
    pub fn update(&mut self, sample: &Sample) -> GateEvent {
        if sample.is_covering_lens() {
            self.consecutive_covered += 1;
        } else {
            // Runs must be uninterrupted; any gap restarts the count.
            self.consecutive_covered = 0;
        }

        let mut became_ready = false;
        if !self.passed && self.consecutive_covered >= self.frames_to_pass {
            self.passed = true;
            became_ready = true;
            tracing::info!(
                frames = self.consecutive_covered,
                "Intelligent start passed"
            );
        }

        GateEvent {
            progress: self.progress(),
            became_ready,
        }
    }

    /// Returns the current progress toward Ready, in [0, 1].
    pub fn progress(&self) -> f32 {
        if self.passed {
            return 1.0;
        }
        (self.consecutive_covered as f32 / self.frames_to_pass as f32).min(1.0)
    }

    /// Returns true once the gate has opened.
    #[inline]
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Returns the current consecutive covered count.
    #[inline]
    pub fn consecutive_covered(&self) -> u32 {
        self.consecutive_covered
    }

    /// Returns the gate to its initial Searching state.
    pub fn reset(&mut self) {
        self.passed = false;
        self.consecutive_covered = 0;
        tracing::info!("Intelligent start gate reset");
    }
}

impl Default for IntelligentStartGate {
    fn default() -> Self {
        Self::new(GateConfig::default().frames_to_pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered() -> Sample {
        Sample::new(0.0, 0.0, 0.92, 0.45, 0.08, 2.5)
    }

    fn uncovered() -> Sample {
        Sample::new(0.0, 0.0, 0.3, 0.35, 0.4, 1.0)
    }

    #[test]
    fn test_opens_exactly_at_threshold() {
        let mut gate = IntelligentStartGate::new(60);

        let mut last_progress = 0.0f32;
        for i in 1..=59 {
            let event = gate.update(&covered());
            assert!(!event.became_ready, "became ready early at {}", i);
            assert!(!gate.passed());
            assert!(
                event.progress > last_progress,
                "progress not increasing at {}",
                i
            );
            last_progress = event.progress;
        }

        let event = gate.update(&covered());
        assert!(event.became_ready);
        assert!((event.progress - 1.0).abs() < f32::EPSILON);
        assert!(gate.passed());
    }

    #[test]
    fn test_became_ready_fires_once() {
        let mut gate = IntelligentStartGate::new(3);

        let transitions: usize = (0..10)
            .map(|_| gate.update(&covered()).became_ready as usize)
            .sum();
        assert_eq!(transitions, 1);
    }

    #[test]
    fn test_gap_restarts_run() {
        let mut gate = IntelligentStartGate::new(60);

        for _ in 0..59 {
            gate.update(&covered());
        }
        let event = gate.update(&uncovered());
        assert_eq!(gate.consecutive_covered(), 0);
        assert_eq!(event.progress, 0.0);

        // A fresh full run is required: ready lands at sample 120 overall.
        for i in 1..=59 {
            let event = gate.update(&covered());
            assert!(!event.became_ready, "early at resumed {}", i);
        }
        assert!(gate.update(&covered()).became_ready);
    }

    #[test]
    fn test_ready_is_monotonic() {
        let mut gate = IntelligentStartGate::new(5);

        for _ in 0..5 {
            gate.update(&covered());
        }
        assert!(gate.passed());

        // Coverage loss after Ready does not close the gate.
        for _ in 0..20 {
            let event = gate.update(&uncovered());
            assert!(gate.passed());
            assert!(!event.became_ready);
            assert!((event.progress - 1.0).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn test_streak_tracked_after_ready() {
        let mut gate = IntelligentStartGate::new(2);

        gate.update(&covered());
        gate.update(&covered());
        assert!(gate.passed());

        gate.update(&uncovered());
        assert_eq!(gate.consecutive_covered(), 0);
        gate.update(&covered());
        assert_eq!(gate.consecutive_covered(), 1);
    }

    #[test]
    fn test_reset_returns_to_searching() {
        let mut gate = IntelligentStartGate::new(2);
        gate.update(&covered());
        gate.update(&covered());
        assert!(gate.passed());

        gate.reset();
        assert!(!gate.passed());
        assert_eq!(gate.consecutive_covered(), 0);
        assert_eq!(gate.progress(), 0.0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// Longest run of consecutive `true` values in the sequence.
        fn longest_run(coverage: &[bool]) -> u32 {
            let mut best = 0u32;
            let mut current = 0u32;
            for &c in coverage {
                current = if c { current + 1 } else { 0 };
                best = best.max(current);
            }
            best
        }

        proptest! {
            #[test]
            fn gate_ready_iff_full_run_present(coverage in prop::collection::vec(any::<bool>(), 0..200)) {
                let threshold = 10u32;
                let mut gate = IntelligentStartGate::new(threshold);

                let mut transitions = 0u32;
                for &c in &coverage {
                    let sample = if c { covered() } else { uncovered() };
                    let event = gate.update(&sample);
                    prop_assert!((0.0..=1.0).contains(&event.progress));
                    if event.became_ready {
                        transitions += 1;
                    }
                }

                let expect_ready = longest_run(&coverage) >= threshold;
                prop_assert_eq!(gate.passed(), expect_ready);
                prop_assert_eq!(transitions, u32::from(expect_ready));
            }

            #[test]
            fn gate_never_reverts(coverage in prop::collection::vec(any::<bool>(), 0..300)) {
                let mut gate = IntelligentStartGate::new(5);

                let mut was_ready = false;
                for &c in &coverage {
                    let sample = if c { covered() } else { uncovered() };
                    gate.update(&sample);
                    if was_ready {
                        prop_assert!(gate.passed());
                    }
                    was_ready = gate.passed();
                }
            }
        }
    }
}
