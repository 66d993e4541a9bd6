//! Bounded buffer of recent pulse-channel points.

use std::collections::VecDeque;

/// One buffered point: a timestamp and a channel value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowPoint {
    /// Monotonic seconds since stream start.
    pub timestamp: f64,
    /// Channel intensity.
    pub value: f64,
}

/// Bounded sliding window over the pulse channel.
///
/// Oldest points are evicted once capacity is reached. Non-finite input
/// is discarded on entry so a single bad frame cannot poison the running
/// estimate.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    points: VecDeque<WindowPoint>,
    capacity: usize,
}

impl SampleWindow {
    /// Creates a window holding at most `capacity` points.
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity: capacity.max(2),
        }
    }

    /// Pushes a point, evicting the oldest if full.
    ///
    /// Returns false if the point was discarded as non-finite.
    pub fn push(&mut self, timestamp: f64, value: f64) -> bool {
        if !timestamp.is_finite() || !value.is_finite() {
            tracing::trace!(timestamp, value, "Discarded non-finite window point");
            return false;
        }

        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(WindowPoint { timestamp, value });
        true
    }

    /// Returns the number of buffered points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if no points are buffered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns true if the window is at capacity.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.points.len() == self.capacity
    }

    /// Returns the time span covered by the buffered points, in seconds.
    pub fn elapsed_seconds(&self) -> f64 {
        match (self.points.front(), self.points.back()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0.0,
        }
    }

    /// Estimates the sampling rate from the buffered timestamps.
    ///
    /// Returns `None` until the window spans a positive time interval.
    pub fn sample_rate(&self) -> Option<f64> {
        let elapsed = self.elapsed_seconds();
        if self.points.len() < 2 || elapsed <= 0.0 {
            return None;
        }
        Some((self.points.len() - 1) as f64 / elapsed)
    }

    /// Returns the buffered channel values in arrival order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Clears all buffered points.
    pub fn clear(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_fills_and_evicts() {
        let mut window = SampleWindow::new(3);

        for i in 0..5 {
            assert!(window.push(i as f64, i as f64 * 10.0));
        }

        assert!(window.is_full());
        assert_eq!(window.len(), 3);
        // The two oldest points were evicted.
        assert_eq!(window.values(), vec![20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_non_finite_discarded() {
        let mut window = SampleWindow::new(4);

        assert!(window.push(0.0, 1.0));
        assert!(!window.push(1.0, f64::NAN));
        assert!(!window.push(2.0, f64::INFINITY));
        assert!(!window.push(f64::NAN, 3.0));

        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_elapsed_and_rate() {
        let mut window = SampleWindow::new(10);
        for i in 0..7 {
            window.push(i as f64 / 60.0, 0.5);
        }

        assert!((window.elapsed_seconds() - 0.1).abs() < 1e-9);
        let rate = window.sample_rate().unwrap();
        assert!((rate - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_rate_needs_two_points() {
        let mut window = SampleWindow::new(10);
        assert!(window.sample_rate().is_none());

        window.push(0.0, 0.5);
        assert!(window.sample_rate().is_none());
    }
}
