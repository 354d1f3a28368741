//! # Label Throttle
//!
//! The note label changes far less gracefully than the ladder position, so it
//! is refreshed on its own slower schedule. The throttle calls the pure note
//! namer at most once per interval and keeps showing the last label between
//! refreshes.

use std::time::{Duration, Instant};

use crate::tuning;

/// Default time between label refreshes.
pub const DEFAULT_LABEL_INTERVAL: Duration = Duration::from_millis(600);

#[derive(Debug, Clone)]
pub struct LabelThrottle {
    interval: Duration,
    last_refresh: Option<Instant>,
    last_label: Option<String>,
}

impl Default for LabelThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL_INTERVAL)
    }
}

impl LabelThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_refresh: None,
            last_label: None,
        }
    }

    /// Offers the latest frequency at time `now` and returns the label to show.
    ///
    /// A refresh happens when the interval has elapsed since the previous
    /// one. Polls without a pitch are not refreshes and never clear the label.
    pub fn update(&mut self, frequency: Option<f32>, now: Instant) -> Option<&str> {
        let due = self
            .last_refresh
            .is_none_or(|at| now.saturating_duration_since(at) >= self.interval);

        if due {
            if let Some(label) = frequency.and_then(tuning::note_label) {
                self.last_label = Some(label);
                self.last_refresh = Some(now);
            }
        }
        self.last_label.as_deref()
    }

    pub fn current(&self) -> Option<&str> {
        self.last_label.as_deref()
    }

    pub fn reset(&mut self) {
        self.last_refresh = None;
        self.last_label = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_pitch_is_labelled_immediately() {
        let mut throttle = LabelThrottle::default();
        assert_eq!(throttle.update(Some(440.0), Instant::now()), Some("A4"));
    }

    #[test]
    fn holds_label_within_interval() {
        let start = Instant::now();
        let mut throttle = LabelThrottle::new(Duration::from_millis(500));
        throttle.update(Some(440.0), start);
        let label = throttle.update(Some(261.63), start + Duration::from_millis(300));
        assert_eq!(label, Some("A4"));
        let label = throttle.update(Some(261.63), start + Duration::from_millis(500));
        assert_eq!(label, Some("C4"));
    }

    #[test]
    fn silence_keeps_last_label() {
        let start = Instant::now();
        let mut throttle = LabelThrottle::new(Duration::from_millis(100));
        throttle.update(Some(440.0), start);
        assert_eq!(throttle.update(None, start + Duration::from_secs(1)), Some("A4"));
        // The next real pitch is shown straight away.
        assert_eq!(
            throttle.update(Some(261.63), start + Duration::from_millis(1100)),
            Some("C4")
        );
    }

    #[test]
    fn reset_forgets_everything() {
        let mut throttle = LabelThrottle::default();
        throttle.update(Some(440.0), Instant::now());
        throttle.reset();
        assert_eq!(throttle.current(), None);
    }
}
