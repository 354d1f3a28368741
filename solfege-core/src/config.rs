//! # Session Configuration
//!
//! Tunables for a polling session. Every field has a default, so a
//! configuration file only needs the values it wants to change.

use std::time::Duration;

use serde::Deserialize;

use crate::{audio, label, mapper, pitch};

/// Lowest and highest base octave a session accepts. The high register sits
/// one octave above, so 6 still ends below C8.
pub const MIN_BASE_OCTAVE: i32 = 1;
pub const MAX_BASE_OCTAVE: i32 = 6;

/// Pulls a base octave into `MIN_BASE_OCTAVE..=MAX_BASE_OCTAVE`.
pub fn clamp_base_octave(octave: i32) -> i32 {
    octave.clamp(MIN_BASE_OCTAVE, MAX_BASE_OCTAVE)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Root key as a pitch class, 0 = C.
    pub root_key: u8,
    /// Octave of the low register's root; the high register is one above.
    pub base_octave: i32,
    /// Timer cadence for pitch polling.
    pub poll_interval_ms: u64,
    /// Minimum time between note label refreshes.
    pub label_interval_ms: u64,
    /// RMS below which a frame counts as silence.
    pub silence_threshold: f32,
    /// Slack around each register's outermost tones, in Hz.
    pub range_buffer_hz: f32,
    /// Scale applied to the estimator's sub-sample lag correction.
    pub interpolation_scale: f32,
    /// Sample rate requested from the input device.
    pub target_sample_rate: u32,
    /// Samples per analysis frame.
    pub frame_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            root_key: 0,
            base_octave: 3,
            poll_interval_ms: 300,
            label_interval_ms: label::DEFAULT_LABEL_INTERVAL.as_millis() as u64,
            silence_threshold: pitch::DEFAULT_SILENCE_THRESHOLD,
            range_buffer_hz: mapper::DEFAULT_RANGE_BUFFER_HZ,
            interpolation_scale: pitch::DEFAULT_INTERPOLATION_SCALE,
            target_sample_rate: audio::TARGET_SAMPLE_RATE,
            frame_size: audio::BUFFER_SIZE,
        }
    }
}

impl SessionConfig {
    /// Brings out-of-range values back into something usable.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        self.root_key %= 12;
        self.base_octave = clamp_base_octave(self.base_octave);
        if self.poll_interval_ms == 0 {
            self.poll_interval_ms = defaults.poll_interval_ms;
        }
        if !self.silence_threshold.is_finite() || self.silence_threshold < 0.0 {
            self.silence_threshold = defaults.silence_threshold;
        }
        if !self.range_buffer_hz.is_finite() || self.range_buffer_hz < 0.0 {
            self.range_buffer_hz = defaults.range_buffer_hz;
        }
        if !self.interpolation_scale.is_finite() {
            self.interpolation_scale = defaults.interpolation_scale;
        }
        if self.target_sample_rate == 0 {
            self.target_sample_rate = defaults.target_sample_rate;
        }
        self.frame_size = self.frame_size.max(4);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn label_interval(&self) -> Duration {
        Duration::from_millis(self.label_interval_ms)
    }

    pub fn estimator(&self) -> pitch::PitchEstimator {
        pitch::PitchEstimator::new(self.silence_threshold, self.interpolation_scale)
    }
}
