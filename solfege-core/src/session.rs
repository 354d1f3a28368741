//! # Polling Session
//!
//! Ties a frame source to the estimator, the position mapper and the label
//! throttle. The driver (a UI timer) calls [`PitchSession::poll`] on a fixed
//! cadence while listening; `poll` takes `&mut self`, so two polls of the same
//! session can never overlap.
//!
//! ## Lifecycle
//! - `start` is a no-op while listening and leaves the session untouched if
//!   the source fails to start.
//! - `stop` releases the source and forgets all transient state (continuity,
//!   label). It may be called any number of times.
//! - After `stop`, `poll` returns `None` until the next successful `start`.

use std::time::Instant;

use tracing::{debug, info};

use crate::audio::FrameSource;
use crate::config::SessionConfig;
use crate::error::CaptureError;
use crate::label::LabelThrottle;
use crate::mapper::{self, ScalePositionMapper};
use crate::pitch::PitchEstimator;
use crate::scale::{self, ScaleDefinition};
use crate::PollReading;

pub struct PitchSession<S: FrameSource> {
    source: S,
    estimator: PitchEstimator,
    mapper: ScalePositionMapper,
    labels: LabelThrottle,
    low: ScaleDefinition,
    high: ScaleDefinition,
    root_key: u8,
    base_octave: i32,
}

impl<S: FrameSource> PitchSession<S> {
    pub fn new(source: S, config: &SessionConfig) -> Self {
        let config = config.clone().validated();
        let (low, high) = scale::major_scale_pair(config.root_key, config.base_octave);
        Self {
            source,
            estimator: config.estimator(),
            mapper: ScalePositionMapper::new(config.range_buffer_hz),
            labels: LabelThrottle::new(config.label_interval()),
            low,
            high,
            root_key: config.root_key,
            base_octave: config.base_octave,
        }
    }

    /// Starts listening. Does nothing if already listening.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.source.is_active() {
            return Ok(());
        }
        self.source.start()?;
        info!(root_key = self.root_key, base_octave = self.base_octave, "listening");
        Ok(())
    }

    /// Stops listening and clears transient state. Always safe to call.
    pub fn stop(&mut self) {
        let was_active = self.source.is_active();
        self.source.stop();
        self.mapper.reset();
        self.labels.reset();
        if was_active {
            info!("stopped listening");
        }
    }

    pub fn is_listening(&self) -> bool {
        self.source.is_active()
    }

    /// Switches to a new root key and register, regenerating both definitions.
    ///
    /// The previous position belongs to the old scale, so continuity is cleared.
    pub fn set_scale(&mut self, root_key: u8, base_octave: i32) {
        let root_key = root_key % 12;
        let (low, high) = scale::major_scale_pair(root_key, base_octave);
        self.low = low;
        self.high = high;
        self.root_key = root_key;
        self.base_octave = base_octave;
        self.mapper.reset();
        debug!(root_key, base_octave, "scale changed");
    }

    pub fn root_key(&self) -> u8 {
        self.root_key
    }

    pub fn base_octave(&self) -> i32 {
        self.base_octave
    }

    pub fn scales(&self) -> (&ScaleDefinition, &ScaleDefinition) {
        (&self.low, &self.high)
    }

    /// Last non-null position this session has produced.
    pub fn continuity(&self) -> Option<f32> {
        self.mapper.continuity()
    }

    /// One polling cycle: read the latest frame, estimate, map and label.
    ///
    /// Returns `None` when not listening. When listening but no frame is
    /// buffered, the reading is treated like a frame without pitch.
    pub fn poll(&mut self, now: Instant) -> Option<PollReading> {
        if !self.source.is_active() {
            return None;
        }

        let frequency = self
            .source
            .latest_frame()
            .and_then(|frame| self.estimator.estimate_frame(&frame));

        let position = frequency
            .and_then(|f| self.mapper.position_for(f, &self.low, &self.high));

        let note_label = self.labels.update(frequency, now).map(str::to_owned);

        debug!(?frequency, ?position, ?note_label, "poll");

        Some(PollReading {
            frequency,
            position,
            display_position: mapper::display_position(position, true),
            note_label,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: FrameSource> Drop for PitchSession<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
