// solfege-core/src/lib.rs

//! The core logic for the solfege singing trainer.
//! This crate turns polled microphone frames into a pitch, a continuous
//! position on an 8-rung major-scale ladder and a readable note label.
//! It is completely headless and contains no GUI code.

pub mod audio;
pub mod config;
pub mod error;
pub mod label;
pub mod mapper;
pub mod pitch;
pub mod scale;
pub mod session;
pub mod tuning;

pub use config::SessionConfig;
pub use error::CaptureError;
pub use session::PitchSession;

/// Everything one polling cycle produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PollReading {
    /// The detected fundamental in Hz, `None` for silence or no clear pitch.
    pub frequency: Option<f32>,
    /// Ladder position in [0, 7], `None` when outside both registers.
    pub position: Option<f32>,
    /// Position to draw: `position`, or the rest position when it is `None`.
    pub display_position: Option<f32>,
    /// The throttled note label, e.g. "Eb4".
    pub note_label: Option<String>,
}
