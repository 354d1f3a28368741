//! # Capture Errors
//!
//! Failures that can happen while acquiring an audio input. These are the only
//! errors the core surfaces: silent or malformed frames resolve to "no pitch"
//! and out-of-range frequencies resolve to "no position", neither of which is
//! an error.

use thiserror::Error;

/// Why a capture session could not be started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The host reports no input device at all.
    #[error("no audio input device available")]
    NoInputDevice,
    /// The device exists but cannot be opened (unplugged, busy, or access denied).
    #[error("audio input device is unavailable or access was denied")]
    DeviceUnavailable,
    /// The device offers no f32 configuration we can use.
    #[error("no supported f32 input configuration near {0} Hz")]
    UnsupportedConfig(u32),
    /// Anything else the audio backend reports.
    #[error("audio backend error: {0}")]
    Backend(String),
    /// The capture thread went away before reporting whether it started.
    #[error("capture thread exited before reporting its status")]
    WorkerLost,
}

impl From<cpal::BuildStreamError> for CaptureError {
    fn from(err: cpal::BuildStreamError) -> Self {
        match err {
            cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable,
            cpal::BuildStreamError::StreamConfigNotSupported => {
                CaptureError::Backend("stream configuration not supported".to_string())
            }
            other => CaptureError::Backend(other.to_string()),
        }
    }
}

impl From<cpal::PlayStreamError> for CaptureError {
    fn from(err: cpal::PlayStreamError) -> Self {
        match err {
            cpal::PlayStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable,
            other => CaptureError::Backend(other.to_string()),
        }
    }
}

impl From<cpal::SupportedStreamConfigsError> for CaptureError {
    fn from(err: cpal::SupportedStreamConfigsError) -> Self {
        match err {
            cpal::SupportedStreamConfigsError::DeviceNotAvailable => {
                CaptureError::DeviceUnavailable
            }
            other => CaptureError::Backend(other.to_string()),
        }
    }
}

impl From<cpal::DeviceNameError> for CaptureError {
    fn from(err: cpal::DeviceNameError) -> Self {
        CaptureError::Backend(err.to_string())
    }
}
