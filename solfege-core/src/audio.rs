//! # Audio Capture Module
//!
//! This module defines the audio frame handed to the pitch estimator and the
//! pull-based frame source the session polls. The microphone implementation
//! uses CPAL (Cross-Platform Audio Library) on a dedicated capture thread.
//!
//! ## Features
//! - `FrameSource` trait: idempotent start/stop plus "latest frame" polling
//! - Automatic input device and configuration selection
//! - Multi-channel inputs are downmixed to mono
//! - Start-up failures are reported before any polling begins

use std::thread::{self, JoinHandle};

use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::{debug, info, trace, warn};

use crate::error::CaptureError;

/// Audio buffer size for processing frames.
///
/// The autocorrelation scan covers lags up to half a frame, so 2048 samples
/// at 44.1 kHz reach down to roughly 43 Hz.
pub const BUFFER_SIZE: usize = 2048;

/// Sample rate requested from the input device.
pub const TARGET_SAMPLE_RATE: u32 = 44_100;

/// Completed frames waiting for the next poll. Eight frames cover about
/// 370 ms at 44.1 kHz, longer than the default polling cadence.
const FRAME_QUEUE_DEPTH: usize = 8;

/// A fixed-size block of mono samples, normalized to [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioFrame {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Root-mean-square amplitude of the frame.
    pub fn rms(&self) -> f32 {
        rms(&self.samples)
    }
}

/// Root-mean-square amplitude of a signal; 0.0 for an empty slice.
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|&s| s * s).sum::<f32>() / signal.len() as f32).sqrt()
}

/// A pull-based supplier of audio frames.
///
/// Implementations must make `start` a no-op while already active, leave
/// nothing acquired when `start` fails, and make `stop` safe to call at any
/// time, any number of times.
pub trait FrameSource {
    /// Acquires the input. Calling it on an active source does nothing.
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Releases the input. Harmless when not started.
    fn stop(&mut self);

    fn is_active(&self) -> bool;

    /// The most recent complete frame, or `None` if nothing new is buffered.
    fn latest_frame(&mut self) -> Option<AudioFrame>;
}

/// Microphone input backed by the host's default input device.
///
/// The CPAL stream lives on its own thread for its whole lifetime; this value
/// only holds channel endpoints, so it can be moved freely between threads.
#[derive(Debug)]
pub struct MicrophoneSource {
    target_sample_rate: u32,
    frame_size: usize,
    worker: Option<CaptureWorker>,
}

/// Handle to the running capture thread.
#[derive(Debug)]
struct CaptureWorker {
    shutdown_tx: Sender<()>,
    frames_rx: Receiver<Vec<f32>>,
    sample_rate: u32,
    thread_handle: Option<JoinHandle<()>>,
}

impl Default for MicrophoneSource {
    fn default() -> Self {
        Self::new(TARGET_SAMPLE_RATE, BUFFER_SIZE)
    }
}

impl MicrophoneSource {
    pub fn new(target_sample_rate: u32, frame_size: usize) -> Self {
        Self {
            target_sample_rate,
            frame_size: frame_size.max(1),
            worker: None,
        }
    }

    /// Sample rate the device actually delivers, once started.
    pub fn sample_rate(&self) -> Option<u32> {
        self.worker.as_ref().map(|w| w.sample_rate)
    }
}

impl FrameSource for MicrophoneSource {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.worker.is_some() {
            return Ok(());
        }

        let (status_tx, status_rx) = crossbeam_channel::bounded(1);
        let (frames_tx, frames_rx) = crossbeam_channel::bounded(FRAME_QUEUE_DEPTH);
        let evictor = frames_rx.clone();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let target_sample_rate = self.target_sample_rate;
        let frame_size = self.frame_size;

        let thread_handle = thread::Builder::new()
            .name("solfege-capture".to_string())
            .spawn(move || {
                let stream = match open_input_stream(frames_tx, evictor, target_sample_rate, frame_size) {
                    Ok((stream, sample_rate)) => {
                        let _ = status_tx.send(Ok(sample_rate));
                        stream
                    }
                    Err(e) => {
                        let _ = status_tx.send(Err(e));
                        return;
                    }
                };

                // Parks until stop() signals or the source is dropped.
                let _ = shutdown_rx.recv();

                if let Err(e) = stream.pause() {
                    warn!("error pausing input stream: {}", e);
                }
                drop(stream);
                debug!("capture thread finished");
            })
            .map_err(|e| CaptureError::Backend(e.to_string()))?;

        let status = status_rx.recv().unwrap_or(Err(CaptureError::WorkerLost));
        match status {
            Ok(sample_rate) => {
                info!(sample_rate, frame_size, "microphone capture started");
                self.worker = Some(CaptureWorker {
                    shutdown_tx,
                    frames_rx,
                    sample_rate,
                    thread_handle: Some(thread_handle),
                });
                Ok(())
            }
            Err(e) => {
                if thread_handle.join().is_err() {
                    warn!("capture thread panicked during start-up");
                }
                warn!("microphone capture failed to start: {}", e);
                Err(e)
            }
        }
    }

    fn stop(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            let _ = worker.shutdown_tx.send(());
            if let Some(handle) = worker.thread_handle.take() {
                if handle.join().is_err() {
                    warn!("capture thread panicked");
                }
            }
            info!("microphone capture stopped");
        }
    }

    fn is_active(&self) -> bool {
        self.worker.is_some()
    }

    fn latest_frame(&mut self) -> Option<AudioFrame> {
        let worker = self.worker.as_ref()?;
        drain_latest(&worker.frames_rx).map(|samples| AudioFrame::new(samples, worker.sample_rate))
    }
}

impl Drop for MicrophoneSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Queues `frame`, evicting the oldest queued frames while the queue is full,
/// so the newest audio is never the frame that gets lost.
fn push_latest(sender: &Sender<Vec<f32>>, evictor: &Receiver<Vec<f32>>, frame: Vec<f32>) {
    let mut frame = frame;
    loop {
        match sender.try_send(frame) {
            Ok(()) => return,
            Err(TrySendError::Full(rejected)) => {
                trace!("frame queue full, evicting oldest frame");
                let _ = evictor.try_recv();
                frame = rejected;
            }
            Err(TrySendError::Disconnected(_)) => return,
        }
    }
}

/// Empties the queue and returns the newest frame in it.
fn drain_latest(receiver: &Receiver<Vec<f32>>) -> Option<Vec<f32>> {
    receiver.try_iter().last()
}

/// Opens the default input device and starts streaming frames into `sender`.
/// `evictor` is a second handle on the same queue used to drop stale frames.
///
/// Must run on the thread that will own the returned stream.
fn open_input_stream(
    sender: Sender<Vec<f32>>,
    evictor: Receiver<Vec<f32>>,
    target_sample_rate: u32,
    frame_size: usize,
) -> Result<(cpal::Stream, u32), CaptureError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(CaptureError::NoInputDevice)?;

    info!("using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, target_sample_rate)
        .ok_or(CaptureError::UnsupportedConfig(target_sample_rate))?;

    let sample_rate = target_sample_rate.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    );
    let config = supported_config.with_sample_rate(cpal::SampleRate(sample_rate));
    let channels = usize::from(config.channels()).max(1);
    let config: cpal::StreamConfig = config.into();

    debug!(sample_rate, channels, "selected input configuration");

    let err_fn = |err| warn!("an error occurred on the audio stream: {}", err);

    // Accumulates downmixed samples until a full frame is available.
    let mut audio_buffer: Vec<f32> = Vec::with_capacity(frame_size * 2);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            if channels == 1 {
                audio_buffer.extend_from_slice(data);
            } else {
                audio_buffer.extend(
                    data.chunks(channels)
                        .map(|c| c.iter().sum::<f32>() / c.len() as f32),
                );
            }

            while audio_buffer.len() >= frame_size {
                let frame: Vec<f32> = audio_buffer.drain(..frame_size).collect();
                push_latest(&sender, &evictor, frame);
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Finds the best supported f32 input configuration for the target rate.
///
/// Mono configurations win over multi-channel ones; ties are broken by how
/// close the supported rate range comes to `target_rate`.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min = c.min_sample_rate().0;
            let max = c.max_sample_rate().0;
            let distance = if (min..=max).contains(&target_rate) {
                0
            } else {
                min.abs_diff(target_rate).min(max.abs_diff(target_rate))
            };
            (c.channels() != 1, distance)
        })
}
