//! # Pitch Detection Module
//!
//! Time-domain fundamental frequency estimation for a single mono frame.
//!
//! ## Algorithm
//! 1. RMS noise gate: quiet frames are rejected outright.
//! 2. Normalized difference similarity for each lag `L` in `[0, N/2)`:
//!    `sim(L) = 1 - mean(|x[i] - x[i + L]|)` over the first half of the frame.
//! 3. Peak scan: the first ascent above [`GOOD_ENOUGH_SIMILARITY`] is tracked
//!    until the similarity drops again; the best lag of that ascent wins.
//! 4. Parabolic-style refinement of the winning lag using its neighbours.
//!
//! Degenerate input (silence, empty or very short frames, zero lag) always
//! yields `None`; this module never panics on malformed frames.

use crate::audio::{self, AudioFrame};

/// Frames with an RMS below this are treated as silence.
pub const DEFAULT_SILENCE_THRESHOLD: f32 = 0.01;

/// Similarity a lag must exceed to start or continue a qualifying ascent.
pub const GOOD_ENOUGH_SIMILARITY: f32 = 0.9;

/// Minimum best similarity for the fallback lag when no ascent was found.
pub const FALLBACK_SIMILARITY: f32 = 0.01;

/// Empirical scale applied to the lag correction term. It has no derivation
/// behind it; it is kept because it tracks sung pitches well.
pub const DEFAULT_INTERPOLATION_SCALE: f32 = 8.0;

/// A lag and its similarity score.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    lag: usize,
    similarity: f32,
}

/// The two states of the autocorrelation peak scan.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ScanState {
    /// No qualifying ascent yet. Remembers the best lag overall for the fallback.
    Searching { best: Option<Candidate> },
    /// Inside a qualifying ascent; remembers its best point.
    Tracking { peak: Candidate },
}

/// Explicit two-state scanner over `(lag, similarity)` pairs in increasing lag order.
#[derive(Debug, Clone)]
pub(crate) struct PeakScanner {
    state: ScanState,
    previous: Option<f32>,
}

impl PeakScanner {
    pub(crate) fn new() -> Self {
        Self {
            state: ScanState::Searching { best: None },
            previous: None,
        }
    }

    /// Feeds the next lag. Returns the chosen lag once the ascent is over.
    pub(crate) fn feed(&mut self, lag: usize, similarity: f32) -> Option<usize> {
        let rising = self.previous.is_some_and(|prev| similarity > prev);
        let qualifying = similarity > GOOD_ENOUGH_SIMILARITY && rising;
        self.previous = Some(similarity);
        let current = Candidate { lag, similarity };

        match &mut self.state {
            ScanState::Searching { best } => {
                // Lag 0 compares the window with itself and always scores 1.0,
                // so a frame with no qualifying ascent falls back to lag 0 and
                // the estimator reports no pitch.
                if best.is_none_or(|b| similarity > b.similarity) {
                    *best = Some(current);
                }
                if qualifying {
                    self.state = ScanState::Tracking { peak: current };
                }
                None
            }
            ScanState::Tracking { peak } => {
                if qualifying {
                    if similarity > peak.similarity {
                        *peak = current;
                    }
                    None
                } else {
                    Some(peak.lag)
                }
            }
        }
    }

    /// Resolves the scan after the last lag has been fed.
    ///
    /// An ascent still running at the final lag returns its best point;
    /// otherwise the overall best lag is used if it clears
    /// [`FALLBACK_SIMILARITY`].
    pub(crate) fn finish(self) -> Option<usize> {
        match self.state {
            ScanState::Tracking { peak } => Some(peak.lag),
            ScanState::Searching { best } => best
                .filter(|b| b.similarity > FALLBACK_SIMILARITY)
                .map(|b| b.lag),
        }
    }
}

/// Autocorrelation pitch estimator with tunable constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimator {
    /// RMS below which a frame is considered silent.
    pub silence_threshold: f32,
    /// Scale applied to the sub-sample lag correction.
    pub interpolation_scale: f32,
}

impl Default for PitchEstimator {
    fn default() -> Self {
        Self {
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            interpolation_scale: DEFAULT_INTERPOLATION_SCALE,
        }
    }
}

impl PitchEstimator {
    pub fn new(silence_threshold: f32, interpolation_scale: f32) -> Self {
        Self {
            silence_threshold,
            interpolation_scale,
        }
    }

    pub fn estimate_frame(&self, frame: &AudioFrame) -> Option<f32> {
        self.estimate(&frame.samples, frame.sample_rate)
    }

    /// Estimates the fundamental frequency of `signal` in Hz.
    ///
    /// # Returns
    /// * `Some(frequency)` - Detected frequency in Hz
    /// * `None` - Silence, a frame too short to scan, or no usable period
    pub fn estimate(&self, signal: &[f32], sample_rate: u32) -> Option<f32> {
        let half = signal.len() / 2;
        if half < 2 || sample_rate == 0 {
            return None;
        }

        // --- Noise gate ---
        let level = audio::rms(signal);
        if !level.is_finite() || level < self.silence_threshold {
            return None;
        }

        // --- Similarity scan ---
        let mut similarities = Vec::with_capacity(half);
        let mut scanner = PeakScanner::new();
        let mut chosen = None;
        for lag in 0..half {
            let similarity = lag_similarity(signal, lag, half);
            similarities.push(similarity);
            if let Some(lag) = scanner.feed(lag, similarity) {
                chosen = Some(lag);
                break;
            }
        }
        let lag = match chosen {
            Some(lag) => lag,
            None => scanner.finish()?,
        };

        // Lag 0 has no left neighbour and no period.
        if lag == 0 {
            return None;
        }

        // --- Sub-sample refinement ---
        let correction = match (
            similarities.get(lag - 1),
            similarities.get(lag),
            similarities.get(lag + 1),
        ) {
            (Some(&left), Some(&centre), Some(&right)) if centre != 0.0 => {
                self.interpolation_scale * (right - left) / centre
            }
            _ => 0.0,
        };

        let period = lag as f32 + correction;
        let frequency = sample_rate as f32 / period;
        if frequency.is_finite() && frequency > 0.0 {
            Some(frequency)
        } else {
            None
        }
    }
}

/// `1 - mean(|x[i] - x[i + lag]|)` over the first `window` samples.
fn lag_similarity(signal: &[f32], lag: usize, window: usize) -> f32 {
    let total: f32 = signal[..window]
        .iter()
        .zip(&signal[lag..lag + window])
        .map(|(a, b)| (a - b).abs())
        .sum();
    1.0 - total / window as f32
}

/// Estimates pitch with the default constants.
///
/// # Arguments
/// * `signal` - Input audio signal
/// * `sample_rate` - Sample rate in Hz
/// * `amplitude_threshold` - Minimum RMS for pitch detection
pub fn detect_pitch_autocorrelation(
    signal: &[f32],
    sample_rate: u32,
    amplitude_threshold: f32,
) -> Option<f32> {
    PitchEstimator {
        silence_threshold: amplitude_threshold,
        ..PitchEstimator::default()
    }
    .estimate(signal, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 44_100;

    fn generate_sine(freq: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                amplitude * (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect()
    }

    #[test]
    fn silence_is_no_pitch() {
        let estimator = PitchEstimator::default();
        assert_eq!(estimator.estimate(&vec![0.0; 2048], SAMPLE_RATE), None);
        // Audible shape, but below the gate.
        let quiet = generate_sine(440.0, 0.005, 2048);
        assert_eq!(estimator.estimate(&quiet, SAMPLE_RATE), None);
    }

    #[test]
    fn short_and_empty_frames_are_no_pitch() {
        let estimator = PitchEstimator::default();
        assert_eq!(estimator.estimate(&[], SAMPLE_RATE), None);
        assert_eq!(estimator.estimate(&[0.5], SAMPLE_RATE), None);
        assert_eq!(estimator.estimate(&[0.5, -0.5, 0.5], SAMPLE_RATE), None);
    }

    #[test]
    fn zero_sample_rate_is_no_pitch() {
        let signal = generate_sine(440.0, 0.5, 2048);
        assert_eq!(PitchEstimator::default().estimate(&signal, 0), None);
    }

    #[test]
    fn constant_offset_is_no_pitch() {
        // Every lag is perfectly similar, so the fallback lands on lag 0.
        assert_eq!(
            detect_pitch_autocorrelation(&vec![0.5; 2048], SAMPLE_RATE, 0.01),
            None
        );
    }

    #[test]
    fn pure_tones_within_one_percent() {
        let estimator = PitchEstimator::default();
        for freq in [70.0, 110.0, 220.0, 261.63, 440.0, 659.0, 880.0, 1000.0] {
            let signal = generate_sine(freq, 0.5, 2048);
            let detected = estimator
                .estimate(&signal, SAMPLE_RATE)
                .expect("tone should be detected");
            assert!(
                (detected - freq).abs() / freq < 0.01,
                "expected ~{} Hz, got {} Hz",
                freq,
                detected
            );
        }
    }

    #[test]
    fn frame_wrapper_matches_slice_api() {
        let frame = AudioFrame::new(generate_sine(220.0, 0.5, 2048), SAMPLE_RATE);
        let estimator = PitchEstimator::default();
        assert_eq!(
            estimator.estimate_frame(&frame),
            estimator.estimate(&frame.samples, SAMPLE_RATE)
        );
    }

    #[test]
    fn interpolation_scale_is_overridable() {
        let signal = generate_sine(261.63, 0.5, 2048);
        let unrefined = PitchEstimator::new(DEFAULT_SILENCE_THRESHOLD, 0.0)
            .estimate(&signal, SAMPLE_RATE)
            .unwrap();
        // Without refinement the result is exactly sample_rate / integer lag.
        let lag = SAMPLE_RATE as f32 / unrefined;
        approx::assert_abs_diff_eq!(lag, lag.round(), epsilon = 1e-3);
    }

    #[test]
    fn scanner_stops_at_first_drop_after_ascent() {
        let mut scanner = PeakScanner::new();
        let sims = [1.0, 0.5, 0.2, 0.6, 0.92, 0.97, 0.95, 0.99];
        let mut chosen = None;
        for (lag, &s) in sims.iter().enumerate() {
            if let Some(lag) = scanner.feed(lag, s) {
                chosen = Some(lag);
                break;
            }
        }
        // Lag 7 is higher, but the scan ended at the drop after lag 5.
        assert_eq!(chosen, Some(5));
    }

    #[test]
    fn scanner_returns_peak_at_final_lag() {
        let mut scanner = PeakScanner::new();
        for (lag, &s) in [1.0, 0.4, 0.91, 0.95].iter().enumerate() {
            assert_eq!(scanner.feed(lag, s), None);
        }
        assert_eq!(scanner.finish(), Some(3));
    }

    #[test]
    fn scanner_falls_back_to_best_lag_without_ascent() {
        let mut scanner = PeakScanner::new();
        for (lag, &s) in [0.3, 0.5, 0.2, 0.4].iter().enumerate() {
            assert_eq!(scanner.feed(lag, s), None);
        }
        assert_eq!(scanner.finish(), Some(1));
    }

    #[test]
    fn unpitched_noise_is_no_pitch() {
        // Deterministic LCG noise, well above the gate but with no period.
        let mut state: u32 = 0x1234_5678;
        let noise: Vec<f32> = (0..2048)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 8) as f32 / (1u32 << 24) as f32 - 0.5
            })
            .collect();
        assert!(audio::rms(&noise) > 0.2);
        assert_eq!(PitchEstimator::default().estimate(&noise, SAMPLE_RATE), None);
    }

    #[test]
    fn scanner_fallback_without_ascent_lands_on_lag_zero() {
        let mut scanner = PeakScanner::new();
        for (lag, &s) in [1.0, 0.6, 0.7, 0.85, 0.8].iter().enumerate() {
            assert_eq!(scanner.feed(lag, s), None);
        }
        assert_eq!(scanner.finish(), Some(0));
    }

    #[test]
    fn scanner_rejects_weak_fallback() {
        let mut scanner = PeakScanner::new();
        for (lag, &s) in [0.005, -0.2, 0.0].iter().enumerate() {
            scanner.feed(lag, s);
        }
        assert_eq!(scanner.finish(), None);
    }
}
