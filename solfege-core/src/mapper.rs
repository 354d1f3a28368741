//! # Scale Position Mapper
//!
//! Turns a detected frequency into a continuous position on the 8-rung
//! ladder: the integer part is the scale tone at or below the pitch, the
//! fractional part the (warped) progress toward the next tone.
//!
//! Two definitions, a low and a high register, are consulted. Near their
//! shared boundary both can claim the pitch, and the last position shown
//! decides which one to believe so the indicator doesn't flicker between the
//! top of one register and the bottom of the other.

use tracing::trace;

use crate::scale::{SCALE_LENGTH, ScaleDefinition};

/// Slack around a definition's outermost tones, in Hz.
pub const DEFAULT_RANGE_BUFFER_HZ: f32 = 15.0;

/// Where the indicator rests while listening without a usable pitch.
pub const REST_POSITION: f32 = -0.5;

/// Last position above which the overlap is resolved toward the low register.
const HYSTERESIS_SPLIT: f32 = 3.5;

const TOP_POSITION: f32 = (SCALE_LENGTH - 1) as f32;

/// Remaps the linear progress between two adjacent scale tones.
///
/// Across a whole tone (`semitone_distance == 2`) the middle quarter of the
/// interval is compressed into a tenth of the display, so the indicator
/// lingers near the scale tones and hurries over the chromatic gap. Any other
/// distance passes `fraction` through unchanged.
pub fn warp(fraction: f32, semitone_distance: i32) -> f32 {
    if semitone_distance != 2 {
        return fraction;
    }
    if fraction < 0.375 {
        fraction / 0.375 * 0.45
    } else if fraction <= 0.625 {
        0.45 + (fraction - 0.375) / 0.25 * 0.10
    } else {
        0.55 + (fraction - 0.625) / 0.375 * 0.45
    }
}

/// Position of `frequency` within a single definition.
///
/// Returns `None` when the frequency lies further than `buffer_hz` outside the
/// definition's range. Inside the buffer but beyond the outermost tones the
/// position clamps to 0 or 7.
pub fn locate(frequency: f32, definition: &ScaleDefinition, buffer_hz: f32) -> Option<f32> {
    if !frequency.is_finite() {
        return None;
    }
    let lowest = definition.min_frequency();
    let highest = definition.max_frequency();
    if frequency < lowest - buffer_hz || frequency > highest + buffer_hz {
        return None;
    }
    if frequency < lowest {
        return Some(0.0);
    }
    if frequency > highest {
        return Some(TOP_POSITION);
    }

    let tones = definition.tones();
    if let Some(tone) = tones.iter().find(|t| t.frequency == frequency) {
        return Some(tone.index as f32);
    }
    tones.windows(2).enumerate().find_map(|(i, pair)| {
        let (lower, upper) = (pair[0].frequency, pair[1].frequency);
        if lower <= frequency && frequency <= upper {
            let span = upper - lower;
            let fraction = if span > 0.0 {
                (frequency - lower) / span
            } else {
                0.0
            };
            let distance = definition.semitones_between(i).unwrap_or(0);
            Some(i as f32 + warp(fraction, distance))
        } else {
            None
        }
    })
}

/// Combines both registers into one position, using `continuity` (the last
/// non-null position) to settle the overlap.
///
/// # Returns
/// `(position, updated_continuity)`. A `None` position leaves the continuity
/// value untouched.
pub fn position_for(
    frequency: f32,
    low: &ScaleDefinition,
    high: &ScaleDefinition,
    continuity: Option<f32>,
    buffer_hz: f32,
) -> (Option<f32>, Option<f32>) {
    let low_position = locate(frequency, low, buffer_hz);
    let high_position = locate(frequency, high, buffer_hz);

    let position = match (low_position, high_position) {
        (Some(l), Some(h)) => match continuity {
            Some(last) if last > HYSTERESIS_SPLIT => Some(l),
            Some(_) => Some(h),
            None => Some(l),
        },
        (Some(l), None) => Some(l),
        (None, Some(h)) => Some(h),
        (None, None) => None,
    };

    trace!(frequency, ?low_position, ?high_position, ?position, "mapped frequency");
    (position, position.or(continuity))
}

/// What the display should show for a poll: the position itself, the rest
/// position while listening without one, or nothing when not listening.
pub fn display_position(position: Option<f32>, listening: bool) -> Option<f32> {
    match position {
        Some(p) => Some(p),
        None if listening => Some(REST_POSITION),
        None => None,
    }
}

/// Stateful mapper holding the continuity value for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalePositionMapper {
    continuity: Option<f32>,
    buffer_hz: f32,
}

impl Default for ScalePositionMapper {
    fn default() -> Self {
        Self::new(DEFAULT_RANGE_BUFFER_HZ)
    }
}

impl ScalePositionMapper {
    pub fn new(buffer_hz: f32) -> Self {
        Self {
            continuity: None,
            buffer_hz,
        }
    }

    /// Maps `frequency` and remembers the result if there is one.
    pub fn position_for(
        &mut self,
        frequency: f32,
        low: &ScaleDefinition,
        high: &ScaleDefinition,
    ) -> Option<f32> {
        let (position, continuity) =
            position_for(frequency, low, high, self.continuity, self.buffer_hz);
        self.continuity = continuity;
        position
    }

    /// The last non-null position, if any.
    pub fn continuity(&self) -> Option<f32> {
        self.continuity
    }

    pub fn set_continuity(&mut self, continuity: Option<f32>) {
        self.continuity = continuity;
    }

    pub fn reset(&mut self) {
        self.continuity = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::{major_scale, major_scale_pair};
    use approx::assert_abs_diff_eq;

    #[test]
    fn warp_boundaries() {
        assert_eq!(warp(0.0, 2), 0.0);
        assert_abs_diff_eq!(warp(1.0, 2), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(warp(0.375, 2), 0.45, epsilon = 1e-6);
        assert_abs_diff_eq!(warp(0.625, 2), 0.55, epsilon = 1e-6);
        assert_abs_diff_eq!(warp(0.5, 2), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn warp_is_monotonic_and_continuous() {
        let mut previous = warp(0.0, 2);
        for step in 1..=1000 {
            let x = step as f32 / 1000.0;
            let y = warp(x, 2);
            assert!(y >= previous, "warp decreased at {}", x);
            assert!(y - previous < 0.01, "warp jumped at {}", x);
            previous = y;
        }
    }

    #[test]
    fn warp_is_identity_off_whole_tones() {
        for d in [0, 1, 3, 12] {
            for x in [0.0, 0.2, 0.375, 0.5, 0.9, 1.0] {
                assert_eq!(warp(x, d), x);
            }
        }
    }

    #[test]
    fn exact_tones_snap_to_integers() {
        let scale = major_scale(0, 4);
        for tone in scale.tones() {
            let position = locate(tone.frequency, &scale, DEFAULT_RANGE_BUFFER_HZ).unwrap();
            assert_eq!(position.fract(), 0.0);
            assert_eq!(position, tone.index as f32);
        }
    }

    #[test]
    fn halfway_across_a_whole_tone_is_centred() {
        let scale = major_scale(0, 4);
        let c = scale.frequency(0).unwrap();
        let d = scale.frequency(1).unwrap();
        let position = locate((c + d) / 2.0, &scale, DEFAULT_RANGE_BUFFER_HZ).unwrap();
        assert_abs_diff_eq!(position, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn semitone_steps_are_linear() {
        let scale = major_scale(0, 4);
        let e = scale.frequency(2).unwrap();
        let f = scale.frequency(3).unwrap();
        let quarter = e + (f - e) * 0.25;
        let position = locate(quarter, &scale, DEFAULT_RANGE_BUFFER_HZ).unwrap();
        assert_abs_diff_eq!(position, 2.25, epsilon = 1e-4);
    }

    #[test]
    fn buffer_clamps_and_rejects() {
        let scale = major_scale(0, 4);
        let lowest = scale.min_frequency();
        let highest = scale.max_frequency();
        assert_eq!(locate(lowest - 10.0, &scale, 15.0), Some(0.0));
        assert_eq!(locate(highest + 10.0, &scale, 15.0), Some(7.0));
        assert_eq!(locate(lowest - 20.0, &scale, 15.0), None);
        assert_eq!(locate(highest + 20.0, &scale, 15.0), None);
        assert_eq!(locate(f32::NAN, &scale, 15.0), None);
    }

    #[test]
    fn overlap_uses_continuity() {
        let (low, high) = major_scale_pair(0, 4);
        let boundary = low.max_frequency();

        let (position, _) = position_for(boundary, &low, &high, Some(7.0), 15.0);
        assert_eq!(position, Some(7.0));

        let (position, _) = position_for(boundary, &low, &high, Some(0.0), 15.0);
        assert_eq!(position, Some(0.0));

        // No history yet: low register.
        let (position, _) = position_for(boundary, &low, &high, None, 15.0);
        assert_eq!(position, Some(7.0));
    }

    #[test]
    fn single_register_matches() {
        let (low, high) = major_scale_pair(0, 4);
        let (position, continuity) = position_for(440.0, &low, &high, Some(0.0), 15.0);
        assert_abs_diff_eq!(position.unwrap(), 5.0, epsilon = 1e-4);
        assert_eq!(continuity, position);

        let (position, _) = position_for(880.0, &low, &high, Some(7.0), 15.0);
        assert_abs_diff_eq!(position.unwrap(), 5.0, epsilon = 1e-4);
    }

    #[test]
    fn null_position_keeps_continuity() {
        let (low, high) = major_scale_pair(0, 4);
        let mut mapper = ScalePositionMapper::default();
        assert!(mapper.position_for(440.0, &low, &high).is_some());
        let remembered = mapper.continuity();

        assert_eq!(mapper.position_for(50.0, &low, &high), None);
        assert_eq!(mapper.continuity(), remembered);

        mapper.reset();
        assert_eq!(mapper.continuity(), None);
    }

    #[test]
    fn mapper_keeps_register_through_overlap() {
        let (low, high) = major_scale_pair(0, 4);
        let mut mapper = ScalePositionMapper::default();
        // Climb to the top of the low register...
        mapper.position_for(low.frequency(6).unwrap(), &low, &high);
        // ...then sing the shared tone: stay at the top of the low ladder.
        assert_eq!(mapper.position_for(boundary(&low), &low, &high), Some(7.0));

        mapper.set_continuity(Some(1.0));
        assert_eq!(mapper.position_for(boundary(&low), &low, &high), Some(0.0));
    }

    fn boundary(low: &ScaleDefinition) -> f32 {
        low.max_frequency()
    }

    #[test]
    fn rest_position_only_while_listening() {
        assert_eq!(display_position(None, true), Some(REST_POSITION));
        assert_eq!(display_position(None, false), None);
        assert_eq!(display_position(Some(3.25), true), Some(3.25));
    }
}
