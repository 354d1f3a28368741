//! # Musical Tuning Module
//!
//! Equal-temperament conversions (A4 = 440 Hz = note number 69) and the note
//! namer that turns a frequency into a readable label such as "Eb4".
//!
//! ## Note naming
//! Labels use flats for the black keys. Four of those pitch classes
//! (C#, Eb, G#, Bb) only accept pitches within a quarter semitone of their
//! centre; anything further out is handed to the neighbouring natural tone.
//! A singer drifting toward a diatonic note therefore sees that note's name
//! earlier than plain rounding would show it.

/// Reference pitch in Hz.
pub const A4_FREQUENCY: f32 = 440.0;
/// Note number of the reference pitch.
pub const A4_NOTE_NUMBER: i32 = 69;

/// Pitch-class names, indexed from C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Pitch classes with the narrowed acceptance window.
const NARROW_PITCH_CLASSES: [usize; 4] = [1, 3, 8, 10];

/// Half-width of the narrowed window, in semitones.
const NARROW_WINDOW: f32 = 0.25;

/// Fractional note number for a frequency.
pub fn frequency_to_note_number(freq: f32) -> f32 {
    A4_NOTE_NUMBER as f32 + 12.0 * (freq / A4_FREQUENCY).log2()
}

/// Frequency of a (possibly fractional) note number.
pub fn note_number_to_frequency(note_number: f32) -> f32 {
    A4_FREQUENCY * 2.0_f32.powf((note_number - A4_NOTE_NUMBER as f32) / 12.0)
}

/// Calculates the deviation from a target frequency in cents.
///
/// 100 cents is one semitone; positive values are sharp.
pub fn calculate_cents_deviation(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}

/// Pitch class (0 = C) of an integer note number.
pub fn pitch_class(note_number: i32) -> usize {
    note_number.rem_euclid(12) as usize
}

/// Octave of an integer note number; note 60 is octave 4.
pub fn octave(note_number: i32) -> i32 {
    note_number.div_euclid(12) - 1
}

/// Nearest note number to `freq`, with the narrowed windows applied.
///
/// Returns `None` for frequencies that are not finite and positive.
pub fn nearest_note_number(freq: f32) -> Option<i32> {
    if !freq.is_finite() || freq <= 0.0 {
        return None;
    }
    let n = frequency_to_note_number(freq);
    let mut rounded = n.round() as i32;
    let deviation = n - rounded as f32;

    if NARROW_PITCH_CLASSES.contains(&pitch_class(rounded)) && deviation.abs() > NARROW_WINDOW {
        rounded += if deviation > 0.0 { 1 } else { -1 };
    }
    Some(rounded)
}

/// Label of an integer note number, e.g. 60 -> "C4".
pub fn note_name(note_number: i32) -> String {
    format!("{}{}", NOTE_NAMES[pitch_class(note_number)], octave(note_number))
}

/// Names the note nearest to `freq`.
///
/// # Returns
/// * `Some(label)` - Pitch-class name followed by the octave, e.g. "A4"
/// * `None` - The frequency was not finite and positive
pub fn note_label(freq: f32) -> Option<String> {
    nearest_note_number(freq).map(note_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frequency_at(note_number: f32) -> f32 {
        note_number_to_frequency(note_number)
    }

    #[test]
    fn concert_a() {
        assert_eq!(note_label(440.0).as_deref(), Some("A4"));
    }

    #[test]
    fn middle_c() {
        assert_eq!(note_label(frequency_at(60.0)).as_deref(), Some("C4"));
        assert_eq!(note_label(261.63).as_deref(), Some("C4"));
    }

    #[test]
    fn black_keys_use_flats() {
        assert_eq!(note_label(frequency_at(63.0)).as_deref(), Some("Eb4"));
        assert_eq!(note_label(frequency_at(70.1)).as_deref(), Some("Bb4"));
        assert_eq!(note_label(frequency_at(66.0)).as_deref(), Some("Gb4"));
    }

    #[test]
    fn narrow_class_hands_off_to_neighbour() {
        // 0.3 above C#4 is outside the quarter-semitone window.
        assert_eq!(note_label(frequency_at(61.3)).as_deref(), Some("D4"));
        assert_eq!(note_label(frequency_at(60.7)).as_deref(), Some("C4"));
        // Inside the window the flat name stays.
        assert_eq!(note_label(frequency_at(61.2)).as_deref(), Some("Db4"));
        assert_eq!(note_label(frequency_at(68.2)).as_deref(), Some("Ab4"));
    }

    #[test]
    fn wide_classes_keep_half_semitone_window() {
        // F# is not narrowed.
        assert_eq!(note_label(frequency_at(66.4)).as_deref(), Some("Gb4"));
        // Neither are naturals.
        assert_eq!(note_label(frequency_at(64.45)).as_deref(), Some("E4"));
    }

    #[test]
    fn narrowing_crosses_octave_boundary() {
        // B3 is natural; 0.3 below C4 is still C4 by plain rounding.
        assert_eq!(note_label(frequency_at(59.7)).as_deref(), Some("C4"));
        // Bb3 pushed up lands on B3, not C4.
        assert_eq!(note_label(frequency_at(58.3)).as_deref(), Some("B3"));
    }

    #[test]
    fn low_octaves() {
        assert_eq!(note_name(0), "C-1");
        assert_eq!(note_name(-1), "B-2");
        assert_eq!(note_name(21), "A0");
    }

    #[test]
    fn invalid_frequencies_have_no_label() {
        assert_eq!(note_label(0.0), None);
        assert_eq!(note_label(-440.0), None);
        assert_eq!(note_label(f32::NAN), None);
        assert_eq!(note_label(f32::INFINITY), None);
    }

    #[test]
    fn cents_deviation_signs() {
        approx::assert_abs_diff_eq!(calculate_cents_deviation(880.0, 440.0), 1200.0, epsilon = 1e-3);
        assert!(calculate_cents_deviation(430.0, 440.0) < 0.0);
    }
}
