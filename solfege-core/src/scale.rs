//! # Scale Definitions
//!
//! A scale definition is one octave of a major scale as eight ordered
//! `(index, frequency)` tones. Two definitions are used together: a low
//! register and a high register one octave above it. Their valid ranges
//! overlap around the shared tone, which is where the position mapper's
//! hysteresis comes in.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::tuning;

/// Number of tones in a definition (seven degrees plus the octave).
pub const SCALE_LENGTH: usize = 8;

/// Semitone offsets of the major scale from its root, octave included.
pub const MAJOR_SCALE_STEPS: [i32; SCALE_LENGTH] = [0, 2, 4, 5, 7, 9, 11, 12];

/// Rung labels for display.
pub const SOLFEGE_SYLLABLES: [&str; SCALE_LENGTH] =
    ["Do", "Re", "Mi", "Fa", "Sol", "La", "Ti", "Do"];

/// Root key names for display, indexed by pitch class.
pub const ROOT_KEY_NAMES: [&str; 12] = tuning::NOTE_NAMES;

/// Name to pitch-class lookup, accepting both sharp and flat spellings.
static ROOT_KEYS: Lazy<BTreeMap<&'static str, u8>> = Lazy::new(|| {
    const SHARP_NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    ROOT_KEY_NAMES
        .iter()
        .enumerate()
        .chain(SHARP_NAMES.iter().enumerate())
        .map(|(pc, &name)| (name, pc as u8))
        .collect()
});

/// Looks up a root key by name, e.g. "Eb" or "d#" -> 3.
pub fn root_key_from_name(name: &str) -> Option<u8> {
    let name = name.trim();
    let mut chars = name.chars();
    let first = chars.next()?.to_ascii_uppercase();
    let normalized: String = std::iter::once(first).chain(chars).collect();
    ROOT_KEYS.get(normalized.as_str()).copied()
}

/// One rung of a scale definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleTone {
    /// Scale index, 0..=7.
    pub index: usize,
    /// Frequency in Hz.
    pub frequency: f32,
}

/// Eight ascending tones spanning one octave.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleDefinition {
    tones: [ScaleTone; SCALE_LENGTH],
}

impl ScaleDefinition {
    /// Builds a definition from eight ascending frequencies.
    pub fn from_frequencies(frequencies: [f32; SCALE_LENGTH]) -> Self {
        Self {
            tones: std::array::from_fn(|index| ScaleTone {
                index,
                frequency: frequencies[index],
            }),
        }
    }

    pub fn tones(&self) -> &[ScaleTone; SCALE_LENGTH] {
        &self.tones
    }

    pub fn frequency(&self, index: usize) -> Option<f32> {
        self.tones.get(index).map(|t| t.frequency)
    }

    pub fn min_frequency(&self) -> f32 {
        self.tones[0].frequency
    }

    pub fn max_frequency(&self) -> f32 {
        self.tones[SCALE_LENGTH - 1].frequency
    }

    /// Whole semitones between tone `lower` and the tone above it.
    pub fn semitones_between(&self, lower: usize) -> Option<i32> {
        let low = self.frequency(lower)?;
        let high = self.frequency(lower + 1)?;
        Some((tuning::calculate_cents_deviation(high, low) / 100.0).round() as i32)
    }
}

/// One octave of the major scale on `root_key` (pitch class, 0 = C) in
/// `octave`, so `major_scale(0, 4)` runs C4..C5.
pub fn major_scale(root_key: u8, octave: i32) -> ScaleDefinition {
    let root = (octave + 1) * 12 + i32::from(root_key % 12);
    ScaleDefinition::from_frequencies(MAJOR_SCALE_STEPS.map(|step| {
        tuning::note_number_to_frequency((root + step) as f32)
    }))
}

/// The low and high register definitions for a root key; the high one sits
/// one octave above `base_octave`.
pub fn major_scale_pair(root_key: u8, base_octave: i32) -> (ScaleDefinition, ScaleDefinition) {
    (
        major_scale(root_key, base_octave),
        major_scale(root_key, base_octave + 1),
    )
}
