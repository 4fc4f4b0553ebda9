//! # Musical Tuning Module
//!
//! Converts frequencies into note names and cent offsets in twelve-tone
//! equal temperament, relative to an adjustable reference pitch for A4.
//!
//! ## Features
//! - Frequency ↔ MIDI note number conversions
//! - Nearest note lookup with octave and cent deviation
//! - Note names in sharps (`C`, `C#`, ... `B`) with scientific octave numbers

/// Note names within one octave, starting at C.
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// MIDI note number of A4.
const A4_MIDI: i32 = 69;

/// The note closest to a measured frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteReading {
    /// Note name without octave (e.g., "A", "C#")
    pub name: &'static str,
    /// Scientific pitch octave (A4 is in octave 4)
    pub octave: i32,
    /// MIDI note number (A4 = 69)
    pub midi_note: i32,
    /// Equal-tempered frequency of the note in Hz
    pub target_frequency: f32,
    /// Deviation of the measured frequency from the target, in cents
    pub cents: f32,
}

impl NoteReading {
    /// Note name with octave, e.g. "A4" or "C#3".
    pub fn label(&self) -> String {
        format!("{}{}", self.name, self.octave)
    }
}

/// Converts a frequency to a fractional MIDI note number.
///
/// # Arguments
/// * `freq` - Frequency in Hz
/// * `reference` - Frequency of A4 in Hz
///
/// # Returns
/// * MIDI note number, 69 at the reference frequency
pub fn frequency_to_midi_note(freq: f32, reference: f32) -> f32 {
    A4_MIDI as f32 + 12.0 * (freq / reference).log2()
}

/// Converts a (possibly fractional) MIDI note number to a frequency.
///
/// # Arguments
/// * `note` - MIDI note number
/// * `reference` - Frequency of A4 in Hz
pub fn midi_note_to_frequency(note: f32, reference: f32) -> f32 {
    reference * 2.0_f32.powf((note - A4_MIDI as f32) / 12.0)
}

/// Name and octave of a MIDI note number.
pub fn note_name(midi_note: i32) -> (&'static str, i32) {
    let index = midi_note.rem_euclid(12) as usize;
    let octave = midi_note.div_euclid(12) - 1;
    (NOTE_NAMES[index], octave)
}

/// Finds the closest equal-tempered note to a given frequency.
///
/// # Arguments
/// * `freq` - Measured frequency in Hz
/// * `reference` - Frequency of A4 in Hz
///
/// # Returns
/// * `Some(reading)` - Nearest note and the deviation from it
/// * `None` - The frequency is not a positive finite number
pub fn find_nearest_note(freq: f32, reference: f32) -> Option<NoteReading> {
    if !(freq.is_finite() && freq > 0.0) {
        return None;
    }

    let midi_note = frequency_to_midi_note(freq, reference).round() as i32;
    let target_frequency = midi_note_to_frequency(midi_note as f32, reference);
    let (name, octave) = note_name(midi_note);

    Some(NoteReading {
        name,
        octave,
        midi_note,
        target_frequency,
        cents: calculate_cents_deviation(freq, target_frequency),
    })
}

/// Calculates the deviation from a target frequency in cents.
///
/// Cents are a logarithmic unit of pitch measurement where:
/// - 100 cents = 1 semitone
/// - 1200 cents = 1 octave
/// - Positive values indicate sharpness, negative values indicate flatness
///
/// # Arguments
/// * `freq` - Measured frequency in Hz
/// * `target_freq` - Target frequency in Hz
///
/// # Returns
/// * Cent deviation (positive = sharp, negative = flat)
pub fn calculate_cents_deviation(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}
