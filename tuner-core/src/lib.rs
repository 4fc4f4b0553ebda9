// tuner-core/src/lib.rs

//! The core logic for the chromatic tuner.
//! This crate is responsible for audio capture, YIN pitch detection,
//! smoothing, and note mapping. It is completely headless
//! and contains no GUI code.

pub mod audio;
pub mod config;
pub mod fft;
pub mod pitch;
pub mod session;
pub mod smoothing;
pub mod tuning;

pub use config::{ConfigError, TunerConfig};
pub use pitch::{Detector, PitchEstimate};
pub use session::TunerSession;
pub use smoothing::Smoother;

/// Represents the result of a single audio analysis frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TunerReading {
    /// The unsmoothed frequency detected in this frame, in Hz.
    pub raw_frequency: Option<f32>,
    /// CMNDF value of this frame's detection (lower is better).
    pub confidence: Option<f32>,
    /// The smoothed frequency in Hz; `None` means "no note".
    pub frequency: Option<f32>,
    /// The name of the nearest note, without octave.
    pub note_name: Option<&'static str>,
    /// Octave of the nearest note.
    pub octave: Option<i32>,
    /// The deviation from the nearest note in cents.
    pub cents_deviation: Option<f32>,
}

impl TunerReading {
    /// The "no note" display state.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn has_note(&self) -> bool {
        self.frequency.is_some()
    }
}
