//! # Tuning Session Module
//!
//! A [`TunerSession`] is the single owner of everything that survives from
//! one frame to the next: detector scratch buffers, the smoothing history and
//! the reference pitch. Front ends create one per tuner and drive it with
//! one audio frame at a time.

use crate::config::{self, ConfigError, TunerConfig};
use crate::pitch::Detector;
use crate::smoothing::Smoother;
use crate::tuning;
use crate::TunerReading;

pub struct TunerSession {
    config: TunerConfig,
    detector: Detector,
    smoother: Smoother,
    active: bool,
}

impl TunerSession {
    /// Creates an idle session. Call [`TunerSession::start`] before feeding frames.
    pub fn new(config: TunerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            detector: Detector::with_frame_len(config.detector, config.buffer_size),
            smoother: Smoother::new(config.smoother),
            config,
            active: false,
        })
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Begins continuous detection with an empty smoothing history.
    pub fn start(&mut self) {
        self.smoother.reset();
        self.active = true;
        log::info!(target: "session", "Tuning session started (A4 = {} Hz)", self.config.reference_frequency);
    }

    /// Ends continuous detection and forgets the smoothing history.
    pub fn stop(&mut self) {
        self.smoother.reset();
        self.active = false;
        log::info!(target: "session", "Tuning session stopped");
    }

    pub fn reference_frequency(&self) -> f32 {
        self.config.reference_frequency
    }

    /// Changes the pitch of A4 used for note mapping.
    pub fn set_reference_frequency(&mut self, frequency: f32) -> Result<(), ConfigError> {
        config::validate_reference(frequency)?;
        self.config.reference_frequency = frequency;
        log::info!(target: "session", "Reference frequency set to {} Hz", frequency);
        Ok(())
    }

    /// Runs one frame through detection, smoothing and note mapping.
    ///
    /// An inactive session does no work and reports [`TunerReading::silent`].
    pub fn process_frame(&mut self, frame: &[f32], sample_rate: u32) -> TunerReading {
        if !self.active {
            return TunerReading::silent();
        }

        let detection = self.detector.detect(frame, sample_rate);
        let smoothed = self.smoother.update(detection);

        let note = smoothed.and_then(|f| tuning::find_nearest_note(f, self.config.reference_frequency));

        TunerReading {
            raw_frequency: detection.map(|d| d.frequency),
            confidence: detection.map(|d| d.confidence),
            frequency: smoothed,
            note_name: note.as_ref().map(|n| n.name),
            octave: note.as_ref().map(|n| n.octave),
            cents_deviation: note.as_ref().map(|n| n.cents),
        }
    }
}
