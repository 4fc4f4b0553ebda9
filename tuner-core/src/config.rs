//! # Configuration Module
//!
//! Named tuning constants and the serializable configuration objects that
//! carry them. Every constant the detector and smoother use is exposed here
//! so that tests and front ends can reason about the same numbers.
//!
//! Configuration is stored as JSON. Missing fields fall back to the defaults
//! below, so a file containing only `{"reference_frequency": 442.0}` is valid.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest detectable fundamental in Hz (just below A0).
pub const MIN_FREQUENCY: f32 = 27.0;
/// Highest detectable fundamental in Hz.
pub const MAX_FREQUENCY: f32 = 5000.0;
/// Absolute threshold for the CMNDF dip search.
pub const THRESHOLD: f32 = 0.1;
/// Number of accepted frequencies averaged by the smoother.
pub const SMOOTHING_FRAMES: usize = 3;
/// A detection is accepted by the smoother only below this CMNDF value.
pub const CONFIDENCE_THRESHOLD: f32 = 0.15;
/// Concert pitch for A4.
pub const REFERENCE_FREQUENCY: f32 = 440.0;
/// Allowed range for the reference frequency.
pub const REFERENCE_FREQUENCY_RANGE: (f32, f32) = (400.0, 480.0);
/// Samples per analysis frame. Long enough to hold several periods at 27 Hz.
pub const BUFFER_SIZE: usize = 4096;

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("min_frequency must be positive and below max_frequency (got {min} / {max})")]
    FrequencyBounds { min: f32, max: f32 },
    #[error("{field} must be a positive finite number (got {value})")]
    NotPositive { field: &'static str, value: f32 },
    #[error("smoothing frames must be at least 1")]
    EmptySmoothingWindow,
    #[error("reference frequency {0} Hz is outside 400..=480 Hz")]
    ReferenceOutOfRange(f32),
    #[error("buffer size must hold at least 2 samples (got {0})")]
    BufferTooSmall(usize),
}

/// Parameters of the YIN detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub min_frequency: f32,
    pub max_frequency: f32,
    pub threshold: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_frequency: MIN_FREQUENCY,
            max_frequency: MAX_FREQUENCY,
            threshold: THRESHOLD,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = (self.min_frequency, self.max_frequency);
        if !(min.is_finite() && max.is_finite()) || min <= 0.0 || min >= max {
            return Err(ConfigError::FrequencyBounds { min, max });
        }
        positive("threshold", self.threshold)
    }
}

/// Parameters of the moving-average smoother.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmootherConfig {
    pub frames: usize,
    pub confidence_threshold: f32,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            frames: SMOOTHING_FRAMES,
            confidence_threshold: CONFIDENCE_THRESHOLD,
        }
    }
}

impl SmootherConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frames == 0 {
            return Err(ConfigError::EmptySmoothingWindow);
        }
        positive("confidence_threshold", self.confidence_threshold)
    }
}

/// Everything a tuning session needs, as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    pub detector: DetectorConfig,
    pub smoother: SmootherConfig,
    pub reference_frequency: f32,
    pub buffer_size: usize,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            smoother: SmootherConfig::default(),
            reference_frequency: REFERENCE_FREQUENCY,
            buffer_size: BUFFER_SIZE,
        }
    }
}

impl TunerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector.validate()?;
        self.smoother.validate()?;
        validate_reference(self.reference_frequency)?;
        if self.buffer_size < 2 {
            return Err(ConfigError::BufferTooSmall(self.buffer_size));
        }
        Ok(())
    }

    /// Reads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: TunerConfig = serde_json::from_str(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        log::info!(target: "config", "Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Like [`TunerConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!(target: "config", "{} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json_string = serde_json::to_string_pretty(self)?;
        fs::write(path, json_string)
            .with_context(|| format!("writing config {}", path.display()))?;
        log::info!(target: "config", "Saved configuration to {}", path.display());
        Ok(())
    }
}

pub(crate) fn validate_reference(frequency: f32) -> Result<(), ConfigError> {
    let (min, max) = REFERENCE_FREQUENCY_RANGE;
    if (min..=max).contains(&frequency) {
        Ok(())
    } else {
        Err(ConfigError::ReferenceOutOfRange(frequency))
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_named_constants() {
        let config = TunerConfig::default();
        assert_eq!(config.detector.min_frequency, 27.0);
        assert_eq!(config.detector.max_frequency, 5000.0);
        assert_eq!(config.detector.threshold, 0.1);
        assert_eq!(config.smoother.frames, 3);
        assert_eq!(config.smoother.confidence_threshold, 0.15);
        assert_eq!(config.reference_frequency, 440.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: TunerConfig =
            serde_json::from_str(r#"{"reference_frequency": 442.0, "smoother": {"frames": 5}}"#)
                .unwrap();
        assert_eq!(config.reference_frequency, 442.0);
        assert_eq!(config.smoother.frames, 5);
        assert_eq!(config.smoother.confidence_threshold, CONFIDENCE_THRESHOLD);
        assert_eq!(config.detector, DetectorConfig::default());
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = TunerConfig::default();
        config.detector.min_frequency = 6000.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::FrequencyBounds { min: 6000.0, max: 5000.0 })
        );

        let mut config = TunerConfig::default();
        config.smoother.frames = 0;
        assert_eq!(config.validate(), Err(ConfigError::EmptySmoothingWindow));

        let mut config = TunerConfig::default();
        config.reference_frequency = 300.0;
        assert_eq!(config.validate(), Err(ConfigError::ReferenceOutOfRange(300.0)));

        let mut config = TunerConfig::default();
        config.detector.threshold = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "threshold", .. })
        ));
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("tuner-config-{}.json", std::process::id()));
        let mut config = TunerConfig::default();
        config.reference_frequency = 432.0;
        config.save(&path).unwrap();
        let loaded = TunerConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("tuner-config-does-not-exist.json");
        let config = TunerConfig::load_or_default(path).unwrap();
        assert_eq!(config, TunerConfig::default());
    }
}
