//! # Smoothing Module
//!
//! Raw YIN output jitters by fractions of a semitone even on a sustained
//! note. The [`Smoother`] averages the last few confident estimates and drops
//! its whole history as soon as a frame fails the confidence gate.

use std::collections::VecDeque;

use crate::config::SmootherConfig;
use crate::pitch::PitchEstimate;

/// Bounded moving average over confident pitch estimates.
#[derive(Debug, Clone)]
pub struct Smoother {
    config: SmootherConfig,
    history: VecDeque<f32>,
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(SmootherConfig::default())
    }
}

impl Smoother {
    pub fn new(config: SmootherConfig) -> Self {
        Self {
            config,
            history: VecDeque::with_capacity(config.frames + 1),
        }
    }

    /// Feeds one frame's detection and returns the smoothed frequency.
    ///
    /// A detection whose confidence is below the gate is appended to the
    /// history (oldest entry dropped past the window size) and the mean of the
    /// history is returned. Anything else clears the history and yields `None`.
    pub fn update(&mut self, detection: Option<PitchEstimate>) -> Option<f32> {
        let frequency = match detection {
            Some(estimate) if estimate.confidence < self.config.confidence_threshold => {
                estimate.frequency
            }
            Some(estimate) => {
                log::trace!(target: "smoothing", "gate rejected confidence {:.3}", estimate.confidence);
                self.reset();
                return None;
            }
            None => {
                self.reset();
                return None;
            }
        };

        self.history.push_back(frequency);
        while self.history.len() > self.config.frames {
            self.history.pop_front();
        }

        let sum: f32 = self.history.iter().sum();
        Some(sum / self.history.len() as f32)
    }

    /// Forgets every accepted frequency.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Accepted frequencies, oldest first.
    pub fn history(&self) -> impl Iterator<Item = f32> + '_ {
        self.history.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confident(frequency: f32) -> Option<PitchEstimate> {
        Some(PitchEstimate { frequency, confidence: 0.05 })
    }

    #[test]
    fn averages_last_three() {
        let mut smoother = Smoother::default();
        assert_eq!(smoother.update(confident(100.0)), Some(100.0));
        assert_eq!(smoother.update(confident(102.0)), Some(101.0));
        assert_eq!(smoother.update(confident(98.0)), Some(100.0));

        let fourth = smoother.update(confident(110.0)).unwrap();
        assert!((fourth - 310.0 / 3.0).abs() < 1e-4, "got {}", fourth);
        assert_eq!(smoother.history().collect::<Vec<_>>(), vec![102.0, 98.0, 110.0]);
    }

    #[test]
    fn no_pitch_clears_history() {
        let mut smoother = Smoother::default();
        for f in [100.0, 102.0, 98.0] {
            smoother.update(confident(f));
        }
        assert_eq!(smoother.update(None), None);
        assert!(smoother.is_empty());
        assert_eq!(smoother.update(confident(220.0)), Some(220.0));
        assert_eq!(smoother.len(), 1);
    }

    #[test]
    fn low_confidence_clears_history() {
        let mut smoother = Smoother::default();
        for f in [100.0, 102.0, 98.0] {
            smoother.update(confident(f));
        }
        // The gate is strict: exactly the threshold is rejected.
        let weak = Some(PitchEstimate { frequency: 100.0, confidence: 0.15 });
        assert_eq!(smoother.update(weak), None);
        assert!(smoother.is_empty());
        assert_eq!(smoother.update(confident(330.0)), Some(330.0));
    }

    #[test]
    fn reset_is_unconditional() {
        let mut smoother = Smoother::default();
        smoother.update(confident(440.0));
        smoother.reset();
        assert!(smoother.is_empty());
        assert_eq!(smoother.update(confident(441.0)), Some(441.0));
    }

    #[test]
    fn window_size_is_configurable() {
        let mut smoother = Smoother::new(SmootherConfig { frames: 1, confidence_threshold: 0.5 });
        smoother.update(Some(PitchEstimate { frequency: 100.0, confidence: 0.4 }));
        assert_eq!(smoother.update(confident(200.0)), Some(200.0));
        assert_eq!(smoother.len(), 1);
    }
}
