//! # Pitch Detection Module
//!
//! This module implements the YIN fundamental-frequency estimator
//! (de Cheveigné & Kawahara, 2002) on fixed-size time-domain frames.
//!
//! ## Pipeline
//! 1. Lag range derivation from the sample rate and frequency bounds
//! 2. Difference function, built from autocorrelation identities
//! 3. Cumulative mean normalized difference function (CMNDF)
//! 4. Absolute threshold search with descent to the valley bottom
//! 5. Parabolic interpolation for sub-sample lag precision
//! 6. Frequency validation against the configured bounds
//!
//! Every degenerate case (empty frame, silence, too-short frame, flat curve,
//! out-of-range result) resolves to `None` instead of a non-finite frequency.

use crate::config::DetectorConfig;
use crate::fft::Autocorrelator;

/// One frame's pitch estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Fundamental frequency in Hz.
    pub frequency: f32,
    /// CMNDF value at the chosen lag. Lower means a stronger periodicity.
    pub confidence: f32,
}

/// Candidate lag bounds in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagRange {
    /// `floor(sample_rate / max_frequency)`
    pub tau_min: usize,
    /// `floor(sample_rate / min_frequency)`, clamped to `frame_len - 1`
    pub tau_max: usize,
}

impl LagRange {
    /// Derives the lag bounds for a frame.
    ///
    /// Returns `None` when the search range `[tau_min, tau_max)` holds no
    /// usable lag, which happens for frames too short to contain a period of
    /// the lowest configured frequency's search window.
    pub fn new(sample_rate: u32, frame_len: usize, config: &DetectorConfig) -> Option<Self> {
        if sample_rate == 0 || frame_len == 0 {
            return None;
        }
        let sample_rate = sample_rate as f32;
        let tau_min = (sample_rate / config.max_frequency).floor() as usize;
        let tau_max = ((sample_rate / config.min_frequency).floor() as usize).min(frame_len - 1);

        let range = Self { tau_min, tau_max };
        (range.search_start() < tau_max).then_some(range)
    }

    /// First lag examined by the threshold search. Lag 0 is never a period.
    pub fn search_start(&self) -> usize {
        self.tau_min.max(1)
    }
}

/// YIN detector with reusable scratch buffers.
///
/// The difference and CMNDF arrays, the autocorrelation output and the FFT
/// plan all live on the detector, so steady-state detection on equally sized
/// frames performs no allocation.
pub struct Detector {
    config: DetectorConfig,
    autocorrelator: Option<Autocorrelator>,
    acf: Vec<f64>,
    difference: Vec<f32>,
    cmndf: Vec<f32>,
}

impl Detector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            autocorrelator: None,
            acf: Vec::new(),
            difference: Vec::new(),
            cmndf: Vec::new(),
        }
    }

    /// Creates a detector with buffers already sized for `frame_len` samples.
    pub fn with_frame_len(config: DetectorConfig, frame_len: usize) -> Self {
        let mut detector = Self::new(config);
        detector.prepare(frame_len);
        detector
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// The CMNDF curve computed by the last call to [`Detector::detect`],
    /// indexed by lag `0..=tau_max`. Empty if that call bailed out early.
    pub fn cmndf(&self) -> &[f32] {
        &self.cmndf
    }

    /// Estimates the fundamental frequency of one frame.
    ///
    /// # Arguments
    /// * `frame` - Mono time-domain samples
    /// * `sample_rate` - Sample rate of `frame` in Hz
    ///
    /// # Returns
    /// * `Some(estimate)` - Frequency within the configured bounds
    /// * `None` - No pitch this frame (silence, too-short frame, out-of-range result)
    pub fn detect(&mut self, frame: &[f32], sample_rate: u32) -> Option<PitchEstimate> {
        self.cmndf.clear();

        let Some(range) = LagRange::new(sample_rate, frame.len(), &self.config) else {
            log::trace!(target: "pitch", "no usable lag range for {} samples at {} Hz", frame.len(), sample_rate);
            return None;
        };

        let energy: f64 = frame.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
        if energy == 0.0 || !energy.is_finite() {
            log::trace!(target: "pitch", "silent or non-finite frame");
            return None;
        }

        self.prepare(frame.len());
        let lags = range.tau_max + 1;
        self.acf.resize(lags, 0.0);
        if let Some(autocorrelator) = self.autocorrelator.as_mut() {
            autocorrelator.compute(frame, &mut self.acf);
        }

        difference_function(frame, energy, &self.acf, &mut self.difference);
        cumulative_mean_normalize(&self.difference, &mut self.cmndf);

        let tau = find_dip(&self.cmndf, range.search_start(), range.tau_max, self.config.threshold);
        let confidence = self.cmndf[tau];
        let refined = refine_lag(&self.cmndf, tau);
        let frequency = sample_rate as f32 / refined;

        if !frequency.is_finite()
            || frequency < self.config.min_frequency
            || frequency > self.config.max_frequency
        {
            log::trace!(target: "pitch", "rejected {:.2} Hz at lag {}", frequency, tau);
            return None;
        }

        log::trace!(target: "pitch", "lag {} -> {:.3}, {:.2} Hz, confidence {:.4}", tau, refined, frequency, confidence);
        Some(PitchEstimate { frequency, confidence })
    }

    /// Makes sure the FFT plan matches `frame_len`.
    fn prepare(&mut self, frame_len: usize) {
        let planned = self.autocorrelator.as_ref().map(Autocorrelator::frame_len);
        if planned != Some(frame_len) {
            log::debug!(target: "pitch", "planning autocorrelation for {} samples", frame_len);
            self.autocorrelator = Some(Autocorrelator::new(frame_len));
        }
    }
}

/// One-shot detection with a throwaway detector.
///
/// Convenient for offline analysis; real-time callers should keep a
/// [`Detector`] around instead so its buffers are reused.
pub fn detect_pitch_yin(
    signal: &[f32],
    sample_rate: u32,
    config: &DetectorConfig,
) -> Option<PitchEstimate> {
    Detector::new(*config).detect(signal, sample_rate)
}

/// Fills `out[tau]` for `tau in 0..acf.len()` with the squared difference
/// `sum((frame[i] - frame[i + tau])^2)` over the overlapping samples, i.e.
/// `ACF(frame[..n - tau], 0) + ACF(frame[tau..], 0) - 2·ACF(frame, tau)`.
///
/// `energy` is `ACF(frame, 0)`. Both overlap energies come from running sums
/// peeled off either end of the frame, so the sweep is linear once `acf` is
/// known. `acf.len()` must not exceed `frame.len()`.
pub fn difference_function(frame: &[f32], energy: f64, acf: &[f64], out: &mut Vec<f32>) {
    debug_assert!(acf.len() <= frame.len());
    out.clear();
    out.resize(acf.len(), 0.0);

    let n = frame.len();
    let mut head = 0.0f64; // energy of frame[..tau]
    let mut tail = 0.0f64; // energy of frame[n - tau..]
    for tau in 1..acf.len() {
        let first = f64::from(frame[tau - 1]);
        let last = f64::from(frame[n - tau]);
        head += first * first;
        tail += last * last;
        // Rounding in the FFT can push a near-perfect match slightly negative.
        let d = (energy - tail) + (energy - head) - 2.0 * acf[tau];
        out[tau] = d.max(0.0) as f32;
    }
}

/// Cumulative mean normalization of a difference function.
///
/// `out[0]` is 1. Wherever the running sum is still zero (silent prefix) the
/// value is 1 rather than a division by zero.
pub fn cumulative_mean_normalize(difference: &[f32], out: &mut Vec<f32>) {
    out.clear();
    out.resize(difference.len(), 1.0);

    let mut cumulative = 0.0f32;
    for tau in 1..difference.len() {
        cumulative += difference[tau];
        out[tau] = if cumulative == 0.0 {
            1.0
        } else {
            difference[tau] * tau as f32 / cumulative
        };
    }
}

/// Absolute threshold search over `cmndf[start..end]`.
///
/// Takes the first lag below `threshold` and walks down to the bottom of its
/// valley. Without any value below the threshold the global minimum of the
/// range is used. The range must not be empty.
pub fn find_dip(cmndf: &[f32], start: usize, end: usize, threshold: f32) -> usize {
    debug_assert!(start < end && end <= cmndf.len());

    if let Some(mut tau) = (start..end).find(|&tau| cmndf[tau] < threshold) {
        while tau + 1 < end && cmndf[tau + 1] < cmndf[tau] {
            tau += 1;
        }
        return tau;
    }

    let mut best = start;
    for tau in start + 1..end {
        if cmndf[tau] < cmndf[best] {
            best = tau;
        }
    }
    best
}

/// Sub-sample lag from a parabola through `tau - 1`, `tau`, `tau + 1`.
///
/// Falls back to the integer lag at either end of the curve, when the three
/// points are collinear up to rounding, and when the vertex lies outside
/// `[tau - 1, tau + 1]`.
pub fn refine_lag(cmndf: &[f32], tau: usize) -> f32 {
    if tau < 1 || tau + 1 >= cmndf.len() {
        return tau as f32;
    }

    let (left, center, right) = (cmndf[tau - 1], cmndf[tau], cmndf[tau + 1]);
    let denominator = left - 2.0 * center + right;
    let scale = left.abs() + center.abs() + right.abs();
    if denominator.abs() <= f32::EPSILON * scale {
        return tau as f32;
    }

    let offset = 0.5 * (left - right) / denominator;
    if !offset.is_finite() || offset.abs() > 1.0 {
        return tau as f32;
    }
    tau as f32 + offset
}
