//! # Fast Fourier Transform (FFT) Module
//!
//! This module provides the autocorrelation engine behind the YIN difference
//! function. Computing `ACF(frame, tau)` directly for every candidate lag is
//! quadratic in the frame length; going through the frequency domain brings
//! the whole lag sweep down to two FFTs.
//!
//! ## Features
//! - High-performance FFT using RustFFT
//! - Plans and scratch buffers are created once and reused across frames
//! - Zero padding to avoid circular wrap-around in the correlation
//! - Double precision, so near-perfect matches survive the subtraction in
//!   the difference function

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Linear (non-circular) autocorrelation of fixed-length frames.
///
/// The autocorrelator is sized for one frame length. All buffers are
/// allocated up front so that [`Autocorrelator::compute`] does not allocate.
pub struct Autocorrelator {
    frame_len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl Autocorrelator {
    /// Plans the transforms for frames of `frame_len` samples.
    ///
    /// The FFT length is the next power of two holding `2 * frame_len`
    /// samples, which is enough padding for every lag below `frame_len`.
    pub fn new(frame_len: usize) -> Self {
        let fft_len = (2 * frame_len.max(1)).next_power_of_two();
        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Self {
            frame_len,
            forward,
            inverse,
            buffer: vec![Complex::new(0.0, 0.0); fft_len],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        }
    }

    /// The frame length this autocorrelator was planned for.
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Writes `ACF(signal, lag) = Σ signal[i]·signal[i+lag]` into `out[lag]`
    /// for every lag in `0..out.len()`.
    ///
    /// # Arguments
    /// * `signal` - Input frame, exactly `frame_len` samples
    /// * `out` - Destination, at most `frame_len` entries
    ///
    /// # Panics
    /// * If `signal` does not match the planned frame length
    /// * If `out` is longer than the frame
    pub fn compute(&mut self, signal: &[f32], out: &mut [f64]) {
        assert_eq!(signal.len(), self.frame_len, "frame length changed without re-planning");
        assert!(out.len() <= self.frame_len, "lag range exceeds the frame");

        for (slot, &sample) in self.buffer.iter_mut().zip(signal) {
            *slot = Complex::new(f64::from(sample), 0.0);
        }
        for slot in self.buffer[signal.len()..].iter_mut() {
            *slot = Complex::new(0.0, 0.0);
        }

        self.forward.process_with_scratch(&mut self.buffer, &mut self.scratch);

        // Power spectrum; its inverse transform is the autocorrelation.
        for bin in self.buffer.iter_mut() {
            *bin = Complex::new(bin.norm_sqr(), 0.0);
        }

        self.inverse.process_with_scratch(&mut self.buffer, &mut self.scratch);

        // RustFFT does not normalize the inverse transform.
        let scale = 1.0 / self.buffer.len() as f64;
        for (value, bin) in out.iter_mut().zip(&self.buffer) {
            *value = bin.re * scale;
        }
    }
}
