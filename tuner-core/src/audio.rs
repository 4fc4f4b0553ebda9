//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library).
//! It selects an input configuration, down-mixes whatever channel layout the
//! device offers to mono, and cuts the stream into fixed-size frames for the
//! detector.
//!
//! ## Features
//! - Automatic audio device selection
//! - Preferred 44.1 kHz sample rate with fallback to the device default
//! - Mono down-mix of multi-channel input
//! - Non-blocking frame delivery over a crossbeam channel

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SupportedStreamConfig, SupportedStreamConfigRange};
use crossbeam_channel::Sender;

/// Sample rate requested from the device when it supports it.
pub const PREFERRED_SAMPLE_RATE: u32 = 44_100;

/// Collects interleaved callback data into fixed-size mono frames.
pub struct FrameAssembler {
    frame_size: usize,
    channels: usize,
    pending: Vec<f32>,
}

impl FrameAssembler {
    pub fn new(frame_size: usize, channels: usize) -> Self {
        Self {
            frame_size,
            channels: channels.max(1),
            pending: Vec::with_capacity(frame_size * 2),
        }
    }

    /// Appends interleaved samples and hands every completed frame to `emit`.
    ///
    /// Frames do not overlap; a trailing partial frame is kept for the next call.
    pub fn push(&mut self, interleaved: &[f32], mut emit: impl FnMut(Vec<f32>)) {
        if self.channels == 1 {
            self.pending.extend_from_slice(interleaved);
        } else {
            let scale = 1.0 / self.channels as f32;
            self.pending.extend(
                interleaved
                    .chunks_exact(self.channels)
                    .map(|frame| frame.iter().sum::<f32>() * scale),
            );
        }

        while self.pending.len() >= self.frame_size {
            let frame: Vec<f32> = self.pending.drain(..self.frame_size).collect();
            emit(frame);
        }
    }

    /// Number of mono samples waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Starts audio capture from the default input device.
///
/// This function:
/// 1. Selects the default audio input device
/// 2. Picks an f32 input configuration, preferring 44.1 kHz
/// 3. Sets up a callback that streams mono frames to the analysis thread
///
/// # Arguments
/// * `sender` - Channel sender for streaming audio frames to the analysis thread
/// * `frame_size` - Number of samples per delivered frame
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Audio stream handle and sample rate
/// * `Err(e)` - Error if audio setup fails
pub fn start_audio_capture(
    sender: Sender<Vec<f32>>,
    frame_size: usize,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    log::info!(target: "audio", "Using audio input device: {}", device.name()?);

    let configs = device
        .supported_input_configs()
        .context("querying input configurations")?
        .collect::<Vec<_>>();
    let supported_config = match find_supported_config(configs, PREFERRED_SAMPLE_RATE) {
        Some(config) => config,
        None => {
            let fallback = device
                .default_input_config()
                .context("querying default input configuration")?;
            if fallback.sample_format() != cpal::SampleFormat::F32 {
                return Err(anyhow!("No suitable f32 input format found"));
            }
            fallback
        }
    };

    let sample_rate = supported_config.sample_rate().0;
    let channels = supported_config.channels() as usize;
    let config: cpal::StreamConfig = supported_config.into();

    log::info!(target: "audio", "Selected {} Hz, {} channel(s), {} samples per frame", sample_rate, channels, frame_size);

    let err_fn = |err| log::error!(target: "audio", "An error occurred on the audio stream: {}", err);

    let mut assembler = FrameAssembler::new(frame_size, channels);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            assembler.push(data, |frame| {
                // Drop the frame if the analysis thread is behind.
                if sender.try_send(frame).is_err() {
                    log::trace!(target: "audio", "analysis busy, frame dropped");
                }
            });
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Finds an f32 input configuration that can run at `target_rate`.
///
/// Mono configurations win over multi-channel ones.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfig> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .filter(|c| (c.min_sample_rate().0..=c.max_sample_rate().0).contains(&target_rate))
        .min_by_key(|c| c.channels())
        .map(|c| c.with_sample_rate(cpal::SampleRate(target_rate)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_complete_frames_only() {
        let mut assembler = FrameAssembler::new(4, 1);
        let mut frames = Vec::new();
        assembler.push(&[1.0, 2.0, 3.0], |f| frames.push(f));
        assert!(frames.is_empty());
        assert_eq!(assembler.pending(), 3);

        assembler.push(&[4.0, 5.0, 6.0, 7.0, 8.0, 9.0], |f| frames.push(f));
        assert_eq!(frames, vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]]);
        assert_eq!(assembler.pending(), 1);
    }

    #[test]
    fn downmixes_interleaved_channels() {
        let mut assembler = FrameAssembler::new(2, 2);
        let mut frames = Vec::new();
        assembler.push(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], |f| frames.push(f));
        assert_eq!(frames, vec![vec![0.5, 0.5]]);
        assert_eq!(assembler.pending(), 1);
    }
}
