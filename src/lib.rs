//! # RNNoise-RT
//!
//! Real-time noise suppression for host-driven audio pipelines, built on the
//! pure-Rust RNNoise port (`nnnoiseless`).
//!
//! The host delivers interleaved stereo frames in whatever chunk size its
//! audio callback uses; RNNoise only accepts fixed 480-sample blocks. This
//! crate sits between the two: it accumulates host input into model-sized
//! blocks, runs one denoiser instance per channel, and streams the denoised
//! output back out in exactly the chunk sizes the host asked for, with
//! silence substituted whenever data isn't ready yet. Playback never blocks
//! and never glitches; the cost is a fixed warm-up latency of one block.
//!
//! ## Quick Start
//!
//! ```
//! use rnnoise_rt::{DenoiseStream, Frame};
//!
//! // Sample rate comes from the host; RNNoise requires 48 kHz.
//! let mut stream = DenoiseStream::new(48_000);
//!
//! // In the audio callback: equal-length input/output frame buffers.
//! let input = vec![Frame::default(); 512];
//! let mut output = vec![Frame::default(); 512];
//! stream.process(&input, &mut output);
//!
//! let speech = stream.voice_activity(); // [0, 1]
//! ```
//!
//! ## Audio Requirements
//!
//! - **Sample rate**: 48 kHz. The stream validates and refuses (one warning,
//!   then silence) rather than resampling.
//! - **Format**: normalized f32 frames in [-1.0, 1.0]. Conversion to the
//!   16-bit dynamic range RNNoise expects happens internally.
//! - **Chunk size**: anything at or above [`BLOCK_SIZE`] frames per callback; it does
//!   not need to divide evenly into blocks and may vary between calls.
//!
//! ## Stereo
//!
//! Stereo is off by default: the left lane is denoised and duplicated into
//! both output lanes. [`DenoiseStream::set_stereo`] adds a second, independent
//! denoiser for the right lane on demand; toggling it never disturbs the left
//! channel's state.
//!
//! ## API Levels
//!
//! - [`DenoiseStream`] - high-level stereo streaming API for audio callbacks.
//! - [`ChannelStream`] - single-channel adapter, if you manage channels
//!   yourself.
//! - [`DenoiseModel`] - the block-level backend trait; implement it to swap
//!   in a different suppressor without touching the buffering.
//!
//! ## Real-Time Behavior
//!
//! `process` does O(chunk length) amortized work, takes no locks, and after
//! warm-up performs no heap allocation. Each stream instance is independent
//! and `Send`; a single instance must be driven from one context at a time.

use log::{debug, warn};
use thiserror::Error;

mod channel;
mod model;

pub use channel::ChannelStream;
pub use model::{DenoiseModel, RnnoiseModel};

/// Samples per denoiser block: 10 ms at 48 kHz. Fixed by RNNoise.
pub const BLOCK_SIZE: usize = 480;

/// The only sample rate RNNoise is trained for.
pub const SAMPLE_RATE: u32 = 48_000;

/// Scale factor between normalized samples and the model's 16-bit dynamic
/// range.
const MODEL_SCALE: f32 = i16::MAX as f32;

/// Normalized [-1, 1] sample → model range. No clamping; inputs are assumed
/// already normalized.
#[inline]
pub(crate) fn to_model_scale(sample: f32) -> f32 {
    sample * MODEL_SCALE
}

/// Model range → normalized [-1, 1] sample.
#[inline]
pub(crate) fn from_model_scale(sample: f32) -> f32 {
    sample / MODEL_SCALE
}

/// A stream configuration the denoiser cannot operate under.
///
/// Returned by [`DenoiseStream::validate`]. During [`DenoiseStream::process`]
/// these conditions are not errors: the affected callback gets silence and the
/// mismatch is logged once per stream.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The host mix rate differs from the model's fixed 48 kHz training rate.
    #[error("unsupported sample rate {rate} Hz, RNNoise requires 48000 Hz")]
    SampleRate { rate: u32 },
    /// The host callback buffer holds less than one denoiser block.
    #[error("callback buffer of {frames} frames is smaller than one denoiser block (480 frames)")]
    BufferTooSmall { frames: usize },
}

/// One time-aligned stereo sample pair, normalized to [-1.0, 1.0].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
}

impl Frame {
    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }
}

/// Streaming stereo noise suppressor for host audio callbacks.
///
/// Owns one [`ChannelStream`] per active channel. The left channel lives for
/// the lifetime of the stream; the right channel is created when stereo is
/// enabled and discarded when it is disabled. See the crate docs for the
/// overall data flow.
///
/// Generic over the denoising backend; defaults to [`RnnoiseModel`].
pub struct DenoiseStream<M: DenoiseModel = RnnoiseModel> {
    left: ChannelStream<M>,
    right: Option<ChannelStream<M>>,
    sample_rate: u32,
    /// Scratch for one de-interleaved, model-scaled input lane.
    lane_in: Vec<f32>,
    /// Scratch for the pulled output lanes.
    left_out: Vec<f32>,
    right_out: Vec<f32>,
    config_warned: bool,
}

impl DenoiseStream<RnnoiseModel> {
    /// Create a mono, RNNoise-backed stream for a host running at
    /// `sample_rate`.
    ///
    /// Construction never fails; an unsupported rate is reported from
    /// [`process`](Self::process) (one warning, silence) so the host's effect
    /// chain keeps working.
    pub fn new(sample_rate: u32) -> Self {
        Self::with_model(sample_rate, RnnoiseModel::default())
    }
}

impl<M: DenoiseModel> DenoiseStream<M> {
    /// Create a mono stream around a custom denoising backend.
    ///
    /// `model` becomes the left channel's denoiser. Fresh right-channel
    /// models are created through `M::default()` when stereo is enabled.
    pub fn with_model(sample_rate: u32, model: M) -> Self {
        Self {
            left: ChannelStream::new(model),
            right: None,
            sample_rate,
            lane_in: Vec::new(),
            left_out: Vec::new(),
            right_out: Vec::new(),
            config_warned: false,
        }
    }

    /// Check whether processing can run with the configured sample rate and a
    /// host buffer of `buffer_frames` frames per callback.
    pub fn validate(&self, buffer_frames: usize) -> Result<(), ConfigError> {
        if self.sample_rate != SAMPLE_RATE {
            return Err(ConfigError::SampleRate {
                rate: self.sample_rate,
            });
        }
        if buffer_frames < BLOCK_SIZE {
            return Err(ConfigError::BufferTooSmall {
                frames: buffer_frames,
            });
        }
        Ok(())
    }

    /// Denoise one callback's worth of audio.
    ///
    /// `input` and `output` must be the same length. `output` is always fully
    /// written: with denoised audio once enough has accumulated, with silence
    /// during warm-up or under a configuration mismatch. Never blocks, never
    /// errors.
    pub fn process(&mut self, input: &[Frame], output: &mut [Frame]) {
        debug_assert_eq!(input.len(), output.len());

        if let Err(err) = self.validate(input.len()) {
            if !self.config_warned {
                warn!("noise suppression bypassed to silence: {err}");
                self.config_warned = true;
            }
            output.fill(Frame::default());
            return;
        }

        // De-interleave each lane into model scale and let the channels drain
        // every complete block.
        self.lane_in.clear();
        self.lane_in
            .extend(input.iter().map(|f| to_model_scale(f.left)));
        self.left.push_and_process(&self.lane_in);
        if let Some(right) = &mut self.right {
            self.lane_in.clear();
            self.lane_in
                .extend(input.iter().map(|f| to_model_scale(f.right)));
            right.push_and_process(&self.lane_in);
        }

        // Pull exactly one callback's worth back out. An underrun leaves the
        // lane silent; the queues keep filling for the next callback.
        self.left_out.resize(input.len(), 0.0);
        self.left.pull(&mut self.left_out);

        match &mut self.right {
            Some(right) => {
                self.right_out.resize(input.len(), 0.0);
                right.pull(&mut self.right_out);
                for ((dst, &l), &r) in output
                    .iter_mut()
                    .zip(self.left_out.iter())
                    .zip(self.right_out.iter())
                {
                    *dst = Frame::new(l, r);
                }
            }
            None => {
                for (dst, &l) in output.iter_mut().zip(self.left_out.iter()) {
                    *dst = Frame::new(l, l);
                }
            }
        }
    }

    /// Enable or disable independent right-channel denoising.
    ///
    /// Enabling creates a fresh right channel (new model state, empty queues)
    /// only if one isn't already active; disabling discards it. The left
    /// channel is never touched by this call, so toggling mid-stream does not
    /// disturb audio already in flight.
    pub fn set_stereo(&mut self, stereo: bool)
    where
        M: Default,
    {
        if stereo && self.right.is_none() {
            debug!("enabling right-channel denoiser");
            self.right = Some(ChannelStream::new(M::default()));
        } else if !stereo && self.right.is_some() {
            debug!("discarding right-channel denoiser");
            self.right = None;
        }
    }

    pub fn is_stereo(&self) -> bool {
        self.right.is_some()
    }

    /// Voice-activity confidence of the most recent denoised block, in [0, 1].
    ///
    /// Reports the left channel's value; `0.0` before any block has been
    /// processed.
    pub fn voice_activity(&self) -> f32 {
        self.left.confidence()
    }

    /// Latency added by block accumulation, in milliseconds (10 ms).
    pub fn latency_ms(&self) -> f32 {
        BLOCK_SIZE as f32 / SAMPLE_RATE as f32 * 1000.0
    }

    /// Discard all buffered audio and restart every active channel's model
    /// from fresh state. Call between unrelated streams to avoid carrying
    /// recurrent state across them.
    pub fn reset(&mut self)
    where
        M: Default,
    {
        self.left.reset();
        if let Some(right) = &mut self.right {
            right.reset();
        }
    }

    /// End-of-stream drain for offline use: flush both channels (zero-padding
    /// trailing partial blocks) and return the remaining frames.
    pub fn flush(&mut self) -> Vec<Frame> {
        let left = self.left.flush();
        match &mut self.right {
            Some(right) => {
                let right = right.flush();
                left.iter()
                    .zip(right.iter())
                    .map(|(&l, &r)| Frame::new(l, r))
                    .collect()
            }
            None => left.iter().map(|&l| Frame::new(l, l)).collect(),
        }
    }
}

// Compile-time check that streams can move between threads.
fn _assert_send<T: Send>() {}
fn _assert_stream_is_send() {
    _assert_send::<DenoiseStream<RnnoiseModel>>();
    _assert_send::<ChannelStream<RnnoiseModel>>();
}
