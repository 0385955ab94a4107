//! Denoising backend abstraction and the RNNoise production backend.
//!
//! The buffering layers only ever see the [`DenoiseModel`] trait, so a
//! different suppressor can be dropped in without touching them. The one
//! shipped backend is [`RnnoiseModel`], built on the pure-Rust `nnnoiseless`
//! port of RNNoise.

use nnnoiseless::DenoiseState;

use crate::BLOCK_SIZE;

/// A stateful, single-channel noise suppressor operating on fixed-size blocks.
///
/// Implementations carry hidden recurrent state, so blocks must be delivered
/// in strict chronological order per instance. One instance serves exactly one
/// audio channel.
///
/// # Contract
///
/// - `input` and `output` are exactly [`BLOCK_SIZE`] samples.
/// - Samples use the 16-bit signed dynamic range (roughly [-32768, 32767])
///   rather than the normalized [-1, 1] range; see [`crate::to_model_scale`].
/// - The return value is the block's voice-activity confidence in [0, 1].
pub trait DenoiseModel {
    /// Denoise one block of `input` into `output`, returning the block's
    /// voice-activity confidence.
    fn transform(&mut self, input: &[f32], output: &mut [f32]) -> f32;
}

/// RNNoise-based denoiser using the `nnnoiseless` crate.
///
/// RNNoise is trained on 48 kHz audio and processes 480-sample blocks (10 ms).
/// Its native convention already matches the [`DenoiseModel`] contract: f32
/// samples in the i16 range in and out, VAD probability returned per block.
pub struct RnnoiseModel {
    state: Box<DenoiseState<'static>>,
}

impl Default for RnnoiseModel {
    fn default() -> Self {
        Self {
            state: DenoiseState::new(),
        }
    }
}

impl DenoiseModel for RnnoiseModel {
    fn transform(&mut self, input: &[f32], output: &mut [f32]) -> f32 {
        debug_assert_eq!(input.len(), BLOCK_SIZE);
        debug_assert_eq!(output.len(), BLOCK_SIZE);
        self.state.process_frame(output, input)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::DenoiseModel;

    /// Pass-through model for exercising the buffering layers in isolation.
    ///
    /// Copies each block unchanged and reports a fixed nonzero confidence so
    /// tests can distinguish "no block processed yet" from "processed".
    #[derive(Default)]
    pub struct IdentityModel {
        pub blocks_seen: usize,
    }

    pub const IDENTITY_CONFIDENCE: f32 = 0.875;

    impl DenoiseModel for IdentityModel {
        fn transform(&mut self, input: &[f32], output: &mut [f32]) -> f32 {
            output.copy_from_slice(input);
            self.blocks_seen += 1;
            IDENTITY_CONFIDENCE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_size_matches_rnnoise_frame_size() {
        assert_eq!(BLOCK_SIZE, DenoiseState::FRAME_SIZE);
    }

    #[test]
    fn rnnoise_backend_honors_block_contract() {
        let mut model = RnnoiseModel::default();

        // A 440 Hz tone in the i16 range, block by block.
        let mut vad = 0.0f32;
        for block_idx in 0..10 {
            let input: Vec<f32> = (0..BLOCK_SIZE)
                .map(|i| {
                    let t = (block_idx * BLOCK_SIZE + i) as f32 / 48_000.0;
                    (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 8_000.0
                })
                .collect();
            let mut output = vec![0.0f32; BLOCK_SIZE];
            vad = model.transform(&input, &mut output);

            assert!(output.iter().all(|s| s.is_finite()));
        }
        assert!((0.0..=1.0).contains(&vad), "VAD out of range: {vad}");
    }
}
