//! Per-channel block reshaping between the host's chunk sizes and the model's
//! fixed block size.

use std::collections::VecDeque;

use crate::model::DenoiseModel;
use crate::{from_model_scale, BLOCK_SIZE};

/// One audio channel's streaming adapter around a [`DenoiseModel`].
///
/// Accumulates raw samples until a full [`BLOCK_SIZE`] block is available,
/// runs the model, and queues the denoised output until the host asks for it.
/// Input and queued samples are in the model's numeric range; [`pull`] converts
/// back to the normalized range on the way out.
///
/// Queue removal is done with [`VecDeque::drain`] so draining a block is O(B)
/// amortized, and the block scratch buffers are allocated once up front. After
/// the initial warm-up, steady-state processing does not grow the heap.
///
/// [`pull`]: ChannelStream::pull
pub struct ChannelStream<M> {
    model: M,
    /// Raw samples awaiting enough accumulation to form the next block.
    pending: VecDeque<f32>,
    /// Denoised samples awaiting host delivery.
    ready: VecDeque<f32>,
    block_in: Vec<f32>,
    block_out: Vec<f32>,
    confidence: f32,
}

impl<M: DenoiseModel> ChannelStream<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            pending: VecDeque::with_capacity(BLOCK_SIZE * 2),
            ready: VecDeque::with_capacity(BLOCK_SIZE * 2),
            block_in: vec![0.0; BLOCK_SIZE],
            block_out: vec![0.0; BLOCK_SIZE],
            confidence: 0.0,
        }
    }

    /// Append `samples` (already in the model's numeric range) and run the
    /// model on every complete block, oldest first.
    ///
    /// Guarantees `pending_len() < BLOCK_SIZE` on return: a backlog of any
    /// size drains in block-sized, time-ordered steps within this call.
    pub fn push_and_process(&mut self, samples: &[f32]) {
        self.pending.extend(samples.iter().copied());
        while self.pending.len() >= BLOCK_SIZE {
            for (dst, src) in self.block_in.iter_mut().zip(self.pending.iter()) {
                *dst = *src;
            }
            self.confidence = self.model.transform(&self.block_in, &mut self.block_out);
            self.ready.extend(self.block_out.iter().copied());
            self.pending.drain(..BLOCK_SIZE);
        }
    }

    /// Fill `output` with the oldest denoised samples, converted back to the
    /// normalized range.
    ///
    /// If fewer than `output.len()` samples are ready, `output` is filled with
    /// silence instead, the ready queue is left untouched, and `true`
    /// (underrun) is returned. The caller never stalls and never receives a
    /// partial delivery.
    pub fn pull(&mut self, output: &mut [f32]) -> bool {
        if self.ready.len() < output.len() {
            // Not enough denoised data yet, keep silent.
            output.fill(0.0);
            return true;
        }
        let n = output.len();
        for (dst, src) in output.iter_mut().zip(self.ready.drain(..n)) {
            *dst = from_model_scale(src);
        }
        false
    }

    /// Confidence reported by the model for the most recent block, in [0, 1].
    /// `0.0` until the first block has been processed.
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Raw samples buffered toward the next block.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Denoised samples buffered for delivery.
    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    /// Discard buffered audio and start the model from fresh state.
    pub fn reset(&mut self)
    where
        M: Default,
    {
        self.model = M::default();
        self.pending.clear();
        self.ready.clear();
        self.confidence = 0.0;
    }

    /// End-of-stream drain: zero-pad a partial trailing block, process it, and
    /// return everything still queued, in the normalized range.
    ///
    /// Intended for offline use; not for the real-time callback path.
    pub fn flush(&mut self) -> Vec<f32> {
        if !self.pending.is_empty() {
            let missing = BLOCK_SIZE - self.pending.len();
            self.pending.extend(std::iter::repeat(0.0).take(missing));
            // Re-run the drain loop on the now-complete block.
            self.push_and_process(&[]);
        }
        self.ready.drain(..).map(from_model_scale).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::{IdentityModel, IDENTITY_CONFIDENCE};
    use crate::to_model_scale;

    fn norm(i: usize) -> f32 {
        // Distinguishable normalized values, cycling well inside [-1, 1].
        ((i % 1000) as f32 - 500.0) / 1000.0
    }

    fn scaled_input(range: std::ops::Range<usize>) -> Vec<f32> {
        range.map(|i| to_model_scale(norm(i))).collect()
    }

    #[test]
    fn multi_block_backlog_drains_in_one_push() {
        let mut chan = ChannelStream::new(IdentityModel::default());
        chan.push_and_process(&scaled_input(0..2 * BLOCK_SIZE));

        assert_eq!(chan.ready_len(), 2 * BLOCK_SIZE);
        assert_eq!(chan.pending_len(), 0);

        let mut out = vec![0.0f32; 2 * BLOCK_SIZE];
        let underrun = chan.pull(&mut out);
        assert!(!underrun);
        for (i, &s) in out.iter().enumerate() {
            assert!((s - norm(i)).abs() < 1e-6, "sample {i}: {s} vs {}", norm(i));
        }
    }

    #[test]
    fn backlog_drains_in_block_sized_steps() {
        let mut chan = ChannelStream::new(IdentityModel::default());
        chan.push_and_process(&scaled_input(0..3 * BLOCK_SIZE + 5));

        assert_eq!(chan.model.blocks_seen, 3);
        assert_eq!(chan.pending_len(), 5);
        assert_eq!(chan.ready_len(), 3 * BLOCK_SIZE);
    }

    #[test]
    fn underrun_fills_silence_and_preserves_queue() {
        let mut chan = ChannelStream::new(IdentityModel::default());
        chan.push_and_process(&scaled_input(0..BLOCK_SIZE));
        assert_eq!(chan.ready_len(), BLOCK_SIZE);

        // Ask for more than is ready.
        let mut out = vec![1.0f32; BLOCK_SIZE + 1];
        let underrun = chan.pull(&mut out);
        assert!(underrun);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(chan.ready_len(), BLOCK_SIZE);

        // A smaller request succeeds afterwards.
        let mut out = vec![0.0f32; BLOCK_SIZE];
        assert!(!chan.pull(&mut out));
        assert_eq!(chan.ready_len(), 0);
    }

    #[test]
    fn confidence_tracks_latest_block() {
        let mut chan = ChannelStream::new(IdentityModel::default());
        assert_eq!(chan.confidence(), 0.0);

        chan.push_and_process(&scaled_input(0..BLOCK_SIZE - 1));
        assert_eq!(chan.confidence(), 0.0, "partial block must not run the model");

        chan.push_and_process(&scaled_input(BLOCK_SIZE - 1..BLOCK_SIZE));
        assert_eq!(chan.confidence(), IDENTITY_CONFIDENCE);
    }

    #[test]
    fn fifo_order_survives_odd_chunk_sizes() {
        let mut chan = ChannelStream::new(IdentityModel::default());
        let chunks = [7usize, 123, BLOCK_SIZE, 333, 489, 41];
        let total: usize = chunks.iter().sum();

        let mut offset = 0;
        for &len in &chunks {
            chan.push_and_process(&scaled_input(offset..offset + len));
            offset += len;
        }

        let complete = (total / BLOCK_SIZE) * BLOCK_SIZE;
        assert_eq!(chan.ready_len(), complete);
        assert_eq!(chan.pending_len(), total - complete);

        // Pull in uneven pieces; the stream must come back in order, no
        // duplication, no reordering.
        let mut replay = Vec::new();
        for &len in &[100usize, 500, complete - 600] {
            let mut out = vec![0.0f32; len];
            assert!(!chan.pull(&mut out));
            replay.extend_from_slice(&out);
        }
        for (i, &s) in replay.iter().enumerate() {
            assert!((s - norm(i)).abs() < 1e-6, "sample {i} out of order");
        }
    }

    #[test]
    fn reset_discards_audio_and_confidence() {
        let mut chan = ChannelStream::new(IdentityModel::default());
        chan.push_and_process(&scaled_input(0..BLOCK_SIZE + 10));
        chan.reset();

        assert_eq!(chan.pending_len(), 0);
        assert_eq!(chan.ready_len(), 0);
        assert_eq!(chan.confidence(), 0.0);
        assert_eq!(chan.model.blocks_seen, 0, "reset must restart the model");
    }

    #[test]
    fn flush_pads_trailing_partial_block() {
        let mut chan = ChannelStream::new(IdentityModel::default());
        let tail = 7usize;
        chan.push_and_process(&scaled_input(0..BLOCK_SIZE + tail));

        let out = chan.flush();
        assert_eq!(out.len(), 2 * BLOCK_SIZE);
        for (i, &s) in out[..BLOCK_SIZE + tail].iter().enumerate() {
            assert!((s - norm(i)).abs() < 1e-6);
        }
        assert!(out[BLOCK_SIZE + tail..].iter().all(|&s| s == 0.0));
        assert_eq!(chan.pending_len(), 0);
        assert_eq!(chan.ready_len(), 0);
    }
}
