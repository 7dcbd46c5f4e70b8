//! Mono PCM sample buffer.
//!
//! [`SampleBuffer`] pairs a `Vec<f32>` with the *effective* sample rate used
//! to address it: frames per second multiplied by the channel count of the
//! source. Timbral works on mono (or interleaved-as-mono) data, so a stereo
//! recording read without mixdown is addressed at twice its frame rate.
//!
//! The logical length in milliseconds is derived on every call and never
//! stored, so it cannot drift from the sample count or the rate.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::math::{ms_to_samples, samples_to_ms};

/// Mono `f32` PCM samples with an effective sample rate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Wrap existing samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Create a silent buffer of `len` samples.
    pub fn silent(len: usize, sample_rate: u32) -> Self {
        Self::new(alloc_zeroed(len), sample_rate)
    }

    /// Effective sample rate (frames per second × channels).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Change the sample rate label; the length in ms follows automatically.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` when the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Logical length in milliseconds, derived from sample count and rate.
    pub fn length_ms(&self) -> u32 {
        samples_to_ms(self.samples.len(), self.sample_rate)
    }

    /// Borrow the samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Mutably borrow the samples.
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Resize to `len` samples, zero-filling new space.
    pub fn resize(&mut self, len: usize) {
        self.samples.resize(len, 0.0);
    }

    /// Borrow the samples covering `[start_ms, start_ms + length_ms)`,
    /// clipped to the buffer.
    pub fn slice_ms(&self, start_ms: u32, length_ms: u32) -> &[f32] {
        let start = ms_to_samples(start_ms, self.sample_rate).min(self.samples.len());
        let end = ms_to_samples(start_ms.saturating_add(length_ms), self.sample_rate)
            .min(self.samples.len());
        &self.samples[start..end.max(start)]
    }

    /// Maximum absolute sample value (0.0 for an empty buffer).
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }
}

fn alloc_zeroed(len: usize) -> Vec<f32> {
    let mut v = Vec::with_capacity(len);
    v.resize(len, 0.0);
    v
}
