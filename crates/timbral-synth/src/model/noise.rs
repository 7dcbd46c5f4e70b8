//! Residual noise as a time-varying magnitude spectrum.
//!
//! Envelopes are stored on the analysis bin grid, normalized so that a flat
//! envelope of value `σ` renders white noise with standard deviation `σ`.
//! Rendering builds random-phase spectra on a fixed 1024-point grid, inverts
//! them and overlap-adds with a √Hann window at 50% overlap, which preserves
//! power across frames.

use rustfft::num_complex::Complex;
use timbral_analysis::{Fft, Window};
use timbral_core::{CancelToken, Cancelled, PhaseRng, lerp};

use super::{Component, sample_linear};

/// Synthesis frame length in samples.
const SYNTH_SIZE: usize = 1024;

/// Per-frame band magnitudes.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseModel {
    bin_hz: f32,
    frame_seconds: f32,
    frames: Vec<Vec<f32>>,
}

impl NoiseModel {
    /// Create a model from magnitude frames spaced `frame_seconds` apart,
    /// each bin `bin_hz` wide.
    pub fn new(bin_hz: f32, frame_seconds: f32, frames: Vec<Vec<f32>>) -> Self {
        Self {
            bin_hz,
            frame_seconds,
            frames,
        }
    }

    /// Width of one envelope bin in Hz.
    pub fn bin_hz(&self) -> f32 {
        self.bin_hz
    }

    /// Time between frames in seconds.
    pub fn frame_seconds(&self) -> f32 {
        self.frame_seconds
    }

    /// Magnitude frames.
    pub fn frames(&self) -> &[Vec<f32>] {
        &self.frames
    }

    /// Magnitude of frame `frame` at `freq` Hz.
    fn frame_value(&self, frame: usize, freq: f32) -> f32 {
        if self.bin_hz <= 0.0 {
            return 0.0;
        }
        self.frames
            .get(frame)
            .map_or(0.0, |bins| sample_linear(bins, freq / self.bin_hz))
    }

    /// Magnitude at fractional frame `pos` and `freq` Hz.
    fn value_at(&self, pos: f32, freq: f32) -> f32 {
        let pos = pos.max(0.0);
        let i = pos as usize;
        if i >= self.frames.len() {
            return 0.0;
        }
        let v0 = self.frame_value(i, freq);
        let v1 = self.frame_value(i + 1, freq);
        lerp(v0, v1, pos - i as f32)
    }
}

impl Component for NoiseModel {
    fn render(
        &self,
        sample_rate: u32,
        length: usize,
        rng: &mut PhaseRng,
        cancel: &CancelToken,
    ) -> Result<Vec<f32>, Cancelled> {
        let mut out = vec![0.0; length];
        if self.frames.is_empty() || sample_rate == 0 || self.frame_seconds <= 0.0 {
            return Ok(out);
        }

        let fft = Fft::new(SYNTH_SIZE);
        let hop = SYNTH_SIZE / 2;
        let window: Vec<f32> = Window::Hann
            .coefficients(SYNTH_SIZE)
            .into_iter()
            .map(f32::sqrt)
            .collect();
        let sr = sample_rate as f32;
        let synth_bin_hz = sr / SYNTH_SIZE as f32;
        let gain = (SYNTH_SIZE as f32).sqrt();
        let nyquist_bin = fft.bins() - 1;
        let mut spectrum = vec![Complex::new(0.0, 0.0); fft.bins()];

        // first frame starts one hop early so sample 0 gets full coverage
        let mut start = -(hop as isize);
        while start < length as isize {
            cancel.check()?;
            let pos = start.max(0) as f32 / sr / self.frame_seconds;
            for (k, bin) in spectrum.iter_mut().enumerate() {
                let phase = rng.next_phase();
                let mag = if k == 0 || k == nyquist_bin {
                    0.0
                } else {
                    self.value_at(pos, k as f32 * synth_bin_hz) * gain
                };
                *bin = Complex::from_polar(mag, phase);
            }

            let frame = fft.inverse(&spectrum);
            for (i, (y, w)) in frame.iter().zip(&window).enumerate() {
                let n = start + i as isize;
                if n >= 0 && (n as usize) < length {
                    out[n as usize] += y * w;
                }
            }
            start += hop as isize;
        }
        Ok(out)
    }

    fn interpolate(
        a: &Self,
        b: &Self,
        ratio: f32,
        scale_a: f32,
        scale_b: f32,
        cancel: &CancelToken,
    ) -> Result<Self, Cancelled> {
        let frames = lerp(a.frames.len() as f32, b.frames.len() as f32, ratio)
            .round()
            .max(0.0) as usize;
        let bins = a.frames.first().map_or(0, Vec::len);
        let bin_hz = a.bin_hz;

        // position of result frame j on a source's frame axis, endpoints aligned
        let axis = |source_frames: usize, j: usize| {
            if frames <= 1 || source_frames <= 1 {
                0.0
            } else {
                j as f32 * (source_frames - 1) as f32 / (frames - 1) as f32
            }
        };

        let mut out = Vec::with_capacity(frames);
        for j in 0..frames {
            cancel.check()?;
            let pa = axis(a.frames.len(), j);
            let pb = axis(b.frames.len(), j);
            let frame = (0..bins)
                .map(|k| {
                    let freq = k as f32 * bin_hz;
                    let va = if scale_a > 0.0 {
                        a.value_at(pa, freq / scale_a)
                    } else {
                        0.0
                    };
                    let vb = if scale_b > 0.0 {
                        b.value_at(pb, freq / scale_b)
                    } else {
                        0.0
                    };
                    lerp(va, vb, ratio)
                })
                .collect();
            out.push(frame);
        }

        Ok(Self {
            bin_hz,
            frame_seconds: lerp(a.frame_seconds, b.frame_seconds, ratio),
            frames: out,
        })
    }

    fn attenuate(&mut self, gain: f32) {
        for frame in &mut self.frames {
            for m in frame {
                *m *= gain;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(level: f32, frames: usize) -> NoiseModel {
        NoiseModel::new(10.0, 0.05, vec![vec![level; 1025]; frames])
    }

    fn rms(x: &[f32]) -> f32 {
        (x.iter().map(|v| v * v).sum::<f32>() / x.len() as f32).sqrt()
    }

    #[test]
    fn flat_envelope_renders_matching_level() {
        let out = flat(0.1, 40)
            .render(20_000, 20_000, &mut PhaseRng::new(9), &CancelToken::new())
            .unwrap();
        let level = rms(&out[2_000..18_000]);
        assert!((level - 0.1).abs() < 0.02, "rms {level}");
    }

    #[test]
    fn same_seed_same_noise() {
        let model = flat(0.1, 4);
        let a = model
            .render(8_000, 2_000, &mut PhaseRng::new(5), &CancelToken::new())
            .unwrap();
        let b = model
            .render(8_000, 2_000, &mut PhaseRng::new(5), &CancelToken::new())
            .unwrap();
        let c = model
            .render(8_000, 2_000, &mut PhaseRng::new(6), &CancelToken::new())
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn transposition_warps_the_spectrum() {
        let mut bins = vec![0.0; 101];
        bins[20] = 1.0;
        let model = NoiseModel::new(10.0, 0.01, vec![bins; 3]);
        let up = NoiseModel::interpolate(&model, &model, 0.0, 2.0, 2.0, &CancelToken::new()).unwrap();
        assert_eq!(up.frames().len(), 3);
        // the 200 Hz band moves to 400 Hz
        assert!((up.frames()[1][40] - 1.0).abs() < 1e-6);
        assert_eq!(up.frames()[1][20], 0.0);
    }

    #[test]
    fn interpolation_blends_levels_and_lengths() {
        let a = NoiseModel::new(10.0, 0.01, vec![vec![0.2; 11]; 4]);
        let b = NoiseModel::new(10.0, 0.03, vec![vec![0.6; 11]; 8]);
        let mid = NoiseModel::interpolate(&a, &b, 0.5, 1.0, 1.0, &CancelToken::new()).unwrap();
        assert_eq!(mid.frames().len(), 6);
        assert!((mid.frame_seconds() - 0.02).abs() < 1e-6);
        assert!((mid.frames()[3][5] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn cancelled_render() {
        let token = CancelToken::new();
        token.cancel();
        let result = flat(0.1, 4).render(8_000, 2_000, &mut PhaseRng::new(5), &token);
        assert_eq!(result, Err(Cancelled));
    }
}
