//! Attack snippet played back at a variable speed.

use timbral_core::{CancelToken, Cancelled, PhaseRng, lerp};

use super::Component;

/// Longest transposed attack, as a multiple of the source length.
const MAX_STRETCH: usize = 16;

/// Slower playback than this is treated as silence.
const MIN_SPEED: f32 = 1e-6;

/// Raw attack samples at their recording rate.
#[derive(Debug, Clone, PartialEq)]
pub struct TransientModel {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl TransientModel {
    /// Create a transient from samples recorded at `sample_rate`.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Attack samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Rate the samples were captured at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Read the snippet `speed` times faster than real time.
    ///
    /// Output length is the number of whole steps that stay inside the
    /// snippet, at most `max_len`. A speed that is not finite or not above
    /// `MIN_SPEED` yields nothing.
    fn varispeed(&self, speed: f32, max_len: usize) -> Vec<f32> {
        let n = self.samples.len();
        if n == 0 || !speed.is_finite() || speed <= MIN_SPEED {
            return Vec::new();
        }
        let steps = ((n - 1) as f32 / speed).floor();
        let len = (steps.min(max_len as f32) as usize + 1).min(max_len);
        (0..len)
            .map(|j| {
                let pos = j as f32 * speed;
                let i = (pos as usize).min(n - 1);
                let frac = pos - i as f32;
                let next = self.samples.get(i + 1).copied().unwrap_or(0.0);
                self.samples[i] + (next - self.samples[i]) * frac
            })
            .collect()
    }
}

impl Component for TransientModel {
    fn render(
        &self,
        sample_rate: u32,
        length: usize,
        _rng: &mut PhaseRng,
        cancel: &CancelToken,
    ) -> Result<Vec<f32>, Cancelled> {
        cancel.check()?;
        if sample_rate == 0 {
            return Ok(vec![0.0; length]);
        }
        let mut out = self.varispeed(self.sample_rate as f32 / sample_rate as f32, length);
        out.resize(length, 0.0);
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
        cancel.check()?;
        // b is brought onto a's sample rate while it is transposed
        let rate_b = if a.sample_rate == 0 {
            1.0
        } else {
            b.sample_rate as f32 / a.sample_rate as f32
        };
        let xa = a.varispeed(scale_a, a.samples.len() * MAX_STRETCH);
        let xb = b.varispeed(scale_b * rate_b, b.samples.len() * MAX_STRETCH);
        let len = xa.len().max(xb.len());

        let samples = (0..len)
            .map(|i| {
                let va = xa.get(i).copied().unwrap_or(0.0);
                let vb = xb.get(i).copied().unwrap_or(0.0);
                lerp(va, vb, ratio)
            })
            .collect();

        Ok(Self {
            samples,
            sample_rate: a.sample_rate,
        })
    }

    fn attenuate(&mut self, gain: f32) {
        for s in &mut self.samples {
            *s *= gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> TransientModel {
        TransientModel::new((0..n).map(|i| i as f32).collect(), 1000)
    }

    #[test]
    fn render_at_source_rate_is_a_copy() {
        let t = ramp(8);
        let out = t
            .render(1000, 10, &mut PhaseRng::new(0), &CancelToken::new())
            .unwrap();
        assert_eq!(&out[..8], t.samples());
        assert_eq!(&out[8..], &[0.0, 0.0]);
    }

    #[test]
    fn render_truncates_to_length() {
        let out = ramp(8)
            .render(1000, 3, &mut PhaseRng::new(0), &CancelToken::new())
            .unwrap();
        assert_eq!(out, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn higher_output_rate_stretches() {
        let out = ramp(5)
            .render(2000, 20, &mut PhaseRng::new(0), &CancelToken::new())
            .unwrap();
        assert_eq!(&out[..9], &[0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0]);
    }

    #[test]
    fn octave_up_halves_duration() {
        let t = ramp(9);
        let up = TransientModel::interpolate(&t, &t, 0.0, 2.0, 2.0, &CancelToken::new()).unwrap();
        assert_eq!(up.samples(), &[0.0, 2.0, 4.0, 6.0, 8.0]);
        assert_eq!(up.sample_rate(), 1000);
    }

    #[test]
    fn deep_transposition_is_capped() {
        let t = ramp(10);
        let down = TransientModel::interpolate(&t, &t, 0.0, 1e-4, 1e-4, &CancelToken::new())
            .unwrap();
        assert_eq!(down.samples().len(), 10 * MAX_STRETCH);
        assert_eq!(down.samples()[0], 0.0);
    }

    #[test]
    fn degenerate_scale_is_silent() {
        let t = ramp(10);
        let token = CancelToken::new();
        for scale in [0.0, 1e-9, f32::NAN, f32::INFINITY, -2.0] {
            let out = TransientModel::interpolate(&t, &t, 0.0, scale, scale, &token).unwrap();
            assert!(out.samples().is_empty(), "scale {scale}");
        }
    }

    #[test]
    fn crossfade_between_sources() {
        let a = TransientModel::new(vec![1.0; 4], 1000);
        let b = TransientModel::new(vec![-1.0; 4], 2000);
        let mid = TransientModel::interpolate(&a, &b, 0.25, 1.0, 1.0, &CancelToken::new()).unwrap();
        // b read at twice the speed to land on a's rate
        assert_eq!(mid.samples().len(), 4);
        assert_eq!(mid.samples()[0], 0.5);
        assert_eq!(mid.samples()[3], 0.75);
    }
}
