//! Harmonic partials rendered by additive synthesis.

use std::f32::consts::TAU;

use timbral_core::{CancelToken, Cancelled, PhaseRng, lerp};

use super::{Component, resample, sample_linear};

/// One sinusoidal partial.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    /// Frequency in Hz.
    pub frequency: f32,
    /// Sine amplitude at each frame.
    pub amplitudes: Vec<f32>,
}

impl Partial {
    /// Create a partial.
    pub fn new(frequency: f32, amplitudes: Vec<f32>) -> Self {
        Self {
            frequency,
            amplitudes,
        }
    }
}

/// Set of partials sharing one frame grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SinusoidModel {
    frame_seconds: f32,
    partials: Vec<Partial>,
}

impl SinusoidModel {
    /// Create a model whose envelopes advance every `frame_seconds`.
    pub fn new(frame_seconds: f32, partials: Vec<Partial>) -> Self {
        Self {
            frame_seconds,
            partials,
        }
    }

    /// Time between envelope points in seconds.
    pub fn frame_seconds(&self) -> f32 {
        self.frame_seconds
    }

    /// Partials in rank order.
    pub fn partials(&self) -> &[Partial] {
        &self.partials
    }

    /// Envelope length in frames (the longest partial).
    pub fn frame_count(&self) -> usize {
        self.partials
            .iter()
            .map(|p| p.amplitudes.len())
            .max()
            .unwrap_or(0)
    }
}

impl Component for SinusoidModel {
    fn render(
        &self,
        sample_rate: u32,
        length: usize,
        rng: &mut PhaseRng,
        cancel: &CancelToken,
    ) -> Result<Vec<f32>, Cancelled> {
        let mut out = vec![0.0; length];
        if sample_rate == 0 || self.frame_seconds <= 0.0 {
            return Ok(out);
        }
        let sr = sample_rate as f32;
        let nyquist = sr / 2.0;
        let frames_per_sample = 1.0 / (sr * self.frame_seconds);

        for partial in &self.partials {
            cancel.check()?;
            // drawn before the Nyquist check so skipping never shifts later phases
            let mut phase = rng.next_phase();
            if !partial.frequency.is_finite()
                || partial.frequency <= 0.0
                || partial.frequency >= nyquist
            {
                continue;
            }
            let inc = TAU * partial.frequency / sr;
            let end = partial.amplitudes.len() as f32;

            for (n, sample) in out.iter_mut().enumerate() {
                let pos = n as f32 * frames_per_sample;
                if pos >= end {
                    break;
                }
                *sample += sample_linear(&partial.amplitudes, pos) * phase.sin();
                phase += inc;
                if phase >= TAU {
                    phase -= TAU;
                }
            }
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
        let frames = lerp(a.frame_count() as f32, b.frame_count() as f32, ratio)
            .round()
            .max(0.0) as usize;
        let count = a.partials.len().max(b.partials.len());
        let mut partials = Vec::with_capacity(count);

        for rank in 0..count {
            cancel.check()?;
            let partial = match (a.partials.get(rank), b.partials.get(rank)) {
                (Some(pa), Some(pb)) => {
                    let ea = resample(&pa.amplitudes, frames);
                    let eb = resample(&pb.amplitudes, frames);
                    Partial::new(
                        lerp(pa.frequency * scale_a, pb.frequency * scale_b, ratio),
                        ea.iter().zip(&eb).map(|(x, y)| lerp(*x, *y, ratio)).collect(),
                    )
                }
                (Some(pa), None) => Partial::new(
                    pa.frequency * scale_a,
                    resample(&pa.amplitudes, frames)
                        .into_iter()
                        .map(|x| x * (1.0 - ratio))
                        .collect(),
                ),
                (None, Some(pb)) => Partial::new(
                    pb.frequency * scale_b,
                    resample(&pb.amplitudes, frames)
                        .into_iter()
                        .map(|x| x * ratio)
                        .collect(),
                ),
                (None, None) => continue,
            };
            partials.push(partial);
        }

        Ok(Self {
            frame_seconds: lerp(a.frame_seconds, b.frame_seconds, ratio),
            partials,
        })
    }

    fn attenuate(&mut self, gain: f32) {
        for partial in &mut self.partials {
            for amp in &mut partial.amplitudes {
                *amp *= gain;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady(freq: f32, amp: f32, frames: usize) -> SinusoidModel {
        SinusoidModel::new(0.01, vec![Partial::new(freq, vec![amp; frames])])
    }

    #[test]
    fn renders_steady_sine() {
        let model = steady(100.0, 0.5, 100);
        let out = model
            .render(10_000, 5_000, &mut PhaseRng::new(3), &CancelToken::new())
            .unwrap();
        let peak = out.iter().fold(0.0f32, |m, x| m.max(x.abs()));
        assert!((peak - 0.5).abs() < 0.01, "peak {peak}");
        // zero crossings of a 100 Hz sine over half a second
        let crossings = out.windows(2).filter(|w| w[0] < 0.0 && w[1] >= 0.0).count();
        assert!((49..=51).contains(&crossings), "{crossings} crossings");
    }

    #[test]
    fn envelope_ends_one_frame_after_last_point() {
        let model = steady(100.0, 0.5, 10);
        let out = model
            .render(10_000, 5_000, &mut PhaseRng::new(3), &CancelToken::new())
            .unwrap();
        // 10 frames of 10 ms = 100 ms = 1000 samples
        assert!(out[1000..].iter().all(|&x| x == 0.0));
        assert!(out[500..900].iter().any(|&x| x.abs() > 0.4));
    }

    #[test]
    fn partials_above_nyquist_are_silent() {
        let model = steady(6_000.0, 0.5, 10);
        let out = model
            .render(10_000, 500, &mut PhaseRng::new(3), &CancelToken::new())
            .unwrap();
        assert!(out.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn interpolation_blends_frequency_and_level() {
        let a = steady(100.0, 0.2, 10);
        let b = steady(200.0, 0.6, 30);
        let mid = SinusoidModel::interpolate(&a, &b, 0.5, 1.5, 0.75, &CancelToken::new()).unwrap();
        assert_eq!(mid.frame_count(), 20);
        assert!((mid.partials[0].frequency - 150.0).abs() < 1e-3);
        assert!(mid.partials[0].amplitudes.iter().all(|&x| (x - 0.4).abs() < 1e-5));
    }

    #[test]
    fn unpaired_partials_fade_by_their_side_weight() {
        let a = steady(100.0, 0.5, 10);
        let mut b = steady(100.0, 0.5, 10);
        b.partials.push(Partial::new(200.0, vec![0.4; 10]));

        let out = SinusoidModel::interpolate(&a, &b, 0.25, 1.0, 1.0, &CancelToken::new()).unwrap();
        assert_eq!(out.partials.len(), 2);
        assert!((out.partials[1].amplitudes[0] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn self_interpolation_is_a_transposition() {
        let a = steady(100.0, 0.5, 10);
        let out = SinusoidModel::interpolate(&a, &a, 0.0, 2.0, 2.0, &CancelToken::new()).unwrap();
        assert_eq!(out.partials[0].frequency, 200.0);
        assert_eq!(out.partials[0].amplitudes, a.partials[0].amplitudes);
    }
}
