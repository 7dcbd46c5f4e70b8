//! Note models and their renderable components.
//!
//! A [`NoteModel`] describes one pitch of an instrument as up to three
//! independent components:
//!
//! | Component | Captures | Rendering |
//! |-----------|----------|-----------|
//! | [`SinusoidModel`] | Harmonic partials with per-frame envelopes | Additive oscillators |
//! | [`TransientModel`] | The raw attack | Varispeed playback |
//! | [`NoiseModel`] | Residual spectrum per frame | Random-phase overlap-add |
//!
//! All three implement [`Component`], which is everything the note
//! synthesizer and compositor need: render to samples, build an in-between
//! component from two sources, and scale.

mod noise;
mod sinusoid;
mod transient;

pub use noise::NoiseModel;
pub use sinusoid::{Partial, SinusoidModel};
pub use transient::TransientModel;

use timbral_analysis::NoteFeatures;
use timbral_core::{CancelToken, Cancelled, PhaseRng, ms_to_samples};

/// Capability shared by the three sub-model kinds.
pub trait Component: Sized {
    /// Render `length` samples at `sample_rate`.
    ///
    /// Random phases are drawn from `rng`; the same generator state always
    /// yields the same samples.
    fn render(
        &self,
        sample_rate: u32,
        length: usize,
        rng: &mut PhaseRng,
        cancel: &CancelToken,
    ) -> Result<Vec<f32>, Cancelled>;

    /// Build a component between `a` and `b`.
    ///
    /// `ratio` is 0 at `a` and 1 at `b`. Each source is first transposed by its
    /// frequency scale (`target / source` fundamental). Passing the same
    /// component twice with ratio 0 rescales it alone.
    fn interpolate(
        a: &Self,
        b: &Self,
        ratio: f32,
        scale_a: f32,
        scale_b: f32,
        cancel: &CancelToken,
    ) -> Result<Self, Cancelled>;

    /// Multiply the component's level by `gain`.
    fn attenuate(&mut self, gain: f32);
}

/// Model of one pitch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoteModel {
    /// Nominal length of a rendering in milliseconds.
    pub length_ms: u32,
    /// Harmonic part.
    pub sinusoid: Option<SinusoidModel>,
    /// Attack part.
    pub transient: Option<TransientModel>,
    /// Noise part.
    pub noise: Option<NoiseModel>,
}

impl NoteModel {
    /// Create an empty model of the given length.
    pub fn new(length_ms: u32) -> Self {
        Self {
            length_ms,
            ..Self::default()
        }
    }

    /// Build a model from extracted note features.
    ///
    /// Components with no material (no partials, an empty attack, no noise
    /// frames) are left out.
    pub fn from_features(features: &NoteFeatures, length_ms: u32) -> Self {
        let sinusoid = (!features.partials.is_empty()).then(|| {
            SinusoidModel::new(
                features.frame_seconds,
                features
                    .partials
                    .iter()
                    .map(|p| Partial::new(p.frequency, p.amplitudes.clone()))
                    .collect(),
            )
        });
        let transient = (!features.attack.is_empty())
            .then(|| TransientModel::new(features.attack.clone(), features.sample_rate));
        let noise = (!features.noise_frames.is_empty()).then(|| {
            NoiseModel::new(
                features.noise_bin_hz,
                features.frame_seconds,
                features.noise_frames.clone(),
            )
        });

        Self {
            length_ms,
            sinusoid,
            transient,
            noise,
        }
    }

    /// Number of components present.
    pub fn component_count(&self) -> usize {
        usize::from(self.sinusoid.is_some())
            + usize::from(self.transient.is_some())
            + usize::from(self.noise.is_some())
    }

    /// Render the whole note at `sample_rate`.
    ///
    /// Components are rendered in a fixed order (sinusoid, transient, noise)
    /// from the same generator and summed.
    pub fn render(
        &self,
        sample_rate: u32,
        rng: &mut PhaseRng,
        cancel: &CancelToken,
    ) -> Result<Vec<f32>, Cancelled> {
        let length = ms_to_samples(self.length_ms, sample_rate);
        let mut out = vec![0.0; length];

        if let Some(sinusoid) = &self.sinusoid {
            mix_into(&mut out, &sinusoid.render(sample_rate, length, rng, cancel)?);
        }
        if let Some(transient) = &self.transient {
            mix_into(&mut out, &transient.render(sample_rate, length, rng, cancel)?);
        }
        if let Some(noise) = &self.noise {
            mix_into(&mut out, &noise.render(sample_rate, length, rng, cancel)?);
        }
        Ok(out)
    }
}

fn mix_into(out: &mut [f32], part: &[f32]) {
    for (o, p) in out.iter_mut().zip(part) {
        *o += p;
    }
}

/// Value of `values` at fractional index `pos`, falling to zero over the
/// step after the last value. Negative positions read the first value.
#[inline]
pub(crate) fn sample_linear(values: &[f32], pos: f32) -> f32 {
    let pos = pos.max(0.0);
    let i = pos as usize;
    let Some(&v0) = values.get(i) else {
        return 0.0;
    };
    let v1 = values.get(i + 1).copied().unwrap_or(0.0);
    let frac = pos - i as f32;
    v0 + (v1 - v0) * frac
}

/// Stretch `values` to `len` points, keeping both endpoints.
pub(crate) fn resample(values: &[f32], len: usize) -> Vec<f32> {
    match (values.len(), len) {
        (_, 0) => Vec::new(),
        (0, _) => vec![0.0; len],
        (1, _) => vec![values[0]; len],
        (_, 1) => vec![values[0]],
        (n, _) => {
            let step = (n - 1) as f32 / (len - 1) as f32;
            (0..len)
                .map(|j| {
                    let pos = j as f32 * step;
                    let i = (pos as usize).min(n - 2);
                    let frac = pos - i as f32;
                    values[i] + (values[i + 1] - values[i]) * frac
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timbral_analysis::{FeatureExtractor, Window};

    #[test]
    fn resample_keeps_endpoints() {
        let v = resample(&[0.0, 1.0, 0.0], 5);
        assert_eq!(v.len(), 5);
        assert_eq!(v[0], 0.0);
        assert!((v[1] - 0.5).abs() < 1e-6);
        assert_eq!(v[2], 1.0);
        assert_eq!(v[4], 0.0);
        assert_eq!(resample(&[1.0, 2.0, 3.0], 3), vec![1.0, 2.0, 3.0]);
        assert_eq!(resample(&[], 3), vec![0.0; 3]);
    }

    #[test]
    fn sample_linear_fades_past_end() {
        let v = [1.0, 1.0];
        assert_eq!(sample_linear(&v, 0.5), 1.0);
        assert!((sample_linear(&v, 1.5) - 0.5).abs() < 1e-6);
        assert_eq!(sample_linear(&v, 2.0), 0.0);
        assert_eq!(sample_linear(&v, -3.0), 1.0);
    }

    #[test]
    fn from_features_keeps_present_components() {
        let samples: Vec<f32> = (0..8820)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 44100.0).sin())
            .collect();
        let features = FeatureExtractor::new(1024, 256, Window::Hann, 4, 10)
            .extract(&samples, 44100, 220.0, &CancelToken::new())
            .unwrap();
        let model = NoteModel::from_features(&features, 200);
        assert_eq!(model.length_ms, 200);
        assert_eq!(model.component_count(), 3);
        assert_eq!(model.sinusoid.as_ref().unwrap().partials().len(), 4);

        let rendered = model
            .render(44100, &mut PhaseRng::new(1), &CancelToken::new())
            .unwrap();
        assert_eq!(rendered.len(), 8820);
        let peak = rendered.iter().fold(0.0f32, |m, x| m.max(x.abs()));
        assert!(peak > 0.3 && peak < 1.5, "peak {peak}");
    }

    #[test]
    fn empty_model_renders_silence() {
        let out = NoteModel::new(10)
            .render(1000, &mut PhaseRng::new(0), &CancelToken::new())
            .unwrap();
        assert_eq!(out, vec![0.0; 10]);
    }
}
