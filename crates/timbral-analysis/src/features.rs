//! Per-note feature extraction.
//!
//! Turns the samples of one recorded note into the raw material for the three
//! sub-models:
//!
//! - **Partials**: for each harmonic of the known fundamental, a refined
//!   frequency and a per-frame amplitude envelope.
//! - **Noise**: per-frame magnitude spectra with the harmonic peaks carved
//!   out, normalized so that a flat spectrum of value `σ` describes white
//!   noise with standard deviation `σ`.
//! - **Attack**: the first few milliseconds of the raw signal.
//!
//! Frames are `fft_size` samples long and start every `hop_size` samples; the
//! last frames are zero-padded.

use timbral_core::{CancelToken, Cancelled, ms_to_samples};

use crate::fft::{Fft, Window, magnitudes, parabolic_offset};

/// Harmonic search tolerance, as a fraction of the expected frequency.
const HARMONIC_TOLERANCE: f32 = 0.03;

/// Bins on each side of a harmonic peak removed from the noise spectrum.
const PEAK_HALF_WIDTH: usize = 3;

/// One harmonic partial.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialTrack {
    /// Harmonic number (1 = fundamental).
    pub harmonic: usize,
    /// Amplitude-weighted mean frequency in Hz.
    pub frequency: f32,
    /// Sine amplitude per frame.
    pub amplitudes: Vec<f32>,
}

/// Everything extracted from one note.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteFeatures {
    /// Fundamental the harmonics were searched around.
    pub fundamental: f32,
    /// Sample rate of the analysed material.
    pub sample_rate: u32,
    /// Time between frames in seconds.
    pub frame_seconds: f32,
    /// Harmonic partials, lowest first.
    pub partials: Vec<PartialTrack>,
    /// Spacing of the noise spectrum bins in Hz.
    pub noise_bin_hz: f32,
    /// Residual magnitude spectrum per frame.
    pub noise_frames: Vec<Vec<f32>>,
    /// Raw attack samples, faded out over their last quarter.
    pub attack: Vec<f32>,
}

/// Frame-based extractor for [`NoteFeatures`].
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    fft: Fft,
    window: Window,
    hop_size: usize,
    partials: usize,
    transient_ms: u32,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(2048, 512, Window::Hann, 16, 30)
    }
}

impl FeatureExtractor {
    /// Create an extractor.
    ///
    /// # Arguments
    /// * `fft_size` - Frame length in samples
    /// * `hop_size` - Frame spacing in samples
    /// * `window` - Analysis window
    /// * `partials` - Maximum number of harmonics to track
    /// * `transient_ms` - Length of the captured attack
    pub fn new(
        fft_size: usize,
        hop_size: usize,
        window: Window,
        partials: usize,
        transient_ms: u32,
    ) -> Self {
        Self {
            fft: Fft::new(fft_size),
            window,
            hop_size: hop_size.max(1),
            partials: partials.max(1),
            transient_ms,
        }
    }

    /// Extract features of a note whose fundamental is `fundamental` Hz.
    pub fn extract(
        &self,
        samples: &[f32],
        sample_rate: u32,
        fundamental: f32,
        cancel: &CancelToken,
    ) -> Result<NoteFeatures, Cancelled> {
        let size = self.fft.size();
        let sr = sample_rate as f32;
        let bin_hz = sr / size as f32;
        let nyquist = sr / 2.0;
        let coeffs = self.window.coefficients(size);
        let coherent_gain: f32 = coeffs.iter().sum::<f32>().max(1e-9);
        let noise_norm = coeffs.iter().map(|w| w * w).sum::<f32>().sqrt().max(1e-9);

        let harmonics: Vec<usize> = (1..=self.partials)
            .take_while(|&h| {
                fundamental > 0.0 && fundamental * h as f32 * (1.0 + HARMONIC_TOLERANCE) < nyquist
            })
            .collect();

        let frame_count = samples.len().div_ceil(self.hop_size).max(1);
        let mut amplitudes = vec![Vec::with_capacity(frame_count); harmonics.len()];
        let mut freq_weighted = vec![0.0_f32; harmonics.len()];
        let mut weight = vec![0.0_f32; harmonics.len()];
        let mut noise_frames = Vec::with_capacity(frame_count);

        let mut frame = vec![0.0_f32; size];
        for f in 0..frame_count {
            cancel.check()?;
            let start = f * self.hop_size;
            for (i, slot) in frame.iter_mut().enumerate() {
                *slot = samples.get(start + i).copied().unwrap_or(0.0) * coeffs[i];
            }
            let mut mags = magnitudes(&self.fft.forward(&frame));

            for (idx, &h) in harmonics.iter().enumerate() {
                let expected = fundamental * h as f32;
                let (amp, freq) = find_peak(&mags, expected, bin_hz);
                amplitudes[idx].push(2.0 * amp / coherent_gain);
                freq_weighted[idx] += freq * amp;
                weight[idx] += amp;
            }

            carve_harmonics(&mut mags, fundamental, bin_hz);
            noise_frames.push(mags.iter().map(|m| m / noise_norm).collect());
        }

        let partials = harmonics
            .iter()
            .zip(amplitudes)
            .enumerate()
            .map(|(idx, (&h, amps))| PartialTrack {
                harmonic: h,
                frequency: if weight[idx] > 1e-9 {
                    freq_weighted[idx] / weight[idx]
                } else {
                    fundamental * h as f32
                },
                amplitudes: amps,
            })
            .collect();

        tracing::trace!(
            fundamental,
            frames = frame_count,
            partials = harmonics.len(),
            "note features extracted"
        );

        Ok(NoteFeatures {
            fundamental,
            sample_rate,
            frame_seconds: self.hop_size as f32 / sr,
            partials,
            noise_bin_hz: bin_hz,
            noise_frames,
            attack: self.attack(samples, sample_rate),
        })
    }

    fn attack(&self, samples: &[f32], sample_rate: u32) -> Vec<f32> {
        let len = ms_to_samples(self.transient_ms, sample_rate).min(samples.len());
        let fade = (len / 4).max(1);
        samples[..len]
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let remaining = len - i;
                if remaining <= fade {
                    x * (remaining - 1) as f32 / fade as f32
                } else {
                    x
                }
            })
            .collect()
    }
}

/// Strongest bin within the harmonic tolerance around `expected`, returned
/// as (interpolated magnitude, interpolated frequency).
fn find_peak(mags: &[f32], expected: f32, bin_hz: f32) -> (f32, f32) {
    let last = mags.len().saturating_sub(1);
    let lo = (((expected * (1.0 - HARMONIC_TOLERANCE)) / bin_hz).floor() as usize).clamp(1, last);
    let hi = (((expected * (1.0 + HARMONIC_TOLERANCE)) / bin_hz).ceil() as usize).clamp(lo, last);

    let mut k = lo;
    for i in lo..=hi {
        if mags[i] > mags[k] {
            k = i;
        }
    }
    if k == 0 || k >= last {
        return (mags[k], k as f32 * bin_hz);
    }
    let offset = parabolic_offset(mags[k - 1], mags[k], mags[k + 1]);
    let peak = mags[k] - 0.25 * (mags[k - 1] - mags[k + 1]) * offset;
    (peak.max(0.0), (k as f32 + offset) * bin_hz)
}

/// Replace the bins around every harmonic with the lower of their edges.
fn carve_harmonics(mags: &mut [f32], fundamental: f32, bin_hz: f32) {
    if fundamental <= 0.0 || mags.len() < 3 {
        return;
    }
    let last = mags.len() - 1;
    let mut h = 1;
    loop {
        let center = (fundamental * h as f32 / bin_hz).round() as usize;
        if center >= last {
            break;
        }
        let lo = center.saturating_sub(PEAK_HALF_WIDTH + 1);
        let hi = (center + PEAK_HALF_WIDTH + 1).min(last);
        let floor = mags[lo].min(mags[hi]);
        for m in &mut mags[lo + 1..hi] {
            *m = m.min(floor);
        }
        h += 1;
    }
}
