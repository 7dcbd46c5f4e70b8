//! Fundamental frequency estimation.
//!
//! [`PitchEstimator`] is the seam between segmentation and the rest of the
//! pipeline: given the samples of one event it returns a fundamental
//! frequency, or `None` when nothing pitched is audible. Implementations must
//! be deterministic for identical input and monotonic with perceived pitch.
//!
//! [`SpectralPitchEstimator`] is the bundled implementation. It computes the
//! normalized square difference function (NSDF) of each frame through the
//! FFT (Wiener–Khinchin), averages it over the frames that are loud enough,
//! and picks the first lag whose peak reaches a fixed fraction of the
//! strongest one (McLeod's key-maximum rule). The winning lag is refined with
//! parabolic interpolation.

use rustfft::num_complex::Complex;
use timbral_core::{CancelToken, Cancelled, linear_to_db};

use crate::fft::{Fft, Window, parabolic_offset};

/// Fraction of the highest NSDF peak a candidate must reach.
const KEY_MAXIMUM_RATIO: f32 = 0.9;

/// Peaks below this clarity are not pitched at all.
const MIN_CLARITY: f32 = 0.3;

/// Estimates the fundamental frequency of a sample range.
pub trait PitchEstimator {
    /// Estimate the fundamental of `samples` at `sample_rate` Hz.
    ///
    /// Frames quieter than `min_decibel` (RMS, dBFS) are ignored. Returns
    /// `Ok(None)` when no frame qualifies or no periodicity is found.
    fn estimate_fundamental_frequency(
        &self,
        samples: &[f32],
        sample_rate: f32,
        min_decibel: f32,
        window: Window,
        cancel: &CancelToken,
    ) -> Result<Option<f32>, Cancelled>;
}

/// NSDF-based estimator computed with FFT autocorrelation.
#[derive(Debug, Clone)]
pub struct SpectralPitchEstimator {
    frame_size: usize,
    fft: Fft,
    min_frequency: f32,
    max_frequency: f32,
}

impl Default for SpectralPitchEstimator {
    fn default() -> Self {
        Self::new(2048, 40.0, 2000.0)
    }
}

impl SpectralPitchEstimator {
    /// Create an estimator analysing `frame_size`-sample frames and searching
    /// `[min_frequency, max_frequency]` Hz.
    pub fn new(frame_size: usize, min_frequency: f32, max_frequency: f32) -> Self {
        let frame_size = frame_size.max(64);
        Self {
            frame_size,
            // zero padding to 2N keeps the circular autocorrelation linear
            fft: Fft::new(frame_size * 2),
            min_frequency: min_frequency.max(1.0),
            max_frequency: max_frequency.max(min_frequency + 1.0),
        }
    }

    /// Frame size in samples.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Accumulate the NSDF of one frame into `acc`.
    fn accumulate_nsdf(&self, frame: &[f32], acc: &mut [f32]) {
        let spectrum = self.fft.forward(frame);
        let power: Vec<Complex<f32>> = spectrum
            .iter()
            .map(|c| Complex::new(c.norm_sqr(), 0.0))
            .collect();
        let acf = self.fft.inverse(&power);

        // m(τ) = Σ x[j]² + x[j+τ]² over the overlapping part, updated in O(1) per lag
        let len = frame.len();
        let mut m = 2.0 * acf[0];
        for tau in 0..acc.len().min(len) {
            if tau > 0 {
                m -= frame[len - tau].powi(2) + frame[tau - 1].powi(2);
            }
            if m > 1e-12 {
                acc[tau] += 2.0 * acf[tau] / m;
            }
        }
    }
}

impl PitchEstimator for SpectralPitchEstimator {
    fn estimate_fundamental_frequency(
        &self,
        samples: &[f32],
        sample_rate: f32,
        min_decibel: f32,
        window: Window,
        cancel: &CancelToken,
    ) -> Result<Option<f32>, Cancelled> {
        if samples.is_empty() || sample_rate <= 0.0 {
            return Ok(None);
        }

        let len = self.frame_size.min(samples.len());
        let hop = (len / 2).max(1);
        let coeffs = window.coefficients(len);
        let mut nsdf = vec![0.0_f32; len];
        let mut frames = 0usize;

        let mut start = 0;
        while start + len <= samples.len() {
            cancel.check()?;
            let raw = &samples[start..start + len];
            start += hop;

            let rms = (raw.iter().map(|x| x * x).sum::<f32>() / len as f32).sqrt();
            if linear_to_db(rms) < min_decibel {
                continue;
            }
            let frame: Vec<f32> = raw.iter().zip(&coeffs).map(|(x, w)| x * w).collect();
            self.accumulate_nsdf(&frame, &mut nsdf);
            frames += 1;
        }

        if frames == 0 {
            return Ok(None);
        }
        for v in &mut nsdf {
            *v /= frames as f32;
        }

        let min_lag = ((sample_rate / self.max_frequency).floor() as usize).max(2);
        let max_lag = ((sample_rate / self.min_frequency).ceil() as usize).min(len / 2);
        let Some(lag) = pick_key_maximum(&nsdf, min_lag, max_lag) else {
            tracing::trace!(frames, "no periodicity found");
            return Ok(None);
        };

        let offset = parabolic_offset(nsdf[lag - 1], nsdf[lag], nsdf[lag + 1]);
        let frequency = sample_rate / (lag as f32 + offset);
        tracing::trace!(frames, lag, frequency, "pitch estimated");
        Ok(Some(frequency))
    }
}

/// First positive-lobe maximum reaching `KEY_MAXIMUM_RATIO` of the largest.
///
/// The search starts after the NSDF first drops to zero, so the zero-lag lobe
/// never wins. Returned lags always have both neighbors in range.
fn pick_key_maximum(nsdf: &[f32], min_lag: usize, max_lag: usize) -> Option<usize> {
    if max_lag + 1 >= nsdf.len() || min_lag >= max_lag {
        return None;
    }

    let mut tau = 1;
    while tau <= max_lag && nsdf[tau] > 0.0 {
        tau += 1;
    }

    let mut maxima: Vec<usize> = Vec::new();
    let mut current: Option<usize> = None;
    while tau <= max_lag {
        if nsdf[tau] > 0.0 {
            if tau >= min_lag && current.is_none_or(|c| nsdf[tau] > nsdf[c]) {
                current = Some(tau);
            }
        } else if let Some(c) = current.take() {
            maxima.push(c);
        }
        tau += 1;
    }
    if let Some(c) = current {
        maxima.push(c);
    }

    let best = maxima.iter().map(|&m| nsdf[m]).fold(0.0_f32, f32::max);
    if best < MIN_CLARITY {
        return None;
    }
    maxima
        .into_iter()
        .find(|&m| nsdf[m] >= KEY_MAXIMUM_RATIO * best)
}
