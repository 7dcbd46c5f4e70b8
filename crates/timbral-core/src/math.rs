//! Numeric utility functions shared by analysis and synthesis.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear amplitude
//!
//! # Pitch Conversions
//!
//! Equal temperament with A4 = note 69 = 440 Hz. Note numbers are signed:
//! an instrument may hold pitches outside the MIDI range.
//!
//! - [`note_to_frequency`] / [`note_from_frequency`]
//!
//! # Time Conversions
//!
//! Event times are integer milliseconds and sample positions are integer
//! indices, so both directions use integer arithmetic (`ms × rate / 1000`).
//!
//! - [`ms_to_samples`] / [`samples_to_ms`]

use libm::{expf, log2f, logf, powf, roundf};

/// Reference pitch for note 69 (A4).
const A4_FREQUENCY: f32 = 440.0;

/// Note number of the reference pitch.
const A4_NOTE: i32 = 69;

/// Convert decibels to linear amplitude.
///
/// # Example
/// ```rust
/// use timbral_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear amplitude to decibels.
///
/// Input is floored at 1e-10 so silence maps to -200 dB instead of -inf.
///
/// # Example
/// ```rust
/// use timbral_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    // 20 * log10(linear) = 20 * ln(linear) / ln(10)
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Linear interpolation between two values.
///
/// # Arguments
/// * `a` - Start value (at t=0)
/// * `b` - End value (at t=1)
/// * `t` - Interpolation factor, not clamped
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp a value to a range.
#[inline]
pub fn clamp(x: f32, min: f32, max: f32) -> f32 {
    x.clamp(min, max)
}

/// Convert a note number to its equal-tempered frequency in Hz.
///
/// # Example
/// ```rust
/// use timbral_core::note_to_frequency;
///
/// assert!((note_to_frequency(69) - 440.0).abs() < 1e-3);
/// assert!((note_to_frequency(57) - 220.0).abs() < 1e-3);
/// ```
#[inline]
pub fn note_to_frequency(note: i32) -> f32 {
    A4_FREQUENCY * powf(2.0, (note as f32 - A4_NOTE as f32) / 12.0)
}

/// Convert a frequency in Hz to the nearest note number.
///
/// Non-positive frequencies have no pitch; they map to the lowest
/// representable note so callers never see NaN-derived garbage.
#[inline]
pub fn note_from_frequency(freq_hz: f32) -> i32 {
    if freq_hz <= 0.0 || !freq_hz.is_finite() {
        return i32::MIN;
    }
    roundf(A4_NOTE as f32 + 12.0 * log2f(freq_hz / A4_FREQUENCY)) as i32
}

/// Convert milliseconds to a sample count (`ms × rate / 1000`, truncating).
#[inline]
pub fn ms_to_samples(ms: u32, sample_rate: u32) -> usize {
    (u64::from(ms) * u64::from(sample_rate) / 1000) as usize
}

/// Convert a sample count to milliseconds (`samples × 1000 / rate`, truncating).
///
/// Returns 0 for a zero sample rate.
#[inline]
pub fn samples_to_ms(samples: usize, sample_rate: u32) -> u32 {
    if sample_rate == 0 {
        return 0;
    }
    (samples as u64 * 1000 / u64::from(sample_rate)).min(u64::from(u32::MAX)) as u32
}
