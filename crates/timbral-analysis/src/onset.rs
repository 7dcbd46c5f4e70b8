//! Onset/offset segmentation of a raw sample buffer.
//!
//! [`OnsetSegmenter`] splits a recording into runs of audible material. A
//! sample is *active* when its magnitude is strictly above the threshold
//! derived from `min_decibel`; anything at or below it is silence.
//!
//! The scan is a single left-to-right pass:
//!
//! - Silence after a run is counted but not yet added to it.
//! - When sound resumes, a gap longer than `max_silence_ms` closes the pending
//!   run (a boundary). A shorter gap is folded into the run, so brief dips
//!   inside one note do not split it, and the run keeps its peak.
//! - A run is only reported if it is longer than `min_length_ms`.
//! - Each contiguous active region is walked with an ascend/descend
//!   hill-climb, recording every local maximum it reaches, which finds the
//!   region peak without revisiting samples.
//!
//! Cancellation is checked once per boundary, never per sample.
//!
//! ```rust
//! use timbral_analysis::onset::segment_with_threshold;
//! use timbral_core::CancelToken;
//!
//! let samples = [0.0, 0.0, 0.5, 0.6, 0.5, 0.0, 0.0, 0.0, 0.0, 0.4, 0.5, 0.0, 0.0];
//! let segments = segment_with_threshold(&samples, 10, 0.2, 0, 1000, &CancelToken::new()).unwrap();
//! assert_eq!(segments.len(), 1);
//! assert_eq!(segments[0].start_sample, 2);
//! assert_eq!(segments[0].length_samples, 9);
//! ```

use timbral_core::{CancelToken, Cancelled, db_to_linear, ms_to_samples, samples_to_ms};

/// One detected run of audible material. Pitch is not resolved yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Index of the first active sample.
    pub start_sample: usize,
    /// Run length in samples, bridged gaps included, trailing silence excluded.
    pub length_samples: usize,
    /// Start time in milliseconds.
    pub start_ms: u32,
    /// Length in milliseconds.
    pub length_ms: u32,
    /// Peak absolute sample value (linear PCM units).
    pub amplitude: f32,
}

/// Threshold-based onset/offset detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnsetSegmenter {
    /// Activity threshold in dBFS.
    pub min_decibel: f32,
    /// Runs must be longer than this to be reported.
    pub min_length_ms: u32,
    /// Longest gap that is bridged instead of splitting the run.
    pub max_silence_ms: u32,
}

impl Default for OnsetSegmenter {
    fn default() -> Self {
        Self {
            min_decibel: -40.0,
            min_length_ms: 50,
            max_silence_ms: 100,
        }
    }
}

impl OnsetSegmenter {
    /// Create a segmenter.
    pub fn new(min_decibel: f32, min_length_ms: u32, max_silence_ms: u32) -> Self {
        Self {
            min_decibel,
            min_length_ms,
            max_silence_ms,
        }
    }

    /// Segment `samples` recorded at `sample_rate` (frames/s × channels).
    pub fn segment(
        &self,
        samples: &[f32],
        sample_rate: u32,
        cancel: &CancelToken,
    ) -> Result<Vec<Segment>, Cancelled> {
        segment(
            samples,
            sample_rate,
            self.min_decibel,
            self.min_length_ms,
            self.max_silence_ms,
            cancel,
        )
    }
}

/// Segment a buffer using a threshold in dBFS.
pub fn segment(
    samples: &[f32],
    sample_rate: u32,
    min_decibel: f32,
    min_length_ms: u32,
    max_silence_ms: u32,
    cancel: &CancelToken,
) -> Result<Vec<Segment>, Cancelled> {
    segment_with_threshold(
        samples,
        sample_rate,
        db_to_linear(min_decibel),
        min_length_ms,
        max_silence_ms,
        cancel,
    )
}

/// Run under construction.
struct Run {
    start: usize,
    len: usize,
    silence: usize,
    peak: f32,
}

impl Run {
    fn at(start: usize) -> Self {
        Self {
            start,
            len: 0,
            silence: 0,
            peak: 0.0,
        }
    }
}

/// Segment a buffer using a linear amplitude threshold.
pub fn segment_with_threshold(
    samples: &[f32],
    sample_rate: u32,
    threshold: f32,
    min_length_ms: u32,
    max_silence_ms: u32,
    cancel: &CancelToken,
) -> Result<Vec<Segment>, Cancelled> {
    let max_silence = ms_to_samples(max_silence_ms, sample_rate);
    let min_length = ms_to_samples(min_length_ms, sample_rate);
    let n = samples.len();

    let mut segments = Vec::new();
    let mut pending: Option<Run> = None;
    let mut i = 0;

    while i < n {
        if samples[i].abs() <= threshold {
            if let Some(run) = pending.as_mut() {
                run.silence += 1;
            }
            i += 1;
            continue;
        }

        let mut run = match pending.take() {
            Some(prev) if prev.silence > max_silence => {
                flush(&prev, min_length, sample_rate, &mut segments, cancel)?;
                Run::at(i)
            }
            Some(mut prev) => {
                prev.len += prev.silence;
                prev.silence = 0;
                prev
            }
            None => Run::at(i),
        };

        let (end, peak) = climb_region(samples, i, threshold);
        run.len += end - i;
        run.peak = run.peak.max(peak);
        pending = Some(run);
        i = end;
    }

    if let Some(run) = pending {
        flush(&run, min_length, sample_rate, &mut segments, cancel)?;
    }

    tracing::debug!(
        samples = n,
        segments = segments.len(),
        threshold,
        "segmentation complete"
    );
    Ok(segments)
}

/// Walk the active region starting at `from`, returning its end (exclusive)
/// and its peak magnitude.
///
/// Each iteration climbs while magnitude rises, records the summit, then
/// descends while it falls; the next iteration starts the following ascent.
fn climb_region(samples: &[f32], from: usize, threshold: f32) -> (usize, f32) {
    let n = samples.len();
    let active = |k: usize| k < n && samples[k].abs() > threshold;

    let mut j = from;
    let mut peak = 0.0_f32;
    while active(j) {
        while active(j + 1) && samples[j + 1].abs() >= samples[j].abs() {
            j += 1;
        }
        peak = peak.max(samples[j].abs());
        while active(j + 1) && samples[j + 1].abs() < samples[j].abs() {
            j += 1;
        }
        j += 1;
    }
    (j, peak)
}

fn flush(
    run: &Run,
    min_length: usize,
    sample_rate: u32,
    segments: &mut Vec<Segment>,
    cancel: &CancelToken,
) -> Result<(), Cancelled> {
    cancel.check()?;
    if run.len <= min_length {
        tracing::trace!(start = run.start, len = run.len, "run too short, dropped");
        return Ok(());
    }
    tracing::trace!(
        start = run.start,
        len = run.len,
        peak = run.peak,
        "segment boundary"
    );
    segments.push(Segment {
        start_sample: run.start,
        length_samples: run.len,
        start_ms: samples_to_ms(run.start, sample_rate),
        length_ms: samples_to_ms(run.len, sample_rate),
        amplitude: run.peak,
    });
    Ok(())
}
