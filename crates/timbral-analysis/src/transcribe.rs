//! Recording → melody transcription.
//!
//! Segments a buffer, estimates the fundamental of each segment and converts
//! it to a note number. Segments with no detectable pitch are dropped.

use timbral_core::{
    CancelToken, Cancelled, Melody, SampleBuffer, TimedEvent, note_from_frequency,
};

use crate::fft::Window;
use crate::onset::OnsetSegmenter;
use crate::pitch::PitchEstimator;

/// Turn a recording into a melody.
///
/// The melody length equals the buffer length, so re-rendering the melody
/// reproduces the recording's timeline.
pub fn transcribe(
    buffer: &SampleBuffer,
    segmenter: &OnsetSegmenter,
    estimator: &dyn PitchEstimator,
    window: Window,
    cancel: &CancelToken,
) -> Result<Melody, Cancelled> {
    let sample_rate = buffer.sample_rate();
    let samples = buffer.samples();
    let segments = segmenter.segment(samples, sample_rate, cancel)?;

    let mut events = Vec::with_capacity(segments.len());
    for seg in &segments {
        let range = &samples[seg.start_sample..seg.start_sample + seg.length_samples];
        let Some(frequency) = estimator.estimate_fundamental_frequency(
            range,
            sample_rate as f32,
            segmenter.min_decibel,
            window,
            cancel,
        )?
        else {
            tracing::debug!(start_ms = seg.start_ms, "segment has no pitch, skipped");
            continue;
        };

        let note = note_from_frequency(frequency);
        tracing::debug!(
            start_ms = seg.start_ms,
            length_ms = seg.length_ms,
            frequency,
            note,
            "event transcribed"
        );
        events.push(TimedEvent::new(
            note,
            seg.amplitude,
            seg.start_ms,
            seg.length_ms,
        ));
    }

    Ok(Melody::new(events, buffer.length_ms()))
}
