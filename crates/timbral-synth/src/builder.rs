//! Instrument building from a transcribed recording.

use std::collections::BTreeMap;

use timbral_analysis::FeatureExtractor;
use timbral_core::{
    CancelToken, Cancelled, Melody, Progress, SampleBuffer, TimedEvent, note_to_frequency,
};

use crate::instrument::Instrument;
use crate::model::NoteModel;

/// Builds one [`NoteModel`] per recorded pitch.
#[derive(Debug, Clone, Default)]
pub struct InstrumentBuilder {
    extractor: FeatureExtractor,
}

impl InstrumentBuilder {
    /// Create a builder using `extractor` for note analysis.
    pub fn new(extractor: FeatureExtractor) -> Self {
        Self { extractor }
    }

    /// Build an instrument from `buffer` and the melody transcribed from it.
    ///
    /// For every pitch the loudest event is analysed (the earliest wins a
    /// tie); events whose span falls outside the buffer are skipped. Progress
    /// advances one step per distinct pitch.
    pub fn build(
        &self,
        buffer: &SampleBuffer,
        melody: &Melody,
        progress: &mut Progress<'_>,
        cancel: &CancelToken,
    ) -> Result<Instrument, Cancelled> {
        let mut loudest: BTreeMap<i32, &TimedEvent> = BTreeMap::new();
        for event in melody.events() {
            loudest
                .entry(event.note_number)
                .and_modify(|best| {
                    if event.amplitude > best.amplitude {
                        *best = event;
                    }
                })
                .or_insert(event);
        }

        let mut instrument = Instrument::new();
        let mut scope = progress.scope(1.0, loudest.len());
        for (&note, event) in &loudest {
            cancel.check()?;
            let samples = buffer.slice_ms(event.start_ms, event.length_ms);
            if samples.is_empty() {
                tracing::debug!(note, start_ms = event.start_ms, "event outside recording, skipped");
                scope.step();
                continue;
            }

            let features = self.extractor.extract(
                samples,
                buffer.sample_rate(),
                note_to_frequency(note),
                cancel,
            )?;
            let model = NoteModel::from_features(&features, event.length_ms);
            tracing::debug!(
                note,
                length_ms = model.length_ms,
                partials = features.partials.len(),
                "note model built"
            );
            instrument.replace_note(note, model);
            scope.step();
        }

        Ok(instrument)
    }
}
