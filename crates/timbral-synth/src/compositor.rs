//! Melody rendering.
//!
//! [`Compositor::render`] turns a melody and an instrument into one sample
//! buffer in two passes:
//!
//! 1. **Per pitch** - every distinct note number in the window is synthesized
//!    once with [`note_at`] and rendered once at the model's own length.
//! 2. **Per event** - events are mixed in ascending start order. Each event
//!    reuses its pitch's rendering, scaled so its peak sits at
//!    `ceiling − headroom` dB times the event amplitude, cut at the window end
//!    (and at the nominal note-off when sustain is disabled) and faded out
//!    over the last few milliseconds.
//!
//! Each pitch draws phases from [`PhaseRng::for_note`], so identical requests
//! produce bit-identical buffers.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use timbral_core::{
    CancelToken, Cancelled, Melody, PhaseRng, Progress, SampleBuffer, TimedEvent, db_to_linear,
    linear_to_db, ms_to_samples,
};

use crate::instrument::Instrument;
use crate::note_synth::note_at;

/// Fractional `[start, end)` slice of a melody's length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    /// Start as a fraction of the melody length.
    pub start: f32,
    /// End as a fraction of the melody length.
    pub end: f32,
}

impl TimeWindow {
    /// The whole melody.
    pub const FULL: Self = Self {
        start: 0.0,
        end: 1.0,
    };

    /// Create a window. Fractions are clamped to [0, 1] when applied.
    pub fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Window bounds in milliseconds for a melody of `length_ms`.
    pub fn to_ms(&self, length_ms: u32) -> (u32, u32) {
        let at = |f: f32| (f.clamp(0.0, 1.0) * length_ms as f32).round() as u32;
        (at(self.start), at(self.end))
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::FULL
    }
}

/// What to render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    /// Part of the melody to render.
    pub window: TimeWindow,
    /// Output sample rate.
    pub sample_rate: u32,
    /// Let notes ring past their nominal length.
    pub enable_sustain: bool,
    /// Seed for sub-model phases.
    pub seed: u64,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            window: TimeWindow::FULL,
            sample_rate: 44100,
            enable_sustain: true,
            seed: 0,
        }
    }
}

/// Loudness and progress settings shared by every render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositorSettings {
    /// Global peak ceiling (linear).
    pub ceiling: f32,
    /// Margin below the ceiling for a full-amplitude event, in dB.
    pub headroom_db: f32,
    /// Tail fade length in milliseconds.
    pub fade_ms: u32,
    /// Share of progress given to the per-pitch pass.
    pub pass_split: f32,
}

impl Default for CompositorSettings {
    fn default() -> Self {
        Self {
            ceiling: 1.0,
            headroom_db: 6.0,
            fade_ms: 10,
            pass_split: 0.8,
        }
    }
}

/// Two-pass melody renderer.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    settings: CompositorSettings,
}

impl Compositor {
    /// Create a compositor.
    pub fn new(settings: CompositorSettings) -> Self {
        Self { settings }
    }

    /// Current settings.
    pub fn settings(&self) -> &CompositorSettings {
        &self.settings
    }

    /// Peak a full-amplitude event is scaled to.
    pub fn target_peak(&self) -> f32 {
        db_to_linear(linear_to_db(self.settings.ceiling) - self.settings.headroom_db)
    }

    /// Render the events of `melody` that overlap `request.window`.
    ///
    /// The output holds exactly the window's samples. Cancellation is polled
    /// once per pitch and once per event; a cancelled render returns
    /// `Err(Cancelled)` and drops the partial buffer.
    pub fn render(
        &self,
        melody: &Melody,
        instrument: &Instrument,
        request: &RenderRequest,
        progress: &mut Progress<'_>,
        cancel: &CancelToken,
    ) -> Result<SampleBuffer, Cancelled> {
        let sr = request.sample_rate;
        let (start_ms, end_ms) = request.window.to_ms(melody.length_ms());
        let window_start = ms_to_samples(start_ms, sr);
        let window_end = ms_to_samples(end_ms, sr);
        let mut output = SampleBuffer::silent(window_end.saturating_sub(window_start), sr);

        let events: Vec<&TimedEvent> = melody
            .events()
            .iter()
            .filter(|e| start_ms < end_ms && e.overlaps(start_ms, end_ms))
            .collect();
        let pitches: BTreeSet<i32> = events.iter().map(|e| e.note_number).collect();

        tracing::debug!(
            start_ms,
            end_ms,
            events = events.len(),
            pitches = pitches.len(),
            "render started"
        );

        // Pass 1: one rendering per pitch
        let timer = Instant::now();
        let mut cache: BTreeMap<i32, Vec<f32>> = BTreeMap::new();
        {
            let mut scope = progress.scope(self.settings.pass_split, pitches.len());
            for &note in &pitches {
                cancel.check()?;
                if let Some(model) = note_at(instrument, note, cancel)? {
                    let mut rng = PhaseRng::for_note(request.seed, note);
                    cache.insert(note, model.render(sr, &mut rng, cancel)?);
                }
                scope.step();
            }
        }
        tracing::debug!(
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "per-pitch pass done"
        );

        // Pass 2: mix events in start order
        let timer = Instant::now();
        let target_peak = self.target_peak();
        let fade_len = ms_to_samples(self.settings.fade_ms, sr);
        {
            let mut scope = progress.scope(1.0 - self.settings.pass_split, events.len());
            for event in &events {
                cancel.check()?;
                if let Some(rendering) = cache.get(&event.note_number) {
                    self.mix_event(
                        event,
                        rendering,
                        target_peak,
                        fade_len,
                        window_start,
                        window_end,
                        request,
                        output.samples_mut(),
                    );
                }
                scope.step();
            }
        }
        tracing::debug!(
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "compositing pass done"
        );

        Ok(output)
    }

    fn mix_event(
        &self,
        event: &TimedEvent,
        rendering: &[f32],
        target_peak: f32,
        fade_len: usize,
        window_start: usize,
        window_end: usize,
        request: &RenderRequest,
        out: &mut [f32],
    ) {
        let peak = rendering.iter().fold(0.0_f32, |m, x| m.max(x.abs()));
        if peak <= 0.0 {
            return;
        }
        let gain = target_peak * event.amplitude / peak;

        let sr = request.sample_rate;
        let start = ms_to_samples(event.start_ms, sr);
        let mut end = (start + rendering.len()).min(window_end);
        if !request.enable_sustain {
            end = end.min(start + ms_to_samples(event.length_ms, sr));
        }
        if end <= start {
            return;
        }
        let fade = fade_len.min(end - start);

        for n in start.max(window_start)..end {
            let remaining = end - n;
            let env = if remaining <= fade {
                (remaining - 1) as f32 / fade as f32
            } else {
                1.0
            };
            out[n - window_start] += rendering[n - start] * gain * env;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NoteModel, TransientModel};

    /// A note that renders as a constant `level` for `length_ms`.
    fn constant_note(level: f32, length_ms: u32, sample_rate: u32) -> NoteModel {
        let len = ms_to_samples(length_ms, sample_rate);
        NoteModel {
            length_ms,
            transient: Some(TransientModel::new(vec![level; len], sample_rate)),
            ..NoteModel::default()
        }
    }

    fn request(sample_rate: u32, sustain: bool) -> RenderRequest {
        RenderRequest {
            sample_rate,
            enable_sustain: sustain,
            ..RenderRequest::default()
        }
    }

    fn no_fade() -> Compositor {
        Compositor::new(CompositorSettings {
            headroom_db: 0.0,
            fade_ms: 0,
            ..CompositorSettings::default()
        })
    }

    #[test]
    fn window_to_ms() {
        assert_eq!(TimeWindow::new(0.25, 0.5).to_ms(1000), (250, 500));
        assert_eq!(TimeWindow::new(-1.0, 2.0).to_ms(1000), (0, 1000));
    }

    #[test]
    fn scales_to_target_peak() {
        let mut inst = Instrument::new();
        inst.add_note(60, constant_note(0.25, 100, 1000)).unwrap();
        let melody = Melody::new(vec![TimedEvent::new(60, 0.5, 0, 100)], 200);

        let out = Compositor::default()
            .render(&melody, &inst, &request(1000, true), &mut Progress::new(), &CancelToken::new())
            .unwrap();
        assert_eq!(out.len(), 200);
        // 0 dB ceiling minus 6 dB headroom, times 0.5
        let expected = db_to_linear(-6.0) * 0.5;
        assert!((out.samples()[10] - expected).abs() < 1e-6);
        assert_eq!(out.samples()[150], 0.0);
    }

    #[test]
    fn fade_reaches_zero_at_audible_end() {
        let mut inst = Instrument::new();
        inst.add_note(60, constant_note(1.0, 100, 1000)).unwrap();
        let melody = Melody::new(vec![TimedEvent::new(60, 1.0, 0, 100)], 100);
        let compositor = Compositor::new(CompositorSettings {
            headroom_db: 0.0,
            fade_ms: 10,
            ..CompositorSettings::default()
        });
        let out = compositor
            .render(&melody, &inst, &request(1000, true), &mut Progress::new(), &CancelToken::new())
            .unwrap();
        let s = out.samples();
        assert_eq!(s[89], 1.0);
        assert!((s[90] - 0.9).abs() < 1e-6);
        assert_eq!(s[99], 0.0);
    }

    #[test]
    fn sustain_controls_tail() {
        let mut inst = Instrument::new();
        inst.add_note(60, constant_note(1.0, 300, 1000)).unwrap();
        let melody = Melody::new(vec![TimedEvent::new(60, 1.0, 100, 50)], 1000);

        let held = no_fade()
            .render(&melody, &inst, &request(1000, true), &mut Progress::new(), &CancelToken::new())
            .unwrap();
        let cut = no_fade()
            .render(&melody, &inst, &request(1000, false), &mut Progress::new(), &CancelToken::new())
            .unwrap();

        assert_eq!(held.samples()[349], 1.0);
        assert_eq!(held.samples()[400], 0.0);
        assert_eq!(cut.samples()[149], 1.0);
        assert_eq!(cut.samples()[150], 0.0);
    }

    #[test]
    fn window_clips_events() {
        let mut inst = Instrument::new();
        inst.add_note(60, constant_note(1.0, 400, 1000)).unwrap();
        let melody = Melody::new(
            vec![
                TimedEvent::new(60, 1.0, 100, 400),
                TimedEvent::new(60, 1.0, 900, 100),
            ],
            1000,
        );
        let req = RenderRequest {
            window: TimeWindow::new(0.2, 0.4),
            ..request(1000, true)
        };
        let out = no_fade()
            .render(&melody, &inst, &req, &mut Progress::new(), &CancelToken::new())
            .unwrap();
        assert_eq!(out.len(), 200);
        assert!(out.samples().iter().all(|&x| x == 1.0));
    }

    #[test]
    fn inverted_window_is_empty() {
        let mut inst = Instrument::new();
        inst.add_note(60, constant_note(1.0, 100, 1000)).unwrap();
        let melody = Melody::new(vec![TimedEvent::new(60, 1.0, 0, 100)], 100);
        let req = RenderRequest {
            window: TimeWindow::new(0.8, 0.2),
            ..request(1000, true)
        };
        let out = no_fade()
            .render(&melody, &inst, &req, &mut Progress::new(), &CancelToken::new())
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn overlapping_events_add() {
        let mut inst = Instrument::new();
        inst.add_note(60, constant_note(1.0, 100, 1000)).unwrap();
        let melody = Melody::new(
            vec![
                TimedEvent::new(60, 0.5, 0, 100),
                TimedEvent::new(60, 0.25, 50, 100),
            ],
            200,
        );
        let out = no_fade()
            .render(&melody, &inst, &request(1000, true), &mut Progress::new(), &CancelToken::new())
            .unwrap();
        assert_eq!(out.samples()[25], 0.5);
        assert_eq!(out.samples()[75], 0.75);
        assert_eq!(out.samples()[125], 0.25);
    }
}
