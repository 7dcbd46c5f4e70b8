//! Criterion benchmarks for timbral-synth components
//!
//! Run with: cargo bench -p timbral-synth

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use timbral_core::{CancelToken, Melody, PhaseRng, Progress, TimedEvent, note_to_frequency};
use timbral_synth::{
    Compositor, Instrument, NoiseModel, NoteModel, Partial, RenderRequest, SinusoidModel,
    TransientModel, note_at,
};

const SAMPLE_RATE: u32 = 44100;

fn recorded_note(note: i32, partials: usize) -> NoteModel {
    let f0 = note_to_frequency(note);
    let envelope: Vec<f32> = (0..100).map(|i| 0.5 * (-(i as f32) / 30.0).exp()).collect();
    NoteModel {
        length_ms: 1000,
        sinusoid: Some(SinusoidModel::new(
            0.01,
            (1..=partials)
                .map(|h| Partial::new(f0 * h as f32, envelope.clone()))
                .collect(),
        )),
        transient: Some(TransientModel::new(vec![0.1; 1323], SAMPLE_RATE)),
        noise: Some(NoiseModel::new(
            SAMPLE_RATE as f32 / 2048.0,
            0.01,
            vec![vec![0.005; 1025]; 100],
        )),
    }
}

// ============================================================================
// Note synthesis
// ============================================================================

fn bench_note_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("NoteRender");
    let token = CancelToken::new();

    for &partials in &[4, 16, 32] {
        let model = recorded_note(57, partials);
        group.bench_with_input(BenchmarkId::from_parameter(partials), &partials, |b, _| {
            b.iter(|| {
                let out = model.render(SAMPLE_RATE, &mut PhaseRng::new(1), &token);
                black_box(out)
            })
        });
    }

    group.finish();
}

fn bench_note_at(c: &mut Criterion) {
    let mut instrument = Instrument::new();
    instrument.add_note(48, recorded_note(48, 16)).ok();
    instrument.add_note(60, recorded_note(60, 16)).ok();
    let token = CancelToken::new();

    c.bench_function("NoteAt_interpolated", |b| {
        b.iter(|| black_box(note_at(&instrument, black_box(54), &token)))
    });
}

// ============================================================================
// Compositing
// ============================================================================

fn bench_compositor(c: &mut Criterion) {
    let mut group = c.benchmark_group("Compositor");
    group.sample_size(10);

    let mut instrument = Instrument::new();
    for note in [48, 55, 60, 67] {
        instrument.add_note(note, recorded_note(note, 8)).ok();
    }
    let token = CancelToken::new();
    let request = RenderRequest {
        sample_rate: SAMPLE_RATE,
        ..RenderRequest::default()
    };

    for &events in &[8, 32] {
        let melody = Melody::new(
            (0..events)
                .map(|i| TimedEvent::new(48 + (i as i32 * 5) % 20, 0.7, i * 250, 250))
                .collect(),
            events * 250 + 1000,
        );
        group.bench_with_input(BenchmarkId::from_parameter(events), &events, |b, _| {
            b.iter(|| {
                let out = Compositor::default().render(
                    &melody,
                    &instrument,
                    &request,
                    &mut Progress::new(),
                    &token,
                );
                black_box(out)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_note_render, bench_note_at, bench_compositor);
criterion_main!(benches);
