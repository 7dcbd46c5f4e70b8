//! Criterion benchmarks for timbral-analysis components
//!
//! Run with: cargo bench -p timbral-analysis

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::f32::consts::PI;
use std::hint::black_box;
use timbral_analysis::{
    FeatureExtractor, OnsetSegmenter, PitchEstimator, SpectralPitchEstimator, Window,
};
use timbral_core::CancelToken;

const SAMPLE_RATE: u32 = 44100;

/// Notes of `note_len` samples separated by equal silence.
fn generate_phrase(notes: usize, note_len: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(notes * note_len * 2);
    for n in 0..notes {
        let freq = 110.0 * (1.0 + n as f32 * 0.25);
        out.extend(
            (0..note_len).map(|i| 0.5 * (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin()),
        );
        out.extend(std::iter::repeat_n(0.0, note_len));
    }
    out
}

fn generate_tone(size: usize, frequency: f32) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            (2.0 * PI * frequency * t).sin() + 0.5 * (4.0 * PI * frequency * t).sin()
        })
        .collect()
}

// ============================================================================
// Segmentation
// ============================================================================

fn bench_segment(c: &mut Criterion) {
    let mut group = c.benchmark_group("Segment");
    let segmenter = OnsetSegmenter::default();
    let token = CancelToken::new();

    for &notes in &[4, 16, 64] {
        let samples = generate_phrase(notes, 11025);
        group.bench_with_input(BenchmarkId::from_parameter(notes), &notes, |b, _| {
            b.iter(|| {
                let segs = segmenter.segment(black_box(&samples), SAMPLE_RATE, &token);
                black_box(segs)
            })
        });
    }

    group.finish();
}

// ============================================================================
// Pitch estimation
// ============================================================================

fn bench_pitch(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pitch");
    let token = CancelToken::new();

    for &frame in &[1024, 2048, 4096] {
        let estimator = SpectralPitchEstimator::new(frame, 40.0, 2000.0);
        let samples = generate_tone(SAMPLE_RATE as usize / 2, 220.0);
        group.bench_with_input(BenchmarkId::from_parameter(frame), &frame, |b, _| {
            b.iter(|| {
                let f = estimator.estimate_fundamental_frequency(
                    black_box(&samples),
                    SAMPLE_RATE as f32,
                    -60.0,
                    Window::Hann,
                    &token,
                );
                black_box(f)
            })
        });
    }

    group.finish();
}

fn bench_features(c: &mut Criterion) {
    let extractor = FeatureExtractor::default();
    let token = CancelToken::new();
    let samples = generate_tone(SAMPLE_RATE as usize / 2, 220.0);

    c.bench_function("Features_500ms", |b| {
        b.iter(|| {
            let features = extractor.extract(black_box(&samples), SAMPLE_RATE, 220.0, &token);
            black_box(features)
        })
    });
}

criterion_group!(benches, bench_segment, bench_pitch, bench_features);
criterion_main!(benches);
