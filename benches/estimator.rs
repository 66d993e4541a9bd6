//! Benchmark for the pulse analysis hot path.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use optical_pulse::estimator::PulseAnalyzer;
use std::f64::consts::TAU;

fn pulse_window(bpm: f64, rate: f64, len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64 / rate;
            let phase = TAU * bpm / 60.0 * t;
            0.45 + 0.05 * (phase.sin() + 0.3 * (2.0 * phase).sin())
        })
        .collect()
}

fn bench_analyze(c: &mut Criterion) {
    let analyzer = PulseAnalyzer::new(40.0, 200.0, 0.25);
    let window = pulse_window(72.0, 60.0, 256);

    c.bench_function("pulse_analyze_256", |b| {
        b.iter(|| analyzer.analyze(black_box(&window), black_box(60.0)))
    });

    let long_window = pulse_window(72.0, 60.0, 1024);
    c.bench_function("pulse_analyze_1024", |b| {
        b.iter(|| analyzer.analyze(black_box(&long_window), black_box(60.0)))
    });
}

criterion_group!(benches, bench_analyze);
criterion_main!(benches);
