//! Benchmarks for the conversion pipeline stages
//!
//! Run with: cargo bench -p satlink-core --bench pipeline_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use satlink_core::filters::{BlockFilter, MovingAverage, ZeroPhaseButterworth};
use satlink_core::prelude::*;
use satlink_core::{PwmEncoder, Quantizer, SignalSource, TimeGrid, WaveformConfig};
use std::time::Duration;

const SAMPLE_RATE: f64 = 100_000.0;

fn reference_pwm(n: usize) -> Vec<f64> {
    (0..n).map(|i| if i % 20 < 10 { 1.0 } else { 0.0 }).collect()
}

// ============================================================================
// Stage Benchmarks
// ============================================================================

fn bench_quantizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantizer");

    let grid = TimeGrid::new(SAMPLE_RATE, 0.1).unwrap();
    let analog = SignalSource::new(WaveformConfig::default())
        .unwrap()
        .generate(grid.times());
    group.throughput(Throughput::Elements(analog.len() as u64));

    for bits in [8u8, 12, 16] {
        let adc = Quantizer::new(bits, 5.0).unwrap();
        group.bench_with_input(BenchmarkId::new("quantize", bits), &bits, |b, _| {
            b.iter(|| adc.quantize(black_box(&analog)))
        });
    }

    group.finish();
}

fn bench_pwm_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("pwm_encode");

    for duration in [0.01, 0.1, 1.0] {
        let grid = TimeGrid::new(SAMPLE_RATE, duration).unwrap();
        let codes: Vec<u16> = (0..grid.len()).map(|i| (i % 256) as u16).collect();
        let encoder = PwmEncoder::new(5000.0, 255).unwrap();
        group.throughput(Throughput::Elements(grid.len() as u64));

        group.bench_with_input(BenchmarkId::new("sequential", grid.len()), &grid, |b, g| {
            b.iter(|| encoder.encode(black_box(g.times()), black_box(&codes)))
        });

        #[cfg(feature = "parallel")]
        group.bench_with_input(BenchmarkId::new("parallel", grid.len()), &grid, |b, g| {
            b.iter(|| satlink_core::parallel::encode_pwm_parallel(&encoder, black_box(g.times()), black_box(&codes)))
        });
    }

    group.finish();
}

fn bench_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruction_filter");
    let pwm = reference_pwm(10_000);
    group.throughput(Throughput::Elements(pwm.len() as u64));

    for cutoff in [20_000.0, 2_500.0, 250.0] {
        let ma = MovingAverage::for_cutoff(cutoff, SAMPLE_RATE).unwrap();
        group.bench_with_input(BenchmarkId::new("moving_average", cutoff as u64), &cutoff, |b, _| {
            b.iter(|| ma.apply(black_box(&pwm)))
        });
    }

    for order in [2usize, 4, 8] {
        let bw = ZeroPhaseButterworth::new(order, 2_500.0, SAMPLE_RATE).unwrap();
        group.bench_with_input(BenchmarkId::new("butterworth", order), &order, |b, _| {
            b.iter(|| bw.apply(black_box(&pwm)))
        });
    }

    group.finish();
}

// ============================================================================
// End-to-End Benchmarks
// ============================================================================

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.measurement_time(Duration::from_secs(5));

    for kind in [FilterKind::MovingAverage, FilterKind::Butterworth] {
        let config = PipelineConfig::builder().filter(kind).cutoff(2_500.0).build();
        let pipeline = Pipeline::new(&config).unwrap();
        group.throughput(Throughput::Elements(pipeline.grid().len() as u64));

        group.bench_function(BenchmarkId::new("run", kind), |b| b.iter(|| pipeline.run()));
    }

    group.finish();
}

criterion_group!(benches, bench_quantizer, bench_pwm_encode, bench_filters, bench_pipeline);
criterion_main!(benches);
