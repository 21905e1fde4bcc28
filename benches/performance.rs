//! Performance benchmarks for the network speed tester
//!
//! The meter add is the hot path shared by every concurrent transfer job,
//! so it must stay a single cheap atomic operation; payload generation and
//! statistics reduction run once per job or per probe and only need to be
//! reasonable.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use network_speed_tester::latency::LatencyStats;
use network_speed_tester::payload::upload_payload;
use network_speed_tester::transfer::UPLOAD_SIZES_KB;
use network_speed_tester::types::Direction;
use network_speed_tester::RateMeter;
use std::sync::Arc;
use std::time::Duration;

fn bench_meter_add(c: &mut Criterion) {
    let meter = Arc::new(RateMeter::new());

    c.bench_function("meter_add_download_bytes", |b| {
        b.iter(|| meter.add_download_bytes(black_box(65_536)))
    });

    c.bench_function("meter_rate_read", |b| {
        meter.add_download_bytes(1_000_000);
        b.iter(|| black_box(meter.rate_mbps(Direction::Download)))
    });
}

fn bench_payload_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("upload_payload");
    for &size_kb in &[UPLOAD_SIZES_KB[0], UPLOAD_SIZES_KB[5], UPLOAD_SIZES_KB[9]] {
        group.bench_with_input(
            BenchmarkId::from_parameter(size_kb),
            &(size_kb * 1000),
            |b, &size| b.iter(|| upload_payload(black_box(size))),
        );
    }
    group.finish();
}

fn bench_latency_reduction(c: &mut Criterion) {
    let rtts: Vec<Duration> = (0..3)
        .map(|i| Duration::from_micros(25_000 + i * 5_000))
        .collect();

    c.bench_function("latency_stats_from_rtts", |b| {
        b.iter(|| LatencyStats::from_rtts(black_box(&rtts)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_meter_add,
    bench_payload_generation,
    bench_latency_reduction
);
criterion_main!(benches);
