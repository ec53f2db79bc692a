// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use streamsync::{FrameRate, GridLayout, StreamId, SyncConfig, SyncEngine};

fn engine(streams: u32) -> SyncEngine<u64> {
    let mut config = SyncConfig::default();
    config.output.framerate = FrameRate::new(1, 1);
    config.time_base = 1;
    let mut engine = SyncEngine::new(&config, GridLayout).unwrap();
    for id in 0..streams {
        engine.admit(StreamId(id), 0).unwrap();
    }
    engine
}

// Benchmark: frames queued behind one gate stream, released in a single cycle
fn bench_burst_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("burst_release");
    const FRAMES: i64 = 256;

    for streams in [2u32, 8, 32].iter() {
        group.throughput(Throughput::Elements(FRAMES as u64 * *streams as u64));
        group.bench_with_input(BenchmarkId::from_parameter(streams), streams, |b, &streams| {
            b.iter_batched(
                || {
                    let mut engine = engine(streams + 1);
                    for pts in 0..FRAMES {
                        for id in 0..streams {
                            engine.push_frame(StreamId(id), pts as u64, pts).unwrap();
                        }
                    }
                    engine
                },
                |mut engine| {
                    let outputs = engine.retire(StreamId(streams)).unwrap();
                    black_box(outputs.len())
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

// Benchmark: lock-step pushes, one tick released per round
fn bench_lockstep(c: &mut Criterion) {
    let mut group = c.benchmark_group("lockstep");

    for streams in [2u32, 8, 32].iter() {
        group.throughput(Throughput::Elements(*streams as u64));
        group.bench_with_input(BenchmarkId::from_parameter(streams), streams, |b, &streams| {
            let mut engine = engine(streams);
            let mut pts = 0;
            b.iter(|| {
                for id in 0..streams {
                    black_box(engine.push_frame(StreamId(id), id as u64, pts).unwrap());
                }
                pts += 1;
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_burst_release, bench_lockstep);
criterion_main!(benches);
