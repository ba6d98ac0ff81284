//! Benchmark: SPSC Ring Buffer
//!
//! What's Measured:
//! - Single-thread push+pop pair (uncontended cost of the index handoff)
//! - Burst fill then drain at several capacities
//! - Cross-thread throughput with a dedicated producer thread
//!
//! Why This Matters:
//! The ring sits between the receive and strategy threads; every message
//! pays its cost twice.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hftsim_core::core::Message;
use hftsim_core::ring::SpscRingBuffer;
use hftsim_core::testing::add_order;
use std::thread;

fn bench_push_pop_pair(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring/push_pop");
    group.significance_level(0.01).sample_size(1000);

    let mut ring = SpscRingBuffer::<Message, 4096>::new();
    let msg = add_order("AAPL", 150.0, 100, 1);

    group.bench_function("message_64b", |b| {
        b.iter(|| {
            let _ = ring.try_push(black_box(msg));
            black_box(ring.try_pop())
        });
    });

    let mut small = SpscRingBuffer::<u64, 4096>::new();
    group.bench_function("u64", |b| {
        b.iter(|| {
            let _ = small.try_push(black_box(7));
            black_box(small.try_pop())
        });
    });

    group.finish();
}

fn fill_drain<const C: usize>(msg: Message) {
    let mut ring = SpscRingBuffer::<Message, C>::new();
    while ring.try_push(msg).is_ok() {}
    while let Some(m) = ring.try_pop() {
        black_box(m);
    }
}

fn bench_fill_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring/fill_drain");
    let msg = add_order("MSFT", 300.0, 25, 1);

    group.throughput(Throughput::Elements(1023));
    group.bench_with_input(BenchmarkId::new("capacity", 1024), &msg, |b, m| {
        b.iter(|| fill_drain::<1024>(*m))
    });

    group.throughput(Throughput::Elements(4095));
    group.bench_with_input(BenchmarkId::new("capacity", 4096), &msg, |b, m| {
        b.iter(|| fill_drain::<4096>(*m))
    });

    group.finish();
}

fn bench_cross_thread(c: &mut Criterion) {
    const BATCH: u64 = 100_000;

    let mut group = c.benchmark_group("ring/cross_thread");
    group.throughput(Throughput::Elements(BATCH));
    group.sample_size(20);

    group.bench_function("spsc_100k", |b| {
        b.iter(|| {
            let (mut producer, mut consumer) = SpscRingBuffer::<Message, 4096>::new().split();
            let writer = thread::spawn(move || {
                for seq in 0..BATCH {
                    let mut msg = add_order("AAPL", 150.0, 100, seq);
                    while let Err(back) = producer.try_push(msg) {
                        msg = back;
                        std::hint::spin_loop();
                    }
                }
            });

            let mut received = 0;
            while received < BATCH {
                if let Some(m) = consumer.try_pop() {
                    black_box(m);
                    received += 1;
                } else {
                    std::hint::spin_loop();
                }
            }
            let _ = writer.join();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_push_pop_pair, bench_fill_drain, bench_cross_thread);
criterion_main!(benches);
