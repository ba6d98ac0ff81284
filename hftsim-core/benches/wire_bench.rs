//! Benchmark: Wire Codec
//!
//! Measures encode/decode of one 64-byte datagram and the byte-order
//! swaps on an in-memory message.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hftsim_core::core::wire;
use hftsim_core::testing::add_order;

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("wire");
    group.significance_level(0.01).sample_size(1000);

    let msg = add_order("AAPL", 150.25, 100, 12_345);
    let payload = wire::encode(&msg);

    group.bench_function("encode", |b| b.iter(|| wire::encode(black_box(&msg))));
    group.bench_function("decode", |b| b.iter(|| wire::decode(black_box(&payload[..]))));
    group.bench_function("decode_wrong_size", |b| {
        b.iter(|| wire::decode(black_box(&payload[..63])))
    });
    group.bench_function("network_order_roundtrip", |b| {
        b.iter(|| black_box(msg).to_network_order().to_host_order())
    });

    group.finish();
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
