//! Digest throughput benchmarks

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use loader_core::digest::{digest_bytes, digest_reader};
use std::hint::black_box;

fn benchmark_streaming_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("loader_digest");

    for size in [4 * 1024, 64 * 1024, 1024 * 1024, 8 * 1024 * 1024].iter() {
        let data = vec![0x5au8; *size];
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("streaming", size), &data, |b, data| {
            b.iter(|| black_box(digest_reader(&data[..]).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("one_shot", size), &data, |b, data| {
            b.iter(|| black_box(digest_bytes(data)));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_streaming_digest);
criterion_main!(benches);
