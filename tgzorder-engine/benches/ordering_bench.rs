//! Benchmarks for the scorer and both orderers.
//!
//! - Scorer throughput on a half window and a full window
//! - Greedy chain construction as the entry count grows
//! - Exhaustive search on small sets with the real codec

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tgzorder_archive::{TarEntry, TarGzCodec, TarHeader};
use tgzorder_engine::entry::{Entry, load_entries};
use tgzorder_engine::{HALF_WINDOW, OptimizeOptions, WINDOW_SIZE, exhaustive, scorer, window};

mod test_data {
    /// Reproducible noise.
    pub fn random(size: usize, mut seed: u64) -> Vec<u8> {
        (0..size)
            .map(|_| {
                seed ^= seed << 13;
                seed ^= seed >> 7;
                seed ^= seed << 17;
                (seed >> 24) as u8
            })
            .collect()
    }

    /// Word soup with a per-file vocabulary offset.
    pub fn text_like(size: usize, seed: u64) -> Vec<u8> {
        let words: &[&[u8]] = &[
            b"archive", b"entry", b"window", b"header", b"content", b"chain", b"order", b"tail",
            b"head", b"score", b"digest", b"block",
        ];
        let mut data = Vec::with_capacity(size);
        let mut state = seed.wrapping_mul(0x9E3779B97F4A7C15) | 1;
        while data.len() < size {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            data.extend_from_slice(words[(state % words.len() as u64) as usize]);
            data.push(b' ');
        }
        data.truncate(size);
        data
    }
}

fn fixture(count: usize, size: usize) -> Vec<Entry> {
    let decoded = (0..count)
        .map(|i| {
            let data = if i % 2 == 0 {
                test_data::text_like(size, i as u64 / 2)
            } else {
                test_data::random(size, i as u64)
            };
            TarEntry::new(TarHeader::new_file(&format!("f{:03}", i), 0, 0o644), data)
        })
        .collect();
    load_entries(decoded).unwrap()
}

fn bench_scorer(c: &mut Criterion) {
    let mut group = c.benchmark_group("scorer");

    for (name, size) in [("half_window", HALF_WINDOW), ("window", WINDOW_SIZE)] {
        for (kind, data) in [
            ("text", test_data::text_like(size, 1)),
            ("random", test_data::random(size, 1)),
        ] {
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(
                BenchmarkId::new(kind, name),
                &data,
                |b, data| b.iter(|| black_box(scorer::score(black_box(data)))),
            );
        }
    }

    group.finish();
}

fn bench_window_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_chain");
    group.sample_size(10);

    for count in [4, 8, 16] {
        let entries = fixture(count, 8 * 1024);
        let refs: Vec<&Entry> = entries.iter().collect();

        group.bench_with_input(BenchmarkId::new("parallel", count), &refs, |b, refs| {
            b.iter(|| black_box(window::build_chain(refs, true)))
        });
        group.bench_with_input(BenchmarkId::new("sequential", count), &refs, |b, refs| {
            b.iter(|| black_box(window::build_chain(refs, false)))
        });
    }

    group.finish();
}

fn bench_exhaustive(c: &mut Criterion) {
    let mut group = c.benchmark_group("exhaustive");
    group.sample_size(10);
    let codec = TarGzCodec::default();
    let options = OptimizeOptions::default();

    for count in [3, 4, 5] {
        let entries = fixture(count, 2 * 1024);
        let refs: Vec<&Entry> = entries.iter().collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), &refs, |b, refs| {
            b.iter(|| {
                let result = exhaustive::search(refs, &[], &codec, &options).unwrap();
                black_box(result.compressed_size)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scorer, bench_window_chain, bench_exhaustive);
criterion_main!(benches);
