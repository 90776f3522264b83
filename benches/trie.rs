//! Benchmarks for trie insertion and search.
//!
//! Hashes are uniform random bits. Real perceptual hashes cluster, which
//! makes nearest queries cheaper than measured here; range queries with a
//! small radius behave similarly in both cases.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glimpse::hash::ImageHash;
use glimpse::trie::BinaryTrie;
use rand::prelude::*;

// === Synthetic Data Generation ===

fn random_hashes(n: usize, bits: usize, seed: u64) -> Vec<ImageHash> {
    let mut rng = StdRng::seed_from_u64(seed);
    let words = (bits + 63) / 64;
    (0..n)
        .map(|_| {
            let raw: Vec<u64> = (0..words).map(|_| rng.gen()).collect();
            ImageHash::from_words(raw, bits, 0).unwrap()
        })
        .collect()
}

fn build(hashes: &[ImageHash]) -> BinaryTrie<usize> {
    let mut trie = BinaryTrie::new();
    for (i, h) in hashes.iter().enumerate() {
        trie.insert(h, i).unwrap();
    }
    trie
}

// === Benchmarks ===

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for n in [1_000usize, 10_000] {
        let hashes = random_hashes(n, 64, 42);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &hashes, |b, hashes| {
            b.iter(|| build(black_box(hashes)))
        });
    }

    group.finish();
}

fn bench_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_range_10k");
    let trie = build(&random_hashes(10_000, 64, 42));
    let queries = random_hashes(100, 64, 7);

    for radius in [0usize, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(radius), &radius, |b, &radius| {
            b.iter(|| {
                for q in &queries {
                    black_box(trie.query_range(q, radius).unwrap());
                }
            })
        });
    }

    group.finish();
}

fn bench_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_nearest");

    for bits in [64usize, 256] {
        let hashes = random_hashes(5_000, bits, 42);
        let trie = build(&hashes);
        // Perturbed copies of stored hashes, the near-duplicate case.
        let queries: Vec<ImageHash> = hashes
            .iter()
            .take(50)
            .map(|h| {
                let mut s = h.to_binary_string().into_bytes();
                for pos in [1, bits / 3, bits / 2] {
                    s[pos] = if s[pos] == b'1' { b'0' } else { b'1' };
                }
                let s = String::from_utf8(s).unwrap();
                ImageHash::from_binary_str(&s, 0).unwrap()
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(bits), &queries, |b, queries| {
            b.iter(|| {
                for q in queries {
                    black_box(trie.query_nearest(q).unwrap());
                }
            })
        });
    }

    group.finish();
}

#[cfg(feature = "fuzzy")]
fn bench_fuzzy_nearest(c: &mut Criterion) {
    use glimpse::hash::FuzzyHash;
    use glimpse::trie::FuzzyTrie;

    let hashes = random_hashes(3_000, 64, 42);
    let mut trie = FuzzyTrie::new();
    for group in hashes.chunks(3) {
        trie.insert(FuzzyHash::from_hashes(group).unwrap()).unwrap();
    }
    let queries = random_hashes(50, 64, 7);

    c.bench_function("fuzzy_query_nearest_1k", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(trie.query_nearest(q).unwrap());
            }
        })
    });
}

#[cfg(not(feature = "fuzzy"))]
fn bench_fuzzy_nearest(_c: &mut Criterion) {}

criterion_group!(benches, bench_insert, bench_range, bench_nearest, bench_fuzzy_nearest);
criterion_main!(benches);
