//! Benchmarks for the feature-extraction algorithms.
//!
//! Input images are synthetic noise so every pixel takes part in the resize;
//! the cost is dominated by the resize for small hashes and by the per-bit
//! work (medians, DCT) for large ones.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glimpse::algorithm::{
    AverageHash, DifferenceHash, HashingAlgorithm, MedianBlockHash, OverlappingMedianHash,
    PerceptiveHash, Precision,
};
use image::{DynamicImage, Rgb, RgbImage};
use rand::prelude::*;

// === Synthetic Data Generation ===

fn noise_image(width: u32, height: u32, seed: u64) -> DynamicImage {
    let mut rng = StdRng::seed_from_u64(seed);
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
        Rgb([rng.gen(), rng.gen(), rng.gen()])
    }))
}

fn algorithms(resolution: usize) -> Vec<(&'static str, Box<dyn HashingAlgorithm>)> {
    vec![
        ("average", Box::new(AverageHash::new(resolution).unwrap())),
        (
            "difference",
            Box::new(DifferenceHash::new(resolution, Precision::Simple).unwrap()),
        ),
        (
            "difference_triple",
            Box::new(DifferenceHash::new(resolution, Precision::Triple).unwrap()),
        ),
        ("median", Box::new(MedianBlockHash::new(resolution).unwrap())),
        (
            "overlapping_median",
            Box::new(OverlappingMedianHash::new(resolution).unwrap()),
        ),
        ("perceptive", Box::new(PerceptiveHash::new(resolution).unwrap())),
    ]
}

// === Benchmarks ===

fn bench_algorithms(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_640x480");
    let img = noise_image(640, 480, 42);

    for (name, algorithm) in algorithms(64) {
        group.bench_function(name, |b| b.iter(|| algorithm.hash(black_box(&img))));
    }

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    let img = noise_image(640, 480, 7);

    for resolution in [64usize, 256, 1024] {
        let hasher = PerceptiveHash::new(resolution).unwrap();
        group.throughput(Throughput::Elements(hasher.key_resolution() as u64));
        group.bench_with_input(
            BenchmarkId::new("perceptive", resolution),
            &resolution,
            |b, _| b.iter(|| hasher.hash(black_box(&img))),
        );

        let median = MedianBlockHash::new(resolution).unwrap();
        group.bench_with_input(BenchmarkId::new("median", resolution), &resolution, |b, _| {
            b.iter(|| median.hash(black_box(&img)))
        });
    }

    group.finish();
}

#[cfg(feature = "parallel")]
fn bench_batch(c: &mut Criterion) {
    let images: Vec<DynamicImage> = (0..32).map(|seed| noise_image(320, 240, seed)).collect();
    let hasher = DifferenceHash::new(64, Precision::Double).unwrap();

    let mut group = c.benchmark_group("batch_32");
    group.throughput(Throughput::Elements(images.len() as u64));
    group.bench_function("sequential", |b| {
        b.iter(|| images.iter().map(|img| hasher.hash(img)).collect::<Vec<_>>())
    });
    group.bench_function("rayon", |b| {
        b.iter(|| glimpse::algorithm::hash_all(&hasher, black_box(&images)))
    });
    group.finish();
}

#[cfg(not(feature = "parallel"))]
fn bench_batch(_c: &mut Criterion) {}

criterion_group!(benches, bench_algorithms, bench_resolution, bench_batch);
criterion_main!(benches);
