#[path = "../util/util.rs"]
mod util;

use util::bench_images;

use std::time::Duration;

use criterion::{
    black_box, criterion_group, criterion_main, measurement::WallTime, Bencher, BenchmarkId,
    Criterion, SamplingMode,
};
use image::RgbImage;
use majorcolor::{
    kmeans::{Kmeans, KmeansOptions},
    rank_by_similarity, ColorSignature, PixelMatrix, SampleGrid,
};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

fn bench(
    c: &mut Criterion,
    group: &str,
    images: &[(String, RgbImage)],
    mut f: impl FnMut(&mut Bencher<WallTime>, &RgbImage),
) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(3));

    for (name, image) in images {
        group.bench_with_input(BenchmarkId::from_parameter(name), image, &mut f);
    }
}

fn sample_single(c: &mut Criterion) {
    bench(c, "sample_single", bench_images(), |b, image| {
        let pixels = PixelMatrix::try_from(image).unwrap();
        let grid = SampleGrid::for_matrix(&pixels).unwrap();
        b.iter(|| grid.samples(&pixels))
    })
}

fn major_colors_single(c: &mut Criterion) {
    let kmeans = Kmeans::default();
    bench(c, "major_colors_single", bench_images(), |b, image| {
        let pixels = PixelMatrix::try_from(image).unwrap();
        b.iter(|| majorcolor::major_colors(&pixels, &kmeans))
    })
}

#[cfg(feature = "threads")]
fn sample_par(c: &mut Criterion) {
    bench(c, "sample_par", bench_images(), |b, image| {
        let pixels = PixelMatrix::try_from(image).unwrap();
        let grid = SampleGrid::for_matrix(&pixels).unwrap();
        b.iter(|| grid.samples_par(&pixels))
    })
}

#[cfg(feature = "threads")]
fn major_colors_par(c: &mut Criterion) {
    let kmeans = Kmeans::new(KmeansOptions::new().parallel(true));
    bench(c, "major_colors_par", bench_images(), |b, image| {
        let pixels = PixelMatrix::try_from(image).unwrap();
        b.iter(|| majorcolor::major_colors_par(&pixels, &kmeans))
    })
}

fn rank(c: &mut Criterion) {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(0);
    let mut color = || [(); 3].map(|()| f32::from(rng.gen::<u8>()));
    let query = ColorSignature::new(color(), color());
    let candidates = (0..100_000)
        .map(|_| ColorSignature::new(color(), color()))
        .collect::<Vec<_>>();

    let mut group = c.benchmark_group("rank");
    group.sample_size(30).noise_threshold(0.05);
    group.bench_function("single", |b| {
        b.iter(|| rank_by_similarity(black_box(&query), &candidates))
    });
    #[cfg(feature = "threads")]
    group.bench_function("par", |b| {
        b.iter(|| majorcolor::rank_by_similarity_par(black_box(&query), &candidates))
    });
}

#[cfg(feature = "threads")]
criterion_group!(
    benches,
    sample_single,
    sample_par,
    major_colors_single,
    major_colors_par,
    rank
);
#[cfg(not(feature = "threads"))]
criterion_group!(benches, sample_single, major_colors_single, rank);
criterion_main!(benches);
