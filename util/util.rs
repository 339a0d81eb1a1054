#![allow(dead_code)]

use std::sync::OnceLock;

use image::{Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

/// The edge lengths of the generated benchmark images.
pub const SIZES: [(u32, u32); 4] = [(256, 256), (512, 512), (1080, 1920), (2048, 2048)];

/// Generates an image of a few noisy color blobs.
///
/// The output is deterministic for a given size and seed.
pub fn blob_image(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);

    let centers = (0..6)
        .map(|_| {
            let x = rng.gen_range(0..width);
            let y = rng.gen_range(0..height);
            let color = [rng.gen::<u8>(), rng.gen::<u8>(), rng.gen::<u8>()];
            (i64::from(x), i64::from(y), color)
        })
        .collect::<Vec<_>>();

    RgbImage::from_fn(width, height, |x, y| {
        let (x, y) = (i64::from(x), i64::from(y));
        let (_, _, color) = centers
            .iter()
            .min_by_key(|&&(cx, cy, _)| (cx - x).pow(2) + (cy - y).pow(2))
            .copied()
            .unwrap_or((0, 0, [0; 3]));

        let noise = rng.gen_range(0..16);
        Rgb(color.map(|c| c.saturating_add(noise)))
    })
}

pub fn generate_images() -> Vec<(String, RgbImage)> {
    SIZES
        .iter()
        .zip(1..)
        .map(|(&(width, height), seed)| {
            (format!("{width}x{height}"), blob_image(width, height, seed))
        })
        .collect()
}

static BENCH_IMAGES: OnceLock<Vec<(String, RgbImage)>> = OnceLock::new();

pub fn bench_images() -> &'static [(String, RgbImage)] {
    BENCH_IMAGES.get_or_init(generate_images)
}
