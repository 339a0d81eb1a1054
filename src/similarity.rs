//! Scoring the similarity of two [`ColorSignature`]s.
//!
//! The two colors of a signature are treated as an unordered pair:
//! which cluster ends up as `color1` depends on small differences in population,
//! so two images of the same scene may list their major colors in opposite orders.
//! The score therefore uses the closest pairing of colors across both signatures.

use crate::{ColorSignature, SIMILARITY_SIGMA};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// Returns the squared Euclidean distance between two colors.
#[inline]
pub(crate) fn distance_sq(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let d0 = a[0] - b[0];
    let d1 = a[1] - b[1];
    let d2 = a[2] - b[2];
    d0 * d0 + d1 * d1 + d2 * d2
}

/// Returns the smallest squared distance between a color of `a` and a color of `b`.
///
/// Both the same-index pairings and the cross pairings are considered.
#[must_use]
pub fn min_distance_sq(a: &ColorSignature, b: &ColorSignature) -> f32 {
    let distances = [
        distance_sq(&a.color1, &b.color1),
        distance_sq(&a.color2, &b.color2),
        distance_sq(&a.color2, &b.color1),
        distance_sq(&a.color1, &b.color2),
    ];

    distances.into_iter().fold(f32::INFINITY, f32::min)
}

/// Returns the similarity of two signatures in `(0, 1]`, where `1` is an exact match.
///
/// This is a Gaussian kernel with a bandwidth of [`SIMILARITY_SIGMA`]
/// over the distance given by [`min_distance_sq`].
/// A distance of `50` gives a similarity of about `0.61`, and a distance of `100` about `0.135`.
///
/// The function is symmetric, and `similarity(a, a)` is exactly `1.0`.
///
/// # Examples
/// ```
/// # use majorcolor::{similarity, ColorSignature};
/// let a = ColorSignature::new([0.0; 3], [255.0; 3]);
/// let b = ColorSignature::new([255.0; 3], [0.0; 3]);
/// assert_eq!(similarity(&a, &b), 1.0);
/// ```
#[must_use]
#[allow(clippy::float_cmp)]
pub fn similarity(a: &ColorSignature, b: &ColorSignature) -> f32 {
    let min_sq = min_distance_sq(a, b);
    if min_sq == 0.0 {
        1.0
    } else {
        let d = min_sq.sqrt();
        (-(d * d) / (2.0 * SIMILARITY_SIGMA * SIMILARITY_SIGMA)).exp()
    }
}

impl ColorSignature {
    /// Returns the [`similarity`] of this signature to `other`.
    #[must_use]
    pub fn similarity(&self, other: &Self) -> f32 {
        similarity(self, other)
    }
}

/// Sorts `(index, similarity)` pairs by descending similarity, then by ascending index.
fn sort_ranked(ranked: &mut [(usize, f32)]) {
    ranked.sort_unstable_by_key(|&(i, s)| (Reverse(OrderedFloat(s)), i));
}

/// Scores each candidate against `query` and returns `(index, similarity)` pairs,
/// most similar first. Candidates with equal scores keep their relative order.
///
/// # Examples
/// ```
/// # use majorcolor::{rank_by_similarity, ColorSignature};
/// let query = ColorSignature::new([200.0, 0.0, 0.0], [0.0; 3]);
/// let candidates = [
///     ColorSignature::new([0.0, 0.0, 200.0], [0.0, 200.0, 0.0]),
///     ColorSignature::new([190.0, 0.0, 0.0], [10.0; 3]),
/// ];
/// let ranked = rank_by_similarity(&query, &candidates);
/// assert_eq!(ranked[0].0, 1);
/// ```
#[must_use]
pub fn rank_by_similarity(
    query: &ColorSignature,
    candidates: &[ColorSignature],
) -> Vec<(usize, f32)> {
    let mut ranked = candidates
        .iter()
        .map(|candidate| similarity(query, candidate))
        .enumerate()
        .collect::<Vec<_>>();

    sort_ranked(&mut ranked);
    ranked
}

/// Computes [`rank_by_similarity`] in parallel.
#[cfg(feature = "threads")]
#[must_use]
pub fn rank_by_similarity_par(
    query: &ColorSignature,
    candidates: &[ColorSignature],
) -> Vec<(usize, f32)> {
    let mut ranked = candidates
        .par_iter()
        .map(|candidate| similarity(query, candidate))
        .enumerate()
        .collect::<Vec<_>>();

    ranked.par_sort_unstable_by_key(|&(i, s)| (Reverse(OrderedFloat(s)), i));
    ranked
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoroshiro128PlusPlus;

    fn random_signatures(n: usize, seed: u64) -> Vec<ColorSignature> {
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
        let mut color = || [(); 3].map(|()| f32::from(rng.gen::<u8>()));
        (0..n).map(|_| ColorSignature::new(color(), color())).collect()
    }

    #[test]
    fn identical_is_one() {
        for a in random_signatures(100, 1) {
            assert_eq!(similarity(&a, &a), 1.0);
        }
    }

    #[test]
    fn symmetric() {
        let signatures = random_signatures(40, 2);
        for a in &signatures {
            for b in &signatures {
                assert_eq!(similarity(a, b), similarity(b, a));
            }
        }
    }

    #[test]
    fn swapped_colors_match() {
        let a = ColorSignature::new([0.0; 3], [255.0; 3]);
        let b = ColorSignature::new([255.0; 3], [0.0; 3]);
        assert_eq!(min_distance_sq(&a, &b), 0.0);
        assert_eq!(similarity(&a, &b), 1.0);
    }

    #[test]
    fn one_sigma_apart() {
        let a = ColorSignature::new([0.0; 3], [0.0; 3]);
        let b = ColorSignature::new([50.0, 0.0, 0.0], [50.0, 0.0, 0.0]);
        assert_eq!(min_distance_sq(&a, &b), 2500.0);
        assert!((similarity(&a, &b) - (-0.5f32).exp()).abs() < 1e-6);
        assert!((similarity(&a, &b) - 0.6065).abs() < 1e-4);
    }

    #[test]
    fn two_sigma_apart() {
        let a = ColorSignature::new([0.0; 3], [0.0; 3]);
        let b = ColorSignature::new([0.0, 100.0, 0.0], [0.0, 0.0, 100.0]);
        assert!((similarity(&a, &b) - 0.1353).abs() < 1e-4);
    }

    #[test]
    fn closest_pair_wins() {
        let a = ColorSignature::new([0.0; 3], [200.0; 3]);
        let b = ColorSignature::new([10.0, 0.0, 0.0], [0.0; 3]);
        assert_eq!(min_distance_sq(&a, &b), 0.0);

        let b = ColorSignature::new([100.0; 3], [203.0, 200.0, 200.0]);
        assert_eq!(min_distance_sq(&a, &b), 9.0);
    }

    #[test]
    fn decreases_with_distance() {
        let a = ColorSignature::new([20.0, 40.0, 60.0], [20.0, 40.0, 60.0]);
        let mut previous = 1.0;
        for step in 1..=30u8 {
            let offset = 5.0 * f32::from(step);
            let b = ColorSignature::new(
                [20.0 + offset, 40.0, 60.0],
                [20.0, 40.0 + 2.0 * offset, 60.0],
            );
            let s = similarity(&a, &b);
            assert!(s < previous, "step {step}: {s} >= {previous}");
            assert!(s > 0.0);
            previous = s;
        }
    }

    #[test]
    fn opposite_corners_stay_positive() {
        let a = ColorSignature::new([0.0; 3], [0.0; 3]);
        let b = ColorSignature::new([255.0; 3], [255.0; 3]);
        let s = similarity(&a, &b);
        assert!(s > 0.0 && s < 1e-10);
    }

    #[test]
    fn ranking() {
        let query = ColorSignature::new([100.0; 3], [0.0; 3]);
        let candidates = [
            ColorSignature::new([255.0; 3], [255.0; 3]),
            ColorSignature::new([0.0; 3], [100.0; 3]),
            ColorSignature::new([110.0, 100.0, 100.0], [50.0; 3]),
            ColorSignature::new([255.0; 3], [255.0; 3]),
        ];

        let ranked = rank_by_similarity(&query, &candidates);
        let order = ranked.iter().map(|&(i, _)| i).collect::<Vec<_>>();
        assert_eq!(order, vec![1, 2, 0, 3]);
        assert_eq!(ranked[0].1, 1.0);
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));

        #[cfg(feature = "threads")]
        assert_eq!(rank_by_similarity_par(&query, &candidates), ranked);

        assert!(rank_by_similarity(&query, &[]).is_empty());
    }
}
