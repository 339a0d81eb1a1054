//! A seeded Lloyd's k-means, the default [`Clusterer`] for signature extraction.
//!
//! Centroids are seeded with k-means++ and refined until no sample changes cluster
//! or the iteration cap is reached.
//! Duplicate samples are fine: if fewer unique colors than `k` are present,
//! some centroids will be duplicates and end up with a count of `0`.

// References:
// - Lloyd, S. Least squares quantization in PCM.
//   IEEE Transactions on Information Theory, vol. 28, no. 2, 129–137, 1982.
// - Arthur, D. & Vassilvitskii, S. k-means++: The Advantages of Careful Seeding.
//   Proceedings of the 18th ACM-SIAM Symposium on Discrete Algorithms, 1027–1035, 2007.

use crate::{similarity::distance_sq, ClusterError, Clusterer, Clusters};

use std::array;

use rand::{prelude::Distribution, SeedableRng};
use rand_distr::{Uniform, WeightedIndex};
use rand_xoshiro::Xoroshiro128PlusPlus;
use tracing::{debug, instrument, trace};
use wide::{f32x8, CmpLt};

#[cfg(feature = "threads")]
use rayon::prelude::*;

/// The number of components in a sample.
const N: usize = 3;

/// A builder struct to specify the parameters for k-means.
///
/// # Examples
/// ```
/// # use majorcolor::kmeans::{Kmeans, KmeansOptions};
/// let kmeans = Kmeans::new(KmeansOptions::new().seed(42));
/// ```
#[derive(Debug, Clone)]
pub struct KmeansOptions {
    /// The seed value for the random number generator.
    seed: u64,
    /// Whether to assign samples to clusters in parallel.
    #[allow(unused)]
    parallel: bool,
}

impl Default for KmeansOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl KmeansOptions {
    /// Creates a new [`KmeansOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self { seed: 0, parallel: false }
    }

    /// Sets the seed value for the random number generator used to pick the initial centroids.
    ///
    /// The default seed is `0`.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets whether samples are assigned to their nearest centroid in parallel.
    ///
    /// The result is the same either way. The default is `false`.
    #[must_use]
    #[cfg(feature = "threads")]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Lloyd's k-means with k-means++ seeding.
///
/// The output is deterministic for a given seed.
#[derive(Debug, Clone, Default)]
pub struct Kmeans {
    /// The options to run with.
    options: KmeansOptions,
}

impl From<KmeansOptions> for Kmeans {
    fn from(options: KmeansOptions) -> Self {
        Self::new(options)
    }
}

#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn simd_argmin(points: &[[f32x8; N]], query: [f32; N]) -> usize {
    let incr = f32x8::ONE;
    let mut cur_chunk = f32x8::ZERO;
    let mut min_chunk = cur_chunk;
    let mut min_distance = f32x8::splat(f32::INFINITY);

    let query = query.map(f32x8::splat);

    for chunk in points {
        let [d0, d1, d2] = array::from_fn::<_, N, _>(|i| query[i] - chunk[i]);
        let distance = d0 * d0 + d1 * d1 + d2 * d2;

        let mask = distance.cmp_lt(min_distance);
        min_chunk = mask.blend(cur_chunk, min_chunk);
        min_distance = mask.blend(distance, min_distance);
        cur_chunk += incr;
    }

    let mut min_lane = 0;
    let mut min_dist = f32::INFINITY;
    for (i, &v) in min_distance.as_array_ref().iter().enumerate() {
        if v < min_dist {
            min_dist = v;
            min_lane = i;
        }
    }

    let min_chunk = min_chunk.as_array_ref()[min_lane] as usize;
    min_chunk * 8 + min_lane
}

/// Packs centroids into chunks of 8, one SIMD vector per component.
/// Unused lanes in the last chunk are set to infinity so they are never the nearest.
fn pack(centroids: &[[f32; N]]) -> Vec<[f32x8; N]> {
    let mut components = Vec::with_capacity(centroids.len().div_ceil(8));
    let chunks = centroids.chunks_exact(8);
    components.extend(
        chunks
            .clone()
            .map(|chunk| array::from_fn(|i| f32x8::new(array::from_fn(|j| chunk[j][i])))),
    );

    if !chunks.remainder().is_empty() {
        let mut arr = [[f32::INFINITY; 8]; N];
        for (i, color) in chunks.remainder().iter().enumerate() {
            for (arr, &c) in arr.iter_mut().zip(color) {
                arr[i] = c;
            }
        }
        components.push(arr.map(f32x8::new));
    }

    components
}

/// Assigns each sample to its nearest centroid, returning how many labels changed.
#[allow(clippy::cast_possible_truncation)]
fn assign(samples: &[[f32; N]], centroids: &[[f32x8; N]], labels: &mut [u32]) -> usize {
    labels
        .iter_mut()
        .zip(samples)
        .map(|(label, &sample)| {
            let nearest = simd_argmin(centroids, sample) as u32;
            let changed = *label != nearest;
            *label = nearest;
            usize::from(changed)
        })
        .sum()
}

#[cfg(feature = "threads")]
#[allow(clippy::cast_possible_truncation)]
fn assign_par(samples: &[[f32; N]], centroids: &[[f32x8; N]], labels: &mut [u32]) -> usize {
    labels
        .par_iter_mut()
        .zip(samples)
        .map(|(label, &sample)| {
            let nearest = simd_argmin(centroids, sample) as u32;
            let changed = *label != nearest;
            *label = nearest;
            usize::from(changed)
        })
        .sum()
}

/// Returns the number of samples assigned to each of the `k` clusters.
fn tally(labels: &[u32], k: usize) -> Vec<u32> {
    let mut counts = vec![0; k];
    for &label in labels {
        counts[label as usize] += 1;
    }
    counts
}

/// Moves each non-empty cluster's centroid to the mean of its samples.
/// Empty clusters keep their previous centroid.
#[allow(clippy::cast_possible_truncation)]
fn update(samples: &[[f32; N]], labels: &[u32], centroids: &mut [[f32; N]]) {
    let mut sums = vec![([0.0f64; N], 0u32); centroids.len()];
    for (&label, sample) in labels.iter().zip(samples) {
        let (sum, count) = &mut sums[label as usize];
        for (s, &c) in sum.iter_mut().zip(sample) {
            *s += f64::from(c);
        }
        *count += 1;
    }

    for (centroid, (sum, count)) in centroids.iter_mut().zip(sums) {
        if count > 0 {
            let n = f64::from(count);
            *centroid = sum.map(|s| (s / n) as f32);
        }
    }
}

impl Kmeans {
    /// Creates a new [`Kmeans`] with the given options.
    #[must_use]
    pub const fn new(options: KmeansOptions) -> Self {
        Self { options }
    }

    /// Picks `k` initial centroids from `samples` using k-means++.
    ///
    /// Once every sample coincides with a chosen centroid,
    /// the remaining centroids are picked uniformly at random.
    fn plus_plus(&self, samples: &[[f32; N]], k: usize) -> Vec<[f32; N]> {
        let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(self.options.seed);
        let uniform = Uniform::new(0, samples.len());

        let mut centroids = Vec::with_capacity(k);
        let first = samples[uniform.sample(rng)];
        centroids.push(first);

        let mut weights = samples
            .iter()
            .map(|sample| distance_sq(sample, &first))
            .collect::<Vec<_>>();

        while centroids.len() < k {
            let next = match WeightedIndex::new(&weights) {
                Ok(distribution) => distribution.sample(rng),
                Err(_) => uniform.sample(rng),
            };

            let centroid = samples[next];
            centroids.push(centroid);

            for (weight, sample) in weights.iter_mut().zip(samples) {
                *weight = weight.min(distance_sq(sample, &centroid));
            }
        }

        centroids
    }

    /// Runs the assignment step, in parallel if requested.
    fn assign(&self, samples: &[[f32; N]], centroids: &[[f32; N]], labels: &mut [u32]) -> usize {
        let packed = pack(centroids);

        #[cfg(feature = "threads")]
        {
            if self.options.parallel {
                return assign_par(samples, &packed, labels);
            }
        }

        assign(samples, &packed, labels)
    }

    /// Runs Lloyd's algorithm on samples already checked to contain at least `k > 0` entries.
    fn lloyd(&self, samples: &[[f32; N]], k: usize, max_iterations: u32) -> Clusters {
        let mut centroids = self.plus_plus(samples, k);
        let mut labels = vec![0; samples.len()];
        self.assign(samples, &centroids, &mut labels);

        let mut iterations = 0;
        while iterations < max_iterations {
            iterations += 1;
            update(samples, &labels, &mut centroids);
            let changed = self.assign(samples, &centroids, &mut labels);
            trace!(iteration = iterations, changed, "k-means iteration");
            if changed == 0 {
                break;
            }
        }

        debug!(iterations, "k-means finished");

        let counts = tally(&labels, k);
        Clusters { centroids, counts, labels }
    }
}

impl Clusterer for Kmeans {
    #[instrument(
        level = "debug",
        skip_all,
        fields(samples = samples.len(), k = k, max_iterations = max_iterations)
    )]
    fn cluster(
        &self,
        samples: &[[f32; 3]],
        k: usize,
        max_iterations: u32,
    ) -> Result<Clusters, ClusterError> {
        if k == 0 {
            Err(ClusterError::ZeroClusters)
        } else if samples.len() < k {
            Err(ClusterError::TooFewSamples { samples: samples.len(), k })
        } else {
            Ok(self.lloyd(samples, k, max_iterations))
        }
    }
}
