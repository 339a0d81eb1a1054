//! Major color extraction: sampling, clustering and selection of the two most populous clusters.

use crate::{
    ClusterError, Clusterer, Clusters, ColorComponents, ColorSignature, ExtractError, PixelMatrix,
    SampleGrid, MAJOR_COLORS_K, MAJOR_COLORS_MAX_ITERATIONS,
};
use num_traits::AsPrimitive;
use tracing::{debug, instrument};

/// The clusters of an image ranked by population, most populous first.
///
/// Each row pairs a centroid with its sample count.
/// Clusters with equal counts keep the order in which the [`Clusterer`] returned them.
#[derive(Debug, Clone, PartialEq)]
pub struct RankTable([([f32; 3], u32); MAJOR_COLORS_K]);

impl RankTable {
    /// Builds a [`RankTable`] from the output of a [`Clusterer`].
    ///
    /// # Errors
    /// Returns [`ClusterError::BadOutput`] unless there are exactly [`MAJOR_COLORS_K`]
    /// centroids and counts.
    pub fn new(clusters: &Clusters) -> Result<Self, ClusterError> {
        let Clusters { centroids, counts, labels } = clusters;
        if centroids.len() != MAJOR_COLORS_K || counts.len() != MAJOR_COLORS_K {
            return Err(ClusterError::BadOutput {
                k: MAJOR_COLORS_K,
                samples: labels.len(),
                centroids: centroids.len(),
                counts: counts.len(),
                labels: labels.len(),
            });
        }

        let mut rows = [([0.0; 3], 0); MAJOR_COLORS_K];
        for (row, (&centroid, &count)) in rows.iter_mut().zip(centroids.iter().zip(counts)) {
            *row = (centroid, count);
        }
        rows.sort_by(|(_, a), (_, b)| b.cmp(a));

        Ok(Self(rows))
    }

    /// Returns the ranked `(centroid, count)` rows.
    #[must_use]
    pub fn rows(&self) -> &[([f32; 3], u32)] {
        &self.0
    }

    /// Returns the floored centroids of the two most populous clusters.
    #[must_use]
    pub fn signature(&self) -> ColorSignature {
        let [(color1, _), (color2, _), ..] = self.0;
        ColorSignature::new(color1.map(f32::floor), color2.map(f32::floor))
    }
}

/// Runs the [`Clusterer`] over `samples` and checks the shape of its output.
fn cluster_samples(
    samples: &[[f32; 3]],
    clusterer: &impl Clusterer,
) -> Result<Clusters, ClusterError> {
    let clusters = clusterer.cluster(samples, MAJOR_COLORS_K, MAJOR_COLORS_MAX_ITERATIONS)?;
    clusters.validate(MAJOR_COLORS_K, samples.len())?;
    Ok(clusters)
}

/// Clusters the samples and selects the two most populous clusters.
fn select(
    samples: &[[f32; 3]],
    clusterer: &impl Clusterer,
) -> Result<ColorSignature, ExtractError> {
    let clusters = cluster_samples(samples, clusterer)?;
    let signature = RankTable::new(&clusters)?.signature();
    debug!(%signature, "selected major colors");
    Ok(signature)
}

/// Returns the sampling grid for `pixels`, checking that its colors have enough channels.
fn prepare<Color, const N: usize>(
    pixels: &PixelMatrix<'_, Color>,
) -> Result<SampleGrid, ExtractError> {
    if N < 3 {
        return Err(ExtractError::TooFewChannels(N));
    }
    let grid = SampleGrid::for_matrix(pixels)?;
    debug!(
        sample_rows = grid.rows(),
        sample_cols = grid.cols(),
        cell_width = grid.cell_width(),
        cell_height = grid.cell_height(),
        "sampling grid"
    );
    Ok(grid)
}

/// Extracts the [`ColorSignature`] of an image.
///
/// The image is sampled on an adaptive grid (see [`SampleGrid`]),
/// the samples are grouped into [`MAJOR_COLORS_K`] clusters by `clusterer`
/// with at most [`MAJOR_COLORS_MAX_ITERATIONS`] iterations,
/// and the floored centroids of the two most populous clusters are returned.
///
/// Only the first three channels of each color are used, without any color space conversion.
///
/// # Errors
/// Returns [`ExtractError::ImageTooSmall`] if the image cannot be sampled,
/// [`ExtractError::TooFewChannels`] if the color type has fewer than three components,
/// or [`ExtractError::Cluster`] if clustering fails.
///
/// # Examples
/// ```
/// # use majorcolor::{major_colors, kmeans::Kmeans, PixelMatrix};
/// # use palette::Srgb;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let colors = vec![Srgb::new(10u8, 10, 10); 64 * 64];
/// let pixels = PixelMatrix::new(&colors, 64, 64)?;
/// let signature = major_colors(&pixels, &Kmeans::default())?;
/// assert_eq!(signature.color1, [10.0, 10.0, 10.0]);
/// assert_eq!(signature.color2, [10.0, 10.0, 10.0]);
/// # Ok(())
/// # }
/// ```
#[instrument(level = "debug", skip_all, fields(rows = pixels.rows(), cols = pixels.cols()))]
pub fn major_colors<Color, Component, const N: usize>(
    pixels: &PixelMatrix<'_, Color>,
    clusterer: &impl Clusterer,
) -> Result<ColorSignature, ExtractError>
where
    Color: ColorComponents<Component, N>,
    Component: AsPrimitive<f32>,
{
    let grid = prepare::<_, N>(pixels)?;
    let samples = grid.samples(pixels);
    select(&samples, clusterer)
}

/// Extracts the [`ColorSignature`] of an image, sampling it in parallel.
///
/// The output is the same as [`major_colors`] given the same `clusterer`.
///
/// # Errors
/// See [`major_colors`].
#[cfg(feature = "threads")]
#[instrument(level = "debug", skip_all, fields(rows = pixels.rows(), cols = pixels.cols()))]
pub fn major_colors_par<Color, Component, const N: usize>(
    pixels: &PixelMatrix<'_, Color>,
    clusterer: &impl Clusterer,
) -> Result<ColorSignature, ExtractError>
where
    Color: ColorComponents<Component, N> + Sync,
    Component: AsPrimitive<f32>,
{
    let grid = prepare::<_, N>(pixels)?;
    let samples = grid.samples_par(pixels);
    select(&samples, clusterer)
}

#[cfg(feature = "kmeans")]
impl ColorSignature {
    /// Extracts the signature of an image using the default [`Kmeans`](crate::kmeans::Kmeans).
    ///
    /// # Errors
    /// See [`major_colors`].
    pub fn from_pixels<Color, Component, const N: usize>(
        pixels: &PixelMatrix<'_, Color>,
    ) -> Result<Self, ExtractError>
    where
        Color: ColorComponents<Component, N>,
        Component: AsPrimitive<f32>,
    {
        major_colors(pixels, &crate::kmeans::Kmeans::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{similarity, tests::*, FnClusterer};
    use palette::{Srgb, SrgbLumaa};

    #[test]
    fn rank_table_sorts_by_count() {
        let mut counts = vec![0; MAJOR_COLORS_K];
        counts[5] = 40;
        counts[17] = 90;
        counts[30] = 12;
        let clusters = FixedClusterer::with_counts(counts)
            .cluster(&[[0.0; 3]], MAJOR_COLORS_K, 20)
            .unwrap();

        let table = RankTable::new(&clusters).unwrap();
        let rows = table.rows();
        assert_eq!(rows.len(), MAJOR_COLORS_K);
        assert_eq!(rows[0], ([17.0; 3], 90));
        assert_eq!(rows[1], ([5.0; 3], 40));
        assert_eq!(rows[2], ([30.0; 3], 12));
        assert!(rows.windows(2).all(|w| w[0].1 >= w[1].1));
        assert_eq!(table.signature(), ColorSignature::new([17.0; 3], [5.0; 3]));
    }

    #[test]
    fn rank_table_rejects_wrong_k() {
        let clusters = FixedClusterer::with_counts(vec![1; 8])
            .cluster(&[[0.0; 3]], 8, 20)
            .unwrap();
        assert!(matches!(
            RankTable::new(&clusters),
            Err(ClusterError::BadOutput { k: MAJOR_COLORS_K, centroids: 8, counts: 8, .. })
        ));
    }

    #[test]
    fn signature_is_floored() {
        let mut centroids = vec![[0.0; 3]; MAJOR_COLORS_K];
        centroids[0] = [10.7, 20.2, 30.999];
        centroids[1] = [0.5, 254.9999, 99.0];
        let mut counts = vec![0; MAJOR_COLORS_K];
        counts[0] = 3;
        counts[1] = 7;
        let clusterer = FixedClusterer { centroids, counts };

        let colors = uniform_pixels(32, 32, Srgb::new(0, 0, 0));
        let pixels = PixelMatrix::new(&colors, 32, 32).unwrap();
        let signature = major_colors(&pixels, &clusterer).unwrap();
        assert_eq!(signature.color1, [0.0, 254.0, 99.0]);
        assert_eq!(signature.color2, [10.0, 20.0, 30.0]);
    }

    #[test]
    fn extracted_channels_are_floored() {
        let colors = random_pixels(200 * 150, 11);
        let pixels = PixelMatrix::new(&colors, 200, 150).unwrap();
        let ColorSignature { color1, color2 } = ColorSignature::from_pixels(&pixels).unwrap();
        for c in color1.into_iter().chain(color2) {
            assert_eq!(c, c.floor());
            assert!((0.0..=255.0).contains(&c));
        }
    }

    #[test]
    fn uniform_image() {
        let color = Srgb::new(10, 10, 10);
        let extract = |size: usize| {
            let colors = uniform_pixels(size, size, color);
            let pixels = PixelMatrix::new(&colors, size, size).unwrap();
            ColorSignature::from_pixels(&pixels).unwrap()
        };
        let small = extract(256);
        let large = extract(512);

        let expected = ColorSignature::new([10.0; 3], [10.0; 3]);
        assert_eq!(small, expected);
        assert_eq!(large, expected);
        assert_eq!(similarity(&small, &large), 1.0);
    }

    #[test]
    fn two_tone_image() {
        let red = Srgb::new(255, 0, 0);
        let blue = Srgb::new(0, 0, 255);
        let colors = split_pixels(256, 256, 192, red, blue);
        let pixels = PixelMatrix::new(&colors, 256, 256).unwrap();
        let signature = ColorSignature::from_pixels(&pixels).unwrap();
        assert_eq!(signature, ColorSignature::new([255.0, 0.0, 0.0], [0.0, 0.0, 255.0]));

        let colors = split_pixels(256, 256, 64, blue, red);
        let pixels = PixelMatrix::new(&colors, 256, 256).unwrap();
        let swapped = ColorSignature::from_pixels(&pixels).unwrap();
        assert_eq!(swapped, ColorSignature::new([255.0, 0.0, 0.0], [0.0, 0.0, 255.0]));
    }

    #[test]
    fn image_too_small() {
        let colors = uniform_pixels(1, 40, Srgb::new(1, 2, 3));
        let pixels = PixelMatrix::new(&colors, 1, 40).unwrap();
        assert_eq!(
            ColorSignature::from_pixels(&pixels),
            Err(ExtractError::ImageTooSmall { rows: 1, cols: 40 })
        );
    }

    #[test]
    fn too_few_samples_propagates() {
        let colors = uniform_pixels(4, 4, Srgb::new(1, 2, 3));
        let pixels = PixelMatrix::new(&colors, 4, 4).unwrap();
        assert_eq!(
            ColorSignature::from_pixels(&pixels),
            Err(ExtractError::Cluster(ClusterError::TooFewSamples { samples: 9, k: 32 }))
        );
    }

    #[test]
    fn too_few_channels() {
        let colors = vec![SrgbLumaa::new(7u8, 9); 64 * 64];
        let pixels = PixelMatrix::new(&colors, 64, 64).unwrap();
        let clusterer = FixedClusterer::with_counts(vec![1; MAJOR_COLORS_K]);
        assert_eq!(major_colors(&pixels, &clusterer), Err(ExtractError::TooFewChannels(2)));
    }

    #[test]
    fn clusterer_receives_fixed_parameters() {
        let colors = random_pixels(100 * 100, 5);
        let pixels = PixelMatrix::new(&colors, 100, 100).unwrap();
        let clusterer = FnClusterer(
            |samples: &[[f32; 3]], k: usize, max_iterations: u32| -> Result<Clusters, ClusterError> {
                assert_eq!(samples.len(), 99 * 99);
                assert_eq!(k, MAJOR_COLORS_K);
                assert_eq!(max_iterations, MAJOR_COLORS_MAX_ITERATIONS);
                Err(ClusterError::ZeroClusters)
            },
        );
        assert_eq!(
            major_colors(&pixels, &clusterer),
            Err(ExtractError::Cluster(ClusterError::ZeroClusters))
        );
    }

    #[test]
    fn bad_labels_are_rejected() {
        let colors = random_pixels(64 * 64, 5);
        let pixels = PixelMatrix::new(&colors, 64, 64).unwrap();
        let clusterer = FnClusterer(|_: &[[f32; 3]], k: usize, _: u32| -> Result<Clusters, ClusterError> {
            Ok(Clusters {
                centroids: vec![[0.0; 3]; k],
                counts: vec![0; k],
                labels: Vec::new(),
            })
        });
        assert!(matches!(
            major_colors(&pixels, &clusterer),
            Err(ExtractError::Cluster(ClusterError::BadOutput { labels: 0, .. }))
        ));
    }

    #[test]
    #[cfg(feature = "threads")]
    fn single_and_multi_threaded_match() {
        let colors = random_pixels(300 * 400, 9);
        let pixels = PixelMatrix::new(&colors, 300, 400).unwrap();
        let kmeans = crate::kmeans::Kmeans::default();
        assert_eq!(
            major_colors(&pixels, &kmeans).unwrap(),
            major_colors_par(&pixels, &kmeans).unwrap()
        );
    }
}
