use crate::{ClusterError, Clusters};

use palette::cast::ArrayCast;

/// Colors that can be cast to and from an array of `N` components.
pub trait ColorComponents<Component, const N: usize>:
    ArrayCast<Array = [Component; N]> + Copy + 'static
{
}

impl<Color, Component, const N: usize> ColorComponents<Component, N> for Color where
    Color: ArrayCast<Array = [Component; N]> + Copy + 'static
{
}

/// A clustering service that groups sampled colors around `k` centroids.
///
/// Implementations must return exactly `k` centroids and `k` counts,
/// even if some clusters end up with no samples (a count of `0` is allowed),
/// and one label per sample.
/// They should stop after at most `max_iterations` refinement steps,
/// returning whatever state was reached at that point.
///
/// Extraction is deterministic only if the [`Clusterer`] is.
pub trait Clusterer {
    /// Clusters `samples` into `k` groups.
    ///
    /// # Errors
    /// Returns a [`ClusterError`] if `k` valid centroids cannot be produced.
    fn cluster(
        &self,
        samples: &[[f32; 3]],
        k: usize,
        max_iterations: u32,
    ) -> Result<Clusters, ClusterError>;
}

impl<T: Clusterer + ?Sized> Clusterer for &T {
    fn cluster(
        &self,
        samples: &[[f32; 3]],
        k: usize,
        max_iterations: u32,
    ) -> Result<Clusters, ClusterError> {
        (**self).cluster(samples, k, max_iterations)
    }
}

/// Adapts a closure with the same signature as [`Clusterer::cluster`] into a [`Clusterer`].
///
/// # Examples
/// ```
/// # use majorcolor::{ClusterError, Clusters, FnClusterer};
/// let single = FnClusterer(|samples: &[[f32; 3]], k: usize, _: u32| -> Result<_, ClusterError> {
///     Ok(Clusters {
///         centroids: vec![samples[0]; k],
///         counts: vec![0; k],
///         labels: vec![0; samples.len()],
///     })
/// });
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnClusterer<F>(pub F);

impl<F> Clusterer for FnClusterer<F>
where
    F: Fn(&[[f32; 3]], usize, u32) -> Result<Clusters, ClusterError>,
{
    fn cluster(
        &self,
        samples: &[[f32; 3]],
        k: usize,
        max_iterations: u32,
    ) -> Result<Clusters, ClusterError> {
        (self.0)(samples, k, max_iterations)
    }
}
