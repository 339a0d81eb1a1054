//! Contains various types needed across the crate.

use crate::MAX_PIXELS;
use std::{
    error::Error,
    fmt::{Debug, Display},
    num::ParseFloatError,
    str::FromStr,
};
#[cfg(feature = "image")]
use {
    image::RgbImage,
    palette::{cast::ComponentsAs, Srgb},
};

/// An error type for when the length of an input (e.g., `Vec` or slice)
/// is above the maximum supported value.
///
/// The inner value is the maximum supported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AboveMaxLen<T>(pub T);

impl<T: Display> Display for AboveMaxLen<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "above the maximum length of {}", self.0)
    }
}

impl<T: Debug + Display> Error for AboveMaxLen<T> {}

/// An error returned when a [`PixelMatrix`] cannot be created from the given colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixError {
    /// The number of colors does not equal `rows * cols`.
    DimensionMismatch {
        /// The number of colors provided.
        len: usize,
        /// The requested number of rows.
        rows: usize,
        /// The requested number of columns.
        cols: usize,
    },
    /// The number of pixels is above [`MAX_PIXELS`].
    AboveMaxLen(AboveMaxLen<u32>),
}

impl Display for MatrixError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatrixError::DimensionMismatch { len, rows, cols } => {
                write!(f, "{len} colors cannot form a {rows}x{cols} pixel matrix")
            }
            MatrixError::AboveMaxLen(err) => write!(f, "too many pixels: {err}"),
        }
    }
}

impl Error for MatrixError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MatrixError::DimensionMismatch { .. } => None,
            MatrixError::AboveMaxLen(err) => Some(err),
        }
    }
}

impl From<AboveMaxLen<u32>> for MatrixError {
    fn from(value: AboveMaxLen<u32>) -> Self {
        Self::AboveMaxLen(value)
    }
}

/// A read-only, row-major grid of pixel colors.
///
/// This is a borrowed view over a slice of `rows * cols` colors,
/// with the invariant that the number of pixels is not greater than [`MAX_PIXELS`].
///
/// # Examples
/// From a raw color slice:
/// ```
/// # use majorcolor::{MatrixError, PixelMatrix};
/// # use palette::Srgb;
/// # fn main() -> Result<(), MatrixError> {
/// let srgb = vec![Srgb::new(0u8, 0, 0); 6];
/// let pixels = PixelMatrix::new(&srgb, 2, 3)?;
/// assert_eq!(pixels.index(1, 2), 5);
/// # Ok(())
/// # }
/// ```
///
/// From an image (needs the `image` feature to be enabled):
/// ```no_run
/// # use majorcolor::PixelMatrix;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgb8();
/// let pixels = PixelMatrix::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct PixelMatrix<'a, Color> {
    /// The pixels in row-major order.
    colors: &'a [Color],
    /// The number of rows (the image height).
    rows: usize,
    /// The number of columns (the image width).
    cols: usize,
}

impl<'a, Color> Clone for PixelMatrix<'a, Color> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, Color> Copy for PixelMatrix<'a, Color> {}

impl<'a, Color> PixelMatrix<'a, Color> {
    /// Creates a new [`PixelMatrix`] with `rows` rows and `cols` columns.
    ///
    /// # Errors
    /// Returns an error if `colors.len() != rows * cols`
    /// or if the number of colors is greater than [`MAX_PIXELS`].
    pub fn new(colors: &'a [Color], rows: usize, cols: usize) -> Result<Self, MatrixError> {
        if rows.checked_mul(cols) != Some(colors.len()) {
            Err(MatrixError::DimensionMismatch { len: colors.len(), rows, cols })
        } else if colors.len() > MAX_PIXELS as usize {
            Err(AboveMaxLen(MAX_PIXELS).into())
        } else {
            Ok(Self { colors, rows, cols })
        }
    }

    /// The number of rows in the matrix.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// The number of columns in the matrix.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the number of pixels as a `u32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn num_pixels(&self) -> u32 {
        self.colors.len() as u32
    }

    /// Maps a `(row, col)` coordinate to the flat index of that pixel in [`PixelMatrix::colors`].
    #[must_use]
    #[inline]
    pub const fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Returns the color at the given coordinate.
    ///
    /// # Panics
    /// Panics if the coordinate is out of bounds.
    #[must_use]
    #[inline]
    pub fn pixel(&self, row: usize, col: usize) -> &'a Color {
        debug_assert!(row < self.rows && col < self.cols);
        &self.colors[self.index(row, col)]
    }

    /// Returns the underlying row-major slice of colors.
    #[must_use]
    pub const fn colors(&self) -> &'a [Color] {
        self.colors
    }
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbImage> for PixelMatrix<'a, Srgb<u8>> {
    type Error = MatrixError;

    fn try_from(image: &'a RgbImage) -> Result<Self, Self::Error> {
        let pixels = image.pixels().len();
        if pixels <= MAX_PIXELS as usize {
            let buf = &image.as_raw()[..(pixels * 3)];
            let (cols, rows) = image.dimensions();
            Self::new(buf.components_as(), rows as usize, cols as usize)
        } else {
            Err(AboveMaxLen(MAX_PIXELS).into())
        }
    }
}

/// The major colors of an image: the floored centroids of its two most populous color clusters.
///
/// `color1` comes from the most populous cluster and `color2` from the second most populous one.
/// The two colors are not guaranteed to be distinct.
///
/// A [`ColorSignature`] can be written and parsed back through its text form, `"r,g,b r,g,b"`:
/// ```
/// # use majorcolor::ColorSignature;
/// let signature = ColorSignature::new([10.0, 20.0, 30.0], [255.0, 255.0, 255.0]);
/// let text = signature.to_string();
/// assert_eq!(text, "10,20,30 255,255,255");
/// assert_eq!(text.parse(), Ok(signature));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorSignature {
    /// The centroid of the most populous cluster.
    pub color1: [f32; 3],
    /// The centroid of the second most populous cluster.
    pub color2: [f32; 3],
}

impl ColorSignature {
    /// Creates a new [`ColorSignature`] from two colors.
    #[must_use]
    pub const fn new(color1: [f32; 3], color2: [f32; 3]) -> Self {
        Self { color1, color2 }
    }
}

impl Display for ColorSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r1, g1, b1] = self.color1;
        let [r2, g2, b2] = self.color2;
        write!(f, "{r1},{g1},{b1} {r2},{g2},{b2}")
    }
}

/// An error returned when parsing a [`ColorSignature`] from text fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseSignatureError {
    /// The text was not two whitespace separated groups of three comma separated channels.
    Format,
    /// A channel value was not a valid float.
    Channel(ParseFloatError),
}

impl Display for ParseSignatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseSignatureError::Format => write!(f, "expected a signature like `r,g,b r,g,b`"),
            ParseSignatureError::Channel(err) => write!(f, "invalid channel value: {err}"),
        }
    }
}

impl Error for ParseSignatureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParseSignatureError::Format => None,
            ParseSignatureError::Channel(err) => Some(err),
        }
    }
}

/// Parses one `r,g,b` group.
fn parse_color(text: &str) -> Result<[f32; 3], ParseSignatureError> {
    let mut channels = text.split(',');
    let mut color = [0.0; 3];
    for c in &mut color {
        let channel = channels.next().ok_or(ParseSignatureError::Format)?;
        *c = channel.trim().parse().map_err(ParseSignatureError::Channel)?;
    }

    if channels.next().is_some() {
        Err(ParseSignatureError::Format)
    } else {
        Ok(color)
    }
}

impl FromStr for ColorSignature {
    type Err = ParseSignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut groups = s.split_whitespace();
        match (groups.next(), groups.next(), groups.next()) {
            (Some(color1), Some(color2), None) => {
                Ok(Self::new(parse_color(color1)?, parse_color(color2)?))
            }
            _ => Err(ParseSignatureError::Format),
        }
    }
}

/// The output of a [`Clusterer`](crate::Clusterer).
///
/// `centroids` and `counts` have one entry per cluster, and `labels` has one entry per sample.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Clusters {
    /// The mean color of each cluster.
    pub centroids: Vec<[f32; 3]>,
    /// The number of samples assigned to each cluster. Counts may be zero.
    pub counts: Vec<u32>,
    /// The cluster index assigned to each sample.
    pub labels: Vec<u32>,
}

impl Clusters {
    /// Checks that the output has the shape expected for `k` clusters over `samples` samples.
    ///
    /// # Errors
    /// Returns [`ClusterError::BadOutput`] on a length mismatch.
    pub fn validate(&self, k: usize, samples: usize) -> Result<(), ClusterError> {
        let Self { centroids, counts, labels } = self;
        if centroids.len() == k && counts.len() == k && labels.len() == samples {
            Ok(())
        } else {
            Err(ClusterError::BadOutput {
                k,
                samples,
                centroids: centroids.len(),
                counts: counts.len(),
                labels: labels.len(),
            })
        }
    }
}

/// An error returned by a [`Clusterer`](crate::Clusterer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterError {
    /// Zero clusters were requested.
    ZeroClusters,
    /// There are fewer samples than requested clusters.
    TooFewSamples {
        /// The number of samples provided.
        samples: usize,
        /// The requested number of clusters.
        k: usize,
    },
    /// The clusterer returned arrays with the wrong lengths.
    BadOutput {
        /// The requested number of clusters.
        k: usize,
        /// The number of samples provided.
        samples: usize,
        /// The number of centroids returned.
        centroids: usize,
        /// The number of counts returned.
        counts: usize,
        /// The number of labels returned.
        labels: usize,
    },
}

impl Display for ClusterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterError::ZeroClusters => write!(f, "cannot form zero clusters"),
            ClusterError::TooFewSamples { samples, k } => {
                write!(f, "cannot form {k} clusters from {samples} samples")
            }
            ClusterError::BadOutput { k, samples, centroids, counts, labels } => write!(
                f,
                "expected {k} centroids, {k} counts and {samples} labels, \
                 but got {centroids} centroids, {counts} counts and {labels} labels"
            ),
        }
    }
}

impl Error for ClusterError {}

/// An error returned when extracting a [`ColorSignature`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractError {
    /// The image is too small to place at least one sample in each dimension.
    ImageTooSmall {
        /// The number of rows in the image.
        rows: usize,
        /// The number of columns in the image.
        cols: usize,
    },
    /// The color type has fewer than three components. The inner value is the number of components.
    TooFewChannels(usize),
    /// Clustering the samples failed.
    Cluster(ClusterError),
}

impl Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::ImageTooSmall { rows, cols } => {
                write!(f, "a {rows}x{cols} image is too small to sample")
            }
            ExtractError::TooFewChannels(n) => {
                write!(f, "colors need at least 3 channels, but have {n}")
            }
            ExtractError::Cluster(err) => write!(f, "clustering failed: {err}"),
        }
    }
}

impl Error for ExtractError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ExtractError::Cluster(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ClusterError> for ExtractError {
    fn from(value: ClusterError) -> Self {
        Self::Cluster(value)
    }
}
