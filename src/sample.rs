//! Adaptive grid sampling of pixel matrices.
//!
//! Images are sampled on a regular grid whose cell size grows with the image,
//! so that an image with an edge of [`REFERENCE_SIZE`] pixels is sampled every [`GRID_STEP`] pixels
//! and larger images are sampled proportionally more sparsely.
//! Cells are never smaller than a single pixel.

use crate::{ColorComponents, ExtractError, PixelMatrix, GRID_STEP, REFERENCE_SIZE};
use num_traits::AsPrimitive;
use palette::cast;
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// Returns the grid cell size along an edge of `len` pixels.
#[allow(clippy::cast_precision_loss)]
fn cell_size(len: usize) -> f32 {
    (len as f32 / REFERENCE_SIZE * GRID_STEP).max(1.0)
}

/// Returns the number of grid samples along an edge of `len` pixels, if there is at least one.
///
/// The last partial cell is dropped so that rounded sample coordinates stay in bounds.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn grid_len(len: usize, cell: f32) -> Option<usize> {
    ((len as f32 / cell).floor() as usize)
        .checked_sub(1)
        .filter(|&n| n > 0)
}

/// The sampling grid for a pixel matrix of a given size.
///
/// # Examples
/// ```
/// # use majorcolor::SampleGrid;
/// let grid = SampleGrid::new(1024, 1024).unwrap();
/// assert_eq!(grid.cell_width(), 8.0);
/// assert_eq!(grid.rows(), 127);
/// assert_eq!(grid.len(), 127 * 127);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleGrid {
    /// The distance between samples along a row.
    cell_width: f32,
    /// The distance between samples along a column.
    cell_height: f32,
    /// The number of sample rows.
    rows: usize,
    /// The number of sample columns.
    cols: usize,
}

impl SampleGrid {
    /// Creates the sampling grid for an image with `rows` rows and `cols` columns.
    ///
    /// # Errors
    /// Returns [`ExtractError::ImageTooSmall`] if the grid would not contain
    /// at least one sample in each dimension.
    pub fn new(rows: usize, cols: usize) -> Result<Self, ExtractError> {
        let cell_width = cell_size(cols);
        let cell_height = cell_size(rows);
        match (grid_len(rows, cell_height), grid_len(cols, cell_width)) {
            (Some(sample_rows), Some(sample_cols)) => Ok(Self {
                cell_width,
                cell_height,
                rows: sample_rows,
                cols: sample_cols,
            }),
            _ => Err(ExtractError::ImageTooSmall { rows, cols }),
        }
    }

    /// Creates the sampling grid for the given [`PixelMatrix`].
    ///
    /// # Errors
    /// See [`SampleGrid::new`].
    pub fn for_matrix<Color>(pixels: &PixelMatrix<'_, Color>) -> Result<Self, ExtractError> {
        Self::new(pixels.rows(), pixels.cols())
    }

    /// The distance in pixels between horizontally adjacent samples.
    #[must_use]
    pub const fn cell_width(&self) -> f32 {
        self.cell_width
    }

    /// The distance in pixels between vertically adjacent samples.
    #[must_use]
    pub const fn cell_height(&self) -> f32 {
        self.cell_height
    }

    /// The number of sample rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// The number of sample columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// The total number of samples.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Always `false`, since a grid has at least one sample.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Returns the pixel `(row, col)` sampled for grid cell `(y, x)`.
    #[must_use]
    #[inline]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn coordinate(&self, y: usize, x: usize) -> (usize, usize) {
        (
            (y as f32 * self.cell_height).round() as usize,
            (x as f32 * self.cell_width).round() as usize,
        )
    }

    /// Copies the first three channels of each sample in grid row `y` into `out`.
    #[inline]
    fn sample_row<Color, Component, const N: usize>(
        &self,
        pixels: &PixelMatrix<'_, Color>,
        y: usize,
        out: &mut [[f32; 3]],
    ) where
        Color: ColorComponents<Component, N>,
        Component: AsPrimitive<f32>,
    {
        for (x, sample) in out.iter_mut().enumerate() {
            let (row, col) = self.coordinate(y, x);
            let color = cast::into_array(*pixels.pixel(row, col));
            *sample = [color[0].as_(), color[1].as_(), color[2].as_()];
        }
    }

    /// Samples the given [`PixelMatrix`] on this grid.
    ///
    /// Sample `y * cols + x` holds the first three channels of the pixel at
    /// [`SampleGrid::coordinate(y, x)`](SampleGrid::coordinate).
    ///
    /// # Panics
    /// Panics if the color type has fewer than three components
    /// or if `pixels` is smaller than the image this grid was created for.
    #[must_use]
    pub fn samples<Color, Component, const N: usize>(
        &self,
        pixels: &PixelMatrix<'_, Color>,
    ) -> Vec<[f32; 3]>
    where
        Color: ColorComponents<Component, N>,
        Component: AsPrimitive<f32>,
    {
        let mut samples = vec![[0.0; 3]; self.len()];
        for (y, row) in samples.chunks_exact_mut(self.cols).enumerate() {
            self.sample_row(pixels, y, row);
        }
        samples
    }

    /// Samples the given [`PixelMatrix`] on this grid in parallel.
    ///
    /// Each grid row is written to its own disjoint chunk of the output.
    /// The result is identical to [`SampleGrid::samples`].
    ///
    /// # Panics
    /// See [`SampleGrid::samples`].
    #[cfg(feature = "threads")]
    #[must_use]
    pub fn samples_par<Color, Component, const N: usize>(
        &self,
        pixels: &PixelMatrix<'_, Color>,
    ) -> Vec<[f32; 3]>
    where
        Color: ColorComponents<Component, N> + Sync,
        Component: AsPrimitive<f32>,
    {
        let mut samples = vec![[0.0; 3]; self.len()];
        samples
            .par_chunks_exact_mut(self.cols)
            .enumerate()
            .for_each(|(y, row)| self.sample_row(pixels, y, row));
        samples
    }
}
