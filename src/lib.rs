//! A library for extracting compact color signatures from images and comparing them.
//!
//! A [`ColorSignature`] holds the two "major colors" of an image: the centroids of the two most
//! populous clusters found by running k-means over an adaptively subsampled grid of pixels.
//! Two signatures are compared with [`similarity`], which returns a score in `(0, 1]`
//! that is suitable for nearest-neighbor search or ranking (see [`rank_by_similarity`]).
//!
//! Channel values are used as-is, so no color space conversion takes place.
//!
//! # Features
//! `majorcolor` has several `cargo` features that can be turned off or on:
//! - `kmeans`: exposes the built-in seeded k-means [`Clusterer`](crate::Clusterer).
//! - `threads`: exposes parallel versions of most functions via [`rayon`].
//! - `image`: enables integration with the [`image`] crate.
//!
//! # Example
//! ```no_run
//! # use majorcolor::{ColorSignature, PixelMatrix};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let a = image::open("some image")?.into_rgb8();
//! let b = image::open("another image")?.into_rgb8();
//!
//! let a = ColorSignature::from_pixels(&PixelMatrix::try_from(&a)?)?;
//! let b = ColorSignature::from_pixels(&PixelMatrix::try_from(&b)?)?;
//!
//! println!("{a} vs {b}: {}", a.similarity(&b));
//! # Ok(())
//! # }
//! ```
//!
//! Bring your own clustering by implementing [`Clusterer`] and calling [`major_colors`].

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod major;
mod sample;
mod similarity;
mod traits;
mod types;

#[cfg(feature = "kmeans")]
pub mod kmeans;

pub use major::*;
pub use sample::*;
pub use similarity::*;
pub use traits::*;
pub use types::*;

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;

/// The number of clusters requested from the [`Clusterer`] during extraction.
pub const MAJOR_COLORS_K: usize = 32;

/// The iteration cap passed to the [`Clusterer`] during extraction.
pub const MAJOR_COLORS_MAX_ITERATIONS: u32 = 20;

/// The nominal image edge length that the sampling density is defined against.
pub const REFERENCE_SIZE: f32 = 512.0;

/// The number of pixels between grid samples for an image of [`REFERENCE_SIZE`].
pub const GRID_STEP: f32 = 4.0;

/// The bandwidth of the Gaussian kernel used by [`similarity`], in channel units.
pub const SIMILARITY_SIGMA: f32 = 50.0;
