#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

//! Extracts the major colors of each image and ranks them by similarity to the first one.
//!
//! ```text
//! cargo run --release --example compare -- query.png a.jpg b.jpg c.png
//! ```

use std::{
    error::Error,
    path::{Path, PathBuf},
};

use clap::Parser;
use majorcolor::{
    kmeans::{Kmeans, KmeansOptions},
    major_colors, major_colors_par, rank_by_similarity, ColorSignature, PixelMatrix,
};
use rayon::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
pub struct Options {
    /// Seed for the k-means initialization.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of threads to use, where 0 uses all available cores.
    #[arg(short, long, default_value_t = 0)]
    threads: u8,

    /// Log timings and intermediate results (overridden by `RUST_LOG`).
    #[arg(long)]
    verbose: bool,

    /// The query image.
    query: PathBuf,

    /// Images to rank against the query.
    #[arg(required = true)]
    candidates: Vec<PathBuf>,
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "majorcolor=debug,compare=info" } else { "warn" })
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn signature(
    path: &Path,
    kmeans: &Kmeans,
    threads: u8,
) -> Result<ColorSignature, Box<dyn Error + Send + Sync>> {
    let time = std::time::Instant::now();
    let image = image::open(path)?.into_rgb8();
    let pixels = PixelMatrix::try_from(&image)?;

    let signature = if threads == 1 {
        major_colors(&pixels, kmeans)?
    } else {
        major_colors_par(&pixels, kmeans)?
    };

    info!(
        path = %path.display(),
        %signature,
        ms = time.elapsed().as_millis(),
        "extracted signature"
    );

    Ok(signature)
}

fn run(options: Options) -> Result<(), Box<dyn Error + Send + Sync>> {
    let Options { seed, threads, query, candidates, .. } = options;

    let kmeans = Kmeans::new(KmeansOptions::new().seed(seed).parallel(threads != 1));

    let query_signature = signature(&query, &kmeans, threads)?;
    let signatures = candidates
        .par_iter()
        .map(|path| signature(path, &kmeans, threads).map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    println!("{}: {query_signature}", query.display());
    for (i, similarity) in rank_by_similarity(&query_signature, &signatures) {
        println!(
            "{similarity:.4}  {}: {}",
            candidates[i].display(),
            signatures[i]
        );
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let options = Options::parse();
    setup_logging(options.verbose);

    match options.threads {
        0 => run(options),
        t => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(t.into())
                .build()?;

            pool.install(|| run(options))
        }
    }
}
