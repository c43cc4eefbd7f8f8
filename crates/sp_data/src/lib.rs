//! Dataset conventions and artifact I/O for the segprop pipeline.
//!
//! A dataset is a directory tree whose files follow the Cityscapes-style
//! naming convention, one artifact kind per subdirectory:
//!
//! ```text
//! <root>/images/<name>_leftImg8bit.png        input images
//! <root>/gt/<name>_gtFine_labelIds.png        ground-truth label maps
//! <root>/<set>/<name>_scribble.png            scribble annotations (optional)
//! <root>/superpixels/<name>_superpixels.npy   precomputed superpixel maps
//! <root>/probs/<name>_leftImg8bit.npy         precomputed class score maps
//! ```
//!
//! [`Dataset::discover`] enumerates the samples; the loaders in this crate
//! turn the individual artifacts into typed arrays, and [`output`] writes
//! the per-sample prediction PNGs back out.

mod dataset;
mod npy;

pub mod output;
pub mod scribble;

pub use self::dataset::{
    Dataset, Sample, GT_SUFFIX, IMAGE_SUFFIX, PROB_SUFFIX, SCRIBBLE_SUFFIX, SUPERPIXEL_SUFFIX,
};
pub use self::npy::{load_probabilities, load_superpixels};

use std::path::PathBuf;

// ---

#[derive(thiserror::Error, Debug)]
pub enum DataError {
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode or encode image {path:?}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read array {path:?}")]
    Npy {
        path: PathBuf,
        #[source]
        source: ndarray_npy::ReadNpyError,
    },

    #[error("{path:?} has shape {shape:?}, expected {expected}")]
    BadShape {
        path: PathBuf,
        shape: Vec<usize>,
        expected: &'static str,
    },

    #[error("{path:?} contains superpixel id {value}, which is not a valid region id")]
    BadRegionId { path: PathBuf, value: i64 },

    #[error("too many scribble instances of class {class} to encode")]
    SeedOverflow { class: u8 },

    #[error(transparent)]
    Codec(#[from] sp_types::CodecError),
}

pub type DataResult<T> = Result<T, DataError>;
