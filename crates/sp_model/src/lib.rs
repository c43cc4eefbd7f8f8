//! Where the per-pixel class scores come from.
//!
//! The propagation pipeline does not care how its probability maps are
//! produced; [`ProbabilitySource`] is that seam. The default source reads
//! the precomputed `.npy` artifacts shipped with the dataset; with the
//! `onnx` feature an [`onnx::OnnxModel`] runs the forward pass locally
//! instead, through the usual CNN plumbing in [`process`].

#[cfg(feature = "onnx")]
pub mod onnx;
pub mod process;

pub use self::process::{preprocess, softmax_channels, upsample_bilinear};

use image::RgbImage;
use ndarray::Array3;
use sp_data::{Dataset, Sample};

// ---

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error(transparent)]
    Data(#[from] sp_data::DataError),

    #[cfg(feature = "onnx")]
    #[error("failed to run the onnx model")]
    Inference(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[cfg(feature = "onnx")]
    #[error("model output has shape {shape:?}, expected (1, classes, height, width)")]
    BadOutputShape { shape: Vec<usize> },
}

pub type ModelResult<T> = Result<T, ModelError>;

// ---

/// Produces the `(classes, height, width)` score map for one sample.
pub trait ProbabilitySource {
    fn probabilities(
        &self,
        dataset: &Dataset,
        sample: &Sample,
        image: &RgbImage,
    ) -> ModelResult<Array3<f32>>;
}

/// Reads the per-sample `.npy` score maps precomputed by the network.
pub struct PrecomputedProbabilities;

impl ProbabilitySource for PrecomputedProbabilities {
    fn probabilities(
        &self,
        dataset: &Dataset,
        sample: &Sample,
        _image: &RgbImage,
    ) -> ModelResult<Array3<f32>> {
        Ok(dataset.load_probabilities(sample)?)
    }
}

// ----------------------------------------------------------------------------
