//! Local inference with an ONNX segmentation model via tract.

use std::path::Path;

use image::RgbImage;
use ndarray::Array3;
use sp_data::{Dataset, Sample};
use tract_onnx::prelude::*;

use crate::process::{preprocess, upsample_bilinear, INPUT_SIZE};
use crate::{ModelError, ModelResult, ProbabilitySource};

/// A segmentation network loaded and optimized once, then reused for every
/// sample in the run.
pub struct OnnxModel {
    plan: TypedRunnableModel<TypedModel>,
}

impl OnnxModel {
    /// Loads the model and pins its input to `(1, 3, 513, 513)` f32.
    pub fn load(path: &Path) -> ModelResult<Self> {
        let size = INPUT_SIZE as usize;
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact([1, 3, size, size]).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(ModelError::inference)?;
        Ok(Self { plan })
    }

    /// One forward pass: preprocess, run, upsample the class scores back to
    /// the image's resolution.
    pub fn infer(&self, image: &RgbImage) -> ModelResult<Array3<f32>> {
        let input = preprocess(image);
        let size = INPUT_SIZE as usize;
        let tensor: Tensor =
            tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
                input[(c, y, x)]
            })
            .into();

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(ModelError::inference)?;
        let view = outputs[0]
            .to_array_view::<f32>()
            .map_err(ModelError::inference)?;

        let shape = view.shape().to_vec();
        if shape.len() != 4 || shape[0] != 1 {
            return Err(ModelError::BadOutputShape { shape });
        }
        let (channels, out_h, out_w) = (shape[1], shape[2], shape[3]);
        let mut scores = Array3::zeros((channels, out_h, out_w));
        for c in 0..channels {
            for y in 0..out_h {
                for x in 0..out_w {
                    scores[(c, y, x)] = view[[0, c, y, x]];
                }
            }
        }

        let (w, h) = image.dimensions();
        Ok(upsample_bilinear(&scores, h as usize, w as usize))
    }
}

impl ProbabilitySource for OnnxModel {
    fn probabilities(
        &self,
        _dataset: &Dataset,
        _sample: &Sample,
        image: &RgbImage,
    ) -> ModelResult<Array3<f32>> {
        self.infer(image)
    }
}

impl ModelError {
    fn inference(err: TractError) -> Self {
        Self::Inference(err.into())
    }
}
