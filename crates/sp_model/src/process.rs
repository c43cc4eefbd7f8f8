//! The CNN pre- and post-processing steps around the forward pass.

use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array3;

/// Side length of the square network input.
pub const INPUT_SIZE: u32 = 513;

/// Per-channel mean subtracted from the resized input, RGB order.
pub const CHANNEL_MEAN: [f32; 3] = [104.0, 117.0, 123.0];

/// Resizes to [`INPUT_SIZE`] x [`INPUT_SIZE`] (bilinear), subtracts the
/// channel means and lays the result out as a `(3, H, W)` float tensor.
pub fn preprocess(image: &RgbImage) -> Array3<f32> {
    let resized = image::imageops::resize(image, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

    let size = INPUT_SIZE as usize;
    let mut out = Array3::zeros((3, size, size));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            out[(c, y as usize, x as usize)] = f32::from(pixel.0[c]) - CHANNEL_MEAN[c];
        }
    }
    out
}

/// Bilinearly resizes each channel of a `(C, h, w)` map to
/// `(C, height, width)`, with half-pixel centers.
pub fn upsample_bilinear(scores: &Array3<f32>, height: usize, width: usize) -> Array3<f32> {
    let (channels, in_h, in_w) = scores.dim();
    if (in_h, in_w) == (height, width) {
        return scores.clone();
    }

    let sy = in_h as f64 / height as f64;
    let sx = in_w as f64 / width as f64;
    let mut out = Array3::zeros((channels, height, width));
    for y in 0..height {
        let fy = ((y as f64 + 0.5) * sy - 0.5).clamp(0.0, (in_h - 1) as f64);
        let y0 = fy.floor() as usize;
        let y1 = (y0 + 1).min(in_h - 1);
        let wy = fy - y0 as f64;
        for x in 0..width {
            let fx = ((x as f64 + 0.5) * sx - 0.5).clamp(0.0, (in_w - 1) as f64);
            let x0 = fx.floor() as usize;
            let x1 = (x0 + 1).min(in_w - 1);
            let wx = fx - x0 as f64;
            for c in 0..channels {
                let top = f64::from(scores[(c, y0, x0)]) * (1.0 - wx)
                    + f64::from(scores[(c, y0, x1)]) * wx;
                let bottom = f64::from(scores[(c, y1, x0)]) * (1.0 - wx)
                    + f64::from(scores[(c, y1, x1)]) * wx;
                out[(c, y, x)] = (top * (1.0 - wy) + bottom * wy) as f32;
            }
        }
    }
    out
}

/// Per-pixel softmax across the channel axis, turning logits into
/// probabilities. Max-shifted, so large logits do not overflow.
pub fn softmax_channels(scores: &Array3<f32>) -> Array3<f32> {
    let (channels, h, w) = scores.dim();
    let mut out = scores.clone();
    for y in 0..h {
        for x in 0..w {
            let mut max = f32::NEG_INFINITY;
            for c in 0..channels {
                max = max.max(scores[(c, y, x)]);
            }
            let mut sum = 0.0_f32;
            for c in 0..channels {
                let e = (scores[(c, y, x)] - max).exp();
                out[(c, y, x)] = e;
                sum += e;
            }
            for c in 0..channels {
                out[(c, y, x)] /= sum;
            }
        }
    }
    out
}

// ----------------------------------------------------------------------------
