use image::RgbImage;
use ndarray::Array2;

use crate::{ClassTable, VOID_LABEL};

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("color {color:?} at ({x}, {y}) is not in the class table")]
    UnknownColor { color: [u8; 3], x: u32, y: u32 },

    #[error("label {label} at ({x}, {y}) is not in the class table")]
    UnknownLabel { label: u8, x: usize, y: usize },
}

/// Decode a color-coded mask image into a dense label matrix.
///
/// Black pixels decode to [`VOID_LABEL`]; any color outside the table is an
/// error rather than a silent void, so corrupt annotations surface early.
pub fn mask_to_labels(table: &ClassTable, mask: &RgbImage) -> Result<Array2<u8>, CodecError> {
    let (width, height) = mask.dimensions();
    let mut labels = Array2::from_elem((height as usize, width as usize), VOID_LABEL);

    for (x, y, pixel) in mask.enumerate_pixels() {
        let color = [pixel[0], pixel[1], pixel[2]];
        let label = table
            .class_of_color(color)
            .ok_or(CodecError::UnknownColor { color, x, y })?;
        labels[(y as usize, x as usize)] = label;
    }

    Ok(labels)
}

/// Encode a dense label matrix as a color mask image for display.
pub fn labels_to_mask(table: &ClassTable, labels: &Array2<u8>) -> Result<RgbImage, CodecError> {
    let (height, width) = labels.dim();
    let mut mask = RgbImage::new(width as u32, height as u32);

    for ((y, x), &label) in labels.indexed_iter() {
        let color = table
            .color_of(label)
            .ok_or(CodecError::UnknownLabel { label, x, y })?;
        mask.put_pixel(x as u32, y as u32, image::Rgb(color));
    }

    Ok(mask)
}
