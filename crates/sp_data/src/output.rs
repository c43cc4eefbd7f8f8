//! Writes the per-sample prediction artifacts.
//!
//! Each processed sample produces two label-encoded PNGs named like the
//! Cityscapes ground truth, so downstream eval tooling can point at the
//! output directory as if it were an annotation set:
//!
//! ```text
//! <out>/<name>_gtFine_labelIds.png      8-bit semantic class ids
//! <out>/<name>_gtFine_instanceIds.png   16-bit instance ids (class*1000+k)
//! ```

use std::path::{Path, PathBuf};

use image::{GrayImage, ImageBuffer, Luma};
use ndarray::Array2;
use sp_types::{ClassTable, Prediction};

use crate::{DataError, DataResult, GT_SUFFIX};

pub const INSTANCE_SUFFIX: &str = "_gtFine_instanceIds.png";
pub const COLOR_SUFFIX: &str = "_color.png";

/// Sink for prediction PNGs; creates the output directory on construction.
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn create(dir: impl Into<PathBuf>) -> DataResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| DataError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn label_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}{GT_SUFFIX}"))
    }

    pub fn instance_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}{INSTANCE_SUFFIX}"))
    }

    pub fn color_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}{COLOR_SUFFIX}"))
    }

    /// Writes the two label-encoded PNGs for one sample.
    pub fn save_prediction(&self, name: &str, prediction: &Prediction) -> DataResult<()> {
        save_gray_u8(&self.label_path(name), &prediction.labels)?;
        save_gray_u16(&self.instance_path(name), &prediction.instances)
    }

    /// Optional palette rendering of the semantic labels, for eyeballing.
    pub fn save_color_mask(
        &self,
        name: &str,
        table: &ClassTable,
        labels: &Array2<u8>,
    ) -> DataResult<()> {
        let path = self.color_path(name);
        let mask = sp_types::labels_to_mask(table, labels)?;
        mask.save(&path)
            .map_err(|source| DataError::Image { path, source })
    }
}

fn save_gray_u8(path: &Path, values: &Array2<u8>) -> DataResult<()> {
    let (h, w) = values.dim();
    let img = GrayImage::from_fn(w as u32, h as u32, |x, y| {
        Luma([values[(y as usize, x as usize)]])
    });
    img.save(path).map_err(|source| DataError::Image {
        path: path.to_owned(),
        source,
    })
}

fn save_gray_u16(path: &Path, values: &Array2<u16>) -> DataResult<()> {
    let (h, w) = values.dim();
    let img: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_fn(w as u32, h as u32, |x, y| {
        Luma([values[(y as usize, x as usize)]])
    });
    img.save(path).map_err(|source| DataError::Image {
        path: path.to_owned(),
        source,
    })
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use ndarray::array;
    use sp_types::format_prediction;

    use super::*;

    #[test]
    fn prediction_pngs_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::create(dir.path().join("out")).unwrap();

        let table = ClassTable::cityscapes();
        // class 5 instance 0, class 5 instance 1, class 0 instance 0
        let encoded = array![
            [table.encode_instance(5, 0), table.encode_instance(5, 1)],
            [table.encode_instance(0, 0), table.encode_instance(0, 0)],
        ];
        let prediction = format_prediction(&table, &encoded);
        writer.save_prediction("sample", &prediction).unwrap();

        let labels = image::open(writer.label_path("sample")).unwrap().into_luma8();
        assert_eq!(labels.dimensions(), (2, 2));
        assert_eq!(labels.get_pixel(0, 0).0[0], 5);
        assert_eq!(labels.get_pixel(1, 0).0[0], 5);
        assert_eq!(labels.get_pixel(0, 1).0[0], 0);

        let instances = image::open(writer.instance_path("sample")).unwrap().into_luma16();
        assert_eq!(instances.get_pixel(0, 0).0[0], 5000);
        assert_eq!(instances.get_pixel(1, 0).0[0], 5001);
        assert_eq!(instances.get_pixel(0, 1).0[0], 0);
    }

    #[test]
    fn color_mask_uses_the_palette() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::create(dir.path()).unwrap();

        let table = ClassTable::cityscapes();
        let labels = array![[0u8, sp_types::VOID_LABEL]];
        writer.save_color_mask("sample", &table, &labels).unwrap();

        let mask = image::open(writer.color_path("sample")).unwrap().into_rgb8();
        let road = table.color_of(0).unwrap();
        assert_eq!(mask.get_pixel(0, 0).0, road);
        assert_eq!(mask.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn create_makes_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        let writer = OutputWriter::create(&nested).unwrap();
        assert!(writer.dir().is_dir());
    }
}
