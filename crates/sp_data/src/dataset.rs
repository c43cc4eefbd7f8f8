use std::path::{Path, PathBuf};

use image::RgbImage;
use ndarray::{Array2, Array3};
use sp_types::ClassTable;

use crate::{npy, DataError, DataResult};

// ---

pub const IMAGE_SUFFIX: &str = "_leftImg8bit.png";
pub const GT_SUFFIX: &str = "_gtFine_labelIds.png";
pub const SCRIBBLE_SUFFIX: &str = "_scribble.png";
pub const SUPERPIXEL_SUFFIX: &str = "_superpixels.npy";
pub const PROB_SUFFIX: &str = "_leftImg8bit.npy";

/// One sample of a [`Dataset`], identified by its base name, i.e. the
/// filename with the artifact suffix stripped.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Sample {
    pub name: String,
}

/// A dataset root directory with its enumerated samples.
///
/// Discovery only looks at `images/`; the other artifacts are resolved
/// lazily by the loaders, so a missing file surfaces as an error (or, for
/// scribbles, as `None`) when the sample is actually processed.
pub struct Dataset {
    root: PathBuf,
    scribble_set: String,
    samples: Vec<Sample>,
}

impl Dataset {
    /// Enumerates the samples under `root/images`, in sorted name order.
    pub fn discover(root: impl Into<PathBuf>, scribble_set: impl Into<String>) -> DataResult<Self> {
        let root = root.into();
        let images_dir = root.join("images");

        let entries = std::fs::read_dir(&images_dir).map_err(|source| DataError::Io {
            path: images_dir.clone(),
            source,
        })?;

        let mut samples = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| DataError::Io {
                path: images_dir.clone(),
                source,
            })?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            match file_name.strip_suffix(IMAGE_SUFFIX) {
                Some(name) if !name.is_empty() => samples.push(Sample {
                    name: name.to_owned(),
                }),
                _ => {
                    tracing::debug!("ignoring {file_name:?}: no {IMAGE_SUFFIX} suffix");
                }
            }
        }

        // Sorted order keeps runs reproducible independent of directory
        // enumeration order.
        samples.sort();

        Ok(Self {
            root,
            scribble_set: scribble_set.into(),
            samples,
        })
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn scribble_set(&self) -> &str {
        &self.scribble_set
    }

    #[inline]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    // --- paths ---

    pub fn image_path(&self, sample: &Sample) -> PathBuf {
        self.root
            .join("images")
            .join(format!("{}{IMAGE_SUFFIX}", sample.name))
    }

    pub fn ground_truth_path(&self, sample: &Sample) -> PathBuf {
        self.root.join("gt").join(format!("{}{GT_SUFFIX}", sample.name))
    }

    pub fn scribble_path(&self, sample: &Sample) -> PathBuf {
        self.root
            .join(&self.scribble_set)
            .join(format!("{}{SCRIBBLE_SUFFIX}", sample.name))
    }

    pub fn superpixel_path(&self, sample: &Sample) -> PathBuf {
        self.root
            .join("superpixels")
            .join(format!("{}{SUPERPIXEL_SUFFIX}", sample.name))
    }

    pub fn probability_path(&self, sample: &Sample) -> PathBuf {
        self.root
            .join("probs")
            .join(format!("{}{PROB_SUFFIX}", sample.name))
    }

    // --- loaders ---

    pub fn load_image(&self, sample: &Sample) -> DataResult<RgbImage> {
        let path = self.image_path(sample);
        Ok(open_image(&path)?.into_rgb8())
    }

    /// Ground-truth label map: one class id per pixel, `255` = void.
    pub fn load_ground_truth(&self, sample: &Sample) -> DataResult<Array2<u8>> {
        let path = self.ground_truth_path(sample);
        let img = open_image(&path)?.into_luma8();
        Ok(luma_to_labels(&img))
    }

    /// Scribble annotation decoded to per-pixel class ids, or `None` when
    /// the sample has no scribble file. The caller decides what a missing
    /// annotation means (the driver skips the sample).
    pub fn load_scribble(
        &self,
        sample: &Sample,
        table: &ClassTable,
    ) -> DataResult<Option<Array2<u8>>> {
        let path = self.scribble_path(sample);
        if !path.exists() {
            return Ok(None);
        }
        let img = open_image(&path)?.into_rgb8();
        Ok(Some(sp_types::mask_to_labels(table, &img)?))
    }

    pub fn load_superpixels(&self, sample: &Sample) -> DataResult<Array2<u32>> {
        npy::load_superpixels(&self.superpixel_path(sample))
    }

    pub fn load_probabilities(&self, sample: &Sample) -> DataResult<Array3<f32>> {
        npy::load_probabilities(&self.probability_path(sample))
    }
}

// ---

fn open_image(path: &Path) -> DataResult<image::DynamicImage> {
    image::open(path).map_err(|source| DataError::Image {
        path: path.to_owned(),
        source,
    })
}

fn luma_to_labels(img: &image::GrayImage) -> Array2<u8> {
    let (w, h) = img.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
        img.get_pixel(x as u32, y as u32).0[0]
    })
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn discovery_is_sorted_and_ignores_strays() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir(&images).unwrap();

        touch(&images.join("zurich_000002_leftImg8bit.png"));
        touch(&images.join("aachen_000001_leftImg8bit.png"));
        touch(&images.join("notes.txt"));
        touch(&images.join("munich_000003_leftImg8bit.jpg"));

        let dataset = Dataset::discover(dir.path(), "scribbles").unwrap();
        let names: Vec<&str> = dataset.samples().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["aachen_000001", "zurich_000002"]);
    }

    #[test]
    fn discovery_fails_without_images_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Dataset::discover(dir.path(), "scribbles"),
            Err(DataError::Io { .. })
        ));
    }

    #[test]
    fn paths_follow_the_naming_convention() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("images")).unwrap();
        let dataset = Dataset::discover(dir.path(), "scribbles_v2").unwrap();

        let sample = Sample {
            name: "aachen_000001".to_owned(),
        };
        assert_eq!(
            dataset.image_path(&sample),
            dir.path().join("images/aachen_000001_leftImg8bit.png")
        );
        assert_eq!(
            dataset.ground_truth_path(&sample),
            dir.path().join("gt/aachen_000001_gtFine_labelIds.png")
        );
        assert_eq!(
            dataset.scribble_path(&sample),
            dir.path().join("scribbles_v2/aachen_000001_scribble.png")
        );
        assert_eq!(
            dataset.superpixel_path(&sample),
            dir.path().join("superpixels/aachen_000001_superpixels.npy")
        );
        assert_eq!(
            dataset.probability_path(&sample),
            dir.path().join("probs/aachen_000001_leftImg8bit.npy")
        );
    }

    #[test]
    fn missing_scribble_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("images")).unwrap();
        let dataset = Dataset::discover(dir.path(), "scribbles").unwrap();

        let sample = Sample {
            name: "aachen_000001".to_owned(),
        };
        let table = ClassTable::cityscapes();
        assert!(dataset.load_scribble(&sample, &table).unwrap().is_none());
    }
}
