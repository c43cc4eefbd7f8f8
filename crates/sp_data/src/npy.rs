//! Loaders for the precomputed `.npy` dataset artifacts.

use std::collections::BTreeMap;
use std::path::Path;

use ndarray::{Array2, Array3, ArrayD, Axis, Ix3};

use crate::{DataError, DataResult};

/// Loads a superpixel map and densifies its region ids to `0..R`.
///
/// The artifact stores int64 region ids; they may be sparse (regions can
/// disappear when a segmentation is postprocessed), so ids are remapped to a
/// dense range in ascending original order.
pub fn load_superpixels(path: &Path) -> DataResult<Array2<u32>> {
    let raw: Array2<i64> = ndarray_npy::read_npy(path).map_err(|source| DataError::Npy {
        path: path.to_owned(),
        source,
    })?;

    let mut remap = BTreeMap::new();
    for &id in &raw {
        if id < 0 || id > i64::from(u32::MAX) {
            return Err(DataError::BadRegionId {
                path: path.to_owned(),
                value: id,
            });
        }
        remap.entry(id).or_insert(0_u32);
    }
    for (dense, (_, slot)) in remap.iter_mut().enumerate() {
        *slot = dense as u32;
    }

    Ok(raw.mapv(|id| remap[&id]))
}

/// Loads a per-class score map as `(classes, height, width)`.
///
/// Accepts f32 or f64 storage (f64 is cast down) and squeezes a leading
/// singleton batch axis, so `(1, C, H, W)` network output dumps load as-is.
pub fn load_probabilities(path: &Path) -> DataResult<Array3<f32>> {
    let raw: ArrayD<f32> = match ndarray_npy::read_npy(path) {
        Ok(arr) => arr,
        Err(first) => match ndarray_npy::read_npy::<_, ArrayD<f64>>(path) {
            Ok(arr) => arr.mapv(|v| v as f32),
            Err(_) => {
                return Err(DataError::Npy {
                    path: path.to_owned(),
                    source: first,
                });
            }
        },
    };

    let shape = raw.shape().to_vec();
    let raw = if raw.ndim() == 4 && shape[0] == 1 {
        raw.index_axis_move(Axis(0), 0)
    } else {
        raw
    };

    raw.into_dimensionality::<Ix3>()
        .map_err(|_| DataError::BadShape {
            path: path.to_owned(),
            shape,
            expected: "(classes, height, width) or (1, classes, height, width)",
        })
}

// ----------------------------------------------------------------------------
