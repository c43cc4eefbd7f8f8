use ndarray::Array2;

use crate::{GraphError, GraphResult};

/// Paints per-region labels back onto the pixel grid.
///
/// `labels[r]` is the label of region `r`; the output has the region map's
/// dimensions with every pixel replaced by its region's label.
pub fn render_labeling(superpixels: &Array2<u32>, labels: &[u16]) -> GraphResult<Array2<u16>> {
    let mut out = Array2::zeros(superpixels.dim());
    for (slot, &region) in out.iter_mut().zip(superpixels.iter()) {
        let Some(&label) = labels.get(region as usize) else {
            return Err(GraphError::RegionOutOfRange {
                region,
                regions: labels.len(),
            });
        };
        *slot = label;
    }
    Ok(out)
}

// ----------------------------------------------------------------------------
