use std::collections::BTreeMap;

use ndarray::Array2;

use crate::{GraphError, GraphResult};

/// Splits superpixels along the seed annotation.
///
/// Every `(superpixel, seed label)` combination becomes its own region, so a
/// superpixel crossed by two different scribbles ends up as three regions:
/// one per scribble plus the unseeded remainder. This establishes the seed
/// purity [`RegionGraph::build`](crate::RegionGraph::build) relies on: no
/// region contains pixels of more than one seed label.
///
/// Region ids are re-densified to `0..R` in ascending `(superpixel, seed)`
/// order, which keeps the output independent of pixel iteration order.
pub fn split_by_seeds(
    superpixels: &Array2<u32>,
    seeds: &Array2<u16>,
) -> GraphResult<Array2<u32>> {
    if superpixels.dim() != seeds.dim() {
        return Err(GraphError::DimensionMismatch {
            what: "seed map",
            got: seeds.dim(),
            expected: superpixels.dim(),
        });
    }

    let mut remap = BTreeMap::<(u32, u16), u32>::new();
    for (&region, &seed) in superpixels.iter().zip(seeds.iter()) {
        remap.entry((region, seed)).or_insert(0);
    }
    for (dense, (_, slot)) in remap.iter_mut().enumerate() {
        *slot = dense as u32;
    }

    Ok(Array2::from_shape_fn(superpixels.dim(), |(y, x)| {
        remap[&(superpixels[(y, x)], seeds[(y, x)])]
    }))
}

// ----------------------------------------------------------------------------
