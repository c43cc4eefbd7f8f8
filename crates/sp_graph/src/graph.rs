use std::collections::BTreeMap;

use image::RgbImage;
use itertools::Itertools as _;
use ndarray::{Array2, Array3};
use petgraph::graph::{NodeIndex, UnGraph};
use sp_types::UNSEEDED;

use crate::{GraphError, GraphResult};

// ---

/// Per-region statistics carried by a graph node.
#[derive(Clone, Debug)]
pub struct RegionNode {
    /// Pixel count of the region.
    pub area: u32,

    /// Mean RGB color over the region's pixels.
    pub mean_color: [f32; 3],

    /// The region's seed label, if a scribble touches it.
    pub seed: Option<u16>,

    /// Mean class scores over the region's pixels; empty until
    /// [`RegionGraph::attach_probabilities`] runs.
    pub scores: Vec<f32>,
}

/// Adjacency between two regions.
#[derive(Clone, Debug)]
pub struct RegionEdge {
    /// Number of 4-adjacent pixel pairs straddling the two regions.
    pub boundary: u32,
}

/// Region-adjacency graph over a split superpixel map.
///
/// Node indices coincide with region ids: region `r` is `NodeIndex::new(r)`.
#[derive(Clone, Debug)]
pub struct RegionGraph {
    graph: UnGraph<RegionNode, RegionEdge>,
    num_classes: usize,
}

impl RegionGraph {
    /// Builds the graph from a dense region map, per-pixel seeds and the
    /// source image.
    ///
    /// The region map is expected to be seed-pure (see
    /// [`split_by_seeds`](crate::split_by_seeds)); a region touching two
    /// different seed labels is an invariant violation and an error, as is a
    /// region id with no pixels.
    pub fn build(
        superpixels: &Array2<u32>,
        seeds: &Array2<u16>,
        image: &RgbImage,
    ) -> GraphResult<Self> {
        let dim = superpixels.dim();
        if seeds.dim() != dim {
            return Err(GraphError::DimensionMismatch {
                what: "seed map",
                got: seeds.dim(),
                expected: dim,
            });
        }
        let (w, h) = image.dimensions();
        if (h as usize, w as usize) != dim {
            return Err(GraphError::DimensionMismatch {
                what: "image",
                got: (h as usize, w as usize),
                expected: dim,
            });
        }

        let regions = superpixels.iter().max().map_or(0, |&r| r as usize + 1);

        let mut area = vec![0_u32; regions];
        let mut color_sum = vec![[0_f64; 3]; regions];
        let mut seed = vec![None; regions];
        let mut boundary = BTreeMap::<(u32, u32), u32>::new();

        let (height, width) = dim;
        for y in 0..height {
            for x in 0..width {
                let region = superpixels[(y, x)];
                let r = region as usize;

                area[r] += 1;
                let rgb = image.get_pixel(x as u32, y as u32).0;
                for (sum, &channel) in color_sum[r].iter_mut().zip(rgb.iter()) {
                    *sum += f64::from(channel);
                }

                let s = seeds[(y, x)];
                if s != UNSEEDED {
                    match seed[r] {
                        None => seed[r] = Some(s),
                        Some(existing) if existing != s => {
                            return Err(GraphError::ConflictingSeeds {
                                region,
                                first: existing,
                                second: s,
                            });
                        }
                        Some(_) => {}
                    }
                }

                // 4-adjacency, counted once per pixel pair
                if x + 1 < width {
                    note_adjacency(&mut boundary, region, superpixels[(y, x + 1)]);
                }
                if y + 1 < height {
                    note_adjacency(&mut boundary, region, superpixels[(y + 1, x)]);
                }
            }
        }

        let mut graph = UnGraph::with_capacity(regions, boundary.len());
        for r in 0..regions {
            if area[r] == 0 {
                return Err(GraphError::EmptyRegion { region: r as u32 });
            }
            let inv = 1.0 / f64::from(area[r]);
            let node = RegionNode {
                area: area[r],
                mean_color: [
                    (color_sum[r][0] * inv) as f32,
                    (color_sum[r][1] * inv) as f32,
                    (color_sum[r][2] * inv) as f32,
                ],
                seed: seed[r],
                scores: Vec::new(),
            };
            let idx = graph.add_node(node);
            debug_assert_eq!(idx.index(), r);
        }
        for (&(a, b), &length) in &boundary {
            graph.add_edge(
                NodeIndex::new(a as usize),
                NodeIndex::new(b as usize),
                RegionEdge { boundary: length },
            );
        }

        Ok(Self {
            graph,
            num_classes: 0,
        })
    }

    /// Aggregates a `(classes, height, width)` score map into per-region
    /// mean score vectors.
    pub fn attach_probabilities(
        &mut self,
        superpixels: &Array2<u32>,
        probs: &Array3<f32>,
    ) -> GraphResult<()> {
        let (channels, h, w) = probs.dim();
        if channels == 0 {
            return Err(GraphError::NoChannels);
        }
        if (h, w) != superpixels.dim() {
            return Err(GraphError::DimensionMismatch {
                what: "probability map",
                got: (h, w),
                expected: superpixels.dim(),
            });
        }

        let regions = self.graph.node_count();
        let mut sum = vec![0_f64; regions * channels];
        let mut count = vec![0_u32; regions];

        for ((y, x), &region) in superpixels.indexed_iter() {
            let r = region as usize;
            if r >= regions {
                return Err(GraphError::RegionOutOfRange { region, regions });
            }
            count[r] += 1;
            for c in 0..channels {
                sum[r * channels + c] += f64::from(probs[(c, y, x)]);
            }
        }

        for r in 0..regions {
            if count[r] == 0 {
                return Err(GraphError::EmptyRegion { region: r as u32 });
            }
            let inv = 1.0 / f64::from(count[r]);
            let node = &mut self.graph[NodeIndex::new(r)];
            node.scores = (0..channels)
                .map(|c| (sum[r * channels + c] * inv) as f32)
                .collect();
        }

        self.num_classes = channels;
        Ok(())
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Class-channel count of the attached score map; `0` before
    /// [`Self::attach_probabilities`].
    #[inline]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    #[inline]
    pub fn petgraph(&self) -> &UnGraph<RegionNode, RegionEdge> {
        &self.graph
    }

    /// The distinct seed labels present, ascending. This is the label
    /// domain the solver assigns from.
    pub fn seed_labels(&self) -> Vec<u16> {
        self.graph
            .node_weights()
            .filter_map(|node| node.seed)
            .sorted_unstable()
            .dedup()
            .collect()
    }
}

#[inline]
fn note_adjacency(boundary: &mut BTreeMap<(u32, u32), u32>, a: u32, b: u32) {
    if a == b {
        return;
    }
    let key = if a < b { (a, b) } else { (b, a) };
    *boundary.entry(key).or_insert(0) += 1;
}

// ----------------------------------------------------------------------------
