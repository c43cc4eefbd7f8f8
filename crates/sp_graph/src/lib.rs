//! The superpixel region-adjacency graph that label propagation runs on.
//!
//! Pixels are grouped into superpixel regions; [`split_by_seeds`] first
//! carves scribbled pixels out of their region so that every region carries
//! at most one seed label, then [`RegionGraph::build`] turns the region map
//! into an undirected graph whose nodes hold per-region statistics and whose
//! edges hold shared boundary lengths. [`render_labeling`] paints a
//! per-region labeling back onto the pixel grid.

mod graph;
mod render;
mod superpixels;

pub use self::graph::{RegionEdge, RegionGraph, RegionNode};
pub use self::render::render_labeling;
pub use self::superpixels::split_by_seeds;

// ---

#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    #[error("{what} has dimensions {got:?}, expected {expected:?}")]
    DimensionMismatch {
        what: &'static str,
        got: (usize, usize),
        expected: (usize, usize),
    },

    #[error("region {region} carries conflicting seed labels {first} and {second}")]
    ConflictingSeeds { region: u32, first: u16, second: u16 },

    #[error("region {region} contains no pixels")]
    EmptyRegion { region: u32 },

    #[error("region id {region} is out of range for {regions} regions")]
    RegionOutOfRange { region: u32, regions: usize },

    #[error("probability map has no class channels")]
    NoChannels,
}

pub type GraphResult<T> = Result<T, GraphError>;
