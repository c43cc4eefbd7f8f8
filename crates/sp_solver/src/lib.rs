//! Heuristic label propagation over the superpixel region graph.
//!
//! Given a [`sp_graph::RegionGraph`] whose nodes carry seed labels and mean
//! class scores, [`heuristic::solve`] assigns every region one of the seed
//! labels by greedy energy minimization: a data term rewards regions for
//! taking a label whose class their score map supports, a contrast-sensitive
//! smoothness term charges for label changes across region boundaries, and
//! scribble-seeded regions are hard-constrained to their seed.

pub mod heuristic;

pub use self::heuristic::{energy, solve};

/// One label per region, indexed by region id.
pub type Labeling = Vec<u16>;

// ---

/// The three scalar hyperparameters of the propagation energy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Weights {
    /// Overall smoothness scale; `0` disables the boundary term entirely.
    pub lambda: f64,

    /// Constant (contrast-blind) boundary cost.
    pub psi: f64,

    /// Contrast-sensitive boundary cost; discourages label changes between
    /// similarly colored regions more than across strong color edges.
    pub phi: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            lambda: 0.1,
            psi: 0.0,
            phi: 0.3,
        }
    }
}

// ---

#[derive(thiserror::Error, Debug)]
pub enum SolverError {
    #[error("the graph carries no seed labels, nothing to propagate")]
    NoSeeds,

    #[error("the graph carries no region scores, probabilities were not attached")]
    ScoresMissing,

    #[error("labeling has {got} entries, the graph has {expected} regions")]
    BadLabeling { got: usize, expected: usize },
}

pub type SolverResult<T> = Result<T, SolverError>;
