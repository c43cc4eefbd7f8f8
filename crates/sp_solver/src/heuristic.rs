//! Iterated conditional modes over the region graph.
//!
//! The objective being minimized is
//!
//! ```text
//! E(L) = sum_r  -area(r) * score(r, class(L(r)))
//!      + sum_(r,s)  [L(r) != L(s)] * lambda * boundary(r,s)
//!                   * (psi + phi * exp(-beta * |color(r) - color(s)|^2))
//! ```
//!
//! with `beta` estimated from the mean squared color difference across
//! adjacent regions, so the contrast term adapts to the image's dynamic
//! range. Labels are instance-encoded; `class(l)` is `l` modulo the class
//! count, so two instances of one class read the same score channel and
//! only the smoothness term separates them.

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef as _;
use sp_graph::{RegionEdge, RegionGraph, RegionNode};

use crate::{Labeling, SolverError, SolverResult, Weights};

/// Sweeps are cheap and convergence is typically fast; the cap only guards
/// against pathological oscillation.
const MAX_SWEEPS: usize = 100;

/// Propagates seed labels to every region by greedy descent.
///
/// Deterministic for a fixed graph: regions are initialized to their best
/// data-term label, then swept in ascending region order, each taking the
/// first strictly better label from the ascending seed-label domain.
/// Seeded regions never change their label. Stops at the first sweep
/// without changes.
pub fn solve(graph: &RegionGraph, weights: &Weights) -> SolverResult<Labeling> {
    let domain = graph.seed_labels();
    if domain.is_empty() {
        return Err(SolverError::NoSeeds);
    }
    let num_classes = graph.num_classes();
    if num_classes == 0 {
        return Err(SolverError::ScoresMissing);
    }

    let g = graph.petgraph();
    let beta = contrast_beta(g);

    let mut labeling: Labeling = g
        .node_indices()
        .map(|idx| {
            let node = &g[idx];
            if let Some(seed) = node.seed {
                return seed;
            }
            let mut best = domain[0];
            let mut best_cost = unary(node, domain[0], num_classes);
            for &label in &domain[1..] {
                let cost = unary(node, label, num_classes);
                if cost < best_cost {
                    best = label;
                    best_cost = cost;
                }
            }
            best
        })
        .collect();

    for sweep in 0..MAX_SWEEPS {
        let mut changes = 0_usize;

        for idx in g.node_indices() {
            let node = &g[idx];
            if node.seed.is_some() {
                continue;
            }

            let local = |label: u16| {
                let mut cost = unary(node, label, num_classes);
                for edge in g.edges(idx) {
                    if labeling[edge.target().index()] != label {
                        cost +=
                            boundary_cost(weights, beta, edge.weight(), node, &g[edge.target()]);
                    }
                }
                cost
            };

            let current = labeling[idx.index()];
            let mut best = current;
            let mut best_cost = local(current);
            for &candidate in &domain {
                if candidate == current {
                    continue;
                }
                let cost = local(candidate);
                if cost < best_cost {
                    best = candidate;
                    best_cost = cost;
                }
            }

            if best != current {
                labeling[idx.index()] = best;
                changes += 1;
            }
        }

        tracing::debug!("sweep {sweep}: {changes} label changes");
        if changes == 0 {
            return Ok(labeling);
        }
    }

    tracing::warn!("label propagation did not settle within {MAX_SWEEPS} sweeps");
    Ok(labeling)
}

/// The objective [`solve`] descends on, for a given labeling.
pub fn energy(graph: &RegionGraph, weights: &Weights, labeling: &[u16]) -> SolverResult<f64> {
    let g = graph.petgraph();
    if labeling.len() != g.node_count() {
        return Err(SolverError::BadLabeling {
            got: labeling.len(),
            expected: g.node_count(),
        });
    }
    let num_classes = graph.num_classes();
    if num_classes == 0 {
        return Err(SolverError::ScoresMissing);
    }

    let beta = contrast_beta(g);
    let mut total = 0.0;
    for idx in g.node_indices() {
        total += unary(&g[idx], labeling[idx.index()], num_classes);
    }
    for edge in g.edge_references() {
        if labeling[edge.source().index()] != labeling[edge.target().index()] {
            total += boundary_cost(
                weights,
                beta,
                edge.weight(),
                &g[edge.source()],
                &g[edge.target()],
            );
        }
    }
    Ok(total)
}

// ---

#[inline]
fn unary(node: &RegionNode, label: u16, num_classes: usize) -> f64 {
    let class = label as usize % num_classes;
    -f64::from(node.area) * f64::from(node.scores[class])
}

#[inline]
fn boundary_cost(
    weights: &Weights,
    beta: f64,
    edge: &RegionEdge,
    a: &RegionNode,
    b: &RegionNode,
) -> f64 {
    let contrast = (-beta * color_dist2(a.mean_color, b.mean_color)).exp();
    weights.lambda * f64::from(edge.boundary) * (weights.psi + weights.phi * contrast)
}

/// `1 / (2 * mean squared color difference)` across adjacent regions, the
/// usual automatic scale for contrast-sensitive smoothing. `0` (contrast
/// term becomes constant) when all adjacent regions have equal color.
fn contrast_beta(g: &UnGraph<RegionNode, RegionEdge>) -> f64 {
    let mut sum = 0.0;
    let mut edges = 0_usize;
    for edge in g.edge_references() {
        sum += color_dist2(g[edge.source()].mean_color, g[edge.target()].mean_color);
        edges += 1;
    }
    if edges == 0 {
        return 0.0;
    }
    let mean = sum / edges as f64;
    if mean > 0.0 {
        1.0 / (2.0 * mean)
    } else {
        0.0
    }
}

#[inline]
fn color_dist2(a: [f32; 3], b: [f32; 3]) -> f64 {
    let dr = f64::from(a[0]) - f64::from(b[0]);
    let dg = f64::from(a[1]) - f64::from(b[1]);
    let db = f64::from(a[2]) - f64::from(b[2]);
    dr * dr + dg * dg + db * db
}

// ----------------------------------------------------------------------------
