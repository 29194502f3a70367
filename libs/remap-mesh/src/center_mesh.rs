//! # Center Mesh Triangulation
//!
//! Builds a triangle set over cell center points when only the cell
//! adjacency is known. The result is best effort: every undirected edge is
//! shared by at most two triangles, but coverage is not guaranteed.
//!
//! ## Algorithm
//!
//! For each cell `i` in ascending order:
//!
//! 1. Collect quads `{i, j, k, l}` of mutually adjacent cells. Each quad is
//!    split into two exclusive triangles along one diagonal. Adjacent triples
//!    without a fourth common neighbour become optional triangles.
//! 2. If `i` is part of a quad, offer the exclusive then the optional
//!    triangles to the state.
//! 3. Otherwise offer every adjacent triple `(i, j, k)` directly.
//!
//! A triangle is accepted when it is new and none of its edges is already
//! used twice.

use std::collections::{BTreeSet, HashMap};

use config::constants::{QUAD_ABSOLUTE_TOLERANCE, QUAD_RELATIVE_TOLERANCE};
use glam::DVec3;
use pipeline_types::TriangulationReport;
use tracing::{debug, warn};

use crate::connectivity::CellAdjacencyGraph;
use crate::error::{RemapError, RemapResult};

#[inline]
fn edge(a: u32, b: u32) -> (u32, u32) {
    (a.min(b), a.max(b))
}

#[inline]
fn sorted_triple(a: u32, b: u32, c: u32) -> [u32; 3] {
    let mut t = [a, b, c];
    t.sort_unstable();
    t
}

// =============================================================================
// STATE
// =============================================================================

/// Edge usage counts and accepted triangles.
#[derive(Debug, Clone, Default)]
pub struct TriangulationState {
    edge_counts: HashMap<(u32, u32), u8>,
    known: BTreeSet<[u32; 3]>,
}

impl TriangulationState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accepted triangles using the edge.
    pub fn edge_count(&self, a: u32, b: u32) -> u8 {
        self.edge_counts.get(&edge(a, b)).copied().unwrap_or(0)
    }

    /// True if the triangle has been accepted.
    pub fn contains(&self, triangle: &[u32; 3]) -> bool {
        self.known.contains(triangle)
    }

    /// Accepts a sorted triangle if it is new and all its edges have room.
    pub fn try_accept(&mut self, triangle: [u32; 3]) -> bool {
        let [a, b, c] = triangle;
        if self.known.contains(&triangle) {
            return false;
        }
        let edges = [edge(a, b), edge(a, c), edge(b, c)];
        if edges.iter().any(|e| self.edge_counts.get(e).copied().unwrap_or(0) >= 2) {
            return false;
        }
        for e in edges {
            *self.edge_counts.entry(e).or_insert(0) += 1;
        }
        self.known.insert(triangle);
        true
    }

    /// Number of accepted triangles.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// True if nothing has been accepted.
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Accepted triangles in ascending order.
    pub fn into_triangles(self) -> Vec<[u32; 3]> {
        self.known.into_iter().collect()
    }
}

// =============================================================================
// TRIANGULATOR
// =============================================================================

/// Triangulates cell centers from their adjacency graph.
///
/// `lon`, `lat` and `positions` are indexed by graph cell id.
#[derive(Debug, Clone, Copy)]
pub struct CenterMeshTriangulator<'a> {
    graph: &'a CellAdjacencyGraph,
    lon: &'a [f64],
    lat: &'a [f64],
    positions: &'a [DVec3],
}

/// Candidates gathered around one cell.
#[derive(Debug, Default)]
struct Candidates {
    quads: usize,
    exclusive: Vec<[u32; 3]>,
    optional: Vec<[u32; 3]>,
}

impl<'a> CenterMeshTriangulator<'a> {
    pub fn new(
        graph: &'a CellAdjacencyGraph,
        lon: &'a [f64],
        lat: &'a [f64],
        positions: &'a [DVec3],
    ) -> RemapResult<Self> {
        let n = graph.cell_count();
        if lon.len() != n || lat.len() != n || positions.len() != n {
            return Err(RemapError::shape_mismatch(format!(
                "graph has {n} cells, got {} lon, {} lat, {} positions",
                lon.len(),
                lat.len(),
                positions.len()
            )));
        }
        Ok(Self {
            graph,
            lon,
            lat,
            positions,
        })
    }

    /// Runs the heuristic over all cells in ascending order.
    pub fn triangulate(&self) -> (Vec<[u32; 3]>, TriangulationReport) {
        let mut state = TriangulationState::new();
        let mut report = TriangulationReport::default();

        for i in 0..self.graph.cell_count() as u32 {
            let candidates = self.collect_candidates(i);
            report.quads += candidates.quads;

            if candidates.exclusive.is_empty() {
                report.fallback_cells += 1;
                report.fallback_accepted += self.fallback(i, &mut state);
                continue;
            }

            for triangle in candidates.exclusive {
                if state.try_accept(triangle) {
                    report.exclusive_accepted += 1;
                } else {
                    report.exclusive_rejected += 1;
                }
            }
            for triangle in candidates.optional {
                if state.try_accept(triangle) {
                    report.optional_accepted += 1;
                } else {
                    report.optional_rejected += 1;
                }
            }
        }

        let triangles = state.into_triangles();
        let mut covered = vec![false; self.graph.cell_count()];
        for t in &triangles {
            for &v in t {
                covered[v as usize] = true;
            }
        }
        report.uncovered_cells = covered.iter().filter(|c| !**c).count();

        if triangles.is_empty() && self.graph.cell_count() >= 3 {
            warn!(cells = self.graph.cell_count(), "Center mesh produced no triangles");
        }
        debug!(
            triangles = triangles.len(),
            quads = report.quads,
            fallback_cells = report.fallback_cells,
            uncovered = report.uncovered_cells,
            "Triangulated center mesh"
        );

        (triangles, report)
    }

    fn collect_candidates(&self, i: u32) -> Candidates {
        let mut out = Candidates::default();
        let n_i = self.graph.neighbours(i);

        for &j in n_i {
            let shared_ij = self.graph.common_neighbours(i, j);
            for &k in &shared_ij {
                let shared_ijk: BTreeSet<u32> = shared_ij
                    .intersection(self.graph.neighbours(k))
                    .copied()
                    .collect();

                for &l in &shared_ijk {
                    out.quads += 1;
                    let mut q = [i, j, k, l];
                    q.sort_unstable();
                    let [a, b, c, d] = q;
                    if self.split_via_ac(a, b, c, d) {
                        out.exclusive.push([a, b, c]);
                        out.exclusive.push([a, c, d]);
                    } else {
                        out.exclusive.push([a, b, c]);
                        out.exclusive.push([b, c, d]);
                    }
                }

                if shared_ijk.is_empty() {
                    out.optional.push(sorted_triple(i, j, k));
                }
            }
        }
        out
    }

    fn fallback(&self, i: u32, state: &mut TriangulationState) -> usize {
        let mut accepted = 0;
        for &j in self.graph.neighbours(i) {
            if state.edge_count(i, j) >= 2 {
                continue;
            }
            for k in self.graph.common_neighbours(i, j) {
                if state.try_accept(sorted_triple(i, j, k)) {
                    accepted += 1;
                }
            }
        }
        accepted
    }

    /// Decides the diagonal of the sorted quad `(a, b, c, d)`.
    ///
    /// True selects `(a, c)`, giving `(a, b, c)` and `(a, c, d)`.
    fn split_via_ac(&self, a: u32, b: u32, c: u32, d: u32) -> bool {
        let (a, b, c, d) = (a as usize, b as usize, c as usize, d as usize);
        let (lon, lat) = (self.lon, self.lat);

        is_close(lon[a], lon[d])
            || is_close(lat[a], lat[d])
            || same_side(lon, a, b, c, d)
            || same_side(lat, a, b, c, d)
            || self.positions[a].distance(self.positions[d]) < self.positions[b].distance(self.positions[d])
    }
}

/// Relative closeness measured against `reference`.
#[inline]
fn is_close(value: f64, reference: f64) -> bool {
    (value - reference).abs() <= QUAD_ABSOLUTE_TOLERANCE + QUAD_RELATIVE_TOLERANCE * reference.abs()
}

/// True if `a` and `d` lie strictly on the same side of both `b` and `c`.
#[inline]
fn same_side(values: &[f64], a: usize, b: usize, c: usize, d: usize) -> bool {
    let lo = values[b].min(values[c]);
    let hi = values[b].max(values[c]);
    (values[a] < lo && values[d] < lo) || (values[a] > hi && values[d] > hi)
}

#[cfg(test)]
mod tests;
