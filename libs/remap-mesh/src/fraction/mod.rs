//! # Overlap Fractions
//!
//! For every destination cell, the share of its area covered by unmasked
//! source cells. Source and destination are sampled independently, so the
//! overlap is computed geometrically:
//!
//! 1. Index source centers in a hash grid
//! 2. Per destination cell, project its polygon and all nearby source
//!    polygons onto the destination plane
//! 3. Sum `area(src_hull ∩ dst_hull) * src_mask` and divide by the
//!    destination area
//!
//! The per-destination loop runs in parallel over read-only inputs.

pub mod clip;
mod index;

pub use index::PointIndex;

use config::constants::{FilterConfig, EDGE_SAMPLE_COUNT, SEARCH_RADIUS_FACTOR};
use glam::{DVec2, DVec3};
use pipeline_types::{FractionReport, Stage};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::corners::polygon_ids;
use crate::error::{RemapError, RemapResult};
use crate::triangulate::PlaneBasis;
use clip::{convex_hull, intersection_area};

/// Cell polygons of one grid: unique corner positions, cell centers and the
/// stored corner id list of each cell.
#[derive(Debug, Clone, Copy)]
pub struct CellPolygons<'a> {
    points: &'a [DVec3],
    centers: &'a [DVec3],
    corners: &'a [Vec<u32>],
}

impl<'a> CellPolygons<'a> {
    pub fn new(points: &'a [DVec3], centers: &'a [DVec3], corners: &'a [Vec<u32>]) -> RemapResult<Self> {
        if centers.len() != corners.len() {
            return Err(RemapError::shape_mismatch(format!(
                "{} centers for {} corner lists",
                centers.len(),
                corners.len()
            )));
        }
        if let Some(bad) = corners.iter().flatten().find(|&&id| id as usize >= points.len()) {
            return Err(RemapError::InvalidTopology(format!(
                "corner id {bad} out of range ({} points)",
                points.len()
            )));
        }
        Ok(Self {
            points,
            centers,
            corners,
        })
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    /// True if there are no cells.
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Distinct corner ids of a cell, or `DegenerateCell` below three.
    pub fn polygon_corners(&self, cell: usize) -> RemapResult<Vec<u32>> {
        let mut ids = self.corners[cell].clone();
        ids.sort_unstable();
        ids.dedup();
        polygon_ids(ids, cell, Stage::Fraction)
    }

    /// Mean distance between the first two stored corners over a strided
    /// sample of cells.
    pub fn mean_edge_length(&self) -> f64 {
        let n = self.len();
        if n == 0 {
            return 0.0;
        }
        let stride = (n / EDGE_SAMPLE_COUNT).max(1);
        let lengths: Vec<f64> = (0..n)
            .step_by(stride)
            .filter_map(|cell| match self.corners[cell].as_slice() {
                [a, b, ..] => Some(self.points[*a as usize].distance(self.points[*b as usize])),
                _ => None,
            })
            .collect();
        if lengths.is_empty() {
            0.0
        } else {
            lengths.iter().sum::<f64>() / lengths.len() as f64
        }
    }
}

/// Computes area-weighted overlap fractions between two grids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionComputer {
    search_radius_factor: f64,
}

impl Default for FractionComputer {
    fn default() -> Self {
        Self {
            search_radius_factor: SEARCH_RADIUS_FACTOR,
        }
    }
}

impl FractionComputer {
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            search_radius_factor: config.search_radius_factor,
        }
    }

    /// Radius around a destination center within which source centers are
    /// considered.
    pub fn search_radius(&self, src: &CellPolygons<'_>, dst: &CellPolygons<'_>) -> f64 {
        self.search_radius_factor * src.mean_edge_length().max(dst.mean_edge_length())
    }

    /// Fraction of each destination cell covered by masked-in source area.
    ///
    /// Destination cells that are degenerate, have no area or find no source
    /// candidates get 0.
    pub fn compute(
        &self,
        src: &CellPolygons<'_>,
        src_mask: &[f64],
        dst: &CellPolygons<'_>,
        dst_areas: &[f64],
    ) -> RemapResult<(Vec<f64>, FractionReport)> {
        if src_mask.len() != src.len() {
            return Err(RemapError::shape_mismatch(format!(
                "source mask has {} values for {} cells",
                src_mask.len(),
                src.len()
            )));
        }
        if dst_areas.len() != dst.len() {
            return Err(RemapError::shape_mismatch(format!(
                "destination areas have {} values for {} cells",
                dst_areas.len(),
                dst.len()
            )));
        }

        let radius = self.search_radius(src, dst);
        let index = PointIndex::new(src.centers, radius);

        let results: Vec<(f64, FractionReport)> = (0..dst.len())
            .into_par_iter()
            .map(|cell| cell_fraction(cell, src, src_mask, dst, dst_areas[cell], &index, radius))
            .collect();

        let report = results
            .iter()
            .map(|(_, r)| *r)
            .fold(FractionReport::default(), FractionReport::merge);
        let fractions: Vec<f64> = results.into_iter().map(|(f, _)| f).collect();

        if report.computed == 0 && !dst.is_empty() {
            warn!(cells = dst.len(), "No destination cell received a fraction");
        }
        info!(
            computed = report.computed,
            skipped = report.skipped(),
            radius,
            "Computed overlap fractions"
        );

        Ok((fractions, report))
    }
}

fn cell_fraction(
    cell: usize,
    src: &CellPolygons<'_>,
    src_mask: &[f64],
    dst: &CellPolygons<'_>,
    dst_area: f64,
    index: &PointIndex<'_>,
    radius: f64,
) -> (f64, FractionReport) {
    let mut report = FractionReport::default();

    let Ok(dst_ids) = dst.polygon_corners(cell) else {
        report.degenerate = 1;
        return (0.0, report);
    };
    let dst_points: Vec<DVec3> = dst_ids.iter().map(|&id| dst.points[id as usize]).collect();
    let Ok(basis) = PlaneBasis::from_points(&dst_points) else {
        report.invalid_hull = 1;
        return (0.0, report);
    };

    let center = dst.centers[cell];
    let near = index.query_ball(center, radius);
    if near.is_empty() {
        report.no_candidates = 1;
        return (0.0, report);
    }

    let project = |points: &[DVec3], ids: &[u32]| -> Vec<DVec2> {
        ids.iter()
            .map(|&id| basis.project(points[id as usize], center))
            .collect()
    };

    let dst_hull = convex_hull(&project(dst.points, &dst_ids));
    if dst_hull.len() < 3 {
        report.invalid_hull = 1;
        return (0.0, report);
    }

    let covered: f64 = near
        .iter()
        .filter_map(|&src_cell| {
            let ids = src.polygon_corners(src_cell).ok()?;
            let hull = convex_hull(&project(src.points, &ids));
            Some(intersection_area(&hull, &dst_hull) * src_mask[src_cell])
        })
        .sum();

    if dst_area.is_nan() || dst_area <= 0.0 {
        report.zero_area = 1;
        return (0.0, report);
    }

    report.computed = 1;
    (covered / dst_area, report)
}
