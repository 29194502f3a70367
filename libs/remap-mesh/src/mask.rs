//! # Mask Filtering
//!
//! Thresholds a per-cell mask into valid and invalid cells and integrates the
//! area of every valid cell from its triangulated corner polygon.

use config::constants::FilterConfig;
use glam::DVec3;
use pipeline_types::Stage;
use tracing::debug;

use crate::corners::UniqueCorners;
use crate::error::{RemapError, RemapResult};
use crate::mesh::{Mesh, FIELD_MASK};
use crate::triangulate::polygon_area;

/// Per-cell areas plus skip counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellAreas {
    /// Area per cell; 0 for invalid, degenerate or failed cells.
    pub areas: Vec<f64>,
    /// Valid cells with fewer than three distinct corners.
    pub degenerate: usize,
    /// Valid cells whose polygon could not be triangulated.
    pub failed: usize,
}

/// Classifies cells by mask value and measures their area.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MaskFilter {
    config: FilterConfig,
}

impl MaskFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Validity of one mask value.
    ///
    /// Water masks are compared directly. Land masks are inverted first, with
    /// values above 1 clamped.
    pub fn is_valid(&self, value: f64) -> bool {
        if self.config.denotes_water {
            value >= self.config.threshold
        } else {
            1.0 - value.min(1.0) >= self.config.threshold
        }
    }

    /// Validity of every cell.
    pub fn valid_cells(&self, mask: &[f64]) -> Vec<bool> {
        mask.iter().map(|&value| self.is_valid(value)).collect()
    }

    /// Integrates the area of each valid cell.
    ///
    /// `points` are the cartesian positions of the unique corners.
    pub fn cell_areas(
        &self,
        points: &[DVec3],
        corners: &UniqueCorners,
        valid: &[bool],
    ) -> RemapResult<CellAreas> {
        if valid.len() != corners.num_cells() {
            return Err(RemapError::shape_mismatch(format!(
                "{} validity flags for {} cells",
                valid.len(),
                corners.num_cells()
            )));
        }

        let mut out = CellAreas {
            areas: vec![0.0; valid.len()],
            ..CellAreas::default()
        };

        for cell in (0..valid.len()).filter(|&cell| valid[cell]) {
            let area = corners
                .polygon_corners(cell, Stage::MaskFilter)
                .and_then(|ids| polygon_area(points, &ids));
            match area {
                Ok(area) => out.areas[cell] = area,
                Err(RemapError::DegenerateCell { .. }) => out.degenerate += 1,
                Err(err) if err.is_recoverable() => out.failed += 1,
                Err(err) => return Err(err),
            }
        }

        if out.degenerate + out.failed > 0 {
            debug!(
                degenerate = out.degenerate,
                failed = out.failed,
                "Skipped cells during area integration"
            );
        }
        Ok(out)
    }
}

/// Averages a point mask over each cell's stored corner list.
///
/// Repeated corners are counted as often as they are stored. Points past the
/// unique corners (the synthetic pole of a repaired mesh) are ignored.
pub fn cell_mask_from_points(point_mask: &[f64], corners: &UniqueCorners) -> RemapResult<Vec<f64>> {
    if point_mask.len() < corners.point_count() {
        return Err(RemapError::shape_mismatch(format!(
            "point mask has {} values for {} corners",
            point_mask.len(),
            corners.point_count()
        )));
    }
    let per_cell = corners.corners_per_cell() as f64;
    Ok((0..corners.num_cells())
        .map(|cell| {
            corners
                .cell_corners(cell)
                .map(|id| point_mask[id as usize])
                .sum::<f64>()
                / per_cell
        })
        .collect())
}

/// Reads the `mask` field of a corner mesh and averages it onto cells.
pub fn cell_mask_from_mesh(mesh: &Mesh, corners: &UniqueCorners) -> RemapResult<Vec<f64>> {
    cell_mask_from_points(mesh.field(FIELD_MASK)?, corners)
}
