//! # Filter Pipeline
//!
//! Applies a mapped cell mask to a grid and emits its filtered center mesh:
//!
//! 1. Classify cells with the [`MaskFilter`]
//! 2. Project the centers of valid cells, round them and drop duplicates
//! 3. Attach per-point `area` and `mask` fields
//! 4. Optionally reconstruct triangles from cell adjacency
//! 5. Optionally attach overlap fractions against a second grid

use std::collections::HashSet;

use config::constants::{FilterConfig, CENTER_ROUND_DECIMALS};
use glam::DVec3;
use pipeline_types::FilterReport;
use tracing::{debug, info, warn};

use crate::center_mesh::CenterMeshTriangulator;
use crate::connectivity::CellAdjacencyGraph;
use crate::corners::{deduplicate_corners, RawCornerArray, UniqueCorners};
use crate::error::{RemapError, RemapResult};
use crate::fraction::{CellPolygons, FractionComputer};
use crate::generate::{build_corner_mesh, CornerMesh, CornerMeshOptions};
use crate::mask::MaskFilter;
use crate::mesh::{Mesh, FIELD_AREA, FIELD_FRAC, FIELD_MASK};
use crate::projection::lonlat_to_cartesian;

/// One grid as seen by the filter: its corners, centers and cell mask.
#[derive(Debug, Clone, Copy)]
pub struct GridInput<'a> {
    corners: &'a UniqueCorners,
    center_lon: &'a [f64],
    center_lat: &'a [f64],
    cell_mask: &'a [f64],
}

impl<'a> GridInput<'a> {
    pub fn new(
        corners: &'a UniqueCorners,
        center_lon: &'a [f64],
        center_lat: &'a [f64],
        cell_mask: &'a [f64],
    ) -> RemapResult<Self> {
        let n = corners.num_cells();
        if center_lon.len() != n || center_lat.len() != n || cell_mask.len() != n {
            return Err(RemapError::shape_mismatch(format!(
                "{n} cells, got {} lon, {} lat, {} mask values",
                center_lon.len(),
                center_lat.len(),
                cell_mask.len()
            )));
        }
        Ok(Self {
            corners,
            center_lon,
            center_lat,
            cell_mask,
        })
    }
}

/// Valid, de-duplicated cells of one grid.
#[derive(Debug, Clone)]
struct PreparedGrid {
    /// Grid cell index of each retained cell.
    active: Vec<usize>,
    /// Rounded center positions of the retained cells.
    centers: Vec<DVec3>,
    corner_points: Vec<DVec3>,
    corner_lists: Vec<Vec<u32>>,
    areas: Vec<f64>,
    mask: Vec<f64>,
    valid: usize,
    degenerate: usize,
    failed: usize,
    duplicates: usize,
}

/// Center rounded to `CENTER_ROUND_DECIMALS`, with its integer key.
fn round_center(p: DVec3) -> ((i64, i64, i64), DVec3) {
    let scale = 10f64.powi(CENTER_ROUND_DECIMALS);
    let r = (p * scale).round();
    ((r.x as i64, r.y as i64, r.z as i64), r / scale)
}

/// The filtered mesh and its diagnostics.
#[derive(Debug, Clone)]
pub struct FilteredMesh {
    pub mesh: Mesh,
    pub report: FilterReport,
}

/// Mask filtering with optional connectivity and fractions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterPipeline {
    filter: MaskFilter,
    fractions: FractionComputer,
    create_connectivity: bool,
}

impl FilterPipeline {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            filter: MaskFilter::new(config),
            fractions: FractionComputer::from_config(&config),
            create_connectivity: false,
        }
    }

    /// Also reconstruct triangle cells over the filtered centers.
    pub fn with_connectivity(mut self, enabled: bool) -> Self {
        self.create_connectivity = enabled;
        self
    }

    fn prepare(&self, grid: &GridInput<'_>) -> RemapResult<PreparedGrid> {
        let valid = self.filter.valid_cells(grid.cell_mask);
        let corner_points = grid.corners.cartesian_points()?;
        let areas = self.filter.cell_areas(&corner_points, grid.corners, &valid)?;
        let centers = lonlat_to_cartesian(grid.center_lon, grid.center_lat)?;

        let mut seen = HashSet::new();
        let mut active = Vec::new();
        let mut rounded = Vec::new();
        let mut duplicates = 0;
        for cell in (0..valid.len()).filter(|&cell| valid[cell]) {
            let (key, center) = round_center(centers[cell]);
            if !seen.insert(key) {
                duplicates += 1;
                continue;
            }
            rounded.push(center);
            active.push(cell);
        }

        if duplicates > 0 {
            debug!(duplicates, "Dropped duplicate center points");
        }

        Ok(PreparedGrid {
            corner_lists: grid.corners.corner_lists(&active),
            areas: active.iter().map(|&cell| areas.areas[cell]).collect(),
            mask: active.iter().map(|&cell| grid.cell_mask[cell]).collect(),
            valid: valid.iter().filter(|v| **v).count(),
            degenerate: areas.degenerate,
            failed: areas.failed,
            active,
            centers: rounded,
            corner_points,
            duplicates,
        })
    }

    /// Filters `grid` and builds its center mesh.
    ///
    /// With a `fraction_source`, each retained cell also gets the fraction of
    /// its area covered by the source's masked-in cells. The source is
    /// filtered with the same settings.
    pub fn apply(
        &self,
        grid: &GridInput<'_>,
        fraction_source: Option<&GridInput<'_>>,
    ) -> RemapResult<FilteredMesh> {
        let prepared = self.prepare(grid)?;
        let mut report = FilterReport {
            cells: grid.cell_mask.len(),
            valid: prepared.valid,
            degenerate: prepared.degenerate,
            failed_triangulation: prepared.failed,
            duplicate_centers: prepared.duplicates,
            ..FilterReport::default()
        };

        if prepared.active.is_empty() {
            warn!(cells = report.cells, "No cell passed the mask filter");
        }

        let mut mesh = Mesh::from_points(prepared.centers.clone());
        mesh.set_field(FIELD_AREA, prepared.areas.clone())?;
        mesh.set_field(FIELD_MASK, prepared.mask.clone())?;

        if self.create_connectivity {
            let graph = CellAdjacencyGraph::from_corner_lists(&prepared.corner_lists);
            let lon: Vec<f64> = prepared.active.iter().map(|&c| grid.center_lon[c]).collect();
            let lat: Vec<f64> = prepared.active.iter().map(|&c| grid.center_lat[c]).collect();
            let (triangles, tri_report) =
                CenterMeshTriangulator::new(&graph, &lon, &lat, &prepared.centers)?.triangulate();
            for triangle in triangles {
                mesh.add_triangle(triangle);
            }
            report.triangulation = Some(tri_report);
        }

        if let Some(source) = fraction_source {
            let src = self.prepare(source)?;
            let src_polygons = CellPolygons::new(&src.corner_points, &src.centers, &src.corner_lists)?;
            let dst_polygons =
                CellPolygons::new(&prepared.corner_points, &prepared.centers, &prepared.corner_lists)?;
            let (fractions, frac_report) =
                self.fractions
                    .compute(&src_polygons, &src.mask, &dst_polygons, &prepared.areas)?;
            mesh.set_field(FIELD_FRAC, fractions)?;
            report.fraction = Some(frac_report);
        }

        info!(
            cells = report.cells,
            valid = report.valid,
            points = mesh.point_count(),
            triangles = mesh.cell_count(),
            "Filtered grid"
        );

        Ok(FilteredMesh { mesh, report })
    }
}

/// Rebuilds the corner mesh from only the cells the filter keeps.
///
/// The emitted mask is all ones.
pub fn filter_corner_mesh(
    raw: &RawCornerArray,
    cell_mask: &[f64],
    filter: &MaskFilter,
    options: CornerMeshOptions,
) -> RemapResult<CornerMesh> {
    if cell_mask.len() != raw.num_cells() {
        return Err(RemapError::shape_mismatch(format!(
            "mask has {} values for {} cells",
            cell_mask.len(),
            raw.num_cells()
        )));
    }
    let keep: Vec<f64> = filter
        .valid_cells(cell_mask)
        .into_iter()
        .map(|valid| if valid { 0.0 } else { 1.0 })
        .collect();
    let corners = deduplicate_corners(raw, Some(&keep), true)?;
    build_corner_mesh(
        &corners,
        Some(&keep),
        CornerMeshOptions {
            use_filter: true,
            ..options
        },
    )
}
