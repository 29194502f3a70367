//! # Mesh Generation
//!
//! Turns deduplicated grid data into meshes:
//!
//! - corner meshes: unique corners as points, one triangulated (or polygon)
//!   cell per grid cell
//! - center meshes: cell centers as points, no cells

use std::collections::BTreeSet;

use glam::DVec3;
use pipeline_types::{PoleFixReport, Stage};
use tracing::debug;

use crate::corners::UniqueCorners;
use crate::error::{RemapError, RemapResult};
use crate::mesh::{Mesh, FIELD_MASK};
use crate::pole_fix::PoleDefectFix;
use crate::projection::lonlat_to_cartesian;
use crate::triangulate::{sort_counterclockwise, triangulate_polygon};

/// Cell representation of a corner mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CellKind {
    /// Each grid cell becomes its Delaunay triangles.
    #[default]
    Triangles,
    /// Each grid cell becomes one counterclockwise polygon.
    Polygons,
}

/// Options for [`build_corner_mesh`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CornerMeshOptions {
    pub cell_kind: CellKind,
    /// The corners were built from mask-filtered cells.
    pub use_filter: bool,
    /// Pole repair to run on triangle output.
    pub pole_fix: Option<PoleDefectFix>,
}

/// A corner mesh and what was skipped while building it.
#[derive(Debug, Clone)]
pub struct CornerMesh {
    pub mesh: Mesh,
    /// Cells with fewer than three distinct corners.
    pub degenerate: usize,
    /// Cells whose polygon could not be triangulated or sorted.
    pub failed: usize,
    pub pole_fix: Option<PoleFixReport>,
}

/// Point mask of an unfiltered corner mesh.
///
/// Every corner of a kept cell (raw mask 0) gets one minus the mean raw mask
/// of all cells touching it; other points stay 0.
fn corner_point_mask(corners: &UniqueCorners, raw_mask: &[f64]) -> Vec<f64> {
    let mut point_cells: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); corners.point_count()];
    for cell in 0..corners.num_cells() {
        for id in corners.cell_corners(cell) {
            point_cells[id as usize].insert(cell);
        }
    }

    let mut mask = vec![0.0; corners.point_count()];
    for cell in 0..corners.num_cells() {
        let ids = corners.unique_cell_corners(cell);
        if ids.len() < 3 || raw_mask[cell] != 0.0 {
            continue;
        }
        for id in ids {
            let cells = &point_cells[id as usize];
            let mean = cells.iter().map(|&c| raw_mask[c]).sum::<f64>() / cells.len() as f64;
            mask[id as usize] = 1.0 - mean;
        }
    }
    mask
}

/// Builds the corner mesh of a grid.
///
/// `raw_mask` is indexed by raw cell. Without filtering it must cover exactly
/// the cells of `corners`; with filtering the emitted mask is all ones.
pub fn build_corner_mesh(
    corners: &UniqueCorners,
    raw_mask: Option<&[f64]>,
    options: CornerMeshOptions,
) -> RemapResult<CornerMesh> {
    let points = corners.cartesian_points()?;
    let mut mesh = Mesh::from_points(points);
    let mut degenerate = 0;
    let mut failed = 0;

    for cell in 0..corners.num_cells() {
        let built = corners
            .polygon_corners(cell, Stage::Triangulate)
            .and_then(|ids| match options.cell_kind {
                CellKind::Triangles => triangulate_polygon(mesh.points(), &ids).map(|triangles| {
                    for triangle in triangles {
                        mesh.add_triangle(triangle);
                    }
                }),
                CellKind::Polygons => {
                    sort_counterclockwise(mesh.points(), &ids).map(|ring| mesh.add_cell(ring))
                }
            });
        match built {
            Ok(()) => {}
            Err(RemapError::DegenerateCell { .. }) => degenerate += 1,
            Err(err) if err.is_recoverable() => failed += 1,
            Err(err) => return Err(err),
        }
    }

    let mask = match raw_mask {
        Some(raw) if !options.use_filter => {
            if raw.len() != corners.num_cells() {
                return Err(RemapError::shape_mismatch(format!(
                    "mask has {} values for {} cells",
                    raw.len(),
                    corners.num_cells()
                )));
            }
            Some(corner_point_mask(corners, raw))
        }
        _ => None,
    };
    if let Some(mask) = mask {
        mesh.set_field(FIELD_MASK, mask)?;
    }

    let pole_fix = match (options.pole_fix, options.cell_kind) {
        (Some(fix), CellKind::Triangles) => Some(fix.apply(&mut mesh)?),
        _ => None,
    };

    if options.use_filter && raw_mask.is_some() {
        let ones = vec![1.0; mesh.point_count()];
        mesh.set_field(FIELD_MASK, ones)?;
    }

    debug!(
        points = mesh.point_count(),
        cells = mesh.cell_count(),
        area = mesh.triangle_area(),
        degenerate,
        failed,
        "Built corner mesh"
    );

    Ok(CornerMesh {
        mesh,
        degenerate,
        failed,
        pole_fix,
    })
}

/// Builds the center mesh of a grid: projected centers, no cells.
///
/// With filtering, only cells whose raw mask is 0 are kept and the mask is
/// all ones. Otherwise the raw mask is attached as is.
pub fn build_center_mesh(
    lon: &[f64],
    lat: &[f64],
    raw_mask: Option<&[f64]>,
    use_filter: bool,
) -> RemapResult<Mesh> {
    if let Some(mask) = raw_mask {
        if mask.len() != lon.len() {
            return Err(RemapError::shape_mismatch(format!(
                "mask has {} values for {} centers",
                mask.len(),
                lon.len()
            )));
        }
    }

    let (points, mask): (Vec<DVec3>, Option<Vec<f64>>) = match (raw_mask, use_filter) {
        (Some(mask), true) => {
            let keep: Vec<usize> = (0..mask.len()).filter(|&i| mask[i] == 0.0).collect();
            let kept_lon: Vec<f64> = keep.iter().map(|&i| lon[i]).collect();
            let kept_lat: Vec<f64> = keep.iter().map(|&i| lat[i]).collect();
            (lonlat_to_cartesian(&kept_lon, &kept_lat)?, Some(vec![1.0; keep.len()]))
        }
        (mask, _) => (lonlat_to_cartesian(lon, lat)?, mask.map(<[f64]>::to_vec)),
    };

    let mut mesh = Mesh::from_points(points);
    if let Some(mask) = mask {
        mesh.set_field(FIELD_MASK, mask)?;
    }
    Ok(mesh)
}
