//! # Corner Deduplication
//!
//! Grid files store every cell's corners separately, so each shared corner
//! appears once per incident cell, often with representation noise. This
//! module collapses them into a unique point set and re-expresses every cell
//! as indices into that set.
//!
//! ## Algorithm
//!
//! 1. Optionally drop cells whose raw mask value is non-zero
//! 2. Snap values within `ZERO_SNAP_TOLERANCE` of zero to exactly zero
//! 3. Round to `CORNER_ROUND_DECIMALS` digits
//! 4. Sort the unique (lon, lat) pairs lexicographically, assign dense ids
//! 5. Rebuild each cell's corner list as ids

use std::collections::HashMap;

use config::constants::{CORNER_ROUND_DECIMALS, ZERO_SNAP_TOLERANCE};
use glam::DVec3;
use pipeline_types::Stage;
use tracing::debug;

use crate::error::{RemapError, RemapResult};
use crate::projection::lonlat_to_cartesian;

/// Raw per-cell corner coordinates, shaped (corners_per_cell, num_cells) and
/// stored corner-major: corner `c` of cell `i` lives at `c * num_cells + i`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCornerArray {
    lon: Vec<f64>,
    lat: Vec<f64>,
    corners_per_cell: usize,
    num_cells: usize,
}

impl RawCornerArray {
    /// Wraps flattened corner arrays.
    ///
    /// Both arrays must have the same length, divisible by `corners_per_cell`.
    pub fn new(lon: Vec<f64>, lat: Vec<f64>, corners_per_cell: usize) -> RemapResult<Self> {
        if lon.len() != lat.len() {
            return Err(RemapError::shape_mismatch(format!(
                "corner longitudes ({}) and latitudes ({}) differ in length",
                lon.len(),
                lat.len()
            )));
        }
        if corners_per_cell == 0 || lon.len() % corners_per_cell != 0 {
            return Err(RemapError::shape_mismatch(format!(
                "{} corner values do not split into {corners_per_cell} corners per cell",
                lon.len()
            )));
        }
        let num_cells = lon.len() / corners_per_cell;
        Ok(Self {
            lon,
            lat,
            corners_per_cell,
            num_cells,
        })
    }

    /// Number of cells.
    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    /// Number of corners stored per cell.
    pub fn corners_per_cell(&self) -> usize {
        self.corners_per_cell
    }

    /// Total number of stored corners.
    pub fn corner_count(&self) -> usize {
        self.lon.len()
    }

    /// Raw (lon, lat) of one corner of one cell.
    pub fn corner(&self, corner: usize, cell: usize) -> (f64, f64) {
        let idx = corner * self.num_cells + cell;
        (self.lon[idx], self.lat[idx])
    }
}

/// Unique corner points plus the cell→corner index matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueCorners {
    lon: Vec<f64>,
    lat: Vec<f64>,
    corners_per_cell: usize,
    num_cells: usize,
    /// Corner-major, same layout as `RawCornerArray`.
    corner_indices: Vec<u32>,
    /// Raw cell index of every retained cell.
    source_cells: Vec<usize>,
}

impl UniqueCorners {
    /// Number of unique corner points.
    pub fn point_count(&self) -> usize {
        self.lon.len()
    }

    /// Number of retained cells.
    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    /// Number of corners stored per cell.
    pub fn corners_per_cell(&self) -> usize {
        self.corners_per_cell
    }

    /// Unique longitudes.
    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    /// Unique latitudes.
    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    /// Raw cell index of each retained cell.
    pub fn source_cells(&self) -> &[usize] {
        &self.source_cells
    }

    /// Corner ids of a cell in stored order, duplicates included.
    pub fn cell_corners(&self, cell: usize) -> impl Iterator<Item = u32> + '_ {
        (0..self.corners_per_cell).map(move |c| self.corner_indices[c * self.num_cells + cell])
    }

    /// Distinct corner ids of a cell in ascending order.
    pub fn unique_cell_corners(&self, cell: usize) -> Vec<u32> {
        let mut ids: Vec<u32> = self.cell_corners(cell).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Distinct corner ids of a cell that spans a polygon.
    ///
    /// Returns `DegenerateCell` for cells with fewer than three distinct
    /// corners; `stage` names the caller in the error.
    pub fn polygon_corners(&self, cell: usize, stage: Stage) -> RemapResult<Vec<u32>> {
        polygon_ids(self.unique_cell_corners(cell), cell, stage)
    }

    /// A cell is degenerate when fewer than three distinct corners remain.
    pub fn is_degenerate(&self, cell: usize) -> bool {
        self.unique_cell_corners(cell).len() < 3
    }

    /// Number of degenerate cells.
    pub fn degenerate_count(&self) -> usize {
        (0..self.num_cells).filter(|&cell| self.is_degenerate(cell)).count()
    }

    /// Stored corner lists of the given cells, duplicates included.
    pub fn corner_lists(&self, cells: &[usize]) -> Vec<Vec<u32>> {
        cells
            .iter()
            .map(|&cell| self.cell_corners(cell).collect())
            .collect()
    }

    /// Cartesian positions of the unique corners on the WGS84 surface.
    pub fn cartesian_points(&self) -> RemapResult<Vec<DVec3>> {
        lonlat_to_cartesian(&self.lon, &self.lat)
    }

    /// Expands the index matrix back into a raw corner array.
    pub fn to_raw(&self) -> RawCornerArray {
        let (lon, lat) = self
            .corner_indices
            .iter()
            .map(|&id| (self.lon[id as usize], self.lat[id as usize]))
            .unzip();
        RawCornerArray {
            lon,
            lat,
            corners_per_cell: self.corners_per_cell,
            num_cells: self.num_cells,
        }
    }
}

/// Checks that sorted, distinct corner ids span a polygon.
pub(crate) fn polygon_ids(ids: Vec<u32>, cell: usize, stage: Stage) -> RemapResult<Vec<u32>> {
    if ids.len() < 3 {
        return Err(RemapError::DegenerateCell {
            stage,
            cell,
            unique: ids.len(),
        });
    }
    Ok(ids)
}

/// Quantized coordinate used as the identity of a corner.
fn quantize(value: f64) -> i64 {
    let snapped = if value.abs() <= ZERO_SNAP_TOLERANCE { 0.0 } else { value };
    (snapped * 10f64.powi(CORNER_ROUND_DECIMALS)).round() as i64
}

fn dequantize(key: i64) -> f64 {
    key as f64 / 10f64.powi(CORNER_ROUND_DECIMALS)
}

/// Builds the unique corner set of a grid.
///
/// With `use_filter` and a mask, only cells whose raw mask value is exactly 0
/// are kept. Degenerate cells stay in the index space.
///
/// # Example
///
/// ```rust
/// use remap_mesh::corners::{deduplicate_corners, RawCornerArray};
///
/// // Two unit squares sharing an edge: 8 raw corners, 6 unique
/// let lon = vec![0.0, 1.0, 1.0, 2.0, 1.0, 2.0, 0.0, 1.0];
/// let lat = vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
/// let raw = RawCornerArray::new(lon, lat, 4).unwrap();
/// let unique = deduplicate_corners(&raw, None, false).unwrap();
/// assert_eq!(unique.point_count(), 6);
/// ```
pub fn deduplicate_corners(
    raw: &RawCornerArray,
    mask: Option<&[f64]>,
    use_filter: bool,
) -> RemapResult<UniqueCorners> {
    if let Some(mask) = mask {
        if mask.len() != raw.num_cells {
            return Err(RemapError::shape_mismatch(format!(
                "mask has {} values for {} cells",
                mask.len(),
                raw.num_cells
            )));
        }
    }

    let source_cells: Vec<usize> = match (mask, use_filter) {
        (Some(mask), true) => (0..raw.num_cells).filter(|&i| mask[i] == 0.0).collect(),
        _ => (0..raw.num_cells).collect(),
    };
    let num_cells = source_cells.len();
    let cpc = raw.corners_per_cell;

    let mut keys = Vec::with_capacity(cpc * num_cells);
    for c in 0..cpc {
        for &cell in &source_cells {
            let (lon, lat) = raw.corner(c, cell);
            if !lon.is_finite() || !lat.is_finite() {
                return Err(RemapError::InvalidTopology(format!(
                    "non-finite corner {c} in cell {cell}"
                )));
            }
            keys.push((quantize(lon), quantize(lat)));
        }
    }

    let mut unique_keys = keys.clone();
    unique_keys.sort_unstable();
    unique_keys.dedup();

    let key_to_id: HashMap<(i64, i64), u32> = unique_keys
        .iter()
        .enumerate()
        .map(|(id, key)| (*key, id as u32))
        .collect();

    let corner_indices = keys.iter().map(|key| key_to_id[key]).collect();
    let (lon, lat) = unique_keys
        .iter()
        .map(|&(lon, lat)| (dequantize(lon), dequantize(lat)))
        .unzip();

    let unique = UniqueCorners {
        lon,
        lat,
        corners_per_cell: cpc,
        num_cells,
        corner_indices,
        source_cells,
    };

    debug!(
        raw_corners = keys.len(),
        unique_corners = unique.point_count(),
        cells = num_cells,
        dropped_cells = raw.num_cells - num_cells,
        "Deduplicated grid corners"
    );

    Ok(unique)
}
