//! # South Pole Repair
//!
//! One grid family (`torc`) has corner cells that wrap around the south pole.
//! Triangulating them yields long triangles across the cap and leaves a hole
//! at the pole itself. This post-process removes those triangles and closes
//! the cap with a fresh triangulation around a synthetic pole point.

use config::constants::{POLE_MAX_EDGE_LENGTH, POLE_Z_THRESHOLD};
use glam::DVec3;
use pipeline_types::PoleFixReport;
use tracing::{info, warn};

use crate::error::RemapResult;
use crate::mesh::{Mesh, FIELD_MASK};
use crate::triangulate::triangulate_polygon;

/// Pole cap repair over an already triangulated corner mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoleDefectFix {
    /// Points with `z` at or below this value belong to the cap.
    pub z_threshold: f64,
    /// Triangles with a longer edge are discarded.
    pub max_edge_length: f64,
}

impl Default for PoleDefectFix {
    fn default() -> Self {
        Self {
            z_threshold: POLE_Z_THRESHOLD,
            max_edge_length: POLE_MAX_EDGE_LENGTH,
        }
    }
}

impl PoleDefectFix {
    fn cap_indices(&self, mesh: &Mesh) -> Vec<u32> {
        mesh.points()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.z <= self.z_threshold)
            .map(|(i, _)| i as u32)
            .collect()
    }

    fn longest_edge(mesh: &Mesh, [a, b, c]: [u32; 3]) -> f64 {
        let (pa, pb, pc) = (mesh.point(a), mesh.point(b), mesh.point(c));
        pa.distance(pb).max(pb.distance(pc)).max(pc.distance(pa))
    }

    /// Applies the repair in place.
    ///
    /// Polygon cells are left untouched. When the mesh carries a `mask` field,
    /// the cap and every vertex of a discarded triangle are masked out.
    pub fn apply(&self, mesh: &mut Mesh) -> RemapResult<PoleFixReport> {
        mesh.validate()?;
        let mut report = PoleFixReport::default();

        let low = self.cap_indices(mesh);
        if !low.is_empty() {
            let pole = low.iter().map(|&i| mesh.point(i)).sum::<DVec3>() / low.len() as f64;
            mesh.add_point(pole);
            report.pole_added = true;
        }

        let mut masked_out: Vec<u32> = Vec::new();
        let before = mesh.cell_count();
        {
            let max_edge = self.max_edge_length;
            let long: Vec<bool> = mesh
                .cells()
                .iter()
                .map(|cell| match cell.as_slice() {
                    &[a, b, c] => Self::longest_edge(mesh, [a, b, c]) > max_edge,
                    _ => false,
                })
                .collect();
            for (cell, _) in mesh.cells().iter().zip(&long).filter(|(_, l)| **l) {
                masked_out.extend_from_slice(cell);
            }
            let mut flags = long.into_iter();
            mesh.retain_cells(|_| !flags.next().unwrap_or(false));
        }
        report.discarded_triangles = before - mesh.cell_count();

        let cap = self.cap_indices(mesh);
        report.cap_points = cap.len();
        if cap.len() >= 3 {
            match triangulate_polygon(mesh.points(), &cap) {
                Ok(triangles) => {
                    report.cap_triangles = triangles.len();
                    for triangle in triangles {
                        mesh.add_triangle(triangle);
                    }
                }
                Err(err) if err.is_recoverable() => {
                    warn!(error = %err, points = cap.len(), "Could not triangulate pole cap");
                }
                Err(err) => return Err(err),
            }
        }

        if mesh.has_field(FIELD_MASK) {
            let mask = mesh.field_mut(FIELD_MASK)?;
            for &i in cap.iter().chain(&masked_out) {
                mask[i as usize] = 0.0;
            }
        }

        info!(
            pole_added = report.pole_added,
            cap_points = report.cap_points,
            cap_triangles = report.cap_triangles,
            discarded = report.discarded_triangles,
            "Applied pole repair"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemapError;
    use crate::projection::lonlat_to_cartesian;

    /// Ring of 8 points near the south pole, a triangle with long edges and a
    /// small equatorial triangle.
    fn torc_like() -> Mesh {
        let mut lon: Vec<f64> = (0..8).map(|k| k as f64 * 45.0).collect();
        let mut lat = vec![-85.0; 8];
        lon.extend([0.0, 120.0, 240.0, 0.0, 1.0, 0.0]);
        lat.extend([-60.0, -60.0, -60.0, 0.0, 0.0, 1.0]);

        let mut mesh = Mesh::from_points(lonlat_to_cartesian(&lon, &lat).unwrap());
        mesh.add_triangle([8, 9, 10]);
        mesh.add_triangle([11, 12, 13]);
        mesh.set_field(FIELD_MASK, vec![1.0; 14]).unwrap();
        mesh
    }

    #[test]
    fn test_malformed_mesh_rejected() {
        let mut mesh = torc_like();
        mesh.add_triangle([0, 1, 99]);
        let err = PoleDefectFix::default().apply(&mut mesh).unwrap_err();
        assert!(matches!(err, RemapError::InvalidTopology(_)));
        assert_eq!(mesh.point_count(), 14);
    }

    #[test]
    fn test_cap_closed_and_masked() {
        let mut mesh = torc_like();
        let report = PoleDefectFix::default().apply(&mut mesh).unwrap();

        assert!(report.pole_added);
        assert_eq!(mesh.point_count(), 15);
        assert_eq!(report.discarded_triangles, 1);
        assert_eq!(report.cap_points, 9);
        assert_eq!(report.cap_triangles, 8);
        assert_eq!(mesh.cell_count(), 9);
        assert!(mesh.validate().is_ok());

        let pole = mesh.point(14);
        assert!(pole.x.abs() < 1e-3 && pole.y.abs() < 1e-3);

        let mask = mesh.field(FIELD_MASK).unwrap();
        assert!(mask[..11].iter().all(|m| *m == 0.0));
        assert!(mask[11..14].iter().all(|m| *m == 1.0));
        assert_eq!(mask[14], 0.0);
    }

    #[test]
    fn test_without_cap_points() {
        let lon = [0.0, 1.0, 0.0];
        let lat = [0.0, 0.0, 1.0];
        let mut mesh = Mesh::from_points(lonlat_to_cartesian(&lon, &lat).unwrap());
        mesh.add_triangle([0, 1, 2]);

        let report = PoleDefectFix::default().apply(&mut mesh).unwrap();
        assert!(!report.pole_added);
        assert_eq!(report.cap_points, 0);
        assert_eq!(mesh.point_count(), 3);
        assert_eq!(mesh.cell_count(), 1);
    }
}
