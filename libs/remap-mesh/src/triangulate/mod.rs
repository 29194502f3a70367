//! # Polygon Triangulation
//!
//! Triangulates a planar (or nearly planar) polygon given as point indices
//! into a 3D point array.
//!
//! ## Algorithm
//!
//! 1. Build an orthonormal basis (v1, v2, normal) from the first points
//! 2. Sort the points counterclockwise around their centroid
//! 3. Project into (v1, v2) with the first sorted point as origin
//! 4. Delaunay-triangulate the projection
//! 5. Map simplices back to the caller's indices
//!
//! ## Example
//!
//! ```rust
//! use remap_mesh::triangulate::triangulate_polygon;
//! use glam::DVec3;
//!
//! let points = vec![
//!     DVec3::new(0.0, 0.0, 0.0),
//!     DVec3::new(1.0, 0.0, 0.0),
//!     DVec3::new(1.0, 1.0, 0.0),
//!     DVec3::new(0.0, 1.0, 0.0),
//! ];
//! let triangles = triangulate_polygon(&points, &[0, 1, 2, 3]).unwrap();
//! assert_eq!(triangles.len(), 2);
//! ```

mod delaunay;

pub use delaunay::delaunay;

use config::constants::EPSILON_TOLERANCE;
use glam::{DVec2, DVec3};

use crate::error::{RemapError, RemapResult};

// =============================================================================
// PLANE BASIS
// =============================================================================

/// Orthonormal frame of a polygon's plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneBasis {
    pub u: DVec3,
    pub v: DVec3,
    pub normal: DVec3,
}

impl PlaneBasis {
    /// Builds the frame from the polygon vertices.
    ///
    /// `u` points from the first vertex to the second. `v` is taken from the
    /// third vertex, or from the first later vertex that is not collinear
    /// with the first two.
    pub fn from_points(points: &[DVec3]) -> RemapResult<Self> {
        let p0 = *points
            .first()
            .ok_or_else(|| RemapError::degenerate_polygon("empty polygon"))?;
        let scale = points
            .iter()
            .map(|p| p.distance(p0))
            .fold(0.0_f64, f64::max);
        let tol = EPSILON_TOLERANCE * scale.max(f64::MIN_POSITIVE);

        let u = points
            .iter()
            .skip(1)
            .map(|p| *p - p0)
            .find(|d| d.length() > tol)
            .ok_or_else(|| RemapError::degenerate_polygon("coincident vertices"))?
            .normalize();

        let v = points
            .iter()
            .skip(2)
            .map(|p| {
                let d = *p - p0;
                d - d.dot(u) * u
            })
            .find(|ortho| ortho.length() > tol)
            .ok_or_else(|| RemapError::degenerate_polygon("collinear vertices"))?
            .normalize();

        Ok(Self {
            u,
            v,
            normal: u.cross(v).normalize(),
        })
    }

    /// Projects a point into the plane coordinates relative to `origin`.
    #[inline]
    pub fn project(&self, p: DVec3, origin: DVec3) -> DVec2 {
        let d = p - origin;
        DVec2::new(d.dot(self.u), d.dot(self.v))
    }
}

// =============================================================================
// AREAS
// =============================================================================

/// Area of a 3D triangle.
#[inline]
pub fn triangle_area(a: DVec3, b: DVec3, c: DVec3) -> f64 {
    0.5 * (b - a).cross(c - a).length()
}

/// Area of a polygon cell as the sum of its triangle areas.
pub fn polygon_area(points: &[DVec3], indices: &[u32]) -> RemapResult<f64> {
    let triangles = triangulate_polygon(points, indices)?;
    Ok(triangles
        .iter()
        .map(|&[a, b, c]| triangle_area(points[a as usize], points[b as usize], points[c as usize]))
        .sum())
}

// =============================================================================
// ORDERING
// =============================================================================

fn distinct(indices: &[u32]) -> Vec<u32> {
    let mut ids = indices.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Sorts already-distinct vertex ids counterclockwise around their centroid.
fn sort_with_basis(points: &[DVec3], ids: &[u32], basis: &PlaneBasis) -> Vec<u32> {
    let centroid = ids.iter().map(|&i| points[i as usize]).sum::<DVec3>() / ids.len() as f64;
    let reference = points[ids[0] as usize] - centroid;

    let mut keyed: Vec<(f64, u32)> = ids
        .iter()
        .map(|&i| {
            let vec = points[i as usize] - centroid;
            let angle = basis.normal.dot(reference.cross(vec)).atan2(reference.dot(vec));
            (angle, i)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, i)| i).collect()
}

/// Returns the distinct vertex ids of a polygon in counterclockwise order.
pub fn sort_counterclockwise(points: &[DVec3], indices: &[u32]) -> RemapResult<Vec<u32>> {
    let ids = distinct(indices);
    if ids.len() < 3 {
        return Err(RemapError::degenerate_polygon(format!(
            "{} distinct vertices",
            ids.len()
        )));
    }
    let positions: Vec<DVec3> = ids.iter().map(|&i| points[i as usize]).collect();
    let basis = PlaneBasis::from_points(&positions)?;
    Ok(sort_with_basis(points, &ids, &basis))
}

// =============================================================================
// TRIANGULATION
// =============================================================================

/// Triangulates the polygon spanned by `indices`.
///
/// Repeated ids are collapsed first. Three distinct vertices are returned as
/// a single triangle. Fewer than three, or a projection with no area, give
/// `DegeneratePolygon`.
pub fn triangulate_polygon(points: &[DVec3], indices: &[u32]) -> RemapResult<Vec<[u32; 3]>> {
    let ids = distinct(indices);
    match ids.len() {
        0..=2 => {
            return Err(RemapError::degenerate_polygon(format!(
                "{} distinct vertices",
                ids.len()
            )))
        }
        3 => return Ok(vec![[ids[0], ids[1], ids[2]]]),
        _ => {}
    }

    let positions: Vec<DVec3> = ids.iter().map(|&i| points[i as usize]).collect();
    let basis = PlaneBasis::from_points(&positions)?;
    let sorted = sort_with_basis(points, &ids, &basis);

    let origin = points[sorted[0] as usize];
    let projected: Vec<DVec2> = sorted
        .iter()
        .map(|&i| basis.project(points[i as usize], origin))
        .collect();

    let simplices = delaunay(&projected);
    if simplices.is_empty() {
        return Err(RemapError::degenerate_polygon("projection has no area"));
    }

    Ok(simplices
        .into_iter()
        .map(|[a, b, c]| [sorted[a], sorted[b], sorted[c]])
        .collect())
}
