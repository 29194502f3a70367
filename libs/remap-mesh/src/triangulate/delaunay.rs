//! # Planar Delaunay Triangulation
//!
//! Incremental Bowyer–Watson insertion over exact `orient2d`/`incircle`
//! predicates. Input is normalized into the unit box before insertion so the
//! enclosing super triangle has a fixed size.

use std::collections::{HashMap, HashSet};

use glam::DVec2;
use robust::{incircle, orient2d, Coord};

/// Half-extent of the enclosing super triangle in normalized units.
const SUPER_TRIANGLE_SCALE: f64 = 1.0e4;

#[inline]
fn coord(p: DVec2) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}

/// Triangulates a planar point set.
///
/// Returns counterclockwise triangles as indices into `points`. Exact
/// duplicates are inserted once; collinear or fewer than three distinct
/// points yield an empty result.
pub fn delaunay(points: &[DVec2]) -> Vec<[usize; 3]> {
    if points.len() < 3 {
        return Vec::new();
    }

    let (mut min, mut max) = (points[0], points[0]);
    for p in &points[1..] {
        min = min.min(*p);
        max = max.max(*p);
    }
    let scale = (max - min).max_element();
    if !scale.is_finite() || scale <= 0.0 {
        return Vec::new();
    }

    let n = points.len();
    let mut verts: Vec<DVec2> = points.iter().map(|p| (*p - min) / scale).collect();
    let m = SUPER_TRIANGLE_SCALE;
    verts.push(DVec2::new(-m, -m));
    verts.push(DVec2::new(3.0 * m, -m));
    verts.push(DVec2::new(-m, 3.0 * m));

    let mut triangles: Vec<[usize; 3]> = vec![[n, n + 1, n + 2]];
    let mut inserted: HashSet<(u64, u64)> = HashSet::with_capacity(n);

    for i in 0..n {
        let p = verts[i];
        if !inserted.insert((p.x.to_bits(), p.y.to_bits())) {
            continue;
        }

        let (bad, good): (Vec<[usize; 3]>, Vec<[usize; 3]>) = triangles
            .into_iter()
            .partition(|&[a, b, c]| incircle(coord(verts[a]), coord(verts[b]), coord(verts[c]), coord(p)) > 0.0);
        triangles = good;

        // Cavity boundary: directed edges of bad triangles not shared by another
        let mut edge_use: HashMap<(usize, usize), usize> = HashMap::new();
        for &[a, b, c] in &bad {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                *edge_use.entry((u.min(v), u.max(v))).or_insert(0) += 1;
            }
        }
        for &[a, b, c] in &bad {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                if edge_use[&(u.min(v), u.max(v))] == 1 {
                    triangles.push([u, v, i]);
                }
            }
        }
    }

    triangles
        .into_iter()
        .filter(|t| t.iter().all(|&v| v < n))
        .filter(|&[a, b, c]| orient2d(coord(verts[a]), coord(verts[b]), coord(verts[c])) > 0.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(points: &[DVec2], tris: &[[usize; 3]]) -> f64 {
        tris.iter()
            .map(|&[a, b, c]| 0.5 * (points[b] - points[a]).perp_dot(points[c] - points[a]))
            .sum()
    }

    #[test]
    fn test_square_two_triangles() {
        let pts = [
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 1.0),
        ];
        let tris = delaunay(&pts);
        assert_eq!(tris.len(), 2);
        assert!((area(&pts, &tris) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_triangles_are_ccw() {
        let pts: Vec<DVec2> = (0..7)
            .map(|k| {
                let t = k as f64 / 7.0 * std::f64::consts::TAU;
                DVec2::new(t.cos() * 3.0, t.sin() * 2.0)
            })
            .collect();
        let tris = delaunay(&pts);
        assert_eq!(tris.len(), 5);
        for &[a, b, c] in &tris {
            assert!((pts[b] - pts[a]).perp_dot(pts[c] - pts[a]) > 0.0);
        }
    }

    #[test]
    fn test_duplicates_skipped() {
        let pts = [
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(0.0, 0.0),
            DVec2::new(0.0, 2.0),
        ];
        let tris = delaunay(&pts);
        assert_eq!(tris.len(), 1);
        assert!((area(&pts, &tris) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_collinear_is_empty() {
        let pts = [DVec2::new(0.0, 0.0), DVec2::new(1.0, 1.0), DVec2::new(2.0, 2.0)];
        assert!(delaunay(&pts).is_empty());
        assert!(delaunay(&pts[..2]).is_empty());
    }

    #[test]
    fn test_interior_point_fans() {
        let pts = [
            DVec2::new(0.0, 0.0),
            DVec2::new(4.0, 0.0),
            DVec2::new(4.0, 4.0),
            DVec2::new(0.0, 4.0),
            DVec2::new(2.0, 2.1),
        ];
        let tris = delaunay(&pts);
        assert_eq!(tris.len(), 4);
        assert!((area(&pts, &tris) - 16.0).abs() < 1e-9);
    }
}
