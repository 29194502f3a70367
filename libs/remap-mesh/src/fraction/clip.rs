//! # Convex Polygon Clipping
//!
//! Planar helpers for the overlap computation: convex hull, convex-convex
//! intersection and polygon area. All polygons are counterclockwise vertex
//! rings without a repeated closing vertex.

use glam::DVec2;

/// Absolute area of a simple polygon ring.
pub fn shoelace_area(ring: &[DVec2]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n).map(|i| ring[i].perp_dot(ring[(i + 1) % n])).sum();
    0.5 * twice.abs()
}

/// Convex hull by Andrew's monotone chain.
///
/// Returns the hull counterclockwise without collinear vertices. Inputs with
/// no area give fewer than three vertices.
pub fn convex_hull(points: &[DVec2]) -> Vec<DVec2> {
    let mut pts: Vec<DVec2> = points.iter().copied().filter(|p| p.is_finite()).collect();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let turn = |o: DVec2, a: DVec2, b: DVec2| (a - o).perp_dot(b - o);
    let mut hull: Vec<DVec2> = Vec::with_capacity(pts.len() * 2);

    for &p in &pts {
        while hull.len() >= 2 && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Intersection of two convex counterclockwise polygons (Sutherland–Hodgman).
pub fn clip_convex(subject: &[DVec2], clip: &[DVec2]) -> Vec<DVec2> {
    let mut output = subject.to_vec();
    let n = clip.len();

    for i in 0..n {
        if output.is_empty() {
            break;
        }
        let a = clip[i];
        let b = clip[(i + 1) % n];
        let edge = b - a;
        let inside = |p: DVec2| edge.perp_dot(p - a) >= 0.0;

        let input = std::mem::take(&mut output);
        let m = input.len();
        for j in 0..m {
            let current = input[j];
            let previous = input[(j + m - 1) % m];
            match (inside(previous), inside(current)) {
                (true, true) => output.push(current),
                (true, false) => output.push(line_intersection(previous, current, a, edge)),
                (false, true) => {
                    output.push(line_intersection(previous, current, a, edge));
                    output.push(current);
                }
                (false, false) => {}
            }
        }
    }
    output
}

/// Point where segment `p`→`q` crosses the line through `a` along `dir`.
fn line_intersection(p: DVec2, q: DVec2, a: DVec2, dir: DVec2) -> DVec2 {
    let d = q - p;
    let denom = dir.perp_dot(d);
    if denom == 0.0 {
        return p;
    }
    let t = dir.perp_dot(a - p) / denom;
    p + d * t
}

/// Area shared by two convex counterclockwise polygons.
pub fn intersection_area(a: &[DVec2], b: &[DVec2]) -> f64 {
    if a.len() < 3 || b.len() < 3 {
        return 0.0;
    }
    shoelace_area(&clip_convex(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(x: f64, y: f64, size: f64) -> Vec<DVec2> {
        vec![
            DVec2::new(x, y),
            DVec2::new(x + size, y),
            DVec2::new(x + size, y + size),
            DVec2::new(x, y + size),
        ]
    }

    #[test]
    fn test_shoelace() {
        assert_relative_eq!(shoelace_area(&square(0.0, 0.0, 2.0)), 4.0);
        let mut cw = square(0.0, 0.0, 2.0);
        cw.reverse();
        assert_relative_eq!(shoelace_area(&cw), 4.0);
        assert_eq!(shoelace_area(&cw[..2]), 0.0);
    }

    #[test]
    fn test_hull_drops_interior_and_collinear() {
        let mut pts = square(0.0, 0.0, 2.0);
        pts.push(DVec2::new(1.0, 1.0));
        pts.push(DVec2::new(1.0, 0.0));
        pts.push(DVec2::new(0.0, 0.0));
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert_relative_eq!(shoelace_area(&hull), 4.0);
        // Counterclockwise
        let twice: f64 = (0..4).map(|i| hull[i].perp_dot(hull[(i + 1) % 4])).sum();
        assert!(twice > 0.0);
    }

    #[test]
    fn test_hull_of_collinear_points() {
        let pts = [DVec2::new(0.0, 0.0), DVec2::new(1.0, 1.0), DVec2::new(2.0, 2.0)];
        assert!(convex_hull(&pts).len() < 3);
    }

    #[test]
    fn test_overlap_of_offset_squares() {
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);
        assert_relative_eq!(intersection_area(&a, &b), 1.0, epsilon = 1e-12);
        assert_relative_eq!(intersection_area(&b, &a), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_contained_and_disjoint() {
        let outer = square(0.0, 0.0, 4.0);
        let inner = square(1.0, 1.0, 1.0);
        assert_relative_eq!(intersection_area(&outer, &inner), 1.0, epsilon = 1e-12);
        assert_relative_eq!(intersection_area(&inner, &outer), 1.0, epsilon = 1e-12);
        assert_eq!(intersection_area(&inner, &square(10.0, 10.0, 1.0)), 0.0);
    }

    #[test]
    fn test_edge_neighbours_have_no_overlap() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(1.0, 0.0, 1.0);
        assert!(intersection_area(&a, &b).abs() < 1e-12);
    }
}
