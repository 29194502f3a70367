//! # Point Spatial Index
//!
//! Hash grid over 3D points for fixed-radius ball queries. The grid cell size
//! equals the query radius, so a query visits at most 27 buckets.

use std::collections::HashMap;

use glam::DVec3;

/// Integer bucket coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Bucket {
    x: i64,
    y: i64,
    z: i64,
}

impl Bucket {
    fn from_position(pos: DVec3, cell_size: f64) -> Self {
        Self {
            x: (pos.x / cell_size).floor() as i64,
            y: (pos.y / cell_size).floor() as i64,
            z: (pos.z / cell_size).floor() as i64,
        }
    }
}

/// Hash grid of point indices.
#[derive(Debug, Clone)]
pub struct PointIndex<'a> {
    points: &'a [DVec3],
    grid: HashMap<Bucket, Vec<usize>>,
    cell_size: f64,
}

impl<'a> PointIndex<'a> {
    /// Indexes `points` with buckets of `cell_size`.
    ///
    /// Non-positive sizes fall back to unit buckets.
    pub fn new(points: &'a [DVec3], cell_size: f64) -> Self {
        let cell_size = if cell_size > 0.0 && cell_size.is_finite() {
            cell_size
        } else {
            1.0
        };

        let mut grid: HashMap<Bucket, Vec<usize>> = HashMap::new();
        for (i, p) in points.iter().enumerate() {
            grid.entry(Bucket::from_position(*p, cell_size)).or_default().push(i);
        }

        Self {
            points,
            grid,
            cell_size,
        }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if no points are indexed.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Indices of all points within `radius` of `center`, ascending.
    pub fn query_ball(&self, center: DVec3, radius: f64) -> Vec<usize> {
        let lo = Bucket::from_position(center - DVec3::splat(radius), self.cell_size);
        let hi = Bucket::from_position(center + DVec3::splat(radius), self.cell_size);
        let radius_sq = radius * radius;

        let mut found = Vec::new();
        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                for z in lo.z..=hi.z {
                    if let Some(ids) = self.grid.get(&Bucket { x, y, z }) {
                        found.extend(
                            ids.iter()
                                .copied()
                                .filter(|&i| self.points[i].distance_squared(center) <= radius_sq),
                        );
                    }
                }
            }
        }
        found.sort_unstable();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ball_query_matches_brute_force() {
        let points: Vec<DVec3> = (0..200)
            .map(|i| {
                let t = i as f64 * 0.37;
                DVec3::new(t.sin() * 10.0, t.cos() * 7.0, (t * 0.5).sin() * 3.0)
            })
            .collect();
        let index = PointIndex::new(&points, 2.5);

        for center in [DVec3::ZERO, DVec3::new(5.0, -3.0, 1.0), DVec3::new(-9.0, 0.0, 0.0)] {
            let expected: Vec<usize> = (0..points.len())
                .filter(|&i| points[i].distance(center) <= 2.5)
                .collect();
            assert_eq!(index.query_ball(center, 2.5), expected);
        }
    }

    #[test]
    fn test_negative_coordinates_bucketed() {
        let points = vec![DVec3::new(-0.1, -0.1, -0.1), DVec3::new(0.1, 0.1, 0.1)];
        let index = PointIndex::new(&points, 1.0);
        assert_eq!(index.query_ball(DVec3::ZERO, 0.5), vec![0, 1]);
    }

    #[test]
    fn test_degenerate_cell_size() {
        let points = vec![DVec3::ZERO, DVec3::X];
        let index = PointIndex::new(&points, 0.0);
        assert_eq!(index.len(), 2);
        assert_eq!(index.query_ball(DVec3::ZERO, 0.0), vec![0]);
    }
}
