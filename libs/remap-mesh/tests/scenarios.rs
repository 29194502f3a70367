use approx::assert_relative_eq;
use config::constants::{FilterConfig, POLE_Z_THRESHOLD};
use glam::DVec3;
use remap_mesh::center_mesh::CenterMeshTriangulator;
use remap_mesh::connectivity::CellAdjacencyGraph;
use remap_mesh::fraction::{CellPolygons, FractionComputer};
use remap_mesh::generate::CellKind;
use remap_mesh::mask::{cell_mask_from_mesh, MaskFilter};
use remap_mesh::mesh::FIELD_MASK;
use remap_mesh::triangulate::{triangle_area, triangulate_polygon};
use remap_mesh::{deduplicate_corners, grid_corner_mesh, GridFamily, RawCornerArray};

/// Corner-major raw arrays of a closed lat-lon band.
fn band(cells: usize, lat_lo: f64, lat_hi: f64) -> RawCornerArray {
    let width = 360.0 / cells as f64;
    let offsets = [(0, lat_lo), (1, lat_lo), (1, lat_hi), (0, lat_hi)];
    let (mut lon, mut lat) = (Vec::new(), Vec::new());
    for (dx, y) in offsets {
        for c in 0..cells {
            // The last cell closes onto the corners at lon 0
            lon.push(((c + dx) % cells) as f64 * width);
            lat.push(y);
        }
    }
    RawCornerArray::new(lon, lat, 4).unwrap()
}

#[test]
fn unit_square_triangulates_to_unit_area() {
    let points = vec![
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(1.0, 1.0, 0.0),
        DVec3::new(0.0, 1.0, 0.0),
    ];
    let triangles = triangulate_polygon(&points, &[0, 1, 2, 3]).unwrap();
    assert_eq!(triangles.len(), 2);
    let area: f64 = triangles
        .iter()
        .map(|&[a, b, c]| triangle_area(points[a as usize], points[b as usize], points[c as usize]))
        .sum();
    assert_relative_eq!(area, 1.0, epsilon = 1e-12);
}

#[test]
fn clean_quad_of_centers_gives_two_triangles() {
    let graph = CellAdjacencyGraph::from_corner_lists(&[vec![7, 0], vec![7, 1], vec![7, 2], vec![7, 3]]);
    let lon = [0.0, 1.0, 0.0, 1.0];
    let lat = [0.0, 0.0, 1.0, 1.0];
    let pos: Vec<DVec3> = lon.iter().zip(&lat).map(|(x, y)| DVec3::new(*x, *y, 0.0)).collect();

    let (triangles, _) = CenterMeshTriangulator::new(&graph, &lon, &lat, &pos)
        .unwrap()
        .triangulate();
    assert_eq!(triangles.len(), 2);
}

#[test]
fn full_mask_validity_depends_on_meaning() {
    let mask = vec![1.0; 10];
    let land = MaskFilter::new(FilterConfig::new(0.001, false).unwrap());
    let water = MaskFilter::new(FilterConfig::new(0.001, true).unwrap());
    assert!(land.valid_cells(&mask).iter().all(|v| !v));
    assert!(water.valid_cells(&mask).iter().all(|v| *v));
}

#[test]
fn identical_grids_overlap_fully() {
    let n = 6u32;
    let id = |c: u32, r: u32| r * (n + 1) + c;
    let points: Vec<DVec3> = (0..=n)
        .flat_map(|r| (0..=n).map(move |c| DVec3::new(c as f64 * 2.0, r as f64 * 2.0, 5.0)))
        .collect();
    let mut centers = Vec::new();
    let mut corners = Vec::new();
    for r in 0..n {
        for c in 0..n {
            centers.push(DVec3::new(c as f64 * 2.0 + 1.0, r as f64 * 2.0 + 1.0, 5.0));
            corners.push(vec![id(c, r), id(c + 1, r), id(c + 1, r + 1), id(c, r + 1)]);
        }
    }
    let areas = vec![4.0; corners.len()];
    let mask = vec![1.0; corners.len()];
    let polygons = CellPolygons::new(&points, &centers, &corners).unwrap();

    let (fractions, report) = FractionComputer::default()
        .compute(&polygons, &mask, &polygons, &areas)
        .unwrap();
    assert_eq!(report.computed, corners.len());
    for f in fractions {
        assert_relative_eq!(f, 1.0, epsilon = 1e-9);
    }
}

#[test]
fn torc_corner_mesh_closes_south_pole() {
    let raw = band(32, -84.0, -76.0);
    let mask = vec![0.0; 32];
    let built = grid_corner_mesh(GridFamily::Torc, &raw, Some(&mask), false, CellKind::Triangles, true).unwrap();

    let report = built.pole_fix.unwrap();
    assert!(report.pole_added);
    assert_eq!(report.cap_points, 33);
    assert_eq!(report.cap_triangles, 32);
    assert!(built.mesh.validate().is_ok());

    let point_mask = built.mesh.field(FIELD_MASK).unwrap();
    for (p, m) in built.mesh.points().iter().zip(point_mask) {
        if p.z <= POLE_Z_THRESHOLD {
            assert_eq!(*m, 0.0);
        }
    }
}

#[test]
fn repaired_torc_mask_averages_onto_cells() {
    let raw = band(32, -84.0, -76.0);
    let mask = vec![0.0; 32];
    let built = grid_corner_mesh(GridFamily::Torc, &raw, Some(&mask), false, CellKind::Triangles, true).unwrap();
    let corners = deduplicate_corners(&raw, None, false).unwrap();
    assert_eq!(built.mesh.point_count(), corners.point_count() + 1);

    let cell_mask = cell_mask_from_mesh(&built.mesh, &corners).unwrap();
    assert_eq!(cell_mask.len(), 32);
    // Inner ring corners sit on the cap and are masked out, outer ones keep 1
    for value in cell_mask {
        assert_relative_eq!(value, 0.5, epsilon = 1e-12);
    }
}

#[test]
fn torc_pole_repair_can_be_disabled() {
    let raw = band(32, -84.0, -76.0);
    let built = grid_corner_mesh(GridFamily::Torc, &raw, None, false, CellKind::Triangles, false).unwrap();
    assert!(built.pole_fix.is_none());
    assert_eq!(built.mesh.point_count(), 64);
    assert_eq!(built.mesh.cell_count(), 64);
}

#[test]
fn other_families_skip_pole_repair() {
    let raw = band(32, -84.0, -76.0);
    let built = grid_corner_mesh(GridFamily::Nogt, &raw, None, false, CellKind::Triangles, true).unwrap();
    assert!(built.pole_fix.is_none());
    assert_eq!(built.mesh.point_count(), 64);
    assert_eq!(built.mesh.cell_count(), 64);
}

#[test]
fn polygon_output_skips_pole_repair() {
    let raw = band(32, -84.0, -76.0);
    let built = grid_corner_mesh(GridFamily::Torc, &raw, None, false, CellKind::Polygons, true).unwrap();
    assert!(built.pole_fix.is_none());
    assert_eq!(built.mesh.cell_count(), 32);
}
