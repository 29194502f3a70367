//! # Center Mesh Triangulation Tests

use super::*;
use proptest::prelude::*;

/// Regular `cols` x `rows` lat-lon block of cells; cells sharing any corner
/// are adjacent. Returns graph, lon, lat and planar positions.
fn lattice(cols: u32, rows: u32) -> (CellAdjacencyGraph, Vec<f64>, Vec<f64>, Vec<DVec3>) {
    let corner = |c: u32, r: u32| r * (cols + 1) + c;
    let mut lists = Vec::new();
    let (mut lon, mut lat, mut pos) = (Vec::new(), Vec::new(), Vec::new());
    for r in 0..rows {
        for c in 0..cols {
            lists.push(vec![corner(c, r), corner(c + 1, r), corner(c + 1, r + 1), corner(c, r + 1)]);
            lon.push(c as f64);
            lat.push(r as f64);
            pos.push(DVec3::new(c as f64, r as f64, 0.0));
        }
    }
    (CellAdjacencyGraph::from_corner_lists(&lists), lon, lat, pos)
}

fn edge_usage(triangles: &[[u32; 3]]) -> HashMap<(u32, u32), usize> {
    let mut usage = HashMap::new();
    for &[a, b, c] in triangles {
        for e in [edge(a, b), edge(a, c), edge(b, c)] {
            *usage.entry(e).or_insert(0) += 1;
        }
    }
    usage
}

#[test]
fn test_state_rejects_known_and_full_edges() {
    let mut state = TriangulationState::new();
    assert!(state.try_accept([0, 1, 2]));
    assert!(!state.try_accept([0, 1, 2]));
    assert!(state.try_accept([0, 1, 3]));
    assert_eq!(state.edge_count(1, 0), 2);
    // Edge (0, 1) is full
    assert!(!state.try_accept([0, 1, 4]));
    assert_eq!(state.len(), 2);
}

#[test]
fn test_clean_quad_gives_two_triangles() {
    // Four mutually adjacent centers: all share corner 0
    let graph = CellAdjacencyGraph::from_corner_lists(&[vec![0, 1], vec![0, 2], vec![0, 3], vec![0, 4]]);
    let lon = [0.0, 1.0, 0.0, 1.0];
    let lat = [0.0, 0.0, 1.0, 1.0];
    let pos: Vec<DVec3> = lon.iter().zip(&lat).map(|(x, y)| DVec3::new(*x, *y, 0.0)).collect();

    let tri = CenterMeshTriangulator::new(&graph, &lon, &lat, &pos).unwrap();
    let (triangles, report) = tri.triangulate();

    assert_eq!(triangles, vec![[0, 1, 2], [1, 2, 3]]);
    assert_eq!(report.exclusive_accepted, 2);
    assert_eq!(report.fallback_cells, 0);
    assert_eq!(report.uncovered_cells, 0);
}

#[test]
fn test_quad_split_via_near_diagonal() {
    // a and d share a longitude, so the (a, c) diagonal is used
    let graph = CellAdjacencyGraph::from_corner_lists(&[vec![0, 1], vec![0, 2], vec![0, 3], vec![0, 4]]);
    let lon = [0.0, -1.0, 1.0, 0.0];
    let lat = [0.0, 1.0, 1.0, 2.0];
    let pos: Vec<DVec3> = lon.iter().zip(&lat).map(|(x, y)| DVec3::new(*x, *y, 0.0)).collect();

    let (triangles, _) = CenterMeshTriangulator::new(&graph, &lon, &lat, &pos)
        .unwrap()
        .triangulate();
    assert_eq!(triangles, vec![[0, 1, 2], [0, 2, 3]]);
}

#[test]
fn test_lattice_is_covered() {
    let (graph, lon, lat, pos) = lattice(3, 3);
    let (triangles, report) = CenterMeshTriangulator::new(&graph, &lon, &lat, &pos)
        .unwrap()
        .triangulate();

    assert_eq!(triangles.len(), 8);
    assert_eq!(report.uncovered_cells, 0);
    let area: f64 = triangles
        .iter()
        .map(|&[a, b, c]| crate::triangulate::triangle_area(pos[a as usize], pos[b as usize], pos[c as usize]))
        .sum();
    assert!((area - 4.0).abs() < 1e-12);
}

#[test]
fn test_strip_uses_fallback() {
    // Chain of cells each sharing one corner with the next two
    let lists = vec![vec![0, 1, 2], vec![1, 2, 3], vec![2, 3, 4], vec![3, 4, 5]];
    let graph = CellAdjacencyGraph::from_corner_lists(&lists);
    let lon = [0.0, 1.0, 2.0, 3.0];
    let lat = [0.0, 1.0, 0.0, 1.0];
    let pos: Vec<DVec3> = lon.iter().zip(&lat).map(|(x, y)| DVec3::new(*x, *y, 0.0)).collect();

    let (triangles, report) = CenterMeshTriangulator::new(&graph, &lon, &lat, &pos)
        .unwrap()
        .triangulate();
    assert_eq!(report.quads, 0);
    assert_eq!(triangles, vec![[0, 1, 2], [1, 2, 3]]);
}

#[test]
fn test_length_mismatch() {
    let (graph, lon, lat, pos) = lattice(2, 2);
    assert!(CenterMeshTriangulator::new(&graph, &lon[..3], &lat, &pos).is_err());
}

fn arb_graph() -> impl Strategy<Value = (Vec<Vec<u32>>, Vec<(f64, f64)>)> {
    (3usize..16).prop_flat_map(|cells| {
        (
            prop::collection::vec(prop::collection::vec(0u32..12, 1..4), cells),
            prop::collection::vec((-10.0f64..10.0, -10.0f64..10.0), cells),
        )
    })
}

proptest! {
    #[test]
    fn prop_edges_shared_by_at_most_two((lists, coords) in arb_graph()) {
        let graph = CellAdjacencyGraph::from_corner_lists(&lists);
        let lon: Vec<f64> = coords.iter().map(|c| c.0).collect();
        let lat: Vec<f64> = coords.iter().map(|c| c.1).collect();
        let pos: Vec<DVec3> = coords.iter().map(|c| DVec3::new(c.0, c.1, 0.0)).collect();

        let (triangles, _) = CenterMeshTriangulator::new(&graph, &lon, &lat, &pos)
            .unwrap()
            .triangulate();
        for count in edge_usage(&triangles).values() {
            prop_assert!(*count <= 2);
        }
        for t in &triangles {
            prop_assert!(t[0] < t[1] && t[1] < t[2]);
        }
    }
}
