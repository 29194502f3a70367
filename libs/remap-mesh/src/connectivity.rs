//! # Cell Connectivity
//!
//! Two cells are adjacent when they share at least one corner id. The graph is
//! built by inverting the cell→corner matrix into corner→cells and joining
//! every pair of cells listed under the same corner.

use std::collections::BTreeSet;

use tracing::debug;

/// Cell adjacency over a fixed set of active cells.
///
/// Neighbour sets are ordered, so iteration is by ascending cell id. The graph
/// is symmetric and never lists a cell as its own neighbour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellAdjacencyGraph {
    neighbours: Vec<BTreeSet<u32>>,
}

impl CellAdjacencyGraph {
    /// Builds the graph from per-cell corner id lists.
    ///
    /// Cell ids are positions in `corner_lists`. Repeated ids within one cell
    /// are harmless.
    pub fn from_corner_lists(corner_lists: &[Vec<u32>]) -> Self {
        let point_count = corner_lists
            .iter()
            .flatten()
            .max()
            .map_or(0, |&max| max as usize + 1);

        let mut point_cells: Vec<Vec<u32>> = vec![Vec::new(); point_count];
        for (cell, corners) in corner_lists.iter().enumerate() {
            for &corner in corners {
                let cells = &mut point_cells[corner as usize];
                if cells.last() != Some(&(cell as u32)) {
                    cells.push(cell as u32);
                }
            }
        }

        let mut neighbours = vec![BTreeSet::new(); corner_lists.len()];
        for cells in &point_cells {
            for &a in cells {
                for &b in cells {
                    if a != b {
                        neighbours[a as usize].insert(b);
                    }
                }
            }
        }

        let graph = Self { neighbours };
        debug!(
            cells = graph.cell_count(),
            edges = graph.edge_count(),
            "Built cell adjacency graph"
        );
        graph
    }

    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.neighbours.len()
    }

    /// Number of undirected adjacency edges.
    pub fn edge_count(&self) -> usize {
        self.neighbours.iter().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Neighbours of a cell in ascending order.
    pub fn neighbours(&self, cell: u32) -> &BTreeSet<u32> {
        &self.neighbours[cell as usize]
    }

    /// True if the two cells share a corner.
    pub fn are_adjacent(&self, a: u32, b: u32) -> bool {
        self.neighbours[a as usize].contains(&b)
    }

    /// Cells adjacent to both `a` and `b`, ascending.
    pub fn common_neighbours(&self, a: u32, b: u32) -> BTreeSet<u32> {
        self.neighbours[a as usize]
            .intersection(&self.neighbours[b as usize])
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x2 block of quads sharing a center corner (id 4).
    fn block() -> Vec<Vec<u32>> {
        vec![
            vec![0, 1, 4, 3],
            vec![1, 2, 5, 4],
            vec![3, 4, 7, 6],
            vec![4, 5, 8, 7],
        ]
    }

    #[test]
    fn test_shared_corner_makes_neighbours() {
        let graph = CellAdjacencyGraph::from_corner_lists(&block());
        for cell in 0..4 {
            let expected: BTreeSet<u32> = (0..4).filter(|&c| c != cell).collect();
            assert_eq!(graph.neighbours(cell), &expected);
        }
        assert_eq!(graph.edge_count(), 6);
    }

    #[test]
    fn test_symmetric_and_no_self() {
        let mut lists = block();
        lists.push(vec![8, 9, 10, 10]);
        lists.push(vec![20, 21, 22]);
        let graph = CellAdjacencyGraph::from_corner_lists(&lists);

        for a in 0..graph.cell_count() as u32 {
            assert!(!graph.are_adjacent(a, a));
            for &b in graph.neighbours(a) {
                assert!(graph.are_adjacent(b, a));
            }
        }
        assert_eq!(graph.neighbours(4).iter().copied().collect::<Vec<_>>(), vec![3]);
        assert!(graph.neighbours(5).is_empty());
    }

    #[test]
    fn test_common_neighbours() {
        let lists = vec![vec![0, 1, 2], vec![1, 2, 3], vec![2, 3, 4], vec![4, 5, 6]];
        let graph = CellAdjacencyGraph::from_corner_lists(&lists);
        assert_eq!(graph.common_neighbours(0, 1).into_iter().collect::<Vec<_>>(), vec![2]);
        assert_eq!(graph.common_neighbours(0, 3).into_iter().collect::<Vec<_>>(), vec![2]);
        assert!(graph.common_neighbours(2, 3).is_empty());
    }

    #[test]
    fn test_empty() {
        let graph = CellAdjacencyGraph::from_corner_lists(&[]);
        assert_eq!(graph.cell_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }
}
