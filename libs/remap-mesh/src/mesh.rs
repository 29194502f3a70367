//! # Mesh Data Structure
//!
//! Unstructured point/cell mesh with named point-aligned scalar fields. This is
//! the hand-off format between the engine and the mesh-file writer.

use std::collections::BTreeMap;

use glam::DVec3;

use crate::error::{RemapError, RemapResult};

/// Point field holding the per-point mask value.
pub const FIELD_MASK: &str = "mask";
/// Point field holding the integrated cell area.
pub const FIELD_AREA: &str = "area";
/// Point field holding the overlap fraction.
pub const FIELD_FRAC: &str = "frac";
/// Point field holding an evaluated (remapped) function.
pub const FIELD_EVAL: &str = "eval";
/// Point field holding the pointwise error against a reference.
pub const FIELD_ERROR: &str = "error";

/// An unstructured mesh of points, index cells and point fields.
///
/// Cells are ordered index lists. Triangulated meshes only carry 3-index
/// cells; polygon meshes carry one cell per grid cell.
///
/// # Example
///
/// ```rust
/// use remap_mesh::Mesh;
/// use glam::DVec3;
///
/// let mut mesh = Mesh::new();
/// mesh.add_point(DVec3::new(0.0, 0.0, 0.0));
/// mesh.add_point(DVec3::new(1.0, 0.0, 0.0));
/// mesh.add_point(DVec3::new(0.0, 1.0, 0.0));
/// mesh.add_triangle([0, 1, 2]);
/// mesh.set_field("mask", vec![1.0; 3]).unwrap();
/// assert!(mesh.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    points: Vec<DVec3>,
    cells: Vec<Vec<u32>>,
    fields: BTreeMap<String, Vec<f64>>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mesh over the given points, without cells.
    pub fn from_points(points: Vec<DVec3>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    /// Returns the number of points.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Returns the number of cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the mesh has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Adds a point and returns its index.
    ///
    /// Existing fields are extended with `0.0` so they stay point-aligned.
    pub fn add_point(&mut self, position: DVec3) -> u32 {
        let index = self.points.len() as u32;
        self.points.push(position);
        for values in self.fields.values_mut() {
            values.push(0.0);
        }
        index
    }

    /// Returns the points.
    #[inline]
    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    /// Returns the point at the given index.
    #[inline]
    pub fn point(&self, index: u32) -> DVec3 {
        self.points[index as usize]
    }

    /// Adds a triangle cell.
    pub fn add_triangle(&mut self, triangle: [u32; 3]) {
        self.cells.push(triangle.to_vec());
    }

    /// Adds an arbitrary polygon cell.
    pub fn add_cell(&mut self, cell: Vec<u32>) {
        self.cells.push(cell);
    }

    /// Returns the cells.
    #[inline]
    pub fn cells(&self) -> &[Vec<u32>] {
        &self.cells
    }

    /// Iterates over all 3-index cells.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.cells
            .iter()
            .filter(|cell| cell.len() == 3)
            .map(|cell| [cell[0], cell[1], cell[2]])
    }

    /// Keeps only the cells matching the predicate.
    pub fn retain_cells(&mut self, mut keep: impl FnMut(&[u32]) -> bool) {
        self.cells.retain(|cell| keep(cell));
    }

    /// Attaches a point field, replacing an existing one of the same name.
    pub fn set_field(&mut self, name: impl Into<String>, values: Vec<f64>) -> RemapResult<()> {
        let name = name.into();
        if values.len() != self.points.len() {
            return Err(RemapError::FieldLength {
                name,
                len: values.len(),
                points: self.points.len(),
            });
        }
        self.fields.insert(name, values);
        Ok(())
    }

    /// Returns a point field or a `MissingField` error.
    pub fn field(&self, name: &str) -> RemapResult<&[f64]> {
        self.fields
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| RemapError::missing_field(name))
    }

    /// Returns a mutable point field or a `MissingField` error.
    pub fn field_mut(&mut self, name: &str) -> RemapResult<&mut [f64]> {
        self.fields
            .get_mut(name)
            .map(Vec::as_mut_slice)
            .ok_or_else(|| RemapError::missing_field(name))
    }

    /// Returns true if the field exists.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Sum of the areas of all triangle cells.
    pub fn triangle_area(&self) -> f64 {
        self.triangles()
            .map(|[a, b, c]| crate::triangulate::triangle_area(self.point(a), self.point(b), self.point(c)))
            .sum()
    }

    /// Validates the mesh invariants.
    ///
    /// Checks:
    /// - All cell indices reference existing points
    /// - Every field has exactly one value per point
    pub fn validate(&self) -> RemapResult<()> {
        let point_count = self.points.len();

        for (cell_idx, cell) in self.cells.iter().enumerate() {
            if let Some(&bad) = cell.iter().find(|&&idx| idx as usize >= point_count) {
                return Err(RemapError::InvalidTopology(format!(
                    "cell {cell_idx} references point {bad} (mesh has {point_count})"
                )));
            }
        }

        for (name, values) in &self.fields {
            if values.len() != point_count {
                return Err(RemapError::FieldLength {
                    name: name.clone(),
                    len: values.len(),
                    points: point_count,
                });
            }
        }

        Ok(())
    }
}
