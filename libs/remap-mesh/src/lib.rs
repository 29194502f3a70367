//! # Remap Mesh
//!
//! Mesh reconstruction and conservative filtering for checking remappings
//! between unstructured climate model grids.
//!
//! ## Architecture
//!
//! ```text
//! raw grid arrays → corners (dedup) → triangulate | connectivity → center_mesh
//!                                   → mask (filter, areas) → fraction → Mesh
//! ```
//!
//! ## Components
//!
//! - **Projection**: geodetic ↔ cartesian on WGS84
//! - **Corners**: unique corner set and cell→corner indices
//! - **Triangulation**: planar projection + Delaunay per cell polygon
//! - **Connectivity / center mesh**: triangles over centers from adjacency
//! - **Mask / fraction**: validity, areas and overlap fractions
//! - **Pole fix**: south pole repair for the `torc` family
//!
//! ## Usage
//!
//! ```rust
//! use remap_mesh::{grid_corner_mesh, GridFamily, RawCornerArray};
//! use remap_mesh::generate::CellKind;
//!
//! let lon = vec![0.0, 1.0, 1.0, 0.0];
//! let lat = vec![0.0, 0.0, 1.0, 1.0];
//! let raw = RawCornerArray::new(lon, lat, 4).unwrap();
//! let built = grid_corner_mesh(GridFamily::Icos, &raw, None, false, CellKind::Triangles, true).unwrap();
//! assert_eq!(built.mesh.cell_count(), 2);
//! ```

pub mod center_mesh;
pub mod connectivity;
pub mod corners;
pub mod error;
pub mod filter;
pub mod fraction;
pub mod generate;
pub mod grid;
pub mod mask;
pub mod mesh;
pub mod metrics;
pub mod pole_fix;
pub mod projection;
pub mod triangulate;

pub use corners::{deduplicate_corners, RawCornerArray, UniqueCorners};
pub use error::{RemapError, RemapResult};
pub use filter::{FilterPipeline, GridInput};
pub use generate::{build_center_mesh, build_corner_mesh, CornerMesh, CornerMeshOptions};
pub use grid::{GridFamily, GridVariables};
pub use mesh::Mesh;
pub use pipeline_types::{FilterReport, FractionReport, MisfitMetrics, PoleFixReport, TriangulationReport};

use generate::CellKind;
use pole_fix::PoleDefectFix;

/// Deduplicates the corners of a grid and builds its corner mesh.
///
/// With `pole_fix`, the pole repair runs for families that need it. With
/// `use_filter`, only cells whose raw mask is 0 are kept.
pub fn grid_corner_mesh(
    family: GridFamily,
    raw: &RawCornerArray,
    raw_mask: Option<&[f64]>,
    use_filter: bool,
    cell_kind: CellKind,
    pole_fix: bool,
) -> RemapResult<CornerMesh> {
    let corners = deduplicate_corners(raw, raw_mask, use_filter)?;
    let options = CornerMeshOptions {
        cell_kind,
        use_filter,
        pole_fix: (pole_fix && family.needs_pole_fix()).then(PoleDefectFix::default),
    };
    build_corner_mesh(&corners, raw_mask, options)
}
