//! # Remap Errors
//!
//! Error types for mesh reconstruction and filtering.
//!
//! ## Error Policy
//!
//! - Degenerate cells and polygons are recoverable: the producing stage skips
//!   the cell and counts it
//! - Missing fields, bad projections and malformed inputs abort the run

use config::constants::ConfigError;
use pipeline_types::Stage;
use thiserror::Error;

/// Errors that can occur while building, filtering or measuring meshes.
#[derive(Debug, Error)]
pub enum RemapError {
    /// A cell resolves to fewer than three unique corners.
    #[error("Degenerate cell {cell} during {stage:?}: {unique} unique corners")]
    DegenerateCell {
        stage: Stage,
        cell: usize,
        unique: usize,
    },

    /// A polygon has no usable planar projection.
    #[error("Degenerate polygon: {message}")]
    DegeneratePolygon { message: String },

    /// A required point field is absent.
    #[error("Missing field '{name}'")]
    MissingField { name: String },

    /// A point field does not match the point count.
    #[error("Field '{name}' has {len} values, mesh has {points} points")]
    FieldLength {
        name: String,
        len: usize,
        points: usize,
    },

    /// Invalid or incompatible coordinate system pair.
    #[error("Projection error: {0}")]
    Projection(String),

    /// Input arrays disagree in shape.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Cell references a point outside the mesh.
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// Grid family name not in the known set.
    #[error("Unknown grid family '{0}'")]
    UnknownGrid(String),

    /// Invalid runtime configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl RemapError {
    /// Creates a degenerate polygon error.
    pub fn degenerate_polygon(message: impl Into<String>) -> Self {
        Self::DegeneratePolygon {
            message: message.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(name: impl Into<String>) -> Self {
        Self::MissingField { name: name.into() }
    }

    /// Creates a shape mismatch error.
    pub fn shape_mismatch(message: impl Into<String>) -> Self {
        Self::ShapeMismatch(message.into())
    }

    /// Returns true for conditions a stage absorbs by skipping the cell.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DegenerateCell { .. } | Self::DegeneratePolygon { .. }
        )
    }
}

/// Result type alias for remap operations.
pub type RemapResult<T> = Result<T, RemapError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RemapError::missing_field("area");
        assert!(err.to_string().contains("area"));

        let err = RemapError::DegenerateCell {
            stage: Stage::MaskFilter,
            cell: 7,
            unique: 2,
        };
        assert!(err.to_string().contains("cell 7"));
        assert!(err.to_string().contains("MaskFilter"));
    }

    #[test]
    fn test_recoverable_split() {
        assert!(RemapError::degenerate_polygon("collinear").is_recoverable());
        assert!(!RemapError::missing_field("mask").is_recoverable());
        assert!(!RemapError::Projection("bad ellipsoid".into()).is_recoverable());
    }

    #[test]
    fn test_config_error_converts() {
        let err: RemapError = ConfigError::InvalidThreshold(2.0).into();
        assert!(matches!(err, RemapError::Config(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RemapError>();
    }
}
