//! Centralized configuration values shared across the remap verification pipeline.
//!
//! Each public item in this module documents its purpose and provides a minimal
//! usage example so that downstream crates can remain declarative and avoid
//! scattering literals.

use std::fmt;

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Numerical tolerance used by geometry kernels for degeneracy checks.
///
/// # Examples
/// ```
/// use config::constants::EPSILON_TOLERANCE;
/// assert!(EPSILON_TOLERANCE < 1.0e-6);
/// ```
pub const EPSILON_TOLERANCE: f64 = 1.0e-9;

/// Absolute tolerance below which raw corner coordinates snap to zero.
///
/// # Examples
/// ```
/// use config::constants::ZERO_SNAP_TOLERANCE;
/// let lon = -3.0e-9_f64;
/// let snapped = if lon.abs() <= ZERO_SNAP_TOLERANCE { 0.0 } else { lon };
/// assert_eq!(snapped, 0.0);
/// ```
pub const ZERO_SNAP_TOLERANCE: f64 = 1.0e-8;

/// Decimal digits kept when rounding raw corner coordinates (degrees).
///
/// # Examples
/// ```
/// use config::constants::CORNER_ROUND_DECIMALS;
/// assert_eq!(CORNER_ROUND_DECIMALS, 8);
/// ```
pub const CORNER_ROUND_DECIMALS: i32 = 8;

/// Decimal digits kept when rounding cartesian center points before removing
/// duplicated centers.
///
/// # Examples
/// ```
/// use config::constants::CENTER_ROUND_DECIMALS;
/// assert!(CENTER_ROUND_DECIMALS < 8);
/// ```
pub const CENTER_ROUND_DECIMALS: i32 = 5;

/// Relative tolerance of the "same longitude / same latitude" test in the
/// center-mesh quad split.
pub const QUAD_RELATIVE_TOLERANCE: f64 = 1.0e-4;

/// Absolute tolerance of the "same longitude / same latitude" test in the
/// center-mesh quad split.
pub const QUAD_ABSOLUTE_TOLERANCE: f64 = 1.0e-8;

// =============================================================================
// FILTER CONSTANTS
// =============================================================================

/// Default validity threshold applied to cell masks.
///
/// # Examples
/// ```
/// use config::constants::DEFAULT_MASK_THRESHOLD;
/// let water_amount = 0.5;
/// assert!(water_amount >= DEFAULT_MASK_THRESHOLD);
/// ```
pub const DEFAULT_MASK_THRESHOLD: f64 = 0.001;

/// Multiplier applied to the mean sampled corner-edge length to obtain the
/// source search radius of the fraction computation.
pub const SEARCH_RADIUS_FACTOR: f64 = 3.0;

/// Number of evenly strided cells sampled per mesh when estimating the mean
/// corner-edge length.
pub const EDGE_SAMPLE_COUNT: usize = 10;

// =============================================================================
// ELLIPSOID CONSTANTS
// =============================================================================

/// WGS84 semi-major axis in metres.
pub const WGS84_SEMI_MAJOR_AXIS: f64 = 6_378_137.0;

/// WGS84 flattening.
pub const WGS84_FLATTENING: f64 = 1.0 / 298.257_223_563;

// =============================================================================
// POLE DEFECT CONSTANTS
// =============================================================================

/// Name of the grid family carrying the singular south-pole defect.
pub const POLE_FIX_GRID: &str = "torc";

/// Cartesian z value (metres) at or below which a point belongs to the polar
/// cap of the defective grid.
///
/// # Examples
/// ```
/// use config::constants::{POLE_Z_THRESHOLD, WGS84_SEMI_MAJOR_AXIS};
/// assert!(POLE_Z_THRESHOLD.abs() < WGS84_SEMI_MAJOR_AXIS);
/// ```
pub const POLE_Z_THRESHOLD: f64 = -6.215e6;

/// Longest admissible triangle edge (metres) on the defective grid.
pub const POLE_MAX_EDGE_LENGTH: f64 = 1.0e6;

// =============================================================================
// RUNTIME CONFIGURATION
// =============================================================================

/// Validated settings of one mask filtering pass.
///
/// # Examples
/// ```
/// use config::constants::FilterConfig;
/// let config = FilterConfig::default();
/// assert!(config.threshold > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    /// Minimum (water) amount a cell needs to stay valid.
    pub threshold: f64,
    /// Mask values already measure water; otherwise they measure land.
    pub denotes_water: bool,
    /// Multiplier for the fraction search radius.
    pub search_radius_factor: f64,
}

impl FilterConfig {
    /// Builds a configuration enforcing strict validation of the supplied
    /// threshold.
    ///
    /// # Examples
    /// ```
    /// use config::constants::FilterConfig;
    /// let cfg = FilterConfig::new(0.5, true).expect("valid config");
    /// assert!(cfg.denotes_water);
    /// assert!(FilterConfig::new(1.5, true).is_err());
    /// ```
    pub fn new(threshold: f64, denotes_water: bool) -> Result<Self, ConfigError> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        Ok(Self {
            threshold,
            denotes_water,
            search_radius_factor: SEARCH_RADIUS_FACTOR,
        })
    }

    /// Replaces the fraction search radius factor.
    ///
    /// # Examples
    /// ```
    /// use config::constants::FilterConfig;
    /// let cfg = FilterConfig::default().with_search_radius_factor(4.0).unwrap();
    /// assert_eq!(cfg.search_radius_factor, 4.0);
    /// ```
    pub fn with_search_radius_factor(mut self, factor: f64) -> Result<Self, ConfigError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ConfigError::InvalidSearchFactor(factor));
        }
        self.search_radius_factor = factor;
        Ok(self)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MASK_THRESHOLD,
            denotes_water: false,
            search_radius_factor: SEARCH_RADIUS_FACTOR,
        }
    }
}

/// Error returned when invalid configuration values are provided.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Raised when the mask threshold lies outside `[0, 1]`.
    InvalidThreshold(f64),
    /// Raised when the search radius factor is zero, negative or not finite.
    InvalidSearchFactor(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidThreshold(value) => {
                write!(f, "mask threshold must lie in [0, 1]: {value}")
            }
            ConfigError::InvalidSearchFactor(value) => {
                write!(f, "search radius factor must be positive: {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
