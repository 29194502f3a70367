//! # Config Crate
//!
//! Centralized configuration constants for the remap verification pipeline.
//! Every tolerance, rounding precision and empirical threshold used by the
//! mesh engine is defined here so the geometry code never carries literals.
//!
//! ## Usage
//!
//! ```rust
//! use config::constants::{FilterConfig, ZERO_SNAP_TOLERANCE};
//!
//! // Values this close to zero are snapped before corner rounding
//! let value: f64 = 1e-10;
//! assert!(value.abs() <= ZERO_SNAP_TOLERANCE);
//!
//! // Mask filtering uses a validated configuration
//! let cfg = FilterConfig::new(0.001, false).unwrap();
//! assert!(!cfg.denotes_water);
//! ```
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All constants defined once, used everywhere
//! - **Empirical values are named**: Pole-fix and heuristic tolerances carry
//!   the grid family or stage they belong to
//! - **Validated construction**: Runtime settings go through `FilterConfig::new`

pub mod constants;
