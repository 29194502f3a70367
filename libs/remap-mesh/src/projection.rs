//! # Coordinate Projection
//!
//! Conversion between geodetic (lon, lat, height) and geocentric cartesian
//! coordinates.
//!
//! ## Modes
//!
//! - **GeodeticToCartesian**: WGS84 lon/lat/height in degrees and metres to
//!   WGS84 geocentric metres
//! - **CartesianToGeodetic**: the inverse
//! - **Manual**: any pair of geodetic/geocentric systems over caller-supplied
//!   ellipsoids
//!
//! Longitudes are wrapped into `[-180, 180]` before a geodetic source is
//! converted so cells straddling the seam do not tear.

use config::constants::{WGS84_FLATTENING, WGS84_SEMI_MAJOR_AXIS};
use glam::DVec3;

use crate::error::{RemapError, RemapResult};

/// Iterations of the latitude fixed-point solve; converges far below 1e-9 deg.
const GEODETIC_ITERATIONS: usize = 10;

/// Distance to the polar axis below which a point is treated as a pole.
const POLAR_AXIS_TOLERANCE: f64 = 1e-9;

/// A reference ellipsoid of revolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Equatorial radius in metres.
    pub semi_major: f64,
    /// Flattening `(a - b) / a`.
    pub flattening: f64,
}

impl Ellipsoid {
    /// The WGS84 ellipsoid.
    pub const WGS84: Self = Self {
        semi_major: WGS84_SEMI_MAJOR_AXIS,
        flattening: WGS84_FLATTENING,
    };

    /// A sphere of the given radius.
    pub fn sphere(radius: f64) -> Self {
        Self {
            semi_major: radius,
            flattening: 0.0,
        }
    }

    /// Polar radius.
    pub fn semi_minor(&self) -> f64 {
        self.semi_major * (1.0 - self.flattening)
    }

    /// First eccentricity squared.
    pub fn eccentricity_sq(&self) -> f64 {
        self.flattening * (2.0 - self.flattening)
    }

    fn validate(&self) -> RemapResult<()> {
        if !self.semi_major.is_finite() || self.semi_major <= 0.0 {
            return Err(RemapError::Projection(format!(
                "semi-major axis must be positive, got {}",
                self.semi_major
            )));
        }
        if !self.flattening.is_finite() || !(0.0..1.0).contains(&self.flattening) {
            return Err(RemapError::Projection(format!(
                "flattening must lie in [0, 1), got {}",
                self.flattening
            )));
        }
        Ok(())
    }

    /// Geodetic degrees/metres to geocentric metres.
    pub fn to_cartesian(&self, lon_deg: f64, lat_deg: f64, height: f64) -> DVec3 {
        let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();
        let e2 = self.eccentricity_sq();
        let n = self.semi_major / (1.0 - e2 * sin_lat * sin_lat).sqrt();

        DVec3::new(
            (n + height) * cos_lat * cos_lon,
            (n + height) * cos_lat * sin_lon,
            (n * (1.0 - e2) + height) * sin_lat,
        )
    }

    /// Geocentric metres to geodetic `(lon_deg, lat_deg, height)`.
    pub fn to_geodetic(&self, p: DVec3) -> DVec3 {
        let e2 = self.eccentricity_sq();
        let lon = p.y.atan2(p.x);
        let dist_axis = p.x.hypot(p.y);

        if dist_axis < POLAR_AXIS_TOLERANCE {
            let lat = if p.z >= 0.0 { 90.0 } else { -90.0 };
            return DVec3::new(lon.to_degrees(), lat, p.z.abs() - self.semi_minor());
        }

        let mut lat = p.z.atan2(dist_axis * (1.0 - e2));
        let mut height = 0.0;
        for _ in 0..GEODETIC_ITERATIONS {
            let sin_lat = lat.sin();
            let n = self.semi_major / (1.0 - e2 * sin_lat * sin_lat).sqrt();
            height = dist_axis / lat.cos() - n;
            lat = p.z.atan2(dist_axis * (1.0 - e2 * n / (n + height)));
        }

        DVec3::new(lon.to_degrees(), lat.to_degrees(), height)
    }
}

/// A coordinate system understood by the projector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinateSystem {
    /// Longitude/latitude in degrees plus ellipsoidal height in metres.
    Geodetic(Ellipsoid),
    /// Earth-centred cartesian metres.
    Geocentric(Ellipsoid),
}

impl CoordinateSystem {
    fn ellipsoid(&self) -> Ellipsoid {
        match self {
            Self::Geodetic(e) | Self::Geocentric(e) => *e,
        }
    }

    fn to_geocentric(&self, p: DVec3) -> DVec3 {
        match self {
            Self::Geodetic(e) => e.to_cartesian(p.x, p.y, p.z),
            Self::Geocentric(_) => p,
        }
    }

    fn from_geocentric(&self, p: DVec3) -> DVec3 {
        match self {
            Self::Geodetic(e) => e.to_geodetic(p),
            Self::Geocentric(_) => p,
        }
    }
}

/// Projection direction with its own pre-conversion normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    /// WGS84 geodetic to WGS84 geocentric.
    GeodeticToCartesian,
    /// WGS84 geocentric to WGS84 geodetic.
    CartesianToGeodetic,
    /// Caller-supplied source/target pair.
    Manual {
        source: CoordinateSystem,
        target: CoordinateSystem,
    },
}

impl ProjectionMode {
    /// Resolves the mode into its (source, target) pair.
    pub fn systems(&self) -> (CoordinateSystem, CoordinateSystem) {
        match *self {
            Self::GeodeticToCartesian => (
                CoordinateSystem::Geodetic(Ellipsoid::WGS84),
                CoordinateSystem::Geocentric(Ellipsoid::WGS84),
            ),
            Self::CartesianToGeodetic => (
                CoordinateSystem::Geocentric(Ellipsoid::WGS84),
                CoordinateSystem::Geodetic(Ellipsoid::WGS84),
            ),
            Self::Manual { source, target } => (source, target),
        }
    }

    /// Rejects pairs with unusable ellipsoid parameters.
    pub fn validate(&self) -> RemapResult<()> {
        let (source, target) = self.systems();
        source.ellipsoid().validate()?;
        target.ellipsoid().validate()
    }

    /// Wraps longitudes of a geodetic source into `[-180, 180]`.
    fn normalize(&self, d0: &mut [f64]) {
        if let (CoordinateSystem::Geodetic(_), _) = self.systems() {
            for lon in d0.iter_mut() {
                *lon = wrap_longitude(*lon);
            }
        }
    }
}

/// Wraps a longitude in degrees into `[-180, 180]`.
pub fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Projects coordinate columns into a stacked three-column point array.
///
/// Missing columns are treated as zeros. The mode is validated before any
/// coordinate is touched.
///
/// # Example
///
/// ```rust
/// use remap_mesh::projection::{project, ProjectionMode};
///
/// let points = project(&ProjectionMode::GeodeticToCartesian, &[0.0], Some(&[0.0]), None).unwrap();
/// assert!((points[0].x - 6_378_137.0).abs() < 1e-6);
/// ```
pub fn project(
    mode: &ProjectionMode,
    d0: &[f64],
    d1: Option<&[f64]>,
    d2: Option<&[f64]>,
) -> RemapResult<Vec<DVec3>> {
    mode.validate()?;

    let n = d0.len();
    for (name, column) in [("d1", d1), ("d2", d2)] {
        if let Some(column) = column {
            if column.len() != n {
                return Err(RemapError::shape_mismatch(format!(
                    "{name} has {} values, d0 has {n}",
                    column.len()
                )));
            }
        }
    }

    let mut first = d0.to_vec();
    mode.normalize(&mut first);

    let (source, target) = mode.systems();
    let points = (0..n)
        .map(|i| {
            let p = DVec3::new(
                first[i],
                d1.map_or(0.0, |c| c[i]),
                d2.map_or(0.0, |c| c[i]),
            );
            target.from_geocentric(source.to_geocentric(p))
        })
        .collect();

    Ok(points)
}

/// WGS84 surface points (height 0) for longitude/latitude columns.
pub fn lonlat_to_cartesian(lon: &[f64], lat: &[f64]) -> RemapResult<Vec<DVec3>> {
    project(&ProjectionMode::GeodeticToCartesian, lon, Some(lat), None)
}
