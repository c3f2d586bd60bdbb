//! Geospatial predicates.
//!
//! Pure functions over points and regions. Stores may push these into their
//! query language as a prefilter but must agree with them exactly.

use crate::types::GeoPoint;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Radius applied when a nearby search names none.
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Great-circle distance between two points in kilometers (haversine).
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);

    // Rounding can push h marginally above 1 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Whether `point` lies within `radius_km` of `center` (boundary included).
pub fn within_radius(center: GeoPoint, radius_km: f64, point: GeoPoint) -> bool {
    distance_km(center, point) <= radius_km
}

/// Round a point to 2 decimal places (about 1 km) for approximate display.
pub fn coarsen_point(point: GeoPoint) -> GeoPoint {
    GeoPoint {
        lon: (point.lon * 100.0).round() / 100.0,
        lat: (point.lat * 100.0).round() / 100.0,
    }
}

/// Axis-aligned lon/lat rectangle, typically a map viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub sw: GeoPoint,
    pub ne: GeoPoint,
}

impl BoundingBox {
    pub fn new(sw_lon: f64, sw_lat: f64, ne_lon: f64, ne_lat: f64) -> Self {
        Self {
            sw: GeoPoint::new(sw_lon, sw_lat),
            ne: GeoPoint::new(ne_lon, ne_lat),
        }
    }

    /// Corners are valid points and sw really is southwest of ne.
    ///
    /// A malformed box matches nothing; callers short-circuit to an empty
    /// result instead of raising.
    pub fn is_well_formed(&self) -> bool {
        self.sw.is_valid()
            && self.ne.is_valid()
            && self.sw.lon <= self.ne.lon
            && self.sw.lat <= self.ne.lat
    }

    /// Edges are inclusive. Always false for a malformed box.
    pub fn contains(&self, point: GeoPoint) -> bool {
        self.is_well_formed()
            && point.lon >= self.sw.lon
            && point.lon <= self.ne.lon
            && point.lat >= self.sw.lat
            && point.lat <= self.ne.lat
    }
}
