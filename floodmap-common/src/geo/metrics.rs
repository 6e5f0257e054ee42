//! Great-circle distance and elapsed-time metrics

use crate::observation::Geolocated;

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Mean Earth radius in statute miles
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Per-point trigonometric terms of the haversine formula
///
/// The haversine of the angle between two points needs only products and
/// differences of these terms, so they are also stored with each report and
/// the radius query evaluates the same arithmetic inside SQLite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HaversineTerms {
    pub sin_half_lat: f64,
    pub cos_half_lat: f64,
    pub sin_half_lon: f64,
    pub cos_half_lon: f64,
    pub cos_lat: f64,
}

impl HaversineTerms {
    /// Terms for a coordinate given in degrees
    pub fn new(lat: f64, lon: f64) -> Self {
        let lat_rad = lat.to_radians();
        let half_lat = lat_rad / 2.0;
        let half_lon = lon.to_radians() / 2.0;
        Self {
            sin_half_lat: half_lat.sin(),
            cos_half_lat: half_lat.cos(),
            sin_half_lon: half_lon.sin(),
            cos_half_lon: half_lon.cos(),
            cos_lat: lat_rad.cos(),
        }
    }

    /// `sin²(Δφ/2) + cos φ1 · cos φ2 · sin²(Δλ/2)` between `self` and `other`
    ///
    /// The half-angle differences use `sin(x - y) = sin x cos y - cos x sin y`.
    /// Operand order here must stay in step with the SQL in
    /// `db::proximity::find_within_radius`.
    pub fn haversine_to(&self, other: &Self) -> f64 {
        let s_lat = other.sin_half_lat * self.cos_half_lat - other.cos_half_lat * self.sin_half_lat;
        let s_lon = other.sin_half_lon * self.cos_half_lon - other.cos_half_lon * self.sin_half_lon;
        s_lat * s_lat + (self.cos_lat * other.cos_lat) * (s_lon * s_lon)
    }
}

/// Central angle (radians) for a haversine term
pub fn central_angle_from_haversine(h: f64) -> f64 {
    // Rounding can push `h` a hair past 1.0 for near-antipodal inputs
    2.0 * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Haversine central angle (radians) between two points given in degrees
fn central_angle(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let h = HaversineTerms::new(lat1, lon1).haversine_to(&HaversineTerms::new(lat2, lon2));
    central_angle_from_haversine(h)
}

/// Haversine distance in kilometers between two coordinates
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    EARTH_RADIUS_KM * central_angle(lat1, lon1, lat2, lon2)
}

/// Haversine distance in miles between two coordinates
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    EARTH_RADIUS_MILES * central_angle(lat1, lon1, lat2, lon2)
}

/// Great-circle distance between two observations, in kilometers
pub fn distance_km<A: Geolocated + ?Sized, B: Geolocated + ?Sized>(a: &A, b: &B) -> f64 {
    haversine_km(a.latitude(), a.longitude(), b.latitude(), b.longitude())
}

/// Great-circle distance between two observations, in miles
pub fn distance_miles<A: Geolocated + ?Sized, B: Geolocated + ?Sized>(a: &A, b: &B) -> f64 {
    haversine_miles(a.latitude(), a.longitude(), b.latitude(), b.longitude())
}

/// Absolute time between two observations, in milliseconds
///
/// Computed as an unsigned difference so extreme timestamps cannot overflow.
pub fn elapsed_ms<A: Geolocated + ?Sized, B: Geolocated + ?Sized>(a: &A, b: &B) -> u64 {
    a.timestamp_ms().abs_diff(b.timestamp_ms())
}
