//! Radius query over persisted reports
//!
//! SQLite evaluates the haversine term from the per-row [`HaversineTerms`]
//! columns with the same products and differences, in the same order, as
//! [`HaversineTerms::haversine_to`]. The radius is turned into the largest
//! term whose distance still fits, so a row is included exactly when
//! `geo::haversine_miles` places it within the radius. A spherical bounding
//! box is added to the predicate first so the `(latitude, longitude)` index
//! narrows the scan.

use sqlx::SqlitePool;
use tracing::debug;

use super::models::{PersistedReport, REPORT_COLUMNS};
use crate::geo::{central_angle_from_haversine, BoundingBox, HaversineTerms, EARTH_RADIUS_MILES};
use crate::{Error, Result};

// Slack so floating-point rounding at the box edge never drops a qualifying row
const BOX_MARGIN_DEG: f64 = 1e-7;

/// Latitude/longitude bounds enclosing every point within `radius_miles`
///
/// Longitude is left unbounded when the circle reaches a pole or crosses
/// the antimeridian.
pub fn radius_bounds(lat: f64, lon: f64, radius_miles: f64) -> BoundingBox {
    let angular = radius_miles / EARTH_RADIUS_MILES;
    let angular_deg = angular.to_degrees();

    let min_lat = lat - angular_deg - BOX_MARGIN_DEG;
    let max_lat = lat + angular_deg + BOX_MARGIN_DEG;

    let unbounded_lon = BoundingBox {
        min_lat: min_lat.max(-90.0),
        max_lat: max_lat.min(90.0),
        min_lon: -180.0,
        max_lon: 180.0,
    };

    if min_lat <= -90.0 || max_lat >= 90.0 {
        return unbounded_lon;
    }

    let ratio = angular.sin() / lat.to_radians().cos();
    if ratio >= 1.0 {
        return unbounded_lon;
    }

    let delta_lon = ratio.asin().to_degrees() + BOX_MARGIN_DEG;
    let min_lon = lon - delta_lon;
    let max_lon = lon + delta_lon;
    if min_lon < -180.0 || max_lon > 180.0 {
        return unbounded_lon;
    }

    BoundingBox {
        min_lat,
        max_lat,
        min_lon,
        max_lon,
    }
}

/// Largest haversine term whose distance is at most `radius_miles`
///
/// Binary search over the bit patterns of `[0.0, 1.0]`; positive floats order
/// the same way as their bits and the distance is non-decreasing in the term.
fn haversine_limit(radius_miles: f64) -> f64 {
    let within = |h: f64| EARTH_RADIUS_MILES * central_angle_from_haversine(h) <= radius_miles;

    if within(1.0) {
        // Radius covers the whole sphere; above any term the SQL can produce
        return 2.0;
    }

    let (mut lo, mut hi) = (0.0f64.to_bits(), 1.0f64.to_bits());
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if within(f64::from_bits(mid)) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    f64::from_bits(lo)
}

/// Reports within `radius_miles` of a center point, newest first
///
/// Storage errors are returned unchanged; there is no retry here.
pub async fn find_within_radius(
    pool: &SqlitePool,
    lat: f64,
    lon: f64,
    radius_miles: f64,
) -> Result<Vec<PersistedReport>> {
    if !lat.is_finite() || !lon.is_finite() || !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(Error::InvalidInput(format!(
            "Invalid center coordinate: ({}, {})",
            lat, lon
        )));
    }
    if !radius_miles.is_finite() || radius_miles < 0.0 {
        return Err(Error::InvalidInput(format!(
            "Radius must be a non-negative number of miles, got {}",
            radius_miles
        )));
    }

    let bounds = radius_bounds(lat, lon, radius_miles);
    let center = HaversineTerms::new(lat, lon);
    let limit = haversine_limit(radius_miles);

    let sql = format!(
        r#"
        SELECT {}
        FROM reports
        WHERE latitude BETWEEN ? AND ?
          AND longitude BETWEEN ? AND ?
          AND (sin_half_lat * ? - cos_half_lat * ?) * (sin_half_lat * ? - cos_half_lat * ?)
              + (? * cos_lat) * ((sin_half_lon * ? - cos_half_lon * ?) * (sin_half_lon * ? - cos_half_lon * ?))
              <= ?
        ORDER BY created_at DESC
        "#,
        REPORT_COLUMNS
    );

    let rows = sqlx::query(&sql)
        .bind(bounds.min_lat)
        .bind(bounds.max_lat)
        .bind(bounds.min_lon)
        .bind(bounds.max_lon)
        .bind(center.cos_half_lat)
        .bind(center.sin_half_lat)
        .bind(center.cos_half_lat)
        .bind(center.sin_half_lat)
        .bind(center.cos_lat)
        .bind(center.cos_half_lon)
        .bind(center.sin_half_lon)
        .bind(center.cos_half_lon)
        .bind(center.sin_half_lon)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    debug!(
        "Radius query ({:.5}, {:.5}) r={} mi matched {} reports",
        lat,
        lon,
        radius_miles,
        rows.len()
    );

    rows.iter().map(PersistedReport::from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::haversine_miles;

    #[test]
    fn test_bounds_enclose_radius_edge_points() {
        let (lat, lon, r) = (29.45, -98.50, 2.0);
        let b = radius_bounds(lat, lon, r);

        // Walk the circle and make sure every point on it is inside the box
        for step in 0..360 {
            let bearing = (step as f64).to_radians();
            let ang = r / EARTH_RADIUS_MILES;
            let lat1 = lat.to_radians();
            let lat2 = (lat1.sin() * ang.cos() + lat1.cos() * ang.sin() * bearing.cos()).asin();
            let lon2 = lon.to_radians()
                + (bearing.sin() * ang.sin() * lat1.cos()).atan2(ang.cos() - lat1.sin() * lat2.sin());
            let (lat2, lon2) = (lat2.to_degrees(), lon2.to_degrees());

            assert!((haversine_miles(lat, lon, lat2, lon2) - r).abs() < 1e-6);
            assert!(b.contains(lat2, lon2), "bearing {} escaped box", step);
        }
    }

    #[test]
    fn test_limit_is_tight_at_the_radius() {
        let center = HaversineTerms::new(29.4241, -98.4936);
        let edge = HaversineTerms::new(29.4391, -98.4702);
        let h = center.haversine_to(&edge);
        let d = haversine_miles(29.4241, -98.4936, 29.4391, -98.4702);

        assert!(h <= haversine_limit(d));
        assert!(h > haversine_limit(f64::from_bits(d.to_bits() - 1)));
    }

    #[test]
    fn test_limit_for_zero_and_global_radius() {
        assert_eq!(haversine_limit(0.0), 0.0);
        assert_eq!(haversine_limit(EARTH_RADIUS_MILES * std::f64::consts::PI), 2.0);
    }

    #[test]
    fn test_bounds_zero_radius_is_tiny() {
        let b = radius_bounds(29.45, -98.50, 0.0);
        assert!(b.contains(29.45, -98.50));
        assert!(b.max_lat - b.min_lat < 1e-6);
    }

    #[test]
    fn test_bounds_near_pole_unbounded_longitude() {
        let b = radius_bounds(89.99, 10.0, 50.0);
        assert_eq!(b.min_lon, -180.0);
        assert_eq!(b.max_lon, 180.0);
        assert_eq!(b.max_lat, 90.0);
    }

    #[test]
    fn test_bounds_across_antimeridian_unbounded_longitude() {
        let b = radius_bounds(0.0, 179.99, 10.0);
        assert_eq!(b.min_lon, -180.0);
        assert_eq!(b.max_lon, 180.0);
    }
}
