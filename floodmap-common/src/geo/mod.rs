//! Geospatial primitives: service-region containment and distance metrics

pub mod metrics;
pub mod region;

pub use metrics::{
    central_angle_from_haversine, distance_km, distance_miles, elapsed_ms, haversine_km,
    haversine_miles, HaversineTerms, EARTH_RADIUS_KM, EARTH_RADIUS_MILES,
};
pub use region::{point_in_polygon, BoundingBox, GeoPoint, ServiceRegion};
