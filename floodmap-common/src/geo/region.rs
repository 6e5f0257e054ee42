//! Service region containment
//!
//! A coordinate is in the service region when it passes an axis-aligned
//! bounding box test and then a ray-casting point-in-polygon test. The two
//! tests are separate functions so the polygon edge cases can be exercised
//! without the bounding-box fast path.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A WGS84 position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Axis-aligned latitude/longitude bounds (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Smallest box enclosing every vertex; `None` for an empty slice
    pub fn enclosing(vertices: &[GeoPoint]) -> Option<Self> {
        let first = vertices.first()?;
        let init = BoundingBox {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lon: first.lon,
            max_lon: first.lon,
        };

        Some(vertices.iter().skip(1).fold(init, |b, v| BoundingBox {
            min_lat: b.min_lat.min(v.lat),
            max_lat: b.max_lat.max(v.lat),
            min_lon: b.min_lon.min(v.lon),
            max_lon: b.max_lon.max(v.lon),
        }))
    }

    /// Inclusive containment; any NaN coordinate is outside
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// Ray-casting point-in-polygon test
///
/// Casts a ray from the point toward increasing longitude and counts edge
/// crossings; an odd count means inside. Points exactly on an edge or vertex
/// may resolve either way, but always resolve the same way for the same
/// input. Fewer than three vertices never contain anything.
pub fn point_in_polygon(lat: f64, lon: f64, vertices: &[GeoPoint]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = vertices[i];
        let vj = vertices[j];

        // Edge straddles the ray's latitude (half-open so shared vertices count once)
        if (vi.lat > lat) != (vj.lat > lat) {
            let crossing_lon = vi.lon + (lat - vi.lat) * (vj.lon - vi.lon) / (vj.lat - vi.lat);
            if lon < crossing_lon {
                inside = !inside;
            }
        }
        j = i;
    }

    inside
}

/// The bounded metropolitan area fusion considers relevant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceRegion {
    name: String,
    vertices: Vec<GeoPoint>,
    bounds: BoundingBox,
}

impl ServiceRegion {
    /// Build a region from its boundary vertices
    ///
    /// Validation happens here, once, at startup. A region that passes is
    /// safe to query with any input.
    pub fn new(name: impl Into<String>, vertices: Vec<GeoPoint>) -> Result<Self> {
        let name = name.into();

        if vertices.len() < 3 {
            return Err(Error::Config(format!(
                "Service region '{}' needs at least 3 vertices, got {}",
                name,
                vertices.len()
            )));
        }

        for (idx, v) in vertices.iter().enumerate() {
            if !v.lat.is_finite() || !v.lon.is_finite() {
                return Err(Error::Config(format!(
                    "Service region '{}' vertex {} is not finite",
                    name, idx
                )));
            }
            if !(-90.0..=90.0).contains(&v.lat) || !(-180.0..=180.0).contains(&v.lon) {
                return Err(Error::Config(format!(
                    "Service region '{}' vertex {} out of range: ({}, {})",
                    name, idx, v.lat, v.lon
                )));
            }
        }

        let bounds = BoundingBox::enclosing(&vertices)
            .ok_or_else(|| Error::Config(format!("Service region '{}' is empty", name)))?;

        Ok(Self {
            name,
            vertices,
            bounds,
        })
    }

    /// Greater San Antonio, the compiled-in default service area
    pub fn default_region() -> Self {
        Self {
            name: "san-antonio-metro".to_string(),
            vertices: DEFAULT_REGION_VERTICES
                .iter()
                .map(|&(lat, lon)| GeoPoint::new(lat, lon))
                .collect(),
            bounds: BoundingBox {
                min_lat: 28.90,
                max_lat: 30.15,
                min_lon: -99.20,
                max_lon: -97.85,
            },
        }
    }

    /// True when the coordinate lies inside the service region
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.bounds.contains(lat, lon) && point_in_polygon(lat, lon, &self.vertices)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[GeoPoint] {
        &self.vertices
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Vertex-average center of the region
    pub fn centroid(&self) -> GeoPoint {
        let n = self.vertices.len() as f64;
        let (lat_sum, lon_sum) = self
            .vertices
            .iter()
            .fold((0.0, 0.0), |(la, lo), v| (la + v.lat, lo + v.lon));
        GeoPoint::new(lat_sum / n, lon_sum / n)
    }
}

impl Default for ServiceRegion {
    fn default() -> Self {
        Self::default_region()
    }
}

// (lat, lon), clockwise from the north-west corner
const DEFAULT_REGION_VERTICES: [(f64, f64); 8] = [
    (30.15, -98.90),
    (30.10, -98.20),
    (29.85, -97.85),
    (29.35, -97.85),
    (28.95, -98.20),
    (28.90, -98.85),
    (29.20, -99.20),
    (29.80, -99.20),
];
