//! Official alert feed client
//!
//! Fetches active alerts from an NWS-style GeoJSON API and converts each
//! feature into an [`OfficialAlert`] positioned at the average of its
//! polygon vertices. Connection handling lives here so fusion stays free of
//! I/O.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use floodmap_common::config::AlertFeedConfig;
use floodmap_common::geo::GeoPoint;
use floodmap_common::observation::NWS_SOURCE;
use floodmap_common::time::parse_rfc3339_ms;
use floodmap_common::{OfficialAlert, Severity};

/// Supplies a snapshot of official alerts around a point
#[async_trait]
pub trait AlertSource: Send + Sync {
    async fn fetch_active(&self, center: GeoPoint) -> Result<Vec<OfficialAlert>>;
}

/// Alert source used when the feed is disabled in config
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledAlertSource;

#[async_trait]
impl AlertSource for DisabledAlertSource {
    async fn fetch_active(&self, _center: GeoPoint) -> Result<Vec<OfficialAlert>> {
        Ok(Vec::new())
    }
}

/// HTTP client for the National Weather Service alerts API
pub struct NwsAlertClient {
    client: reqwest::Client,
    base_url: String,
}

impl NwsAlertClient {
    pub fn new(config: &AlertFeedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build alert feed HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AlertSource for NwsAlertClient {
    async fn fetch_active(&self, center: GeoPoint) -> Result<Vec<OfficialAlert>> {
        let url = format!(
            "{}/alerts/active?point={:.4},{:.4}",
            self.base_url, center.lat, center.lon
        );
        debug!("Fetching active alerts: {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/geo+json")
            .send()
            .await
            .context("Alert feed request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Alert feed returned error: {}", response.status());
        }

        let body = response
            .text()
            .await
            .context("Failed to read alert feed response")?;

        parse_alert_feed(&body)
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    id: Option<String>,
    /// Kept loose so one unsupported geometry type doesn't reject the feed
    #[serde(default)]
    geometry: Option<serde_json::Value>,
    properties: AlertProperties,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum Geometry {
    Point([f64; 2]),
    Polygon(Vec<Vec<[f64; 2]>>),
    MultiPolygon(Vec<Vec<Vec<[f64; 2]>>>),
}

#[derive(Debug, Deserialize)]
struct AlertProperties {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    sent: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    headline: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Map NWS CAP severity onto the fusion severity scale
fn map_severity(nws: Option<&str>) -> Severity {
    match nws {
        Some("Moderate") => Severity::Medium,
        Some("Severe") => Severity::High,
        Some("Extreme") => Severity::Extreme,
        _ => Severity::Low,
    }
}

/// Average of a ring's vertices; GeoJSON order is `[lon, lat]`
fn ring_center(ring: &[[f64; 2]]) -> Option<GeoPoint> {
    // Closed rings repeat the first vertex at the end
    let open = match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    };
    if open.is_empty() {
        return None;
    }

    let n = open.len() as f64;
    let (lon_sum, lat_sum) = open
        .iter()
        .fold((0.0, 0.0), |(lo, la), [lon, lat]| (lo + lon, la + lat));
    Some(GeoPoint::new(lat_sum / n, lon_sum / n))
}

fn geometry_center(geometry: &Geometry) -> Option<GeoPoint> {
    match geometry {
        Geometry::Point([lon, lat]) => Some(GeoPoint::new(*lat, *lon)),
        Geometry::Polygon(rings) => rings.first().and_then(|r| ring_center(r)),
        Geometry::MultiPolygon(polygons) => polygons
            .first()
            .and_then(|rings| rings.first())
            .and_then(|r| ring_center(r)),
    }
}

/// Parse an active-alerts GeoJSON document
///
/// Features without a usable geometry or `sent` timestamp cannot be placed
/// in space or time and are skipped.
pub fn parse_alert_feed(body: &str) -> Result<Vec<OfficialAlert>> {
    let collection: FeatureCollection =
        serde_json::from_str(body).context("Failed to parse alert feed GeoJSON")?;

    let mut alerts = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let props = feature.properties;
        let id = match props.id.or(feature.id) {
            Some(id) => id,
            None => {
                warn!("Skipping alert feature without id");
                continue;
            }
        };

        let center = feature
            .geometry
            .and_then(|value| serde_json::from_value::<Geometry>(value).ok())
            .as_ref()
            .and_then(geometry_center);
        let Some(center) = center else {
            warn!("Skipping alert {} without geometry", id);
            continue;
        };

        let Some(timestamp_ms) = props.sent.as_deref().and_then(parse_rfc3339_ms) else {
            warn!("Skipping alert {} without a valid sent time", id);
            continue;
        };

        let description = props
            .headline
            .or(props.description)
            .or(props.event)
            .unwrap_or_default();

        alerts.push(OfficialAlert {
            id,
            latitude: center.lat,
            longitude: center.lon,
            timestamp_ms,
            severity: map_severity(props.severity.as_deref()),
            description,
            source: NWS_SOURCE.to_string(),
        });
    }

    debug!("Parsed {} alerts from feed", alerts.len());
    Ok(alerts)
}
