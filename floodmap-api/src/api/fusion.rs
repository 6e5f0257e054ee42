//! Fusion endpoints
//!
//! `POST /api/fuse` fuses caller-supplied snapshots. `GET /api/fused` builds
//! both snapshots itself: stored reports near a point and live alerts from
//! the feed, fetched concurrently.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use floodmap_common::db::find_within_radius;
use floodmap_common::geo::GeoPoint;
use floodmap_common::{CommunityReport, OfficialAlert, UnifiedReport};

use super::nearby::default_radius_miles;
use super::ApiError;
use crate::AppState;

/// Snapshots to fuse
#[derive(Debug, Deserialize)]
pub struct FuseRequest {
    #[serde(default)]
    pub reports: Vec<CommunityReport>,
    #[serde(default)]
    pub alerts: Vec<OfficialAlert>,
}

/// Fused result set
#[derive(Debug, Serialize)]
pub struct FusionResponse {
    pub count: usize,
    pub merged: usize,
    /// False when the alert feed could not be reached and fusion ran without it
    pub alerts_available: bool,
    pub reports: Vec<UnifiedReport>,
}

impl FusionResponse {
    fn new(reports: Vec<UnifiedReport>, alerts_available: bool) -> Self {
        Self {
            count: reports.len(),
            merged: reports.iter().filter(|r| r.is_merged()).count(),
            alerts_available,
            reports,
        }
    }
}

/// POST /api/fuse
pub async fn fuse_snapshots(
    State(state): State<AppState>,
    Json(request): Json<FuseRequest>,
) -> Json<FusionResponse> {
    let fused = state.engine.fuse(&request.reports, &request.alerts);
    Json(FusionResponse::new(fused, true))
}

/// Query parameters for the live fused view
#[derive(Debug, Deserialize)]
pub struct FusedViewQuery {
    /// Center latitude; region centroid when omitted
    pub lat: Option<f64>,
    /// Center longitude; region centroid when omitted
    pub lon: Option<f64>,
    #[serde(default = "default_radius_miles")]
    pub radius_miles: f64,
}

/// GET /api/fused?lat=..&lon=..&radius_miles=..
///
/// A failing alert feed degrades to report-only fusion; a failing store is
/// an error.
pub async fn fused_view(
    State(state): State<AppState>,
    Query(query): Query<FusedViewQuery>,
) -> Result<Json<FusionResponse>, ApiError> {
    let center = match (query.lat, query.lon) {
        (Some(lat), Some(lon)) => GeoPoint::new(lat, lon),
        (None, None) => state.engine.region().centroid(),
        _ => {
            return Err(ApiError::BadRequest(
                "lat and lon must be given together".to_string(),
            ))
        }
    };

    let (stored, live) = tokio::join!(
        find_within_radius(&state.db, center.lat, center.lon, query.radius_miles),
        state.alerts.fetch_active(center),
    );

    let reports: Vec<CommunityReport> = stored?.into_iter().map(Into::into).collect();
    let (alerts, alerts_available) = match live {
        Ok(alerts) => (alerts, true),
        Err(e) => {
            warn!("Alert feed unavailable, fusing reports only: {:#}", e);
            (Vec::new(), false)
        }
    };

    let fused = state.engine.fuse(&reports, &alerts);
    info!(
        "Fused view at ({:.4}, {:.4}) r={} mi: {} reports + {} alerts -> {} records",
        center.lat,
        center.lon,
        query.radius_miles,
        reports.len(),
        alerts.len(),
        fused.len()
    );

    Ok(Json(FusionResponse::new(fused, alerts_available)))
}
