//! Nearby report lookup

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use floodmap_common::db::{find_within_radius, get_report, PersistedReport};

use super::ApiError;
use crate::AppState;

/// Query parameters for a radius search
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lon: f64,

    /// Search radius in miles
    #[serde(default = "default_radius_miles")]
    pub radius_miles: f64,
}

pub(crate) fn default_radius_miles() -> f64 {
    1.0
}

/// Radius search response
#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    pub lat: f64,
    pub lon: f64,
    pub radius_miles: f64,
    pub total_results: usize,
    pub reports: Vec<PersistedReport>,
}

/// GET /api/reports/nearby?lat=..&lon=..&radius_miles=..
///
/// Stored reports within the radius, most recently created first.
pub async fn nearby_reports(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<NearbyResponse>, ApiError> {
    let reports = find_within_radius(&state.db, query.lat, query.lon, query.radius_miles).await?;

    Ok(Json(NearbyResponse {
        lat: query.lat,
        lon: query.lon,
        radius_miles: query.radius_miles,
        total_results: reports.len(),
        reports,
    }))
}

/// GET /api/reports/:id
///
/// A single stored report; 404 when the id is unknown.
pub async fn report_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PersistedReport>, ApiError> {
    let report = get_report(&state.db, &id).await?;
    Ok(Json(report))
}
