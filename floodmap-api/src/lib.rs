//! floodmap-api library - fused flood report service
//!
//! Serves stored reports near a point and the fused report/alert view built
//! by `floodmap_common::FusionEngine`.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use floodmap_common::FusionEngine;

pub mod alerts;
pub mod api;

use alerts::AlertSource;

/// Largest accepted request body (10 MB)
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Report database
    pub db: SqlitePool,
    /// Fusion configuration (region, thresholds, precedence)
    pub engine: Arc<FusionEngine>,
    /// Official alert feed
    pub alerts: Arc<dyn AlertSource>,
}

impl AppState {
    pub fn new(db: SqlitePool, engine: FusionEngine, alerts: Arc<dyn AlertSource>) -> Self {
        Self {
            db,
            engine: Arc::new(engine),
            alerts,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/api/reports/nearby", get(api::nearby_reports))
        .route("/api/reports/:id", get(api::report_by_id))
        .route("/api/fuse", post(api::fuse_snapshots))
        .route("/api/fused", get(api::fused_view))
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
