//! HTTP API handlers for floodmap-api

pub mod error;
pub mod fusion;
pub mod health;
pub mod nearby;

pub use error::ApiError;
pub use fusion::{fuse_snapshots, fused_view};
pub use health::health_routes;
pub use nearby::{nearby_reports, report_by_id};
