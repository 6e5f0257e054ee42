//! # Floodmap Common Library
//!
//! Geospatial flood-report fusion shared by the Floodmap services:
//! - Observation types (community reports, official alerts, unified reports)
//! - Service-region containment and great-circle metrics
//! - Report/alert linkage and merge synthesis
//! - Report persistence and the radius query
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod fusion;
pub mod geo;
pub mod observation;
pub mod time;

pub use error::{Error, Result};
pub use fusion::FusionEngine;
pub use observation::{CommunityReport, Geolocated, OfficialAlert, Severity, UnifiedReport};
