//! Report persistence
//!
//! Submission and verification live in other services; this module only
//! covers what the fusion read paths and their tests need.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::models::{NewReport, PersistedReport, REPORT_COLUMNS};
use crate::geo::HaversineTerms;
use crate::time::{from_epoch_ms, now, to_epoch_ms};
use crate::{Error, Result};

/// Insert a report, assigning a fresh UUID
pub async fn insert_report(pool: &SqlitePool, report: NewReport) -> Result<PersistedReport> {
    if !report.latitude.is_finite() || !report.longitude.is_finite() {
        return Err(Error::InvalidInput(format!(
            "Report coordinates must be finite: ({}, {})",
            report.latitude, report.longitude
        )));
    }

    let terms = HaversineTerms::new(report.latitude, report.longitude);
    let guid = Uuid::new_v4().to_string();
    let created_at = report.created_at.unwrap_or_else(now);
    let photo_json = serde_json::to_string(&report.photo_urls)
        .map_err(|e| Error::Internal(format!("Failed to encode photo_urls: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO reports (guid, user_id, latitude, longitude,
                             sin_half_lat, cos_half_lat, sin_half_lon, cos_half_lon, cos_lat,
                             severity, description, photo_urls, manual_location,
                             confirm_count, deny_count, source, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(&report.user_id)
    .bind(report.latitude)
    .bind(report.longitude)
    .bind(terms.sin_half_lat)
    .bind(terms.cos_half_lat)
    .bind(terms.sin_half_lon)
    .bind(terms.cos_half_lon)
    .bind(terms.cos_lat)
    .bind(report.severity.as_str())
    .bind(&report.description)
    .bind(&photo_json)
    .bind(report.manual_location as i64)
    .bind(&report.source)
    .bind(to_epoch_ms(&created_at))
    .execute(pool)
    .await?;

    debug!("Inserted report {} at ({}, {})", guid, report.latitude, report.longitude);

    Ok(PersistedReport {
        id: guid,
        user_id: report.user_id,
        latitude: report.latitude,
        longitude: report.longitude,
        severity: report.severity,
        description: report.description,
        photo_urls: report.photo_urls,
        manual_location: report.manual_location,
        confirm_count: 0,
        deny_count: 0,
        source: report.source,
        created_at: from_epoch_ms(to_epoch_ms(&created_at)),
    })
}

/// Load a single report by id
pub async fn get_report(pool: &SqlitePool, guid: &str) -> Result<PersistedReport> {
    let sql = format!("SELECT {} FROM reports WHERE guid = ?", REPORT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(guid)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Report {}", guid)))?;

    PersistedReport::from_row(&row)
}

/// Reports created at or after `since`, newest first
pub async fn recent_reports(
    pool: &SqlitePool,
    since: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<PersistedReport>> {
    let sql = format!(
        "SELECT {} FROM reports WHERE created_at >= ? ORDER BY created_at DESC LIMIT ?",
        REPORT_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(to_epoch_ms(&since))
        .bind(limit.max(0))
        .fetch_all(pool)
        .await?;

    rows.iter().map(PersistedReport::from_row).collect()
}
