//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::observation::{CommunityReport, Severity, INTERNAL_SOURCE};
use crate::time::{from_epoch_ms, to_epoch_ms};
use crate::{Error, Result};

/// A report row from the `reports` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedReport {
    pub id: String,
    pub user_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub severity: Severity,
    pub description: String,
    pub photo_urls: Vec<String>,
    pub manual_location: bool,
    pub confirm_count: u32,
    pub deny_count: u32,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// Column list matching [`PersistedReport::from_row`]
pub(crate) const REPORT_COLUMNS: &str = "guid, user_id, latitude, longitude, severity, description, \
     photo_urls, manual_location, confirm_count, deny_count, source, created_at";

impl PersistedReport {
    /// Decode a row selected with [`REPORT_COLUMNS`]
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self> {
        let severity: String = row.try_get("severity")?;
        let photo_json: String = row.try_get("photo_urls")?;
        let photo_urls: Vec<String> = serde_json::from_str(&photo_json).map_err(|e| {
            Error::Internal(format!("Malformed photo_urls for report: {}", e))
        })?;

        Ok(Self {
            id: row.try_get("guid")?,
            user_id: row.try_get("user_id")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            severity: severity.parse()?,
            description: row.try_get("description")?,
            photo_urls,
            manual_location: row.try_get::<i64, _>("manual_location")? != 0,
            confirm_count: row.try_get::<i64, _>("confirm_count")?.max(0) as u32,
            deny_count: row.try_get::<i64, _>("deny_count")?.max(0) as u32,
            source: row.try_get("source")?,
            created_at: from_epoch_ms(row.try_get("created_at")?),
        })
    }

    /// Creation time as epoch milliseconds
    pub fn created_at_ms(&self) -> i64 {
        to_epoch_ms(&self.created_at)
    }
}

impl From<PersistedReport> for CommunityReport {
    fn from(row: PersistedReport) -> Self {
        let timestamp_ms = row.created_at_ms();
        CommunityReport {
            id: row.id,
            latitude: row.latitude,
            longitude: row.longitude,
            timestamp_ms,
            severity: row.severity,
            description: row.description,
            source: row.source,
            confirm_count: row.confirm_count,
            deny_count: row.deny_count,
            photo_urls: row.photo_urls,
            user_id: row.user_id,
            manual_location: row.manual_location,
        }
    }
}

/// Insertion payload for a new report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReport {
    pub user_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    #[serde(default)]
    pub manual_location: bool,
    #[serde(default = "default_source")]
    pub source: String,
    /// Defaults to the insertion time when absent
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_source() -> String {
    INTERNAL_SOURCE.to_string()
}

impl NewReport {
    /// Minimal community report at a position
    pub fn new(latitude: f64, longitude: f64, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            user_id: None,
            latitude,
            longitude,
            severity,
            description: description.into(),
            photo_urls: Vec::new(),
            manual_location: false,
            source: default_source(),
            created_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_report_converts_to_community_report() {
        let created_at = from_epoch_ms(1_700_000_000_000);
        let row = PersistedReport {
            id: "guid-1".to_string(),
            user_id: Some("user-1".to_string()),
            latitude: 29.45,
            longitude: -98.5,
            severity: Severity::Extreme,
            description: "Creek out of banks".to_string(),
            photo_urls: vec!["a.jpg".to_string()],
            manual_location: true,
            confirm_count: 3,
            deny_count: 0,
            source: "Internal".to_string(),
            created_at,
        };

        let report: CommunityReport = row.into();
        assert_eq!(report.id, "guid-1");
        assert_eq!(report.timestamp_ms, 1_700_000_000_000);
        assert_eq!(report.severity, Severity::Extreme);
        assert_eq!(report.confirm_count, 3);
        assert!(report.manual_location);
    }

    #[test]
    fn test_new_report_defaults() {
        let report = NewReport::new(29.45, -98.5, Severity::Low, "Ponding");
        assert_eq!(report.source, "Internal");
        assert!(report.created_at.is_none());
        assert!(report.photo_urls.is_empty());
    }
}
