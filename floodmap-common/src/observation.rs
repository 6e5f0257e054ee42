//! Geolocated observation types shared by both report sources
//!
//! Community reports and official alerts enter fusion as immutable
//! snapshots; fusion produces fresh [`UnifiedReport`] values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Source tag carried by community-submitted reports
pub const INTERNAL_SOURCE: &str = "Internal";

/// Source tag carried by National Weather Service alerts
pub const NWS_SOURCE: &str = "NWS";

/// Flood severity classification
///
/// `Extreme` only appears in the persisted report model and in official
/// feeds that use it; live community submissions use the first three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Extreme,
}

impl Severity {
    /// Lowercase name as stored in the database and sent over the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Extreme => "extreme",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "extreme" => Ok(Severity::Extreme),
            other => Err(Error::InvalidInput(format!("Unknown severity: {}", other))),
        }
    }
}

/// A value with a WGS84 position and an epoch-millisecond timestamp
pub trait Geolocated {
    fn latitude(&self) -> f64;
    fn longitude(&self) -> f64;
    fn timestamp_ms(&self) -> i64;
}

/// A flood report submitted by a community member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityReport {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_ms: i64,
    pub severity: Severity,
    pub description: String,
    #[serde(default = "default_report_source")]
    pub source: String,

    /// Owned by the verification subsystem; fusion only reads these
    #[serde(default)]
    pub confirm_count: u32,
    #[serde(default)]
    pub deny_count: u32,

    #[serde(default)]
    pub photo_urls: Vec<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    /// True when the submitter placed the pin by hand instead of using GPS
    #[serde(default)]
    pub manual_location: bool,
}

fn default_report_source() -> String {
    INTERNAL_SOURCE.to_string()
}

/// An alert fetched from an official weather-alert feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficialAlert {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_ms: i64,
    pub severity: Severity,
    pub description: String,
    #[serde(default = "default_alert_source")]
    pub source: String,
}

fn default_alert_source() -> String {
    NWS_SOURCE.to_string()
}

/// Output record of a fusion run
///
/// Either a merge of one report with one alert, or a single observation
/// passed through in the unified shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedReport {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_ms: i64,
    pub severity: Severity,
    pub description: String,
    pub sources: Vec<String>,
}

impl UnifiedReport {
    /// True when this record combines more than one source
    pub fn is_merged(&self) -> bool {
        self.sources.len() > 1
    }
}

macro_rules! impl_geolocated {
    ($($ty:ty),+) => {
        $(
            impl Geolocated for $ty {
                fn latitude(&self) -> f64 {
                    self.latitude
                }

                fn longitude(&self) -> f64 {
                    self.longitude
                }

                fn timestamp_ms(&self) -> i64 {
                    self.timestamp_ms
                }
            }
        )+
    };
}

impl_geolocated!(CommunityReport, OfficialAlert, UnifiedReport);
