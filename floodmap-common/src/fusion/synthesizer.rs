//! Construction of unified records
//!
//! Pass-through records wrap a single observation. Merged records combine a
//! report with the alert it was linked to.

use crate::fusion::precedence::SourcePrecedence;
use crate::observation::{CommunityReport, OfficialAlert, UnifiedReport};

/// Description tagged with its originating source, e.g. `[NWS] Flash flood warning`
fn tagged_description(source: &str, description: &str) -> String {
    format!("[{}] {}", source, description)
}

impl UnifiedReport {
    /// Wrap a community report without any merge arithmetic
    pub fn from_report(report: &CommunityReport) -> Self {
        Self {
            id: report.id.clone(),
            latitude: report.latitude,
            longitude: report.longitude,
            timestamp_ms: report.timestamp_ms,
            severity: report.severity,
            description: tagged_description(&report.source, &report.description),
            sources: vec![report.source.clone()],
        }
    }

    /// Wrap an official alert without any merge arithmetic
    pub fn from_alert(alert: &OfficialAlert) -> Self {
        Self {
            id: alert.id.clone(),
            latitude: alert.latitude,
            longitude: alert.longitude,
            timestamp_ms: alert.timestamp_ms,
            severity: alert.severity,
            description: tagged_description(&alert.source, &alert.description),
            sources: vec![alert.source.clone()],
        }
    }
}

/// Merge a linked report and alert into one record
///
/// Both inputs are expected in their pass-through form (descriptions already
/// tagged). The result id is `{report}_{alert}` so the same pair always
/// fuses to the same id.
pub fn merge(
    report: &UnifiedReport,
    alert: &UnifiedReport,
    precedence: &SourcePrecedence,
) -> UnifiedReport {
    let mut sources = report.sources.clone();
    for source in &alert.sources {
        if !sources.contains(source) {
            sources.push(source.clone());
        }
    }

    UnifiedReport {
        id: format!("{}_{}", report.id, alert.id),
        latitude: (report.latitude + alert.latitude) / 2.0,
        longitude: (report.longitude + alert.longitude) / 2.0,
        timestamp_ms: report.timestamp_ms.min(alert.timestamp_ms),
        severity: precedence.resolve(report, alert),
        description: format!("{}\n{}", report.description, alert.description),
        sources,
    }
}
