//! Record linkage between community reports and official alerts
//!
//! Matching is first-fit: the first unused alert (in source order) within
//! both thresholds is taken, even if a later alert is closer.

use crate::geo::{distance_km, elapsed_ms};
use crate::observation::{CommunityReport, OfficialAlert};

/// Maximum separation for a report and alert to describe the same event (200 m)
pub const MAX_MATCH_DISTANCE_KM: f64 = 0.2;

/// Maximum time between a report and alert describing the same event (1 hour)
pub const MAX_MATCH_ELAPSED_MS: u64 = 3_600_000;

/// Distance and time thresholds for a match (both inclusive)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCriteria {
    pub max_distance_km: f64,
    pub max_elapsed_ms: u64,
}

impl Default for MatchCriteria {
    fn default() -> Self {
        Self {
            max_distance_km: MAX_MATCH_DISTANCE_KM,
            max_elapsed_ms: MAX_MATCH_ELAPSED_MS,
        }
    }
}

impl MatchCriteria {
    /// True when the pair is close enough in both space and time
    ///
    /// NaN distances compare false, so malformed coordinates never match.
    pub fn is_match(&self, report: &CommunityReport, alert: &OfficialAlert) -> bool {
        elapsed_ms(report, alert) <= self.max_elapsed_ms
            && distance_km(report, alert) <= self.max_distance_km
    }
}

/// Index of the first unused alert matching `report`
///
/// `used` is parallel to `alerts`; alerts flagged `true` are skipped.
pub fn find_first_match(
    report: &CommunityReport,
    alerts: &[&OfficialAlert],
    used: &[bool],
    criteria: &MatchCriteria,
) -> Option<usize> {
    alerts
        .iter()
        .zip(used.iter())
        .position(|(alert, &taken)| !taken && criteria.is_match(report, alert))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::Severity;

    fn report(lat: f64, lon: f64, ts: i64) -> CommunityReport {
        CommunityReport {
            id: "r1".to_string(),
            latitude: lat,
            longitude: lon,
            timestamp_ms: ts,
            severity: Severity::Medium,
            description: "street flooding".to_string(),
            source: "Internal".to_string(),
            confirm_count: 0,
            deny_count: 0,
            photo_urls: vec![],
            user_id: None,
            manual_location: false,
        }
    }

    fn alert(id: &str, lat: f64, lon: f64, ts: i64) -> OfficialAlert {
        OfficialAlert {
            id: id.to_string(),
            latitude: lat,
            longitude: lon,
            timestamp_ms: ts,
            severity: Severity::High,
            description: "Flash flood warning".to_string(),
            source: "NWS".to_string(),
        }
    }

    #[test]
    fn test_match_within_both_thresholds() {
        let r = report(29.45, -98.50, 0);
        let a = alert("a1", 29.4505, -98.5005, 300_000);
        assert!(MatchCriteria::default().is_match(&r, &a));
    }

    #[test]
    fn test_no_match_when_too_far() {
        let r = report(29.45, -98.50, 0);
        // ~330 m north
        let a = alert("a1", 29.453, -98.50, 0);
        assert!(!MatchCriteria::default().is_match(&r, &a));
    }

    #[test]
    fn test_no_match_when_too_late() {
        let r = report(29.45, -98.50, 0);
        let a = alert("a1", 29.45, -98.50, 3_600_001);
        assert!(!MatchCriteria::default().is_match(&r, &a));
    }

    #[test]
    fn test_time_threshold_is_inclusive() {
        let r = report(29.45, -98.50, 3_600_000);
        let a = alert("a1", 29.45, -98.50, 0);
        assert!(MatchCriteria::default().is_match(&r, &a));
    }

    #[test]
    fn test_nan_coordinates_never_match() {
        let r = report(f64::NAN, -98.50, 0);
        let a = alert("a1", 29.45, -98.50, 0);
        assert!(!MatchCriteria::default().is_match(&r, &a));
    }

    #[test]
    fn test_first_fit_not_best_fit() {
        let r = report(29.45, -98.50, 0);
        // First candidate ~150 m away, second is exact
        let farther = alert("a1", 29.4513, -98.50, 0);
        let exact = alert("a2", 29.45, -98.50, 0);
        let alerts = vec![&farther, &exact];
        let used = vec![false, false];
        assert_eq!(find_first_match(&r, &alerts, &used, &MatchCriteria::default()), Some(0));
    }

    #[test]
    fn test_used_alerts_are_skipped() {
        let r = report(29.45, -98.50, 0);
        let a1 = alert("a1", 29.45, -98.50, 0);
        let a2 = alert("a2", 29.45, -98.50, 0);
        let alerts = vec![&a1, &a2];
        let used = vec![true, false];
        assert_eq!(find_first_match(&r, &alerts, &used, &MatchCriteria::default()), Some(1));
    }

    #[test]
    fn test_no_candidates() {
        let r = report(29.45, -98.50, 0);
        assert_eq!(find_first_match(&r, &[], &[], &MatchCriteria::default()), None);
    }
}
