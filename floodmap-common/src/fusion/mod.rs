//! Flood-report fusion
//!
//! Pipeline: region filter → first-fit linkage → merge or pass-through.
//!
//! ```text
//! reports ─┐                     ┌─ merged / unmatched reports (report order)
//!          ├─ filter ─ match ─ merge ─┤
//! alerts ──┘                     └─ unmatched alerts (alert order)
//! ```
//!
//! A [`FusionEngine`] holds only immutable configuration. Each `fuse` call
//! keeps its own used-alert flags, so calls are independent and may run
//! concurrently.

pub mod matcher;
pub mod precedence;
pub mod synthesizer;

use tracing::debug;

use crate::geo::ServiceRegion;
use crate::observation::{CommunityReport, OfficialAlert, UnifiedReport};

pub use matcher::{find_first_match, MatchCriteria, MAX_MATCH_DISTANCE_KM, MAX_MATCH_ELAPSED_MS};
pub use precedence::SourcePrecedence;
pub use synthesizer::merge;

/// Combines community reports and official alerts into unified records
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    region: ServiceRegion,
    criteria: MatchCriteria,
    precedence: SourcePrecedence,
}

impl FusionEngine {
    /// Engine with the default match thresholds and precedence table
    pub fn new(region: ServiceRegion) -> Self {
        Self {
            region,
            criteria: MatchCriteria::default(),
            precedence: SourcePrecedence::default(),
        }
    }

    pub fn with_criteria(mut self, criteria: MatchCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn with_precedence(mut self, precedence: SourcePrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn region(&self) -> &ServiceRegion {
        &self.region
    }

    /// Fuse two snapshots into a deduplicated, region-scoped list
    ///
    /// Records outside the service region are dropped. Output holds merged or
    /// pass-through reports in report order, followed by alerts that were
    /// never matched, in alert order. Empty input yields empty output.
    pub fn fuse(&self, reports: &[CommunityReport], alerts: &[OfficialAlert]) -> Vec<UnifiedReport> {
        let in_region_reports: Vec<&CommunityReport> = reports
            .iter()
            .filter(|r| self.region.contains(r.latitude, r.longitude))
            .collect();
        let in_region_alerts: Vec<&OfficialAlert> = alerts
            .iter()
            .filter(|a| self.region.contains(a.latitude, a.longitude))
            .collect();

        let mut used = vec![false; in_region_alerts.len()];
        let mut fused = Vec::with_capacity(in_region_reports.len() + in_region_alerts.len());
        let mut merged_count = 0usize;

        for report in &in_region_reports {
            let unified_report = UnifiedReport::from_report(report);

            match find_first_match(report, &in_region_alerts, &used, &self.criteria) {
                Some(idx) => {
                    used[idx] = true;
                    merged_count += 1;
                    let unified_alert = UnifiedReport::from_alert(in_region_alerts[idx]);
                    fused.push(merge(&unified_report, &unified_alert, &self.precedence));
                }
                None => fused.push(unified_report),
            }
        }

        fused.extend(
            in_region_alerts
                .iter()
                .enumerate()
                .filter(|(idx, _)| !used[*idx])
                .map(|(_, alert)| UnifiedReport::from_alert(alert)),
        );

        debug!(
            "Fusion complete: {} reports ({} outside region), {} alerts ({} outside region), {} merged, {} output records",
            reports.len(),
            reports.len() - in_region_reports.len(),
            alerts.len(),
            alerts.len() - in_region_alerts.len(),
            merged_count,
            fused.len()
        );

        fused
    }
}
