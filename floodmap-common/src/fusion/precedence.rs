//! Severity precedence by source tag
//!
//! When a report and an alert are merged, the severity comes from whichever
//! side carries the higher-ranked source. Rank 0 means "no precedence"
//! (community sources and unknown tags); official feeds rank above that.

use std::collections::HashMap;

use crate::observation::{Severity, UnifiedReport, INTERNAL_SOURCE, NWS_SOURCE};

/// Rank assigned to official alert feeds
pub const OFFICIAL_RANK: u8 = 100;

/// Rank assigned to community sources and tags not in the table
pub const COMMUNITY_RANK: u8 = 0;

/// Rule table mapping source tag to precedence rank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePrecedence {
    ranks: HashMap<String, u8>,
}

impl SourcePrecedence {
    /// Empty table: every tag ranks as community
    pub fn empty() -> Self {
        Self {
            ranks: HashMap::new(),
        }
    }

    /// Builder-style rank assignment
    pub fn with_rank(mut self, tag: impl Into<String>, rank: u8) -> Self {
        self.ranks.insert(tag.into(), rank);
        self
    }

    /// Rank of a single source tag
    pub fn rank(&self, tag: &str) -> u8 {
        self.ranks.get(tag).copied().unwrap_or(COMMUNITY_RANK)
    }

    /// Highest rank among a record's sources
    pub fn best_rank(&self, sources: &[String]) -> u8 {
        sources
            .iter()
            .map(|s| self.rank(s))
            .max()
            .unwrap_or(COMMUNITY_RANK)
    }

    /// Severity for a merged report/alert pair
    ///
    /// The alert wins when its best source outranks community and is not
    /// below the report's best source. Otherwise the report keeps its own.
    pub fn resolve(&self, report: &UnifiedReport, alert: &UnifiedReport) -> Severity {
        let report_rank = self.best_rank(&report.sources);
        let alert_rank = self.best_rank(&alert.sources);

        if alert_rank > COMMUNITY_RANK && alert_rank >= report_rank {
            alert.severity
        } else {
            report.severity
        }
    }
}

impl Default for SourcePrecedence {
    fn default() -> Self {
        Self::empty()
            .with_rank(NWS_SOURCE, OFFICIAL_RANK)
            .with_rank(INTERNAL_SOURCE, COMMUNITY_RANK)
    }
}
