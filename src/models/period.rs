//! Time windows and the per-window snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{find_record, matrix_archetypes, ArchetypeRecord, MatchupCell, MatchupMatrix, TierMap};

/// Archetype name → estimated share of the tournament field (0.0 to 1.0).
///
/// Snapshot keys are uppercased; look entries up with [`meta_share_for`].
pub type MetaShareMap = BTreeMap<String, f64>;

/// Which provider backs a time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Flat matrix already in canonical naming
    Primary,
    /// Matrix + records in legacy naming, reconciled on load
    Secondary,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Primary => write!(f, "primary"),
            SourceKind::Secondary => write!(f, "secondary"),
        }
    }
}

/// A configured time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodDefinition {
    /// Display label, e.g. "6 Months"
    pub label: String,

    /// File key, e.g. "6_months"
    pub key: String,

    /// Data source kind
    pub source: SourceKind,
}

impl PeriodDefinition {
    pub fn new(label: impl Into<String>, key: impl Into<String>, source: SourceKind) -> Self {
        Self {
            label: label.into(),
            key: key.into(),
            source,
        }
    }
}

/// The default period registry, longest window first.
pub fn default_periods() -> Vec<PeriodDefinition> {
    vec![
        PeriodDefinition::new("All Time", "all_time", SourceKind::Secondary),
        PeriodDefinition::new("2 Years", "2_years", SourceKind::Secondary),
        PeriodDefinition::new("1 Year", "1_year", SourceKind::Secondary),
        PeriodDefinition::new("6 Months", "6_months", SourceKind::Secondary),
        PeriodDefinition::new("2 Months", "2_months", SourceKind::Primary),
        PeriodDefinition::new("1 Month", "1_month", SourceKind::Primary),
    ]
}

/// Look up a meta share. The query is case-folded to match the uppercased keys.
pub fn meta_share_for(shares: &MetaShareMap, archetype: &str) -> Option<f64> {
    shares.get(&archetype.to_uppercase()).copied()
}

/// Uppercase every key. Keys that differ only by case are summed.
pub fn uppercase_keys(shares: MetaShareMap) -> MetaShareMap {
    let mut upper = MetaShareMap::new();
    for (name, share) in shares {
        *upper.entry(name.to_uppercase()).or_insert(0.0) += share;
    }
    upper
}

/// Everything loaded for one time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeWindowSnapshot {
    /// Period key
    pub period: String,

    /// Period display label
    pub label: String,

    /// Source kind the window was loaded from
    pub source: SourceKind,

    /// Sorted archetype names; covers every matrix key
    pub archetypes: Vec<String>,

    /// Matchup matrix
    pub matrix: MatchupMatrix,

    /// Meta shares, uppercase keys
    pub meta_shares: MetaShareMap,

    /// Tier labels
    pub tiers: TierMap,

    /// Per-archetype rollups
    pub records: Vec<ArchetypeRecord>,

    /// When the snapshot was built
    pub loaded_at: DateTime<Utc>,
}

impl TimeWindowSnapshot {
    /// Assemble a snapshot. The archetype list is extended with every name
    /// the matrix mentions, then sorted and deduplicated.
    pub fn new(
        period: &PeriodDefinition,
        archetypes: Vec<String>,
        matrix: MatchupMatrix,
        meta_shares: MetaShareMap,
        tiers: TierMap,
        records: Vec<ArchetypeRecord>,
    ) -> Self {
        let mut archetypes = archetypes;
        archetypes.extend(matrix_archetypes(&matrix));
        archetypes.sort();
        archetypes.dedup();

        Self {
            period: period.key.clone(),
            label: period.label.clone(),
            source: period.source,
            archetypes,
            matrix,
            meta_shares,
            tiers,
            records,
            loaded_at: Utc::now(),
        }
    }

    /// Get an archetype's rollup.
    pub fn record(&self, archetype: &str) -> Option<&ArchetypeRecord> {
        find_record(&self.records, archetype)
    }

    /// Get a matchup cell.
    pub fn matchup(&self, archetype: &str, opponent: &str) -> Option<&MatchupCell> {
        super::get_matchup(&self.matrix, archetype, opponent)
    }

    /// Meta share for an archetype, any casing.
    pub fn meta_share(&self, archetype: &str) -> Option<f64> {
        meta_share_for(&self.meta_shares, archetype)
    }

    /// Tier label for an archetype.
    pub fn tier(&self, archetype: &str) -> Option<&str> {
        self.tiers.get(archetype).map(String::as_str)
    }

    /// Total games across all records.
    pub fn total_games(&self) -> u32 {
        self.records.iter().map(|r| r.total_matches).sum()
    }
}
