//! Per-archetype rollups.

use serde::{Deserialize, Serialize};

use super::MatchupRow;
use crate::calculate::win_rate_from_totals;

/// An archetype's totals across all opponents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawArchetypeRecord")]
pub struct ArchetypeRecord {
    /// Archetype name
    pub archetype: String,

    /// Wins
    pub wins: u32,

    /// Losses
    pub losses: u32,

    /// Draws
    pub draws: u32,

    /// Total games played
    pub total_matches: u32,

    /// Win rate (0.0 to 1.0)
    pub win_rate: f64,
}

impl ArchetypeRecord {
    /// Create a new ArchetypeRecord with calculated fields.
    pub fn new(archetype: impl Into<String>, wins: u32, losses: u32, draws: u32) -> Self {
        let total_matches = wins + losses + draws;
        Self {
            archetype: archetype.into(),
            wins,
            losses,
            draws,
            total_matches,
            win_rate: win_rate_from_totals(wins, draws, total_matches),
        }
    }

    /// Sum a matrix row into a rollup.
    pub fn from_row(archetype: impl Into<String>, row: &MatchupRow) -> Self {
        let (wins, losses, draws, total_matches) =
            row.values().fold((0, 0, 0, 0), |(w, l, d, t), cell| {
                (
                    w + cell.wins,
                    l + cell.losses,
                    d + cell.draws,
                    t + cell.total_matches,
                )
            });

        Self {
            archetype: archetype.into(),
            wins,
            losses,
            draws,
            total_matches,
            win_rate: win_rate_from_totals(wins, draws, total_matches),
        }
    }

    /// Win rate, or `None` when there are no games behind it.
    pub fn rate(&self) -> Option<f64> {
        (self.total_matches > 0).then_some(self.win_rate)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawArchetypeRecord {
    #[serde(default)]
    archetype: String,
    #[serde(default)]
    wins: Option<u32>,
    #[serde(default)]
    losses: Option<u32>,
    #[serde(default)]
    draws: Option<u32>,
    #[serde(default)]
    total_matches: Option<u32>,
    #[serde(default)]
    win_rate: Option<f64>,
}

impl From<RawArchetypeRecord> for ArchetypeRecord {
    fn from(raw: RawArchetypeRecord) -> Self {
        let wins = raw.wins.unwrap_or(0);
        let losses = raw.losses.unwrap_or(0);
        let draws = raw.draws.unwrap_or(0);
        let total_matches = raw.total_matches.unwrap_or(wins + losses + draws);

        let win_rate = match raw.win_rate {
            _ if total_matches == 0 => 0.0,
            Some(rate) if (0.0..=1.0).contains(&rate) => rate,
            _ => win_rate_from_totals(wins, draws, total_matches),
        };

        Self {
            archetype: raw.archetype,
            wins,
            losses,
            draws,
            total_matches,
            win_rate,
        }
    }
}

/// Find a record by name. Exact match first, then case-insensitive.
pub fn find_record<'a>(records: &'a [ArchetypeRecord], name: &str) -> Option<&'a ArchetypeRecord> {
    records
        .iter()
        .find(|r| r.archetype == name)
        .or_else(|| records.iter().find(|r| r.archetype.eq_ignore_ascii_case(name)))
}

/// Records sorted by win rate (descending), ties broken by name.
pub fn sorted_by_win_rate(records: &[ArchetypeRecord]) -> Vec<&ArchetypeRecord> {
    let mut sorted: Vec<_> = records.iter().collect();
    sorted.sort_by(|a, b| {
        b.win_rate
            .total_cmp(&a.win_rate)
            .then_with(|| a.archetype.cmp(&b.archetype))
    });
    sorted
}

/// The `n` most-played archetypes.
pub fn top_by_games(records: &[ArchetypeRecord], n: usize) -> Vec<&ArchetypeRecord> {
    let mut sorted: Vec<_> = records.iter().collect();
    sorted.sort_by(|a, b| {
        b.total_matches
            .cmp(&a.total_matches)
            .then_with(|| a.archetype.cmp(&b.archetype))
    });
    sorted.truncate(n);
    sorted
}
