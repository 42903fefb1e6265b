//! Matchup cells and the archetype-by-archetype matrix.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calculate::win_rate_from_totals;

/// Opponent name → cell, for one archetype.
pub type MatchupRow = BTreeMap<String, MatchupCell>;

/// Archetype name → opponent name → cell.
///
/// Storage is not symmetric: `A vs B` and `B vs A` are recorded independently
/// and may disagree slightly between data sources.
pub type MatchupMatrix = BTreeMap<String, MatchupRow>;

/// Aggregated outcome of one archetype's games against one opponent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMatchupCell")]
pub struct MatchupCell {
    /// Opponent archetype this cell describes
    pub archetype: String,

    /// Wins
    pub wins: u32,

    /// Losses
    pub losses: u32,

    /// Draws
    pub draws: u32,

    /// Total games played
    pub total_matches: u32,

    /// Win rate (0.0 to 1.0), draws counted as half a win.
    /// Always 0.0 when `total_matches` is 0.
    pub win_rate: f64,
}

impl MatchupCell {
    /// Create a new MatchupCell with the win rate derived from the counts.
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

    /// Win rate, or `None` when there are no games behind it.
    pub fn rate(&self) -> Option<f64> {
        (self.total_matches > 0).then_some(self.win_rate)
    }

    /// Whether at least `min_games` games were recorded.
    pub fn has_games(&self, min_games: u32) -> bool {
        self.total_matches > 0 && self.total_matches >= min_games
    }

    /// Short "8W-12L" style record, with draws only when present.
    pub fn record_label(&self) -> String {
        if self.draws > 0 {
            format!("{}W-{}L-{}D", self.wins, self.losses, self.draws)
        } else {
            format!("{}W-{}L", self.wins, self.losses)
        }
    }
}

/// Lenient on-disk shape of a cell. Partial scrapes omit counts.
#[derive(Debug, Default, Deserialize)]
struct RawMatchupCell {
    #[serde(default)]
    archetype: Option<String>,
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

impl From<RawMatchupCell> for MatchupCell {
    fn from(raw: RawMatchupCell) -> Self {
        let wins = raw.wins.unwrap_or(0);
        let losses = raw.losses.unwrap_or(0);
        let draws = raw.draws.unwrap_or(0);
        let total_matches = raw.total_matches.unwrap_or(wins + losses + draws);
        let archetype = raw.archetype.unwrap_or_default();

        let win_rate = match raw.win_rate {
            _ if total_matches == 0 => 0.0,
            Some(rate) if (0.0..=1.0).contains(&rate) => rate,
            Some(rate) => {
                warn!(
                    "Win rate {} out of range for cell {:?}, recomputing from counts",
                    rate, archetype
                );
                win_rate_from_totals(wins, draws, total_matches)
            }
            None => win_rate_from_totals(wins, draws, total_matches),
        };

        Self {
            archetype,
            wins,
            losses,
            draws,
            total_matches,
            win_rate,
        }
    }
}

/// Look up the cell for `archetype` vs `opponent`.
pub fn get_matchup<'a>(
    matrix: &'a MatchupMatrix,
    archetype: &str,
    opponent: &str,
) -> Option<&'a MatchupCell> {
    matrix.get(archetype).and_then(|row| row.get(opponent))
}

/// Every name appearing in the matrix, as a row key or as an opponent.
pub fn matrix_archetypes(matrix: &MatchupMatrix) -> Vec<String> {
    let mut names: Vec<String> = matrix
        .iter()
        .flat_map(|(arch, row)| std::iter::once(arch).chain(row.keys()))
        .cloned()
        .collect();
    names.sort();
    names.dedup();
    names
}
