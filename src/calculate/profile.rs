//! Per-archetype matchup profiles and matrix views.

use serde::{Deserialize, Serialize};

use super::{
    calculate_polarity_with_floor, reliable_opponents, wilson_score_interval_with_draws, DEFAULT_CONFIDENCE,
    POLARITY_MIN_GAMES, UNKNOWN_MATCHUP_WIN_RATE,
};
use crate::models::{MatchupCell, MatchupMatrix, SampleQuality, SampleThresholds, TimeWindowSnapshot};

/// Upper bound of the unfavoured bracket.
pub const UNFAVOURED_MAX: f64 = 0.45;

/// Upper bound of the even bracket.
pub const EVEN_MAX: f64 = 0.55;

/// Coarse matchup category by win rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchupBracket {
    Unfavoured,
    Even,
    Favoured,
}

impl MatchupBracket {
    pub fn from_win_rate(win_rate: f64) -> Self {
        if win_rate <= UNFAVOURED_MAX {
            MatchupBracket::Unfavoured
        } else if win_rate <= EVEN_MAX {
            MatchupBracket::Even
        } else {
            MatchupBracket::Favoured
        }
    }
}

/// Number of opponents in each bracket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BracketCounts {
    pub unfavoured: usize,
    pub even: usize,
    pub favoured: usize,
}

impl BracketCounts {
    fn add(&mut self, bracket: MatchupBracket) {
        match bracket {
            MatchupBracket::Unfavoured => self.unfavoured += 1,
            MatchupBracket::Even => self.even += 1,
            MatchupBracket::Favoured => self.favoured += 1,
        }
    }
}

/// One opponent in a profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupLine {
    pub opponent: String,
    pub win_rate: f64,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub games: u32,
    /// e.g. "8W-12L"
    pub record: String,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub sample: SampleQuality,
    pub bracket: MatchupBracket,
}

impl MatchupLine {
    fn from_cell(opponent: &str, cell: &MatchupCell, settings: &ProfileSettings) -> Self {
        let (ci_lower, ci_upper) = wilson_score_interval_with_draws(
            cell.wins,
            cell.draws,
            cell.total_matches,
            settings.confidence,
        );

        Self {
            opponent: opponent.to_string(),
            win_rate: cell.win_rate,
            wins: cell.wins,
            losses: cell.losses,
            draws: cell.draws,
            games: cell.total_matches,
            record: cell.record_label(),
            ci_lower,
            ci_upper,
            sample: SampleQuality::from_games(cell.total_matches, &settings.thresholds),
            bracket: MatchupBracket::from_win_rate(cell.win_rate),
        }
    }
}

/// Knobs for building a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSettings {
    pub polarity_min_games: u32,
    pub thresholds: SampleThresholds,
    pub confidence: f64,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            polarity_min_games: POLARITY_MIN_GAMES,
            thresholds: SampleThresholds::default(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

/// Everything known about one archetype in one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupProfile {
    pub archetype: String,
    pub period: String,
    /// Overall win rate from the archetype's record, if it has games
    pub win_rate: Option<f64>,
    pub games: u32,
    pub tier: Option<String>,
    pub meta_share: Option<f64>,
    /// Opponents with at least one game, best first
    pub matchups: Vec<MatchupLine>,
    pub best: Option<MatchupLine>,
    pub worst: Option<MatchupLine>,
    pub polarity: f64,
    /// Opponents counted towards polarity
    pub reliable_opponents: usize,
    pub brackets: BracketCounts,
}

/// Build the matchup profile of `archetype`.
///
/// The name is matched exactly first, then case-insensitively, and the
/// profile is built under the snapshot's spelling. Returns `None` when the
/// snapshot does not know the archetype.
pub fn matchup_profile(
    snapshot: &TimeWindowSnapshot,
    archetype: &str,
    settings: &ProfileSettings,
) -> Option<MatchupProfile> {
    let name = resolve_archetype(snapshot, archetype)?;
    let archetype = name.as_str();
    let record = snapshot.record(archetype);

    let mut matchups: Vec<MatchupLine> = match snapshot.matrix.get(archetype) {
        Some(row) => snapshot
            .archetypes
            .iter()
            .filter(|other| other.as_str() != archetype)
            .filter_map(|other| row.get(other).map(|cell| (other, cell)))
            .filter(|(_, cell)| cell.total_matches > 0)
            .map(|(other, cell)| MatchupLine::from_cell(other, cell, settings))
            .collect(),
        None => Vec::new(),
    };

    matchups.sort_by(|a, b| {
        b.win_rate
            .total_cmp(&a.win_rate)
            .then_with(|| a.opponent.cmp(&b.opponent))
    });

    let mut brackets = BracketCounts::default();
    for line in &matchups {
        brackets.add(line.bracket);
    }

    Some(MatchupProfile {
        archetype: archetype.to_string(),
        period: snapshot.period.clone(),
        win_rate: record.and_then(|r| r.rate()),
        games: record.map(|r| r.total_matches).unwrap_or(0),
        tier: snapshot.tier(archetype).map(str::to_string),
        meta_share: snapshot.meta_share(archetype),
        best: matchups.first().cloned(),
        worst: matchups.last().cloned(),
        polarity: calculate_polarity_with_floor(
            archetype,
            &snapshot.matrix,
            &snapshot.archetypes,
            settings.polarity_min_games,
        ),
        reliable_opponents: reliable_opponents(
            archetype,
            &snapshot.matrix,
            &snapshot.archetypes,
            settings.polarity_min_games,
        ),
        matchups,
        brackets,
    })
}

fn resolve_archetype(snapshot: &TimeWindowSnapshot, query: &str) -> Option<String> {
    let archetypes = &snapshot.archetypes;
    archetypes
        .iter()
        .find(|a| a.as_str() == query)
        .or_else(|| archetypes.iter().find(|a| a.eq_ignore_ascii_case(query)))
        .cloned()
        .or_else(|| snapshot.record(query).map(|r| r.archetype.clone()))
}

/// Row/column order of a matrix view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixSort {
    /// By name
    #[default]
    Alphabet,
    /// Mean win rate within the selection, best first
    WinRate,
}

/// A square slice of the matchup matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixView {
    /// Row and column labels
    pub archetypes: Vec<String>,
    /// `win_rates[i][j]`: row archetype i against column archetype j;
    /// `None` below the game threshold
    pub win_rates: Vec<Vec<Option<f64>>>,
    pub games: Vec<Vec<u32>>,
}

/// Build a matrix view over `selected`.
///
/// Cells with fewer than `min_games` games, or none at all, are gaps. When
/// sorting by win rate, a gap counts as an even matchup.
pub fn matrix_view(
    matrix: &MatchupMatrix,
    selected: &[String],
    min_games: u32,
    sort: MatrixSort,
) -> MatrixView {
    let cell = |a: &str, b: &str| matrix.get(a).and_then(|row| row.get(b));

    let mut archetypes = selected.to_vec();
    match sort {
        MatrixSort::Alphabet => archetypes.sort(),
        MatrixSort::WinRate => {
            let mean = |a: &str| {
                let sum: f64 = selected
                    .iter()
                    .map(|b| {
                        cell(a, b)
                            .and_then(MatchupCell::rate)
                            .unwrap_or(UNKNOWN_MATCHUP_WIN_RATE)
                    })
                    .sum();
                sum / selected.len() as f64
            };
            archetypes.sort_by(|a, b| mean(b).total_cmp(&mean(a)).then_with(|| a.cmp(b)));
        }
    }

    let win_rates = archetypes
        .iter()
        .map(|a| {
            archetypes
                .iter()
                .map(|b| {
                    cell(a, b)
                        .filter(|c| c.has_games(min_games))
                        .and_then(MatchupCell::rate)
                })
                .collect()
        })
        .collect();

    let games = archetypes
        .iter()
        .map(|a| {
            archetypes
                .iter()
                .map(|b| cell(a, b).map(|c| c.total_matches).unwrap_or(0))
                .collect()
        })
        .collect();

    MatrixView {
        archetypes,
        win_rates,
        games,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArchetypeRecord, MetaShareMap, PeriodDefinition, SourceKind, TierMap};
    use pretty_assertions::assert_eq;

    fn snapshot() -> TimeWindowSnapshot {
        let mut matrix = MatchupMatrix::new();
        let oath = matrix.entry("Oath".to_string()).or_default();
        oath.insert("Burn".to_string(), MatchupCell::new("Burn", 8, 12, 0));
        oath.insert("Goblins".to_string(), MatchupCell::new("Goblins", 30, 20, 0));
        oath.insert("Elves".to_string(), MatchupCell::new("Elves", 5, 5, 0));
        oath.insert("Stasis".to_string(), MatchupCell::new("Stasis", 0, 0, 0));
        oath.insert("Oath".to_string(), MatchupCell::new("Oath", 3, 3, 0));
        matrix
            .entry("Burn".to_string())
            .or_default()
            .insert("Oath".to_string(), MatchupCell::new("Oath", 12, 8, 0));

        TimeWindowSnapshot::new(
            &PeriodDefinition::new("6 Months", "6_months", SourceKind::Secondary),
            vec![],
            matrix,
            MetaShareMap::from([("OATH".to_string(), 0.04)]),
            TierMap::from([("Oath".to_string(), "Tier 2".to_string())]),
            vec![ArchetypeRecord::new("Oath", 43, 37, 0)],
        )
    }

    #[test]
    fn test_bracket_boundaries() {
        assert_eq!(MatchupBracket::from_win_rate(0.45), MatchupBracket::Unfavoured);
        assert_eq!(MatchupBracket::from_win_rate(0.46), MatchupBracket::Even);
        assert_eq!(MatchupBracket::from_win_rate(0.55), MatchupBracket::Even);
        assert_eq!(MatchupBracket::from_win_rate(0.56), MatchupBracket::Favoured);
    }

    #[test]
    fn test_matchup_profile() {
        let profile = matchup_profile(&snapshot(), "Oath", &ProfileSettings::default()).unwrap();

        // Mirror and zero-game opponents are left out
        let opponents: Vec<&str> = profile.matchups.iter().map(|m| m.opponent.as_str()).collect();
        assert_eq!(opponents, vec!["Goblins", "Elves", "Burn"]);

        assert_eq!(profile.best.as_ref().unwrap().opponent, "Goblins");
        assert_eq!(profile.worst.as_ref().unwrap().opponent, "Burn");
        assert_eq!(profile.worst.as_ref().unwrap().record, "8W-12L");
        assert_eq!(profile.games, 80);
        assert_eq!(profile.tier.as_deref(), Some("Tier 2"));
        assert_eq!(profile.meta_share, Some(0.04));

        assert_eq!(
            profile.brackets,
            BracketCounts {
                unfavoured: 1,
                even: 1,
                favoured: 1
            }
        );
        assert_eq!(profile.reliable_opponents, 3);
        assert!(profile.polarity > 0.0);

        let goblins = &profile.matchups[0];
        assert_eq!(goblins.sample, SampleQuality::High);
        assert!(goblins.ci_lower <= goblins.win_rate && goblins.win_rate <= goblins.ci_upper);
        assert_eq!(profile.matchups[1].sample, SampleQuality::Low);
    }

    #[test]
    fn test_matchup_profile_unknown_archetype() {
        assert!(matchup_profile(&snapshot(), "Stiflenought", &ProfileSettings::default()).is_none());
    }

    #[test]
    fn test_matchup_profile_case_insensitive_name() {
        let exact = matchup_profile(&snapshot(), "Oath", &ProfileSettings::default()).unwrap();
        let lower = matchup_profile(&snapshot(), "oath", &ProfileSettings::default()).unwrap();

        assert_eq!(lower.archetype, "Oath");
        assert_eq!(lower.matchups.len(), 3);
        assert_eq!(lower.tier.as_deref(), Some("Tier 2"));
        assert_eq!(lower, exact);
    }

    #[test]
    fn test_matchup_line_interval_with_draws() {
        let cell = MatchupCell::new("Stasis", 0, 0, 10);
        let line = MatchupLine::from_cell("Stasis", &cell, &ProfileSettings::default());

        assert_eq!(line.win_rate, 0.5);
        assert!(line.ci_lower < 0.5 && line.ci_lower > 0.0);
        assert!(line.ci_upper > 0.5);
        assert_eq!(line.record, "0W-0L-10D");
    }

    #[test]
    fn test_matchup_profile_without_row() {
        let profile = matchup_profile(&snapshot(), "Goblins", &ProfileSettings::default()).unwrap();
        assert!(profile.matchups.is_empty());
        assert!(profile.best.is_none());
        assert_eq!(profile.polarity, 0.0);
        assert_eq!(profile.reliable_opponents, 0);
        assert_eq!(profile.win_rate, None);
    }

    #[test]
    fn test_matrix_view_gaps() {
        let snapshot = snapshot();
        let selected = vec!["Oath".to_string(), "Burn".to_string(), "Elves".to_string()];
        let view = matrix_view(&snapshot.matrix, &selected, 15, MatrixSort::Alphabet);

        assert_eq!(view.archetypes, vec!["Burn", "Elves", "Oath"]);
        // Burn vs Oath: 20 games
        assert_eq!(view.win_rates[0][2], Some(0.6));
        // Oath vs Elves: 10 games, below the threshold
        assert_eq!(view.win_rates[2][1], None);
        assert_eq!(view.games[2][1], 10);
        // Elves has no row at all
        assert_eq!(view.win_rates[1], vec![None, None, None]);
    }

    #[test]
    fn test_matrix_view_sorted_by_win_rate() {
        let snapshot = snapshot();
        let selected = vec!["Goblins".to_string(), "Oath".to_string()];
        let view = matrix_view(&snapshot.matrix, &selected, 0, MatrixSort::WinRate);

        // Oath: mirror 0.5 and 0.6 vs Goblins; Goblins has no data, so 0.5
        assert_eq!(view.archetypes, vec!["Oath", "Goblins"]);
        assert_eq!(view.win_rates[0][1], Some(0.6));
        assert_eq!(view.win_rates[1][0], None);
    }
}
