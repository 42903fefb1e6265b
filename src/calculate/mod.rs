//! Statistics calculation engine.
//!
//! Pure functions over matchup data:
//! - Win rates and Wilson score intervals
//! - Polarity (spread of a deck's matchup win rates)
//! - Expected win rate against a hypothetical field
//!
//! Submodules build on these: alias reconciliation, cross-period
//! comparison, matchup profiles and field simulation.

pub mod compare;
pub mod profile;
pub mod reconcile;
pub mod simulate;

use std::collections::BTreeMap;

use statrs::distribution::{ContinuousCDF, Normal};
use tracing::warn;

use crate::models::{MatchupCell, MatchupMatrix, MatchupRow, MetaShareMap};

/// Confidence level used when none is configured.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Matchups with fewer games are left out of polarity entirely.
pub const POLARITY_MIN_GAMES: u32 = 5;

/// Win rate assumed for a matchup with no data.
pub const UNKNOWN_MATCHUP_WIN_RATE: f64 = 0.5;

/// Win rate from a total, draws counted as half a win. 0 when there are no games.
pub fn win_rate_from_totals(wins: u32, draws: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        (wins as f64 + 0.5 * draws as f64) / total as f64
    }
}

/// Calculate win rate from wins/losses/draws.
pub fn calculate_win_rate(wins: u32, losses: u32, draws: u32) -> f64 {
    win_rate_from_totals(wins, draws, wins + losses + draws)
}

/// Two-tailed standard normal quantile for a confidence level
/// (0.95 → ≈1.96). Levels outside (0, 1) are clamped into it.
pub fn z_score(confidence: f64) -> f64 {
    let confidence = if confidence.is_nan() {
        DEFAULT_CONFIDENCE
    } else {
        confidence.clamp(1e-12, 1.0 - 1e-12)
    };
    let p = 1.0 - (1.0 - confidence) / 2.0;

    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.inverse_cdf(p),
        Err(e) => {
            warn!("Standard normal unavailable ({}), using z = 1.96", e);
            1.96
        }
    }
}

/// Wilson score interval for `wins` out of `total`.
///
/// Returns `(0.0, 0.0)` when `total` is 0. That means "no data", not a
/// certain 0%. `wins` above `total` is capped at `total`.
pub fn wilson_score_interval(wins: u32, total: u32, confidence: f64) -> (f64, f64) {
    if total == 0 {
        return (0.0, 0.0);
    }
    wilson_bounds(wins.min(total) as f64 / total as f64, total, confidence)
}

/// Wilson interval around the draws-as-half-a-win rate, so that it always
/// contains [`calculate_win_rate`]. Same as [`wilson_score_interval`]
/// without draws.
pub fn wilson_score_interval_with_draws(
    wins: u32,
    draws: u32,
    total: u32,
    confidence: f64,
) -> (f64, f64) {
    if total == 0 {
        return (0.0, 0.0);
    }
    let p = win_rate_from_totals(wins, draws, total).min(1.0);
    wilson_bounds(p, total, confidence)
}

fn wilson_bounds(p: f64, total: u32, confidence: f64) -> (f64, f64) {
    let n = total as f64;
    let z = z_score(confidence);
    let z2 = z * z;

    let denom = 1.0 + z2 / n;
    let center = p + z2 / (2.0 * n);
    let half_width = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();

    let lower = ((center - half_width) / denom).clamp(0.0, p);
    let upper = ((center + half_width) / denom).clamp(p, 1.0);

    (lower, upper)
}

/// Polarity of an archetype with the default reliability floor.
///
/// See [`calculate_polarity_with_floor`].
pub fn calculate_polarity(archetype: &str, matrix: &MatchupMatrix, all_archetypes: &[String]) -> f64 {
    calculate_polarity_with_floor(archetype, matrix, all_archetypes, POLARITY_MIN_GAMES)
}

/// Population standard deviation of an archetype's win rates against every
/// other archetype with at least `min_games` games.
///
/// Returns 0 when no matchup qualifies. That is "no evidence", not "perfectly
/// consistent"; use [`reliable_opponents`] to tell the two apart.
pub fn calculate_polarity_with_floor(
    archetype: &str,
    matrix: &MatchupMatrix,
    all_archetypes: &[String],
    min_games: u32,
) -> f64 {
    let Some(row) = matrix.get(archetype) else {
        return 0.0;
    };

    let rates: Vec<f64> = qualifying_cells(archetype, row, all_archetypes, min_games)
        .map(|cell| cell.win_rate)
        .collect();

    std_dev_or_zero(&rates)
}

/// Number of opponents that count towards polarity.
pub fn reliable_opponents(
    archetype: &str,
    matrix: &MatchupMatrix,
    all_archetypes: &[String],
    min_games: u32,
) -> usize {
    matrix
        .get(archetype)
        .map(|row| qualifying_cells(archetype, row, all_archetypes, min_games).count())
        .unwrap_or(0)
}

fn qualifying_cells<'a>(
    archetype: &'a str,
    row: &'a MatchupRow,
    all_archetypes: &'a [String],
    min_games: u32,
) -> impl Iterator<Item = &'a MatchupCell> + 'a {
    all_archetypes
        .iter()
        .filter(move |other| other.as_str() != archetype)
        .filter_map(move |other| row.get(other))
        .filter(move |cell| cell.has_games(min_games))
}

/// Population standard deviation; 0 for no values.
fn std_dev_or_zero(values: &[f64]) -> f64 {
    use statrs::statistics::Statistics;

    if values.is_empty() {
        return 0.0;
    }
    values.iter().population_std_dev()
}

/// Expected win rate of each archetype against a field.
///
/// `meta_shares` need not sum to 1; non-positive shares are skipped. A
/// matchup with no games counts as [`UNKNOWN_MATCHUP_WIN_RATE`]. The
/// weighted sum is divided by the shares actually used. Opponent names are
/// matched case-insensitively, since snapshot meta-share keys are uppercase.
///
/// An archetype with no usable share is left out of the result.
pub fn calculate_expected_winrate(
    meta_shares: &MetaShareMap,
    matrix: &MatchupMatrix,
    all_archetypes: &[String],
) -> BTreeMap<String, f64> {
    let mut results = BTreeMap::new();

    for target in all_archetypes {
        let row = matrix.get(target);
        let mut expected = 0.0;
        let mut total_share = 0.0;

        for (opponent, &share) in meta_shares.iter().filter(|(_, share)| **share > 0.0) {
            let win_rate = row
                .and_then(|r| find_opponent(r, opponent))
                .and_then(MatchupCell::rate)
                .unwrap_or(UNKNOWN_MATCHUP_WIN_RATE);

            expected += win_rate * share;
            total_share += share;
        }

        if total_share > 0.0 {
            results.insert(target.clone(), expected / total_share);
        }
    }

    results
}

fn find_opponent<'a>(row: &'a MatchupRow, opponent: &str) -> Option<&'a MatchupCell> {
    row.get(opponent).or_else(|| {
        let folded = opponent.to_uppercase();
        row.iter()
            .find(|(name, _)| name.to_uppercase() == folded)
            .map(|(_, cell)| cell)
    })
}
