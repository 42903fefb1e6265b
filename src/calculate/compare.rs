//! Cross-period comparison tables.
//!
//! Per-archetype records from several time windows are flattened into rows,
//! combined per (archetype, period) and pivoted into a win-rate table and a
//! game-count table with one column per period.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::TimeWindowSnapshot;
use crate::storage::{LoadError, PeriodDataLoader};

/// One archetype's result in one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRow {
    pub archetype: String,
    /// Period display label
    pub period: String,
    pub win_rate: f64,
    pub games: u32,
}

/// Flatten a snapshot's records into rows labelled with the period.
pub fn rows_from_snapshot(snapshot: &TimeWindowSnapshot) -> Vec<PeriodRow> {
    snapshot
        .records
        .iter()
        .map(|r| PeriodRow {
            archetype: r.archetype.clone(),
            period: snapshot.label.clone(),
            win_rate: r.win_rate,
            games: r.total_matches,
        })
        .collect()
}

/// Merge rows sharing an (archetype, period) with a game-weighted average.
///
/// A group with zero games gets a win rate of 0. Output is ordered by
/// archetype, then period.
pub fn combine_rows(rows: &[PeriodRow]) -> Vec<PeriodRow> {
    let mut groups: BTreeMap<(&str, &str), (f64, u32)> = BTreeMap::new();

    for row in rows {
        let (weighted, games) = groups
            .entry((row.archetype.as_str(), row.period.as_str()))
            .or_insert((0.0, 0));
        *weighted += row.win_rate * row.games as f64;
        *games += row.games;
    }

    groups
        .into_iter()
        .map(|((archetype, period), (weighted, games))| PeriodRow {
            archetype: archetype.to_string(),
            period: period.to_string(),
            win_rate: if games == 0 { 0.0 } else { weighted / games as f64 },
            games,
        })
        .collect()
}

/// Win rates and game counts by archetype and period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodComparison {
    /// Period labels in column order
    pub periods: Vec<String>,

    /// archetype → period → win rate; a missing period is a gap
    pub win_rates: BTreeMap<String, BTreeMap<String, f64>>,

    /// archetype → period → games; every period present, 0 when absent
    pub games: BTreeMap<String, BTreeMap<String, u32>>,
}

impl PeriodComparison {
    /// Combine and pivot rows. `periods` fixes the column order.
    pub fn from_rows(periods: Vec<String>, rows: &[PeriodRow]) -> Self {
        let mut win_rates: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        let mut games: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();

        for row in combine_rows(rows) {
            win_rates
                .entry(row.archetype.clone())
                .or_default()
                .insert(row.period.clone(), row.win_rate);
            games
                .entry(row.archetype)
                .or_default()
                .insert(row.period, row.games);
        }

        for counts in games.values_mut() {
            for period in &periods {
                counts.entry(period.clone()).or_insert(0);
            }
        }

        Self {
            periods,
            win_rates,
            games,
        }
    }

    /// Archetypes in the tables, sorted.
    pub fn archetypes(&self) -> impl Iterator<Item = &str> {
        self.games.keys().map(String::as_str)
    }

    pub fn win_rate(&self, archetype: &str, period: &str) -> Option<f64> {
        self.win_rates.get(archetype)?.get(period).copied()
    }

    pub fn games(&self, archetype: &str, period: &str) -> u32 {
        self.games
            .get(archetype)
            .and_then(|row| row.get(period))
            .copied()
            .unwrap_or(0)
    }

    /// Games summed over every period.
    pub fn total_games(&self, archetype: &str) -> u32 {
        self.games
            .get(archetype)
            .map(|row| row.values().sum())
            .unwrap_or(0)
    }

    /// Win rate per period in column order, `None` for gaps.
    pub fn trend(&self, archetype: &str) -> Vec<(String, Option<f64>)> {
        self.periods
            .iter()
            .map(|period| (period.clone(), self.win_rate(archetype, period)))
            .collect()
    }

    /// Keep only archetypes with at least `min_games` games across all periods.
    pub fn with_min_games(&self, min_games: u32) -> Self {
        let keep: Vec<&str> = self
            .archetypes()
            .filter(|a| self.total_games(a) >= min_games)
            .collect();

        Self {
            periods: self.periods.clone(),
            win_rates: self
                .win_rates
                .iter()
                .filter(|(a, _)| keep.contains(&a.as_str()))
                .map(|(a, row)| (a.clone(), row.clone()))
                .collect(),
            games: self
                .games
                .iter()
                .filter(|(a, _)| keep.contains(&a.as_str()))
                .map(|(a, row)| (a.clone(), row.clone()))
                .collect(),
        }
    }
}

/// Compare already-loaded snapshots, one column per snapshot.
pub fn compare_snapshots(snapshots: &[&TimeWindowSnapshot]) -> PeriodComparison {
    let periods = snapshots.iter().map(|s| s.label.clone()).collect();
    let rows: Vec<PeriodRow> = snapshots.iter().flat_map(|s| rows_from_snapshot(s)).collect();
    PeriodComparison::from_rows(periods, &rows)
}

/// Load each period and compare them.
///
/// The first period that fails to load fails the whole comparison.
pub fn compare_periods(
    loader: &PeriodDataLoader,
    keys: &[&str],
) -> Result<PeriodComparison, LoadError> {
    let snapshots = keys
        .iter()
        .map(|key| loader.load_period(key))
        .collect::<Result<Vec<_>, _>>()?;

    let refs: Vec<&TimeWindowSnapshot> = snapshots.iter().collect();
    Ok(compare_snapshots(&refs))
}
