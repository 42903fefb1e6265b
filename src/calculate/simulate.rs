//! Tournament field simulation.
//!
//! A hypothetical field is given as percentages per archetype. Whatever is
//! left below 100% is filled by an "Unknown" opponent, which nothing has
//! matchup data against and so plays as a coin flip.

use serde::Serialize;
use thiserror::Error;

use super::calculate_expected_winrate;
use crate::models::{top_by_games, ArchetypeRecord, MatchupMatrix, MetaShareMap};

/// Opponent name standing in for the unassigned part of the field.
pub const UNKNOWN_OPPONENT: &str = "Unknown";

/// Number of archetypes seeded into a default field.
pub const DEFAULT_FIELD_SIZE: usize = 8;

#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("Invalid share for {archetype}: {percent}")]
    InvalidShare { archetype: String, percent: f64 },
}

/// A field expressed as shares of the total (0.0 to 1.0 each).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldComposition {
    shares: MetaShareMap,
    assigned_percent: f64,
}

impl FieldComposition {
    /// Build a field from percentages (0 to 100).
    ///
    /// Repeated names are summed. Negative or non-finite percentages are
    /// rejected. Totals above 100 are kept as given and normalized later by
    /// the expected win rate calculation.
    pub fn from_percentages<I, S>(field: I) -> Result<Self, SimulationError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut shares = MetaShareMap::new();
        let mut assigned_percent = 0.0;

        for (archetype, percent) in field {
            let archetype = archetype.into();
            if !percent.is_finite() || percent < 0.0 {
                return Err(SimulationError::InvalidShare { archetype, percent });
            }
            *shares.entry(archetype).or_insert(0.0) += percent / 100.0;
            assigned_percent += percent;
        }

        let unknown_percent = (100.0 - assigned_percent).max(0.0);
        if unknown_percent > 0.0 {
            *shares.entry(UNKNOWN_OPPONENT.to_string()).or_insert(0.0) += unknown_percent / 100.0;
        }

        Ok(Self {
            shares,
            assigned_percent,
        })
    }

    /// Shares including the unknown remainder.
    pub fn shares(&self) -> &MetaShareMap {
        &self.shares
    }

    /// Percent explicitly assigned to named archetypes.
    pub fn assigned_percent(&self) -> f64 {
        self.assigned_percent
    }

    /// Percent left to the unknown opponent.
    pub fn unknown_percent(&self) -> f64 {
        (100.0 - self.assigned_percent).max(0.0)
    }

    /// More than 100% was assigned.
    pub fn over_allocated(&self) -> bool {
        self.assigned_percent > 100.0
    }
}

/// One archetype's projected result against a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedResult {
    /// 1-based
    pub rank: usize,
    pub archetype: String,
    pub expected_win_rate: f64,
}

/// Rank every archetype by expected win rate against `field`, best first.
pub fn project_field(
    matrix: &MatchupMatrix,
    archetypes: &[String],
    field: &FieldComposition,
) -> Vec<ProjectedResult> {
    let mut expected: Vec<(String, f64)> =
        calculate_expected_winrate(field.shares(), matrix, archetypes)
            .into_iter()
            .collect();

    expected.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    expected
        .into_iter()
        .enumerate()
        .map(|(i, (archetype, expected_win_rate))| ProjectedResult {
            rank: i + 1,
            archetype,
            expected_win_rate,
        })
        .collect()
}

/// The most played archetypes, used to seed a field.
pub fn default_field_seeds(records: &[ArchetypeRecord], n: usize) -> Vec<String> {
    top_by_games(records, n)
        .into_iter()
        .map(|r| r.archetype.clone())
        .collect()
}

/// Starting field: the top archetypes by games, 10% each for the first
/// three and 5% for the rest.
pub fn default_field(records: &[ArchetypeRecord]) -> FieldComposition {
    let seeds = default_field_seeds(records, DEFAULT_FIELD_SIZE);
    let field = seeds
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name, if i < 3 { 10.0 } else { 5.0 }));

    // Fixed non-negative percentages cannot fail validation
    FieldComposition::from_percentages(field).unwrap_or_else(|_| FieldComposition {
        shares: MetaShareMap::new(),
        assigned_percent: 0.0,
    })
}
