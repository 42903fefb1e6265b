//! Sample-size quality of a matchup.

use serde::{Deserialize, Serialize};

/// Game-count cut-offs for [`SampleQuality`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleThresholds {
    /// Games needed for an average-quality sample
    pub avg_games: u32,

    /// Games needed for a high-quality sample
    pub high_games: u32,
}

impl Default for SampleThresholds {
    fn default() -> Self {
        Self {
            avg_games: 20,
            high_games: 50,
        }
    }
}

/// How much a matchup's win rate can be trusted, by number of games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleQuality {
    /// Fewer games than the average threshold
    Low,
    /// At least the average threshold
    Avg,
    /// At least the high threshold
    High,
}

impl SampleQuality {
    /// Classify a game count.
    pub fn from_games(games: u32, thresholds: &SampleThresholds) -> Self {
        if games >= thresholds.high_games {
            SampleQuality::High
        } else if games >= thresholds.avg_games {
            SampleQuality::Avg
        } else {
            SampleQuality::Low
        }
    }

    /// Returns true if the sample is too small to read much into.
    pub fn is_low(&self) -> bool {
        matches!(self, SampleQuality::Low)
    }
}

impl std::fmt::Display for SampleQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleQuality::High => write!(f, "High"),
            SampleQuality::Avg => write!(f, "Avg"),
            SampleQuality::Low => write!(f, "Low"),
        }
    }
}
