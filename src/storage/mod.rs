//! Filesystem access to per-period data documents.
//!
//! Each configured time window is backed by JSON documents in the data
//! directory:
//! - Primary windows: `mtgdecks_matrix_{key}.json`, optionally with
//!   `mtgdecks_records_{key}.json`
//! - Secondary windows: `archetype_matrix_{key}.json` and
//!   `win_loss_records_{key}.json`, with `mtgdecks_matrix_{key}.json` as the
//!   meta share / tier overlay

pub mod documents;
pub mod period;

pub use documents::{read_document, MatrixDocument, OverlayDocument};
pub use period::{PeriodAvailability, PeriodDataLoader};

use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

use crate::models::{PeriodDefinition, SourceKind};

const PRIMARY_MATRIX_PREFIX: &str = "mtgdecks_matrix_";
const PRIMARY_RECORDS_PREFIX: &str = "mtgdecks_records_";
const SECONDARY_MATRIX_PREFIX: &str = "archetype_matrix_";
const SECONDARY_RECORDS_PREFIX: &str = "win_loss_records_";

/// Errors raised while loading a period. Every variant names the period.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unknown period: {period}")]
    UnknownPeriod { period: String },

    #[error("Missing data file for period {period}: {}", .path.display())]
    MissingDataFile { period: String, path: PathBuf },

    #[error("Malformed data file for period {period}: {}: {source}", .path.display())]
    Malformed {
        period: String,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error reading {} for period {period}: {source}", .path.display())]
    Io {
        period: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    /// The period the failed load was for.
    pub fn period(&self) -> &str {
        match self {
            LoadError::UnknownPeriod { period }
            | LoadError::MissingDataFile { period, .. }
            | LoadError::Malformed { period, .. }
            | LoadError::Io { period, .. } => period,
        }
    }
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn primary_matrix_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{PRIMARY_MATRIX_PREFIX}{key}.json"))
    }

    pub fn primary_records_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{PRIMARY_RECORDS_PREFIX}{key}.json"))
    }

    pub fn secondary_matrix_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{SECONDARY_MATRIX_PREFIX}{key}.json"))
    }

    pub fn secondary_records_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{SECONDARY_RECORDS_PREFIX}{key}.json"))
    }

    /// Source of authoritative meta shares and tiers for a secondary window.
    pub fn overlay_path(&self, key: &str) -> PathBuf {
        self.primary_matrix_path(key)
    }

    /// Files that must exist for a period to load.
    pub fn required_files(&self, period: &PeriodDefinition) -> Vec<PathBuf> {
        match period.source {
            SourceKind::Primary => vec![self.primary_matrix_path(&period.key)],
            SourceKind::Secondary => vec![
                self.secondary_matrix_path(&period.key),
                self.secondary_records_path(&period.key),
            ],
        }
    }

    /// Required files that are not on disk.
    pub fn missing_files(&self, period: &PeriodDefinition) -> Vec<PathBuf> {
        self.required_files(period)
            .into_iter()
            .filter(|path| !path.is_file())
            .collect()
    }

    /// Period keys that have any matrix document in the data directory.
    pub fn discover_period_keys(&self) -> BTreeSet<String> {
        let base = glob::Pattern::escape(&self.data_dir.to_string_lossy());
        let pattern = format!("{base}/*_matrix_*.json");

        let paths = match glob::glob(&pattern) {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Invalid data directory pattern {}: {}", pattern, e);
                return BTreeSet::new();
            }
        };

        paths
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Skipping unreadable data file: {}", e);
                    None
                }
            })
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?.strip_suffix(".json")?.to_string();
                [PRIMARY_MATRIX_PREFIX, SECONDARY_MATRIX_PREFIX]
                    .iter()
                    .find_map(|prefix| name.strip_prefix(prefix))
                    .filter(|key| !key.is_empty())
                    .map(str::to_string)
            })
            .collect()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
