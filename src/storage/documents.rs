//! JSON document shapes read from the data directory.

use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::LoadError;
use crate::models::{MatchupMatrix, MetaShareMap, TierMap};

/// A matchup matrix document, as written by either provider.
///
/// Only `matrix` is required. Records are a separate document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixDocument {
    /// Provider's label for the window, e.g. "Last 30 days"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_frame: Option<String>,

    /// Last day covered by the window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    #[serde(default)]
    pub archetypes: Vec<String>,

    pub matrix: MatchupMatrix,

    #[serde(default)]
    pub meta_shares: MetaShareMap,

    #[serde(default)]
    pub tiers: TierMap,
}

/// The fields of a primary matrix document used to overlay a secondary window.
///
/// A field that is absent from the document is `None` and leaves the
/// secondary values in place.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OverlayDocument {
    #[serde(default)]
    pub meta_shares: Option<MetaShareMap>,

    #[serde(default)]
    pub tiers: Option<TierMap>,
}

/// Read and parse one JSON document for `period`.
///
/// A file that does not exist is [`LoadError::MissingDataFile`]; a file that
/// does not parse into `T` is [`LoadError::Malformed`].
pub fn read_document<T: DeserializeOwned>(period: &str, path: &Path) -> Result<T, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            LoadError::MissingDataFile {
                period: period.to_string(),
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Io {
                period: period.to_string(),
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    serde_json::from_str(&content).map_err(|source| LoadError::Malformed {
        period: period.to_string(),
        path: path.to_path_buf(),
        source,
    })
}
