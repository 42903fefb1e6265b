//! Loading a time window into a [`TimeWindowSnapshot`].

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use super::{read_document, LoadError, MatrixDocument, OverlayDocument, StorageConfig};
use crate::calculate::reconcile::{
    reconcile, reconcile_meta_shares, reconcile_records, reconcile_tiers,
};
use crate::models::{
    uppercase_keys, AliasTable, ArchetypeRecord, MatchupMatrix, PeriodDefinition, SourceKind,
    TimeWindowSnapshot,
};

/// Whether a configured period can be loaded.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodAvailability {
    pub label: String,
    pub key: String,
    pub source: SourceKind,
    pub available: bool,
    /// Required files not found on disk
    pub missing: Vec<PathBuf>,
}

/// Loads configured periods from the data directory.
///
/// The alias table is fixed for the loader's lifetime.
#[derive(Debug, Clone)]
pub struct PeriodDataLoader {
    storage: StorageConfig,
    periods: Vec<PeriodDefinition>,
    aliases: AliasTable,
}

impl PeriodDataLoader {
    pub fn new(storage: StorageConfig, periods: Vec<PeriodDefinition>, aliases: AliasTable) -> Self {
        Self {
            storage,
            periods,
            aliases,
        }
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// Configured periods, in registry order.
    pub fn periods(&self) -> &[PeriodDefinition] {
        &self.periods
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Look up a configured period by key.
    pub fn definition(&self, key: &str) -> Result<&PeriodDefinition, LoadError> {
        self.periods
            .iter()
            .find(|p| p.key == key)
            .ok_or_else(|| LoadError::UnknownPeriod {
                period: key.to_string(),
            })
    }

    /// Load one period.
    ///
    /// Fails when the period is not configured or one of its required
    /// documents is missing or malformed. There is no empty fallback.
    pub fn load_period(&self, key: &str) -> Result<TimeWindowSnapshot, LoadError> {
        let definition = self.definition(key)?;

        let snapshot = match definition.source {
            SourceKind::Primary => self.load_primary(definition)?,
            SourceKind::Secondary => self.load_secondary(definition)?,
        };

        info!(
            "Loaded period {} ({}): {} archetypes, {} matchup rows, {} records",
            snapshot.period,
            snapshot.source,
            snapshot.archetypes.len(),
            snapshot.matrix.len(),
            snapshot.records.len()
        );

        Ok(snapshot)
    }

    /// Availability of every configured period.
    pub fn availability(&self) -> Vec<PeriodAvailability> {
        self.periods
            .iter()
            .map(|period| {
                let missing = self.storage.missing_files(period);
                PeriodAvailability {
                    label: period.label.clone(),
                    key: period.key.clone(),
                    source: period.source,
                    available: missing.is_empty(),
                    missing,
                }
            })
            .collect()
    }

    /// Configured periods whose required files are all present.
    pub fn available_periods(&self) -> Vec<&PeriodDefinition> {
        self.periods
            .iter()
            .filter(|p| self.storage.missing_files(p).is_empty())
            .collect()
    }

    fn load_primary(&self, period: &PeriodDefinition) -> Result<TimeWindowSnapshot, LoadError> {
        let key = period.key.as_str();
        let doc: MatrixDocument = read_document(key, &self.storage.primary_matrix_path(key))?;
        let matrix = with_cell_names(doc.matrix);

        let records = match read_document::<Vec<ArchetypeRecord>>(
            key,
            &self.storage.primary_records_path(key),
        ) {
            Ok(records) => records,
            Err(LoadError::MissingDataFile { .. }) => records_from_matrix(&matrix),
            Err(e) => return Err(e),
        };

        Ok(TimeWindowSnapshot::new(
            period,
            doc.archetypes,
            matrix,
            uppercase_keys(doc.meta_shares),
            doc.tiers,
            records,
        ))
    }

    fn load_secondary(&self, period: &PeriodDefinition) -> Result<TimeWindowSnapshot, LoadError> {
        let key = period.key.as_str();
        let doc: MatrixDocument = read_document(key, &self.storage.secondary_matrix_path(key))?;
        let raw_records: Vec<ArchetypeRecord> =
            read_document(key, &self.storage.secondary_records_path(key))?;

        let raw_matrix = with_cell_names(doc.matrix);
        let (archetypes, matrix) = reconcile(&doc.archetypes, &raw_matrix, &self.aliases);
        let records = reconcile_records(&raw_records, &self.aliases);
        let mut meta_shares = reconcile_meta_shares(&doc.meta_shares, &self.aliases);
        let mut tiers = reconcile_tiers(&doc.tiers, &self.aliases);

        // Overlay values replace the secondary ones wholesale
        let overlay_path = self.storage.overlay_path(key);
        match read_document::<OverlayDocument>(key, &overlay_path) {
            Ok(overlay) => {
                if let Some(shares) = overlay.meta_shares {
                    meta_shares = reconcile_meta_shares(&shares, &self.aliases);
                }
                if let Some(overlay_tiers) = overlay.tiers {
                    tiers = reconcile_tiers(&overlay_tiers, &self.aliases);
                }
            }
            Err(LoadError::MissingDataFile { .. }) => {
                warn!(
                    "No overlay for period {} at {}; keeping secondary meta shares",
                    key,
                    overlay_path.display()
                );
            }
            Err(e) => return Err(e),
        }

        Ok(TimeWindowSnapshot::new(
            period,
            archetypes,
            matrix,
            uppercase_keys(meta_shares),
            tiers,
            records,
        ))
    }
}

/// Providers key cells by opponent and often leave the cell's own name out.
fn with_cell_names(mut matrix: MatchupMatrix) -> MatchupMatrix {
    for row in matrix.values_mut() {
        for (opponent, cell) in row.iter_mut() {
            if cell.archetype.is_empty() {
                cell.archetype = opponent.clone();
            }
        }
    }
    matrix
}

/// One record per matrix row, summing the row's cells.
fn records_from_matrix(matrix: &MatchupMatrix) -> Vec<ArchetypeRecord> {
    matrix
        .iter()
        .map(|(archetype, row)| ArchetypeRecord::from_row(archetype.as_str(), row))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::path::Path;

    fn write_json(path: &Path, value: &Value) {
        std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    }

    fn test_periods() -> Vec<PeriodDefinition> {
        vec![
            PeriodDefinition::new("6 Months", "6_months", SourceKind::Secondary),
            PeriodDefinition::new("1 Month", "1_month", SourceKind::Primary),
        ]
    }

    fn loader(dir: &Path, aliases: AliasTable) -> PeriodDataLoader {
        PeriodDataLoader::new(StorageConfig::new(dir.to_path_buf()), test_periods(), aliases)
    }

    fn oath_aliases() -> AliasTable {
        [("Oath Control", "Oath")].into_iter().collect()
    }

    fn write_primary(dir: &Path) {
        write_json(
            &dir.join("mtgdecks_matrix_1_month.json"),
            &json!({
                "time_frame": "Last 30 days",
                "archetypes": ["Burn", "Goblins"],
                "matrix": {
                    "Burn": {"Goblins": {"wins": 6, "losses": 4, "draws": 0, "total_matches": 10, "win_rate": 0.6}},
                    "Goblins": {"Burn": {"wins": 4, "losses": 6, "draws": 0, "total_matches": 10, "win_rate": 0.4}}
                },
                "meta_shares": {"Burn": 0.2, "Goblins": 0.15},
                "tiers": {"Burn": "Tier 1", "Goblins": "Tier 2"}
            }),
        );
    }

    fn write_secondary(dir: &Path) {
        write_json(
            &dir.join("archetype_matrix_6_months.json"),
            &json!({
                "archetypes": ["Burn", "Oath", "Oath Control"],
                "matrix": {
                    "Oath Control": {"Burn": {"wins": 5, "losses": 5, "draws": 0, "total_matches": 10, "win_rate": 0.5}},
                    "Oath": {"Burn": {"wins": 3, "losses": 7, "draws": 0, "total_matches": 10, "win_rate": 0.3}},
                    "Burn": {
                        "Oath Control": {"wins": 5, "losses": 5, "draws": 0, "total_matches": 10, "win_rate": 0.5},
                        "Oath": {"wins": 7, "losses": 3, "draws": 0, "total_matches": 10, "win_rate": 0.7}
                    }
                },
                "meta_shares": {"Oath Control": 0.01, "Burn": 0.3}
            }),
        );
        write_json(
            &dir.join("win_loss_records_6_months.json"),
            &json!([
                {"archetype": "Oath Control", "wins": 5, "losses": 5, "draws": 0, "total_matches": 10, "win_rate": 0.5},
                {"archetype": "Oath", "wins": 3, "losses": 7, "draws": 0, "total_matches": 10, "win_rate": 0.3},
                {"archetype": "Burn", "wins": 12, "losses": 8, "draws": 0, "total_matches": 20, "win_rate": 0.6}
            ]),
        );
    }

    #[test]
    fn test_load_primary_synthesizes_records() {
        let tmp = tempfile::tempdir().unwrap();
        write_primary(tmp.path());

        let snapshot = loader(tmp.path(), AliasTable::new())
            .load_period("1_month")
            .unwrap();

        assert_eq!(snapshot.source, SourceKind::Primary);
        assert_eq!(snapshot.label, "1 Month");
        assert_eq!(snapshot.archetypes, vec!["Burn", "Goblins"]);
        assert_eq!(snapshot.records.len(), 2);

        let burn = snapshot.record("Burn").unwrap();
        assert_eq!((burn.wins, burn.losses, burn.total_matches), (6, 4, 10));
        assert!((burn.win_rate - 0.6).abs() < 1e-12);

        // Cells pick up their opponent's name
        assert_eq!(snapshot.matchup("Burn", "Goblins").unwrap().archetype, "Goblins");

        // Meta share keys are uppercased, tiers are not
        assert!(snapshot.meta_shares.contains_key("BURN"));
        assert_eq!(snapshot.meta_share("Burn"), Some(0.2));
        assert_eq!(snapshot.tier("Goblins"), Some("Tier 2"));
    }

    #[test]
    fn test_load_primary_prefers_records_document() {
        let tmp = tempfile::tempdir().unwrap();
        write_primary(tmp.path());
        write_json(
            &tmp.path().join("mtgdecks_records_1_month.json"),
            &json!([{"archetype": "Burn", "wins": 60, "losses": 40}]),
        );

        let snapshot = loader(tmp.path(), AliasTable::new())
            .load_period("1_month")
            .unwrap();

        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.record("Burn").unwrap().total_matches, 100);
    }

    #[test]
    fn test_load_secondary_reconciles_and_overlays() {
        let tmp = tempfile::tempdir().unwrap();
        write_secondary(tmp.path());
        write_json(
            &tmp.path().join("mtgdecks_matrix_6_months.json"),
            &json!({
                "matrix": {},
                "meta_shares": {"Oath": 0.04, "Burn": 0.25},
                "tiers": {"Oath Control": "Tier 3", "Oath": "Tier 2"}
            }),
        );

        let snapshot = loader(tmp.path(), oath_aliases())
            .load_period("6_months")
            .unwrap();

        assert_eq!(snapshot.archetypes, vec!["Burn", "Oath"]);

        let oath_vs_burn = snapshot.matchup("Oath", "Burn").unwrap();
        assert_eq!(oath_vs_burn.wins, 8);
        assert_eq!(oath_vs_burn.losses, 12);
        assert_eq!(oath_vs_burn.total_matches, 20);
        assert!((oath_vs_burn.win_rate - 0.4).abs() < 1e-12);

        let burn_vs_oath = snapshot.matchup("Burn", "Oath").unwrap();
        assert_eq!((burn_vs_oath.wins, burn_vs_oath.losses), (12, 8));

        let oath = snapshot.record("Oath").unwrap();
        assert_eq!(oath.total_matches, 20);

        // Overlay replaced the secondary shares rather than merging
        assert_eq!(snapshot.meta_shares.len(), 2);
        assert_eq!(snapshot.meta_share("oath"), Some(0.04));
        assert_eq!(snapshot.meta_share("Burn"), Some(0.25));
        assert_eq!(snapshot.tier("Oath"), Some("Tier 2"));
    }

    #[test]
    fn test_load_secondary_without_overlay_keeps_raw_shares() {
        let tmp = tempfile::tempdir().unwrap();
        write_secondary(tmp.path());

        let snapshot = loader(tmp.path(), oath_aliases())
            .load_period("6_months")
            .unwrap();

        assert_eq!(snapshot.meta_share("Oath"), Some(0.01));
        assert_eq!(snapshot.meta_share("BURN"), Some(0.3));
    }

    #[test]
    fn test_missing_records_file_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write_secondary(tmp.path());
        std::fs::remove_file(tmp.path().join("win_loss_records_6_months.json")).unwrap();

        let err = loader(tmp.path(), oath_aliases())
            .load_period("6_months")
            .unwrap_err();

        match err {
            LoadError::MissingDataFile { period, path } => {
                assert_eq!(period, "6_months");
                assert!(path.ends_with("win_loss_records_6_months.json"));
            }
            other => panic!("expected MissingDataFile, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_overlay_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write_secondary(tmp.path());
        std::fs::write(tmp.path().join("mtgdecks_matrix_6_months.json"), "[1, 2").unwrap();

        let err = loader(tmp.path(), oath_aliases())
            .load_period("6_months")
            .unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }

    #[test]
    fn test_unknown_period() {
        let tmp = tempfile::tempdir().unwrap();
        let err = loader(tmp.path(), AliasTable::new())
            .load_period("10_years")
            .unwrap_err();
        assert!(matches!(err, LoadError::UnknownPeriod { .. }));
        assert_eq!(err.period(), "10_years");
    }

    #[test]
    fn test_availability() {
        let tmp = tempfile::tempdir().unwrap();
        write_primary(tmp.path());

        let loader = loader(tmp.path(), AliasTable::new());
        let availability = loader.availability();

        assert_eq!(availability.len(), 2);
        assert!(!availability[0].available);
        assert_eq!(availability[0].missing.len(), 2);
        assert!(availability[1].available);

        let available: Vec<&str> = loader
            .available_periods()
            .iter()
            .map(|p| p.key.as_str())
            .collect();
        assert_eq!(available, vec!["1_month"]);
    }
}
