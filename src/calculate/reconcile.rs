//! Archetype reconciliation across naming schemes.
//!
//! Two providers track the same metagame under partly different archetype
//! names. Every structure keyed by archetype is folded through the
//! [`AliasTable`]; entries that land on the same canonical key are merged.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::win_rate_from_totals;
use crate::models::{
    better_tier, AliasTable, ArchetypeRecord, MatchupCell, MatchupMatrix, MetaShareMap, TierMap,
};

/// Combine two values that collided onto the same canonical key.
///
/// Implementations must be commutative and associative so that the order
/// in which source entries are folded does not change the result.
pub trait Merge {
    fn merge(&mut self, other: Self);
}

impl Merge for MatchupCell {
    fn merge(&mut self, other: Self) {
        self.wins += other.wins;
        self.losses += other.losses;
        self.draws += other.draws;
        self.total_matches += other.total_matches;
        self.win_rate = win_rate_from_totals(self.wins, self.draws, self.total_matches);
    }
}

impl Merge for ArchetypeRecord {
    fn merge(&mut self, other: Self) {
        self.wins += other.wins;
        self.losses += other.losses;
        self.draws += other.draws;
        self.total_matches += other.total_matches;
        self.win_rate = win_rate_from_totals(self.wins, self.draws, self.total_matches);
    }
}

impl Merge for f64 {
    fn merge(&mut self, other: Self) {
        *self += other;
    }
}

/// Fold keyed entries through the alias table, merging collisions with `merge`.
pub fn fold_aliased<V, I, F>(entries: I, aliases: &AliasTable, mut merge: F) -> BTreeMap<String, V>
where
    I: IntoIterator<Item = (String, V)>,
    F: FnMut(&mut V, V),
{
    let mut folded = BTreeMap::new();

    for (name, value) in entries {
        let canonical = aliases.resolve(&name).to_string();
        match folded.entry(canonical) {
            Entry::Vacant(e) => {
                e.insert(value);
            }
            Entry::Occupied(mut e) => {
                debug!("Merging {:?} into canonical archetype {:?}", name, e.key());
                merge(e.get_mut(), value);
            }
        }
    }

    folded
}

/// Rename a raw archetype list and matrix to canonical names.
///
/// The archetype list comes back deduplicated and sorted. Cells of old
/// pairs that map onto the same canonical pair are summed and their win
/// rate recomputed. Names missing from the alias table pass through.
pub fn reconcile(
    raw_archetypes: &[String],
    raw_matrix: &MatchupMatrix,
    aliases: &AliasTable,
) -> (Vec<String>, MatchupMatrix) {
    let archetypes: Vec<String> = raw_archetypes
        .iter()
        .map(|name| aliases.resolve(name).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut matrix = MatchupMatrix::new();
    let mut collisions = 0usize;

    for (old_arch, old_opponents) in raw_matrix {
        let new_arch = aliases.resolve(old_arch);
        let row = matrix.entry(new_arch.to_string()).or_default();

        for (old_opp, cell) in old_opponents {
            let new_opp = aliases.resolve(old_opp);

            match row.entry(new_opp.to_string()) {
                Entry::Vacant(e) => {
                    let mut cell = cell.clone();
                    cell.archetype = new_opp.to_string();
                    e.insert(cell);
                }
                Entry::Occupied(mut e) => {
                    debug!(
                        "Merging {:?} vs {:?} into {:?} vs {:?}",
                        old_arch, old_opp, new_arch, new_opp
                    );
                    e.get_mut().merge(cell.clone());
                    collisions += 1;
                }
            }
        }
    }

    if collisions > 0 {
        debug!("Reconciliation merged {} colliding matchup cells", collisions);
    }

    (archetypes, matrix)
}

/// Rename and merge per-archetype rollups. Output is sorted by name.
pub fn reconcile_records(records: &[ArchetypeRecord], aliases: &AliasTable) -> Vec<ArchetypeRecord> {
    let entries = records.iter().map(|r| {
        let mut record = r.clone();
        record.archetype = aliases.resolve(&r.archetype).to_string();
        (r.archetype.clone(), record)
    });

    fold_aliased(entries, aliases, Merge::merge)
        .into_values()
        .collect()
}

/// Rename meta shares; colliding shares are summed.
pub fn reconcile_meta_shares(shares: &MetaShareMap, aliases: &AliasTable) -> MetaShareMap {
    fold_aliased(
        shares.iter().map(|(name, share)| (name.clone(), *share)),
        aliases,
        Merge::merge,
    )
}

/// Rename tiers; on collision the stronger (lower-numbered) tier is kept.
pub fn reconcile_tiers(tiers: &TierMap, aliases: &AliasTable) -> TierMap {
    fold_aliased(
        tiers.iter().map(|(name, tier)| (name.clone(), tier.clone())),
        aliases,
        |kept: &mut String, other: String| {
            if better_tier(kept, &other) != kept.as_str() {
                *kept = other;
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn oath_aliases() -> AliasTable {
        [("Oath Control", "Oath")].into_iter().collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn cell(opp: &str, wins: u32, losses: u32) -> MatchupCell {
        MatchupCell::new(opp, wins, losses, 0)
    }

    #[test]
    fn test_oath_scenario() {
        let mut raw = MatchupMatrix::new();
        raw.entry("Oath Control".to_string())
            .or_default()
            .insert("Burn".to_string(), cell("Burn", 5, 5));
        raw.entry("Oath".to_string())
            .or_default()
            .insert("Burn".to_string(), cell("Burn", 3, 7));

        let (archetypes, matrix) = reconcile(
            &names(&["Burn", "Oath", "Oath Control"]),
            &raw,
            &oath_aliases(),
        );

        assert_eq!(archetypes, names(&["Burn", "Oath"]));
        assert!(!matrix.contains_key("Oath Control"));

        let merged = &matrix["Oath"]["Burn"];
        assert_eq!(merged.wins, 8);
        assert_eq!(merged.losses, 12);
        assert_eq!(merged.total_matches, 20);
        assert!((merged.win_rate - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_opponent_side_is_renamed() {
        let mut raw = MatchupMatrix::new();
        let row = raw.entry("Burn".to_string()).or_default();
        row.insert("Oath Control".to_string(), cell("Oath Control", 5, 5));
        row.insert("Oath".to_string(), cell("Oath", 7, 3));

        let (_, matrix) = reconcile(&names(&["Burn"]), &raw, &oath_aliases());

        let merged = &matrix["Burn"]["Oath"];
        assert_eq!(merged.archetype, "Oath");
        assert_eq!(merged.wins, 12);
        assert_eq!(merged.losses, 8);
        assert_eq!(matrix["Burn"].len(), 1);
    }

    #[test]
    fn test_non_colliding_cell_is_copied_with_new_name() {
        let mut raw = MatchupMatrix::new();
        let mut original = cell("Oath Control", 4, 6);
        original.win_rate = 0.41; // provider-rounded value is kept
        raw.entry("Burn".to_string())
            .or_default()
            .insert("Oath Control".to_string(), original);

        let (_, matrix) = reconcile(&names(&["Burn"]), &raw, &oath_aliases());
        let copied = &matrix["Burn"]["Oath"];
        assert_eq!(copied.archetype, "Oath");
        assert_eq!(copied.win_rate, 0.41);
    }

    #[test]
    fn test_empty_alias_table_is_noop() {
        let mut raw = MatchupMatrix::new();
        raw.entry("Goblins".to_string())
            .or_default()
            .insert("Burn".to_string(), cell("Burn", 6, 4));
        raw.entry("Burn".to_string())
            .or_default()
            .insert("Goblins".to_string(), cell("Goblins", 4, 6));

        let raw_archetypes = names(&["Goblins", "Burn"]);
        let (archetypes, matrix) = reconcile(&raw_archetypes, &raw, &AliasTable::new());

        assert_eq!(archetypes, names(&["Burn", "Goblins"]));
        assert_eq!(matrix, raw);
    }

    #[test]
    fn test_unknown_names_pass_through() {
        let mut raw = MatchupMatrix::new();
        raw.entry("Brand New Deck".to_string())
            .or_default()
            .insert("Burn".to_string(), cell("Burn", 1, 1));

        let (archetypes, matrix) =
            reconcile(&names(&["Brand New Deck"]), &raw, &AliasTable::builtin());

        assert_eq!(archetypes, names(&["Brand New Deck"]));
        assert!(matrix.contains_key("Brand New Deck"));
    }

    #[test]
    fn test_reconcile_records_sums_collisions() {
        let records = vec![
            ArchetypeRecord::new("Oath Control", 10, 10, 0),
            ArchetypeRecord::new("Oath", 5, 15, 2),
            ArchetypeRecord::new("Burn", 30, 20, 0),
        ];

        let merged = reconcile_records(&records, &oath_aliases());

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].archetype, "Burn");
        assert_eq!(merged[1].archetype, "Oath");
        assert_eq!(merged[1].wins, 15);
        assert_eq!(merged[1].losses, 25);
        assert_eq!(merged[1].draws, 2);
        assert_eq!(merged[1].total_matches, 42);
        assert!((merged[1].win_rate - 16.0 / 42.0).abs() < 1e-12);
    }

    #[test]
    fn test_reconcile_meta_shares_sum() {
        let shares = MetaShareMap::from([
            ("Mono Blue Dreadnought".to_string(), 0.03),
            ("Blue/White Dreadnought".to_string(), 0.02),
            ("Goblins".to_string(), 0.1),
        ]);

        let merged = reconcile_meta_shares(&shares, &AliasTable::builtin());

        assert_eq!(merged.len(), 2);
        assert!((merged["Stiflenought"] - 0.05).abs() < 1e-12);
        assert_eq!(merged["Goblins"], 0.1);
    }

    #[test]
    fn test_reconcile_tiers_keeps_stronger_tier() {
        let tiers = TierMap::from([
            ("Mono Blue Dreadnought".to_string(), "Tier 3".to_string()),
            ("Blue/White Dreadnought".to_string(), "Tier 1".to_string()),
        ]);

        let merged = reconcile_tiers(&tiers, &AliasTable::builtin());
        assert_eq!(merged["Stiflenought"], "Tier 1");

        // Same result with the source order flipped
        let flipped = TierMap::from([
            ("Mono Blue Dreadnought".to_string(), "Tier 1".to_string()),
            ("Blue/White Dreadnought".to_string(), "Tier 3".to_string()),
        ]);
        assert_eq!(
            reconcile_tiers(&flipped, &AliasTable::builtin())["Stiflenought"],
            "Tier 1"
        );
    }

    proptest! {
        #[test]
        fn cell_merge_is_commutative(
            a in (0u32..500, 0u32..500, 0u32..50),
            b in (0u32..500, 0u32..500, 0u32..50),
        ) {
            let first = MatchupCell::new("Burn", a.0, a.1, a.2);
            let second = MatchupCell::new("Burn", b.0, b.1, b.2);

            let mut ab = first.clone();
            ab.merge(second.clone());
            let mut ba = second;
            ba.merge(first);

            prop_assert_eq!(ab, ba);
        }

        #[test]
        fn reconcile_is_independent_of_source_order(
            a in (0u32..200, 0u32..200),
            b in (0u32..200, 0u32..200),
        ) {
            let aliases: AliasTable =
                [("Oath A", "Oath"), ("Oath B", "Oath")].into_iter().collect();

            let build = |x: (u32, u32), y: (u32, u32)| {
                let mut raw = MatchupMatrix::new();
                raw.entry("Oath A".to_string())
                    .or_default()
                    .insert("Burn".to_string(), cell("Burn", x.0, x.1));
                raw.entry("Oath B".to_string())
                    .or_default()
                    .insert("Burn".to_string(), cell("Burn", y.0, y.1));
                reconcile(&names(&["Oath A", "Oath B"]), &raw, &aliases).1
            };

            let forward = build(a, b);
            let backward = build(b, a);
            let merged = &forward["Oath"]["Burn"];
            prop_assert_eq!(merged, &backward["Oath"]["Burn"]);
            prop_assert_eq!(merged.wins, a.0 + b.0);
            prop_assert_eq!(merged.total_matches, a.0 + a.1 + b.0 + b.1);
        }
    }
}
