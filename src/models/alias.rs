//! Archetype name aliases between data providers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Legacy/alternate archetype name → canonical name.
///
/// Many-to-one. A name with no entry is already canonical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable(BTreeMap<String, String>);

impl AliasTable {
    /// Create an empty alias table.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Legacy names used by the older results archive, mapped onto the
    /// names used by the metagame-share provider.
    pub fn builtin() -> Self {
        [
            ("Red/Green Oath Ponza", "Oath Ponza"),
            ("Blue/Black Psychatog", "Psychatog"),
            ("Blue/White Dreadnought", "Stiflenought"),
            ("Mono Blue Dreadnought", "Stiflenought"),
            ("Mono Blue Tide Control", "Tide Control"),
            ("Survival Madness", "Madness"),
            ("Black/White Control", "BW Control"),
            ("Gro-a-tog", "Gro-a-Tog"),
        ]
        .into_iter()
        .collect()
    }

    /// Add or replace an alias.
    pub fn insert(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.0.insert(alias.into(), canonical.into());
    }

    /// Canonical name for `name`; identity when there is no alias.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.0.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Aliases whose target is itself an alias key. These are not followed
    /// transitively, so they are almost always a mistake in the table.
    pub fn chained(&self) -> Vec<(&str, &str)> {
        self.0
            .iter()
            .filter(|(alias, canonical)| alias != canonical && self.0.contains_key(*canonical))
            .filter(|(_, canonical)| self.0.get(*canonical) != Some(*canonical))
            .map(|(alias, canonical)| (alias.as_str(), canonical.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }
}

impl<A: Into<String>, C: Into<String>> FromIterator<(A, C)> for AliasTable {
    fn from_iter<I: IntoIterator<Item = (A, C)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(a, c)| (a.into(), c.into()))
                .collect(),
        )
    }
}
