//! Tier labels ("Tier 1".."Tier 3").
//!
//! Tiers are advisory and only used for filtering. A lower number is a
//! stronger deck.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

/// Archetype name → tier label.
pub type TierMap = BTreeMap<String, String>;

fn tier_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)").expect("static regex"))
}

/// Numeric rank of a tier label, e.g. "Tier 2" → 2.
pub fn tier_rank(label: &str) -> Option<u32> {
    tier_number_re()
        .captures(label)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Order tier labels strongest first. Numbered tiers sort ahead of
/// unnumbered ones; equal ranks fall back to the label text.
pub fn compare_tiers(a: &str, b: &str) -> Ordering {
    match (tier_rank(a), tier_rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// The stronger of two tier labels.
pub fn better_tier<'a>(a: &'a str, b: &'a str) -> &'a str {
    match compare_tiers(a, b) {
        Ordering::Greater => b,
        _ => a,
    }
}

/// Archetypes whose tier rank is at most `max_rank`, sorted by name.
pub fn archetypes_up_to_tier(tiers: &TierMap, max_rank: u32) -> Vec<&str> {
    tiers
        .iter()
        .filter(|(_, label)| tier_rank(label).is_some_and(|r| r <= max_rank))
        .map(|(name, _)| name.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_rank() {
        assert_eq!(tier_rank("Tier 1"), Some(1));
        assert_eq!(tier_rank("Tier 3"), Some(3));
        assert_eq!(tier_rank("tier-2"), Some(2));
        assert_eq!(tier_rank("Rogue"), None);
    }

    #[test]
    fn test_better_tier_prefers_lower_number() {
        assert_eq!(better_tier("Tier 2", "Tier 1"), "Tier 1");
        assert_eq!(better_tier("Tier 1", "Tier 3"), "Tier 1");
    }

    #[test]
    fn test_better_tier_numbered_beats_unnumbered() {
        assert_eq!(better_tier("Rogue", "Tier 3"), "Tier 3");
        assert_eq!(better_tier("Tier 3", "Rogue"), "Tier 3");
    }

    #[test]
    fn test_better_tier_is_order_independent() {
        for (a, b) in [("Tier 1", "Tier 1 "), ("Rogue", "Fringe"), ("Tier 2", "Tier 10")] {
            assert_eq!(better_tier(a, b), better_tier(b, a));
        }
    }

    #[test]
    fn test_archetypes_up_to_tier() {
        let mut tiers = TierMap::new();
        tiers.insert("Goblins".to_string(), "Tier 1".to_string());
        tiers.insert("Elves".to_string(), "Tier 2".to_string());
        tiers.insert("Pox".to_string(), "Tier 3".to_string());

        assert_eq!(archetypes_up_to_tier(&tiers, 2), vec!["Elves", "Goblins"]);
        assert_eq!(archetypes_up_to_tier(&tiers, 1), vec!["Goblins"]);
    }
}
