use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::catalog::Catalog;

/// Suffix of the persisted override key: `"<category>::<item>::buyPrice"`.
pub const BUY_PRICE_SUFFIX: &str = "::buyPrice";

/// Separator between category and item name in persisted keys.
pub const KEY_SEPARATOR: &str = "::";

/// Separator used by the old `"<category>-<item>"` key format.
pub const LEGACY_SEPARATOR: char = '-';

/// Composite key of a buy-price override: (category, item name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OverrideKey {
    pub category: String,
    pub item: String,
}

impl OverrideKey {
    pub fn new(category: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            item: item.into(),
        }
    }

    /// Persisted form: `"<category>::<item>::buyPrice"`.
    #[must_use]
    pub fn to_wire(&self) -> String {
        format!(
            "{}{KEY_SEPARATOR}{}{BUY_PRICE_SUFFIX}",
            self.category, self.item
        )
    }

    /// Parse a current-format key. The item name may itself contain `::`.
    #[must_use]
    pub fn parse_wire(raw: &str) -> Option<Self> {
        let body = raw.strip_suffix(BUY_PRICE_SUFFIX)?;
        let (category, item) = body.split_once(KEY_SEPARATOR)?;
        if category.is_empty() || item.is_empty() {
            return None;
        }
        Some(Self::new(category, item))
    }

    /// Parse a legacy `"<category>-<item>"` key, splitting on the first `-`.
    #[must_use]
    pub fn parse_legacy(raw: &str) -> Option<Self> {
        if raw.contains(KEY_SEPARATOR) {
            return None;
        }
        let (category, item) = raw.split_once(LEGACY_SEPARATOR)?;
        if category.is_empty() || item.is_empty() {
            return None;
        }
        Some(Self::new(category, item))
    }
}

impl std::fmt::Display for OverrideKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// Counters reported by [`PriceOverrides::from_wire`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Legacy keys rewritten into the current format.
    pub migrated_legacy: usize,
    /// Legacy keys ignored because a current-format key already existed.
    pub shadowed_legacy: usize,
    /// Entries dropped for an unparsable key or a non-positive price.
    pub dropped: usize,
}

impl MigrationReport {
    /// Whether loading changed anything that should be written back.
    #[must_use]
    pub fn needs_rewrite(&self) -> bool {
        self.migrated_legacy + self.shadowed_legacy + self.dropped > 0
    }
}

/// Per-user custom buy prices.
///
/// Invariant: every stored price is finite, `> 0`, and (once pruned against
/// the catalog) different from the catalog default. Setting a price that
/// breaks this deletes the key instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceOverrides {
    entries: HashMap<OverrideKey, f64>,
}

impl PriceOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the persisted map, migrating legacy keys once.
    ///
    /// Current-format keys win over a legacy key naming the same item.
    pub fn from_wire(raw: &BTreeMap<String, f64>) -> (Self, MigrationReport) {
        let mut overrides = Self::new();
        let mut report = MigrationReport::default();
        let mut legacy = Vec::new();

        for (raw_key, &price) in raw {
            if !is_storable(price) {
                report.dropped += 1;
                continue;
            }
            if let Some(key) = OverrideKey::parse_wire(raw_key) {
                overrides.entries.insert(key, price);
            } else if let Some(key) = OverrideKey::parse_legacy(raw_key) {
                legacy.push((key, price));
            } else {
                report.dropped += 1;
            }
        }

        for (key, price) in legacy {
            if overrides.entries.contains_key(&key) {
                report.shadowed_legacy += 1;
            } else {
                overrides.entries.insert(key, price);
                report.migrated_legacy += 1;
            }
        }

        (overrides, report)
    }

    /// Persisted form, sorted by key for stable output.
    #[must_use]
    pub fn to_wire(&self) -> BTreeMap<String, f64> {
        self.entries
            .iter()
            .map(|(key, price)| (key.to_wire(), *price))
            .collect()
    }

    #[must_use]
    pub fn get(&self, key: &OverrideKey) -> Option<f64> {
        self.entries.get(key).copied()
    }

    /// Set a custom buy price. Returns `true` if the stored state changed.
    ///
    /// A price at or below zero, non-finite, or equal to `catalog_default`
    /// removes the override.
    pub fn set(&mut self, key: OverrideKey, price: f64, catalog_default: f64) -> bool {
        if !is_storable(price) || price == catalog_default {
            return self.entries.remove(&key).is_some();
        }
        self.entries.insert(key, price) != Some(price)
    }

    /// Returns `true` if an override was removed.
    pub fn remove(&mut self, key: &OverrideKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Overlay `other` on top of `self` (entries in `other` win).
    pub fn merge_from(&mut self, other: &PriceOverrides) {
        for (key, price) in &other.entries {
            self.entries.insert(key.clone(), *price);
        }
    }

    /// Drop overrides for items missing from the catalog or equal to its default.
    /// Returns the number removed.
    pub fn prune_against(&mut self, catalog: &Catalog) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, price| {
            catalog
                .default_buy_price(&key.category, &key.item)
                .is_some_and(|default| *price != default)
        });
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OverrideKey, f64)> {
        self.entries.iter().map(|(key, price)| (key, *price))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_storable(price: f64) -> bool {
    price.is_finite() && price > 0.0
}
