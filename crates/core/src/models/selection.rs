use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::price_override::{OverrideKey, KEY_SEPARATOR, LEGACY_SEPARATOR};

/// Identifier of a selectable catalog item: `"<category>::<name>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId {
    pub category: String,
    pub name: String,
}

impl ItemId {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }

    /// Parse `"category::name"` or the legacy `"category-name"`.
    ///
    /// Splits on the first separator only, so the name keeps any later
    /// occurrences (`"ammo::9mm::FMJ"` → `("ammo", "9mm::FMJ")`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (category, name) = raw
            .split_once(KEY_SEPARATOR)
            .or_else(|| raw.split_once(LEGACY_SEPARATOR))?;
        if category.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(category, name))
    }

    /// The override key addressing this item's buy price.
    #[must_use]
    pub fn override_key(&self) -> OverrideKey {
        OverrideKey::new(self.category.clone(), self.name.clone())
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", self.category, self.name)
    }
}

/// Items selected for the in-progress transaction, with their quantities.
///
/// Rows in a zero-quantity category (e.g. drugs) may hold `0`; everywhere
/// else a quantity below `1` removes the row.
#[derive(Debug, Clone, Default)]
pub struct SelectionLedger {
    entries: BTreeMap<ItemId, i64>,
    zero_quantity_categories: BTreeSet<String>,
}

impl SelectionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zero_quantity_categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: BTreeMap::new(),
            zero_quantity_categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn allows_zero_quantity(&self, category: &str) -> bool {
        self.zero_quantity_categories.contains(category)
    }

    /// Set the quantity for `id`. Returns the stored quantity, or `None` if
    /// the row was removed.
    pub fn set(&mut self, id: ItemId, quantity: i64) -> Option<i64> {
        if self.allows_zero_quantity(&id.category) {
            let quantity = quantity.max(0);
            self.entries.insert(id, quantity);
            return Some(quantity);
        }
        if quantity < 1 {
            self.entries.remove(&id);
            return None;
        }
        self.entries.insert(id, quantity);
        Some(quantity)
    }

    /// Returns `true` if the row existed.
    pub fn delete(&mut self, id: &ItemId) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<i64> {
        self.entries.get(id).copied()
    }

    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, i64)> {
        self.entries.iter().map(|(id, qty)| (id, *qty))
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
