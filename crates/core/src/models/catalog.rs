use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::CoreError;

/// A single tradable item with its default prices.
///
/// Reference data: built once from the bundled catalog and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub name: String,
    pub buy_price: f64,
    pub sell_price: f64,
}

impl CatalogItem {
    pub fn new(name: impl Into<String>, buy_price: f64, sell_price: f64) -> Self {
        Self {
            name: name.into(),
            buy_price,
            sell_price,
        }
    }
}

/// Static item catalog: category → items, in a deterministic (sorted) category order.
///
/// Items are held behind `Arc` so resolved views can share untouched entries
/// instead of cloning them.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    categories: BTreeMap<String, Vec<Arc<CatalogItem>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the catalog's JSON form: `{ "<category>": [{name, buyPrice, sellPrice}, ...] }`.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let raw: BTreeMap<String, Vec<CatalogItem>> = serde_json::from_str(json)?;
        Ok(Self::from_categories(raw))
    }

    pub fn from_categories(raw: BTreeMap<String, Vec<CatalogItem>>) -> Self {
        let categories = raw
            .into_iter()
            .map(|(category, items)| (category, items.into_iter().map(Arc::new).collect()))
            .collect();
        Self { categories }
    }

    /// Add an item to a category (builder style, mostly for tests and fixtures).
    pub fn with_item(mut self, category: impl Into<String>, item: CatalogItem) -> Self {
        self.categories
            .entry(category.into())
            .or_default()
            .push(Arc::new(item));
        self
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &[Arc<CatalogItem>])> {
        self.categories
            .iter()
            .map(|(category, items)| (category.as_str(), items.as_slice()))
    }

    pub fn items(&self, category: &str) -> Option<&[Arc<CatalogItem>]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    /// Look up an item by exact category and name.
    #[must_use]
    pub fn find(&self, category: &str, name: &str) -> Option<&Arc<CatalogItem>> {
        self.categories
            .get(category)?
            .iter()
            .find(|item| item.name == name)
    }

    #[must_use]
    pub fn default_buy_price(&self, category: &str, name: &str) -> Option<f64> {
        self.find(category, name).map(|item| item.buy_price)
    }

    /// Total number of items across all categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
