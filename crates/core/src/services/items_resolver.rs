use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::catalog::{Catalog, CatalogItem};
use crate::models::price_override::{OverrideKey, PriceOverrides};
use crate::models::selection::{ItemId, SelectionLedger};
use crate::models::totals::LineItem;

/// The catalog as the UI sees it: default prices with the user's buy-price
/// overrides applied.
///
/// Items without an override are the catalog's own `Arc`s, so
/// `Arc::ptr_eq` holds for them across rebuilds.
#[derive(Debug, Clone, Default)]
pub struct ResolvedCatalog {
    categories: BTreeMap<String, Vec<Arc<CatalogItem>>>,
}

/// A selected ledger row joined with its resolved item.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub id: ItemId,
    pub item: Arc<CatalogItem>,
    pub quantity: i64,
}

impl PricedLine {
    #[must_use]
    pub fn line_item(&self) -> LineItem {
        LineItem::new(self.item.buy_price, self.item.sell_price, self.quantity as f64)
    }
}

impl ResolvedCatalog {
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[Arc<CatalogItem>])> {
        self.categories
            .iter()
            .map(|(category, items)| (category.as_str(), items.as_slice()))
    }

    pub fn items(&self, category: &str) -> Option<&[Arc<CatalogItem>]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    #[must_use]
    pub fn find(&self, category: &str, name: &str) -> Option<&Arc<CatalogItem>> {
        self.categories
            .get(category)?
            .iter()
            .find(|item| item.name == name)
    }

    /// Cross-reference the ledger against resolved prices.
    ///
    /// Rows naming an item that is not in the catalog are skipped.
    #[must_use]
    pub fn price_selection(&self, ledger: &SelectionLedger) -> Vec<PricedLine> {
        ledger
            .iter()
            .filter_map(|(id, quantity)| match self.find(&id.category, &id.name) {
                Some(item) => Some(PricedLine {
                    id: id.clone(),
                    item: Arc::clone(item),
                    quantity,
                }),
                None => {
                    warn!(item = %id, "selected item missing from catalog, skipped");
                    None
                }
            })
            .collect()
    }
}

/// Merges the static catalog with price overrides and caches the result.
///
/// The cache stays valid until [`ItemsResolver::refresh_items_cache`] is
/// called; callers must do so after any override change, login, or logout.
pub struct ItemsResolver {
    catalog: Catalog,
    cache: Option<Arc<ResolvedCatalog>>,
    dirty: bool,
    /// Bumped on every invalidation.
    version: u64,
    rebuilds: u64,
}

impl ItemsResolver {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            cache: None,
            dirty: true,
            version: 0,
            rebuilds: 0,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolved catalog for the given overrides.
    ///
    /// While the cache is clean the same `Arc` is returned on every call.
    pub fn get_items_data(&mut self, overrides: &PriceOverrides) -> Arc<ResolvedCatalog> {
        if !self.dirty {
            if let Some(cache) = &self.cache {
                return Arc::clone(cache);
            }
        }

        let resolved = Arc::new(Self::resolve(&self.catalog, overrides));
        self.cache = Some(Arc::clone(&resolved));
        self.dirty = false;
        self.rebuilds += 1;
        debug!(
            version = self.version,
            overrides = overrides.len(),
            "rebuilt resolved items cache"
        );
        resolved
    }

    /// Mark the cache stale. The next `get_items_data` call rebuilds it.
    pub fn refresh_items_cache(&mut self) {
        self.dirty = true;
        self.version += 1;
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of times the cache has been rebuilt.
    #[must_use]
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    fn resolve(catalog: &Catalog, overrides: &PriceOverrides) -> ResolvedCatalog {
        let categories = catalog
            .categories()
            .map(|(category, items)| {
                let resolved = items
                    .iter()
                    .map(|item| Self::resolve_item(category, item, overrides))
                    .collect();
                (category.to_string(), resolved)
            })
            .collect();
        ResolvedCatalog { categories }
    }

    fn resolve_item(
        category: &str,
        item: &Arc<CatalogItem>,
        overrides: &PriceOverrides,
    ) -> Arc<CatalogItem> {
        let key = OverrideKey::new(category, item.name.clone());
        match overrides.get(&key) {
            Some(price) if price > 0.0 && price != item.buy_price => Arc::new(CatalogItem {
                buy_price: price,
                ..CatalogItem::clone(item)
            }),
            _ => Arc::clone(item),
        }
    }
}
