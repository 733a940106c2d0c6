pub mod errors;
pub mod models;
pub mod numeric;
pub mod services;
pub mod storage;

use std::sync::Arc;
use std::time::Instant;

use models::{
    catalog::Catalog,
    price_override::{OverrideKey, PriceOverrides},
    selection::{ItemId, SelectionLedger},
    settings::Settings,
    totals::{LineItem, MarginResult, Totals},
    transaction::TransactionRecord,
};
use services::{
    items_resolver::{ItemsResolver, ResolvedCatalog},
    margin_alert::{MarginAlert, MarginAlertEvent},
    scheduler::{Clock, Debouncer, SystemClock},
    totals_service::TotalsCalculator,
    transaction_service::TransactionService,
};
use storage::{
    manager::StorageManager,
    override_store::{OverrideStore, UserScope},
    traits::KeyValueStore,
};
use tracing::{debug, info, warn};

use errors::CoreError;

/// Store key of the persisted [`Settings`].
pub const SETTINGS_KEY: &str = "settings";

/// Main entry point for the trade ledger core.
///
/// Owns the resolved-price cache, the selection, the totals memo and the
/// margin watcher, and persists per-user overrides and history through a
/// [`KeyValueStore`]. Everything except persistence is synchronous; edits
/// schedule debounced work that [`TradeLedger::tick`] runs once due.
#[must_use]
pub struct TradeLedger {
    settings: Settings,
    store: Arc<dyn KeyValueStore>,
    override_store: OverrideStore,
    scope: UserScope,
    overrides: PriceOverrides,
    resolver: ItemsResolver,
    ledger: SelectionLedger,
    calculator: TotalsCalculator,
    margin_alert: MarginAlert,
    transaction_service: TransactionService,
    transactions: Vec<TransactionRecord>,
    clock: Arc<dyn Clock>,
    /// One pending save per edited override field.
    override_saves: Debouncer<OverrideKey>,
    totals_refresh: Debouncer<()>,
    totals: Totals,
    alerts: Vec<MarginAlertEvent>,
}

impl std::fmt::Debug for TradeLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeLedger")
            .field("scope", &self.scope)
            .field("catalog_items", &self.resolver.catalog().len())
            .field("overrides", &self.overrides.len())
            .field("selected", &self.ledger.len())
            .field("transactions", &self.transactions.len())
            .field("totals", &self.totals)
            .finish()
    }
}

impl TradeLedger {
    /// Create a ledger over `catalog`, persisting through `store`, with
    /// default settings and the system clock. Nobody is logged in.
    pub fn new(catalog: Catalog, store: Arc<dyn KeyValueStore>) -> Self {
        let settings = Settings::default();
        Self {
            override_store: OverrideStore::new(Arc::clone(&store)),
            store,
            scope: UserScope::Temporary,
            overrides: PriceOverrides::new(),
            resolver: ItemsResolver::new(catalog),
            ledger: SelectionLedger::with_zero_quantity_categories(
                settings.zero_quantity_categories.iter().cloned(),
            ),
            calculator: TotalsCalculator::new(),
            margin_alert: MarginAlert::new(settings.margin_alert.clone()),
            transaction_service: TransactionService::new(),
            transactions: Vec::new(),
            clock: Arc::new(SystemClock),
            override_saves: Debouncer::new(settings.override_save_debounce()),
            totals_refresh: Debouncer::new(settings.totals_debounce()),
            totals: Totals::default(),
            alerts: Vec::new(),
            settings,
        }
    }

    /// Use a different clock (tests drive debouncing with a `ManualClock`).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Result<Self, CoreError> {
        self.apply_settings(settings)?;
        Ok(self)
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Apply new settings. Pending work and the alert state are kept.
    ///
    /// Existing ledger rows are re-applied so rows that no longer allow a
    /// zero quantity are dropped.
    pub fn apply_settings(&mut self, settings: Settings) -> Result<(), CoreError> {
        settings.validate()?;
        self.override_saves.set_delay(settings.override_save_debounce());
        self.totals_refresh.set_delay(settings.totals_debounce());
        self.margin_alert.configure(settings.margin_alert.clone());

        let mut ledger = SelectionLedger::with_zero_quantity_categories(
            settings.zero_quantity_categories.iter().cloned(),
        );
        for (id, quantity) in self.ledger.iter() {
            ledger.set(id.clone(), quantity);
        }
        self.ledger = ledger;
        self.settings = settings;
        self.schedule_totals();
        Ok(())
    }

    /// Load settings from the store; unreadable or invalid settings leave
    /// the current ones in place.
    pub async fn load_settings(&mut self) {
        let loaded =
            StorageManager::load_or_default(self.store.as_ref(), SETTINGS_KEY, self.settings.clone())
                .await;
        if let Err(e) = self.apply_settings(loaded) {
            warn!(error = %e, "stored settings rejected, keeping current settings");
        }
    }

    pub async fn save_settings(&self) -> Result<(), CoreError> {
        StorageManager::save(self.store.as_ref(), SETTINGS_KEY, &self.settings).await
    }

    pub fn set_alert_enabled(&mut self, enabled: bool) {
        self.settings.margin_alert.enabled = enabled;
        self.margin_alert.set_enabled(enabled);
    }

    pub fn set_alert_threshold(&mut self, threshold: f64) {
        if threshold.is_finite() {
            self.settings.margin_alert.threshold = threshold;
        }
        self.margin_alert.set_threshold(threshold);
    }

    // ── Session ─────────────────────────────────────────────────────

    /// The logged-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<&str> {
        match &self.scope {
            UserScope::Temporary => None,
            UserScope::User(id) => Some(id.as_str()),
        }
    }

    /// Switch to `user_id`'s data.
    ///
    /// Overrides made before login move into the user's scope. Storage
    /// failures do not fail the login: in-memory overrides are kept and a
    /// save is queued for the next tick.
    pub async fn login(&mut self, user_id: &str) -> Result<(), CoreError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(CoreError::ValidationError("User id must not be empty".into()));
        }
        if self.current_user().is_some() {
            self.logout().await;
        }

        // Make sure edits made before login are on disk before migrating them.
        let mut persisted = true;
        if let Err(e) = self.flush().await {
            warn!(error = %e, "could not persist temporary overrides before login");
            persisted = false;
        }

        let scope = UserScope::User(user_id.to_string());
        let mut overrides = match self.override_store.migrate_temp_to_user(user_id).await {
            Ok(overrides) => overrides,
            Err(e) => {
                warn!(user_id, error = %e, "override migration failed, keeping edits in memory");
                persisted = false;
                self.override_store.load(&scope).await
            }
        };

        // Edits made before login win over stored ones, whether or not they reached storage.
        overrides.merge_from(&self.overrides);
        if !persisted {
            let now = self.clock.now();
            for (key, _) in self.overrides.iter() {
                self.override_saves.schedule(key.clone(), now);
            }
        }

        let pruned = overrides.prune_against(self.resolver.catalog());
        if pruned > 0 {
            debug!(user_id, pruned, "dropped overrides matching catalog defaults");
        }

        self.transactions = StorageManager::load_or_default(
            self.store.as_ref(),
            &scope.transactions_key(),
            Vec::new(),
        )
        .await;
        self.overrides = overrides;
        self.scope = scope;
        self.resolver.refresh_items_cache();
        self.schedule_totals();

        info!(
            user_id,
            overrides = self.overrides.len(),
            transactions = self.transactions.len(),
            "logged in"
        );
        Ok(())
    }

    /// Persist pending edits, then drop the user's data from memory.
    ///
    /// Edits that still cannot be written are lost with the rest of the
    /// user's in-memory state.
    pub async fn logout(&mut self) {
        if let Err(e) = self.flush().await {
            let unsaved = self.override_saves.drain_all().len();
            warn!(error = %e, unsaved, "pending saves failed during logout");
        }

        let previous = std::mem::replace(&mut self.scope, UserScope::Temporary);
        self.ledger.clear();
        self.transactions.clear();
        self.overrides = self.override_store.load(&UserScope::Temporary).await;
        self.resolver.refresh_items_cache();
        self.margin_alert.reset();
        self.alerts.clear();
        self.totals_refresh.drain_all();
        self.totals = Totals::default();

        info!(user = previous.id(), "logged out");
    }

    // ── Items & Overrides ───────────────────────────────────────────

    /// Catalog with the current overrides applied. Cached until invalidated.
    pub fn get_items_data(&mut self) -> Arc<ResolvedCatalog> {
        self.resolver.get_items_data(&self.overrides)
    }

    /// Force the next `get_items_data` call to rebuild.
    pub fn refresh_items_cache(&mut self) {
        self.resolver.refresh_items_cache();
    }

    pub fn catalog(&self) -> &Catalog {
        self.resolver.catalog()
    }

    pub fn overrides(&self) -> &PriceOverrides {
        &self.overrides
    }

    #[must_use]
    pub fn buy_price_override(&self, category: &str, name: &str) -> Option<f64> {
        self.overrides.get(&OverrideKey::new(category, name))
    }

    /// Set a custom buy price for a catalog item.
    ///
    /// A price at or below zero, or equal to the catalog default, removes
    /// the override. Returns `true` if the overrides changed; the save is
    /// debounced per item.
    pub fn set_buy_price(&mut self, category: &str, name: &str, price: f64) -> Result<bool, CoreError> {
        let default = self
            .resolver
            .catalog()
            .default_buy_price(category, name)
            .ok_or_else(|| CoreError::UnknownItem {
                category: category.to_string(),
                name: name.to_string(),
            })?;

        let key = OverrideKey::new(category, name);
        let changed = self
            .overrides
            .set(key.clone(), numeric::sanitize(price), default);
        if changed {
            self.resolver.refresh_items_cache();
            self.override_saves.schedule(key, self.clock.now());
            self.schedule_totals();
        }
        Ok(changed)
    }

    /// [`TradeLedger::set_buy_price`] from raw text; unparsable text counts as 0.
    pub fn set_buy_price_input(
        &mut self,
        category: &str,
        name: &str,
        input: &str,
    ) -> Result<bool, CoreError> {
        self.set_buy_price(category, name, numeric::parse_number(input))
    }

    /// Return an item to its catalog buy price.
    pub fn reset_buy_price(&mut self, category: &str, name: &str) -> bool {
        let key = OverrideKey::new(category, name);
        let removed = self.overrides.remove(&key);
        if removed {
            self.resolver.refresh_items_cache();
            self.override_saves.schedule(key, self.clock.now());
            self.schedule_totals();
        }
        removed
    }

    /// Write the current overrides now, for the active scope.
    pub async fn save_overrides(&self) -> Result<(), CoreError> {
        self.override_store.save(&self.scope, &self.overrides).await
    }

    // ── Selection ───────────────────────────────────────────────────

    pub fn selection(&self) -> &SelectionLedger {
        &self.ledger
    }

    /// Set the quantity of a catalog item in the selection.
    ///
    /// Returns the stored quantity, or `None` when the row was removed.
    pub fn select_item(&mut self, id: ItemId, quantity: i64) -> Result<Option<i64>, CoreError> {
        if self.resolver.catalog().find(&id.category, &id.name).is_none() {
            return Err(CoreError::UnknownItem {
                category: id.category,
                name: id.name,
            });
        }
        let stored = self.ledger.set(id, quantity);
        self.schedule_totals();
        Ok(stored)
    }

    /// [`TradeLedger::select_item`] from a raw row id (`"category::name"` or
    /// `"category-name"`) and raw quantity text.
    pub fn set_quantity_input(&mut self, raw_id: &str, input: &str) -> Result<Option<i64>, CoreError> {
        let id = ItemId::parse(raw_id)
            .ok_or_else(|| CoreError::ValidationError(format!("Invalid item id '{raw_id}'")))?;
        self.select_item(id, numeric::parse_quantity(input))
    }

    pub fn deselect_item(&mut self, id: &ItemId) -> bool {
        let removed = self.ledger.delete(id);
        if removed {
            self.schedule_totals();
        }
        removed
    }

    pub fn clear_selection(&mut self) {
        self.ledger.clear();
        self.schedule_totals();
    }

    // ── Totals & Alerts ─────────────────────────────────────────────

    pub fn calculate_margin(&mut self, buy_price: f64, sell_price: f64, quantity: f64) -> Arc<MarginResult> {
        self.calculator.calculate_margin(buy_price, sell_price, quantity)
    }

    pub fn calculate_totals(&mut self, items: &[LineItem]) -> Totals {
        self.calculator.calculate_totals(items)
    }

    /// Feed totals to the margin watcher directly; any alert is queued.
    pub fn check_margin(&mut self, margin: f64, total_buy: f64, total_sell: f64) -> Option<MarginAlertEvent> {
        let alert = self.margin_alert.check_margin(margin, total_buy, total_sell);
        if let Some(event) = &alert {
            self.alerts.push(event.clone());
        }
        alert
    }

    /// Recompute totals for the current selection right away and run the
    /// margin check. Cancels any pending debounced recompute.
    pub fn recalculate_totals(&mut self) -> &Totals {
        self.totals_refresh.cancel(&());
        let resolved = self.get_items_data();
        let lines: Vec<LineItem> = resolved
            .price_selection(&self.ledger)
            .iter()
            .map(|line| line.line_item())
            .collect();
        let totals = self.calculator.calculate_totals(&lines);
        self.check_margin(totals.total_margin, totals.total_buy, totals.total_sell);
        self.totals = totals;
        &self.totals
    }

    /// Totals as of the last recompute.
    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    /// Drain alerts raised since the last call.
    pub fn take_alerts(&mut self) -> Vec<MarginAlertEvent> {
        std::mem::take(&mut self.alerts)
    }

    pub fn margin_alert(&self) -> &MarginAlert {
        &self.margin_alert
    }

    // ── Debounced work ──────────────────────────────────────────────

    /// Run whatever debounced work is due: the totals recompute, then one
    /// save covering every due override field.
    pub async fn tick(&mut self) -> Result<(), CoreError> {
        let now = self.clock.now();
        if !self.totals_refresh.take_due(now).is_empty() {
            self.recalculate_totals();
        }
        let due = self.override_saves.take_due(now);
        if due.is_empty() {
            return Ok(());
        }
        debug!(fields = due.len(), "saving debounced override edits");
        self.save_due_overrides(due).await
    }

    /// Run all pending work now, regardless of deadlines.
    pub async fn flush(&mut self) -> Result<(), CoreError> {
        if !self.totals_refresh.drain_all().is_empty() {
            self.recalculate_totals();
        }
        let due = self.override_saves.drain_all();
        if due.is_empty() {
            return Ok(());
        }
        self.save_due_overrides(due).await
    }

    /// Save the overrides for `due` fields; on failure they are queued again.
    async fn save_due_overrides(&mut self, due: Vec<OverrideKey>) -> Result<(), CoreError> {
        let result = self.save_overrides().await;
        if result.is_err() {
            let now = self.clock.now();
            for key in due {
                self.override_saves.schedule(key, now);
            }
        }
        result
    }

    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        self.totals_refresh.has_pending() || self.override_saves.has_pending()
    }

    /// When `tick` next has something to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (
            self.totals_refresh.next_deadline(),
            self.override_saves.next_deadline(),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn schedule_totals(&mut self) {
        self.totals_refresh.schedule((), self.clock.now());
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Record the current selection as a transaction with `seller`.
    ///
    /// The selection is cleared and totals reset. The record stays in the
    /// in-memory history even if persisting it fails; that failure is
    /// returned so the UI can tell the user.
    pub async fn commit_transaction(&mut self, seller: &str) -> Result<TransactionRecord, CoreError> {
        let user = self.current_user().ok_or(CoreError::NotLoggedIn)?.to_string();
        let resolved = self.get_items_data();
        let lines = resolved.price_selection(&self.ledger);
        let record = self
            .transaction_service
            .build_record(&mut self.calculator, &user, seller, &lines)?;

        self.transaction_service
            .add(&mut self.transactions, record.clone());
        self.ledger.clear();
        self.margin_alert.reset();
        self.recalculate_totals();

        info!(
            id = %record.id,
            seller = %record.seller,
            items = record.items.len(),
            margin = record.margin,
            "transaction committed"
        );
        self.save_transactions().await?;
        Ok(record)
    }

    /// Delete a transaction permanently.
    pub async fn delete_transaction(&mut self, id: uuid::Uuid) -> Result<TransactionRecord, CoreError> {
        if self.current_user().is_none() {
            return Err(CoreError::NotLoggedIn);
        }
        let removed = self
            .transaction_service
            .delete(&mut self.transactions, id)?;
        self.save_transactions().await?;
        Ok(removed)
    }

    /// Transaction history, newest first.
    #[must_use]
    pub fn transactions(&self) -> Vec<&TransactionRecord> {
        self.transaction_service.newest_first(&self.transactions)
    }

    #[must_use]
    pub fn get_transaction(&self, id: uuid::Uuid) -> Option<&TransactionRecord> {
        self.transactions.iter().find(|record| record.id == id)
    }

    async fn save_transactions(&self) -> Result<(), CoreError> {
        StorageManager::save(
            self.store.as_ref(),
            &self.scope.transactions_key(),
            &self.transactions,
        )
        .await
    }
}
