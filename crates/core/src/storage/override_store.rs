use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::CoreError;
use crate::models::price_override::PriceOverrides;

use super::manager::StorageManager;
use super::traits::KeyValueStore;

/// Key prefix of persisted overrides: `price-overrides-<userId>`.
pub const OVERRIDES_KEY_PREFIX: &str = "price-overrides-";

/// Key prefix of persisted transaction history: `transactions-<userId>`.
pub const TRANSACTIONS_KEY_PREFIX: &str = "transactions-";

/// Scope name used before anyone has logged in.
pub const TEMP_SCOPE: &str = "temp";

/// Whose data a storage key belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserScope {
    /// Nobody logged in yet; data is migrated to the user on login.
    Temporary,
    User(String),
}

impl UserScope {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            UserScope::Temporary => TEMP_SCOPE,
            UserScope::User(id) => id.as_str(),
        }
    }

    #[must_use]
    pub fn overrides_key(&self) -> String {
        format!("{OVERRIDES_KEY_PREFIX}{}", self.id())
    }

    #[must_use]
    pub fn transactions_key(&self) -> String {
        format!("{TRANSACTIONS_KEY_PREFIX}{}", self.id())
    }
}

/// Loads and saves [`PriceOverrides`] per user scope.
#[derive(Clone)]
pub struct OverrideStore {
    store: Arc<dyn KeyValueStore>,
}

impl OverrideStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Load the overrides for `scope`.
    ///
    /// Legacy keys are migrated here, once; if anything was migrated or
    /// dropped the cleaned map is written back. Read failures yield an empty set.
    pub async fn load(&self, scope: &UserScope) -> PriceOverrides {
        let key = scope.overrides_key();
        let raw: BTreeMap<String, f64> =
            StorageManager::load_or_default(self.backend(), &key, BTreeMap::new()).await;
        let (overrides, report) = PriceOverrides::from_wire(&raw);

        if report.needs_rewrite() {
            info!(
                key = %key,
                migrated = report.migrated_legacy,
                shadowed = report.shadowed_legacy,
                dropped = report.dropped,
                "migrated stored price overrides"
            );
            if let Err(e) = self.save(scope, &overrides).await {
                debug!(key = %key, error = %e, "migrated overrides not written back, retrying on next load");
            }
        }

        overrides
    }

    pub async fn save(&self, scope: &UserScope, overrides: &PriceOverrides) -> Result<(), CoreError> {
        StorageManager::save(self.backend(), &scope.overrides_key(), &overrides.to_wire()).await
    }

    /// Move overrides made before login into the user's scope.
    ///
    /// Temporary entries win over the user's stored ones. The temporary key is
    /// removed only after the merged set has been saved.
    pub async fn migrate_temp_to_user(&self, user_id: &str) -> Result<PriceOverrides, CoreError> {
        let user_scope = UserScope::User(user_id.to_string());
        let temp = self.load(&UserScope::Temporary).await;
        let mut merged = self.load(&user_scope).await;

        if temp.is_empty() {
            return Ok(merged);
        }

        merged.merge_from(&temp);
        self.save(&user_scope, &merged).await?;

        if let Err(e) =
            StorageManager::remove(self.backend(), &UserScope::Temporary.overrides_key()).await
        {
            warn!(error = %e, "temporary overrides left behind after migration");
        }
        info!(user_id, migrated = temp.len(), "moved temporary overrides to user scope");
        Ok(merged)
    }
}
