use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::CoreError;

use super::traits::KeyValueStore;

/// Typed load/save on top of a [`KeyValueStore`].
///
/// Reads never fail the caller: a broken backend or a malformed value falls
/// back to the provided default. Writes are logged and returned as errors.
pub struct StorageManager;

impl StorageManager {
    /// Read and decode `key`, propagating backend and decode errors.
    pub async fn try_load<T: DeserializeOwned>(
        store: &dyn KeyValueStore,
        key: &str,
    ) -> Result<Option<T>, CoreError> {
        let Some(value) = store.load(key).await? else {
            return Ok(None);
        };
        let decoded = serde_json::from_value(value).map_err(|e| {
            CoreError::Deserialization(format!("Failed to decode '{key}': {e}"))
        })?;
        Ok(Some(decoded))
    }

    /// Read and decode `key`, returning `default` when missing or unreadable.
    pub async fn load_or_default<T: DeserializeOwned>(
        store: &dyn KeyValueStore,
        key: &str,
        default: T,
    ) -> T {
        match Self::try_load(store, key).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(key, backend = store.name(), "no stored value, using default");
                default
            }
            Err(e) => {
                warn!(key, backend = store.name(), error = %e, "load failed, using default");
                default
            }
        }
    }

    /// Encode and write `value` under `key`.
    pub async fn save<T: Serialize + ?Sized>(
        store: &dyn KeyValueStore,
        key: &str,
        value: &T,
    ) -> Result<(), CoreError> {
        let encoded = serde_json::to_value(value)
            .map_err(|e| CoreError::Serialization(format!("Failed to encode '{key}': {e}")))?;
        if let Err(e) = store.save(key, encoded).await {
            warn!(key, backend = store.name(), error = %e, "save failed");
            return Err(e);
        }
        debug!(key, backend = store.name(), "saved");
        Ok(())
    }

    /// Delete `key`, logging failures.
    pub async fn remove(store: &dyn KeyValueStore, key: &str) -> Result<(), CoreError> {
        if let Err(e) = store.remove(key).await {
            warn!(key, backend = store.name(), error = %e, "remove failed");
            return Err(e);
        }
        Ok(())
    }
}
