use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::errors::CoreError;

use super::traits::KeyValueStore;

/// Process-local store. Used before a real backend is attached and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored key, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = match self.values.lock() {
            Ok(values) => values.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        keys.sort();
        keys
    }

    fn with_values<T>(
        &self,
        key: &str,
        f: impl FnOnce(&mut HashMap<String, Value>) -> T,
    ) -> Result<T, CoreError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| CoreError::persistence(key, "memory store lock poisoned"))?;
        Ok(f(&mut values))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl KeyValueStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self, key: &str) -> Result<Option<Value>, CoreError> {
        self.with_values(key, |values| values.get(key).cloned())
    }

    async fn save(&self, key: &str, value: Value) -> Result<(), CoreError> {
        self.with_values(key, |values| {
            values.insert(key.to_string(), value);
        })
    }

    async fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.with_values(key, |values| {
            values.remove(key);
        })
    }
}
