use async_trait::async_trait;
use serde_json::Value;

use crate::errors::CoreError;

/// Key/value persistence backend for per-user data.
///
/// The desktop shell, a JSON directory, or an in-memory map can all sit
/// behind this trait; the rest of the crate only sees string keys and
/// JSON values.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait KeyValueStore: Send + Sync {
    /// Human-readable name of this backend (for logs/errors).
    fn name(&self) -> &str;

    /// Read the value under `key`. `Ok(None)` means the key was never written.
    async fn load(&self, key: &str) -> Result<Option<Value>, CoreError>;

    /// Write `value` under `key`, replacing any previous value.
    async fn save(&self, key: &str, value: Value) -> Result<(), CoreError>;

    /// Delete `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), CoreError>;
}
