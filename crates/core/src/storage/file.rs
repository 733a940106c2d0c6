use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::CoreError;

use super::traits::KeyValueStore;

/// Stores each key as `<dir>/<key>.json` (native only).
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path backing `key`. Characters outside `[A-Za-z0-9._-]` become `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl KeyValueStore for JsonFileStore {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn load(&self, key: &str) -> Result<Option<Value>, CoreError> {
        let path = self.path_for(key);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CoreError::persistence(key, e)),
        };
        let value = serde_json::from_str(&text).map_err(|e| CoreError::persistence(key, e))?;
        Ok(Some(value))
    }

    async fn save(&self, key: &str, value: Value) -> Result<(), CoreError> {
        let path = self.path_for(key);
        let text = serde_json::to_string_pretty(&value)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CoreError::persistence(key, e))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, text)
            .await
            .map_err(|e| CoreError::persistence(key, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| CoreError::persistence(key, e))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CoreError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::persistence(key, e)),
        }
    }
}
