use thiserror::Error;

/// Unified error type for the entire trade-ledger-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
///
/// Bad numeric input is not an error here: prices and quantities are
/// coerced to `0` (see [`crate::numeric`]) so the UI never has to handle it.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Persistence ─────────────────────────────────────────────────
    #[error("Persistence failure for key '{key}': {message}")]
    Persistence { key: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── File I/O (native only) ──────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Unknown item '{name}' in category '{category}'")]
    UnknownItem { category: String, name: String },

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("No user is logged in")]
    NotLoggedIn,
}

impl CoreError {
    /// Wrap any error raised while reading or writing `key`.
    pub fn persistence(key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        CoreError::Persistence {
            key: key.into(),
            message: err.to_string(),
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}
