use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::CoreError;

/// Margin alert configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarginAlertSettings {
    pub enabled: bool,
    /// Alert when the total margin drops below this value.
    pub threshold: f64,
    /// While alerted, re-alert once the margin moves more than this from the last alert.
    pub realert_drift: f64,
}

impl Default for MarginAlertSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.0,
            realert_drift: 1000.0,
        }
    }
}

/// User-configurable settings, persisted under the `settings` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub margin_alert: MarginAlertSettings,

    /// Quiet period before an edited override is written to storage.
    pub override_save_debounce_ms: u64,

    /// Quiet period before totals are recomputed after an edit.
    pub totals_debounce_ms: u64,

    /// Categories whose ledger rows may keep a quantity of 0.
    pub zero_quantity_categories: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            margin_alert: MarginAlertSettings::default(),
            override_save_debounce_ms: 500,
            totals_debounce_ms: 150,
            zero_quantity_categories: vec!["drugs".to_string()],
        }
    }
}

impl Settings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.margin_alert.threshold.is_finite() {
            return Err(CoreError::ValidationError(
                "Margin alert threshold must be a finite number".into(),
            ));
        }
        if !self.margin_alert.realert_drift.is_finite() || self.margin_alert.realert_drift < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Re-alert drift must be finite and non-negative, got {}",
                self.margin_alert.realert_drift
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn override_save_debounce(&self) -> Duration {
        Duration::from_millis(self.override_save_debounce_ms)
    }

    #[must_use]
    pub fn totals_debounce(&self) -> Duration {
        Duration::from_millis(self.totals_debounce_ms)
    }
}
