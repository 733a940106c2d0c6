use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::settings::MarginAlertSettings;
use crate::numeric::sanitize;

/// Watcher state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertState {
    Normal,
    /// Margin is below the threshold; `last_alert_margin` is the margin
    /// reported by the most recent alert.
    Alerted { last_alert_margin: f64 },
}

/// Why an alert fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    /// Margin just dropped below the threshold.
    Entered,
    /// Still below the threshold, but moved far from the last alert.
    Drifted,
}

/// A margin warning for the UI to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginAlertEvent {
    pub kind: AlertKind,
    pub margin: f64,
    pub total_buy: f64,
    pub total_sell: f64,
    pub threshold: f64,
}

/// Watches computed totals and warns once when the margin goes below the
/// threshold, then again only after a large drift.
///
/// Leaving the alerted state is silent.
#[derive(Debug, Clone)]
pub struct MarginAlert {
    settings: MarginAlertSettings,
    state: AlertState,
}

impl MarginAlert {
    pub fn new(settings: MarginAlertSettings) -> Self {
        Self {
            settings,
            state: AlertState::Normal,
        }
    }

    /// Feed the latest totals. Returns an event only when a warning is due.
    ///
    /// While disabled, nothing is emitted and the state does not move.
    pub fn check_margin(
        &mut self,
        margin: f64,
        total_buy: f64,
        total_sell: f64,
    ) -> Option<MarginAlertEvent> {
        if !self.settings.enabled {
            return None;
        }

        let margin = sanitize(margin);
        let threshold = self.settings.threshold;

        if margin >= threshold {
            self.state = AlertState::Normal;
            return None;
        }

        let kind = match self.state {
            AlertState::Normal => AlertKind::Entered,
            AlertState::Alerted { last_alert_margin }
                if (margin - last_alert_margin).abs() > self.settings.realert_drift =>
            {
                AlertKind::Drifted
            }
            AlertState::Alerted { .. } => return None,
        };

        self.state = AlertState::Alerted {
            last_alert_margin: margin,
        };
        warn!(
            ?kind,
            margin,
            total_buy,
            total_sell,
            threshold,
            "margin below alert threshold"
        );

        Some(MarginAlertEvent {
            kind,
            margin,
            total_buy: sanitize(total_buy),
            total_sell: sanitize(total_sell),
            threshold,
        })
    }

    /// Turn alerts on or off. The current state is kept.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
    }

    /// Change the threshold. The current state is kept; non-finite values are ignored.
    pub fn set_threshold(&mut self, threshold: f64) {
        if threshold.is_finite() {
            self.settings.threshold = threshold;
        }
    }

    /// Replace all settings without touching the state.
    pub fn configure(&mut self, settings: MarginAlertSettings) {
        self.settings = settings;
    }

    /// Back to `Normal`, e.g. when the selection is cleared.
    pub fn reset(&mut self) {
        self.state = AlertState::Normal;
    }

    #[must_use]
    pub fn state(&self) -> AlertState {
        self.state
    }

    #[must_use]
    pub fn settings(&self) -> &MarginAlertSettings {
        &self.settings
    }
}

impl Default for MarginAlert {
    fn default() -> Self {
        Self::new(MarginAlertSettings::default())
    }
}
