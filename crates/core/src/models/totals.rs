use serde::{Deserialize, Serialize};

/// One priced row fed into the totals calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub buy_price: f64,
    pub sell_price: f64,
    pub quantity: f64,
}

impl LineItem {
    pub fn new(buy_price: f64, sell_price: f64, quantity: f64) -> Self {
        Self {
            buy_price,
            sell_price,
            quantity,
        }
    }
}

/// Margin of a single (buy, sell, quantity) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginResult {
    pub buy_total: f64,
    pub sell_total: f64,
    /// sell_total - buy_total
    pub margin: f64,
    /// margin / buy_total * 100, or exactly 0 when buy_total is 0
    pub margin_percent: f64,
    pub is_positive: bool,
}

/// Aggregate totals over every selected row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_buy: f64,
    pub total_sell: f64,
    pub total_margin: f64,
    pub total_margin_percent: f64,
    pub is_positive: bool,
    pub item_count: usize,
}

impl Default for Totals {
    fn default() -> Self {
        Self {
            total_buy: 0.0,
            total_sell: 0.0,
            total_margin: 0.0,
            total_margin_percent: 0.0,
            is_positive: true,
            item_count: 0,
        }
    }
}
