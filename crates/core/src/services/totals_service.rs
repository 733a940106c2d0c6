use std::collections::HashMap;
use std::sync::Arc;

use crate::models::totals::{LineItem, MarginResult, Totals};
use crate::numeric::sanitize;

/// Memo key: the bit patterns of (buy, sell, quantity) after sanitizing.
type MarginKey = (u64, u64, u64);

/// Buy/sell/margin arithmetic with a memo of per-triple results.
///
/// Results are pure functions of their inputs, so the memo never expires.
/// It belongs to this instance; two calculators never share entries.
#[derive(Debug, Default)]
pub struct TotalsCalculator {
    memo: HashMap<MarginKey, Arc<MarginResult>>,
    computations: u64,
}

impl TotalsCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Margin for `quantity` units bought at `buy_price` and sold at `sell_price`.
    ///
    /// Non-finite inputs count as 0. Repeating a triple returns the same
    /// `Arc` without recomputing.
    pub fn calculate_margin(
        &mut self,
        buy_price: f64,
        sell_price: f64,
        quantity: f64,
    ) -> Arc<MarginResult> {
        let buy_price = sanitize(buy_price);
        let sell_price = sanitize(sell_price);
        let quantity = sanitize(quantity);
        let key = (buy_price.to_bits(), sell_price.to_bits(), quantity.to_bits());

        if let Some(hit) = self.memo.get(&key) {
            return Arc::clone(hit);
        }

        self.computations += 1;
        let result = Arc::new(compute_margin(buy_price, sell_price, quantity));
        self.memo.insert(key, Arc::clone(&result));
        result
    }

    /// Aggregate totals over `items`. An empty slice yields [`Totals::default`].
    pub fn calculate_totals(&mut self, items: &[LineItem]) -> Totals {
        let mut total_buy = 0.0;
        let mut total_sell = 0.0;
        let mut total_margin = 0.0;

        for item in items {
            let result = self.calculate_margin(item.buy_price, item.sell_price, item.quantity);
            total_buy += result.buy_total;
            total_sell += result.sell_total;
            total_margin += result.margin;
        }

        Totals {
            total_buy,
            total_sell,
            total_margin,
            total_margin_percent: percent_of(total_margin, total_buy),
            is_positive: total_margin >= 0.0,
            item_count: items.len(),
        }
    }

    /// How many margins were actually computed (memo misses).
    #[must_use]
    pub fn computation_count(&self) -> u64 {
        self.computations
    }

    #[must_use]
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    pub fn clear_memo(&mut self) {
        self.memo.clear();
    }
}

fn compute_margin(buy_price: f64, sell_price: f64, quantity: f64) -> MarginResult {
    let buy_total = sanitize(buy_price * quantity);
    let sell_total = sanitize(sell_price * quantity);
    let margin = sell_total - buy_total;
    MarginResult {
        buy_total,
        sell_total,
        margin,
        margin_percent: percent_of(margin, buy_total),
        is_positive: margin >= 0.0,
    }
}

/// `part / whole * 100`, or exactly 0 when `whole` is not positive.
fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        sanitize(part / whole * 100.0)
    } else {
        0.0
    }
}
