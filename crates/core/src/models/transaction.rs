use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An item line inside a saved transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionItem {
    pub name: String,
    pub quantity: i64,
}

/// A committed buy/sell transaction.
///
/// Immutable once saved; the only mutation is deleting the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    /// User who logged the transaction
    pub user: String,
    /// Counterparty the items were traded with
    pub seller: String,
    pub items: Vec<TransactionItem>,
    pub total_buy: f64,
    pub total_sell: f64,
    pub margin: f64,
}

impl TransactionRecord {
    pub fn new(
        user: impl Into<String>,
        seller: impl Into<String>,
        items: Vec<TransactionItem>,
        total_buy: f64,
        total_sell: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: Utc::now(),
            user: user.into(),
            seller: seller.into(),
            items,
            total_buy,
            total_sell,
            margin: total_sell - total_buy,
        }
    }
}
